use std::fmt;

use orrery_serde::BitBuffer;

use crate::{
    buffers::Timestamped,
    packet::error::DecodeError,
    schema::{protocol::Protocol, state::StateBase},
    tick::Tick,
    types::{flags_all, EntityId, FactoryType, FlagField},
};

/// The state sections one delta carries for its entity.
pub struct StatePayload {
    pub factory_type: FactoryType,
    /// Mutable fields present, one bit per field.
    pub flags: FlagField,
    pub has_controller: bool,
    pub has_immutable: bool,
    /// Snapshot the flagged sections are read from; unflagged fields hold
    /// schema defaults and are never applied.
    pub state: Box<dyn StateBase>,
}

impl Clone for StatePayload {
    fn clone(&self) -> Self {
        Self {
            factory_type: self.factory_type,
            flags: self.flags,
            has_controller: self.has_controller,
            has_immutable: self.has_immutable,
            state: self.state.boxed_clone(),
        }
    }
}

/// The wire record for one entity in one packet.
///
/// A frozen delta carries no state payload; a removing delta still carries
/// the final state so the controller sees terminal controller data.
pub struct StateDelta {
    pub tick: Tick,
    pub entity_id: EntityId,
    pub payload: Option<StatePayload>,
    /// Valid when the entity's removal is scheduled at or before this tick.
    pub removed_tick: Tick,
    /// Latest author command tick the server has simulated.
    pub command_ack: Tick,
    pub is_frozen: bool,
}

impl StateDelta {
    pub fn has_controller_data(&self) -> bool {
        self.payload
            .as_ref()
            .map_or(false, |payload| payload.has_controller)
    }

    pub fn has_immutable_data(&self) -> bool {
        self.payload
            .as_ref()
            .map_or(false, |payload| payload.has_immutable)
    }

    /// Applies the carried sections onto `target`. The `has_immutable`
    /// return is monotonic for the caller: once an entity has seen
    /// immutable data it keeps it, even if re-sent.
    pub fn apply(&self, target: &mut dyn StateBase) {
        debug_assert!(!self.is_frozen, "frozen deltas carry no state to apply");
        let Some(payload) = &self.payload else {
            return;
        };
        target.merge(payload.state.as_ref(), payload.flags);
        if payload.has_controller {
            target.merge_controller(payload.state.as_ref());
        }
        if payload.has_immutable {
            target.merge_immutable(payload.state.as_ref());
        }
    }

    // Wire codec. Section order per entity: factory type, flag word,
    // flagged mutable fields, controller bit + fields, immutable bit +
    // fields. The frozen bit gates the whole payload.

    pub fn encode(&self, protocol: &Protocol, buffer: &mut BitBuffer) {
        self.entity_id.encode(buffer);
        self.tick.encode(buffer);
        self.command_ack.encode(buffer);
        self.removed_tick.encode(buffer);
        buffer.write_bool(self.is_frozen);

        if self.is_frozen {
            debug_assert!(self.payload.is_none(), "frozen delta carries a payload");
            return;
        }

        let payload = self
            .payload
            .as_ref()
            .expect("live delta is missing its payload - this should not happen");
        protocol.write_factory_type(buffer, payload.factory_type);
        buffer.write(payload.state.field_count(), payload.flags);
        payload.state.write_mutable(payload.flags, buffer);
        buffer.write_bool(payload.has_controller);
        if payload.has_controller {
            payload.state.write_controller(buffer);
        }
        buffer.write_bool(payload.has_immutable);
        if payload.has_immutable {
            payload.state.write_immutable(buffer);
        }
    }

    pub fn decode(protocol: &Protocol, buffer: &mut BitBuffer) -> Result<StateDelta, DecodeError> {
        let entity_id = EntityId::decode(buffer)?;
        let tick = Tick::decode(buffer)?;
        let command_ack = Tick::decode(buffer)?;
        let removed_tick = Tick::decode(buffer)?;
        let is_frozen = buffer.read_bool()?;

        let payload = if is_frozen {
            None
        } else {
            let factory_type = protocol.read_factory_type(buffer)?;
            let mut state = protocol
                .new_state(factory_type)
                .map_err(|_| DecodeError::UnknownFactoryType(factory_type.0))?;
            let flags = buffer.read(state.field_count())?;
            state.read_mutable(flags, buffer)?;
            let has_controller = buffer.read_bool()?;
            if has_controller {
                state.read_controller(buffer)?;
            }
            let has_immutable = buffer.read_bool()?;
            if has_immutable {
                state.read_immutable(buffer)?;
            }
            Some(StatePayload {
                factory_type,
                flags,
                has_controller,
                has_immutable,
                state,
            })
        };

        Ok(StateDelta {
            tick,
            entity_id,
            payload,
            removed_tick,
            command_ack,
            is_frozen,
        })
    }
}

impl Timestamped for StateDelta {
    fn tick(&self) -> Tick {
        self.tick
    }
}

impl fmt::Debug for StateDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateDelta")
            .field("entity_id", &self.entity_id)
            .field("tick", &self.tick)
            .field("is_frozen", &self.is_frozen)
            .field("removed_tick", &self.removed_tick)
            .field("command_ack", &self.command_ack)
            .field("has_payload", &self.payload.is_some())
            .finish()
    }
}

/// Builds the delta that takes a client from `basis` to `target`, or `None`
/// when nothing needs to be said (an empty flag word with no controller,
/// immutable or removal data saves its packet slot).
#[allow(clippy::too_many_arguments)]
pub fn create_delta(
    tick: Tick,
    entity_id: EntityId,
    factory_type: FactoryType,
    basis: Option<&dyn StateBase>,
    target: &dyn StateBase,
    include_controller: bool,
    include_immutable: bool,
    command_ack: Tick,
    removed_tick: Tick,
    force_all_mutable: bool,
) -> Option<StateDelta> {
    let flags = match basis {
        _ if force_all_mutable => flags_all(target.field_count()),
        None => flags_all(target.field_count()),
        Some(basis) => target.diff(basis),
    };
    let has_controller = include_controller;
    let has_immutable = include_immutable;

    if flags == 0 && !has_controller && !has_immutable && !removed_tick.is_valid() {
        return None;
    }

    Some(StateDelta {
        tick,
        entity_id,
        payload: Some(StatePayload {
            factory_type,
            flags,
            has_controller,
            has_immutable,
            state: target.boxed_clone(),
        }),
        removed_tick,
        command_ack,
        is_frozen: false,
    })
}

/// Builds the "still exists, out of your scope" marker for an entity.
pub fn create_frozen_delta(tick: Tick, entity_id: EntityId, command_ack: Tick) -> StateDelta {
    StateDelta {
        tick,
        entity_id,
        payload: None,
        removed_tick: Tick::INVALID,
        command_ack,
        is_frozen: true,
    }
}
