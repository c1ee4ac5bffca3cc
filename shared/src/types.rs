use std::fmt;

use orrery_serde::{BitBuffer, SerdeErr};

/// Identifies an entity within a room for the lifetime of the engine.
/// Assigned sequentially by the server; raw `0` is the invalid sentinel.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct EntityId(u16);

impl EntityId {
    pub const INVALID: EntityId = EntityId(0);

    pub fn first() -> EntityId {
        EntityId(1)
    }

    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }

    pub fn raw(&self) -> u16 {
        self.0
    }

    pub fn next(&self) -> EntityId {
        EntityId(self.0.checked_add(1).expect("entity id space exhausted"))
    }

    pub fn encode(&self, buffer: &mut BitBuffer) {
        buffer.write_varint(self.0 as u32);
    }

    pub fn decode(buffer: &mut BitBuffer) -> Result<EntityId, SerdeErr> {
        let raw = buffer.read_varint()?;
        if raw > u16::MAX as u32 {
            return Err(SerdeErr::ValueOutOfRange { value: raw });
        }
        Ok(EntityId(raw as u16))
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "EntityId({})", self.0)
        } else {
            write!(f, "EntityId(invalid)")
        }
    }
}

/// Server-side handle for a connected client. Never serialized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(u64);

impl PeerId {
    pub fn first() -> PeerId {
        PeerId(1)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }

    pub fn next(&self) -> PeerId {
        PeerId(self.0 + 1)
    }
}

/// Per-peer reliable event identifier; monotonic within a session, starting
/// at 1. Raw `0` is the invalid sentinel. Wire form: unsigned varint.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct EventId(u32);

impl EventId {
    pub const INVALID: EventId = EventId(0);

    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }

    pub fn raw(&self) -> u32 {
        self.0
    }

    pub fn next(&self) -> EventId {
        EventId(self.0 + 1)
    }

    pub fn from_raw(raw: u32) -> EventId {
        EventId(raw)
    }

    pub fn encode(&self, buffer: &mut BitBuffer) {
        buffer.write_varint(self.0);
    }

    pub fn decode(buffer: &mut BitBuffer) -> Result<EventId, SerdeErr> {
        Ok(EventId(buffer.read_varint()?))
    }
}

impl fmt::Debug for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "EventId({})", self.0)
        } else {
            write!(f, "EventId(invalid)")
        }
    }
}

/// Entity-schema discriminator, assigned by registration order in the
/// protocol. Bit-compressed on the wire by the registered type count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FactoryType(pub u8);

/// Event-schema discriminator, assigned by registration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EventKind(pub u8);

/// Bitmask of changed mutable state fields; one bit per field, at most 32
/// fields per schema.
pub type FlagField = u32;

/// All-fields mask for a schema with `count` mutable fields.
pub fn flags_all(count: u8) -> FlagField {
    debug_assert!(count <= 32);
    if count >= 32 {
        FlagField::MAX
    } else {
        (1u32 << count) - 1
    }
}

/// Bucket an entity updates in; buckets run in declaration order each tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum UpdateOrder {
    Early,
    #[default]
    Normal,
    Late,
    VeryLate,
}

impl UpdateOrder {
    pub const ALL: [UpdateOrder; 4] = [
        UpdateOrder::Early,
        UpdateOrder::Normal,
        UpdateOrder::Late,
        UpdateOrder::VeryLate,
    ];
}
