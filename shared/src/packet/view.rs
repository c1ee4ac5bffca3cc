use std::fmt;

use orrery_serde::BitBuffer;

use crate::{packet::error::DecodeError, tick::Tick, types::EntityId};

/// One entry of the client's acknowledgment view: the newest delta tick it
/// has received for an entity, and whether that delta was a freeze marker.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ViewEntry {
    pub entity_id: EntityId,
    pub last_received_tick: Tick,
    pub is_frozen: bool,
}

impl ViewEntry {
    pub fn encode(&self, buffer: &mut BitBuffer) {
        self.entity_id.encode(buffer);
        self.last_received_tick.encode(buffer);
        buffer.write_bool(self.is_frozen);
    }

    pub fn decode(buffer: &mut BitBuffer) -> Result<ViewEntry, DecodeError> {
        Ok(ViewEntry {
            entity_id: EntityId::decode(buffer)?,
            last_received_tick: Tick::decode(buffer)?,
            is_frozen: buffer.read_bool()?,
        })
    }
}

impl fmt::Debug for ViewEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ViewEntry({:?} @ {:?}{})",
            self.entity_id,
            self.last_received_tick,
            if self.is_frozen { ", frozen" } else { "" }
        )
    }
}
