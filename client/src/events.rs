use orrery_shared::{EntityId, EventBase};

/// Everything notable that happened during one client update, drained by
/// the caller after each [`crate::Client::update`].
#[derive(Default)]
pub struct ClientEvents {
    /// Entities removed by the server whose removal tick has passed.
    pub entity_removed: Vec<EntityId>,
    /// Entities whose latest authoritative delta granted local control.
    pub control_gained: Vec<EntityId>,
    /// Entities whose latest authoritative delta revoked local control.
    pub control_lost: Vec<EntityId>,
    /// Reliable events delivered from the server, in arrival order.
    pub events: Vec<Box<dyn EventBase>>,
}

impl ClientEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entity_removed.is_empty()
            && self.control_gained.is_empty()
            && self.control_lost.is_empty()
            && self.events.is_empty()
    }
}
