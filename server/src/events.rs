use orrery_shared::{EntityId, EventBase, PeerId};

/// Everything notable that happened during one server update, drained by
/// the caller after each [`crate::Server::update`].
#[derive(Default)]
pub struct ServerEvents {
    /// Clients that finished joining this update.
    pub joined: Vec<PeerId>,
    /// Clients removed this update, by request or by timeout.
    pub left: Vec<PeerId>,
    /// Entities whose deferred removal took effect this update.
    pub entity_removed: Vec<EntityId>,
    /// Reliable events delivered from clients, in arrival order.
    pub events: Vec<(PeerId, Box<dyn EventBase>)>,
}

impl ServerEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.joined.is_empty()
            && self.left.is_empty()
            && self.entity_removed.is_empty()
            && self.events.is_empty()
    }
}
