use std::collections::HashMap;

use orrery_shared::{EntityId, FactoryType, Tick, ViewEntry};

/// What the server knows about one client's knowledge of one entity.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScopeEntry {
    /// Newest delta tick shipped to the client for this entity.
    pub last_sent_tick: Tick,
    /// Newest delta tick the client has acknowledged through its view.
    pub last_acked_tick: Tick,
    /// Whether the last shipped delta was a freeze marker.
    pub is_frozen: bool,
    /// Whether the client's view has confirmed the entity frozen.
    pub acked_frozen: bool,
}

/// Per-client visibility and acknowledgment state for every entity.
pub struct Scope {
    entries: HashMap<EntityId, ScopeEntry>,
}

impl Scope {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn entry(&self, entity_id: EntityId) -> Option<&ScopeEntry> {
        self.entries.get(&entity_id)
    }

    pub fn last_acked_tick(&self, entity_id: EntityId) -> Tick {
        self.entries
            .get(&entity_id)
            .map_or(Tick::INVALID, |entry| entry.last_acked_tick)
    }

    pub fn last_sent_tick(&self, entity_id: EntityId) -> Tick {
        self.entries
            .get(&entity_id)
            .map_or(Tick::INVALID, |entry| entry.last_sent_tick)
    }

    /// Advances acknowledgment state from a received client view;
    /// monotonic, so reordered views can never roll an ack back.
    pub fn integrate_acked(&mut self, view: &[ViewEntry]) {
        for received in view {
            let entry = self.entries.entry(received.entity_id).or_default();
            if received.last_received_tick > entry.last_acked_tick {
                entry.last_acked_tick = received.last_received_tick;
                entry.acked_frozen = received.is_frozen;
            }
        }
    }

    /// Whether the client has confirmed this entity frozen.
    pub fn acked_frozen(&self, entity_id: EntityId) -> bool {
        self.entries
            .get(&entity_id)
            .map_or(false, |entry| entry.acked_frozen)
    }

    pub fn mark_sent(&mut self, entity_id: EntityId, tick: Tick, is_frozen: bool) {
        let entry = self.entries.entry(entity_id).or_default();
        entry.last_sent_tick = tick;
        entry.is_frozen = is_frozen;
    }

    /// Whether this client no longer needs a removal notification: it
    /// either never learned of the entity, or has acked its removal tick.
    pub fn has_acked_removal(&self, entity_id: EntityId, removed_tick: Tick) -> bool {
        match self.entries.get(&entity_id) {
            None => true,
            Some(entry) => {
                !entry.last_sent_tick.is_valid() || entry.last_acked_tick >= removed_tick
            }
        }
    }

    pub fn forget(&mut self, entity_id: EntityId) {
        self.entries.remove(&entity_id);
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

/// Decides which entities are inside a client's area of interest. Entities
/// out of scope still exist for the client, but ship only freeze markers.
pub trait ScopeEvaluator: Send + Sync {
    fn is_in_scope(&mut self, entity_id: EntityId, factory_type: FactoryType) -> bool;
}

/// Everything visible, the default for rooms without interest management.
pub struct FullScopeEvaluator;

impl ScopeEvaluator for FullScopeEvaluator {
    fn is_in_scope(&mut self, _entity_id: EntityId, _factory_type: FactoryType) -> bool {
        true
    }
}
