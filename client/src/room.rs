use std::collections::BTreeMap;

use orrery_shared::{EntityId, Tick};

use crate::entity::RemoteEntity;

/// Replicated entity storage plus the estimated server tick. Entities are
/// created from decoded deltas and removed when their removal tick passes.
pub struct ClientRoom {
    pub(crate) tick: Tick,
    pub(crate) entities: BTreeMap<EntityId, RemoteEntity>,
    pre_update_hook: Option<Box<dyn FnMut(Tick) + Send>>,
    post_update_hook: Option<Box<dyn FnMut(Tick) + Send>>,
}

impl ClientRoom {
    pub(crate) fn new() -> Self {
        Self {
            // Invalid until the first server packet seeds the clock.
            tick: Tick::INVALID,
            entities: BTreeMap::new(),
            pre_update_hook: None,
            post_update_hook: None,
        }
    }

    /// Called at the start of every client tick, before entities update.
    pub fn on_pre_room_update(&mut self, hook: impl FnMut(Tick) + Send + 'static) {
        self.pre_update_hook = Some(Box::new(hook));
    }

    /// Called at the end of every client tick, after removals take effect.
    pub fn on_post_room_update(&mut self, hook: impl FnMut(Tick) + Send + 'static) {
        self.post_update_hook = Some(Box::new(hook));
    }

    pub(crate) fn fire_pre_update(&mut self) {
        let tick = self.tick;
        if let Some(hook) = self.pre_update_hook.as_mut() {
            hook(tick);
        }
    }

    pub(crate) fn fire_post_update(&mut self) {
        let tick = self.tick;
        if let Some(hook) = self.post_update_hook.as_mut() {
            hook(tick);
        }
    }

    /// Estimated server tick; invalid before the first server contact.
    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn entity(&self, entity_id: EntityId) -> Option<&RemoteEntity> {
        self.entities.get(&entity_id)
    }

    pub fn entity_mut(&mut self, entity_id: EntityId) -> Option<&mut RemoteEntity> {
        self.entities.get_mut(&entity_id)
    }

    /// Snapshot of the replicated entity ids, in id order.
    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Entities currently under local control.
    pub fn controlled_entity_ids(&self) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|(_, entity)| entity.is_controlled())
            .map(|(entity_id, _)| *entity_id)
            .collect()
    }
}
