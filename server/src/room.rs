use std::collections::BTreeMap;

use orrery_shared::{EntityId, Tick};

use crate::entity::HostEntity;

/// Authoritative entity storage plus the room clock. Orchestration (packet
/// I/O, scoping, the update pump) lives on [`crate::Server`]; the room owns
/// what exists and when.
pub struct ServerRoom {
    tick: Tick,
    pub(crate) entities: BTreeMap<EntityId, HostEntity>,
    /// Removed entities retained until every client has acked the removal
    /// or provably never saw them.
    pub(crate) removed_entities: BTreeMap<EntityId, HostEntity>,
    next_entity_id: EntityId,
    pre_update_hook: Option<Box<dyn FnMut(Tick) + Send>>,
    post_update_hook: Option<Box<dyn FnMut(Tick) + Send>>,
}

impl ServerRoom {
    pub(crate) fn new() -> Self {
        Self {
            tick: Tick::START,
            entities: BTreeMap::new(),
            removed_entities: BTreeMap::new(),
            next_entity_id: EntityId::first(),
            pre_update_hook: None,
            post_update_hook: None,
        }
    }

    /// Called at the start of every room tick, before entities update.
    pub fn on_pre_room_update(&mut self, hook: impl FnMut(Tick) + Send + 'static) {
        self.pre_update_hook = Some(Box::new(hook));
    }

    /// Called at the end of every room tick, after removals take effect.
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

    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn entity(&self, entity_id: EntityId) -> Option<&HostEntity> {
        self.entities.get(&entity_id)
    }

    pub fn entity_mut(&mut self, entity_id: EntityId) -> Option<&mut HostEntity> {
        self.entities.get_mut(&entity_id)
    }

    /// Snapshot of the live entity ids, in id order.
    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Removed entities still retained for unacknowledged clients.
    pub fn removed_entity_ids(&self) -> Vec<EntityId> {
        self.removed_entities.keys().copied().collect()
    }

    pub(crate) fn advance_tick(&mut self) {
        self.tick = self.tick.next();
    }

    pub(crate) fn allocate_entity_id(&mut self) -> EntityId {
        let id = self.next_entity_id;
        self.next_entity_id = self.next_entity_id.next();
        id
    }

    pub(crate) fn insert_entity(&mut self, entity: HostEntity) {
        self.entities.insert(entity.id(), entity);
    }

    /// Records a state snapshot for every live entity; called at send
    /// ticks before packets are assembled.
    pub(crate) fn store_states(&mut self, tick: Tick) {
        for entity in self.entities.values_mut() {
            entity.store_record(tick);
        }
    }

    /// Entities whose scheduled removal is due at `tick`.
    pub(crate) fn due_removals(&self, tick: Tick) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|(_, entity)| entity.should_remove(tick))
            .map(|(id, _)| *id)
            .collect()
    }
}
