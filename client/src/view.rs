use std::collections::HashMap;

use orrery_shared::{EntityId, Tick, ViewEntry};

struct ViewRecord {
    last_received_tick: Tick,
    last_received_local_tick: Tick,
    is_frozen: bool,
}

/// The client's running summary of what it has received per entity, sent
/// back to the server as its acknowledgment view.
pub struct View {
    entries: HashMap<EntityId, ViewRecord>,
}

impl View {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Records a decoded delta; monotonic per entity by sender tick.
    pub fn record(&mut self, entity_id: EntityId, tick: Tick, local_tick: Tick, is_frozen: bool) {
        match self.entries.get_mut(&entity_id) {
            Some(record) => {
                if tick > record.last_received_tick {
                    record.last_received_tick = tick;
                    record.last_received_local_tick = local_tick;
                    record.is_frozen = is_frozen;
                }
            }
            None => {
                self.entries.insert(
                    entity_id,
                    ViewRecord {
                        last_received_tick: tick,
                        last_received_local_tick: local_tick,
                        is_frozen,
                    },
                );
            }
        }
    }

    pub fn last_received_tick(&self, entity_id: EntityId) -> Tick {
        self.entries
            .get(&entity_id)
            .map_or(Tick::INVALID, |record| record.last_received_tick)
    }

    pub fn last_received_local_tick(&self, entity_id: EntityId) -> Tick {
        self.entries
            .get(&entity_id)
            .map_or(Tick::INVALID, |record| record.last_received_local_tick)
    }

    /// Entries to pack into the next packet, newest acknowledgments first
    /// so they survive MTU-bounded truncation. Entries staler than
    /// `view_ticks` behind the newest are left out; the next delta will
    /// re-teach the server anything they would have said.
    pub fn packed_entries(&self, view_ticks: u32) -> Vec<ViewEntry> {
        let newest = self
            .entries
            .values()
            .map(|record| record.last_received_tick)
            .max()
            .unwrap_or(Tick::INVALID);

        let mut out: Vec<ViewEntry> = self
            .entries
            .iter()
            .filter(|(_, record)| {
                !newest.is_valid()
                    || newest
                        .since(record.last_received_tick)
                        .map_or(false, |age| age <= view_ticks)
            })
            .map(|(entity_id, record)| ViewEntry {
                entity_id: *entity_id,
                last_received_tick: record.last_received_tick,
                is_frozen: record.is_frozen,
            })
            .collect();

        out.sort_by(|a, b| {
            b.last_received_tick
                .cmp(&a.last_received_tick)
                .then(a.entity_id.cmp(&b.entity_id))
        });
        out
    }
}

impl Default for View {
    fn default() -> Self {
        Self::new()
    }
}
