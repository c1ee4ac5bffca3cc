use crate::{buffers::Timestamped, schema::state::StateBase, tick::Tick};

/// A server-side snapshot of one entity's state at one tick, retained in
/// the outgoing record queue to serve as a delta basis for any client whose
/// last-acked tick still falls inside the history window.
pub struct StateRecord {
    pub tick: Tick,
    pub state: Box<dyn StateBase>,
}

impl StateRecord {
    pub fn new(tick: Tick, state: Box<dyn StateBase>) -> Self {
        Self { tick, state }
    }
}

impl Timestamped for StateRecord {
    fn tick(&self) -> Tick {
        self.tick
    }
}
