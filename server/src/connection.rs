use orrery_shared::{Peer, SyncConfig, Transport};

use crate::scope::{FullScopeEvaluator, Scope, ScopeEvaluator};

/// The server's bookkeeping for one connected client: its transport, the
/// shared peer base (sequencing, acks, events, clock, timeout) and the
/// per-client entity scope.
pub struct ClientConnection {
    identifier: String,
    pub(crate) transport: Box<dyn Transport>,
    pub(crate) peer: Peer,
    pub(crate) scope: Scope,
    pub(crate) evaluator: Box<dyn ScopeEvaluator>,
}

impl ClientConnection {
    pub(crate) fn new(transport: Box<dyn Transport>, identifier: &str, config: &SyncConfig) -> Self {
        Self {
            identifier: identifier.to_string(),
            transport,
            peer: Peer::new(config),
            scope: Scope::new(),
            evaluator: Box::new(FullScopeEvaluator),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}
