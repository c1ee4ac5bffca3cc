use orrery_shared::{Peer, SyncConfig, Transport};

use crate::view::View;

/// The client's bookkeeping for its server: the transport, the shared peer
/// base (sequencing, acks, events, clock, timeout) and the acknowledgment
/// view it reports back.
pub struct ServerConnection {
    pub(crate) transport: Box<dyn Transport>,
    pub(crate) peer: Peer,
    pub(crate) view: View,
}

impl ServerConnection {
    pub(crate) fn new(transport: Box<dyn Transport>, config: &SyncConfig) -> Self {
        Self {
            transport,
            peer: Peer::new(config),
            view: View::new(),
        }
    }
}
