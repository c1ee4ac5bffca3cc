/// In-memory transport for E2E testing: routes payloads between a server
/// and a client endpoint without network I/O, with a switchable link so
/// suites can simulate loss in either direction.
use std::collections::VecDeque;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use orrery_shared::{Transport, TransportError};

type PayloadQueue = Arc<Mutex<VecDeque<Vec<u8>>>>;

/// One endpoint of an in-memory link.
pub struct LocalSocket {
    outgoing: PayloadQueue,
    incoming: PayloadQueue,
    send_enabled: Arc<AtomicBool>,
}

/// External switch for one direction of a link; usable after the socket
/// has been boxed into an engine.
#[derive(Clone)]
pub struct LinkController {
    send_enabled: Arc<AtomicBool>,
}

impl LinkController {
    /// While down, payloads sent through the socket are silently dropped,
    /// exactly like datagram loss.
    pub fn set_up(&self, up: bool) {
        self.send_enabled.store(up, Ordering::SeqCst);
    }
}

impl LocalSocket {
    /// Builds both ends of a link; payloads sent by one are received by
    /// the other.
    pub fn pair() -> (LocalSocket, LocalSocket) {
        let forward: PayloadQueue = Arc::new(Mutex::new(VecDeque::new()));
        let backward: PayloadQueue = Arc::new(Mutex::new(VecDeque::new()));

        let first = LocalSocket {
            outgoing: forward.clone(),
            incoming: backward.clone(),
            send_enabled: Arc::new(AtomicBool::new(true)),
        };
        let second = LocalSocket {
            outgoing: backward,
            incoming: forward,
            send_enabled: Arc::new(AtomicBool::new(true)),
        };
        (first, second)
    }

    pub fn controller(&self) -> LinkController {
        LinkController {
            send_enabled: self.send_enabled.clone(),
        }
    }
}

impl Transport for LocalSocket {
    fn send_payload(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        if self.send_enabled.load(Ordering::SeqCst) {
            self.outgoing
                .lock()
                .expect("socket queue poisoned")
                .push_back(payload.to_vec());
        }
        Ok(())
    }

    fn receive(&mut self) -> Option<Vec<u8>> {
        self.incoming
            .lock()
            .expect("socket queue poisoned")
            .pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payloads_cross_the_link() {
        let (mut a, mut b) = LocalSocket::pair();
        a.send_payload(&[1, 2, 3]).unwrap();

        assert_eq!(b.receive(), Some(vec![1, 2, 3]));
        assert_eq!(b.receive(), None);
    }

    #[test]
    fn downed_link_drops_payloads() {
        let (mut a, mut b) = LocalSocket::pair();
        let link = a.controller();

        link.set_up(false);
        a.send_payload(&[9]).unwrap();
        assert_eq!(b.receive(), None);

        link.set_up(true);
        a.send_payload(&[9]).unwrap();
        assert_eq!(b.receive(), Some(vec![9]));
    }
}
