/// Harness helpers: a paired server + client over an in-memory link, with
/// per-direction loss switches.
use orrery_client::{Client, ClientEvents};
use orrery_server::{Server, ServerEvents};
use orrery_shared::{PeerId, SyncConfig};

use crate::{
    local_socket::{LinkController, LocalSocket},
    test_protocol::protocol,
};

/// One server and one client wired together over a loopback link.
///
/// The link controllers simulate loss: `server_link` gates server-to-client
/// payloads, `client_link` gates client-to-server payloads.
pub struct TestPair {
    pub server: Server,
    pub client: Client,
    pub peer_id: PeerId,
    pub server_link: LinkController,
    pub client_link: LinkController,
}

impl TestPair {
    pub fn new() -> Self {
        Self::with_config(SyncConfig::default())
    }

    pub fn with_config(config: SyncConfig) -> Self {
        let (server_socket, client_socket) = LocalSocket::pair();
        let server_link = server_socket.controller();
        let client_link = client_socket.controller();

        let mut server = Server::new(protocol(), config.clone());
        server.start_room();
        let peer_id = server.add_client(Box::new(server_socket), "test-client");

        let mut client = Client::new(protocol(), config);
        client.set_peer(Box::new(client_socket));
        client.start_room();

        Self {
            server,
            client,
            peer_id,
            server_link,
            client_link,
        }
    }

    /// One full exchange step: the server ticks, then the client.
    pub fn tick(&mut self) -> (ServerEvents, ClientEvents) {
        let server_events = self.server.update();
        let client_events = self.client.update();
        (server_events, client_events)
    }

    pub fn tick_n(&mut self, count: usize) {
        for _ in 0..count {
            self.tick();
        }
    }
}

impl Default for TestPair {
    fn default() -> Self {
        Self::new()
    }
}
