/// E2E: removal with loss. A removed entity stays in the server's retained
/// set until every client has acked its removal tick (or provably never
/// saw it); an ack-lagging client forces retention.
use orrery_client::Client;
use orrery_server::Server;
use orrery_shared::SyncConfig;
use orrery_test::{protocol, LocalSocket, PawnServer, TestPair};

#[test]
fn removal_reaches_the_client() {
    let mut pair = TestPair::new();
    let entity_id = pair
        .server
        .add_new_entity::<PawnServer>()
        .expect("spawn pawn");
    pair.tick_n(5);
    assert_eq!(pair.client.room().unwrap().entity_count(), 1);

    pair.server.mark_for_removal(entity_id).expect("mark removal");

    let mut removed_seen = false;
    for _ in 0..8 {
        let (_, client_events) = pair.tick();
        if client_events.entity_removed.contains(&entity_id) {
            removed_seen = true;
        }
    }
    assert!(removed_seen, "client never observed the removal");
    assert_eq!(pair.client.room().unwrap().entity_count(), 0);

    // The lone client acked; retention is over.
    assert!(pair.server.room().unwrap().removed_entity_ids().is_empty());
}

#[test]
fn ack_lagging_client_forces_retention() {
    let config = SyncConfig::default();

    let (socket_a_server, socket_a_client) = LocalSocket::pair();
    let (socket_b_server, socket_b_client) = LocalSocket::pair();
    let lagging_link = socket_b_client.controller();

    let mut server = Server::new(protocol(), config.clone());
    server.start_room();
    server.add_client(Box::new(socket_a_server), "prompt");
    server.add_client(Box::new(socket_b_server), "lagging");

    let mut client_a = Client::new(protocol(), config.clone());
    client_a.set_peer(Box::new(socket_a_client));
    client_a.start_room();

    let mut client_b = Client::new(protocol(), config);
    client_b.set_peer(Box::new(socket_b_client));
    client_b.start_room();

    let mut tick_all = |server: &mut Server, a: &mut Client, b: &mut Client, count: usize| {
        for _ in 0..count {
            server.update();
            a.update();
            b.update();
        }
    };

    let entity_id = server.add_new_entity::<PawnServer>().expect("spawn pawn");
    tick_all(&mut server, &mut client_a, &mut client_b, 5);
    assert_eq!(client_a.room().unwrap().entity_count(), 1);
    assert_eq!(client_b.room().unwrap().entity_count(), 1);

    // Client B's acks stop reaching the server.
    lagging_link.set_up(false);
    server.mark_for_removal(entity_id).expect("mark removal");

    tick_all(&mut server, &mut client_a, &mut client_b, 60);

    // A acked long ago; B still hasn't, so the entity is retained.
    assert_eq!(
        server.room().unwrap().removed_entity_ids(),
        vec![entity_id]
    );

    // B's acks resume; the retained entity is dropped within a clean pass.
    lagging_link.set_up(true);
    tick_all(&mut server, &mut client_a, &mut client_b, 6);
    assert!(server.room().unwrap().removed_entity_ids().is_empty());
}
