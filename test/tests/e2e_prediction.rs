/// E2E: prediction and reconciliation. A controlled client entity keeps
/// predicting through packet loss; the next acknowledged delta discards
/// acked commands and replay reproduces exactly the unacked remainder.
use orrery_test::{PawnServer, PawnState, TestPair};

#[test]
fn client_gains_control_and_predicts() {
    let mut pair = TestPair::new();
    let entity_id = pair
        .server
        .add_new_entity::<PawnServer>()
        .expect("spawn pawn");
    pair.server
        .assign_control(entity_id, pair.peer_id)
        .expect("assign control");

    let mut gained = false;
    for _ in 0..6 {
        let (_, client_events) = pair.tick();
        if client_events.control_gained.contains(&entity_id) {
            gained = true;
        }
    }
    assert!(gained, "client never learned it controls the pawn");

    let room = pair.client.room().expect("client room");
    let entity = room.entity(entity_id).expect("replicated entity");
    assert!(entity.is_controlled());
    assert!(entity.outgoing_command_count() > 0);

    // Replay invariant: predicted = authoritative + one step per unacked
    // command (the test pawn moves +1/+1 per command).
    let auth = entity.auth_state::<PawnState>().expect("auth state");
    let predicted = entity.state::<PawnState>().expect("predicted state");
    let unacked = entity.outgoing_command_count() as i32;
    assert_eq!(predicted.pos_x, auth.pos_x + unacked);
    assert_eq!(predicted.pos_y, auth.pos_y + unacked);
}

#[test]
fn reconciliation_after_loss_discards_acked_commands() {
    let mut pair = TestPair::new();
    let entity_id = pair
        .server
        .add_new_entity::<PawnServer>()
        .expect("spawn pawn");
    pair.server
        .assign_control(entity_id, pair.peer_id)
        .expect("assign control");
    pair.tick_n(6);
    assert!(pair
        .client
        .room()
        .unwrap()
        .entity(entity_id)
        .unwrap()
        .is_controlled());

    // Drop every server-to-client packet while the client keeps
    // predicting; its outgoing queue accumulates unacked commands.
    pair.server_link.set_up(false);
    pair.tick_n(20);
    let piled_up = pair
        .client
        .room()
        .unwrap()
        .entity(entity_id)
        .unwrap()
        .outgoing_command_count();
    assert!(piled_up >= 15, "expected a backlog, got {}", piled_up);

    // Restore the link; the next delta's command ack cleans the queue.
    pair.server_link.set_up(true);
    pair.tick_n(4);

    let room = pair.client.room().expect("client room");
    let entity = room.entity(entity_id).expect("replicated entity");
    let ack = entity.last_command_ack();
    assert!(ack.is_valid());

    // No command at or before the ack survives.
    for tick in entity.outgoing_command_ticks() {
        assert!(tick > ack, "command {:?} should have been cleaned", tick);
    }
    assert!(entity.outgoing_command_count() < piled_up);

    // Replay still reproduces exactly the unacked commands' effect.
    let auth = entity.auth_state::<PawnState>().expect("auth state");
    let predicted = entity.state::<PawnState>().expect("predicted state");
    let unacked = entity.outgoing_command_count() as i32;
    assert_eq!(predicted.pos_x, auth.pos_x + unacked);
    assert_eq!(predicted.pos_y, auth.pos_y + unacked);
}

#[test]
fn server_state_advances_under_held_input() {
    let mut pair = TestPair::new();
    let entity_id = pair
        .server
        .add_new_entity::<PawnServer>()
        .expect("spawn pawn");
    pair.server
        .assign_control(entity_id, pair.peer_id)
        .expect("assign control");

    pair.tick_n(12);

    let room = pair.server.room().expect("server room");
    let state = room
        .entity(entity_id)
        .expect("server entity")
        .state::<PawnState>()
        .expect("pawn state");
    assert!(state.pos_x > 0);
    assert_eq!(state.pos_x, state.pos_y);
}
