/// E2E: a spawned server entity appears on the client with the same id and
/// state, and subsequent authoritative changes replicate.
use orrery_test::{PawnServer, PawnState, TestPair};

#[test]
fn entity_syncs_to_client() {
    let mut pair = TestPair::new();
    let entity_id = pair
        .server
        .add_new_entity::<PawnServer>()
        .expect("spawn pawn");

    // server_send_rate + client_send_rate + 1
    pair.tick_n(5);

    let room = pair.client.room().expect("client room");
    assert_eq!(room.entity_count(), 1);

    let entity = room.entity(entity_id).expect("replicated entity");
    assert_eq!(entity.id(), entity_id);

    let state = entity.auth_state::<PawnState>().expect("pawn state");
    assert_eq!(state.pos_x, 0);
    assert_eq!(state.pos_y, 0);
}

#[test]
fn position_update_replicates() {
    let mut pair = TestPair::new();
    let entity_id = pair
        .server
        .add_new_entity::<PawnServer>()
        .expect("spawn pawn");
    pair.tick_n(5);

    {
        let room = pair.server.room_mut().expect("server room");
        let state = room
            .entity_mut(entity_id)
            .expect("server entity")
            .state_mut::<PawnState>()
            .expect("pawn state");
        state.pos_x = 42;
        state.pos_y = 106;
    }

    pair.tick_n(4);

    let room = pair.client.room().expect("client room");
    let state = room
        .entity(entity_id)
        .expect("replicated entity")
        .auth_state::<PawnState>()
        .expect("pawn state");
    assert_eq!(state.pos_x, 42);
    assert_eq!(state.pos_y, 106);
}

#[test]
fn immutable_data_arrives_with_the_first_delta() {
    let mut pair = TestPair::new();
    let entity_id = pair
        .server
        .add_new_entity::<PawnServer>()
        .expect("spawn pawn");
    {
        let room = pair.server.room_mut().expect("server room");
        room.entity_mut(entity_id)
            .expect("server entity")
            .state_mut::<PawnState>()
            .expect("pawn state")
            .label = "alpha".to_string();
    }

    pair.tick_n(5);

    let room = pair.client.room().expect("client room");
    let entity = room.entity(entity_id).expect("replicated entity");
    assert!(!entity.is_pending());
    assert_eq!(
        entity.auth_state::<PawnState>().expect("pawn state").label,
        "alpha"
    );
}
