/// E2E: an entity whose delta cannot fit the per-entity byte cap is
/// skipped for that packet; other entities still ship.
use orrery_client::Client;
use orrery_serde::{BitBuffer, SerdeErr};
use orrery_server::Server;
use orrery_shared::{
    ClientEntity, FlagField, Protocol, ServerEntity, State, SyncConfig,
};
use orrery_test::{ChatEvent, LocalSocket, MoveCommand, PawnClient, PawnServer, PawnState};

/// A state whose lone mutable field encodes far past `maxsize_entity`.
#[derive(Clone, Debug, Default, PartialEq)]
struct BulkState {
    fill: u32,
}

const BULK_BYTES: usize = 150;

impl State for BulkState {
    const MUTABLE_FIELD_COUNT: u8 = 1;

    fn compare_mutable(&self, basis: &Self) -> FlagField {
        (self.fill != basis.fill) as FlagField
    }

    fn apply_mutable(&mut self, source: &Self, flags: FlagField) {
        if flags & 1 != 0 {
            self.fill = source.fill;
        }
    }

    fn encode_mutable(&self, flags: FlagField, buffer: &mut BitBuffer) {
        if flags & 1 != 0 {
            for _ in 0..BULK_BYTES {
                buffer.write(8, self.fill & 0xFF);
            }
        }
    }

    fn decode_mutable(&mut self, flags: FlagField, buffer: &mut BitBuffer) -> Result<(), SerdeErr> {
        if flags & 1 != 0 {
            for _ in 0..BULK_BYTES {
                self.fill = buffer.read(8)?;
            }
        }
        Ok(())
    }
}

struct BulkServer;

impl ServerEntity for BulkServer {
    type State = BulkState;
    type Command = MoveCommand;

    fn new() -> Self {
        Self
    }
}

struct BulkClient;

impl ClientEntity for BulkClient {
    type State = BulkState;
    type Command = MoveCommand;

    fn new() -> Self {
        Self
    }
}

fn bulk_protocol() -> Protocol {
    let mut builder = Protocol::builder();
    builder
        .add_server_entity_type::<PawnServer>()
        .expect("register server pawn");
    builder
        .add_client_entity_type::<PawnClient>()
        .expect("register client pawn");
    builder
        .add_server_entity_type::<BulkServer>()
        .expect("register server bulk");
    builder
        .add_client_entity_type::<BulkClient>()
        .expect("register client bulk");
    builder
        .set_command_type::<MoveCommand>()
        .expect("register command");
    builder.add_event_type::<ChatEvent>().expect("register event");
    builder.build().expect("build protocol")
}

#[test]
fn oversized_entity_is_skipped_but_others_ship() {
    let (server_socket, client_socket) = LocalSocket::pair();

    let mut server = Server::new(bulk_protocol(), SyncConfig::default());
    server.start_room();
    server.add_client(Box::new(server_socket), "oversize-test");

    let mut client = Client::new(bulk_protocol(), SyncConfig::default());
    client.set_peer(Box::new(client_socket));
    client.start_room();

    let pawn_id = server.add_new_entity::<PawnServer>().expect("spawn pawn");
    let bulk_id = server.add_new_entity::<BulkServer>().expect("spawn bulk");

    for _ in 0..10 {
        server.update();
        client.update();
    }

    let room = client.room().expect("client room");
    assert!(room.entity(pawn_id).is_some(), "small entity must ship");
    assert!(
        room.entity(bulk_id).is_none(),
        "oversized entity must be skipped"
    );

    // The small entity keeps replicating normally alongside the skips.
    server
        .room_mut()
        .unwrap()
        .entity_mut(pawn_id)
        .unwrap()
        .state_mut::<PawnState>()
        .unwrap()
        .pos_x = 7;
    for _ in 0..4 {
        server.update();
        client.update();
    }
    assert_eq!(
        client
            .room()
            .unwrap()
            .entity(pawn_id)
            .unwrap()
            .auth_state::<PawnState>()
            .unwrap()
            .pos_x,
        7
    );
}
