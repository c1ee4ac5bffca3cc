/// E2E: freeze and unfreeze. An entity leaving the client's scope ships a
/// freeze marker (`on_frozen` fires once); returning to scope ships a live
/// delta (`on_unfrozen` fires once).
use std::sync::{
    atomic::{AtomicBool, AtomicU32, Ordering},
    Arc,
};

use orrery_client::Client;
use orrery_server::{ScopeEvaluator, Server};
use orrery_shared::{
    ClientEntity, Protocol, SyncConfig, Tick, EntityId, FactoryType,
};
use orrery_test::{ChatEvent, LocalSocket, MoveCommand, PawnServer, PawnState};

static FROZEN_COUNT: AtomicU32 = AtomicU32::new(0);
static UNFROZEN_COUNT: AtomicU32 = AtomicU32::new(0);

struct CountingPawnClient;

impl ClientEntity for CountingPawnClient {
    type State = PawnState;
    type Command = MoveCommand;

    fn new() -> Self {
        Self
    }

    fn on_frozen(&mut self) {
        FROZEN_COUNT.fetch_add(1, Ordering::SeqCst);
    }

    fn on_unfrozen(&mut self) {
        UNFROZEN_COUNT.fetch_add(1, Ordering::SeqCst);
    }

    fn update_frozen(&mut self, _tick: Tick) {}
}

fn counting_client_protocol() -> Protocol {
    let mut builder = Protocol::builder();
    builder
        .add_client_entity_type::<CountingPawnClient>()
        .expect("register counting pawn");
    builder
        .set_command_type::<MoveCommand>()
        .expect("register command");
    builder.add_event_type::<ChatEvent>().expect("register event");
    builder.build().expect("build protocol")
}

struct ToggleEvaluator {
    visible: Arc<AtomicBool>,
}

impl ScopeEvaluator for ToggleEvaluator {
    fn is_in_scope(&mut self, _entity_id: EntityId, _factory_type: FactoryType) -> bool {
        self.visible.load(Ordering::SeqCst)
    }
}

#[test]
fn freeze_and_unfreeze_fire_hooks_once() {
    let (server_socket, client_socket) = LocalSocket::pair();

    let mut server = Server::new(orrery_test::protocol(), SyncConfig::default());
    server.start_room();
    let peer_id = server.add_client(Box::new(server_socket), "freeze-test");

    let mut client = Client::new(counting_client_protocol(), SyncConfig::default());
    client.set_peer(Box::new(client_socket));
    client.start_room();

    let visible = Arc::new(AtomicBool::new(true));
    server
        .set_scope_evaluator(
            peer_id,
            Box::new(ToggleEvaluator {
                visible: visible.clone(),
            }),
        )
        .expect("install evaluator");

    let entity_id = server.add_new_entity::<PawnServer>().expect("spawn pawn");

    let mut tick_pair = |server: &mut Server, client: &mut Client, count: usize| {
        for _ in 0..count {
            server.update();
            client.update();
        }
    };

    tick_pair(&mut server, &mut client, 5);
    {
        let entity = client
            .room()
            .unwrap()
            .entity(entity_id)
            .expect("replicated entity");
        assert!(!entity.is_frozen());
    }
    assert_eq!(FROZEN_COUNT.load(Ordering::SeqCst), 0);

    // Out of scope: a freeze marker ships and the hook fires exactly once.
    visible.store(false, Ordering::SeqCst);
    tick_pair(&mut server, &mut client, 8);
    {
        let entity = client
            .room()
            .unwrap()
            .entity(entity_id)
            .expect("replicated entity");
        assert!(entity.is_frozen());
    }
    assert_eq!(FROZEN_COUNT.load(Ordering::SeqCst), 1);
    assert_eq!(UNFROZEN_COUNT.load(Ordering::SeqCst), 0);

    // Back in scope: a live delta restores the entity exactly once.
    visible.store(true, Ordering::SeqCst);
    tick_pair(&mut server, &mut client, 8);
    {
        let entity = client
            .room()
            .unwrap()
            .entity(entity_id)
            .expect("replicated entity");
        assert!(!entity.is_frozen());
    }
    assert_eq!(FROZEN_COUNT.load(Ordering::SeqCst), 1);
    assert_eq!(UNFROZEN_COUNT.load(Ordering::SeqCst), 1);
}
