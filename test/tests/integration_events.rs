/// Reliable events: at-most-once delivery with retries over a lossy link.
use orrery_shared::EventBase;
use orrery_test::{ChatEvent, TestPair};

fn chat(message: &str) -> Box<dyn EventBase> {
    Box::new(ChatEvent {
        message: message.to_string(),
    })
}

fn decode_chat(event: &dyn EventBase) -> &ChatEvent {
    event
        .as_any()
        .downcast_ref::<ChatEvent>()
        .expect("chat event")
}

#[test]
fn broadcast_event_reaches_the_client_once() {
    let mut pair = TestPair::new();
    pair.tick_n(2);

    pair.server
        .broadcast_event(chat("hello"), 8)
        .expect("broadcast");

    let mut received = Vec::new();
    for _ in 0..12 {
        let (_, client_events) = pair.tick();
        for event in client_events.events {
            received.push(decode_chat(event.as_ref()).message.clone());
        }
    }

    // Retried in every packet until acked, delivered exactly once.
    assert_eq!(received, vec!["hello".to_string()]);
}

#[test]
fn client_event_survives_a_lossy_stretch() {
    let mut pair = TestPair::new();
    pair.tick_n(2);

    // The first few sends vanish into the downed link.
    pair.client_link.set_up(false);
    pair.client
        .raise_event(chat("are you there"), 16)
        .expect("raise");
    pair.tick_n(4);
    pair.client_link.set_up(true);

    let mut received = Vec::new();
    for _ in 0..12 {
        let (server_events, _) = pair.tick();
        for (peer_id, event) in server_events.events {
            assert_eq!(peer_id, pair.peer_id);
            received.push(decode_chat(event.as_ref()).message.clone());
        }
    }

    assert_eq!(received, vec!["are you there".to_string()]);
}

#[test]
fn exhausted_attempts_drop_the_event() {
    let mut pair = TestPair::new();
    pair.tick_n(2);

    pair.server_link.set_up(false);
    pair.server
        .broadcast_event(chat("doomed"), 2)
        .expect("broadcast");

    // Both attempts burn while the link is down.
    pair.tick_n(10);
    pair.server_link.set_up(true);

    let mut received = Vec::new();
    for _ in 0..12 {
        let (_, client_events) = pair.tick();
        received.extend(client_events.events);
    }
    assert!(received.is_empty(), "event should have been dropped");
}

#[test]
fn events_keep_their_order_within_a_kind() {
    let mut pair = TestPair::new();
    pair.tick_n(2);

    for index in 0..5 {
        pair.server
            .broadcast_event(chat(&format!("m{}", index)), 8)
            .expect("broadcast");
    }

    let mut received = Vec::new();
    for _ in 0..12 {
        let (_, client_events) = pair.tick();
        for event in client_events.events {
            received.push(decode_chat(event.as_ref()).message.clone());
        }
    }

    assert_eq!(received, vec!["m0", "m1", "m2", "m3", "m4"]);
}
