use std::collections::{BTreeSet, VecDeque};
use std::fmt;

use log::warn;

use orrery_serde::BitBuffer;

use crate::{
    packet::error::DecodeError,
    schema::{event::EventBase, protocol::Protocol},
    types::{EventId, EventKind},
};

const SELECTIVE_ACK_MAX: usize = 255;

/// A reliable event waiting in a peer's send queue.
pub struct OutgoingEvent {
    pub id: EventId,
    pub kind: EventKind,
    pub attempts_left: u16,
    pub event: Box<dyn EventBase>,
}

impl fmt::Debug for OutgoingEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "OutgoingEvent({:?}, kind {}, {} attempts left)",
            self.id, self.kind.0, self.attempts_left
        )
    }
}

/// Per-peer reliable-event pipeline over unreliable datagrams.
///
/// Outgoing: events get a monotonic id and ride in every packet, lowest id
/// first, until acknowledged or out of attempts (at-most-once-with-retries;
/// no ordering guarantee across kinds). Incoming: delivery is deduplicated
/// against the highest contiguously delivered id plus the set of delivered
/// ids above it; that pair is echoed back as the ack.
pub struct EventPipeline {
    next_id: EventId,
    pending: VecDeque<OutgoingEvent>,
    delivered_contiguous: EventId,
    delivered_ahead: BTreeSet<u32>,
}

impl EventPipeline {
    pub fn new() -> Self {
        Self {
            next_id: EventId::from_raw(1),
            pending: VecDeque::new(),
            delivered_contiguous: EventId::INVALID,
            delivered_ahead: BTreeSet::new(),
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Queues an event for reliable delivery with the given send budget.
    pub fn queue(&mut self, kind: EventKind, event: Box<dyn EventBase>, attempts: u16) {
        debug_assert!(attempts > 0);
        let id = self.next_id;
        self.next_id = self.next_id.next();
        self.pending.push_back(OutgoingEvent {
            id,
            kind,
            attempts_left: attempts,
            event,
        });
    }

    /// Packs pending events into the buffer, capped at `max_total_bytes`
    /// of absolute buffer size and `max_item_bytes` apiece. Every packed
    /// event spends one attempt; events out of attempts are dropped with a
    /// warning.
    pub fn write_events(
        &mut self,
        protocol: &Protocol,
        buffer: &mut BitBuffer,
        max_total_bytes: usize,
        max_item_bytes: usize,
    ) -> u8 {
        let mut packed: Vec<EventId> = Vec::new();

        let count = buffer.pack_to_size(
            max_total_bytes,
            max_item_bytes,
            self.pending.iter(),
            |buf, outgoing| {
                protocol.write_event_kind(buf, outgoing.kind);
                outgoing.id.encode(buf);
                outgoing.event.write(buf);
            },
            |outgoing| packed.push(outgoing.id),
        );

        for outgoing in &mut self.pending {
            if packed.contains(&outgoing.id) {
                outgoing.attempts_left -= 1;
            }
        }
        self.pending.retain(|outgoing| {
            if outgoing.attempts_left == 0 {
                warn!("reliable event {:?} exhausted its attempts, dropping", outgoing.id);
                false
            } else {
                true
            }
        });

        count
    }

    /// Processes one received event; returns it iff it has not been
    /// delivered before.
    pub fn receive(
        &mut self,
        id: EventId,
        event: Box<dyn EventBase>,
    ) -> Option<Box<dyn EventBase>> {
        let raw = id.raw();
        let contiguous = self.delivered_contiguous.raw();
        if raw <= contiguous || self.delivered_ahead.contains(&raw) {
            return None;
        }

        if raw == contiguous + 1 {
            let mut advanced = raw;
            while self.delivered_ahead.remove(&(advanced + 1)) {
                advanced += 1;
            }
            self.delivered_contiguous = EventId::from_raw(advanced);
        } else {
            self.delivered_ahead.insert(raw);
        }
        Some(event)
    }

    /// Highest contiguously delivered id, echoed in every outgoing header.
    pub fn last_delivered(&self) -> EventId {
        self.delivered_contiguous
    }

    /// Delivered ids above the contiguous point, for selective acks.
    pub fn selective_acks(&self) -> Vec<EventId> {
        self.delivered_ahead
            .iter()
            .take(SELECTIVE_ACK_MAX)
            .map(|raw| EventId::from_raw(*raw))
            .collect()
    }

    /// Integrates the remote's acks into the send queue.
    pub fn integrate_ack(&mut self, last_ack: EventId, selective: &[EventId]) {
        self.pending.retain(|outgoing| {
            outgoing.id > last_ack && !selective.contains(&outgoing.id)
        });
    }
}

impl Default for EventPipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Decodes a packed event list: kind, id, then the event payload, per item.
pub fn decode_event_list(
    protocol: &Protocol,
    buffer: &mut BitBuffer,
) -> Result<Vec<(EventId, Box<dyn EventBase>)>, DecodeError> {
    buffer.unpack_all(|buf| {
        let kind = protocol.read_event_kind(buf)?;
        let id = EventId::decode(buf)?;
        let mut event = protocol
            .new_event(kind)
            .map_err(|_| DecodeError::UnknownEventKind(kind.0))?;
        event.read(buf)?;
        Ok::<_, DecodeError>((id, event))
    })
}
