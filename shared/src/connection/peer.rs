use log::trace;

use crate::{
    buffers::SequenceHistory,
    config::SyncConfig,
    connection::{events::EventPipeline, remote_clock::RemoteClock},
    packet::header::PacketHeader,
    sequence::SequenceId,
    tick::Tick,
    timer::Timer,
};

/// Per-connection bookkeeping common to both sides: outgoing sequence ids,
/// received-id history, tick acknowledgment, the reliable-event pipeline,
/// the remote-tick estimate and the disconnect timer.
pub struct Peer {
    outgoing_sequence: SequenceId,
    received_history: SequenceHistory,
    last_received_remote_tick: Tick,
    remote_acked_tick: Tick,
    pub events: EventPipeline,
    pub clock: RemoteClock,
    timeout: Timer,
}

impl Peer {
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            outgoing_sequence: SequenceId::INVALID,
            received_history: SequenceHistory::new(config.history_chunks),
            last_received_remote_tick: Tick::INVALID,
            remote_acked_tick: Tick::INVALID,
            events: EventPipeline::new(),
            clock: RemoteClock::new(config.server_send_rate),
            timeout: Timer::new(config.disconnect_timeout),
        }
    }

    /// Newest remote tick seen from this peer.
    pub fn last_received_remote_tick(&self) -> Tick {
        self.last_received_remote_tick
    }

    /// Newest of our ticks the peer has echoed back.
    pub fn remote_acked_tick(&self) -> Tick {
        self.remote_acked_tick
    }

    /// Validates an incoming header. Returns `false` when the packet is
    /// stale or a duplicate and must be dropped undecoded; otherwise
    /// integrates every ack the header carries.
    pub fn register_received(&mut self, header: &PacketHeader) -> bool {
        if !header.sequence.is_valid() || !self.received_history.is_new_id(header.sequence) {
            trace!("dropping stale or duplicate packet {:?}", header.sequence);
            return false;
        }
        self.received_history.store(header.sequence);
        self.timeout.reset();

        if header.sender_tick > self.last_received_remote_tick {
            self.last_received_remote_tick = header.sender_tick;
        }
        self.clock.record_remote(header.sender_tick);
        if header.last_ack_tick > self.remote_acked_tick {
            self.remote_acked_tick = header.last_ack_tick;
        }
        self.events
            .integrate_ack(header.last_ack_event_id, &header.event_acks);
        true
    }

    /// Builds the header for the next outgoing packet, consuming one
    /// sequence id.
    pub fn make_header(&mut self, sender_tick: Tick) -> PacketHeader {
        self.outgoing_sequence = if self.outgoing_sequence.is_valid() {
            self.outgoing_sequence.next()
        } else {
            SequenceId::START
        };
        PacketHeader {
            sequence: self.outgoing_sequence,
            sender_tick,
            last_ack_tick: self.last_received_remote_tick,
            last_ack_event_id: self.events.last_delivered(),
            event_acks: self.events.selective_acks(),
        }
    }

    /// Whether this connection has been silent past the timeout.
    pub fn should_drop(&self) -> bool {
        self.timeout.ringing()
    }
}
