use orrery_serde::BitBuffer;

use crate::{
    packet::error::DecodeError,
    sequence::SequenceId,
    tick::Tick,
    types::EventId,
};

const ACK_COUNT_BITS: u8 = 8;
const ACK_COUNT_MAX: usize = 255;

/// Fields every packet begins with, both directions.
///
/// The sequence id leads so a stale packet is droppable before any payload
/// decoding. The ack fields echo what this side has received: the most
/// recent remote tick, the highest contiguous reliable-event id, and the
/// delivered event ids above that gap.
pub struct PacketHeader {
    pub sequence: SequenceId,
    pub sender_tick: Tick,
    pub last_ack_tick: Tick,
    pub last_ack_event_id: EventId,
    pub event_acks: Vec<EventId>,
}

impl PacketHeader {
    pub fn encode(&self, buffer: &mut BitBuffer) {
        self.sequence.encode(buffer);
        self.sender_tick.encode(buffer);
        self.last_ack_tick.encode(buffer);
        self.last_ack_event_id.encode(buffer);

        debug_assert!(self.event_acks.len() <= ACK_COUNT_MAX);
        let count = self.event_acks.len().min(ACK_COUNT_MAX);
        buffer.write(ACK_COUNT_BITS, count as u32);
        for ack in self.event_acks.iter().take(count) {
            ack.encode(buffer);
        }
    }

    pub fn decode(buffer: &mut BitBuffer) -> Result<PacketHeader, DecodeError> {
        let sequence = SequenceId::decode(buffer)?;
        let sender_tick = Tick::decode(buffer)?;
        let last_ack_tick = Tick::decode(buffer)?;
        let last_ack_event_id = EventId::decode(buffer)?;

        let count = buffer.read(ACK_COUNT_BITS)? as usize;
        let mut event_acks = Vec::with_capacity(count);
        for _ in 0..count {
            event_acks.push(EventId::decode(buffer)?);
        }

        Ok(PacketHeader {
            sequence,
            sender_tick,
            last_ack_tick,
            last_ack_event_id,
            event_acks,
        })
    }
}
