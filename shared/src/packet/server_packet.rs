use orrery_serde::BitBuffer;

use crate::{
    connection::events::decode_event_list,
    packet::{error::DecodeError, header::PacketHeader},
    schema::{delta::StateDelta, event::EventBase, protocol::Protocol},
    types::EventId,
};

/// A decoded server-to-client packet: header, reliable events, then the
/// packed state deltas.
pub struct ServerPacket {
    pub header: PacketHeader,
    pub events: Vec<(EventId, Box<dyn EventBase>)>,
    pub deltas: Vec<StateDelta>,
}

impl ServerPacket {
    pub fn decode(protocol: &Protocol, buffer: &mut BitBuffer) -> Result<ServerPacket, DecodeError> {
        let header = PacketHeader::decode(buffer)?;
        let events = decode_event_list(protocol, buffer)?;
        let deltas = buffer.unpack_all(|buf| StateDelta::decode(protocol, buf))?;
        Ok(ServerPacket {
            header,
            events,
            deltas,
        })
    }
}
