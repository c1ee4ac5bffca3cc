use orrery_serde::BitBuffer;

use crate::{
    connection::events::decode_event_list,
    packet::{
        command_update::CommandUpdate, error::DecodeError, header::PacketHeader, view::ViewEntry,
    },
    schema::{event::EventBase, protocol::Protocol},
    types::EventId,
};

/// A decoded client-to-server packet: header, reliable events, the client's
/// acknowledgment view, then one command update per controlled entity.
pub struct ClientPacket {
    pub header: PacketHeader,
    pub events: Vec<(EventId, Box<dyn EventBase>)>,
    pub view: Vec<ViewEntry>,
    pub command_updates: Vec<CommandUpdate>,
}

impl ClientPacket {
    pub fn decode(protocol: &Protocol, buffer: &mut BitBuffer) -> Result<ClientPacket, DecodeError> {
        let header = PacketHeader::decode(buffer)?;
        let events = decode_event_list(protocol, buffer)?;
        let view = buffer.unpack_all(ViewEntry::decode)?;
        let command_updates = buffer.unpack_all(|buf| CommandUpdate::decode(protocol, buf))?;
        Ok(ClientPacket {
            header,
            events,
            view,
            command_updates,
        })
    }
}
