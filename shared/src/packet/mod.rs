pub mod client_packet;
pub mod command_update;
pub mod error;
pub mod header;
pub mod server_packet;
pub mod view;

pub use client_packet::ClientPacket;
pub use command_update::CommandUpdate;
pub use error::DecodeError;
pub use header::PacketHeader;
pub use server_packet::ServerPacket;
pub use view::ViewEntry;
