//! # Orrery Client
//! The predicting endpoint: receives delta-compressed authoritative
//! snapshots into a replicated room, locally predicts the outcome of its
//! own commands, and reconciles against the server as updates arrive.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

mod client;
mod connection;
mod entity;
mod error;
mod events;
mod room;
mod view;

pub mod shared {
    pub use orrery_shared::{
        ClientEntity, Command, Event, EventBase, Protocol, ProtocolBuilder, State, SyncConfig,
        Tick, Transport, TransportError, EntityId,
    };
}

pub use client::Client;
pub use connection::ServerConnection;
pub use entity::RemoteEntity;
pub use error::ClientError;
pub use events::ClientEvents;
pub use room::ClientRoom;
pub use view::View;
