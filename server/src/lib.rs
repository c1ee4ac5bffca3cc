//! # Orrery Server
//! The authoritative endpoint: simulates the room at a fixed tick rate and
//! ships per-client, delta-compressed snapshots of every in-scope entity
//! over a lossy datagram transport.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

mod connection;
mod entity;
mod error;
mod events;
mod room;
mod scope;
mod server;

pub mod shared {
    pub use orrery_shared::{
        Command, Event, EventBase, Protocol, ProtocolBuilder, ServerEntity, State, SyncConfig,
        Tick, Transport, TransportError, EntityId, PeerId, UpdateOrder,
    };
}

pub use connection::ClientConnection;
pub use entity::HostEntity;
pub use error::ServerError;
pub use events::ServerEvents;
pub use room::ServerRoom;
pub use scope::{FullScopeEvaluator, Scope, ScopeEntry, ScopeEvaluator};
pub use server::Server;
