//! # Orrery Shared
//! Common functionality shared between the orrery-server & orrery-client
//! crates: tick and sequence arithmetic, the dejitter/history buffers, the
//! schema registry and state-delta codec, packet framing, and the per-peer
//! connection base.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

pub mod buffers;
pub mod config;
pub mod connection;
pub mod packet;
pub mod pool;
pub mod schema;
pub mod sequence;
pub mod tick;
pub mod timer;
pub mod transport;
pub mod types;

pub use buffers::{DejitterBuffer, QueueBuffer, SequenceHistory, Timestamped};
pub use config::SyncConfig;
pub use connection::{decode_event_list, EventPipeline, OutgoingEvent, Peer, RemoteClock};
pub use packet::{
    ClientPacket, CommandUpdate, DecodeError, PacketHeader, ServerPacket, ViewEntry,
};
pub use pool::Pool;
pub use schema::{
    command::{Command, CommandBase, CommandFrame},
    delta::{create_delta, create_frozen_delta, StateDelta, StatePayload},
    entity::{ClientEntity, HostHooks, RemoteHooks, ServerEntity},
    error::RegistryError,
    event::{Event, EventBase},
    protocol::{Protocol, ProtocolBuilder},
    record::StateRecord,
    state::{State, StateBase},
};
pub use sequence::{
    sequence_greater_than, sequence_less_than, wrapping_delta, SequenceId, SEQUENCE_ID_BITS,
};
pub use tick::Tick;
pub use timer::Timer;
pub use transport::{Transport, TransportError};
pub use types::{
    flags_all, EntityId, EventId, EventKind, FactoryType, FlagField, PeerId, UpdateOrder,
};

// Re-export the bit-level layer so dependents reach everything through one
// crate, the same way schema implementations do.
pub use orrery_serde::{
    bits_for_range, BitBuffer, FloatCompressor, IntCompressor, SerdeErr, WritePosition,
    PACK_MAX_ELEMENTS, STRING_LENGTH_MAX, VARINT_FALLBACK_SIZE,
};
