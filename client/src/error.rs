use thiserror::Error;

use orrery_shared::{EntityId, RegistryError};

/// Errors raised by the client-side API surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// An operation needed a room, but none has been started.
    #[error("no room has been started")]
    NoRoom,

    /// An operation needed a server transport, but none has been set.
    #[error("no peer transport has been set")]
    NoPeer,

    #[error("unknown entity {0:?}")]
    UnknownEntity(EntityId),

    /// The event value's type was never registered with the protocol.
    #[error("event type is not registered with the protocol")]
    UnknownEventType,

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
