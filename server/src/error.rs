use thiserror::Error;

use orrery_shared::{EntityId, PeerId, RegistryError};

/// Errors raised by the server-side API surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServerError {
    /// An operation needed a room, but none has been started.
    #[error("no room has been started")]
    NoRoom,

    #[error("unknown entity {0:?}")]
    UnknownEntity(EntityId),

    #[error("unknown client {0:?}")]
    UnknownPeer(PeerId),

    /// The event value's type was never registered with the protocol.
    #[error("event type is not registered with the protocol")]
    UnknownEventType,

    /// The entity type's state schema was never registered.
    #[error("entity type is not registered with the protocol")]
    UnregisteredEntityType,

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
