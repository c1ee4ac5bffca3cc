use thiserror::Error;

use orrery_serde::SerdeErr;

use crate::schema::error::RegistryError;

/// Errors raised while decoding a received payload. A failed decode rejects
/// the whole packet; no partially decoded state is kept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Serde(#[from] SerdeErr),

    /// The payload names an entity schema this protocol never registered.
    #[error("unknown factory type {0}")]
    UnknownFactoryType(u8),

    /// The payload names an event schema this protocol never registered.
    #[error("unknown event kind {0}")]
    UnknownEventKind(u8),

    /// A registry lookup failed mid-decode (missing builder for this side).
    #[error(transparent)]
    Registry(#[from] RegistryError),
}
