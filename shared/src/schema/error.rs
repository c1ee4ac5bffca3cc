use thiserror::Error;

/// Errors raised while assembling or querying a protocol registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The same entity schema was registered twice for one side.
    #[error("entity type {name} is already registered for this side")]
    DuplicateEntityType { name: &'static str },

    /// A command schema was registered twice.
    #[error("command type {name} conflicts with the already registered {registered}")]
    DuplicateCommandType {
        name: &'static str,
        registered: &'static str,
    },

    /// The same event schema was registered twice.
    #[error("event type {name} is already registered")]
    DuplicateEventType { name: &'static str },

    /// Entities were registered but no command schema was set.
    #[error("protocol has entity types but no command type")]
    MissingCommandType,

    /// An entity's associated command schema is not the registered one.
    #[error("entity type {name} uses a command type other than the registered one")]
    CommandTypeMismatch { name: &'static str },

    /// More entity or event schemas than the 8-bit discriminator can carry.
    #[error("too many registered types ({count}) for an 8-bit discriminator")]
    TooManyTypes { count: usize },

    /// A lookup asked for behavior the registry has no builder for on this
    /// side (e.g. server hooks from a client-only registration).
    #[error("factory type {factory_type} has no registered behavior for this side")]
    MissingBehavior { factory_type: u8 },
}
