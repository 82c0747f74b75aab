//! # ECS Error Types
//!
//! Every contract violation the runtime can detect. None of these are
//! transient: each one means the calling code is wrong, so nothing here is
//! retried.

use thiserror::Error;

use crate::ecs::{Entity, FamilyKind};

/// Errors reported by the ECS runtime.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// The entity id does not fit the configured population.
    #[error("entity {id} is outside the valid range 1..{max_entities}")]
    EntityOutOfRange {
        /// The offending raw id.
        id: u32,
        /// Configured maximum population (exclusive bound).
        max_entities: u32,
    },

    /// Id 0 was used where an entity was expected.
    #[error("entity id 0 is reserved as invalid")]
    InvalidEntity,

    /// The entity id is in range but not currently alive.
    #[error("entity {0} is not alive")]
    EntityNotAlive(Entity),

    /// Every entity id is in use.
    #[error("entity pool exhausted: {living} living, maximum {max_entities}")]
    EntityCapacityExceeded {
        /// Number of living entities at the time of the request.
        living: u32,
        /// Configured maximum population.
        max_entities: u32,
    },

    /// A type was registered twice with the same registry.
    #[error("{kind} type `{type_name}` is already registered")]
    TypeAlreadyRegistered {
        /// Which registry rejected the type.
        kind: FamilyKind,
        /// Rust type name.
        type_name: &'static str,
    },

    /// A type was used before it was registered.
    #[error("{kind} type `{type_name}` is not registered")]
    TypeNotRegistered {
        /// Which registry was asked.
        kind: FamilyKind,
        /// Rust type name.
        type_name: &'static str,
    },

    /// A registry ran out of family ids.
    #[error("{kind} family ids exhausted (limit {limit}, id 0 reserved)")]
    FamilyCapacityExceeded {
        /// Which registry is full.
        kind: FamilyKind,
        /// Configured limit, including the reserved id 0.
        limit: u8,
    },

    /// The entity already has a component of this type.
    #[error("entity {entity} already has a `{type_name}` component")]
    ComponentAlreadyPresent {
        /// The entity.
        entity: Entity,
        /// Component type name.
        type_name: &'static str,
    },

    /// The entity has no component of this type.
    #[error("entity {entity} has no `{type_name}` component")]
    ComponentMissing {
        /// The entity.
        entity: Entity,
        /// Component type name.
        type_name: &'static str,
    },

    /// The receiver already holds a live subscription.
    #[error("receiver is already subscribed to event family {family}")]
    ReceiverAlreadySubscribed {
        /// Event family of the existing subscription.
        family: u8,
    },

    /// The receiver holds no subscription to this event type.
    #[error("receiver is not subscribed to `{type_name}`")]
    ReceiverNotSubscribed {
        /// Event type name.
        type_name: &'static str,
    },

    /// Configuration values are out of bounds or malformed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be read.
    #[error("failed to read configuration `{path}`: {reason}")]
    ConfigIo {
        /// Path that was read.
        path: String,
        /// Underlying I/O error message.
        reason: String,
    },
}

/// Result type for ECS operations.
pub type EcsResult<T> = Result<T, EcsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offender() {
        let entity = Entity::from_raw(7).unwrap();
        let err = EcsError::ComponentMissing {
            entity,
            type_name: "Position",
        };
        assert_eq!(err.to_string(), "entity #7 has no `Position` component");

        let err = EcsError::TypeNotRegistered {
            kind: FamilyKind::Event,
            type_name: "Ping",
        };
        assert_eq!(err.to_string(), "event type `Ping` is not registered");
    }
}
