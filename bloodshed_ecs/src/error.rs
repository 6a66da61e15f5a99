//! Errors reported by checked accessors of ECS.
//!
//! Unchecked accessors treat the same conditions as programmer errors
//! and panic with the message of the corresponding variant.

use thiserror::Error;

use crate::EntityHandle;

/// Result of checked ECS operations.
pub type Result<T> = std::result::Result<T, EcsError>;

/// Errors of ECS operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EcsError {
    /// The handle refers to an entity which was erased by a refresh.
    #[error("entity {0:?} was already erased or never existed")]
    StaleHandle(EntityHandle),

    /// The entity is destroyed and does not accept new components.
    #[error("entity {0:?} is queued for destruction")]
    Destroyed(EntityHandle),

    /// The component is not attached to the entity.
    #[error("there is no component `{component}` attached to the entity {entity:?}")]
    MissingComponent {
        entity: EntityHandle,
        component: &'static str,
    },

    /// The component of the same type is already attached to the entity.
    #[error("component `{component}` was already attached to the entity {entity:?}")]
    DuplicateComponent {
        entity: EntityHandle,
        component: &'static str,
    },

    /// The component type was never registered, so no entity can have it.
    #[error("component type `{0}` is not registered")]
    Unregistered(&'static str),
}

impl EcsError {
    pub(crate) fn missing<T>(entity: EntityHandle) -> Self {
        Self::MissingComponent {
            entity,
            component: std::any::type_name::<T>(),
        }
    }
}

/// Unwraps the result or panics with the error message.
#[track_caller]
pub(crate) fn fatal<T>(result: Result<T>) -> T {
    match result {
        Ok(value) => value,
        Err(error) => panic!("{}", error),
    }
}
