//! Error types shared by the store, form validation, and the editor.

use crate::id::EntityId;
use thiserror::Error;

/// A draft, patch, or form input that cannot enter the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("name is required")]
    EmptyName,

    #[error("type is required")]
    MissingType,

    #[error("unknown entity type `{0}`")]
    UnknownType(String),

    #[error("unknown zone `{0}`")]
    UnknownZone(String),

    #[error("unknown tip trigger `{0}`")]
    UnknownTrigger(String),

    #[error("entity {0} cannot connect to itself")]
    SelfConnection(EntityId),

    #[error("connection target {0} does not exist")]
    DanglingConnection(EntityId),

    #[error("duplicate entity id {0}")]
    DuplicateId(EntityId),

    #[error("invalid number for {field}: `{value}`")]
    InvalidNumber { field: &'static str, value: String },

    #[error("position must be finite")]
    NonFinitePosition,

    #[error("no ids left to assign")]
    IdsExhausted,
}

/// Failure of an entity store operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("entity {0} not found")]
    NotFound(EntityId),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

// Errors cross the wasm boundary as their display text.
impl serde::Serialize for ValidationError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl serde::Serialize for StoreError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
