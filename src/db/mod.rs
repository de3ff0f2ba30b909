pub mod entity;
pub mod feed;
pub mod query;
pub mod sqlite;
pub mod store;

pub use entity::*;
pub use feed::{ChangeEvent, ChangeKind, Subscription};
pub use query::{Direction, Filter, FilterOp, OrderBy, Query};
pub use sqlite::*;
pub use store::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("Constraint violated: {0}")]
    ConstraintViolation(String),

    #[error("Version conflict on {collection}/{id}: expected {expected}, found {actual}")]
    VersionConflict {
        collection: String,
        id: String,
        expected: i64,
        actual: i64,
    },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Invalid {collection} document: {reason}")]
    Validation { collection: String, reason: String },

    #[error("Stored {collection} document {id} is unreadable: {reason}")]
    CorruptDocument {
        collection: String,
        id: String,
        reason: String,
    },

    #[error("Database lock poisoned")]
    LockPoisoned,
}

impl DatabaseError {
    pub(crate) fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }
}
