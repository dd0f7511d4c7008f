use thiserror::Error;

/// Errors that can occur during table and store operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },
    #[error("{entity_type} already exists: {id}")]
    AlreadyExists {
        entity_type: &'static str,
        id: String,
    },
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Query failed: {0}")]
    QueryFailed(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Operation cancelled")]
    Cancelled,
    #[error("Operation deadline exceeded")]
    DeadlineExceeded,
}

impl RepositoryError {
    /// Shorthand for a `NotFound` on an item addressed by its keys.
    pub fn item_not_found(pk: &str, sk: &str) -> Self {
        RepositoryError::NotFound {
            entity_type: "Item",
            id: format!("{pk}/{sk}"),
        }
    }

    /// Shorthand for an `AlreadyExists` on an item addressed by its keys.
    pub fn item_exists(pk: &str, sk: &str) -> Self {
        RepositoryError::AlreadyExists {
            entity_type: "Item",
            id: format!("{pk}/{sk}"),
        }
    }

    /// Returns true for `NotFound`.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;
