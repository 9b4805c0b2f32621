//! Post persistence subsystem.
//!
//! # Data Flow
//! ```text
//! startup
//!     → connect(StorageConfig)
//!     → MemoryRepository | MongoRepository
//!     → Arc<dyn PostRepository> injected into the HTTP state
//!
//! per request
//!     → handler calls one repository method per step
//!     → RepositoryError carries name / message / code back to the handler
//! ```
//!
//! # Design Decisions
//! - The repository owns uniqueness; handlers never pre-check duplicates
//! - Identifiers are ObjectId hex strings in transport
//! - Updates have `$set` semantics: unspecified fields are left alone

pub mod memory;
pub mod mongo;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{StorageBackend, StorageConfig};
use crate::model::{Post, UpdateSummary};

pub use memory::MemoryRepository;
pub use mongo::MongoRepository;

/// Server error code for a unique index violation.
pub const DUPLICATE_KEY_CODE: i32 = 11000;

/// Errors surfaced by a [`PostRepository`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    /// A unique key constraint rejected the write.
    #[error("{message}")]
    DuplicateKey { message: String },

    /// The identifier is not a well-formed ObjectId.
    #[error("'{0}' is not a valid ObjectId")]
    InvalidId(String),

    /// Any other failure reported by the store.
    #[error("{message}")]
    Database { code: Option<i32>, message: String },

    /// A document could not be converted to or from the store's format.
    #[error("{0}")]
    Serialization(String),
}

impl RepositoryError {
    /// Category name reported as the envelope `type`.
    pub fn name(&self) -> &'static str {
        match self {
            RepositoryError::DuplicateKey { .. } => "DuplicateKeyError",
            RepositoryError::InvalidId(_) => "InvalidIdError",
            RepositoryError::Database { .. } => "DatabaseError",
            RepositoryError::Serialization(_) => "SerializationError",
        }
    }

    /// Numeric code, when the store supplied one.
    pub fn code(&self) -> Option<i32> {
        match self {
            RepositoryError::DuplicateKey { .. } => Some(DUPLICATE_KEY_CODE),
            RepositoryError::Database { code, .. } => *code,
            _ => None,
        }
    }

    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, RepositoryError::DuplicateKey { .. })
    }
}

/// Filters understood by [`PostRepository::count`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostFilter {
    All,
    ById(String),
}

/// CRUD access to post documents.
///
/// Implementations must be safe to share across concurrent requests.
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn get_all(&self) -> Result<Vec<Post>, RepositoryError>;

    /// `None` when no document has this id.
    async fn get_one(&self, id: &str) -> Result<Option<Post>, RepositoryError>;

    /// Stores a new post and returns its assigned identifier.
    async fn insert_one(&self, post: Post) -> Result<String, RepositoryError>;

    /// Merges `post`'s fields into the document with this id. `_id` in the
    /// payload is ignored.
    async fn update_one(&self, id: &str, post: Post) -> Result<UpdateSummary, RepositoryError>;

    /// Returns the number of deleted documents (0 or 1).
    async fn delete_one(&self, id: &str) -> Result<u64, RepositoryError>;

    /// Ill-formed ids never match, so they count as 0 rather than failing.
    async fn count(&self, filter: &PostFilter) -> Result<u64, RepositoryError>;
}

/// Build the repository selected by the configuration.
pub async fn connect(config: &StorageConfig) -> Result<Arc<dyn PostRepository>, RepositoryError> {
    match config.backend {
        StorageBackend::Memory => {
            tracing::info!(
                unique_fields = ?config.unique_fields,
                "Using in-memory post repository"
            );
            Ok(Arc::new(MemoryRepository::new(config.unique_fields.clone())))
        }
        StorageBackend::Mongodb => {
            let repository = MongoRepository::connect(config).await?;
            Ok(Arc::new(repository))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_names_and_codes() {
        let dup = RepositoryError::DuplicateKey { message: "dup".into() };
        assert_eq!(dup.name(), "DuplicateKeyError");
        assert_eq!(dup.code(), Some(DUPLICATE_KEY_CODE));
        assert!(dup.is_duplicate_key());

        let invalid = RepositoryError::InvalidId("xyz".into());
        assert_eq!(invalid.name(), "InvalidIdError");
        assert_eq!(invalid.code(), None);
        assert_eq!(invalid.to_string(), "'xyz' is not a valid ObjectId");

        let db = RepositoryError::Database { code: Some(13), message: "unauthorized".into() };
        assert_eq!(db.code(), Some(13));
        assert_eq!(db.to_string(), "unauthorized");
    }

    #[tokio::test]
    async fn test_connect_memory_backend() {
        let repository = connect(&StorageConfig::default()).await.unwrap();
        assert_eq!(repository.count(&PostFilter::All).await.unwrap(), 0);
    }
}
