//! In-process post store.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use dashmap::DashMap;
use mongodb::bson::oid::ObjectId;
use serde_json::Value;

use crate::model::{Post, UpdateSummary, ID_FIELD};
use crate::repository::{PostFilter, PostRepository, RepositoryError, DUPLICATE_KEY_CODE};

/// A thread-safe, non-persistent post repository.
///
/// Mirrors the document store's observable behavior: ObjectId identifiers,
/// unique indexes (a missing field indexes as `null`, as in MongoDB) and
/// `$set` updates.
#[derive(Default)]
pub struct MemoryRepository {
    posts: DashMap<String, Post>,
    unique_fields: Vec<String>,
    /// Serializes writes so the unique-key check and the write are one step.
    write_lock: Mutex<()>,
}

impl MemoryRepository {
    pub fn new(unique_fields: Vec<String>) -> Self {
        Self {
            posts: DashMap::new(),
            unique_fields,
            write_lock: Mutex::new(()),
        }
    }

    /// Number of stored posts.
    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Canonical (lowercase hex) key for an id; any spelling of the same
    /// ObjectId maps to one key.
    fn key(id: &str) -> Result<String, RepositoryError> {
        ObjectId::parse_str(id)
            .map(|oid| oid.to_hex())
            .map_err(|_| RepositoryError::InvalidId(id.to_string()))
    }

    /// Fails if `candidate` collides on a unique field with any post other
    /// than `own_id`.
    fn check_unique(&self, own_id: &str, candidate: &Post) -> Result<(), RepositoryError> {
        for field in &self.unique_fields {
            let value = candidate.get(field).unwrap_or(&Value::Null);
            let clash = self.posts.iter().any(|entry| {
                entry.key() != own_id && entry.value().get(field).unwrap_or(&Value::Null) == value
            });
            if clash {
                return Err(duplicate_key(field, value));
            }
        }
        Ok(())
    }
}

fn duplicate_key(field: &str, value: &Value) -> RepositoryError {
    RepositoryError::DuplicateKey {
        message: format!(
            "E{} duplicate key error index: {}_1 dup key: {{ {}: {} }}",
            DUPLICATE_KEY_CODE, field, field, value
        ),
    }
}

#[async_trait]
impl PostRepository for MemoryRepository {
    async fn get_all(&self) -> Result<Vec<Post>, RepositoryError> {
        let mut posts: Vec<Post> = self.posts.iter().map(|r| r.value().clone()).collect();
        // ObjectIds from one process sort in creation order.
        posts.sort_by(|a, b| a.id().cmp(&b.id()));
        Ok(posts)
    }

    async fn get_one(&self, id: &str) -> Result<Option<Post>, RepositoryError> {
        let key = Self::key(id)?;
        Ok(self.posts.get(&key).map(|r| r.value().clone()))
    }

    async fn insert_one(&self, mut post: Post) -> Result<String, RepositoryError> {
        let id = match post.get(ID_FIELD) {
            Some(Value::String(id)) => Self::key(id)?,
            Some(other) => return Err(RepositoryError::InvalidId(other.to_string())),
            None => ObjectId::new().to_hex(),
        };
        post.set_id(id.clone());

        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if self.posts.contains_key(&id) {
            return Err(duplicate_key("_id", &Value::String(id)));
        }
        self.check_unique(&id, &post)?;
        self.posts.insert(id.clone(), post);

        tracing::debug!(id = %id, "Post inserted");
        Ok(id)
    }

    async fn update_one(&self, id: &str, post: Post) -> Result<UpdateSummary, RepositoryError> {
        let key = Self::key(id)?;
        let changes = post.without_id().into_fields();

        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let current = match self.posts.get(&key) {
            Some(r) => r.value().clone(),
            None => return Ok(UpdateSummary::default()),
        };

        let mut fields = current.clone().into_fields();
        fields.extend(changes);
        let updated = Post::new(fields);
        if updated == current {
            return Ok(UpdateSummary { matched_count: 1, modified_count: 0 });
        }

        self.check_unique(&key, &updated)?;
        self.posts.insert(key, updated);
        Ok(UpdateSummary { matched_count: 1, modified_count: 1 })
    }

    async fn delete_one(&self, id: &str) -> Result<u64, RepositoryError> {
        let key = Self::key(id)?;
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.posts.remove(&key).map_or(0, |_| 1))
    }

    async fn count(&self, filter: &PostFilter) -> Result<u64, RepositoryError> {
        let count = match filter {
            PostFilter::All => self.posts.len(),
            PostFilter::ById(id) => match Self::key(id) {
                Ok(key) => usize::from(self.posts.contains_key(&key)),
                Err(_) => 0,
            },
        };
        Ok(count as u64)
    }
}
