//! MongoDB-backed post store.

use async_trait::async_trait;
use mongodb::bson::{self, doc, oid::ObjectId, Bson, Document};
use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, IndexModel};

use crate::config::StorageConfig;
use crate::model::{Post, UpdateSummary, ID_FIELD};
use crate::repository::{PostFilter, PostRepository, RepositoryError, DUPLICATE_KEY_CODE};

impl From<MongoError> for RepositoryError {
    fn from(err: MongoError) -> Self {
        match err.kind.as_ref() {
            ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY_CODE => {
                RepositoryError::DuplicateKey {
                    message: write.message.clone(),
                }
            }
            ErrorKind::Write(WriteFailure::WriteError(write)) => RepositoryError::Database {
                code: Some(write.code),
                message: write.message.clone(),
            },
            ErrorKind::Command(command) => RepositoryError::Database {
                code: Some(command.code),
                message: command.message.clone(),
            },
            ErrorKind::BsonSerialization(e) => RepositoryError::Serialization(e.to_string()),
            ErrorKind::BsonDeserialization(e) => RepositoryError::Serialization(e.to_string()),
            _ => RepositoryError::Database {
                code: None,
                message: err.to_string(),
            },
        }
    }
}

/// Post repository over a single MongoDB collection.
///
/// The driver's `Client` pools connections and is safe to share, so one
/// instance serves every request.
pub struct MongoRepository {
    collection: Collection<Document>,
}

impl MongoRepository {
    /// Connect, verify the server answers, and ensure unique indexes exist.
    pub async fn connect(config: &StorageConfig) -> Result<Self, RepositoryError> {
        let client = Client::with_uri_str(&config.uri).await?;
        let database = client.database(&config.database);
        database.run_command(doc! { "ping": 1 }).await?;

        let repository = Self {
            collection: database.collection(&config.collection),
        };
        repository.ensure_indexes(&config.unique_fields).await?;

        tracing::info!(
            database = %config.database,
            collection = %config.collection,
            "Connected to MongoDB"
        );
        Ok(repository)
    }

    async fn ensure_indexes(&self, unique_fields: &[String]) -> Result<(), RepositoryError> {
        for field in unique_fields {
            let index = IndexModel::builder()
                .keys(doc! { field.as_str(): 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build();
            self.collection.create_index(index).await?;
            tracing::debug!(field = %field, "Unique index ensured");
        }
        Ok(())
    }
}

fn parse_id(id: &str) -> Result<ObjectId, RepositoryError> {
    ObjectId::parse_str(id).map_err(|_| RepositoryError::InvalidId(id.to_string()))
}

fn to_document(post: &Post) -> Result<Document, RepositoryError> {
    let mut document =
        bson::to_document(post).map_err(|e| RepositoryError::Serialization(e.to_string()))?;
    match post.get(ID_FIELD) {
        Some(serde_json::Value::String(id)) => {
            document.insert(ID_FIELD, parse_id(id)?);
        }
        Some(other) => return Err(RepositoryError::InvalidId(other.to_string())),
        None => {}
    }
    Ok(document)
}

fn to_post(mut document: Document) -> Post {
    if let Ok(id) = document.get_object_id(ID_FIELD) {
        document.insert(ID_FIELD, id.to_hex());
    }
    match Bson::Document(document).into_relaxed_extjson() {
        serde_json::Value::Object(fields) => Post::new(fields),
        _ => Post::default(),
    }
}

#[async_trait]
impl PostRepository for MongoRepository {
    async fn get_all(&self) -> Result<Vec<Post>, RepositoryError> {
        let mut cursor = self.collection.find(doc! {}).await?;
        let mut posts = Vec::new();
        while cursor.advance().await? {
            posts.push(to_post(cursor.deserialize_current()?));
        }
        Ok(posts)
    }

    async fn get_one(&self, id: &str) -> Result<Option<Post>, RepositoryError> {
        let filter = doc! { ID_FIELD: parse_id(id)? };
        let document = self.collection.find_one(filter).await?;
        Ok(document.map(to_post))
    }

    async fn insert_one(&self, post: Post) -> Result<String, RepositoryError> {
        let document = to_document(&post)?;
        let result = self.collection.insert_one(document).await?;
        let id = match result.inserted_id {
            Bson::ObjectId(oid) => oid.to_hex(),
            Bson::String(s) => s,
            other => other.to_string(),
        };
        Ok(id)
    }

    async fn update_one(&self, id: &str, post: Post) -> Result<UpdateSummary, RepositoryError> {
        let oid = parse_id(id)?;
        let changes = to_document(&post.without_id())?;

        // An empty `$set` is rejected by the server; report the match only.
        if changes.is_empty() {
            let matched = self.collection.count_documents(doc! { ID_FIELD: oid }).await?;
            return Ok(UpdateSummary {
                matched_count: matched,
                modified_count: 0,
            });
        }

        let result = self
            .collection
            .update_one(doc! { ID_FIELD: oid }, doc! { "$set": changes })
            .await?;
        Ok(UpdateSummary {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
        })
    }

    async fn delete_one(&self, id: &str) -> Result<u64, RepositoryError> {
        let result = self
            .collection
            .delete_one(doc! { ID_FIELD: parse_id(id)? })
            .await?;
        Ok(result.deleted_count)
    }

    async fn count(&self, filter: &PostFilter) -> Result<u64, RepositoryError> {
        let filter = match filter {
            PostFilter::All => doc! {},
            PostFilter::ById(id) => match ObjectId::parse_str(id) {
                Ok(oid) => doc! { ID_FIELD: oid },
                Err(_) => return Ok(0),
            },
        };
        Ok(self.collection.count_documents(filter).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::DateTime;
    use mongodb::error::WriteError;
    use serde_json::json;

    #[test]
    fn test_to_document_converts_id() {
        let id = ObjectId::new();
        let post: Post = serde_json::from_value(json!({"_id": id.to_hex(), "title": "t"})).unwrap();

        let document = to_document(&post).unwrap();
        assert_eq!(document.get_object_id("_id").unwrap(), id);
        assert_eq!(document.get_str("title").unwrap(), "t");
    }

    #[test]
    fn test_to_document_rejects_bad_id() {
        let post: Post = serde_json::from_value(json!({"_id": "nope"})).unwrap();
        assert_eq!(
            to_document(&post).unwrap_err(),
            RepositoryError::InvalidId("nope".into())
        );
    }

    #[test]
    fn test_to_document_rejects_non_string_id() {
        let post: Post = serde_json::from_value(json!({"_id": 42, "title": "t"})).unwrap();
        assert_eq!(
            to_document(&post).unwrap_err(),
            RepositoryError::InvalidId("42".into())
        );
    }

    fn write_error(code: i32, message: &str) -> MongoError {
        let write: WriteError =
            bson::from_document(doc! { "code": code, "errmsg": message }).unwrap();
        ErrorKind::Write(WriteFailure::WriteError(write)).into()
    }

    #[test]
    fn test_duplicate_key_write_error_maps_to_duplicate_key() {
        let message = "E11000 duplicate key error collection: blog.posts index: slug_1 dup key: { slug: \"intro\" }";
        let err = RepositoryError::from(write_error(DUPLICATE_KEY_CODE, message));

        assert!(err.is_duplicate_key());
        assert_eq!(err.code(), Some(DUPLICATE_KEY_CODE));
        assert_eq!(err.to_string(), message);
    }

    #[test]
    fn test_other_write_error_keeps_code() {
        let err = RepositoryError::from(write_error(121, "Document failed validation"));
        assert_eq!(
            err,
            RepositoryError::Database {
                code: Some(121),
                message: "Document failed validation".into(),
            }
        );
    }

    #[test]
    fn test_to_post_stringifies_id() {
        let id = ObjectId::new();
        let post = to_post(doc! { "_id": id, "title": "t", "views": 3, "at": DateTime::from_millis(0) });

        assert_eq!(post.id(), Some(id.to_hex().as_str()));
        assert_eq!(post.get("title"), Some(&json!("t")));
        assert_eq!(post.get("views"), Some(&json!(3)));
        assert!(post.get("at").is_some());
    }
}
