//! The post document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field holding the document identifier.
pub const ID_FIELD: &str = "_id";

/// A blog post document.
///
/// Apart from `_id` the fields are author-defined and passed through to the
/// repository untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Post(Map<String, Value>);

impl Post {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// The identifier, if present and a string.
    pub fn id(&self) -> Option<&str> {
        self.0.get(ID_FIELD).and_then(Value::as_str)
    }

    pub fn set_id(&mut self, id: String) {
        self.0.insert(ID_FIELD.to_string(), Value::String(id));
    }

    /// The post with `_id` removed, as applied by updates.
    pub fn without_id(mut self) -> Self {
        self.0.remove(ID_FIELD);
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_accessors() {
        let mut post: Post = serde_json::from_value(json!({"title": "Hello"})).unwrap();
        assert_eq!(post.id(), None);

        post.set_id("65f1c0ffee0000000000beef".into());
        assert_eq!(post.id(), Some("65f1c0ffee0000000000beef"));

        let stripped = post.without_id();
        assert_eq!(stripped.id(), None);
        assert_eq!(stripped.get("title"), Some(&json!("Hello")));
    }

    #[test]
    fn test_non_string_id_is_ignored() {
        let post: Post = serde_json::from_value(json!({"_id": 42})).unwrap();
        assert_eq!(post.id(), None);
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let post: Post = serde_json::from_value(json!({"_id": "a", "body": "text"})).unwrap();
        assert_eq!(serde_json::to_value(&post).unwrap(), json!({"_id": "a", "body": "text"}));
    }
}
