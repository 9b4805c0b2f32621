//! The `{type, content}` response envelope.

use serde::{Deserialize, Serialize};

/// `type` of every successful envelope.
pub const SUCCESS: &str = "Success";

/// Uniform response wrapper for success and error outcomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message<T> {
    #[serde(rename = "type")]
    pub kind: String,
    pub content: T,
}

impl<T> Message<T> {
    pub fn success(content: T) -> Self {
        Self {
            kind: SUCCESS.to_string(),
            content,
        }
    }

    pub fn is_success(&self) -> bool {
        self.kind == SUCCESS
    }
}

impl Message<String> {
    pub fn error(kind: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            content: content.into(),
        }
    }
}

/// What the repository reports for an update-by-id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSummary {
    pub matched_count: u64,
    pub modified_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_shape() {
        let ok = Message::success("abc");
        assert_eq!(serde_json::to_value(&ok).unwrap(), json!({"type": "Success", "content": "abc"}));

        let err = Message::error("DuplicateKeyError", "E11000 duplicate key");
        assert!(!err.is_success());
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"type": "DuplicateKeyError", "content": "E11000 duplicate key"})
        );
    }

    #[test]
    fn test_update_summary_is_camel_case() {
        let summary = UpdateSummary { matched_count: 1, modified_count: 0 };
        assert_eq!(
            serde_json::to_value(summary).unwrap(),
            json!({"matchedCount": 1, "modifiedCount": 0})
        );
    }
}
