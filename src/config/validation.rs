//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Reject unique-field declarations that collide with `_id`
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ApiConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::{ApiConfig, StorageBackend};

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ApiConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::new("limits.max_body_bytes", "must be greater than 0"));
    }

    let storage = &config.storage;
    if storage.collection.is_empty() {
        errors.push(ValidationError::new("storage.collection", "must not be empty"));
    }
    if storage.backend == StorageBackend::Mongodb {
        if !storage.uri.starts_with("mongodb://") && !storage.uri.starts_with("mongodb+srv://") {
            errors.push(ValidationError::new(
                "storage.uri",
                "must use the mongodb:// or mongodb+srv:// scheme",
            ));
        }
        if storage.database.is_empty() {
            errors.push(ValidationError::new("storage.database", "must not be empty"));
        }
    }
    for field in &storage.unique_fields {
        if field.is_empty() || field == "_id" {
            errors.push(ValidationError::new(
                "storage.unique_fields",
                format!("'{}' cannot be declared unique", field),
            ));
        }
    }

    let observability = &config.observability;
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ApiConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = ApiConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.timeouts.request_secs = 0;
        config.storage.unique_fields = vec!["_id".into()];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0].field, "listener.bind_address");
        assert_eq!(errors[1].field, "timeouts.request_secs");
        assert_eq!(errors[2].field, "storage.unique_fields");
    }

    #[test]
    fn test_mongodb_requires_scheme() {
        let mut config = ApiConfig::default();
        config.storage.backend = StorageBackend::Mongodb;
        config.storage.uri = "localhost:27017".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "storage.uri");
    }
}
