//! Error types for schema reconciliation

use std::path::PathBuf;

use thiserror::Error;

use crate::registry::RegistryError;
use crate::schema::SchemaType;

/// Result type for reconciliation operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Reconciliation errors
///
/// Every variant is fatal: a run either returns its full action list or
/// one of these.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read kafka file {path}: {source}")]
    KafkaFileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse kafka file {path}: {source}")]
    KafkaFileParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid declaration for topic {topic} in {path}: {source}")]
    InvalidTopic {
        path: PathBuf,
        topic: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid topic name '{name}': {reason}")]
    InvalidTopicName { name: String, reason: String },

    #[error("Duplicate topic '{0}' in kafka file")]
    DuplicateTopic(String),

    #[error("Unsupported schema file extension for {path}: must be one of .avsc, .json or .proto")]
    UnsupportedExtension { path: PathBuf },

    #[error("Failed to read schema file {path}: {source}")]
    SchemaRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {schema_type} schema for subject {subject}: {source}")]
    SchemaParse {
        subject: String,
        schema_type: SchemaType,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to list registry subjects: {0}")]
    ListSubjects(#[source] RegistryError),

    #[error("Registry error for subject {subject}: {source}")]
    Registry {
        subject: String,
        #[source]
        source: RegistryError,
    },

    #[error("Subject {0} is not compatible with latest schema")]
    Incompatible(String),
}

impl SchemaError {
    /// Tag a registry failure with the subject it concerns
    pub fn registry(subject: impl Into<String>, source: RegistryError) -> Self {
        SchemaError::Registry {
            subject: subject.into(),
            source,
        }
    }

    /// The subject this error concerns, if any
    pub fn subject(&self) -> Option<&str> {
        match self {
            SchemaError::SchemaParse { subject, .. }
            | SchemaError::Registry { subject, .. } => Some(subject),
            SchemaError::Incompatible(subject) => Some(subject),
            _ => None,
        }
    }

    /// Whether the failure happened before any registry interaction
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SchemaError::Config(_)
                | SchemaError::KafkaFileRead { .. }
                | SchemaError::KafkaFileParse { .. }
                | SchemaError::InvalidTopic { .. }
                | SchemaError::InvalidTopicName { .. }
                | SchemaError::DuplicateTopic(_)
                | SchemaError::UnsupportedExtension { .. }
                | SchemaError::SchemaRead { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incompatible_names_subject() {
        let err = SchemaError::Incompatible("orders-value".to_string());
        assert_eq!(err.subject(), Some("orders-value"));
        assert!(err.to_string().contains("orders-value"));
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_registry_error_tagged_with_subject() {
        let err = SchemaError::registry(
            "orders-key",
            RegistryError::Api {
                status: 404,
                error_code: Some(40401),
                message: "Subject not found".to_string(),
            },
        );
        assert_eq!(err.subject(), Some("orders-key"));
        assert!(err.to_string().contains("orders-key"));
    }

    #[test]
    fn test_unsupported_extension_is_configuration() {
        let err = SchemaError::UnsupportedExtension {
            path: PathBuf::from("schemas/order.xml"),
        };
        assert!(err.is_configuration());
        assert!(err.to_string().contains("order.xml"));
    }
}
