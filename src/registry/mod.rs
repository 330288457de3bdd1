//! Schema Registry gateway
//!
//! The reconciler only ever talks to the registry through [`RegistryGateway`].
//! [`SchemaRegistryClient`] implements it over the Confluent REST API.

mod client;

pub use client::{RegistryAuth, SchemaRegistryClient};

use thiserror::Error;

use crate::schema::SchemaType;

/// Failure of a single registry call
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("invalid registry URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("registry returned HTTP {status}: {message}")]
    Api {
        status: u16,
        error_code: Option<i64>,
        message: String,
    },

    #[error("unexpected response from registry: {0}")]
    UnexpectedResponse(String),
}

/// The four registry operations reconciliation relies on
pub trait RegistryGateway {
    /// Names of every subject known to the registry
    fn list_subjects(&self) -> Result<Vec<String>, RegistryError>;

    /// Body of the latest registered schema for a subject
    fn latest_schema(&self, subject: &str) -> Result<String, RegistryError>;

    /// Whether `schema` may be registered as the next version of `subject`
    fn test_compatibility(
        &self,
        subject: &str,
        schema: &str,
        schema_type: SchemaType,
    ) -> Result<bool, RegistryError>;

    /// Register `schema` as a new version of `subject`, returning the schema id
    fn register_schema(
        &self,
        subject: &str,
        schema: &str,
        schema_type: SchemaType,
    ) -> Result<i64, RegistryError>;
}

impl<G: RegistryGateway + ?Sized> RegistryGateway for &G {
    fn list_subjects(&self) -> Result<Vec<String>, RegistryError> {
        (**self).list_subjects()
    }

    fn latest_schema(&self, subject: &str) -> Result<String, RegistryError> {
        (**self).latest_schema(subject)
    }

    fn test_compatibility(
        &self,
        subject: &str,
        schema: &str,
        schema_type: SchemaType,
    ) -> Result<bool, RegistryError> {
        (**self).test_compatibility(subject, schema, schema_type)
    }

    fn register_schema(
        &self,
        subject: &str,
        schema: &str,
        schema_type: SchemaType,
    ) -> Result<i64, RegistryError> {
        (**self).register_schema(subject, schema, schema_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = RegistryError::Api {
            status: 404,
            error_code: Some(40401),
            message: "Subject 'orders-key' not found.".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "registry returned HTTP 404: Subject 'orders-key' not found."
        );

        let err = RegistryError::Api {
            status: 502,
            error_code: None,
            message: "Bad Gateway".to_string(),
        };
        assert_eq!(err.to_string(), "registry returned HTTP 502: Bad Gateway");
    }
}
