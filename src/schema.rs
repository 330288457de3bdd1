//! Schema types and subjects

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError};

/// Type of schema, as understood by the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SchemaType {
    /// Apache Avro (`.avsc`)
    Avro,
    /// Protocol Buffers (`.proto`)
    Protobuf,
    /// JSON Schema (`.json`)
    Json,
}

impl SchemaType {
    /// Name used by the registry's `schemaType` field
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::Avro => "AVRO",
            SchemaType::Protobuf => "PROTOBUF",
            SchemaType::Json => "JSON",
        }
    }

    /// Get the file extension for this schema type
    pub fn extension(&self) -> &'static str {
        match self {
            SchemaType::Avro => "avsc",
            SchemaType::Protobuf => "proto",
            SchemaType::Json => "json",
        }
    }

    /// Classify a file extension (without the leading dot)
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "avsc" => Some(SchemaType::Avro),
            "proto" => Some(SchemaType::Protobuf),
            "json" => Some(SchemaType::Json),
            _ => None,
        }
    }

    /// Classify a schema file by its extension
    pub fn from_path(path: &Path) -> Result<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
            .ok_or_else(|| SchemaError::UnsupportedExtension {
                path: path.to_path_buf(),
            })
    }

    /// Whether bodies of this type are compared as structured documents
    pub fn is_structured(&self) -> bool {
        matches!(self, SchemaType::Avro | SchemaType::Json)
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which half of a topic's record a subject describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectRole {
    Key,
    Value,
}

impl SubjectRole {
    /// Suffix appended to the topic name
    pub fn suffix(&self) -> &'static str {
        match self {
            SubjectRole::Key => "key",
            SubjectRole::Value => "value",
        }
    }

    /// Subject name for a topic in this role (e.g. `orders-value`)
    pub fn subject_name(&self, topic: &str) -> String {
        format!("{}-{}", topic, self.suffix())
    }
}

/// A desired registry subject, built fresh from the kafka file on every run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    /// Subject name (`{topic}-key` or `{topic}-value`)
    pub name: String,
    /// Type of schema
    pub schema_type: SchemaType,
    /// Schema body, trimmed of surrounding whitespace
    pub schema: String,
    /// File the schema was read from
    pub source_path: PathBuf,
}

impl Subject {
    /// Create a new subject for a topic
    pub fn new(
        topic: &str,
        role: SubjectRole,
        schema_type: SchemaType,
        schema: &str,
        source_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: role.subject_name(topic),
            schema_type,
            schema: schema.trim().to_string(),
            source_path: source_path.into(),
        }
    }
}
