//! Kafka file: the desired-state document
//!
//! Declares, per topic, the key and value schema files to register. Paths are
//! relative to the kafka file's own directory. Two shapes are accepted:
//!
//! ```yaml
//! apiVersion: v1
//! topics:
//!   orders:
//!     schemas:
//!       key: schemas/int.avsc
//!       value: schemas/order.json
//! ```
//!
//! ```yaml
//! apiVersion: v1
//! topics:
//!   - name: orders
//!     key: schemas/int.avsc
//!     value: schemas/order.json
//! ```
//!
//! Topics keep document order in both shapes.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::de::{DeserializeOwned, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::error::{Result, SchemaError};

/// Longest topic name Kafka accepts
const MAX_TOPIC_NAME_LEN: usize = 249;

fn topic_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-zA-Z0-9._-]+$").expect("valid topic name pattern"))
}

/// A topic and the schema files describing its records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicDeclaration {
    /// Topic name, unique within the kafka file
    pub name: String,
    /// Key schema path, relative to the kafka file
    pub key: PathBuf,
    /// Value schema path, relative to the kafka file
    pub value: PathBuf,
}

/// Parsed kafka file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KafkaFile {
    /// Document version (`apiVersion`)
    pub api_version: String,
    /// Declared topics, in document order
    pub topics: Vec<TopicDeclaration>,
}

#[derive(Deserialize)]
struct RawKafkaFile {
    #[serde(rename = "apiVersion")]
    api_version: String,
    #[serde(default)]
    topics: Option<RawTopics>,
}

/// Topic entries in document order, repeated names included
enum RawTopics {
    Mapped(Vec<(String, serde_yaml::Value)>),
    Listed(Vec<serde_yaml::Value>),
}

impl<'de> Deserialize<'de> for RawTopics {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct TopicsVisitor;

        impl<'de> Visitor<'de> for TopicsVisitor {
            type Value = RawTopics;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of topic names or a list of topics")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<RawTopics, A::Error> {
                let mut entries = Vec::new();
                while let Some(entry) = map.next_entry::<String, serde_yaml::Value>()? {
                    entries.push(entry);
                }
                Ok(RawTopics::Mapped(entries))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<RawTopics, A::Error> {
                let mut entries = Vec::new();
                while let Some(entry) = seq.next_element::<serde_yaml::Value>()? {
                    entries.push(entry);
                }
                Ok(RawTopics::Listed(entries))
            }
        }

        deserializer.deserialize_any(TopicsVisitor)
    }
}

#[derive(Deserialize)]
struct MappedTopic {
    schemas: SchemaPair,
}

#[derive(Deserialize)]
struct SchemaPair {
    key: PathBuf,
    value: PathBuf,
}

#[derive(Deserialize)]
struct ListedTopic {
    name: String,
    key: PathBuf,
    value: PathBuf,
}

impl KafkaFile {
    /// Read and parse a kafka file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| SchemaError::KafkaFileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    /// Parse kafka file content; `origin` is only used in error messages
    pub fn parse(content: &str, origin: &Path) -> Result<Self> {
        let raw: RawKafkaFile =
            serde_yaml::from_str(content).map_err(|source| SchemaError::KafkaFileParse {
                path: origin.to_path_buf(),
                source,
            })?;

        let topics = match raw.topics {
            None => Vec::new(),
            Some(RawTopics::Mapped(entries)) => entries
                .into_iter()
                .map(|(name, value)| {
                    let topic: MappedTopic = decode_topic(value, &name, origin)?;
                    Ok(TopicDeclaration {
                        name,
                        key: topic.schemas.key,
                        value: topic.schemas.value,
                    })
                })
                .collect::<Result<Vec<_>>>()?,
            Some(RawTopics::Listed(entries)) => entries
                .into_iter()
                .enumerate()
                .map(|(index, value)| {
                    let label = value
                        .get("name")
                        .and_then(|name| name.as_str())
                        .map(String::from)
                        .unwrap_or_else(|| format!("#{}", index + 1));
                    let topic: ListedTopic = decode_topic(value, &label, origin)?;
                    Ok(TopicDeclaration {
                        name: topic.name,
                        key: topic.key,
                        value: topic.value,
                    })
                })
                .collect::<Result<Vec<_>>>()?,
        };

        let mut seen = HashSet::new();
        for topic in &topics {
            validate_topic_name(&topic.name)?;
            if !seen.insert(topic.name.as_str()) {
                return Err(SchemaError::DuplicateTopic(topic.name.clone()));
            }
        }

        Ok(Self {
            api_version: raw.api_version,
            topics,
        })
    }

    /// Absolute directory that schema paths in `kafka_file_path` resolve against
    pub fn base_dir(kafka_file_path: &Path) -> Result<PathBuf> {
        let dir = match kafka_file_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if dir.is_absolute() {
            return Ok(dir);
        }
        let cwd = std::env::current_dir().map_err(|e| {
            SchemaError::Config(format!("cannot resolve working directory: {}", e))
        })?;
        Ok(cwd.join(dir))
    }
}

fn decode_topic<T: DeserializeOwned>(value: serde_yaml::Value, topic: &str, origin: &Path) -> Result<T> {
    serde_yaml::from_value(value).map_err(|source| SchemaError::InvalidTopic {
        path: origin.to_path_buf(),
        topic: topic.to_string(),
        source,
    })
}

/// Check a topic name against Kafka's naming rules
pub fn validate_topic_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| SchemaError::InvalidTopicName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name is empty"));
    }
    if name == "." || name == ".." {
        return Err(invalid("'.' and '..' are reserved"));
    }
    if name.len() > MAX_TOPIC_NAME_LEN {
        return Err(invalid("longer than 249 characters"));
    }
    if !topic_name_pattern().is_match(name) {
        return Err(invalid("only ASCII alphanumerics, '.', '_' and '-' are allowed"));
    }
    Ok(())
}
