//! Configuration management for kafka-gitops
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (kafka-gitops.toml)
//! - Environment variables (KAFKA_GITOPS__*)
//!
//! Command line flags are applied on top by the binaries.
//!
//! ## Example config file (kafka-gitops.toml):
//! ```toml
//! kafka_file = "deploy/kafka.yaml"
//! dry_run = false
//!
//! [registry]
//! url = "https://psrc-123.europe-west1.gcp.confluent.cloud"
//! api_key = "ABCDEFG"
//! api_secret = "..."
//! timeout_secs = 30
//!
//! [output]
//! format = "text"
//! style = "pretty"
//! show_diff = true
//! color = true
//! ```

use std::path::PathBuf;
use std::time::Duration;

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError};
use crate::registry::{RegistryAuth, RegistryError, SchemaRegistryClient};

/// Main configuration for a reconciliation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitopsConfig {
    /// Path to the kafka file declaring topics and schemas
    #[serde(default = "default_kafka_file")]
    pub kafka_file: PathBuf,

    /// Check compatibility but do not register anything
    #[serde(default)]
    pub dry_run: bool,

    /// Registry settings
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Report settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Schema registry connection settings
#[derive(Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Base URL of the registry
    #[serde(default = "default_registry_url")]
    pub url: String,

    /// API key for basic auth
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// API secret for basic auth
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_secret: Option<String>,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl std::fmt::Debug for RegistryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryConfig")
            .field("url", &self.url)
            .field("api_key", &self.api_key)
            .field("api_secret", &self.api_secret.as_ref().map(|_| "***"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Report settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Report format (text or json)
    #[serde(default)]
    pub format: ReportFormat,

    /// JSON layout (pretty or compact)
    #[serde(default)]
    pub style: OutputStyle,

    /// Print a diff under each update
    #[serde(default)]
    pub show_diff: bool,

    /// Colorize text output
    #[serde(default = "default_true")]
    pub color: bool,
}

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// Output layout for JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputStyle {
    #[default]
    Pretty,
    Compact,
}

// Default value functions
fn default_kafka_file() -> PathBuf {
    PathBuf::from("kafka.yaml")
}

fn default_registry_url() -> String {
    "http://localhost:8081".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: default_registry_url(),
            api_key: None,
            api_secret: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: ReportFormat::Text,
            style: OutputStyle::Pretty,
            show_diff: false,
            color: true,
        }
    }
}

impl Default for GitopsConfig {
    fn default() -> Self {
        Self {
            kafka_file: default_kafka_file(),
            dry_run: false,
            registry: RegistryConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl RegistryConfig {
    /// Basic auth credentials, required to be supplied as a pair
    pub fn auth(&self) -> Result<Option<RegistryAuth>> {
        let key = self.api_key.as_deref().filter(|k| !k.is_empty());
        let secret = self.api_secret.as_deref().filter(|s| !s.is_empty());
        match (key, secret) {
            (Some(api_key), Some(api_secret)) => Ok(Some(RegistryAuth::Basic {
                api_key: api_key.to_string(),
                api_secret: api_secret.to_string(),
            })),
            (None, None) => Ok(None),
            _ => Err(SchemaError::Config(
                "registry API key and secret must be supplied together".to_string(),
            )),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Build an HTTP client for this registry
    pub fn client(&self) -> Result<SchemaRegistryClient> {
        SchemaRegistryClient::new(&self.url, self.auth()?, self.timeout()).map_err(|e| match e {
            RegistryError::InvalidUrl { .. } => SchemaError::Config(e.to_string()),
            other => SchemaError::Config(format!("cannot build registry client: {}", other)),
        })
    }
}

impl GitopsConfig {
    /// Load configuration from a specific file
    pub fn load_from(config_path: Option<&str>) -> std::result::Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // Load from default locations
        let config_locations = [
            "kafka-gitops.toml",
            ".kafka-gitops.toml",
            "config/kafka-gitops.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("io", "kafka-gitops", "kafka-gitops") {
            let xdg_config = config_dir.config_dir().join("kafka-gitops.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        // Load from specified path
        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Load from environment variables (KAFKA_GITOPS__*)
        builder = builder.add_source(
            Environment::with_prefix("KAFKA_GITOPS")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Get the kafka file path (resolves relative paths)
    pub fn kafka_file_path(&self) -> PathBuf {
        if self.kafka_file.is_absolute() {
            self.kafka_file.clone()
        } else {
            std::env::current_dir()
                .unwrap_or_default()
                .join(&self.kafka_file)
        }
    }

    /// Check everything that can be checked without touching the network
    pub fn validate(&self) -> Result<()> {
        self.registry.auth()?;
        if self.registry.timeout_secs == 0 {
            return Err(SchemaError::Config(
                "registry timeout must be at least one second".to_string(),
            ));
        }
        self.registry.client().map(|_| ())
    }
}
