//! Kafka GitOps CLI
//!
//! Reconciles the schemas declared in a kafka file against a schema registry.
//!
//! Usage:
//!   kafka-gitops --kafka-file-path deploy/kafka.yaml --schema-registry-url http://localhost:8081
//!   kafka-gitops --dry-run --diff

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use schema_gitops::report::{self, ReportOptions};
use schema_gitops::{reconcile_schemas, GitopsConfig, KafkaFile, OutputStyle, ReportFormat};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kafka-gitops")]
#[command(about = "Reconcile Kafka topic schemas against a Confluent Schema Registry")]
struct Cli {
    /// Settings file (defaults: kafka-gitops.toml, KAFKA_GITOPS__* env)
    #[arg(short, long)]
    config: Option<String>,

    /// The path to your kafka file
    #[arg(long)]
    kafka_file_path: Option<PathBuf>,

    /// The URL where your Confluent Schema Registry is hosted
    #[arg(long)]
    schema_registry_url: Option<String>,

    /// The API key used to authenticate with your Confluent Schema Registry
    #[arg(long)]
    schema_registry_api_key: Option<String>,

    /// The API secret used to authenticate with your Confluent Schema Registry
    #[arg(long)]
    schema_registry_api_secret: Option<String>,

    /// Check compatibility but do not apply changes
    #[arg(long)]
    dry_run: bool,

    /// Report format
    #[arg(long, value_enum)]
    format: Option<Format>,

    /// Compact JSON output
    #[arg(long)]
    compact: bool,

    /// Show a diff for every update
    #[arg(long)]
    diff: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cfg = apply_flags(
        GitopsConfig::load_from(cli.config.as_deref()).context("failed to load settings")?,
        &cli,
    );

    let kafka_file_path = cfg.kafka_file_path();
    let kafka_file = KafkaFile::load(&kafka_file_path)?;
    let base_dir = KafkaFile::base_dir(&kafka_file_path)?;
    let client = cfg.registry.client()?;

    let options = ReportOptions {
        format: cfg.output.format,
        style: cfg.output.style,
        color: cfg.output.color && std::io::stdout().is_terminal(),
        show_diff: cfg.output.show_diff,
    };

    if options.format == ReportFormat::Text {
        println!("{}", report::mode_banner(cfg.dry_run));
    }
    tracing::info!(
        kafka_file = %kafka_file_path.display(),
        registry = %client.base_url(),
        topics = kafka_file.topics.len(),
        dry_run = cfg.dry_run,
        "starting reconciliation"
    );

    let actions = reconcile_schemas(&kafka_file, &base_dir, &client, cfg.dry_run)?;

    print!("{}", report::render(&actions, cfg.dry_run, &options)?);
    if options.format == ReportFormat::Json {
        println!();
    }
    Ok(())
}

/// Command line flags win over file and environment settings
fn apply_flags(mut cfg: GitopsConfig, cli: &Cli) -> GitopsConfig {
    if let Some(path) = &cli.kafka_file_path {
        cfg.kafka_file = path.clone();
    }
    if let Some(url) = &cli.schema_registry_url {
        cfg.registry.url = url.clone();
    }
    if let Some(key) = &cli.schema_registry_api_key {
        cfg.registry.api_key = Some(key.clone());
    }
    if let Some(secret) = &cli.schema_registry_api_secret {
        cfg.registry.api_secret = Some(secret.clone());
    }
    if cli.dry_run {
        cfg.dry_run = true;
    }
    match cli.format {
        Some(Format::Text) => cfg.output.format = ReportFormat::Text,
        Some(Format::Json) => cfg.output.format = ReportFormat::Json,
        None => {}
    }
    if cli.compact {
        cfg.output.style = OutputStyle::Compact;
    }
    if cli.diff {
        cfg.output.show_diff = true;
    }
    if cli.no_color {
        cfg.output.color = false;
    }
    cfg
}
