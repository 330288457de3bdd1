//! Kafka GitOps Config CLI
//!
//! View and manage kafka-gitops settings.

use anyhow::Context;
use clap::{Parser, Subcommand};
use schema_gitops::GitopsConfig;

#[derive(Parser)]
#[command(name = "kafka-gitops-config")]
#[command(about = "View and manage kafka-gitops settings")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show current configuration
    Show {
        /// Config file to load (optional)
        #[arg(short, long)]
        config: Option<String>,

        /// Output as TOML
        #[arg(long)]
        toml: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Initialize a new config file
    Init {
        /// Output path (default: kafka-gitops.toml)
        #[arg(short, long, default_value = "kafka-gitops.toml")]
        output: String,
    },

    /// Validate configuration
    Validate {
        /// Config file to validate
        #[arg(short, long)]
        config: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Show { config, toml, json } => {
            let mut cfg = GitopsConfig::load_from(config.as_deref())?;
            if cfg.registry.api_secret.is_some() {
                cfg.registry.api_secret = Some("***".to_string());
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&cfg)?);
            } else if toml {
                println!("{}", ::toml::to_string_pretty(&cfg)?);
            } else {
                println!("Kafka GitOps Configuration\n");
                println!("Kafka file: {}", cfg.kafka_file_path().display());
                println!("Dry run: {}", cfg.dry_run);

                println!("\nRegistry:");
                println!("  URL: {}", cfg.registry.url);
                println!(
                    "  Auth: {}",
                    match &cfg.registry.api_key {
                        Some(key) => format!("basic ({})", key),
                        None => "none".to_string(),
                    }
                );
                println!("  Timeout: {}s", cfg.registry.timeout_secs);

                println!("\nOutput:");
                println!("  Format: {:?}", cfg.output.format);
                println!("  Style: {:?}", cfg.output.style);
                println!("  Show diff: {}", cfg.output.show_diff);
                println!("  Color: {}", cfg.output.color);
            }
        }

        Commands::Init { output } => {
            let cfg = GitopsConfig::default();
            cfg.save(&output)?;
            println!("Created config file: {}", output);
        }

        Commands::Validate { config } => {
            let cfg = GitopsConfig::load_from(config.as_deref())?;
            cfg.validate().context("Configuration error")?;
            println!("Configuration is valid");
            println!("   Kafka file: {}", cfg.kafka_file_path().display());
            println!("   Registry: {}", cfg.registry.url);
        }
    }

    Ok(())
}
