//! sade - SADE zone admission CLI
//!
//! Runs the admission decision engine against local fixture data:
//! drone-model limits, historical session records, and DPO follow-up
//! claims. Intended for operator dry-runs and integration testing; the
//! production collaborators are remote services behind the same traits.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sade_core::incident::TAXONOMY;
use sade_core::{AdmissionEngine, RawEntryRequest};
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use sade_cli::config::CliConfig;
use sade_cli::fixtures::claims::FixtureClaims;
use sade_cli::fixtures::environment::FixtureEnvironment;
use sade_cli::fixtures::reputation::FixtureReputation;

/// sade - SADE zone admission decision engine
#[derive(Parser, Debug)]
#[command(name = "sade")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the CLI configuration file
    #[arg(short, long, default_value = "sade.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decide one entry request
    Decide {
        /// Entry request JSON file; "-" reads stdin
        #[arg(short, long, default_value = "-")]
        request: PathBuf,

        /// Print only the canonical status line
        #[arg(long)]
        message_only: bool,
    },

    /// Print the incident taxonomy
    Taxonomy,
}

/// The CLI's full output: decision record plus the audit object.
#[derive(Debug, Serialize)]
struct DecisionOutput {
    decision: sade_core::DecisionRecord,
    visibility: sade_core::AuditTrace,
}

fn read_request(path: &PathBuf) -> Result<RawEntryRequest> {
    let content = if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("reading entry request from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("reading entry request {}", path.display()))?
    };
    serde_json::from_str(&content).context("parsing entry request JSON")
}

async fn run_decide(config: &CliConfig, request_path: &PathBuf, message_only: bool) -> Result<()> {
    let request = read_request(request_path)?;

    let environment =
        FixtureEnvironment::load(&config.data.drone_models, &config.data.wind_conditions)
            .context("loading drone-model fixture data")?;
    let reputation = FixtureReputation::load(&config.data.reputation_model)
        .context("loading reputation fixture data")?;
    let claims =
        FixtureClaims::load(&config.data.user_claims).context("loading claims fixture data")?;

    let engine =
        AdmissionEngine::with_knobs(environment, reputation, claims, config.engine.clone());
    let outcome = engine.decide(&request).await;

    if message_only {
        println!("{}", outcome.record.sade_message);
    } else {
        let output = DecisionOutput {
            decision: outcome.record,
            visibility: outcome.audit,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    }
    Ok(())
}

fn run_taxonomy() {
    for entry in TAXONOMY {
        println!(
            "{}  {:<8}  {}",
            entry.prefix,
            entry.severity.as_str(),
            entry.category
        );
        for (subtype, name) in entry.subcategories {
            println!("  {}-{subtype}  {name}", entry.prefix);
        }
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = if cli.config.exists() {
        CliConfig::from_file(&cli.config)
            .with_context(|| format!("loading config {}", cli.config.display()))?
    } else {
        CliConfig::default()
    };

    match cli.command {
        Commands::Decide {
            request,
            message_only,
        } => run_decide(&config, &request, message_only).await,
        Commands::Taxonomy => {
            run_taxonomy();
            Ok(())
        }
    }
}
