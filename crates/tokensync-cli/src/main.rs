//! TokenSync CLI
//!
//! Command-line interface for comparing and validating token registry
//! snapshots.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokensync_core::logging_facility::{self, Profile};
use tokensync_core::EngineConfig;
use tokensync_core_types::RequestContext;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "tokensync")]
#[command(about = "TokenSync - token registry baseline reconciliation", long_about = None)]
struct Cli {
    /// Engine configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Logging profile: development, production or test
    #[arg(long, global = true)]
    log_profile: Option<Profile>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compare a baseline snapshot with a new one and suggest a version
    Compare(commands::compare::CompareArgs),
    /// Check a snapshot for broken and circular aliases
    Validate(commands::validate::ValidateArgs),
    /// Split or join persisted payload chunks
    Chunk(commands::chunk::ChunkArgs),
}

fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match EngineConfig::from_toml_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        None => EngineConfig::default(),
    };

    let profile = cli
        .log_profile
        .or(config.log_profile)
        .unwrap_or(Profile::Development);
    logging_facility::init(profile);

    let ctx = RequestContext::new().with_origin("cli");
    let span = tracing::info_span!(
        "tokensync",
        request_id = %ctx.request_id,
        origin = ctx.origin.as_deref().unwrap_or_default()
    );
    let _guard = span.enter();

    let result = match cli.command {
        Commands::Compare(args) => commands::compare::execute(args, &config),
        Commands::Validate(args) => commands::validate::execute(args),
        Commands::Chunk(args) => commands::chunk::execute(args, &config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
