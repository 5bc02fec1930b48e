//! Snapshot comparison command

use clap::Args;
use std::path::{Path, PathBuf};
use tokensync_core::model::Snapshot;
use tokensync_core::{compare, render_human_summary, AliasPolicy, EngineConfig};

#[derive(Debug, Args)]
pub struct CompareArgs {
    /// Baseline snapshot; a missing or empty file means "no baseline"
    #[arg(long)]
    pub old: PathBuf,

    /// Newly fetched snapshot
    #[arg(long)]
    pub new: PathBuf,

    /// Version of the baseline, e.g. 1.4.0
    #[arg(long)]
    pub current_version: String,

    /// Refuse new data with broken or circular aliases
    #[arg(long)]
    pub strict: bool,

    /// Only pair entries by stable ids and names
    #[arg(long)]
    pub no_heuristics: bool,

    /// Print the structured comparison as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: CompareArgs, config: &EngineConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = config.clone();
    if args.strict {
        config = config.with_alias_policy(AliasPolicy::Strict);
    }
    if args.no_heuristics {
        config = config.with_heuristic_matching(false);
    }

    let old = read_baseline(&args.old)?;
    let new = super::read_snapshot(&args.new)?;

    let comparison = compare(&old, &new, &args.current_version, &config)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&comparison)?);
    } else {
        print!("{}", render_human_summary(&comparison));
    }
    Ok(())
}

fn read_baseline(path: &Path) -> Result<Snapshot, Box<dyn std::error::Error>> {
    let is_blank = match std::fs::read(path) {
        Ok(bytes) => bytes.iter().all(u8::is_ascii_whitespace),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
        Err(e) => return Err(format!("{}: {}", path.display(), e).into()),
    };
    if is_blank {
        tracing::info!(path = %path.display(), "no baseline, comparing against an empty snapshot");
        return Ok(Snapshot::default());
    }
    super::read_snapshot(path)
}
