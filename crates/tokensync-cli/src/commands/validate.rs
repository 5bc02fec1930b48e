//! Alias validation command

use clap::Args;
use std::path::PathBuf;
use tokensync_core::validate_value;

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Snapshot document to check
    pub file: PathBuf,

    /// Print the validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Exits with status 2 when the snapshot has findings.
pub fn execute(args: ValidateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(&args.file)
        .map_err(|e| format!("{}: {}", args.file.display(), e))?;
    let raw: serde_json::Value = serde_json::from_str(&text)?;
    let result = validate_value(&raw);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if result.valid {
        println!("✓ No alias problems found");
    } else {
        println!("✗ {} alias problem(s)", result.error_count);
        for broken in &result.broken_aliases {
            println!(
                "  broken: {} -> {} (no entry at '{}')",
                broken.token_path, broken.alias_reference, broken.reference_path
            );
        }
        for cycle in &result.circular_references {
            println!("  cycle: {}", cycle.path.join(" -> "));
        }
    }
    for warning in &result.warnings {
        eprintln!("warning: {}", warning);
    }

    if !result.valid {
        std::process::exit(2);
    }
    Ok(())
}
