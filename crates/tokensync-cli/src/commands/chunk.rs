//! Chunk split/join commands

use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};
use tokensync_core::EngineConfig;

const CHUNK_PREFIX: &str = "chunk-";
const CHUNK_SUFFIX: &str = ".txt";

#[derive(Debug, Args)]
pub struct ChunkArgs {
    #[command(subcommand)]
    pub command: ChunkCommand,
}

#[derive(Debug, Subcommand)]
pub enum ChunkCommand {
    /// Serialize a JSON document into numbered chunk files
    Split(SplitArgs),
    /// Reassemble chunk files into a JSON document
    Join(JoinArgs),
}

#[derive(Debug, Args)]
pub struct SplitArgs {
    pub file: PathBuf,

    #[arg(long)]
    pub out_dir: PathBuf,

    /// Overrides the configured chunk size
    #[arg(long)]
    pub max_chunk_size: Option<usize>,
}

#[derive(Debug, Args)]
pub struct JoinArgs {
    pub dir: PathBuf,

    #[arg(long)]
    pub out: PathBuf,
}

pub fn execute(args: ChunkArgs, config: &EngineConfig) -> Result<(), Box<dyn std::error::Error>> {
    match args.command {
        ChunkCommand::Split(split_args) => execute_split(split_args, config),
        ChunkCommand::Join(join_args) => execute_join(join_args, config),
    }
}

fn execute_split(args: SplitArgs, config: &EngineConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = config.clone();
    if let Some(size) = args.max_chunk_size {
        config = config.with_max_chunk_size(size);
    }
    let codec = config.chunk_codec()?;

    let text = std::fs::read_to_string(&args.file)
        .map_err(|e| format!("{}: {}", args.file.display(), e))?;
    let document: serde_json::Value = serde_json::from_str(&text)?;
    let chunks = codec.encode(&document)?;

    std::fs::create_dir_all(&args.out_dir)?;
    for (i, chunk) in chunks.iter().enumerate() {
        std::fs::write(args.out_dir.join(chunk_file_name(i)), chunk)?;
    }

    println!("✓ Wrote {} chunk(s) to {}", chunks.len(), args.out_dir.display());
    Ok(())
}

fn execute_join(args: JoinArgs, config: &EngineConfig) -> Result<(), Box<dyn std::error::Error>> {
    let codec = config.chunk_codec()?;
    let chunks = read_chunks(&args.dir)?;
    if chunks.is_empty() {
        return Err(format!("no chunk files in {}", args.dir.display()).into());
    }

    let document: serde_json::Value = codec.decode(&chunks)?;
    std::fs::write(&args.out, serde_json::to_string_pretty(&document)?)?;

    println!("✓ Joined {} chunk(s) into {}", chunks.len(), args.out.display());
    Ok(())
}

fn chunk_file_name(index: usize) -> String {
    format!("{CHUNK_PREFIX}{index:04}{CHUNK_SUFFIX}")
}

/// Chunk files in index order; other files are ignored.
fn read_chunks(dir: &Path) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let mut indexed = Vec::new();
    for dir_entry in std::fs::read_dir(dir)? {
        let path = dir_entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(index) = name
            .strip_prefix(CHUNK_PREFIX)
            .and_then(|rest| rest.strip_suffix(CHUNK_SUFFIX))
            .and_then(|digits| digits.parse::<usize>().ok())
        else {
            continue;
        };
        indexed.push((index, path));
    }
    indexed.sort();

    indexed
        .into_iter()
        .map(|(_, path)| std::fs::read_to_string(&path).map_err(Into::into))
        .collect()
}
