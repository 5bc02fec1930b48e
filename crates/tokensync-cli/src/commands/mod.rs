pub mod chunk;
pub mod compare;
pub mod validate;

use std::path::Path;
use tokensync_core::model::Snapshot;
use tracing::warn;

/// Read and parse a snapshot document, logging skipped entries.
pub fn read_snapshot(path: &Path) -> Result<Snapshot, Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    let parsed = Snapshot::from_json_bytes(&bytes)?;
    for skipped in &parsed.skipped {
        warn!(key = %skipped.key, reason = %skipped.reason, "skipped entry");
    }
    Ok(parsed.snapshot)
}
