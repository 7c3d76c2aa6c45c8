//! Checkpoint persistence for projected game snapshots.

use crate::state::GameSnapshot;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// A persisted projection checkpoint.
///
/// Written atomically (tmp + rename) by the projector after applying
/// events. On the next refresh only events after `seq` need replaying; the
/// `hash` of the last consumed log line lets the projector detect a log
/// that was rewritten underneath it.
///
/// The file is plain JSON and can be inspected directly:
///
/// ```text
/// $ cat views/game-7.snapshot.json | jq '.seq, .snapshot.status'
/// 42
/// "in_progress"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// The projected snapshot at the time of the checkpoint.
    pub snapshot: GameSnapshot,

    /// Sequence number of the last event consumed.
    pub seq: u64,

    /// Hex-encoded xxh64 hash of that event's log line.
    pub hash: String,
}

impl Checkpoint {
    pub fn new(snapshot: GameSnapshot, seq: u64, hash: String) -> Self {
        Checkpoint {
            snapshot,
            seq,
            hash,
        }
    }
}

/// Save a checkpoint atomically.
///
/// Writes to a `.tmp` file, syncs, then renames over the final path so a
/// crash mid-write leaves the previous checkpoint intact.
pub fn save(path: &Path, checkpoint: &Checkpoint) -> io::Result<()> {
    let tmp_path = path.with_extension("json.tmp");

    let json = serde_json::to_string_pretty(checkpoint)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let mut file = fs::File::create(&tmp_path)?;
    file.write_all(json.as_bytes())?;
    file.sync_data()?;
    drop(file);

    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Load a checkpoint.
///
/// Returns `Ok(None)` when the file is missing or unreadable as a
/// checkpoint — a corrupt checkpoint is treated as absent, which makes the
/// projector fall back to a full replay.
pub fn load(path: &Path) -> io::Result<Option<Checkpoint>> {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    match serde_json::from_str(&contents) {
        Ok(checkpoint) => Ok(Some(checkpoint)),
        Err(_) => Ok(None),
    }
}

/// Delete a checkpoint and any leftover `.tmp` file. Idempotent.
pub fn delete(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    let tmp_path = path.with_extension("json.tmp");
    match fs::remove_file(&tmp_path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    Ok(())
}
