//! Snapshot projection: replaying a game's event log.
//!
//! [`project`] is the pure fold — empty snapshot in, current snapshot out.
//! [`Projector`] wraps it with a persisted checkpoint so a long game does
//! not replay from scratch on every refresh, falling back to a full replay
//! whenever a correction event or a failed integrity check invalidates the
//! incremental state.

use crate::engine::transition;
use crate::error::{EngineError, ProjectError};
use crate::event::{EventPayload, GameEvent};
use crate::snapshot::{self, Checkpoint};
use crate::state::GameSnapshot;
use crate::store::GameLogReader;
use log::warn;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Resolve corrections into the list of events that actually count.
///
/// `undo` soft-deletes exactly its target; `edit` substitutes its target's
/// payload (the latest edit wins). The correction events themselves carry
/// no game semantics and are dropped. Input order (by seq) is preserved.
pub fn effective_events(events: &[GameEvent]) -> Vec<GameEvent> {
    let mut undone: HashSet<&str> = HashSet::new();
    let mut edits: HashMap<&str, &EventPayload> = HashMap::new();
    for ev in events {
        match &ev.payload {
            EventPayload::Undo { target_event_id } => {
                undone.insert(target_event_id.as_str());
            }
            EventPayload::Edit {
                target_event_id,
                payload,
            } => {
                edits.insert(target_event_id.as_str(), payload);
            }
            _ => {}
        }
    }

    let mut effective = Vec::with_capacity(events.len());
    for ev in events {
        if ev.payload.is_correction() || undone.contains(ev.id.as_str()) {
            continue;
        }
        match edits.get(ev.id.as_str()) {
            Some(replacement) => {
                let mut edited = ev.clone();
                edited.payload = (*replacement).clone();
                effective.push(edited);
            }
            None => effective.push(ev.clone()),
        }
    }
    effective
}

/// Replay a full event log into the current snapshot.
///
/// Folds [`transition`] over the effective log in sequence order, starting
/// from the empty `not_started` snapshot. The first rule violation aborts
/// the fold — a historical log that does not replay cleanly is corrupt, not
/// a normal runtime condition. Shells that accept a correction should
/// dry-run this over the proposed log before persisting it, since an edit
/// can strand a later event (a `flip_cup` whose cup-hit pitch was edited
/// into a ball no longer replays).
///
/// Deterministic: the same event list always produces the same snapshot.
pub fn project(game_id: &str, events: &[GameEvent]) -> Result<GameSnapshot, EngineError> {
    let effective = effective_events(events);
    let mut snap = GameSnapshot::empty(game_id);
    for (i, ev) in effective.iter().enumerate() {
        snap = transition(&snap, ev, &effective[..i])?.snapshot;
    }
    Ok(snap)
}

/// Incrementally maintained projection of one game, checkpointed to disk.
///
/// Adapted view-over-log machinery: the checkpoint records the snapshot
/// plus the sequence number and line hash of the last applied event. On
/// refresh, only newer events are applied; a checkpoint that no longer
/// matches the log (sequence missing or hash changed) or any correction
/// event in the new tail forces a full replay.
pub struct Projector {
    game_id: String,
    checkpoint_path: PathBuf,
    snapshot: GameSnapshot,
    /// Every event read so far, in seq order, with its line hash. Kept in
    /// memory so transitions can see their prior events; game logs are
    /// short enough that this is cheap.
    history: Vec<GameEvent>,
    hashes: Vec<String>,
    seq: u64,
    hash: String,
    checkpoint_loaded: bool,
    history_loaded: bool,
}

impl std::fmt::Debug for Projector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Projector")
            .field("game_id", &self.game_id)
            .field("checkpoint_path", &self.checkpoint_path)
            .field("seq", &self.seq)
            .field("events", &self.history.len())
            .finish()
    }
}

impl Projector {
    /// Create a projector for a game whose checkpoint lives under
    /// `views_dir` (the log's `views/` directory).
    pub fn new(game_id: &str, views_dir: &Path) -> Self {
        let checkpoint_path = views_dir.join(format!("{game_id}.snapshot.json"));
        Projector {
            game_id: game_id.to_string(),
            checkpoint_path,
            snapshot: GameSnapshot::empty(game_id),
            history: Vec::new(),
            hashes: Vec::new(),
            seq: 0,
            hash: String::new(),
            checkpoint_loaded: false,
            history_loaded: false,
        }
    }

    /// Bring the snapshot up to date with the log.
    ///
    /// On first call, loads and verifies the checkpoint; afterwards only
    /// events newer than the last refresh are read. Saves a new checkpoint
    /// whenever any event was applied.
    pub fn refresh(&mut self, reader: &GameLogReader) -> Result<&GameSnapshot, ProjectError> {
        if !self.checkpoint_loaded {
            if let Some(ck) = snapshot::load(&self.checkpoint_path)? {
                self.snapshot = ck.snapshot;
                self.seq = ck.seq;
                self.hash = ck.hash;
            }
            self.checkpoint_loaded = true;
        }

        self.pull_events(reader)?;

        if self.seq > 0 {
            self.verify_checkpoint();
        }

        let mut processed = false;
        let mut i = 0;
        while i < self.history.len() {
            if self.history[i].seq <= self.seq {
                i += 1;
                continue;
            }
            if self.history[i].payload.is_correction() {
                // A correction invalidates everything incremental.
                self.replay_all()?;
                processed = true;
                break;
            }
            let next = transition(&self.snapshot, &self.history[i], &self.history[..i])?;
            self.snapshot = next.snapshot;
            self.seq = self.history[i].seq;
            self.hash = self.hashes[i].clone();
            processed = true;
            i += 1;
        }

        if processed {
            snapshot::save(
                &self.checkpoint_path,
                &Checkpoint::new(self.snapshot.clone(), self.seq, self.hash.clone()),
            )?;
        }

        Ok(&self.snapshot)
    }

    /// Discard the checkpoint and replay the full history.
    pub fn rebuild(&mut self, reader: &GameLogReader) -> Result<&GameSnapshot, ProjectError> {
        snapshot::delete(&self.checkpoint_path)?;
        self.reset();
        self.checkpoint_loaded = true;
        self.history.clear();
        self.hashes.clear();
        self.history_loaded = false;
        self.refresh(reader)
    }

    /// The current in-memory snapshot. No I/O — whatever the last refresh
    /// produced, or the empty snapshot before any refresh.
    pub fn snapshot(&self) -> &GameSnapshot {
        &self.snapshot
    }

    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    /// Sequence number of the last applied event.
    pub fn last_seq(&self) -> u64 {
        self.seq
    }

    fn reset(&mut self) {
        self.snapshot = GameSnapshot::empty(self.game_id.as_str());
        self.seq = 0;
        self.hash = String::new();
    }

    fn pull_events(&mut self, reader: &GameLogReader) -> Result<(), ProjectError> {
        if !self.history_loaded {
            for result in reader.read_full()? {
                let (event, hash) = result?;
                self.history.push(event);
                self.hashes.push(hash);
            }
            self.history_loaded = true;
        } else {
            let next = self.history.last().map(|ev| ev.seq + 1).unwrap_or(1);
            for result in reader.read_from(next)? {
                let (event, hash) = result?;
                self.history.push(event);
                self.hashes.push(hash);
            }
        }
        Ok(())
    }

    /// Check the checkpoint still matches the log: its seq must exist and
    /// its line hash must be unchanged. Otherwise discard it.
    fn verify_checkpoint(&mut self) {
        let at = self.history.iter().position(|ev| ev.seq == self.seq);
        match at {
            Some(i) if self.hashes[i] == self.hash => {}
            Some(_) => {
                warn!(
                    "projector '{}': checkpoint hash mismatch at seq {}, rebuilding",
                    self.game_id, self.seq
                );
                self.reset();
            }
            None => {
                warn!(
                    "projector '{}': checkpoint seq {} not in log, rebuilding",
                    self.game_id, self.seq
                );
                self.reset();
            }
        }
    }

    fn replay_all(&mut self) -> Result<(), ProjectError> {
        self.snapshot = project(&self.game_id, &self.history)?;
        if let (Some(ev), Some(hash)) = (self.history.last(), self.hashes.last()) {
            self.seq = ev.seq;
            self.hash = hash.clone();
        } else {
            self.seq = 0;
            self.hash = String::new();
        }
        Ok(())
    }
}
