//! Append-only, per-game event log storage.
//!
//! Each game owns a directory:
//!
//! ```text
//! <dir>/game.jsonl          active log, one JSON event per line
//! <dir>/history.jsonl.zst   archived lines of a completed game
//! <dir>/views/              projector checkpoints
//! ```
//!
//! The writer assigns gap-free sequence numbers and holds an exclusive
//! advisory lock on the active log, so at most one mutating submission per
//! game is in flight — the engine itself has no protection against racing
//! transitions and relies on this.

use crate::error::AppendError;
use crate::event::GameEvent;
use fs2::FileExt;
use log::debug;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

const ACTIVE_LOG: &str = "game.jsonl";
const ARCHIVE_LOG: &str = "history.jsonl.zst";

/// Compute xxh64 hash of raw line bytes (without trailing newline),
/// hex-encoded. Stored in checkpoints and append receipts for integrity
/// verification.
pub fn line_hash(line: &[u8]) -> String {
    let hash = xxhash_rust::xxh64::xxh64(line, 0);
    format!("{hash:016x}")
}

/// Whether a writer takes the exclusive advisory lock on the active log.
///
/// `None` is for tooling that knows writes are externally serialized;
/// normal shells use `Exclusive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Exclusive,
    None,
}

/// Receipt for an appended event: the sequence number the log assigned and
/// the hash of the written line. Feed both into [`GameLogWriter::append_if`]
/// to chain optimistic appends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendReceipt {
    pub seq: u64,
    pub line_hash: String,
}

/// The single writer for one game's log.
pub struct GameLogWriter {
    dir: PathBuf,
    log_path: PathBuf,
    archive_path: PathBuf,
    views_dir: PathBuf,
    file: File,
    game_id: Option<String>,
    last_seq: u64,
    last_hash: String,
}

impl GameLogWriter {
    /// Open or create a game log, taking the exclusive writer lock.
    ///
    /// Fails with `ErrorKind::AlreadyExists` if another writer holds the
    /// lock. Replays the existing log to recover the head sequence number,
    /// so a corrupt log refuses to open.
    pub fn open(dir: impl AsRef<Path>) -> io::Result<Self> {
        Self::open_with_lock(dir, LockMode::Exclusive)
    }

    /// Open with an explicit [`LockMode`].
    pub fn open_with_lock(dir: impl AsRef<Path>, mode: LockMode) -> io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let views_dir = dir.join("views");
        let log_path = dir.join(ACTIVE_LOG);
        let archive_path = dir.join(ARCHIVE_LOG);

        fs::create_dir_all(&views_dir)?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        if mode == LockMode::Exclusive && file.try_lock_exclusive().is_err() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!(
                    "another writer holds the lock on {}",
                    log_path.display()
                ),
            ));
        }

        let mut writer = GameLogWriter {
            dir,
            log_path,
            archive_path,
            views_dir,
            file,
            game_id: None,
            last_seq: 0,
            last_hash: String::new(),
        };
        writer.recover_head()?;
        Ok(writer)
    }

    /// Append an event, assigning the next sequence number.
    ///
    /// An event with `seq == 0` takes the next number; a pre-numbered
    /// event must be exactly `head + 1` or the append is rejected with
    /// `ErrorKind::InvalidInput` (sequence numbers are gap-free). Events
    /// from a different game are rejected the same way.
    pub fn append(&mut self, event: &GameEvent) -> io::Result<AppendReceipt> {
        let next = self.last_seq + 1;
        if event.seq != 0 && event.seq != next {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("event seq {} breaks the sequence, head is {}", event.seq, self.last_seq),
            ));
        }
        if let Some(game_id) = &self.game_id {
            if *game_id != event.game_id {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!(
                        "event for game {} appended to log of game {game_id}",
                        event.game_id
                    ),
                ));
            }
        }

        let mut numbered = event.clone();
        numbered.seq = next;
        let json = serde_json::to_string(&numbered)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        writeln!(self.file, "{json}")?;
        self.file.sync_data()?;

        let hash = line_hash(json.as_bytes());
        self.last_seq = next;
        self.last_hash = hash.clone();
        self.game_id.get_or_insert_with(|| numbered.game_id.clone());

        debug!("appended {} seq {next} to {}", numbered.kind(), self.log_path.display());

        Ok(AppendReceipt {
            seq: next,
            line_hash: hash,
        })
    }

    /// Conditionally append: succeeds only if the log head is still at
    /// `expected_seq` with `expected_hash`. For an empty log pass
    /// `(0, "")`. This is the optimistic-concurrency hook for shells that
    /// read, compute a transition, and append.
    pub fn append_if(
        &mut self,
        event: &GameEvent,
        expected_seq: u64,
        expected_hash: &str,
    ) -> Result<AppendReceipt, AppendError> {
        if expected_seq != self.last_seq {
            return Err(AppendError::SequenceConflict {
                expected: expected_seq,
                actual: self.last_seq,
            });
        }
        if expected_seq > 0 && expected_hash != self.last_hash {
            return Err(AppendError::HashMismatch { seq: expected_seq });
        }
        Ok(self.append(event)?)
    }

    /// Sequence number and line hash at the head of the log.
    pub fn head(&self) -> (u64, &str) {
        (self.last_seq, &self.last_hash)
    }

    /// Fold the active log into the compressed archive and truncate it.
    ///
    /// Intended for completed games; sequence numbering continues across
    /// the boundary and [`GameLogReader::read_full`] reads through both.
    pub fn archive(&mut self) -> io::Result<()> {
        let data = fs::read(&self.log_path)?;
        if data.is_empty() {
            return Ok(());
        }
        append_archive_frame(&self.archive_path, &data)?;
        self.file.set_len(0)?;
        self.file.sync_data()?;
        debug!(
            "archived {} bytes of {} into {}",
            data.len(),
            self.log_path.display(),
            self.archive_path.display()
        );
        Ok(())
    }

    /// A reader over this log's directory.
    pub fn reader(&self) -> GameLogReader {
        GameLogReader {
            log_path: self.log_path.clone(),
            archive_path: self.archive_path.clone(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    pub fn views_dir(&self) -> &Path {
        &self.views_dir
    }

    fn recover_head(&mut self) -> io::Result<()> {
        let reader = self.reader();
        for result in reader.read_full()? {
            let (event, hash) = result?;
            self.last_seq = event.seq;
            self.last_hash = hash;
            self.game_id.get_or_insert(event.game_id);
        }
        Ok(())
    }
}

/// Read-only access to a game log directory. Takes no lock — any number of
/// readers may coexist with the writer.
#[derive(Debug, Clone)]
pub struct GameLogReader {
    log_path: PathBuf,
    archive_path: PathBuf,
}

impl GameLogReader {
    pub fn open(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        GameLogReader {
            log_path: dir.join(ACTIVE_LOG),
            archive_path: dir.join(ARCHIVE_LOG),
        }
    }

    /// Events in the active log with sequence number ≥ `seq`.
    ///
    /// Yields `(event, line_hash)` per complete line. A partial trailing
    /// line (crash mid-write) is skipped silently; already-archived events
    /// are not visited — use [`read_full`](Self::read_full) for those.
    pub fn read_from(
        &self,
        seq: u64,
    ) -> io::Result<impl Iterator<Item = io::Result<(GameEvent, String)>> + use<>> {
        let file = match File::open(&self.log_path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(LogLines::empty());
            }
            Err(e) => return Err(e),
        };
        let file_len = file.metadata()?.len();
        Ok(LogLines::new(
            Box::new(BufReader::new(file).lines()),
            seq,
            Some(file_len),
        ))
    }

    /// All events — archived history first, then the active log.
    pub fn read_full(
        &self,
    ) -> io::Result<Box<dyn Iterator<Item = io::Result<(GameEvent, String)>>>> {
        let archived = match open_archive(&self.archive_path)? {
            Some(reader) => LogLines::new(Box::new(reader.lines()), 0, None),
            None => LogLines::empty(),
        };
        let active = self.read_from(0)?;
        Ok(Box::new(archived.chain(active)))
    }

    /// Sequence number and line hash of the newest event, if any.
    pub fn head(&self) -> io::Result<Option<(u64, String)>> {
        let mut head = None;
        for result in self.read_full()? {
            let (event, hash) = result?;
            head = Some((event.seq, hash));
        }
        Ok(head)
    }
}

/// Compress `data` and append it to the archive as one zstd frame. Frames
/// are concatenated, so re-archiving appends rather than rewrites.
fn append_archive_frame(archive_path: &Path, data: &[u8]) -> io::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(archive_path)?;
    let mut encoder = zstd::Encoder::new(file, 3)?;
    encoder.write_all(data)?;
    encoder.finish()?.sync_data()
}

/// Streaming decompressor over the archive's concatenated frames.
/// `None` when nothing has been archived yet.
fn open_archive(archive_path: &Path) -> io::Result<Option<impl BufRead + 'static>> {
    if !archive_path.exists() {
        return Ok(None);
    }
    let decoder = zstd::Decoder::new(File::open(archive_path)?)?;
    Ok(Some(BufReader::new(decoder)))
}

/// Iterator over JSONL event lines: parses, hashes, skips empties, and
/// (for the active file) drops a partial trailing line. Sequence numbers
/// must not regress within one pass — a regression is `InvalidData`.
struct LogLines {
    lines: Box<dyn Iterator<Item = io::Result<String>>>,
    min_seq: u64,
    prev_seq: u64,
    /// `Some((pos, file_len))` when reading a file whose tail may hold a
    /// torn write; `None` for archived streams, which are always complete.
    tail_guard: Option<(u64, u64)>,
}

impl LogLines {
    fn new(
        lines: Box<dyn Iterator<Item = io::Result<String>>>,
        min_seq: u64,
        file_len: Option<u64>,
    ) -> Self {
        LogLines {
            lines,
            min_seq,
            prev_seq: 0,
            tail_guard: file_len.map(|len| (0, len)),
        }
    }

    fn empty() -> Self {
        LogLines {
            lines: Box::new(std::iter::empty()),
            min_seq: 0,
            prev_seq: 0,
            tail_guard: None,
        }
    }
}

impl Iterator for LogLines {
    type Item = io::Result<(GameEvent, String)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e)),
            };

            if let Some((pos, file_len)) = &mut self.tail_guard {
                let line_bytes = line.len() as u64;
                // A line whose content reaches EOF without a trailing
                // newline is a torn write; skip it.
                if *pos + line_bytes >= *file_len {
                    return None;
                }
                *pos += line_bytes + 1;
            }

            if line.is_empty() {
                continue;
            }

            let hash = line_hash(line.as_bytes());

            let event: GameEvent = match serde_json::from_str(&line) {
                Ok(ev) => ev,
                Err(e) => {
                    return Some(Err(io::Error::new(io::ErrorKind::InvalidData, e)));
                }
            };

            if event.seq <= self.prev_seq {
                return Some(Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "sequence regression: seq {} after {}",
                        event.seq, self.prev_seq
                    ),
                )));
            }
            self.prev_seq = event.seq;

            if event.seq < self.min_seq {
                continue;
            }
            return Some(Ok((event, hash)));
        }
    }
}
