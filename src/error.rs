use serde::Serialize;
use std::io;
use thiserror::Error;

/// Rule violations reported by the game engine.
///
/// These are expected, recoverable outcomes of submitting an event — the
/// submission layer surfaces them to the umpire and does not persist the
/// event. They are never raised for I/O or data-integrity problems.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The event is not legal in the game's current status
    /// (e.g. a second `game_start`, a pitch before the game begins).
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The event is legal in this status but not at this point in the log
    /// (e.g. a `flip_cup` with no cup-hit pitch immediately before it).
    #[error("invalid sequence: {0}")]
    InvalidSequence(String),

    /// Malformed or inconsistent payload (empty lineup, score mismatch on a
    /// live `game_end`, undo of a nonexistent event).
    #[error("validation: {0}")]
    Validation(String),
}

impl EngineError {
    pub fn invalid_state(detail: impl Into<String>) -> Self {
        Self::InvalidState(detail.into())
    }
    pub fn invalid_sequence(detail: impl Into<String>) -> Self {
        Self::InvalidSequence(detail.into())
    }
    pub fn validation(detail: impl Into<String>) -> Self {
        Self::Validation(detail.into())
    }
}

/// Failure to place a match under slot capacity and rest constraints.
///
/// A hard scheduling failure — the caller relaxes the constraints or adds
/// slots; nothing is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("no suitable slot for game {game_number} ({home} vs {away})")]
    NoSuitableSlot {
        game_number: u32,
        home: String,
        away: String,
    },
}

/// Errors from bracket generation and result recording.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BracketError {
    #[error("a bracket needs at least two teams, got {0}")]
    TooFewTeams(usize),

    /// The bracket type is recognized on the wire but its construction is
    /// not implemented. Only the game-count math exists for double
    /// elimination.
    #[error("{0} bracket construction is not supported")]
    Unsupported(String),

    #[error("no match with game number {0}")]
    MatchNotFound(u32),

    #[error("team {team} is not playing in game {game_number}")]
    TeamNotInMatch { game_number: u32, team: String },
}

/// Conditional-append failures on the game log.
#[derive(Debug, Error)]
pub enum AppendError {
    /// The log head moved past the expected sequence number — another
    /// writer got there first.
    #[error("log head is at seq {actual}, expected {expected}")]
    SequenceConflict { expected: u64, actual: u64 },

    /// The head sequence number matched but its line hash did not — the
    /// caller's view of the log is stale or the log was rewritten.
    #[error("head line hash mismatch at seq {seq}")]
    HashMismatch { seq: u64 },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Errors surfaced while projecting a snapshot from the stored log.
///
/// `Engine` here means the historical log itself violates the rules — a
/// data-integrity failure, not a normal runtime rejection.
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("corrupt event log: {0}")]
    Engine(#[from] EngineError),
}

/// Outcome of a structural validation pass.
///
/// Problems are collected, not short-circuited — one call reports every
/// error at once. `warnings` flag oddities that do not make the structure
/// unusable.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn from_findings(errors: Vec<String>, warnings: Vec<String>) -> Self {
        ValidationReport {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}
