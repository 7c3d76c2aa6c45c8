use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// An immutable event record in a game's log.
///
/// Events are serialized as single JSON lines in `game.jsonl`, ordered by
/// `seq` — a 1-based, gap-free sequence number unique within the game.
/// Replaying events `1..=N` deterministically reproduces the snapshot after
/// event N. Events are never mutated in place: corrections happen through
/// `undo` and `edit` events that trigger a full rebuild of the snapshot.
///
/// The payload is a tagged union ([`EventPayload`]) rather than a loose JSON
/// object, so every transition handler is exhaustively type-checked and the
/// wire vocabulary is part of the type.
///
/// # Examples
///
/// ```
/// use cupball::{GameEvent, EventPayload, PitchResult};
///
/// let event = GameEvent::new(
///     "evt-001",
///     "game-7",
///     EventPayload::Pitch { result: PitchResult::Ball },
///     "ump-1",
/// );
/// assert_eq!(event.kind(), "pitch");
/// assert_eq!(event.seq, 0); // assigned by the log on append
/// assert!(event.ts > 0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameEvent {
    /// Unique event identifier. Not auto-generated — callers provide their
    /// own (uuid, ulid, etc.). `undo` and `edit` reference events by it.
    pub id: String,

    /// The game this event belongs to.
    pub game_id: String,

    /// 1-based sequence number within the game. `0` means "not yet
    /// appended" — the log assigns the next number on append.
    pub seq: u64,

    /// Type-specific payload, serialized inline with a `"type"` tag.
    #[serde(flatten)]
    pub payload: EventPayload,

    /// The umpire who submitted the event.
    pub umpire_id: String,

    /// Unix timestamp in seconds, auto-populated by [`GameEvent::new`].
    pub ts: u64,
}

impl GameEvent {
    /// Create a new event with the current timestamp and an unassigned
    /// sequence number.
    ///
    /// # Panics
    ///
    /// Panics if the system clock is set before the Unix epoch.
    pub fn new(
        id: impl Into<String>,
        game_id: impl Into<String>,
        payload: EventPayload,
        umpire_id: impl Into<String>,
    ) -> Self {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        GameEvent {
            id: id.into(),
            game_id: game_id.into(),
            seq: 0,
            payload,
            umpire_id: umpire_id.into(),
            ts,
        }
    }

    /// Set the sequence number. Used by tests and by callers replaying
    /// events that were already numbered by a log.
    pub fn with_seq(mut self, seq: u64) -> Self {
        self.seq = seq;
        self
    }

    /// Override the auto-populated timestamp.
    pub fn with_ts(mut self, ts: u64) -> Self {
        self.ts = ts;
        self
    }

    /// The wire tag of this event's payload (`"pitch"`, `"flip_cup"`, ...).
    pub fn kind(&self) -> &'static str {
        self.payload.kind()
    }
}

/// Type-specific event payloads — the wire contract between umpire-facing
/// submission and the engine. Variant tags and field names are stable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// Opens the game. Lineups are ordered and must be non-empty.
    GameStart {
        umpire: String,
        home_team: String,
        away_team: String,
        home_lineup: Vec<String>,
        away_lineup: Vec<String>,
        innings: u32,
    },

    /// One pitch. Cup hits do not resolve here — they defer to a follow-up
    /// `flip_cup` event.
    Pitch { result: PitchResult },

    /// Resolution of the flip-cup contest following a cup-hit pitch.
    FlipCup {
        result: FlipCupResult,
        /// Player ids charged with fielding errors, if any.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        errors: Vec<String>,
        /// Batter id as entered by the umpire. Informational: runner
        /// advancement is resolved by base position, never by comparing
        /// player identity against this field.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        batter: Option<String>,
    },

    /// Direct at-bat resolution for manual scoring flows, bypassing the
    /// pitch/flip-cup two-step.
    AtBat { outcome: AtBatOutcome },

    /// Soft-deletes a prior event and triggers a snapshot rebuild.
    Undo { target_event_id: String },

    /// Replaces a prior event's payload and triggers a snapshot rebuild.
    Edit {
        target_event_id: String,
        payload: Box<EventPayload>,
    },

    /// Reassigns the controlling umpire.
    Takeover { umpire: String },

    /// Umpire override that force-ends the current half-inning, optionally
    /// correcting the score.
    InningEnd {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        home_score: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        away_score: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        notes: Option<String>,
    },

    /// Ends the game with final scores.
    GameEnd {
        home_score: u32,
        away_score: u32,
        scoring_method: ScoringMethod,
    },
}

impl EventPayload {
    /// The serialized `"type"` tag for this variant.
    pub fn kind(&self) -> &'static str {
        match self {
            EventPayload::GameStart { .. } => "game_start",
            EventPayload::Pitch { .. } => "pitch",
            EventPayload::FlipCup { .. } => "flip_cup",
            EventPayload::AtBat { .. } => "at_bat",
            EventPayload::Undo { .. } => "undo",
            EventPayload::Edit { .. } => "edit",
            EventPayload::Takeover { .. } => "takeover",
            EventPayload::InningEnd { .. } => "inning_end",
            EventPayload::GameEnd { .. } => "game_end",
        }
    }

    /// True for `undo` and `edit` — events about other events, skipped when
    /// computing the effective log.
    pub fn is_correction(&self) -> bool {
        matches!(self, EventPayload::Undo { .. } | EventPayload::Edit { .. })
    }
}

/// Outcome of a single pitch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PitchResult {
    Ball,
    StrikeSwinging,
    StrikeLooking,
    /// Cup hits: the ball landed in the single/double/triple/home-run cup.
    /// Resolution is deferred to a flip-cup contest.
    FirstCup,
    SecondCup,
    ThirdCup,
    HomeRunCup,
}

impl PitchResult {
    pub fn is_strike(self) -> bool {
        matches!(self, PitchResult::StrikeSwinging | PitchResult::StrikeLooking)
    }

    /// Bases awarded if the offense wins the flip-cup for this pitch.
    /// `None` for non-cup results.
    pub fn cup_bases(self) -> Option<u8> {
        match self {
            PitchResult::FirstCup => Some(1),
            PitchResult::SecondCup => Some(2),
            PitchResult::ThirdCup => Some(3),
            PitchResult::HomeRunCup => Some(4),
            _ => None,
        }
    }
}

/// Winner of a flip-cup contest.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FlipCupResult {
    /// Batting team won — the cup hit becomes a hit.
    Offense,
    /// Fielding team won — the batter is out.
    Defense,
}

/// Direct at-bat outcomes for the manual scoring flow.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AtBatOutcome {
    Walk,
    Out,
    Single,
    Double,
    Triple,
    HomeRun,
}

impl AtBatOutcome {
    /// Bases awarded for hit outcomes; `None` for walk/out.
    pub fn hit_bases(self) -> Option<u8> {
        match self {
            AtBatOutcome::Single => Some(1),
            AtBatOutcome::Double => Some(2),
            AtBatOutcome::Triple => Some(3),
            AtBatOutcome::HomeRun => Some(4),
            AtBatOutcome::Walk | AtBatOutcome::Out => None,
        }
    }
}

/// How a game's final score was produced.
///
/// `QuickResult` is the explicit escape hatch for games not scored
/// pitch-by-pitch: final scores may differ from the snapshot and simply
/// overwrite it. `Live` requires an exact match.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMethod {
    Live,
    QuickResult,
}
