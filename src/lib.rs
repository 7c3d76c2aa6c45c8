//! Deterministic scoring engine for cup baseball.
//!
//! A game's state is a fold over its umpire event log: the pure
//! [`transition`] function applies one event at a time, and [`project`]
//! replays a whole log into the current [`GameSnapshot`]. Corrections
//! (`undo`/`edit`) never patch state in place — they invalidate the fold
//! and the snapshot is rebuilt from the effective log.
//!
//! On top of the per-game engine sits the tournament layer: round-robin
//! [`standings`](calculate_team_standings) with a deterministic tiebreak
//! cascade, a rotation [`scheduler`](generate_round_robin_schedule), and a
//! seeded single-elimination [`bracket`](generate_tournament_bracket)
//! generator with byes.

mod bracket;
mod engine;
mod error;
mod event;
mod project;
mod schedule;
pub mod snapshot;
mod standings;
mod state;
mod store;

pub use bracket::{
    assign_byes_to_top_seeded_teams, calculate_bracket_games, calculate_bracket_rounds,
    calculate_byes_needed, generate_bracket_seeding, generate_tournament_bracket,
    next_power_of_two, record_match_result, validate_bracket_seeding,
    validate_bracket_structure, BracketMatch, BracketType, SeedSlot, TournamentBracket,
};
pub use engine::{transition, Transition, BALL_LIMIT, OUT_LIMIT, STRIKE_LIMIT};
pub use error::{
    AppendError, BracketError, EngineError, ProjectError, ScheduleError, ValidationReport,
};
pub use event::{
    AtBatOutcome, EventPayload, FlipCupResult, GameEvent, PitchResult, ScoringMethod,
};
pub use project::{effective_events, project, Projector};
pub use schedule::{
    distribute_games_across_time_slots, distribute_games_with_constraints,
    generate_round_robin_schedule, validate_round_robin_schedule, Schedule, ScheduledMatch,
    SlotConfig,
};
pub use standings::{
    calculate_team_standings, explain_tiebreaks, update_standings_from_games, GameResult, Team,
    TeamStanding, TiebreakExplanation,
};
pub use state::{Bases, GameSnapshot, GameStatus, Half, SideEffect};
pub use store::{line_hash, AppendReceipt, GameLogReader, GameLogWriter, LockMode};
