//! The game state machine: a pure transition function over snapshots.
//!
//! `transition` never performs I/O and never mutates its inputs — it clones
//! the snapshot, applies one event, and returns the new snapshot plus the
//! side effects the shell must act on. Rule violations come back as
//! [`EngineError`] values; nothing here panics on bad input.

use crate::error::EngineError;
use crate::event::{
    AtBatOutcome, EventPayload, FlipCupResult, GameEvent, PitchResult, ScoringMethod,
};
use crate::project::effective_events;
use crate::state::{GameSnapshot, GameStatus, SideEffect};

/// Strikes that retire the batter.
pub const STRIKE_LIMIT: u8 = 3;
/// Balls that award first base.
pub const BALL_LIMIT: u8 = 4;
/// Outs that end a half-inning.
pub const OUT_LIMIT: u8 = 3;

/// Result of a successful transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub snapshot: GameSnapshot,
    pub side_effects: Vec<SideEffect>,
}

/// Apply one event to a snapshot.
///
/// `prior_events` is the game's log before this event, ordered by sequence
/// number. It is consulted for the flip-cup pending window and for
/// validating `undo`/`edit` targets; correction events inside it are
/// resolved the same way the projector resolves them, so a live transition
/// and a replay always agree.
pub fn transition(
    snapshot: &GameSnapshot,
    event: &GameEvent,
    prior_events: &[GameEvent],
) -> Result<Transition, EngineError> {
    if !snapshot.game_id.is_empty() && snapshot.game_id != event.game_id {
        return Err(EngineError::validation(format!(
            "event for game {} applied to game {}",
            event.game_id, snapshot.game_id
        )));
    }

    match &event.payload {
        EventPayload::GameStart { .. } => apply_game_start(snapshot, event),
        EventPayload::Pitch { result } => apply_pitch(snapshot, event, prior_events, *result),
        EventPayload::FlipCup { result, .. } => {
            apply_flip_cup(snapshot, event, prior_events, *result)
        }
        EventPayload::AtBat { outcome } => apply_at_bat(snapshot, event, prior_events, *outcome),
        EventPayload::InningEnd {
            home_score,
            away_score,
            ..
        } => apply_inning_end(snapshot, event, *home_score, *away_score),
        EventPayload::GameEnd {
            home_score,
            away_score,
            scoring_method,
        } => apply_game_end(snapshot, event, *home_score, *away_score, *scoring_method),
        EventPayload::Takeover { umpire } => apply_takeover(snapshot, event, umpire),
        EventPayload::Undo { target_event_id } => {
            apply_correction(snapshot, event, prior_events, target_event_id, None)
        }
        EventPayload::Edit {
            target_event_id,
            payload,
        } => apply_correction(
            snapshot,
            event,
            prior_events,
            target_event_id,
            Some(payload.as_ref()),
        ),
    }
}

fn require_in_progress(snapshot: &GameSnapshot, kind: &str) -> Result<(), EngineError> {
    if snapshot.status != GameStatus::InProgress {
        return Err(EngineError::invalid_state(format!(
            "{kind} requires a game in progress, status is {:?}",
            snapshot.status
        )));
    }
    Ok(())
}

/// The batter currently at the plate, or a validation error if the
/// snapshot has none (only possible on a corrupt log).
fn require_batter(snapshot: &GameSnapshot) -> Result<String, EngineError> {
    snapshot
        .batter
        .clone()
        .ok_or_else(|| EngineError::validation("no batter at the plate"))
}

/// The unresolved cup-hit pitch at the tail of the log, if any.
///
/// Pending means: the last effective event is a pitch whose result was a
/// cup hit. Anything the umpire entered after it (including an undo of the
/// pitch itself) clears or re-establishes the window naturally.
fn pending_cup(prior_events: &[GameEvent]) -> Option<u8> {
    let effective = effective_events(prior_events);
    effective.last().and_then(|ev| match &ev.payload {
        EventPayload::Pitch { result } => result.cup_bases(),
        _ => None,
    })
}

fn reject_if_cup_pending(prior_events: &[GameEvent], kind: &str) -> Result<(), EngineError> {
    if pending_cup(prior_events).is_some() {
        return Err(EngineError::invalid_sequence(format!(
            "{kind} submitted while a flip cup result is pending"
        )));
    }
    Ok(())
}

fn apply_game_start(
    snapshot: &GameSnapshot,
    event: &GameEvent,
) -> Result<Transition, EngineError> {
    let EventPayload::GameStart {
        umpire,
        home_team,
        away_team,
        home_lineup,
        away_lineup,
        innings,
    } = &event.payload
    else {
        unreachable!("dispatched on payload kind");
    };

    if snapshot.status != GameStatus::NotStarted {
        return Err(EngineError::invalid_state("game has already started"));
    }
    if home_lineup.is_empty() || away_lineup.is_empty() {
        return Err(EngineError::validation("lineups must be non-empty"));
    }
    if *innings == 0 {
        return Err(EngineError::validation("innings must be at least 1"));
    }

    let mut snap = GameSnapshot::empty(event.game_id.clone());
    snap.status = GameStatus::InProgress;
    snap.inning = 1;
    snap.home_team = home_team.clone();
    snap.away_team = away_team.clone();
    snap.home_lineup = home_lineup.clone();
    snap.away_lineup = away_lineup.clone();
    snap.innings = *innings;
    snap.umpire = umpire.clone();
    snap.updated_at = event.ts;
    snap.refresh_roles();

    Ok(Transition {
        snapshot: snap,
        side_effects: Vec::new(),
    })
}

fn apply_pitch(
    snapshot: &GameSnapshot,
    event: &GameEvent,
    prior_events: &[GameEvent],
    result: PitchResult,
) -> Result<Transition, EngineError> {
    require_in_progress(snapshot, "pitch")?;
    reject_if_cup_pending(prior_events, "pitch")?;

    let mut snap = snapshot.clone();
    let mut effects = Vec::new();
    snap.updated_at = event.ts;

    if result.cup_bases().is_some() {
        // Deferred: no score, outs, or count change until the flip cup
        // resolves.
        effects.push(SideEffect::FlipCupPending);
    } else if result.is_strike() {
        snap.strikes += 1;
        if snap.strikes >= STRIKE_LIMIT {
            batter_out(&mut snap, &mut effects);
        }
    } else {
        snap.balls += 1;
        if snap.balls >= BALL_LIMIT {
            let batter = require_batter(&snap)?;
            let runs = apply_walk(&mut snap, batter);
            finish_plate_appearance(&mut snap);
            report_runs(&mut snap, runs, &mut effects);
        }
    }

    Ok(Transition {
        snapshot: snap,
        side_effects: effects,
    })
}

fn apply_flip_cup(
    snapshot: &GameSnapshot,
    event: &GameEvent,
    prior_events: &[GameEvent],
    result: FlipCupResult,
) -> Result<Transition, EngineError> {
    require_in_progress(snapshot, "flip_cup")?;
    let Some(hit_bases) = pending_cup(prior_events) else {
        return Err(EngineError::invalid_sequence(
            "flip_cup requires a cup-hit pitch immediately before it",
        ));
    };

    let mut snap = snapshot.clone();
    let mut effects = Vec::new();
    snap.updated_at = event.ts;

    match result {
        FlipCupResult::Defense => {
            // Batter out; bases hold.
            batter_out(&mut snap, &mut effects);
        }
        FlipCupResult::Offense => {
            let batter = require_batter(&snap)?;
            let runs = apply_hit(&mut snap, batter, hit_bases);
            finish_plate_appearance(&mut snap);
            report_runs(&mut snap, runs, &mut effects);
        }
    }

    Ok(Transition {
        snapshot: snap,
        side_effects: effects,
    })
}

fn apply_at_bat(
    snapshot: &GameSnapshot,
    event: &GameEvent,
    prior_events: &[GameEvent],
    outcome: AtBatOutcome,
) -> Result<Transition, EngineError> {
    require_in_progress(snapshot, "at_bat")?;
    reject_if_cup_pending(prior_events, "at_bat")?;

    let mut snap = snapshot.clone();
    let mut effects = Vec::new();
    snap.updated_at = event.ts;

    match outcome {
        AtBatOutcome::Out => batter_out(&mut snap, &mut effects),
        AtBatOutcome::Walk => {
            let batter = require_batter(&snap)?;
            let runs = apply_walk(&mut snap, batter);
            finish_plate_appearance(&mut snap);
            report_runs(&mut snap, runs, &mut effects);
        }
        AtBatOutcome::Single | AtBatOutcome::Double | AtBatOutcome::Triple
        | AtBatOutcome::HomeRun => {
            let bases = match outcome {
                AtBatOutcome::Single => 1,
                AtBatOutcome::Double => 2,
                AtBatOutcome::Triple => 3,
                _ => 4,
            };
            let batter = require_batter(&snap)?;
            let runs = apply_hit(&mut snap, batter, bases);
            finish_plate_appearance(&mut snap);
            report_runs(&mut snap, runs, &mut effects);
        }
    }

    Ok(Transition {
        snapshot: snap,
        side_effects: effects,
    })
}

fn apply_inning_end(
    snapshot: &GameSnapshot,
    event: &GameEvent,
    home_score: Option<u32>,
    away_score: Option<u32>,
) -> Result<Transition, EngineError> {
    require_in_progress(snapshot, "inning_end")?;

    let mut snap = snapshot.clone();
    snap.updated_at = event.ts;

    let effects = vec![SideEffect::HalfInningEnd {
        inning: snap.inning,
        half: snap.half,
    }];

    if let Some(score) = home_score {
        snap.home_score = score;
    }
    if let Some(score) = away_score {
        snap.away_score = score;
    }

    snap.end_half();
    snap.refresh_roles();

    Ok(Transition {
        snapshot: snap,
        side_effects: effects,
    })
}

fn apply_game_end(
    snapshot: &GameSnapshot,
    event: &GameEvent,
    home_score: u32,
    away_score: u32,
    scoring_method: ScoringMethod,
) -> Result<Transition, EngineError> {
    require_in_progress(snapshot, "game_end")?;

    let mut snap = snapshot.clone();
    snap.updated_at = event.ts;

    match scoring_method {
        ScoringMethod::Live => {
            if home_score != snap.home_score || away_score != snap.away_score {
                return Err(EngineError::validation(format!(
                    "live final score {home_score}-{away_score} does not match \
                     snapshot {}-{}",
                    snap.home_score, snap.away_score
                )));
            }
        }
        ScoringMethod::QuickResult => {
            snap.home_score = home_score;
            snap.away_score = away_score;
        }
    }

    snap.status = GameStatus::Completed;

    Ok(Transition {
        snapshot: snap,
        side_effects: vec![SideEffect::GameEnded],
    })
}

fn apply_takeover(
    snapshot: &GameSnapshot,
    event: &GameEvent,
    umpire: &str,
) -> Result<Transition, EngineError> {
    if !matches!(
        snapshot.status,
        GameStatus::InProgress | GameStatus::Paused
    ) {
        return Err(EngineError::invalid_state(
            "takeover requires an active game",
        ));
    }

    let mut snap = snapshot.clone();
    snap.umpire = umpire.to_string();
    snap.updated_at = event.ts;

    Ok(Transition {
        snapshot: snap,
        side_effects: Vec::new(),
    })
}

/// Validate an `undo` or `edit` and signal the rebuild. The snapshot is
/// returned untouched — the projector produces the corrected state.
fn apply_correction(
    snapshot: &GameSnapshot,
    event: &GameEvent,
    prior_events: &[GameEvent],
    target_event_id: &str,
    replacement: Option<&EventPayload>,
) -> Result<Transition, EngineError> {
    let target = prior_events
        .iter()
        .find(|ev| ev.id == target_event_id)
        .ok_or_else(|| {
            EngineError::validation(format!("event {target_event_id} not found in this game"))
        })?;

    if target.game_id != event.game_id {
        return Err(EngineError::validation(format!(
            "event {target_event_id} belongs to another game"
        )));
    }
    if target.payload.is_correction() {
        return Err(EngineError::validation(
            "undo and edit events cannot themselves be corrected",
        ));
    }

    if let Some(payload) = replacement {
        if payload.is_correction() {
            return Err(EngineError::validation(
                "replacement payload cannot be an undo or edit",
            ));
        }
        if payload.kind() != target.payload.kind() {
            return Err(EngineError::validation(format!(
                "replacement payload must stay {}, got {}",
                target.payload.kind(),
                payload.kind()
            )));
        }
    } else if matches!(target.payload, EventPayload::GameStart { .. }) {
        // Undoing the game start is only legal while it is the sole
        // gameplay event; replaying anything after it would fail.
        let has_later_gameplay = prior_events
            .iter()
            .any(|ev| ev.seq > target.seq && !ev.payload.is_correction());
        if has_later_gameplay {
            return Err(EngineError::validation(
                "cannot undo game_start once gameplay events exist",
            ));
        }
    }

    let mut snap = snapshot.clone();
    snap.updated_at = event.ts;

    Ok(Transition {
        snapshot: snap,
        side_effects: vec![SideEffect::RebuildRequired {
            target_event_id: target_event_id.to_string(),
        }],
    })
}

/// Retire the batter: count resets, lineup advances, outs increment, and
/// the half-inning rolls over at the third out.
fn batter_out(snap: &mut GameSnapshot, effects: &mut Vec<SideEffect>) {
    snap.reset_count();
    snap.advance_batting_index();
    snap.outs += 1;
    if snap.outs >= OUT_LIMIT {
        effects.push(SideEffect::HalfInningEnd {
            inning: snap.inning,
            half: snap.half,
        });
        snap.end_half();
    }
    snap.refresh_roles();
}

/// Batter-reached bookkeeping shared by walks and hits: count resets and
/// the lineup advances to the next batter.
fn finish_plate_appearance(snap: &mut GameSnapshot) {
    snap.reset_count();
    snap.advance_batting_index();
    snap.refresh_roles();
}

/// Award first base on a walk with the standard force-advance chain: an
/// occupied base pushes its runner only while every base behind it is also
/// occupied. Returns runs scored (0 or 1 — bases-loaded walk).
fn apply_walk(snap: &mut GameSnapshot, batter: String) -> u32 {
    let mut runs = 0;
    if snap.bases.first.is_some() {
        if snap.bases.second.is_some() {
            if snap.bases.third.is_some() {
                runs += 1;
            }
            snap.bases.third = snap.bases.second.take();
        }
        snap.bases.second = snap.bases.first.take();
    }
    snap.bases.first = Some(batter);
    runs
}

/// Advance every runner by `bases` and place the batter, resolving from
/// third down to first so no base is written twice. Any runner (the batter
/// included) pushed past third scores. Runners are moved by position only —
/// identity is never consulted.
fn apply_hit(snap: &mut GameSnapshot, batter: String, bases: u8) -> u32 {
    let mut runs = 0;

    let occupants = [
        (3u8, snap.bases.third.take()),
        (2u8, snap.bases.second.take()),
        (1u8, snap.bases.first.take()),
    ];
    for (start, runner) in occupants {
        if let Some(id) = runner {
            let dest = start + bases;
            if dest > 3 {
                runs += 1;
            } else {
                snap.bases.set(dest, id);
            }
        }
    }

    if bases > 3 {
        runs += 1;
    } else {
        snap.bases.set(bases, batter);
    }

    runs
}

/// Credit runs and emit the `score_change` side effect when any scored.
fn report_runs(snap: &mut GameSnapshot, runs: u32, effects: &mut Vec<SideEffect>) {
    if runs > 0 {
        let team = snap.batting_team().to_string();
        snap.add_runs(runs);
        effects.push(SideEffect::ScoreChange { team, runs });
    }
}
