#![allow(dead_code)]

use cupball::{
    transition, AtBatOutcome, EventPayload, FlipCupResult, GameEvent, GameResult, GameSnapshot,
    GameStatus, PitchResult, ScoringMethod, Team,
};

pub const GAME: &str = "game-1";
pub const UMP: &str = "ump-1";

/// Home lineup h1..h3, away lineup a1..a3.
pub fn start_payload() -> EventPayload {
    EventPayload::GameStart {
        umpire: UMP.to_string(),
        home_team: "team-home".to_string(),
        away_team: "team-away".to_string(),
        home_lineup: vec!["h1".into(), "h2".into(), "h3".into()],
        away_lineup: vec!["a1".into(), "a2".into(), "a3".into()],
        innings: 3,
    }
}

pub fn event(id: &str, seq: u64, payload: EventPayload) -> GameEvent {
    GameEvent::new(id, GAME, payload, UMP).with_seq(seq).with_ts(1000 + seq)
}

pub fn pitch(id: &str, seq: u64, result: PitchResult) -> GameEvent {
    event(id, seq, EventPayload::Pitch { result })
}

pub fn flip_cup(id: &str, seq: u64, result: FlipCupResult) -> GameEvent {
    event(
        id,
        seq,
        EventPayload::FlipCup {
            result,
            errors: Vec::new(),
            batter: None,
        },
    )
}

pub fn at_bat(id: &str, seq: u64, outcome: AtBatOutcome) -> GameEvent {
    event(id, seq, EventPayload::AtBat { outcome })
}

pub fn game_end(id: &str, seq: u64, home: u32, away: u32, method: ScoringMethod) -> GameEvent {
    event(
        id,
        seq,
        EventPayload::GameEnd {
            home_score: home,
            away_score: away,
            scoring_method: method,
        },
    )
}

/// A freshly started game: returns the snapshot after `game_start` and the
/// log so far.
pub fn started_game() -> (GameSnapshot, Vec<GameEvent>) {
    let start = event("evt-start", 1, start_payload());
    let t = transition(&GameSnapshot::empty(GAME), &start, &[]).unwrap();
    (t.snapshot, vec![start])
}

/// Apply `next` on top of `(snapshot, log)`, asserting success, and push it
/// onto the log.
pub fn step(
    snapshot: GameSnapshot,
    log: &mut Vec<GameEvent>,
    next: GameEvent,
) -> GameSnapshot {
    let t = transition(&snapshot, &next, log).unwrap();
    log.push(next);
    t.snapshot
}

pub fn teams(names: &[&str]) -> Vec<Team> {
    names
        .iter()
        .map(|n| Team {
            id: format!("id-{n}"),
            name: n.to_string(),
        })
        .collect()
}

pub fn completed(game_id: &str, home: &str, away: &str, hs: u32, aw: u32) -> GameResult {
    GameResult {
        game_id: game_id.to_string(),
        home_team: home.to_string(),
        away_team: away.to_string(),
        home_score: hs,
        away_score: aw,
        status: GameStatus::Completed,
    }
}
