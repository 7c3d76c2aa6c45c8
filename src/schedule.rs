//! Round-robin schedule generation and time-slot assignment.
//!
//! Pairing uses the standard rotation algorithm: one seat is fixed, the
//! rest rotate each round. An odd roster is padded with a synthetic bye
//! team whose matches are dropped, giving each real team one bye round.

use crate::error::{ScheduleError, ValidationReport};
use crate::standings::Team;
use serde::Serialize;
use std::collections::HashSet;

/// One scheduled match. `time_slot`/`start_minute` stay `None` until a
/// distribution pass assigns them.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ScheduledMatch {
    /// 1-based, contiguous across the whole schedule.
    pub game_number: u32,
    /// 1-based round.
    pub round: u32,
    pub home_team: String,
    pub away_team: String,
    pub time_slot: Option<String>,
    /// Assigned start, minutes from the tournament epoch.
    pub start_minute: Option<u32>,
}

/// A generated round-robin schedule.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Schedule {
    pub total_rounds: u32,
    /// Nominal matches per round (padded team count / 2); rounds
    /// containing a dropped bye match have one fewer.
    pub matches_per_round: u32,
    pub matches: Vec<ScheduledMatch>,
}

/// A bounded window of play with a game capacity.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SlotConfig {
    pub label: String,
    /// Window start/end, minutes from the tournament epoch.
    pub start_minute: u32,
    pub end_minute: u32,
    pub max_games: u32,
}

/// Generate a round-robin where every team plays every other exactly once.
///
/// For N teams (after bye padding to even M): M−1 rounds, M/2 nominal
/// matches per round, and N·(N−1)/2 total matches.
pub fn generate_round_robin_schedule(teams: &[Team]) -> Schedule {
    if teams.len() < 2 {
        return Schedule {
            total_rounds: 0,
            matches_per_round: 0,
            matches: Vec::new(),
        };
    }

    // Seats hold Some(team) or the synthetic bye (None) for odd rosters.
    let mut seats: Vec<Option<&Team>> = teams.iter().map(Some).collect();
    if seats.len() % 2 != 0 {
        seats.push(None);
    }
    let padded = seats.len();
    let total_rounds = (padded - 1) as u32;

    let mut matches = Vec::with_capacity(teams.len() * (teams.len() - 1) / 2);
    let mut game_number = 0;

    for round in 1..=total_rounds {
        for i in 0..padded / 2 {
            let (a, b) = (seats[i], seats[padded - 1 - i]);
            let (Some(a), Some(b)) = (a, b) else {
                continue; // bye match, dropped
            };
            // Alternate sides round to round so no team is always home.
            let (home, away) = if round % 2 == 0 { (b, a) } else { (a, b) };
            game_number += 1;
            matches.push(ScheduledMatch {
                game_number,
                round,
                home_team: home.id.clone(),
                away_team: away.id.clone(),
                time_slot: None,
                start_minute: None,
            });
        }
        // Fix seat 0, rotate the rest clockwise.
        seats[1..].rotate_right(1);
    }

    Schedule {
        total_rounds,
        matches_per_round: (padded / 2) as u32,
        matches,
    }
}

/// Check schedule invariants: every unordered pair exactly once, no team
/// plays itself, all teams belong to the roster, and each team appears in
/// exactly N−1 matches. Problems are collected into one report.
pub fn validate_round_robin_schedule(schedule: &Schedule, teams: &[Team]) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let roster: HashSet<&str> = teams.iter().map(|t| t.id.as_str()).collect();
    let mut seen_pairs: HashSet<(String, String)> = HashSet::new();

    for m in &schedule.matches {
        if m.home_team == m.away_team {
            errors.push(format!("game {}: team {} plays itself", m.game_number, m.home_team));
            continue;
        }
        for team in [&m.home_team, &m.away_team] {
            if !roster.contains(team.as_str()) {
                errors.push(format!("game {}: unknown team {team}", m.game_number));
            }
        }
        let pair = if m.home_team < m.away_team {
            (m.home_team.clone(), m.away_team.clone())
        } else {
            (m.away_team.clone(), m.home_team.clone())
        };
        if !seen_pairs.insert(pair) {
            errors.push(format!(
                "pair {} / {} scheduled more than once",
                m.home_team, m.away_team
            ));
        }
    }

    let expected_pairs = teams.len() * teams.len().saturating_sub(1) / 2;
    if schedule.matches.len() != expected_pairs {
        errors.push(format!(
            "expected {expected_pairs} matches for {} teams, found {}",
            teams.len(),
            schedule.matches.len()
        ));
    }

    for team in teams {
        let appearances = schedule
            .matches
            .iter()
            .filter(|m| m.home_team == team.id || m.away_team == team.id)
            .count();
        if appearances != teams.len().saturating_sub(1) {
            errors.push(format!(
                "team {} appears in {appearances} matches, expected {}",
                team.id,
                teams.len().saturating_sub(1)
            ));
        }
    }

    let expected_rounds = if teams.len() < 2 {
        0
    } else {
        (teams.len() + teams.len() % 2 - 1) as u32
    };
    if schedule.total_rounds != expected_rounds {
        warnings.push(format!(
            "total_rounds is {}, expected {expected_rounds}",
            schedule.total_rounds
        ));
    }

    ValidationReport::from_findings(errors, warnings)
}

/// Assign matches to a cyclic list of slot labels, in schedule order.
/// With no slots this is a no-op.
pub fn distribute_games_across_time_slots(schedule: &mut Schedule, slots: &[String]) {
    if slots.is_empty() {
        return;
    }
    for (i, m) in schedule.matches.iter_mut().enumerate() {
        m.time_slot = Some(slots[i % slots.len()].clone());
    }
}

/// Greedily place each match (in schedule order) into the earliest slot
/// that has capacity, fits the game inside the slot window, and keeps at
/// least `rest_minutes` between two matches of the same team.
///
/// Returns the fully assigned match list, or [`ScheduleError::NoSuitableSlot`]
/// for the first match that cannot be placed — a hard failure, not
/// retried.
pub fn distribute_games_with_constraints(
    schedule: &Schedule,
    slots: &[SlotConfig],
    game_minutes: u32,
    rest_minutes: u32,
) -> Result<Vec<ScheduledMatch>, ScheduleError> {
    let mut order: Vec<&SlotConfig> = slots.iter().collect();
    order.sort_by_key(|s| s.start_minute);

    let mut assigned: Vec<ScheduledMatch> = Vec::with_capacity(schedule.matches.len());
    let mut used: Vec<u32> = vec![0; order.len()];

    for m in &schedule.matches {
        let mut placed = false;
        for (si, slot) in order.iter().enumerate() {
            if used[si] >= slot.max_games {
                continue;
            }
            let start = slot.start_minute + used[si] * game_minutes;
            if start + game_minutes > slot.end_minute {
                continue;
            }
            let rested = assigned
                .iter()
                .filter(|prev| {
                    prev.home_team == m.home_team
                        || prev.away_team == m.home_team
                        || prev.home_team == m.away_team
                        || prev.away_team == m.away_team
                })
                .all(|prev| {
                    let prev_start = prev.start_minute.unwrap_or(0);
                    let prev_end = prev_start + game_minutes;
                    let end = start + game_minutes;
                    start >= prev_end + rest_minutes || prev_start >= end + rest_minutes
                });
            if !rested {
                continue;
            }

            let mut placed_match = m.clone();
            placed_match.time_slot = Some(slot.label.clone());
            placed_match.start_minute = Some(start);
            assigned.push(placed_match);
            used[si] += 1;
            placed = true;
            break;
        }
        if !placed {
            return Err(ScheduleError::NoSuitableSlot {
                game_number: m.game_number,
                home: m.home_team.clone(),
                away: m.away_team.clone(),
            });
        }
    }

    Ok(assigned)
}
