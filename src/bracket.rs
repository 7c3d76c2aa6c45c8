//! Single-elimination bracket generation from standings.
//!
//! Seeding follows the standard order — 1 vs last, 2 vs second-to-last,
//! recursively — so top seeds meet bottom seeds first and are maximally
//! separated in early rounds. Byes fill the gap up to the next power of
//! two and go to the top seeds, who auto-advance without playing.

use crate::error::{BracketError, ValidationReport};
use crate::standings::TeamStanding;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Supported bracket shapes. Double elimination is recognized on the wire
/// and has game-count math, but tree construction for it is an
/// unimplemented extension point.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BracketType {
    SingleElimination,
    DoubleElimination,
}

impl fmt::Display for BracketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BracketType::SingleElimination => f.write_str("single_elimination"),
            BracketType::DoubleElimination => f.write_str("double_elimination"),
        }
    }
}

/// One position in the seeding array. `team == None` is a BYE filler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeedSlot {
    pub seed: u32,
    pub team: Option<String>,
}

impl SeedSlot {
    pub fn is_bye(&self) -> bool {
        self.team.is_none()
    }
}

/// One match in the bracket tree.
///
/// Team slots are `None` while unresolved (waiting on an upstream winner)
/// or, in a bye match, for the side that does not exist. The winner of
/// game N advances into `next_game_number` — home slot if empty, else
/// away.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BracketMatch {
    /// Tournament-wide, 1-based, contiguous.
    pub game_number: u32,
    /// 1-based round.
    pub round: u32,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub home_seed: Option<u32>,
    pub away_seed: Option<u32>,
    pub winner: Option<String>,
    pub is_bye: bool,
    /// `None` only for the final.
    pub next_game_number: Option<u32>,
}

/// A generated elimination bracket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TournamentBracket {
    pub tournament_id: String,
    pub bracket_type: BracketType,
    pub total_rounds: u32,
    /// Games actually played — bye matches excluded.
    pub total_games: u32,
    pub seeding: Vec<SeedSlot>,
    pub matches: Vec<BracketMatch>,
}

/// Smallest power of two ≥ `n` (and ≥ 1).
///
/// # Examples
///
/// ```
/// assert_eq!(cupball::next_power_of_two(6), 8);
/// assert_eq!(cupball::next_power_of_two(8), 8);
/// assert_eq!(cupball::next_power_of_two(0), 1);
/// ```
pub fn next_power_of_two(n: usize) -> usize {
    n.max(1).next_power_of_two()
}

/// BYE slots needed to fill `n` teams up to a full bracket.
///
/// # Examples
///
/// ```
/// assert_eq!(cupball::calculate_byes_needed(6), 2);
/// assert_eq!(cupball::calculate_byes_needed(8), 0);
/// ```
pub fn calculate_byes_needed(n: usize) -> usize {
    next_power_of_two(n) - n
}

/// Rounds in a single-elimination bracket of `n` teams.
pub fn calculate_bracket_rounds(n: usize) -> u32 {
    next_power_of_two(n).trailing_zeros()
}

/// Matches in the bracket tree, bye matches included.
///
/// Single elimination fills the tree: `next_power_of_two(n) − 1`. Double
/// elimination is winners + losers bracket minus the grand-final
/// adjustment: `2·next_power_of_two(n) − 3` for n ≥ 2. Only the count is
/// defined for double elimination — see [`generate_tournament_bracket`].
pub fn calculate_bracket_games(n: usize, bracket_type: BracketType) -> usize {
    let size = next_power_of_two(n);
    match bracket_type {
        BracketType::SingleElimination => size - 1,
        BracketType::DoubleElimination => 2 * size - 3,
    }
}

/// Bracket-order seed positions for a bracket of `size` slots:
/// `[1, size]` folded recursively so that seed 1 and seed 2 can only meet
/// in the final.
fn seed_positions(size: u32) -> Vec<u32> {
    let mut seeds = vec![1u32];
    while (seeds.len() as u32) < size {
        let n = seeds.len() as u32;
        let mut next = Vec::with_capacity(seeds.len() * 2);
        for seed in seeds.iter().copied() {
            next.push(seed);
            next.push(n * 2 + 1 - seed);
        }
        seeds = next;
    }
    seeds
}

/// Build the seeding array for `standings`: bracket slots in play order,
/// BYEs filling the tail seeds.
pub fn generate_bracket_seeding(standings: &[TeamStanding]) -> Vec<SeedSlot> {
    let mut ranked: Vec<&TeamStanding> = standings.iter().collect();
    ranked.sort_by(|a, b| a.seed.cmp(&b.seed).then_with(|| a.team_name.cmp(&b.team_name)));

    let size = next_power_of_two(ranked.len().max(2));
    seed_positions(size as u32)
        .into_iter()
        .map(|seed| SeedSlot {
            seed,
            team: ranked
                .get(seed as usize - 1)
                .map(|standing| standing.team_id.clone()),
        })
        .collect()
}

/// Team ids receiving a first-round bye: the top `calculate_byes_needed`
/// seeds, best seed first.
pub fn assign_byes_to_top_seeded_teams(standings: &[TeamStanding]) -> Vec<String> {
    let byes = calculate_byes_needed(standings.len().max(2));
    let mut ranked: Vec<&TeamStanding> = standings.iter().collect();
    ranked.sort_by(|a, b| a.seed.cmp(&b.seed).then_with(|| a.team_name.cmp(&b.team_name)));
    ranked
        .into_iter()
        .take(byes)
        .map(|standing| standing.team_id.clone())
        .collect()
}

/// Generate a bracket for the given standings.
///
/// Single elimination builds the full tree: round-1 pairs from the
/// seeding, empty downstream matches wired by `next_game_number`, and bye
/// winners auto-advanced. Double elimination returns
/// [`BracketError::Unsupported`].
pub fn generate_tournament_bracket(
    tournament_id: &str,
    standings: &[TeamStanding],
    bracket_type: BracketType,
) -> Result<TournamentBracket, BracketError> {
    if standings.len() < 2 {
        return Err(BracketError::TooFewTeams(standings.len()));
    }
    if bracket_type == BracketType::DoubleElimination {
        return Err(BracketError::Unsupported(bracket_type.to_string()));
    }

    let seeding = generate_bracket_seeding(standings);
    let size = seeding.len();
    let total_rounds = calculate_bracket_rounds(standings.len());

    let mut matches = Vec::with_capacity(size - 1);
    let mut game_number = 0u32;

    // Round 1 from the seeding pairs.
    for pair in seeding.chunks(2) {
        game_number += 1;
        let (home, away) = (&pair[0], &pair[1]);
        let is_bye = home.is_bye() || away.is_bye();
        matches.push(BracketMatch {
            game_number,
            round: 1,
            home_team: home.team.clone(),
            away_team: away.team.clone(),
            home_seed: Some(home.seed),
            away_seed: Some(away.seed),
            winner: if is_bye {
                home.team.clone().or_else(|| away.team.clone())
            } else {
                None
            },
            is_bye,
            next_game_number: None,
        });
    }

    // Empty later rounds.
    let mut round_games = size / 2;
    for round in 2..=total_rounds {
        round_games /= 2;
        for _ in 0..round_games {
            game_number += 1;
            matches.push(BracketMatch {
                game_number,
                round,
                home_team: None,
                away_team: None,
                home_seed: None,
                away_seed: None,
                winner: None,
                is_bye: false,
                next_game_number: None,
            });
        }
    }

    // Wire each round into the next: match j of a round feeds match j/2 of
    // the following round.
    let mut round_start = 0usize;
    let mut games_in_round = size / 2;
    while games_in_round > 1 {
        let next_start = round_start + games_in_round;
        for j in 0..games_in_round {
            matches[round_start + j].next_game_number =
                Some(matches[next_start + j / 2].game_number);
        }
        round_start = next_start;
        games_in_round /= 2;
    }

    // Auto-advance the bye winners.
    for i in 0..matches.len() {
        if matches[i].is_bye {
            if let (Some(winner), Some(seed)) = bye_winner(&matches[i]) {
                advance(&mut matches, i, &winner, Some(seed));
            }
        }
    }

    let total_games = matches.iter().filter(|m| !m.is_bye).count() as u32;

    Ok(TournamentBracket {
        tournament_id: tournament_id.to_string(),
        bracket_type,
        total_rounds,
        total_games,
        seeding,
        matches,
    })
}

fn bye_winner(m: &BracketMatch) -> (Option<String>, Option<u32>) {
    match (&m.home_team, &m.away_team) {
        (Some(team), None) => (Some(team.clone()), m.home_seed),
        (None, Some(team)) => (Some(team.clone()), m.away_seed),
        _ => (None, None),
    }
}

/// Fill the downstream slot for the winner of `matches[from]`: home if
/// empty, else away.
fn advance(matches: &mut [BracketMatch], from: usize, winner: &str, seed: Option<u32>) {
    let Some(next_number) = matches[from].next_game_number else {
        return;
    };
    let Some(target) = matches.iter_mut().find(|m| m.game_number == next_number) else {
        return;
    };
    if target.home_team.is_none() {
        target.home_team = Some(winner.to_string());
        target.home_seed = seed;
    } else {
        target.away_team = Some(winner.to_string());
        target.away_seed = seed;
    }
}

/// Record the winner of a decided match and propagate them forward.
pub fn record_match_result(
    bracket: &mut TournamentBracket,
    game_number: u32,
    winner: &str,
) -> Result<(), BracketError> {
    let index = bracket
        .matches
        .iter()
        .position(|m| m.game_number == game_number)
        .ok_or(BracketError::MatchNotFound(game_number))?;

    let m = &bracket.matches[index];
    let plays = m.home_team.as_deref() == Some(winner) || m.away_team.as_deref() == Some(winner);
    if !plays {
        return Err(BracketError::TeamNotInMatch {
            game_number,
            team: winner.to_string(),
        });
    }

    let seed = if m.home_team.as_deref() == Some(winner) {
        m.home_seed
    } else {
        m.away_seed
    };
    bracket.matches[index].winner = Some(winner.to_string());
    advance(&mut bracket.matches, index, winner, seed);
    Ok(())
}

/// Validate a seeding array against the standings that produced it.
pub fn validate_bracket_seeding(
    seeding: &[SeedSlot],
    standings: &[TeamStanding],
) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if !seeding.len().is_power_of_two() || seeding.is_empty() {
        errors.push(format!(
            "seeding length {} is not a power of two",
            seeding.len()
        ));
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for slot in seeding {
        if let Some(team) = &slot.team {
            if !seen.insert(team.as_str()) {
                errors.push(format!("team {team} appears more than once in the seeding"));
            }
            if !standings.iter().any(|s| s.team_id == *team) {
                errors.push(format!("team {team} is not in the standings"));
            }
        }
    }
    for standing in standings {
        if !seen.contains(standing.team_id.as_str()) {
            errors.push(format!("team {} is missing from the seeding", standing.team_id));
        }
    }

    let byes = seeding.iter().filter(|s| s.is_bye()).count();
    let expected_byes = seeding.len().saturating_sub(standings.len());
    if byes != expected_byes {
        errors.push(format!("{byes} BYE slots, expected {expected_byes}"));
    }

    if standings.iter().any(|s| s.seed == 0) {
        warnings.push("standings contain unseeded teams (seed 0)".to_string());
    }

    ValidationReport::from_findings(errors, warnings)
}

/// Validate the structural invariants of a generated or persisted bracket.
pub fn validate_bracket_structure(bracket: &TournamentBracket) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if bracket.tournament_id.is_empty() {
        errors.push("tournament id is empty".to_string());
    }
    if bracket.matches.is_empty() {
        errors.push("bracket contains no matches".to_string());
    }

    for (i, m) in bracket.matches.iter().enumerate() {
        if m.game_number != (i + 1) as u32 {
            errors.push(format!(
                "game numbers are not contiguous: position {} holds game {}",
                i + 1,
                m.game_number
            ));
        }
    }

    let known: HashSet<&str> = bracket
        .seeding
        .iter()
        .filter_map(|s| s.team.as_deref())
        .collect();

    let mut finals = 0;
    for m in &bracket.matches {
        for team in [&m.home_team, &m.away_team].into_iter().flatten() {
            if !known.contains(team.as_str()) {
                errors.push(format!(
                    "game {}: team {team} does not appear in the seeding",
                    m.game_number
                ));
            }
        }

        match m.next_game_number {
            None => finals += 1,
            Some(next) => {
                match bracket.matches.iter().find(|t| t.game_number == next) {
                    None => errors.push(format!(
                        "game {}: next game {next} does not exist",
                        m.game_number
                    )),
                    Some(target) if target.round <= m.round => errors.push(format!(
                        "game {}: next game {next} is not in a later round",
                        m.game_number
                    )),
                    Some(_) => {}
                }
            }
        }

        if m.is_bye {
            if m.winner.is_none() {
                errors.push(format!("bye game {} has no winner", m.game_number));
            }
            if m.round != 1 {
                warnings.push(format!("bye game {} outside round 1", m.game_number));
            }
        }
    }

    if !bracket.matches.is_empty() && finals != 1 {
        errors.push(format!("expected exactly one final, found {finals}"));
    }

    let expected_rounds = bracket
        .matches
        .iter()
        .map(|m| m.round)
        .max()
        .unwrap_or(0);
    if bracket.total_rounds != expected_rounds {
        warnings.push(format!(
            "total_rounds is {}, matches reach round {expected_rounds}",
            bracket.total_rounds
        ));
    }

    ValidationReport::from_findings(errors, warnings)
}
