//! Round-robin standings with a fixed tiebreak cascade.
//!
//! Standings are computed fresh from completed games — they are a derived
//! view, not a source of truth. The sort order is, in cascade: wins, run
//! differential, runs scored, head-to-head record among the exactly-tied
//! subset, and finally alphabetical team name, which makes the order fully
//! deterministic.

use crate::state::GameStatus;
use log::debug;
use serde::{Deserialize, Serialize};

/// A tournament team.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Team {
    pub id: String,
    pub name: String,
}

/// A finished (or in-flight) game's result, as read back from the shell's
/// store. Only `Completed` games count toward standings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameResult {
    pub game_id: String,
    pub home_team: String,
    pub away_team: String,
    pub home_score: u32,
    pub away_score: u32,
    pub status: GameStatus,
}

impl GameResult {
    fn winner(&self) -> Option<&str> {
        if self.home_score > self.away_score {
            Some(&self.home_team)
        } else if self.away_score > self.home_score {
            Some(&self.away_team)
        } else {
            None
        }
    }

    fn involves(&self, team_id: &str) -> bool {
        self.home_team == team_id || self.away_team == team_id
    }
}

/// One team's standings row. `seed` is the 1-based rank after sorting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamStanding {
    pub team_id: String,
    pub team_name: String,
    pub wins: u32,
    pub losses: u32,
    pub runs_scored: u32,
    pub runs_allowed: u32,
    pub run_differential: i64,
    pub games_played: u32,
    pub seed: u32,
}

impl TeamStanding {
    fn zero(team: &Team) -> Self {
        TeamStanding {
            team_id: team.id.clone(),
            team_name: team.name.clone(),
            wins: 0,
            losses: 0,
            runs_scored: 0,
            runs_allowed: 0,
            run_differential: 0,
            games_played: 0,
            seed: 0,
        }
    }

    fn absorb(&mut self, scored: u32, allowed: u32, won: Option<bool>) {
        self.games_played += 1;
        self.runs_scored += scored;
        self.runs_allowed += allowed;
        match won {
            Some(true) => self.wins += 1,
            Some(false) => self.losses += 1,
            None => {}
        }
        self.run_differential = i64::from(self.runs_scored) - i64::from(self.runs_allowed);
    }

    /// The cascade key before head-to-head: wins, run differential, runs
    /// scored, all descending.
    fn cascade_key(&self) -> (u32, i64, u32) {
        (self.wins, self.run_differential, self.runs_scored)
    }
}

/// Compute standings for `teams` from completed games, sorted and seeded.
///
/// Teams with no completed games appear with all-zero stats, ordered
/// alphabetically among themselves. Games involving teams outside the
/// roster are ignored.
pub fn calculate_team_standings(games: &[GameResult], teams: &[Team]) -> Vec<TeamStanding> {
    let mut rows: Vec<TeamStanding> = teams.iter().map(TeamStanding::zero).collect();

    for game in games.iter().filter(|g| g.status == GameStatus::Completed) {
        let winner = game.winner().map(str::to_string);
        for row in rows.iter_mut() {
            if row.team_id == game.home_team {
                row.absorb(
                    game.home_score,
                    game.away_score,
                    winner.as_deref().map(|w| w == game.home_team),
                );
            } else if row.team_id == game.away_team {
                row.absorb(
                    game.away_score,
                    game.home_score,
                    winner.as_deref().map(|w| w == game.away_team),
                );
            }
        }
    }

    sort_and_seed(&mut rows, games);
    rows
}

/// Additively merge newly completed games into existing standings.
///
/// Counters are incremented in place (no recompute from full history);
/// rows are then re-sorted and re-seeded. Head-to-head ties are resolved
/// from the games supplied here, so merging the complete game set into
/// zeroed standings is exactly [`calculate_team_standings`]. Games naming
/// a team with no standings row are skipped.
pub fn update_standings_from_games(
    mut standings: Vec<TeamStanding>,
    new_games: &[GameResult],
) -> Vec<TeamStanding> {
    for game in new_games.iter().filter(|g| g.status == GameStatus::Completed) {
        let known = standings.iter().any(|r| r.team_id == game.home_team)
            && standings.iter().any(|r| r.team_id == game.away_team);
        if !known {
            debug!(
                "skipping game {}: team outside current standings",
                game.game_id
            );
            continue;
        }
        let winner = game.winner().map(str::to_string);
        for row in standings.iter_mut() {
            if row.team_id == game.home_team {
                row.absorb(
                    game.home_score,
                    game.away_score,
                    winner.as_deref().map(|w| w == game.home_team),
                );
            } else if row.team_id == game.away_team {
                row.absorb(
                    game.away_score,
                    game.home_score,
                    winner.as_deref().map(|w| w == game.away_team),
                );
            }
        }
    }

    sort_and_seed(&mut standings, new_games);
    standings
}

fn sort_and_seed(rows: &mut [TeamStanding], games: &[GameResult]) {
    // Primary cascade: wins, run differential, runs scored (desc), name as
    // a provisional final key.
    rows.sort_by(|a, b| {
        b.cascade_key()
            .cmp(&a.cascade_key())
            .then_with(|| a.team_name.cmp(&b.team_name))
    });

    // Head-to-head pass over each group still tied after the primary
    // cascade.
    let mut start = 0;
    while start < rows.len() {
        let mut end = start + 1;
        while end < rows.len() && rows[end].cascade_key() == rows[start].cascade_key() {
            end += 1;
        }
        if end - start > 1 {
            let subset: Vec<String> =
                rows[start..end].iter().map(|r| r.team_id.clone()).collect();
            let group = &mut rows[start..end];
            group.sort_by(|a, b| {
                head_to_head_wins(games, &subset, &b.team_id)
                    .cmp(&head_to_head_wins(games, &subset, &a.team_id))
                    .then_with(|| a.team_name.cmp(&b.team_name))
            });
        }
        start = end;
    }

    for (i, row) in rows.iter_mut().enumerate() {
        row.seed = (i + 1) as u32;
    }
}

/// Wins by `team_id` in completed games where both opponents belong to the
/// tied subset.
fn head_to_head_wins(games: &[GameResult], subset: &[String], team_id: &str) -> u32 {
    games
        .iter()
        .filter(|g| {
            g.status == GameStatus::Completed
                && subset.iter().any(|t| t == &g.home_team)
                && subset.iter().any(|t| t == &g.away_team)
        })
        .filter(|g| g.winner() == Some(team_id))
        .count() as u32
}

/// How a tie between two or more teams was broken — for display, not
/// correctness. Reproducible from the same games and roster.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TiebreakExplanation {
    /// Names of the teams involved, in final standings order.
    pub teams: Vec<String>,
    pub reason: String,
    pub resolution: String,
}

/// Report every tie encountered while sorting and the cascade level that
/// resolved it.
pub fn explain_tiebreaks(games: &[GameResult], teams: &[Team]) -> Vec<TiebreakExplanation> {
    let standings = calculate_team_standings(games, teams);
    let mut explanations = Vec::new();

    let mut start = 0;
    while start < standings.len() {
        let mut end = start + 1;
        while end < standings.len() && standings[end].wins == standings[start].wins {
            end += 1;
        }
        if end - start > 1 {
            let group = &standings[start..end];
            explanations.push(explain_group(games, group));
        }
        start = end;
    }

    explanations
}

fn explain_group(games: &[GameResult], group: &[TeamStanding]) -> TiebreakExplanation {
    let names: Vec<String> = group.iter().map(|r| r.team_name.clone()).collect();
    let reason = format!("{} tied on wins ({})", names.join(", "), group[0].wins);

    let distinct = |values: Vec<i64>| {
        let mut sorted = values.clone();
        sorted.sort_unstable();
        sorted.dedup();
        sorted.len() == values.len()
    };

    let resolution = if distinct(group.iter().map(|r| r.run_differential).collect()) {
        "resolved by run differential".to_string()
    } else if distinct(group.iter().map(|r| i64::from(r.runs_scored)).collect()) {
        "resolved by run differential, then runs scored".to_string()
    } else {
        let subset: Vec<String> = group.iter().map(|r| r.team_id.clone()).collect();
        let h2h: Vec<u32> = group
            .iter()
            .map(|r| head_to_head_wins(games, &subset, &r.team_id))
            .collect();
        if distinct(h2h.iter().map(|&w| i64::from(w)).collect()) {
            "resolved by head-to-head record".to_string()
        } else {
            "resolved alphabetically".to_string()
        }
    };

    TiebreakExplanation {
        teams: names,
        reason,
        resolution,
    }
}
