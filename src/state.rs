use serde::{Deserialize, Serialize};

/// Lifecycle status of a game.
///
/// `Paused` is never produced by the engine itself — it exists on the wire
/// for shells that suspend games between events.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    #[default]
    NotStarted,
    InProgress,
    Paused,
    Completed,
}

/// Which half of the inning is being played. The away team bats in the top,
/// the home team in the bottom.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Half {
    #[default]
    Top,
    Bottom,
}

/// The three bases as nullable player-id slots.
///
/// Runners are tracked by position only. The same player id may appear both
/// on a base and at the plate; the engine never compares runner identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Bases {
    pub first: Option<String>,
    pub second: Option<String>,
    pub third: Option<String>,
}

impl Bases {
    pub fn is_empty(&self) -> bool {
        self.first.is_none() && self.second.is_none() && self.third.is_none()
    }

    pub fn clear(&mut self) {
        self.first = None;
        self.second = None;
        self.third = None;
    }

    /// Occupy base 1..=3. Positions outside that range are ignored.
    pub(crate) fn set(&mut self, base: u8, runner: String) {
        match base {
            1 => self.first = Some(runner),
            2 => self.second = Some(runner),
            3 => self.third = Some(runner),
            _ => {}
        }
    }
}

/// The authoritative current state of one game, derived by folding the
/// event log. Owned exclusively by the engine/projector pipeline — nothing
/// else mutates it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GameSnapshot {
    pub game_id: String,
    pub status: GameStatus,

    /// Current inning, 1-based.
    pub inning: u32,
    pub half: Half,

    /// Outs in the current half-inning. 0..=2 between transitions; reaching
    /// 3 rolls the half-inning over inside the same transition.
    pub outs: u8,
    pub balls: u8,
    pub strikes: u8,

    pub home_team: String,
    pub away_team: String,
    pub home_score: u32,
    pub away_score: u32,

    /// Player currently at the plate (batting side's lineup position).
    pub batter: Option<String>,
    /// Player currently catching (fielding side's lineup position).
    pub catcher: Option<String>,
    pub bases: Bases,

    pub home_lineup: Vec<String>,
    pub away_lineup: Vec<String>,
    /// Index into each lineup; wraps modulo lineup length and persists
    /// across innings.
    pub home_lineup_index: usize,
    pub away_lineup_index: usize,

    /// Scheduled innings, from the game-start payload.
    pub innings: u32,
    pub umpire: String,
    pub updated_at: u64,
}

impl GameSnapshot {
    /// The empty, not-started snapshot a projection begins from.
    pub fn empty(game_id: impl Into<String>) -> Self {
        GameSnapshot {
            game_id: game_id.into(),
            ..GameSnapshot::default()
        }
    }

    /// Team id of the side currently at bat.
    pub fn batting_team(&self) -> &str {
        match self.half {
            Half::Top => &self.away_team,
            Half::Bottom => &self.home_team,
        }
    }

    /// Team id of the side currently fielding.
    pub fn fielding_team(&self) -> &str {
        match self.half {
            Half::Top => &self.home_team,
            Half::Bottom => &self.away_team,
        }
    }

    pub(crate) fn reset_count(&mut self) {
        self.balls = 0;
        self.strikes = 0;
    }

    /// Move the batting side's lineup pointer to the next player.
    pub(crate) fn advance_batting_index(&mut self) {
        match self.half {
            Half::Top => {
                if !self.away_lineup.is_empty() {
                    self.away_lineup_index =
                        (self.away_lineup_index + 1) % self.away_lineup.len();
                }
            }
            Half::Bottom => {
                if !self.home_lineup.is_empty() {
                    self.home_lineup_index =
                        (self.home_lineup_index + 1) % self.home_lineup.len();
                }
            }
        }
    }

    /// Re-derive batter and catcher from the current half and lineup
    /// pointers.
    pub(crate) fn refresh_roles(&mut self) {
        let (bat, bat_idx, field, field_idx) = match self.half {
            Half::Top => (
                &self.away_lineup,
                self.away_lineup_index,
                &self.home_lineup,
                self.home_lineup_index,
            ),
            Half::Bottom => (
                &self.home_lineup,
                self.home_lineup_index,
                &self.away_lineup,
                self.away_lineup_index,
            ),
        };
        self.batter = bat.get(bat_idx).cloned();
        self.catcher = field.get(field_idx).cloned();
    }

    /// Close out the current half-inning: outs and count reset, bases
    /// clear, sides swap. Leaving the bottom advances the inning number.
    /// Lineup pointers are untouched.
    pub(crate) fn end_half(&mut self) {
        self.outs = 0;
        self.reset_count();
        self.bases.clear();
        match self.half {
            Half::Top => self.half = Half::Bottom,
            Half::Bottom => {
                self.half = Half::Top;
                self.inning += 1;
            }
        }
    }

    /// Credit runs to the side currently at bat.
    pub(crate) fn add_runs(&mut self, runs: u32) {
        match self.half {
            Half::Top => self.away_score += runs,
            Half::Bottom => self.home_score += runs,
        }
    }
}

/// Observable consequences of a transition, handed to the storage/transport
/// shell alongside the new snapshot.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SideEffect {
    /// A cup-hit pitch was recorded; a `flip_cup` event must follow before
    /// further gameplay.
    FlipCupPending,

    /// Runs were credited this event.
    ScoreChange { team: String, runs: u32 },

    /// The named half-inning just ended (third out or umpire override).
    HalfInningEnd { inning: u32, half: Half },

    /// The game reached `completed`.
    GameEnded,

    /// An `undo` or `edit` was accepted — the shell must rebuild the
    /// snapshot from the effective log.
    RebuildRequired { target_event_id: String },
}
