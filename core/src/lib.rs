#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Tool-Assisted Shooting judge.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. The engine submits [`Command`]
//! values describing the ordered steps of a turn, the world executes those
//! commands via its `apply` entry point, and then reports [`Event`] values
//! that systems and harnesses observe deterministically. The spawn schedule
//! and action stream text formats shared with contestants also live here.

mod format;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of lanes laid out across the contest field.
pub const DEFAULT_WIDTH: u32 = 25;

/// Number of rows between the player's row and the spawn row, inclusive.
pub const DEFAULT_HEIGHT: u32 = 60;

/// Number of turns a contest game lasts at most.
pub const DEFAULT_MAX_TURN: u32 = 1000;

/// Power the player must accumulate to gain a single level.
pub const DEFAULT_LEVEL_STEP: u64 = 100;

/// Row the player occupies for the whole game.
pub const PLAYER_ROW: u32 = 0;

/// Dimensions and pacing that every format, generator, and engine shares.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Rules {
    /// Number of lanes; the player wraps around horizontally.
    pub width: u32,
    /// Number of rows; enemies spawn in the topmost row `height - 1`.
    pub height: u32,
    /// Turn horizon after which the game completes.
    pub max_turn: u32,
    /// Power required per level; `level = 1 + power / level_step`.
    pub level_step: u64,
    /// Lane the player starts in.
    pub start_lane: u32,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            max_turn: DEFAULT_MAX_TURN,
            level_step: DEFAULT_LEVEL_STEP,
            start_lane: DEFAULT_WIDTH / 2,
        }
    }
}

impl Rules {
    /// Checks that the rules describe a playable field.
    pub fn validate(&self) -> Result<(), RulesError> {
        if self.width == 0 {
            return Err(RulesError::ZeroWidth);
        }
        if self.height < 2 {
            return Err(RulesError::TooShort {
                height: self.height,
            });
        }
        if self.level_step == 0 {
            return Err(RulesError::ZeroLevelStep);
        }
        if self.start_lane >= self.width {
            return Err(RulesError::StartLaneOutOfBounds {
                lane: self.start_lane,
                width: self.width,
            });
        }
        Ok(())
    }

    /// Level reached after accumulating `power`.
    #[must_use]
    pub const fn level_for(&self, power: u64) -> u64 {
        1 + power / self.level_step
    }

    /// Row where freshly spawned enemies appear.
    #[must_use]
    pub const fn spawn_row(&self) -> u32 {
        self.height - 1
    }

    /// Lane reached by applying `action` from `lane`, wrapping at the edges.
    #[must_use]
    pub fn shift_lane(&self, lane: u32, action: Action) -> u32 {
        let width = i64::from(self.width);
        let shifted = i64::from(lane) + action.lane_offset();
        let wrapped = ((shifted % width) + width) % width;
        u32::try_from(wrapped).unwrap_or(0)
    }

    /// Total number of cells on the field.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        let cells = u64::from(self.width) * u64::from(self.height);
        usize::try_from(cells).unwrap_or(0)
    }
}

/// Reasons a rule set cannot host a game.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RulesError {
    /// The field has no lanes.
    #[error("field width must be at least one lane")]
    ZeroWidth,
    /// The field needs a player row and at least one row above it.
    #[error("field height {height} leaves no room above the player row")]
    TooShort {
        /// Configured height.
        height: u32,
    },
    /// Level computation would divide by zero.
    #[error("level step must be positive")]
    ZeroLevelStep,
    /// The player would start outside the field.
    #[error("start lane {lane} is outside a field of width {width}")]
    StartLaneOutOfBounds {
        /// Configured start lane.
        lane: u32,
        /// Configured width.
        width: u32,
    },
}

/// Location of a single grid cell expressed as lane and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    lane: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(lane: u32, row: u32) -> Self {
        Self { lane, row }
    }

    /// Zero-based lane index of the cell.
    #[must_use]
    pub const fn lane(&self) -> u32 {
        self.lane
    }

    /// Zero-based row index of the cell; row zero is the player's row.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }
}

/// A single scheduled enemy appearance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpawnRecord {
    /// Initial hit points; also the score awarded for destroying the enemy.
    pub hp: u32,
    /// Power transferred to the player when the enemy is destroyed.
    pub power: u32,
    /// Lane the enemy appears in.
    pub lane: u32,
}

impl SpawnRecord {
    /// Creates a new spawn record.
    #[must_use]
    pub const fn new(hp: u32, power: u32, lane: u32) -> Self {
        Self { hp, power, lane }
    }
}

/// Complete, immutable spawn plan for one test case.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpawnSchedule {
    percentages: Vec<u32>,
    turns: Vec<Vec<SpawnRecord>>,
}

impl SpawnSchedule {
    /// Creates a schedule from per-lane spawn percentages and per-turn spawns.
    ///
    /// `turns[0]` holds the spawns of turn 1.
    #[must_use]
    pub fn new(percentages: Vec<u32>, turns: Vec<Vec<SpawnRecord>>) -> Self {
        Self { percentages, turns }
    }

    /// Creates a schedule without any spawns.
    #[must_use]
    pub fn empty(rules: &Rules) -> Self {
        let width = usize::try_from(rules.width).unwrap_or(0);
        let turns = usize::try_from(rules.max_turn).unwrap_or(0);
        Self {
            percentages: vec![0; width],
            turns: vec![Vec::new(); turns],
        }
    }

    /// Per-lane spawn percentages the schedule was drawn with.
    #[must_use]
    pub fn percentages(&self) -> &[u32] {
        &self.percentages
    }

    /// Spawns scheduled for the 1-based `turn`; empty outside the horizon.
    #[must_use]
    pub fn turn(&self, turn: u32) -> &[SpawnRecord] {
        let Some(index) = turn.checked_sub(1) else {
            return &[];
        };
        usize::try_from(index)
            .ok()
            .and_then(|index| self.turns.get(index))
            .map_or(&[], Vec::as_slice)
    }

    /// Number of turns covered by the schedule.
    #[must_use]
    pub fn turn_count(&self) -> u32 {
        u32::try_from(self.turns.len()).unwrap_or(u32::MAX)
    }

    /// Iterator over `(turn, spawns)` pairs in turn order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &[SpawnRecord])> {
        self.turns
            .iter()
            .zip(1..)
            .map(|(spawns, turn)| (turn, spawns.as_slice()))
    }

    /// Total number of enemies across every turn.
    #[must_use]
    pub fn total_spawns(&self) -> usize {
        self.turns.iter().map(Vec::len).sum()
    }
}

/// Reasons a spawn schedule text cannot be decoded.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    /// The input ended before the expected value.
    #[error("input ended while reading {expected} (turn {turn})")]
    UnexpectedEnd {
        /// Description of the missing value.
        expected: &'static str,
        /// Turn being read; zero for the percentage header.
        turn: u32,
    },
    /// A token could not be read as the expected integer.
    #[error("expected {expected} but found `{token}` (turn {turn})")]
    InvalidNumber {
        /// Offending token.
        token: String,
        /// Description of the expected value.
        expected: &'static str,
        /// Turn being read; zero for the percentage header.
        turn: u32,
    },
    /// A spawn names a lane outside the field.
    #[error("turn {turn} spawns in lane {lane} outside a field of width {width}")]
    LaneOutOfRange {
        /// Turn of the spawn.
        turn: u32,
        /// Offending lane.
        lane: i64,
        /// Field width.
        width: u32,
    },
    /// Two spawns of the same turn share a lane.
    #[error("turn {turn} spawns twice in lane {lane}")]
    DuplicateLane {
        /// Turn of the spawns.
        turn: u32,
        /// Shared lane.
        lane: u32,
    },
    /// A spawn would enter the field already destroyed.
    #[error("turn {turn} spawns an enemy with {hp} hit points in lane {lane}")]
    NonPositiveHp {
        /// Turn of the spawn.
        turn: u32,
        /// Lane of the spawn.
        lane: i64,
        /// Offending hit points.
        hp: i64,
    },
    /// A spawn carries negative power.
    #[error("turn {turn} spawns an enemy with power {power} in lane {lane}")]
    NegativePower {
        /// Turn of the spawn.
        turn: u32,
        /// Lane of the spawn.
        lane: i64,
        /// Offending power.
        power: i64,
    },
    /// Tokens remain after the last turn.
    #[error("unexpected trailing token `{token}` after turn {turn}")]
    TrailingData {
        /// First unread token.
        token: String,
        /// Last turn read.
        turn: u32,
    },
}

/// Movement decision taken by the player for a single turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Move one lane toward lane zero.
    Left,
    /// Move one lane away from lane zero.
    Right,
    /// Keep the current lane.
    Stay,
}

impl Action {
    /// Decodes the single-character symbol used in contestant output.
    #[must_use]
    pub const fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            'L' => Some(Self::Left),
            'R' => Some(Self::Right),
            'S' => Some(Self::Stay),
            _ => None,
        }
    }

    /// Symbol written for the action in contestant output.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Left => 'L',
            Self::Right => 'R',
            Self::Stay => 'S',
        }
    }

    /// Signed lane delta applied before wrapping.
    #[must_use]
    pub const fn lane_offset(self) -> i64 {
        match self {
            Self::Left => -1,
            Self::Right => 1,
            Self::Stay => 0,
        }
    }
}

/// One consumed line of contestant output.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ActionToken {
    /// A recognised action.
    Move(Action),
    /// Anything else; ends the game with [`Verdict::InvalidAction`].
    Invalid(String),
}

/// Terminal classification of a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// The action stream or turn horizon ran out with the player alive.
    Completed,
    /// An enemy occupied the player's cell.
    Destroyed,
    /// The contestant submitted an unrecognised token.
    InvalidAction,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Completed => "completed",
            Self::Destroyed => "destroyed",
            Self::InvalidAction => "invalid action",
        };
        f.write_str(label)
    }
}

/// Final result of a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameOutcome {
    /// Accumulated score.
    pub score: u64,
    /// Turn the game ended in, or the number of resolved turns on completion.
    pub turn: u32,
    /// How the game ended.
    pub verdict: Verdict,
}

/// Game progression as tracked by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameStatus {
    /// Turns are still being played.
    Running,
    /// The game ended with the provided outcome.
    Over(GameOutcome),
}

/// Way the player was destroyed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DestructionCause {
    /// An enemy descended onto the player.
    Descent,
    /// The player moved into an occupied cell.
    Collision,
}

/// Enemy occupying a cell of the field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Enemy {
    initial_hp: u32,
    hp: i64,
    power: u32,
    will_disappear: bool,
}

impl Enemy {
    /// Creates a fresh enemy from its spawn record.
    #[must_use]
    pub const fn from_record(record: SpawnRecord) -> Self {
        Self {
            initial_hp: record.hp,
            hp: record.hp as i64,
            power: record.power,
            will_disappear: false,
        }
    }

    /// Hit points the enemy spawned with.
    #[must_use]
    pub const fn initial_hp(&self) -> u32 {
        self.initial_hp
    }

    /// Remaining hit points; zero or below once destroyed.
    #[must_use]
    pub const fn hp(&self) -> i64 {
        self.hp
    }

    /// Power awarded to the player on destruction.
    #[must_use]
    pub const fn power(&self) -> u32 {
        self.power
    }

    /// Reports whether the enemy was destroyed and awaits removal.
    #[must_use]
    pub const fn will_disappear(&self) -> bool {
        self.will_disappear
    }

    /// Subtracts `damage` and reports whether this hit destroyed the enemy.
    pub fn take_hit(&mut self, damage: u64) -> bool {
        let damage = i64::try_from(damage).unwrap_or(i64::MAX);
        self.hp = self.hp.saturating_sub(damage);
        if self.hp <= 0 && !self.will_disappear {
            self.will_disappear = true;
            return true;
        }
        false
    }
}

/// Immutable representation of the player's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    /// Lane currently occupied.
    pub lane: u32,
    /// Accumulated score.
    pub score: u64,
    /// Accumulated power.
    pub power: u64,
    /// Current level; the damage dealt per shot.
    pub level: u64,
}

impl PlayerSnapshot {
    /// Cell the player occupies.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        CellCoord::new(self.lane, PLAYER_ROW)
    }
}

/// Read-only view into the enemy arena.
#[derive(Clone, Copy, Debug)]
pub struct OccupancyView<'a> {
    cells: &'a [Option<Enemy>],
    width: u32,
    height: u32,
}

impl<'a> OccupancyView<'a> {
    /// Captures a new occupancy view backed by the provided row-major cells.
    #[must_use]
    pub fn new(cells: &'a [Option<Enemy>], width: u32, height: u32) -> Self {
        Self {
            cells,
            width,
            height,
        }
    }

    /// Returns the enemy occupying the provided cell, if any.
    #[must_use]
    pub fn occupant(&self, cell: CellCoord) -> Option<&'a Enemy> {
        self.index(cell)
            .and_then(|index| self.cells.get(index))
            .and_then(Option::as_ref)
    }

    /// Reports whether an enemy occupies the cell.
    #[must_use]
    pub fn is_occupied(&self, cell: CellCoord) -> bool {
        self.occupant(cell).is_some()
    }

    /// Iterates over occupied cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, &'a Enemy)> + 'a {
        let width = self.width.max(1);
        self.cells
            .iter()
            .zip(0_u32..)
            .filter_map(move |(slot, index)| {
                slot.as_ref()
                    .map(|enemy| (CellCoord::new(index % width, index / width), enemy))
            })
    }

    /// Provides the `(width, height)` dimensions of the field.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.lane() < self.width && cell.row() < self.height {
            let row = usize::try_from(cell.row()).ok()?;
            let lane = usize::try_from(cell.lane()).ok()?;
            let width = usize::try_from(self.width).ok()?;
            Some(row * width + lane)
        } else {
            None
        }
    }
}

/// Commands that express all permissible world mutations.
///
/// A turn is the ordered sequence `BeginTurn`, `DescendEnemies`,
/// `SpawnEnemies`, `MovePlayer` (or `RejectAction`), an optional
/// `FireLaser`, and `EndTurn`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Advances the turn counter and removes enemies destroyed last turn.
    BeginTurn,
    /// Moves every enemy one row toward the player.
    DescendEnemies,
    /// Places the provided enemies in the spawn row.
    SpawnEnemies {
        /// Spawns scheduled for the current turn.
        spawns: Vec<SpawnRecord>,
    },
    /// Applies the player's action for the current turn.
    MovePlayer {
        /// Action to apply.
        action: Action,
    },
    /// Ends the game because the contestant's token was not an action.
    RejectAction {
        /// Offending token as read.
        token: String,
    },
    /// Shoots the enemy in the provided cell with the player's level.
    FireLaser {
        /// Cell of the enemy hit by the shot.
        target: CellCoord,
    },
    /// Marks every step of the current turn as resolved.
    EndTurn,
    /// Ends a running game as completed.
    Conclude,
}

/// Events reported by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A new turn began.
    TurnStarted {
        /// 1-based turn number.
        turn: u32,
    },
    /// An enemy destroyed on the previous turn left the field.
    EnemyCleared {
        /// Cell the enemy occupied.
        cell: CellCoord,
    },
    /// An enemy descended past the player's row.
    EnemyExited {
        /// Lane the enemy left from.
        lane: u32,
    },
    /// An enemy appeared in the spawn row.
    EnemySpawned {
        /// Cell of the new enemy.
        cell: CellCoord,
        /// Initial hit points.
        hp: u32,
        /// Power carried.
        power: u32,
    },
    /// The player applied an action.
    PlayerMoved {
        /// Lane before the action.
        from: u32,
        /// Lane after the action.
        to: u32,
    },
    /// The player's shot hit an enemy.
    EnemyDamaged {
        /// Cell of the enemy.
        cell: CellCoord,
        /// Damage dealt.
        damage: u64,
        /// Hit points left after the shot.
        remaining_hp: i64,
    },
    /// The player's shot destroyed an enemy.
    EnemyDestroyed {
        /// Cell of the enemy.
        cell: CellCoord,
        /// Score awarded.
        score: u64,
        /// Power awarded.
        power: u64,
    },
    /// The player's level increased.
    LevelUp {
        /// New level.
        level: u64,
    },
    /// An enemy occupied the player's cell.
    PlayerDestroyed {
        /// Cell of the collision.
        cell: CellCoord,
        /// How the collision happened.
        cause: DestructionCause,
    },
    /// The contestant submitted an unrecognised token.
    ActionRejected {
        /// Offending token.
        token: String,
    },
    /// Every step of the current turn completed.
    TurnResolved {
        /// 1-based turn number.
        turn: u32,
    },
    /// The game reached a terminal state.
    GameOver {
        /// Final result.
        outcome: GameOutcome,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rules_match_contest_constants() {
        let rules = Rules::default();
        assert_eq!(rules.width, 25);
        assert_eq!(rules.height, 60);
        assert_eq!(rules.max_turn, 1000);
        assert_eq!(rules.level_step, 100);
        assert_eq!(rules.start_lane, 12);
        assert_eq!(rules.spawn_row(), 59);
        assert_eq!(rules.validate(), Ok(()));
    }

    #[test]
    fn level_uses_floor_division() {
        let rules = Rules::default();
        assert_eq!(rules.level_for(0), 1);
        assert_eq!(rules.level_for(99), 1);
        assert_eq!(rules.level_for(100), 2);
        assert_eq!(rules.level_for(250), 3);
    }

    #[test]
    fn lane_shift_wraps_both_edges() {
        let rules = Rules::default();
        assert_eq!(rules.shift_lane(0, Action::Left), 24);
        assert_eq!(rules.shift_lane(24, Action::Right), 0);
        assert_eq!(rules.shift_lane(12, Action::Stay), 12);
        assert_eq!(rules.shift_lane(12, Action::Left), 11);
    }

    #[test]
    fn validate_rejects_start_lane_outside_field() {
        let rules = Rules {
            width: 10,
            ..Rules::default()
        };
        assert_eq!(
            rules.validate(),
            Err(RulesError::StartLaneOutOfBounds {
                lane: 12,
                width: 10
            })
        );
    }

    #[test]
    fn schedule_turn_lookup_is_one_based() {
        let schedule = SpawnSchedule::new(
            vec![1, 2],
            vec![vec![SpawnRecord::new(3, 2, 1)], Vec::new()],
        );
        assert!(schedule.turn(0).is_empty());
        assert_eq!(schedule.turn(1), &[SpawnRecord::new(3, 2, 1)]);
        assert!(schedule.turn(2).is_empty());
        assert!(schedule.turn(3).is_empty());
        assert_eq!(schedule.turn_count(), 2);
        assert_eq!(schedule.total_spawns(), 1);
    }

    #[test]
    fn enemy_reports_destruction_once() {
        let mut enemy = Enemy::from_record(SpawnRecord::new(3, 2, 0));
        assert!(!enemy.take_hit(2));
        assert_eq!(enemy.hp(), 1);
        assert!(enemy.take_hit(2));
        assert!(enemy.will_disappear());
        assert!(!enemy.take_hit(2));
        assert_eq!(enemy.initial_hp(), 3);
    }

    #[test]
    fn occupancy_view_iterates_row_major() {
        let enemy = Enemy::from_record(SpawnRecord::new(1, 0, 0));
        let cells = vec![None, Some(enemy), Some(enemy), None, None, None];
        let view = OccupancyView::new(&cells, 2, 3);
        let occupied: Vec<CellCoord> = view.iter().map(|(cell, _)| cell).collect();
        assert_eq!(occupied, vec![CellCoord::new(1, 0), CellCoord::new(0, 1)]);
        assert!(view.is_occupied(CellCoord::new(1, 0)));
        assert!(!view.is_occupied(CellCoord::new(5, 0)));
    }
}
