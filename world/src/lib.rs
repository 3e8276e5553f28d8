#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for the Tool-Assisted Shooting judge.
//!
//! The world owns the enemy arena and the player. It changes only through
//! [`apply`], which executes one [`Command`] and reports what happened as
//! [`Event`] values. Once the game reaches a terminal state every further
//! command is ignored, so a caller may keep feeding the remainder of a turn
//! without checking the status after each step.

use tas_core::{
    Action, CellCoord, Command, DestructionCause, Enemy, Event, GameOutcome, GameStatus, Rules,
    SpawnRecord, Verdict, PLAYER_ROW,
};

/// Represents the authoritative state of a single game.
#[derive(Debug)]
pub struct World {
    rules: Rules,
    arena: EnemyArena,
    player: Player,
    turn: u32,
    resolved_turns: u32,
    status: GameStatus,
}

impl World {
    /// Creates a world with an empty field and the player in the start lane.
    ///
    /// `rules` must pass [`Rules::validate`].
    #[must_use]
    pub fn new(rules: Rules) -> Self {
        Self {
            arena: EnemyArena::new(rules.width, rules.height),
            player: Player::new(rules.start_lane),
            turn: 0,
            resolved_turns: 0,
            status: GameStatus::Running,
            rules,
        }
    }

    fn finish(&mut self, turn: u32, verdict: Verdict, out_events: &mut Vec<Event>) {
        let outcome = GameOutcome {
            score: self.player.score,
            turn,
            verdict,
        };
        self.status = GameStatus::Over(outcome);
        out_events.push(Event::GameOver { outcome });
    }

    fn begin_turn(&mut self, out_events: &mut Vec<Event>) {
        self.turn = self.turn.saturating_add(1);
        out_events.push(Event::TurnStarted { turn: self.turn });
        self.arena.sweep_destroyed(out_events);
    }

    fn descend_enemies(&mut self, out_events: &mut Vec<Event>) {
        let player_cell = self.player.cell();
        if let Some(cell) = self.arena.descend(player_cell, out_events) {
            out_events.push(Event::PlayerDestroyed {
                cell,
                cause: DestructionCause::Descent,
            });
            self.finish(self.turn, Verdict::Destroyed, out_events);
        }
    }

    fn spawn_enemies(&mut self, spawns: &[SpawnRecord], out_events: &mut Vec<Event>) {
        let row = self.rules.spawn_row();
        for spawn in spawns {
            let cell = CellCoord::new(spawn.lane, row);
            if self.arena.place(cell, Enemy::from_record(*spawn)) {
                out_events.push(Event::EnemySpawned {
                    cell,
                    hp: spawn.hp,
                    power: spawn.power,
                });
            }
        }
    }

    fn move_player(&mut self, action: Action, out_events: &mut Vec<Event>) {
        let from = self.player.lane;
        let to = self.rules.shift_lane(from, action);
        self.player.lane = to;
        out_events.push(Event::PlayerMoved { from, to });

        let cell = self.player.cell();
        if self.arena.get(cell).is_some() {
            out_events.push(Event::PlayerDestroyed {
                cell,
                cause: DestructionCause::Collision,
            });
            self.finish(self.turn, Verdict::Destroyed, out_events);
        }
    }

    fn fire_laser(&mut self, target: CellCoord, out_events: &mut Vec<Event>) {
        if target.lane() != self.player.lane || target.row() == PLAYER_ROW {
            return;
        }

        let damage = self.player.level;
        let Some(enemy) = self.arena.get_mut(target) else {
            return;
        };
        let destroyed = enemy.take_hit(damage);
        let (remaining_hp, score, power) = (
            enemy.hp(),
            u64::from(enemy.initial_hp()),
            u64::from(enemy.power()),
        );
        out_events.push(Event::EnemyDamaged {
            cell: target,
            damage,
            remaining_hp,
        });

        if !destroyed {
            return;
        }

        self.player.score = self.player.score.saturating_add(score);
        self.player.power = self.player.power.saturating_add(power);
        out_events.push(Event::EnemyDestroyed {
            cell: target,
            score,
            power,
        });

        let level = self.rules.level_for(self.player.power);
        if level != self.player.level {
            self.player.level = level;
            out_events.push(Event::LevelUp { level });
        }
    }

    fn end_turn(&mut self, out_events: &mut Vec<Event>) {
        self.resolved_turns = self.turn;
        out_events.push(Event::TurnResolved { turn: self.turn });
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    if matches!(world.status, GameStatus::Over(_)) {
        return;
    }

    match command {
        Command::BeginTurn => world.begin_turn(out_events),
        Command::DescendEnemies => world.descend_enemies(out_events),
        Command::SpawnEnemies { spawns } => world.spawn_enemies(&spawns, out_events),
        Command::MovePlayer { action } => world.move_player(action, out_events),
        Command::RejectAction { token } => {
            out_events.push(Event::ActionRejected { token });
            world.finish(world.turn, Verdict::InvalidAction, out_events);
        }
        Command::FireLaser { target } => world.fire_laser(target, out_events),
        Command::EndTurn => world.end_turn(out_events),
        Command::Conclude => world.finish(world.resolved_turns, Verdict::Completed, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use tas_core::{GameOutcome, GameStatus, OccupancyView, PlayerSnapshot, Rules};

    use super::World;

    /// Rules the world was created with.
    #[must_use]
    pub fn rules(world: &World) -> &Rules {
        &world.rules
    }

    /// Captures the player's current state.
    #[must_use]
    pub fn player(world: &World) -> PlayerSnapshot {
        PlayerSnapshot {
            lane: world.player.lane,
            score: world.player.score,
            power: world.player.power,
            level: world.player.level,
        }
    }

    /// Exposes a read-only view of the enemy arena.
    #[must_use]
    pub fn occupancy_view(world: &World) -> OccupancyView<'_> {
        OccupancyView::new(
            &world.arena.cells,
            world.arena.width,
            world.arena.height,
        )
    }

    /// Number of enemies on the field, including those awaiting removal.
    #[must_use]
    pub fn enemy_count(world: &World) -> usize {
        world.arena.cells.iter().flatten().count()
    }

    /// Turn currently being played; zero before the first turn.
    #[must_use]
    pub fn turn(world: &World) -> u32 {
        world.turn
    }

    /// Number of turns whose every step completed.
    #[must_use]
    pub fn resolved_turns(world: &World) -> u32 {
        world.resolved_turns
    }

    /// Current game progression.
    #[must_use]
    pub fn status(world: &World) -> GameStatus {
        world.status
    }

    /// Final result, once the game is over.
    #[must_use]
    pub fn outcome(world: &World) -> Option<GameOutcome> {
        match world.status {
            GameStatus::Running => None,
            GameStatus::Over(outcome) => Some(outcome),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Player {
    lane: u32,
    score: u64,
    power: u64,
    level: u64,
}

impl Player {
    fn new(lane: u32) -> Self {
        Self {
            lane,
            score: 0,
            power: 0,
            level: 1,
        }
    }

    fn cell(&self) -> CellCoord {
        CellCoord::new(self.lane, PLAYER_ROW)
    }
}

/// Dense row-major arena holding at most one enemy per cell.
#[derive(Clone, Debug)]
struct EnemyArena {
    width: u32,
    height: u32,
    cells: Vec<Option<Enemy>>,
}

impl EnemyArena {
    fn new(width: u32, height: u32) -> Self {
        let capacity_u64 = u64::from(width) * u64::from(height);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            width,
            height,
            cells: vec![None; capacity],
        }
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

    fn get(&self, cell: CellCoord) -> Option<&Enemy> {
        self.index(cell)
            .and_then(|index| self.cells.get(index))
            .and_then(Option::as_ref)
    }

    fn get_mut(&mut self, cell: CellCoord) -> Option<&mut Enemy> {
        let index = self.index(cell)?;
        self.cells.get_mut(index).and_then(Option::as_mut)
    }

    fn take(&mut self, cell: CellCoord) -> Option<Enemy> {
        let index = self.index(cell)?;
        self.cells.get_mut(index).and_then(Option::take)
    }

    fn place(&mut self, cell: CellCoord, enemy: Enemy) -> bool {
        match self.index(cell).and_then(|index| self.cells.get_mut(index)) {
            Some(slot) => {
                *slot = Some(enemy);
                true
            }
            None => false,
        }
    }

    fn sweep_destroyed(&mut self, out_events: &mut Vec<Event>) {
        let width = self.width.max(1);
        for (slot, index) in self.cells.iter_mut().zip(0_u32..) {
            if slot.is_some_and(|enemy| enemy.will_disappear()) {
                *slot = None;
                out_events.push(Event::EnemyCleared {
                    cell: CellCoord::new(index % width, index / width),
                });
            }
        }
    }

    /// Moves every enemy one row down, scanning rows upward from the bottom.
    ///
    /// Returns the player's cell if an enemy lands on it; the scan stops there.
    fn descend(&mut self, player: CellCoord, out_events: &mut Vec<Event>) -> Option<CellCoord> {
        for row in 0..self.height {
            for lane in 0..self.width {
                let Some(enemy) = self.take(CellCoord::new(lane, row)) else {
                    continue;
                };

                let Some(next_row) = row.checked_sub(1) else {
                    out_events.push(Event::EnemyExited { lane });
                    continue;
                };

                let destination = CellCoord::new(lane, next_row);
                let _ = self.place(destination, enemy);
                if destination == player {
                    return Some(destination);
                }
            }
        }
        None
    }
}
