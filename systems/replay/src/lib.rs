#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Turn sequencing for a single Tool-Assisted Shooting game.
//!
//! [`Simulation`] drives the world through the fixed intra-turn order:
//! removal of destroyed enemies, descent, spawning, the player's action, and
//! the laser shot. A turn is split in two halves so that an interactive
//! harness can publish the turn's spawns before it reads the action.

use serde::Serialize;
use tas_core::{
    ActionToken, Command, Event, GameOutcome, GameStatus, PlayerSnapshot, Rules, RulesError,
    SpawnRecord, SpawnSchedule, Verdict,
};
use tas_system_targeting::Targeting;
use tas_world::{self as world, query, World};
use tracing::{debug, info};

/// Snapshot of the player taken after a turn has been fully resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct TurnRecord {
    /// Turn the record describes.
    pub turn: u32,
    /// Player lane at the end of the turn.
    pub lane: u32,
    /// Accumulated score.
    pub score: u64,
    /// Accumulated power.
    pub power: u64,
    /// Laser damage per shot.
    pub level: u64,
    /// Enemies that entered the field this turn.
    pub spawned: u32,
    /// Enemies destroyed by this turn's shot.
    pub kills: u32,
}

/// Proof that a turn has been opened and awaits the player's action.
#[must_use]
#[derive(Debug, PartialEq, Eq)]
pub struct TurnToken {
    turn: u32,
}

impl TurnToken {
    /// Turn the token belongs to.
    #[must_use]
    pub const fn turn(&self) -> u32 {
        self.turn
    }
}

/// Result of opening a turn.
#[derive(Debug, PartialEq, Eq)]
pub enum TurnOpening<'s> {
    /// The turn is waiting for an action; `spawns` entered the field this turn.
    Ready {
        /// Token to hand back to [`Simulation::close_turn`].
        token: TurnToken,
        /// Spawns inserted during the turn.
        spawns: &'s [SpawnRecord],
    },
    /// The game ended before an action was needed.
    Over(GameOutcome),
}

/// Deterministic replay of one game against a spawn schedule.
#[derive(Debug)]
pub struct Simulation<'s> {
    schedule: &'s SpawnSchedule,
    world: World,
    targeting: Targeting,
    events: Vec<Event>,
    commands: Vec<Command>,
    ledger: Vec<TurnRecord>,
    pending: Option<Pending>,
}

#[derive(Clone, Copy, Debug)]
struct Pending {
    turn: u32,
    spawned: u32,
}

impl<'s> Simulation<'s> {
    /// Prepares a fresh game on the provided rules and schedule.
    ///
    /// Fails when the rules describe an unplayable field.
    pub fn new(rules: Rules, schedule: &'s SpawnSchedule) -> Result<Self, RulesError> {
        rules.validate()?;
        Ok(Self {
            schedule,
            world: World::new(rules),
            targeting: Targeting::new(),
            events: Vec::new(),
            commands: Vec::new(),
            ledger: Vec::new(),
            pending: None,
        })
    }

    /// Runs the first half of the next turn: removal, descent, and spawning.
    ///
    /// Calling it again before [`Simulation::close_turn`] hands out the same
    /// turn. Once the horizon is reached the game concludes as completed.
    pub fn open_turn(&mut self) -> TurnOpening<'s> {
        if let Some(outcome) = query::outcome(&self.world) {
            return TurnOpening::Over(outcome);
        }
        if let Some(pending) = self.pending {
            return self.ready(pending.turn);
        }
        if query::turn(&self.world) >= query::rules(&self.world).max_turn {
            return TurnOpening::Over(self.conclude());
        }

        self.dispatch(Command::BeginTurn);
        self.dispatch(Command::DescendEnemies);
        if let Some(outcome) = query::outcome(&self.world) {
            return TurnOpening::Over(outcome);
        }

        let turn = query::turn(&self.world);
        let schedule: &'s SpawnSchedule = self.schedule;
        let spawns = schedule.turn(turn);
        let before = self.events.len();
        self.dispatch(Command::SpawnEnemies {
            spawns: spawns.to_vec(),
        });
        let spawned = count(&self.events[before..], |event| {
            matches!(event, Event::EnemySpawned { .. })
        });

        self.pending = Some(Pending { turn, spawned });
        self.ready(turn)
    }

    /// Runs the second half of an opened turn: the action and the shot.
    ///
    /// A token from another turn leaves the game untouched.
    pub fn close_turn(&mut self, token: TurnToken, action: ActionToken) -> GameStatus {
        let Some(pending) = self.pending.filter(|pending| pending.turn == token.turn) else {
            return query::status(&self.world);
        };
        self.pending = None;

        let before = self.events.len();
        match action {
            ActionToken::Move(action) => self.dispatch(Command::MovePlayer { action }),
            ActionToken::Invalid(token) => self.dispatch(Command::RejectAction { token }),
        }

        if query::outcome(&self.world).is_none() {
            self.commands.clear();
            self.targeting.handle(
                query::player(&self.world),
                query::occupancy_view(&self.world),
                &mut self.commands,
            );
            for command in std::mem::take(&mut self.commands) {
                self.dispatch(command);
            }
            self.dispatch(Command::EndTurn);
            self.record(pending, before);
        }

        query::status(&self.world)
    }

    /// Ends a running game as completed after the turns resolved so far.
    ///
    /// An opened but unclosed turn does not count. Returns the final outcome
    /// whether or not the game was still running.
    pub fn conclude(&mut self) -> GameOutcome {
        self.pending = None;
        self.dispatch(Command::Conclude);
        self.outcome()
    }

    /// Replays the whole game from an action stream.
    ///
    /// The game completes when the stream or the turn horizon runs out.
    pub fn run<I>(&mut self, actions: I) -> GameOutcome
    where
        I: IntoIterator<Item = ActionToken>,
    {
        let mut actions = actions.into_iter();
        loop {
            if let Some(outcome) = query::outcome(&self.world) {
                return outcome;
            }
            let Some(action) = actions.next() else {
                return self.conclude();
            };
            let token = match self.open_turn() {
                TurnOpening::Ready { token, .. } => token,
                TurnOpening::Over(outcome) => return outcome,
            };
            if let GameStatus::Over(outcome) = self.close_turn(token, action) {
                return outcome;
            }
        }
    }

    /// Current game progression.
    #[must_use]
    pub fn status(&self) -> GameStatus {
        query::status(&self.world)
    }

    /// Player state as of the last applied step.
    #[must_use]
    pub fn player(&self) -> PlayerSnapshot {
        query::player(&self.world)
    }

    /// One record per resolved turn, in turn order.
    #[must_use]
    pub fn ledger(&self) -> &[TurnRecord] {
        &self.ledger
    }

    /// Every event the world reported, in order.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Read access to the underlying world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    fn ready(&self, turn: u32) -> TurnOpening<'s> {
        let schedule: &'s SpawnSchedule = self.schedule;
        TurnOpening::Ready {
            token: TurnToken { turn },
            spawns: schedule.turn(turn),
        }
    }

    fn outcome(&self) -> GameOutcome {
        query::outcome(&self.world).unwrap_or(GameOutcome {
            score: query::player(&self.world).score,
            turn: query::resolved_turns(&self.world),
            verdict: Verdict::Completed,
        })
    }

    fn dispatch(&mut self, command: Command) {
        let before = self.events.len();
        world::apply(&mut self.world, command, &mut self.events);
        for event in &self.events[before..] {
            if let Event::GameOver { outcome } = event {
                info!(
                    verdict = %outcome.verdict,
                    turn = outcome.turn,
                    score = outcome.score,
                    "game over"
                );
            }
        }
    }

    fn record(&mut self, pending: Pending, since: usize) {
        let player = query::player(&self.world);
        let kills = count(&self.events[since..], |event| {
            matches!(event, Event::EnemyDestroyed { .. })
        });
        let record = TurnRecord {
            turn: pending.turn,
            lane: player.lane,
            score: player.score,
            power: player.power,
            level: player.level,
            spawned: pending.spawned,
            kills,
        };
        debug!(
            turn = record.turn,
            lane = record.lane,
            score = record.score,
            level = record.level,
            "turn resolved"
        );
        self.ledger.push(record);
    }
}

fn count(events: &[Event], predicate: impl Fn(&Event) -> bool) -> u32 {
    let matching = events.iter().filter(|event| predicate(event)).count();
    u32::try_from(matching).unwrap_or(u32::MAX)
}
