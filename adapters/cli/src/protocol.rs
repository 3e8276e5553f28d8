//! Interactive judging over a line-oriented byte stream.
//!
//! Every turn the harness publishes the spawn count followed by one
//! `hp power lane` line per spawn, then blocks on exactly one action line
//! from the contestant. `-1` replaces the spawn count once the player is
//! destroyed or submits an invalid line.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use tas_core::{ActionToken, GameOutcome, GameStatus, Verdict};
use tas_system_replay::{Simulation, TurnOpening};
use tracing::{debug, warn};

/// Line written to the contestant when the game ends abnormally.
const TERMINATION_LINE: &str = "-1";

/// Plays one game against a contestant connected through `contestant` and `judge_out`.
///
/// Reaching the end of the contestant's output concludes the game with the
/// turns resolved so far.
pub(crate) fn serve<R, W>(
    simulation: &mut Simulation<'_>,
    mut contestant: R,
    mut judge_out: W,
) -> Result<GameOutcome>
where
    R: BufRead,
    W: Write,
{
    loop {
        let token = match simulation.open_turn() {
            TurnOpening::Over(outcome) => {
                if outcome.verdict != Verdict::Completed {
                    terminate(&mut judge_out)?;
                }
                return Ok(outcome);
            }
            TurnOpening::Ready { token, spawns } => {
                writeln!(judge_out, "{}", spawns.len()).context("failed to publish spawn count")?;
                for spawn in spawns {
                    writeln!(judge_out, "{} {} {}", spawn.hp, spawn.power, spawn.lane)
                        .context("failed to publish spawn")?;
                }
                judge_out.flush().context("failed to flush turn to contestant")?;
                token
            }
        };

        let turn = token.turn();
        let Some(action) = next_action(&mut contestant)? else {
            debug!(turn, "contestant closed its output");
            return Ok(simulation.conclude());
        };
        if let ActionToken::Invalid(line) = &action {
            warn!(turn, line = %line, "contestant sent an invalid action");
        }

        if let GameStatus::Over(outcome) = simulation.close_turn(token, action) {
            terminate(&mut judge_out)?;
            return Ok(outcome);
        }
    }
}

/// Score to record for a finished game; rejected submissions are not scored.
pub(crate) fn recorded_score(outcome: &GameOutcome) -> Option<u64> {
    match outcome.verdict {
        Verdict::InvalidAction => None,
        Verdict::Completed | Verdict::Destroyed => Some(outcome.score),
    }
}

fn next_action<R: BufRead>(contestant: &mut R) -> Result<Option<ActionToken>> {
    let mut line = String::new();
    loop {
        line.clear();
        let read = contestant
            .read_line(&mut line)
            .context("failed to read contestant action")?;
        if read == 0 {
            return Ok(None);
        }
        if let Some(token) = ActionToken::parse_line(line.trim_end_matches(['\n', '\r'])) {
            return Ok(Some(token));
        }
    }
}

fn terminate<W: Write>(judge_out: &mut W) -> Result<()> {
    writeln!(judge_out, "{TERMINATION_LINE}").context("failed to notify contestant")?;
    judge_out.flush().context("failed to flush termination notice")
}
