//! Text formats exchanged with contestants and generator tooling.

use std::{collections::HashSet, fmt::Write as _, str::SplitAsciiWhitespace};

use crate::{ActionToken, Action, Rules, ScheduleError, SpawnRecord, SpawnSchedule};

/// First character that marks a contestant output line as a comment.
const COMMENT_MARKER: char = '#';

impl SpawnSchedule {
    /// Encodes the schedule in the canonical test-case layout.
    ///
    /// The first line lists the per-lane percentages separated by single
    /// spaces; every turn then contributes its spawn count followed by one
    /// `hp power lane` line per spawn.
    #[must_use]
    pub fn encode(&self) -> String {
        let mut text = String::with_capacity(16 * (self.turn_count() as usize + 1));
        let header: Vec<String> = self.percentages().iter().map(u32::to_string).collect();
        text.push_str(&header.join(" "));
        text.push('\n');
        for (_, spawns) in self.iter() {
            let _ = writeln!(text, "{}", spawns.len());
            for spawn in spawns {
                let _ = writeln!(text, "{} {} {}", spawn.hp, spawn.power, spawn.lane);
            }
        }
        text
    }

    /// Decodes a schedule laid out as produced by [`SpawnSchedule::encode`].
    ///
    /// Tokens are separated by arbitrary ASCII whitespace.
    pub fn decode(value: &str, rules: &Rules) -> Result<Self, ScheduleError> {
        let mut tokens = Tokens::new(value);

        let mut percentages = Vec::with_capacity(rules.width as usize);
        for _ in 0..rules.width {
            percentages.push(tokens.unsigned("lane spawn percentage", 0)?);
        }

        let mut turns = Vec::with_capacity(rules.max_turn as usize);
        let mut seen_lanes = HashSet::new();
        for turn in 1..=rules.max_turn {
            let count = tokens.unsigned("spawn count", turn)?;
            seen_lanes.clear();
            let mut spawns = Vec::new();
            for _ in 0..count {
                let hp = tokens.signed("spawn hit points", turn)?;
                let power = tokens.signed("spawn power", turn)?;
                let lane = tokens.signed("spawn lane", turn)?;
                spawns.push(validate_spawn(turn, hp, power, lane, rules)?);
                if !seen_lanes.insert(lane) {
                    return Err(ScheduleError::DuplicateLane {
                        turn,
                        lane: lane as u32,
                    });
                }
            }
            turns.push(spawns);
        }

        if let Some(token) = tokens.next() {
            return Err(ScheduleError::TrailingData {
                token: token.to_owned(),
                turn: rules.max_turn,
            });
        }

        Ok(Self::new(percentages, turns))
    }
}

fn validate_spawn(
    turn: u32,
    hp: i64,
    power: i64,
    lane: i64,
    rules: &Rules,
) -> Result<SpawnRecord, ScheduleError> {
    let lane_index = u32::try_from(lane)
        .ok()
        .filter(|lane| *lane < rules.width)
        .ok_or(ScheduleError::LaneOutOfRange {
            turn,
            lane,
            width: rules.width,
        })?;
    let hp_value = u32::try_from(hp)
        .ok()
        .filter(|hp| *hp >= 1)
        .ok_or(ScheduleError::NonPositiveHp { turn, lane, hp })?;
    let power_value =
        u32::try_from(power).map_err(|_| ScheduleError::NegativePower { turn, lane, power })?;
    Ok(SpawnRecord::new(hp_value, power_value, lane_index))
}

struct Tokens<'a> {
    inner: SplitAsciiWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn new(value: &'a str) -> Self {
        Self {
            inner: value.split_ascii_whitespace(),
        }
    }

    fn next(&mut self) -> Option<&'a str> {
        self.inner.next()
    }

    fn take(&mut self, expected: &'static str, turn: u32) -> Result<&'a str, ScheduleError> {
        self.next()
            .ok_or(ScheduleError::UnexpectedEnd { expected, turn })
    }

    fn unsigned(&mut self, expected: &'static str, turn: u32) -> Result<u32, ScheduleError> {
        let token = self.take(expected, turn)?;
        token.parse().map_err(|_| ScheduleError::InvalidNumber {
            token: token.to_owned(),
            expected,
            turn,
        })
    }

    fn signed(&mut self, expected: &'static str, turn: u32) -> Result<i64, ScheduleError> {
        let token = self.take(expected, turn)?;
        token.parse().map_err(|_| ScheduleError::InvalidNumber {
            token: token.to_owned(),
            expected,
            turn,
        })
    }
}

impl ActionToken {
    /// Classifies one line of contestant output.
    ///
    /// Returns `None` for comment lines, which do not consume a turn. Only
    /// the first character is significant; an empty line is invalid.
    #[must_use]
    pub fn parse_line(line: &str) -> Option<Self> {
        let mut chars = line.chars();
        match chars.next() {
            Some(COMMENT_MARKER) => None,
            Some(symbol) => Some(match Action::from_symbol(symbol) {
                Some(action) => Self::Move(action),
                None => Self::Invalid(line.trim_end().to_owned()),
            }),
            None => Some(Self::Invalid(String::new())),
        }
    }

    /// Splits a whole contestant output into turn tokens, skipping comments.
    #[must_use]
    pub fn parse_stream(text: &str) -> Vec<Self> {
        text.lines().filter_map(Self::parse_line).collect()
    }
}
