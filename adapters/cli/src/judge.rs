//! Offline scoring of contestant outputs against generated cases.

use std::{
    fs,
    num::NonZeroUsize,
    path::{Path, PathBuf},
    thread,
};

use anyhow::{Context, Result};
use serde::Serialize;
use tas_core::{ActionToken, GameOutcome, Rules, SpawnSchedule};
use tas_system_replay::{Simulation, TurnRecord};
use tracing::info;

/// Location of the case files on disk.
#[derive(Clone, Debug)]
pub(crate) struct CaseFiles {
    input_dir: PathBuf,
    output_dir: PathBuf,
}

impl CaseFiles {
    pub(crate) fn new(input_dir: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            input_dir,
            output_dir,
        }
    }

    fn schedule_path(&self, case: u32) -> PathBuf {
        self.input_dir.join(case_file_name(case))
    }

    fn actions_path(&self, case: u32) -> PathBuf {
        self.output_dir.join(case_file_name(case))
    }
}

/// File name of case `case`, zero-padded to four digits.
pub(crate) fn case_file_name(case: u32) -> String {
    format!("{case:04}.txt")
}

/// Result of judging one case.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct CaseReport {
    pub(crate) case: u32,
    #[serde(flatten)]
    pub(crate) outcome: GameOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) ledger: Option<Vec<TurnRecord>>,
}

/// Judges one case, reading its schedule and the contestant's actions.
pub(crate) fn judge_case(
    rules: &Rules,
    files: &CaseFiles,
    case: u32,
    trace: bool,
) -> Result<CaseReport> {
    let schedule_path = files.schedule_path(case);
    let schedule_text = read(&schedule_path)?;
    let schedule = SpawnSchedule::decode(&schedule_text, rules)
        .with_context(|| format!("malformed case file {}", schedule_path.display()))?;
    let actions = ActionToken::parse_stream(&read(&files.actions_path(case))?);

    replay(rules, &schedule, actions, case, trace)
}

/// Replays already loaded inputs.
pub(crate) fn replay(
    rules: &Rules,
    schedule: &SpawnSchedule,
    actions: Vec<ActionToken>,
    case: u32,
    trace: bool,
) -> Result<CaseReport> {
    let mut simulation = Simulation::new(rules.clone(), schedule).context("unplayable rules")?;
    let outcome = simulation.run(actions);
    info!(
        case,
        verdict = %outcome.verdict,
        turn = outcome.turn,
        score = outcome.score,
        "case judged"
    );

    Ok(CaseReport {
        case,
        outcome,
        ledger: trace.then(|| simulation.ledger().to_vec()),
    })
}

/// Judges cases on scoped threads, at most one per available core at a time,
/// keeping results in case order.
pub(crate) fn judge_cases(
    rules: &Rules,
    files: &CaseFiles,
    cases: &[u32],
    trace: bool,
) -> Vec<Result<CaseReport>> {
    let workers = thread::available_parallelism().map_or(1, NonZeroUsize::get);
    let mut results = Vec::with_capacity(cases.len());
    for batch in cases.chunks(workers) {
        thread::scope(|scope| {
            let handles: Vec<_> = batch
                .iter()
                .map(|&case| scope.spawn(move || judge_case(rules, files, case, trace)))
                .collect();
            results.extend(handles.into_iter().zip(batch).map(|(handle, case)| {
                handle
                    .join()
                    .unwrap_or_else(|_| Err(anyhow::anyhow!("judging case {case} panicked")))
            }));
        });
    }
    results
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use tas_core::{Action, SpawnRecord, Verdict};

    use super::*;

    fn rules() -> Rules {
        Rules {
            width: 3,
            height: 3,
            max_turn: 2,
            level_step: 100,
            start_lane: 1,
        }
    }

    #[test]
    fn case_names_are_zero_padded() {
        assert_eq!(case_file_name(7), "0007.txt");
        assert_eq!(case_file_name(1234), "1234.txt");
    }

    #[test]
    fn trace_keeps_the_ledger() {
        let schedule = SpawnSchedule::new(
            vec![1, 1, 1],
            vec![vec![SpawnRecord::new(1, 2, 1)], Vec::new()],
        );
        let actions = vec![ActionToken::Move(Action::Stay); 2];

        let report = replay(&rules(), &schedule, actions.clone(), 3, true).expect("playable rules");
        assert_eq!(report.outcome.verdict, Verdict::Completed);
        assert_eq!(report.outcome.score, 1);
        assert_eq!(report.ledger.as_ref().map(Vec::len), Some(2));

        let quiet = replay(&rules(), &schedule, actions, 3, false).expect("playable rules");
        assert!(quiet.ledger.is_none());
    }

    #[test]
    fn json_report_flattens_the_outcome() {
        let report = CaseReport {
            case: 4,
            outcome: GameOutcome {
                score: 10,
                turn: 2,
                verdict: Verdict::Destroyed,
            },
            ledger: None,
        };
        let json = serde_json::to_value(&report).expect("serialize report");
        assert_eq!(json["case"], 4);
        assert_eq!(json["score"], 10);
        assert_eq!(json["turn"], 2);
        assert!(json.get("ledger").is_none());
    }

    #[test]
    fn batches_beyond_the_core_count_keep_case_order() {
        let files = CaseFiles::new(
            PathBuf::from("/nonexistent/tas/in"),
            PathBuf::from("/nonexistent/tas/out"),
        );
        let workers = thread::available_parallelism().map_or(1, NonZeroUsize::get);
        let cases: Vec<u32> = (0..).take(workers * 3 + 1).collect();

        let results = judge_cases(&rules(), &files, &cases, false);
        assert_eq!(results.len(), cases.len());
        for (case, result) in cases.iter().zip(results) {
            let error = result.expect_err("missing case file");
            assert!(format!("{error:#}").contains(&case_file_name(*case)));
        }
    }

    #[test]
    fn unplayable_rules_fail_the_case() {
        let schedule = SpawnSchedule::new(vec![1, 1, 1], vec![Vec::new(), Vec::new()]);
        let rules = Rules {
            level_step: 0,
            ..rules()
        };
        let error = replay(&rules, &schedule, Vec::new(), 0, false).expect_err("zero level step");
        assert!(format!("{error:#}").contains("unplayable rules"));
    }

    #[test]
    fn missing_files_are_reported_per_case() {
        let files = CaseFiles::new(
            PathBuf::from("/nonexistent/tas/in"),
            PathBuf::from("/nonexistent/tas/out"),
        );
        let results = judge_cases(&rules(), &files, &[1, 2], false);
        assert_eq!(results.len(), 2);
        for result in results {
            let error = result.expect_err("missing case file");
            assert!(format!("{error:#}").contains("failed to read"));
        }
    }
}
