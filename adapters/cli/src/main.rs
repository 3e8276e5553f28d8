#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line harness for the Tool-Assisted Shooting contest.

mod config;
mod generate;
mod judge;
mod protocol;

use std::{
    fs,
    io::{self, BufWriter, Write},
    path::PathBuf,
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tas_core::SpawnSchedule;
use tas_system_replay::Simulation;
use tas_system_spawning::{RngEngine, ScheduleGenerator};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::{
    config::ContestConfig,
    judge::{CaseFiles, CaseReport},
};

#[derive(Parser, Debug)]
#[command(name = "tas", about = "Generate, judge, and serve Tool-Assisted Shooting cases")]
struct Cli {
    /// Log filter such as `info` or `tas_system_replay=debug`; overrides `RUST_LOG`.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// TOML file with `[rules]` and `[tuning]` tables.
    #[arg(long, global = true)]
    rules: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Writes seeded test cases.
    Generate {
        /// Number of cases to write.
        #[arg(long, default_value_t = 1)]
        count: u32,
        /// Number of the first case; also its seed.
        #[arg(long, default_value_t = 0)]
        start: u32,
        /// Directory receiving the cases.
        #[arg(long, default_value = "in")]
        out_dir: PathBuf,
        /// Random stream used to draw the cases.
        #[arg(long, value_enum, default_value_t = EngineArg::Mt64)]
        engine: EngineArg,
    },
    /// Scores contestant outputs against generated cases.
    Judge {
        /// Case numbers to judge.
        #[arg(required = true)]
        cases: Vec<u32>,
        /// Directory holding the cases.
        #[arg(long, default_value = "in")]
        input_dir: PathBuf,
        /// Directory holding the contestant outputs.
        #[arg(long, default_value = "out")]
        output_dir: PathBuf,
        /// Prints the report as JSON.
        #[arg(long)]
        json: bool,
        /// Includes the per-turn ledger in the report.
        #[arg(long)]
        trace: bool,
    },
    /// Plays one case interactively over stdin and stdout.
    Serve {
        /// Case file to play.
        #[arg(long)]
        input: PathBuf,
        /// File receiving the final score.
        #[arg(long)]
        score_file: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EngineArg {
    Mt64,
    Chacha,
}

impl From<EngineArg> for RngEngine {
    fn from(value: EngineArg) -> Self {
        match value {
            EngineArg::Mt64 => RngEngine::Mt64,
            EngineArg::Chacha => RngEngine::ChaCha8,
        }
    }
}

/// Entry point for the Tool-Assisted Shooting command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref())?;
    let config = ContestConfig::load(cli.rules.as_deref())?;

    match cli.command {
        Commands::Generate {
            count,
            start,
            out_dir,
            engine,
        } => {
            let generator = ScheduleGenerator::new(config.rules, config.tuning);
            let fingerprints =
                generate::generate_cases(&generator, engine.into(), start, count, &out_dir)?;
            info!(
                cases = fingerprints.len(),
                dir = %out_dir.display(),
                "generation finished"
            );
            Ok(())
        }
        Commands::Judge {
            cases,
            input_dir,
            output_dir,
            json,
            trace,
        } => {
            let files = CaseFiles::new(input_dir, output_dir);
            let results = judge::judge_cases(&config.rules, &files, &cases, trace);
            report(results, json)
        }
        Commands::Serve { input, score_file } => {
            let text = fs::read_to_string(&input)
                .with_context(|| format!("failed to read {}", input.display()))?;
            let schedule = SpawnSchedule::decode(&text, &config.rules)
                .with_context(|| format!("malformed case file {}", input.display()))?;

            let mut simulation =
                Simulation::new(config.rules, &schedule).context("unplayable rules")?;
            let outcome = protocol::serve(&mut simulation, io::stdin().lock(), io::stdout())?;
            info!(
                verdict = %outcome.verdict,
                turn = outcome.turn,
                score = outcome.score,
                "session finished"
            );

            if let Some(score) = protocol::recorded_score(&outcome) {
                fs::write(&score_file, format!("{score}\n"))
                    .with_context(|| format!("failed to write {}", score_file.display()))?;
            }
            Ok(())
        }
    }
}

fn init_logging(level: Option<&str>) -> Result<()> {
    let filter = match level {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("invalid log filter `{directives}`"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
    Ok(())
}

fn report(results: Vec<Result<CaseReport>>, json: bool) -> Result<()> {
    let mut reports = Vec::with_capacity(results.len());
    let mut failures = 0_usize;
    for result in results {
        match result {
            Ok(report) => reports.push(report),
            Err(err) => {
                failures += 1;
                error!("{err:#}");
            }
        }
    }

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    if json {
        serde_json::to_writer_pretty(&mut out, &reports).context("failed to encode report")?;
        writeln!(out)?;
    } else {
        for report in &reports {
            writeln!(
                out,
                "{:04}: {} at turn {}, score {}",
                report.case, report.outcome.verdict, report.outcome.turn, report.outcome.score
            )?;
            for record in report.ledger.iter().flatten() {
                writeln!(
                    out,
                    "  turn {:>4} lane {:>2} score {:>6} power {:>6} level {:>3} spawned {} kills {}",
                    record.turn,
                    record.lane,
                    record.score,
                    record.power,
                    record.level,
                    record.spawned,
                    record.kills
                )?;
            }
        }
        let total: u64 = reports.iter().map(|report| report.outcome.score).sum();
        writeln!(out, "total score {total}")?;
    }
    out.flush()?;

    if failures > 0 {
        bail!("{failures} case(s) could not be judged");
    }
    Ok(())
}
