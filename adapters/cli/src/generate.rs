//! Batch generation of test cases.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use tas_system_spawning::{fingerprint_hex, RngEngine, ScheduleGenerator};
use tracing::info;

use crate::judge::case_file_name;

/// Writes cases `start..start + count` into `out_dir`, seeding each with its number.
pub(crate) fn generate_cases(
    generator: &ScheduleGenerator,
    engine: RngEngine,
    start: u32,
    count: u32,
    out_dir: &Path,
) -> Result<Vec<String>> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let mut fingerprints = Vec::with_capacity(count as usize);
    for case in start..start.saturating_add(count) {
        let schedule = generator.generate(engine, u64::from(case));
        let path = out_dir.join(case_file_name(case));
        fs::write(&path, schedule.encode())
            .with_context(|| format!("failed to write {}", path.display()))?;

        let fingerprint = fingerprint_hex(&schedule);
        info!(
            case,
            spawns = schedule.total_spawns(),
            fingerprint = %fingerprint,
            "generated case"
        );
        fingerprints.push(fingerprint);
    }
    Ok(fingerprints)
}

#[cfg(test)]
mod tests {
    use std::env;

    use tas_core::{Rules, SpawnSchedule};
    use tas_system_spawning::SpawnTuning;

    use super::*;

    #[test]
    fn writes_decodable_zero_padded_cases() {
        let dir = env::temp_dir().join(format!("tas-generate-{}", std::process::id()));
        let rules = Rules {
            max_turn: 20,
            ..Rules::default()
        };
        let generator = ScheduleGenerator::new(rules.clone(), SpawnTuning::default());

        let fingerprints =
            generate_cases(&generator, RngEngine::Mt64, 8, 3, &dir).expect("generate cases");
        assert_eq!(fingerprints.len(), 3);

        for case in 8u32..11 {
            let text = fs::read_to_string(dir.join(format!("{case:04}.txt"))).expect("case file");
            let decoded = SpawnSchedule::decode(&text, &rules).expect("decode case");
            assert_eq!(decoded, generator.generate(RngEngine::Mt64, u64::from(case)));
        }

        fs::remove_dir_all(&dir).expect("clean up");
    }
}
