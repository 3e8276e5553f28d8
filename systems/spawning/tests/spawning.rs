use tas_core::{Rules, SpawnRecord};
use tas_system_spawning::{
    fingerprint_hex, PortableSampler, RngEngine, ScheduleGenerator, SpawnTuning,
};

fn contest_generator() -> ScheduleGenerator {
    ScheduleGenerator::new(Rules::default(), SpawnTuning::default())
}

#[test]
fn seed_zero_reproduces_reference_case() {
    let schedule = contest_generator().generate(RngEngine::Mt64, 0);

    assert_eq!(
        schedule.percentages(),
        &[2, 8, 1, 5, 5, 1, 6, 4, 7, 8, 4, 6, 8, 3, 3, 4, 7, 6, 5, 3, 2, 5, 5, 2, 2]
    );
    assert_eq!(schedule.turn(1), &[SpawnRecord::new(10, 9, 0)]);
    assert_eq!(
        schedule.turn(2),
        &[SpawnRecord::new(7, 5, 11), SpawnRecord::new(6, 6, 15)]
    );
    assert_eq!(schedule.turn(3), &[SpawnRecord::new(9, 8, 1)]);
    assert_eq!(
        fingerprint_hex(&schedule),
        "b7f3fb162bc7aa49a32fed69c373aee749b4d180b34effba5b632bfd28d87712"
    );
}

#[test]
fn seed_one_reproduces_reference_case() {
    let schedule = contest_generator().generate(RngEngine::Mt64, 1);
    assert_eq!(
        fingerprint_hex(&schedule),
        "0b247af2e0d9832212c212100e6c02ff400ae204a19b694c87114208cfcd9663"
    );
}

#[test]
fn generate_with_matches_engine_dispatch() {
    let generator = contest_generator();
    let mut sampler = PortableSampler::new(17);
    assert_eq!(
        generator.generate_with(&mut sampler),
        generator.generate(RngEngine::Mt64, 17)
    );
}

#[test]
fn schedules_respect_field_and_tuning_bounds() {
    let rules = Rules::default();
    let tuning = SpawnTuning::default();
    let generator = ScheduleGenerator::new(rules.clone(), tuning.clone());

    for engine in [RngEngine::Mt64, RngEngine::ChaCha8] {
        for seed in 0..4 {
            let schedule = generator.generate(engine, seed);
            assert_eq!(schedule.percentages().len(), rules.width as usize);
            assert!(schedule
                .percentages()
                .iter()
                .all(|p| (tuning.min_percent..=tuning.max_percent).contains(p)));
            assert_eq!(schedule.turn_count(), rules.max_turn);

            for (_, spawns) in schedule.iter() {
                let mut previous = None;
                for spawn in spawns {
                    assert!(spawn.hp >= 1);
                    assert!(spawn.lane < rules.width);
                    assert!(previous.map_or(true, |lane| lane < spawn.lane));
                    previous = Some(spawn.lane);
                }
            }
        }
    }
}

#[test]
fn chacha_engine_is_deterministic_and_distinct() {
    let generator = contest_generator();
    let first = generator.generate(RngEngine::ChaCha8, 5);
    let second = generator.generate(RngEngine::ChaCha8, 5);
    assert_eq!(first, second);
    assert_ne!(first, generator.generate(RngEngine::Mt64, 5));
}

#[test]
fn schedules_round_trip_through_text() {
    let rules = Rules::default();
    let schedule = contest_generator().generate(RngEngine::Mt64, 9);
    let decoded =
        tas_core::SpawnSchedule::decode(&schedule.encode(), &rules).expect("decode generated case");
    assert_eq!(decoded, schedule);
}

#[test]
fn quieter_tuning_never_spawns() {
    let tuning = SpawnTuning {
        min_percent: 0,
        max_percent: 0,
        ..SpawnTuning::default()
    };
    let schedule = ScheduleGenerator::new(Rules::default(), tuning).generate(RngEngine::Mt64, 3);
    assert_eq!(schedule.total_spawns(), 0);
}
