use tas_core::{Action, CellCoord, Command, Event, Rules, SpawnRecord};
use tas_system_targeting::Targeting;
use tas_world::{self as world, query, World};

fn rules() -> Rules {
    Rules {
        width: 4,
        height: 6,
        max_turn: 20,
        level_step: 10,
        start_lane: 1,
    }
}

fn spawns(records: &[(u32, u32, u32)]) -> Vec<SpawnRecord> {
    records
        .iter()
        .map(|&(hp, power, lane)| SpawnRecord::new(hp, power, lane))
        .collect()
}

fn play(script: &[(Vec<SpawnRecord>, Action)]) -> Vec<Event> {
    let mut world = World::new(rules());
    let targeting = Targeting::new();
    let mut events = Vec::new();
    let mut commands = Vec::new();

    for (spawned, action) in script {
        world::apply(&mut world, Command::BeginTurn, &mut events);
        world::apply(&mut world, Command::DescendEnemies, &mut events);
        world::apply(
            &mut world,
            Command::SpawnEnemies {
                spawns: spawned.clone(),
            },
            &mut events,
        );
        world::apply(&mut world, Command::MovePlayer { action: *action }, &mut events);

        commands.clear();
        targeting.handle(
            query::player(&world),
            query::occupancy_view(&world),
            &mut commands,
        );
        for command in commands.drain(..) {
            world::apply(&mut world, command, &mut events);
        }
        world::apply(&mut world, Command::EndTurn, &mut events);
    }

    events
}

#[test]
fn laser_only_hits_the_front_enemy_of_a_column() {
    let script = vec![
        (spawns(&[(3, 12, 1)]), Action::Stay),
        (spawns(&[(1, 0, 1)]), Action::Stay),
        (Vec::new(), Action::Stay),
    ];
    let events = play(&script);

    let damaged: Vec<CellCoord> = events
        .iter()
        .filter_map(|event| match event {
            Event::EnemyDamaged { cell, .. } => Some(*cell),
            _ => None,
        })
        .collect();
    assert_eq!(
        damaged,
        vec![
            CellCoord::new(1, 5),
            CellCoord::new(1, 4),
            CellCoord::new(1, 3),
        ]
    );

    let destroyed: Vec<(CellCoord, u64)> = events
        .iter()
        .filter_map(|event| match event {
            Event::EnemyDestroyed { cell, score, .. } => Some((*cell, *score)),
            _ => None,
        })
        .collect();
    assert_eq!(destroyed, vec![(CellCoord::new(1, 3), 3)]);
    assert!(events.contains(&Event::LevelUp { level: 2 }));
}

#[test]
fn replay_is_deterministic() {
    let script = vec![
        (spawns(&[(2, 1, 0), (5, 3, 2)]), Action::Left),
        (spawns(&[(4, 4, 3)]), Action::Right),
        (Vec::new(), Action::Right),
        (spawns(&[(1, 1, 2)]), Action::Stay),
    ];

    let first = play(&script);
    let second = play(&script);
    assert_eq!(first, second, "replay diverged between runs");
    assert!(first
        .iter()
        .any(|event| matches!(event, Event::EnemyDamaged { .. })));
}
