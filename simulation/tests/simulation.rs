use std::time::Duration;

use glam::Vec3;
use holdout_core::{Event, SpawnPoint, UnitId, WaveIndex, WaveSource};
use holdout_simulation::{Simulation, SimulationConfig};
use holdout_system_rounds::Phase;
use holdout_wave_curve::WaveCurve;
use holdout_world::query;

struct FixedCurve {
    concurrent: u32,
    total: u32,
    interval: Duration,
}

impl WaveSource for FixedCurve {
    fn max_concurrent(&self, _wave: WaveIndex) -> u32 {
        self.concurrent
    }

    fn max_total(&self, _wave: WaveIndex, _participants: u32) -> u32 {
        self.total
    }

    fn interval(&self, _wave: WaveIndex) -> Duration {
        self.interval
    }
}

fn small_curve() -> FixedCurve {
    FixedCurve {
        concurrent: 2,
        total: 3,
        interval: Duration::from_secs(1),
    }
}

fn config(transition: Duration) -> SimulationConfig {
    SimulationConfig::new(1)
        .with_transition(transition)
        .with_seed(0x5eed)
        .with_spawn_points(vec![
            SpawnPoint::at(Vec3::new(-5.0, 0.0, 0.0)),
            SpawnPoint::at(Vec3::new(5.0, 0.0, 0.0)),
        ])
}

fn spawned(events: &[Event]) -> Vec<UnitId> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::UnitSpawned { unit, .. } => Some(*unit),
            _ => None,
        })
        .collect()
}

fn count(events: &[Event], predicate: impl Fn(&Event) -> bool) -> usize {
    events.iter().filter(|event| predicate(event)).count()
}

#[test]
fn last_death_ends_wave_exactly_once() {
    let mut simulation = Simulation::new(config(Duration::from_millis(500)), small_curve());

    let began = simulation.advance(Duration::from_millis(500));
    assert!(began.contains(&Event::WaveBegan {
        wave: WaveIndex::FIRST
    }));
    assert!(spawned(&began).is_empty(), "no spawn on the tick a wave begins");

    let first = spawned(&simulation.advance(Duration::from_secs(1)));
    let second = spawned(&simulation.advance(Duration::from_secs(1)));
    assert_eq!((first.len(), second.len()), (1, 1));

    let capped = simulation.advance(Duration::from_secs(1));
    assert!(spawned(&capped).is_empty());
    assert_eq!(
        capped.last(),
        Some(&Event::ConcurrentCapReached {
            wave: WaveIndex::FIRST
        })
    );

    assert_eq!(
        simulation.report_death(first[0]),
        vec![Event::UnitDied { unit: first[0] }]
    );
    let third = spawned(&simulation.advance(Duration::from_secs(1)));
    assert_eq!(third.len(), 1);
    assert!(simulation.admission().total_exhausted());

    assert_eq!(
        simulation.report_death(second[0]),
        vec![Event::UnitDied { unit: second[0] }]
    );
    assert_eq!(simulation.admission().alive(), 1);

    let ended = simulation.report_death(third[0]);
    assert_eq!(
        ended,
        vec![
            Event::UnitDied { unit: third[0] },
            Event::WaveEnded {
                wave: WaveIndex::FIRST
            },
        ]
    );

    assert!(
        simulation.report_death(third[0]).is_empty(),
        "duplicate death must not retrigger"
    );
    assert_eq!(simulation.wave(), WaveIndex::new(2));
    assert!(!simulation.is_active());
    assert!(simulation.live_units().is_empty());

    let waiting = simulation.advance(Duration::from_millis(250));
    assert_eq!(
        count(&waiting, |event| matches!(event, Event::WaveBegan { .. })),
        0
    );
    let next = simulation.advance(Duration::from_millis(250));
    assert!(next.contains(&Event::WaveBegan {
        wave: WaveIndex::new(2)
    }));
    assert_eq!(simulation.admission().wave, WaveIndex::new(2));
    assert_eq!(simulation.admission().admitted(), 0);
}

#[test]
fn no_spawns_while_transitioning() {
    let mut simulation = Simulation::new(config(Duration::from_secs(10)), small_curve());
    let _ = simulation.advance(Duration::from_secs(10));

    let first = spawned(&simulation.advance(Duration::from_secs(1)));
    let second = spawned(&simulation.advance(Duration::from_secs(1)));
    let _ = simulation.report_death(first[0]);
    let third = spawned(&simulation.advance(Duration::from_secs(1)));
    let _ = simulation.report_death(second[0]);
    let ended = simulation.report_death(third[0]);
    assert!(ended.contains(&Event::WaveEnded {
        wave: WaveIndex::FIRST
    }));
    assert!(matches!(simulation.rounds_phase(), Phase::Transitioning { .. }));

    for _ in 0..39 {
        let events = simulation.advance(Duration::from_millis(250));
        assert!(spawned(&events).is_empty(), "spawned during transition");
        assert_eq!(
            count(&events, |event| matches!(event, Event::WaveBegan { .. })),
            0
        );
    }

    let began = simulation.advance(Duration::from_millis(250));
    assert!(began.contains(&Event::WaveBegan {
        wave: WaveIndex::new(2)
    }));
}

#[test]
fn missing_spawn_points_do_not_leak_admission() {
    let mut simulation = Simulation::new(
        SimulationConfig::new(1).with_transition(Duration::ZERO),
        small_curve(),
    );

    let mut events = simulation.advance(Duration::from_millis(1));
    events.extend(simulation.advance(Duration::from_secs(3)));
    assert_eq!(
        count(&events, |event| *event == Event::SpawnPointUnavailable),
        3
    );
    assert_eq!(simulation.admission().admitted(), 0);

    simulation.configure_spawn_points(vec![SpawnPoint::at(Vec3::Z)]);
    let events = simulation.advance(Duration::from_secs(1));
    assert_eq!(spawned(&events).len(), 1);
    assert_eq!(simulation.admission().admitted(), 1);
}

#[test]
fn disabling_mid_transition_drops_wave_begin() {
    let mut simulation = Simulation::new(config(Duration::from_secs(1)), small_curve());
    let waiting = simulation.advance(Duration::from_millis(500));
    assert_eq!(
        count(&waiting, |event| matches!(event, Event::WaveBegan { .. })),
        0
    );

    simulation.on_disable();
    let idle = simulation.advance(Duration::from_secs(5));
    assert_eq!(
        idle,
        vec![Event::TimeAdvanced {
            dt: Duration::from_secs(5)
        }]
    );

    let _ = simulation.on_enable();
    let halfway = simulation.advance(Duration::from_millis(500));
    assert!(!halfway.contains(&Event::WaveBegan {
        wave: WaveIndex::FIRST
    }));
    let began = simulation.advance(Duration::from_millis(500));
    assert!(began.contains(&Event::WaveBegan {
        wave: WaveIndex::FIRST
    }));
}

#[test]
fn re_enabling_active_wave_keeps_concurrent_cap() {
    let curve = FixedCurve {
        concurrent: 2,
        total: 10,
        interval: Duration::from_secs(1),
    };
    let mut simulation = Simulation::new(config(Duration::from_secs(1)), curve);
    let mut events = Vec::new();
    for _ in 0..4 {
        events.extend(simulation.advance(Duration::from_secs(1)));
    }
    assert_eq!(simulation.live_units().len(), 2);

    simulation.on_disable();
    assert_eq!(simulation.rounds_phase(), Phase::Suspended);
    assert!(simulation.on_enable().is_empty());
    assert!(simulation.is_active());

    for _ in 0..5 {
        events.extend(simulation.advance(Duration::from_secs(1)));
        assert!(simulation.live_units().len() <= 2);
    }
    assert_eq!(
        count(&events, |event| matches!(event, Event::WaveBegan { .. })),
        1
    );
    assert_eq!(simulation.admission().alive(), 2);
    assert_eq!(simulation.admission().admitted(), 2);

    let unit = simulation.live_units()[0];
    let _ = simulation.report_death(unit);
    let resumed = spawned(&simulation.advance(Duration::from_secs(1)));
    assert_eq!(resumed.len(), 1);
    assert_eq!(simulation.live_units().len(), 2);
}

#[test]
fn wave_drained_while_disabled_ends_on_enable() {
    let curve = FixedCurve {
        concurrent: 2,
        total: 2,
        interval: Duration::from_secs(1),
    };
    let mut simulation = Simulation::new(config(Duration::from_secs(1)), curve);
    for _ in 0..3 {
        let _ = simulation.advance(Duration::from_secs(1));
    }
    assert!(simulation.admission().total_exhausted());

    simulation.on_disable();
    for unit in simulation.live_units() {
        assert_eq!(
            simulation.report_death(unit),
            vec![Event::UnitDied { unit }],
            "a suspended wave does not end"
        );
    }
    assert_eq!(simulation.wave(), WaveIndex::FIRST);

    assert_eq!(
        simulation.on_enable(),
        vec![Event::WaveEnded {
            wave: WaveIndex::FIRST
        }]
    );
    assert_eq!(simulation.wave(), WaveIndex::new(2));
    assert!(matches!(simulation.rounds_phase(), Phase::Transitioning { .. }));
}

#[test]
fn wave_with_empty_budget_ends_as_it_begins() {
    let curve = FixedCurve {
        concurrent: 2,
        total: 0,
        interval: Duration::from_secs(1),
    };
    let mut simulation = Simulation::new(config(Duration::from_secs(1)), curve);

    let first = simulation.advance(Duration::from_secs(1));
    assert_eq!(
        &first[1..],
        &[
            Event::WaveBegan {
                wave: WaveIndex::FIRST
            },
            Event::WaveEnded {
                wave: WaveIndex::FIRST
            },
        ]
    );

    let mut events = Vec::new();
    for _ in 0..4 {
        events.extend(simulation.advance(Duration::from_secs(1)));
    }
    assert!(spawned(&events).is_empty());
    assert_eq!(
        count(&events, |event| matches!(event, Event::WaveEnded { .. })),
        4
    );
    assert_eq!(simulation.wave(), WaveIndex::new(6));
}

#[test]
fn invalid_pool_configuration_leaves_simulation_inert() {
    let mut simulation = Simulation::new(
        config(Duration::ZERO).with_pool_capacity(0, 4),
        small_curve(),
    );
    assert!(query::is_inert(simulation.world()));

    let mut events = Vec::new();
    for _ in 0..10 {
        events.extend(simulation.advance(Duration::from_secs(1)));
    }

    assert!(spawned(&events).is_empty());
    assert_eq!(simulation.admission().admitted(), 0);
}

#[test]
fn pool_instances_are_reused_across_waves() {
    let curve = FixedCurve {
        concurrent: 2,
        total: 6,
        interval: Duration::from_millis(500),
    };
    let mut simulation = Simulation::new(
        config(Duration::from_millis(100)).with_pool_capacity(2, 4),
        curve,
    );

    let mut waves_ended = 0;
    for _ in 0..400 {
        let events = simulation.advance(Duration::from_millis(100));
        for unit in spawned(&events) {
            let died = simulation.report_death(unit);
            waves_ended += count(&died, |event| matches!(event, Event::WaveEnded { .. }));
        }
    }

    assert!(waves_ended >= 3, "only {waves_ended} waves ended");
    let stats = query::pool_stats(simulation.world()).expect("pool configured");
    assert_eq!(stats.created, 2, "no growth beyond the prewarmed instances");
    assert_eq!(stats.acquired, stats.released);
}

#[test]
fn deterministic_replay_produces_identical_sequence() {
    let first = replay();
    let second = replay();

    assert_eq!(first, second, "replay diverged between runs");
    assert!(first.contains(&Event::WaveEnded {
        wave: WaveIndex::FIRST
    }));
}

fn replay() -> Vec<Event> {
    let config = SimulationConfig::new(2)
        .with_transition(Duration::from_secs(2))
        .with_seed(0x4d59_5df4_d0f3_3173)
        .with_spawn_points(vec![
            SpawnPoint::at(Vec3::new(0.0, 0.0, 10.0)),
            SpawnPoint::at(Vec3::new(10.0, 0.0, 0.0)),
            SpawnPoint::at(Vec3::new(-10.0, 0.0, 0.0)),
        ]);
    let mut simulation = Simulation::new(config, WaveCurve::default());
    let mut log = Vec::new();

    for step in 0..400 {
        log.extend(simulation.advance(Duration::from_millis(100)));
        if step % 7 == 0 {
            if let Some(unit) = simulation.live_units().first().copied() {
                log.extend(simulation.report_death(unit));
            }
        }
    }

    log
}
