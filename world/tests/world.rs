use glam::{Quat, Vec3};
use holdout_core::{Command, ConfigurationError, Event, SpawnPoint, UnitId, WaveIndex};
use holdout_world::{self as world, query, Factory, PoolConfig, Unit, UnitFactory, World};

fn spawn_at(world: &mut World, point: SpawnPoint, wave: WaveIndex) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, Command::SpawnUnit { point, wave }, &mut events);
    events
}

fn report_death(world: &mut World, unit: UnitId) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, Command::ReportDeath { unit }, &mut events);
    events
}

fn spawned_id(events: &[Event]) -> UnitId {
    match events {
        [Event::UnitSpawned { unit, .. }] => *unit,
        other => panic!("expected a single UnitSpawned event, got {other:?}"),
    }
}

#[test]
fn spawn_registers_unit_at_resolved_point() {
    let mut world = World::new();
    let point = SpawnPoint::new(Vec3::new(4.0, 0.0, -2.0), Quat::from_rotation_y(1.0));
    let events = spawn_at(&mut world, point, WaveIndex::new(3));
    let id = spawned_id(&events);

    let snapshot = query::unit(&world, id).expect("spawned unit is registered");
    assert_eq!(snapshot.wave, WaveIndex::new(3));
    assert_eq!(snapshot.transform.position, point.position());
    assert_eq!(snapshot.transform.rotation, point.rotation());
    assert_eq!(snapshot.transform.scale, Vec3::ONE);
    assert_eq!(query::active_count(&world), 1);
}

#[test]
fn death_unregisters_before_releasing_and_forwards_signal() {
    let mut world = World::new();
    let id = spawned_id(&spawn_at(&mut world, SpawnPoint::at(Vec3::ZERO), WaveIndex::FIRST));
    let inactive_before = query::inactive_count(&world);

    let events = report_death(&mut world, id);

    assert_eq!(events, vec![Event::UnitDied { unit: id }]);
    assert!(query::unit(&world, id).is_none());
    assert_eq!(query::active_count(&world), 0);
    assert_eq!(query::inactive_count(&world), inactive_before + 1);
}

#[test]
fn duplicate_death_is_a_silent_miss() {
    let mut world = World::new();
    let id = spawned_id(&spawn_at(&mut world, SpawnPoint::at(Vec3::ZERO), WaveIndex::FIRST));
    let _ = report_death(&mut world, id);

    let events = report_death(&mut world, id);

    assert!(events.is_empty(), "stale deaths must not be forwarded");
    let stats = query::pool_stats(&world).expect("pool configured");
    assert_eq!(stats.released, 1);
}

#[test]
fn released_units_are_reused_without_growth() {
    let factory: Box<dyn Factory<Unit>> = Box::new(UnitFactory);
    let mut world = World::with_pool_config(
        PoolConfig::new(factory)
            .with_default_capacity(2)
            .with_max_capacity(4),
    );

    for _ in 0..10 {
        let id = spawned_id(&spawn_at(&mut world, SpawnPoint::at(Vec3::X), WaveIndex::FIRST));
        let _ = report_death(&mut world, id);
    }

    let stats = query::pool_stats(&world).expect("pool configured");
    assert_eq!(stats.created, 2);
    assert_eq!(stats.acquired, 10);
    assert_eq!(stats.destroyed, 0);
}

#[test]
fn unit_view_lists_live_units_in_identifier_order() {
    let mut world = World::new();
    let ids: Vec<UnitId> = (0..4)
        .map(|index| {
            let point = SpawnPoint::at(Vec3::new(index as f32, 0.0, 0.0));
            spawned_id(&spawn_at(&mut world, point, WaveIndex::FIRST))
        })
        .collect();
    let _ = report_death(&mut world, ids[1]);

    let live: Vec<UnitId> = query::unit_view(&world).iter().map(|unit| unit.id).collect();
    assert_eq!(live, vec![ids[0], ids[2], ids[3]]);
    assert_eq!(query::registry(&world).len(), 3);
}

#[test]
fn missing_factory_leaves_world_inert() {
    let mut world = World::with_pool_config(PoolConfig::without_factory());
    assert!(query::is_inert(&world));
    assert_eq!(
        query::configuration_error(&world),
        Some(&ConfigurationError::MissingFactory)
    );

    let events = spawn_at(&mut world, SpawnPoint::at(Vec3::ZERO), WaveIndex::FIRST);
    assert!(events.is_empty());
    assert!(query::registry(&world).is_empty());
}

#[test]
fn spawn_points_are_replaced_by_configuration() {
    let mut world = World::new();
    let mut events = Vec::new();
    let points = vec![SpawnPoint::at(Vec3::X), SpawnPoint::at(Vec3::Z)];
    world::apply(
        &mut world,
        Command::ConfigureSpawnPoints {
            points: points.clone(),
        },
        &mut events,
    );
    assert_eq!(query::spawn_points(&world), points.as_slice());
    assert!(events.is_empty());
}
