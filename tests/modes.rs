//! Global modes, the Friday schedule and the observer unlock

use chaos_office::detectors::regular_pentagon;
use chaos_office::{
    AgentState, Archetype, FileUnlockStore, FixedClock, MemoryUnlockStore, SimEvent, UnlockStore, Vec2, World,
};

const DT: f32 = 1.0 / 60.0;

fn wednesday() -> FixedClock {
    FixedClock::at(2024, 3, 13, 10, 30).unwrap()
}

fn run(world: &mut World, ticks: usize) {
    for _ in 0..ticks {
        world.update(DT);
    }
}

/// Five Gossips parked on the corners of a pentagon, reading their phones
fn park_pentagon(world: &mut World, center: Vec2) {
    for corner in regular_pentagon(center, 120.0, 0.4) {
        let id = world.spawn_agent(Archetype::Gossip, corner);
        let agent = world.agent_mut(id).unwrap();
        agent.state = AgentState::ReadingPhone;
        agent.state_timer = 1000.0;
    }
}

// ============================================================================
// Friday / Monday
// ============================================================================

#[test]
fn test_friday_round_trip_restores_speed_and_population() {
    let mut world = World::builder().seed(10).clock(wednesday()).build().unwrap();
    run(&mut world, 30);
    let speed = world.global_speed();
    let wanderers = world.agents().count_of(Archetype::Wanderer);
    let total = world.agents().len();

    world.set_friday(true);
    assert!(world.flags().friday);
    assert_eq!(world.agents().count_of(Archetype::Wanderer), wanderers * 3);
    run(&mut world, 120);

    world.set_friday(false);
    assert!((world.global_speed() - speed).abs() < 1e-5);
    assert_eq!(world.agents().count_of(Archetype::Wanderer), wanderers);
    assert_eq!(world.agents().len(), total);
}

#[test]
fn test_friday_round_trip_survives_an_evacuation() {
    let mut world = World::builder().empty().seed(17).clock(wednesday()).build().unwrap();
    world.spawn_agent(Archetype::Wanderer, Vec2::new(400.0, 400.0));
    world.set_friday(true);
    assert_eq!(world.agents().count_of(Archetype::Wanderer), 3);

    world.fire_alarm();
    // Alarm rings, evacuees wait out their delay and walk back in
    run(&mut world, 25 * 60);
    assert!(!world.flags().alarm_active);
    assert_eq!(world.agents().count_of(Archetype::Wanderer), 3);
    assert_eq!(world.friday_extra_count(), 2);

    world.set_friday(false);
    assert_eq!(world.agents().count_of(Archetype::Wanderer), 1);
    assert_eq!(world.friday_extra_count(), 0);
}

#[test]
fn test_modes_stack_multiplicatively() {
    let mut world = World::builder().empty().seed(11).clock(wednesday()).build().unwrap();
    world.set_friday(true);
    world.set_monday(true);
    assert!((world.global_speed() - 0.5 * 0.3).abs() < 1e-6);
    world.set_friday(false);
    world.set_monday(false);
    assert!((world.global_speed() - 1.0).abs() < 1e-5);
}

#[test]
fn test_friday_1701_fires_from_clock_once_per_day() {
    let mut world = World::builder()
        .empty()
        .seed(12)
        .clock(FixedClock::at(2024, 3, 15, 17, 1).unwrap())
        .build()
        .unwrap();
    world.spawn_agent(Archetype::Wanderer, Vec2::new(400.0, 400.0));
    world.drain_events();

    run(&mut world, 10);
    assert!(world.flags().friday);
    let toasts = world
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, SimEvent::Toast { text } if text.contains("17:01")))
        .count();
    assert_eq!(toasts, 1);
    let speed = world.global_speed();
    assert!((speed - 0.5 * 0.7).abs() < 1e-6);

    run(&mut world, 120);
    assert_eq!(world.global_speed(), speed);

    world.set_friday(false);
    assert!((world.global_speed() - 1.0).abs() < 1e-5);
    assert_eq!(world.agents().count_of(Archetype::Wanderer), 1);
}

// ============================================================================
// Observer unlock
// ============================================================================

#[test]
fn test_pentagon_unlocks_observer_exactly_once() {
    let mut world = World::builder().empty().seed(13).clock(wednesday()).build().unwrap();
    park_pentagon(&mut world, Vec2::new(400.0, 300.0));
    world.drain_events();

    run(&mut world, 60);
    assert!(world.flags().observer_unlocked);
    assert!(world.flags().palette_shift);

    // A second, separate formation changes nothing
    park_pentagon(&mut world, Vec2::new(1200.0, 600.0));
    run(&mut world, 120);

    let unlocks = world
        .drain_events()
        .into_iter()
        .filter(|e| *e == SimEvent::ObserverUnlocked)
        .count();
    assert_eq!(unlocks, 1);
    assert_eq!(world.agents().count_of(Archetype::Observer), 1);
}

#[test]
fn test_observer_fades_in_and_patrols() {
    let mut world = World::builder()
        .empty()
        .seed(14)
        .clock(wednesday())
        .unlock_store(MemoryUnlockStore::new(true))
        .build()
        .unwrap();
    assert!(world.flags().observer_unlocked);
    assert!(!world.flags().palette_shift);

    run(&mut world, 240);
    let observer = world
        .agents()
        .iter()
        .find(|a| a.archetype() == Archetype::Observer)
        .unwrap();
    assert_eq!(observer.state, AgentState::PerimeterPatrol);
    assert!(observer.alpha > 0.0 && observer.alpha <= world.config().observer_max_alpha);
}

#[test]
fn test_unlock_persists_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("unlock.json");

    let mut first = World::builder()
        .empty()
        .seed(15)
        .clock(wednesday())
        .unlock_store(FileUnlockStore::new(&path))
        .build()
        .unwrap();
    assert_eq!(first.agents().count_of(Archetype::Observer), 0);
    park_pentagon(&mut first, Vec2::new(800.0, 450.0));
    run(&mut first, 60);
    assert!(first.flags().observer_unlocked);
    assert!(FileUnlockStore::new(&path).load());

    let second = World::builder()
        .empty()
        .seed(16)
        .clock(wednesday())
        .unlock_store(FileUnlockStore::new(&path))
        .build()
        .unwrap();
    assert!(second.flags().observer_unlocked);
    assert_eq!(second.agents().count_of(Archetype::Observer), 1);
}
