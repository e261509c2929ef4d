//! Emergent-pattern detectors
//!
//! Run once per tick after the metric. Each detector rate-limits or latches
//! itself; this module only wires their verdicts to world effects.

pub mod order;
pub mod pentagon;
pub mod schedule;

pub use order::{grid_layout, OrderLatch};
pub use pentagon::{find_pentagon, is_pentagon, regular_pentagon, PentagonDetector};
pub use schedule::{is_friday_1701, ScheduleLatch};

use crate::core::types::{Rect, Vec2};
use crate::entity::agent::AgentState;
use crate::world::events::{LogKind, ParticleKind, SimEvent};
use crate::world::World;

/// Inset of the emergent-order grid from the world edges
const GRID_INSET: Vec2 = Vec2 { x: 100.0, y: 80.0 };

#[derive(Debug, Clone, Default)]
pub struct Detectors {
    pub pentagon: PentagonDetector,
    pub schedule: ScheduleLatch,
    pub order: OrderLatch,
}

impl Detectors {
    pub fn new() -> Self {
        Self::default()
    }
}

pub(crate) fn run_detectors(world: &mut World, dt: f32) {
    check_pentagon(world, dt);

    let now = world.clock.now();
    if world.detectors.schedule.check(&now) {
        tracing::info!(date = %now.date, "friday 17:01 reached");
        world.trigger_1701();
    }

    let chaos = world.metrics.chaos_index;
    let (threshold, hold) = (world.config.chaos_order_threshold, world.config.order_hold_duration);
    if world.detectors.order.update(chaos, threshold, hold, dt) {
        apply_emergent_order(world);
    }
}

fn check_pentagon(world: &mut World, dt: f32) {
    if world.flags.observer_unlocked {
        return;
    }
    if !world.detectors.pentagon.due(dt, world.config.pentagon_check_interval) {
        return;
    }
    let points: Vec<Vec2> = world
        .agents
        .iter()
        .filter(|a| !matches!(a.state, AgentState::Escaped | AgentState::Eating | AgentState::Panicking))
        .map(|a| a.pos)
        .collect();
    if find_pentagon(&points, &world.config).is_some() {
        unlock_observer(world);
    }
}

/// One-time unlock: persist, spawn the Observer, shift the palette
pub(crate) fn unlock_observer(world: &mut World) {
    if world.flags.observer_unlocked {
        return;
    }
    world.flags.observer_unlocked = true;
    if let Err(err) = world.unlock_store.save(true) {
        tracing::warn!(%err, "failed to persist observer unlock");
    }

    let id = world.spawn_observer();
    world.flags.palette_shift = true;
    world.events.emit(SimEvent::ObserverUnlocked);
    world.events.toast("The Observer has been unlocked.");
    world.events.emit(SimEvent::PaletteShift { active: true });
    world
        .events
        .log(LogKind::Chaos, "Observer unlocked via Codex Pentagon.");
    world
        .chat
        .announce(&mut world.events, "The Observer has been watching all along...");
    tracing::info!(observer = id.0, "observer unlocked");
}

/// Snap every active non-Observer into a grid for a while
fn apply_emergent_order(world: &mut World) {
    let bounds = Rect::new(
        GRID_INSET.x,
        GRID_INSET.y,
        world.layout.width - GRID_INSET.x * 2.0,
        world.layout.height - GRID_INSET.y * 2.0,
    );
    let duration = world.config.grid_override_duration;

    let ids: Vec<_> = world
        .agents
        .iter()
        .filter(|a| !a.is_observer() && !matches!(a.state, AgentState::Escaped | AgentState::Panicking))
        .map(|a| a.id)
        .collect();
    let targets = grid_layout(ids.len(), bounds);

    for (id, target) in ids.iter().zip(targets) {
        if let Some(agent) = world.agents.get_mut(*id) {
            agent.state = AgentState::GridOverride;
            agent.grid_target = target;
            agent.grid_timer = duration;
        }
    }

    world.events.toast("Emergent Order achieved.");
    world
        .events
        .log(LogKind::Good, "Emergent Order achieved. The office briefly makes sense.");
    world
        .events
        .particles(world.layout.center(), ParticleKind::Glow, 20);
    tracing::info!(agents = ids.len(), "emergent order");
}
