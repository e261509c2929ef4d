//! The office world: owns every agent, desk and disturbance and runs the tick
//!
//! Hosts drive it with [`World::update`], issue disturbance commands, read a
//! [`WorldSnapshot`] and drain [`SimEvent`]s afterwards. Nothing in here
//! calls back into the host.

pub mod chat;
pub mod clock;
pub mod command;
pub mod desks;
pub mod disturbances;
pub mod environment;
pub mod events;
pub mod metrics;
pub mod office;
pub mod persistence;
pub mod snapshot;
pub mod tick;

pub use chat::ChatFeed;
pub use clock::{FixedClock, SystemClock, WallClock, WallTime};
pub use command::Command;
pub use desks::{Desk, DeskTable};
pub use environment::{Environment, ModeFlags};
pub use events::{EventLog, LogEntry, LogKind, ParticleKind, SimEvent};
pub use metrics::{ChaosMetrics, MetricReadings};
pub use office::OfficeLayout;
pub use persistence::{FileUnlockStore, MemoryUnlockStore, UnlockStore};
pub use snapshot::WorldSnapshot;

use ahash::AHashSet;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::core::config::SimulationConfig;
use crate::core::error::Result;
use crate::core::types::{AgentId, Vec2};
use crate::detectors::Detectors;
use crate::entity::agent::{Agent, AgentState, Archetype};
use crate::entity::names;
use crate::entity::store::AgentStore;
use crate::spatial::index::SpatialIndex;

/// Evacuee waiting to walk back in
#[derive(Debug, Clone, Copy)]
pub(crate) struct PendingRespawn {
    pub archetype: Archetype,
    pub pos: Vec2,
    pub delay: f32,
    /// Came from the Friday extras; rejoins them or stays home if Friday ended
    pub friday_extra: bool,
}

/// Frames counted over each second of real time
#[derive(Debug, Clone)]
pub(crate) struct FrameRate {
    pub fps: f32,
    frames: u32,
    timer: f32,
    /// Set once the host reports its own measurement
    external: bool,
}

impl FrameRate {
    fn new() -> Self {
        Self {
            fps: 60.0,
            frames: 0,
            timer: 0.0,
            external: false,
        }
    }

    pub fn count(&mut self, real_dt: f32) {
        if self.external {
            return;
        }
        self.frames += 1;
        self.timer += real_dt;
        if self.timer >= 1.0 {
            self.fps = self.frames as f32;
            self.frames = 0;
            self.timer -= 1.0;
        }
    }
}

/// Simulation state and the systems that advance it
pub struct World {
    pub(crate) config: SimulationConfig,
    pub(crate) layout: OfficeLayout,
    pub(crate) agents: AgentStore,
    pub(crate) desks: DeskTable,
    pub(crate) env: Environment,
    pub(crate) index: SpatialIndex,
    pub(crate) flags: ModeFlags,
    /// Product of every active mode multiplier
    pub(crate) global_speed: f32,
    /// Wanderers spawned by Friday mode, removed when it ends
    pub(crate) friday_extras: AHashSet<AgentId>,
    pub(crate) friday_1701_applied: bool,
    pub(crate) alarm_timer: f32,
    pub(crate) respawn_queue: Vec<PendingRespawn>,
    pub(crate) nap_particle_timer: f32,
    pub(crate) metrics: ChaosMetrics,
    pub(crate) detectors: Detectors,
    pub(crate) chat: ChatFeed,
    pub(crate) events: EventLog,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) clock: Box<dyn WallClock>,
    pub(crate) unlock_store: Box<dyn UnlockStore>,
    pub(crate) sim_time: f64,
    pub(crate) tick_count: u64,
    /// Chaos-agent mode switches since the last metric sample
    pub(crate) chaos_switches: u32,
    pub(crate) frame_rate: FrameRate,
}

/// Builder for [`World`]
pub struct WorldBuilder {
    config: SimulationConfig,
    seed: Option<u64>,
    unlock_store: Option<Box<dyn UnlockStore>>,
    clock: Option<Box<dyn WallClock>>,
    populate: bool,
}

impl Default for WorldBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldBuilder {
    pub fn new() -> Self {
        Self {
            config: SimulationConfig::default(),
            seed: None,
            unlock_store: None,
            clock: None,
            populate: true,
        }
    }

    pub fn config(mut self, config: SimulationConfig) -> Self {
        self.config = config;
        self
    }

    /// Reproducible runs; without a seed the RNG is seeded from entropy
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn unlock_store(mut self, store: impl UnlockStore + 'static) -> Self {
        self.unlock_store = Some(Box::new(store));
        self
    }

    pub fn clock(mut self, clock: impl WallClock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    /// Skip the starting population
    pub fn empty(mut self) -> Self {
        self.populate = false;
        self
    }

    pub fn build(self) -> Result<World> {
        self.config.validate()?;

        let config = self.config;
        let layout = OfficeLayout::new(&config);
        let desks = DeskTable::new(&layout.desk_rects);
        let env = Environment::new(layout.coffee_machine);
        let index = SpatialIndex::new(&config);
        let rng = match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let unlock_store = self
            .unlock_store
            .unwrap_or_else(|| Box::new(MemoryUnlockStore::default()));
        let clock = self.clock.unwrap_or_else(|| Box::new(SystemClock));

        let mut world = World {
            metrics: ChaosMetrics::new(config.chaos_metric_window),
            detectors: Detectors::new(),
            chat: ChatFeed::new(&config),
            events: EventLog::new(),
            config,
            layout,
            agents: AgentStore::new(),
            desks,
            env,
            index,
            flags: ModeFlags::default(),
            global_speed: 1.0,
            friday_extras: AHashSet::new(),
            friday_1701_applied: false,
            alarm_timer: 0.0,
            respawn_queue: Vec::new(),
            nap_particle_timer: 0.0,
            rng,
            clock,
            unlock_store,
            sim_time: 0.0,
            tick_count: 0,
            chaos_switches: 0,
            frame_rate: FrameRate::new(),
        };
        world.events.set_stamp(world.clock.now().stamp());

        if self.populate {
            world.spawn_initial_population();
        }
        if world.unlock_store.load() {
            world.flags.observer_unlocked = true;
            world.spawn_observer();
        }

        tracing::info!(
            agents = world.agents.len(),
            desks = world.desks.len(),
            observer = world.flags.observer_unlocked,
            "office opened"
        );
        world.events.log(LogKind::Good, "Chaos Office is open for business!");
        Ok(world)
    }
}

impl World {
    pub fn builder() -> WorldBuilder {
        WorldBuilder::new()
    }

    /// Default office with the default population
    pub fn new(config: SimulationConfig) -> Result<Self> {
        WorldBuilder::new().config(config).build()
    }

    /// Advance the simulation; `dt` is real seconds since the last frame
    pub fn update(&mut self, dt: f32) {
        tick::run_tick(self, dt);
    }

    /// Override the internally measured frame rate with the host's own
    pub fn report_frame_rate(&mut self, fps: f32) {
        self.frame_rate.external = true;
        self.frame_rate.fps = fps;
    }

    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.events.drain()
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot::capture(self)
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn layout(&self) -> &OfficeLayout {
        &self.layout
    }

    pub fn agents(&self) -> &AgentStore {
        &self.agents
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id)
    }

    /// Direct access for hosts that script agents (tests, demos)
    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(id)
    }

    pub fn desks(&self) -> &DeskTable {
        &self.desks
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn metrics(&self) -> MetricReadings {
        self.metrics.readings()
    }

    pub fn flags(&self) -> ModeFlags {
        self.flags
    }

    pub fn global_speed(&self) -> f32 {
        self.global_speed
    }

    pub fn fps(&self) -> f32 {
        self.frame_rate.fps
    }

    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Newest first
    pub fn log_history(&self) -> impl Iterator<Item = &LogEntry> {
        self.events.history()
    }

    pub fn friday_extra_count(&self) -> usize {
        self.friday_extras.len()
    }

    /// Agents still inside the office
    pub fn active_count(&self) -> usize {
        self.agents.iter().filter(|a| !a.is_escaped()).count()
    }

    fn spawn_initial_population(&mut self) {
        let pop = self.config.population;
        let margin = self.config.spawn_margin;
        let counts = [
            (Archetype::Grinder, pop.grinders),
            (Archetype::Wanderer, pop.wanderers),
            (Archetype::Gossip, pop.gossips),
            (Archetype::Manager, pop.managers),
            (Archetype::Intern, pop.interns),
            (Archetype::ChaosAgent, pop.chaos_agents),
        ];
        for (archetype, count) in counts {
            for _ in 0..count {
                let pos = self.layout.random_interior_position(margin, &mut self.rng);
                self.insert_agent(archetype, pos);
            }
        }
    }

    /// Create, register and (for Grinders) seat-reserve a new agent
    pub(crate) fn insert_agent(&mut self, archetype: Archetype, pos: Vec2) -> AgentId {
        let id = self.agents.allocate_id();
        let name = names::random_name(&mut self.rng);
        let mut agent = Agent::new(id, archetype, pos, name, &self.config, &mut self.rng);

        if archetype == Archetype::Grinder {
            let desk = self.desks.nearest_free(pos, Some(id)).map(|d| d.id);
            if let Some(desk) = desk {
                if self.desks.claim(id, desk) {
                    agent.set_desk_target(Some(desk));
                }
            }
        }

        tracing::trace!(id = id.0, %archetype, "agent spawned");
        self.agents.insert(agent);
        id
    }

    pub(crate) fn spawn_observer(&mut self) -> AgentId {
        let pos = self.layout.random_edge_position(&mut self.rng);
        let id = self.insert_agent(Archetype::Observer, pos);
        if let Some(obs) = self.agents.get_mut(id) {
            obs.state = AgentState::PerimeterPatrol;
            obs.alpha = 0.0;
        }
        id
    }

    /// Remove an agent and every reference other systems hold to it
    pub(crate) fn remove_agent(&mut self, id: AgentId) -> Option<Agent> {
        let agent = self.agents.remove(id)?;
        self.forget(id);
        Some(agent)
    }

    pub(crate) fn remove_agents_where(&mut self, pred: impl FnMut(&Agent) -> bool) -> Vec<Agent> {
        let removed = self.agents.remove_where(pred);
        for agent in &removed {
            self.forget(agent.id);
        }
        removed
    }

    fn forget(&mut self, id: AgentId) {
        self.desks.release(id);
        self.env.forget_agent(id);
        self.friday_extras.remove(&id);
    }

    /// Release a desk held by `id` and forget the Grinder's target
    pub(crate) fn unseat(&mut self, id: AgentId) {
        self.desks.release(id);
        if let Some(agent) = self.agents.get_mut(id) {
            agent.set_desk_target(None);
        }
    }
}
