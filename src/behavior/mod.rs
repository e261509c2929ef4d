//! Agent behavior engine
//!
//! Every agent runs through the same entry point: a shared override layer
//! (disturbance-driven states any archetype can be pushed into) checked in
//! priority order, then an exhaustive dispatch on the agent's role.
//!
//! Each override knows how to expire, and expiry always goes through
//! [`Agent::revert_to_default`] so control returns to a state legal for the
//! archetype.

pub mod chaos;
pub mod context;
pub mod gossip;
pub mod grinder;
pub mod intern;
pub mod manager;
pub mod observer;
pub mod panic;
pub mod wanderer;

pub use context::BehaviorContext;

use crate::entity::agent::{Agent, AgentState, Archetype};
use crate::spatial::steering;

/// Heading noise spread while dazed after an alarm or meeting
const DAZED_SPREAD: f32 = 2.0;
/// Heading noise spread while strolling off a pizza
const FULL_SPREAD: f32 = 1.5;

/// Advance one agent by `dt` (already capped by the caller)
pub fn update_agent(agent: &mut Agent, dt: f32, ctx: &mut BehaviorContext<'_>) {
    if run_override(agent, dt, ctx) {
        return;
    }

    match agent.archetype() {
        Archetype::Grinder => grinder::update(agent, dt, ctx),
        Archetype::Wanderer => wanderer::update(agent, dt, ctx),
        Archetype::Gossip => gossip::update(agent, dt, ctx),
        Archetype::Manager => manager::update(agent, dt, ctx),
        Archetype::Intern => intern::update(agent, dt, ctx),
        Archetype::ChaosAgent => chaos::update(agent, dt, ctx),
        Archetype::Observer => observer::update(agent, dt, ctx),
    }
}

/// Returns true when an override state consumed the update
fn run_override(agent: &mut Agent, dt: f32, ctx: &mut BehaviorContext<'_>) -> bool {
    let cfg = ctx.config;

    match agent.state {
        AgentState::GridOverride => {
            agent.grid_timer -= dt;
            if agent.grid_timer <= 0.0 {
                agent.revert_to_default();
            } else {
                agent.vel = steering::seek(agent.pos, agent.grid_target, ctx.base_speed() * 0.6);
            }
        }
        AgentState::Panicking if !agent.is_observer() => panic::update(agent, dt, ctx),
        AgentState::Escaped => agent.stop(),
        AgentState::PostAlarm => {
            agent.state_timer -= dt;
            if agent.state_timer <= 0.0 {
                agent.revert_to_default();
            }
            // Dazed evacuees ignore global mode slowdowns
            agent.vel = steering::drift(&mut agent.heading, cfg.base_speed * 0.3, DAZED_SPREAD, dt, &mut *ctx.rng);
        }
        AgentState::Eating => {
            agent.eat_timer -= dt;
            agent.stop();
            if agent.eat_timer <= 0.0 {
                agent.state = AgentState::PostPizza;
                agent.state_timer = cfg.post_pizza_duration;
            }
        }
        AgentState::PostPizza => {
            agent.state_timer -= dt;
            agent.vel = steering::drift(&mut agent.heading, ctx.base_speed() * 0.4, FULL_SPREAD, dt, &mut *ctx.rng);
            if agent.state_timer <= 0.0 {
                agent.revert_to_default();
            }
        }
        AgentState::InMeeting => {
            agent.stop();
            agent.state_timer -= dt;
            if ctx.env.meeting.is_none() {
                agent.state = AgentState::PostMeeting;
                agent.state_timer = cfg.post_meeting_duration;
            }
        }
        AgentState::PostMeeting => {
            agent.state_timer -= dt;
            if agent.state_timer <= 0.0 {
                agent.revert_to_default();
            }
            agent.vel = steering::drift(&mut agent.heading, ctx.base_speed() * 0.3, DAZED_SPREAD, dt, &mut *ctx.rng);
        }
        AgentState::ReadingPhone => {
            agent.stop();
            agent.state_timer -= dt;
            if agent.state_timer <= 0.0 {
                agent.revert_to_default();
            }
        }
        AgentState::PowerNap => {
            agent.stop();
            agent.state_timer -= dt;
            if agent.state_timer <= 0.0 {
                // Grinders keep their desk and sit straight back down
                if agent.archetype() != Archetype::Grinder {
                    ctx.desks.release(agent.id);
                }
                agent.revert_to_default();
            }
        }
        _ => return false,
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::test_support::Harness;
    use crate::core::types::Vec2;

    #[test]
    fn test_every_override_reverts_to_legal_state() {
        for archetype in Archetype::ALL {
            if archetype == Archetype::Observer {
                continue;
            }
            for state in AgentState::OVERRIDES {
                if matches!(state, AgentState::Escaped | AgentState::Panicking | AgentState::InMeeting) {
                    continue;
                }
                let mut h = Harness::new();
                let id = h.spawn(archetype, Vec2::new(400.0, 200.0));
                {
                    let a = h.agent_mut(id);
                    a.state = state;
                    a.state_timer = 0.01;
                    a.eat_timer = 0.01;
                    a.grid_timer = 0.01;
                }
                for _ in 0..300 {
                    h.step(id, 0.05);
                }
                let a = h.agent(id);
                assert!(
                    a.state.is_legal_for(archetype),
                    "{archetype} stuck in {:?} after {:?}",
                    a.state,
                    state
                );
                assert!(!a.state.is_override(), "{archetype} left in override {:?}", a.state);
            }
        }
    }

    #[test]
    fn test_panic_ends_in_post_alarm_then_default_routine() {
        use crate::core::config::SimulationConfig;
        use crate::world::World;

        let dt = 1.0 / 60.0;
        let mut config = SimulationConfig::default();
        // No emergent-order grid in the way of the default routine
        config.chaos_order_threshold = 0.0;
        for archetype in Archetype::ALL {
            if archetype == Archetype::Observer {
                continue;
            }
            let mut w = World::builder().config(config.clone()).empty().seed(9).build().unwrap();
            w.spawn_agent(archetype, Vec2::new(120.0, 450.0));
            w.spawn_agent(archetype, Vec2::new(800.0, 450.0));
            w.fire_alarm();

            while w.flags().alarm_active {
                w.update(dt);
            }
            for a in w.agents().iter() {
                assert_eq!(a.state, AgentState::PostAlarm, "{archetype} straggler");
            }

            // Respawn delay, then the post-alarm daze
            let settle = 4.0 + w.config().post_alarm_duration + 1.0;
            for _ in 0..(settle / dt) as usize {
                w.update(dt);
            }
            assert_eq!(w.agents().len(), 2);
            for a in w.agents().iter() {
                assert!(a.state.is_legal_for(archetype), "{archetype} in {:?}", a.state);
                assert!(!a.state.is_override(), "{archetype} left in {:?}", a.state);
            }
        }
    }

    #[test]
    fn test_eating_counts_down_then_strolls() {
        let mut h = Harness::new();
        let id = h.spawn(Archetype::Wanderer, Vec2::new(300.0, 300.0));
        {
            let a = h.agent_mut(id);
            a.state = AgentState::Eating;
            a.eat_timer = 0.1;
            a.vel = Vec2::new(10.0, 0.0);
        }
        h.step(id, 0.05);
        assert_eq!(h.agent(id).state, AgentState::Eating);
        assert_eq!(h.agent(id).vel, Vec2::ZERO);
        h.step(id, 0.05);
        h.step(id, 0.05);
        assert_eq!(h.agent(id).state, AgentState::PostPizza);
    }

    #[test]
    fn test_power_nap_releases_borrowed_desk() {
        let mut h = Harness::new();
        let id = h.spawn(Archetype::Wanderer, Vec2::new(300.0, 300.0));
        let desk = h.desks.iter().next().map(|d| d.id).unwrap();
        assert!(h.desks.claim(id, desk));
        {
            let a = h.agent_mut(id);
            a.state = AgentState::PowerNap;
            a.state_timer = 0.02;
        }
        h.step(id, 0.05);
        assert_eq!(h.agent(id).state, AgentState::Wandering);
        assert_eq!(h.desks.claimed_by(id), None);
    }

    #[test]
    fn test_grinder_keeps_desk_after_nap() {
        let mut h = Harness::new();
        let id = h.spawn(Archetype::Grinder, Vec2::new(300.0, 300.0));
        let desk = h.desks.iter().next().map(|d| d.id).unwrap();
        h.desks.claim(id, desk);
        {
            let a = h.agent_mut(id);
            a.set_desk_target(Some(desk));
            a.state = AgentState::PowerNap;
            a.state_timer = 0.02;
        }
        h.step(id, 0.05);
        assert_eq!(h.agent(id).state, AgentState::SeekingDesk);
        assert_eq!(h.desks.claimed_by(id), Some(desk));
    }

    #[test]
    fn test_meeting_without_room_falls_back() {
        let mut h = Harness::new();
        let id = h.spawn(Archetype::Gossip, Vec2::new(300.0, 300.0));
        h.agent_mut(id).state = AgentState::InMeeting;
        h.step(id, 0.05);
        assert_eq!(h.agent(id).state, AgentState::PostMeeting);
    }
}

/// Minimal world stand-in for driving single behaviors in unit tests
#[cfg(test)]
pub(crate) mod test_support {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::{update_agent, BehaviorContext};
    use crate::core::config::SimulationConfig;
    use crate::core::types::{AgentId, Vec2};
    use crate::entity::agent::{Agent, Archetype};
    use crate::entity::store::AgentStore;
    use crate::spatial::index::SpatialIndex;
    use crate::world::desks::DeskTable;
    use crate::world::environment::{Environment, ModeFlags};
    use crate::world::events::EventLog;
    use crate::world::office::OfficeLayout;

    pub struct Harness {
        pub config: SimulationConfig,
        pub layout: OfficeLayout,
        pub env: Environment,
        pub desks: DeskTable,
        pub index: SpatialIndex,
        pub agents: AgentStore,
        pub flags: ModeFlags,
        pub global_speed: f32,
        pub now: f64,
        pub rng: ChaCha8Rng,
        pub chaos_switches: u32,
        pub events: EventLog,
        pub arrivals: Vec<AgentId>,
    }

    impl Harness {
        pub fn new() -> Self {
            let config = SimulationConfig::default();
            let layout = OfficeLayout::new(&config);
            let desks = DeskTable::new(&layout.desk_rects);
            let env = Environment::new(layout.coffee_machine);
            let index = SpatialIndex::new(&config);
            Self {
                config,
                layout,
                env,
                desks,
                index,
                agents: AgentStore::new(),
                flags: ModeFlags::default(),
                global_speed: 1.0,
                now: 0.0,
                rng: ChaCha8Rng::seed_from_u64(42),
                chaos_switches: 0,
                events: EventLog::new(),
                arrivals: Vec::new(),
            }
        }

        pub fn spawn(&mut self, archetype: Archetype, pos: Vec2) -> AgentId {
            let id = self.agents.allocate_id();
            let agent = Agent::new(id, archetype, pos, format!("{archetype}{}", id.0), &self.config, &mut self.rng);
            self.agents.insert(agent);
            id
        }

        pub fn agent(&self, id: AgentId) -> &Agent {
            self.agents.get(id).expect("agent exists")
        }

        pub fn agent_mut(&mut self, id: AgentId) -> &mut Agent {
            self.agents.get_mut(id).expect("agent exists")
        }

        pub fn reindex(&mut self) {
            self.index.rebuild(
                self.agents
                    .iter()
                    .filter(|a| !a.is_escaped())
                    .map(|a| (a.id, a.pos)),
            );
        }

        /// Rebuild the index, run one agent's behavior, then integrate its position
        pub fn step(&mut self, id: AgentId, dt: f32) {
            self.reindex();
            let idx = self.agents.ids().iter().position(|&a| a == id).expect("agent exists");
            let (agent, others) = self.agents.split_for_update(idx).expect("index in range");
            let mut ctx = BehaviorContext {
                config: &self.config,
                layout: &self.layout,
                env: &self.env,
                desks: &mut self.desks,
                index: &self.index,
                others,
                flags: self.flags,
                global_speed: self.global_speed,
                now: self.now,
                rng: &mut self.rng,
                chaos_switches: &mut self.chaos_switches,
                events: &mut self.events,
                meeting_arrivals: &mut self.arrivals,
            };
            update_agent(agent, dt, &mut ctx);
            if !agent.state.is_stationary() {
                agent.pos = self.layout.clamp(agent.pos + agent.vel * dt, self.config.wall_margin);
            }
            self.now += dt as f64;
        }
    }
}
