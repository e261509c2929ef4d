//! Fire-alarm evacuation shared by every archetype except the Observer

use crate::core::types::Vec2;
use crate::entity::agent::{Agent, AgentState};
use crate::spatial::steering;

use super::BehaviorContext;

const EXIT_WEIGHT: f32 = 0.8;
const COHESION_WEIGHT: f32 = 0.2;

pub fn update(agent: &mut Agent, _dt: f32, ctx: &mut BehaviorContext<'_>) {
    let cfg = ctx.config;
    let speed = ctx.base_speed() * cfg.alarm_speed_mult;
    let to_exit = steering::seek(agent.pos, agent.panic_target, speed);

    let mut sum = Vec2::ZERO;
    let mut count = 0u32;
    for p in ctx.index.query(agent.pos, cfg.panic_cohesion_radius) {
        let panicking = ctx
            .others
            .get(p.id)
            .map(|o| o.state == AgentState::Panicking)
            .unwrap_or(false);
        if panicking {
            sum += p.pos;
            count += 1;
        }
    }

    agent.vel = if count > 0 {
        let herd = steering::seek(agent.pos, sum / count as f32, speed * 0.4);
        to_exit * EXIT_WEIGHT + herd * COHESION_WEIGHT
    } else {
        to_exit
    };

    if agent.pos.distance(&agent.panic_target) < cfg.exit_reach_radius {
        agent.state = AgentState::Escaped;
        agent.stop();
        agent.alpha = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use crate::behavior::test_support::Harness;
    use crate::core::types::Vec2;
    use crate::entity::agent::{AgentState, Archetype};

    #[test]
    fn test_runs_for_exit_and_escapes() {
        let mut h = Harness::new();
        let id = h.spawn(Archetype::Wanderer, Vec2::new(200.0, 450.0));
        let exit = h.layout.nearest_exit(Vec2::new(200.0, 450.0));
        {
            let a = h.agent_mut(id);
            a.state = AgentState::Panicking;
            a.panic_target = exit;
        }
        h.step(id, 0.05);
        assert!(h.agent(id).vel.x < 0.0);

        for _ in 0..200 {
            h.step(id, 0.05);
            if h.agent(id).state == AgentState::Escaped {
                break;
            }
        }
        let a = h.agent(id);
        assert_eq!(a.state, AgentState::Escaped);
        assert_eq!(a.vel, Vec2::ZERO);
        assert_eq!(a.alpha, 0.0);
    }

    #[test]
    fn test_cohesion_only_counts_panicking_neighbours() {
        let mut h = Harness::new();
        let exit = Vec2::new(20.0, 450.0);
        let id = h.spawn(Archetype::Grinder, Vec2::new(400.0, 450.0));
        let calm = h.spawn(Archetype::Wanderer, Vec2::new(400.0, 490.0));
        {
            let a = h.agent_mut(id);
            a.state = AgentState::Panicking;
            a.panic_target = exit;
        }
        h.step(id, 0.05);
        assert!(h.agent(id).vel.y.abs() < 1e-4);

        h.agent_mut(calm).state = AgentState::Panicking;
        h.step(id, 0.05);
        assert!(h.agent(id).vel.y > 0.0);
    }
}
