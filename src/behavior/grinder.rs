//! Grinder: claims a desk, walks to it, sits down and works

use crate::entity::agent::{Agent, AgentState};
use crate::spatial::steering;

use super::BehaviorContext;

pub fn update(agent: &mut Agent, dt: f32, ctx: &mut BehaviorContext<'_>) {
    let cfg = ctx.config;
    let speed = ctx.base_speed() * cfg.grinder_speed_mult * agent.speed_mult;

    match agent.state {
        AgentState::SeekingDesk => seek_desk(agent, dt, speed, ctx),
        AgentState::Seated => {
            agent.stop();
            let still_ours = agent
                .desk_target()
                .and_then(|id| ctx.desks.get(id))
                .map(|d| !d.broken && d.claimed_by == Some(agent.id))
                .unwrap_or(false);
            if !still_ours {
                agent.state = AgentState::Disturbed;
                agent.state_timer = cfg.grinder_disturbed_duration;
            }
        }
        AgentState::Disturbed => {
            agent.state_timer -= dt;
            let speed = ctx.base_speed() * 0.6;
            ctx.wander(agent, speed, dt);
            if agent.state_timer <= 0.0 {
                agent.state = AgentState::SeekingDesk;
                agent.set_desk_target(None);
            }
        }
        _ => {}
    }
}

fn seek_desk(agent: &mut Agent, dt: f32, speed: f32, ctx: &mut BehaviorContext<'_>) {
    if agent.desk_target().is_none() {
        let nearest = ctx.desks.nearest_free(agent.pos, Some(agent.id)).map(|d| d.id);
        match nearest {
            Some(id) if ctx.desks.claim(agent.id, id) => agent.set_desk_target(Some(id)),
            _ => {
                let idle = ctx.base_speed() * 0.3;
                ctx.wander(agent, idle, dt);
                return;
            }
        }
    }

    let Some(target) = agent.desk_target() else {
        return;
    };
    let Some(desk) = ctx.desks.get(target).filter(|d| !d.broken).cloned() else {
        agent.set_desk_target(None);
        ctx.desks.release(agent.id);
        return;
    };
    if desk.claimed_by != Some(agent.id) {
        // Stolen; try again next tick
        agent.set_desk_target(None);
        return;
    }

    let center = desk.center();
    if agent.pos.distance(&center) < ctx.config.desk_claim_radius {
        agent.state = AgentState::Seated;
        agent.pos = desk.seat_position();
        agent.stop();
        tracing::trace!(agent = %agent.name, desk = target.0, "grinder seated");
    } else {
        agent.vel = steering::seek(agent.pos, center, speed);
    }
}

#[cfg(test)]
mod tests {
    use crate::behavior::test_support::Harness;
    use crate::core::types::{AgentId, Vec2};
    use crate::entity::agent::{AgentState, Archetype};

    #[test]
    fn test_claims_nearest_desk_and_sits() {
        let mut h = Harness::new();
        let desk = h.desks.iter().next().map(|d| (d.id, d.center())).unwrap();
        let id = h.spawn(Archetype::Grinder, desk.1 + Vec2::new(0.0, -60.0));
        for _ in 0..200 {
            h.step(id, 0.05);
            if h.agent(id).state == AgentState::Seated {
                break;
            }
        }
        let a = h.agent(id);
        assert_eq!(a.state, AgentState::Seated);
        assert_eq!(a.desk_target(), Some(desk.0));
        assert_eq!(h.desks.claimed_by(id), Some(desk.0));
        assert_eq!(a.vel, Vec2::ZERO);
    }

    #[test]
    fn test_no_free_desk_wanders_slowly() {
        let mut h = Harness::new();
        let ids: Vec<_> = h.desks.iter().map(|d| d.id).collect();
        for (i, desk) in ids.iter().enumerate() {
            assert!(h.desks.claim(AgentId(1000 + i as u32), *desk));
        }
        let id = h.spawn(Archetype::Grinder, Vec2::new(300.0, 300.0));
        for _ in 0..50 {
            h.step(id, 0.05);
            let a = h.agent(id);
            assert_eq!(a.state, AgentState::SeekingDesk);
            let expected = h.config.base_speed * 0.3;
            assert!((a.vel.length() - expected).abs() < 1e-3);
        }
    }

    #[test]
    fn test_broken_desk_disturbs_seated_grinder() {
        let mut h = Harness::new();
        let desk = h.desks.iter().next().map(|d| d.id).unwrap();
        let id = h.spawn(Archetype::Grinder, Vec2::new(300.0, 300.0));
        h.desks.claim(id, desk);
        {
            let a = h.agent_mut(id);
            a.set_desk_target(Some(desk));
            a.state = AgentState::Seated;
        }
        h.desks.break_desk(desk);
        h.step(id, 0.05);
        assert_eq!(h.agent(id).state, AgentState::Disturbed);

        for _ in 0..100 {
            h.step(id, 0.05);
        }
        // Cooldown over, desk reference dropped, new desk claimed
        let a = h.agent(id);
        assert_ne!(a.desk_target(), Some(desk));
    }

    #[test]
    fn test_stolen_desk_is_dropped() {
        let mut h = Harness::new();
        let desk = h.desks.iter().next().map(|d| d.id).unwrap();
        let id = h.spawn(Archetype::Grinder, Vec2::new(100.0, 800.0));
        h.agent_mut(id).set_desk_target(Some(desk));
        assert!(h.desks.claim(AgentId(77), desk));
        h.step(id, 0.05);
        assert_eq!(h.agent(id).desk_target(), None);
    }
}
