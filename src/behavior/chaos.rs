//! Chaos agent: flips between sub-modes at random and occasionally breaks desks

use rand::Rng;

use crate::entity::agent::{Agent, AgentState, Archetype, ChaosMode, Role};
use crate::spatial::steering;
use crate::world::events::{LogKind, ParticleKind};

use super::BehaviorContext;

pub fn update(agent: &mut Agent, dt: f32, ctx: &mut BehaviorContext<'_>) {
    let cfg = ctx.config;
    let (mut mode, mut grind_desk) = match &agent.role {
        Role::ChaosAgent { mode, grind_desk } => (*mode, *grind_desk),
        _ => return,
    };

    agent.state_timer -= dt;
    if agent.state_timer <= 0.0 {
        mode = ChaosMode::random(Some(mode), &mut *ctx.rng);
        agent.state = mode.state();
        agent.state_timer = cfg.chaos_switch_interval.sample(&mut *ctx.rng);
        *ctx.chaos_switches += 1;
        ctx.events.particles(agent.pos, ParticleKind::ChaosSwitch, 6);
    }

    if ctx.rng.gen::<f32>() < cfg.chaos_break_chance * dt {
        try_break_desk(agent, ctx);
    }

    let speed = ctx.base_speed() * agent.speed_mult;
    match agent.state {
        AgentState::ChaosWander => {
            let slow = ctx.base_speed() * 0.8;
            ctx.wander(agent, slow, dt);
        }
        AgentState::ChaosGrind => {
            if grind_desk.is_none() {
                grind_desk = ctx.desks.nearest_free(agent.pos, None).map(|d| d.id);
            }
            // Loiter by a desk nobody owns; give it up once it is taken or broken
            let spot = grind_desk
                .and_then(|id| ctx.desks.get(id))
                .filter(|d| !d.broken && d.claimed_by.is_none())
                .map(|d| d.center());
            match spot {
                Some(center) if agent.pos.distance(&center) < cfg.desk_claim_radius * 2.0 => {
                    agent.stop();
                }
                Some(center) => agent.vel = steering::seek(agent.pos, center, speed),
                None => {
                    grind_desk = None;
                    ctx.wander(agent, speed, dt);
                }
            }
        }
        AgentState::ChaosGossip => {
            match ctx.nearest_cluster_centroid(agent.pos, cfg.chaos_gossip_radius, 2) {
                Some(c) => agent.vel = steering::seek(agent.pos, c, speed),
                None => ctx.wander(agent, speed, dt),
            }
        }
        AgentState::ChaosSprint => {
            agent.vel = steering::heading_velocity(agent.heading, ctx.base_speed() * cfg.chaos_sprint_mult);
        }
        AgentState::ChaosFreeze => agent.stop(),
        _ => {}
    }

    if agent.state != AgentState::ChaosGrind {
        grind_desk = None;
    }
    if let Role::ChaosAgent {
        mode: m,
        grind_desk: g,
    } = &mut agent.role
    {
        *m = mode;
        *g = grind_desk;
    }
}

/// Break the first intact desk within reach and evict whoever worked there
fn try_break_desk(agent: &Agent, ctx: &mut BehaviorContext<'_>) {
    let cfg = ctx.config;
    let Some(desk_id) = ctx.desks.breakable_near(agent.pos, cfg.chaos_break_radius) else {
        return;
    };
    let center = ctx.desks.get(desk_id).map(|d| d.center()).unwrap_or(agent.pos);
    let evicted = ctx.desks.break_desk(desk_id);

    // A grinder may be walking toward the desk without having sat down yet
    let victim = ctx
        .others
        .iter_mut()
        .find(|a| a.archetype() == Archetype::Grinder && (Some(a.id) == evicted || a.desk_target() == Some(desk_id)));
    if let Some(grinder) = victim {
        grinder.state = AgentState::Disturbed;
        grinder.state_timer = cfg.grinder_disturbed_duration;
        grinder.set_desk_target(None);
    }
    if let Some(id) = evicted {
        ctx.desks.release(id);
    }

    ctx.events.particles(center, ParticleKind::DeskBreak, 10);
    ctx.events.log(LogKind::Chaos, format!("{} broke a desk!", agent.name));
}

#[cfg(test)]
mod tests {
    use crate::behavior::test_support::Harness;
    use crate::core::types::{AgentId, Vec2};
    use crate::entity::agent::{AgentState, Archetype, ChaosMode, Role};
    use crate::world::events::SimEvent;

    fn force_mode(h: &mut Harness, id: AgentId, mode: ChaosMode) {
        let a = h.agent_mut(id);
        a.state = mode.state();
        a.state_timer = 100.0;
        if let Role::ChaosAgent { mode: m, .. } = &mut a.role {
            *m = mode;
        }
    }

    #[test]
    fn test_switch_counts_and_changes_mode() {
        let mut h = Harness::new();
        let id = h.spawn(Archetype::ChaosAgent, Vec2::new(300.0, 300.0));
        let before = h.agent(id).chaos_mode();
        h.agent_mut(id).state_timer = 0.01;
        h.step(id, 0.05);
        assert_eq!(h.chaos_switches, 1);
        let a = h.agent(id);
        assert_ne!(a.chaos_mode(), before);
        assert_eq!(a.chaos_mode().map(|m| m.state()), Some(a.state));
        assert!(a.state_timer >= 2.0 && a.state_timer <= 8.0);
    }

    #[test]
    fn test_desk_break_evicts_grinder() {
        let mut h = Harness::new();
        h.config.chaos_break_chance = 1000.0;
        let (desk, center) = h.desks.iter().next().map(|d| (d.id, d.center())).unwrap();
        let grinder = h.spawn(Archetype::Grinder, center);
        h.desks.claim(grinder, desk);
        {
            let g = h.agent_mut(grinder);
            g.set_desk_target(Some(desk));
            g.state = AgentState::Seated;
        }
        let id = h.spawn(Archetype::ChaosAgent, center + Vec2::new(10.0, 0.0));
        force_mode(&mut h, id, ChaosMode::Freeze);
        h.step(id, 0.05);

        assert!(h.desks.get(desk).map(|d| d.broken).unwrap());
        assert_eq!(h.desks.claimed_by(grinder), None);
        let g = h.agent(grinder);
        assert_eq!(g.state, AgentState::Disturbed);
        assert_eq!(g.desk_target(), None);
        assert!(h
            .events
            .pending()
            .iter()
            .any(|e| matches!(e, SimEvent::Log { text, .. } if text.contains("broke a desk"))));
    }

    #[test]
    fn test_sprint_and_freeze_speeds() {
        let mut h = Harness::new();
        let id = h.spawn(Archetype::ChaosAgent, Vec2::new(300.0, 300.0));
        force_mode(&mut h, id, ChaosMode::Sprint);
        h.step(id, 0.05);
        let expected = h.config.base_speed * 2.5;
        assert!((h.agent(id).vel.length() - expected).abs() < 1e-3);

        force_mode(&mut h, id, ChaosMode::Freeze);
        h.step(id, 0.05);
        assert_eq!(h.agent(id).vel, Vec2::ZERO);
    }

    #[test]
    fn test_grind_loiters_without_claiming() {
        let mut h = Harness::new();
        h.config.chaos_break_chance = 0.0;
        let center = h.desks.iter().next().map(|d| d.center()).unwrap();
        let id = h.spawn(Archetype::ChaosAgent, center + Vec2::new(0.0, -80.0));
        force_mode(&mut h, id, ChaosMode::Grind);
        for _ in 0..100 {
            h.step(id, 0.05);
        }
        assert!(h.agent(id).pos.distance(&center) < h.config.desk_claim_radius * 2.0 + 3.0);
        assert_eq!(h.desks.claimed_count(), 0);
    }
}
