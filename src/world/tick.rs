//! Tick system - one fixed pass over every world system
//!
//! Order matters: behaviors read the index built from start-of-tick
//! positions, physics runs on the velocities behaviors chose, and the metric
//! and detectors see the settled result.

use crate::behavior::{update_agent, BehaviorContext};
use crate::core::types::{AgentId, Vec2};
use crate::detectors;
use crate::entity::agent::{AgentState, Archetype};
use crate::spatial::steering;
use crate::world::events::SimEvent;
use crate::world::metrics::{churn_score, fragmentation_score, velocity_variance_score, ChaosSignals, Workforce};
use crate::world::World;

/// Run every system once. `raw_dt` is the uncapped frame time.
pub(crate) fn run_tick(world: &mut World, raw_dt: f32) {
    let raw_dt = raw_dt.max(0.0);
    let dt = raw_dt.min(world.config.tick_dt_cap);

    world.frame_rate.count(raw_dt);
    let stamp = world.clock.now().stamp();
    world.events.set_stamp(stamp);

    rebuild_index(world);
    update_behaviors(world, dt);
    apply_ambient_pulls(world);
    apply_grinder_auras(world);
    apply_separation(world, dt);
    move_agents(world, dt);

    world.age_disturbances(dt);
    emit_nap_particles(world, dt);
    world.process_respawns(dt);

    if world.metrics.advance(dt, world.config.chaos_metric_interval) {
        sample_chaos_metric(world);
    }
    detectors::run_detectors(world, dt);
    decay_gossip_colors(world, dt);

    world
        .chat
        .update(dt, world.agents.iter(), &mut world.events, &world.config, &mut world.rng);

    cull_for_frame_rate(world);

    world.sim_time += f64::from(dt);
    world.tick_count += 1;
}

fn rebuild_index(world: &mut World) {
    world.index.rebuild(
        world
            .agents
            .iter()
            .filter(|a| !a.is_escaped())
            .map(|a| (a.id, a.pos)),
    );
}

fn update_behaviors(world: &mut World, dt: f32) {
    let mut arrivals: Vec<AgentId> = Vec::new();
    let now = world.sim_time;

    for idx in 0..world.agents.len() {
        let Some((agent, others)) = world.agents.split_for_update(idx) else {
            break;
        };
        if agent.is_escaped() {
            continue;
        }
        let mut ctx = BehaviorContext {
            config: &world.config,
            layout: &world.layout,
            env: &world.env,
            desks: &mut world.desks,
            index: &world.index,
            others,
            flags: world.flags,
            global_speed: world.global_speed,
            now,
            rng: &mut world.rng,
            chaos_switches: &mut world.chaos_switches,
            events: &mut world.events,
            meeting_arrivals: &mut arrivals,
        };
        update_agent(agent, dt, &mut ctx);
    }

    if let Some(meeting) = world.env.meeting.as_mut() {
        meeting.occupants.extend(arrivals);
    }
}

/// Loud music pushes roaming agents away; an open ping-pong table pulls them in
fn apply_ambient_pulls(world: &mut World) {
    let base = world.config.base_speed * world.global_speed;
    let music = world.env.music.as_ref().map(|m| (m.pos, m.agent));
    let table = world.env.ping_pong.as_ref().map(|z| (z.pos, z.radius));
    if music.is_none() && table.is_none() {
        return;
    }

    let avoid = world.config.loud_music_avoid_radius;
    for agent in world.agents.iter_mut() {
        if !agent.state.is_roaming() {
            continue;
        }
        if let Some((source, dj)) = music {
            if agent.id != dj && agent.pos.distance(&source) < avoid {
                agent.vel += steering::flee(agent.pos, source, base * 0.6);
            }
        }
        if let Some((zone, radius)) = table {
            let d = agent.pos.distance(&zone);
            if d < radius * 3.0 && d > radius * 0.5 {
                let pull = steering::seek(agent.pos, zone, base * 0.8);
                agent.vel = steering::lerp_vec(agent.vel, pull, 0.3);
            }
        }
    }
}

fn apply_grinder_auras(world: &mut World) {
    for agent in world.agents.iter_mut() {
        agent.speed_mult = 1.0;
    }

    let seated: Vec<(AgentId, Vec2)> = world
        .agents
        .iter()
        .filter(|a| a.archetype() == Archetype::Grinder && a.state == AgentState::Seated)
        .map(|a| (a.id, a.pos))
        .collect();

    let boost = world.config.grinder_aura_boost;
    for (grinder, pos) in seated {
        for p in world.index.query(pos, world.config.grinder_aura_radius) {
            if p.id == grinder {
                continue;
            }
            if let Some(other) = world.agents.get_mut(p.id) {
                other.speed_mult = other.speed_mult.max(boost);
            }
        }
    }
}

fn apply_separation(world: &mut World, dt: f32) {
    let radius = world.config.personal_radius;
    let force = world.config.separation_force;

    let pushes: Vec<(AgentId, Vec2)> = world
        .agents
        .iter()
        .filter(|a| !matches!(a.state, AgentState::Seated | AgentState::Escaped))
        .map(|a| {
            let neighbours = world
                .index
                .query(a.pos, radius * 2.0)
                .into_iter()
                .filter(|p| p.id != a.id)
                .map(|p| p.pos);
            (a.id, steering::separation(a.pos, neighbours, radius) * (force * dt))
        })
        .filter(|(_, push)| *push != Vec2::ZERO)
        .collect();

    for (id, push) in pushes {
        if let Some(agent) = world.agents.get_mut(id) {
            agent.vel += push;
        }
    }
}

/// Integrate, bounce off walls, push out of desks, apply friction
fn move_agents(world: &mut World, dt: f32) {
    let cfg = &world.config;
    let margin = cfg.wall_margin;
    let (width, height) = (world.layout.width, world.layout.height);
    let push_radius = cfg.agent_radius + 4.0;

    for agent in world.agents.iter_mut() {
        if agent.state.is_stationary() {
            continue;
        }

        agent.pos += agent.vel * dt;

        let clamped = world.layout.clamp(agent.pos, margin);
        if clamped != agent.pos {
            agent.pos = clamped;
            if agent.pos.x <= margin || agent.pos.x >= width - margin {
                agent.vel.x *= -cfg.wall_bounce;
            }
            if agent.pos.y <= margin || agent.pos.y >= height - margin {
                agent.vel.y *= -cfg.wall_bounce;
            }
            agent.heading = agent.vel.angle();
            if agent.archetype() == Archetype::Wanderer && agent.state == AgentState::Wandering {
                agent.state = AgentState::BumpRecovery;
                agent.state_timer = cfg.bump_recovery_duration;
            }
        }

        for desk in world.desks.colliding(agent.pos, push_radius) {
            // Owners walk straight onto their own desk
            if desk.claimed_by == Some(agent.id) {
                continue;
            }
            let nearest = desk.rect.closest_point(agent.pos);
            let delta = agent.pos - nearest;
            let d = delta.length();
            if d >= push_radius {
                continue;
            }
            if d > 0.001 {
                let normal = delta / d;
                agent.pos += normal * (push_radius - d);
                let into = agent.vel.dot(&normal);
                if into < 0.0 {
                    agent.vel -= normal * into;
                }
            } else {
                agent.pos.x += push_radius;
            }
        }

        agent.vel *= cfg.friction;
    }
}

fn emit_nap_particles(world: &mut World, dt: f32) {
    world.nap_particle_timer -= dt;
    if world.nap_particle_timer > 0.0 {
        return;
    }
    world.nap_particle_timer = world.config.nap_particle_interval;
    for agent in world.agents.iter().filter(|a| a.state == AgentState::PowerNap) {
        world
            .events
            .particles(agent.pos - Vec2::new(0.0, 10.0), crate::world::events::ParticleKind::Zzz, 2);
    }
}

fn sample_chaos_metric(world: &mut World) {
    let velocities: Vec<Vec2> = world
        .agents
        .iter()
        .filter(|a| !a.is_escaped())
        .map(|a| a.vel)
        .collect();
    if velocities.is_empty() {
        return;
    }
    let cfg = &world.config;

    let largest = world
        .index
        .clusters(cfg.chaos_cluster_radius, cfg.cluster_min)
        .iter()
        .map(|c| c.len())
        .max();
    let signals = ChaosSignals {
        velocity: velocity_variance_score(&velocities, cfg.base_speed),
        fragmentation: fragmentation_score(largest, velocities.len()),
        churn: churn_score(world.chaos_switches, cfg.chaos_switch_ceiling),
    };
    world.chaos_switches = 0;

    let workforce = Workforce {
        seated_grinders: world
            .agents
            .iter()
            .filter(|a| a.archetype() == Archetype::Grinder && a.state == AgentState::Seated)
            .count(),
        in_meeting: world.agents.iter().filter(|a| a.state == AgentState::InMeeting).count(),
        workers: world
            .agents
            .iter()
            .filter(|a| !a.is_observer() && !a.is_escaped())
            .count(),
        desks: world.desks.len(),
    };

    let chaos = world.metrics.record(signals.weighted(cfg), workforce, cfg);
    tracing::trace!(
        chaos,
        velocity = signals.velocity,
        fragmentation = signals.fragmentation,
        churn = signals.churn,
        "chaos sample"
    );
    world.events.emit(SimEvent::ChaosChanged { value: chaos });
}

fn decay_gossip_colors(world: &mut World, dt: f32) {
    for agent in world.agents.iter_mut() {
        let expired = match agent.gossip_color.as_mut() {
            Some(color) => {
                color.decay_timer -= dt;
                color.decay_timer <= 0.0
            }
            None => false,
        };
        if expired {
            agent.reset_tint();
        }
    }
}

/// Load shedding: drop the newest Wanderer while the host is struggling
fn cull_for_frame_rate(world: &mut World) {
    let cfg = &world.config;
    if world.frame_rate.fps >= cfg.cull_fps_threshold || world.agents.len() <= cfg.cull_agent_ceiling {
        return;
    }
    let wanderers: Vec<AgentId> = world
        .agents
        .iter()
        .filter(|a| a.archetype() == Archetype::Wanderer)
        .map(|a| a.id)
        .collect();
    if wanderers.len() <= cfg.cull_min_wanderers {
        return;
    }
    if let Some(&id) = wanderers.last() {
        world.remove_agent(id);
        tracing::debug!(agent = id.0, fps = world.frame_rate.fps, "culled wanderer");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimulationConfig;
    use crate::world::{LogKind, World};

    fn empty_world() -> World {
        World::builder().empty().seed(5).build().unwrap()
    }

    #[test]
    fn test_wall_contact_bounces_and_bumps_wanderer() {
        let mut world = empty_world();
        let id = world.insert_agent(Archetype::Wanderer, Vec2::new(17.0, 200.0));
        {
            let a = world.agent_mut(id).unwrap();
            a.heading = std::f32::consts::PI;
        }
        world.update(0.05);
        let a = world.agent(id).unwrap();
        assert!(a.pos.x >= 16.0);
        assert_eq!(a.state, AgentState::BumpRecovery);
        assert!(a.vel.x > 0.0);
    }

    #[test]
    fn test_desk_pushes_out_non_owner() {
        let mut world = empty_world();
        let rect = world.desks().iter().next().map(|d| d.rect).unwrap();
        let id = world.insert_agent(Archetype::Intern, Vec2::new(rect.x + 5.0, rect.y - 2.0));
        world.update(0.001);
        let a = world.agent(id).unwrap();
        let nearest = rect.closest_point(a.pos);
        assert!(nearest.distance(&a.pos) >= world.config().agent_radius + 4.0 - 1e-3);
    }

    #[test]
    fn test_seated_grinder_boosts_neighbours() {
        let mut world = empty_world();
        let grinder = world.insert_agent(Archetype::Grinder, Vec2::new(615.0, 350.0));
        let near = world.insert_agent(Archetype::Intern, Vec2::new(615.0, 440.0));
        let far = world.insert_agent(Archetype::Intern, Vec2::new(1400.0, 800.0));
        world.agent_mut(grinder).unwrap().state = AgentState::Seated;
        world.update(0.016);
        assert_eq!(world.agent(near).unwrap().speed_mult, 1.3);
        assert_eq!(world.agent(far).unwrap().speed_mult, 1.0);
        assert_eq!(world.agent(grinder).unwrap().speed_mult, 1.0);
    }

    #[test]
    fn test_separation_pushes_overlapping_agents_apart() {
        let mut world = empty_world();
        let a = world.insert_agent(Archetype::Intern, Vec2::new(300.0, 200.0));
        let b = world.insert_agent(Archetype::Intern, Vec2::new(306.0, 200.0));
        let gap = |w: &World| w.agent(a).unwrap().pos.distance(&w.agent(b).unwrap().pos);
        let before = gap(&world);
        world.update(0.05);
        assert!(gap(&world) > before);
    }

    #[test]
    fn test_metric_sampled_each_second() {
        let mut world = World::builder().seed(5).build().unwrap();
        for _ in 0..70 {
            world.update(1.0 / 60.0);
        }
        let changes = world
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, SimEvent::ChaosChanged { .. }))
            .count();
        assert_eq!(changes, 1);
        let m = world.metrics();
        assert!((0.0..=1.0).contains(&m.chaos_index));
    }

    #[test]
    fn test_dt_is_capped() {
        let mut world = empty_world();
        world.update(5.0);
        assert!((world.sim_time() - f64::from(SimulationConfig::default().tick_dt_cap)).abs() < 1e-9);
    }

    #[test]
    fn test_cull_removes_newest_wanderer_under_load() {
        let mut world = empty_world();
        for i in 0..70 {
            let x = 100.0 + (i % 10) as f32 * 120.0;
            let y = 100.0 + (i / 10) as f32 * 100.0;
            world.insert_agent(Archetype::Wanderer, Vec2::new(x, y));
        }
        let newest = world.agents().ids().last().copied().unwrap();
        world.report_frame_rate(20.0);
        world.update(0.05);
        assert_eq!(world.agents().len(), 69);
        assert!(world.agent(newest).is_none());
    }

    #[test]
    fn test_gossip_color_expires() {
        let mut world = empty_world();
        let id = world.insert_agent(Archetype::Intern, Vec2::new(300.0, 300.0));
        {
            let a = world.agent_mut(id).unwrap();
            a.gossip_color = Some(crate::entity::agent::GossipColor::new(120.0, 0.04));
            a.tint = 0x123456;
        }
        world.update(0.05);
        let a = world.agent(id).unwrap();
        assert!(a.gossip_color.is_none());
        assert_eq!(a.tint, Archetype::Intern.base_tint());
    }

    #[test]
    fn test_opening_log_entry() {
        let world = empty_world();
        let first = world.log_history().next().unwrap();
        assert_eq!(first.kind, LogKind::Good);
    }
}
