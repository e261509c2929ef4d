//! Gossip: joins huddles and spreads a rumour tint to whoever stands nearby

use rand::Rng;

use crate::entity::agent::{Agent, AgentState, Archetype, GossipColor, Role};
use crate::spatial::quadtree::centroid;
use crate::spatial::steering;

use super::BehaviorContext;

pub fn update(agent: &mut Agent, dt: f32, ctx: &mut BehaviorContext<'_>) {
    let cfg = ctx.config;
    let speed = ctx.base_speed() * cfg.gossip_speed_mult * agent.speed_mult;
    let (personal_hue, mut huddle_centroid) = match &agent.role {
        Role::Gossip {
            personal_hue,
            huddle_centroid,
        } => (*personal_hue, *huddle_centroid),
        _ => return,
    };

    match agent.state {
        AgentState::SeekingCluster => {
            let seek_radius = if ctx.flags.friday {
                cfg.gossip_seek_radius * cfg.friday_gossip_boost
            } else {
                cfg.gossip_seek_radius
            };
            match ctx.largest_cluster(seek_radius, cfg.cluster_min, Some(agent.id)) {
                Some(cluster) => {
                    let target = centroid(&cluster);
                    agent.vel = steering::seek(agent.pos, target, speed);
                    if agent.pos.distance(&target) < cfg.gossip_huddle_radius {
                        agent.state = AgentState::InHuddle;
                        agent.state_timer = cfg.gossip_huddle_duration.sample(&mut *ctx.rng);
                        huddle_centroid = target;
                    }
                }
                None => {
                    let idle = ctx.base_speed() * 0.5;
                    ctx.wander(agent, idle, dt);
                }
            }
        }
        AgentState::InHuddle => {
            agent.stop();
            agent.state_timer -= dt;
            spread_rumour(agent, personal_hue, dt, ctx);
            if agent.state_timer <= 0.0 {
                agent.state = AgentState::MovingOn;
                agent.state_timer = cfg.gossip_moving_on_duration;
            }
        }
        AgentState::MovingOn => {
            agent.vel = steering::flee(agent.pos, huddle_centroid, speed);
            agent.state_timer -= dt;
            if agent.state_timer <= 0.0 {
                agent.state = AgentState::SeekingCluster;
            }
        }
        _ => {}
    }

    if let Role::Gossip {
        huddle_centroid: stored,
        ..
    } = &mut agent.role
    {
        *stored = huddle_centroid;
    }
}

/// Blend infected neighbours toward our hue, occasionally infect clean ones
fn spread_rumour(agent: &Agent, personal_hue: f32, dt: f32, ctx: &mut BehaviorContext<'_>) {
    let cfg = ctx.config;
    let neighbours = ctx.index.query(agent.pos, cfg.gossip_spread_radius);

    for point in neighbours {
        if point.id == agent.id {
            continue;
        }
        let infect_roll = ctx.rng.gen::<f32>();
        let lifetime = cfg.gossip_color_lifetime.sample(&mut *ctx.rng);

        let Some(other) = ctx.others.get_mut(point.id) else {
            continue;
        };
        if other.archetype() == Archetype::Gossip {
            continue;
        }
        match other.gossip_color.as_mut() {
            Some(color) => color.blend_toward(personal_hue, cfg.gossip_spread_rate * dt),
            None if infect_roll < cfg.gossip_infect_chance * dt => {
                other.gossip_color = Some(GossipColor::new(personal_hue, lifetime));
            }
            None => {}
        }
    }
}
