//! Manager: breaks up crowds, or herds into the meeting room when one exists

use crate::core::types::Vec2;
use crate::entity::agent::{Agent, AgentState, Archetype, Role};
use crate::spatial::quadtree::centroid;
use crate::spatial::steering;
use crate::world::events::ParticleKind;

use super::BehaviorContext;

pub fn update(agent: &mut Agent, dt: f32, ctx: &mut BehaviorContext<'_>) {
    let cfg = ctx.config;
    let speed = ctx.base_speed() * cfg.manager_speed_mult * agent.speed_mult;

    if let Some(meeting) = ctx.env.meeting.as_ref() {
        if agent.state != AgentState::Herding {
            agent.state = AgentState::Herding;
            return;
        }
        let center = meeting.rect.center();
        agent.vel = steering::seek(agent.pos, center, speed * 1.1);
        if agent.pos.distance(&center) < meeting.rect.w / 2.0 {
            agent.state = AgentState::InMeeting;
            agent.stop();
            ctx.meeting_arrivals.push(agent.id);
        }
        return;
    }
    if agent.state == AgentState::Herding {
        agent.state = AgentState::Scanning;
    }

    let (mut target, mut scan_timer) = match &agent.role {
        Role::Manager { target, scan_timer } => (*target, *scan_timer),
        _ => return,
    };
    scan_timer -= dt;

    match agent.state {
        AgentState::Scanning => match biggest_crowd(ctx) {
            Some(c) => {
                target = c;
                agent.state = AgentState::Approaching;
            }
            None => {
                let idle = ctx.base_speed() * 0.6;
                ctx.wander(agent, idle, dt);
            }
        },
        AgentState::Approaching => {
            let mut lost = false;
            if scan_timer <= 0.0 {
                scan_timer = cfg.manager_scan_interval;
                match biggest_crowd(ctx) {
                    Some(c) => target = c,
                    None => lost = true,
                }
            }
            if lost {
                agent.state = AgentState::Scanning;
            } else {
                agent.vel = steering::seek(agent.pos, target, speed);
                if agent.pos.distance(&target) < cfg.manager_disperse_radius {
                    agent.state = AgentState::Dispersing;
                }
            }
        }
        AgentState::Dispersing => {
            disperse(agent, ctx);
            agent.state_timer = cfg.manager_confused.sample(&mut *ctx.rng);
            agent.state = AgentState::Confused;
        }
        AgentState::Confused => {
            agent.state_timer -= dt;
            let idle = ctx.base_speed() * 0.4;
            ctx.wander(agent, idle, dt);
            if agent.state_timer <= 0.0 {
                agent.state = AgentState::Scanning;
            }
        }
        _ => {}
    }

    if let Role::Manager {
        target: t,
        scan_timer: s,
    } = &mut agent.role
    {
        *t = target;
        *s = scan_timer;
    }
}

fn biggest_crowd(ctx: &BehaviorContext<'_>) -> Option<Vec2> {
    let cfg = ctx.config;
    ctx.largest_cluster(cfg.manager_cluster_radius, cfg.cluster_min, None)
        .map(|c| centroid(&c))
}

/// Shove everyone nearby outward and break up any huddle in range
fn disperse(agent: &Agent, ctx: &mut BehaviorContext<'_>) {
    let cfg = ctx.config;
    let mut scattered = 0usize;

    for point in ctx.index.query(agent.pos, cfg.manager_disperse_radius) {
        let Some(other) = ctx.others.get_mut(point.id) else {
            continue;
        };
        if other.archetype() == Archetype::Observer {
            continue;
        }
        let delta = other.pos - agent.pos;
        let d = delta.length();
        let dir = if d > 0.0 { delta / d } else { Vec2::new(1.0, 0.0) };
        other.vel += dir * cfg.manager_disperse_force;
        if other.state == AgentState::InHuddle {
            other.state = AgentState::MovingOn;
            other.state_timer = cfg.gossip_dispersed_duration;
        }
        scattered += 1;
    }

    ctx.events.particles(agent.pos, ParticleKind::Dispersal, 8);
    tracing::debug!(manager = %agent.name, scattered, "manager dispersed a crowd");
}
