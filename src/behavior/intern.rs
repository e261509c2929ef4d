//! Intern: latches onto the nearest colleague and copies what they did a moment ago

use std::f32::consts::PI;

use crate::core::types::AgentId;
use crate::entity::agent::{Agent, AgentState, MotionSample, Role};
use crate::spatial::steering;

use super::BehaviorContext;

pub fn update(agent: &mut Agent, dt: f32, ctx: &mut BehaviorContext<'_>) {
    let cfg = ctx.config;
    let sample = MotionSample {
        velocity: agent.vel,
        state: agent.state,
        timestamp: ctx.now,
    };
    let (mut follow, mut loop_timer) = match &mut agent.role {
        Role::Intern {
            history,
            follow,
            loop_timer,
        } => {
            history.record(sample);
            (*follow, *loop_timer)
        }
        _ => return,
    };

    match agent.state {
        AgentState::Idle => match nearest_colleague(agent, ctx) {
            Some(target) => {
                follow = Some(target);
                agent.state = AgentState::Following;
                loop_timer = cfg.intern_loop_check_interval;
            }
            None => {
                let idle = ctx.base_speed() * 0.3;
                ctx.wander(agent, idle, dt);
            }
        },
        AgentState::Following => {
            follow_target(agent, &mut follow, &mut loop_timer, dt, ctx);
        }
        _ => {}
    }

    if let Role::Intern {
        follow: f,
        loop_timer: l,
        ..
    } = &mut agent.role
    {
        *f = follow;
        *l = loop_timer;
    }
}

fn nearest_colleague(agent: &Agent, ctx: &BehaviorContext<'_>) -> Option<AgentId> {
    let others = &ctx.others;
    ctx.index
        .nearest(agent.pos, ctx.config.intern_follow_radius, |p| {
            p.id != agent.id
                && others
                    .get(p.id)
                    .map(|a| !a.is_observer() && !a.is_escaped())
                    .unwrap_or(false)
        })
        .map(|p| p.id)
}

fn follow_target(
    agent: &mut Agent,
    follow: &mut Option<AgentId>,
    loop_timer: &mut f32,
    dt: f32,
    ctx: &mut BehaviorContext<'_>,
) {
    let cfg = ctx.config;
    let target = follow.and_then(|id| ctx.others.get(id)).filter(|t| {
        !t.is_escaped() && agent.pos.distance(&t.pos) <= cfg.intern_follow_radius * 1.5
    });
    let Some(target) = target else {
        agent.state = AgentState::Idle;
        *follow = None;
        return;
    };

    *loop_timer -= dt;
    if *loop_timer <= 0.0 {
        *loop_timer = cfg.intern_loop_check_interval;
        if target.follow_target() == Some(agent.id) {
            agent.heading += PI * 0.7;
            agent.state = AgentState::Idle;
            *follow = None;
            tracing::trace!(intern = %agent.name, "follow loop broken");
            return;
        }
    }

    let delayed = target.history().and_then(|h| {
        h.sample_at(
            ctx.now - f64::from(cfg.intern_copy_delay),
            f64::from(cfg.intern_history_staleness),
        )
    });
    agent.vel = match delayed {
        Some(s) => {
            let live = steering::seek(agent.pos, target.pos, ctx.base_speed() * agent.speed_mult);
            steering::lerp_vec(s.velocity, live, 1.0 - cfg.intern_copy_weight)
        }
        None => steering::seek(agent.pos, target.pos, ctx.base_speed() * 0.6),
    };
    agent.tint = steering::lerp_color(agent.tint, target.tint, cfg.intern_tint_rate * dt);
}
