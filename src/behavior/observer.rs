//! Observer: fades in, then walks the perimeter forever taking notes

use crate::entity::agent::{Agent, Role};
use crate::spatial::steering;
use crate::world::events::ParticleKind;

use super::BehaviorContext;

pub fn update(agent: &mut Agent, dt: f32, ctx: &mut BehaviorContext<'_>) {
    let cfg = ctx.config;
    if agent.alpha < cfg.observer_max_alpha {
        agent.alpha = (agent.alpha + dt * cfg.observer_fade_rate).min(cfg.observer_max_alpha);
    }

    let Role::Observer {
        perimeter_t,
        note_timer,
    } = &mut agent.role
    else {
        return;
    };

    let margin = cfg.observer_perimeter_margin;
    let loop_len = ctx.layout.perimeter_length(margin).max(1.0);
    *perimeter_t = (*perimeter_t + dt * cfg.base_speed * cfg.observer_patrol_speed / loop_len).rem_euclid(1.0);
    let waypoint = ctx.layout.perimeter_position(*perimeter_t, margin);

    *note_timer -= dt;
    let jot = *note_timer <= 0.0;
    if jot {
        *note_timer = cfg.observer_note_interval.sample(&mut *ctx.rng);
    }

    agent.vel = steering::seek(agent.pos, waypoint, cfg.base_speed * cfg.observer_steer_speed);
    if jot {
        ctx.events.particles(agent.pos, ParticleKind::Notes, 1);
    }
}
