//! Wanderer: random walk with coffee runs, pizza pull and cat reactions

use rand::Rng;

use crate::core::types::Vec2;
use crate::entity::agent::{Agent, AgentState, CatResponse, Role};
use crate::spatial::steering;

use super::BehaviorContext;

pub fn update(agent: &mut Agent, dt: f32, ctx: &mut BehaviorContext<'_>) {
    let cfg = ctx.config;
    let speed = ctx.base_speed() * cfg.wanderer_speed_mult * agent.speed_mult;

    match agent.state {
        AgentState::Wandering => {
            if ctx.rng.gen::<f32>() < cfg.wanderer_jitter_chance * dt {
                let jitter = cfg.wander_angle_jitter_deg;
                agent.heading += ctx.rng.gen_range(-jitter..=jitter).to_radians();
            }
            if !ctx.flags.coffee_broken && ctx.rng.gen::<f32>() < cfg.wanderer_coffee_chance * dt {
                agent.state = AgentState::HeadingToCoffee;
            }
            if let Some(pizza) = ctx.env.active_pizza() {
                if agent.pos.distance(&pizza.pos) < cfg.pizza_attract_radius {
                    agent.heading = (pizza.pos - agent.pos).angle();
                }
            }
            agent.vel = steering::heading_velocity(agent.heading, speed);
            apply_cat_response(agent, ctx);
        }
        AgentState::HeadingToCoffee => {
            if ctx.flags.coffee_broken {
                agent.state = AgentState::Wandering;
                return;
            }
            let target = ctx.env.coffee_center();
            agent.vel = steering::seek(agent.pos, target, speed);
            if agent.vel != Vec2::ZERO {
                agent.heading = agent.vel.angle();
            }
            if agent.pos.distance(&target) < cfg.coffee_approach_dist {
                agent.state = AgentState::AtCoffee;
                agent.stop();
                let dwell = cfg.coffee_dwell.sample(&mut *ctx.rng);
                if let Role::Wanderer { coffee_timer } = &mut agent.role {
                    *coffee_timer = dwell;
                }
            }
        }
        AgentState::AtCoffee => {
            agent.stop();
            let done = match &mut agent.role {
                Role::Wanderer { coffee_timer } => {
                    *coffee_timer -= dt;
                    *coffee_timer <= 0.0
                }
                _ => true,
            };
            if done {
                agent.heading = ctx.rng.gen_range(0.0..std::f32::consts::TAU);
                agent.state = AgentState::Wandering;
            }
        }
        AgentState::BumpRecovery => {
            agent.state_timer -= dt;
            agent.vel *= 0.8;
            if agent.state_timer <= 0.0 {
                agent.state = AgentState::Wandering;
            }
        }
        _ => {}
    }
}

/// Adjust an already computed wander velocity for the office cat
fn apply_cat_response(agent: &mut Agent, ctx: &BehaviorContext<'_>) {
    let Some(cat) = ctx.env.cat.as_ref() else {
        return;
    };
    let cfg = ctx.config;
    let d = agent.pos.distance(&cat.pos);

    match agent.cat_response {
        CatResponse::None => {}
        CatResponse::Attracted => {
            if d > cfg.cat_attract_radius {
                agent.heading = steering::angle_toward(agent.heading, agent.pos, cat.pos);
                let speed = agent.vel.length();
                agent.vel = steering::heading_velocity(agent.heading, speed);
            } else {
                agent.stop();
            }
        }
        CatResponse::Avoidant => {
            if d < cfg.cat_avoid_radius {
                agent.vel += steering::flee(agent.pos, cat.pos, ctx.base_speed() * 1.2) * 0.5;
            }
        }
    }
}
