//! Read-only copy of the world for the presentation layer

use serde::Serialize;

use crate::core::types::{AgentId, DeskId, Vec2};
use crate::entity::agent::{AgentState, Archetype, CatResponse, ChaosMode};
use crate::world::desks::Desk;
use crate::world::environment::{Cat, CoffeeMachine, MeetingRoom, ModeFlags, MusicSource, PingPongZone, Pizza};
use crate::world::events::LogEntry;
use crate::world::metrics::MetricReadings;
use crate::world::World;

#[derive(Debug, Clone, Serialize)]
pub struct AgentView {
    pub id: AgentId,
    pub name: String,
    pub archetype: Archetype,
    pub pos: Vec2,
    pub vel: Vec2,
    pub heading: f32,
    pub state: AgentState,
    pub tint: u32,
    pub alpha: f32,
    pub cat_response: CatResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gossip_hue: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chaos_mode: Option<ChaosMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desk: Option<DeskId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow: Option<AgentId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub sim_time: f64,
    pub agents: Vec<AgentView>,
    pub desks: Vec<Desk>,
    pub pizzas: Vec<Pizza>,
    pub cat: Option<Cat>,
    pub meeting: Option<MeetingRoom>,
    pub music: Option<MusicSource>,
    pub ping_pong: Option<PingPongZone>,
    pub coffee: CoffeeMachine,
    pub metrics: MetricReadings,
    pub fps: f32,
    pub flags: ModeFlags,
    pub global_speed: f32,
    /// Newest first
    pub log: Vec<LogEntry>,
}

impl WorldSnapshot {
    pub fn capture(world: &World) -> Self {
        let agents = world
            .agents
            .iter()
            .map(|a| AgentView {
                id: a.id,
                name: a.name.clone(),
                archetype: a.archetype(),
                pos: a.pos,
                vel: a.vel,
                heading: a.heading,
                state: a.state,
                tint: a.tint,
                alpha: a.alpha,
                cat_response: a.cat_response,
                gossip_hue: a.gossip_color.map(|c| c.hue),
                chaos_mode: a.chaos_mode(),
                desk: world.desks.claimed_by(a.id),
                follow: a.follow_target(),
            })
            .collect();

        Self {
            tick: world.tick_count,
            sim_time: world.sim_time,
            agents,
            desks: world.desks.iter().cloned().collect(),
            pizzas: world.env.pizzas.clone(),
            cat: world.env.cat.clone(),
            meeting: world.env.meeting.clone(),
            music: world.env.music.clone(),
            ping_pong: world.env.ping_pong.clone(),
            coffee: world.env.coffee.clone(),
            metrics: world.metrics.readings(),
            fps: world.frame_rate.fps,
            flags: world.flags,
            global_speed: world.global_speed,
            log: world.events.history().cloned().collect(),
        }
    }

    pub fn to_json(&self) -> crate::core::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
