//! Transient environment entities and mode flags

use std::collections::BTreeSet;

use serde::Serialize;

use crate::core::types::{AgentId, Rect, Vec2};

#[derive(Debug, Clone, Serialize)]
pub struct Pizza {
    pub id: u32,
    pub pos: Vec2,
    pub timer: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Cat {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub heading: f32,
    pub timer: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct MeetingRoom {
    pub id: u32,
    pub rect: Rect,
    pub timer: f32,
    pub occupants: BTreeSet<AgentId>,
}

/// Loud music follows the agent playing it
#[derive(Debug, Clone, Serialize)]
pub struct MusicSource {
    pub pos: Vec2,
    pub agent: AgentId,
    pub timer: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PingPongZone {
    pub pos: Vec2,
    pub radius: f32,
    pub timer: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoffeeMachine {
    pub rect: Rect,
    pub broken: bool,
    pub repair_timer: f32,
}

/// Everything on the floor that comes and goes
#[derive(Debug, Clone)]
pub struct Environment {
    pub pizzas: Vec<Pizza>,
    pub cat: Option<Cat>,
    pub meeting: Option<MeetingRoom>,
    pub music: Option<MusicSource>,
    pub ping_pong: Option<PingPongZone>,
    pub coffee: CoffeeMachine,
    next_pizza_id: u32,
    next_cat_id: u32,
    next_meeting_id: u32,
}

impl Environment {
    pub fn new(coffee_rect: Rect) -> Self {
        Self {
            pizzas: Vec::new(),
            cat: None,
            meeting: None,
            music: None,
            ping_pong: None,
            coffee: CoffeeMachine {
                rect: coffee_rect,
                broken: false,
                repair_timer: 0.0,
            },
            next_pizza_id: 0,
            next_cat_id: 0,
            next_meeting_id: 0,
        }
    }

    pub fn next_pizza_id(&mut self) -> u32 {
        let id = self.next_pizza_id;
        self.next_pizza_id += 1;
        id
    }

    pub fn next_cat_id(&mut self) -> u32 {
        let id = self.next_cat_id;
        self.next_cat_id += 1;
        id
    }

    pub fn next_meeting_id(&mut self) -> u32 {
        let id = self.next_meeting_id;
        self.next_meeting_id += 1;
        id
    }

    /// Pizza agents are drawn to, if any
    pub fn active_pizza(&self) -> Option<&Pizza> {
        self.pizzas.first()
    }

    pub fn coffee_center(&self) -> Vec2 {
        self.coffee.rect.center()
    }

    /// Drop any reference to a departing agent
    pub fn forget_agent(&mut self, id: AgentId) {
        if let Some(meeting) = self.meeting.as_mut() {
            meeting.occupants.remove(&id);
        }
        if self.music.as_ref().map(|m| m.agent) == Some(id) {
            self.music = None;
        }
    }
}

/// Global toggles read by behaviors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ModeFlags {
    pub friday: bool,
    pub monday: bool,
    pub alarm_active: bool,
    pub coffee_broken: bool,
    pub observer_unlocked: bool,
    pub palette_shift: bool,
}
