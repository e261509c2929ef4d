//! Disturbance commands and the aging of the transient entities they create
//!
//! Commands are what the presentation layer calls. Aging runs once per tick
//! from the tick loop and is where every disturbance hands agents back.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::core::types::{AgentId, Rect, Vec2};
use crate::entity::agent::{AgentState, Archetype, CatResponse};
use crate::spatial::steering;
use crate::world::environment::{Cat, MeetingRoom, MusicSource, PingPongZone, Pizza};
use crate::world::events::{LogKind, ParticleKind, SimEvent};
use crate::world::{PendingRespawn, World};

/// Cat keeps this far from the walls
const CAT_MARGIN: f32 = 20.0;
/// Per-second chance the cat changes its mind about where it is going
const CAT_TURN_CHANCE: f32 = 0.02;
const PING_PONG_OFFSET: Vec2 = Vec2 { x: 150.0, y: 100.0 };

impl World {
    /// Spawn an agent of any archetype at `pos`
    pub fn spawn_agent(&mut self, archetype: Archetype, pos: Vec2) -> AgentId {
        let pos = self.layout.clamp(pos, self.config.wall_margin);
        let id = self.insert_agent(archetype, pos);
        tracing::debug!(agent = id.0, %archetype, x = pos.x, y = pos.y, "spawned");
        id
    }

    pub fn drop_pizza(&mut self, pos: Vec2) {
        let id = self.env.next_pizza_id();
        self.env.pizzas.push(Pizza {
            id,
            pos,
            timer: self.config.pizza_duration,
        });
        self.events.particles(pos, ParticleKind::Pizza, 10);
        self.events.log(LogKind::Warning, "Pizza dropped! Agents stampede.");
        self.chat.announce(&mut self.events, "Free pizza in the office!");

        let attract = self.config.pizza_attract_radius;
        let far_chance = self.config.pizza_far_join_chance;
        let mut eaters = Vec::new();
        for agent in self.agents.iter() {
            if agent.is_observer() || matches!(agent.state, AgentState::Panicking | AgentState::Escaped) {
                continue;
            }
            if agent.pos.distance(&pos) < attract || self.rng.gen::<f32>() < far_chance {
                eaters.push(agent.id);
            }
        }

        for id in &eaters {
            self.unseat(*id);
            let eat = self.config.pizza_eat.sample(&mut self.rng);
            if let Some(agent) = self.agents.get_mut(*id) {
                agent.state = AgentState::Eating;
                agent.eat_timer = eat;
                agent.stop();
            }
        }
        tracing::info!(pizza = id, eaters = eaters.len(), "pizza dropped");
    }

    /// Replaces any cat already roaming
    pub fn drop_cat(&mut self, pos: Vec2) {
        let id = self.env.next_cat_id();
        let heading = self.rng.gen_range(0.0..std::f32::consts::TAU);
        let speed = self.config.base_speed * self.config.cat_speed_mult;
        self.env.cat = Some(Cat {
            id,
            pos,
            vel: steering::heading_velocity(heading, speed),
            heading,
            timer: self.config.cat_duration,
        });

        for agent in self.agents.iter_mut().filter(|a| !a.is_observer()) {
            agent.cat_response = if self.rng.gen::<bool>() {
                CatResponse::Attracted
            } else {
                CatResponse::Avoidant
            };
        }
        self.events.log(LogKind::Warning, "A cat appeared! Office divided.");
        self.chat.announce(&mut self.events, "There is a cat in the office.");
        tracing::info!(cat = id, "cat dropped");
    }

    /// Open a meeting room; any running meeting ends first
    pub fn place_meeting(&mut self, rect: Rect) {
        if self.env.meeting.is_some() {
            self.end_meeting();
        }
        let id = self.env.next_meeting_id();
        let timer = self.config.meeting_duration.sample(&mut self.rng);
        let mut room = MeetingRoom {
            id,
            rect,
            timer,
            occupants: Default::default(),
        };

        for agent in self.agents.iter_mut() {
            if agent.archetype() == Archetype::Manager
                && !matches!(agent.state, AgentState::Panicking | AgentState::Escaped)
            {
                agent.state = AgentState::Herding;
            }
        }

        let invitees: Vec<AgentId> = self
            .agents
            .iter()
            .filter(|a| !matches!(a.archetype(), Archetype::Manager | Archetype::Observer))
            .filter(|a| !matches!(a.state, AgentState::Panicking | AgentState::Escaped))
            .take(self.config.meeting_capacity)
            .map(|a| a.id)
            .collect();

        let center = rect.center();
        for id in invitees {
            self.unseat(id);
            let offset = Vec2::new(
                (self.rng.gen::<f32>() - 0.5) * rect.w * 0.6,
                (self.rng.gen::<f32>() - 0.5) * rect.h * 0.6,
            );
            if let Some(agent) = self.agents.get_mut(id) {
                agent.state = AgentState::InMeeting;
                agent.state_timer = timer;
                agent.pos = center + offset;
                agent.stop();
                room.occupants.insert(id);
            }
        }

        tracing::info!(meeting = id, occupants = room.occupants.len(), timer, "meeting placed");
        self.env.meeting = Some(room);
        self.events.log(LogKind::Info, "Meeting room placed! Manager activates.");
        self.chat.announce(&mut self.events, "Mandatory meeting. Attendance is not optional.");
    }

    pub(crate) fn end_meeting(&mut self) {
        let Some(room) = self.env.meeting.take() else {
            return;
        };
        let linger = self.config.post_meeting_duration;
        for id in &room.occupants {
            if let Some(agent) = self.agents.get_mut(*id) {
                if agent.state == AgentState::InMeeting {
                    agent.state = AgentState::PostMeeting;
                    agent.state_timer = linger;
                }
            }
        }
        for agent in self.agents.iter_mut() {
            if agent.archetype() == Archetype::Manager
                && matches!(agent.state, AgentState::Herding | AgentState::InMeeting | AgentState::PostMeeting)
            {
                agent.state = AgentState::Scanning;
            }
        }
        tracing::info!(meeting = room.id, "meeting ended");
        self.events.log(LogKind::Info, "Meeting ended. Productivity returns (maybe).");
        self.chat.announce(&mut self.events, "Meeting adjourned.");
    }

    /// Switch Friday mode; setting the current value again does nothing
    pub fn set_friday(&mut self, on: bool) {
        if self.flags.friday == on {
            return;
        }
        self.flags.friday = on;

        if on {
            self.global_speed *= self.config.friday_speed_mult;
            let extra = self.agents.count_of(Archetype::Wanderer) * 2;
            self.spawn_friday_wanderers(extra);
            self.events
                .log(LogKind::Warning, "Friday afternoon! Productivity leaves the building.");
            self.chat.announce(&mut self.events, "It's Friday. Nobody is working.");
        } else {
            self.global_speed /= self.config.friday_speed_mult;
            if self.friday_1701_applied {
                self.global_speed /= self.config.friday_1701_speed_mult;
                self.friday_1701_applied = false;
            }
            let extras = std::mem::take(&mut self.friday_extras);
            let removed = self.remove_agents_where(|a| extras.contains(&a.id));
            // Evacuated extras still outside stay home
            self.respawn_queue.retain(|r| !r.friday_extra);
            tracing::debug!(removed = removed.len(), "friday extras sent home");
            self.events.log(LogKind::Info, "Back to Monday mindset.");
            self.chat.announce(&mut self.events, "Back to work mode.");
        }
        tracing::info!(friday = on, global_speed = self.global_speed, "friday mode");
    }

    /// The Friday 17:01 event; forces Friday mode on and slows everyone further once
    pub fn trigger_1701(&mut self) {
        if !self.flags.friday {
            self.set_friday(true);
        }
        if self.friday_1701_applied {
            return;
        }
        self.friday_1701_applied = true;
        self.global_speed *= self.config.friday_1701_speed_mult;
        let extra = self.agents.count_of(Archetype::Wanderer);
        self.spawn_friday_wanderers(extra);

        self.events.log(LogKind::Chaos, "It's 17:01 on a Friday. Maximum entropy.");
        self.events.toast("17:01 Friday Mode! Freedom imminent...");
        self.chat.announce(&mut self.events, "17:01 on a Friday. Freedom imminent!");
        tracing::info!(global_speed = self.global_speed, "friday 17:01");
    }

    fn spawn_friday_wanderers(&mut self, count: usize) {
        for _ in 0..count {
            let pos = self.layout.random_edge_position(&mut self.rng);
            let id = self.insert_agent(Archetype::Wanderer, pos);
            self.friday_extras.insert(id);
        }
    }

    pub fn set_monday(&mut self, on: bool) {
        if self.flags.monday == on {
            return;
        }
        self.flags.monday = on;
        if on {
            self.global_speed *= self.config.monday_speed_mult;
            self.events.log(LogKind::Chaos, "Monday Mode activated. Everything is grey.");
            self.events.toast("Monday Mode: everything is terrible.");
            self.chat.announce(&mut self.events, "MONDAY MODE ACTIVATED.");
        } else {
            self.global_speed /= self.config.monday_speed_mult;
            self.events.log(LogKind::Good, "Monday Mode deactivated.");
            self.events.toast("Energy slowly returning...");
            self.chat.announce(&mut self.events, "Monday Mode deactivated.");
        }
        self.events.emit(SimEvent::MondayMode { active: on });
        tracing::info!(monday = on, global_speed = self.global_speed, "monday mode");
    }

    pub fn toggle_monday(&mut self) {
        self.set_monday(!self.flags.monday);
    }

    /// Everyone but the Observer runs for the nearest exit; no-op while ringing
    pub fn fire_alarm(&mut self) {
        if self.flags.alarm_active {
            return;
        }
        self.flags.alarm_active = true;
        self.alarm_timer = self.config.alarm_duration;

        let evacuees: Vec<AgentId> = self
            .agents
            .iter()
            .filter(|a| !a.is_observer() && !a.is_escaped())
            .map(|a| a.id)
            .collect();
        for id in &evacuees {
            self.unseat(*id);
            let Some(agent) = self.agents.get_mut(*id) else {
                continue;
            };
            agent.state = AgentState::Panicking;
            agent.panic_target = self.layout.nearest_exit(agent.pos);
            self.events.particles(agent.pos, ParticleKind::FireSpark, 3);
        }

        self.events.log(LogKind::Chaos, "FIRE ALARM! Evacuate NOW!");
        self.chat.announce(&mut self.events, "FIRE ALARM! Everybody out!");
        tracing::info!(evacuees = evacuees.len(), "fire alarm");
    }

    /// Break the coffee machine; no-op while it is already broken
    pub fn coffee_spill(&mut self) {
        if self.env.coffee.broken {
            return;
        }
        self.env.coffee.broken = true;
        self.env.coffee.repair_timer = self.config.coffee_spill_duration;
        self.flags.coffee_broken = true;

        let culprit = self
            .first_of(Archetype::ChaosAgent)
            .or_else(|| self.first_of(Archetype::Wanderer));
        for agent in self.agents.iter_mut() {
            if matches!(agent.state, AgentState::HeadingToCoffee | AgentState::AtCoffee) {
                agent.state = AgentState::Wandering;
                agent.heading = self.rng.gen_range(0.0..std::f32::consts::TAU);
            }
        }

        let center = self.env.coffee_center();
        self.events.particles(center, ParticleKind::CoffeeSplash, 12);
        let who = culprit.as_ref().map_or("Someone", |(name, _)| name.as_str());
        self.events
            .log(LogKind::Warning, format!("Coffee machine broken! {who} is looking guilty."));
        self.events.toast("Coffee machine OUT OF ORDER!");
        if let Some((name, archetype)) = &culprit {
            self.chat
                .say(&mut self.events, name, Some(*archetype), "I may have broken the coffee machine...");
        }
        tracing::info!(culprit = who, "coffee spill");
    }

    /// Everyone stops to read their phone
    pub fn reply_all(&mut self) {
        let culprit = self
            .first_of(Archetype::ChaosAgent)
            .or_else(|| self.first_of(Archetype::Gossip))
            .or_else(|| self.agents.iter().next().map(|a| (a.name.clone(), a.archetype())));

        let readers: Vec<AgentId> = self
            .agents
            .iter()
            .filter(|a| !a.is_observer())
            .filter(|a| !matches!(a.state, AgentState::Panicking | AgentState::Escaped))
            .map(|a| a.id)
            .collect();
        for id in &readers {
            if self.agents.get(*id).map(|a| a.state) == Some(AgentState::Seated) {
                self.unseat(*id);
            }
            let freeze = self.config.reply_all_freeze.sample(&mut self.rng);
            let show_phone = self.rng.gen::<f32>() < 0.3;
            if let Some(agent) = self.agents.get_mut(*id) {
                agent.state = AgentState::ReadingPhone;
                agent.state_timer = freeze;
                agent.stop();
                if show_phone {
                    self.events.particles(agent.pos, ParticleKind::Phone, 3);
                }
            }
        }

        self.events
            .log(LogKind::Warning, "Reply-All email sent! Everyone is distracted.");
        self.events.toast("REPLY-ALL chaos! The damage is done.");
        if let Some((name, archetype)) = &culprit {
            self.chat.say(&mut self.events, name, Some(*archetype), "Sent. Wait, REPLY ALL?!");
        }
        tracing::info!(readers = readers.len(), "reply-all");
    }

    /// A seated Grinder or any Wanderer dozes off at a desk
    pub fn power_nap(&mut self) -> Option<AgentId> {
        let candidates: Vec<AgentId> = self
            .agents
            .iter()
            .filter(|a| match a.archetype() {
                Archetype::Grinder => a.state == AgentState::Seated,
                Archetype::Wanderer => !matches!(a.state, AgentState::Panicking | AgentState::Escaped),
                _ => false,
            })
            .map(|a| a.id)
            .collect();
        let id = *candidates.choose(&mut self.rng)?;

        let seated = self.agents.get(id).map(|a| a.state) == Some(AgentState::Seated);
        let mut seat = None;
        if !seated {
            let pos = self.agents.get(id)?.pos;
            let desk = self.desks.nearest_free(pos, Some(id)).map(|d| (d.id, d.seat_position()));
            if let Some((desk, at)) = desk {
                if self.desks.claim(id, desk) {
                    seat = Some(at);
                }
            }
        }

        let duration = self.config.power_nap_duration.sample(&mut self.rng);
        let agent = self.agents.get_mut(id)?;
        if let Some(at) = seat {
            agent.pos = at;
        }
        agent.state = AgentState::PowerNap;
        agent.state_timer = duration;
        agent.stop();
        let (name, archetype) = (agent.name.clone(), agent.archetype());

        self.events
            .log(LogKind::Info, format!("{name} is power napping at their desk."));
        self.events.toast(format!("{name} is power napping. Shhh."));
        self.chat.say(&mut self.events, &name, Some(archetype), "*falls asleep at desk* zzz...");
        tracing::info!(agent = id.0, duration, "power nap");
        Some(id)
    }

    /// A random active agent starts blasting music; no-op while playing
    pub fn loud_music(&mut self) -> Option<AgentId> {
        if self.env.music.is_some() {
            return None;
        }
        let candidates: Vec<AgentId> = self
            .agents
            .iter()
            .filter(|a| !a.is_observer() && !a.is_escaped())
            .map(|a| a.id)
            .collect();
        let id = *candidates.choose(&mut self.rng)?;
        let agent = self.agents.get(id)?;
        let (name, archetype, pos) = (agent.name.clone(), agent.archetype(), agent.pos);

        self.env.music = Some(MusicSource {
            pos,
            agent: id,
            timer: self.config.loud_music_duration,
        });
        self.events
            .log(LogKind::Warning, format!("{name} is playing VERY loud music."));
        self.events
            .toast(format!("{name} playing full blast! Agents fleeing."));
        self.chat.say(&mut self.events, &name, Some(archetype), "*plays EXTREMELY loud music*");
        tracing::info!(agent = id.0, "loud music");
        Some(id)
    }

    /// A new Intern walks in from the edge
    pub fn new_hire(&mut self) -> AgentId {
        let pos = self.layout.random_edge_position(&mut self.rng);
        let id = self.insert_agent(Archetype::Intern, pos);
        let name = self.agents.get(id).map(|a| a.name.clone()).unwrap_or_default();

        self.events
            .log(LogKind::Good, format!("New hire {name} joined the office!"));
        self.events.toast(format!("{name} has joined as intern!"));
        self.chat
            .say(&mut self.events, &name, Some(Archetype::Intern), "Hi everyone! Excited to be here!");
        tracing::info!(agent = id.0, "new hire");
        id
    }

    /// Open the break-room table; no-op while it is open
    pub fn ping_pong(&mut self) {
        if self.env.ping_pong.is_some() {
            return;
        }
        let pos = Vec2::new(self.layout.width - PING_PONG_OFFSET.x, PING_PONG_OFFSET.y);
        self.env.ping_pong = Some(PingPongZone {
            pos,
            radius: self.config.ping_pong_radius,
            timer: self.config.ping_pong_duration,
        });
        self.events
            .log(LogKind::Info, "Ping Pong table deployed! Break room open.");
        self.events.toast("Ping Pong! Break room is OPEN!");
        self.chat.announce(&mut self.events, "Ping Pong table is open!");
        tracing::info!("ping pong");
    }

    fn first_of(&self, archetype: Archetype) -> Option<(String, Archetype)> {
        self.agents
            .iter()
            .find(|a| a.archetype() == archetype)
            .map(|a| (a.name.clone(), archetype))
    }

    pub(crate) fn age_disturbances(&mut self, dt: f32) {
        self.age_pizzas(dt);
        self.age_cat(dt);
        self.age_meeting(dt);
        self.age_alarm(dt);
        self.age_coffee(dt);
        self.age_music(dt);
        self.age_ping_pong(dt);
    }

    fn age_pizzas(&mut self, dt: f32) {
        let before = self.env.pizzas.len();
        for pizza in self.env.pizzas.iter_mut() {
            pizza.timer -= dt;
        }
        self.env.pizzas.retain(|p| p.timer > 0.0);
        let eaten = before - self.env.pizzas.len();

        for _ in 0..eaten {
            self.events.log(LogKind::Info, "Pizza demolished. Back to work.");
            for agent in self.agents.iter_mut() {
                if agent.archetype() == Archetype::Grinder && agent.state == AgentState::PostPizza {
                    agent.state = AgentState::SeekingDesk;
                    agent.set_desk_target(None);
                }
            }
        }
    }

    fn age_cat(&mut self, dt: f32) {
        let Some(cat) = self.env.cat.as_mut() else {
            return;
        };
        cat.timer -= dt;
        if cat.timer <= 0.0 {
            self.env.cat = None;
            for agent in self.agents.iter_mut() {
                agent.cat_response = CatResponse::None;
            }
            self.events
                .log(LogKind::Info, "Cat wandered off. Office returns to normal.");
            return;
        }

        if self.rng.gen::<f32>() < CAT_TURN_CHANCE * dt {
            cat.heading += (self.rng.gen::<f32>() - 0.5) * std::f32::consts::PI;
        }
        let speed = self.config.base_speed * self.config.cat_speed_mult;
        cat.vel = steering::heading_velocity(cat.heading, speed);
        let moved = cat.pos + cat.vel * dt;
        let clamped = self.layout.clamp(moved, CAT_MARGIN);
        if clamped.x != moved.x {
            cat.heading = std::f32::consts::PI - cat.heading;
        }
        if clamped.y != moved.y {
            cat.heading = -cat.heading;
        }
        cat.pos = clamped;
    }

    fn age_meeting(&mut self, dt: f32) {
        let Some(room) = self.env.meeting.as_mut() else {
            return;
        };
        room.timer -= dt;
        if room.timer <= 0.0 {
            self.end_meeting();
        }
    }

    fn age_alarm(&mut self, dt: f32) {
        if !self.flags.alarm_active {
            return;
        }
        self.alarm_timer -= dt;
        if self.alarm_timer > 0.0 {
            return;
        }
        self.flags.alarm_active = false;

        let extras = self.friday_extras.clone();
        let evacuated = self.remove_agents_where(|a| a.is_escaped());
        for agent in &evacuated {
            let pos = self.layout.random_edge_position(&mut self.rng);
            let delay = self.config.respawn_delay.sample(&mut self.rng);
            self.respawn_queue.push(PendingRespawn {
                archetype: agent.archetype(),
                pos,
                delay,
                friday_extra: extras.contains(&agent.id),
            });
        }

        // Stragglers who never reached an exit
        let daze = self.config.post_alarm_duration;
        for agent in self.agents.iter_mut().filter(|a| a.state == AgentState::Panicking) {
            agent.state = AgentState::PostAlarm;
            agent.state_timer = daze;
        }

        self.events
            .log(LogKind::Good, "All clear! Agents return from evacuation.");
        self.chat.announce(&mut self.events, "All clear. Back inside, everyone.");
        tracing::info!(evacuated = evacuated.len(), "alarm over");
    }

    fn age_coffee(&mut self, dt: f32) {
        if !self.env.coffee.broken {
            return;
        }
        self.env.coffee.repair_timer -= dt;
        if self.env.coffee.repair_timer <= 0.0 {
            self.env.coffee.broken = false;
            self.env.coffee.repair_timer = 0.0;
            self.flags.coffee_broken = false;
            self.events.log(LogKind::Good, "Coffee machine repaired!");
            self.chat.announce(&mut self.events, "Coffee machine is back online!");
        }
    }

    fn age_music(&mut self, dt: f32) {
        let Some(music) = self.env.music.as_mut() else {
            return;
        };
        music.timer -= dt;
        if let Some(agent) = self.agents.get(music.agent) {
            music.pos = agent.pos;
        }
        if self.rng.gen::<f32>() < 0.3 {
            self.events.particles(music.pos, ParticleKind::Music, 2);
        }
        if music.timer <= 0.0 {
            self.env.music = None;
            self.events.log(LogKind::Info, "Music stopped. Office recovers.");
        }
    }

    fn age_ping_pong(&mut self, dt: f32) {
        let Some(zone) = self.env.ping_pong.as_mut() else {
            return;
        };
        zone.timer -= dt;
        if zone.timer <= 0.0 {
            self.env.ping_pong = None;
            self.events.log(LogKind::Info, "Break time over. Back to work.");
        }
    }

    /// Walk evacuees back in once their delay runs out
    pub(crate) fn process_respawns(&mut self, dt: f32) {
        if self.respawn_queue.is_empty() {
            return;
        }
        let mut due = Vec::new();
        self.respawn_queue.retain_mut(|r| {
            r.delay -= dt;
            if r.delay <= 0.0 {
                due.push(*r);
                false
            } else {
                true
            }
        });

        let daze = self.config.post_alarm_duration;
        for r in due {
            let id = self.insert_agent(r.archetype, r.pos);
            if r.friday_extra {
                self.friday_extras.insert(id);
            }
            if let Some(agent) = self.agents.get_mut(id) {
                agent.state = AgentState::PostAlarm;
                agent.state_timer = daze;
            }
            tracing::debug!(agent = id.0, archetype = %r.archetype, "respawned after alarm");
        }
    }
}
