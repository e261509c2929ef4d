//! Disturbance commands as data
//!
//! The CLI and scripted hosts describe what to do as strings like
//! `pizza:400,300` or `spawn:grinder:200,200`; [`Command`] parses them and
//! [`World::apply`] dispatches to the matching disturbance.

use std::fmt;
use std::str::FromStr;

use crate::core::error::OfficeError;
use crate::core::types::{Rect, Vec2};
use crate::entity::agent::Archetype;
use crate::world::World;

/// Size of a meeting room placed by position alone
pub const MEETING_ROOM_SIZE: Vec2 = Vec2 { x: 180.0, y: 120.0 };

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Spawn { archetype: Archetype, at: Vec2 },
    Pizza { at: Vec2 },
    Cat { at: Vec2 },
    /// Meeting room centred on `at`
    Meeting { at: Vec2 },
    Alarm,
    Friday(bool),
    /// Toggles
    Monday,
    CoffeeSpill,
    ReplyAll,
    PowerNap,
    LoudMusic,
    NewHire,
    PingPong,
    Friday1701,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Spawn { .. } => "spawn",
            Command::Pizza { .. } => "pizza",
            Command::Cat { .. } => "cat",
            Command::Meeting { .. } => "meeting",
            Command::Alarm => "alarm",
            Command::Friday(true) => "friday-on",
            Command::Friday(false) => "friday-off",
            Command::Monday => "monday",
            Command::CoffeeSpill => "coffee-spill",
            Command::ReplyAll => "reply-all",
            Command::PowerNap => "power-nap",
            Command::LoudMusic => "loud-music",
            Command::NewHire => "new-hire",
            Command::PingPong => "ping-pong",
            Command::Friday1701 => "friday-1701",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Spawn { archetype, at } => write!(f, "spawn:{}:{},{}", archetype.name(), at.x, at.y),
            Command::Pizza { at } | Command::Cat { at } | Command::Meeting { at } => {
                write!(f, "{}:{},{}", self.name(), at.x, at.y)
            }
            _ => f.write_str(self.name()),
        }
    }
}

fn parse_point(s: &str) -> Result<Vec2, OfficeError> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| OfficeError::InvalidCommand(format!("expected x,y but got '{s}'")))?;
    let coord = |v: &str| {
        v.trim()
            .parse::<f32>()
            .map_err(|_| OfficeError::InvalidCommand(format!("bad coordinate '{v}'")))
    };
    Ok(Vec2::new(coord(x)?, coord(y)?))
}

impl FromStr for Command {
    type Err = OfficeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (head, rest) = match s.split_once(':') {
            Some((head, rest)) => (head, Some(rest)),
            None => (s, None),
        };

        let command = match (head.to_ascii_lowercase().as_str(), rest) {
            ("pizza", Some(p)) => Command::Pizza { at: parse_point(p)? },
            ("cat", Some(p)) => Command::Cat { at: parse_point(p)? },
            ("meeting", Some(p)) => Command::Meeting { at: parse_point(p)? },
            ("spawn", Some(rest)) => {
                let (archetype, p) = rest
                    .split_once(':')
                    .ok_or_else(|| OfficeError::InvalidCommand(format!("expected spawn:<archetype>:x,y in '{s}'")))?;
                Command::Spawn {
                    archetype: archetype.parse()?,
                    at: parse_point(p)?,
                }
            }
            ("alarm", None) => Command::Alarm,
            ("friday-on", None) => Command::Friday(true),
            ("friday-off", None) => Command::Friday(false),
            ("friday-1701", None) => Command::Friday1701,
            ("monday", None) => Command::Monday,
            ("coffee-spill", None) => Command::CoffeeSpill,
            ("reply-all", None) => Command::ReplyAll,
            ("power-nap", None) => Command::PowerNap,
            ("loud-music", None) => Command::LoudMusic,
            ("new-hire", None) => Command::NewHire,
            ("ping-pong", None) => Command::PingPong,
            _ => return Err(OfficeError::InvalidCommand(s.to_string())),
        };
        Ok(command)
    }
}

impl World {
    pub fn apply(&mut self, command: &Command) {
        tracing::debug!(%command, "apply command");
        match *command {
            Command::Spawn { archetype, at } => {
                self.spawn_agent(archetype, at);
            }
            Command::Pizza { at } => self.drop_pizza(at),
            Command::Cat { at } => self.drop_cat(at),
            Command::Meeting { at } => {
                let size = MEETING_ROOM_SIZE;
                self.place_meeting(Rect::new(at.x - size.x / 2.0, at.y - size.y / 2.0, size.x, size.y));
            }
            Command::Alarm => self.fire_alarm(),
            Command::Friday(on) => self.set_friday(on),
            Command::Monday => self.toggle_monday(),
            Command::CoffeeSpill => self.coffee_spill(),
            Command::ReplyAll => self.reply_all(),
            Command::PowerNap => {
                self.power_nap();
            }
            Command::LoudMusic => {
                self.loud_music();
            }
            Command::NewHire => {
                self.new_hire();
            }
            Command::PingPong => self.ping_pong(),
            Command::Friday1701 => self.trigger_1701(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_positional_commands() {
        assert_eq!(
            "pizza:400,300".parse::<Command>().unwrap(),
            Command::Pizza { at: Vec2::new(400.0, 300.0) }
        );
        assert_eq!(
            "spawn:chaos-agent:10, 20".parse::<Command>().unwrap(),
            Command::Spawn {
                archetype: Archetype::ChaosAgent,
                at: Vec2::new(10.0, 20.0)
            }
        );
        assert_eq!("friday-off".parse::<Command>().unwrap(), Command::Friday(false));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!("pizza".parse::<Command>(), Err(OfficeError::InvalidCommand(_))));
        assert!(matches!("pizza:1".parse::<Command>(), Err(OfficeError::InvalidCommand(_))));
        assert!(matches!("alarm:3,4".parse::<Command>(), Err(OfficeError::InvalidCommand(_))));
        assert!(matches!(
            "spawn:ceo:1,1".parse::<Command>(),
            Err(OfficeError::UnknownArchetype(_))
        ));
    }

    #[test]
    fn test_display_parses_back() {
        for text in ["cat:5,6", "spawn:Grinder:1,2", "ping-pong", "friday-on"] {
            let cmd: Command = text.parse().unwrap();
            assert_eq!(cmd.to_string().parse::<Command>().unwrap(), cmd);
        }
    }

    #[test]
    fn test_apply_meeting_centres_room() {
        let mut world = World::builder().empty().seed(1).build().unwrap();
        world.apply(&"meeting:800,450".parse().unwrap());
        let room = world.environment().meeting.as_ref().unwrap();
        assert_eq!(room.rect.center(), Vec2::new(800.0, 450.0));
        assert_eq!(room.rect.w, 180.0);
    }
}
