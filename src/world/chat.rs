//! Idle office chatter fed to the presentation layer
//!
//! A random active agent says something in character every few seconds.
//! Disturbances also post system announcements through the same feed so
//! duplicate suppression covers both.

use std::collections::VecDeque;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::core::config::SimulationConfig;
use crate::entity::agent::{Agent, Archetype};
use crate::world::events::{EventLog, SimEvent};

/// Lines compared against when suppressing repeats
const RECENT_LINES: usize = 3;

const SYSTEM_SPEAKER: &str = "SYSTEM";

fn idle_lines(archetype: Archetype) -> &'static [&'static str] {
    match archetype {
        Archetype::Grinder => &[
            "Anyone seen the TPS reports?",
            "*types aggressively*",
            "Just one more commit...",
            "The deadline is WHEN?!",
            "Tab count: 73. Send help.",
            "Heads down, do not disturb.",
            "This worked yesterday, I swear.",
        ],
        Archetype::Wanderer => &[
            "Is there any coffee left?",
            "*wanders aimlessly*",
            "Has anyone seen my mug?",
            "I forgot why I got up...",
            "Taking the scenic route to the printer.",
            "Walking meeting with myself.",
        ],
        Archetype::Gossip => &[
            "Did you hear about the new policy?",
            "Between you and me...",
            "I heard it from Janet.",
            "I'm not saying it's true, but...",
            "The tea today is PIPING hot.",
        ],
        Archetype::Manager => &[
            "Let's circle back on that.",
            "Can we take this offline?",
            "I'll need that by end of day.",
            "Quick sync? Five minutes, tops.",
            "Synergy. Think about it.",
        ],
        Archetype::Intern => &[
            "Is this where the stapler goes?",
            "What does this acronym mean?",
            "Should I be taking notes?",
            "I'll just follow along...",
            "Unpaid, but learning!",
        ],
        Archetype::ChaosAgent => &[
            "What does this button do?",
            "I have an idea. You won't like it.",
            "Rules are more like suggestions.",
            "*rearranges everything*",
            "Nobody saw anything.",
        ],
        Archetype::Observer => &["...", "*takes notes*", "Interesting."],
    }
}

/// Cadence timer plus the recent-line window used for dedupe
#[derive(Debug, Clone)]
pub struct ChatFeed {
    timer: f32,
    recent: VecDeque<String>,
}

impl ChatFeed {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            timer: config.chat_first_delay,
            recent: VecDeque::with_capacity(RECENT_LINES),
        }
    }

    /// Post a line unless it repeats one of the last few. Returns whether it was posted.
    pub fn say(
        &mut self,
        events: &mut EventLog,
        speaker: &str,
        archetype: Option<Archetype>,
        text: &str,
    ) -> bool {
        if self.recent.iter().any(|line| line == text) {
            return false;
        }
        if self.recent.len() == RECENT_LINES {
            self.recent.pop_back();
        }
        self.recent.push_front(text.to_string());
        events.emit(SimEvent::Chat {
            speaker: speaker.to_string(),
            archetype,
            text: text.to_string(),
        });
        true
    }

    pub fn announce(&mut self, events: &mut EventLog, text: &str) -> bool {
        self.say(events, SYSTEM_SPEAKER, None, text)
    }

    /// Count down and, when due, let a random active agent speak
    pub fn update<'a, R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        agents: impl Iterator<Item = &'a Agent>,
        events: &mut EventLog,
        config: &SimulationConfig,
        rng: &mut R,
    ) {
        self.timer -= dt;
        if self.timer > 0.0 {
            return;
        }
        self.timer = config.chat_interval.sample(rng);

        let active: Vec<&Agent> = agents.filter(|a| !a.is_escaped()).collect();
        let Some(agent) = active.choose(rng) else {
            return;
        };
        let archetype = agent.archetype();
        if let Some(line) = idle_lines(archetype).choose(rng) {
            self.say(events, &agent.name, Some(archetype), line);
        }
    }
}
