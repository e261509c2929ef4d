//! Outward events for the presentation layer
//!
//! The world never calls back into its host. Events accumulate in an
//! [`EventLog`] during a tick and are drained by the caller afterwards.

use std::collections::VecDeque;

use serde::Serialize;

use crate::core::types::Vec2;
use crate::entity::agent::Archetype;

/// Severity category of a log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Chaos,
    Good,
    Info,
    Warning,
}

/// Hint for a particle burst; the core does not simulate particles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticleKind {
    ChaosSwitch,
    Dispersal,
    DeskBreak,
    Zzz,
    Pizza,
    FireSpark,
    CoffeeSplash,
    Music,
    Phone,
    Notes,
    Glow,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SimEvent {
    Log { text: String, kind: LogKind },
    Toast { text: String },
    ChaosChanged { value: f32 },
    ObserverUnlocked,
    PaletteShift { active: bool },
    MondayMode { active: bool },
    /// Chat line; `archetype` is `None` for system announcements
    Chat {
        speaker: String,
        archetype: Option<Archetype>,
        text: String,
    },
    Particles { at: Vec2, kind: ParticleKind, count: u32 },
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub id: u64,
    /// Wall-clock "HH:MM" at the time of logging
    pub timestamp: String,
    pub text: String,
    pub kind: LogKind,
}

/// Pending events plus a bounded newest-first log history
#[derive(Debug)]
pub struct EventLog {
    pending: Vec<SimEvent>,
    history: VecDeque<LogEntry>,
    capacity: usize,
    next_id: u64,
    stamp: String,
}

impl EventLog {
    pub const HISTORY_CAPACITY: usize = 50;

    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            history: VecDeque::with_capacity(Self::HISTORY_CAPACITY),
            capacity: Self::HISTORY_CAPACITY,
            next_id: 0,
            stamp: String::from("00:00"),
        }
    }

    /// Timestamp applied to subsequent log entries
    pub fn set_stamp(&mut self, stamp: String) {
        self.stamp = stamp;
    }

    pub fn log(&mut self, kind: LogKind, text: impl Into<String>) {
        let text = text.into();
        match kind {
            LogKind::Chaos | LogKind::Warning => tracing::info!(?kind, "{}", text),
            LogKind::Good | LogKind::Info => tracing::debug!(?kind, "{}", text),
        }

        self.history.push_front(LogEntry {
            id: self.next_id,
            timestamp: self.stamp.clone(),
            text: text.clone(),
            kind,
        });
        self.next_id += 1;
        self.history.truncate(self.capacity);

        self.pending.push(SimEvent::Log { text, kind });
    }

    pub fn toast(&mut self, text: impl Into<String>) {
        self.pending.push(SimEvent::Toast { text: text.into() });
    }

    pub fn particles(&mut self, at: Vec2, kind: ParticleKind, count: u32) {
        self.pending.push(SimEvent::Particles { at, kind, count });
    }

    pub fn emit(&mut self, event: SimEvent) {
        self.pending.push(event);
    }

    pub fn drain(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn pending(&self) -> &[SimEvent] {
        &self.pending
    }

    /// Newest first
    pub fn history(&self) -> impl Iterator<Item = &LogEntry> {
        self.history.iter()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_is_bounded_newest_first() {
        let mut log = EventLog::new();
        for i in 0..60 {
            log.log(LogKind::Info, format!("line {i}"));
        }
        let history: Vec<_> = log.history().collect();
        assert_eq!(history.len(), 50);
        assert_eq!(history[0].text, "line 59");
        assert_eq!(history[49].text, "line 10");
    }

    #[test]
    fn test_drain_empties_pending() {
        let mut log = EventLog::new();
        log.toast("hi");
        log.particles(Vec2::ZERO, ParticleKind::Zzz, 2);
        assert_eq!(log.drain().len(), 2);
        assert!(log.drain().is_empty());
    }

    #[test]
    fn test_log_uses_current_stamp() {
        let mut log = EventLog::new();
        log.set_stamp("17:01".into());
        log.log(LogKind::Chaos, "entropy");
        assert_eq!(log.history().next().map(|e| e.timestamp.as_str()), Some("17:01"));
    }
}
