//! Agent data model
//!
//! An agent is one office worker. Shared kinematics and override timers
//! live directly on [`Agent`]; everything only one archetype cares about
//! lives in its [`Role`] variant.

use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::config::SimulationConfig;
use crate::core::error::OfficeError;
use crate::core::types::{AgentId, DeskId, Vec2};

/// The seven behavior categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Archetype {
    /// Desk-seeking worker
    Grinder,
    Wanderer,
    Gossip,
    Manager,
    Intern,
    ChaosAgent,
    /// Unlockable; patrols the perimeter and is immune to panic
    Observer,
}

impl Archetype {
    pub const ALL: [Archetype; 7] = [
        Archetype::Grinder,
        Archetype::Wanderer,
        Archetype::Gossip,
        Archetype::Manager,
        Archetype::Intern,
        Archetype::ChaosAgent,
        Archetype::Observer,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Archetype::Grinder => "Grinder",
            Archetype::Wanderer => "Wanderer",
            Archetype::Gossip => "Gossip",
            Archetype::Manager => "Manager",
            Archetype::Intern => "Intern",
            Archetype::ChaosAgent => "Chaos Agent",
            Archetype::Observer => "Observer",
        }
    }

    /// Base display colour (0xRRGGBB)
    pub fn base_tint(&self) -> u32 {
        match self {
            Archetype::Grinder => 0x4A90E2,
            Archetype::Wanderer => 0x7ED321,
            Archetype::Gossip => 0xF5A623,
            Archetype::Manager => 0x8B4AE2,
            Archetype::Intern => 0x50E3C2,
            Archetype::ChaosAgent => 0xE24A4A,
            Archetype::Observer => 0xC0C0C0,
        }
    }

    /// State an agent of this archetype returns to when an override ends
    pub fn default_state(&self) -> AgentState {
        match self {
            Archetype::Grinder => AgentState::SeekingDesk,
            Archetype::Wanderer => AgentState::Wandering,
            Archetype::Gossip => AgentState::SeekingCluster,
            Archetype::Manager => AgentState::Scanning,
            Archetype::Intern => AgentState::Idle,
            Archetype::ChaosAgent => AgentState::ChaosWander,
            Archetype::Observer => AgentState::PerimeterPatrol,
        }
    }

    /// States this archetype's own state machine can be in
    pub fn native_states(&self) -> &'static [AgentState] {
        use AgentState::*;
        match self {
            Archetype::Grinder => &[SeekingDesk, Seated, Disturbed],
            Archetype::Wanderer => &[Wandering, HeadingToCoffee, AtCoffee, BumpRecovery],
            Archetype::Gossip => &[SeekingCluster, InHuddle, MovingOn],
            Archetype::Manager => &[Scanning, Approaching, Dispersing, Confused, Herding],
            Archetype::Intern => &[Idle, Following],
            Archetype::ChaosAgent => &[ChaosWander, ChaosGrind, ChaosGossip, ChaosSprint, ChaosFreeze],
            Archetype::Observer => &[PerimeterPatrol],
        }
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Archetype {
    type Err = OfficeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "grinder" => Ok(Archetype::Grinder),
            "wanderer" => Ok(Archetype::Wanderer),
            "gossip" => Ok(Archetype::Gossip),
            "manager" => Ok(Archetype::Manager),
            "intern" => Ok(Archetype::Intern),
            "chaos" | "chaosagent" => Ok(Archetype::ChaosAgent),
            "observer" => Ok(Archetype::Observer),
            _ => Err(OfficeError::UnknownArchetype(s.to_string())),
        }
    }
}

/// Behavioral state tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentState {
    // Grinder
    SeekingDesk,
    Seated,
    Disturbed,
    // Wanderer
    Wandering,
    HeadingToCoffee,
    AtCoffee,
    BumpRecovery,
    // Gossip
    SeekingCluster,
    InHuddle,
    MovingOn,
    // Manager
    Scanning,
    Approaching,
    Dispersing,
    Confused,
    Herding,
    // Intern
    Idle,
    Following,
    // Chaos agent
    ChaosWander,
    ChaosGrind,
    ChaosGossip,
    ChaosSprint,
    ChaosFreeze,
    // Observer
    PerimeterPatrol,
    // Shared overrides
    GridOverride,
    Panicking,
    Escaped,
    PostAlarm,
    Eating,
    PostPizza,
    InMeeting,
    PostMeeting,
    ReadingPhone,
    PowerNap,
}

impl AgentState {
    pub const OVERRIDES: [AgentState; 10] = [
        AgentState::GridOverride,
        AgentState::Panicking,
        AgentState::Escaped,
        AgentState::PostAlarm,
        AgentState::Eating,
        AgentState::PostPizza,
        AgentState::InMeeting,
        AgentState::PostMeeting,
        AgentState::ReadingPhone,
        AgentState::PowerNap,
    ];

    pub fn is_override(&self) -> bool {
        Self::OVERRIDES.contains(self)
    }

    /// Whether an agent of `archetype` may legally be in this state
    pub fn is_legal_for(&self, archetype: Archetype) -> bool {
        if archetype == Archetype::Observer {
            return *self == AgentState::PerimeterPatrol;
        }
        self.is_override() || archetype.native_states().contains(self)
    }

    /// States in which the agent stays where it is
    pub fn is_stationary(&self) -> bool {
        matches!(self, AgentState::Seated | AgentState::Escaped | AgentState::InMeeting)
    }

    /// Free-roaming states that ambient disturbances (music, ping-pong) may nudge
    pub fn is_roaming(&self) -> bool {
        matches!(
            self,
            AgentState::Wandering
                | AgentState::SeekingCluster
                | AgentState::Idle
                | AgentState::ChaosWander
        )
    }
}

/// Chaos agent sub-mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChaosMode {
    Wander,
    Grind,
    Gossip,
    Sprint,
    Freeze,
}

impl ChaosMode {
    pub const ALL: [ChaosMode; 5] = [
        ChaosMode::Wander,
        ChaosMode::Grind,
        ChaosMode::Gossip,
        ChaosMode::Sprint,
        ChaosMode::Freeze,
    ];

    pub fn state(&self) -> AgentState {
        match self {
            ChaosMode::Wander => AgentState::ChaosWander,
            ChaosMode::Grind => AgentState::ChaosGrind,
            ChaosMode::Gossip => AgentState::ChaosGossip,
            ChaosMode::Sprint => AgentState::ChaosSprint,
            ChaosMode::Freeze => AgentState::ChaosFreeze,
        }
    }

    /// Uniform pick among modes other than `exclude`
    pub fn random<R: Rng + ?Sized>(exclude: Option<ChaosMode>, rng: &mut R) -> ChaosMode {
        let choices: Vec<ChaosMode> = Self::ALL
            .iter()
            .copied()
            .filter(|m| Some(*m) != exclude)
            .collect();
        choices.choose(rng).copied().unwrap_or(ChaosMode::Wander)
    }
}

/// Disposition toward the office cat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CatResponse {
    #[default]
    None,
    Attracted,
    Avoidant,
}

/// Rumour tint spread by gossips
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GossipColor {
    /// Degrees, kept in [0, 360)
    pub hue: f32,
    pub saturation: f32,
    pub lightness: f32,
    pub decay_timer: f32,
}

impl GossipColor {
    pub fn new(hue: f32, decay_timer: f32) -> Self {
        Self {
            hue: hue.rem_euclid(360.0),
            saturation: 0.5,
            lightness: 0.65,
            decay_timer,
        }
    }

    /// Move the hue toward `target` by `amount` of the difference
    pub fn blend_toward(&mut self, target: f32, amount: f32) {
        self.hue = (self.hue + (target - self.hue) * amount).rem_euclid(360.0);
    }
}

/// One recorded motion frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSample {
    pub velocity: Vec2,
    pub state: AgentState,
    /// Simulation time in seconds
    pub timestamp: f64,
}

/// Fixed-capacity ring buffer of recent motion, newest overwrites oldest
#[derive(Debug, Clone)]
pub struct MotionHistory {
    samples: Vec<MotionSample>,
    capacity: usize,
    head: usize,
}

impl MotionHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: Vec::with_capacity(capacity),
            capacity,
            head: 0,
        }
    }

    pub fn record(&mut self, sample: MotionSample) {
        if self.samples.len() < self.capacity {
            self.samples.push(sample);
        } else {
            self.samples[self.head] = sample;
        }
        self.head = (self.head + 1) % self.capacity;
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample whose timestamp is nearest `time`, if within `staleness` seconds of it
    pub fn sample_at(&self, time: f64, staleness: f64) -> Option<&MotionSample> {
        self.samples
            .iter()
            .map(|s| (s, (s.timestamp - time).abs()))
            .filter(|(_, diff)| *diff < staleness)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(s, _)| s)
    }
}

/// Archetype plus the fields only that archetype uses
#[derive(Debug, Clone)]
pub enum Role {
    Grinder {
        /// Desk this grinder has claimed and is heading to or sitting at
        desk: Option<DeskId>,
    },
    Wanderer {
        coffee_timer: f32,
    },
    Gossip {
        personal_hue: f32,
        huddle_centroid: Vec2,
    },
    Manager {
        target: Vec2,
        scan_timer: f32,
    },
    Intern {
        history: MotionHistory,
        follow: Option<AgentId>,
        loop_timer: f32,
    },
    ChaosAgent {
        mode: ChaosMode,
        /// Unclaimed desk loitered near while grinding
        grind_desk: Option<DeskId>,
    },
    Observer {
        /// Position along the perimeter loop in [0, 1)
        perimeter_t: f32,
        note_timer: f32,
    },
}

impl Role {
    pub fn archetype(&self) -> Archetype {
        match self {
            Role::Grinder { .. } => Archetype::Grinder,
            Role::Wanderer { .. } => Archetype::Wanderer,
            Role::Gossip { .. } => Archetype::Gossip,
            Role::Manager { .. } => Archetype::Manager,
            Role::Intern { .. } => Archetype::Intern,
            Role::ChaosAgent { .. } => Archetype::ChaosAgent,
            Role::Observer { .. } => Archetype::Observer,
        }
    }
}

/// An autonomous office worker
#[derive(Debug, Clone)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub role: Role,
    pub state: AgentState,

    pub pos: Vec2,
    pub vel: Vec2,
    /// Radians
    pub heading: f32,
    /// Aura boost, reset every tick
    pub speed_mult: f32,

    /// Generic countdown shared by whichever state is active
    pub state_timer: f32,
    pub eat_timer: f32,
    pub panic_target: Vec2,
    pub grid_target: Vec2,
    pub grid_timer: f32,

    pub cat_response: CatResponse,
    pub gossip_color: Option<GossipColor>,
    pub tint: u32,
    pub alpha: f32,
}

impl Agent {
    pub fn new<R: Rng + ?Sized>(
        id: AgentId,
        archetype: Archetype,
        pos: Vec2,
        name: String,
        config: &SimulationConfig,
        rng: &mut R,
    ) -> Self {
        let heading = rng.gen_range(0.0..std::f32::consts::TAU);
        let mut state = archetype.default_state();
        let mut state_timer = 0.0;
        let mut alpha = 1.0;

        let role = match archetype {
            Archetype::Grinder => Role::Grinder { desk: None },
            Archetype::Wanderer => Role::Wanderer { coffee_timer: 0.0 },
            Archetype::Gossip => Role::Gossip {
                personal_hue: rng.gen_range(0.0..360.0),
                huddle_centroid: Vec2::ZERO,
            },
            Archetype::Manager => Role::Manager {
                target: Vec2::ZERO,
                scan_timer: 0.0,
            },
            Archetype::Intern => Role::Intern {
                history: MotionHistory::new(config.intern_history_len),
                follow: None,
                loop_timer: 0.0,
            },
            Archetype::ChaosAgent => {
                let mode = ChaosMode::random(None, rng);
                state = mode.state();
                state_timer = config.chaos_switch_interval.sample(rng);
                Role::ChaosAgent { mode, grind_desk: None }
            }
            Archetype::Observer => {
                alpha = 0.0;
                Role::Observer {
                    perimeter_t: rng.gen_range(0.0..1.0),
                    note_timer: 0.0,
                }
            }
        };

        Self {
            id,
            name,
            role,
            state,
            pos,
            vel: Vec2::ZERO,
            heading,
            speed_mult: 1.0,
            state_timer,
            eat_timer: 0.0,
            panic_target: Vec2::ZERO,
            grid_target: Vec2::ZERO,
            grid_timer: 0.0,
            cat_response: CatResponse::None,
            gossip_color: None,
            tint: archetype.base_tint(),
            alpha,
        }
    }

    pub fn archetype(&self) -> Archetype {
        self.role.archetype()
    }

    pub fn is_observer(&self) -> bool {
        self.archetype() == Archetype::Observer
    }

    pub fn is_escaped(&self) -> bool {
        self.state == AgentState::Escaped
    }

    /// Hand control back to the archetype's own state machine
    pub fn revert_to_default(&mut self) {
        self.state = self.archetype().default_state();
        if let Role::ChaosAgent { mode, .. } = &mut self.role {
            *mode = ChaosMode::Wander;
        }
    }

    pub fn stop(&mut self) {
        self.vel = Vec2::ZERO;
    }

    /// Grinder's claimed desk
    pub fn desk_target(&self) -> Option<DeskId> {
        match &self.role {
            Role::Grinder { desk } => *desk,
            _ => None,
        }
    }

    pub fn set_desk_target(&mut self, target: Option<DeskId>) {
        if let Role::Grinder { desk } = &mut self.role {
            *desk = target;
        }
    }

    pub fn follow_target(&self) -> Option<AgentId> {
        match &self.role {
            Role::Intern { follow, .. } => *follow,
            _ => None,
        }
    }

    pub fn chaos_mode(&self) -> Option<ChaosMode> {
        match &self.role {
            Role::ChaosAgent { mode, .. } => Some(*mode),
            _ => None,
        }
    }

    pub fn history(&self) -> Option<&MotionHistory> {
        match &self.role {
            Role::Intern { history, .. } => Some(history),
            _ => None,
        }
    }

    /// Drop the rumour tint and restore the archetype colour
    pub fn reset_tint(&mut self) {
        self.gossip_color = None;
        self.tint = self.archetype().base_tint();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn spawn(archetype: Archetype) -> Agent {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        Agent::new(
            AgentId(1),
            archetype,
            Vec2::new(100.0, 100.0),
            "Dave".into(),
            &SimulationConfig::default(),
            &mut rng,
        )
    }

    #[test]
    fn test_new_agents_start_in_legal_state() {
        for archetype in Archetype::ALL {
            let agent = spawn(archetype);
            assert_eq!(agent.archetype(), archetype);
            assert!(agent.state.is_legal_for(archetype), "{archetype} started in {:?}", agent.state);
        }
    }

    #[test]
    fn test_default_state_is_native() {
        for archetype in Archetype::ALL {
            assert!(archetype.native_states().contains(&archetype.default_state()));
        }
    }

    #[test]
    fn test_observer_only_patrols() {
        for state in AgentState::OVERRIDES {
            assert!(!state.is_legal_for(Archetype::Observer));
        }
        assert!(AgentState::PerimeterPatrol.is_legal_for(Archetype::Observer));
        assert!(!AgentState::PerimeterPatrol.is_legal_for(Archetype::Grinder));
    }

    #[test]
    fn test_foreign_native_state_is_illegal() {
        assert!(!AgentState::Seated.is_legal_for(Archetype::Wanderer));
        assert!(!AgentState::Herding.is_legal_for(Archetype::Intern));
        assert!(AgentState::Eating.is_legal_for(Archetype::Intern));
    }

    #[test]
    fn test_observer_starts_invisible() {
        assert_eq!(spawn(Archetype::Observer).alpha, 0.0);
    }

    #[test]
    fn test_revert_resets_chaos_mode() {
        let mut agent = spawn(Archetype::ChaosAgent);
        agent.state = AgentState::Eating;
        agent.revert_to_default();
        assert_eq!(agent.state, AgentState::ChaosWander);
        assert_eq!(agent.chaos_mode(), Some(ChaosMode::Wander));
    }

    #[test]
    fn test_random_chaos_mode_excludes_current() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..200 {
            assert_ne!(ChaosMode::random(Some(ChaosMode::Sprint), &mut rng), ChaosMode::Sprint);
        }
    }

    #[test]
    fn test_archetype_parsing() {
        assert_eq!("chaos-agent".parse::<Archetype>().unwrap(), Archetype::ChaosAgent);
        assert_eq!("GRINDER".parse::<Archetype>().unwrap(), Archetype::Grinder);
        assert!(matches!("ceo".parse::<Archetype>(), Err(OfficeError::UnknownArchetype(_))));
    }

    #[test]
    fn test_history_wraps_and_finds_nearest() {
        let mut history = MotionHistory::new(4);
        for i in 0..10 {
            history.record(MotionSample {
                velocity: Vec2::new(i as f32, 0.0),
                state: AgentState::Idle,
                timestamp: i as f64,
            });
        }
        assert_eq!(history.len(), 4);
        let s = history.sample_at(7.2, 1.0).map(|s| s.velocity.x);
        assert_eq!(s, Some(7.0));
        // Everything older than t=6 has been overwritten
        assert!(history.sample_at(2.0, 1.0).is_none());
    }

    #[test]
    fn test_gossip_color_hue_wraps() {
        let mut color = GossipColor::new(-30.0, 10.0);
        assert!((color.hue - 330.0).abs() < 1e-4);
        color.blend_toward(400.0, 1.0);
        assert!((color.hue - 40.0).abs() < 1e-3);
    }
}
