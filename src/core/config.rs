//! Simulation configuration with documented constants
//!
//! All magic numbers are collected here with explanations of their purpose
//! and how they interact with each other. Speeds are in world units per
//! second, durations in seconds, radii in world units.

use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::error::{OfficeError, Result};

/// Closed range of values sampled uniformly (timers, dwell times)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub min: f32,
    pub max: f32,
}

impl Span {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.max <= self.min {
            self.min
        } else {
            rng.gen_range(self.min..self.max)
        }
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Starting head-count per archetype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Population {
    pub grinders: usize,
    pub wanderers: usize,
    pub gossips: usize,
    pub managers: usize,
    pub interns: usize,
    pub chaos_agents: usize,
}

impl Default for Population {
    fn default() -> Self {
        Self {
            grinders: 8,
            wanderers: 10,
            gossips: 8,
            managers: 2,
            interns: 8,
            chaos_agents: 4,
        }
    }
}

impl Population {
    pub fn total(&self) -> usize {
        self.grinders + self.wanderers + self.gossips + self.managers + self.interns + self.chaos_agents
    }
}

/// Configuration for the simulation systems
///
/// These values have been tuned to produce good emergent behavior.
/// Changing them will affect pacing and feel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    // === WORLD ===
    pub world_width: f32,
    pub world_height: f32,
    /// Agents are clamped this far inside the world bounds
    pub wall_margin: f32,
    /// Largest dt a single tick will integrate; longer frames are truncated
    pub tick_dt_cap: f32,

    // === MOVEMENT ===
    /// Reference speed every archetype multiplier is applied to
    pub base_speed: f32,
    /// Separation kicks in below this distance
    pub personal_radius: f32,
    /// Peak separation acceleration at zero distance
    pub separation_force: f32,
    /// Collision radius used for desk push-out
    pub agent_radius: f32,
    /// Per-tick velocity retention after integration
    pub friction: f32,
    /// Fraction of velocity kept (and reversed) on wall contact
    pub wall_bounce: f32,
    /// Per-second probability of a heading kick in generic wander
    pub wander_jitter_chance: f32,
    /// Max heading kick in degrees (either direction)
    pub wander_angle_jitter_deg: f32,

    // === SPATIAL INDEX ===
    /// Points a quadtree node holds before subdividing
    pub quadtree_capacity: usize,
    /// Subdivision depth cap; bounds recursion for stacked points
    pub quadtree_max_depth: usize,
    /// Minimum group size counted as a cluster
    pub cluster_min: usize,

    // === GRINDER ===
    pub grinder_speed_mult: f32,
    /// Distance to desk centre at which a grinder sits down
    pub desk_claim_radius: f32,
    pub grinder_aura_radius: f32,
    /// Speed multiplier granted to everyone inside a seated grinder's aura
    pub grinder_aura_boost: f32,
    /// Cooldown after a grinder's desk is broken under them
    pub grinder_disturbed_duration: f32,

    // === WANDERER ===
    pub wanderer_speed_mult: f32,
    /// Per-second probability of a heading kick while wandering
    pub wanderer_jitter_chance: f32,
    /// Per-second probability of deciding to fetch coffee
    pub wanderer_coffee_chance: f32,
    pub coffee_approach_dist: f32,
    pub coffee_dwell: Span,
    pub bump_recovery_duration: f32,

    // === GOSSIP ===
    pub gossip_speed_mult: f32,
    /// Cluster grouping radius used when looking for a huddle
    pub gossip_seek_radius: f32,
    /// Seek radius multiplier during Friday mode
    pub friday_gossip_boost: f32,
    pub gossip_huddle_radius: f32,
    pub gossip_huddle_duration: Span,
    pub gossip_moving_on_duration: f32,
    /// Duration of the forced move-on after a manager breaks up a huddle
    pub gossip_dispersed_duration: f32,
    pub gossip_spread_radius: f32,
    /// Hue blend rate per second toward the spreader's hue
    pub gossip_spread_rate: f32,
    /// Per-second probability of infecting an untinted neighbour
    pub gossip_infect_chance: f32,
    pub gossip_color_lifetime: Span,

    // === MANAGER ===
    pub manager_speed_mult: f32,
    pub manager_cluster_radius: f32,
    pub manager_scan_interval: f32,
    pub manager_disperse_radius: f32,
    /// Outward velocity impulse applied to dispersed agents
    pub manager_disperse_force: f32,
    pub manager_confused: Span,

    // === INTERN ===
    pub intern_follow_radius: f32,
    /// How far in the past the copied velocity is sampled
    pub intern_copy_delay: f32,
    /// Weight of the copied velocity against direct seek
    pub intern_copy_weight: f32,
    pub intern_history_len: usize,
    /// History entries further than this from the requested time are ignored
    pub intern_history_staleness: f32,
    pub intern_loop_check_interval: f32,
    /// Per-second tint blend rate toward the follow target
    pub intern_tint_rate: f32,

    // === CHAOS AGENT ===
    pub chaos_switch_interval: Span,
    pub chaos_break_radius: f32,
    /// Per-second probability of attempting to break a nearby desk
    pub chaos_break_chance: f32,
    pub chaos_sprint_mult: f32,
    /// Grouping radius for the chaos gossip sub-mode
    pub chaos_gossip_radius: f32,

    // === OBSERVER ===
    pub observer_note_interval: Span,
    pub observer_perimeter_margin: f32,
    /// Patrol speed as a fraction of base speed (drives the perimeter parameter)
    pub observer_patrol_speed: f32,
    pub observer_steer_speed: f32,
    /// Alpha gained per second while fading in
    pub observer_fade_rate: f32,
    pub observer_max_alpha: f32,

    // === PIZZA ===
    pub pizza_attract_radius: f32,
    pub pizza_duration: f32,
    pub pizza_eat: Span,
    /// Chance an agent outside the attract radius joins anyway
    pub pizza_far_join_chance: f32,
    pub post_pizza_duration: f32,

    // === FIRE ALARM ===
    pub alarm_duration: f32,
    pub alarm_speed_mult: f32,
    pub exit_reach_radius: f32,
    pub panic_cohesion_radius: f32,
    pub respawn_delay: Span,
    pub post_alarm_duration: f32,

    // === CAT ===
    pub cat_attract_radius: f32,
    pub cat_avoid_radius: f32,
    pub cat_duration: f32,
    pub cat_speed_mult: f32,

    // === MEETING ROOM ===
    pub meeting_capacity: usize,
    pub meeting_duration: Span,
    pub post_meeting_duration: f32,
    /// Productivity lost when the whole workforce is in a meeting
    pub productivity_penalty: f32,

    // === MODES ===
    pub friday_speed_mult: f32,
    /// Extra slowdown applied by the 17:01 Friday event
    pub friday_1701_speed_mult: f32,
    pub monday_speed_mult: f32,

    // === OTHER DISTURBANCES ===
    pub coffee_spill_duration: f32,
    pub reply_all_freeze: Span,
    pub power_nap_duration: Span,
    pub nap_particle_interval: f32,
    pub loud_music_duration: f32,
    pub loud_music_avoid_radius: f32,
    pub ping_pong_duration: f32,
    pub ping_pong_radius: f32,

    // === EMERGENT PATTERNS ===
    pub pentagon_check_interval: f32,
    /// Max allowed spread between the largest and smallest vertex radius
    pub pentagon_radius_tolerance: f32,
    /// Allowed deviation from 72 degrees for each angular gap
    pub pentagon_angle_tolerance_deg: f32,
    pub pentagon_radius: Span,
    /// Only the first N eligible agents are combined (bounds the 5-way scan)
    pub pentagon_sample_cap: usize,
    pub chaos_order_threshold: f32,
    /// Time the chaos index must stay under threshold before order emerges
    pub order_hold_duration: f32,
    pub grid_override_duration: f32,

    // === METRICS ===
    pub chaos_metric_interval: f32,
    pub chaos_metric_window: usize,
    pub chaos_cluster_radius: f32,
    /// Mode switches per sample that saturate the churn score
    pub chaos_switch_ceiling: f32,
    pub velocity_weight: f32,
    pub fragmentation_weight: f32,
    pub churn_weight: f32,

    // === LOAD SHEDDING ===
    pub cull_fps_threshold: f32,
    pub cull_agent_ceiling: usize,
    pub cull_min_wanderers: usize,

    // === IDLE CHAT ===
    pub chat_first_delay: f32,
    pub chat_interval: Span,

    // === LAYOUT ===
    pub desk_cols: usize,
    pub desk_rows: usize,
    pub desk_width: f32,
    pub desk_height: f32,
    /// Horizontal pitch between desk origins
    pub desk_gap_x: f32,
    /// Vertical pitch between desk origins
    pub desk_gap_y: f32,
    pub spawn_margin: f32,

    pub population: Population,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            world_width: 1600.0,
            world_height: 900.0,
            wall_margin: 16.0,
            tick_dt_cap: 0.05,

            base_speed: 60.0,
            personal_radius: 16.0,
            separation_force: 80.0,
            agent_radius: 12.0,
            friction: 0.92,
            wall_bounce: 0.8,
            wander_jitter_chance: 0.03,
            wander_angle_jitter_deg: 45.0,

            quadtree_capacity: 8,
            quadtree_max_depth: 6,
            cluster_min: 3,

            grinder_speed_mult: 1.1,
            desk_claim_radius: 14.0,
            grinder_aura_radius: 120.0,
            grinder_aura_boost: 1.3,
            grinder_disturbed_duration: 4.0,

            wanderer_speed_mult: 0.8,
            wanderer_jitter_chance: 0.02,
            wanderer_coffee_chance: 0.005,
            coffee_approach_dist: 30.0,
            coffee_dwell: Span::new(3.0, 8.0),
            bump_recovery_duration: 0.3,

            gossip_speed_mult: 1.2,
            gossip_seek_radius: 200.0,
            friday_gossip_boost: 1.5,
            gossip_huddle_radius: 40.0,
            gossip_huddle_duration: Span::new(8.0, 20.0),
            gossip_moving_on_duration: 2.0,
            gossip_dispersed_duration: 1.5,
            gossip_spread_radius: 60.0,
            gossip_spread_rate: 0.15,
            gossip_infect_chance: 0.01,
            gossip_color_lifetime: Span::new(10.0, 30.0),

            manager_speed_mult: 0.9,
            manager_cluster_radius: 80.0,
            manager_scan_interval: 2.0,
            manager_disperse_radius: 60.0,
            manager_disperse_force: 150.0,
            manager_confused: Span::new(5.0, 12.0),

            intern_follow_radius: 160.0,
            intern_copy_delay: 2.0,
            intern_copy_weight: 0.7,
            intern_history_len: 128,
            intern_history_staleness: 1.0,
            intern_loop_check_interval: 5.0,
            intern_tint_rate: 0.05,

            chaos_switch_interval: Span::new(2.0, 8.0),
            chaos_break_radius: 48.0,
            chaos_break_chance: 0.003,
            chaos_sprint_mult: 2.5,
            chaos_gossip_radius: 200.0,

            observer_note_interval: Span::new(4.0, 10.0),
            observer_perimeter_margin: 60.0,
            observer_patrol_speed: 0.3,
            observer_steer_speed: 0.35,
            observer_fade_rate: 0.5,
            observer_max_alpha: 0.9,

            pizza_attract_radius: 400.0,
            pizza_duration: 15.0,
            pizza_eat: Span::new(3.0, 8.0),
            pizza_far_join_chance: 0.5,
            post_pizza_duration: 3.0,

            alarm_duration: 12.0,
            alarm_speed_mult: 1.8,
            exit_reach_radius: 30.0,
            panic_cohesion_radius: 60.0,
            respawn_delay: Span::new(1.0, 4.0),
            post_alarm_duration: 3.0,

            cat_attract_radius: 120.0,
            cat_avoid_radius: 100.0,
            cat_duration: 20.0,
            cat_speed_mult: 0.5,

            meeting_capacity: 8,
            meeting_duration: Span::new(20.0, 45.0),
            post_meeting_duration: 5.0,
            productivity_penalty: 0.2,

            friday_speed_mult: 0.5,
            friday_1701_speed_mult: 0.7,
            monday_speed_mult: 0.3,

            coffee_spill_duration: 20.0,
            reply_all_freeze: Span::new(2.0, 5.0),
            power_nap_duration: Span::new(8.0, 15.0),
            nap_particle_interval: 1.5,
            loud_music_duration: 18.0,
            loud_music_avoid_radius: 180.0,
            ping_pong_duration: 25.0,
            ping_pong_radius: 160.0,

            pentagon_check_interval: 0.5,
            pentagon_radius_tolerance: 20.0,
            pentagon_angle_tolerance_deg: 20.0,
            pentagon_radius: Span::new(60.0, 200.0),
            pentagon_sample_cap: 50,
            chaos_order_threshold: 0.15,
            order_hold_duration: 3.0,
            grid_override_duration: 5.0,

            chaos_metric_interval: 1.0,
            chaos_metric_window: 10,
            chaos_cluster_radius: 60.0,
            chaos_switch_ceiling: 20.0,
            velocity_weight: 0.4,
            fragmentation_weight: 0.4,
            churn_weight: 0.2,

            cull_fps_threshold: 30.0,
            cull_agent_ceiling: 60,
            cull_min_wanderers: 5,

            chat_first_delay: 3.0,
            chat_interval: Span::new(4.0, 7.0),

            desk_cols: 6,
            desk_rows: 4,
            desk_width: 50.0,
            desk_height: 36.0,
            desk_gap_x: 90.0,
            desk_gap_y: 80.0,
            spawn_margin: 80.0,

            population: Population::default(),
        }
    }
}

impl SimulationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a (possibly partial) TOML document over the defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.world_width <= 2.0 * self.wall_margin || self.world_height <= 2.0 * self.wall_margin {
            return Err(OfficeError::Config(format!(
                "world ({}x{}) must be larger than twice the wall margin ({})",
                self.world_width, self.world_height, self.wall_margin
            )));
        }

        if self.tick_dt_cap <= 0.0 || self.base_speed <= 0.0 {
            return Err(OfficeError::Config(
                "tick_dt_cap and base_speed must be positive".into(),
            ));
        }

        let spans = [
            ("coffee_dwell", self.coffee_dwell),
            ("gossip_huddle_duration", self.gossip_huddle_duration),
            ("gossip_color_lifetime", self.gossip_color_lifetime),
            ("manager_confused", self.manager_confused),
            ("chaos_switch_interval", self.chaos_switch_interval),
            ("observer_note_interval", self.observer_note_interval),
            ("pizza_eat", self.pizza_eat),
            ("respawn_delay", self.respawn_delay),
            ("meeting_duration", self.meeting_duration),
            ("reply_all_freeze", self.reply_all_freeze),
            ("power_nap_duration", self.power_nap_duration),
            ("pentagon_radius", self.pentagon_radius),
            ("chat_interval", self.chat_interval),
        ];
        for (name, span) in spans {
            if span.min < 0.0 || span.min > span.max {
                return Err(OfficeError::Config(format!(
                    "{} must satisfy 0 <= min <= max (got {}..{})",
                    name, span.min, span.max
                )));
            }
        }

        if self.quadtree_capacity == 0 || self.chaos_metric_window == 0 || self.intern_history_len == 0 {
            return Err(OfficeError::Config(
                "quadtree_capacity, chaos_metric_window and intern_history_len must be non-zero".into(),
            ));
        }

        let weights = self.velocity_weight + self.fragmentation_weight + self.churn_weight;
        if (weights - 1.0).abs() > 1e-3 {
            return Err(OfficeError::Config(format!(
                "chaos metric weights must sum to 1.0 (got {:.3})",
                weights
            )));
        }

        if !(0.0..=1.0).contains(&self.friction) {
            return Err(OfficeError::Config(format!(
                "friction ({}) must be within [0, 1]",
                self.friction
            )));
        }

        Ok(())
    }
}
