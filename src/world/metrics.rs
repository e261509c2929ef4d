//! Rolling chaos index and the morale / productivity readings derived from it

use std::collections::VecDeque;

use serde::Serialize;

use crate::core::config::SimulationConfig;
use crate::core::types::Vec2;

/// The three normalized signals folded into one chaos sample
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChaosSignals {
    pub velocity: f32,
    pub fragmentation: f32,
    pub churn: f32,
}

impl ChaosSignals {
    pub fn weighted(&self, config: &SimulationConfig) -> f32 {
        self.velocity * config.velocity_weight
            + self.fragmentation * config.fragmentation_weight
            + self.churn * config.churn_weight
    }
}

/// Head-counts productivity is derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Workforce {
    pub seated_grinders: usize,
    pub in_meeting: usize,
    /// Non-Observer, non-escaped agents
    pub workers: usize,
    pub desks: usize,
}

/// Population variance of velocity around its mean, over `base_speed²`, capped at 1
pub fn velocity_variance_score(velocities: &[Vec2], base_speed: f32) -> f32 {
    if velocities.is_empty() || base_speed <= 0.0 {
        return 0.0;
    }
    let n = velocities.len() as f32;
    let mean = velocities.iter().fold(Vec2::ZERO, |acc, v| acc + *v) / n;
    let variance = velocities
        .iter()
        .map(|v| (*v - mean).length_squared())
        .sum::<f32>()
        / n;
    (variance / (base_speed * base_speed)).min(1.0)
}

/// `1 - largest/total`; no cluster at all is maximal fragmentation
pub fn fragmentation_score(largest_cluster: Option<usize>, total: usize) -> f32 {
    match largest_cluster {
        Some(largest) if total > 0 => (1.0 - largest as f32 / total as f32).clamp(0.0, 1.0),
        _ => 1.0,
    }
}

pub fn churn_score(switches: u32, ceiling: f32) -> f32 {
    if ceiling <= 0.0 {
        return 1.0;
    }
    (switches as f32 / ceiling).min(1.0)
}

/// Published metrics plus the sample window behind the chaos index
#[derive(Debug, Clone)]
pub struct ChaosMetrics {
    pub chaos_index: f32,
    pub morale: f32,
    pub productivity: f32,
    window: VecDeque<f32>,
    capacity: usize,
    timer: f32,
}

/// Read-only copy of the published values
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricReadings {
    pub chaos_index: f32,
    pub morale: f32,
    pub productivity: f32,
}

impl ChaosMetrics {
    pub const INITIAL_PRODUCTIVITY: f32 = 0.72;
    pub const INITIAL_MORALE: f32 = 0.65;
    pub const INITIAL_CHAOS: f32 = 0.24;

    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            chaos_index: Self::INITIAL_CHAOS,
            morale: Self::INITIAL_MORALE,
            productivity: Self::INITIAL_PRODUCTIVITY,
            window: VecDeque::with_capacity(capacity),
            capacity,
            timer: 0.0,
        }
    }

    /// Accumulate `dt`; true once per `interval` when a sample is due
    pub fn advance(&mut self, dt: f32, interval: f32) -> bool {
        self.timer += dt;
        if self.timer >= interval {
            self.timer -= interval;
            true
        } else {
            false
        }
    }

    /// Push one sample and recompute everything; returns the new chaos index
    pub fn record(&mut self, sample: f32, workforce: Workforce, config: &SimulationConfig) -> f32 {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(sample.clamp(0.0, 1.0));

        let avg = self.window.iter().sum::<f32>() / self.window.len() as f32;
        self.chaos_index = avg;
        self.morale = (1.0 - avg * 0.8).max(0.1);

        let meeting_penalty = if workforce.workers > 0 {
            workforce.in_meeting as f32 / workforce.workers as f32 * config.productivity_penalty
        } else {
            0.0
        };
        let occupancy = workforce.seated_grinders as f32 / workforce.desks.max(1) as f32;
        self.productivity = (occupancy * (1.0 - avg * 0.5) - meeting_penalty).clamp(0.0, 1.0);
        avg
    }

    pub fn readings(&self) -> MetricReadings {
        MetricReadings {
            chaos_index: self.chaos_index,
            morale: self.morale,
            productivity: self.productivity,
        }
    }

    pub fn samples(&self) -> usize {
        self.window.len()
    }
}
