//! Per-agent view of the world during a behavior update

use rand_chacha::ChaCha8Rng;

use crate::core::config::SimulationConfig;
use crate::core::types::{AgentId, Vec2};
use crate::entity::agent::Agent;
use crate::entity::store::Others;
use crate::spatial::index::SpatialIndex;
use crate::spatial::quadtree::{centroid, QuadPoint};
use crate::spatial::steering;
use crate::world::desks::DeskTable;
use crate::world::environment::{Environment, ModeFlags};
use crate::world::events::EventLog;
use crate::world::office::OfficeLayout;

/// Everything a behavior may read or write besides the agent itself
///
/// Built fresh for every agent. `others` excludes the agent being updated,
/// so cross-agent effects (dispersal, rumour spread, eviction) land on
/// other agents immediately and are seen by later updates in the same tick.
pub struct BehaviorContext<'a> {
    pub config: &'a SimulationConfig,
    pub layout: &'a OfficeLayout,
    pub env: &'a Environment,
    pub desks: &'a mut DeskTable,
    pub index: &'a SpatialIndex,
    pub others: Others<'a>,
    pub flags: ModeFlags,
    pub global_speed: f32,
    /// Accumulated simulation time in seconds
    pub now: f64,
    pub rng: &'a mut ChaCha8Rng,
    pub chaos_switches: &'a mut u32,
    pub events: &'a mut EventLog,
    /// Managers that reached the meeting room this tick
    pub meeting_arrivals: &'a mut Vec<AgentId>,
}

impl<'a> BehaviorContext<'a> {
    /// Base speed after global mode multipliers
    pub fn base_speed(&self) -> f32 {
        self.config.base_speed * self.global_speed
    }

    /// Generic random walk at `speed`
    pub fn wander(&mut self, agent: &mut Agent, speed: f32, dt: f32) {
        agent.vel = steering::wander(
            &mut agent.heading,
            speed,
            self.config.wander_jitter_chance,
            self.config.wander_angle_jitter_deg,
            dt,
            &mut *self.rng,
        );
    }

    /// Largest cluster (first one wins ties), skipping any cluster that
    /// already contains `exclude`
    pub fn largest_cluster(
        &self,
        group_radius: f32,
        min_size: usize,
        exclude: Option<AgentId>,
    ) -> Option<Vec<QuadPoint>> {
        let mut best: Option<Vec<QuadPoint>> = None;
        for cluster in self.index.clusters(group_radius, min_size) {
            if exclude.is_some_and(|id| cluster.iter().any(|p| p.id == id)) {
                continue;
            }
            if best.as_ref().map_or(true, |b| cluster.len() > b.len()) {
                best = Some(cluster);
            }
        }
        best
    }

    /// Centroid of the cluster closest to `pos`
    pub fn nearest_cluster_centroid(&self, pos: Vec2, group_radius: f32, min_size: usize) -> Option<Vec2> {
        self.index
            .clusters(group_radius, min_size)
            .iter()
            .map(|c| centroid(c))
            .min_by(|a, b| a.distance_squared(&pos).total_cmp(&b.distance_squared(&pos)))
    }
}
