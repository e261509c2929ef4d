//! Per-tick spatial index over live agents

use ordered_float::OrderedFloat;

use crate::core::config::SimulationConfig;
use crate::core::types::{AgentId, Vec2};
use crate::spatial::quadtree::{QuadPoint, Quadtree};

/// Quadtree plus the insertion-ordered point list cluster grouping iterates
///
/// Points are inserted in agent creation order so `clusters` is reproducible
/// for a given population.
#[derive(Debug)]
pub struct SpatialIndex {
    tree: Quadtree,
    points: Vec<QuadPoint>,
}

impl SpatialIndex {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            tree: Quadtree::new(
                config.world_width,
                config.world_height,
                config.quadtree_capacity,
                config.quadtree_max_depth,
            ),
            points: Vec::new(),
        }
    }

    /// Replace the contents with a fresh set of positions
    pub fn rebuild(&mut self, entries: impl IntoIterator<Item = (AgentId, Vec2)>) {
        self.tree.clear();
        self.points.clear();
        for (id, pos) in entries {
            let p = QuadPoint::new(id, pos);
            if self.tree.insert(p) {
                self.points.push(p);
            }
        }
    }

    pub fn points(&self) -> &[QuadPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn query(&self, center: Vec2, radius: f32) -> Vec<QuadPoint> {
        self.tree.query(center, radius)
    }

    /// Disjoint groups of at least `min_size` agents
    pub fn clusters(&self, group_radius: f32, min_size: usize) -> Vec<Vec<QuadPoint>> {
        self.tree.find_clusters(&self.points, group_radius, min_size)
    }

    /// Closest indexed point within `radius` accepted by `filter`
    pub fn nearest(
        &self,
        center: Vec2,
        radius: f32,
        mut filter: impl FnMut(&QuadPoint) -> bool,
    ) -> Option<QuadPoint> {
        self.query(center, radius)
            .into_iter()
            .filter(|p| filter(p))
            .min_by_key(|p| (OrderedFloat(p.pos.distance_squared(&center)), p.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rebuild_replaces_points() {
        let config = SimulationConfig::default();
        let mut index = SpatialIndex::new(&config);
        index.rebuild([(AgentId(1), Vec2::new(10.0, 10.0))]);
        index.rebuild([(AgentId(2), Vec2::new(20.0, 20.0)), (AgentId(3), Vec2::new(30.0, 30.0))]);
        assert_eq!(index.len(), 2);
        assert!(index.query(Vec2::new(10.0, 10.0), 1.0).is_empty());
    }

    #[test]
    fn test_nearest_respects_filter() {
        let config = SimulationConfig::default();
        let mut index = SpatialIndex::new(&config);
        index.rebuild([
            (AgentId(1), Vec2::new(100.0, 100.0)),
            (AgentId(2), Vec2::new(110.0, 100.0)),
            (AgentId(3), Vec2::new(150.0, 100.0)),
        ]);
        let near = index.nearest(Vec2::new(100.0, 100.0), 100.0, |p| p.id != AgentId(1));
        assert_eq!(near.map(|p| p.id), Some(AgentId(2)));
        let none = index.nearest(Vec2::new(100.0, 100.0), 5.0, |p| p.id != AgentId(1));
        assert!(none.is_none());
    }

    #[test]
    fn test_clusters_follow_insertion_order() {
        let config = SimulationConfig::default();
        let mut index = SpatialIndex::new(&config);
        index.rebuild((0..4).map(|i| (AgentId(i), Vec2::new(200.0 + i as f32 * 5.0, 200.0))));
        let clusters = index.clusters(60.0, 3);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].len(), 4);
    }
}
