//! Quadtree for radius queries and cluster grouping
//!
//! Rebuilt from scratch every tick; there is no removal or incremental update.

use ahash::AHashSet;

use crate::core::types::{AgentId, Rect, Vec2};

/// Position tagged with the agent it belongs to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadPoint {
    pub pos: Vec2,
    pub id: AgentId,
}

impl QuadPoint {
    pub fn new(id: AgentId, pos: Vec2) -> Self {
        Self { pos, id }
    }
}

#[derive(Debug)]
struct QuadNode {
    bounds: Rect,
    depth: usize,
    points: Vec<QuadPoint>,
    children: Option<Box<[QuadNode; 4]>>,
}

impl QuadNode {
    fn new(bounds: Rect, depth: usize) -> Self {
        Self {
            bounds,
            depth,
            points: Vec::new(),
            children: None,
        }
    }

    fn subdivide(&mut self) {
        let Rect { x, y, w, h } = self.bounds;
        let (hw, hh) = (w / 2.0, h / 2.0);
        let d = self.depth + 1;
        self.children = Some(Box::new([
            QuadNode::new(Rect::new(x, y, hw, hh), d),
            QuadNode::new(Rect::new(x + hw, y, hw, hh), d),
            QuadNode::new(Rect::new(x, y + hh, hw, hh), d),
            QuadNode::new(Rect::new(x + hw, y + hh, hw, hh), d),
        ]));
    }

    fn insert(&mut self, p: QuadPoint, capacity: usize, max_depth: usize) -> bool {
        if !self.bounds.contains(p.pos) {
            return false;
        }

        if let Some(children) = self.children.as_mut() {
            return children.iter_mut().any(|c| c.insert(p, capacity, max_depth));
        }

        self.points.push(p);
        if self.points.len() > capacity && self.depth < max_depth {
            self.subdivide();
            let points = std::mem::take(&mut self.points);
            if let Some(children) = self.children.as_mut() {
                for pt in points {
                    // Half-open child bounds tile the parent exactly, so one child accepts
                    children.iter_mut().any(|c| c.insert(pt, capacity, max_depth));
                }
            }
        }
        true
    }

    fn query(&self, center: Vec2, radius: f32, out: &mut Vec<QuadPoint>) {
        if !self.bounds.intersects_circle(center, radius) {
            return;
        }
        match &self.children {
            Some(children) => {
                for child in children.iter() {
                    child.query(center, radius, out);
                }
            }
            None => {
                let r2 = radius * radius;
                out.extend(
                    self.points
                        .iter()
                        .filter(|p| p.pos.distance_squared(&center) <= r2)
                        .copied(),
                );
            }
        }
    }

    fn depth_reached(&self) -> usize {
        match &self.children {
            Some(children) => children.iter().map(|c| c.depth_reached()).max().unwrap_or(self.depth),
            None => self.depth,
        }
    }
}

/// Region quadtree over the office floor
#[derive(Debug)]
pub struct Quadtree {
    root: QuadNode,
    capacity: usize,
    max_depth: usize,
    len: usize,
}

impl Quadtree {
    pub fn new(width: f32, height: f32, capacity: usize, max_depth: usize) -> Self {
        Self {
            root: QuadNode::new(Rect::new(0.0, 0.0, width, height), 0),
            capacity: capacity.max(1),
            max_depth,
            len: 0,
        }
    }

    pub fn clear(&mut self) {
        self.root = QuadNode::new(self.root.bounds, 0);
        self.len = 0;
    }

    /// Insert a point. Points outside the root bounds are dropped.
    pub fn insert(&mut self, point: QuadPoint) -> bool {
        let inserted = self.root.insert(point, self.capacity, self.max_depth);
        if inserted {
            self.len += 1;
        }
        inserted
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// All points within `radius` (inclusive) of `center`
    pub fn query(&self, center: Vec2, radius: f32) -> Vec<QuadPoint> {
        let mut out = Vec::new();
        self.root.query(center, radius, &mut out);
        out
    }

    /// Greedy cluster grouping in `points` order.
    ///
    /// Each unvisited point queries its neighbourhood. If the neighbourhood
    /// has at least `min_size` points, its still-unvisited members form a
    /// candidate cluster which is emitted only when it also meets `min_size`.
    /// Otherwise only the seed point is marked visited. Emitted clusters are
    /// disjoint.
    pub fn find_clusters(
        &self,
        points: &[QuadPoint],
        group_radius: f32,
        min_size: usize,
    ) -> Vec<Vec<QuadPoint>> {
        let mut visited: AHashSet<AgentId> = AHashSet::new();
        let mut clusters = Vec::new();

        for p in points {
            if visited.contains(&p.id) {
                continue;
            }
            let neighbours = self.query(p.pos, group_radius);
            if neighbours.len() >= min_size {
                let cluster: Vec<QuadPoint> = neighbours
                    .into_iter()
                    .filter(|n| visited.insert(n.id))
                    .collect();
                if cluster.len() >= min_size {
                    clusters.push(cluster);
                }
            } else {
                visited.insert(p.id);
            }
        }

        clusters
    }

    /// Deepest node level currently allocated
    pub fn depth(&self) -> usize {
        self.root.depth_reached()
    }
}

/// Mean position of a group of points
pub fn centroid(points: &[QuadPoint]) -> Vec2 {
    if points.is_empty() {
        return Vec2::ZERO;
    }
    let sum = points.iter().fold(Vec2::ZERO, |acc, p| acc + p.pos);
    sum / points.len() as f32
}
