//! Spatial partitioning and steering math

pub mod index;
pub mod quadtree;
pub mod steering;

pub use index::SpatialIndex;
pub use quadtree::{centroid, QuadPoint, Quadtree};
