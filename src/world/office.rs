//! Fixed office floor plan

use rand::Rng;

use crate::core::config::SimulationConfig;
use crate::core::types::{Rect, Vec2};

/// Distance from the wall at which edge spawns and exits sit
const EDGE_INSET: f32 = 20.0;

/// Static geometry: bounds, desk grid, coffee machine, exits
#[derive(Debug, Clone)]
pub struct OfficeLayout {
    pub width: f32,
    pub height: f32,
    pub wall_margin: f32,
    pub coffee_machine: Rect,
    pub exits: Vec<Vec2>,
    pub desk_rects: Vec<Rect>,
}

impl OfficeLayout {
    pub fn new(config: &SimulationConfig) -> Self {
        let (w, h) = (config.world_width, config.world_height);
        Self {
            width: w,
            height: h,
            wall_margin: config.wall_margin,
            coffee_machine: Rect::new(60.0, 60.0, 50.0, 60.0),
            exits: vec![Vec2::new(EDGE_INSET, h / 2.0), Vec2::new(w - EDGE_INSET, h / 2.0)],
            desk_rects: desk_grid(config),
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Clamp into the walkable area `margin` inside the walls
    pub fn clamp(&self, pos: Vec2, margin: f32) -> Vec2 {
        Vec2::new(
            pos.x.clamp(margin, self.width - margin),
            pos.y.clamp(margin, self.height - margin),
        )
    }

    pub fn nearest_exit(&self, pos: Vec2) -> Vec2 {
        self.exits
            .iter()
            .copied()
            .min_by(|a, b| a.distance_squared(&pos).total_cmp(&b.distance_squared(&pos)))
            .unwrap_or_else(|| self.center())
    }

    /// Random point along one of the four walls
    pub fn random_edge_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec2 {
        match rng.gen_range(0..4) {
            0 => Vec2::new(rng.gen_range(0.0..self.width), EDGE_INSET),
            1 => Vec2::new(rng.gen_range(0.0..self.width), self.height - EDGE_INSET),
            2 => Vec2::new(EDGE_INSET, rng.gen_range(0.0..self.height)),
            _ => Vec2::new(self.width - EDGE_INSET, rng.gen_range(0.0..self.height)),
        }
    }

    pub fn random_interior_position<R: Rng + ?Sized>(&self, margin: f32, rng: &mut R) -> Vec2 {
        Vec2::new(
            margin + rng.gen::<f32>() * (self.width - margin * 2.0),
            margin + rng.gen::<f32>() * (self.height - margin * 2.0),
        )
    }

    /// Point on the inset rectangle loop for `t` in [0, 1), clockwise from top-left
    pub fn perimeter_position(&self, t: f32, margin: f32) -> Vec2 {
        let w = self.width - margin * 2.0;
        let h = self.height - margin * 2.0;
        let d = t.rem_euclid(1.0) * 2.0 * (w + h);
        if d < w {
            Vec2::new(margin + d, margin)
        } else if d < w + h {
            Vec2::new(self.width - margin, margin + (d - w))
        } else if d < 2.0 * w + h {
            Vec2::new(self.width - margin - (d - w - h), self.height - margin)
        } else {
            Vec2::new(margin, self.height - margin - (d - 2.0 * w - h))
        }
    }

    pub fn perimeter_length(&self, margin: f32) -> f32 {
        2.0 * ((self.width - margin * 2.0) + (self.height - margin * 2.0))
    }
}

/// Desk rectangles laid out in a grid centred on the floor (shifted slightly right and down)
fn desk_grid(config: &SimulationConfig) -> Vec<Rect> {
    let cols = config.desk_cols;
    let rows = config.desk_rows;
    if cols == 0 || rows == 0 {
        return Vec::new();
    }
    let total_w = cols as f32 * config.desk_width + (cols - 1) as f32 * (config.desk_gap_x - config.desk_width);
    let total_h = rows as f32 * config.desk_height + (rows - 1) as f32 * (config.desk_gap_y - config.desk_height);
    let start_x = (config.world_width - total_w) / 2.0 + 40.0;
    let start_y = (config.world_height - total_h) / 2.0 + 20.0;

    let mut rects = Vec::with_capacity(cols * rows);
    for row in 0..rows {
        for col in 0..cols {
            rects.push(Rect::new(
                start_x + col as f32 * config.desk_gap_x,
                start_y + row as f32 * config.desk_gap_y,
                config.desk_width,
                config.desk_height,
            ));
        }
    }
    rects
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_default_desk_grid() {
        let layout = OfficeLayout::new(&SimulationConfig::default());
        assert_eq!(layout.desk_rects.len(), 24);
        let first = layout.desk_rects[0];
        assert_eq!((first.x, first.y), (590.0, 332.0));
        let last = layout.desk_rects[23];
        assert_eq!((last.x, last.y), (590.0 + 5.0 * 90.0, 332.0 + 3.0 * 80.0));
    }

    #[test]
    fn test_nearest_exit() {
        let layout = OfficeLayout::new(&SimulationConfig::default());
        assert_eq!(layout.nearest_exit(Vec2::new(100.0, 100.0)), Vec2::new(20.0, 450.0));
        assert_eq!(layout.nearest_exit(Vec2::new(1500.0, 800.0)), Vec2::new(1580.0, 450.0));
    }

    #[test]
    fn test_perimeter_corners() {
        let layout = OfficeLayout::new(&SimulationConfig::default());
        assert_eq!(layout.perimeter_position(0.0, 60.0), Vec2::new(60.0, 60.0));
        let w = 1600.0 - 120.0;
        let h = 900.0 - 120.0;
        let t = w / (2.0 * (w + h));
        let p = layout.perimeter_position(t, 60.0);
        assert!((p.x - 1540.0).abs() < 1e-2 && (p.y - 60.0).abs() < 1e-2);
    }

    #[test]
    fn test_random_positions_inside_world() {
        let layout = OfficeLayout::new(&SimulationConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        for _ in 0..100 {
            let e = layout.random_edge_position(&mut rng);
            assert!(e.x >= 0.0 && e.x <= 1600.0 && e.y >= 0.0 && e.y <= 900.0);
            let i = layout.random_interior_position(80.0, &mut rng);
            assert!(i.x >= 80.0 && i.x <= 1520.0 && i.y >= 80.0 && i.y <= 820.0);
        }
    }
}
