//! Emergent order: a sustained calm spell snaps everyone into a grid

use crate::core::types::{Rect, Vec2};

/// Hysteresis latch over the chaos index
///
/// Fires once after the index has stayed under the threshold for the hold
/// time, then stays quiet until the index climbs back over the threshold.
#[derive(Debug, Clone, Default)]
pub struct OrderLatch {
    below_for: f32,
    triggered: bool,
}

impl OrderLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, chaos_index: f32, threshold: f32, hold: f32, dt: f32) -> bool {
        if chaos_index < threshold {
            self.below_for += dt;
            if self.below_for >= hold && !self.triggered {
                self.triggered = true;
                return true;
            }
        } else {
            self.below_for = 0.0;
            self.triggered = false;
        }
        false
    }

    pub fn is_armed(&self) -> bool {
        !self.triggered
    }
}

/// Row-major grid positions for `count` agents, evenly spaced inside `bounds`
pub fn grid_layout(count: usize, bounds: Rect) -> Vec<Vec2> {
    if count == 0 {
        return Vec::new();
    }
    let cols = (count as f32).sqrt().ceil() as usize;
    let rows = count.div_ceil(cols);
    let spacing_x = bounds.w / (cols + 1) as f32;
    let spacing_y = bounds.h / (rows + 1) as f32;

    (0..count)
        .map(|i| {
            let (row, col) = (i / cols, i % cols);
            Vec2::new(
                bounds.x + spacing_x * (col + 1) as f32,
                bounds.y + spacing_y * (row + 1) as f32,
            )
        })
        .collect()
}
