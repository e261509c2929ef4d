//! Five agents standing on the corners of a near-regular pentagon

use crate::core::config::SimulationConfig;
use crate::core::types::Vec2;

const IDEAL_GAP_DEG: f32 = 72.0;

/// Rate-limited scan; the unlock latch itself lives in the world's mode flags
#[derive(Debug, Clone, Default)]
pub struct PentagonDetector {
    timer: f32,
}

impl PentagonDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when a scan is due this tick
    pub fn due(&mut self, dt: f32, interval: f32) -> bool {
        self.timer -= dt;
        if self.timer > 0.0 {
            return false;
        }
        self.timer = interval;
        true
    }
}

/// Regularity test for exactly five points
pub fn is_pentagon(points: &[Vec2; 5], config: &SimulationConfig) -> bool {
    let center = points.iter().fold(Vec2::ZERO, |acc, p| acc + *p) / 5.0;

    let radii = points.map(|p| p.distance(&center));
    let mean = radii.iter().sum::<f32>() / 5.0;
    if !config.pentagon_radius.contains(mean) {
        return false;
    }
    let max = radii.iter().copied().fold(f32::MIN, f32::max);
    let min = radii.iter().copied().fold(f32::MAX, f32::min);
    if max - min > config.pentagon_radius_tolerance {
        return false;
    }

    let mut angles = points.map(|p| (p - center).angle().to_degrees());
    angles.sort_by(|a, b| a.total_cmp(b));

    let tolerance = config.pentagon_angle_tolerance_deg;
    let wrap_gap = 360.0 - angles[4] + angles[0];
    angles
        .windows(2)
        .map(|w| w[1] - w[0])
        .chain(std::iter::once(wrap_gap))
        .all(|gap| (gap - IDEAL_GAP_DEG).abs() <= tolerance)
}

/// First 5-combination (in input order) forming a pentagon
pub fn find_pentagon(points: &[Vec2], config: &SimulationConfig) -> Option<[usize; 5]> {
    let n = points.len().min(config.pentagon_sample_cap);
    if n < 5 {
        return None;
    }
    for i in 0..n - 4 {
        for j in i + 1..n - 3 {
            for k in j + 1..n - 2 {
                for l in k + 1..n - 1 {
                    for m in l + 1..n {
                        let five = [points[i], points[j], points[k], points[l], points[m]];
                        if is_pentagon(&five, config) {
                            return Some([i, j, k, l, m]);
                        }
                    }
                }
            }
        }
    }
    None
}

/// Corners of a regular pentagon, used by tests and the CLI demo
pub fn regular_pentagon(center: Vec2, radius: f32, rotation: f32) -> [Vec2; 5] {
    let step = std::f32::consts::TAU / 5.0;
    std::array::from_fn(|i| center + Vec2::from_angle(rotation + step * i as f32) * radius)
}
