//! Steering helpers shared by every behavior
//!
//! All functions are pure; randomness comes in through the caller's RNG.

use std::f32::consts::{PI, TAU};

use rand::Rng;

use crate::core::types::Vec2;

/// Distances below this count as "already there" for seek purposes
const ARRIVAL_EPSILON: f32 = 0.1;

/// Fraction of the remaining heading error closed per call in `angle_toward`
const ANGLE_SMOOTHING: f32 = 0.1;

/// Velocity of magnitude `speed` pointing from `from` to `to`.
/// Zero when the points (nearly) coincide.
pub fn seek(from: Vec2, to: Vec2, speed: f32) -> Vec2 {
    let delta = to - from;
    let d = delta.length();
    if d < ARRIVAL_EPSILON {
        return Vec2::ZERO;
    }
    delta * (speed / d)
}

/// Opposite of `seek`
pub fn flee(from: Vec2, threat: Vec2, speed: f32) -> Vec2 {
    -seek(from, threat, speed)
}

/// Wrap an angle difference into (-PI, PI]
pub fn wrap_angle(mut a: f32) -> f32 {
    while a > PI {
        a -= TAU;
    }
    while a < -PI {
        a += TAU;
    }
    a
}

/// Turn `heading` a fixed fraction of the way toward the bearing of `target`
pub fn angle_toward(heading: f32, pos: Vec2, target: Vec2) -> f32 {
    let bearing = (target - pos).angle();
    heading + wrap_angle(bearing - heading) * ANGLE_SMOOTHING
}

/// Velocity along `heading` at `speed`
pub fn heading_velocity(heading: f32, speed: f32) -> Vec2 {
    Vec2::from_angle(heading) * speed
}

/// Random-walk step: with probability `jitter_chance * dt` kick the heading by
/// up to `jitter_deg` either way, then move along it.
pub fn wander<R: Rng + ?Sized>(
    heading: &mut f32,
    speed: f32,
    jitter_chance: f32,
    jitter_deg: f32,
    dt: f32,
    rng: &mut R,
) -> Vec2 {
    if rng.gen::<f32>() < jitter_chance * dt {
        *heading += rng.gen_range(-jitter_deg..=jitter_deg).to_radians();
    }
    heading_velocity(*heading, speed)
}

/// Confused drift: continuous small heading noise scaled by `spread`
pub fn drift<R: Rng + ?Sized>(heading: &mut f32, speed: f32, spread: f32, dt: f32, rng: &mut R) -> Vec2 {
    *heading += (rng.gen::<f32>() - 0.5) * spread * dt;
    heading_velocity(*heading, speed)
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

pub fn lerp_vec(a: Vec2, b: Vec2, t: f32) -> Vec2 {
    Vec2::new(lerp(a.x, b.x, t), lerp(a.y, b.y, t))
}

/// Blend two packed 0xRRGGBB colours channel by channel
pub fn lerp_color(a: u32, b: u32, t: f32) -> u32 {
    let channel = |shift: u32| {
        let ca = ((a >> shift) & 0xFF) as f32;
        let cb = ((b >> shift) & 0xFF) as f32;
        (lerp(ca, cb, t).round().clamp(0.0, 255.0) as u32) << shift
    };
    channel(16) | channel(8) | channel(0)
}

/// Inverse-distance repulsion from neighbours inside `radius`.
/// Returns the summed unit push weighted by `(radius - d) / radius`.
pub fn separation(pos: Vec2, neighbours: impl IntoIterator<Item = Vec2>, radius: f32) -> Vec2 {
    let mut force = Vec2::ZERO;
    let r2 = radius * radius;
    for n in neighbours {
        let delta = pos - n;
        let d2 = delta.length_squared();
        if d2 < r2 && d2 > 0.001 {
            let d = d2.sqrt();
            force += delta * ((radius - d) / radius / d);
        }
    }
    force
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_seek_has_requested_speed() {
        let v = seek(Vec2::ZERO, Vec2::new(30.0, 40.0), 10.0);
        assert!((v.length() - 10.0).abs() < 1e-4);
        assert!((v.x - 6.0).abs() < 1e-4);
    }

    #[test]
    fn test_seek_at_target_is_zero() {
        assert_eq!(seek(Vec2::new(5.0, 5.0), Vec2::new(5.05, 5.0), 10.0), Vec2::ZERO);
    }

    #[test]
    fn test_flee_points_away() {
        let v = flee(Vec2::ZERO, Vec2::new(10.0, 0.0), 3.0);
        assert!(v.x < 0.0);
    }

    #[test]
    fn test_angle_toward_takes_short_way_round() {
        // Heading just below +PI, target bearing just above -PI: turn through PI, not zero
        let heading = PI - 0.1;
        let next = angle_toward(heading, Vec2::ZERO, Vec2::from_angle(-PI + 0.1));
        assert!(next > heading);
    }

    #[test]
    fn test_wander_keeps_speed() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut heading = 0.0;
        for _ in 0..100 {
            let v = wander(&mut heading, 18.0, 100.0, 45.0, 0.05, &mut rng);
            assert!((v.length() - 18.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_lerp_color_endpoints() {
        assert_eq!(lerp_color(0x000000, 0xFFFFFF, 0.0), 0x000000);
        assert_eq!(lerp_color(0x000000, 0xFFFFFF, 1.0), 0xFFFFFF);
        assert_eq!(lerp_color(0x000000, 0x0000FF, 0.5), 0x000080);
    }

    #[test]
    fn test_separation_pushes_apart() {
        let f = separation(Vec2::ZERO, [Vec2::new(8.0, 0.0)], 16.0);
        assert!(f.x < 0.0);
        assert_eq!(separation(Vec2::ZERO, [Vec2::new(20.0, 0.0)], 16.0), Vec2::ZERO);
    }
}
