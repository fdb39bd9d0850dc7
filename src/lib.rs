//! Tank Arena - combat simulation core for a top-down multi-tank arena game
//!
//! Core modules:
//! - `sim`: Deterministic per-tick simulation (motion, AI, projectiles, arbitration)
//! - `tuning`: Data-driven game balance, injected into every simulation call
//! - `scoreboard`: In-memory kill/win counters keyed by player
//! - `error`: Configuration errors and per-entity simulation anomalies

pub mod error;
pub mod scoreboard;
pub mod sim;
pub mod tuning;

pub use error::{SimAnomaly, TuningError};
pub use scoreboard::{PlayerScore, Scoreboard};
pub use tuning::Tuning;

use glam::Vec2;

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Signed shortest rotation from `from` to `to`, in [-π, π)
#[inline]
pub fn angle_delta(from: f32, to: f32) -> f32 {
    normalize_angle(to - from)
}

/// Unit vector pointing along `heading`
#[inline]
pub fn heading_vector(heading: f32) -> Vec2 {
    Vec2::new(heading.cos(), heading.sin())
}

/// Heading (radians) of the vector from `from` to `to`
#[inline]
pub fn heading_to(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f32::consts::PI;

    #[test]
    fn test_angle_delta_wraps() {
        assert!((angle_delta(PI - 0.1, -PI + 0.1) - 0.2).abs() < 1e-4);
        assert!((angle_delta(0.0, -0.5) + 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_heading_to_cardinals() {
        assert!((heading_to(Vec2::ZERO, Vec2::new(0.0, 5.0)) - PI / 2.0).abs() < 1e-6);
        assert!(heading_to(Vec2::ZERO, Vec2::new(5.0, 0.0)).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn normalized_angle_stays_in_range(a in -100.0f32..100.0) {
            let n = normalize_angle(a);
            prop_assert!((-PI..PI).contains(&n));
        }
    }
}
