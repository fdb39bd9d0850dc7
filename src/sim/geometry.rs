//! Collision and visibility queries against the static world
//!
//! Everything here is a pure query: nothing mutates the world. Contract
//! violations (non-positive march steps, negative extents) panic.

use glam::Vec2;
use rand::Rng;
use std::f32::consts::FRAC_PI_3;

use super::obstacles::{Blockers, Obstacles, Rect};
use crate::heading_vector;

/// Gap left between a repositioned body and the surface it was pushed off
const SEPARATION: f32 = 0.01;

/// Overlap between a moving box and a solid rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Penetration depth along each axis
    pub depth: Vec2,
    /// Displacement that moves the box just outside the rectangle
    pub push: Vec2,
}

impl Contact {
    /// True when the box sank deeper along x than along y, i.e. it hit a
    /// horizontal face and should reflect across the x axis
    #[inline]
    pub fn reflects_across_x(&self) -> bool {
        self.depth.x > self.depth.y
    }

    /// Mirror `heading` across the axis with the greater penetration
    pub fn reflect(&self, heading: f32) -> f32 {
        if self.reflects_across_x() {
            -heading
        } else {
            std::f32::consts::PI - heading
        }
    }
}

/// Square of half-extent `half` centered on `center` intersects `rect`
#[inline]
pub fn rect_overlap(center: Vec2, half: f32, rect: &Rect) -> bool {
    assert!(half >= 0.0, "half-extent must be non-negative");
    Rect::around(center, half).intersects(rect)
}

/// Circles of combined radius `radius` overlap (boundary excluded)
#[inline]
pub fn circle_overlap(a: Vec2, b: Vec2, radius: f32) -> bool {
    a.distance_squared(b) < radius * radius
}

/// Square at `center` overlaps any solid in `blockers`
pub fn box_blocked(obstacles: &Obstacles, center: Vec2, half: f32, blockers: Blockers) -> bool {
    obstacles
        .solids(blockers)
        .any(|(_, rect)| rect_overlap(center, half, &rect))
}

/// Overlap details for a square at `center` moving by `motion` per tick
/// against `rect`, if any.
///
/// The push leaves through the face the body entered by (opposite to its
/// motion on the push axis), so a body that crossed the middle of a thin
/// rectangle in one step still ends up back on its own side. A body at
/// rest on that axis leaves through the nearer face.
pub fn box_contact(center: Vec2, half: f32, rect: &Rect, motion: Vec2) -> Option<Contact> {
    if !rect_overlap(center, half, rect) {
        return None;
    }
    let body = Rect::around(center, half);
    let depth = Vec2::new(
        (body.max.x - rect.min.x).min(rect.max.x - body.min.x),
        (body.max.y - rect.min.y).min(rect.max.y - body.min.y),
    );

    let mid = rect.center();
    let exit = |c: f32, moving: f32, lo: f32, hi: f32, mid: f32| {
        let to_low = if moving != 0.0 { moving > 0.0 } else { c < mid };
        if to_low {
            lo - half - SEPARATION - c
        } else {
            hi + half + SEPARATION - c
        }
    };
    let push = if depth.x > depth.y {
        // Hit a horizontal face: leave vertically
        Vec2::new(0.0, exit(center.y, motion.y, rect.min.y, rect.max.y, mid.y))
    } else {
        Vec2::new(exit(center.x, motion.x, rect.min.x, rect.max.x, mid.x), 0.0)
    };

    Some(Contact { depth, push })
}

/// Sample points marching from `from` to `to` in at most `step` increments,
/// endpoints included
fn march(from: Vec2, to: Vec2, step: f32) -> impl Iterator<Item = Vec2> {
    assert!(step > 0.0, "march step must be positive");
    let len = from.distance(to);
    let n = ((len / step).ceil() as u32).max(1);
    (0..=n).map(move |k| from.lerp(to, k as f32 / n as f32))
}

/// Ray-marched visibility: true if any sampled point between `a` and `b`
/// falls inside a sight blocker.
///
/// Endpoints are put in a canonical order before marching, so
/// `line_blocked(a, b)` and `line_blocked(b, a)` sample the same points.
pub fn line_blocked(obstacles: &Obstacles, a: Vec2, b: Vec2, step: f32) -> bool {
    let (from, to) = if (a.x, a.y) <= (b.x, b.y) { (a, b) } else { (b, a) };
    march(from, to, step).any(|p| obstacles.point_blocked(p, Blockers::Sight))
}

/// Distance from `from` to the first sampled point on the way to `to`
/// that lies inside a sight blocker
pub fn first_blocked_distance(obstacles: &Obstacles, from: Vec2, to: Vec2, step: f32) -> Option<f32> {
    march(from, to, step)
        .find(|p| obstacles.point_blocked(*p, Blockers::Sight))
        .map(|p| from.distance(p))
}

/// Probe `probe` units ahead along `heading`. If the probe point is inside a
/// movement blocker, return a heading turned 60° left or right (random);
/// `None` means nothing is ahead.
pub fn wall_deflection_angle<R: Rng + ?Sized>(
    obstacles: &Obstacles,
    pos: Vec2,
    heading: f32,
    probe: f32,
    rng: &mut R,
) -> Option<f32> {
    let ahead = pos + heading_vector(heading) * probe;
    if !obstacles.point_blocked(ahead, Blockers::Movement) {
        return None;
    }
    let side = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
    Some(heading + side * FRAC_PI_3)
}

/// How many of the four cardinal probes at `probe` range hit a movement blocker
pub fn blocked_cardinals(obstacles: &Obstacles, pos: Vec2, probe: f32) -> u32 {
    [Vec2::X, Vec2::NEG_X, Vec2::Y, Vec2::NEG_Y]
        .into_iter()
        .filter(|dir| obstacles.point_blocked(pos + *dir * probe, Blockers::Movement))
        .count() as u32
}
