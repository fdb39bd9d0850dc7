//! Tactical controller for AI tanks
//!
//! Each tick, every live AI tank:
//! 1. picks the highest-scoring enemy and the nearest pickup in range
//! 2. selects a mode (retreat > random override > pickup > strafe > hunt)
//! 3. turns the mode into a desired heading and throttle
//! 4. runs the firing gate if its shot countdown has elapsed
//!
//! Decisions read a snapshot of the previous tick, so no tank reacts to
//! another tank's move from the same tick.

use glam::Vec2;
use rand::Rng;
use std::f32::consts::FRAC_PI_2;

use super::geometry::{blocked_cardinals, first_blocked_distance, line_blocked, wall_deflection_angle};
use super::movement::{TankControl, steer_toward};
use super::obstacles::{Blockers, Obstacles};
use super::state::{AiMode, AiState, Pickup, PlayerId, PowerUp, Tank, TankId};
use crate::tuning::{AiTuning, Tuning};
use crate::{angle_delta, heading_to};

/// What the controller may know about a tank, frozen at the start of a tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TankSnapshot {
    pub id: TankId,
    pub player: PlayerId,
    pub pos: Vec2,
    /// Displacement per tick
    pub velocity: Vec2,
    pub alive: bool,
    pub power_up: Option<PowerUp>,
    pub health: f32,
}

/// Capture every tank's observable state
pub fn snapshot(tanks: &[Tank]) -> Vec<TankSnapshot> {
    tanks
        .iter()
        .map(|t| TankSnapshot {
            id: t.id,
            player: t.player,
            pos: t.pos,
            velocity: t.velocity(),
            alive: t.alive,
            power_up: t.power_up,
            health: t.health,
        })
        .collect()
}

/// Read-only inputs to the controller
#[derive(Debug, Clone, Copy)]
pub struct AiView<'a> {
    pub snapshots: &'a [TankSnapshot],
    pub pickups: &'a [Pickup],
    pub obstacles: &'a Obstacles,
}

/// The enemy the controller is currently focused on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub id: TankId,
    pub pos: Vec2,
    pub velocity: Vec2,
    pub distance: f32,
    pub score: f32,
}

/// Highest-scoring live enemy.
///
/// Score is `numerator / distance`, weighted up for enemies holding a
/// power-up or below the wounded threshold, and down when the line of sight
/// is blocked (ignored while carrying piercing rounds). Only a strictly
/// greater score replaces the current best, so ties go to the enemy that
/// comes first in tank order.
pub fn select_target(me: &Tank, view: &AiView, tuning: &AiTuning) -> Option<Target> {
    let mut best: Option<Target> = None;
    for enemy in view.snapshots {
        if !enemy.alive || enemy.id == me.id || enemy.player == me.player {
            continue;
        }
        let distance = me.pos.distance(enemy.pos);
        let mut score = tuning.target_score_numerator / distance.max(1.0);
        if enemy.power_up.is_some() {
            score *= tuning.powerup_holder_weight;
        }
        if enemy.health < tuning.wounded_health {
            score *= tuning.wounded_target_weight;
        }
        if me.power_up != Some(PowerUp::Piercing)
            && line_blocked(view.obstacles, me.pos, enemy.pos, tuning.sight_step)
        {
            score *= tuning.hidden_target_weight;
        }

        if best.is_none_or(|b| score > b.score) {
            best = Some(Target {
                id: enemy.id,
                pos: enemy.pos,
                velocity: enemy.velocity,
                distance,
                score,
            });
        }
    }
    best
}

/// Closest pickup within search range, skipped when already armed
pub fn nearest_pickup(me: &Tank, pickups: &[Pickup], tuning: &AiTuning) -> Option<(Vec2, f32)> {
    if me.power_up.is_some() {
        return None;
    }
    pickups
        .iter()
        .map(|p| (p.pos, me.pos.distance(p.pos)))
        .filter(|(_, d)| *d <= tuning.pickup_search_radius)
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
}

/// A wall is within `near_wall_distance`
pub fn near_wall(obstacles: &Obstacles, pos: Vec2, tuning: &AiTuning) -> bool {
    obstacles.nearest_distance(pos, Blockers::Sight) < tuning.near_wall_distance
}

/// Mode selection; first matching rule wins
pub fn decide_mode<R: Rng + ?Sized>(
    me: &Tank,
    target: Option<&Target>,
    pickup: Option<(Vec2, f32)>,
    near_wall: bool,
    tuning: &AiTuning,
    rng: &mut R,
) -> AiMode {
    let distance = target.map(|t| t.distance);
    let target_within = |range: f32| distance.is_some_and(|d| d < range);

    if me.health < tuning.very_low_health
        || (near_wall && target_within(tuning.wall_threat_range))
        || (me.health < tuning.low_health && target_within(tuning.low_health_threat_range))
    {
        return AiMode::Retreat;
    }

    if rng.random_bool(tuning.random_mode_chance as f64) {
        return if rng.random_bool(0.5) {
            AiMode::Hunt
        } else {
            AiMode::Strafe
        };
    }

    let pickup_close = pickup.is_some_and(|(_, d)| d < tuning.seek_pickup_range);
    let target_far = distance.is_none_or(|d| d > tuning.seek_min_target_distance);
    if pickup_close && target_far && !near_wall {
        return AiMode::PowerupSeek;
    }

    let strafe_band = distance
        .is_some_and(|d| d > tuning.strafe_min_distance && d < tuning.strafe_max_distance);
    if strafe_band && !near_wall {
        return AiMode::Strafe;
    }

    AiMode::Hunt
}

/// Desired heading, throttle and steering gain for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
struct Steering {
    heading: f32,
    throttle: f32,
    gain: f32,
}

fn hunt<R: Rng + ?Sized>(
    me: &Tank,
    target: Option<&Target>,
    obstacles: &Obstacles,
    tuning: &AiTuning,
    rng: &mut R,
) -> Steering {
    let mut heading = target.map_or(me.heading, |t| heading_to(me.pos, t.pos));
    if rng.random_bool(tuning.hunt_perturb_chance as f64) {
        heading += rng.random_range(-tuning.hunt_perturb_angle..=tuning.hunt_perturb_angle);
    }
    let mut throttle = 1.0;

    if let Some(deflected) =
        wall_deflection_angle(obstacles, me.pos, me.heading, tuning.deflection_probe, rng)
    {
        heading = deflected;
        // Blocked: back off, or circle around the obstacle
        throttle = if rng.random_bool(0.5) { -1.0 } else { 0.5 };
    }

    Steering {
        heading,
        throttle,
        gain: 1.0,
    }
}

fn strafe<R: Rng + ?Sized>(
    me: &Tank,
    ai: &mut AiState,
    target: &Target,
    obstacles: &Obstacles,
    tuning: &AiTuning,
    rng: &mut R,
) -> Steering {
    ai.ticks_since_flip += 1;
    if ai.ticks_since_flip >= ai.flip_after {
        ai.strafe_dir = if rng.random_bool(tuning.strafe_random_pick_chance as f64) {
            if rng.random_bool(0.5) { 1.0 } else { -1.0 }
        } else {
            -ai.strafe_dir
        };
        reset_strafe_timer(ai, tuning, rng);
    }

    let mut heading = heading_to(me.pos, target.pos) + ai.strafe_dir * FRAC_PI_2;
    if let Some(deflected) =
        wall_deflection_angle(obstacles, me.pos, me.heading, tuning.deflection_probe, rng)
    {
        heading = deflected;
    }

    Steering {
        heading,
        throttle: tuning.strafe_throttle,
        gain: tuning.strafe_ease,
    }
}

fn retreat<R: Rng + ?Sized>(
    me: &Tank,
    target: Option<&Target>,
    obstacles: &Obstacles,
    tuning: &AiTuning,
    rng: &mut R,
) -> Steering {
    let mut heading = target.map_or(me.heading, |t| heading_to(t.pos, me.pos));
    if let Some(deflected) =
        wall_deflection_angle(obstacles, me.pos, me.heading, tuning.deflection_probe, rng)
    {
        heading = deflected;
    }
    Steering {
        heading,
        throttle: 1.0,
        gain: 1.0,
    }
}

fn reset_strafe_timer<R: Rng + ?Sized>(ai: &mut AiState, tuning: &AiTuning, rng: &mut R) {
    ai.ticks_since_flip = 0;
    ai.flip_after = rng.random_range(tuning.strafe_flip_min_ticks..=tuning.strafe_flip_max_ticks);
}

/// Firing gate. Rejects shots from next to walls, at close range while
/// badly hurt, along a path that clips a nearby wall, or from a corner;
/// otherwise fires when the jittered lead-predicted aim point is inside a
/// health-scaled tolerance and the target is past the minimum distance.
pub fn smart_shooting<R: Rng + ?Sized>(
    me: &Tank,
    target: &Target,
    obstacles: &Obstacles,
    tuning: &Tuning,
    rng: &mut R,
) -> bool {
    let ai = &tuning.ai;

    if obstacles.nearest_distance(me.pos, Blockers::Sight) < ai.fire_wall_clearance {
        return false;
    }
    if me.health < ai.fire_low_health && target.distance < ai.fire_low_health_range {
        return false;
    }
    if first_blocked_distance(obstacles, me.pos, target.pos, ai.shot_path_step)
        .is_some_and(|d| d < ai.shot_path_wall_range)
    {
        return false;
    }
    if blocked_cardinals(obstacles, me.pos, ai.corner_probe) >= ai.corner_min_hits {
        return false;
    }

    let health = health_fraction(me, tuning);
    let kind = me.power_up.map(|p| p.projectile_kind()).unwrap_or_default();
    let lead_ticks = target.distance / tuning.bullet.speed(kind);
    let jitter = Vec2::new(
        rng.random_range(-ai.aim_jitter..=ai.aim_jitter),
        rng.random_range(-ai.aim_jitter..=ai.aim_jitter),
    );
    let aim = target.pos + target.velocity * lead_ticks + jitter;
    let error = angle_delta(me.heading, heading_to(me.pos, aim)).abs();

    let variance = ai.aim_tolerance_variance;
    let tolerance =
        ai.aim_tolerance * (0.5 + 0.5 * health) * rng.random_range(1.0 - variance..=1.0 + variance);
    let min_distance = ai.min_fire_distance_healthy
        + (ai.min_fire_distance_wounded - ai.min_fire_distance_healthy) * (1.0 - health);

    error < tolerance && target.distance > min_distance
}

fn health_fraction(me: &Tank, tuning: &Tuning) -> f32 {
    (me.health / tuning.tank.max_health).clamp(0.0, 1.0)
}

/// Randomized countdown until the next shot; longer when hurt
fn shot_cooldown<R: Rng + ?Sized>(me: &Tank, tuning: &Tuning, rng: &mut R) -> u32 {
    let ai = &tuning.ai;
    let base = rng.random_range(ai.shot_cooldown_min..=ai.shot_cooldown_max) as f32;
    let caution = 1.0 + ai.shot_cooldown_wounded_scale * (1.0 - health_fraction(me, tuning));
    (base * caution).round() as u32
}

/// Run the controller for one AI tank. Dead, frozen and human tanks get
/// the no-op control.
pub fn think<R: Rng + ?Sized>(
    me: &mut Tank,
    view: &AiView,
    tuning: &Tuning,
    rng: &mut R,
) -> TankControl {
    if !me.alive || me.frozen {
        return TankControl::default();
    }
    let Some(mut ai) = me.ai.take() else {
        return TankControl::default();
    };
    let tune = &tuning.ai;

    ai.shot_cooldown = ai.shot_cooldown.saturating_sub(1);

    let target = select_target(me, view, tune);
    let pickup = nearest_pickup(me, view.pickups, tune);
    let walled = near_wall(view.obstacles, me.pos, tune);
    let mode = decide_mode(me, target.as_ref(), pickup, walled, tune, rng);

    if mode != ai.mode {
        log::debug!("Tank {:?}: {:?} -> {:?}", me.id, ai.mode, mode);
        if mode == AiMode::Strafe {
            reset_strafe_timer(&mut ai, tune, rng);
        }
        ai.mode = mode;
    }

    let steering = match (mode, target.as_ref(), pickup) {
        (AiMode::Retreat, t, _) => retreat(me, t, view.obstacles, tune, rng),
        (AiMode::Strafe, Some(t), _) => strafe(me, &mut ai, t, view.obstacles, tune, rng),
        (AiMode::PowerupSeek, _, Some((pos, _))) => Steering {
            heading: heading_to(me.pos, pos),
            throttle: 1.0,
            gain: 1.0,
        },
        // Random overrides can land in strafe without a target
        (_, t, _) => hunt(me, t, view.obstacles, tune, rng),
    };

    let mut fire = false;
    if let Some(t) = target.as_ref() {
        if ai.shot_cooldown == 0 && me.reload == 0 && smart_shooting(me, t, view.obstacles, tuning, rng) {
            fire = true;
            ai.shot_cooldown = shot_cooldown(me, tuning, rng);
            log::debug!("Tank {:?} fires at {:?} ({:.0} units)", me.id, t.id, t.distance);
        }
    }

    me.ai = Some(ai);
    TankControl {
        throttle: steering.throttle,
        turn: steer_toward(me.heading, steering.heading, tuning.tank.turn_rate, steering.gain),
        fire,
    }
}
