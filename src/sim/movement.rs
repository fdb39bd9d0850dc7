//! Tank motion: control intents, integration and obstacle resolution
//!
//! Human input and the tactical controller both reduce to a [`TankControl`],
//! which sets speed and turn rate exactly once per tick before integration.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::box_blocked;
use super::obstacles::{Blockers, Obstacles};
use super::state::{PowerUp, Tank, TankId, World, wrap_position};
use crate::angle_delta;
use crate::normalize_angle;
use crate::tuning::TankTuning;

/// Per-tick motion intent for one tank
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TankControl {
    /// -1 (full reverse) ..= 1 (full forward)
    pub throttle: f32,
    /// -1 (clockwise) ..= 1 (counter-clockwise)
    pub turn: f32,
    pub fire: bool,
}

/// Raw human input for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputIntent {
    pub turn_left: bool,
    pub turn_right: bool,
    pub forward: bool,
    pub backward: bool,
    pub fire: bool,
}

impl From<InputIntent> for TankControl {
    fn from(input: InputIntent) -> Self {
        let axis = |pos: bool, neg: bool| match (pos, neg) {
            (true, false) => 1.0,
            (false, true) => -1.0,
            _ => 0.0,
        };
        TankControl {
            throttle: axis(input.forward, input.backward),
            turn: axis(input.turn_left, input.turn_right),
            fire: input.fire,
        }
    }
}

/// Turn input that rotates `heading` toward `desired`, closing at most
/// `gain` of the remaining error this tick
pub fn steer_toward(heading: f32, desired: f32, turn_rate: f32, gain: f32) -> f32 {
    let error = angle_delta(heading, desired) * gain;
    (error / turn_rate).clamp(-1.0, 1.0)
}

/// Assign speed and turn rate for this tick. Returns whether the tank
/// still wants to fire after frozen/dead filtering.
pub fn apply_control(tank: &mut Tank, control: &TankControl, tuning: &TankTuning) -> bool {
    tank.reload = tank.reload.saturating_sub(1);
    tank.normalize_loadout();

    if !tank.alive {
        tank.speed = 0.0;
        tank.turn_speed = 0.0;
        return false;
    }

    if tank.frozen {
        tank.speed = 0.0;
        tank.turn_speed = 0.0;
        tank.frozen_ticks = tank.frozen_ticks.saturating_sub(1);
        if tank.frozen_ticks == 0 {
            tank.frozen = false;
        }
        return false;
    }

    let throttle = control.throttle.clamp(-1.0, 1.0);
    tank.speed = if throttle >= 0.0 {
        throttle * tuning.max_speed
    } else {
        throttle * tuning.max_speed * tuning.reverse_factor
    };
    tank.turn_speed = control.turn.clamp(-1.0, 1.0) * tuning.turn_rate;
    control.fire
}

/// Rotate, move and wrap one tank, sliding along movement blockers
pub fn integrate(tank: &mut Tank, obstacles: &Obstacles, width: f32, height: f32, tuning: &TankTuning) {
    if !tank.alive {
        return;
    }
    tank.heading = normalize_angle(tank.heading + tank.turn_speed);

    let delta = tank.velocity();
    if delta == Vec2::ZERO {
        return;
    }

    let half = tuning.size * 0.5;
    let clear = |p: Vec2| !box_blocked(obstacles, p, half, Blockers::Movement);

    // Full move, then each axis alone so tanks slide along walls
    let candidates = [
        delta,
        Vec2::new(delta.x, 0.0),
        Vec2::new(0.0, delta.y),
    ];
    for step in candidates {
        if step == Vec2::ZERO {
            continue;
        }
        let next = wrap_position(tank.pos + step, width, height);
        if clear(next) {
            tank.pos = next;
            return;
        }
    }
}

/// Push overlapping live tanks apart. Contact between tanks is not lethal.
pub fn separate_tanks(world: &mut World, tuning: &TankTuning) {
    let min_dist = tuning.hit_radius * 2.0;
    let half = tuning.size * 0.5;
    let n = world.tanks.len();
    for i in 0..n {
        for j in (i + 1)..n {
            let (a, b) = (&world.tanks[i], &world.tanks[j]);
            if !a.alive || !b.alive {
                continue;
            }
            let delta = b.pos - a.pos;
            let dist = delta.length();
            if dist <= 0.0 || dist >= min_dist {
                continue;
            }
            let push = delta / dist * (min_dist - dist) * 0.5;
            let next_a = world.wrap(a.pos - push);
            let next_b = world.wrap(b.pos + push);
            if !box_blocked(&world.obstacles, next_a, half, Blockers::Movement) {
                world.tanks[i].pos = next_a;
            }
            if !box_blocked(&world.obstacles, next_b, half, Blockers::Movement) {
                world.tanks[j].pos = next_b;
            }
        }
    }
}

/// Hand pickups to unarmed live tanks that reach them. Returns what was taken.
pub fn collect_pickups(world: &mut World, tuning: &TankTuning) -> Vec<(TankId, PowerUp)> {
    let mut taken = Vec::new();
    for tank in world.tanks.iter_mut() {
        if !tank.alive || tank.power_up.is_some() {
            continue;
        }
        let reach = tuning.pickup_radius + tuning.hit_radius;
        if let Some(idx) = world
            .pickups
            .iter()
            .position(|p| p.pos.distance(tank.pos) < reach)
        {
            let pickup = world.pickups.remove(idx);
            tank.equip(pickup.kind, tuning.special_ammo);
            log::debug!("Tank {:?} picked up {:?}", tank.id, pickup.kind);
            taken.push((tank.id, pickup.kind));
        }
    }
    taken
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::obstacles::Rect;
    use crate::sim::state::PlayerId;
    use crate::tuning::Tuning;

    fn tank(t: &Tuning) -> Tank {
        Tank::new(TankId(0), PlayerId(1), Vec2::new(100.0, 100.0), 0.0, &t.tank)
    }

    #[test]
    fn test_input_intent_translation() {
        let c: TankControl = InputIntent {
            turn_left: true,
            backward: true,
            fire: true,
            ..Default::default()
        }
        .into();
        assert_eq!(c.turn, 1.0);
        assert_eq!(c.throttle, -1.0);
        assert!(c.fire);

        let both: TankControl = InputIntent {
            turn_left: true,
            turn_right: true,
            ..Default::default()
        }
        .into();
        assert_eq!(both.turn, 0.0);
    }

    #[test]
    fn test_reverse_is_scaled() {
        let t = Tuning::default();
        let mut tank = tank(&t);
        let control = TankControl {
            throttle: -1.0,
            ..Default::default()
        };
        apply_control(&mut tank, &control, &t.tank);
        assert!((tank.speed + t.tank.max_speed * t.tank.reverse_factor).abs() < 1e-6);
    }

    #[test]
    fn test_frozen_tank_stays_still_then_resumes() {
        let t = Tuning::default();
        let mut tank = tank(&t);
        let go = TankControl {
            throttle: 1.0,
            turn: 1.0,
            fire: true,
        };
        tank.freeze(3);
        for _ in 0..3 {
            assert!(!apply_control(&mut tank, &go, &t.tank));
            assert_eq!(tank.speed, 0.0);
            assert_eq!(tank.turn_speed, 0.0);
        }
        // Countdown reached zero on the last frozen tick
        assert!(!tank.frozen);
        assert!(apply_control(&mut tank, &go, &t.tank));
        assert!(tank.speed > 0.0);
    }

    #[test]
    fn test_integrate_slides_along_wall() {
        let t = Tuning::default();
        let obstacles = Obstacles::with_walls(vec![Rect::new(116.0, 0.0, 20.0, 400.0)]);
        let mut tank = tank(&t);
        tank.heading = std::f32::consts::FRAC_PI_4;
        tank.speed = 2.0;
        let before = tank.pos;
        integrate(&mut tank, &obstacles, 800.0, 600.0, &t.tank);
        // x blocked by the wall, y still advances
        assert!((tank.pos.x - before.x).abs() < 1e-6);
        assert!(tank.pos.y > before.y);
    }

    #[test]
    fn test_integrate_wraps_around_edges() {
        let t = Tuning::default();
        let mut tank = tank(&t);
        tank.pos = Vec2::new(799.0, 300.0);
        tank.speed = 2.0;
        integrate(&mut tank, &Obstacles::default(), 800.0, 600.0, &t.tank);
        assert!((tank.pos.x - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_steer_toward_clamps() {
        assert_eq!(steer_toward(0.0, 3.0, 0.06, 1.0), 1.0);
        assert_eq!(steer_toward(0.0, -3.0, 0.06, 1.0), -1.0);
        assert!((steer_toward(0.0, 0.03, 0.06, 1.0) - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_pickup_equips_tank() {
        let t = Tuning::default();
        let mut world = World::new(&t.world, Obstacles::default());
        let id = world.spawn_tank(PlayerId(1), Vec2::new(50.0, 50.0), 0.0, &t.tank);
        world.spawn_pickup(PowerUp::Rocket, Vec2::new(60.0, 50.0));
        world.spawn_pickup(PowerUp::Laser, Vec2::new(400.0, 400.0));
        let taken = collect_pickups(&mut world, &t.tank);
        assert_eq!(taken, vec![(id, PowerUp::Rocket)]);
        assert_eq!(world.pickups.len(), 1);
        let tank = world.tank(id).unwrap();
        assert_eq!(tank.power_up, Some(PowerUp::Rocket));
        assert_eq!(tank.special_ammo, t.tank.special_ammo);
    }

    #[test]
    fn test_tanks_pushed_apart() {
        let t = Tuning::default();
        let mut world = World::new(&t.world, Obstacles::default());
        world.spawn_tank(PlayerId(1), Vec2::new(100.0, 100.0), 0.0, &t.tank);
        world.spawn_tank(PlayerId(2), Vec2::new(110.0, 100.0), 0.0, &t.tank);
        separate_tanks(&mut world, &t.tank);
        let d = world.tanks[0].pos.distance(world.tanks[1].pos);
        assert!((d - t.tank.hit_radius * 2.0).abs() < 1e-3);
        assert!(world.tanks.iter().all(|t| t.alive));
    }
}
