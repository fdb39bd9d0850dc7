//! Fixed timestep simulation tick
//!
//! One call advances the arena by one step:
//! snapshot -> controls -> motion -> pickups -> firing -> projectiles ->
//! arbitration -> round end.

use glam::Vec2;
use rand::Rng;
use std::collections::BTreeMap;

use super::ai::{self, AiView};
use super::combat;
use super::movement::{InputIntent, TankControl, apply_control, collect_pickups, integrate, separate_tanks};
use super::projectile::{self, Arena};
use super::state::{PlayerId, PowerUp, ProjectileKind, TankId, World};
use crate::error::SimAnomaly;
use crate::tuning::Tuning;

/// Human input for a single tick, keyed by tank. AI tanks ignore it.
pub type TickInput = BTreeMap<TankId, InputIntent>;

/// Something that happened during a tick, for rendering and scoring
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// A tank fired `count` projectiles of `kind`
    Fired {
        tank: TankId,
        kind: ProjectileKind,
        count: usize,
    },
    PickedUp {
        tank: TankId,
        power_up: PowerUp,
    },
    /// Kill credited to `killer`
    Kill { killer: PlayerId, victim: PlayerId },
    /// `by` is `None` when nobody gets credit
    TankDestroyed { tank: TankId, by: Option<PlayerId> },
    Frozen { tank: TankId, ticks: u32 },
    Explosion { center: Vec2, radius: f32 },
    ImpactShock { pos: Vec2 },
    PierceTrail { pos: Vec2 },
    /// `None` when the last contestants died together
    RoundEnd { winner: Option<PlayerId> },
    /// A malformed entity was dropped
    Anomaly(SimAnomaly),
}

/// Advance the world by one fixed timestep
pub fn tick<R: Rng + ?Sized>(
    world: &mut World,
    input: &TickInput,
    tuning: &Tuning,
    rng: &mut R,
) -> Vec<GameEvent> {
    let mut events = Vec::new();
    world.normalize_order();

    discard_malformed_tanks(world, &mut events);

    // Decisions see the world as it was before anyone moved
    let snapshots = ai::snapshot(&world.tanks);
    let mut wants_fire = Vec::new();
    {
        let view = AiView {
            snapshots: &snapshots,
            pickups: &world.pickups,
            obstacles: &world.obstacles,
        };
        for tank in world.tanks.iter_mut() {
            let control = if tank.is_ai() {
                ai::think(tank, &view, tuning, rng)
            } else {
                input
                    .get(&tank.id)
                    .copied()
                    .map(TankControl::from)
                    .unwrap_or_default()
            };
            if apply_control(tank, &control, &tuning.tank) {
                wants_fire.push(tank.id);
            }
        }
    }

    for tank in world.tanks.iter_mut() {
        integrate(tank, &world.obstacles, world.width, world.height, &tuning.tank);
    }
    separate_tanks(world, &tuning.tank);

    for (tank, power_up) in collect_pickups(world, &tuning.tank) {
        events.push(GameEvent::PickedUp { tank, power_up });
    }

    for id in wants_fire {
        let Some(kind) = world
            .tank(id)
            .map(|t| t.power_up.map(|p| p.projectile_kind()).unwrap_or_default())
        else {
            continue;
        };
        let count = projectile::fire(world, id, tuning);
        if count > 0 {
            events.push(GameEvent::Fired {
                tank: id,
                kind,
                count,
            });
        }
    }

    let mut effects = Vec::new();
    let mut projectiles = std::mem::take(&mut world.projectiles);
    {
        let arena = Arena::of(world);
        projectiles.retain_mut(|p| match projectile::advance(p, &arena, tuning, &mut effects) {
            Ok(alive) => alive,
            Err(anomaly) => {
                log::warn!("Dropping projectile: {anomaly}");
                events.push(GameEvent::Anomaly(anomaly));
                false
            }
        });
    }
    world.projectiles = projectiles;

    combat::apply_effects(world, &effects, &mut events);
    combat::check_round_end(world, &mut events);

    world.time_ticks += 1;
    events
}

/// Take tanks with NaN/infinite state out of the round, uncredited
fn discard_malformed_tanks(world: &mut World, events: &mut Vec<GameEvent>) {
    let broken: Vec<(TankId, PlayerId)> = world
        .tanks
        .iter()
        .filter(|t| t.alive && !t.is_finite())
        .map(|t| (t.id, t.player))
        .collect();

    for (tank, player) in broken {
        let anomaly = SimAnomaly::NonFiniteTank { tank, player };
        log::warn!("Removing tank: {anomaly}");
        events.push(GameEvent::Anomaly(anomaly));
        combat::destroy(world, tank, None, events);
        if let Some(t) = world.tank_mut(tank) {
            if !t.pos.is_finite() {
                t.pos = Vec2::ZERO;
            }
            if !t.heading.is_finite() {
                t.heading = 0.0;
            }
        }
    }
}
