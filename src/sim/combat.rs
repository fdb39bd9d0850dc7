//! Combat arbitration
//!
//! Applies projectile effects to tanks, attributes kills and decides when a
//! round is over. This is the only place tanks are destroyed or frozen.

use glam::Vec2;

use super::geometry::circle_overlap;
use super::projectile::Effect;
use super::state::{PlayerId, TankId, World, nearest_image};
use super::tick::GameEvent;

/// Apply effects in the order they were produced
pub fn apply_effects(world: &mut World, effects: &[Effect], events: &mut Vec<GameEvent>) {
    for effect in effects {
        match *effect {
            Effect::Destroy { victim, by } => destroy(world, victim, Some(by), events),
            Effect::Freeze { victim, ticks } => freeze(world, victim, ticks, events),
            Effect::Blast { center, radius, by } => blast(world, center, radius, by, events),
            Effect::ImpactShock { pos } => events.push(GameEvent::ImpactShock { pos }),
            Effect::PierceTrail { pos } => events.push(GameEvent::PierceTrail { pos }),
        }
    }
}

/// Destroy a live tank. `by` is the attacking player, or `None` when the
/// tank is removed for a reason nobody gets credit for. Destroying your own
/// tank scores nothing.
pub fn destroy(world: &mut World, victim: TankId, by: Option<PlayerId>, events: &mut Vec<GameEvent>) {
    let Some(tank) = world.tank_mut(victim) else {
        return;
    };
    if !tank.alive {
        return;
    }
    tank.destroy();
    let victim_player = tank.player;
    events.push(GameEvent::TankDestroyed { tank: victim, by });

    if let Some(killer) = by.filter(|k| *k != victim_player) {
        world.scoreboard.record_kill(killer);
        log::info!("Player {:?} destroyed player {:?}", killer, victim_player);
        events.push(GameEvent::Kill {
            killer,
            victim: victim_player,
        });
    }
}

fn freeze(world: &mut World, victim: TankId, ticks: u32, events: &mut Vec<GameEvent>) {
    let Some(tank) = world.tank_mut(victim) else {
        return;
    };
    if !tank.alive {
        return;
    }
    tank.freeze(ticks);
    events.push(GameEvent::Frozen { tank: victim, ticks });
}

/// Every live tank strictly inside `radius` is destroyed
fn blast(world: &mut World, center: Vec2, radius: f32, by: PlayerId, events: &mut Vec<GameEvent>) {
    events.push(GameEvent::Explosion { center, radius });
    let (width, height) = (world.width, world.height);
    let caught: Vec<TankId> = world
        .tanks
        .iter()
        .filter(|t| t.alive && circle_overlap(center, nearest_image(center, t.pos, width, height), radius))
        .map(|t| t.id)
        .collect();
    for id in caught {
        destroy(world, id, Some(by), events);
    }
}

/// Raise round end once when at most one contestant is left standing.
///
/// Training worlds never end, training tanks never count, and a world with
/// fewer than two contestants has nothing to contest. Returns the event if
/// one was raised.
pub fn check_round_end(world: &mut World, events: &mut Vec<GameEvent>) -> Option<GameEvent> {
    if world.training || world.round_over {
        return None;
    }
    let contestants = world.tanks.iter().filter(|t| t.is_contestant()).count();
    if contestants < 2 {
        return None;
    }

    let winner = {
        let mut alive = world.contestants_alive();
        match (alive.next(), alive.next()) {
            (Some(_), Some(_)) => return None,
            (Some(last), None) => Some(last.player),
            _ => None,
        }
    };

    world.round_over = true;
    match winner {
        Some(player) => {
            world.scoreboard.record_win(player);
            log::info!("Round over at tick {}: player {:?} wins", world.time_ticks, player);
        }
        None => log::info!("Round over at tick {}: no survivors", world.time_ticks),
    }
    let event = GameEvent::RoundEnd { winner };
    events.push(event.clone());
    Some(event)
}
