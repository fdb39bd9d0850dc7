//! Projectile engine: firing, per-tick advance and per-kind collision policy
//!
//! Projectiles never touch tank state directly. Every consequence of a hit
//! is reported as an [`Effect`] for combat arbitration to apply.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::{box_contact, circle_overlap, rect_overlap};
use super::obstacles::{Blockers, Obstacles, Rect, SolidRef};
use super::state::{
    ObstaclePolicy, PlayerId, Projectile, ProjectileKind, Tank, TankHitPolicy, TankId, World,
    nearest_image, wrap_position,
};
use crate::error::SimAnomaly;
use crate::tuning::Tuning;
use crate::{heading_vector, normalize_angle};

/// Consequence of a projectile update
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    /// Destroy one tank outright
    Destroy { victim: TankId, by: PlayerId },
    /// Immobilize one tank
    Freeze { victim: TankId, ticks: u32 },
    /// Destroy every live tank strictly within `radius` of `center`
    Blast {
        center: Vec2,
        radius: f32,
        by: PlayerId,
    },
    /// Rocket impact shock (cosmetic, for the renderer)
    ImpactShock { pos: Vec2 },
    /// Piercing pass-through trail (cosmetic, for the renderer)
    PierceTrail { pos: Vec2 },
}

/// Read-only view of the world a projectile is advanced against
#[derive(Debug, Clone, Copy)]
pub struct Arena<'a> {
    pub tanks: &'a [Tank],
    pub obstacles: &'a Obstacles,
    pub width: f32,
    pub height: f32,
}

impl<'a> Arena<'a> {
    pub fn of(world: &'a World) -> Self {
        Self {
            tanks: &world.tanks,
            obstacles: &world.obstacles,
            width: world.width,
            height: world.height,
        }
    }
}

/// Headings for one shot of `kind` fired along `heading`
pub fn shot_headings(kind: ProjectileKind, heading: f32, tuning: &Tuning) -> Vec<f32> {
    if kind != ProjectileKind::Scatter {
        return vec![heading];
    }
    let n = tuning.bullet.scatter_count;
    let center = (n as f32 - 1.0) / 2.0;
    (0..n)
        .map(|i| normalize_angle(heading + (i as f32 - center) * tuning.bullet.scatter_spread))
        .collect()
}

/// Fire the tank's current weapon. Returns the number of projectiles
/// spawned (0 if the tank is dead, frozen or reloading).
pub fn fire(world: &mut World, shooter: TankId, tuning: &Tuning) -> usize {
    let Some(tank) = world.tank(shooter) else {
        return 0;
    };
    if !tank.can_fire() {
        return 0;
    }

    let kind = tank
        .power_up
        .map(|p| p.projectile_kind())
        .unwrap_or_default();
    let (origin, heading, owner) = (tank.pos, tank.heading, tank.player);

    let speed = tuning.bullet.speed(kind);
    let size = tuning.bullet.size(kind);
    let lifetime = tuning.bullet.lifetime(kind);
    // Spawn clear of the shooter's own hit circle
    let muzzle = tuning.tank.hit_radius + size + tuning.bullet.muzzle_clearance;

    let headings = shot_headings(kind, heading, tuning);
    for &h in &headings {
        let id = world.next_entity_id();
        let pos = world.wrap(origin + heading_vector(h) * muzzle);
        world.projectiles.push(Projectile {
            id,
            kind,
            pos,
            heading: h,
            speed,
            lifetime,
            size,
            owner,
            shooter,
            pierce_count: 0,
            inside: Vec::new(),
        });
    }

    if let Some(tank) = world.tank_mut(shooter) {
        if tank.power_up.is_some() {
            tank.special_ammo = tank.special_ammo.saturating_sub(1);
            tank.normalize_loadout();
        }
        tank.reload = tuning.tank.reload_ticks;
    }
    headings.len()
}

fn detonate(p: &Projectile, center: Vec2, tuning: &Tuning, effects: &mut Vec<Effect>) {
    if let Some(radius) = tuning.bullet.blast_radius(p.kind) {
        effects.push(Effect::Blast {
            center,
            radius,
            by: p.owner,
        });
    }
    if p.kind == ProjectileKind::Rocket {
        effects.push(Effect::ImpactShock { pos: center });
    }
}

/// Resolve contact with live tanks. First match in tank order wins.
fn hit_tank(p: &Projectile, arena: &Arena, tuning: &Tuning, effects: &mut Vec<Effect>) -> bool {
    let reach = tuning.tank.hit_radius + p.size;
    let Some(tank) = arena
        .tanks
        .iter()
        .find(|t| {
            let near = nearest_image(p.pos, t.pos, arena.width, arena.height);
            t.alive && circle_overlap(p.pos, near, reach)
        })
    else {
        return false;
    };

    match p.kind.tank_hit_policy() {
        TankHitPolicy::Destroy => effects.push(Effect::Destroy {
            victim: tank.id,
            by: p.owner,
        }),
        TankHitPolicy::Freeze => effects.push(Effect::Freeze {
            victim: tank.id,
            ticks: tuning.bullet.freeze_ticks,
        }),
        TankHitPolicy::Detonate => detonate(p, tank.pos, tuning, effects),
    }
    true
}

fn bounce(p: &mut Projectile, rect: &Rect) {
    let motion = heading_vector(p.heading) * p.speed;
    if let Some(contact) = box_contact(p.pos, p.size, rect, motion) {
        p.heading = normalize_angle(contact.reflect(p.heading));
        p.pos += contact.push;
    }
}

/// Resolve contact with obstacles. Returns false if the projectile is consumed.
fn hit_obstacles(p: &mut Projectile, arena: &Arena, tuning: &Tuning, effects: &mut Vec<Effect>) -> bool {
    let policy = p.kind.obstacle_policy();
    let mut still_inside: Vec<SolidRef> = Vec::new();

    for (solid, rect) in arena.obstacles.solids(Blockers::Projectile) {
        if !rect_overlap(p.pos, p.size, &rect) {
            continue;
        }
        match policy {
            ObstaclePolicy::Bounce => bounce(p, &rect),
            ObstaclePolicy::Detonate => {
                detonate(p, p.pos, tuning, effects);
                return false;
            }
            ObstaclePolicy::Pierce => {
                if p.inside.contains(&solid) {
                    // Same contact, still passing through
                    still_inside.push(solid);
                } else if p.pierce_count < tuning.bullet.pierce_cap {
                    p.pierce_count += 1;
                    effects.push(Effect::PierceTrail { pos: p.pos });
                    still_inside.push(solid);
                } else {
                    bounce(p, &rect);
                }
            }
        }
    }

    if policy == ObstaclePolicy::Pierce {
        p.inside = still_inside;
    }
    true
}

/// Advance one projectile by one tick.
///
/// Returns `Ok(true)` if the projectile survives. Tank contact is checked
/// before obstacle contact; at most one tank is hit per projectile per tick.
pub fn advance(
    p: &mut Projectile,
    arena: &Arena,
    tuning: &Tuning,
    effects: &mut Vec<Effect>,
) -> Result<bool, SimAnomaly> {
    if !p.is_finite() {
        return Err(SimAnomaly::NonFiniteProjectile { id: p.id });
    }
    if arena.tanks.get(p.shooter.0 as usize).is_none() {
        return Err(SimAnomaly::UnknownOwner {
            id: p.id,
            owner: p.shooter,
        });
    }

    p.pos = wrap_position(
        p.pos + heading_vector(p.heading) * p.speed,
        arena.width,
        arena.height,
    );

    if hit_tank(p, arena, tuning, effects) {
        return Ok(false);
    }
    if !hit_obstacles(p, arena, tuning, effects) {
        return Ok(false);
    }

    p.lifetime = p.lifetime.saturating_sub(1);
    Ok(p.lifetime > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::PowerUp;
    use proptest::prelude::*;
    use std::f32::consts::PI;

    /// World with the given walls and a shooter (tank 0, player 1) parked in a corner
    fn world_with(walls: Vec<Rect>) -> (World, Tuning) {
        let tuning = Tuning::default();
        let mut world = World::new(&tuning.world, Obstacles::with_walls(walls));
        world.spawn_tank(PlayerId(1), Vec2::new(20.0, 580.0), 0.0, &tuning.tank);
        (world, tuning)
    }

    fn projectile(kind: ProjectileKind, pos: Vec2, heading: f32, tuning: &Tuning) -> Projectile {
        Projectile {
            id: 99,
            kind,
            pos,
            heading,
            speed: tuning.bullet.speed(kind),
            lifetime: tuning.bullet.lifetime(kind),
            size: tuning.bullet.size(kind),
            owner: PlayerId(1),
            shooter: TankId(0),
            pierce_count: 0,
            inside: Vec::new(),
        }
    }

    /// Advance until the projectile dies or `max` ticks pass
    fn run(p: &mut Projectile, world: &World, tuning: &Tuning, max: u32) -> (bool, Vec<Effect>) {
        let arena = Arena::of(world);
        let mut effects = Vec::new();
        for _ in 0..max {
            if !advance(p, &arena, tuning, &mut effects).unwrap() {
                return (false, effects);
            }
        }
        (true, effects)
    }

    #[test]
    fn test_scatter_fan_headings() {
        let tuning = Tuning::default();
        let headings = shot_headings(ProjectileKind::Scatter, 0.0, &tuning);
        assert_eq!(headings, vec![-0.8, -0.4, 0.0, 0.4, 0.8]);
        assert_eq!(shot_headings(ProjectileKind::Laser, 1.0, &tuning), vec![1.0]);
    }

    #[test]
    fn test_scatter_fire_spawns_five() {
        let (mut world, tuning) = world_with(vec![]);
        world.tanks[0].pos = Vec2::new(400.0, 300.0);
        world.tanks[0].equip(PowerUp::Scatter, 3);
        assert_eq!(fire(&mut world, TankId(0), &tuning), 5);
        let headings: Vec<f32> = world.projectiles.iter().map(|p| p.heading).collect();
        assert_eq!(headings, vec![-0.8, -0.4, 0.0, 0.4, 0.8]);
        assert!(world.projectiles.iter().all(|p| p.kind == ProjectileKind::Scatter));
        assert_eq!(world.tanks[0].special_ammo, 2);
    }

    #[test]
    fn test_last_special_shot_reverts_power_up() {
        let (mut world, tuning) = world_with(vec![]);
        world.tanks[0].equip(PowerUp::Rocket, 1);
        assert_eq!(fire(&mut world, TankId(0), &tuning), 1);
        assert_eq!(world.projectiles[0].kind, ProjectileKind::Rocket);
        assert_eq!(world.tanks[0].special_ammo, 0);
        assert_eq!(world.tanks[0].power_up, None);
    }

    #[test]
    fn test_fire_denied_when_reloading_or_frozen() {
        let (mut world, tuning) = world_with(vec![]);
        assert_eq!(fire(&mut world, TankId(0), &tuning), 1);
        assert_eq!(world.tanks[0].reload, tuning.tank.reload_ticks);
        assert_eq!(fire(&mut world, TankId(0), &tuning), 0);
        world.tanks[0].reload = 0;
        world.tanks[0].freeze(10);
        assert_eq!(fire(&mut world, TankId(0), &tuning), 0);
        assert_eq!(fire(&mut world, TankId(7), &tuning), 0);
        assert_eq!(world.projectiles.len(), 1);
    }

    #[test]
    fn test_fresh_shot_does_not_hit_shooter() {
        let (mut world, tuning) = world_with(vec![]);
        world.tanks[0].pos = Vec2::new(400.0, 300.0);
        world.tanks[0].heading = 1.0;
        fire(&mut world, TankId(0), &tuning);
        let mut p = world.projectiles.pop().unwrap();
        let mut effects = Vec::new();
        assert!(advance(&mut p, &Arena::of(&world), &tuning, &mut effects).unwrap());
        assert!(effects.is_empty());
    }

    #[test]
    fn test_default_bounces_off_wall() {
        let (world, tuning) = world_with(vec![Rect::new(420.0, 0.0, 20.0, 600.0)]);
        let mut p = projectile(ProjectileKind::Default, Vec2::new(400.0, 300.0), 0.0, &tuning);
        let (alive, effects) = run(&mut p, &world, &tuning, 10);
        assert!(alive);
        assert!(effects.is_empty());
        assert!((p.heading.abs() - PI).abs() < 1e-5);
        assert!(p.pos.x < 420.0);
    }

    #[test]
    fn test_laser_bounces_back_off_thin_wall() {
        let wall = Rect::new(420.0, 0.0, 10.0, 600.0);
        let (world, tuning) = world_with(vec![wall]);
        let mut p = projectile(ProjectileKind::Laser, Vec2::new(400.0, 300.0), 0.0, &tuning);
        let (alive, effects) = run(&mut p, &world, &tuning, 12);
        assert!(alive);
        assert!(effects.is_empty());
        assert!((p.heading.abs() - PI).abs() < 1e-5, "heading {}", p.heading);
        assert!(p.pos.x < 420.0, "ended at {}", p.pos.x);
        assert!(!rect_overlap(p.pos, p.size, &wall));
    }

    #[test]
    fn test_explosive_hits_tank_before_wall() {
        let (mut world, tuning) = world_with(vec![Rect::new(400.0, 250.0, 10.0, 100.0)]);
        world.spawn_tank(PlayerId(2), Vec2::new(415.0, 300.0), 0.0, &tuning.tank);
        let mut p = projectile(ProjectileKind::Explosive, Vec2::new(395.0, 300.0), 0.0, &tuning);
        let mut effects = Vec::new();
        let alive = advance(&mut p, &Arena::of(&world), &tuning, &mut effects);
        assert_eq!(alive, Ok(false));
        assert_eq!(
            effects,
            vec![Effect::Blast {
                center: Vec2::new(415.0, 300.0),
                radius: 60.0,
                by: PlayerId(1)
            }]
        );
    }

    #[test]
    fn test_tank_hit_across_seam() {
        let (mut world, tuning) = world_with(vec![]);
        let target = world.spawn_tank(PlayerId(2), Vec2::new(5.0, 300.0), 0.0, &tuning.tank);
        let mut p = projectile(ProjectileKind::Default, Vec2::new(790.0, 300.0), 0.0, &tuning);
        let (alive, effects) = run(&mut p, &world, &tuning, 1);
        assert!(!alive);
        assert_eq!(
            effects,
            vec![Effect::Destroy {
                victim: target,
                by: PlayerId(1)
            }]
        );
    }

    #[test]
    fn test_explosive_detonates_on_wall() {
        let (world, tuning) = world_with(vec![Rect::new(420.0, 0.0, 20.0, 600.0)]);
        let mut p = projectile(ProjectileKind::Explosive, Vec2::new(400.0, 300.0), 0.0, &tuning);
        let (alive, effects) = run(&mut p, &world, &tuning, 10);
        assert!(!alive);
        assert!(matches!(effects.as_slice(), [Effect::Blast { radius, .. }] if *radius == 60.0));
    }

    #[test]
    fn test_rocket_detonates_with_shock() {
        let (world, tuning) = world_with(vec![Rect::new(420.0, 0.0, 20.0, 600.0)]);
        let mut p = projectile(ProjectileKind::Rocket, Vec2::new(400.0, 300.0), 0.0, &tuning);
        let (alive, effects) = run(&mut p, &world, &tuning, 10);
        assert!(!alive);
        assert!(matches!(
            effects.as_slice(),
            [Effect::Blast { radius, .. }, Effect::ImpactShock { .. }] if *radius == 80.0
        ));
    }

    #[test]
    fn test_piercing_passes_three_walls_then_bounces() {
        let walls = (0..4)
            .map(|i| Rect::new(100.0 + i as f32 * 60.0, 0.0, 10.0, 600.0))
            .collect();
        let (world, tuning) = world_with(walls);
        let mut p = projectile(ProjectileKind::Piercing, Vec2::new(50.0, 300.0), 0.0, &tuning);
        let arena = Arena::of(&world);
        let mut effects = Vec::new();
        let mut bounced = false;
        for _ in 0..100 {
            assert!(advance(&mut p, &arena, &tuning, &mut effects).unwrap());
            assert!(p.pierce_count <= 3);
            if p.heading.abs() > PI / 2.0 {
                bounced = true;
                break;
            }
        }
        assert!(bounced, "fourth wall must reflect");
        assert_eq!(p.pierce_count, 3);
        assert!(p.pos.x < 280.0, "stopped in front of the fourth wall");
        let trails = effects
            .iter()
            .filter(|e| matches!(e, Effect::PierceTrail { .. }))
            .count();
        assert_eq!(trails, 3);
    }

    #[test]
    fn test_freeze_hit_reports_freeze() {
        let (mut world, tuning) = world_with(vec![]);
        let target = world.spawn_tank(PlayerId(2), Vec2::new(430.0, 300.0), 0.0, &tuning.tank);
        let mut p = projectile(ProjectileKind::Freeze, Vec2::new(400.0, 300.0), 0.0, &tuning);
        let (alive, effects) = run(&mut p, &world, &tuning, 20);
        assert!(!alive);
        assert_eq!(
            effects,
            vec![Effect::Freeze {
                victim: target,
                ticks: 180
            }]
        );
    }

    #[test]
    fn test_piercing_still_destroys_tanks() {
        let (mut world, tuning) = world_with(vec![]);
        let target = world.spawn_tank(PlayerId(2), Vec2::new(430.0, 300.0), 0.0, &tuning.tank);
        let mut p = projectile(ProjectileKind::Piercing, Vec2::new(400.0, 300.0), 0.0, &tuning);
        let (alive, effects) = run(&mut p, &world, &tuning, 20);
        assert!(!alive);
        assert_eq!(
            effects,
            vec![Effect::Destroy {
                victim: target,
                by: PlayerId(1)
            }]
        );
    }

    #[test]
    fn test_explosive_tank_hit_blasts_at_tank() {
        let (mut world, tuning) = world_with(vec![]);
        let target = world.spawn_tank(PlayerId(2), Vec2::new(430.0, 300.0), 0.0, &tuning.tank);
        let mut p = projectile(ProjectileKind::Explosive, Vec2::new(400.0, 300.0), 0.0, &tuning);
        let (alive, effects) = run(&mut p, &world, &tuning, 20);
        assert!(!alive);
        assert_eq!(
            effects,
            vec![Effect::Blast {
                center: world.tank(target).unwrap().pos,
                radius: 60.0,
                by: PlayerId(1)
            }]
        );
    }

    #[test]
    fn test_only_first_tank_in_order_is_hit() {
        let (mut world, tuning) = world_with(vec![]);
        let first = world.spawn_tank(PlayerId(2), Vec2::new(410.0, 300.0), 0.0, &tuning.tank);
        world.spawn_tank(PlayerId(3), Vec2::new(412.0, 300.0), 0.0, &tuning.tank);
        let mut p = projectile(ProjectileKind::Default, Vec2::new(400.0, 300.0), 0.0, &tuning);
        let (_, effects) = run(&mut p, &world, &tuning, 1);
        assert_eq!(
            effects,
            vec![Effect::Destroy {
                victim: first,
                by: PlayerId(1)
            }]
        );
    }

    #[test]
    fn test_lifetime_expiry_removes() {
        let (world, tuning) = world_with(vec![]);
        let mut p = projectile(ProjectileKind::Default, Vec2::new(400.0, 300.0), 0.0, &tuning);
        p.lifetime = 3;
        let arena = Arena::of(&world);
        let mut effects = Vec::new();
        assert!(advance(&mut p, &arena, &tuning, &mut effects).unwrap());
        assert!(advance(&mut p, &arena, &tuning, &mut effects).unwrap());
        assert!(!advance(&mut p, &arena, &tuning, &mut effects).unwrap());
    }

    #[test]
    fn test_projectile_wraps_around() {
        let (world, tuning) = world_with(vec![]);
        let mut p = projectile(ProjectileKind::Default, Vec2::new(798.0, 50.0), 0.0, &tuning);
        let mut effects = Vec::new();
        advance(&mut p, &Arena::of(&world), &tuning, &mut effects).unwrap();
        assert!((p.pos.x - 3.0).abs() < 1e-3);
    }

    #[test]
    fn test_malformed_projectiles_are_anomalies() {
        let (world, tuning) = world_with(vec![]);
        let arena = Arena::of(&world);
        let mut effects = Vec::new();

        let mut nan = projectile(ProjectileKind::Default, Vec2::new(f32::NAN, 1.0), 0.0, &tuning);
        assert_eq!(
            advance(&mut nan, &arena, &tuning, &mut effects),
            Err(SimAnomaly::NonFiniteProjectile { id: 99 })
        );

        let mut orphan = projectile(ProjectileKind::Default, Vec2::new(50.0, 50.0), 0.0, &tuning);
        orphan.shooter = TankId(42);
        assert!(matches!(
            advance(&mut orphan, &arena, &tuning, &mut effects),
            Err(SimAnomaly::UnknownOwner { .. })
        ));
    }

    proptest! {
        #[test]
        fn pierce_count_never_exceeds_cap(gap in 20.0f32..80.0, walls in 1usize..8) {
            let rects = (0..walls)
                .map(|i| Rect::new(100.0 + i as f32 * gap, 0.0, 10.0, 600.0))
                .collect();
            let (world, tuning) = world_with(rects);
            let mut p = projectile(ProjectileKind::Piercing, Vec2::new(50.0, 300.0), 0.0, &tuning);
            let arena = Arena::of(&world);
            let mut effects = Vec::new();
            for _ in 0..200 {
                if !advance(&mut p, &arena, &tuning, &mut effects).unwrap() {
                    break;
                }
                prop_assert!(p.pierce_count <= tuning.bullet.pierce_cap);
            }
        }
    }
}
