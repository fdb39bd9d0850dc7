//! World state and core simulation types
//!
//! Everything an external renderer or relay needs to mirror lives here and
//! serializes with serde.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::obstacles::{Obstacles, SolidRef};
use crate::heading_vector;
use crate::scoreboard::Scoreboard;
use crate::tuning::{TankTuning, WorldTuning};

/// Index of a tank in [`World::tanks`]; stable for the whole round
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TankId(pub u32);

/// Owning player of a tank
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

/// Power-ups a tank can equip; each maps to one projectile kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUp {
    Scatter,
    Laser,
    Rocket,
    Explosive,
    Piercing,
    Freeze,
}

impl PowerUp {
    pub fn projectile_kind(self) -> ProjectileKind {
        match self {
            PowerUp::Scatter => ProjectileKind::Scatter,
            PowerUp::Laser => ProjectileKind::Laser,
            PowerUp::Rocket => ProjectileKind::Rocket,
            PowerUp::Explosive => ProjectileKind::Explosive,
            PowerUp::Piercing => ProjectileKind::Piercing,
            PowerUp::Freeze => ProjectileKind::Freeze,
        }
    }
}

/// Projectile variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProjectileKind {
    #[default]
    Default,
    Scatter,
    Laser,
    Rocket,
    Explosive,
    Piercing,
    Freeze,
}

/// What an obstacle contact does to a projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObstaclePolicy {
    /// Reflect and survive
    Bounce,
    /// Detonate an area effect and disappear
    Detonate,
    /// Pass through up to the pierce cap, then bounce
    Pierce,
}

/// What a tank contact does to the struck tank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TankHitPolicy {
    Destroy,
    Detonate,
    Freeze,
}

impl ProjectileKind {
    pub fn obstacle_policy(self) -> ObstaclePolicy {
        match self {
            ProjectileKind::Default
            | ProjectileKind::Scatter
            | ProjectileKind::Laser
            | ProjectileKind::Freeze => ObstaclePolicy::Bounce,
            ProjectileKind::Explosive | ProjectileKind::Rocket => ObstaclePolicy::Detonate,
            ProjectileKind::Piercing => ObstaclePolicy::Pierce,
        }
    }

    pub fn tank_hit_policy(self) -> TankHitPolicy {
        match self {
            ProjectileKind::Explosive | ProjectileKind::Rocket => TankHitPolicy::Detonate,
            ProjectileKind::Freeze => TankHitPolicy::Freeze,
            _ => TankHitPolicy::Destroy,
        }
    }
}

/// Tactical controller modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AiMode {
    #[default]
    Hunt,
    Strafe,
    Retreat,
    PowerupSeek,
}

/// Private decision state of an AI tank
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiState {
    pub mode: AiMode,
    /// Side to strafe toward: +1 or -1
    pub strafe_dir: f32,
    pub ticks_since_flip: u32,
    /// Ticks until the next strafe flip is due
    pub flip_after: u32,
    /// Ticks until the controller may consider shooting again
    pub shot_cooldown: u32,
}

impl Default for AiState {
    fn default() -> Self {
        Self {
            mode: AiMode::Hunt,
            strafe_dir: 1.0,
            ticks_since_flip: 0,
            flip_after: 0,
            shot_cooldown: 0,
        }
    }
}

/// A tank
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tank {
    pub id: TankId,
    pub player: PlayerId,
    pub pos: Vec2,
    /// Radians, 0 = +x
    pub heading: f32,
    /// Units per tick along `heading`
    pub speed: f32,
    /// Radians per tick
    pub turn_speed: f32,
    pub alive: bool,
    pub power_up: Option<PowerUp>,
    pub special_ammo: u32,
    /// Ticks until the next shot is allowed
    pub reload: u32,
    pub frozen: bool,
    pub frozen_ticks: u32,
    /// Condition score read by the tactical controller. Hits are one-shot
    /// kills; destruction zeroes it.
    pub health: f32,
    /// Practice target: never counts toward round end
    pub training: bool,
    /// Present iff the tank is AI-controlled
    pub ai: Option<AiState>,
}

impl Tank {
    pub fn new(id: TankId, player: PlayerId, pos: Vec2, heading: f32, tuning: &TankTuning) -> Self {
        Self {
            id,
            player,
            pos,
            heading,
            speed: 0.0,
            turn_speed: 0.0,
            alive: true,
            power_up: None,
            special_ammo: 0,
            reload: 0,
            frozen: false,
            frozen_ticks: 0,
            health: tuning.max_health,
            training: false,
            ai: None,
        }
    }

    #[inline]
    pub fn is_ai(&self) -> bool {
        self.ai.is_some()
    }

    /// Displacement per tick
    #[inline]
    pub fn velocity(&self) -> Vec2 {
        heading_vector(self.heading) * self.speed
    }

    /// Alive, not frozen and reloaded
    pub fn can_fire(&self) -> bool {
        self.alive && !self.frozen && self.reload == 0
    }

    /// Counts toward round-end evaluation
    pub fn is_contestant(&self) -> bool {
        !self.training
    }

    pub fn equip(&mut self, power_up: PowerUp, ammo: u32) {
        self.power_up = Some(power_up);
        self.special_ammo = ammo;
        self.normalize_loadout();
    }

    /// A power-up with no ammo left reverts to the default weapon
    pub fn normalize_loadout(&mut self) {
        if self.power_up.is_some() && self.special_ammo == 0 {
            self.power_up = None;
        }
    }

    /// Immobilize for `ticks` ticks
    pub fn freeze(&mut self, ticks: u32) {
        if ticks == 0 {
            return;
        }
        self.frozen = true;
        self.frozen_ticks = ticks;
        self.speed = 0.0;
        self.turn_speed = 0.0;
    }

    /// Terminal transition alive -> destroyed
    pub fn destroy(&mut self) {
        self.alive = false;
        self.health = 0.0;
        self.speed = 0.0;
        self.turn_speed = 0.0;
    }

    pub fn is_finite(&self) -> bool {
        self.pos.is_finite()
            && self.heading.is_finite()
            && self.speed.is_finite()
            && self.turn_speed.is_finite()
    }
}

/// A projectile in flight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub kind: ProjectileKind,
    pub pos: Vec2,
    pub heading: f32,
    /// Units per tick
    pub speed: f32,
    /// Remaining ticks
    pub lifetime: u32,
    /// Collision half-extent against obstacles, radius against tanks
    pub size: f32,
    pub owner: PlayerId,
    pub shooter: TankId,
    /// Obstacles passed through so far (piercing only)
    pub pierce_count: u8,
    /// Solids the projectile currently overlaps while piercing
    #[serde(default)]
    pub inside: Vec<SolidRef>,
}

impl Projectile {
    pub fn is_finite(&self) -> bool {
        self.pos.is_finite() && self.heading.is_finite() && self.speed.is_finite()
    }
}

/// A power-up lying on the floor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pickup {
    pub id: u32,
    pub kind: PowerUp,
    pub pos: Vec2,
}

/// Complete simulation state for one round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    pub width: f32,
    pub height: f32,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Tanks, indexed by [`TankId`]
    pub tanks: Vec<Tank>,
    /// Projectiles in flight (spawn order)
    pub projectiles: Vec<Projectile>,
    pub pickups: Vec<Pickup>,
    pub obstacles: Obstacles,
    /// Practice session: round end is never raised
    pub training: bool,
    /// Round end has been reported
    pub round_over: bool,
    pub scoreboard: Scoreboard,
    /// Next entity ID
    next_id: u32,
}

impl World {
    /// Panics if the tile grid's cell count disagrees with its dimensions
    pub fn new(tuning: &WorldTuning, obstacles: Obstacles) -> Self {
        assert!(obstacles.tiles.is_well_formed(), "malformed tile grid");
        Self {
            width: tuning.width,
            height: tuning.height,
            time_ticks: 0,
            tanks: Vec::new(),
            projectiles: Vec::new(),
            pickups: Vec::new(),
            obstacles,
            training: false,
            round_over: false,
            scoreboard: Scoreboard::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Add a human-controlled tank
    pub fn spawn_tank(&mut self, player: PlayerId, pos: Vec2, heading: f32, tuning: &TankTuning) -> TankId {
        let id = TankId(self.tanks.len() as u32);
        self.tanks.push(Tank::new(id, player, pos, heading, tuning));
        id
    }

    /// Add an AI-controlled tank
    pub fn spawn_ai_tank(&mut self, player: PlayerId, pos: Vec2, heading: f32, tuning: &TankTuning) -> TankId {
        let id = self.spawn_tank(player, pos, heading, tuning);
        self.tanks[id.0 as usize].ai = Some(AiState::default());
        id
    }

    pub fn spawn_pickup(&mut self, kind: PowerUp, pos: Vec2) -> u32 {
        let id = self.next_entity_id();
        self.pickups.push(Pickup { id, kind, pos });
        id
    }

    pub fn tank(&self, id: TankId) -> Option<&Tank> {
        self.tanks.get(id.0 as usize)
    }

    pub fn tank_mut(&mut self, id: TankId) -> Option<&mut Tank> {
        self.tanks.get_mut(id.0 as usize)
    }

    /// Toroidal wraparound into [0, width) x [0, height)
    pub fn wrap(&self, pos: Vec2) -> Vec2 {
        wrap_position(pos, self.width, self.height)
    }

    /// Alive contestants
    pub fn contestants_alive(&self) -> impl Iterator<Item = &Tank> {
        self.tanks.iter().filter(|t| t.alive && t.is_contestant())
    }

    /// Ensure deterministic iteration order
    pub fn normalize_order(&mut self) {
        self.projectiles.sort_by_key(|p| p.id);
        self.pickups.sort_by_key(|p| p.id);
    }
}

/// Toroidal wraparound into [0, width) x [0, height)
#[inline]
pub fn wrap_position(pos: Vec2, width: f32, height: f32) -> Vec2 {
    let wrap = |v: f32, max: f32| {
        let w = v.rem_euclid(max);
        // rem_euclid can round up to `max` for tiny negatives
        if w >= max { 0.0 } else { w }
    };
    Vec2::new(wrap(pos.x, width), wrap(pos.y, height))
}

/// Copy of `pos` (shifted by whole arena spans) nearest to `from`, so
/// distances measured against it follow the shortest path across the seams
#[inline]
pub fn nearest_image(from: Vec2, pos: Vec2, width: f32, height: f32) -> Vec2 {
    let fold = |d: f32, span: f32| d - span * (d / span).round();
    from + Vec2::new(fold(pos.x - from.x, width), fold(pos.y - from.y, height))
}
