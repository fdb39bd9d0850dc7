//! Data-driven game balance
//!
//! Every constant the simulation depends on is injected through [`Tuning`].
//! Missing JSON fields fall back to the stock values, so a tuning file only
//! needs to name what it overrides.

use serde::{Deserialize, Serialize};

use crate::error::TuningError;
use crate::sim::state::ProjectileKind;

/// Arena dimensions (toroidal: leaving one edge re-enters the opposite one)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldTuning {
    pub width: f32,
    pub height: f32,
}

impl Default for WorldTuning {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

/// Tank body, motion and weapon handling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TankTuning {
    /// Side length of the tank's square footprint (used against obstacles)
    pub size: f32,
    /// Radius of the circle projectiles are tested against
    pub hit_radius: f32,
    /// Forward speed at full throttle (units per tick)
    pub max_speed: f32,
    /// Fraction of `max_speed` available in reverse
    pub reverse_factor: f32,
    /// Turn rate at full input (radians per tick)
    pub turn_rate: f32,
    /// Ticks between shots
    pub reload_ticks: u32,
    /// Shots granted by a picked-up power-up
    pub special_ammo: u32,
    /// Health a fresh tank starts with
    pub max_health: f32,
    /// Distance at which a tank collects a pickup
    pub pickup_radius: f32,
}

impl Default for TankTuning {
    fn default() -> Self {
        Self {
            size: 30.0,
            hit_radius: 15.0,
            max_speed: 2.5,
            reverse_factor: 0.6,
            turn_rate: 0.06,
            reload_ticks: 30,
            special_ammo: 5,
            max_health: 100.0,
            pickup_radius: 20.0,
        }
    }
}

/// Per-kind scaling of the base bullet values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KindMultipliers {
    pub speed: f32,
    pub size: f32,
    pub lifetime: f32,
}

impl KindMultipliers {
    const fn new(speed: f32, size: f32, lifetime: f32) -> Self {
        Self {
            speed,
            size,
            lifetime,
        }
    }
}

/// Multiplier table, one row per projectile kind
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KindTable {
    pub default: KindMultipliers,
    pub scatter: KindMultipliers,
    pub laser: KindMultipliers,
    pub rocket: KindMultipliers,
    pub explosive: KindMultipliers,
    pub piercing: KindMultipliers,
    pub freeze: KindMultipliers,
}

impl Default for KindTable {
    fn default() -> Self {
        Self {
            default: KindMultipliers::new(1.0, 1.0, 1.0),
            scatter: KindMultipliers::new(1.0, 1.0, 1.0),
            laser: KindMultipliers::new(1.8, 0.5, 0.7),
            rocket: KindMultipliers::new(1.2, 1.5, 1.5),
            explosive: KindMultipliers::new(0.9, 1.3, 1.2),
            piercing: KindMultipliers::new(1.1, 0.8, 0.8),
            freeze: KindMultipliers::new(1.0, 1.2, 1.3),
        }
    }
}

impl KindTable {
    pub fn get(&self, kind: ProjectileKind) -> KindMultipliers {
        match kind {
            ProjectileKind::Default => self.default,
            ProjectileKind::Scatter => self.scatter,
            ProjectileKind::Laser => self.laser,
            ProjectileKind::Rocket => self.rocket,
            ProjectileKind::Explosive => self.explosive,
            ProjectileKind::Piercing => self.piercing,
            ProjectileKind::Freeze => self.freeze,
        }
    }

    fn rows(&self) -> [(&'static str, KindMultipliers); 7] {
        [
            ("default", self.default),
            ("scatter", self.scatter),
            ("laser", self.laser),
            ("rocket", self.rocket),
            ("explosive", self.explosive),
            ("piercing", self.piercing),
            ("freeze", self.freeze),
        ]
    }
}

/// Projectile base values and special-effect parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BulletTuning {
    /// Base speed (units per tick)
    pub base_speed: f32,
    /// Base collision half-extent / radius
    pub base_size: f32,
    /// Base lifetime in ticks
    pub base_lifetime: u32,
    /// Gap between the tank's hit circle and a freshly spawned projectile
    pub muzzle_clearance: f32,
    /// Obstacle contacts a piercing projectile passes through
    pub pierce_cap: u8,
    /// Sub-projectiles per scatter shot
    pub scatter_count: u32,
    /// Angular step between scatter sub-projectiles (radians)
    pub scatter_spread: f32,
    pub explosive_radius: f32,
    pub rocket_radius: f32,
    /// Ticks a freeze hit immobilizes a tank
    pub freeze_ticks: u32,
    pub kinds: KindTable,
}

impl Default for BulletTuning {
    fn default() -> Self {
        Self {
            base_speed: 5.0,
            base_size: 4.0,
            base_lifetime: 300,
            muzzle_clearance: 2.0,
            pierce_cap: 3,
            scatter_count: 5,
            scatter_spread: 0.4,
            explosive_radius: 60.0,
            rocket_radius: 80.0,
            freeze_ticks: 180,
            kinds: KindTable::default(),
        }
    }
}

impl BulletTuning {
    /// Speed for a projectile of `kind`
    pub fn speed(&self, kind: ProjectileKind) -> f32 {
        self.base_speed * self.kinds.get(kind).speed
    }

    /// Collision size for a projectile of `kind`
    pub fn size(&self, kind: ProjectileKind) -> f32 {
        self.base_size * self.kinds.get(kind).size
    }

    /// Lifetime in ticks for a projectile of `kind` (at least one tick)
    pub fn lifetime(&self, kind: ProjectileKind) -> u32 {
        let ticks = (self.base_lifetime as f32 * self.kinds.get(kind).lifetime).round();
        (ticks as u32).max(1)
    }

    /// Area-effect radius for kinds that detonate
    pub fn blast_radius(&self, kind: ProjectileKind) -> Option<f32> {
        match kind {
            ProjectileKind::Explosive => Some(self.explosive_radius),
            ProjectileKind::Rocket => Some(self.rocket_radius),
            _ => None,
        }
    }
}

/// Thresholds and weights for the tactical controller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiTuning {
    // === Target scoring ===
    pub target_score_numerator: f32,
    pub powerup_holder_weight: f32,
    pub wounded_target_weight: f32,
    /// Enemies below this health count as wounded
    pub wounded_health: f32,
    pub hidden_target_weight: f32,
    /// March step for target visibility
    pub sight_step: f32,

    // === Mode selection ===
    pub pickup_search_radius: f32,
    pub very_low_health: f32,
    pub low_health: f32,
    /// Retreat when near a wall and a target is this close
    pub wall_threat_range: f32,
    /// Retreat at low health when a target is this close
    pub low_health_threat_range: f32,
    pub random_mode_chance: f32,
    pub seek_pickup_range: f32,
    pub seek_min_target_distance: f32,
    pub strafe_min_distance: f32,
    pub strafe_max_distance: f32,
    /// A wall closer than this counts as "near"
    pub near_wall_distance: f32,

    // === Mode behaviors ===
    pub hunt_perturb_chance: f32,
    /// Maximum heading perturbation in hunt mode (radians)
    pub hunt_perturb_angle: f32,
    /// Probe distance for obstacle-ahead checks
    pub deflection_probe: f32,
    pub strafe_flip_min_ticks: u32,
    pub strafe_flip_max_ticks: u32,
    pub strafe_random_pick_chance: f32,
    /// Fraction of the strafe heading error closed each tick
    pub strafe_ease: f32,
    pub strafe_throttle: f32,

    // === Firing gate ===
    pub fire_wall_clearance: f32,
    pub fire_low_health: f32,
    pub fire_low_health_range: f32,
    /// March step for the shot-path wall check
    pub shot_path_step: f32,
    /// Reject a shot whose path hits a wall within this range
    pub shot_path_wall_range: f32,
    pub corner_probe: f32,
    pub corner_min_hits: u32,
    /// Per-axis aim jitter (units)
    pub aim_jitter: f32,
    /// Aim tolerance at full health (radians)
    pub aim_tolerance: f32,
    /// Relative randomization of the aim tolerance
    pub aim_tolerance_variance: f32,
    pub min_fire_distance_healthy: f32,
    pub min_fire_distance_wounded: f32,
    pub shot_cooldown_min: u32,
    pub shot_cooldown_max: u32,
    /// Extra cooldown factor applied at zero health
    pub shot_cooldown_wounded_scale: f32,
}

impl Default for AiTuning {
    fn default() -> Self {
        Self {
            target_score_numerator: 1000.0,
            powerup_holder_weight: 1.5,
            wounded_target_weight: 1.3,
            wounded_health: 50.0,
            hidden_target_weight: 0.3,
            sight_step: 10.0,

            pickup_search_radius: 300.0,
            very_low_health: 25.0,
            low_health: 50.0,
            wall_threat_range: 150.0,
            low_health_threat_range: 100.0,
            random_mode_chance: 0.1,
            seek_pickup_range: 150.0,
            seek_min_target_distance: 200.0,
            strafe_min_distance: 100.0,
            strafe_max_distance: 200.0,
            near_wall_distance: 40.0,

            hunt_perturb_chance: 0.05,
            hunt_perturb_angle: 1.5,
            deflection_probe: 40.0,
            strafe_flip_min_ticks: 40,
            strafe_flip_max_ticks: 120,
            strafe_random_pick_chance: 0.1,
            strafe_ease: 0.15,
            strafe_throttle: 0.8,

            fire_wall_clearance: 80.0,
            fire_low_health: 30.0,
            fire_low_health_range: 120.0,
            shot_path_step: 5.0,
            shot_path_wall_range: 60.0,
            corner_probe: 60.0,
            corner_min_hits: 2,
            aim_jitter: 10.0,
            aim_tolerance: 0.2,
            aim_tolerance_variance: 0.25,
            min_fire_distance_healthy: 60.0,
            min_fire_distance_wounded: 80.0,
            shot_cooldown_min: 30,
            shot_cooldown_max: 60,
            shot_cooldown_wounded_scale: 1.0,
        }
    }
}

/// Complete tuning set consumed by the simulation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub world: WorldTuning,
    pub tank: TankTuning,
    pub bullet: BulletTuning,
    pub ai: AiTuning,
}

fn positive(name: &'static str, value: f32) -> Result<(), TuningError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(TuningError::NotPositive { name, value })
    }
}

fn non_negative(name: &'static str, value: f32) -> Result<(), TuningError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(TuningError::NotPositive { name, value })
    }
}

fn probability(name: &'static str, value: f32) -> Result<(), TuningError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(TuningError::NotProbability { name, value })
    }
}

fn ordered(name: &'static str, min: f32, max: f32) -> Result<(), TuningError> {
    if min <= max {
        Ok(())
    } else {
        Err(TuningError::InvertedRange { name, min, max })
    }
}

fn at_least_one(name: &'static str, value: u32) -> Result<(), TuningError> {
    if value >= 1 {
        Ok(())
    } else {
        Err(TuningError::ZeroCount { name })
    }
}

impl Tuning {
    /// Parse a (possibly partial) JSON tuning document and validate it
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        log::info!(
            "Loaded tuning: arena {}x{}, bullet speed {}",
            tuning.world.width,
            tuning.world.height,
            tuning.bullet.base_speed
        );
        Ok(tuning)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        let w = &self.world;
        positive("world.width", w.width)?;
        positive("world.height", w.height)?;

        let t = &self.tank;
        positive("tank.size", t.size)?;
        positive("tank.hit_radius", t.hit_radius)?;
        positive("tank.max_speed", t.max_speed)?;
        probability("tank.reverse_factor", t.reverse_factor)?;
        positive("tank.turn_rate", t.turn_rate)?;
        positive("tank.max_health", t.max_health)?;
        non_negative("tank.pickup_radius", t.pickup_radius)?;

        let b = &self.bullet;
        positive("bullet.base_speed", b.base_speed)?;
        positive("bullet.base_size", b.base_size)?;
        at_least_one("bullet.base_lifetime", b.base_lifetime)?;
        non_negative("bullet.muzzle_clearance", b.muzzle_clearance)?;
        at_least_one("bullet.scatter_count", b.scatter_count)?;
        non_negative("bullet.scatter_spread", b.scatter_spread)?;
        positive("bullet.explosive_radius", b.explosive_radius)?;
        positive("bullet.rocket_radius", b.rocket_radius)?;
        for (name, row) in b.kinds.rows() {
            positive(name, row.speed)?;
            positive(name, row.size)?;
            positive(name, row.lifetime)?;
        }

        let a = &self.ai;
        positive("ai.target_score_numerator", a.target_score_numerator)?;
        positive("ai.sight_step", a.sight_step)?;
        positive("ai.shot_path_step", a.shot_path_step)?;
        positive("ai.deflection_probe", a.deflection_probe)?;
        positive("ai.corner_probe", a.corner_probe)?;
        probability("ai.random_mode_chance", a.random_mode_chance)?;
        probability("ai.hunt_perturb_chance", a.hunt_perturb_chance)?;
        probability("ai.strafe_random_pick_chance", a.strafe_random_pick_chance)?;
        probability("ai.strafe_ease", a.strafe_ease)?;
        probability("ai.strafe_throttle", a.strafe_throttle)?;
        probability("ai.aim_tolerance_variance", a.aim_tolerance_variance)?;
        non_negative("ai.aim_jitter", a.aim_jitter)?;
        positive("ai.aim_tolerance", a.aim_tolerance)?;
        ordered("ai.very_low_health", a.very_low_health, a.low_health)?;
        ordered(
            "ai.strafe_distance",
            a.strafe_min_distance,
            a.strafe_max_distance,
        )?;
        ordered(
            "ai.strafe_flip_ticks",
            a.strafe_flip_min_ticks as f32,
            a.strafe_flip_max_ticks as f32,
        )?;
        ordered(
            "ai.shot_cooldown",
            a.shot_cooldown_min as f32,
            a.shot_cooldown_max as f32,
        )?;
        ordered(
            "ai.min_fire_distance",
            a.min_fire_distance_healthy,
            a.min_fire_distance_wounded,
        )?;
        non_negative("ai.shot_cooldown_wounded_scale", a.shot_cooldown_wounded_scale)?;
        non_negative("ai.hunt_perturb_angle", a.hunt_perturb_angle)?;
        for (name, value) in [
            ("ai.powerup_holder_weight", a.powerup_holder_weight),
            ("ai.wounded_target_weight", a.wounded_target_weight),
            ("ai.wounded_health", a.wounded_health),
            ("ai.hidden_target_weight", a.hidden_target_weight),
            ("ai.pickup_search_radius", a.pickup_search_radius),
            ("ai.wall_threat_range", a.wall_threat_range),
            ("ai.low_health_threat_range", a.low_health_threat_range),
            ("ai.seek_pickup_range", a.seek_pickup_range),
            ("ai.seek_min_target_distance", a.seek_min_target_distance),
            ("ai.near_wall_distance", a.near_wall_distance),
            ("ai.fire_wall_clearance", a.fire_wall_clearance),
            ("ai.fire_low_health", a.fire_low_health),
            ("ai.fire_low_health_range", a.fire_low_health_range),
            ("ai.shot_path_wall_range", a.shot_path_wall_range),
        ] {
            non_negative(name, value)?;
        }
        Ok(())
    }
}
