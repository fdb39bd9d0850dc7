//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Injected, seeded RNG only
//! - Stable iteration order (tanks by index, projectiles by ID)
//! - No rendering or platform dependencies

pub mod ai;
pub mod combat;
pub mod geometry;
pub mod movement;
pub mod obstacles;
pub mod projectile;
pub mod state;
pub mod tick;

pub use ai::{AiView, Target, TankSnapshot};
pub use geometry::{Contact, box_blocked, circle_overlap, line_blocked, rect_overlap, wall_deflection_angle};
pub use movement::{InputIntent, TankControl};
pub use obstacles::{Blockers, Gate, GateState, Obstacles, Rect, SolidRef, Tile, TileGrid};
pub use projectile::{Arena, Effect};
pub use state::{
    AiMode, AiState, Pickup, PlayerId, PowerUp, Projectile, ProjectileKind, Tank, TankId, World,
};
pub use tick::{GameEvent, TickInput, tick};
