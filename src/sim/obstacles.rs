//! Static obstacle geometry supplied by the world generator
//!
//! Everything here is an axis-aligned rectangle:
//! - walls: solid for tanks, projectiles and sight
//! - gates: solid for tanks only while closing/closed
//! - tiles: coarse grid cells tagged wall (solid) or water (stops tanks only)

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    /// Rectangle from a corner and its size. Panics on negative size.
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        assert!(w >= 0.0 && h >= 0.0, "rect size must be non-negative");
        Self {
            min: Vec2::new(x, y),
            max: Vec2::new(x + w, y + h),
        }
    }

    /// Square of half-extent `half` centered on `center`
    pub fn around(center: Vec2, half: f32) -> Self {
        Self {
            min: center - Vec2::splat(half),
            max: center + Vec2::splat(half),
        }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Point inside the rectangle (edges inclusive)
    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Strict overlap with another rectangle (touching edges don't count)
    #[inline]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    /// Euclidean distance from `p` to the nearest point of the rectangle (0 inside)
    pub fn distance_to(&self, p: Vec2) -> f32 {
        let closest = p.clamp(self.min, self.max);
        (p - closest).length()
    }
}

/// Gate state machine, driven by the world generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GateState {
    #[default]
    Open,
    Closing,
    Closed,
}

/// A gated opening in a wall
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gate {
    pub rect: Rect,
    pub state: GateState,
}

impl Gate {
    /// Gates stop tanks as soon as they start closing
    pub fn blocks_movement(&self) -> bool {
        !matches!(self.state, GateState::Open)
    }
}

/// Tile tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Tile {
    #[default]
    Empty,
    Wall,
    Water,
}

/// Coarse tile grid anchored at the world origin
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TileGrid {
    pub cols: u32,
    pub rows: u32,
    pub tile_size: f32,
    /// Row-major, `cols * rows` entries
    pub cells: Vec<Tile>,
}

impl TileGrid {
    pub fn new(cols: u32, rows: u32, tile_size: f32) -> Self {
        assert!(tile_size > 0.0, "tile size must be positive");
        Self {
            cols,
            rows,
            tile_size,
            cells: vec![Tile::Empty; (cols * rows) as usize],
        }
    }

    pub fn set(&mut self, col: u32, row: u32, tile: Tile) {
        assert!(col < self.cols && row < self.rows, "tile out of range");
        self.cells[(row * self.cols + col) as usize] = tile;
    }

    /// Cell count matches `cols * rows` and a non-empty grid has a real tile size
    pub fn is_well_formed(&self) -> bool {
        let expected = self.cols.checked_mul(self.rows).map(|n| n as usize);
        expected == Some(self.cells.len()) && (self.cells.is_empty() || self.tile_size > 0.0)
    }

    /// Rectangle covered by cell `index`
    pub fn cell_rect(&self, index: u32) -> Rect {
        let col = index % self.cols;
        let row = index / self.cols;
        Rect::new(
            col as f32 * self.tile_size,
            row as f32 * self.tile_size,
            self.tile_size,
            self.tile_size,
        )
    }
}

/// Which obstacles a query treats as solid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blockers {
    /// Walls, blocking gates, wall and water tiles
    Movement,
    /// Walls and wall tiles
    Projectile,
    /// Walls and wall tiles
    Sight,
}

/// Stable identity of one solid rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolidRef {
    Wall(u32),
    Gate(u32),
    Tile(u32),
}

/// The full static obstacle set for a round
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Obstacles {
    pub walls: Vec<Rect>,
    pub gates: Vec<Gate>,
    pub tiles: TileGrid,
}

impl Obstacles {
    pub fn with_walls(walls: Vec<Rect>) -> Self {
        Self {
            walls,
            ..Default::default()
        }
    }

    /// Every rectangle solid for `blockers`, in a fixed order
    /// (walls by index, then gates, then tiles row-major)
    pub fn solids(&self, blockers: Blockers) -> impl Iterator<Item = (SolidRef, Rect)> + '_ {
        let walls = self
            .walls
            .iter()
            .enumerate()
            .map(|(i, r)| (SolidRef::Wall(i as u32), *r));

        let gates = self
            .gates
            .iter()
            .enumerate()
            .filter(move |(_, g)| blockers == Blockers::Movement && g.blocks_movement())
            .map(|(i, g)| (SolidRef::Gate(i as u32), g.rect));

        let tiles = self
            .tiles
            .cells
            .iter()
            .enumerate()
            .filter(move |(_, t)| match t {
                Tile::Empty => false,
                Tile::Wall => true,
                Tile::Water => blockers == Blockers::Movement,
            })
            .map(move |(i, _)| (SolidRef::Tile(i as u32), self.tiles.cell_rect(i as u32)));

        walls.chain(gates).chain(tiles)
    }

    /// Point lies inside any solid
    pub fn point_blocked(&self, p: Vec2, blockers: Blockers) -> bool {
        self.solids(blockers).any(|(_, r)| r.contains(p))
    }

    /// Distance from `p` to the closest solid (infinite with no solids)
    pub fn nearest_distance(&self, p: Vec2, blockers: Blockers) -> f32 {
        self.solids(blockers)
            .map(|(_, r)| r.distance_to(p))
            .fold(f32::INFINITY, f32::min)
    }
}
