//! Tank Arena headless runner
//!
//! Plays one AI-only round on a demo arena and logs the outcome.
//!
//! Usage: `tank-arena [SEED] [TUNING_JSON]`

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use tank_arena::Tuning;
use tank_arena::sim::{
    GameEvent, Gate, GateState, Obstacles, PlayerId, PowerUp, Rect, TickInput, Tile, TileGrid,
    World, tick,
};

/// Give up on rounds that stall
const MAX_TICKS: u64 = 36_000;
const DEFAULT_SEED: u64 = 12345;
const WALL_THICKNESS: f32 = 10.0;
const TILE_SIZE: f32 = 40.0;

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed = match args.next() {
        Some(raw) => match raw.parse::<u64>() {
            Ok(seed) => seed,
            Err(e) => {
                log::error!("Invalid seed {raw:?}: {e}");
                std::process::exit(2);
            }
        },
        None => DEFAULT_SEED,
    };
    let tuning = match args.next() {
        Some(path) => match load_tuning(&path) {
            Ok(tuning) => tuning,
            Err(e) => {
                log::error!("Failed to load tuning from {path}: {e}");
                std::process::exit(1);
            }
        },
        None => Tuning::default(),
    };

    log::info!("Tank Arena starting with seed {seed}");
    let mut world = demo_world(&tuning);
    let mut rng = Pcg32::seed_from_u64(seed);
    let input = TickInput::new();

    let mut winner = None;
    while world.time_ticks < MAX_TICKS && winner.is_none() {
        for event in tick(&mut world, &input, &tuning, &mut rng) {
            match event {
                GameEvent::RoundEnd { winner: w } => winner = Some(w),
                GameEvent::Anomaly(anomaly) => log::warn!("Anomaly: {anomaly}"),
                _ => {}
            }
        }
    }

    match winner {
        Some(Some(player)) => log::info!("Player {} wins after {} ticks", player.0, world.time_ticks),
        Some(None) => log::info!("No survivors after {} ticks", world.time_ticks),
        None => log::info!("Round stalled at {} ticks", world.time_ticks),
    }
    for (player, score) in world.scoreboard.standings() {
        log::info!("  player {}: {} wins, {} kills", player.0, score.wins, score.kills);
    }
}

fn load_tuning(path: &str) -> Result<Tuning, Box<dyn std::error::Error>> {
    let json = std::fs::read_to_string(path)?;
    Ok(Tuning::from_json(&json)?)
}

/// Bordered arena with a few interior walls, a closed gate, a water strip,
/// some wall tiles, four AI tanks and four pickups
fn demo_world(tuning: &Tuning) -> World {
    let (w, h) = (tuning.world.width, tuning.world.height);
    let t = WALL_THICKNESS;

    let mut tiles = TileGrid::new((w / TILE_SIZE) as u32, (h / TILE_SIZE) as u32, TILE_SIZE);
    for col in 2..5 {
        tiles.set(col, 10, Tile::Water);
    }
    tiles.set(15, 3, Tile::Wall);
    tiles.set(4, 4, Tile::Wall);

    let obstacles = Obstacles {
        walls: vec![
            Rect::new(0.0, 0.0, w, t),
            Rect::new(0.0, h - t, w, t),
            Rect::new(0.0, 0.0, t, h),
            Rect::new(w - t, 0.0, t, h),
            Rect::new(w * 0.31, h * 0.25, 20.0, 120.0),
            Rect::new(w * 0.66, h * 0.55, 20.0, 120.0),
            Rect::new(w * 0.44, h * 0.48, 100.0, 20.0),
        ],
        gates: vec![Gate {
            rect: Rect::new(w * 0.49, h * 0.17, 20.0, 60.0),
            state: GateState::Closed,
        }],
        tiles,
    };

    let mut world = World::new(&tuning.world, obstacles);
    let spawns = [
        (Vec2::new(w * 0.125, h * 0.17), 0.5),
        (Vec2::new(w * 0.875, h * 0.17), 2.6),
        (Vec2::new(w * 0.125, h * 0.83), -0.5),
        (Vec2::new(w * 0.875, h * 0.83), -2.6),
    ];
    for (i, (pos, heading)) in spawns.into_iter().enumerate() {
        world.spawn_ai_tank(PlayerId(i as u32 + 1), pos, heading, &tuning.tank);
    }

    world.spawn_pickup(PowerUp::Rocket, Vec2::new(w * 0.5, h * 0.33));
    world.spawn_pickup(PowerUp::Piercing, Vec2::new(w * 0.5, h * 0.67));
    world.spawn_pickup(PowerUp::Scatter, Vec2::new(w * 0.25, h * 0.5));
    world.spawn_pickup(PowerUp::Freeze, Vec2::new(w * 0.75, h * 0.5));
    world
}
