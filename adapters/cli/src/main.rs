#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs headless Flagrush matches.
//!
//! The adapter owns the tick loop: it advances the world, lets every agent
//! produce one command batch per tick, applies the batches, and tallies the
//! resulting events into an end-of-match summary.

mod layout_transfer;

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use flagrush_core::{Command, Event, GridCoord, TankId, TileKind};
use flagrush_system_agent::Agent;
use flagrush_world::{apply, default_map, query, TankSpawn, TileMap, World};
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use layout_transfer::{MapLayoutSnapshot, SNAPSHOT_HEADER};

/// Fixed simulation step applied once per loop iteration.
const TICK: Duration = Duration::from_millis(20);

/// Headless capture-the-flag tank matches on tile arenas.
#[derive(Debug, Parser)]
#[command(name = "flagrush", version, about)]
struct Args {
    /// Number of 20 ms simulation ticks to run.
    #[arg(long, default_value_t = 3000)]
    ticks: u32,
    /// Path to a glyph layout file: '.' open, 'W' wood, 'M' metal, 'S' stone.
    #[arg(long, conflicts_with = "import_layout")]
    map: Option<PathBuf>,
    /// Single-line layout string previously produced by --export-layout.
    #[arg(long)]
    import_layout: Option<String>,
    /// Print the arena as a single-line layout string and exit.
    #[arg(long)]
    export_layout: bool,
    /// Number of extra wooden boxes scattered onto open tiles.
    #[arg(long, default_value_t = 0)]
    scatter: u32,
    /// Seed for the wooden-box scatter generator.
    #[arg(long, default_value_t = 0x5eed)]
    seed: u64,
}

/// Entry point for the Flagrush command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();

    let mut map = load_map(&args)?;
    let setup = ArenaSetup::derive(&map)?;

    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    scatter_wood(&mut map, &setup, args.scatter, &mut rng);

    if args.export_layout {
        println!("{}", MapLayoutSnapshot::from_map(&map).encode());
        return Ok(());
    }

    run_match(map, &setup, args.ticks);
    Ok(())
}

fn load_map(args: &Args) -> Result<TileMap> {
    if let Some(encoded) = &args.import_layout {
        let snapshot = MapLayoutSnapshot::decode(encoded)
            .with_context(|| format!("layout strings start with '{SNAPSHOT_HEADER}:'"))?;
        return Ok(snapshot.into_map()?);
    }

    if let Some(path) = &args.map {
        let layout = fs::read_to_string(path)
            .with_context(|| format!("could not read map file {}", path.display()))?;
        return TileMap::parse(&layout)
            .with_context(|| format!("could not parse map file {}", path.display()));
    }

    Ok(default_map())
}

/// Tank bases and flag stand derived from a layout's open tiles.
struct ArenaSetup {
    spawns: Vec<TankSpawn>,
    flag_stand: GridCoord,
}

impl ArenaSetup {
    /// Places one base on the first open tile, one on the last, and the flag
    /// stand on the middle open tile, scanning in row-major order.
    fn derive(map: &TileMap) -> Result<Self> {
        let open = open_tiles(map);
        if open.len() < 3 {
            bail!(
                "arena needs at least three open tiles for two bases and a flag stand, found {}",
                open.len()
            );
        }

        let first = open[0];
        let last = open[open.len() - 1];
        let spawns = vec![
            TankSpawn {
                position: first.center(),
                orientation: 0.0,
            },
            TankSpawn {
                position: last.center(),
                orientation: std::f32::consts::PI,
            },
        ];

        Ok(Self {
            spawns,
            flag_stand: open[open.len() / 2],
        })
    }

    fn reserved_tiles(&self) -> Vec<GridCoord> {
        let mut tiles: Vec<GridCoord> = self
            .spawns
            .iter()
            .map(|spawn| GridCoord::containing(spawn.position))
            .collect();
        tiles.push(self.flag_stand);
        tiles
    }
}

fn open_tiles(map: &TileMap) -> Vec<GridCoord> {
    let mut tiles = Vec::new();
    for row in 0..map.rows() as i32 {
        for column in 0..map.columns() as i32 {
            let coord = GridCoord::new(column, row);
            if map.classify(coord) == TileKind::Open {
                tiles.push(coord);
            }
        }
    }
    tiles
}

/// Turns up to `count` random open tiles into wooden boxes, leaving the tank
/// bases and the flag stand untouched.
fn scatter_wood(map: &mut TileMap, setup: &ArenaSetup, count: u32, rng: &mut ChaCha8Rng) {
    let reserved = setup.reserved_tiles();
    let mut candidates: Vec<GridCoord> = open_tiles(map)
        .into_iter()
        .filter(|tile| !reserved.contains(tile))
        .collect();

    for _ in 0..count {
        if candidates.is_empty() {
            break;
        }
        let index = rng.gen_range(0..candidates.len());
        let tile = candidates.swap_remove(index);
        let _ = map.place(tile, TileKind::WoodBox);
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct TankTally {
    shots: u32,
    losses: u32,
}

fn run_match(map: TileMap, setup: &ArenaSetup, ticks: u32) {
    let columns = map.columns();
    let rows = map.rows();

    let mut world = World::with_setup(map, &setup.spawns, setup.flag_stand);
    let mut agents: Vec<Agent> = (0..setup.spawns.len())
        .map(|index| Agent::new(TankId::new(index as u32)))
        .collect();

    println!("{}", query::welcome_banner(&world));
    println!(
        "running {ticks} ticks on a {columns}x{rows} arena with {} tanks",
        agents.len()
    );

    let mut tallies = vec![TankTally::default(); agents.len()];
    let mut boxes_destroyed = 0u32;
    let mut events = Vec::new();

    for _ in 0..ticks {
        events.clear();
        apply(&mut world, Command::Tick { dt: TICK }, &mut events);

        for agent in &mut agents {
            let id = agent.tank();
            let Some(snapshot) = query::tank_snapshot(&world, id) else {
                continue;
            };
            let flag = query::flag(&world);

            let mut commands = Vec::new();
            {
                let view: &World = &world;
                agent.decide(
                    &snapshot,
                    flag.as_ref(),
                    query::tile_map(view),
                    |origin: Vec2, end: Vec2| query::first_hit(view, id, origin, end),
                    &mut commands,
                );
            }
            for command in commands {
                apply(&mut world, command, &mut events);
            }
        }

        for event in &events {
            match event {
                Event::ProjectileFired { tank } => {
                    if let Some(tally) = tallies.get_mut(tank.get() as usize) {
                        tally.shots += 1;
                    }
                }
                Event::TankRespawned { tank } => {
                    if let Some(tally) = tallies.get_mut(tank.get() as usize) {
                        tally.losses += 1;
                    }
                }
                Event::WoodBoxDestroyed { .. } => boxes_destroyed += 1,
                _ => {}
            }
        }
    }

    for (index, tally) in tallies.iter().enumerate() {
        let id = TankId::new(index as u32);
        let pose = query::tank_snapshot(&world, id)
            .map_or_else(|| "gone".to_owned(), |snapshot| {
                format!("({:.1}, {:.1})", snapshot.position.x, snapshot.position.y)
            });
        println!(
            "tank {}: {} captures, {} shots, {} losses, final position {pose}",
            id.get(),
            query::captures(&world, id),
            tally.shots,
            tally.losses
        );
    }
    println!("wood boxes destroyed: {boxes_destroyed}");
}
