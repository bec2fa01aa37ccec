#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative arena state management for Flagrush.
//!
//! The world owns the tile map, the tanks, the flag, and the in-flight
//! projectiles. Adapters and systems mutate it exclusively through
//! [`apply`], which executes a [`Command`] and appends the resulting
//! [`Event`] values; everything else reads through the [`query`] module.

use std::time::Duration;

use flagrush_core::{
    heading_vector, Command, Event, GridCoord, TankId, TankSnapshot, TileKind, MUZZLE_OFFSET,
    WELCOME_BANNER,
};
use glam::Vec2;

mod map;

pub use map::{MapParseError, TileMap};

/// Forward drive speed in tiles per second.
const DRIVE_SPEED: f32 = 2.0;
/// Rotation rate in radians per second.
///
/// At the default 20 ms tick this turns 0.04 rad per tick, just under the
/// 0.05 rad heading tolerance, so a turning tank cannot step across the
/// tolerance band without landing inside it.
const TURN_RATE: f32 = 2.0;
/// Time a tank must wait between shots.
const SHOT_COOLDOWN: Duration = Duration::from_secs(1);
/// Projectile flight speed in tiles per second.
const PROJECTILE_SPEED: f32 = 6.0;
/// Distance within which a tank can attach the flag.
const GRAB_RADIUS: f32 = 0.5;
/// Distance from its start pose within which a carrier scores a capture.
const CAPTURE_RADIUS: f32 = 0.4;
/// Collision radius used for projectile and line-of-sight checks on tanks.
const TANK_HIT_RADIUS: f32 = 0.4;
/// Sampling step, in tiles, used when marching a line-of-sight segment.
const RAY_STEP: f32 = 0.05;

/// Built-in arena: stone rim, wood and metal boxes, flag stand at the
/// center, tank bases near opposite corners.
const DEFAULT_LAYOUT: &str = "\
SSSSSSSSSSS
S....W....S
S.M.W.W.M.S
S....W....S
S.W.....W.S
SW.......WS
S.W.....W.S
S....W....S
S.M.W.W.M.S
S....W....S
SSSSSSSSSSS";

const DEFAULT_FLAG_STAND: GridCoord = GridCoord::new(5, 5);

/// Starting pose assigned to a tank when the arena is created.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TankSpawn {
    /// World position of the tank's center.
    pub position: Vec2,
    /// Initial orientation angle in radians.
    pub orientation: f32,
}

/// Represents the authoritative Flagrush arena state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    map: TileMap,
    tanks: Vec<Tank>,
    flag: Option<Flag>,
    projectiles: Vec<Projectile>,
}

/// Parses the built-in arena layout into a fresh tile map.
#[must_use]
pub fn default_map() -> TileMap {
    TileMap::parse(DEFAULT_LAYOUT).expect("built-in layout is well formed")
}

impl World {
    /// Creates the default arena: the built-in layout with two tanks facing
    /// each other across the central flag stand.
    #[must_use]
    pub fn new() -> Self {
        let map = default_map();
        let spawns = vec![
            TankSpawn {
                position: Vec2::new(1.5, 1.5),
                orientation: 0.0,
            },
            TankSpawn {
                position: Vec2::new(9.5, 9.5),
                orientation: std::f32::consts::PI,
            },
        ];
        Self::with_setup(map, &spawns, DEFAULT_FLAG_STAND)
    }

    /// Creates an arena from an explicit map, tank spawns and flag stand.
    #[must_use]
    pub fn with_setup(map: TileMap, spawns: &[TankSpawn], flag_stand: GridCoord) -> Self {
        let tanks = spawns
            .iter()
            .enumerate()
            .map(|(index, spawn)| Tank::at(TankId::new(index as u32), *spawn))
            .collect();

        Self {
            banner: WELCOME_BANNER,
            map,
            tanks,
            flag: Some(Flag::at_stand(flag_stand.center())),
            projectiles: Vec::new(),
        }
    }

    fn tank_mut(&mut self, id: TankId) -> Option<&mut Tank> {
        self.tanks.iter_mut().find(|tank| tank.id == id)
    }

    fn step(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let seconds = dt.as_secs_f32();

        for tank in &mut self.tanks {
            tank.shot_cooldown = tank.shot_cooldown.saturating_sub(dt);

            match tank.steer {
                Steer::Left => tank.orientation -= TURN_RATE * seconds,
                Steer::Right => tank.orientation += TURN_RATE * seconds,
                Steer::Hold => {}
            }

            let sign = match tank.throttle {
                Throttle::Forward => 1.0,
                Throttle::Reverse => -1.0,
                Throttle::Hold => 0.0,
            };
            if sign != 0.0 {
                let candidate = tank.position
                    + heading_vector(tank.orientation) * DRIVE_SPEED * seconds * sign;
                if self.map.classify(GridCoord::containing(candidate)) == TileKind::Open {
                    tank.position = candidate;
                }
            }
        }

        self.advance_projectiles(seconds, out_events);
        self.settle_flag(out_events);
    }

    fn advance_projectiles(&mut self, seconds: f32, out_events: &mut Vec<Event>) {
        for projectile in &mut self.projectiles {
            projectile.position += projectile.velocity * seconds;
        }

        let mut index = 0;
        while index < self.projectiles.len() {
            let position = self.projectiles[index].position;
            let shooter = self.projectiles[index].shooter;

            let struck_tank = self
                .tanks
                .iter()
                .position(|tank| {
                    tank.id != shooter && tank.position.distance(position) <= TANK_HIT_RADIUS
                });
            if let Some(tank_index) = struck_tank {
                self.respawn_tank(tank_index, out_events);
                let _ = self.projectiles.remove(index);
                continue;
            }

            let tile = GridCoord::containing(position);
            match self.map.classify(tile) {
                TileKind::Open => index += 1,
                kind => {
                    if kind.is_destructible() {
                        let _ = self.map.place(tile, TileKind::Open);
                        out_events.push(Event::WoodBoxDestroyed { at: tile });
                    }
                    let _ = self.projectiles.remove(index);
                }
            }
        }
    }

    fn respawn_tank(&mut self, tank_index: usize, out_events: &mut Vec<Event>) {
        let tank = &mut self.tanks[tank_index];
        let death_position = tank.position;

        tank.position = tank.start_position;
        tank.orientation = tank.start_orientation;
        tank.throttle = Throttle::Hold;
        tank.steer = Steer::Hold;

        if tank.carries_flag {
            tank.carries_flag = false;
            let id = tank.id;
            if let Some(flag) = self.flag.as_mut() {
                if flag.carried_by == Some(id) {
                    flag.carried_by = None;
                    flag.position = GridCoord::containing(death_position).center();
                }
            }
        }

        out_events.push(Event::TankRespawned {
            tank: self.tanks[tank_index].id,
        });
    }

    fn settle_flag(&mut self, out_events: &mut Vec<Event>) {
        let Some(flag) = self.flag.as_mut() else {
            return;
        };

        let Some(carrier_id) = flag.carried_by else {
            return;
        };

        let Some(carrier) = self.tanks.iter_mut().find(|tank| tank.id == carrier_id) else {
            // Carrier vanished from the collection; leave the flag where it is.
            flag.carried_by = None;
            return;
        };

        flag.position = carrier.position;

        if carrier.position.distance(carrier.start_position) <= CAPTURE_RADIUS {
            carrier.carries_flag = false;
            carrier.captures += 1;
            flag.carried_by = None;
            flag.position = flag.stand;
            out_events.push(Event::FlagCaptured { tank: carrier_id });
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            out_events.push(Event::TimeAdvanced { dt });
            world.step(dt, out_events);
        }
        Command::Accelerate { tank } => {
            if let Some(tank) = world.tank_mut(tank) {
                tank.throttle = Throttle::Forward;
            }
        }
        Command::Decelerate { tank } => {
            if let Some(tank) = world.tank_mut(tank) {
                tank.throttle = Throttle::Reverse;
            }
        }
        Command::StopMoving { tank } => {
            if let Some(tank) = world.tank_mut(tank) {
                tank.throttle = Throttle::Hold;
            }
        }
        Command::TurnLeft { tank } => {
            if let Some(tank) = world.tank_mut(tank) {
                tank.steer = Steer::Left;
            }
        }
        Command::TurnRight { tank } => {
            if let Some(tank) = world.tank_mut(tank) {
                tank.steer = Steer::Right;
            }
        }
        Command::StopTurning { tank } => {
            if let Some(tank) = world.tank_mut(tank) {
                tank.steer = Steer::Hold;
            }
        }
        Command::TryGrabFlag { tank } => {
            let Some(position) = world
                .tanks
                .iter()
                .find(|candidate| candidate.id == tank)
                .map(|candidate| candidate.position)
            else {
                return;
            };

            let Some(flag) = world.flag.as_mut() else {
                return;
            };

            if flag.carried_by.is_none() && flag.position.distance(position) <= GRAB_RADIUS {
                flag.carried_by = Some(tank);
                if let Some(carrier) = world.tank_mut(tank) {
                    carrier.carries_flag = true;
                }
                out_events.push(Event::FlagGrabbed { tank });
            }
        }
        Command::FireProjectile { tank } => {
            let Some(shooter) = world.tanks.iter().find(|candidate| candidate.id == tank) else {
                return;
            };

            if !shooter.shot_cooldown.is_zero() {
                return;
            }

            let forward = heading_vector(shooter.orientation);
            world.projectiles.push(Projectile {
                shooter: tank,
                position: shooter.position + forward * MUZZLE_OFFSET,
                velocity: forward * PROJECTILE_SPEED,
            });

            if let Some(shooter) = world.tank_mut(tank) {
                shooter.shot_cooldown = SHOT_COOLDOWN;
            }
            out_events.push(Event::ProjectileFired { tank });
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use flagrush_core::{FlagSnapshot, GridCoord, Hit, TankId, TankSnapshot, TankView, TileKind};
    use glam::Vec2;

    use super::{TileMap, World, RAY_STEP, TANK_HIT_RADIUS};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Provides read-only access to the arena's tile map.
    #[must_use]
    pub fn tile_map(world: &World) -> &TileMap {
        &world.map
    }

    /// Captures a read-only view of the tanks in the arena.
    #[must_use]
    pub fn tank_view(world: &World) -> TankView {
        TankView::from_snapshots(world.tanks.iter().map(super::Tank::snapshot).collect())
    }

    /// Snapshot of a single tank, if it exists.
    #[must_use]
    pub fn tank_snapshot(world: &World, id: TankId) -> Option<TankSnapshot> {
        world
            .tanks
            .iter()
            .find(|tank| tank.id == id)
            .map(super::Tank::snapshot)
    }

    /// Snapshot of the flag entity, if one is present in the arena.
    #[must_use]
    pub fn flag(world: &World) -> Option<FlagSnapshot> {
        world.flag.as_ref().map(|flag| FlagSnapshot {
            position: flag.position,
            carried_by: flag.carried_by,
        })
    }

    /// Number of flag captures credited to the provided tank.
    #[must_use]
    pub fn captures(world: &World, id: TankId) -> u32 {
        world
            .tanks
            .iter()
            .find(|tank| tank.id == id)
            .map_or(0, |tank| tank.captures)
    }

    /// First obstruction intersected by the segment from `origin` to `end`.
    ///
    /// Marches the segment in fixed sub-tile steps, reporting the first
    /// non-open tile or the first tank other than `shooter` whose hull the
    /// segment enters. Returns `None` when the segment crosses nothing,
    /// which on a rimmed map only happens for degenerate segments.
    #[must_use]
    pub fn first_hit(world: &World, shooter: TankId, origin: Vec2, end: Vec2) -> Option<Hit> {
        let delta = end - origin;
        let length = delta.length();
        if length <= f32::EPSILON {
            return None;
        }

        let direction = delta / length;
        let steps = (length / RAY_STEP).ceil() as u32;

        for step in 0..=steps {
            let travelled = (step as f32 * RAY_STEP).min(length);
            let point = origin + direction * travelled;

            let struck_tank = world.tanks.iter().find(|tank| {
                tank.id != shooter && tank.position.distance(point) <= TANK_HIT_RADIUS
            });
            if let Some(tank) = struck_tank {
                return Some(Hit::Tank { id: tank.id });
            }

            let tile = GridCoord::containing(point);
            let kind = world.map.classify(tile);
            if kind != TileKind::Open {
                return Some(Hit::Obstacle { at: tile, kind });
            }
        }

        None
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Throttle {
    Forward,
    Reverse,
    Hold,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Steer {
    Left,
    Right,
    Hold,
}

#[derive(Clone, Debug)]
struct Tank {
    id: TankId,
    position: Vec2,
    orientation: f32,
    throttle: Throttle,
    steer: Steer,
    shot_cooldown: Duration,
    start_position: Vec2,
    start_orientation: f32,
    carries_flag: bool,
    captures: u32,
}

impl Tank {
    fn at(id: TankId, spawn: TankSpawn) -> Self {
        Self {
            id,
            position: spawn.position,
            orientation: spawn.orientation,
            throttle: Throttle::Hold,
            steer: Steer::Hold,
            shot_cooldown: Duration::ZERO,
            start_position: spawn.position,
            start_orientation: spawn.orientation,
            carries_flag: false,
            captures: 0,
        }
    }

    fn snapshot(&self) -> TankSnapshot {
        TankSnapshot {
            id: self.id,
            position: self.position,
            orientation: self.orientation,
            shot_cooldown: self.shot_cooldown,
            start_position: self.start_position,
            start_orientation: self.start_orientation,
            carries_flag: self.carries_flag,
        }
    }
}

#[derive(Clone, Debug)]
struct Flag {
    stand: Vec2,
    position: Vec2,
    carried_by: Option<TankId>,
}

impl Flag {
    fn at_stand(stand: Vec2) -> Self {
        Self {
            stand,
            position: stand,
            carried_by: None,
        }
    }
}

#[derive(Clone, Debug)]
struct Projectile {
    shooter: TankId,
    position: Vec2,
    velocity: Vec2,
}
