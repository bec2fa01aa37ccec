#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Flagrush arena.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values. Systems consume
//! event streams and immutable snapshots, and respond exclusively with new
//! command batches; the agent decision loop drives a tank purely through
//! kinematic commands.

use std::f32::consts::{FRAC_PI_2, PI, TAU};
use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the arena boots.
pub const WELCOME_BANNER: &str = "Welcome to Flagrush.";

/// Angular tolerance, in radians, below which a tank counts as facing a
/// heading. Slightly above the per-tick turn increment so a turning tank
/// cannot oscillate around the target angle forever.
pub const HEADING_TOLERANCE: f32 = 0.05;

/// Distance, in tiles, between a tank's center and the point where its
/// projectiles spawn. The threat scanner anchors its ray at the same offset
/// so what the scan sees is what a shot will hit.
pub const MUZZLE_OFFSET: f32 = 0.3;

/// Commands that express all permissible world mutations.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Engages a tank's forward throttle.
    Accelerate {
        /// Identifier of the tank driving forward.
        tank: TankId,
    },
    /// Engages a tank's reverse throttle.
    Decelerate {
        /// Identifier of the tank driving backward.
        tank: TankId,
    },
    /// Releases a tank's throttle entirely.
    StopMoving {
        /// Identifier of the tank coming to a halt.
        tank: TankId,
    },
    /// Starts rotating a tank counter-clockwise.
    TurnLeft {
        /// Identifier of the turning tank.
        tank: TankId,
    },
    /// Starts rotating a tank clockwise.
    TurnRight {
        /// Identifier of the turning tank.
        tank: TankId,
    },
    /// Stops a tank's rotation.
    StopTurning {
        /// Identifier of the tank holding its heading.
        tank: TankId,
    },
    /// Requests that a tank pick up the flag if it is close enough.
    ///
    /// Idempotent: the world ignores the request when the flag is already
    /// attached or out of reach.
    TryGrabFlag {
        /// Identifier of the tank reaching for the flag.
        tank: TankId,
    },
    /// Requests that a tank fire a projectile along its current heading.
    ///
    /// Ignored while the tank's shot cooldown is running.
    FireProjectile {
        /// Identifier of the firing tank.
        tank: TankId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a tank spawned a projectile.
    ProjectileFired {
        /// Identifier of the firing tank.
        tank: TankId,
    },
    /// Announces that a projectile destroyed a wooden box.
    WoodBoxDestroyed {
        /// Tile that held the destroyed box; it is now open ground.
        at: GridCoord,
    },
    /// Confirms that a tank attached the flag to itself.
    FlagGrabbed {
        /// Identifier of the new flag carrier.
        tank: TankId,
    },
    /// Announces that a carrier brought the flag home.
    FlagCaptured {
        /// Identifier of the capturing tank.
        tank: TankId,
    },
    /// Reports that a struck tank was reset to its starting pose.
    TankRespawned {
        /// Identifier of the respawned tank.
        tank: TankId,
    },
}

/// Unique identifier assigned to a tank.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TankId(u32);

impl TankId {
    /// Creates a new tank identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid tile expressed as column and row coordinates.
///
/// Components are signed so that probes beyond the map edge, including
/// negative coordinates, remain representable; the tile map classifies any
/// such coordinate as impassable.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct GridCoord {
    column: i32,
    row: i32,
}

impl GridCoord {
    /// Creates a new grid coordinate.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Returns the tile geometrically containing the provided world position.
    #[must_use]
    pub fn containing(position: Vec2) -> Self {
        Self {
            column: position.x.floor() as i32,
            row: position.y.floor() as i32,
        }
    }

    /// Center of the tile expressed in world units.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.column as f32 + 0.5, self.row as f32 + 0.5)
    }
}

/// Obstacle classification assigned to a single tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    /// Open ground that tanks drive across freely.
    Open,
    /// Destructible wooden box; cleared by a projectile hit.
    WoodBox,
    /// Metal box; blocks movement but survives projectiles.
    MetalBox,
    /// Stone block; permanent and impassable. Also the classification
    /// reported for every coordinate outside the map.
    StoneBox,
}

impl TileKind {
    /// Whether a projectile impact can shove the obstacle.
    #[must_use]
    pub const fn is_movable(&self) -> bool {
        matches!(self, Self::WoodBox | Self::MetalBox)
    }

    /// Whether a projectile impact destroys the obstacle.
    #[must_use]
    pub const fn is_destructible(&self) -> bool {
        matches!(self, Self::WoodBox)
    }
}

/// Cardinal headings a tank faces while traversing the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Heading {
    /// Facing decreasing row indices.
    North,
    /// Facing increasing column indices.
    East,
    /// Facing increasing row indices.
    South,
    /// Facing decreasing column indices.
    West,
}

impl Heading {
    /// Heading implied by a single-tile axis-aligned grid step.
    ///
    /// BFS waypoints are always exactly one tile away on one axis, so the
    /// four-way table suffices; a zero displacement defaults to the
    /// zero-radians heading.
    #[must_use]
    pub fn for_step(from: GridCoord, to: GridCoord) -> Self {
        if to.column() > from.column() {
            Self::East
        } else if to.column() < from.column() {
            Self::West
        } else if to.row() > from.row() {
            Self::South
        } else if to.row() < from.row() {
            Self::North
        } else {
            Self::South
        }
    }

    /// Orientation angle of the heading in radians.
    ///
    /// The arena's angle convention places zero radians toward increasing
    /// rows and grows counter-clockwise: South = 0, West = π/2, North = π,
    /// East = 3π/2.
    #[must_use]
    pub fn angle(&self) -> f32 {
        match self {
            Self::South => 0.0,
            Self::West => FRAC_PI_2,
            Self::North => PI,
            Self::East => 3.0 * FRAC_PI_2,
        }
    }
}

/// Signed difference between two angles on the periodic (0, 2π) domain.
///
/// Both inputs are first wrapped into [0, 2π); the result therefore lies in
/// (-2π, 2π) and is zero exactly when the angles coincide modulo a full turn.
#[must_use]
pub fn periodic_angle_difference(lhs: f32, rhs: f32) -> f32 {
    lhs.rem_euclid(TAU) - rhs.rem_euclid(TAU)
}

/// Unit forward vector for a tank orientation angle.
///
/// Consistent with [`Heading::angle`]: an angle of zero points toward
/// increasing rows, 3π/2 toward increasing columns.
#[must_use]
pub fn heading_vector(angle: f32) -> Vec2 {
    Vec2::new(-(angle - FRAC_PI_2).cos(), -(angle - FRAC_PI_2).sin())
}

/// Immutable representation of a single tank's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TankSnapshot {
    /// Unique identifier assigned to the tank.
    pub id: TankId,
    /// Continuous world position of the tank's center.
    pub position: Vec2,
    /// Orientation angle in radians.
    pub orientation: f32,
    /// Remaining time before the tank may fire again.
    pub shot_cooldown: Duration,
    /// World position the tank spawned at; doubles as its home base.
    pub start_position: Vec2,
    /// Orientation the tank spawned with.
    pub start_orientation: f32,
    /// Whether the flag is currently attached to this tank.
    pub carries_flag: bool,
}

/// Read-only snapshot describing all tanks within the arena.
#[derive(Clone, Debug, Default)]
pub struct TankView {
    snapshots: Vec<TankSnapshot>,
}

impl TankView {
    /// Creates a new tank view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TankSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tank snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TankSnapshot> {
        self.snapshots.iter()
    }

    /// Snapshot of the tank with the provided identifier, if present.
    #[must_use]
    pub fn get(&self, id: TankId) -> Option<&TankSnapshot> {
        self.snapshots.iter().find(|snapshot| snapshot.id == id)
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TankSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of the flag entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlagSnapshot {
    /// Current world position of the flag.
    pub position: Vec2,
    /// Tank the flag is attached to, if any.
    pub carried_by: Option<TankId>,
}

/// First obstruction reported by a line-of-sight query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Hit {
    /// The segment struck a box tile.
    Obstacle {
        /// Tile holding the obstacle.
        at: GridCoord,
        /// Classification of the struck obstacle.
        kind: TileKind,
    },
    /// The segment struck another tank.
    Tank {
        /// Identifier of the struck tank.
        id: TankId,
    },
}
