#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Threat scanner that decides whether a tank should fire this tick.

use flagrush_core::{heading_vector, Command, Hit, TankSnapshot, MUZZLE_OFFSET};
use glam::Vec2;

/// Pure system that casts a forward line-of-sight ray and queues a shot when
/// the first obstruction is worth shooting at.
#[derive(Debug, Default)]
pub struct Gunnery;

impl Gunnery {
    /// Creates a new threat scanner.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Evaluates the tank's line of fire and emits at most one
    /// [`Command::FireProjectile`].
    ///
    /// The ray starts at the projectile spawn offset in front of the tank,
    /// so the scan sees exactly what a shot would hit, and extends the full
    /// map diagonal, guaranteeing coverage from any position and heading.
    /// Destructible movable obstacles and other tanks qualify as threats;
    /// the shot is suppressed while the tank's cooldown is running.
    pub fn handle<F>(
        &self,
        tank: &TankSnapshot,
        map_columns: u32,
        map_rows: u32,
        mut first_hit: F,
        out: &mut Vec<Command>,
    ) where
        F: FnMut(Vec2, Vec2) -> Option<Hit>,
    {
        let forward = heading_vector(tank.orientation);
        let origin = tank.position + forward * MUZZLE_OFFSET;
        let reach = ((map_columns * map_columns + map_rows * map_rows) as f32).sqrt();
        let end = tank.position + forward * reach;

        let Some(hit) = first_hit(origin, end) else {
            return;
        };

        let threatening = match hit {
            Hit::Obstacle { kind, .. } => kind.is_movable() && kind.is_destructible(),
            Hit::Tank { .. } => true,
        };

        if threatening && tank.shot_cooldown.is_zero() {
            out.push(Command::FireProjectile { tank: tank.id });
        }
    }
}
