#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-tank movement controller that walks a planned path one tile at a time.
//!
//! The controller is a cooperative state machine: every [`Navigator::advance`]
//! call performs exactly one suspension step (a turning adjustment, a driving
//! push, or a no-path idle) and resumes from the same point on the next tick.
//! Multi-tick behavior (turning over several ticks, then driving over several
//! ticks) therefore interleaves cleanly with a single decision call per tick.

use std::collections::VecDeque;
use std::f32::consts::{PI, TAU};

use flagrush_core::{
    periodic_angle_difference, Command, FlagSnapshot, GridCoord, Heading, TankId, TankSnapshot,
    HEADING_TOLERANCE,
};
use flagrush_system_pathfinding::Pathfinder;
use flagrush_world::TileMap;
use glam::Vec2;

/// Phase of the movement state machine, carrying all in-flight state so a
/// suspended controller resumes exactly where it left off.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Phase {
    /// Choosing the next waypoint; re-reads live world state every entry.
    Planning,
    /// Rotating in place until the tank faces `heading`.
    Turning { target: GridCoord, heading: Heading },
    /// Driving forward until the target tile center has been passed.
    ///
    /// `last_position` is `None` on the first driving sub-step, the
    /// "infinitely far" sentinel that guarantees driving always begins.
    Driving {
        target: GridCoord,
        last_position: Option<Vec2>,
    },
}

/// Movement controller for a single tank.
#[derive(Debug)]
pub struct Navigator {
    tank: TankId,
    pathfinder: Pathfinder,
    path: VecDeque<GridCoord>,
    phase: Phase,
}

impl Navigator {
    /// Creates a controller for the provided tank, starting in the planning
    /// phase with no path.
    #[must_use]
    pub fn new(tank: TankId) -> Self {
        Self {
            tank,
            pathfinder: Pathfinder::new(),
            path: VecDeque::new(),
            phase: Phase::Planning,
        }
    }

    /// Identifier of the tank this controller drives.
    #[must_use]
    pub fn tank(&self) -> TankId {
        self.tank
    }

    /// Advances the state machine by exactly one suspension step.
    ///
    /// Planning and completed sub-phases roll forward within the same call
    /// until a turning, driving, or idle step emits its commands; the
    /// controller then suspends until the next tick.
    pub fn advance(
        &mut self,
        tank: &TankSnapshot,
        flag: Option<&FlagSnapshot>,
        map: &TileMap,
        out: &mut Vec<Command>,
    ) {
        loop {
            match self.phase {
                Phase::Planning => {
                    let grid_pos = GridCoord::containing(tank.position);
                    let Some(goal) = goal_tile(tank, flag) else {
                        // Flag not resolvable yet; idle and re-resolve next
                        // cycle.
                        return;
                    };

                    self.path = self.pathfinder.find_path(grid_pos, goal, map);
                    let Some(target) = self.path.pop_front() else {
                        // No route currently known. Reach for the flag in
                        // case it is already within grabbing distance; the
                        // world ignores the request otherwise.
                        out.push(Command::TryGrabFlag { tank: self.tank });
                        return;
                    };

                    let heading = Heading::for_step(grid_pos, target);
                    self.phase = Phase::Turning { target, heading };
                }
                Phase::Turning { target, heading } => {
                    let offset = periodic_angle_difference(tank.orientation, heading.angle());
                    if offset.abs() < HEADING_TOLERANCE {
                        self.phase = Phase::Driving {
                            target,
                            last_position: None,
                        };
                        continue;
                    }

                    out.push(Command::StopMoving { tank: self.tank });
                    if offset.rem_euclid(TAU) > PI {
                        out.push(Command::TurnRight { tank: self.tank });
                    } else {
                        out.push(Command::TurnLeft { tank: self.tank });
                    }
                    return;
                }
                Phase::Driving {
                    target,
                    last_position,
                } => {
                    let center = target.center();
                    let passed = match last_position {
                        Some(last) => center.distance(tank.position) >= center.distance(last),
                        None => false,
                    };
                    if passed {
                        self.phase = Phase::Planning;
                        continue;
                    }

                    out.push(Command::StopTurning { tank: self.tank });
                    out.push(Command::Accelerate { tank: self.tank });
                    self.phase = Phase::Driving {
                        target,
                        last_position: Some(tank.position),
                    };
                    return;
                }
            }
        }
    }
}

/// Tile the controller should steer toward: the flag while the tank is not
/// carrying it, the tank's home tile while it is.
fn goal_tile(tank: &TankSnapshot, flag: Option<&FlagSnapshot>) -> Option<GridCoord> {
    if tank.carries_flag {
        Some(GridCoord::containing(tank.start_position))
    } else {
        flag.map(|flag| GridCoord::containing(flag.position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const TURN_STEP: f32 = 0.04;
    const DRIVE_STEP: f32 = 0.04;

    fn snapshot(position: Vec2, orientation: f32) -> TankSnapshot {
        TankSnapshot {
            id: TankId::new(0),
            position,
            orientation,
            shot_cooldown: Duration::ZERO,
            start_position: Vec2::new(0.5, 0.5),
            start_orientation: 0.0,
            carries_flag: false,
        }
    }

    fn flag_at(position: Vec2) -> FlagSnapshot {
        FlagSnapshot {
            position,
            carried_by: None,
        }
    }

    /// Applies one tick of commands to the snapshot the way the world would:
    /// turn commands rotate by a fixed increment, accelerate moves forward.
    fn integrate(tank: &mut TankSnapshot, commands: &[Command]) {
        for command in commands {
            match command {
                Command::TurnLeft { .. } => tank.orientation -= TURN_STEP,
                Command::TurnRight { .. } => tank.orientation += TURN_STEP,
                Command::Accelerate { .. } => {
                    tank.position += flagrush_core::heading_vector(tank.orientation) * DRIVE_STEP;
                }
                _ => {}
            }
        }
    }

    #[test]
    fn misaligned_tank_turns_before_driving() {
        let map = TileMap::parse("...").expect("layout parses");
        let mut navigator = Navigator::new(TankId::new(0));
        let tank = snapshot(Vec2::new(0.5, 0.5), Heading::South.angle());
        let flag = flag_at(Vec2::new(2.5, 0.5));

        let mut commands = Vec::new();
        navigator.advance(&tank, Some(&flag), &map, &mut commands);

        // Facing South, the first waypoint lies East; the shorter turn from
        // zero radians down toward 3π/2 is to the left.
        assert_eq!(
            commands,
            vec![
                Command::StopMoving {
                    tank: TankId::new(0)
                },
                Command::TurnLeft {
                    tank: TankId::new(0)
                },
            ]
        );
    }

    #[test]
    fn aligned_tank_drives_immediately() {
        let map = TileMap::parse("...").expect("layout parses");
        let mut navigator = Navigator::new(TankId::new(0));
        let tank = snapshot(Vec2::new(0.5, 0.5), Heading::East.angle());
        let flag = flag_at(Vec2::new(2.5, 0.5));

        let mut commands = Vec::new();
        navigator.advance(&tank, Some(&flag), &map, &mut commands);

        assert_eq!(
            commands,
            vec![
                Command::StopTurning {
                    tank: TankId::new(0)
                },
                Command::Accelerate {
                    tank: TankId::new(0)
                },
            ]
        );
    }

    #[test]
    fn carrier_turns_toward_home() {
        let map = TileMap::parse("....").expect("layout parses");
        let mut navigator = Navigator::new(TankId::new(0));
        let mut tank = snapshot(Vec2::new(3.5, 0.5), Heading::South.angle());
        tank.carries_flag = true;

        let mut commands = Vec::new();
        navigator.advance(&tank, None, &map, &mut commands);

        // Home lies West; from zero radians the shorter turn toward π/2 is
        // to the right.
        assert_eq!(
            commands,
            vec![
                Command::StopMoving {
                    tank: TankId::new(0)
                },
                Command::TurnRight {
                    tank: TankId::new(0)
                },
            ]
        );
    }

    #[test]
    fn missing_flag_idles_without_commands() {
        let map = TileMap::parse("...").expect("layout parses");
        let mut navigator = Navigator::new(TankId::new(0));
        let tank = snapshot(Vec2::new(0.5, 0.5), 0.0);

        let mut commands = Vec::new();
        navigator.advance(&tank, None, &map, &mut commands);
        assert!(commands.is_empty());
    }

    #[test]
    fn unreachable_goal_requests_a_flag_grab_every_tick() {
        let map = TileMap::parse(".S.").expect("layout parses");
        let mut navigator = Navigator::new(TankId::new(0));
        let tank = snapshot(Vec2::new(0.5, 0.5), 0.0);
        let flag = flag_at(Vec2::new(2.5, 0.5));

        for _ in 0..3 {
            let mut commands = Vec::new();
            navigator.advance(&tank, Some(&flag), &map, &mut commands);
            assert_eq!(
                commands,
                vec![Command::TryGrabFlag {
                    tank: TankId::new(0)
                }]
            );
        }
    }

    #[test]
    fn turning_converges_from_a_half_turn_within_bounded_ticks() {
        let map = TileMap::parse("...").expect("layout parses");
        let mut navigator = Navigator::new(TankId::new(0));
        // Waypoint lies East (3π/2); start a half turn away.
        let mut tank = snapshot(Vec2::new(0.5, 0.5), 3.0 * std::f32::consts::FRAC_PI_2 - PI);
        let flag = flag_at(Vec2::new(2.5, 0.5));
        let target_angle = Heading::East.angle();

        let mut previous_offset = PI;
        let mut ticks = 0;
        loop {
            let mut commands = Vec::new();
            navigator.advance(&tank, Some(&flag), &map, &mut commands);
            if commands.contains(&Command::Accelerate {
                tank: TankId::new(0),
            }) {
                break;
            }

            integrate(&mut tank, &commands);
            let wrapped =
                periodic_angle_difference(tank.orientation, target_angle).rem_euclid(TAU);
            let offset = wrapped.min(TAU - wrapped);
            assert!(
                offset <= previous_offset + 1e-6,
                "angular offset must shrink every tick"
            );
            previous_offset = offset;

            ticks += 1;
            assert!(ticks < 100, "turn must converge in a bounded tick count");
        }

        let final_offset = periodic_angle_difference(tank.orientation, target_angle).abs();
        assert!(final_offset < HEADING_TOLERANCE);
    }

    #[test]
    fn driving_stops_exactly_when_distance_stops_decreasing() {
        let map = TileMap::parse("..").expect("layout parses");
        let mut navigator = Navigator::new(TankId::new(0));
        // Goal is the flag's own tile, so the re-plan after passing the
        // center yields an empty path and a grab request.
        let flag = flag_at(Vec2::new(1.5, 0.5));

        let positions = [
            Vec2::new(0.5, 0.5),  // first driving sub-step, sentinel previous
            Vec2::new(1.0, 0.5),  // distance 0.5, decreasing
            Vec2::new(1.45, 0.5), // distance 0.05, still decreasing
            Vec2::new(1.62, 0.5), // distance 0.12, stopped decreasing
        ];

        let mut all_commands = Vec::new();
        for position in positions {
            let tank = snapshot(position, Heading::East.angle());
            let mut commands = Vec::new();
            navigator.advance(&tank, Some(&flag), &map, &mut commands);
            all_commands.push(commands);
        }

        let drive = vec![
            Command::StopTurning {
                tank: TankId::new(0),
            },
            Command::Accelerate {
                tank: TankId::new(0),
            },
        ];
        assert_eq!(all_commands[0], drive);
        assert_eq!(all_commands[1], drive);
        assert_eq!(all_commands[2], drive, "must not transition early");
        assert_eq!(
            all_commands[3],
            vec![Command::TryGrabFlag {
                tank: TankId::new(0)
            }],
            "must re-plan on the first non-decreasing sub-step"
        );
    }

    #[test]
    fn replanning_happens_once_per_waypoint() {
        // Drive through a two-tile corridor and count planning outcomes by
        // watching for the turn phase that follows each re-plan.
        let map = TileMap::parse("...").expect("layout parses");
        let mut navigator = Navigator::new(TankId::new(0));
        let flag = flag_at(Vec2::new(2.5, 0.5));
        let mut tank = snapshot(Vec2::new(0.5, 0.5), Heading::East.angle());

        let mut grab_requests = 0;
        for _ in 0..200 {
            let mut commands = Vec::new();
            navigator.advance(&tank, Some(&flag), &map, &mut commands);
            if commands.contains(&Command::TryGrabFlag {
                tank: TankId::new(0),
            }) {
                grab_requests += 1;
                break;
            }
            integrate(&mut tank, &commands);
        }

        assert_eq!(grab_requests, 1, "controller must reach the flag tile");
        assert_eq!(GridCoord::containing(tank.position), GridCoord::new(2, 0));
    }
}
