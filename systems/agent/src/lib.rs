#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-tank decision loop combining the threat scanner and the movement
//! controller.
//!
//! Each [`Agent::decide`] call runs the gunnery scan first, then exactly one
//! movement step, so fire commands always precede movement commands in the
//! batch an adapter applies for a tick.

use flagrush_core::{Command, FlagSnapshot, Hit, TankId, TankSnapshot};
use flagrush_system_gunnery::Gunnery;
use flagrush_system_navigation::Navigator;
use flagrush_world::TileMap;
use glam::Vec2;

/// Decision-making unit for one tank.
#[derive(Debug)]
pub struct Agent {
    gunnery: Gunnery,
    navigator: Navigator,
}

impl Agent {
    /// Creates an agent controlling the provided tank.
    #[must_use]
    pub fn new(tank: TankId) -> Self {
        Self {
            gunnery: Gunnery::new(),
            navigator: Navigator::new(tank),
        }
    }

    /// Identifier of the tank this agent controls.
    #[must_use]
    pub fn tank(&self) -> TankId {
        self.navigator.tank()
    }

    /// Produces this tick's command batch for the agent's tank.
    ///
    /// `first_hit` resolves the forward line-of-sight ray against live world
    /// state; the agent itself never touches the world directly.
    pub fn decide<F>(
        &mut self,
        tank: &TankSnapshot,
        flag: Option<&FlagSnapshot>,
        map: &TileMap,
        first_hit: F,
        out: &mut Vec<Command>,
    ) where
        F: FnMut(Vec2, Vec2) -> Option<Hit>,
    {
        self.gunnery
            .handle(tank, map.columns(), map.rows(), first_hit, out);
        self.navigator.advance(tank, flag, map, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flagrush_core::Heading;
    use std::time::Duration;

    #[test]
    fn fire_commands_precede_movement_commands() {
        let map = TileMap::parse("...").expect("layout parses");
        let mut agent = Agent::new(TankId::new(0));
        let tank = TankSnapshot {
            id: TankId::new(0),
            position: Vec2::new(0.5, 0.5),
            orientation: Heading::East.angle(),
            shot_cooldown: Duration::ZERO,
            start_position: Vec2::new(0.5, 0.5),
            start_orientation: 0.0,
            carries_flag: false,
        };
        let flag = FlagSnapshot {
            position: Vec2::new(2.5, 0.5),
            carried_by: None,
        };

        let mut commands = Vec::new();
        agent.decide(
            &tank,
            Some(&flag),
            &map,
            |_, _| Some(Hit::Tank { id: TankId::new(1) }),
            &mut commands,
        );

        assert_eq!(
            commands,
            vec![
                Command::FireProjectile {
                    tank: TankId::new(0)
                },
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
    fn movement_proceeds_when_the_scan_finds_nothing() {
        let map = TileMap::parse("...").expect("layout parses");
        let mut agent = Agent::new(TankId::new(0));
        let tank = TankSnapshot {
            id: TankId::new(0),
            position: Vec2::new(0.5, 0.5),
            orientation: Heading::South.angle(),
            shot_cooldown: Duration::ZERO,
            start_position: Vec2::new(0.5, 0.5),
            start_orientation: 0.0,
            carries_flag: false,
        };
        let flag = FlagSnapshot {
            position: Vec2::new(2.5, 0.5),
            carried_by: None,
        };

        let mut commands = Vec::new();
        agent.decide(&tank, Some(&flag), &map, |_, _| None, &mut commands);

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
}
