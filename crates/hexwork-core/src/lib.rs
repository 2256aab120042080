mod advisor;
pub mod automation;
mod economy;
mod map;
pub mod mapgen;
mod movement;
mod network;
mod pathfinding;
mod rules;
pub mod selfplay;
mod targeting;
mod unit;
mod world;

pub use crate::advisor::*;
pub use crate::automation::{
    behavior_for, capabilities, drive_turn, RoleBehavior, RoleCapabilities, TurnReport,
};
pub use crate::economy::*;
pub use crate::map::*;
pub use crate::mapgen::{generate_map, GeneratedMap, MapGenConfig};
pub use crate::movement::*;
pub use crate::network::*;
pub use crate::pathfinding::*;
pub use crate::rules::*;
pub use crate::selfplay::{run_selfplay, SelfPlayConfig, SelfPlayResult};
pub use crate::targeting::*;
pub use crate::unit::*;
pub use crate::world::*;
