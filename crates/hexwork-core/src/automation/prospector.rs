use hexwork_protocol::{Hex, TerrainKind, UnitId, UnitStatus};

use crate::automation::{excluded_targets, RoleBehavior, RoleCapabilities};
use crate::map::Tile;
use crate::movement::entry_cost;
use crate::targeting::find_best_target;
use crate::unit::Unit;
use crate::world::World;

/// Terrain that can hide a deposit.
pub const PROSPECTABLE: [TerrainKind; 4] = [
    TerrainKind::Hills,
    TerrainKind::Mountain,
    TerrainKind::Swamp,
    TerrainKind::Tundra,
];

/// Inspects the nearest uninspected hills, mountains, swamps and tundra.
pub struct Prospector {
    caps: &'static RoleCapabilities,
}

impl Prospector {
    pub const fn new(caps: &'static RoleCapabilities) -> Self {
        Self { caps }
    }

    fn eligible(unit: &Unit, tile: &Tile) -> bool {
        PROSPECTABLE.contains(&tile.terrain) && unit.filter.matches(tile)
    }
}

impl RoleBehavior for Prospector {
    fn capabilities(&self) -> &RoleCapabilities {
        self.caps
    }

    fn work_here(&self, world: &mut World, id: UnitId, unit: &mut Unit) -> Option<UnitStatus> {
        let here = unit.position;
        let tile = world.grid().get(here)?;
        let assigned_here = unit.target == Some(here);
        if !Self::eligible(unit, tile) || (tile.prospected && !assigned_here) {
            return None;
        }
        let outcome = match world.prospect_at(here) {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(unit = ?id, hex = %here, %err, "prospecting failed");
                return None;
            }
        };
        unit.exhaust();
        if assigned_here {
            unit.target = None;
        }
        Some(UnitStatus::Prospected {
            hex: here,
            outcome,
        })
    }

    fn select_target(&self, world: &World, id: UnitId, unit: &Unit) -> Option<Hex> {
        let exclude = excluded_targets(world, id, unit);
        let profile = unit.profile(world.rules());
        find_best_target(world.grid(), unit.position, &exclude, |hex, tile| {
            if tile.prospected || !Self::eligible(unit, tile) {
                return f32::NEG_INFINITY;
            }
            if entry_cost(tile, profile, world.rules()).is_none() {
                return f32::NEG_INFINITY;
            }
            -(unit.position.distance(hex) as f32)
        })
    }
}
