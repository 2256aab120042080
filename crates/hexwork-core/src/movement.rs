//! Per-tile entry cost for civilian units, in movement units.

use hexwork_protocol::{TerrainKind, UnitRole};

use crate::map::Tile;
use crate::rules::Rules;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveProfile {
    pub max_moves: u32,
    pub climbs_mountains: bool,
}

impl MoveProfile {
    pub fn for_role(rules: &Rules, role: UnitRole) -> Self {
        let role = rules.role(role);
        Self {
            max_moves: role.moves,
            climbs_mountains: role.climbs_mountains,
        }
    }
}

/// Cost to step onto `tile`, or `None` if the unit cannot enter it.
///
/// Built improvements are checked before terrain so a unit can always re-enter
/// a developed mountain.
pub fn entry_cost(tile: &Tile, profile: MoveProfile, rules: &Rules) -> Option<u32> {
    if tile.is_water() {
        return None;
    }
    if let Some(kind) = tile.improvement_kind() {
        if kind.is_infrastructure() {
            return Some(rules.movement.infrastructure_cost);
        }
        if kind.is_productive() {
            return Some(rules.movement.improved_cost);
        }
    }
    if tile.terrain == TerrainKind::Mountain {
        return profile
            .climbs_mountains
            .then_some(profile.max_moves.max(1));
    }
    rules.terrain_cost(tile.terrain)
}

/// Untouched mountains take a road before anything else can be built on them.
pub fn needs_infrastructure_first(tile: &Tile) -> bool {
    tile.terrain == TerrainKind::Mountain && tile.improvement.is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexwork_protocol::{ImprovementKind, TileImprovement};

    fn with(terrain: TerrainKind, improvement: Option<ImprovementKind>) -> Tile {
        let mut tile = Tile::new(terrain);
        tile.improvement = improvement.map(TileImprovement::new);
        tile
    }

    #[test]
    fn water_is_never_enterable() {
        let rules = Rules::default();
        for role in UnitRole::ALL {
            let profile = MoveProfile::for_role(&rules, role);
            assert_eq!(entry_cost(&with(TerrainKind::Water, None), profile, &rules), None);
        }
    }

    #[test]
    fn mountains_depend_on_climbing() {
        let rules = Rules::default();
        let mountain = with(TerrainKind::Mountain, None);
        let engineer = MoveProfile::for_role(&rules, UnitRole::Engineer);
        let miner = MoveProfile::for_role(&rules, UnitRole::Miner);
        assert_eq!(entry_cost(&mountain, engineer, &rules), Some(engineer.max_moves));
        assert_eq!(entry_cost(&mountain, miner, &rules), None);

        let mined = with(TerrainKind::Mountain, Some(ImprovementKind::Mine));
        assert_eq!(entry_cost(&mined, miner, &rules), Some(rules.movement.improved_cost));
        let road = with(TerrainKind::Mountain, Some(ImprovementKind::Road));
        assert_eq!(
            entry_cost(&road, miner, &rules),
            Some(rules.movement.infrastructure_cost)
        );
    }

    #[test]
    fn infrastructure_undercuts_every_bare_tile() {
        let rules = Rules::default();
        let profile = MoveProfile::for_role(&rules, UnitRole::Engineer);
        let cheapest_bare = TerrainKind::ALL
            .into_iter()
            .filter_map(|terrain| entry_cost(&with(terrain, None), profile, &rules))
            .min()
            .unwrap();
        for kind in ImprovementKind::ALL
            .into_iter()
            .filter(|kind| kind.is_infrastructure())
        {
            for terrain in TerrainKind::ALL.into_iter().filter(|t| !t.is_water()) {
                let cost = entry_cost(&with(terrain, Some(kind)), profile, &rules).unwrap();
                assert!(cost < cheapest_bare, "{kind:?} on {terrain:?}");
            }
        }
    }

    #[test]
    fn productive_tiles_cost_like_plains() {
        let rules = Rules::default();
        let profile = MoveProfile::for_role(&rules, UnitRole::Farmer);
        let farm = with(TerrainKind::Swamp, Some(ImprovementKind::Farm));
        assert_eq!(
            entry_cost(&farm, profile, &rules),
            rules.terrain_cost(TerrainKind::Plains)
        );
    }

    #[test]
    fn only_bare_mountains_need_infrastructure() {
        assert!(needs_infrastructure_first(&with(TerrainKind::Mountain, None)));
        assert!(!needs_infrastructure_first(&with(
            TerrainKind::Mountain,
            Some(ImprovementKind::Road)
        )));
        assert!(!needs_infrastructure_first(&with(TerrainKind::Hills, None)));
    }
}
