use hexwork_protocol::{Hex, ImprovementKind, UnitId, UnitStatus};

use crate::automation::{excluded_targets, site_score, RoleBehavior, RoleCapabilities};
use crate::map::Tile;
use crate::movement::entry_cost;
use crate::targeting::find_best_target;
use crate::unit::Unit;
use crate::world::World;

/// Farmer, miner, forester, rancher and driller: develop the resources their
/// improvements fit, closest and best-connected first.
pub struct Improver {
    caps: &'static RoleCapabilities,
}

impl Improver {
    pub const fn new(caps: &'static RoleCapabilities) -> Self {
        Self { caps }
    }

    /// The improvement this role would put on `tile`, honoring the unit's filter.
    fn improvement_for(&self, world: &World, unit: &Unit, tile: &Tile) -> Option<ImprovementKind> {
        let resource = tile.known_resource()?;
        let kind = world.rules().improvement_for(resource)?;
        if !self.caps.improvements.contains(&kind) || !unit.filter.matches(tile) {
            return None;
        }
        Some(kind)
    }

    fn workable(&self, world: &World, unit: &Unit, hex: Hex) -> Option<ImprovementKind> {
        let tile = world.grid().get(hex)?;
        let kind = self.improvement_for(world, unit, tile)?;
        world.site_check(hex, kind).ok()?;
        Some(kind)
    }
}

impl RoleBehavior for Improver {
    fn capabilities(&self) -> &RoleCapabilities {
        self.caps
    }

    fn work_here(&self, world: &mut World, id: UnitId, unit: &mut Unit) -> Option<UnitStatus> {
        let here = unit.position;
        let kind = self.workable(world, unit, here)?;
        match world.build_at(here, kind) {
            Ok(status) => {
                unit.exhaust();
                if unit.target == Some(here) {
                    unit.target = None;
                }
                Some(status)
            }
            Err(reason) => {
                tracing::debug!(unit = ?id, hex = %here, %reason, "cannot build");
                Some(UnitStatus::BuildFailed {
                    hex: here,
                    improvement: kind,
                    reason,
                })
            }
        }
    }

    fn select_target(&self, world: &World, id: UnitId, unit: &Unit) -> Option<Hex> {
        let exclude = excluded_targets(world, id, unit);
        let network = world.network_view();
        let profile = unit.profile(world.rules());
        find_best_target(world.grid(), unit.position, &exclude, |hex, tile| {
            if entry_cost(tile, profile, world.rules()).is_none() {
                return f32::NEG_INFINITY;
            }
            let Some(kind) = self.improvement_for(world, unit, tile) else {
                return f32::NEG_INFINITY;
            };
            if world.site_check(hex, kind).is_err() {
                return f32::NEG_INFINITY;
            }
            site_score(world, &network, unit.position, hex, tile.known_resource())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::Improver;
    use crate::automation::{capabilities, RoleBehavior};
    use crate::economy::Treasury;
    use crate::map::WorldGrid;
    use crate::rules::Rules;
    use crate::unit::TargetFilter;
    use crate::world::World;
    use hexwork_protocol::{
        BuildError, Hex, ImprovementKind, PlayerId, ResourceKind, TerrainKind, TileImprovement,
        TilePatch, UnitRole, UnitStatus,
    };

    const ME: PlayerId = PlayerId(1);

    fn world() -> World {
        let mut grid = WorldGrid::new(8, 4, TerrainKind::Plains);
        for index in 0..grid.len() {
            let hex = grid.hex_at_index(index).unwrap();
            grid.set(hex, TilePatch::default().owner(Some(ME))).unwrap();
        }
        grid.set(
            Hex::new(0, 0),
            TilePatch::default().improvement(Some(TileImprovement::new(ImprovementKind::Capital))),
        )
        .unwrap();
        World::new(grid, Rules::default(), ME).with_treasury(Treasury::new(10_000))
    }

    fn resource(world: &mut World, hex: Hex, resource: ResourceKind) {
        world
            .grid_mut()
            .set(hex, TilePatch::default().resource(Some(resource)))
            .unwrap();
    }

    #[test]
    fn walks_to_the_resource_and_builds() {
        let mut world = world();
        resource(&mut world, Hex::new(2, 0), ResourceKind::Grain);
        let farmer = world.recruit(UnitRole::Farmer, Hex::new(0, 0)).unwrap();
        world.set_automation(farmer, true).unwrap();

        let report = world.take_automated_turn(farmer).unwrap();
        assert_eq!(
            report.statuses,
            vec![UnitStatus::Built {
                hex: Hex::new(2, 0),
                improvement: ImprovementKind::Farm
            }]
        );
        assert_eq!(report.moved_to, Hex::new(2, 0));
        assert_eq!(world.unit(farmer).unwrap().moves_left, 0);
        assert_eq!(world.unit(farmer).unwrap().target, None);
    }

    #[test]
    fn ignores_resources_of_other_roles() {
        let mut world = world();
        resource(&mut world, Hex::new(2, 0), ResourceKind::Timber);
        let farmer = world.recruit(UnitRole::Farmer, Hex::new(0, 0)).unwrap();
        world.set_automation(farmer, true).unwrap();
        let report = world.take_automated_turn(farmer).unwrap();
        assert_eq!(report.statuses, vec![UnitStatus::NoTargets]);
    }

    #[test]
    fn connected_sites_win_over_closer_ones() {
        let mut world = world();
        resource(&mut world, Hex::new(3, 2), ResourceKind::Iron);
        resource(&mut world, Hex::new(4, 0), ResourceKind::Iron);
        for q in 1..4 {
            world
                .grid_mut()
                .set(
                    Hex::new(q, 0),
                    TilePatch::default()
                        .improvement(Some(TileImprovement::new(ImprovementKind::Road))),
                )
                .unwrap();
        }
        world.refresh_network();
        let miner = world.recruit(UnitRole::Miner, Hex::new(2, 2)).unwrap();
        let unit = world.unit(miner).unwrap().clone();
        let behavior = Improver::new(capabilities(UnitRole::Miner));
        assert_eq!(
            behavior.select_target(&world, miner, &unit),
            Some(Hex::new(4, 0))
        );
    }

    #[test]
    fn filter_narrows_the_search() {
        let mut world = world();
        resource(&mut world, Hex::new(1, 1), ResourceKind::Grain);
        resource(&mut world, Hex::new(5, 1), ResourceKind::Sugar);
        let farmer = world.recruit(UnitRole::Farmer, Hex::new(0, 1)).unwrap();
        world
            .set_filter(farmer, TargetFilter::Resource(ResourceKind::Sugar))
            .unwrap();
        world.set_automation(farmer, true).unwrap();
        world.take_automated_turn(farmer).unwrap();
        assert_eq!(world.unit(farmer).unwrap().target, Some(Hex::new(5, 1)));
    }

    #[test]
    fn build_failures_keep_the_target() {
        let mut world = world();
        *world.treasury_mut() = Treasury::new(0);
        resource(&mut world, Hex::new(1, 0), ResourceKind::Coal);
        let miner = world.recruit(UnitRole::Miner, Hex::new(0, 0)).unwrap();
        world.set_automation(miner, true).unwrap();

        let report = world.take_automated_turn(miner).unwrap();
        assert!(matches!(
            report.last_status(),
            Some(UnitStatus::BuildFailed {
                reason: BuildError::InsufficientFunds { .. },
                ..
            })
        ));
        let unit = world.unit(miner).unwrap();
        assert!(unit.automated);
        assert_eq!(unit.target, Some(Hex::new(1, 0)));
    }

    #[test]
    fn tech_gated_resources_wait_for_the_tech() {
        let mut world = world();
        resource(&mut world, Hex::new(1, 0), ResourceKind::Timber);
        let forester = world.recruit(UnitRole::Forester, Hex::new(0, 0)).unwrap();
        world.set_automation(forester, true).unwrap();
        let report = world.take_automated_turn(forester).unwrap();
        assert_eq!(report.statuses, vec![UnitStatus::NoTargets]);

        world.techs_mut().unlock("forestry");
        world.begin_turn();
        world.set_automation(forester, true).unwrap();
        let report = world.take_automated_turn(forester).unwrap();
        assert!(matches!(
            report.last_status(),
            Some(UnitStatus::Built {
                improvement: ImprovementKind::LumberMill,
                ..
            })
        ));
    }
}
