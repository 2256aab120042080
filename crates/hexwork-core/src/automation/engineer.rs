use hexwork_protocol::{Hex, ImprovementKind, UnitId, UnitStatus};

use crate::automation::{excluded_targets, site_score, RoleBehavior, RoleCapabilities};
use crate::map::Tile;
use crate::movement::{entry_cost, needs_infrastructure_first};
use crate::targeting::{find_best_target, reserved_hexes, HexSet};
use crate::unit::{TargetFilter, Unit};
use crate::world::{NetworkView, World};

/// Keeps resources linked to the capital: founds depots in gaps, lays and
/// upgrades track, and opens mountains for the improvers.
pub struct Engineer {
    caps: &'static RoleCapabilities,
}

impl Engineer {
    pub const fn new(caps: &'static RoleCapabilities) -> Self {
        Self { caps }
    }
}

/// A depot may go here: owned, outside the network, not on a resource, at
/// least two hexes from any station, and worth it.
fn is_depot_site(world: &World, view: &NetworkView<'_>, hex: Hex) -> bool {
    let grid = world.grid();
    let Some(tile) = grid.get(hex) else {
        return false;
    };
    if tile.is_water() || tile.owner != Some(world.player()) || view.is_connected(hex) {
        return false;
    }
    if tile.known_resource().is_some() {
        return false;
    }
    if tile.improvement_kind().is_some_and(|kind| !kind.is_track()) {
        return false;
    }
    let crowded = hex.range(1).any(|near| {
        grid.get(near)
            .and_then(Tile::improvement_kind)
            .is_some_and(ImprovementKind::is_station)
    });
    if crowded {
        return false;
    }
    world.needs().crisis() || priority_neighbors(world, hex) > 0
}

fn priority_neighbors(world: &World, hex: Hex) -> usize {
    hex.neighbors()
        .filter_map(|n| world.grid().get(n)?.known_resource())
        .filter(|resource| world.rules().resource(*resource).priority)
        .count()
}

/// Next build toward a depot at `hex`, if the site qualifies. The price is
/// checked when building so a short treasury shows up as a failed build.
/// A bare mountain takes a road first.
fn depot_step(world: &World, view: &NetworkView<'_>, hex: Hex) -> Option<ImprovementKind> {
    if !is_depot_site(world, view, hex) {
        return None;
    }
    let tile = world.grid().get(hex)?;
    let kind = if needs_infrastructure_first(tile) {
        ImprovementKind::Road
    } else {
        ImprovementKind::Depot
    };
    world.site_check(hex, kind).ok()?;
    Some(kind)
}

/// Track here would pull the network one tile outward.
fn extends_network(world: &World, view: &NetworkView<'_>, hex: Hex) -> bool {
    !view.is_connected(hex)
        && view.is_adjacent_to_network(hex)
        && world.site_check(hex, ImprovementKind::Road).is_ok()
}

/// A bare mountain over a resource, which needs a road before it can be worked.
fn opens_mountain(world: &World, hex: Hex) -> bool {
    world.grid().get(hex).is_some_and(|tile| {
        needs_infrastructure_first(tile) && tile.known_resource().is_some()
    }) && world.site_check(hex, ImprovementKind::Road).is_ok()
}

fn is_track_site(world: &World, view: &NetworkView<'_>, hex: Hex) -> bool {
    extends_network(world, view, hex) || opens_mountain(world, hex)
}

/// Rail once the tech and the stock allow it, otherwise road.
fn track_for(world: &World, hex: Hex) -> ImprovementKind {
    if world.can_build(hex, ImprovementKind::Rail).is_ok() {
        ImprovementKind::Rail
    } else {
        ImprovementKind::Road
    }
}

/// A known resource outside the network that no connected tile touches yet.
fn wants_link(world: &World, view: &NetworkView<'_>, hex: Hex, tile: &Tile) -> bool {
    tile.known_resource().is_some()
        && tile.owner == Some(world.player())
        && !view.is_connected(hex)
        && (needs_infrastructure_first(tile) || !view.is_adjacent_to_network(hex))
}

impl Engineer {
    fn build(&self, world: &mut World, id: UnitId, unit: &mut Unit, kind: ImprovementKind) -> UnitStatus {
        let here = unit.position;
        match world.build_at(here, kind) {
            Ok(status) => {
                unit.exhaust();
                if unit.target == Some(here) {
                    unit.target = None;
                }
                status
            }
            Err(reason) => {
                tracing::debug!(unit = ?id, hex = %here, %reason, "cannot build");
                UnitStatus::BuildFailed {
                    hex: here,
                    improvement: kind,
                    reason,
                }
            }
        }
    }

    /// Enterable tiles where track would extend the network, minus excluded ones.
    fn frontier(&self, world: &World, view: &NetworkView<'_>, unit: &Unit, exclude: &HexSet) -> Vec<Hex> {
        let profile = unit.profile(world.rules());
        world
            .grid()
            .iter()
            .filter(|(hex, tile)| {
                !exclude.contains(&hex.pack())
                    && entry_cost(tile, profile, world.rules()).is_some()
                    && extends_network(world, view, *hex)
            })
            .map(|(hex, _)| hex)
            .collect()
    }

    /// Where to stand to link `resource`: the tile itself when a mountain
    /// road opens it, otherwise the frontier tile closest to it.
    fn work_site(&self, world: &World, unit: &Unit, resource: Hex, frontier: &[Hex]) -> Option<Hex> {
        if opens_mountain(world, resource) {
            return Some(resource);
        }
        frontier
            .iter()
            .copied()
            .min_by_key(|site| (site.distance(resource), unit.position.distance(*site), *site))
    }

    fn depot_target(&self, world: &World, id: UnitId, unit: &Unit, exclude: &HexSet) -> Option<Hex> {
        let view = world.network_view();
        let profile = unit.profile(world.rules());
        let weights = &world.rules().scoring;
        let mut exclude = exclude.clone();
        exclude.extend(reserved_hexes(world.units(), id, 1));
        find_best_target(world.grid(), unit.position, &exclude, |hex, tile| {
            if entry_cost(tile, profile, world.rules()).is_none() {
                return f32::NEG_INFINITY;
            }
            if depot_step(world, &view, hex).is_none() {
                return f32::NEG_INFINITY;
            }
            -(unit.position.distance(hex) as f32) * weights.distance_weight
                + priority_neighbors(world, hex) as f32 * weights.priority_bonus
        })
    }

    /// Picks the best unlinked resource and returns where to stand to link it.
    ///
    /// The work site is not necessarily a neighbor of the resource: it is the
    /// network frontier tile closest to it, so each road laid pulls the
    /// network one step nearer. Bare mountains are the exception and are
    /// opened on the peak itself.
    fn link_target(
        &self,
        world: &World,
        unit: &Unit,
        filter: TargetFilter,
        exclude: &HexSet,
    ) -> Option<Hex> {
        let view = world.network_view();
        let frontier = self.frontier(world, &view, unit, exclude);
        let resource = find_best_target(world.grid(), unit.position, exclude, |hex, tile| {
            if !filter.matches(tile) || !wants_link(world, &view, hex, tile) {
                return f32::NEG_INFINITY;
            }
            if self.work_site(world, unit, hex, &frontier).is_none() {
                return f32::NEG_INFINITY;
            }
            site_score(world, &view, unit.position, hex, tile.known_resource())
        })?;
        let site = self.work_site(world, unit, resource, &frontier)?;
        if site != resource {
            tracing::debug!(resource = %resource, site = %site, "linking from the network frontier");
        }
        Some(site)
    }
}

impl RoleBehavior for Engineer {
    fn capabilities(&self) -> &RoleCapabilities {
        self.caps
    }

    fn work_here(&self, world: &mut World, id: UnitId, unit: &mut Unit) -> Option<UnitStatus> {
        // Construction takes the whole turn.
        if unit.moves_left < unit.max_moves {
            return None;
        }
        let here = unit.position;

        let depot = depot_step(world, &world.network_view(), here);
        if let Some(kind) = depot {
            // Passing through on other business, only stop for what we can pay for.
            let passing = unit.target.is_some_and(|target| target != here);
            if !passing || world.can_build(here, kind).is_ok() {
                return Some(self.build(world, id, unit, kind));
            }
        }

        let on_road = world
            .grid()
            .get(here)
            .is_some_and(|tile| tile.has_improvement(ImprovementKind::Road));
        if on_road && world.can_build(here, ImprovementKind::Rail).is_ok() {
            return Some(self.build(world, id, unit, ImprovementKind::Rail));
        }

        if unit.target == Some(here) && is_track_site(world, &world.network_view(), here) {
            let kind = track_for(world, here);
            return Some(self.build(world, id, unit, kind));
        }
        None
    }

    fn select_target(&self, world: &World, id: UnitId, unit: &Unit) -> Option<Hex> {
        let exclude = excluded_targets(world, id, unit);

        if let Some(category) = world.needs().priority() {
            let urgent = TargetFilter::Category(category);
            if urgent != unit.filter {
                if let Some(site) = self.link_target(world, unit, urgent, &exclude) {
                    tracing::debug!(unit = ?id, category = ?category, "shortage overrides filter");
                    return Some(site);
                }
            }
        }

        if let Some(site) = self.link_target(world, unit, unit.filter, &exclude) {
            return Some(site);
        }
        if unit.filter == TargetFilter::Any {
            return self.depot_target(world, id, unit, &exclude);
        }
        None
    }
}
