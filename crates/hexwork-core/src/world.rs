use thiserror::Error;

use hexwork_protocol::{
    BuildError, Hex, ImprovementKind, PlayerId, ProspectOutcome, TileImprovement, TilePatch,
    UnitId, UnitRole, UnitStatus,
};

use crate::advisor::EmpireNeeds;
use crate::automation::{self, capabilities, TurnReport};
use crate::economy::{Price, TechSet, Treasury};
use crate::map::{GridError, WorldGrid};
use crate::movement::needs_infrastructure_first;
use crate::network::TransportNetwork;
use crate::rules::Rules;
use crate::unit::{TargetFilter, Unit, UnitRoster};

#[derive(Debug, Error)]
pub enum WorldError {
    #[error("unknown unit {0:?}")]
    UnknownUnit(UnitId),
    #[error("{role:?} cannot {action}")]
    WrongRole { role: UnitRole, action: &'static str },
    #[error("filter {filter:?} does not apply to {role:?}")]
    InvalidFilter { role: UnitRole, filter: TargetFilter },
    #[error("unit {0:?} has no moves left")]
    NoMoves(UnitId),
    #[error("cannot place a unit on water at {0}")]
    Water(Hex),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Build(#[from] BuildError),
}

/// Read-only connectivity queries against the last network recalculation.
#[derive(Clone, Copy)]
pub struct NetworkView<'a> {
    grid: &'a WorldGrid,
    network: &'a TransportNetwork,
}

impl NetworkView<'_> {
    pub fn is_connected(&self, hex: Hex) -> bool {
        self.network.is_connected(self.grid, hex)
    }

    pub fn cost_from_capital(&self, hex: Hex) -> Option<u32> {
        self.network.cost_from_capital(self.grid, hex)
    }

    pub fn is_adjacent_to_network(&self, hex: Hex) -> bool {
        self.network.is_adjacent_to_network(self.grid, hex)
    }
}

/// One empire's session: the map, its civilians and the collaborators they draw on.
///
/// Every improvement change goes through here, and the network notices it via
/// the grid's infrastructure revision.
#[derive(Debug)]
pub struct World {
    grid: WorldGrid,
    network: TransportNetwork,
    units: UnitRoster,
    treasury: Treasury,
    techs: TechSet,
    needs: EmpireNeeds,
    rules: Rules,
    player: PlayerId,
}

impl World {
    pub fn new(grid: WorldGrid, rules: Rules, player: PlayerId) -> Self {
        let treasury = Treasury::default();
        let needs = EmpireNeeds::assess(&treasury, &rules.needs);
        let mut world = Self {
            grid,
            network: TransportNetwork::new(),
            units: UnitRoster::default(),
            treasury,
            techs: TechSet::new(),
            needs,
            rules,
            player,
        };
        world.refresh_network();
        world
    }

    pub fn with_treasury(mut self, treasury: Treasury) -> Self {
        self.treasury = treasury;
        self.reassess_needs();
        self
    }

    pub fn with_techs(mut self, techs: TechSet) -> Self {
        self.techs = techs;
        self
    }

    pub fn grid(&self) -> &WorldGrid {
        &self.grid
    }

    /// Direct grid access for hosts; improvement edits still invalidate the network.
    pub fn grid_mut(&mut self) -> &mut WorldGrid {
        &mut self.grid
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    pub fn units(&self) -> &UnitRoster {
        &self.units
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(id)
    }

    pub(crate) fn units_mut(&mut self) -> &mut UnitRoster {
        &mut self.units
    }

    pub fn treasury(&self) -> &Treasury {
        &self.treasury
    }

    pub fn treasury_mut(&mut self) -> &mut Treasury {
        &mut self.treasury
    }

    pub fn techs(&self) -> &TechSet {
        &self.techs
    }

    pub fn techs_mut(&mut self) -> &mut TechSet {
        &mut self.techs
    }

    pub fn needs(&self) -> EmpireNeeds {
        self.needs
    }

    pub fn reassess_needs(&mut self) {
        self.needs = EmpireNeeds::assess(&self.treasury, &self.rules.needs);
    }

    pub fn set_capital(&mut self, hex: Hex) {
        self.network.set_capital(hex);
    }

    pub fn mark_network_dirty(&mut self) {
        self.network.mark_dirty();
    }

    /// Recomputes the network if anything invalidated it.
    pub fn refresh_network(&mut self) -> bool {
        self.network.update(&self.grid)
    }

    /// Queries against the network as of the last refresh.
    pub fn network_view(&self) -> NetworkView<'_> {
        NetworkView {
            grid: &self.grid,
            network: &self.network,
        }
    }

    pub fn network(&mut self) -> &TransportNetwork {
        self.network.update(&self.grid);
        &self.network
    }

    pub fn is_connected(&mut self, hex: Hex) -> bool {
        self.refresh_network();
        self.network_view().is_connected(hex)
    }

    pub fn recruit(&mut self, role: UnitRole, at: Hex) -> Result<UnitId, WorldError> {
        let tile = self.grid.get(at).ok_or(GridError::OutOfBounds(at))?;
        if tile.is_water() {
            return Err(WorldError::Water(at));
        }
        let id = self.units.recruit(Unit::new(role, at, &self.rules));
        tracing::debug!(unit = ?id, role = role.name(), hex = %at, "unit recruited");
        Ok(id)
    }

    pub fn disband(&mut self, id: UnitId) -> Result<Unit, WorldError> {
        self.units.disband(id).ok_or(WorldError::UnknownUnit(id))
    }

    fn unit_mut(&mut self, id: UnitId) -> Result<&mut Unit, WorldError> {
        self.units.get_mut(id).ok_or(WorldError::UnknownUnit(id))
    }

    /// Turn boundary: every unit gets its full budget back, and the advisory is refreshed.
    pub fn begin_turn(&mut self) {
        for (_, unit) in self.units.iter_mut() {
            unit.reset_moves();
        }
        self.reassess_needs();
    }

    pub fn set_automation(&mut self, id: UnitId, automated: bool) -> Result<(), WorldError> {
        let unit = self.unit_mut(id)?;
        unit.automated = automated;
        if automated {
            unit.clear_unreachable();
        }
        Ok(())
    }

    pub fn assign_target(&mut self, id: UnitId, target: Option<Hex>) -> Result<(), WorldError> {
        if let Some(hex) = target {
            if !self.grid.is_valid(hex) {
                return Err(GridError::OutOfBounds(hex).into());
            }
        }
        let unit = self.unit_mut(id)?;
        unit.target = target;
        unit.clear_unreachable();
        Ok(())
    }

    pub fn set_filter(&mut self, id: UnitId, filter: TargetFilter) -> Result<(), WorldError> {
        let unit = self.unit_mut(id)?;
        if !filter.allowed_for(unit.role) {
            return Err(WorldError::InvalidFilter {
                role: unit.role,
                filter,
            });
        }
        unit.filter = filter;
        unit.target = None;
        unit.clear_unreachable();
        Ok(())
    }

    pub fn take_automated_turn(&mut self, id: UnitId) -> Result<TurnReport, WorldError> {
        automation::drive_turn(self, id)
    }

    /// One automated turn for every automated unit, in roster order.
    pub fn run_automation(&mut self) -> Vec<TurnReport> {
        let ids: Vec<UnitId> = self
            .units
            .iter()
            .filter(|(_, unit)| unit.automated)
            .map(|(id, _)| id)
            .collect();
        ids.into_iter()
            .filter_map(|id| match automation::drive_turn(self, id) {
                Ok(report) => Some(report),
                Err(err) => {
                    tracing::warn!(unit = ?id, error = %err, "automated turn skipped");
                    None
                }
            })
            .collect()
    }

    /// Manual build by a unit on its own tile. Ends the unit's turn on success.
    pub fn build_improvement(
        &mut self,
        id: UnitId,
        kind: ImprovementKind,
    ) -> Result<UnitStatus, WorldError> {
        let unit = self.units.get(id).ok_or(WorldError::UnknownUnit(id))?;
        if !capabilities(unit.role).improvements.contains(&kind) {
            return Err(WorldError::WrongRole {
                role: unit.role,
                action: "build that improvement",
            });
        }
        if unit.moves_left == 0 {
            return Err(WorldError::NoMoves(id));
        }
        let at = unit.position;
        let status = self.build_at(at, kind)?;
        self.unit_mut(id)?.exhaust();
        Ok(status)
    }

    /// Manual prospect of the unit's own tile.
    pub fn prospect(&mut self, id: UnitId) -> Result<UnitStatus, WorldError> {
        let unit = self.units.get(id).ok_or(WorldError::UnknownUnit(id))?;
        if unit.role != UnitRole::Prospector {
            return Err(WorldError::WrongRole {
                role: unit.role,
                action: "prospect",
            });
        }
        if unit.moves_left == 0 {
            return Err(WorldError::NoMoves(id));
        }
        let at = unit.position;
        let outcome = self.prospect_at(at)?;
        self.unit_mut(id)?.exhaust();
        Ok(UnitStatus::Prospected { hex: at, outcome })
    }

    /// Inspects a tile. A tile inspected before reports `NothingToFind` and is left alone.
    pub(crate) fn prospect_at(&mut self, hex: Hex) -> Result<ProspectOutcome, GridError> {
        let tile = self.grid.get(hex).ok_or(GridError::OutOfBounds(hex))?;
        if tile.prospected {
            return Ok(ProspectOutcome::NothingToFind);
        }
        let known = tile.known_resource();
        self.grid.set(hex, TilePatch::default().prospected(true))?;
        let outcome = if let Some(resource) = self.grid.discover(hex)? {
            tracing::info!(hex = %hex, resource = resource.name(), "resource discovered");
            ProspectOutcome::Discovered { resource }
        } else if let Some(resource) = known {
            ProspectOutcome::AlreadyKnown { resource }
        } else {
            ProspectOutcome::NothingFound
        };
        Ok(outcome)
    }

    /// Checks everything about building `kind` at `hex` except the price, and
    /// returns the level the improvement would end up at.
    pub fn site_check(&self, hex: Hex, kind: ImprovementKind) -> Result<u8, BuildError> {
        let tile = self.grid.get(hex).ok_or(BuildError::OutOfBounds)?;
        if tile.is_water() {
            return Err(BuildError::Water);
        }
        if tile.owner != Some(self.player) {
            return Err(BuildError::NotOwned);
        }
        let rules = self.rules.improvement(kind);
        if let Some(tech) = rules.tech.as_deref() {
            if !self.techs.has(tech) {
                return Err(BuildError::MissingTech { tech: tech.into() });
            }
        }
        let existing = tile.improvement;

        if kind.is_productive() {
            let resource = tile
                .known_resource()
                .filter(|resource| self.rules.improvement_for(*resource) == Some(kind))
                .ok_or(BuildError::Incompatible { improvement: kind })?;
            if let Some(tech) = self.rules.resource(resource).tech.as_deref() {
                if !self.techs.has(tech) {
                    return Err(BuildError::MissingTech { tech: tech.into() });
                }
            }
            if needs_infrastructure_first(tile) {
                return Err(BuildError::NeedsInfrastructure);
            }
            return match existing {
                None => Ok(1),
                Some(current) if current.kind == kind => {
                    if current.level >= rules.max_level {
                        Err(BuildError::AtMaxLevel)
                    } else {
                        Ok(current.level + 1)
                    }
                }
                Some(current) if current.kind.is_track() => Ok(1),
                Some(current) => Err(BuildError::Occupied {
                    existing: current.kind,
                }),
            };
        }

        // Infrastructure from here on. A bare mountain may take a road over its
        // resource; anywhere else a known resource is kept for its improvement.
        let protected = tile.known_resource().is_some()
            && !(kind.is_track() && needs_infrastructure_first(tile));
        match kind {
            ImprovementKind::Capital => Err(BuildError::Incompatible { improvement: kind }),
            ImprovementKind::Road | ImprovementKind::Rail => {
                match existing.map(|imp| imp.kind) {
                    None => {}
                    Some(ImprovementKind::Road) if kind == ImprovementKind::Rail => {}
                    Some(current) => return Err(BuildError::Occupied { existing: current }),
                }
                if protected {
                    return Err(BuildError::Protected);
                }
                Ok(1)
            }
            _ => {
                if let Some(current) = existing.map(|imp| imp.kind).filter(|k| !k.is_track()) {
                    return Err(BuildError::Occupied { existing: current });
                }
                if protected {
                    return Err(BuildError::Protected);
                }
                if needs_infrastructure_first(tile) {
                    return Err(BuildError::NeedsInfrastructure);
                }
                if kind == ImprovementKind::Port {
                    let coastal = hex
                        .neighbors()
                        .any(|n| self.grid.get(n).is_some_and(|t| t.is_water()));
                    if !coastal {
                        return Err(BuildError::Incompatible { improvement: kind });
                    }
                }
                Ok(1)
            }
        }
    }

    /// Upgrades cost the base price once per level reached.
    pub fn price_of(&self, kind: ImprovementKind, level: u8) -> Price {
        self.rules
            .improvement(kind)
            .price
            .scaled(u32::from(level.max(1)))
    }

    pub fn can_build(&self, hex: Hex, kind: ImprovementKind) -> Result<(), BuildError> {
        let level = self.site_check(hex, kind)?;
        self.treasury.check(&self.price_of(kind, level))
    }

    /// Pays for and places an improvement. Nothing changes on failure.
    pub(crate) fn build_at(
        &mut self,
        hex: Hex,
        kind: ImprovementKind,
    ) -> Result<UnitStatus, BuildError> {
        let level = self.site_check(hex, kind)?;
        let price = self.price_of(kind, level);
        self.treasury.pay(&price)?;
        self.grid
            .set(
                hex,
                TilePatch::default().improvement(Some(TileImprovement::with_level(kind, level))),
            )
            .map_err(|_| BuildError::OutOfBounds)?;
        tracing::info!(
            hex = %hex,
            improvement = kind.name(),
            level,
            cost = price.money,
            "improvement built"
        );

        let status = match kind {
            ImprovementKind::Depot => UnitStatus::DepotFounded { hex },
            ImprovementKind::Road | ImprovementKind::Rail => UnitStatus::TrackLaid {
                hex,
                improvement: kind,
            },
            _ if level > 1 => UnitStatus::Upgraded {
                hex,
                improvement: kind,
                level,
            },
            _ => UnitStatus::Built {
                hex,
                improvement: kind,
            },
        };
        Ok(status)
    }
}
