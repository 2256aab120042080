//! Automated turns for civilian units.
//!
//! Every role runs the same driver: work the current tile, otherwise hold or
//! pick a target and take one step toward it, and repeat while moves remain.
//! The loop is capped at the unit's per-turn budget; each pass either spends
//! movement, ends the turn, or retires a target.

mod engineer;
mod improver;
mod prospector;

use serde::Serialize;

use hexwork_protocol::{Hex, ImprovementKind, ResourceKind, UnitId, UnitRole, UnitStatus};

use crate::movement::entry_cost;
use crate::pathfinding::{best_path, path_within, reachable_within};
use crate::targeting::{colleague_targets, HexSet};
use crate::unit::Unit;
use crate::world::{NetworkView, World, WorldError};

pub use engineer::Engineer;
pub use improver::Improver;
pub use prospector::Prospector;

/// What a role can do, independent of how it decides.
#[derive(Clone, Copy, Debug)]
pub struct RoleCapabilities {
    pub role: UnitRole,
    /// Improvements the role may place.
    pub improvements: &'static [ImprovementKind],
    /// Try the budget-bounded search before the unbounded one.
    pub bounded_first: bool,
    /// A path failure ends automation instead of retrying another target.
    pub path_failure_is_terminal: bool,
    /// Work only starts on an untouched budget; arriving mid-turn holds the
    /// target until the next turn.
    pub works_on_fresh_turn: bool,
}

const ENGINEER: RoleCapabilities = RoleCapabilities {
    role: UnitRole::Engineer,
    improvements: &[
        ImprovementKind::Road,
        ImprovementKind::Rail,
        ImprovementKind::Depot,
        ImprovementKind::Port,
    ],
    bounded_first: true,
    path_failure_is_terminal: false,
    works_on_fresh_turn: true,
};

const PROSPECTOR: RoleCapabilities = RoleCapabilities {
    role: UnitRole::Prospector,
    improvements: &[],
    bounded_first: false,
    path_failure_is_terminal: true,
    works_on_fresh_turn: false,
};

const fn improver(role: UnitRole, improvements: &'static [ImprovementKind]) -> RoleCapabilities {
    RoleCapabilities {
        role,
        improvements,
        bounded_first: true,
        path_failure_is_terminal: false,
        works_on_fresh_turn: false,
    }
}

const FARMER: RoleCapabilities = improver(
    UnitRole::Farmer,
    &[ImprovementKind::Farm, ImprovementKind::Plantation],
);
const MINER: RoleCapabilities = improver(UnitRole::Miner, &[ImprovementKind::Mine]);
const FORESTER: RoleCapabilities = improver(UnitRole::Forester, &[ImprovementKind::LumberMill]);
const RANCHER: RoleCapabilities = improver(UnitRole::Rancher, &[ImprovementKind::Ranch]);
const DRILLER: RoleCapabilities = improver(UnitRole::Driller, &[ImprovementKind::OilWell]);

pub fn capabilities(role: UnitRole) -> &'static RoleCapabilities {
    match role {
        UnitRole::Engineer => &ENGINEER,
        UnitRole::Prospector => &PROSPECTOR,
        UnitRole::Farmer => &FARMER,
        UnitRole::Miner => &MINER,
        UnitRole::Forester => &FORESTER,
        UnitRole::Rancher => &RANCHER,
        UnitRole::Driller => &DRILLER,
    }
}

static ENGINEER_BEHAVIOR: Engineer = Engineer::new(&ENGINEER);
static PROSPECTOR_BEHAVIOR: Prospector = Prospector::new(&PROSPECTOR);
static FARMER_BEHAVIOR: Improver = Improver::new(&FARMER);
static MINER_BEHAVIOR: Improver = Improver::new(&MINER);
static FORESTER_BEHAVIOR: Improver = Improver::new(&FORESTER);
static RANCHER_BEHAVIOR: Improver = Improver::new(&RANCHER);
static DRILLER_BEHAVIOR: Improver = Improver::new(&DRILLER);

pub fn behavior_for(role: UnitRole) -> &'static dyn RoleBehavior {
    match role {
        UnitRole::Engineer => &ENGINEER_BEHAVIOR,
        UnitRole::Prospector => &PROSPECTOR_BEHAVIOR,
        UnitRole::Farmer => &FARMER_BEHAVIOR,
        UnitRole::Miner => &MINER_BEHAVIOR,
        UnitRole::Forester => &FORESTER_BEHAVIOR,
        UnitRole::Rancher => &RANCHER_BEHAVIOR,
        UnitRole::Driller => &DRILLER_BEHAVIOR,
    }
}

/// Per-role decisions plugged into the shared driver.
pub trait RoleBehavior {
    fn capabilities(&self) -> &RoleCapabilities;

    /// Act on the tile under the unit, if there is anything to do there.
    fn work_here(&self, world: &mut World, id: UnitId, unit: &mut Unit) -> Option<UnitStatus>;

    /// Choose a new target. The world's network view is fresh.
    fn select_target(&self, world: &World, id: UnitId, unit: &Unit) -> Option<Hex>;

    fn on_path_failed(&self, unit: &mut Unit, target: Hex, statuses: &mut Vec<UnitStatus>) -> Flow {
        statuses.push(UnitStatus::TargetUnreachable { target });
        if self.capabilities().path_failure_is_terminal {
            unit.target = None;
            unit.automated = false;
            statuses.push(UnitStatus::AutomationDisabled);
            tracing::info!(role = unit.role.name(), target = %target, "automation disabled after path failure");
            return Flow::Stop;
        }
        tracing::debug!(role = unit.role.name(), target = %target, "target unreachable; choosing another");
        unit.mark_unreachable(target);
        unit.target = None;
        Flow::Continue
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Everything one automated turn did.
#[derive(Clone, Debug, Serialize)]
pub struct TurnReport {
    pub unit: UnitId,
    pub role: UnitRole,
    pub statuses: Vec<UnitStatus>,
    pub moved_from: Hex,
    pub moved_to: Hex,
    pub spent: u32,
}

impl TurnReport {
    pub fn last_status(&self) -> Option<&UnitStatus> {
        self.statuses.last()
    }
}

enum Step {
    Moved,
    OutOfMoves,
    NoPath,
}

pub fn drive_turn(world: &mut World, id: UnitId) -> Result<TurnReport, WorldError> {
    let mut unit = world
        .unit(id)
        .cloned()
        .ok_or(WorldError::UnknownUnit(id))?;
    let mut report = TurnReport {
        unit: id,
        role: unit.role,
        statuses: Vec::new(),
        moved_from: unit.position,
        moved_to: unit.position,
        spent: 0,
    };
    if !unit.automated {
        return Ok(report);
    }

    let behavior = behavior_for(unit.role);
    let starting_moves = unit.moves_left;
    let ceiling = unit.max_moves.max(1);
    let mut moved_since_status = false;

    for _ in 0..ceiling {
        if !unit.automated || unit.moves_left == 0 {
            break;
        }
        world.refresh_network();
        let before = report.statuses.len();
        let flow = step(world, id, &mut unit, behavior, &mut report.statuses);
        if report.statuses.len() > before {
            moved_since_status = false;
        }
        match flow {
            (Flow::Continue, moved) => moved_since_status |= moved,
            (Flow::Stop, moved) => {
                moved_since_status |= moved;
                break;
            }
        }
    }

    if unit.automated {
        match unit.target {
            Some(target) if moved_since_status => report.statuses.push(UnitStatus::EnRoute {
                at: unit.position,
                target,
            }),
            _ if report.statuses.is_empty() => report
                .statuses
                .push(UnitStatus::OutOfMoves { at: unit.position }),
            _ => {}
        }
    }

    report.moved_to = unit.position;
    report.spent = starting_moves.saturating_sub(unit.moves_left);
    if let Some(slot) = world.units_mut().get_mut(id) {
        *slot = unit;
    }
    Ok(report)
}

/// One pass of the driver. Returns the flow and whether the unit moved.
fn step(
    world: &mut World,
    id: UnitId,
    unit: &mut Unit,
    behavior: &dyn RoleBehavior,
    statuses: &mut Vec<UnitStatus>,
) -> (Flow, bool) {
    if let Some(status) = behavior.work_here(world, id, unit) {
        let failed = matches!(status, UnitStatus::BuildFailed { .. });
        if failed {
            tracing::debug!(unit = ?id, status = %status, "build failed; retrying next turn");
        }
        statuses.push(status);
        let flow = if failed || unit.moves_left == 0 {
            Flow::Stop
        } else {
            Flow::Continue
        };
        return (flow, false);
    }

    let target = match unit.target {
        Some(target) => target,
        None => match behavior.select_target(world, id, unit) {
            Some(target) => {
                tracing::debug!(unit = ?id, role = unit.role.name(), target = %target, "target selected");
                unit.target = Some(target);
                target
            }
            None => {
                tracing::info!(unit = ?id, role = unit.role.name(), "no targets; automation disabled");
                unit.target = None;
                unit.automated = false;
                statuses.push(UnitStatus::NoTargets);
                return (Flow::Stop, false);
            }
        },
    };

    if unit.position == target {
        if behavior.capabilities().works_on_fresh_turn && unit.moves_left < unit.max_moves {
            tracing::debug!(unit = ?id, target = %target, "arrived; work starts next turn");
            return (Flow::Stop, false);
        }
        // Nothing left to do at the target; retire it for this session.
        tracing::debug!(unit = ?id, target = %target, "target no longer workable");
        unit.mark_unreachable(target);
        unit.target = None;
        return (Flow::Continue, false);
    }

    match step_toward(world, unit, target, behavior.capabilities()) {
        Step::Moved => (Flow::Continue, true),
        Step::OutOfMoves => (Flow::Stop, false),
        Step::NoPath => (behavior.on_path_failed(unit, target, statuses), false),
    }
}

/// Takes a single step along the best known path, bounded search first when the role allows.
fn step_toward(world: &World, unit: &mut Unit, target: Hex, caps: &RoleCapabilities) -> Step {
    let grid = world.grid();
    let rules = world.rules();
    let profile = unit.profile(rules);

    let mut path = None;
    if caps.bounded_first {
        let reachable = reachable_within(grid, rules, unit.position, profile, unit.moves_left);
        path = path_within(grid, rules, &reachable, profile, target);
    }
    let path = match path {
        Some(path) => Some(path),
        None => best_path(grid, rules, unit.position, target, profile),
    };
    let Some(next) = path.and_then(|path| path.first().copied()) else {
        return Step::NoPath;
    };
    let Some(cost) = grid.get(next).and_then(|tile| entry_cost(tile, profile, rules)) else {
        return Step::NoPath;
    };
    if cost > unit.moves_left {
        return Step::OutOfMoves;
    }
    unit.position = next;
    unit.spend(cost);
    tracing::debug!(role = unit.role.name(), hex = %next, target = %target, cost, "stepped");
    Step::Moved
}

/// Hexes a unit must not pick: colleagues' targets plus its own failed ones.
pub(crate) fn excluded_targets(world: &World, id: UnitId, unit: &Unit) -> HexSet {
    let mut exclude = colleague_targets(world.units(), id);
    exclude.extend(unit.unreachable().iter().copied());
    exclude
}

/// Shared site score: closer is better, connected or near-network sites and
/// valuable or priority resources earn bonuses.
pub(crate) fn site_score(
    world: &World,
    network: &NetworkView<'_>,
    from: Hex,
    site: Hex,
    resource: Option<ResourceKind>,
) -> f32 {
    let weights = &world.rules().scoring;
    let mut score = -(from.distance(site) as f32) * weights.distance_weight;
    if network.is_connected(site) {
        score += weights.connected_bonus;
    } else if network.is_adjacent_to_network(site) {
        score += weights.adjacent_bonus;
    }
    if let Some(resource) = resource {
        let rules = world.rules().resource(resource);
        if rules.value >= weights.high_value_threshold {
            score += weights.high_value_bonus;
        }
        if rules.priority {
            score += weights.priority_bonus;
        }
    }
    score
}
