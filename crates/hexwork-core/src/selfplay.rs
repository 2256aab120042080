//! Headless self-play: generate a map, recruit one civilian of each role and
//! let automation run for a number of turns.

use std::collections::BTreeMap;
use std::time::Instant;

use serde::Serialize;

use hexwork_protocol::{ImprovementKind, ProspectOutcome, ResourceKind, UnitRole, UnitStatus};

use crate::economy::{TechSet, Treasury};
use crate::mapgen::{generate_map, MapGenConfig};
use crate::rules::Rules;
use crate::world::World;

#[derive(Clone, Debug)]
pub struct SelfPlayConfig {
    pub map: MapGenConfig,
    pub turns: u32,
    pub starting_cash: i64,
    pub starting_stock: Vec<(ResourceKind, u32)>,
    pub techs: Vec<String>,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        Self {
            map: MapGenConfig::default(),
            turns: 20,
            starting_cash: 500,
            starting_stock: vec![
                (ResourceKind::Grain, 6),
                (ResourceKind::Timber, 6),
                (ResourceKind::Iron, 4),
            ],
            techs: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct SelfPlayResult {
    pub seed: u64,
    pub turns_played: u32,
    pub connected_tiles: usize,
    /// Improvements on the map at the end, capital and port included.
    pub improvements: BTreeMap<String, u32>,
    /// Status reports by kind over the whole run.
    pub statuses: BTreeMap<String, u32>,
    pub discoveries: Vec<String>,
    pub final_cash: i64,
    pub automated_units: usize,
    pub duration_ms: u64,
}

pub fn run_selfplay(rules: Rules, config: &SelfPlayConfig) -> SelfPlayResult {
    let start = Instant::now();
    let generated = generate_map(&rules, &config.map);

    let mut treasury = Treasury::new(config.starting_cash);
    for (resource, amount) in &config.starting_stock {
        treasury.add_stock(*resource, *amount);
    }
    let techs: TechSet = config.techs.iter().cloned().collect();
    let mut world = World::new(generated.grid, rules, generated.player)
        .with_treasury(treasury)
        .with_techs(techs);
    world.set_capital(generated.capital);

    for role in UnitRole::ALL {
        match world.recruit(role, generated.capital) {
            Ok(id) => {
                if let Err(err) = world.set_automation(id, true) {
                    tracing::warn!(role = role.name(), %err, "could not automate unit");
                }
            }
            Err(err) => tracing::warn!(role = role.name(), %err, "could not recruit unit"),
        }
    }

    let mut result = SelfPlayResult {
        seed: config.map.seed,
        ..SelfPlayResult::default()
    };
    for turn in 1..=config.turns {
        world.begin_turn();
        let reports = world.run_automation();
        if reports.is_empty() {
            tracing::info!(turn, "no automated units left");
            break;
        }
        for report in &reports {
            for status in &report.statuses {
                tracing::debug!(turn, unit = ?report.unit, role = report.role.name(), %status);
                *result.statuses.entry(status_key(status).to_owned()).or_default() += 1;
                if let UnitStatus::Prospected {
                    hex,
                    outcome: ProspectOutcome::Discovered { resource },
                } = status
                {
                    result.discoveries.push(format!("{} at {hex}", resource.name()));
                }
            }
        }
        harvest(&mut world);
        result.turns_played = turn;
    }

    result.connected_tiles = world.network().connected_count();
    for (_, tile) in world.grid().iter() {
        if let Some(kind) = tile.improvement_kind() {
            *result.improvements.entry(kind.name().to_owned()).or_default() += 1;
        }
    }
    result.final_cash = world.treasury().cash;
    result.automated_units = world.units().iter().filter(|(_, unit)| unit.automated).count();
    result.duration_ms = start.elapsed().as_millis() as u64;
    tracing::info!(
        turns = result.turns_played,
        connected = result.connected_tiles,
        cash = result.final_cash,
        "self-play finished"
    );
    result
}

/// Connected productive improvements yield their resource (one per level) and its value in cash.
fn harvest(world: &mut World) {
    world.refresh_network();
    let view = world.network_view();
    let yields: Vec<(ResourceKind, u32)> = world
        .grid()
        .iter()
        .filter(|(_, tile)| tile.improvement_kind().is_some_and(ImprovementKind::is_productive))
        .filter(|(hex, _)| view.is_connected(*hex))
        .filter_map(|(_, tile)| Some((tile.known_resource()?, u32::from(tile.level()))))
        .collect();
    for (resource, amount) in yields {
        let value = world.rules().resource(resource).value;
        let treasury = world.treasury_mut();
        treasury.add_stock(resource, amount);
        treasury.cash += i64::from(value) * i64::from(amount);
    }
    world.reassess_needs();
}

fn status_key(status: &UnitStatus) -> &'static str {
    match status {
        UnitStatus::Built { .. } => "built",
        UnitStatus::Upgraded { .. } => "upgraded",
        UnitStatus::DepotFounded { .. } => "depot_founded",
        UnitStatus::TrackLaid { .. } => "track_laid",
        UnitStatus::Prospected { .. } => "prospected",
        UnitStatus::EnRoute { .. } => "en_route",
        UnitStatus::TargetUnreachable { .. } => "target_unreachable",
        UnitStatus::NoTargets => "no_targets",
        UnitStatus::BuildFailed { .. } => "build_failed",
        UnitStatus::OutOfMoves { .. } => "out_of_moves",
        UnitStatus::AutomationDisabled => "automation_disabled",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> SelfPlayConfig {
        SelfPlayConfig {
            map: MapGenConfig {
                width: 20,
                height: 16,
                seed: 12345,
                ..MapGenConfig::default()
            },
            turns: 8,
            ..SelfPlayConfig::default()
        }
    }

    #[test]
    fn selfplay_runs_and_builds_something() {
        let result = run_selfplay(Rules::default(), &small());
        assert!(result.turns_played > 0 && result.turns_played <= 8);
        assert!(result.connected_tiles >= 1);
        assert_eq!(result.improvements.get("capital"), Some(&1));
        assert!(!result.statuses.is_empty());
    }

    #[test]
    fn selfplay_is_deterministic() {
        let a = run_selfplay(Rules::default(), &small());
        let b = run_selfplay(Rules::default(), &small());
        assert_eq!(a.statuses, b.statuses);
        assert_eq!(a.improvements, b.improvements);
        assert_eq!(a.discoveries, b.discoveries);
        assert_eq!(a.final_cash, b.final_cash);
    }
}
