//! Capital connectivity oracle.
//!
//! Cargo moves only across transport-eligible improvements, one unit of cost
//! per tile. Reaching any port links every other port at one extra hop.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use hexwork_protocol::{Hex, ImprovementKind};

use crate::map::WorldGrid;

/// Cost stored for cells the capital cannot reach.
pub const DISCONNECTED: u32 = u32::MAX;

#[derive(Clone, Debug, Default)]
pub struct TransportNetwork {
    costs: Vec<u32>,
    capital: Option<Hex>,
    dirty: bool,
    revision: Option<u64>,
}

impl TransportNetwork {
    pub fn new() -> Self {
        Self {
            dirty: true,
            ..Self::default()
        }
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Pins the flood origin. Without one, the first capital tile in scan order is used.
    pub fn set_capital(&mut self, hex: Hex) {
        if self.capital != Some(hex) {
            self.capital = Some(hex);
            self.dirty = true;
        }
    }

    pub fn capital(&self) -> Option<Hex> {
        self.capital
    }

    pub fn is_stale(&self, grid: &WorldGrid) -> bool {
        self.dirty
            || self.revision != Some(grid.infrastructure_revision())
            || self.costs.len() != grid.len()
    }

    /// Recomputes if marked dirty or if the grid's improvements changed since the
    /// last run. Returns whether a recalculation happened.
    pub fn update(&mut self, grid: &WorldGrid) -> bool {
        if !self.is_stale(grid) {
            return false;
        }
        self.recalculate(grid);
        true
    }

    pub fn cost_from_capital(&self, grid: &WorldGrid, hex: Hex) -> Option<u32> {
        let index = grid.index_of(hex)?;
        match self.costs.get(index).copied() {
            Some(DISCONNECTED) | None => None,
            Some(cost) => Some(cost),
        }
    }

    pub fn is_connected(&self, grid: &WorldGrid, hex: Hex) -> bool {
        self.cost_from_capital(grid, hex).is_some()
    }

    /// True if some neighbor of `hex` is connected.
    pub fn is_adjacent_to_network(&self, grid: &WorldGrid, hex: Hex) -> bool {
        hex.neighbors().any(|n| self.is_connected(grid, n))
    }

    pub fn connected_count(&self) -> usize {
        self.costs.iter().filter(|&&cost| cost != DISCONNECTED).count()
    }

    /// Raw per-cell costs in grid index order.
    pub fn costs(&self) -> &[u32] {
        &self.costs
    }

    fn recalculate(&mut self, grid: &WorldGrid) {
        self.costs = vec![DISCONNECTED; grid.len()];
        self.dirty = false;
        self.revision = Some(grid.infrastructure_revision());

        let pinned = self
            .capital
            .filter(|hex| grid.get(*hex).is_some_and(|tile| tile.has_improvement(ImprovementKind::Capital)));
        let capital = pinned.or_else(|| {
            grid.iter()
                .find(|(_, tile)| tile.has_improvement(ImprovementKind::Capital))
                .map(|(hex, _)| hex)
        });
        let Some(capital) = capital else {
            tracing::debug!("no capital on the map; network is empty");
            return;
        };
        self.capital = Some(capital);
        let Some(start) = grid.index_of(capital) else {
            return;
        };

        let ports: Vec<usize> = grid
            .iter()
            .enumerate()
            .filter(|(_, (_, tile))| tile.has_improvement(ImprovementKind::Port))
            .map(|(index, _)| index)
            .collect();

        let max_iterations = grid.len().saturating_mul(2);
        let mut iterations = 0usize;
        let mut ports_linked = false;

        self.costs[start] = 0;
        let mut heap: BinaryHeap<Reverse<(u32, usize)>> = BinaryHeap::new();
        heap.push(Reverse((0, start)));

        while let Some(Reverse((cost, index))) = heap.pop() {
            iterations += 1;
            if iterations > max_iterations {
                tracing::warn!(iterations, "network flood hit its iteration cap");
                break;
            }
            if cost != self.costs[index] {
                continue;
            }

            if !ports_linked
                && grid
                    .tile_at_index(index)
                    .is_some_and(|tile| tile.has_improvement(ImprovementKind::Port))
            {
                ports_linked = true;
                let hop = cost.saturating_add(1);
                for &port in ports.iter().filter(|&&port| port != index) {
                    if hop < self.costs[port] {
                        self.costs[port] = hop;
                        heap.push(Reverse((hop, port)));
                    }
                }
            }

            for neighbor in grid.neighbors_indices(index).into_iter().flatten() {
                let eligible = grid
                    .tile_at_index(neighbor)
                    .and_then(|tile| tile.improvement_kind())
                    .is_some_and(ImprovementKind::is_transport_eligible);
                if !eligible {
                    continue;
                }
                let new_cost = cost.saturating_add(1);
                if new_cost < self.costs[neighbor] {
                    self.costs[neighbor] = new_cost;
                    heap.push(Reverse((new_cost, neighbor)));
                }
            }
        }

        tracing::info!(
            capital = %capital,
            connected = self.connected_count(),
            "transport network recalculated"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexwork_protocol::{TerrainKind, TileImprovement, TilePatch};

    fn build(grid: &mut WorldGrid, hex: Hex, kind: ImprovementKind) {
        grid.set(
            hex,
            TilePatch::default().improvement(Some(TileImprovement::new(kind))),
        )
        .unwrap();
    }

    #[test]
    fn capital_is_found_and_costs_zero() {
        let mut grid = WorldGrid::new(6, 4, TerrainKind::Plains);
        build(&mut grid, Hex::new(2, 1), ImprovementKind::Capital);
        build(&mut grid, Hex::new(3, 1), ImprovementKind::Road);
        build(&mut grid, Hex::new(4, 1), ImprovementKind::Farm);

        let mut network = TransportNetwork::new();
        assert!(network.update(&grid));
        assert_eq!(network.capital(), Some(Hex::new(2, 1)));
        assert_eq!(network.cost_from_capital(&grid, Hex::new(2, 1)), Some(0));
        assert_eq!(network.cost_from_capital(&grid, Hex::new(3, 1)), Some(1));
        assert_eq!(network.cost_from_capital(&grid, Hex::new(4, 1)), Some(2));
        assert!(!network.is_connected(&grid, Hex::new(0, 0)));
        assert!(network.is_adjacent_to_network(&grid, Hex::new(5, 1)));
        assert_eq!(network.connected_count(), 3);
    }

    #[test]
    fn gaps_leave_the_sentinel() {
        let mut grid = WorldGrid::new(6, 1, TerrainKind::Plains);
        build(&mut grid, Hex::new(0, 0), ImprovementKind::Capital);
        build(&mut grid, Hex::new(2, 0), ImprovementKind::Road);

        let mut network = TransportNetwork::new();
        network.update(&grid);
        let index = grid.index_of(Hex::new(2, 0)).unwrap();
        assert_eq!(network.costs()[index], DISCONNECTED);
    }

    #[test]
    fn first_port_links_every_other_port() {
        let mut grid = WorldGrid::new(12, 1, TerrainKind::Plains);
        build(&mut grid, Hex::new(0, 0), ImprovementKind::Capital);
        build(&mut grid, Hex::new(1, 0), ImprovementKind::Road);
        build(&mut grid, Hex::new(2, 0), ImprovementKind::Port);
        build(&mut grid, Hex::new(7, 0), ImprovementKind::Port);
        build(&mut grid, Hex::new(10, 0), ImprovementKind::Port);
        build(&mut grid, Hex::new(11, 0), ImprovementKind::Road);

        let mut network = TransportNetwork::new();
        network.update(&grid);
        let first = network.cost_from_capital(&grid, Hex::new(2, 0)).unwrap();
        assert_eq!(first, 2);
        assert_eq!(network.cost_from_capital(&grid, Hex::new(7, 0)), Some(first + 1));
        assert_eq!(network.cost_from_capital(&grid, Hex::new(10, 0)), Some(first + 1));
        assert_eq!(network.cost_from_capital(&grid, Hex::new(11, 0)), Some(first + 2));
    }

    #[test]
    fn sea_lanes_open_once_per_recalculation() {
        let mut grid = WorldGrid::new(8, 4, TerrainKind::Plains);
        build(&mut grid, Hex::new(0, 0), ImprovementKind::Capital);
        build(&mut grid, Hex::new(1, 0), ImprovementKind::Road);
        // Two ports reached overland at the same cost.
        build(&mut grid, Hex::new(2, 0), ImprovementKind::Port);
        build(&mut grid, Hex::new(1, 1), ImprovementKind::Port);
        // Far ports, one of them also reachable along a longer road.
        build(&mut grid, Hex::new(5, 3), ImprovementKind::Port);
        build(&mut grid, Hex::new(4, 3), ImprovementKind::Road);
        build(&mut grid, Hex::new(3, 3), ImprovementKind::Port);

        let mut network = TransportNetwork::new();
        network.update(&grid);
        let cost = |hex: Hex| network.cost_from_capital(&grid, hex);
        assert_eq!(cost(Hex::new(2, 0)), Some(2));
        assert_eq!(cost(Hex::new(1, 1)), Some(2));
        assert_eq!(cost(Hex::new(5, 3)), Some(3));
        assert_eq!(cost(Hex::new(3, 3)), Some(3));
        assert_eq!(cost(Hex::new(4, 3)), Some(4));

        network.mark_dirty();
        network.update(&grid);
        assert_eq!(network.cost_from_capital(&grid, Hex::new(5, 3)), Some(3));
        assert_eq!(network.cost_from_capital(&grid, Hex::new(3, 3)), Some(3));
    }

    #[test]
    fn grid_edits_invalidate_without_mark_dirty() {
        let mut grid = WorldGrid::new(5, 1, TerrainKind::Plains);
        build(&mut grid, Hex::new(0, 0), ImprovementKind::Capital);
        let mut network = TransportNetwork::new();
        network.update(&grid);
        assert!(!network.update(&grid));

        build(&mut grid, Hex::new(1, 0), ImprovementKind::Road);
        assert!(network.is_stale(&grid));
        assert!(network.update(&grid));
        assert!(network.is_connected(&grid, Hex::new(1, 0)));
    }

    #[test]
    fn repeated_updates_agree() {
        let mut grid = WorldGrid::new(5, 5, TerrainKind::Plains);
        build(&mut grid, Hex::new(1, 1), ImprovementKind::Capital);
        build(&mut grid, Hex::new(2, 1), ImprovementKind::Depot);
        let mut network = TransportNetwork::new();
        network.mark_dirty();
        network.update(&grid);
        let first = network.costs().to_vec();
        network.mark_dirty();
        network.update(&grid);
        assert_eq!(network.costs(), first.as_slice());
    }

    #[test]
    fn no_capital_means_nothing_connected() {
        let mut grid = WorldGrid::new(3, 3, TerrainKind::Plains);
        build(&mut grid, Hex::new(1, 1), ImprovementKind::Road);
        let mut network = TransportNetwork::new();
        network.update(&grid);
        assert_eq!(network.connected_count(), 0);
        assert_eq!(network.capital(), None);
    }
}
