//! Budget-bounded reachability and path search over the world grid.
//!
//! All searches use the same per-tile entry cost (`movement::entry_cost`) and
//! return paths that exclude the start and end at the target.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};

use hexwork_protocol::Hex;

use crate::map::WorldGrid;
use crate::movement::{entry_cost, MoveProfile};
use crate::rules::Rules;

/// Hexes a unit can enter this turn, with the cheapest cost to each.
/// The origin is never a member.
#[derive(Clone, Debug, Default)]
pub struct Reachable {
    origin: Hex,
    budget: u32,
    costs: HashMap<u64, u32>,
}

impl Reachable {
    pub fn origin(&self) -> Hex {
        self.origin
    }

    pub fn budget(&self) -> u32 {
        self.budget
    }

    pub fn contains(&self, hex: Hex) -> bool {
        self.costs.contains_key(&hex.pack())
    }

    pub fn cost_to(&self, hex: Hex) -> Option<u32> {
        self.costs.get(&hex.pack()).copied()
    }

    pub fn len(&self) -> usize {
        self.costs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.costs.is_empty()
    }

    /// Members in ascending coordinate order.
    pub fn hexes(&self) -> Vec<Hex> {
        let mut out: Vec<Hex> = self.costs.keys().map(|&key| Hex::unpack(key)).collect();
        out.sort_unstable();
        out
    }
}

pub fn reachable_within(
    grid: &WorldGrid,
    rules: &Rules,
    start: Hex,
    profile: MoveProfile,
    budget: u32,
) -> Reachable {
    let mut reachable = Reachable {
        origin: start,
        budget,
        costs: HashMap::new(),
    };
    let Some(start_index) = grid.index_of(start) else {
        return reachable;
    };

    let (dist, _) = bounded_dijkstra(grid, rules, start_index, profile, budget, None);
    for (index, cost) in dist.into_iter().enumerate() {
        if index == start_index || cost == u32::MAX {
            continue;
        }
        if let Some(hex) = grid.hex_at_index(index) {
            reachable.costs.insert(hex.pack(), cost);
        }
    }
    reachable
}

/// Cheapest path to a member of a previously computed reachable set.
/// A target outside the set fails without searching.
pub fn path_within(
    grid: &WorldGrid,
    rules: &Rules,
    reachable: &Reachable,
    profile: MoveProfile,
    target: Hex,
) -> Option<Vec<Hex>> {
    if !reachable.contains(target) {
        tracing::debug!(target = %target, "target outside reachable set");
        return None;
    }
    let start_index = grid.index_of(reachable.origin)?;
    let goal_index = grid.index_of(target)?;

    let (dist, prev) = bounded_dijkstra(
        grid,
        rules,
        start_index,
        profile,
        reachable.budget,
        Some(goal_index),
    );
    if dist[goal_index] == u32::MAX {
        return None;
    }
    let indices = reconstruct_prev_path(&prev, start_index, goal_index);
    if indices.is_empty() {
        return None;
    }
    indices
        .into_iter()
        .map(|index| grid.hex_at_index(index))
        .collect()
}

#[derive(Debug)]
struct OpenNode {
    f: u32,
    g: u32,
    index: usize,
    tie: u64,
}

impl OpenNode {
    fn key(&self) -> (u32, u32, u64) {
        (self.f, self.g, self.tie)
    }
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for OpenNode {}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the max-heap pops the lowest f first.
        other.key().cmp(&self.key())
    }
}

/// A* over the whole grid, ignoring the unit's remaining budget.
///
/// The heuristic is hex distance times the cheapest possible step, which keeps
/// it admissible. Running past the iteration cap or producing a path longer
/// than the length cap both count as "no path".
pub fn best_path(
    grid: &WorldGrid,
    rules: &Rules,
    start: Hex,
    target: Hex,
    profile: MoveProfile,
) -> Option<Vec<Hex>> {
    let start_index = grid.index_of(start)?;
    let goal_index = grid.index_of(target)?;
    if start_index == goal_index {
        return Some(Vec::new());
    }
    let goal_tile = grid.tile_at_index(goal_index)?;
    entry_cost(goal_tile, profile, rules)?;

    let min_step = rules.movement.min_step_cost();
    let heuristic = |hex: Hex| (hex.distance(target).max(0) as u32).saturating_mul(min_step);

    let mut g_score = vec![u32::MAX; grid.len()];
    let mut came_from: Vec<Option<usize>> = vec![None; grid.len()];
    let mut open = BinaryHeap::new();
    let mut tie: u64 = 0;

    g_score[start_index] = 0;
    open.push(OpenNode {
        f: heuristic(start),
        g: 0,
        index: start_index,
        tie,
    });

    let mut iterations = 0usize;
    while let Some(node) = open.pop() {
        if node.g != g_score[node.index] {
            continue;
        }
        if node.index == goal_index {
            break;
        }
        iterations += 1;
        if iterations > rules.search.max_path_iterations {
            tracing::warn!(
                start = %start,
                target = %target,
                iterations,
                "path search hit its iteration cap"
            );
            return None;
        }

        for neighbor in grid.neighbors_indices(node.index).into_iter().flatten() {
            let Some(tile) = grid.tile_at_index(neighbor) else {
                continue;
            };
            let Some(step) = entry_cost(tile, profile, rules) else {
                continue;
            };
            let tentative = node.g.saturating_add(step);
            if tentative >= g_score[neighbor] {
                continue;
            }
            g_score[neighbor] = tentative;
            came_from[neighbor] = Some(node.index);
            let Some(hex) = grid.hex_at_index(neighbor) else {
                continue;
            };
            tie += 1;
            open.push(OpenNode {
                f: tentative.saturating_add(heuristic(hex)),
                g: tentative,
                index: neighbor,
                tie,
            });
        }
    }

    if g_score[goal_index] == u32::MAX {
        return None;
    }
    let indices = reconstruct_prev_path(&came_from, start_index, goal_index);
    if indices.is_empty() {
        return None;
    }
    if indices.len() > rules.search.max_path_length {
        tracing::warn!(
            start = %start,
            target = %target,
            length = indices.len(),
            "path exceeds the length cap"
        );
        return None;
    }
    indices
        .into_iter()
        .map(|index| grid.hex_at_index(index))
        .collect()
}

/// Total entry cost of walking `path` (start excluded).
pub fn path_cost(grid: &WorldGrid, rules: &Rules, path: &[Hex], profile: MoveProfile) -> Option<u32> {
    path.iter().try_fold(0u32, |acc, hex| {
        let step = entry_cost(grid.get(*hex)?, profile, rules)?;
        Some(acc.saturating_add(step))
    })
}

fn bounded_dijkstra(
    grid: &WorldGrid,
    rules: &Rules,
    start: usize,
    profile: MoveProfile,
    budget: u32,
    stop_at: Option<usize>,
) -> (Vec<u32>, Vec<Option<usize>>) {
    let mut dist = vec![u32::MAX; grid.len()];
    let mut prev = vec![None; grid.len()];
    dist[start] = 0;

    let mut heap: BinaryHeap<Reverse<(u32, usize)>> = BinaryHeap::new();
    heap.push(Reverse((0, start)));

    while let Some(Reverse((cost, index))) = heap.pop() {
        if cost != dist[index] {
            continue;
        }
        if stop_at == Some(index) {
            break;
        }

        for neighbor in grid.neighbors_indices(index).into_iter().flatten() {
            let Some(tile) = grid.tile_at_index(neighbor) else {
                continue;
            };
            let Some(step) = entry_cost(tile, profile, rules) else {
                continue;
            };
            let new_cost = cost.saturating_add(step);
            if new_cost > budget {
                continue;
            }
            if new_cost < dist[neighbor] {
                dist[neighbor] = new_cost;
                prev[neighbor] = Some(index);
                heap.push(Reverse((new_cost, neighbor)));
            }
        }
    }

    (dist, prev)
}

fn reconstruct_prev_path(prev: &[Option<usize>], start: usize, goal: usize) -> Vec<usize> {
    if start == goal {
        return Vec::new();
    }

    let mut indices = Vec::new();
    let mut cur = goal;
    while cur != start {
        indices.push(cur);
        let Some(p) = prev.get(cur).copied().flatten() else {
            return Vec::new();
        };
        cur = p;
    }
    indices.reverse();
    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexwork_protocol::{ImprovementKind, TerrainKind, TileImprovement, TilePatch, UnitRole};

    fn plains(width: u32, height: u32) -> WorldGrid {
        WorldGrid::new(width, height, TerrainKind::Plains)
    }

    fn profile(rules: &Rules, role: UnitRole) -> MoveProfile {
        MoveProfile::for_role(rules, role)
    }

    #[test]
    fn reachable_excludes_start_and_respects_budget() {
        let rules = Rules::default();
        let grid = plains(8, 8);
        let start = Hex::new(2, 3);
        let reach = reachable_within(&grid, &rules, start, profile(&rules, UnitRole::Miner), 10);
        assert!(!reach.contains(start));
        assert_eq!(reach.len(), 6);
        for hex in reach.hexes() {
            assert_eq!(hex.distance(start), 1);
            assert_eq!(reach.cost_to(hex), Some(10));
        }
    }

    #[test]
    fn roads_stretch_the_reachable_set() {
        let rules = Rules::default();
        let mut grid = plains(10, 3);
        for q in 1..6 {
            grid.set(
                Hex::new(q, 0),
                TilePatch::default().improvement(Some(TileImprovement::new(ImprovementKind::Road))),
            )
            .unwrap();
        }
        let reach = reachable_within(
            &grid,
            &rules,
            Hex::new(0, 0),
            profile(&rules, UnitRole::Farmer),
            10,
        );
        assert!(reach.contains(Hex::new(5, 0)));
        assert_eq!(reach.cost_to(Hex::new(5, 0)), Some(10));
        assert!(!reach.contains(Hex::new(6, 0)));
    }

    #[test]
    fn path_within_rejects_targets_outside_the_set() {
        let rules = Rules::default();
        let grid = plains(8, 8);
        let miner = profile(&rules, UnitRole::Miner);
        let reach = reachable_within(&grid, &rules, Hex::new(0, 0), miner, 10);
        assert_eq!(path_within(&grid, &rules, &reach, miner, Hex::new(3, 0)), None);
        assert_eq!(
            path_within(&grid, &rules, &reach, miner, Hex::new(1, 0)),
            Some(vec![Hex::new(1, 0)])
        );
    }

    #[test]
    fn best_path_walks_around_water() {
        let rules = Rules::default();
        let mut grid = plains(6, 6);
        for r in 0..5 {
            let hex = Hex::from_offset(hexwork_protocol::OffsetCoord { col: 2, row: r });
            grid.set(hex, TilePatch::default().terrain(TerrainKind::Water))
                .unwrap();
        }
        let start = Hex::new(0, 0);
        let goal = Hex::new(4, 0);
        let path = best_path(&grid, &rules, start, goal, profile(&rules, UnitRole::Farmer)).unwrap();
        assert_eq!(path.last(), Some(&goal));
        assert!(path.iter().all(|hex| !grid.get(*hex).unwrap().is_water()));
        let mut prev = start;
        for hex in &path {
            assert!(prev.is_adjacent(*hex));
            prev = *hex;
        }
    }

    #[test]
    fn best_path_prefers_roads() {
        let rules = Rules::default();
        let mut grid = plains(8, 4);
        // A road detour through row 1 beats walking straight across swamp.
        for q in 1..6 {
            grid.set(Hex::new(q, 0), TilePatch::default().terrain(TerrainKind::Swamp))
                .unwrap();
        }
        let road = Some(TileImprovement::new(ImprovementKind::Road));
        for q in 0..6 {
            grid.set(Hex::new(q, 1), TilePatch::default().improvement(road))
                .unwrap();
        }
        let farmer = profile(&rules, UnitRole::Farmer);
        let path = best_path(&grid, &rules, Hex::new(0, 0), Hex::new(6, 0), farmer).unwrap();
        let cost = path_cost(&grid, &rules, &path, farmer).unwrap();
        assert!(cost < 6 * 30);
        assert!(path.contains(&Hex::new(2, 1)));
    }

    #[test]
    fn unreachable_target_has_no_path() {
        let rules = Rules::default();
        let mut grid = plains(5, 5);
        let target = Hex::new(2, 2);
        for hex in target.neighbors() {
            grid.set(hex, TilePatch::default().terrain(TerrainKind::Water))
                .unwrap();
        }
        assert_eq!(
            best_path(&grid, &rules, Hex::new(0, 0), target, profile(&rules, UnitRole::Miner)),
            None
        );
    }

    #[test]
    fn caps_turn_long_searches_into_no_path() {
        let mut rules = Rules::default();
        let grid = plains(30, 3);
        let miner = profile(&rules, UnitRole::Miner);
        assert!(best_path(&grid, &rules, Hex::new(0, 0), Hex::new(20, 0), miner).is_some());

        rules.search.max_path_length = 5;
        assert_eq!(best_path(&grid, &rules, Hex::new(0, 0), Hex::new(20, 0), miner), None);

        rules.search.max_path_length = 256;
        rules.search.max_path_iterations = 3;
        assert_eq!(best_path(&grid, &rules, Hex::new(0, 0), Hex::new(20, 0), miner), None);
    }

    #[test]
    fn mountain_only_open_to_climbers() {
        let rules = Rules::default();
        let mut grid = plains(3, 1);
        grid.set(Hex::new(1, 0), TilePatch::default().terrain(TerrainKind::Mountain))
            .unwrap();
        let start = Hex::new(0, 0);
        let goal = Hex::new(2, 0);
        assert_eq!(
            best_path(&grid, &rules, start, goal, profile(&rules, UnitRole::Miner)),
            None
        );
        let engineer = profile(&rules, UnitRole::Engineer);
        assert_eq!(
            best_path(&grid, &rules, start, goal, engineer),
            Some(vec![Hex::new(1, 0), goal])
        );
    }
}
