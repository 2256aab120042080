//! Best-tile search and same-role reservations.
//!
//! Reservations are advisory: they are rebuilt from the roster on every query,
//! so two units choosing in the same pass may still pick the same tile.

use std::collections::HashSet;

use hexwork_protocol::{Hex, UnitId};

use crate::map::{Tile, WorldGrid};
use crate::unit::UnitRoster;

/// Packed hex keys (`Hex::pack`).
pub type HexSet = HashSet<u64>;

/// Highest-scoring valid land tile other than `origin` and the excluded hexes.
///
/// `score` returns `f32::NEG_INFINITY` (or NaN) to reject a tile. Ties keep the
/// first tile in row-major order.
pub fn find_best_target<F>(grid: &WorldGrid, origin: Hex, exclude: &HexSet, score: F) -> Option<Hex>
where
    F: FnMut(Hex, &Tile) -> f32,
{
    best_of(
        grid.iter().filter(|(_, tile)| !tile.is_water()),
        origin,
        exclude,
        score,
    )
}

/// Same as `find_best_target`, limited to tiles within `radius` of `origin`.
pub fn find_best_target_near<F>(
    grid: &WorldGrid,
    origin: Hex,
    radius: i32,
    exclude: &HexSet,
    score: F,
) -> Option<Hex>
where
    F: FnMut(Hex, &Tile) -> f32,
{
    let candidates = grid
        .indices_in_radius(origin, radius)
        .into_iter()
        .filter_map(|index| Some((grid.hex_at_index(index)?, grid.tile_at_index(index)?)))
        .filter(|(_, tile)| !tile.is_water());
    best_of(candidates, origin, exclude, score)
}

fn best_of<'a, I, F>(candidates: I, origin: Hex, exclude: &HexSet, mut score: F) -> Option<Hex>
where
    I: Iterator<Item = (Hex, &'a Tile)>,
    F: FnMut(Hex, &Tile) -> f32,
{
    let mut best: Option<(f32, Hex)> = None;
    for (hex, tile) in candidates {
        if hex == origin || exclude.contains(&hex.pack()) {
            continue;
        }
        let s = score(hex, tile);
        let s = if s.is_nan() { f32::NEG_INFINITY } else { s };
        if s == f32::NEG_INFINITY {
            continue;
        }
        if best.is_none_or(|(best_score, _)| s > best_score) {
            best = Some((s, hex));
        }
    }
    best.map(|(_, hex)| hex)
}

/// Targets held by other automated units of `me`'s role, each dilated by `radius`.
pub fn reserved_hexes(roster: &UnitRoster, me: UnitId, radius: i32) -> HexSet {
    let Some(role) = roster.get(me).map(|unit| unit.role) else {
        return HexSet::new();
    };
    let mut out = HexSet::new();
    for (id, unit) in roster.iter() {
        if id == me || !unit.automated || unit.role != role {
            continue;
        }
        let Some(target) = unit.target else {
            continue;
        };
        out.extend(target.range(radius.max(0)).map(Hex::pack));
    }
    out
}

pub fn colleague_targets(roster: &UnitRoster, me: UnitId) -> HexSet {
    reserved_hexes(roster, me, 0)
}
