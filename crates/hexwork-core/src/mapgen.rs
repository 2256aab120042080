//! Seeded map generation for self-play and tests.
//!
//! Terrain comes from two smoothed noise layers (elevation and moisture) on an
//! odd-r grid with a water rim. The capital sits on the land tile nearest the
//! center, a port goes on the closest coast, and the capital's surroundings
//! are owned by the generating player.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use hexwork_protocol::{
    Hex, ImprovementKind, OffsetCoord, PlayerId, ResourceKind, TerrainKind, TileImprovement,
    TilePatch,
};

use crate::map::{GridError, WorldGrid};
use crate::rules::Rules;

#[derive(Clone, Debug)]
pub struct MapGenConfig {
    pub width: u32,
    pub height: u32,
    pub seed: u64,
    /// Fraction of tiles that should be water (0.0-1.0), rim included.
    pub water_ratio: f32,
    /// Fraction of land that should be mountains.
    pub mountain_ratio: f32,
    /// Chance that a land tile carries a resource.
    pub resource_density: f32,
    /// Chance that a mineral deposit starts hidden.
    pub hidden_ratio: f32,
    /// Tiles within this distance of the capital belong to `player`.
    pub territory_radius: i32,
    pub player: PlayerId,
}

impl Default for MapGenConfig {
    fn default() -> Self {
        Self {
            width: 32,
            height: 24,
            seed: 7,
            water_ratio: 0.3,
            mountain_ratio: 0.08,
            resource_density: 0.15,
            hidden_ratio: 0.8,
            territory_radius: 6,
            player: PlayerId(1),
        }
    }
}

pub struct GeneratedMap {
    pub grid: WorldGrid,
    pub capital: Hex,
    /// None when the capital's landmass has no coast.
    pub port: Option<Hex>,
    pub player: PlayerId,
}

/// Resources guaranteed near the capital, with the terrain each is placed on.
const STARTERS: [(ResourceKind, TerrainKind); 4] = [
    (ResourceKind::Grain, TerrainKind::Plains),
    (ResourceKind::Timber, TerrainKind::Forest),
    (ResourceKind::Coal, TerrainKind::Hills),
    (ResourceKind::Iron, TerrainKind::Hills),
];

pub fn generate_map(rules: &Rules, config: &MapGenConfig) -> GeneratedMap {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let width = config.width.max(3);
    let height = config.height.max(3);

    let elevation = noise_layer(width, height, &mut rng, 4, 0.55);
    let moisture = noise_layer(width, height, &mut rng, 3, 0.5);
    let terrain = shape_terrain(width, height, &elevation, &moisture, config);

    let mut grid = WorldGrid::new(width, height, TerrainKind::Plains);
    for (index, kind) in terrain.iter().enumerate() {
        if let Some(hex) = grid.hex_at_index(index) {
            write(&mut grid, hex, TilePatch::default().terrain(*kind));
        }
    }

    let capital = site_capital(&mut grid);
    write(
        &mut grid,
        capital,
        TilePatch::default()
            .resource(None)
            .improvement(Some(TileImprovement::new(ImprovementKind::Capital))),
    );
    let port = site_port(&mut grid, capital);

    scatter_resources(&mut grid, rules, &mut rng, config);
    place_starters(&mut grid, capital);

    let territory: Vec<Hex> = capital
        .range(config.territory_radius.max(1))
        .filter(|hex| grid.is_valid(*hex))
        .collect();
    for hex in territory {
        write(&mut grid, hex, TilePatch::default().owner(Some(config.player)));
    }
    if let Some(port) = port {
        write(&mut grid, port, TilePatch::default().owner(Some(config.player)));
    }

    grid.drain_changes();
    tracing::info!(
        width,
        height,
        seed = config.seed,
        capital = %capital,
        port = ?port,
        "map generated"
    );
    GeneratedMap {
        grid,
        capital,
        port,
        player: config.player,
    }
}

/// Writes inside the generator only touch valid hexes.
fn write(grid: &mut WorldGrid, hex: Hex, patch: TilePatch) {
    if let Err(GridError::OutOfBounds(hex)) = grid.set(hex, patch) {
        tracing::debug!(hex = %hex, "generator write outside the grid");
    }
}

/// Smoothed value noise in [0, 1], indexed like the grid (row-major offset).
fn noise_layer(width: u32, height: u32, rng: &mut StdRng, octaves: u32, persistence: f32) -> Vec<f32> {
    let size = (width * height) as usize;
    let mut result = vec![0.0f32; size];
    let mut amplitude = 1.0f32;
    let mut total_amplitude = 0.0f32;

    for octave in 0..octaves {
        let cells = 2u32 << octave;
        let lattice_w = cells + 1;
        let lattice: Vec<f32> = (0..lattice_w * (cells + 1)).map(|_| rng.gen::<f32>()).collect();
        let at = |gx: u32, gy: u32| lattice[(gy * lattice_w + gx) as usize];

        for y in 0..height {
            for x in 0..width {
                let fx = x as f32 / width as f32 * cells as f32;
                let fy = y as f32 / height as f32 * cells as f32;
                let (x0, y0) = (fx.floor() as u32, fy.floor() as u32);
                let (sx, sy) = (smooth(fx - x0 as f32), smooth(fy - y0 as f32));
                let top = lerp(at(x0, y0), at(x0 + 1, y0), sx);
                let bottom = lerp(at(x0, y0 + 1), at(x0 + 1, y0 + 1), sx);
                result[(y * width + x) as usize] += lerp(top, bottom, sy) * amplitude;
            }
        }
        total_amplitude += amplitude;
        amplitude *= persistence;
    }

    for value in &mut result {
        *value /= total_amplitude;
    }
    result
}

fn smooth(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Value below which `fraction` of `values` fall.
fn percentile(values: &[f32], fraction: f32) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f32::total_cmp);
    let index = ((fraction.clamp(0.0, 1.0) * sorted.len() as f32) as usize).min(sorted.len() - 1);
    sorted[index]
}

fn shape_terrain(
    width: u32,
    height: u32,
    elevation: &[f32],
    moisture: &[f32],
    config: &MapGenConfig,
) -> Vec<TerrainKind> {
    let is_rim = |index: usize| {
        let (x, y) = (index as u32 % width, index as u32 / width);
        x == 0 || y == 0 || x + 1 == width || y + 1 == height
    };
    let rim = (0..elevation.len()).filter(|i| is_rim(*i)).count() as f32;
    let inner_water = (config.water_ratio * elevation.len() as f32 - rim).max(0.0);
    let interior: Vec<f32> = (0..elevation.len())
        .filter(|i| !is_rim(*i))
        .map(|i| elevation[i])
        .collect();
    let sea_level = if inner_water <= 0.0 {
        f32::NEG_INFINITY
    } else {
        percentile(&interior, inner_water / interior.len().max(1) as f32)
    };
    let land: Vec<f32> = interior.iter().copied().filter(|e| *e >= sea_level).collect();
    let peak_level = percentile(&land, 1.0 - config.mountain_ratio);
    let hill_level = percentile(&land, 1.0 - config.mountain_ratio * 2.5);

    (0..elevation.len())
        .map(|index| {
            let elev = elevation[index];
            if is_rim(index) || elev < sea_level {
                return TerrainKind::Water;
            }
            if config.mountain_ratio > 0.0 && elev >= peak_level {
                return TerrainKind::Mountain;
            }
            if config.mountain_ratio > 0.0 && elev >= hill_level {
                return TerrainKind::Hills;
            }
            let row = index as u32 / width;
            let latitude = (row as f32 / height as f32) * 2.0 - 1.0;
            let moist = moisture[index];
            if latitude.abs() > 0.8 {
                TerrainKind::Tundra
            } else if moist > 0.72 {
                TerrainKind::Swamp
            } else if moist > 0.58 {
                TerrainKind::Forest
            } else if moist > 0.42 {
                TerrainKind::Grassland
            } else {
                TerrainKind::Plains
            }
        })
        .collect()
}

fn center(grid: &WorldGrid) -> Hex {
    Hex::from_offset(OffsetCoord {
        col: grid.width() as i32 / 2,
        row: grid.height() as i32 / 2,
    })
}

/// Flat land nearest the center; the center itself is cleared if nothing qualifies.
fn site_capital(grid: &mut WorldGrid) -> Hex {
    let middle = center(grid);
    let best = grid
        .iter()
        .filter(|(_, tile)| {
            matches!(
                tile.terrain,
                TerrainKind::Plains | TerrainKind::Grassland | TerrainKind::Hills
            )
        })
        .min_by_key(|(hex, _)| hex.distance(middle))
        .map(|(hex, _)| hex);
    match best {
        Some(hex) => hex,
        None => {
            write(grid, middle, TilePatch::default().terrain(TerrainKind::Plains));
            middle
        }
    }
}

fn is_coastal(grid: &WorldGrid, hex: Hex) -> bool {
    hex.neighbors()
        .any(|n| grid.get(n).is_some_and(|tile| tile.is_water()))
}

fn site_port(grid: &mut WorldGrid, capital: Hex) -> Option<Hex> {
    let shore: &WorldGrid = grid;
    let port = shore
        .iter()
        .filter(|(hex, tile)| {
            *hex != capital
                && !tile.is_water()
                && tile.terrain != TerrainKind::Mountain
                && is_coastal(shore, *hex)
        })
        .min_by_key(|(hex, _)| hex.distance(capital))
        .map(|(hex, _)| hex)?;
    write(
        grid,
        port,
        TilePatch::default()
            .resource(None)
            .improvement(Some(TileImprovement::new(ImprovementKind::Port))),
    );
    Some(port)
}

fn resources_for(terrain: TerrainKind) -> &'static [ResourceKind] {
    use ResourceKind::*;
    match terrain {
        TerrainKind::Water => &[Fish],
        TerrainKind::Plains => &[Grain, Cotton, Horses, Livestock, Tobacco],
        TerrainKind::Grassland => &[Grain, Fruit, Wool, Livestock, Tea],
        TerrainKind::Hills => &[Coal, Iron, Copper, Sulfur, Wool],
        TerrainKind::Forest => &[Timber, Timber, Rubber, Spices],
        TerrainKind::Mountain => &[Gold, Gems, Iron, Copper],
        TerrainKind::Swamp => &[Sugar, Oil, Rubber],
        TerrainKind::Tundra => &[Oil, Timber, Wool],
    }
}

fn scatter_resources(grid: &mut WorldGrid, rules: &Rules, rng: &mut StdRng, config: &MapGenConfig) {
    let mut placements = Vec::new();
    for (hex, tile) in grid.iter() {
        if tile.improvement.is_some() {
            continue;
        }
        // Open sea stays empty; fish only near land.
        if tile.is_water() && !hex.neighbors().any(|n| grid.get(n).is_some_and(|t| !t.is_water())) {
            continue;
        }
        if rng.gen::<f32>() >= config.resource_density {
            continue;
        }
        let Some(resource) = resources_for(tile.terrain).choose(rng).copied() else {
            continue;
        };
        if !tile.is_water() && rules.resource(resource).improvement.is_none() {
            continue;
        }
        let hidden = resource.is_mineral() && rng.gen::<f32>() < config.hidden_ratio;
        placements.push((hex, resource, hidden));
    }
    for (hex, resource, hidden) in placements {
        write(
            grid,
            hex,
            TilePatch::default().resource(Some(resource)).hidden(hidden),
        );
    }
}

/// Makes sure each starter resource is visible within three tiles of the capital.
fn place_starters(grid: &mut WorldGrid, capital: Hex) {
    for (resource, terrain) in STARTERS {
        let present = capital.range(3).any(|hex| {
            grid.get(hex)
                .is_some_and(|tile| tile.known_resource() == Some(resource))
        });
        if present {
            continue;
        }
        let spot = capital
            .range(3)
            .filter(|hex| hex.distance(capital) >= 2)
            .filter(|hex| {
                grid.get(*hex).is_some_and(|tile| {
                    !tile.is_water() && tile.improvement.is_none() && tile.resource.is_none()
                })
            })
            .min_by_key(|hex| (hex.distance(capital), *hex));
        let Some(spot) = spot else {
            tracing::debug!(resource = resource.name(), "no room for starter resource");
            continue;
        };
        write(
            grid,
            spot,
            TilePatch::default()
                .terrain(terrain)
                .resource(Some(resource))
                .hidden(false),
        );
    }
}
