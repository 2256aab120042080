use serde::{Deserialize, Serialize};
use thiserror::Error;

use hexwork_protocol::{
    Hex, ImprovementKind, OffsetCoord, PlayerId, ResourceKind, TerrainKind, TileChange,
    TileImprovement, TilePatch,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub terrain: TerrainKind,
    pub resource: Option<ResourceKind>,
    pub improvement: Option<TileImprovement>,
    pub owner: Option<PlayerId>,
    /// A resource is present but not yet discovered.
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub prospected: bool,
}

impl Tile {
    pub fn new(terrain: TerrainKind) -> Self {
        Self {
            terrain,
            resource: None,
            improvement: None,
            owner: None,
            hidden: false,
            prospected: false,
        }
    }

    pub fn is_water(&self) -> bool {
        self.terrain.is_water()
    }

    pub fn improvement_kind(&self) -> Option<ImprovementKind> {
        self.improvement.map(|imp| imp.kind)
    }

    /// 0 when nothing is built.
    pub fn level(&self) -> u8 {
        self.improvement.map_or(0, |imp| imp.level)
    }

    pub fn has_improvement(&self, kind: ImprovementKind) -> bool {
        self.improvement_kind() == Some(kind)
    }

    pub fn has_infrastructure(&self) -> bool {
        self.improvement_kind()
            .is_some_and(ImprovementKind::is_infrastructure)
    }

    /// The resource as seen by the empire: hidden deposits read as absent.
    pub fn known_resource(&self) -> Option<ResourceKind> {
        if self.hidden {
            None
        } else {
            self.resource
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("hex {0} is outside the grid")]
    OutOfBounds(Hex),
}

/// Rectangular odd-r tile storage. Scan order is row-major over offset coordinates.
#[derive(Clone, Debug)]
pub struct WorldGrid {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
    revealed: Vec<bool>,
    changes: Vec<TileChange>,
    infrastructure_revision: u64,
}

impl WorldGrid {
    pub fn new(width: u32, height: u32, terrain: TerrainKind) -> Self {
        let len = (width as usize) * (height as usize);
        Self {
            width,
            height,
            tiles: vec![Tile::new(terrain); len],
            revealed: vec![false; len],
            changes: Vec::new(),
            infrastructure_revision: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn is_valid(&self, hex: Hex) -> bool {
        self.index_of(hex).is_some()
    }

    pub fn index_of(&self, hex: Hex) -> Option<usize> {
        let OffsetCoord { col, row } = hex.to_offset();
        if col < 0 || row < 0 || col >= self.width as i32 || row >= self.height as i32 {
            return None;
        }
        Some(row as usize * self.width as usize + col as usize)
    }

    pub fn hex_at_index(&self, index: usize) -> Option<Hex> {
        if index >= self.tiles.len() {
            return None;
        }
        let col = (index % self.width as usize) as i32;
        let row = (index / self.width as usize) as i32;
        Some(Hex::from_offset(OffsetCoord { col, row }))
    }

    pub fn neighbors_indices(&self, index: usize) -> [Option<usize>; 6] {
        let Some(hex) = self.hex_at_index(index) else {
            return [None; 6];
        };
        let mut out = [None; 6];
        for (i, dir) in Hex::DIRECTIONS.into_iter().enumerate() {
            out[i] = self.index_of(hex + dir);
        }
        out
    }

    /// Tile indices within `radius` of `center` (inclusive), in ascending index order.
    pub fn indices_in_radius(&self, center: Hex, radius: i32) -> Vec<usize> {
        if !self.is_valid(center) {
            return Vec::new();
        }
        let mut out: Vec<usize> = center
            .range(radius.max(0))
            .filter_map(|hex| self.index_of(hex))
            .collect();
        out.sort_unstable();
        out
    }

    pub fn get(&self, hex: Hex) -> Option<&Tile> {
        self.index_of(hex).map(|index| &self.tiles[index])
    }

    pub fn tile_at_index(&self, index: usize) -> Option<&Tile> {
        self.tiles.get(index)
    }

    /// Every tile with its coordinate, row-major.
    pub fn iter(&self) -> impl Iterator<Item = (Hex, &Tile)> + '_ {
        let width = self.width as usize;
        self.tiles.iter().enumerate().map(move |(index, tile)| {
            let col = (index % width) as i32;
            let row = (index / width) as i32;
            (Hex::from_offset(OffsetCoord { col, row }), tile)
        })
    }

    /// Applies the supplied fields and records a notification carrying exactly
    /// the fields that were written. A revealed coordinate cannot be re-hidden;
    /// such a `hidden: true` field is dropped from the patch.
    pub fn set(&mut self, hex: Hex, mut patch: TilePatch) -> Result<TileChange, GridError> {
        let index = self.index_of(hex).ok_or(GridError::OutOfBounds(hex))?;

        if patch.hidden == Some(true) && self.revealed[index] {
            tracing::debug!(hex = %hex, "ignoring attempt to re-hide a revealed tile");
            patch.hidden = None;
        }

        let tile = &mut self.tiles[index];
        if let Some(terrain) = patch.terrain {
            tile.terrain = terrain;
        }
        if let Some(resource) = patch.resource {
            tile.resource = resource;
        }
        if let Some(improvement) = patch.improvement {
            if tile.improvement != improvement {
                self.infrastructure_revision += 1;
            }
            tile.improvement = improvement;
        }
        if let Some(owner) = patch.owner {
            tile.owner = owner;
        }
        if let Some(hidden) = patch.hidden {
            if tile.hidden && !hidden {
                self.revealed[index] = true;
            }
            tile.hidden = hidden;
        }
        if let Some(prospected) = patch.prospected {
            tile.prospected = prospected;
        }

        let change = TileChange { hex, patch };
        if !change.patch.is_empty() {
            self.changes.push(change.clone());
        }
        Ok(change)
    }

    /// Reveals a hidden deposit. Returns the resource if one was uncovered.
    pub fn discover(&mut self, hex: Hex) -> Result<Option<ResourceKind>, GridError> {
        let tile = self.get(hex).ok_or(GridError::OutOfBounds(hex))?;
        if !tile.hidden {
            return Ok(None);
        }
        let found = tile.resource;
        self.set(hex, TilePatch::default().hidden(false))?;
        Ok(found)
    }

    /// True once a hidden deposit at `hex` has been revealed.
    pub fn is_revealed(&self, hex: Hex) -> bool {
        self.index_of(hex).is_some_and(|index| self.revealed[index])
    }

    /// Bumped on every improvement change; cheap staleness check for caches.
    pub fn infrastructure_revision(&self) -> u64 {
        self.infrastructure_revision
    }

    pub fn drain_changes(&mut self) -> Vec<TileChange> {
        std::mem::take(&mut self.changes)
    }
}
