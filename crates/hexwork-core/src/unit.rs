use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use hexwork_protocol::{Hex, ResourceCategory, ResourceKind, TerrainKind, UnitId, UnitRole};

use crate::map::Tile;
use crate::movement::MoveProfile;
use crate::rules::Rules;

/// Narrows which tiles an automated unit will consider.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum TargetFilter {
    #[default]
    Any,
    Terrain(TerrainKind),
    Resource(ResourceKind),
    Category(ResourceCategory),
}

impl TargetFilter {
    pub fn matches(self, tile: &Tile) -> bool {
        match self {
            TargetFilter::Any => true,
            TargetFilter::Terrain(terrain) => tile.terrain == terrain,
            TargetFilter::Resource(resource) => tile.known_resource() == Some(resource),
            TargetFilter::Category(category) => tile
                .known_resource()
                .is_some_and(|resource| resource.category() == category),
        }
    }

    /// Whether a unit of `role` may be given this filter.
    pub fn allowed_for(self, role: UnitRole) -> bool {
        match (role, self) {
            (_, TargetFilter::Any) => true,
            (UnitRole::Engineer, _) => true,
            (UnitRole::Prospector, TargetFilter::Terrain(_)) => true,
            (role, TargetFilter::Resource(_)) => role.is_improver(),
            _ => false,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Unit {
    pub role: UnitRole,
    pub position: Hex,
    pub moves_left: u32,
    pub max_moves: u32,
    pub target: Option<Hex>,
    pub automated: bool,
    pub filter: TargetFilter,
    /// Targets that failed pathfinding during the current automation session.
    #[serde(skip)]
    unreachable: HashSet<u64>,
}

impl Unit {
    pub fn new(role: UnitRole, position: Hex, rules: &Rules) -> Self {
        let max_moves = rules.role(role).moves;
        Self {
            role,
            position,
            moves_left: max_moves,
            max_moves,
            target: None,
            automated: false,
            filter: TargetFilter::Any,
            unreachable: HashSet::new(),
        }
    }

    pub fn profile(&self, rules: &Rules) -> MoveProfile {
        MoveProfile {
            max_moves: self.max_moves,
            climbs_mountains: rules.role(self.role).climbs_mountains,
        }
    }

    pub fn spend(&mut self, cost: u32) {
        self.moves_left = self.moves_left.saturating_sub(cost);
    }

    /// Building ends the unit's turn.
    pub fn exhaust(&mut self) {
        self.moves_left = 0;
    }

    pub fn reset_moves(&mut self) {
        self.moves_left = self.max_moves;
    }

    pub fn mark_unreachable(&mut self, hex: Hex) {
        self.unreachable.insert(hex.pack());
    }

    pub fn is_unreachable(&self, hex: Hex) -> bool {
        self.unreachable.contains(&hex.pack())
    }

    pub fn unreachable(&self) -> &HashSet<u64> {
        &self.unreachable
    }

    pub fn clear_unreachable(&mut self) {
        self.unreachable.clear();
    }
}

#[derive(Clone, Debug)]
struct Slot {
    generation: u32,
    unit: Option<Unit>,
}

/// Generational unit storage. Iteration is in ascending slot order.
#[derive(Clone, Debug, Default)]
pub struct UnitRoster {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl UnitRoster {
    pub fn recruit(&mut self, unit: Unit) -> UnitId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.unit = Some(unit);
            UnitId::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                unit: Some(unit),
            });
            UnitId::new(index, 0)
        }
    }

    pub fn disband(&mut self, id: UnitId) -> Option<Unit> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let unit = slot.unit.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Some(unit)
    }

    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation == id.generation {
            slot.unit.as_ref()
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation == id.generation {
            slot.unit.as_mut()
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (UnitId, &Unit)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            let unit = slot.unit.as_ref()?;
            Some((UnitId::new(index as u32, slot.generation), unit))
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (UnitId, &mut Unit)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(index, slot)| {
                let unit = slot.unit.as_mut()?;
                Some((UnitId::new(index as u32, slot.generation), unit))
            })
    }

    pub fn ids(&self) -> Vec<UnitId> {
        self.iter().map(|(id, _)| id).collect()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
