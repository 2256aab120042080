use std::collections::BTreeMap;

use hexwork_protocol::{ImprovementKind, ResourceKind, TerrainKind, UnitRole, MAX_IMPROVEMENT_LEVEL};
use serde::Deserialize;

use crate::economy::Price;
use crate::rules::RulesError;

/// Compiled, validated rules. Every enum variant has an entry, so lookups never fail.
#[derive(Clone, Debug)]
pub struct Rules {
    pub movement: MovementRules,
    pub search: SearchLimits,
    pub scoring: ScoringWeights,
    pub needs: NeedsThresholds,
    roles: Vec<RoleRules>,
    improvements: Vec<ImprovementRules>,
    resources: Vec<ResourceRules>,
}

impl Rules {
    pub fn role(&self, role: UnitRole) -> &RoleRules {
        &self.roles[role as usize]
    }

    pub fn improvement(&self, kind: ImprovementKind) -> &ImprovementRules {
        &self.improvements[kind as usize]
    }

    pub fn resource(&self, kind: ResourceKind) -> &ResourceRules {
        &self.resources[kind as usize]
    }

    /// Flat entry cost for unimproved terrain; `None` for water and mountains,
    /// which the movement model handles separately.
    pub fn terrain_cost(&self, terrain: TerrainKind) -> Option<u32> {
        self.movement.terrain.get(&terrain).copied()
    }

    /// Improvement a resource is developed with, if any.
    pub fn improvement_for(&self, resource: ResourceKind) -> Option<ImprovementKind> {
        self.resource(resource).improvement
    }

    pub fn role_mut(&mut self, role: UnitRole) -> &mut RoleRules {
        &mut self.roles[role as usize]
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct MovementRules {
    pub infrastructure_cost: u32,
    pub improved_cost: u32,
    pub terrain: BTreeMap<TerrainKind, u32>,
}

impl MovementRules {
    /// Cheapest possible step; used to keep the A* heuristic admissible.
    pub fn min_step_cost(&self) -> u32 {
        self.infrastructure_cost.max(1)
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct SearchLimits {
    pub max_path_iterations: usize,
    pub max_path_length: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_path_iterations: 20_000,
            max_path_length: 256,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct RoleRules {
    pub moves: u32,
    #[serde(default)]
    pub climbs_mountains: bool,
}

#[derive(Clone, Debug)]
pub struct ImprovementRules {
    pub price: Price,
    pub max_level: u8,
    pub tech: Option<String>,
}

fn default_max_level() -> u8 {
    1
}

#[derive(Clone, Debug, Deserialize)]
pub struct ResourceRules {
    #[serde(default)]
    pub improvement: Option<ImprovementKind>,
    pub value: i32,
    #[serde(default)]
    pub priority: bool,
    #[serde(default)]
    pub tech: Option<String>,
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct ScoringWeights {
    pub distance_weight: f32,
    pub connected_bonus: f32,
    pub adjacent_bonus: f32,
    pub high_value_threshold: i32,
    pub high_value_bonus: f32,
    pub priority_bonus: f32,
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct NeedsThresholds {
    pub food_stock: u32,
    pub materials_stock: u32,
    pub cash: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawImprovement {
    #[serde(default)]
    cost: i64,
    #[serde(default)]
    resources: BTreeMap<ResourceKind, u32>,
    #[serde(default = "default_max_level")]
    max_level: u8,
    #[serde(default)]
    tech: Option<String>,
}

impl RawImprovement {
    fn compile(self, kind: ImprovementKind) -> Result<ImprovementRules, RulesError> {
        if self.max_level == 0 || self.max_level > MAX_IMPROVEMENT_LEVEL {
            return Err(RulesError::Invalid(format!(
                "{} max_level must be within 1..={MAX_IMPROVEMENT_LEVEL}",
                kind.name()
            )));
        }
        if self.cost < 0 {
            return Err(RulesError::Invalid(format!("{} cost is negative", kind.name())));
        }
        Ok(ImprovementRules {
            price: Price {
                money: self.cost,
                resources: self.resources,
            },
            max_level: self.max_level,
            tech: self.tech,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawRules {
    movement: MovementRules,
    #[serde(default)]
    search: SearchLimits,
    roles: BTreeMap<UnitRole, RoleRules>,
    improvements: BTreeMap<ImprovementKind, RawImprovement>,
    resources: BTreeMap<ResourceKind, ResourceRules>,
    scoring: ScoringWeights,
    needs: NeedsThresholds,
}

impl RawRules {
    pub(crate) fn compile(mut self) -> Result<Rules, RulesError> {
        let movement = self.movement;
        if movement.infrastructure_cost == 0 {
            return Err(RulesError::Invalid(
                "infrastructure_cost must be at least 1".into(),
            ));
        }
        if movement.improved_cost < movement.infrastructure_cost {
            return Err(RulesError::Invalid(
                "improved_cost must not undercut infrastructure_cost".into(),
            ));
        }
        for terrain in TerrainKind::ALL {
            if matches!(terrain, TerrainKind::Water | TerrainKind::Mountain) {
                if movement.terrain.contains_key(&terrain) {
                    return Err(RulesError::Invalid(format!(
                        "{} has a fixed movement rule and takes no cost",
                        terrain.name()
                    )));
                }
                continue;
            }
            let cost = *movement
                .terrain
                .get(&terrain)
                .ok_or_else(|| RulesError::MissingEntry(format!("terrain cost {}", terrain.name())))?;
            if cost <= movement.infrastructure_cost {
                return Err(RulesError::Invalid(format!(
                    "{} cost {cost} must exceed infrastructure_cost",
                    terrain.name()
                )));
            }
        }
        if self.search.max_path_iterations == 0 || self.search.max_path_length == 0 {
            return Err(RulesError::Invalid("search caps must be positive".into()));
        }

        let roles = UnitRole::ALL
            .into_iter()
            .map(|role| {
                let rules = self
                    .roles
                    .remove(&role)
                    .ok_or_else(|| RulesError::MissingEntry(format!("role {}", role.name())))?;
                if rules.moves == 0 {
                    return Err(RulesError::Invalid(format!("{} has no moves", role.name())));
                }
                Ok(rules)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let improvements = ImprovementKind::ALL
            .into_iter()
            .map(|kind| {
                self.improvements
                    .remove(&kind)
                    .ok_or_else(|| RulesError::MissingEntry(format!("improvement {}", kind.name())))?
                    .compile(kind)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let resources = ResourceKind::ALL
            .into_iter()
            .map(|kind| {
                let rules = self
                    .resources
                    .remove(&kind)
                    .ok_or_else(|| RulesError::MissingEntry(format!("resource {}", kind.name())))?;
                if let Some(improvement) = rules.improvement {
                    if !improvement.is_productive() {
                        return Err(RulesError::Invalid(format!(
                            "{} must map to a productive improvement",
                            kind.name()
                        )));
                    }
                }
                Ok(rules)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Rules {
            movement,
            search: self.search,
            scoring: self.scoring,
            needs: self.needs,
            roles,
            improvements,
            resources,
        })
    }
}
