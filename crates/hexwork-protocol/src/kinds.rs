use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerrainKind {
    Water,
    Plains,
    Grassland,
    Hills,
    Forest,
    Mountain,
    Swamp,
    Tundra,
}

impl TerrainKind {
    pub const ALL: [TerrainKind; 8] = [
        TerrainKind::Water,
        TerrainKind::Plains,
        TerrainKind::Grassland,
        TerrainKind::Hills,
        TerrainKind::Forest,
        TerrainKind::Mountain,
        TerrainKind::Swamp,
        TerrainKind::Tundra,
    ];

    #[inline]
    pub fn is_water(self) -> bool {
        matches!(self, TerrainKind::Water)
    }

    pub fn name(self) -> &'static str {
        match self {
            TerrainKind::Water => "water",
            TerrainKind::Plains => "plains",
            TerrainKind::Grassland => "grassland",
            TerrainKind::Hills => "hills",
            TerrainKind::Forest => "forest",
            TerrainKind::Mountain => "mountain",
            TerrainKind::Swamp => "swamp",
            TerrainKind::Tundra => "tundra",
        }
    }
}

/// Coarse grouping used by filters and the empire-needs advisory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceCategory {
    Food,
    Materials,
    Cash,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Grain,
    Fruit,
    Cotton,
    Sugar,
    Tobacco,
    Tea,
    Spices,
    Rubber,
    Coal,
    Iron,
    Copper,
    Gold,
    Gems,
    Sulfur,
    Timber,
    Wool,
    Livestock,
    Horses,
    Oil,
    Fish,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 20] = [
        ResourceKind::Grain,
        ResourceKind::Fruit,
        ResourceKind::Cotton,
        ResourceKind::Sugar,
        ResourceKind::Tobacco,
        ResourceKind::Tea,
        ResourceKind::Spices,
        ResourceKind::Rubber,
        ResourceKind::Coal,
        ResourceKind::Iron,
        ResourceKind::Copper,
        ResourceKind::Gold,
        ResourceKind::Gems,
        ResourceKind::Sulfur,
        ResourceKind::Timber,
        ResourceKind::Wool,
        ResourceKind::Livestock,
        ResourceKind::Horses,
        ResourceKind::Oil,
        ResourceKind::Fish,
    ];

    pub fn category(self) -> ResourceCategory {
        use ResourceKind::*;
        match self {
            Grain | Fruit | Livestock | Fish => ResourceCategory::Food,
            Gold | Gems | Spices | Tea | Tobacco | Sugar => ResourceCategory::Cash,
            Cotton | Rubber | Coal | Iron | Copper | Sulfur | Timber | Wool | Horses | Oil => {
                ResourceCategory::Materials
            }
        }
    }

    /// Resources a prospector can turn up in the ground.
    pub fn is_mineral(self) -> bool {
        use ResourceKind::*;
        matches!(self, Coal | Iron | Copper | Gold | Gems | Sulfur | Oil)
    }

    pub fn name(self) -> &'static str {
        use ResourceKind::*;
        match self {
            Grain => "grain",
            Fruit => "fruit",
            Cotton => "cotton",
            Sugar => "sugar",
            Tobacco => "tobacco",
            Tea => "tea",
            Spices => "spices",
            Rubber => "rubber",
            Coal => "coal",
            Iron => "iron",
            Copper => "copper",
            Gold => "gold",
            Gems => "gems",
            Sulfur => "sulfur",
            Timber => "timber",
            Wool => "wool",
            Livestock => "livestock",
            Horses => "horses",
            Oil => "oil",
            Fish => "fish",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImprovementKind {
    Road,
    Rail,
    Capital,
    Depot,
    Port,
    Farm,
    Mine,
    LumberMill,
    Ranch,
    Plantation,
    OilWell,
}

impl ImprovementKind {
    pub const ALL: [ImprovementKind; 11] = [
        ImprovementKind::Road,
        ImprovementKind::Rail,
        ImprovementKind::Capital,
        ImprovementKind::Depot,
        ImprovementKind::Port,
        ImprovementKind::Farm,
        ImprovementKind::Mine,
        ImprovementKind::LumberMill,
        ImprovementKind::Ranch,
        ImprovementKind::Plantation,
        ImprovementKind::OilWell,
    ];

    /// Built transport infrastructure: cheap to walk along.
    pub fn is_infrastructure(self) -> bool {
        use ImprovementKind::*;
        matches!(self, Road | Rail | Capital | Depot | Port)
    }

    /// Network nodes that must keep their distance from each other.
    pub fn is_station(self) -> bool {
        use ImprovementKind::*;
        matches!(self, Capital | Depot | Port)
    }

    pub fn is_productive(self) -> bool {
        use ImprovementKind::*;
        matches!(self, Farm | Mine | LumberMill | Ranch | Plantation | OilWell)
    }

    /// Carries cargo for the transport network. Productive improvements imply a local path.
    pub fn is_transport_eligible(self) -> bool {
        self.is_infrastructure() || self.is_productive()
    }

    /// Plain track a productive improvement or a depot may be built over.
    pub fn is_track(self) -> bool {
        matches!(self, ImprovementKind::Road | ImprovementKind::Rail)
    }

    pub fn name(self) -> &'static str {
        use ImprovementKind::*;
        match self {
            Road => "road",
            Rail => "rail",
            Capital => "capital",
            Depot => "depot",
            Port => "port",
            Farm => "farm",
            Mine => "mine",
            LumberMill => "lumber mill",
            Ranch => "ranch",
            Plantation => "plantation",
            OilWell => "oil well",
        }
    }
}

pub const MAX_IMPROVEMENT_LEVEL: u8 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileImprovement {
    pub kind: ImprovementKind,
    /// 1..=3 while present; an absent improvement is level 0.
    pub level: u8,
}

impl TileImprovement {
    pub const fn new(kind: ImprovementKind) -> Self {
        Self { kind, level: 1 }
    }

    pub const fn with_level(kind: ImprovementKind, level: u8) -> Self {
        Self { kind, level }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitRole {
    Engineer,
    Prospector,
    Farmer,
    Miner,
    Forester,
    Rancher,
    Driller,
}

impl UnitRole {
    pub const ALL: [UnitRole; 7] = [
        UnitRole::Engineer,
        UnitRole::Prospector,
        UnitRole::Farmer,
        UnitRole::Miner,
        UnitRole::Forester,
        UnitRole::Rancher,
        UnitRole::Driller,
    ];

    pub fn is_improver(self) -> bool {
        !matches!(self, UnitRole::Engineer | UnitRole::Prospector)
    }

    pub fn name(self) -> &'static str {
        match self {
            UnitRole::Engineer => "engineer",
            UnitRole::Prospector => "prospector",
            UnitRole::Farmer => "farmer",
            UnitRole::Miner => "miner",
            UnitRole::Forester => "forester",
            UnitRole::Rancher => "rancher",
            UnitRole::Driller => "driller",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_eligibility_covers_infrastructure_and_production() {
        for kind in ImprovementKind::ALL {
            assert_eq!(
                kind.is_transport_eligible(),
                kind.is_infrastructure() || kind.is_productive()
            );
            assert!(!(kind.is_infrastructure() && kind.is_productive()));
        }
        assert!(ImprovementKind::Port.is_station());
        assert!(!ImprovementKind::Rail.is_station());
    }

    #[test]
    fn kinds_use_snake_case_on_the_wire() {
        let json = serde_json::to_string(&ImprovementKind::LumberMill).unwrap();
        assert_eq!(json, "\"lumber_mill\"");
        let back: ResourceKind = serde_json::from_str("\"livestock\"").unwrap();
        assert_eq!(back, ResourceKind::Livestock);
    }

    #[test]
    fn every_resource_has_a_category() {
        let food = ResourceKind::ALL
            .iter()
            .filter(|r| r.category() == ResourceCategory::Food)
            .count();
        assert_eq!(food, 4);
        assert!(ResourceKind::Oil.is_mineral());
        assert!(!ResourceKind::Grain.is_mineral());
    }
}
