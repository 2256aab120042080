use serde::{Deserialize, Serialize};

use hexwork_protocol::{ResourceCategory, ResourceKind};

use crate::economy::Treasury;
use crate::rules::NeedsThresholds;

/// Shortage flags read by engineers when choosing what to connect next.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmpireNeeds {
    pub food: bool,
    pub materials: bool,
    pub cash: bool,
}

impl EmpireNeeds {
    pub fn assess(treasury: &Treasury, thresholds: &NeedsThresholds) -> Self {
        let stock_in = |category: ResourceCategory| -> u32 {
            ResourceKind::ALL
                .into_iter()
                .filter(|resource| resource.category() == category)
                .map(|resource| treasury.stock_of(resource))
                .sum()
        };
        Self {
            food: stock_in(ResourceCategory::Food) < thresholds.food_stock,
            materials: stock_in(ResourceCategory::Materials) < thresholds.materials_stock,
            cash: treasury.cash < thresholds.cash,
        }
    }

    pub fn crisis(&self) -> bool {
        self.food || self.materials || self.cash
    }

    /// Most pressing shortage, food first.
    pub fn priority(&self) -> Option<ResourceCategory> {
        if self.food {
            Some(ResourceCategory::Food)
        } else if self.materials {
            Some(ResourceCategory::Materials)
        } else if self.cash {
            Some(ResourceCategory::Cash)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds() -> NeedsThresholds {
        NeedsThresholds {
            food_stock: 4,
            materials_stock: 4,
            cash: 50,
        }
    }

    #[test]
    fn empty_treasury_is_in_crisis() {
        let needs = EmpireNeeds::assess(&Treasury::new(0), &thresholds());
        assert!(needs.food && needs.materials && needs.cash);
        assert_eq!(needs.priority(), Some(ResourceCategory::Food));
    }

    #[test]
    fn stocks_are_summed_per_category() {
        let treasury = Treasury::new(100)
            .with_stock(ResourceKind::Grain, 2)
            .with_stock(ResourceKind::Fish, 2)
            .with_stock(ResourceKind::Coal, 1);
        let needs = EmpireNeeds::assess(&treasury, &thresholds());
        assert!(!needs.food);
        assert!(needs.materials);
        assert!(!needs.cash);
        assert_eq!(needs.priority(), Some(ResourceCategory::Materials));
        assert!(needs.crisis());
    }

    #[test]
    fn well_stocked_empire_has_no_needs() {
        let treasury = Treasury::new(500)
            .with_stock(ResourceKind::Grain, 9)
            .with_stock(ResourceKind::Iron, 9);
        let needs = EmpireNeeds::assess(&treasury, &thresholds());
        assert!(!needs.crisis());
        assert_eq!(needs.priority(), None);
    }
}
