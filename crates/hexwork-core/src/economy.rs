//! Narrow stand-ins for the host economy: treasury, price table entries and
//! the technology unlock set.

use std::collections::{BTreeMap, BTreeSet};

use hexwork_protocol::{BuildError, ResourceKind};
use serde::{Deserialize, Serialize};

/// Cost of one build action.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub money: i64,
    #[serde(default)]
    pub resources: BTreeMap<ResourceKind, u32>,
}

impl Price {
    pub fn money(money: i64) -> Self {
        Self {
            money,
            resources: BTreeMap::new(),
        }
    }

    /// Upgrades cost the base price once per target level.
    pub fn scaled(&self, factor: u32) -> Price {
        let factor = factor.max(1);
        Price {
            money: self.money.saturating_mul(i64::from(factor)),
            resources: self
                .resources
                .iter()
                .map(|(r, n)| (*r, n.saturating_mul(factor)))
                .collect(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Treasury {
    pub cash: i64,
    #[serde(default)]
    pub stock: BTreeMap<ResourceKind, u32>,
}

impl Treasury {
    pub fn new(cash: i64) -> Self {
        Self {
            cash,
            stock: BTreeMap::new(),
        }
    }

    pub fn with_stock(mut self, resource: ResourceKind, amount: u32) -> Self {
        self.stock.insert(resource, amount);
        self
    }

    pub fn stock_of(&self, resource: ResourceKind) -> u32 {
        self.stock.get(&resource).copied().unwrap_or(0)
    }

    pub fn add_stock(&mut self, resource: ResourceKind, amount: u32) {
        let slot = self.stock.entry(resource).or_insert(0);
        *slot = slot.saturating_add(amount);
    }

    /// First shortfall, money before goods.
    pub fn check(&self, price: &Price) -> Result<(), BuildError> {
        if self.cash < price.money {
            return Err(BuildError::InsufficientFunds {
                needed: price.money,
                available: self.cash,
            });
        }
        for (&resource, &needed) in &price.resources {
            let available = self.stock_of(resource);
            if available < needed {
                return Err(BuildError::InsufficientResources {
                    resource,
                    needed,
                    available,
                });
            }
        }
        Ok(())
    }

    pub fn can_afford(&self, price: &Price) -> bool {
        self.check(price).is_ok()
    }

    /// Debits the price atomically: nothing is taken unless everything is available.
    pub fn pay(&mut self, price: &Price) -> Result<(), BuildError> {
        self.check(price)?;
        self.cash -= price.money;
        for (resource, needed) in &price.resources {
            if let Some(slot) = self.stock.get_mut(resource) {
                *slot -= needed;
            }
        }
        Ok(())
    }
}

/// Names of unlocked technologies.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechSet {
    unlocked: BTreeSet<String>,
}

impl TechSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, name: &str) -> bool {
        self.unlocked.contains(name)
    }

    pub fn unlock(&mut self, name: impl Into<String>) -> bool {
        self.unlocked.insert(name.into())
    }

    /// `None` means no requirement.
    pub fn satisfies(&self, requirement: Option<&str>) -> bool {
        requirement.is_none_or(|name| self.has(name))
    }
}

impl<S: Into<String>> FromIterator<S> for TechSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            unlocked: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pay_is_all_or_nothing() {
        let mut treasury = Treasury::new(100).with_stock(ResourceKind::Timber, 1);
        let mut price = Price::money(30);
        price.resources.insert(ResourceKind::Timber, 2);

        let err = treasury.pay(&price).unwrap_err();
        assert_eq!(
            err,
            BuildError::InsufficientResources {
                resource: ResourceKind::Timber,
                needed: 2,
                available: 1
            }
        );
        assert_eq!(treasury.cash, 100);
        assert_eq!(treasury.stock_of(ResourceKind::Timber), 1);

        treasury.add_stock(ResourceKind::Timber, 1);
        treasury.pay(&price).unwrap();
        assert_eq!(treasury.cash, 70);
        assert_eq!(treasury.stock_of(ResourceKind::Timber), 0);
    }

    #[test]
    fn funds_are_checked_before_goods() {
        let treasury = Treasury::new(5);
        let mut price = Price::money(10);
        price.resources.insert(ResourceKind::Iron, 1);
        assert!(matches!(
            treasury.check(&price),
            Err(BuildError::InsufficientFunds { needed: 10, available: 5 })
        ));
    }

    #[test]
    fn scaled_price_multiplies_every_component() {
        let mut price = Price::money(20);
        price.resources.insert(ResourceKind::Iron, 1);
        let scaled = price.scaled(3);
        assert_eq!(scaled.money, 60);
        assert_eq!(scaled.resources[&ResourceKind::Iron], 3);
    }

    #[test]
    fn tech_set_gates_requirements() {
        let techs: TechSet = ["forestry"].into_iter().collect();
        assert!(techs.has("forestry"));
        assert!(techs.satisfies(None));
        assert!(techs.satisfies(Some("forestry")));
        assert!(!techs.satisfies(Some("railroad")));
    }
}
