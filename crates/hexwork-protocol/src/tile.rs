use serde::{Deserialize, Deserializer, Serialize};

use crate::{Hex, PlayerId, ResourceKind, TerrainKind, TileImprovement};

/// Partial tile update. Only `Some` fields are written; `Some(None)` clears an optional field.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TilePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terrain: Option<TerrainKind>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub resource: Option<Option<ResourceKind>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub improvement: Option<Option<TileImprovement>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub owner: Option<Option<PlayerId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prospected: Option<bool>,
}

impl TilePatch {
    pub fn terrain(mut self, terrain: TerrainKind) -> Self {
        self.terrain = Some(terrain);
        self
    }

    pub fn resource(mut self, resource: Option<ResourceKind>) -> Self {
        self.resource = Some(resource);
        self
    }

    pub fn improvement(mut self, improvement: Option<TileImprovement>) -> Self {
        self.improvement = Some(improvement);
        self
    }

    pub fn owner(mut self, owner: Option<PlayerId>) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = Some(hidden);
        self
    }

    pub fn prospected(mut self, prospected: bool) -> Self {
        self.prospected = Some(prospected);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.terrain.is_none()
            && self.resource.is_none()
            && self.improvement.is_none()
            && self.owner.is_none()
            && self.hidden.is_none()
            && self.prospected.is_none()
    }
}

/// Change notification emitted by the world grid for every accepted write.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileChange {
    pub hex: Hex,
    pub patch: TilePatch,
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
