//! Outcome vocabulary reported for each automated or manual unit action.
//!
//! Hosts localize these however they like; the `Display` impls are only a
//! readable English rendering for logs and tests.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Hex, ImprovementKind, ResourceKind};

/// Why a build attempt was refused. The tile and the treasury are left untouched.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BuildError {
    #[error("tile is out of bounds")]
    OutOfBounds,
    #[error("tile is not owned by this empire")]
    NotOwned,
    #[error("cannot build on water")]
    Water,
    #[error("{improvement:?} is not compatible with this tile")]
    Incompatible { improvement: ImprovementKind },
    #[error("tile holds a resource reserved for a productive improvement")]
    Protected,
    #[error("tile is already occupied by {existing:?}")]
    Occupied { existing: ImprovementKind },
    #[error("improvement is already at its maximum level")]
    AtMaxLevel,
    #[error("missing technology: {tech}")]
    MissingTech { tech: String },
    #[error("mountain tiles need a road or rail first")]
    NeedsInfrastructure,
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: i64, available: i64 },
    #[error("insufficient {resource:?}: need {needed}, have {available}")]
    InsufficientResources {
        resource: ResourceKind,
        needed: u32,
        available: u32,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProspectOutcome {
    Discovered { resource: ResourceKind },
    AlreadyKnown { resource: ResourceKind },
    NothingFound,
    /// The tile had been prospected before; nothing was re-inspected.
    NothingToFind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UnitStatus {
    Built {
        hex: Hex,
        improvement: ImprovementKind,
    },
    Upgraded {
        hex: Hex,
        improvement: ImprovementKind,
        level: u8,
    },
    DepotFounded {
        hex: Hex,
    },
    TrackLaid {
        hex: Hex,
        improvement: ImprovementKind,
    },
    Prospected {
        hex: Hex,
        outcome: ProspectOutcome,
    },
    EnRoute {
        at: Hex,
        target: Hex,
    },
    TargetUnreachable {
        target: Hex,
    },
    NoTargets,
    BuildFailed {
        hex: Hex,
        improvement: ImprovementKind,
        reason: BuildError,
    },
    OutOfMoves {
        at: Hex,
    },
    AutomationDisabled,
}

impl UnitStatus {
    /// True for statuses that changed the world.
    pub fn is_work(&self) -> bool {
        matches!(
            self,
            UnitStatus::Built { .. }
                | UnitStatus::Upgraded { .. }
                | UnitStatus::DepotFounded { .. }
                | UnitStatus::TrackLaid { .. }
                | UnitStatus::Prospected { .. }
        )
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitStatus::Built { hex, improvement } => {
                write!(f, "Built {} at {hex}", improvement.name())
            }
            UnitStatus::Upgraded {
                hex,
                improvement,
                level,
            } => write!(f, "Upgraded {} at {hex} to level {level}", improvement.name()),
            UnitStatus::DepotFounded { hex } => write!(f, "Founded depot at {hex}"),
            UnitStatus::TrackLaid { hex, improvement } => {
                write!(f, "Laid {} at {hex}", improvement.name())
            }
            UnitStatus::Prospected { hex, outcome } => match outcome {
                ProspectOutcome::Discovered { resource } => {
                    write!(f, "Discovered {} at {hex}", resource.name())
                }
                ProspectOutcome::AlreadyKnown { resource } => {
                    write!(f, "{} at {hex} is already known", resource.name())
                }
                ProspectOutcome::NothingFound => write!(f, "Found nothing at {hex}"),
                ProspectOutcome::NothingToFind => write!(f, "Nothing to find at {hex}"),
            },
            UnitStatus::EnRoute { at, target } => write!(f, "En route to {target}, now at {at}"),
            UnitStatus::TargetUnreachable { target } => write!(f, "Cannot reach {target}"),
            UnitStatus::NoTargets => write!(f, "No targets found"),
            UnitStatus::BuildFailed {
                hex,
                improvement,
                reason,
            } => write!(f, "Cannot build {} at {hex}: {reason}", improvement.name()),
            UnitStatus::OutOfMoves { at } => write!(f, "Out of moves at {at}"),
            UnitStatus::AutomationDisabled => write!(f, "Automation disabled"),
        }
    }
}
