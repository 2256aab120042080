use serde::{Deserialize, Serialize};

/// Generational handle for a recruited unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "u64", into = "u64")]
pub struct UnitId {
    pub index: u32,
    pub generation: u32,
}

impl UnitId {
    #[inline]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self {
            index: (raw >> 32) as u32,
            generation: raw as u32,
        }
    }

    #[inline]
    pub const fn to_raw(self) -> u64 {
        ((self.index as u64) << 32) | (self.generation as u64)
    }
}

impl From<UnitId> for u64 {
    fn from(id: UnitId) -> Self {
        id.to_raw()
    }
}

impl From<u64> for UnitId {
    fn from(raw: u64) -> Self {
        Self::from_raw(raw)
    }
}

/// Owning empire. Unclaimed tiles carry no owner rather than a zero id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u8);
