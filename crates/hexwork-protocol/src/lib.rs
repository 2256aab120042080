//! Data shared between the hexwork engine and its host: coordinates, ids,
//! tile kinds, tile change notifications and unit status reports.

mod hex;
mod ids;
mod kinds;
mod status;
mod tile;

pub use crate::hex::*;
pub use crate::ids::*;
pub use crate::kinds::*;
pub use crate::status::*;
pub use crate::tile::*;
