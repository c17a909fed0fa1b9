pub mod error;
pub mod isogeom;
pub mod levels;
pub mod math;
pub mod operations;
pub mod store;
pub mod topology;

#[cfg(test)]
mod test_support;

pub use error::{IsogeomError, Result};
pub use isogeom::{BuildParams, IsoGeometry};
pub use levels::{LevelBounds, LevelSource, Levels};
