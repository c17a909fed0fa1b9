pub mod spatial_hash;

pub use spatial_hash::SpatialHash;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// Merge tolerance used by front ends that do not ask the user for one.
pub const DEFAULT_MERGE_TOL: f64 = 1e-5;

/// Normalization factor used by front ends that do not ask the user for one.
pub const DEFAULT_NORM: f64 = 1.0;
