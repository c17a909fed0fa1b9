use crate::levels::LevelBounds;
use crate::store::MeshSetId;

use super::tags::GeomTags;

/// One band of scalar value space and the mesh loaded for it.
#[derive(Debug, Clone)]
pub struct Isovolume {
    /// Band order, 0-based from the lowest band.
    pub index: usize,
    /// Scalar bounds of the band.
    pub bounds: LevelBounds,
    /// The volume's entity set.
    pub set: MeshSetId,
    /// Surfaces bounding this volume, including shared ones.
    pub surfaces: Vec<MeshSetId>,
    /// Set by the family build.
    pub tags: Option<GeomTags>,
}

impl Isovolume {
    /// Creates an isovolume with no surfaces yet.
    #[must_use]
    pub fn new(index: usize, bounds: LevelBounds, set: MeshSetId) -> Self {
        Self {
            index,
            bounds,
            set,
            surfaces: Vec::new(),
            tags: None,
        }
    }
}
