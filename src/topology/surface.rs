use crate::store::MeshSetId;

use super::tags::GeomTags;

/// The volumes a surface bounds, in order.
///
/// The forward volume is always present; the reverse slot is filled only
/// for a surface shared by two adjacent volumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sense {
    pub forward: MeshSetId,
    pub reverse: Option<MeshSetId>,
}

impl Sense {
    /// Sense of a surface bounding a single volume.
    #[must_use]
    pub fn unmerged(owner: MeshSetId) -> Self {
        Self {
            forward: owner,
            reverse: None,
        }
    }

    /// Sense of a surface shared by `forward` (lower band) and `reverse`.
    #[must_use]
    pub fn merged(forward: MeshSetId, reverse: MeshSetId) -> Self {
        Self {
            forward,
            reverse: Some(reverse),
        }
    }

    /// Returns `true` if two volumes share the surface.
    #[must_use]
    pub fn is_merged(&self) -> bool {
        self.reverse.is_some()
    }

    /// The populated volume slots.
    pub fn volumes(&self) -> impl Iterator<Item = MeshSetId> + '_ {
        std::iter::once(self.forward).chain(self.reverse)
    }
}

/// A surface shell and its tags.
#[derive(Debug, Clone)]
pub struct Surface {
    /// The surface's entity set.
    pub set: MeshSetId,
    pub sense: Sense,
    /// Boundary level times the normalization factor; 0 when unmerged.
    pub value: f64,
    /// Copy of `value` for visualization, present when viz tagging is on.
    pub viz_value: Option<f64>,
    /// Bounding curves, filled by the family build.
    pub curves: Vec<MeshSetId>,
    /// Set by the family build.
    pub tags: Option<GeomTags>,
}

impl Surface {
    /// Creates an unmerged surface owned by `owner`.
    #[must_use]
    pub fn unmerged(set: MeshSetId, owner: MeshSetId) -> Self {
        Self {
            set,
            sense: Sense::unmerged(owner),
            value: 0.0,
            viz_value: None,
            curves: Vec::new(),
            tags: None,
        }
    }
}
