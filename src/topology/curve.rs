use crate::store::{MeshSetId, VertexId};

use super::tags::GeomTags;

/// A boundary polyline shared by one or more surfaces.
#[derive(Debug, Clone)]
pub struct Curve {
    /// The curve's entity set, holding its edges.
    pub set: MeshSetId,
    /// Undirected edges as ascending vertex pairs, sorted. Empty for the
    /// curve of a closed surface.
    pub edges: Vec<(VertexId, VertexId)>,
    /// Surfaces sharing the curve, in ascending id order.
    pub surfaces: Vec<MeshSetId>,
    /// Set by the family build.
    pub tags: Option<GeomTags>,
}

impl Curve {
    /// Returns `true` if this curve has exactly the given edges and surfaces.
    #[must_use]
    pub fn matches(&self, edges: &[(VertexId, VertexId)], surfaces: &[MeshSetId]) -> bool {
        self.edges == edges && self.surfaces == surfaces
    }
}
