use std::collections::BTreeSet;

use super::edge::EdgeId;
use super::triangle::TriangleId;
use super::vertex::VertexId;

slotmap::new_key_type! {
    /// Unique identifier for an entity set in the mesh store.
    pub struct MeshSetId;
}

/// An entity set: a group of mesh entities with parent/child links to
/// other sets.
///
/// Volumes, surfaces and curves are all mesh sets. Members are kept in
/// ascending id order so iteration is reproducible.
#[derive(Debug, Clone, Default)]
pub struct MeshSetData {
    /// Member vertices.
    pub vertices: BTreeSet<VertexId>,
    /// Member triangles.
    pub triangles: BTreeSet<TriangleId>,
    /// Member edges.
    pub edges: BTreeSet<EdgeId>,
    pub(super) parents: Vec<MeshSetId>,
    pub(super) children: Vec<MeshSetId>,
}

impl MeshSetData {
    /// Parent sets, in the order they were linked.
    #[must_use]
    pub fn parents(&self) -> &[MeshSetId] {
        &self.parents
    }

    /// Child sets, in the order they were linked.
    #[must_use]
    pub fn children(&self) -> &[MeshSetId] {
        &self.children
    }

    /// Returns `true` if the set holds no mesh entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.triangles.is_empty() && self.edges.is_empty()
    }

    /// Removes all mesh entities, keeping parent/child links.
    pub fn clear_entities(&mut self) {
        self.vertices.clear();
        self.triangles.clear();
        self.edges.clear();
    }
}
