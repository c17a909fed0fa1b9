pub mod edge;
pub mod mesh_set;
pub mod triangle;
pub mod vertex;

pub use edge::{EdgeData, EdgeId};
pub use mesh_set::{MeshSetData, MeshSetId};
pub use triangle::{TriangleData, TriangleId};
pub use vertex::{VertexData, VertexId};

use crate::error::TopologyError;
use crate::math::Point3;
use slotmap::SlotMap;

/// Central arena that owns all mesh entities.
///
/// Vertices, triangles, edges and entity sets reference each other via
/// typed IDs (generational indices). Volumes, surfaces and curves hold set
/// IDs into this store, never the mesh data itself.
#[derive(Debug, Default)]
pub struct MeshStore {
    vertices: SlotMap<VertexId, VertexData>,
    triangles: SlotMap<TriangleId, TriangleData>,
    edges: SlotMap<EdgeId, EdgeData>,
    sets: SlotMap<MeshSetId, MeshSetData>,
}

impl MeshStore {
    /// Creates a new, empty mesh store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Vertex operations ---

    /// Inserts a vertex and returns its ID.
    pub fn add_vertex(&mut self, point: Point3) -> VertexId {
        self.vertices.insert(VertexData::new(point))
    }

    /// Returns a reference to the vertex data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn vertex(&self, id: VertexId) -> Result<&VertexData, TopologyError> {
        self.vertices
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("vertex".into()))
    }

    /// Returns the position of a vertex.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn point(&self, id: VertexId) -> Result<Point3, TopologyError> {
        self.vertex(id).map(|v| v.point)
    }

    /// Removes a vertex. Callers must ensure nothing references it.
    pub fn remove_vertex(&mut self, id: VertexId) -> Option<VertexData> {
        self.vertices.remove(id)
    }

    /// Number of live vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    // --- Triangle operations ---

    /// Inserts a triangle and returns its ID.
    pub fn add_triangle(&mut self, vertices: [VertexId; 3]) -> TriangleId {
        self.triangles.insert(TriangleData::new(vertices))
    }

    /// Returns a reference to the triangle data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn triangle(&self, id: TriangleId) -> Result<&TriangleData, TopologyError> {
        self.triangles
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("triangle".into()))
    }

    /// Returns a mutable reference to the triangle data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn triangle_mut(&mut self, id: TriangleId) -> Result<&mut TriangleData, TopologyError> {
        self.triangles
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("triangle".into()))
    }

    /// Removes a triangle. Callers must drop it from any set holding it.
    pub fn remove_triangle(&mut self, id: TriangleId) -> Option<TriangleData> {
        self.triangles.remove(id)
    }

    /// Number of live triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    // --- Edge operations ---

    /// Inserts an edge and returns its ID.
    pub fn add_edge(&mut self, start: VertexId, end: VertexId) -> EdgeId {
        self.edges.insert(EdgeData { start, end })
    }

    /// Returns a reference to the edge data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn edge(&self, id: EdgeId) -> Result<&EdgeData, TopologyError> {
        self.edges
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("edge".into()))
    }

    // --- Set operations ---

    /// Creates an empty entity set and returns its ID.
    pub fn create_set(&mut self) -> MeshSetId {
        self.sets.insert(MeshSetData::default())
    }

    /// Returns a reference to the set data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn set(&self, id: MeshSetId) -> Result<&MeshSetData, TopologyError> {
        self.sets
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("mesh set".into()))
    }

    /// Returns a mutable reference to the set data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn set_mut(&mut self, id: MeshSetId) -> Result<&mut MeshSetData, TopologyError> {
        self.sets
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("mesh set".into()))
    }

    /// Removes a set and unlinks it from its parents and children.
    ///
    /// Member entities stay in the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the set is not found in the store.
    pub fn remove_set(&mut self, id: MeshSetId) -> Result<MeshSetData, TopologyError> {
        let data = self
            .sets
            .remove(id)
            .ok_or_else(|| TopologyError::EntityNotFound("mesh set".into()))?;
        for &parent in &data.parents {
            if let Some(p) = self.sets.get_mut(parent) {
                p.children.retain(|&c| c != id);
            }
        }
        for &child in &data.children {
            if let Some(c) = self.sets.get_mut(child) {
                c.parents.retain(|&p| p != id);
            }
        }
        Ok(data)
    }

    /// Adds triangles to a set together with their vertices.
    ///
    /// # Errors
    ///
    /// Returns an error if the set or one of the triangles is not found.
    pub fn add_triangles_to_set(
        &mut self,
        set: MeshSetId,
        triangles: impl IntoIterator<Item = TriangleId>,
    ) -> Result<(), TopologyError> {
        let mut tris = Vec::new();
        let mut verts = Vec::new();
        for tri in triangles {
            verts.extend_from_slice(&self.triangle(tri)?.vertices);
            tris.push(tri);
        }
        let data = self.set_mut(set)?;
        data.triangles.extend(tris);
        data.vertices.extend(verts);
        Ok(())
    }

    /// Adds an edge to a set together with its two vertices.
    ///
    /// # Errors
    ///
    /// Returns an error if the set or the edge is not found.
    pub fn add_edge_to_set(&mut self, set: MeshSetId, edge: EdgeId) -> Result<(), TopologyError> {
        let &EdgeData { start, end } = self.edge(edge)?;
        let data = self.set_mut(set)?;
        data.edges.insert(edge);
        data.vertices.insert(start);
        data.vertices.insert(end);
        Ok(())
    }

    /// Recomputes a set's vertex membership from its triangles and edges.
    ///
    /// # Errors
    ///
    /// Returns an error if the set or one of its members is not found.
    pub fn refresh_set_vertices(&mut self, set: MeshSetId) -> Result<(), TopologyError> {
        let data = self.set(set)?;
        let mut verts = std::collections::BTreeSet::new();
        for &tri in &data.triangles {
            verts.extend(self.triangle(tri)?.vertices);
        }
        for &edge in &data.edges {
            let e = self.edge(edge)?;
            verts.insert(e.start);
            verts.insert(e.end);
        }
        self.set_mut(set)?.vertices = verts;
        Ok(())
    }

    /// Links `child` under `parent`. Returns `false` if the link already existed.
    ///
    /// # Errors
    ///
    /// Returns an error if either set is not found, or if a set is linked to itself.
    pub fn add_parent_child(
        &mut self,
        parent: MeshSetId,
        child: MeshSetId,
    ) -> Result<bool, TopologyError> {
        if parent == child {
            return Err(TopologyError::InvalidTopology(
                "a set cannot be its own parent".into(),
            ));
        }
        self.set(child)?;
        let p = self.set_mut(parent)?;
        if p.children.contains(&child) {
            return Ok(false);
        }
        p.children.push(child);
        self.set_mut(child)?.parents.push(parent);
        Ok(true)
    }

    /// Parent sets of `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the set is not found in the store.
    pub fn parents(&self, id: MeshSetId) -> Result<&[MeshSetId], TopologyError> {
        self.set(id).map(MeshSetData::parents)
    }

    /// Child sets of `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the set is not found in the store.
    pub fn children(&self, id: MeshSetId) -> Result<&[MeshSetId], TopologyError> {
        self.set(id).map(MeshSetData::children)
    }

    /// Number of live sets.
    #[must_use]
    pub fn set_count(&self) -> usize {
        self.sets.len()
    }
}
