use super::vertex::VertexId;

slotmap::new_key_type! {
    /// Unique identifier for a curve edge in the mesh store.
    pub struct EdgeId;
}

/// A straight edge between two vertices.
///
/// Edges only exist as members of curve sets.
#[derive(Debug, Clone)]
pub struct EdgeData {
    /// Start vertex of the edge.
    pub start: VertexId,
    /// End vertex of the edge.
    pub end: VertexId,
}
