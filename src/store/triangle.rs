use super::vertex::VertexId;

slotmap::new_key_type! {
    /// Unique identifier for a triangle in the mesh store.
    pub struct TriangleId;
}

/// A triangle referencing three vertices, in winding order.
#[derive(Debug, Clone)]
pub struct TriangleData {
    pub vertices: [VertexId; 3],
}

impl TriangleData {
    /// Creates a new triangle.
    #[must_use]
    pub fn new(vertices: [VertexId; 3]) -> Self {
        Self { vertices }
    }

    /// Vertex triple in ascending order, for orientation-free comparison.
    #[must_use]
    pub fn sorted_vertices(&self) -> [VertexId; 3] {
        let mut key = self.vertices;
        key.sort_unstable();
        key
    }

    /// The three undirected edges of the triangle as ordered vertex pairs.
    #[must_use]
    pub fn edge_keys(&self) -> [(VertexId, VertexId); 3] {
        let [a, b, c] = self.vertices;
        [ordered(a, b), ordered(b, c), ordered(c, a)]
    }
}

fn ordered(a: VertexId, b: VertexId) -> (VertexId, VertexId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
