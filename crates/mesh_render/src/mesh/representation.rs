//! Edit and core mesh representations

use crate::foundation::math::{Point3, Vec3};
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Stable identity of a core vertex
    pub struct VertexKey;
}

/// Vertex of the edit representation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditVertex {
    /// Position in object space
    pub position: Point3,
    /// Vertex normal
    pub normal: Vec3,
}

/// Index-based mesh view reflecting in-progress edits
///
/// Edges and polygons refer to vertices by index. Nothing guarantees that
/// coincident vertices are shared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditMesh {
    /// Vertices
    pub vertices: Vec<EditVertex>,
    /// Edges as vertex index pairs
    pub edges: Vec<[u32; 2]>,
    /// Polygons as vertex index loops
    pub polygons: Vec<Vec<u32>>,
}

impl EditMesh {
    /// Create an empty edit mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a vertex and return its index
    ///
    /// Returns `None`, leaving the mesh unchanged, once the index would no
    /// longer fit in a `u32`.
    pub fn add_vertex(&mut self, position: Point3, normal: Vec3) -> Option<u32> {
        let index = vertex_index(self.vertices.len())?;
        self.vertices.push(EditVertex { position, normal });
        Some(index)
    }

    /// Append an edge between two vertex indices
    pub fn add_edge(&mut self, a: u32, b: u32) {
        self.edges.push([a, b]);
    }

    /// Append a polygon
    pub fn add_polygon(&mut self, indices: impl Into<Vec<u32>>) {
        self.polygons.push(indices.into());
    }
}

fn vertex_index(len: usize) -> Option<u32> {
    u32::try_from(len).ok()
}

/// Vertex of the core representation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoreVertex {
    /// Position in object space
    pub position: Point3,
    /// Vertex normal
    pub normal: Vec3,
}

/// Canonical mesh with shared-vertex topology
///
/// Every vertex is stored once. Edges and faces hold [`VertexKey`]s, so a
/// vertex shared by several faces appears once in [`CoreMesh::vertices`].
#[derive(Debug, Clone, Default)]
pub struct CoreMesh {
    vertices: SlotMap<VertexKey, CoreVertex>,
    edges: Vec<[VertexKey; 2]>,
    faces: Vec<Vec<VertexKey>>,
}

impl CoreMesh {
    /// Create an empty core mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a vertex
    pub fn add_vertex(&mut self, position: Point3, normal: Vec3) -> VertexKey {
        self.vertices.insert(CoreVertex { position, normal })
    }

    /// Insert an edge between two vertices
    pub fn add_edge(&mut self, a: VertexKey, b: VertexKey) {
        self.edges.push([a, b]);
    }

    /// Insert a face from a vertex loop
    pub fn add_face(&mut self, loop_keys: impl Into<Vec<VertexKey>>) {
        self.faces.push(loop_keys.into());
    }

    /// Remove a vertex together with every edge and face using it
    pub fn remove_vertex(&mut self, key: VertexKey) -> Option<CoreVertex> {
        let removed = self.vertices.remove(key)?;
        self.edges.retain(|edge| !edge.contains(&key));
        self.faces.retain(|face| !face.contains(&key));
        Some(removed)
    }

    /// Move a vertex
    pub fn set_position(&mut self, key: VertexKey, position: Point3) -> bool {
        match self.vertices.get_mut(key) {
            Some(vertex) => {
                vertex.position = position;
                true
            }
            None => false,
        }
    }

    /// Look up a vertex
    pub fn vertex(&self, key: VertexKey) -> Option<&CoreVertex> {
        self.vertices.get(key)
    }

    /// Iterate vertices with their keys
    pub fn vertices(&self) -> impl Iterator<Item = (VertexKey, &CoreVertex)> {
        self.vertices.iter()
    }

    /// Edges as key pairs
    pub fn edges(&self) -> &[[VertexKey; 2]] {
        &self.edges
    }

    /// Faces as key loops
    pub fn faces(&self) -> &[Vec<VertexKey>] {
        &self.faces
    }

    /// Number of unique vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_vertex_drops_adjacent_topology() {
        let mut core = CoreMesh::new();
        let a = core.add_vertex(Point3::origin(), Vec3::z());
        let b = core.add_vertex(Point3::new(1.0, 0.0, 0.0), Vec3::z());
        let c = core.add_vertex(Point3::new(0.0, 1.0, 0.0), Vec3::z());
        core.add_edge(a, b);
        core.add_edge(b, c);
        core.add_face(vec![a, b, c]);

        assert!(core.remove_vertex(a).is_some());
        assert_eq!(core.vertex_count(), 2);
        assert_eq!(core.edges().len(), 1);
        assert!(core.faces().is_empty());
        assert!(core.remove_vertex(a).is_none());
    }

    #[test]
    fn test_edit_mesh_indices_are_sequential() {
        let mut edit = EditMesh::new();
        assert_eq!(edit.add_vertex(Point3::origin(), Vec3::z()), Some(0));
        assert_eq!(edit.add_vertex(Point3::origin(), Vec3::z()), Some(1));
        edit.add_edge(0, 1);
        assert_eq!(edit.edges, vec![[0, 1]]);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_vertex_index_stops_at_u32_range() {
        let last = u32::MAX as usize;
        assert_eq!(vertex_index(last), Some(u32::MAX));
        assert_eq!(vertex_index(last + 1), None);
    }
}
