use std::collections::HashMap;

use crate::mesh::{FaceIndex, Mesh, VertexIndex};
use crate::real::Real;

/// Index type of edges within an [Adjacency] index.
pub type EdgeIndex = u32;

/// Unordered pair of vertex indices identifying an edge. Construction sorts
/// the pair, so `(a, b)` and `(b, a)` hash identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeKey(VertexIndex, VertexIndex);

impl EdgeKey {
    pub fn new(a: VertexIndex, b: VertexIndex) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }

    pub fn a(&self) -> VertexIndex {
        self.0
    }

    pub fn b(&self) -> VertexIndex {
        self.1
    }

    /// The endpoint that is not `v`.
    ///
    /// Self-loop edges are never constructed (see [Adjacency::build]), so the
    /// two endpoints are always distinct.
    pub fn other(&self, v: VertexIndex) -> VertexIndex {
        if self.0 == v {
            self.1
        } else {
            self.0
        }
    }
}

/// An edge record: its key and up to two incident faces in discovery order.
#[derive(Debug, Clone)]
pub struct Edge {
    pub key: EdgeKey,
    /// Incident faces in discovery order. Boundary edges keep `[Some, None]`.
    pub faces: [Option<FaceIndex>; 2],
    /// A third (or later) distinct face touched this edge; it has no
    /// well-defined dihedral angle.
    pub extra_incidence: bool,
}

impl Edge {
    /// An interior manifold edge: exactly two incident faces, no extras.
    pub fn is_manifold(&self) -> bool {
        self.faces[1].is_some() && !self.extra_incidence
    }

    pub fn face_count(&self) -> usize {
        self.faces.iter().filter(|f| f.is_some()).count()
    }

    fn attach(&mut self, face: FaceIndex) {
        if self.faces.contains(&Some(face)) {
            // a face may walk the same edge twice (e.g. a bow-tie loop);
            // that is one incidence, not two
            return;
        }
        if self.faces[0].is_none() {
            self.faces[0] = Some(face);
        } else if self.faces[1].is_none() {
            self.faces[1] = Some(face);
        } else {
            self.extra_incidence = true;
        }
    }
}

/// Vertex↔edge and edge↔face incidence, rebuilt from the face list in one
/// pass. Never cached across mesh edits: every bake builds a fresh index.
#[derive(Debug, Clone, Default)]
pub struct Adjacency {
    edges: Vec<Edge>,
    edge_ids: HashMap<EdgeKey, EdgeIndex>,
    vertex_edges: Vec<Vec<EdgeIndex>>,
    degenerate_faces: Vec<FaceIndex>,
}

impl Adjacency {
    /// Build the incidence index for a mesh. O(V + E + F) via hashed edge
    /// keys.
    ///
    /// Faces with fewer than 3 corners are skipped (reported through
    /// [degenerate_faces](Self::degenerate_faces), not fatal), as are
    /// self-loop edges produced by a repeated vertex within a face.
    pub fn build<R: Real>(mesh: &Mesh<R>) -> Self {
        let mut edges: Vec<Edge> = Vec::new();
        let mut edge_ids: HashMap<EdgeKey, EdgeIndex> = HashMap::new();
        let mut vertex_edges: Vec<Vec<EdgeIndex>> = vec![Vec::new(); mesh.vertex_count()];
        let mut degenerate_faces: Vec<FaceIndex> = Vec::new();

        for (f, corners) in mesh.faces().enumerate() {
            if corners.len() < 3 {
                degenerate_faces.push(f as FaceIndex);
                continue;
            }
            for (i, &a) in corners.iter().enumerate() {
                let b = corners[(i + 1) % corners.len()];
                if a == b {
                    continue;
                }
                let key = EdgeKey::new(a, b);
                let id = *edge_ids.entry(key).or_insert_with(|| {
                    let id = edges.len() as EdgeIndex;
                    edges.push(Edge {
                        key,
                        faces: [None, None],
                        extra_incidence: false,
                    });
                    vertex_edges[key.a() as usize].push(id);
                    vertex_edges[key.b() as usize].push(id);
                    id
                });
                edges[id as usize].attach(f as FaceIndex);
            }
        }

        if !degenerate_faces.is_empty() {
            tracing::warn!(
                count = degenerate_faces.len(),
                "skipped degenerate faces (< 3 corners)"
            );
        }

        Self {
            edges,
            edge_ids,
            vertex_edges,
            degenerate_faces,
        }
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edge(&self, id: EdgeIndex) -> &Edge {
        &self.edges[id as usize]
    }

    /// Number of vertices the index was built over.
    pub fn vertex_count(&self) -> usize {
        self.vertex_edges.len()
    }

    /// Edges incident to a vertex, in discovery order.
    pub fn vertex_edges(&self, v: VertexIndex) -> &[EdgeIndex] {
        &self.vertex_edges[v as usize]
    }

    /// Faces that were skipped for having fewer than 3 corners.
    pub fn degenerate_faces(&self) -> &[FaceIndex] {
        &self.degenerate_faces
    }

    pub fn non_manifold_edge_count(&self) -> usize {
        self.edges.iter().filter(|e| e.extra_incidence).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn positions(n: usize) -> Vec<Point3<f64>> {
        (0..n).map(|i| Point3::new(i as f64, 0.0, 0.0)).collect()
    }

    #[test]
    fn two_triangles_share_one_edge() {
        let mesh = Mesh::from_faces(positions(4), &[vec![0, 1, 2], vec![2, 1, 3]]);
        let adj = Adjacency::build(&mesh);
        assert_eq!(adj.edge_count(), 5);
        let shared = adj.edge(adj.edge_ids[&EdgeKey::new(1, 2)]);
        assert!(shared.is_manifold());
        assert_eq!(shared.faces, [Some(0), Some(1)]);
        // every other edge is boundary
        assert_eq!(adj.edges().iter().filter(|e| e.face_count() == 1).count(), 4);
        assert_eq!(adj.vertex_edges(1).len(), 3);
        assert_eq!(adj.vertex_edges(3).len(), 2);
    }

    #[test]
    fn degenerate_faces_are_reported_and_skipped() {
        let mesh = Mesh::from_faces(positions(3), &[vec![0, 1], vec![0, 1, 2]]);
        let adj = Adjacency::build(&mesh);
        assert_eq!(adj.degenerate_faces(), &[0]);
        assert_eq!(adj.edge_count(), 3);
    }

    #[test]
    fn third_face_marks_edge_non_manifold() {
        let mesh = Mesh::from_faces(
            positions(5),
            &[vec![0, 1, 2], vec![1, 0, 3], vec![0, 1, 4]],
        );
        let adj = Adjacency::build(&mesh);
        let edge = adj.edge(adj.edge_ids[&EdgeKey::new(0, 1)]);
        assert!(edge.extra_incidence);
        assert!(!edge.is_manifold());
        // first two incidences kept in discovery order
        assert_eq!(edge.faces, [Some(0), Some(1)]);
        assert_eq!(adj.non_manifold_edge_count(), 1);
    }

    #[test]
    fn repeated_vertex_makes_no_self_loop() {
        let mesh = Mesh::from_faces(positions(3), &[vec![0, 1, 1, 2]]);
        let adj = Adjacency::build(&mesh);
        assert!(adj.edges().iter().all(|e| e.key.a() != e.key.b()));
    }

    #[test]
    fn isolated_vertex_has_no_edges() {
        let mesh = Mesh::from_faces(positions(4), &[vec![0, 1, 2]]);
        let adj = Adjacency::build(&mesh);
        assert!(adj.vertex_edges(3).is_empty());
    }
}
