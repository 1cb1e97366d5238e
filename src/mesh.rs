use std::collections::HashMap;

use nalgebra::{Point3, Vector3, Vector4};

use crate::real::Real;

/// Index type of vertices within a [Mesh].
pub type VertexIndex = u32;

/// Index type of faces within a [Mesh].
pub type FaceIndex = u32;

/// Index type of corners (face loops) within a [Mesh]. Corners are numbered
/// per mesh, face-major: all corners of face 0, then all corners of face 1, …
pub type CornerIndex = u32;

/// A per-corner color value. Channels are `[r, g, b, a]` in `[0, 1]`.
pub type Rgba<R> = Vector4<R>;

/// The fill value for freshly created color attributes.
pub fn attribute_fill<R: Real>() -> Rgba<R> {
    Rgba::new(R::one(), R::one(), R::one(), R::one())
}

/// An indexed polygonal mesh with named per-corner color attributes.
///
/// Geometry (positions, normals, face corner lists) is immutable once
/// constructed; color attributes are the only mutable state. Faces are stored
/// as one flat corner buffer plus per-face offsets, so a corner is a `(face,
/// slot)` incidence addressed by a single [CornerIndex].
#[derive(Debug, Clone)]
pub struct Mesh<R: Real> {
    positions: Vec<Point3<R>>,
    vertex_normals: Vec<Vector3<R>>,
    face_normals: Vec<Vector3<R>>,
    /// Vertex of every corner, all faces concatenated.
    corner_vertices: Vec<VertexIndex>,
    /// `face_offsets[f]..face_offsets[f + 1]` is face `f`'s corner range.
    face_offsets: Vec<u32>,
    attributes: HashMap<String, Vec<Rgba<R>>>,
}

impl<R: Real> Mesh<R> {
    /// Build a mesh from vertex positions and per-face corner lists.
    ///
    /// Face normals are derived with Newell's rule (robust for non-planar
    /// n-gons); smooth vertex normals are the normalized sum of incident face
    /// normals. Faces with fewer than 3 corners are kept (so corner indexing
    /// matches the input) but get a zero normal and contribute nothing to
    /// vertex normals; topology construction skips them later.
    ///
    /// # Panics
    ///
    /// * any face references a vertex index >= `positions.len()`
    pub fn from_faces(positions: Vec<Point3<R>>, faces: &[Vec<VertexIndex>]) -> Self {
        let vertex_count = positions.len();
        let mut corner_vertices = Vec::with_capacity(faces.iter().map(Vec::len).sum());
        let mut face_offsets = Vec::with_capacity(faces.len() + 1);
        face_offsets.push(0);
        for face in faces {
            for &v in face {
                assert!(
                    (v as usize) < vertex_count,
                    "face references vertex {v} of {vertex_count}"
                );
                corner_vertices.push(v);
            }
            face_offsets.push(corner_vertices.len() as u32);
        }

        let face_normals: Vec<Vector3<R>> = faces
            .iter()
            .map(|face| newell_normal(&positions, face))
            .collect();

        let mut vertex_normals = vec![Vector3::zeros(); vertex_count];
        for (face, normal) in faces.iter().zip(&face_normals) {
            for &v in face {
                vertex_normals[v as usize] += normal;
            }
        }
        for normal in &mut vertex_normals {
            *normal = normal
                .try_normalize(R::default_epsilon())
                .unwrap_or_else(Vector3::zeros);
        }

        Self {
            positions,
            vertex_normals,
            face_normals,
            corner_vertices,
            face_offsets,
            attributes: HashMap::new(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn face_count(&self) -> usize {
        self.face_offsets.len() - 1
    }

    pub fn corner_count(&self) -> usize {
        self.corner_vertices.len()
    }

    pub fn position(&self, v: usize) -> &Point3<R> {
        &self.positions[v]
    }

    pub fn positions(&self) -> &[Point3<R>] {
        &self.positions
    }

    /// Smooth (face-averaged) normal of a vertex. Zero for vertices with no
    /// incident non-degenerate face.
    pub fn vertex_normal(&self, v: usize) -> &Vector3<R> {
        &self.vertex_normals[v]
    }

    pub fn face_normal(&self, f: usize) -> &Vector3<R> {
        &self.face_normals[f]
    }

    pub fn face_normals(&self) -> &[Vector3<R>] {
        &self.face_normals
    }

    /// Vertex indices of a face's corners, in winding order.
    pub fn face_vertices(&self, f: usize) -> &[VertexIndex] {
        let start = self.face_offsets[f] as usize;
        let end = self.face_offsets[f + 1] as usize;
        &self.corner_vertices[start..end]
    }

    /// Iterate over all faces as corner vertex lists.
    pub fn faces(&self) -> impl Iterator<Item = &[VertexIndex]> {
        (0..self.face_count()).map(|f| self.face_vertices(f))
    }

    /// Vertex of every corner, face-major; index with a [CornerIndex].
    pub fn corner_vertices(&self) -> &[VertexIndex] {
        &self.corner_vertices
    }

    pub fn has_color_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn color_attribute(&self, name: &str) -> Option<&[Rgba<R>]> {
        self.attributes.get(name).map(Vec::as_slice)
    }

    pub fn color_attribute_mut(&mut self, name: &str) -> Option<&mut [Rgba<R>]> {
        self.attributes.get_mut(name).map(Vec::as_mut_slice)
    }

    /// Get a per-corner color attribute, creating it (filled with
    /// [attribute_fill]) if it does not exist yet.
    pub fn color_attribute_or_create(&mut self, name: &str) -> &mut [Rgba<R>] {
        let corners = self.corner_vertices.len();
        self.attributes
            .entry(name.to_owned())
            .or_insert_with(|| vec![attribute_fill(); corners])
    }

    /// Write a per-vertex color field into a corner attribute: every corner
    /// receives the color of its vertex. Storage stays per-corner, so faces
    /// that do not share the attribute value elsewhere keep flat shading.
    ///
    /// # Panics
    ///
    /// * `colors.len() != self.vertex_count()`
    pub fn write_corner_colors_by_vertex(&mut self, name: &str, colors: &[Rgba<R>]) {
        assert_eq!(colors.len(), self.positions.len());
        let corners = self.corner_vertices.len();
        let attr = self
            .attributes
            .entry(name.to_owned())
            .or_insert_with(|| vec![attribute_fill(); corners]);
        for (slot, &v) in self.corner_vertices.iter().enumerate() {
            attr[slot] = colors[v as usize];
        }
    }
}

/// Newell's rule: sum of cross-product terms over the face loop, normalized.
/// Returns zero for degenerate (collapsed or < 3 corner) faces.
fn newell_normal<R: Real>(positions: &[Point3<R>], face: &[VertexIndex]) -> Vector3<R> {
    if face.len() < 3 {
        return Vector3::zeros();
    }
    let mut normal: Vector3<R> = Vector3::zeros();
    for (i, &v) in face.iter().enumerate() {
        let a = &positions[v as usize];
        let b = &positions[face[(i + 1) % face.len()] as usize];
        normal.x += (a.y - b.y) * (a.z + b.z);
        normal.y += (a.z - b.z) * (a.x + b.x);
        normal.z += (a.x - b.x) * (a.y + b.y);
    }
    normal
        .try_normalize(R::default_epsilon())
        .unwrap_or_else(Vector3::zeros)
}
