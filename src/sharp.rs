use nalgebra::Vector3;
use num_traits::Zero;

use crate::real::Real;
use crate::topo::{Adjacency, EdgeIndex};

/// Per-edge dihedral classification over one adjacency index. Transient:
/// recomputed for every bake.
#[derive(Debug, Clone)]
pub struct SharpEdgeSet<R: Real> {
    /// Dihedral angle in radians; `None` for boundary and non-manifold edges.
    angles: Vec<Option<R>>,
    sharp: Vec<bool>,
}

impl<R: Real> SharpEdgeSet<R> {
    /// Classify every interior manifold edge of `adjacency` against an angle
    /// threshold in degrees.
    ///
    /// The dihedral angle is the unsigned angle between the two incident face
    /// normals, in `[0°, 180°]`; an edge is sharp iff its angle exceeds the
    /// threshold. Edges with 0 or 1 incident faces (and non-manifold edges)
    /// have no angle and are never sharp. A zero-length face normal (collapsed
    /// face) yields an angle of 0, matching how degenerate geometry is treated
    /// elsewhere: excluded, not fatal.
    pub fn classify(adjacency: &Adjacency, face_normals: &[Vector3<R>], threshold_deg: R) -> Self {
        let threshold = threshold_deg * R::pi() / nalgebra::convert(180.0);
        let mut angles = Vec::with_capacity(adjacency.edge_count());
        let mut sharp = Vec::with_capacity(adjacency.edge_count());
        for edge in adjacency.edges() {
            let angle = if edge.is_manifold() {
                let (Some(f0), Some(f1)) = (edge.faces[0], edge.faces[1]) else {
                    unreachable!()
                };
                Some(dihedral_angle(
                    &face_normals[f0 as usize],
                    &face_normals[f1 as usize],
                ))
            } else {
                None
            };
            angles.push(angle);
            sharp.push(angle.is_some_and(|a| a > threshold));
        }
        Self { angles, sharp }
    }

    /// Dihedral angle of an edge in radians, if it has one.
    pub fn angle(&self, edge: EdgeIndex) -> Option<R> {
        self.angles[edge as usize]
    }

    pub fn is_sharp(&self, edge: EdgeIndex) -> bool {
        self.sharp[edge as usize]
    }

    pub fn sharp_count(&self) -> usize {
        self.sharp.iter().filter(|&&s| s).count()
    }
}

/// Unsigned angle between two (unit or zero) normals, in `[0, π]`. Zero
/// normals give 0 rather than NaN.
fn dihedral_angle<R: Real>(n0: &Vector3<R>, n1: &Vector3<R>) -> R {
    if n0.is_zero() || n1.is_zero() {
        return R::zero();
    }
    n0.dot(n1).clamp(-R::one(), R::one()).acos()
}

/// Per-vertex fraction of incident edges classified sharp. Transient, like
/// [SharpEdgeSet].
#[derive(Debug, Clone)]
pub struct VertexSharpness<R: Real>(Vec<R>);

impl<R: Real> VertexSharpness<R> {
    /// The denominator is the count of *all* incident edges (boundary and
    /// non-manifold included); only the numerator is restricted to sharp
    /// edges. A vertex with no incident edges has fraction 0.
    pub fn compute(adjacency: &Adjacency, sharp: &SharpEdgeSet<R>) -> Self {
        let fractions = (0..adjacency.vertex_count())
            .map(|v| {
                let edges = adjacency.vertex_edges(v as u32);
                if edges.is_empty() {
                    return R::zero();
                }
                let sharp_count = edges.iter().filter(|&&e| sharp.is_sharp(e)).count();
                nalgebra::convert::<f64, R>(sharp_count as f64 / edges.len() as f64)
            })
            .collect();
        Self(fractions)
    }

    pub fn fraction(&self, v: usize) -> R {
        self.0[v]
    }

    pub fn as_slice(&self) -> &[R] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Mesh;
    use nalgebra::Point3;

    /// Two triangles folded 90° about the shared edge (0,1), plus a coplanar
    /// third triangle and two boundary fans off vertex 0.
    fn folded() -> Mesh<f64> {
        Mesh::from_faces(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.5, 1.0, 0.0),
                Point3::new(0.5, 0.0, 1.0),
                Point3::new(-0.5, 1.0, 0.0),
            ],
            &[
                vec![0, 1, 2], // normal +z
                vec![1, 0, 3], // normal +y: folded 90°
                vec![0, 2, 4], // coplanar with face 0
            ],
        )
    }

    #[test]
    fn fold_is_sharp_above_threshold_only() {
        let mesh = folded();
        let adj = Adjacency::build(&mesh);
        for (threshold, expected) in [(45.0, 1), (89.9, 1), (90.1, 0), (120.0, 0)] {
            let sharp = SharpEdgeSet::classify(&adj, mesh.face_normals(), threshold);
            assert_eq!(sharp.sharp_count(), expected, "threshold {threshold}");
        }
    }

    #[test]
    fn boundary_edges_have_no_angle() {
        let mesh = folded();
        let adj = Adjacency::build(&mesh);
        let sharp = SharpEdgeSet::classify(&adj, mesh.face_normals(), 1.0);
        for (e, edge) in adj.edges().iter().enumerate() {
            if edge.is_manifold() {
                assert!(sharp.angle(e as u32).is_some());
            } else {
                assert!(sharp.angle(e as u32).is_none());
                assert!(!sharp.is_sharp(e as u32));
            }
        }
    }

    #[test]
    fn one_sharp_of_four_incident_is_quarter() {
        let mesh = folded();
        let adj = Adjacency::build(&mesh);
        let sharp = SharpEdgeSet::classify(&adj, mesh.face_normals(), 45.0);
        let fractions = VertexSharpness::compute(&adj, &sharp);
        // vertex 0 touches edges (0,1) [sharp], (0,2) [flat], (0,3), (0,4)
        assert_eq!(adj.vertex_edges(0).len(), 4);
        assert!((fractions.fraction(0) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn isolated_vertex_fraction_is_zero() {
        let mesh = Mesh::from_faces(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(9.0, 9.0, 9.0),
            ],
            &[vec![0, 1, 2]],
        );
        let adj = Adjacency::build(&mesh);
        let sharp = SharpEdgeSet::classify(&adj, mesh.face_normals(), 30.0);
        let fractions = VertexSharpness::compute(&adj, &sharp);
        assert_eq!(fractions.fraction(3), 0.0);
    }
}
