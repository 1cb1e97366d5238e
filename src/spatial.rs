//! A self-contained ray oracle backed by [parry3d], for hosts that have no
//! ray-cast facility of their own (and for exercising the engine end to end).
//!
//! parry is `f32`-only, so the oracle implements [RayOracle]`<f32>`; baking
//! at `f64` needs a host-provided oracle instead.

use parry3d::query::{Ray, RayCast};
use parry3d::shape::TriMesh;

use nalgebra::{Point3, Vector3};

use crate::error::Error;
use crate::mesh::Mesh;
use crate::occlusion::{HitInfo, RayOracle};

/// Casts rays against a fan-triangulated snapshot of a mesh.
///
/// The snapshot is taken at construction; rebuild the oracle after editing
/// the mesh, the same way adjacency is rebuilt per bake.
pub struct TriMeshOracle {
    shape: TriMesh,
}

impl TriMeshOracle {
    /// Triangulate `mesh` (fan per face; degenerate faces skipped) and build
    /// the acceleration structure.
    ///
    /// # Errors
    ///
    /// * [Error::MissingGeometry] if no triangle survives triangulation or
    ///   parry rejects the triangle soup.
    pub fn from_mesh(mesh: &Mesh<f32>) -> Result<Self, Error> {
        let mut indices: Vec<[u32; 3]> = Vec::new();
        for corners in mesh.faces() {
            if corners.len() < 3 {
                continue;
            }
            for i in 1..corners.len() - 1 {
                indices.push([corners[0], corners[i], corners[i + 1]]);
            }
        }
        if indices.is_empty() {
            return Err(Error::MissingGeometry);
        }
        let shape = TriMesh::new(mesh.positions().to_vec(), indices).map_err(|e| {
            tracing::warn!(error = %e, "triangle soup rejected");
            Error::MissingGeometry
        })?;
        Ok(Self { shape })
    }
}

impl RayOracle<f32> for TriMeshOracle {
    fn cast(
        &self,
        origin: &Point3<f32>,
        direction: &Vector3<f32>,
        max_distance: f32,
    ) -> Option<HitInfo<f32>> {
        let ray = Ray::new(*origin, *direction);
        let toi = self.shape.cast_local_ray(&ray, max_distance, true)?;
        Some(HitInfo {
            distance: toi,
            position: ray.point_at(toi),
        })
    }
}
