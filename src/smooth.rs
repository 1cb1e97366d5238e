//! Optional Laplacian smoothing of a baked color field.
//!
//! Smoothing runs on a *per-vertex* color representation, not the per-corner
//! storage the compositor writes. [vertex_colors_from_corners] averages a
//! corner attribute down to vertices;
//! [Mesh::write_corner_colors_by_vertex](crate::mesh::Mesh::write_corner_colors_by_vertex)
//! bridges the smoothed field back to corners.

use nalgebra::Vector4;

use crate::error::Error;
use crate::mesh::{Mesh, Rgba, VertexIndex};
use crate::real::Real;
use crate::topo::Adjacency;

/// Tunables for the smoothing pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmoothingParams {
    /// Number of relaxation iterations.
    pub iterations: u32,
    /// Whether a vertex's own prior value joins the average alongside its
    /// neighbors.
    pub include_self: bool,
}

impl Default for SmoothingParams {
    fn default() -> Self {
        Self {
            iterations: 1,
            include_self: true,
        }
    }
}

/// Run `params.iterations` rounds of neighbor averaging over the
/// vertex-adjacency graph. Vertices with no incident edges keep their color.
/// Alpha is pinned to 1 regardless of the averaged value.
pub fn smooth_vertex_colors<R: Real>(
    colors: &mut Vec<Rgba<R>>,
    adjacency: &Adjacency,
    params: SmoothingParams,
) {
    debug_assert_eq!(colors.len(), adjacency.vertex_count());
    let mut next = colors.clone();
    for _ in 0..params.iterations {
        for v in 0..colors.len() {
            let edges = adjacency.vertex_edges(v as VertexIndex);
            if edges.is_empty() {
                next[v] = colors[v];
                continue;
            }
            let mut sum: Vector4<R> = Vector4::zeros();
            let mut count: u32 = 0;
            if params.include_self {
                sum += colors[v];
                count += 1;
            }
            for &e in edges {
                let other = adjacency.edge(e).key.other(v as VertexIndex);
                sum += colors[other as usize];
                count += 1;
            }
            let mean = sum / nalgebra::convert::<f64, R>(f64::from(count));
            next[v] = Rgba::new(mean.x, mean.y, mean.z, R::one());
        }
        std::mem::swap(colors, &mut next);
    }
}

/// Collapse a per-corner color attribute to a per-vertex field by averaging
/// every corner touching each vertex. Vertices with no corners get the
/// attribute fill color.
///
/// # Errors
///
/// * [Error::AttributeNotFound] if the attribute does not exist.
pub fn vertex_colors_from_corners<R: Real>(
    mesh: &Mesh<R>,
    attribute: &str,
) -> Result<Vec<Rgba<R>>, Error> {
    let Some(corner_colors) = mesh.color_attribute(attribute) else {
        return Err(Error::AttributeNotFound(attribute.to_owned()));
    };
    let mut sums: Vec<Vector4<R>> = vec![Vector4::zeros(); mesh.vertex_count()];
    let mut counts: Vec<u32> = vec![0; mesh.vertex_count()];
    for (slot, &v) in mesh.corner_vertices().iter().enumerate() {
        sums[v as usize] += corner_colors[slot];
        counts[v as usize] += 1;
    }
    Ok(sums
        .into_iter()
        .zip(counts)
        .map(|(sum, count)| {
            if count == 0 {
                crate::mesh::attribute_fill()
            } else {
                let mean = sum / nalgebra::convert::<f64, R>(f64::from(count));
                Rgba::new(mean.x, mean.y, mean.z, R::one())
            }
        })
        .collect())
}
