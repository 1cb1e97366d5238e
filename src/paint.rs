use crate::error::Error;
use crate::mesh::{Mesh, Rgba, VertexIndex};
use crate::real::Real;

/// Write one color to every corner of a vertex selection, creating the
/// attribute if needed. Corners of unselected vertices are left alone, so a
/// selection can be recolored without disturbing a previous bake. Selection
/// entries past the vertex count are ignored.
///
/// # Errors
///
/// * [Error::InvalidConfig] for an empty attribute name.
pub fn paint_vertices<R: Real>(
    mesh: &mut Mesh<R>,
    selection: &[VertexIndex],
    color: Rgba<R>,
    attribute: &str,
) -> Result<(), Error> {
    if attribute.is_empty() {
        return Err(Error::InvalidConfig("attribute name must not be empty"));
    }
    let mut selected = vec![false; mesh.vertex_count()];
    for &v in selection {
        if let Some(flag) = selected.get_mut(v as usize) {
            *flag = true;
        }
    }
    let targets: Vec<usize> = mesh
        .corner_vertices()
        .iter()
        .enumerate()
        .filter(|&(_, &v)| selected[v as usize])
        .map(|(slot, _)| slot)
        .collect();
    let colors = mesh.color_attribute_or_create(attribute);
    for slot in targets {
        colors[slot] = color;
    }
    Ok(())
}
