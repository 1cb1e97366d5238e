use crate::error::Error;
use crate::mesh::{Mesh, Rgba};
use crate::real::Real;

/// The two corner-color representations the toggle moves between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncodingKind {
    /// The bake output: luminance lives in the red channel, g = b = 0.
    RedBlack,
    /// Grayscale expansion: r = g = b.
    Grayscale,
}

/// Any green or blue above this classifies the data as already-grayscale.
const CHANNEL_EPS: f64 = 0.01;

/// Classify a corner-color buffer as red-black or grayscale.
///
/// This is a heuristic, not a tagged format: if *any* corner carries green or
/// blue above a small epsilon the data is treated as grayscale, otherwise as
/// red-black. Grayscale data whose channels are not exactly equal, or
/// red-black data with residual g/b noise, can be misclassified — a known
/// limitation of the encoding, kept as-is. Each mesh is classified
/// independently; callers processing several meshes get per-mesh decisions.
pub fn detect_encoding<R: Real>(colors: &[Rgba<R>]) -> EncodingKind {
    let eps: R = nalgebra::convert(CHANNEL_EPS);
    if colors.iter().any(|c| c.y > eps || c.z > eps) {
        EncodingKind::Grayscale
    } else {
        EncodingKind::RedBlack
    }
}

/// Flip a corner-color attribute between the red-black and grayscale
/// representations, returning the encoding the data has *afterwards*.
///
/// * red-black ⇒ grayscale: `(r, r, r, 1)`, red reused as luminance.
/// * grayscale ⇒ red-black: `(y, 0, 0, 1)` with ITU-R BT.601 luma
///   `y = 0.299·r + 0.587·g + 0.114·b`.
///
/// On exact bake output the round trip is lossless: `(v, 0, 0, 1)` expands to
/// `(v, v, v, 1)`, and with r = g = b the luma reduces to r. See
/// [detect_encoding] for the classification caveats.
///
/// # Errors
///
/// * [Error::AttributeNotFound] if the mesh has no such attribute. Not fatal
///   when processing several meshes; skip and continue.
pub fn toggle_color_encoding<R: Real>(
    mesh: &mut Mesh<R>,
    attribute: &str,
) -> Result<EncodingKind, Error> {
    let Some(colors) = mesh.color_attribute_mut(attribute) else {
        return Err(Error::AttributeNotFound(attribute.to_owned()));
    };
    let detected = detect_encoding(colors);
    tracing::debug!(?detected, attribute, "toggling corner color encoding");
    match detected {
        EncodingKind::RedBlack => {
            for c in colors.iter_mut() {
                *c = Rgba::new(c.x, c.x, c.x, R::one());
            }
            Ok(EncodingKind::Grayscale)
        }
        EncodingKind::Grayscale => {
            let (wr, wg, wb): (R, R, R) = (
                nalgebra::convert(0.299),
                nalgebra::convert(0.587),
                nalgebra::convert(0.114),
            );
            for c in colors.iter_mut() {
                let luma = wr * c.x + wg * c.y + wb * c.z;
                *c = Rgba::new(luma, R::zero(), R::zero(), R::one());
            }
            Ok(EncodingKind::RedBlack)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn mesh_with(colors: &[Rgba<f64>]) -> Mesh<f64> {
        let mut mesh = Mesh::from_faces(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            &[vec![0, 1, 2]],
        );
        mesh.color_attribute_or_create("Col").copy_from_slice(colors);
        mesh
    }

    #[test]
    fn red_black_expands_to_grayscale() {
        let mut mesh = mesh_with(&[
            Rgba::new(0.3, 0.0, 0.0, 1.0),
            Rgba::new(1.0, 0.0, 0.0, 1.0),
            Rgba::new(0.0, 0.0, 0.0, 1.0),
        ]);
        let kind = toggle_color_encoding(&mut mesh, "Col").unwrap();
        assert_eq!(kind, EncodingKind::Grayscale);
        let colors = mesh.color_attribute("Col").unwrap();
        assert_eq!(colors[0], Rgba::new(0.3, 0.3, 0.3, 1.0));
        assert_eq!(colors[1], Rgba::new(1.0, 1.0, 1.0, 1.0));
        assert_eq!(colors[2], Rgba::new(0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn grayscale_collapses_via_bt601_luma() {
        let mut mesh = mesh_with(&[
            Rgba::new(0.5, 0.5, 0.5, 1.0),
            Rgba::new(1.0, 0.0, 1.0, 1.0),
            Rgba::new(0.0, 1.0, 0.0, 1.0),
        ]);
        let kind = toggle_color_encoding(&mut mesh, "Col").unwrap();
        assert_eq!(kind, EncodingKind::RedBlack);
        let colors = mesh.color_attribute("Col").unwrap();
        assert!((colors[0].x - 0.5).abs() < 1e-12); // r=g=b reduces to r
        assert!((colors[1].x - (0.299 + 0.114)).abs() < 1e-12);
        assert!((colors[2].x - 0.587).abs() < 1e-12);
        for c in colors {
            assert_eq!((c.y, c.z, c.w), (0.0, 0.0, 1.0));
        }
    }

    #[test]
    fn exact_round_trip_is_lossless() {
        let original = [
            Rgba::new(0.25, 0.0, 0.0, 1.0),
            Rgba::new(0.75, 0.0, 0.0, 1.0),
            Rgba::new(0.0, 0.0, 0.0, 1.0),
        ];
        let mut mesh = mesh_with(&original);
        assert_eq!(
            toggle_color_encoding(&mut mesh, "Col").unwrap(),
            EncodingKind::Grayscale
        );
        assert_eq!(
            toggle_color_encoding(&mut mesh, "Col").unwrap(),
            EncodingKind::RedBlack
        );
        let colors = mesh.color_attribute("Col").unwrap();
        for (after, before) in colors.iter().zip(&original) {
            assert!((after.x - before.x).abs() < 1e-12);
            assert_eq!((after.y, after.z, after.w), (0.0, 0.0, 1.0));
        }
    }

    #[test]
    fn trace_green_keeps_red_black_classification() {
        // below the 0.01 epsilon: still counts as red-black
        let mut mesh = mesh_with(&[Rgba::new(0.4, 0.009, 0.0, 1.0); 3]);
        assert_eq!(
            toggle_color_encoding(&mut mesh, "Col").unwrap(),
            EncodingKind::Grayscale
        );
    }

    #[test]
    fn missing_attribute_is_reported() {
        let mut mesh = mesh_with(&[Rgba::new(1.0, 0.0, 0.0, 1.0); 3]);
        assert!(matches!(
            toggle_color_encoding(&mut mesh, "Missing"),
            Err(Error::AttributeNotFound(name)) if name == "Missing"
        ));
    }
}
