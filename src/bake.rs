use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use nalgebra::{Matrix3, Matrix4, Vector3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::error::Error;
use crate::mesh::{Mesh, Rgba};
use crate::occlusion::{sample_occlusion, RayOracle};
use crate::real::Real;
use crate::sharp::{SharpEdgeSet, VertexSharpness};
use crate::smooth::{smooth_vertex_colors, SmoothingParams};
use crate::topo::Adjacency;

/// The fixed bake base color: pure red. Occlusion and sharpness are both
/// subtractive fades from this, which is what makes the red-black encoding of
/// [crate::encoding] meaningful.
pub fn base_color<R: Real>() -> Vector3<R> {
    Vector3::new(R::one(), R::zero(), R::zero())
}

/// Immutable per-invocation bake configuration, validated at entry.
#[derive(Debug, Clone, PartialEq)]
pub struct BakeConfig<R: Real> {
    /// Blend strength of the occlusion fade.
    pub ao_strength: R,
    /// Blend strength of the sharp-edge fade.
    pub edge_strength: R,
    /// Occlusion rays per vertex. Must be positive.
    pub samples: u32,
    /// Maximum ray distance. Must be positive.
    pub max_distance: R,
    /// Dihedral angle threshold in degrees, in `(0, 180]`.
    pub sharp_angle_deg: R,
    /// Name of the per-corner color attribute written to (created if absent).
    pub attribute: String,
    /// Optional post-process smoothing of the baked field.
    pub smoothing: Option<SmoothingParams>,
    /// Seed for the sampling RNG; `None` draws one from process entropy.
    pub seed: Option<u64>,
}

impl<R: Real> Default for BakeConfig<R> {
    fn default() -> Self {
        Self {
            ao_strength: nalgebra::convert(0.7),
            edge_strength: nalgebra::convert(0.9),
            samples: 64,
            max_distance: R::one(),
            sharp_angle_deg: nalgebra::convert(30.0),
            attribute: "Col".to_owned(),
            smoothing: None,
            seed: None,
        }
    }
}

impl<R: Real> BakeConfig<R> {
    /// # Errors
    ///
    /// * [Error::InvalidConfig] for a zero sample count, a non-positive max
    ///   distance, a threshold outside `(0, 180]`, a negative strength, or an
    ///   empty attribute name.
    pub fn validate(&self) -> Result<(), Error> {
        if self.samples == 0 {
            return Err(Error::InvalidConfig("sample count must be positive"));
        }
        if self.max_distance <= R::zero() {
            return Err(Error::InvalidConfig("max ray distance must be positive"));
        }
        if self.sharp_angle_deg <= R::zero()
            || self.sharp_angle_deg > nalgebra::convert(180.0)
        {
            return Err(Error::InvalidConfig(
                "sharp angle threshold must be in (0, 180] degrees",
            ));
        }
        if self.ao_strength < R::zero() || self.edge_strength < R::zero() {
            return Err(Error::InvalidConfig("blend strengths must be >= 0"));
        }
        if self.attribute.is_empty() {
            return Err(Error::InvalidConfig("attribute name must not be empty"));
        }
        Ok(())
    }
}

/// Receives fractional bake progress, at most once per vertex. Purely a
/// side channel: its absence (or anything it does) never affects bake output.
pub trait ProgressSink {
    fn on_progress(&mut self, fraction: f64);
}

impl<F: FnMut(f64)> ProgressSink for F {
    fn on_progress(&mut self, fraction: f64) {
        self(fraction)
    }
}

/// Clone-to-share handle for cooperative cancellation. Checked between
/// vertices, never mid-sample.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Statistics from a completed bake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BakeReport {
    pub vertices: usize,
    pub sharp_edges: usize,
    pub degenerate_faces: usize,
    pub non_manifold_edges: usize,
}

/// Blend occlusion and sharpness into one corner color.
///
/// Deterministic: all randomness lives in the occlusion estimate, never here.
/// Every channel is clamped to `[0, 1]` and alpha is fixed at 1.
pub fn composite<R: Real>(ao: R, edge_frac: R, ao_strength: R, edge_strength: R) -> Rgba<R> {
    let fade = (R::one() - ao) * ao_strength + edge_frac * edge_strength;
    let base = base_color::<R>();
    Rgba::new(
        (base.x - fade).clamp(R::zero(), R::one()),
        (base.y - fade).clamp(R::zero(), R::one()),
        (base.z - fade).clamp(R::zero(), R::one()),
        R::one(),
    )
}

/// One bake invocation: oracle + config + optional transform, progress sink,
/// and cancel flag, applied to a mesh by [run](Self::run).
///
/// Derived structures (adjacency, sharpness, occlusion) are built fresh here
/// and dropped at the end; corner colors are buffered and committed to the
/// attribute only after the last vertex completes, so a cancelled or failed
/// bake leaves the mesh exactly as it was.
pub struct BakePass<'pass, R: Real, O: RayOracle<R> + ?Sized> {
    oracle: &'pass O,
    config: BakeConfig<R>,
    transform: Matrix4<R>,
    progress: Option<&'pass mut dyn ProgressSink>,
    cancel: Option<CancelFlag>,
}

impl<'pass, R: Real, O: RayOracle<R> + ?Sized> BakePass<'pass, R, O> {
    pub fn new(oracle: &'pass O, config: BakeConfig<R>) -> Self {
        Self {
            oracle,
            config,
            transform: Matrix4::identity(),
            progress: None,
            cancel: None,
        }
    }

    /// World matrix applied to vertex positions; its inverse-transpose
    /// (renormalized) is applied to normals.
    pub fn with_transform(mut self, transform: Matrix4<R>) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_progress(mut self, sink: &'pass mut dyn ProgressSink) -> Self {
        self.progress = Some(sink);
        self
    }

    pub fn with_cancel(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Run the bake with an RNG seeded from the config (or from process
    /// entropy when no seed is set).
    pub fn run(self, mesh: &mut Mesh<R>) -> Result<BakeReport, Error> {
        let seed = self.config.seed.unwrap_or_else(rand::random);
        self.run_with_rng(mesh, &mut Pcg32::seed_from_u64(seed))
    }

    /// Run the bake drawing jitter from a caller-provided RNG.
    pub fn run_with_rng<G: Rng + ?Sized>(
        mut self,
        mesh: &mut Mesh<R>,
        rng: &mut G,
    ) -> Result<BakeReport, Error> {
        self.config.validate()?;
        let total = mesh.vertex_count();
        if total == 0 {
            return Err(Error::MissingGeometry);
        }
        tracing::debug!(
            vertices = total,
            samples = self.config.samples,
            attribute = %self.config.attribute,
            "baking vertex colors"
        );

        // derived structures are per-invocation; nothing survives a mesh edit
        let adjacency = Adjacency::build(mesh);
        let sharp = SharpEdgeSet::classify(
            &adjacency,
            mesh.face_normals(),
            self.config.sharp_angle_deg,
        );
        let sharpness = VertexSharpness::compute(&adjacency, &sharp);
        let normals = normal_matrix(&self.transform);

        let mut vertex_colors: Vec<Rgba<R>> = Vec::with_capacity(total);
        for v in 0..total {
            if self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled) {
                tracing::debug!(vertex = v, "bake cancelled");
                return Err(Error::Cancelled { vertex: v });
            }
            let world_position = self.transform.transform_point(mesh.position(v));
            let world_normal = (normals * mesh.vertex_normal(v))
                .try_normalize(R::default_epsilon())
                .unwrap_or_else(Vector3::zeros);
            let ao = sample_occlusion(
                self.oracle,
                rng,
                &world_position,
                &world_normal,
                self.config.samples,
                self.config.max_distance,
            );
            vertex_colors.push(composite(
                ao,
                sharpness.fraction(v),
                self.config.ao_strength,
                self.config.edge_strength,
            ));
            if let Some(sink) = self.progress.as_deref_mut() {
                sink.on_progress((v + 1) as f64 / total as f64);
            }
        }

        if let Some(params) = self.config.smoothing {
            smooth_vertex_colors(&mut vertex_colors, &adjacency, params);
        }

        // commit: a full uninterrupted pass is the only path that writes
        mesh.write_corner_colors_by_vertex(&self.config.attribute, &vertex_colors);

        let report = BakeReport {
            vertices: total,
            sharp_edges: sharp.sharp_count(),
            degenerate_faces: adjacency.degenerate_faces().len(),
            non_manifold_edges: adjacency.non_manifold_edge_count(),
        };
        tracing::debug!(?report, "bake complete");
        Ok(report)
    }
}

/// Normal matrix of a world transform: inverse-transpose of the upper-left
/// 3×3. Falls back to the plain 3×3 when the inverse does not exist; normals
/// are renormalized after transformation either way.
fn normal_matrix<R: Real>(transform: &Matrix4<R>) -> Matrix3<R> {
    let linear: Matrix3<R> = transform.fixed_view::<3, 3>(0, 0).into_owned();
    linear
        .try_inverse()
        .map(|inv| inv.transpose())
        .unwrap_or(linear)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    #[test]
    fn composite_matches_blend_math() {
        // fully occluded, no edge term: r = 1 - 0.7
        let c: Rgba<f64> = composite(0.0, 0.0, 0.7, 0.0);
        assert!((c.x - 0.3).abs() < 1e-12);
        assert!((c.y - 0.0).abs() < 1e-12);
        assert!((c.z - 0.0).abs() < 1e-12);
        assert_eq!(c.w, 1.0);
    }

    #[test]
    fn composite_is_deterministic() {
        let a = composite(0.37, 0.25, 0.7, 0.9);
        let b = composite(0.37, 0.25, 0.7, 0.9);
        assert_eq!(a, b);
    }

    #[test]
    fn unoccluded_with_zero_edge_keeps_base() {
        assert_eq!(composite(1.0, 0.0, 0.7, 0.9), Rgba::new(1.0, 0.0, 0.0, 1.0));
    }

    #[quickcheck]
    fn composite_channels_stay_clamped(ao: u16, frac: u16, aos: u16, es: u16) -> bool {
        let unit = |x: u16| f64::from(x) / f64::from(u16::MAX);
        let c = composite(unit(ao), unit(frac), unit(aos) * 10.0, unit(es) * 10.0);
        let in_range = |x: f64| (0.0..=1.0).contains(&x);
        in_range(c.x) && in_range(c.y) && in_range(c.z) && c.w == 1.0
    }

    #[test]
    fn config_validation_rejects_degenerates() {
        let ok = BakeConfig::<f64>::default();
        assert!(ok.validate().is_ok());
        let cases: [Box<dyn Fn(&mut BakeConfig<f64>)>; 5] = [
            Box::new(|c| c.samples = 0),
            Box::new(|c| c.max_distance = 0.0),
            Box::new(|c| c.sharp_angle_deg = 0.0),
            Box::new(|c| c.sharp_angle_deg = 180.5),
            Box::new(|c| c.attribute.clear()),
        ];
        for broken in cases {
            let mut config = BakeConfig::<f64>::default();
            broken(&mut config);
            assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
        }
    }

    #[test]
    fn normal_matrix_inverts_nonuniform_scale() {
        let transform = Matrix4::new_nonuniform_scaling(&Vector3::new(2.0, 1.0, 1.0));
        let m = normal_matrix(&transform);
        let n = (m * Vector3::new(1.0, 1.0, 0.0)).normalize();
        // a normal on a stretched surface tilts toward the compressed axis
        assert!(n.x < n.y);
    }

    #[test]
    fn singular_transform_falls_back_to_linear_part() {
        let transform = Matrix4::from_diagonal(&nalgebra::Vector4::new(1.0, 1.0, 0.0, 1.0));
        let m = normal_matrix(&transform);
        assert_eq!(m, transform.fixed_view::<3, 3>(0, 0).into_owned());
    }
}
