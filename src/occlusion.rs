use nalgebra::{Point3, Vector3};
use rand::Rng;

use crate::real::Real;

/// A reported ray intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitInfo<R: Real> {
    /// Distance from the ray origin to the intersection.
    pub distance: R,
    /// The intersection point.
    pub position: Point3<R>,
}

/// The host-provided ray-intersection oracle.
///
/// Called up to `vertices × samples` times per bake, in no particular order.
/// The contract is infallible: an oracle that fails internally for a single
/// cast should report `None` (a miss), which conservatively *reduces*
/// occlusion rather than aborting the bake.
pub trait RayOracle<R: Real> {
    fn cast(
        &self,
        origin: &Point3<R>,
        direction: &Vector3<R>,
        max_distance: R,
    ) -> Option<HitInfo<R>>;
}

impl<R: Real, O: RayOracle<R> + ?Sized> RayOracle<R> for &O {
    fn cast(
        &self,
        origin: &Point3<R>,
        direction: &Vector3<R>,
        max_distance: R,
    ) -> Option<HitInfo<R>> {
        (**self).cast(origin, direction, max_distance)
    }
}

/// Offset along the surface normal applied to every ray origin, so rays do
/// not immediately re-hit the surface they start on.
pub fn self_occlusion_offset<R: Real>() -> R {
    nalgebra::convert(0.01)
}

/// Estimate how unoccluded a surface point is: `1.0` = no sampled ray hit
/// anything, `0.0` = every sampled ray hit.
///
/// Each sample jitters the surface normal by a per-component uniform offset
/// in `[-1, 1]` and normalizes the result, then casts from `position +
/// normal * 0.01`. This is a biased, single-bounce, cosine-agnostic
/// approximation intended for stylized shading, not a physically normalized
/// AO estimate: directions cluster around the normal but are not
/// cosine-weighted, and some may dip below the surface plane.
///
/// A jitter that exactly cancels the normal (or a zero normal with zero
/// jitter) has no direction to cast along and counts as a miss. `samples ==
/// 0` is rejected by bake-config validation before this is reached; called
/// directly it returns `1.0`.
pub fn sample_occlusion<R, O, G>(
    oracle: &O,
    rng: &mut G,
    position: &Point3<R>,
    normal: &Vector3<R>,
    samples: u32,
    max_distance: R,
) -> R
where
    R: Real,
    O: RayOracle<R> + ?Sized,
    G: Rng + ?Sized,
{
    debug_assert!(samples > 0, "sample count must be validated by the caller");
    if samples == 0 {
        return R::one();
    }
    let origin = position + normal * self_occlusion_offset::<R>();
    let mut hits: u32 = 0;
    for _ in 0..samples {
        let jitter = Vector3::new(
            rng.random_range(-R::one()..=R::one()),
            rng.random_range(-R::one()..=R::one()),
            rng.random_range(-R::one()..=R::one()),
        );
        let Some(direction) = (normal + jitter).try_normalize(R::default_epsilon()) else {
            continue;
        };
        if oracle
            .cast(&origin, &direction, max_distance)
            .is_some_and(|hit| hit.distance <= max_distance)
        {
            hits += 1;
        }
    }
    R::one() - nalgebra::convert::<f64, R>(f64::from(hits) / f64::from(samples))
}
