use nalgebra::RealField;
use rand::distr::uniform::SampleUniform;

// TODO :: convert to trait alias once https://github.com/rust-lang/rfcs/pull/1733 is stabilized
/// Trait alias for scalar types usable as the engine's real-number type,
/// so that everything can be generic over {f32, f64} without dragging the
/// full bound list around.
///
/// `SampleUniform` is required so that occlusion jitter can be drawn
/// directly in the working scalar type.
pub trait Real: RealField + Copy + SampleUniform {}

impl<R> Real for R where R: RealField + Copy + SampleUniform {}
