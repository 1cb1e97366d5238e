//! Stylized vertex-color baking: estimates an ambient-occlusion-like score
//! per vertex through a host-provided ray oracle, combines it with a
//! dihedral sharp-edge signal, and writes the blended color into per-corner
//! attribute storage. A separate toggle flips baked data between red-black
//! and grayscale encodings.
//!
//! The engine is single-threaded and batch-shaped: one [bake::BakePass] per
//! invocation, derived topology rebuilt every time, corner writes committed
//! only after the full pass completes.
#![cfg_attr(not(debug_assertions), warn(missing_docs))]

pub mod bake;
pub mod encoding;
pub mod error;
pub mod mesh;
pub mod occlusion;
pub mod paint;
mod real;
pub mod sharp;
pub mod smooth;
#[cfg(feature = "spatial")]
pub mod spatial;
pub mod topo;

pub use bake::{BakeConfig, BakePass, BakeReport, CancelFlag, ProgressSink};
pub use encoding::{toggle_color_encoding, EncodingKind};
pub use error::Error;
pub use mesh::{CornerIndex, FaceIndex, Mesh, Rgba, VertexIndex};
pub use occlusion::{HitInfo, RayOracle};
pub use real::Real;
#[cfg(feature = "spatial")]
pub use spatial::TriMeshOracle;
