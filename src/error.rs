/// Errors related to baking and color-encoding operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Rejected at entry, before anything is computed or written.
    #[error("Invalid bake configuration: {0}")]
    InvalidConfig(&'static str),
    /// The mesh has nothing to bake onto.
    #[error("Attempted to bake a mesh with no vertices")]
    MissingGeometry,
    /// Attempted to operate on a color attribute that was never created.
    #[error("Attempted to access a color attribute that does not exist: {0:?}")]
    AttributeNotFound(String),
    /// Cooperative cancellation was honored between vertices; no attribute
    /// data was written.
    #[error("Bake cancelled while processing vertex {vertex}")]
    Cancelled {
        /// The vertex that was about to be sampled when the flag was observed.
        vertex: usize,
    },
}
