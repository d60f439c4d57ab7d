use thiserror::Error;

/// Errors surfaced by blur configuration and execution.
///
/// A source-resolution change is not an error: the pass reallocates its
/// scratch textures and continues (see [`crate::BlurPass::blur`]).
#[derive(Debug, Error)]
pub enum BlurError {
    /// A parameter is outside its documented range.
    #[error("{name} must be within [{min}, {max}], got {value}")]
    InvalidParameter {
        /// Name of the offending parameter.
        name: &'static str,
        /// Value the caller supplied.
        value: f32,
        /// Lower bound of the accepted range.
        min: f32,
        /// Upper bound of the accepted range.
        max: f32,
    },
    /// The source texture cannot be consumed at initialization time.
    ///
    /// The pass stays uninitialized; the next blur request retries.
    #[error("cannot initialize blur pass: {0}")]
    ResourceUnavailable(String),
}
