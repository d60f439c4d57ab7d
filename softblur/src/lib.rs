//! Two-pass separable Gaussian blur for [`wgpu`] textures.
//!
//! A 2-D Gaussian blur factors into two sequential 1-D convolutions, cutting
//! the per-pixel sample cost from O(taps²) to O(taps). This crate implements
//! that as a pair of compute dispatches over two ping-pong scratch textures,
//! preceded by a downscale copy that trades blur resolution for speed and a
//! wider effective radius.
//!
//! # Usage
//!
//! ```rust,ignore
//! use softblur::{BlurParameters, BlurPass};
//!
//! let mut pass = BlurPass::new(BlurParameters::new(1.0, 100.0)?);
//!
//! // Each frame (or whenever the input changes):
//! let blurred = pass.blur(&device, &queue, &source_texture)?;
//! // `blurred` is a view at source size / 2, valid until the next call.
//!
//! // When the host configuration changes:
//! pass.set_parameters(2.0, 400.0)?;
//! ```
//!
//! The source texture must be 2-D and sampleable (`TEXTURE_BINDING`); the
//! result is `Rgba8Unorm` with `COPY_SRC`, so it can be composited or read
//! back. All work is encoded into a single queue submission, so downstream
//! consumers on the same queue need no extra synchronization.

mod error;
mod params;
mod pass;
mod pipeline;
mod weights;

pub use error::BlurError;
pub use params::{BlurParameters, OFFSET_RANGE, SPREAD_RANGE};
pub use pass::{BlurPass, DEFAULT_DOWNSCALE_FACTOR};
pub use weights::{TAP_COUNT, WeightTable};
