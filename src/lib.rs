//! Separate an RGB image into full resolution Y, Cb and Cr planes, scale the chroma planes
//! and rebuild an RGB image from the result.
//!
//! ```
//! # use chroma_subsampler::*;
//! let pixels = vec![200u8, 40, 40].repeat(16 * 16);
//!
//! let mut session = ChromaSubsampler::init(RgbImage::rgb8(&pixels, 16, 16))?;
//! session.convert()?;
//! session.apply_saturation(0.0)?;
//!
//! let gray = session.result()?;
//! assert!(gray.row(0).chunks_exact(3).all(|px| px[0] == px[1] && px[1] == px[2]));
//! # Ok::<(), ChromaError>(())
//! ```

pub use buffer::{AllocationError, DEFAULT_ROW_ALIGNMENT, PixelBuffer};
pub use color::ConversionMatrix;
pub use converter::{ColorConverter, UnsupportedFormatError};
pub use matrix_multiply::{TransformMatrix, matrix_multiply_planar8};
pub use pixel_format::{
    AlphaInfo, ChromaSiting, PixelFormat, PlaneDims, RgbFormat, SampleRange, YCbCrFormat,
};
pub use planes::{InvalidNumberOfPlanesError, YCbCrPlanes};
pub use saturation::{PlanarSaturationAdjuster, apply_saturation};
pub use subsampler::{
    ChromaError, ChromaSubsampler, InvalidImageError, ReconstructionError, RgbImage,
    SessionState, SubsamplerOptions,
};

mod buffer;
mod color;
mod converter;
mod copy;
mod formats;
mod matrix_multiply;
#[cfg(feature = "multi-thread")]
mod multi_thread;
mod pixel_format;
mod planes;
mod saturation;
mod subsampler;

#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error(transparent)]
    InvalidNumberOfPlanes(#[from] InvalidNumberOfPlanesError),

    #[error(
        "plane {plane} is {width}x{height}, expected {expected_width}x{expected_height}"
    )]
    DimensionMismatch {
        plane: usize,
        expected_width: usize,
        expected_height: usize,
        width: usize,
        height: usize,
    },

    #[error("plane {plane} has {got} bits per component, expected {expected}")]
    BitsPerComponentMismatch {
        plane: usize,
        expected: usize,
        got: usize,
    },

    #[error("plane {plane} has {got} channels, expected {expected}")]
    ChannelCountMismatch {
        plane: usize,
        expected: usize,
        got: usize,
    },

    #[error("the conversion matrix contains non-finite or out of range values")]
    InvalidMatrix,

    #[error("matrix divisor must be positive, got {0}")]
    InvalidDivisor(i32),

    #[error("matrix has {got} coefficients, expected {expected}")]
    MatrixSizeMismatch { expected: usize, got: usize },

    #[error("got {got} bias values, expected one per plane ({expected})")]
    BiasCountMismatch { expected: usize, got: usize },

    #[error("saturation factor must be finite and not negative, got {0}")]
    InvalidFactor(f32),
}
