use crate::matrix_multiply::verify_planes;
use crate::{ConversionError, PixelBuffer, TransformMatrix};

/// Scales the Cb and Cr planes' distance from neutral gray
///
/// The source chroma planes are only ever read, so applying a different factor never compounds
/// on the result of a previous one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanarSaturationAdjuster {
    factor: f32,
    matrix: TransformMatrix,
}

impl PlanarSaturationAdjuster {
    /// `0.0` removes all color, `1.0` leaves the chroma unchanged and values above `1.0`
    /// intensify it until the planes saturate
    pub fn new(factor: f32) -> Result<Self, ConversionError> {
        Ok(Self {
            factor,
            matrix: TransformMatrix::saturation(factor)?,
        })
    }

    pub fn factor(&self) -> f32 {
        self.factor
    }

    pub fn matrix(&self) -> &TransformMatrix {
        &self.matrix
    }

    /// Write the adjusted `[cb, cr]` source planes into `[cb, cr]` destination planes
    pub fn apply(
        &self,
        [src_cb, src_cr]: [&PixelBuffer; 2],
        [dst_cb, dst_cr]: [&mut PixelBuffer; 2],
    ) -> Result<(), ConversionError> {
        verify_planes(&[src_cb, src_cr, &*dst_cb, &*dst_cr])?;

        self.matrix.apply_plane(src_cb, dst_cb)?;
        self.matrix.apply_plane(src_cr, dst_cr)?;

        tracing::trace!(factor = self.factor(), "applied saturation");

        Ok(())
    }
}

/// Scale the chroma of `source` by `factor` into `dest`, see [`PlanarSaturationAdjuster`]
pub fn apply_saturation(
    source: [&PixelBuffer; 2],
    dest: [&mut PixelBuffer; 2],
    factor: f32,
) -> Result<(), ConversionError> {
    PlanarSaturationAdjuster::new(factor)?.apply(source, dest)
}
