use crate::formats::{RgbReader, RgbToYCbCr, RgbWriter, YCbCrToRgb};
use crate::planes::{read_planes, read_planes_mut};
use crate::{
    ConversionError, ConversionMatrix, PixelBuffer, PixelFormat, RgbFormat, SampleRange,
    YCbCrFormat,
};

/// A format pairing [`ColorConverter`] has no transform for
#[derive(Debug, thiserror::Error)]
pub enum UnsupportedFormatError {
    #[error("no transform from {src:?} to {dst:?}")]
    Pairing { src: PixelFormat, dst: PixelFormat },

    #[error("{0} bits per component are not supported, only 8")]
    BitsPerComponent(usize),

    #[error("video range YCbCr is not supported, only full range")]
    VideoRange,
}

#[derive(Debug, Clone, Copy)]
enum Kernel {
    Forward(RgbToYCbCr),
    Reverse(YCbCrToRgb),
}

/// Converts between interleaved RGB and planar YCbCr
///
/// ```
/// # use chroma_subsampler::*;
/// let converter = ColorConverter::create_forward(
///     PixelFormat::RGB8,
///     PixelFormat::YCBCR8_PLANAR_FULL_RANGE,
///     ConversionMatrix::ITU_R_601_4,
///     [0.0; 4],
/// )?;
///
/// let rgb = PixelBuffer::allocate(64, 32, 8, 3)?;
/// let mut y = PixelBuffer::allocate(64, 32, 8, 1)?;
/// let mut cb = PixelBuffer::allocate(64, 32, 8, 1)?;
/// let mut cr = PixelBuffer::allocate(64, 32, 8, 1)?;
///
/// converter.convert(&[&rgb], &mut [&mut y, &mut cb, &mut cr])?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ColorConverter {
    src: PixelFormat,
    dst: PixelFormat,
    matrix: ConversionMatrix,
    background: [f32; 4],
    kernel: Kernel,
}

impl ColorConverter {
    /// Create a converter from interleaved RGB into planar YCbCr
    ///
    /// `background` is an RGBA color in 0.0..=1.0 that alpha-bearing source pixels are
    /// composited over.
    pub fn create_forward(
        src: PixelFormat,
        dst: PixelFormat,
        matrix: ConversionMatrix,
        background: [f32; 4],
    ) -> Result<Self, UnsupportedFormatError> {
        let (PixelFormat::Rgb(rgb), PixelFormat::YCbCrPlanar(ycbcr)) = (src, dst) else {
            return Err(UnsupportedFormatError::Pairing { src, dst });
        };

        verify_formats(&rgb, &ycbcr)?;

        tracing::debug!(?src, ?dst, "created forward converter");

        Ok(Self {
            src,
            dst,
            matrix,
            background,
            kernel: Kernel::Forward(RgbToYCbCr {
                matrix,
                reader: RgbReader::new(&rgb, background),
            }),
        })
    }

    /// Create a converter from planar YCbCr into interleaved RGB
    ///
    /// An alpha channel in `dst` is written fully opaque.
    pub fn create_reverse(
        src: PixelFormat,
        dst: PixelFormat,
        matrix: ConversionMatrix,
        background: [f32; 4],
    ) -> Result<Self, UnsupportedFormatError> {
        let (PixelFormat::YCbCrPlanar(ycbcr), PixelFormat::Rgb(rgb)) = (src, dst) else {
            return Err(UnsupportedFormatError::Pairing { src, dst });
        };

        verify_formats(&rgb, &ycbcr)?;

        tracing::debug!(?src, ?dst, "created reverse converter");

        Ok(Self {
            src,
            dst,
            matrix,
            background,
            kernel: Kernel::Reverse(YCbCrToRgb {
                matrix,
                writer: RgbWriter::new(&rgb),
            }),
        })
    }

    pub fn source_format(&self) -> PixelFormat {
        self.src
    }

    pub fn destination_format(&self) -> PixelFormat {
        self.dst
    }

    pub fn matrix(&self) -> &ConversionMatrix {
        &self.matrix
    }

    pub fn background(&self) -> [f32; 4] {
        self.background
    }

    pub fn number_of_source_buffers(&self) -> usize {
        self.src.plane_count()
    }

    pub fn number_of_destination_buffers(&self) -> usize {
        self.dst.plane_count()
    }

    /// Allocate destination buffers for a `width` x `height` image
    ///
    /// For planar YCbCr all three planes get the full image resolution.
    pub fn allocate_destination_buffers(
        &self,
        width: usize,
        height: usize,
        row_alignment: usize,
    ) -> Result<Vec<PixelBuffer>, crate::AllocationError> {
        self.dst.allocate_planes(width, height, row_alignment)
    }

    /// Convert `src` into `dst`
    ///
    /// Buffers are passed in plane order (Y, Cb, Cr for planar YCbCr). Every buffer must have the
    /// dimensions of the first source buffer. Nothing is written unless all checks pass.
    pub fn convert(
        &self,
        src: &[&PixelBuffer],
        dst: &mut [&mut PixelBuffer],
    ) -> Result<(), ConversionError> {
        self.verify(src, dst)?;

        match &self.kernel {
            Kernel::Forward(kernel) => {
                let [rgb] = read_planes::<1>(src)?;
                kernel.convert(rgb, read_planes_mut::<3>(dst)?);
            }
            Kernel::Reverse(kernel) => {
                let [rgb] = read_planes_mut::<1>(dst)?;
                kernel.convert(read_planes::<3>(src)?, rgb);
            }
        }

        Ok(())
    }

    /// Same as [`convert`](Self::convert) but spreads the rows over the rayon thread pool
    #[cfg(feature = "multi-thread")]
    pub fn convert_multi_thread(
        &self,
        src: &[&PixelBuffer],
        dst: &mut [&mut PixelBuffer],
    ) -> Result<(), ConversionError> {
        if num_cpus::get() == 1 {
            return self.convert(src, dst);
        }

        self.verify(src, dst)?;

        match &self.kernel {
            Kernel::Forward(kernel) => {
                let [rgb] = read_planes::<1>(src)?;
                crate::multi_thread::rgb_to_ycbcr(kernel, rgb, read_planes_mut::<3>(dst)?);
            }
            Kernel::Reverse(kernel) => {
                let [rgb] = read_planes_mut::<1>(dst)?;
                crate::multi_thread::ycbcr_to_rgb(kernel, read_planes::<3>(src)?, rgb);
            }
        }

        Ok(())
    }

    fn verify(&self, src: &[&PixelBuffer], dst: &[&mut PixelBuffer]) -> Result<(), ConversionError> {
        if !self.matrix.is_valid() {
            return Err(ConversionError::InvalidMatrix);
        }

        let Some(first) = src.first() else {
            return Err(ConversionError::InvalidNumberOfPlanes(
                crate::InvalidNumberOfPlanesError {
                    expected: self.number_of_source_buffers(),
                    got: 0,
                },
            ));
        };

        let (width, height) = (first.width(), first.height());

        let dst: Vec<&PixelBuffer> = dst.iter().map(|plane| &**plane).collect();

        self.src.bounds_check(src, width, height)?;
        self.dst.bounds_check(&dst, width, height)?;

        Ok(())
    }
}

fn verify_formats(rgb: &RgbFormat, ycbcr: &YCbCrFormat) -> Result<(), UnsupportedFormatError> {
    for bits in [rgb.bits_per_component, ycbcr.bits_per_component] {
        if bits != 8 {
            return Err(UnsupportedFormatError::BitsPerComponent(bits));
        }
    }

    if ycbcr.range == SampleRange::Video {
        return Err(UnsupportedFormatError::VideoRange);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AlphaInfo, ChromaSiting};

    fn forward(src: PixelFormat) -> ColorConverter {
        ColorConverter::create_forward(
            src,
            PixelFormat::YCBCR8_PLANAR_FULL_RANGE,
            ConversionMatrix::ITU_R_601_4,
            [0.0; 4],
        )
        .unwrap()
    }

    fn reverse(dst: PixelFormat) -> ColorConverter {
        ColorConverter::create_reverse(
            PixelFormat::YCBCR8_PLANAR_FULL_RANGE,
            dst,
            ConversionMatrix::ITU_R_601_4,
            [0.0; 4],
        )
        .unwrap()
    }

    fn filled(width: usize, height: usize, channels: usize, px: &[u8]) -> PixelBuffer {
        let mut buffer = PixelBuffer::allocate(width, height, 8, channels).unwrap();
        for row in buffer.rows_mut() {
            for chunk in row.chunks_exact_mut(channels) {
                chunk.copy_from_slice(px);
            }
        }
        buffer
    }

    #[test]
    fn unsupported_pairings() {
        let matrix = ConversionMatrix::ITU_R_601_4;

        assert!(matches!(
            ColorConverter::create_forward(PixelFormat::RGB8, PixelFormat::RGB8, matrix, [0.0; 4]),
            Err(UnsupportedFormatError::Pairing { .. })
        ));
        assert!(matches!(
            ColorConverter::create_reverse(
                PixelFormat::RGB8,
                PixelFormat::YCBCR8_PLANAR_FULL_RANGE,
                matrix,
                [0.0; 4]
            ),
            Err(UnsupportedFormatError::Pairing { .. })
        ));

        let video_range = PixelFormat::YCbCrPlanar(YCbCrFormat {
            bits_per_component: 8,
            range: SampleRange::Video,
            siting: ChromaSiting::Center,
        });
        assert!(matches!(
            ColorConverter::create_forward(PixelFormat::RGB8, video_range, matrix, [0.0; 4]),
            Err(UnsupportedFormatError::VideoRange)
        ));

        let rgb16 = PixelFormat::Rgb(RgbFormat {
            bits_per_component: 16,
            alpha: AlphaInfo::None,
        });
        assert!(matches!(
            ColorConverter::create_reverse(
                PixelFormat::YCBCR8_PLANAR_FULL_RANGE,
                rgb16,
                matrix,
                [0.0; 4]
            ),
            Err(UnsupportedFormatError::BitsPerComponent(16))
        ));
    }

    #[test]
    fn any_chroma_siting_is_accepted() {
        let top_left = PixelFormat::YCbCrPlanar(YCbCrFormat {
            bits_per_component: 8,
            range: SampleRange::Full,
            siting: ChromaSiting::TopLeft,
        });

        assert!(
            ColorConverter::create_forward(
                PixelFormat::RGB8,
                top_left,
                ConversionMatrix::ITU_R_601_4,
                [0.0; 4]
            )
            .is_ok()
        );
    }

    #[test]
    fn buffer_counts() {
        let converter = forward(PixelFormat::RGB8);
        assert_eq!(converter.number_of_source_buffers(), 1);
        assert_eq!(converter.number_of_destination_buffers(), 3);

        let planes = converter.allocate_destination_buffers(9, 3, 16).unwrap();
        assert_eq!(planes.len(), 3);
        assert!(planes.iter().all(|p| p.width() == 9 && p.height() == 3));

        let converter = reverse(PixelFormat::RGBA8);
        assert_eq!(converter.number_of_source_buffers(), 3);
        assert_eq!(converter.number_of_destination_buffers(), 1);
    }

    #[test]
    fn forward_writes_all_planes() {
        let rgb = filled(5, 3, 3, &[255, 0, 0]);
        let mut y = PixelBuffer::allocate(5, 3, 8, 1).unwrap();
        let mut cb = PixelBuffer::allocate(5, 3, 8, 1).unwrap();
        let mut cr = PixelBuffer::allocate(5, 3, 8, 1).unwrap();

        forward(PixelFormat::RGB8)
            .convert(&[&rgb], &mut [&mut y, &mut cb, &mut cr])
            .unwrap();

        assert!(y.rows().flatten().all(|&v| v == 76));
        assert!(cb.rows().flatten().all(|&v| v == 85));
        assert!(cr.rows().flatten().all(|&v| v == 255));
    }

    #[test]
    fn source_is_not_modified() {
        let rgb = filled(4, 4, 3, &[10, 200, 30]);
        let before = rgb.to_packed_vec();

        let mut planes = PixelFormat::YCBCR8_PLANAR_FULL_RANGE
            .allocate_planes(4, 4, 16)
            .unwrap();
        let mut dst: Vec<&mut PixelBuffer> = planes.iter_mut().collect();

        forward(PixelFormat::RGB8).convert(&[&rgb], &mut dst).unwrap();

        assert_eq!(rgb.to_packed_vec(), before);
    }

    #[test]
    fn rgba_source_is_flattened_over_background() {
        let rgba = filled(2, 2, 4, &[255, 255, 255, 0]);
        let mut y = PixelBuffer::allocate(2, 2, 8, 1).unwrap();
        let mut cb = PixelBuffer::allocate(2, 2, 8, 1).unwrap();
        let mut cr = PixelBuffer::allocate(2, 2, 8, 1).unwrap();

        // fully transparent white over transparent black is black
        forward(PixelFormat::RGBA8)
            .convert(&[&rgba], &mut [&mut y, &mut cb, &mut cr])
            .unwrap();

        assert!(y.rows().flatten().all(|&v| v == 0));
        assert!(cb.rows().flatten().all(|&v| v == 128));
        assert!(cr.rows().flatten().all(|&v| v == 128));
    }

    #[test]
    fn reverse_into_rgba_is_opaque() {
        let y = filled(3, 2, 1, &[90]);
        let cb = filled(3, 2, 1, &[128]);
        let cr = filled(3, 2, 1, &[128]);
        let mut rgba = PixelBuffer::allocate(3, 2, 8, 4).unwrap();

        reverse(PixelFormat::RGBA8)
            .convert(&[&y, &cb, &cr], &mut [&mut rgba])
            .unwrap();

        for px in rgba.rows().flat_map(|row| row.chunks_exact(4)) {
            assert_eq!(px, &[90, 90, 90, 255]);
        }
    }

    #[test]
    fn wrong_number_of_buffers() {
        let rgb = filled(2, 2, 3, &[1, 2, 3]);
        let mut y = PixelBuffer::allocate(2, 2, 8, 1).unwrap();
        let mut cb = PixelBuffer::allocate(2, 2, 8, 1).unwrap();

        let err = forward(PixelFormat::RGB8)
            .convert(&[&rgb], &mut [&mut y, &mut cb])
            .unwrap_err();
        assert!(matches!(err, ConversionError::InvalidNumberOfPlanes(_)));

        let err = forward(PixelFormat::RGB8)
            .convert(&[], &mut [&mut y, &mut cb])
            .unwrap_err();
        assert!(matches!(err, ConversionError::InvalidNumberOfPlanes(_)));
    }

    #[test]
    fn dimension_mismatch_writes_nothing() {
        let rgb = filled(4, 4, 3, &[1, 2, 3]);
        let mut y = PixelBuffer::allocate(4, 4, 8, 1).unwrap();
        let mut cb = PixelBuffer::allocate(4, 4, 8, 1).unwrap();
        let mut cr = PixelBuffer::allocate(2, 4, 8, 1).unwrap();

        let err = forward(PixelFormat::RGB8)
            .convert(&[&rgb], &mut [&mut y, &mut cb, &mut cr])
            .unwrap_err();

        assert!(matches!(
            err,
            ConversionError::DimensionMismatch { plane: 2, .. }
        ));
        assert!(y.as_slice().iter().all(|&v| v == 0));
    }

    #[test]
    fn wrong_channel_count() {
        let rgba = filled(2, 2, 4, &[1, 2, 3, 4]);
        let mut y = PixelBuffer::allocate(2, 2, 8, 1).unwrap();
        let mut cb = PixelBuffer::allocate(2, 2, 8, 1).unwrap();
        let mut cr = PixelBuffer::allocate(2, 2, 8, 1).unwrap();

        let err = forward(PixelFormat::RGB8)
            .convert(&[&rgba], &mut [&mut y, &mut cb, &mut cr])
            .unwrap_err();

        assert!(matches!(
            err,
            ConversionError::ChannelCountMismatch { plane: 0, expected: 3, got: 4 }
        ));
    }

    #[test]
    fn invalid_matrix_fails_conversion() {
        let converter = ColorConverter::create_forward(
            PixelFormat::RGB8,
            PixelFormat::YCBCR8_PLANAR_FULL_RANGE,
            ConversionMatrix::from_luma_coefficients(0.7, 0.7),
            [0.0; 4],
        )
        .unwrap();

        let rgb = filled(2, 2, 3, &[1, 2, 3]);
        let mut y = PixelBuffer::allocate(2, 2, 8, 1).unwrap();
        let mut cb = PixelBuffer::allocate(2, 2, 8, 1).unwrap();
        let mut cr = PixelBuffer::allocate(2, 2, 8, 1).unwrap();

        assert!(matches!(
            converter.convert(&[&rgb], &mut [&mut y, &mut cb, &mut cr]),
            Err(ConversionError::InvalidMatrix)
        ));
    }

    #[cfg(feature = "multi-thread")]
    #[test]
    fn multi_thread_matches_single_thread() {
        let (width, height) = (33, 17);
        let mut rgb = PixelBuffer::allocate(width, height, 8, 3).unwrap();
        for (y, row) in rgb.rows_mut().enumerate() {
            for (x, px) in row.chunks_exact_mut(3).enumerate() {
                px.copy_from_slice(&[(x * 7) as u8, (y * 13) as u8, (x * y) as u8]);
            }
        }

        let converter = forward(PixelFormat::RGB8);

        let mut single = converter.allocate_destination_buffers(width, height, 16).unwrap();
        let mut multi = converter.allocate_destination_buffers(width, height, 16).unwrap();

        converter
            .convert(&[&rgb], &mut single.iter_mut().collect::<Vec<_>>())
            .unwrap();
        converter
            .convert_multi_thread(&[&rgb], &mut multi.iter_mut().collect::<Vec<_>>())
            .unwrap();

        for (a, b) in single.iter().zip(&multi) {
            assert_eq!(a.as_slice(), b.as_slice());
        }

        let reverse = reverse(PixelFormat::RGB8);
        let mut out_single = PixelBuffer::allocate(width, height, 8, 3).unwrap();
        let mut out_multi = PixelBuffer::allocate(width, height, 8, 3).unwrap();

        let planes: Vec<&PixelBuffer> = single.iter().collect();
        reverse.convert(&planes, &mut [&mut out_single]).unwrap();
        reverse
            .convert_multi_thread(&planes, &mut [&mut out_multi])
            .unwrap();

        assert_eq!(out_single.as_slice(), out_multi.as_slice());
    }
}
