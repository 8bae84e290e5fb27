use crate::{AllocationError, ConversionError, PixelBuffer};

/// Placement of the alpha channel in an interleaved RGB format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlphaInfo {
    /// No alpha channel, 3 components per pixel
    None,

    /// Straight alpha as the 4th component
    Last,

    /// Premultiplied alpha as the 4th component
    PremultipliedLast,
}

impl AlphaInfo {
    pub fn has_alpha(self) -> bool {
        !matches!(self, AlphaInfo::None)
    }
}

/// Sample range of a YCbCr format
///
/// - full range (0 - 255) for all planes
/// - video range Y (16 - 235), Cb & Cr (16 - 240)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleRange {
    Full,
    Video,
}

/// Position of chroma samples relative to the luma samples
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ChromaSiting {
    Left,
    #[default]
    Center,
    TopLeft,
    Top,
    BottomLeft,
    Bottom,
}

/// Interleaved RGB layout, red first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RgbFormat {
    pub bits_per_component: usize,
    pub alpha: AlphaInfo,
}

impl RgbFormat {
    pub fn channel_count(&self) -> usize {
        if self.alpha.has_alpha() { 4 } else { 3 }
    }
}

/// Three plane Y, Cb, Cr layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct YCbCrFormat {
    pub bits_per_component: usize,
    pub range: SampleRange,
    pub siting: ChromaSiting,
}

/// Describes the memory layout of an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Single interleaved RGB(A) plane
    Rgb(RgbFormat),

    /// Y, Cb and Cr planes
    ///
    /// All three planes share the luma resolution, chroma is never stored at reduced size.
    YCbCrPlanar(YCbCrFormat),
}

/// Dimensions of a single plane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneDims {
    pub width: usize,
    pub height: usize,
    pub channel_count: usize,
}

impl PixelFormat {
    /// 8 bit RGB without alpha
    pub const RGB8: Self = Self::Rgb(RgbFormat {
        bits_per_component: 8,
        alpha: AlphaInfo::None,
    });

    /// 8 bit RGBA with straight alpha
    pub const RGBA8: Self = Self::Rgb(RgbFormat {
        bits_per_component: 8,
        alpha: AlphaInfo::Last,
    });

    /// 8 bit RGBA with premultiplied alpha
    pub const RGBA8_PREMULTIPLIED: Self = Self::Rgb(RgbFormat {
        bits_per_component: 8,
        alpha: AlphaInfo::PremultipliedLast,
    });

    /// 8 bit full range planar YCbCr with centered chroma
    pub const YCBCR8_PLANAR_FULL_RANGE: Self = Self::YCbCrPlanar(YCbCrFormat {
        bits_per_component: 8,
        range: SampleRange::Full,
        siting: ChromaSiting::Center,
    });

    pub fn plane_count(&self) -> usize {
        match self {
            PixelFormat::Rgb(_) => 1,
            PixelFormat::YCbCrPlanar(_) => 3,
        }
    }

    pub fn bits_per_component(&self) -> usize {
        match self {
            PixelFormat::Rgb(format) => format.bits_per_component,
            PixelFormat::YCbCrPlanar(format) => format.bits_per_component,
        }
    }

    /// Human-readable names of the planes in order
    pub fn plane_names(&self) -> &'static [&'static str] {
        match self {
            PixelFormat::Rgb(format) if format.alpha.has_alpha() => &["RGBA"],
            PixelFormat::Rgb(_) => &["RGB"],
            PixelFormat::YCbCrPlanar(_) => &["Y", "Cb", "Cr"],
        }
    }

    /// Dimensions of every plane for an image of the given size
    pub fn plane_dims(&self, width: usize, height: usize) -> Vec<PlaneDims> {
        match self {
            PixelFormat::Rgb(format) => vec![PlaneDims {
                width,
                height,
                channel_count: format.channel_count(),
            }],
            PixelFormat::YCbCrPlanar(_) => {
                let plane = PlaneDims {
                    width,
                    height,
                    channel_count: 1,
                };

                vec![plane; 3]
            }
        }
    }

    /// Allocate one buffer per plane for an image of the given size
    pub fn allocate_planes(
        &self,
        width: usize,
        height: usize,
        row_alignment: usize,
    ) -> Result<Vec<PixelBuffer>, AllocationError> {
        self.plane_dims(width, height)
            .into_iter()
            .map(|dims| {
                PixelBuffer::allocate_with_alignment(
                    dims.width,
                    dims.height,
                    self.bits_per_component(),
                    dims.channel_count,
                    row_alignment,
                )
            })
            .collect()
    }

    /// Check that `planes` are suitable for an image of this format and dimensions
    pub fn bounds_check(
        &self,
        planes: &[&PixelBuffer],
        width: usize,
        height: usize,
    ) -> Result<(), ConversionError> {
        if planes.len() != self.plane_count() {
            return Err(ConversionError::InvalidNumberOfPlanes(
                crate::InvalidNumberOfPlanesError {
                    expected: self.plane_count(),
                    got: planes.len(),
                },
            ));
        }

        for (i, (dims, plane)) in self
            .plane_dims(width, height)
            .into_iter()
            .zip(planes)
            .enumerate()
        {
            if plane.width() != dims.width || plane.height() != dims.height {
                return Err(ConversionError::DimensionMismatch {
                    plane: i,
                    expected_width: dims.width,
                    expected_height: dims.height,
                    width: plane.width(),
                    height: plane.height(),
                });
            }

            if plane.bits_per_component() != self.bits_per_component() {
                return Err(ConversionError::BitsPerComponentMismatch {
                    plane: i,
                    expected: self.bits_per_component(),
                    got: plane.bits_per_component(),
                });
            }

            if plane.channel_count() != dims.channel_count {
                return Err(ConversionError::ChannelCountMismatch {
                    plane: i,
                    expected: dims.channel_count,
                    got: plane.channel_count(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chroma_planes_have_luma_resolution() {
        let dims = PixelFormat::YCBCR8_PLANAR_FULL_RANGE.plane_dims(7, 5);

        assert_eq!(dims.len(), 3);
        assert!(dims.iter().all(|d| d.width == 7 && d.height == 5 && d.channel_count == 1));
    }

    #[test]
    fn odd_sizes() {
        for (width, height) in [(1, 1), (2, 2), (3, 3), (7, 5)] {
            let planes = PixelFormat::YCBCR8_PLANAR_FULL_RANGE
                .allocate_planes(width, height, 16)
                .unwrap();

            for plane in &planes {
                assert_eq!((plane.width(), plane.height()), (width, height));
                assert_eq!(plane.row_bytes(), width.next_multiple_of(16));
            }
        }
    }

    #[test]
    fn plane_counts() {
        assert_eq!(PixelFormat::RGB8.plane_count(), 1);
        assert_eq!(PixelFormat::RGBA8.plane_count(), 1);
        assert_eq!(PixelFormat::YCBCR8_PLANAR_FULL_RANGE.plane_count(), 3);
        assert_eq!(
            PixelFormat::YCBCR8_PLANAR_FULL_RANGE.plane_names(),
            &["Y", "Cb", "Cr"]
        );
    }

    #[test]
    fn bounds_check_rejects_mismatches() {
        let format = PixelFormat::YCBCR8_PLANAR_FULL_RANGE;
        let y = PixelBuffer::allocate(4, 4, 8, 1).unwrap();
        let cb = PixelBuffer::allocate(2, 2, 8, 1).unwrap();
        let cr = PixelBuffer::allocate(4, 4, 8, 3).unwrap();

        assert!(matches!(
            format.bounds_check(&[&y], 4, 4),
            Err(ConversionError::InvalidNumberOfPlanes(_))
        ));
        assert!(matches!(
            format.bounds_check(&[&y, &cb, &y], 4, 4),
            Err(ConversionError::DimensionMismatch { plane: 1, .. })
        ));
        assert!(matches!(
            format.bounds_check(&[&y, &y, &cr], 4, 4),
            Err(ConversionError::ChannelCountMismatch { plane: 2, .. })
        ));
        assert!(format.bounds_check(&[&y, &y, &y], 4, 4).is_ok());
    }
}
