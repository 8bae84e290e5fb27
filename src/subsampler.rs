use crate::copy::copy_plane;
use crate::formats::RgbReader;
use crate::{
    AllocationError, ChromaSiting, ColorConverter, ConversionError, ConversionMatrix,
    DEFAULT_ROW_ALIGNMENT, PixelBuffer, PixelFormat, PlanarSaturationAdjuster, RgbFormat,
    SampleRange, UnsupportedFormatError, YCbCrFormat, YCbCrPlanes,
};

/// Borrowed, decoded RGB raster handed to [`ChromaSubsampler::init`]
#[derive(Debug, Clone, Copy)]
pub struct RgbImage<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
    row_bytes: Option<usize>,
    format: RgbFormat,
}

impl<'a> RgbImage<'a> {
    /// Tightly packed 8 bit RGB
    pub fn rgb8(data: &'a [u8], width: usize, height: usize) -> Self {
        Self {
            data,
            width,
            height,
            row_bytes: None,
            format: RgbFormat {
                bits_per_component: 8,
                alpha: crate::AlphaInfo::None,
            },
        }
    }

    /// Rows start every `row_bytes` bytes instead of being tightly packed
    pub fn with_row_bytes(mut self, row_bytes: usize) -> Self {
        self.row_bytes = Some(row_bytes);
        self
    }

    pub fn with_format(mut self, format: RgbFormat) -> Self {
        self.format = format;
        self
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn format(&self) -> RgbFormat {
        self.format
    }

    /// Distance between the starts of two rows
    pub fn row_bytes(&self) -> usize {
        self.row_bytes
            .unwrap_or(self.width.saturating_mul(self.format.channel_count()))
    }

    fn validate(&self) -> Result<(), InvalidImageError> {
        if self.width == 0 || self.height == 0 {
            return Err(InvalidImageError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }

        if self.format.bits_per_component != 8 {
            return Err(InvalidImageError::BitsPerComponent(
                self.format.bits_per_component,
            ));
        }

        let Some(min_row) = self.width.checked_mul(self.format.channel_count()) else {
            return Err(InvalidImageError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        };

        let row_bytes = self.row_bytes();
        if row_bytes < min_row {
            return Err(InvalidImageError::InvalidStride {
                minimum: min_row,
                got: row_bytes,
            });
        }

        // The last row doesn't need its padding
        let minimum = row_bytes
            .checked_mul(self.height - 1)
            .and_then(|len| len.checked_add(min_row))
            .unwrap_or(usize::MAX);

        if self.data.len() < minimum {
            return Err(InvalidImageError::BufferTooSmall {
                minimum,
                got: self.data.len(),
            });
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InvalidImageError {
    #[error("invalid image dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("{0} bits per component are not supported, only 8")]
    BitsPerComponent(usize),

    #[error("invalid row stride, expected it to be at least {minimum}, but got {got}")]
    InvalidStride { minimum: usize, got: usize },

    #[error("image buffer too small, expected at least {minimum} bytes, but got {got}")]
    BufferTooSmall { minimum: usize, got: usize },
}

/// Failure to rebuild an RGB image from the working planes
#[derive(Debug, thiserror::Error)]
pub enum ReconstructionError {
    #[error("failed to create the reverse converter")]
    UnsupportedFormat(#[source] UnsupportedFormatError),

    #[error("failed to allocate the destination buffer")]
    Allocation(#[source] AllocationError),

    #[error("failed to convert the working planes to RGB")]
    Conversion(#[source] ConversionError),
}

#[derive(Debug, thiserror::Error)]
pub enum ChromaError {
    #[error(transparent)]
    InvalidImage(#[from] InvalidImageError),

    #[error(transparent)]
    UnsupportedFormat(#[from] UnsupportedFormatError),

    #[error(transparent)]
    Allocation(#[from] AllocationError),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    Reconstruction(#[from] ReconstructionError),

    #[error("session has not been converted yet, it is in state {0:?}")]
    NotConverted(SessionState),
}

/// Lifecycle of a [`ChromaSubsampler`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// RGB source is loaded, no planes exist yet
    SourceLoaded,

    /// Planes are populated, working chroma equals the source chroma
    Converted,

    /// Working chroma holds the result of the last saturation adjustment
    Adjusted,
}

/// Configuration of a [`ChromaSubsampler`] session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubsamplerOptions {
    pub matrix: ConversionMatrix,

    /// RGBA in 0.0..=1.0 that alpha-bearing input is composited over
    pub background: [f32; 4],
    pub siting: ChromaSiting,

    /// Row alignment of every buffer the session allocates, must be a power of two
    pub row_alignment: usize,
}

impl Default for SubsamplerOptions {
    fn default() -> Self {
        Self {
            matrix: ConversionMatrix::ITU_R_601_4,
            background: [0.0; 4],
            siting: ChromaSiting::Center,
            row_alignment: DEFAULT_ROW_ALIGNMENT,
        }
    }
}

impl SubsamplerOptions {
    pub fn with_matrix(mut self, matrix: ConversionMatrix) -> Self {
        self.matrix = matrix;
        self
    }

    pub fn with_background(mut self, background: [f32; 4]) -> Self {
        self.background = background;
        self
    }

    pub fn with_siting(mut self, siting: ChromaSiting) -> Self {
        self.siting = siting;
        self
    }

    pub fn with_row_alignment(mut self, row_alignment: usize) -> Self {
        self.row_alignment = row_alignment;
        self
    }

    fn planar_format(&self) -> PixelFormat {
        PixelFormat::YCbCrPlanar(YCbCrFormat {
            bits_per_component: 8,
            range: SampleRange::Full,
            siting: self.siting,
        })
    }
}

#[derive(Debug)]
struct PlaneSets {
    /// Planes as produced by the forward conversion, never modified afterwards
    source: YCbCrPlanes,

    /// Source luma plus the adjusted chroma
    working: YCbCrPlanes,
}

impl PlaneSets {
    fn allocate(width: usize, height: usize, row_alignment: usize) -> Result<Self, AllocationError> {
        Ok(Self {
            source: YCbCrPlanes::allocate(width, height, row_alignment)?,
            working: YCbCrPlanes::allocate(width, height, row_alignment)?,
        })
    }

    fn populate(
        &mut self,
        converter: &ColorConverter,
        rgb: &PixelBuffer,
    ) -> Result<(), ConversionError> {
        converter.convert(&[rgb], &mut self.source.as_mut_array())?;

        copy_plane(&self.source.y, &mut self.working.y)?;
        copy_plane(&self.source.cb, &mut self.working.cb)?;
        copy_plane(&self.source.cr, &mut self.working.cr)?;

        Ok(())
    }
}

/// A single image's trip from RGB to planar YCbCr, through chroma scaling and back to RGB
///
/// All buffers belong to the session and are released when it is dropped. Images returned by
/// [`result`](Self::result) belong to the caller.
#[derive(Debug)]
pub struct ChromaSubsampler {
    options: SubsamplerOptions,
    rgb_source: PixelBuffer,
    planes: Option<PlaneSets>,
    state: SessionState,
}

impl ChromaSubsampler {
    /// Load `image` using the default options
    pub fn init(image: RgbImage<'_>) -> Result<Self, ChromaError> {
        Self::with_options(image, SubsamplerOptions::default())
    }

    /// Load `image`, flattening any alpha over the configured background color
    pub fn with_options(
        image: RgbImage<'_>,
        options: SubsamplerOptions,
    ) -> Result<Self, ChromaError> {
        image.validate().inspect_err(|err| {
            tracing::warn!(width = image.width(), height = image.height(), "rejected image: {err}");
        })?;

        let mut rgb_source = PixelBuffer::allocate_with_alignment(
            image.width(),
            image.height(),
            8,
            3,
            options.row_alignment,
        )?;

        let reader = RgbReader::new(&image.format(), options.background);
        let min_row = image.width() * image.format().channel_count();

        for (src, dst) in image
            .data()
            .chunks(image.row_bytes())
            .zip(rgb_source.rows_mut())
        {
            reader.read_row_rgb8(&src[..min_row], dst);
        }

        tracing::debug!(
            width = image.width(),
            height = image.height(),
            alpha = ?image.format().alpha,
            "loaded source image"
        );

        Ok(Self {
            options,
            rgb_source,
            planes: None,
            state: SessionState::SourceLoaded,
        })
    }

    /// Split the source image into Y, Cb and Cr planes
    ///
    /// On success the working planes hold the unmodified source planes. On failure the session is
    /// left as it was. Converting again reuses the planes of the previous conversion and discards
    /// any saturation adjustment.
    pub fn convert(&mut self) -> Result<(), ChromaError> {
        self.try_convert().inspect_err(|err| {
            tracing::warn!(state = ?self.state, "conversion failed: {err}");
        })?;

        tracing::debug!(from = ?self.state, "converted source image");
        self.state = SessionState::Converted;

        Ok(())
    }

    fn try_convert(&mut self) -> Result<(), ChromaError> {
        let converter = ColorConverter::create_forward(
            PixelFormat::RGB8,
            self.options.planar_format(),
            self.options.matrix,
            self.options.background,
        )?;

        match &mut self.planes {
            Some(planes) => {
                tracing::trace!("reusing planes of the previous conversion");
                planes.populate(&converter, &self.rgb_source)?;
            }
            None => {
                let mut planes = PlaneSets::allocate(
                    self.rgb_source.width(),
                    self.rgb_source.height(),
                    self.options.row_alignment,
                )?;
                planes.populate(&converter, &self.rgb_source)?;

                self.planes = Some(planes);
            }
        }

        Ok(())
    }

    /// Scale the chroma of the converted image by `factor`
    ///
    /// Always starts from the chroma produced by [`convert`](Self::convert), so factors never
    /// accumulate. See [`PlanarSaturationAdjuster`].
    pub fn apply_saturation(&mut self, factor: f32) -> Result<(), ChromaError> {
        let Some(PlaneSets { source, working }) = self.converted_planes_mut() else {
            return Err(ChromaError::NotConverted(self.state));
        };

        PlanarSaturationAdjuster::new(factor)
            .and_then(|adjuster| adjuster.apply(source.chroma(), working.chroma_mut()))
            .inspect_err(|err| tracing::warn!(factor, "saturation failed: {err}"))?;

        tracing::debug!(factor, "adjusted saturation");
        self.state = SessionState::Adjusted;

        Ok(())
    }

    /// Rebuild an RGB image from the working planes
    pub fn result(&self) -> Result<PixelBuffer, ChromaError> {
        let Some(planes) = self.converted_planes() else {
            return Err(ChromaError::NotConverted(self.state));
        };

        Ok(self.reconstruct(&planes.working)?)
    }

    fn reconstruct(&self, working: &YCbCrPlanes) -> Result<PixelBuffer, ReconstructionError> {
        let converter = ColorConverter::create_reverse(
            self.options.planar_format(),
            PixelFormat::RGB8,
            self.options.matrix,
            self.options.background,
        )
        .map_err(ReconstructionError::UnsupportedFormat)?;

        let mut rgb = PixelBuffer::allocate_with_alignment(
            working.width(),
            working.height(),
            8,
            3,
            self.options.row_alignment,
        )
        .map_err(ReconstructionError::Allocation)?;

        converter
            .convert(&working.as_array(), &mut [&mut rgb])
            .map_err(ReconstructionError::Conversion)?;

        tracing::debug!(state = ?self.state, "reconstructed RGB image");

        Ok(rgb)
    }

    fn converted_planes(&self) -> Option<&PlaneSets> {
        match self.state {
            SessionState::SourceLoaded => None,
            SessionState::Converted | SessionState::Adjusted => self.planes.as_ref(),
        }
    }

    fn converted_planes_mut(&mut self) -> Option<&mut PlaneSets> {
        match self.state {
            SessionState::SourceLoaded => None,
            SessionState::Converted | SessionState::Adjusted => self.planes.as_mut(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn width(&self) -> usize {
        self.rgb_source.width()
    }

    pub fn height(&self) -> usize {
        self.rgb_source.height()
    }

    pub fn options(&self) -> &SubsamplerOptions {
        &self.options
    }

    /// The loaded image as 8 bit RGB
    pub fn rgb_source(&self) -> &PixelBuffer {
        &self.rgb_source
    }

    /// Planes produced by the last conversion
    pub fn source_planes(&self) -> Option<&YCbCrPlanes> {
        self.converted_planes().map(|planes| &planes.source)
    }

    /// Source luma plus the current chroma
    pub fn working_planes(&self) -> Option<&YCbCrPlanes> {
        self.converted_planes().map(|planes| &planes.working)
    }
}
