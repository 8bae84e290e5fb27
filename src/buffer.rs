use std::collections::TryReserveError;
use std::fmt;

/// Row alignment in bytes used by [`PixelBuffer::allocate`]
pub const DEFAULT_ROW_ALIGNMENT: usize = 16;

/// Everything that can go wrong when allocating a [`PixelBuffer`]
#[derive(Debug, thiserror::Error)]
pub enum AllocationError {
    #[error("width or height must not be zero")]
    InvalidDimensions,

    #[error("channel count must not be zero")]
    InvalidChannelCount,

    #[error("unsupported bits per component {0}, expected a non-zero multiple of 8")]
    InvalidBitsPerComponent(usize),

    #[error("row alignment {0} is not a power of two")]
    InvalidRowAlignment(usize),

    #[error("invalid row stride, expected it to be at least {minimum}, but got {got}")]
    InvalidStride { minimum: usize, got: usize },

    #[error("source data too small, expected at least {minimum} bytes, but got {got}")]
    SourceTooSmall { minimum: usize, got: usize },

    #[error("buffer size for a {width}x{height} image overflows")]
    SizeOverflow { width: usize, height: usize },

    #[error("failed to allocate {bytes} bytes")]
    OutOfMemory {
        bytes: usize,
        #[source]
        source: TryReserveError,
    },
}

/// Owned 2D pixel buffer
///
/// Each of the `height` rows starts at a multiple of [`row_bytes`](Self::row_bytes). Bytes between
/// the end of a row's pixels and the start of the next row are padding; they are zeroed on
/// allocation and never touched by any conversion.
///
/// The buffer exclusively owns its memory and releases it exactly once, when dropped or passed to
/// [`release`](Self::release). It deliberately does not implement `Clone`, use
/// [`try_clone`](Self::try_clone) for an explicit deep copy.
pub struct PixelBuffer {
    data: Box<[u8]>,
    width: usize,
    height: usize,
    row_bytes: usize,
    bits_per_component: usize,
    channel_count: usize,
}

impl PixelBuffer {
    /// Allocate a zeroed buffer with rows aligned to [`DEFAULT_ROW_ALIGNMENT`]
    pub fn allocate(
        width: usize,
        height: usize,
        bits_per_component: usize,
        channel_count: usize,
    ) -> Result<Self, AllocationError> {
        Self::allocate_with_alignment(
            width,
            height,
            bits_per_component,
            channel_count,
            DEFAULT_ROW_ALIGNMENT,
        )
    }

    /// Allocate a zeroed buffer with rows aligned to `row_alignment` bytes
    ///
    /// `row_alignment` must be a power of two, `1` produces tightly packed rows.
    pub fn allocate_with_alignment(
        width: usize,
        height: usize,
        bits_per_component: usize,
        channel_count: usize,
        row_alignment: usize,
    ) -> Result<Self, AllocationError> {
        if width == 0 || height == 0 {
            return Err(AllocationError::InvalidDimensions);
        }

        if channel_count == 0 {
            return Err(AllocationError::InvalidChannelCount);
        }

        if bits_per_component == 0 || bits_per_component % 8 != 0 {
            return Err(AllocationError::InvalidBitsPerComponent(bits_per_component));
        }

        if !row_alignment.is_power_of_two() {
            return Err(AllocationError::InvalidRowAlignment(row_alignment));
        }

        let overflow = AllocationError::SizeOverflow { width, height };

        let row_bytes = (bits_per_component / 8)
            .checked_mul(channel_count)
            .and_then(|bpp| bpp.checked_mul(width))
            .and_then(|min| min.checked_next_multiple_of(row_alignment));

        let Some(row_bytes) = row_bytes else {
            return Err(overflow);
        };

        let Some(bytes) = row_bytes.checked_mul(height) else {
            return Err(overflow);
        };

        let mut data = Vec::new();
        data.try_reserve_exact(bytes)
            .map_err(|source| AllocationError::OutOfMemory { bytes, source })?;
        data.resize(bytes, 0);

        tracing::trace!(width, height, row_bytes, bytes, "allocated pixel buffer");

        Ok(Self {
            data: data.into_boxed_slice(),
            width,
            height,
            row_bytes,
            bits_per_component,
            channel_count,
        })
    }

    /// Copy `data`, whose rows start every `row_bytes` bytes, into a new buffer with the default
    /// row alignment
    pub fn from_packed(
        data: &[u8],
        width: usize,
        height: usize,
        bits_per_component: usize,
        channel_count: usize,
        row_bytes: usize,
    ) -> Result<Self, AllocationError> {
        let mut buffer = Self::allocate(width, height, bits_per_component, channel_count)?;
        let row_len = buffer.row_len();

        if row_bytes < row_len {
            return Err(AllocationError::InvalidStride {
                minimum: row_len,
                got: row_bytes,
            });
        }

        let minimum = row_bytes
            .checked_mul(height - 1)
            .and_then(|len| len.checked_add(row_len))
            .ok_or(AllocationError::SizeOverflow { width, height })?;

        if data.len() < minimum {
            return Err(AllocationError::SourceTooSmall {
                minimum,
                got: data.len(),
            });
        }

        for (src, dst) in data.chunks(row_bytes).zip(buffer.rows_mut()) {
            dst.copy_from_slice(&src[..row_len]);
        }

        Ok(buffer)
    }

    /// Deep copy of this buffer, including its row layout
    pub fn try_clone(&self) -> Result<Self, AllocationError> {
        let mut data = Vec::new();
        data.try_reserve_exact(self.data.len())
            .map_err(|source| AllocationError::OutOfMemory {
                bytes: self.data.len(),
                source,
            })?;
        data.extend_from_slice(&self.data);

        Ok(Self {
            data: data.into_boxed_slice(),
            width: self.width,
            height: self.height,
            row_bytes: self.row_bytes,
            bits_per_component: self.bits_per_component,
            channel_count: self.channel_count,
        })
    }

    /// Return the backing memory. Equivalent to dropping the buffer.
    pub fn release(self) {
        tracing::trace!(
            width = self.width,
            height = self.height,
            "released pixel buffer"
        );
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Distance in bytes between the starts of two consecutive rows
    pub fn row_bytes(&self) -> usize {
        self.row_bytes
    }

    pub fn bits_per_component(&self) -> usize {
        self.bits_per_component
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.bits_per_component / 8 * self.channel_count
    }

    /// Number of pixel bytes in a single row, without padding
    pub fn row_len(&self) -> usize {
        self.bytes_per_pixel() * self.width
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.data.as_ptr()
    }

    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.data.as_mut_ptr()
    }

    /// The whole backing memory including row padding
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// The whole backing memory including row padding
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Pixel bytes of row `y`
    ///
    /// # Panics
    ///
    /// If `y` is out of bounds
    pub fn row(&self, y: usize) -> &[u8] {
        let start = y * self.row_bytes;
        &self.data[start..start + self.row_len()]
    }

    /// Pixel bytes of row `y`
    ///
    /// # Panics
    ///
    /// If `y` is out of bounds
    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        let start = y * self.row_bytes;
        let len = self.row_len();
        &mut self.data[start..start + len]
    }

    /// Iterator over the pixel bytes of every row
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[u8]> + '_ {
        let n = self.row_len();

        self.data
            .chunks_exact(self.row_bytes)
            .map(move |row| &row[..n])
    }

    /// Iterator over the pixel bytes of every row
    pub fn rows_mut(&mut self) -> impl ExactSizeIterator<Item = &mut [u8]> + '_ {
        let n = self.row_len();

        self.data
            .chunks_exact_mut(self.row_bytes)
            .map(move |row| &mut row[..n])
    }

    /// Copy the pixel bytes into a new vector without any row padding
    pub fn to_packed_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.row_len() * self.height);

        for row in self.rows() {
            out.extend_from_slice(row);
        }

        out
    }

    /// Copy the pixel bytes of `other` into this buffer, row by row
    ///
    /// Both buffers must have the same dimensions, bit depth and channel count. Row padding is
    /// left as is.
    pub fn copy_from(&mut self, other: &PixelBuffer) -> Result<(), crate::ConversionError> {
        crate::copy::copy_plane(other, self)
    }

    pub(crate) fn same_layout(&self, other: &PixelBuffer) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.bits_per_component == other.bits_per_component
            && self.channel_count == other.channel_count
    }
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("row_bytes", &self.row_bytes)
            .field("bits_per_component", &self.bits_per_component)
            .field("channel_count", &self.channel_count)
            .finish_non_exhaustive()
    }
}
