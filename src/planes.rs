use crate::{AllocationError, PixelBuffer, PixelFormat};

#[derive(Debug, thiserror::Error)]
#[error("got invalid number of planes, expected {expected} but got {got}")]
pub struct InvalidNumberOfPlanesError {
    pub expected: usize,
    pub got: usize,
}

pub(crate) fn read_planes<'a, const N: usize>(
    planes: &[&'a PixelBuffer],
) -> Result<[&'a PixelBuffer; N], InvalidNumberOfPlanesError> {
    <[&PixelBuffer; N]>::try_from(planes).map_err(|_| InvalidNumberOfPlanesError {
        expected: N,
        got: planes.len(),
    })
}

pub(crate) fn read_planes_mut<'a, const N: usize>(
    planes: &'a mut [&mut PixelBuffer],
) -> Result<[&'a mut PixelBuffer; N], InvalidNumberOfPlanesError> {
    let got = planes.len();

    let planes: Vec<&'a mut PixelBuffer> = planes.iter_mut().map(|plane| &mut **plane).collect();

    <[&mut PixelBuffer; N]>::try_from(planes)
        .map_err(|_| InvalidNumberOfPlanesError { expected: N, got })
}

/// The Y, Cb and Cr planes of an image, each at full image resolution
#[derive(Debug)]
pub struct YCbCrPlanes {
    pub y: PixelBuffer,
    pub cb: PixelBuffer,
    pub cr: PixelBuffer,
}

impl YCbCrPlanes {
    /// Allocate three 8 bit planes of `width` x `height`
    pub fn allocate(
        width: usize,
        height: usize,
        row_alignment: usize,
    ) -> Result<Self, AllocationError> {
        let [y, cb, cr] = <[PixelBuffer; 3]>::try_from(
            PixelFormat::YCBCR8_PLANAR_FULL_RANGE.allocate_planes(width, height, row_alignment)?,
        )
        .map_err(|_| AllocationError::InvalidDimensions)?;

        Ok(Self { y, cb, cr })
    }

    pub fn width(&self) -> usize {
        self.y.width()
    }

    pub fn height(&self) -> usize {
        self.y.height()
    }

    /// Planes in conversion order: Y, Cb, Cr
    pub fn as_array(&self) -> [&PixelBuffer; 3] {
        [&self.y, &self.cb, &self.cr]
    }

    /// Planes in conversion order: Y, Cb, Cr
    pub fn as_mut_array(&mut self) -> [&mut PixelBuffer; 3] {
        [&mut self.y, &mut self.cb, &mut self.cr]
    }

    /// Cb and Cr
    pub fn chroma(&self) -> [&PixelBuffer; 2] {
        [&self.cb, &self.cr]
    }

    /// Cb and Cr
    pub fn chroma_mut(&mut self) -> [&mut PixelBuffer; 2] {
        [&mut self.cb, &mut self.cr]
    }
}
