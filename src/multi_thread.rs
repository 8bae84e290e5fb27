use crate::PixelBuffer;
use crate::formats::{RgbToYCbCr, YCbCrToRgb};
use rayon::prelude::*;

/// Rows handed to each worker so that every thread gets one contiguous band
fn band_rows(height: usize) -> usize {
    height.div_ceil(num_cpus::get()).max(1)
}

fn bands(plane: &PixelBuffer, rows: usize) -> impl IndexedParallelIterator<Item = Band<'_>> {
    let (row_bytes, row_len) = (plane.row_bytes(), plane.row_len());

    plane
        .as_slice()
        .par_chunks(row_bytes * rows)
        .map(move |band| Band {
            data: band,
            row_bytes,
            row_len,
        })
}

fn bands_mut(
    plane: &mut PixelBuffer,
    rows: usize,
) -> impl IndexedParallelIterator<Item = BandMut<'_>> {
    let (row_bytes, row_len) = (plane.row_bytes(), plane.row_len());

    plane
        .as_mut_slice()
        .par_chunks_mut(row_bytes * rows)
        .map(move |band| BandMut {
            data: band,
            row_bytes,
            row_len,
        })
}

struct Band<'a> {
    data: &'a [u8],
    row_bytes: usize,
    row_len: usize,
}

impl<'a> Band<'a> {
    fn rows(self) -> impl Iterator<Item = &'a [u8]> {
        let n = self.row_len;
        self.data.chunks_exact(self.row_bytes).map(move |row| &row[..n])
    }
}

struct BandMut<'a> {
    data: &'a mut [u8],
    row_bytes: usize,
    row_len: usize,
}

impl<'a> BandMut<'a> {
    fn rows(self) -> impl Iterator<Item = &'a mut [u8]> {
        let n = self.row_len;
        self.data
            .chunks_exact_mut(self.row_bytes)
            .map(move |row| &mut row[..n])
    }
}

pub(crate) fn rgb_to_ycbcr(
    kernel: &RgbToYCbCr,
    src: &PixelBuffer,
    [y, cb, cr]: [&mut PixelBuffer; 3],
) {
    let rows = band_rows(src.height());

    bands(src, rows)
        .zip(bands_mut(y, rows))
        .zip(bands_mut(cb, rows))
        .zip(bands_mut(cr, rows))
        .for_each(|(((src, y), cb), cr)| {
            for (((src, y), cb), cr) in src.rows().zip(y.rows()).zip(cb.rows()).zip(cr.rows()) {
                kernel.convert_row(src, y, cb, cr);
            }
        });
}

pub(crate) fn ycbcr_to_rgb(
    kernel: &YCbCrToRgb,
    [y, cb, cr]: [&PixelBuffer; 3],
    dst: &mut PixelBuffer,
) {
    let rows = band_rows(dst.height());

    bands(y, rows)
        .zip(bands(cb, rows))
        .zip(bands(cr, rows))
        .zip(bands_mut(dst, rows))
        .for_each(|(((y, cb), cr), dst)| {
            for (((y, cb), cr), dst) in y.rows().zip(cb.rows()).zip(cr.rows()).zip(dst.rows()) {
                kernel.convert_row(y, cb, cr, dst);
            }
        });
}
