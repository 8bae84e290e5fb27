use super::rgb::{RgbReader, RgbWriter, quantize};
use crate::{ConversionMatrix, PixelBuffer};

/// Chroma offset of 8 bit full range YCbCr
pub(crate) const CHROMA_CENTER: f32 = 128.0;

/// Converts interleaved RGB rows into Y, Cb and Cr rows
#[derive(Debug, Clone, Copy)]
pub(crate) struct RgbToYCbCr {
    pub(crate) matrix: ConversionMatrix,
    pub(crate) reader: RgbReader,
}

impl RgbToYCbCr {
    #[inline(always)]
    pub(crate) fn convert_row(&self, src: &[u8], y: &mut [u8], cb: &mut [u8], cr: &mut [u8]) {
        let pixels = src.chunks_exact(self.reader.channels());

        for (((px, y), cb), cr) in pixels.zip(y).zip(cb).zip(cr) {
            let [r, g, b] = self.reader.read(px);
            let (luma, blue_diff, red_diff) = self.matrix.forward(r, g, b);

            *y = quantize(luma);
            *cb = quantize(blue_diff + CHROMA_CENTER);
            *cr = quantize(red_diff + CHROMA_CENTER);
        }
    }

    pub(crate) fn convert(&self, src: &PixelBuffer, [y, cb, cr]: [&mut PixelBuffer; 3]) {
        let rows = src
            .rows()
            .zip(y.rows_mut())
            .zip(cb.rows_mut())
            .zip(cr.rows_mut());

        for (((src, y), cb), cr) in rows {
            self.convert_row(src, y, cb, cr);
        }
    }
}

/// Converts Y, Cb and Cr rows into interleaved RGB rows
#[derive(Debug, Clone, Copy)]
pub(crate) struct YCbCrToRgb {
    pub(crate) matrix: ConversionMatrix,
    pub(crate) writer: RgbWriter,
}

impl YCbCrToRgb {
    #[inline(always)]
    pub(crate) fn convert_row(&self, y: &[u8], cb: &[u8], cr: &[u8], dst: &mut [u8]) {
        let pixels = dst.chunks_exact_mut(self.writer.channels());

        for (((px, &y), &cb), &cr) in pixels.zip(y).zip(cb).zip(cr) {
            let (r, g, b) = self.matrix.reverse(
                f32::from(y),
                f32::from(cb) - CHROMA_CENTER,
                f32::from(cr) - CHROMA_CENTER,
            );

            self.writer.write(px, [r, g, b]);
        }
    }

    pub(crate) fn convert(&self, [y, cb, cr]: [&PixelBuffer; 3], dst: &mut PixelBuffer) {
        let rows = y.rows().zip(cb.rows()).zip(cr.rows()).zip(dst.rows_mut());

        for (((y, cb), cr), dst) in rows {
            self.convert_row(y, cb, cr, dst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PixelFormat, RgbFormat};

    const RGB8: RgbFormat = RgbFormat {
        bits_per_component: 8,
        alpha: crate::AlphaInfo::None,
    };

    fn forward() -> RgbToYCbCr {
        RgbToYCbCr {
            matrix: ConversionMatrix::ITU_R_601_4,
            reader: RgbReader::new(&RGB8, [0.0; 4]),
        }
    }

    fn reverse() -> YCbCrToRgb {
        YCbCrToRgb {
            matrix: ConversionMatrix::ITU_R_601_4,
            writer: RgbWriter::new(&RGB8),
        }
    }

    fn to_ycbcr(rgb: [u8; 3]) -> [u8; 3] {
        let (mut y, mut cb, mut cr) = ([0u8], [0u8], [0u8]);
        forward().convert_row(&rgb, &mut y, &mut cb, &mut cr);
        [y[0], cb[0], cr[0]]
    }

    #[test]
    fn known_bt601_values() {
        assert_eq!(to_ycbcr([255, 255, 255]), [255, 128, 128]);
        assert_eq!(to_ycbcr([0, 0, 0]), [0, 128, 128]);
        assert_eq!(to_ycbcr([128, 128, 128]), [128, 128, 128]);

        // Y = 0.299 * 255, Cr saturates at the top of the range
        assert_eq!(to_ycbcr([255, 0, 0]), [76, 85, 255]);
        assert_eq!(to_ycbcr([0, 255, 0]), [150, 44, 21]);
        assert_eq!(to_ycbcr([0, 0, 255]), [29, 255, 107]);
    }

    #[test]
    fn neutral_chroma_gives_gray() {
        let mut rgb = [0u8; 3];

        for luma in [0u8, 17, 128, 200, 255] {
            reverse().convert_row(&[luma], &[128], &[128], &mut rgb);
            assert_eq!(rgb, [luma; 3]);
        }
    }

    #[test]
    fn whole_buffer_roundtrip_respects_strides() {
        let (width, height) = (7, 5);

        let mut src = PixelBuffer::allocate(width, height, 8, 3).unwrap();
        for (y, row) in src.rows_mut().enumerate() {
            for (x, px) in row.chunks_exact_mut(3).enumerate() {
                px.copy_from_slice(&[(x * 30) as u8, (y * 50) as u8, ((x + y) * 20) as u8]);
            }
        }

        let mut planes = PixelFormat::YCBCR8_PLANAR_FULL_RANGE
            .allocate_planes(width, height, 16)
            .unwrap();
        let [y, cb, cr] = planes.as_mut_slice() else {
            unreachable!()
        };

        forward().convert(&src, [&mut *y, &mut *cb, &mut *cr]);

        let mut dst = PixelBuffer::allocate(width, height, 8, 3).unwrap();
        reverse().convert([&*y, &*cb, &*cr], &mut dst);

        for (a, b) in src.rows().flatten().zip(dst.rows().flatten()) {
            assert!(a.abs_diff(*b) <= 3, "{a} vs {b}");
        }

        // padding stays zeroed
        let stride = y.row_bytes();
        for row in y.as_slice().chunks_exact(stride) {
            assert!(row[width..].iter().all(|&b| b == 0));
        }
    }
}
