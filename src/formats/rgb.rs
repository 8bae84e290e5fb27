use crate::{AlphaInfo, RgbFormat};

/// Reads interleaved 8 bit RGB(A) pixels as `f32` triplets in 0.0..=255.0
///
/// Pixels with alpha are composited over the background color. The result carries no alpha.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RgbReader {
    alpha: AlphaInfo,
    channels: usize,

    /// Background color premultiplied with its own alpha, scaled to 0.0..=255.0
    background: [f32; 3],
}

impl RgbReader {
    pub(crate) fn new(format: &RgbFormat, background: [f32; 4]) -> Self {
        let [r, g, b, a] = background.map(|c| c.clamp(0.0, 1.0));

        Self {
            alpha: format.alpha,
            channels: format.channel_count(),
            background: [r * a * 255.0, g * a * 255.0, b * a * 255.0],
        }
    }

    pub(crate) fn channels(&self) -> usize {
        self.channels
    }

    #[inline(always)]
    pub(crate) fn read(&self, px: &[u8]) -> [f32; 3] {
        let [r, g, b] = [px[0], px[1], px[2]].map(f32::from);

        match self.alpha {
            AlphaInfo::None => [r, g, b],
            AlphaInfo::Last => {
                let a = f32::from(px[3]) / 255.0;
                let [br, bg, bb] = self.background;

                [
                    r * a + br * (1.0 - a),
                    g * a + bg * (1.0 - a),
                    b * a + bb * (1.0 - a),
                ]
            }
            AlphaInfo::PremultipliedLast => {
                let a = f32::from(px[3]) / 255.0;
                let [br, bg, bb] = self.background;

                [r + br * (1.0 - a), g + bg * (1.0 - a), b + bb * (1.0 - a)]
            }
        }
    }

    /// Flatten a whole row into 8 bit RGB
    pub(crate) fn read_row_rgb8(&self, src: &[u8], dst: &mut [u8]) {
        if let AlphaInfo::None = self.alpha {
            dst.copy_from_slice(src);
            return;
        }

        for (px, out) in src.chunks_exact(self.channels).zip(dst.chunks_exact_mut(3)) {
            let [r, g, b] = self.read(px);

            out[0] = quantize(r);
            out[1] = quantize(g);
            out[2] = quantize(b);
        }
    }
}

/// Writes `f32` triplets in 0.0..=255.0 as interleaved 8 bit RGB(A) pixels
///
/// The alpha channel, if any, is always written fully opaque.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RgbWriter {
    channels: usize,
}

impl RgbWriter {
    pub(crate) fn new(format: &RgbFormat) -> Self {
        Self {
            channels: format.channel_count(),
        }
    }

    pub(crate) fn channels(&self) -> usize {
        self.channels
    }

    #[inline(always)]
    pub(crate) fn write(&self, px: &mut [u8], [r, g, b]: [f32; 3]) {
        px[0] = quantize(r);
        px[1] = quantize(g);
        px[2] = quantize(b);

        if self.channels == 4 {
            px[3] = u8::MAX;
        }
    }
}

/// Round to nearest and clamp into the 8 bit range
#[inline(always)]
pub(crate) fn quantize(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}
