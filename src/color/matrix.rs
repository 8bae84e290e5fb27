use super::mat_idxs::*;

/// RGB ⇄ YCbCr transform derived from the luma weights Kr, Kg and Kb
///
/// Both directions operate on values scaled to 0.0..=255.0 with Cb and Cr centered on 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConversionMatrix {
    kr: f32,
    kg: f32,
    kb: f32,

    pub(crate) rgb_to_ycbcr: [[f32; 3]; 3],
    pub(crate) ycbcr_to_rgb: [[f32; 3]; 3],
}

impl ConversionMatrix {
    /// Rec. ITU-R BT.601-4
    pub const ITU_R_601_4: Self = Self::from_luma_coefficients(0.299, 0.114);

    /// Build the matrices from the red and blue luma weights, green is `1 - kr - kb`
    ///
    /// Weights that don't describe a valid transform are caught by [`is_valid`](Self::is_valid)
    /// and make conversions using this matrix fail.
    #[rustfmt::skip]
    pub const fn from_luma_coefficients(kr: f32, kb: f32) -> Self {
        let kg = 1.0 - kr - kb;

        Self {
            kr,
            kg,
            kb,
            rgb_to_ycbcr: [
                // R                       G                          B
                [kr,                       kg,                        kb                       ], // Y
                [-0.5 * (kr / (1.0 - kb)), -0.5 * (kg / (1.0 - kb)),  0.5                      ], // Cb
                [0.5,                      -0.5 * (kg / (1.0 - kr)),  -0.5 * (kb / (1.0 - kr))], // Cr
            ],
            ycbcr_to_rgb: [
                // Y  Cb                              Cr
                [1.0, 0.0,                            2.0 - 2.0 * kr                 ], // R
                [1.0, -(kb / kg) * (2.0 - 2.0 * kb),  -(kr / kg) * (2.0 - 2.0 * kr)  ], // G
                [1.0, 2.0 - 2.0 * kb,                 0.0                            ], // B
            ],
        }
    }

    /// Luma weights (Kr, Kg, Kb)
    pub fn luma_coefficients(&self) -> (f32, f32, f32) {
        (self.kr, self.kg, self.kb)
    }

    /// Forward matrix, rows are Y, Cb, Cr and columns R, G, B
    pub fn rgb_to_ycbcr(&self) -> &[[f32; 3]; 3] {
        &self.rgb_to_ycbcr
    }

    /// Reverse matrix, rows are R, G, B and columns Y, Cb, Cr
    pub fn ycbcr_to_rgb(&self) -> &[[f32; 3]; 3] {
        &self.ycbcr_to_rgb
    }

    /// All weights must be positive and finite and sum up to one
    pub fn is_valid(&self) -> bool {
        let weights = [self.kr, self.kg, self.kb];

        weights.iter().all(|k| k.is_finite() && *k > 0.0)
            && self
                .rgb_to_ycbcr
                .iter()
                .chain(self.ycbcr_to_rgb.iter())
                .flatten()
                .all(|v| v.is_finite())
    }

    #[inline(always)]
    pub(crate) fn forward(&self, r: f32, g: f32, b: f32) -> (f32, f32, f32) {
        let m = &self.rgb_to_ycbcr;

        let y = m[Y][R] * r + m[Y][G] * g + m[Y][B] * b;
        let cb = m[CB][R] * r + m[CB][G] * g + m[CB][B] * b;
        let cr = m[CR][R] * r + m[CR][G] * g + m[CR][B] * b;

        (y, cb, cr)
    }

    #[inline(always)]
    pub(crate) fn reverse(&self, y: f32, cb: f32, cr: f32) -> (f32, f32, f32) {
        let m = &self.ycbcr_to_rgb;

        let r = m[R][Y] * y + m[R][CR] * cr;
        let g = m[G][Y] * y + m[G][CB] * cb + m[G][CR] * cr;
        let b = m[B][Y] * y + m[B][CB] * cb;

        (r, g, b)
    }
}

impl Default for ConversionMatrix {
    fn default() -> Self {
        Self::ITU_R_601_4
    }
}
