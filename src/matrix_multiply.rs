use crate::{ConversionError, InvalidNumberOfPlanesError, PixelBuffer};

/// Multiply `sources` with a fixed-point `matrix` and write the result into `destinations`
///
/// For `M` sources and `N` destinations `matrix` holds `M * N` coefficients, row `i` belonging to
/// source `i`. Every destination sample is computed as
///
/// ```text
/// dst[j] = clamp(floor((Σᵢ (src[i] + pre_bias[i]) * matrix[i * N + j] + post_bias[j]) / divisor), 0, 255)
/// ```
///
/// All planes must be 8 bit single channel planes of the same size. Missing biases are zero.
/// Nothing is written unless every argument checks out. Errors about a destination plane report
/// it as plane `M + j`.
pub fn matrix_multiply_planar8(
    sources: &[&PixelBuffer],
    destinations: &mut [&mut PixelBuffer],
    matrix: &[i16],
    divisor: i32,
    pre_bias: Option<&[i16]>,
    post_bias: Option<&[i32]>,
) -> Result<(), ConversionError> {
    let (m, n) = (sources.len(), destinations.len());

    if m == 0 {
        return Err(InvalidNumberOfPlanesError {
            expected: 1,
            got: 0,
        }
        .into());
    }

    if n == 0 {
        return Err(InvalidNumberOfPlanesError {
            expected: 1,
            got: 0,
        }
        .into());
    }

    if matrix.len() != m * n {
        return Err(ConversionError::MatrixSizeMismatch {
            expected: m * n,
            got: matrix.len(),
        });
    }

    if divisor <= 0 {
        return Err(ConversionError::InvalidDivisor(divisor));
    }

    let pre_bias = pre_bias.unwrap_or(&[]);
    if !pre_bias.is_empty() && pre_bias.len() != m {
        return Err(ConversionError::BiasCountMismatch {
            expected: m,
            got: pre_bias.len(),
        });
    }

    let post_bias = post_bias.unwrap_or(&[]);
    if !post_bias.is_empty() && post_bias.len() != n {
        return Err(ConversionError::BiasCountMismatch {
            expected: n,
            got: post_bias.len(),
        });
    }

    let planes: Vec<&PixelBuffer> = sources
        .iter()
        .copied()
        .chain(destinations.iter().map(|plane| &**plane))
        .collect();
    verify_planes(&planes)?;

    let pre_bias = |i: usize| pre_bias.get(i).copied().map_or(0, i64::from);
    let post_bias = |j: usize| post_bias.get(j).copied().map_or(0, i64::from);
    let divisor = i64::from(divisor);

    // A single source makes every destination a function of one byte
    if let [src] = sources {
        for (j, dst) in destinations.iter_mut().enumerate() {
            let lut: [u8; 256] = std::array::from_fn(|sample| {
                let acc = (sample as i64 + pre_bias(0)) * i64::from(matrix[j]) + post_bias(j);
                narrow(acc, divisor)
            });

            for (src_row, dst_row) in src.rows().zip(dst.rows_mut()) {
                for (&s, d) in src_row.iter().zip(dst_row) {
                    *d = lut[usize::from(s)];
                }
            }
        }

        return Ok(());
    }

    let height = sources[0].height();
    let mut src_rows: Vec<&[u8]> = Vec::with_capacity(m);

    for y in 0..height {
        src_rows.clear();
        src_rows.extend(sources.iter().map(|src| src.row(y)));

        for (j, dst) in destinations.iter_mut().enumerate() {
            for (x, d) in dst.row_mut(y).iter_mut().enumerate() {
                let acc = src_rows
                    .iter()
                    .enumerate()
                    .map(|(i, row)| (i64::from(row[x]) + pre_bias(i)) * i64::from(matrix[i * n + j]))
                    .sum::<i64>()
                    + post_bias(j);

                *d = narrow(acc, divisor);
            }
        }
    }

    Ok(())
}

/// Check that all `planes` are 8 bit single channel planes with the size of the first one
pub(crate) fn verify_planes(planes: &[&PixelBuffer]) -> Result<(), ConversionError> {
    let Some(first) = planes.first() else {
        return Ok(());
    };

    for (i, plane) in planes.iter().enumerate() {
        if plane.width() != first.width() || plane.height() != first.height() {
            return Err(ConversionError::DimensionMismatch {
                plane: i,
                expected_width: first.width(),
                expected_height: first.height(),
                width: plane.width(),
                height: plane.height(),
            });
        }

        if plane.bits_per_component() != 8 {
            return Err(ConversionError::BitsPerComponentMismatch {
                plane: i,
                expected: 8,
                got: plane.bits_per_component(),
            });
        }

        if plane.channel_count() != 1 {
            return Err(ConversionError::ChannelCountMismatch {
                plane: i,
                expected: 1,
                got: plane.channel_count(),
            });
        }
    }

    Ok(())
}

#[inline(always)]
fn narrow(acc: i64, divisor: i64) -> u8 {
    acc.div_euclid(divisor).clamp(0, 255) as u8
}

/// Single plane fixed-point linear transform
///
/// `dst = clamp(floor(((src + pre_bias) * coefficient + post_bias) / divisor), 0, 255)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformMatrix {
    pub coefficient: i16,
    pub divisor: i32,
    pub pre_bias: i16,
    pub post_bias: i32,
}

impl TransformMatrix {
    /// Fixed-point scale of saturation coefficients
    pub const SATURATION_DIVISOR: i32 = 0x1000;

    /// Scale a chroma plane's distance from the neutral value 128 by `factor`
    ///
    /// Factors at or above 8.0 do not fit the coefficient and saturate at `i16::MAX / 0x1000`.
    pub fn saturation(factor: f32) -> Result<Self, ConversionError> {
        if !factor.is_finite() || factor < 0.0 {
            return Err(ConversionError::InvalidFactor(factor));
        }

        let divisor = Self::SATURATION_DIVISOR;

        Ok(Self {
            coefficient: (factor * divisor as f32) as i16,
            divisor,
            pre_bias: -128,
            post_bias: 128 * divisor,
        })
    }

    pub fn apply(&self, sample: u8) -> u8 {
        let acc = (i64::from(sample) + i64::from(self.pre_bias)) * i64::from(self.coefficient)
            + i64::from(self.post_bias);

        narrow(acc, i64::from(self.divisor))
    }

    /// Transform every sample of `src` into `dst`
    pub fn apply_plane(
        &self,
        src: &PixelBuffer,
        dst: &mut PixelBuffer,
    ) -> Result<(), ConversionError> {
        matrix_multiply_planar8(
            &[src],
            &mut [dst],
            &[self.coefficient],
            self.divisor,
            Some(&[self.pre_bias]),
            Some(&[self.post_bias]),
        )
    }
}
