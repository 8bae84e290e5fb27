mod rgb;
mod ycbcr;

pub(crate) use rgb::{RgbReader, RgbWriter};
pub(crate) use ycbcr::{RgbToYCbCr, YCbCrToRgb};
