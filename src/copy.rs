use crate::{ConversionError, PixelBuffer};

/// Copy the pixel bytes of `src` into `dst` row by row, leaving the row padding of `dst` as is
pub(crate) fn copy_plane(src: &PixelBuffer, dst: &mut PixelBuffer) -> Result<(), ConversionError> {
    if !src.same_layout(dst) {
        if src.width() != dst.width() || src.height() != dst.height() {
            return Err(ConversionError::DimensionMismatch {
                plane: 0,
                expected_width: src.width(),
                expected_height: src.height(),
                width: dst.width(),
                height: dst.height(),
            });
        }

        if src.bits_per_component() != dst.bits_per_component() {
            return Err(ConversionError::BitsPerComponentMismatch {
                plane: 0,
                expected: src.bits_per_component(),
                got: dst.bits_per_component(),
            });
        }

        return Err(ConversionError::ChannelCountMismatch {
            plane: 0,
            expected: src.channel_count(),
            got: dst.channel_count(),
        });
    }

    for (src_row, dst_row) in src.rows().zip(dst.rows_mut()) {
        dst_row.copy_from_slice(src_row);
    }

    Ok(())
}
