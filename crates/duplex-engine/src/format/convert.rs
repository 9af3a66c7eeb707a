use crate::error::{RenderError, Result};

use super::PixelFormat;

/// Converts a `width × height` block of pixels between formats.
///
/// `src` and `dst` start at the first pixel of the block; rows are `src_pitch` /
/// `dst_pitch` bytes apart. Both slices are validated before any byte is written.
#[allow(clippy::too_many_arguments)]
pub fn convert_pixels(
    width: u32,
    height: u32,
    src_format: PixelFormat,
    src: &[u8],
    src_pitch: u32,
    dst_format: PixelFormat,
    dst: &mut [u8],
    dst_pitch: u32,
) -> Result<()> {
    for format in [src_format, dst_format] {
        if format.masks().is_none() {
            return Err(RenderError::UnsupportedFormat {
                format,
                reason: "conversion requires a direct-color format",
            });
        }
    }

    if width == 0 || height == 0 {
        return Ok(());
    }

    let src_row = (width * src_format.bytes_per_pixel()) as usize;
    let dst_row = (width * dst_format.bytes_per_pixel()) as usize;
    let src_needed = block_len(src_pitch, src_row, height);
    let dst_needed = block_len(dst_pitch, dst_row, height);

    if src.len() < src_needed {
        return Err(RenderError::BufferTooSmall { needed: src_needed, actual: src.len() });
    }
    if dst.len() < dst_needed {
        return Err(RenderError::BufferTooSmall { needed: dst_needed, actual: dst.len() });
    }

    let sbpp = src_format.bytes_per_pixel() as usize;
    let dbpp = dst_format.bytes_per_pixel() as usize;

    for row in 0..height as usize {
        let s = &src[row * src_pitch as usize..][..src_row];
        let d = &mut dst[row * dst_pitch as usize..][..dst_row];

        if src_format == dst_format {
            d.copy_from_slice(s);
            continue;
        }

        for (sp, dp) in s.chunks_exact(sbpp).zip(d.chunks_exact_mut(dbpp)) {
            let color = src_format.unpack(src_format.read(sp));
            dst_format.write(dp, dst_format.map_rgba(color));
        }
    }

    Ok(())
}

/// Bytes spanned by `rows` rows of `row_len` bytes at `pitch` stride.
fn block_len(pitch: u32, row_len: usize, rows: u32) -> usize {
    pitch as usize * (rows as usize - 1) + row_len
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Color8;

    #[test]
    fn same_format_copies_rows_and_skips_padding() {
        // 2x2 block, source rows padded to 12 bytes.
        let mut src = vec![0u8; 24];
        src[..8].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        src[12..20].copy_from_slice(&[9, 10, 11, 12, 13, 14, 15, 16]);
        let mut dst = vec![0u8; 16];

        convert_pixels(2, 2, PixelFormat::Argb8888, &src, 12, PixelFormat::Argb8888, &mut dst, 8)
            .unwrap();

        assert_eq!(dst, (1..=16).collect::<Vec<u8>>());
    }

    #[test]
    fn argb_to_abgr_swaps_red_and_blue() {
        let src_px = PixelFormat::Argb8888.map_rgba(Color8::new(10, 20, 30, 40));
        let src = src_px.to_le_bytes();
        let mut dst = [0u8; 4];

        convert_pixels(1, 1, PixelFormat::Argb8888, &src, 4, PixelFormat::Abgr8888, &mut dst, 4)
            .unwrap();

        let back = PixelFormat::Abgr8888.unpack(u32::from_le_bytes(dst));
        assert_eq!(back, Color8::new(10, 20, 30, 40));
    }

    #[test]
    fn short_destination_is_rejected_untouched() {
        let src = [0xFFu8; 16];
        let mut dst = [0u8; 7];
        let err = convert_pixels(2, 2, PixelFormat::Argb8888, &src, 8, PixelFormat::Argb8888, &mut dst, 4)
            .unwrap_err();
        assert!(matches!(err, RenderError::BufferTooSmall { needed: 8, actual: 7 }));
        assert_eq!(dst, [0u8; 7]);
    }

    #[test]
    fn index8_is_unsupported() {
        let mut dst = [0u8; 4];
        let err = convert_pixels(1, 1, PixelFormat::Index8, &[0], 1, PixelFormat::Argb8888, &mut dst, 4)
            .unwrap_err();
        assert!(matches!(err, RenderError::UnsupportedFormat { .. }));
    }
}
