//! Per-pixel blending of 8-bit, straight (non-premultiplied) alpha RGBA.

/// A single RGBA8 pixel, straight alpha.
pub type Pixel = [u8; 4];

/// Porter-Duff "source over destination".
///
/// Math is done premultiplied and divided back out, so the result is the same as
/// blending premultiplied colors and un-premultiplying after. Fully opaque or fully
/// transparent sources are exact.
#[must_use]
pub fn over(src: Pixel, dst: Pixel) -> Pixel {
    match src[3] {
        255 => return src,
        0 => return dst,
        _ => (),
    }
    let src_a = f32::from(src[3]) / 255.0;
    let dst_a = f32::from(dst[3]) / 255.0;
    let dst_weight = dst_a * (1.0 - src_a);
    let out_a = src_a + dst_weight;
    // src_a is nonzero here, so out_a is too.
    let channel = |s: u8, d: u8| -> u8 {
        let value = (f32::from(s) * src_a + f32::from(d) * dst_weight) / out_a;
        // as-cast saturates, clamp is for clarity.
        value.round().clamp(0.0, 255.0) as u8
    };
    [
        channel(src[0], dst[0]),
        channel(src[1], dst[1]),
        channel(src[2], dst[2]),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ]
}

/// Blend `src` over `dst` in place, pixel by pixel. Both slices are packed RGBA8
/// and trailing bytes that don't form a whole pixel are ignored.
pub fn over_row(src: &[u8], dst: &mut [u8]) {
    for (dst, src) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let blended = over(
            [src[0], src[1], src[2], src[3]],
            [dst[0], dst[1], dst[2], dst[3]],
        );
        dst.copy_from_slice(&blended);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn opaque_source_replaces() {
        assert_eq!(over([1, 2, 3, 255], [200, 100, 50, 255]), [1, 2, 3, 255]);
        assert_eq!(over([1, 2, 3, 255], [0, 0, 0, 0]), [1, 2, 3, 255]);
    }
    #[test]
    fn transparent_source_keeps_destination() {
        assert_eq!(over([9, 9, 9, 0], [200, 100, 50, 77]), [200, 100, 50, 77]);
        assert_eq!(over([9, 9, 9, 0], [0, 0, 0, 0]), [0, 0, 0, 0]);
    }
    #[test]
    fn half_over_opaque() {
        // 128/255 red over opaque blue.
        let out = over([255, 0, 0, 128], [0, 0, 255, 255]);
        assert_eq!(out[3], 255);
        assert_eq!(out[0], 128);
        assert_eq!(out[1], 0);
        assert_eq!(out[2], 127);
    }
    #[test]
    fn over_empty_keeps_color() {
        // Straight alpha: blending onto nothing must not darken.
        assert_eq!(over([10, 20, 30, 100], [0, 0, 0, 0]), [10, 20, 30, 100]);
    }
    #[test]
    fn alpha_accumulates() {
        let out = over([0, 0, 0, 128], [0, 0, 0, 128]);
        // 0.502 + 0.502 * 0.498 = 0.752
        assert_eq!(out[3], 192);
    }
    #[test]
    fn row_ignores_partial_pixels() {
        let src = [255, 255, 255, 255, 7];
        let mut dst = [0, 0, 0, 255, 0, 0];
        over_row(&src, &mut dst);
        assert_eq!(dst, [255, 255, 255, 255, 0, 0]);
    }
}
