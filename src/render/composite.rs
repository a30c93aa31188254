use crate::foundation::core::Canvas;
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::{mul_div255_u8, opacity_to_u16};

/// One premultiplied RGBA8 pixel.
pub type PremulRgba8 = [u8; 4];

/// Source-over of `src` onto `dst`, with `src` scaled by `opacity`.
pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let op = opacity_to_u16(opacity);
    if op == 0 || src[3] == 0 {
        return dst;
    }

    let sa = mul_div255_u8(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }
    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255_u8(u16::from(dst[3]), inv));
    for i in 0..3 {
        let sc = mul_div255_u8(u16::from(src[i]), op);
        let dc = mul_div255_u8(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

/// Fill every pixel of `dst` with `px`.
pub fn fill(dst: &mut [u8], px: PremulRgba8) {
    for d in dst.chunks_exact_mut(4) {
        d.copy_from_slice(&px);
    }
}

/// Source-over a `src_size` image onto `dst` with its top-left corner at `(x, y)`.
///
/// Parts of `src` falling outside `dst` are clipped.
pub fn blit_over(
    dst: &mut [u8],
    dst_size: Canvas,
    src: &[u8],
    src_size: Canvas,
    x: i64,
    y: i64,
    opacity: f32,
) -> ReelResult<()> {
    if dst.len() != dst_size.rgba_len() || src.len() != src_size.rgba_len() {
        return Err(ReelError::evaluation(
            "blit_over buffer lengths do not match their sizes",
        ));
    }
    if opacity_to_u16(opacity) == 0 {
        return Ok(());
    }

    let dw = i64::from(dst_size.width);
    let dh = i64::from(dst_size.height);
    let sw = i64::from(src_size.width);
    let sh = i64::from(src_size.height);

    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + sw).min(dw);
    let y1 = (y + sh).min(dh);
    if x0 >= x1 || y0 >= y1 {
        return Ok(());
    }

    for dy in y0..y1 {
        let sy = dy - y;
        for dx in x0..x1 {
            let sx = dx - x;
            let di = ((dy * dw + dx) * 4) as usize;
            let si = ((sy * sw + sx) * 4) as usize;
            let s = [src[si], src[si + 1], src[si + 2], src[si + 3]];
            let d = [dst[di], dst[di + 1], dst[di + 2], dst[di + 3]];
            dst[di..di + 4].copy_from_slice(&over(d, s, opacity));
        }
    }
    Ok(())
}

/// Source-over a solid colour over the pixel rectangle `[x0, x1) x [y0, y1)`, clipped to `dst`.
pub fn fill_rect_over(
    dst: &mut [u8],
    dst_size: Canvas,
    rect: (i64, i64, i64, i64),
    px: PremulRgba8,
    opacity: f32,
) -> ReelResult<()> {
    if dst.len() != dst_size.rgba_len() {
        return Err(ReelError::evaluation(
            "fill_rect_over buffer length does not match its size",
        ));
    }
    let (x0, y0, x1, y1) = rect;
    let x0 = x0.clamp(0, i64::from(dst_size.width));
    let x1 = x1.clamp(0, i64::from(dst_size.width));
    let y0 = y0.clamp(0, i64::from(dst_size.height));
    let y1 = y1.clamp(0, i64::from(dst_size.height));

    let w = i64::from(dst_size.width);
    for y in y0..y1 {
        for x in x0..x1 {
            let i = ((y * w + x) * 4) as usize;
            let d = [dst[i], dst[i + 1], dst[i + 2], dst[i + 3]];
            dst[i..i + 4].copy_from_slice(&over(d, px, opacity));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
