use image::RgbaImage;

use crate::foundation::error::{WebpmarkError, WebpmarkResult};
use crate::foundation::math::mul_div255_u32;

pub type StraightRgba8 = [u8; 4];

/// Straight-alpha "over": `src` composited above `dst`.
pub fn over(dst: StraightRgba8, src: StraightRgba8) -> StraightRgba8 {
    let sa = u32::from(src[3]);
    if sa == 0 {
        return dst;
    }
    if sa == 255 {
        return src;
    }

    // Weights in 1/255^2 units.
    let src_w = sa * 255;
    let dst_w = u32::from(dst[3]) * (255 - sa);
    let total = src_w + dst_w;
    if total == 0 {
        return [0, 0, 0, 0];
    }

    let mut out = [0u8; 4];
    for i in 0..3 {
        let c = u32::from(src[i]) * src_w + u32::from(dst[i]) * dst_w;
        out[i] = ((c + total / 2) / total).min(255) as u8;
    }
    out[3] = (sa + mul_div255_u32(u32::from(dst[3]), 255 - sa)).min(255) as u8;
    out
}

/// Composite `layer` above `base` for preview.
///
/// Both images must have identical dimensions; mismatches are rejected rather than cropped or
/// scaled.
pub fn composite(base: &RgbaImage, layer: &RgbaImage) -> WebpmarkResult<RgbaImage> {
    if base.dimensions() != layer.dimensions() {
        return Err(WebpmarkError::validation(format!(
            "composite size mismatch: base {}x{}, layer {}x{}",
            base.width(),
            base.height(),
            layer.width(),
            layer.height()
        )));
    }

    let mut out = base.clone();
    for (d, s) in out.pixels_mut().zip(layer.pixels()) {
        d.0 = over(d.0, s.0);
    }
    Ok(out)
}
