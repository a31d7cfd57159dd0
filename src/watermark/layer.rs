use image::{Rgba, RgbaImage};

use crate::foundation::core::{CanvasDimensions, Rgb8, TextBox};
use crate::foundation::error::WebpmarkResult;
use crate::watermark::font::WatermarkFont;
use crate::watermark::spec::{Position, WatermarkSpec};

/// Distance between the text box and the canvas edges on the watermark layer.
///
/// The encoder overlay uses its own 10 px margin (see `export::command::OVERLAY_MARGIN_PX`);
/// the two are kept distinct.
pub const LAYER_MARGIN_PX: i64 = 20;

/// First font size tried by the fit search.
pub const FIT_MIN_SIZE_PX: u32 = 10;
/// Increment between fit attempts.
pub const FIT_STEP_PX: u32 = 2;

/// Result of the font-size search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FittedText {
    pub size_px: u32,
    pub text_box: TextBox,
}

/// Grow the font size until the text is at least `size_ratio` percent of the canvas width.
///
/// The search starts at [`FIT_MIN_SIZE_PX`] and steps by [`FIT_STEP_PX`]. It stops at the first
/// size whose measured width reaches the target, or once the size exceeds the canvas height; the
/// width test runs first.
pub fn fit_font_size(
    font: &WatermarkFont,
    text: &str,
    canvas: CanvasDimensions,
    size_ratio: u8,
) -> FittedText {
    let target_width = f64::from(canvas.width) * f64::from(size_ratio) / 100.0;
    let mut size_px = FIT_MIN_SIZE_PX;
    loop {
        let text_box = font.measure(text, size_px as f32);
        if f64::from(text_box.width) >= target_width || size_px > canvas.height {
            return FittedText { size_px, text_box };
        }
        size_px += FIT_STEP_PX;
    }
}

/// Top-left offset of a `text` box placed on `canvas` at `position`, `margin` pixels from edges.
///
/// Offsets can be negative when the text is larger than the canvas. `Center` uses floor division.
pub fn text_offset(
    position: Position,
    canvas: CanvasDimensions,
    text: TextBox,
    margin: i64,
) -> (i64, i64) {
    let (cw, ch) = (i64::from(canvas.width), i64::from(canvas.height));
    let (tw, th) = (i64::from(text.width), i64::from(text.height));
    match position {
        Position::TopLeft => (margin, margin),
        Position::TopRight => (cw - tw - margin, margin),
        Position::BottomLeft => (margin, ch - th - margin),
        Position::BottomRight => (cw - tw - margin, ch - th - margin),
        Position::Center => ((cw - tw).div_euclid(2), (ch - th).div_euclid(2)),
    }
}

/// Build the watermark layer for `canvas`, loading the font named by `spec`.
pub fn build_watermark_layer(
    spec: &WatermarkSpec,
    canvas: CanvasDimensions,
) -> WebpmarkResult<RgbaImage> {
    spec.validate()?;
    if spec.text.is_empty() {
        return Ok(RgbaImage::new(canvas.width, canvas.height));
    }
    let font = WatermarkFont::load(spec.font_path.as_deref());
    build_watermark_layer_with_font(spec, canvas, &font)
}

/// Like [`build_watermark_layer`] but with a preloaded font; `spec.font_path` is ignored.
pub fn build_watermark_layer_with_font(
    spec: &WatermarkSpec,
    canvas: CanvasDimensions,
    font: &WatermarkFont,
) -> WebpmarkResult<RgbaImage> {
    spec.validate()?;
    let mut layer = RgbaImage::new(canvas.width, canvas.height);
    if spec.text.is_empty() {
        return Ok(layer);
    }

    let fitted = fit_font_size(font, &spec.text, canvas, spec.size_ratio);
    let origin = text_offset(spec.position, canvas, fitted.text_box, LAYER_MARGIN_PX);
    tracing::debug!(
        font = font.source_name(),
        size_px = fitted.size_px,
        text_w = fitted.text_box.width,
        text_h = fitted.text_box.height,
        x = origin.0,
        y = origin.1,
        "fitted watermark text"
    );

    paint_text(&mut layer, font, &spec.text, fitted.size_px, origin, spec.color, spec.opacity);
    Ok(layer)
}

fn paint_text(
    layer: &mut RgbaImage,
    font: &WatermarkFont,
    text: &str,
    size_px: u32,
    origin: (i64, i64),
    color: Rgb8,
    opacity: u8,
) {
    let (w, h) = (i64::from(layer.width()), i64::from(layer.height()));
    font.draw(text, size_px as f32, origin, |x, y, coverage| {
        if x < 0 || y < 0 || x >= w || y >= h {
            return;
        }
        let a = (coverage.clamp(0.0, 1.0) * f32::from(opacity)).round() as u8;
        if a == 0 {
            return;
        }
        let px = layer.get_pixel_mut(x as u32, y as u32);
        // Overlapping antialiased edges keep the strongest coverage.
        if a > px[3] {
            *px = Rgba(color.with_alpha(a));
        }
    });
}

#[cfg(test)]
#[path = "../../tests/unit/watermark/layer.rs"]
mod tests;
