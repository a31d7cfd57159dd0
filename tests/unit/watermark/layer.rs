use super::*;

fn canvas(w: u32, h: u32) -> CanvasDimensions {
    CanvasDimensions::new(w, h).unwrap()
}

fn spec(text: &str, position: Position) -> WatermarkSpec {
    WatermarkSpec {
        text: text.to_string(),
        font_path: None,
        color: Rgb8::new(255, 64, 0),
        opacity: 180,
        size_ratio: 30,
        position,
    }
}

fn ink_bounds(img: &RgbaImage) -> Option<(u32, u32, u32, u32)> {
    let mut out: Option<(u32, u32, u32, u32)> = None;
    for (x, y, p) in img.enumerate_pixels() {
        if p[3] == 0 {
            continue;
        }
        out = Some(match out {
            None => (x, y, x + 1, y + 1),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x + 1), y1.max(y + 1)),
        });
    }
    out
}

#[test]
fn offsets_follow_corner_and_center_formulas() {
    let c = canvas(1000, 600);
    let t = TextBox {
        width: 100,
        height: 40,
    };
    assert_eq!(text_offset(Position::TopLeft, c, t, 20), (20, 20));
    assert_eq!(text_offset(Position::TopRight, c, t, 20), (880, 20));
    assert_eq!(text_offset(Position::BottomLeft, c, t, 20), (20, 540));
    assert_eq!(text_offset(Position::BottomRight, c, t, 20), (880, 540));
    assert_eq!(text_offset(Position::Center, c, t, 20), (450, 280));
}

#[test]
fn center_offset_floors_when_text_overflows() {
    let t = TextBox {
        width: 15,
        height: 15,
    };
    assert_eq!(text_offset(Position::Center, canvas(10, 10), t, 20), (-3, -3));
}

#[test]
fn empty_text_is_fully_transparent() {
    let layer = build_watermark_layer(&spec("", Position::Center), canvas(64, 48)).unwrap();
    assert_eq!(layer.dimensions(), (64, 48));
    assert!(layer.pixels().all(|p| p.0 == [0, 0, 0, 0]));
}

#[test]
fn layer_matches_canvas_and_keeps_ink_inside() {
    let font = WatermarkFont::builtin();
    for position in Position::ALL {
        for (w, h) in [(320, 240), (97, 31), (2000, 50)] {
            let layer =
                build_watermark_layer_with_font(&spec("HELLO", position), canvas(w, h), &font)
                    .unwrap();
            assert_eq!(layer.dimensions(), (w, h));
            if let Some((_, _, x1, y1)) = ink_bounds(&layer) {
                assert!(x1 <= w && y1 <= h);
            }
        }
    }
}

#[test]
fn ink_box_lands_at_computed_offset() {
    let font = WatermarkFont::builtin();
    let c = canvas(400, 300);
    // Both glyphs ink their last column, so the ink box equals the measured box.
    let s = spec("HE", Position::BottomRight);
    let layer = build_watermark_layer_with_font(&s, c, &font).unwrap();

    let fitted = fit_font_size(&font, &s.text, c, s.size_ratio);
    let (x, y) = text_offset(s.position, c, fitted.text_box, LAYER_MARGIN_PX);
    let (x0, y0, x1, y1) = ink_bounds(&layer).expect("text should be drawn");
    assert_eq!((i64::from(x0), i64::from(y0)), (x, y));
    assert_eq!(x1, 400 - 20);
    assert_eq!(y1, 300 - 20);
}

#[test]
fn fill_uses_requested_color_and_opacity() {
    let font = WatermarkFont::builtin();
    let layer =
        build_watermark_layer_with_font(&spec("OK", Position::TopLeft), canvas(200, 100), &font)
            .unwrap();
    let inked: Vec<_> = layer.pixels().filter(|p| p[3] != 0).collect();
    assert!(!inked.is_empty());
    // Bitmap glyph cells have full coverage, so alpha equals the opacity.
    assert!(inked.iter().all(|p| p.0 == [255, 64, 0, 180]));
}

#[test]
fn build_is_idempotent() {
    let font = WatermarkFont::builtin();
    let s = spec("Repeat me", Position::Center);
    let a = build_watermark_layer_with_font(&s, canvas(256, 144), &font).unwrap();
    let b = build_watermark_layer_with_font(&s, canvas(256, 144), &font).unwrap();
    assert_eq!(a.as_raw(), b.as_raw());

    let c = build_watermark_layer(&s, canvas(256, 144)).unwrap();
    let d = build_watermark_layer(&s, canvas(256, 144)).unwrap();
    assert_eq!(c.as_raw(), d.as_raw());
}

#[test]
fn fit_stops_at_first_size_reaching_target_width() {
    let font = WatermarkFont::builtin();
    let c = canvas(400, 400);
    let fitted = fit_font_size(&font, "WATERMARK", c, 50);
    assert!(fitted.text_box.width >= 200);
    let smaller = font.measure("WATERMARK", (fitted.size_px - FIT_STEP_PX) as f32);
    assert!(smaller.width < 200);
    assert_eq!((fitted.size_px - FIT_MIN_SIZE_PX) % FIT_STEP_PX, 0);
}

#[test]
fn fit_is_bounded_by_canvas_height() {
    let font = WatermarkFont::builtin();
    // A single glyph can never reach 80% of a very wide, short canvas.
    let fitted = fit_font_size(&font, "I", canvas(5000, 20), 80);
    assert_eq!(fitted.size_px, 22);
}

#[test]
fn fit_checks_width_before_height_bound() {
    let font = WatermarkFont::builtin();
    // Height bound is already exceeded at the first size; the first size is kept.
    let fitted = fit_font_size(&font, "WIDE TEXT", canvas(100, 4), 5);
    assert_eq!(fitted.size_px, FIT_MIN_SIZE_PX);
}

#[test]
fn out_of_range_spec_is_rejected() {
    let s = WatermarkSpec {
        opacity: 0,
        ..spec("x", Position::Center)
    };
    assert!(build_watermark_layer(&s, canvas(10, 10)).is_err());
}

#[test]
fn unloadable_font_file_still_draws_text() {
    let s = WatermarkSpec {
        font_path: Some(std::path::PathBuf::from("no/such.ttf")),
        ..spec("HE", Position::BottomRight)
    };
    let layer = build_watermark_layer(&s, canvas(200, 100)).unwrap();
    assert_eq!(layer.dimensions(), (200, 100));
    assert!(layer.pixels().any(|p| p[3] > 0));
}
