use std::path::Path;
use std::sync::OnceLock;

use ab_glyph::{Font as _, FontVec, PxScale, ScaleFont as _, point};

use crate::foundation::core::TextBox;
use crate::watermark::builtin_font::{
    ADVANCE_UNITS, GLYPH_COLS, GLYPH_ROWS, LINE_UNITS, glyph_rows,
};

/// Face used to measure and draw watermark text.
///
/// Loading never fails: a missing or unparsable font file falls back to a system sans-serif face,
/// and when the system has no usable fonts either, to the built-in bitmap face.
pub enum WatermarkFont {
    Outline { font: FontVec, source: String },
    Builtin,
}

impl std::fmt::Debug for WatermarkFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("WatermarkFont")
            .field(&self.source_name())
            .finish()
    }
}

impl WatermarkFont {
    pub fn load(path: Option<&Path>) -> Self {
        if let Some(path) = path {
            match load_font_file(path) {
                Ok(font) => {
                    return Self::Outline {
                        font,
                        source: path.display().to_string(),
                    };
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "font load failed, using default font");
                }
            }
        }
        Self::default_font()
    }

    /// First usable system sans-serif face, else the built-in bitmap face.
    pub fn default_font() -> Self {
        match system_default_face() {
            Some(face) => match FontVec::try_from_vec_and_index(face.data.clone(), face.index) {
                Ok(font) => Self::Outline {
                    font,
                    source: face.family.clone(),
                },
                Err(e) => {
                    tracing::warn!(family = %face.family, error = %e, "system font unusable");
                    Self::Builtin
                }
            },
            None => Self::Builtin,
        }
    }

    pub fn builtin() -> Self {
        Self::Builtin
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, Self::Builtin)
    }

    pub fn source_name(&self) -> &str {
        match self {
            Self::Outline { source, .. } => source,
            Self::Builtin => "<builtin 5x7>",
        }
    }

    /// Size of the text's bounding box at `size_px`.
    ///
    /// Vertically the box covers inked pixels only. Horizontally it also spans the pen advance so
    /// whitespace still has a width.
    pub fn measure(&self, text: &str, size_px: f32) -> TextBox {
        self.layout(text, size_px).bounds.text_box()
    }

    /// Rasterize `text` so the top-left of its bounding box lands on `origin`.
    ///
    /// `plot(x, y, coverage)` is called for every covered pixel; coordinates may fall outside any
    /// target canvas and are left to the caller to clip.
    pub fn draw(
        &self,
        text: &str,
        size_px: f32,
        origin: (i64, i64),
        mut plot: impl FnMut(i64, i64, f32),
    ) {
        let layout = self.layout(text, size_px);
        let dx = origin.0 - layout.bounds.min_x;
        let dy = origin.1 - layout.bounds.min_y;
        for glyph in &layout.glyphs {
            match glyph {
                PlacedGlyph::Outline(outlined) => {
                    let b = outlined.px_bounds();
                    let (gx, gy) = (b.min.x as i64, b.min.y as i64);
                    outlined.draw(|px, py, coverage| {
                        if coverage > 0.0 {
                            plot(gx + i64::from(px) + dx, gy + i64::from(py) + dy, coverage);
                        }
                    });
                }
                PlacedGlyph::Cell(cell) => {
                    for y in cell.y0..cell.y1 {
                        for x in cell.x0..cell.x1 {
                            plot(x + dx, y + dy, 1.0);
                        }
                    }
                }
            }
        }
    }

    fn layout(&self, text: &str, size_px: f32) -> TextLayout {
        let mut bounds = Bounds::default();
        let mut glyphs = Vec::new();
        match self {
            Self::Outline { font, .. } => {
                let scale = PxScale::from(size_px);
                let scaled = font.as_scaled(scale);
                let ascent = scaled.ascent();
                let mut caret = 0.0f32;
                let mut prev = None;
                for c in text.chars().filter(|c| !c.is_control()) {
                    let id = scaled.glyph_id(c);
                    if let Some(p) = prev {
                        caret += scaled.kern(p, id);
                    }
                    let glyph = id.with_scale_and_position(scale, point(caret, ascent));
                    if let Some(outlined) = font.outline_glyph(glyph) {
                        let b = outlined.px_bounds();
                        bounds.include_ink(
                            b.min.x as i64,
                            b.min.y as i64,
                            b.max.x as i64,
                            b.max.y as i64,
                        );
                        glyphs.push(PlacedGlyph::Outline(outlined));
                    }
                    caret += scaled.h_advance(id);
                    prev = Some(id);
                }
                bounds.include_advance(caret.ceil() as i64);
            }
            Self::Builtin => {
                let unit = f64::from(size_px) / f64::from(LINE_UNITS);
                let snap = |v: f64| v.floor() as i64;
                let mut pen = 0u32;
                for c in text.chars().filter(|c| !c.is_control()) {
                    if let Some(rows) = glyph_rows(c) {
                        for (row, bits) in rows.iter().enumerate().take(GLYPH_ROWS as usize) {
                            for col in 0..GLYPH_COLS {
                                if bits & (1 << (GLYPH_COLS - 1 - col)) == 0 {
                                    continue;
                                }
                                let ux = f64::from(pen + col);
                                let uy = row as f64;
                                let x0 = snap(ux * unit);
                                let y0 = snap(uy * unit);
                                let cell = Cell {
                                    x0,
                                    y0,
                                    x1: snap((ux + 1.0) * unit).max(x0 + 1),
                                    y1: snap((uy + 1.0) * unit).max(y0 + 1),
                                };
                                bounds.include_ink(cell.x0, cell.y0, cell.x1, cell.y1);
                                glyphs.push(PlacedGlyph::Cell(cell));
                            }
                        }
                    }
                    pen += ADVANCE_UNITS;
                }
                // Trailing inter-glyph gap is not part of the advance extent.
                let advance_units = pen.saturating_sub(ADVANCE_UNITS - GLYPH_COLS);
                bounds.include_advance(snap(f64::from(advance_units) * unit));
            }
        }
        TextLayout { glyphs, bounds }
    }
}

fn load_font_file(path: &Path) -> anyhow::Result<FontVec> {
    use anyhow::Context as _;
    let bytes =
        std::fs::read(path).with_context(|| format!("read font file '{}'", path.display()))?;
    FontVec::try_from_vec_and_index(bytes, 0)
        .with_context(|| format!("parse font file '{}'", path.display()))
}

struct SystemFace {
    family: String,
    data: Vec<u8>,
    index: u32,
}

/// Resolved once per process; scanning system font directories is slow.
fn system_default_face() -> Option<&'static SystemFace> {
    static FACE: OnceLock<Option<SystemFace>> = OnceLock::new();
    FACE.get_or_init(|| {
        use usvg::fontdb::{Database, Family, Query};

        let mut db = Database::new();
        db.load_system_fonts();

        let families = [Family::SansSerif, Family::Serif, Family::Monospace];
        let id = db
            .query(&Query {
                families: &families,
                ..Query::default()
            })
            .or_else(|| db.faces().next().map(|f| f.id))?;

        let family = db
            .face(id)
            .and_then(|f| f.families.first().map(|(name, _)| name.clone()))
            .unwrap_or_else(|| "system".to_string());
        let face = db.with_face_data(id, |data, index| SystemFace {
            family,
            data: data.to_vec(),
            index,
        });
        if let Some(face) = face.as_ref() {
            tracing::debug!(family = %face.family, "resolved system default font");
        }
        face
    })
    .as_ref()
}

struct TextLayout {
    glyphs: Vec<PlacedGlyph>,
    bounds: Bounds,
}

enum PlacedGlyph {
    Outline(ab_glyph::OutlinedGlyph),
    Cell(Cell),
}

struct Cell {
    x0: i64,
    y0: i64,
    x1: i64,
    y1: i64,
}

/// Half-open pixel bounds accumulated while laying out glyphs.
#[derive(Clone, Copy, Debug, Default)]
struct Bounds {
    min_x: i64,
    max_x: i64,
    min_y: i64,
    max_y: i64,
    has_ink: bool,
}

impl Bounds {
    fn include_ink(&mut self, x0: i64, y0: i64, x1: i64, y1: i64) {
        if self.has_ink {
            self.min_x = self.min_x.min(x0);
            self.min_y = self.min_y.min(y0);
            self.max_x = self.max_x.max(x1);
            self.max_y = self.max_y.max(y1);
        } else {
            self.min_x = self.min_x.min(x0);
            self.max_x = self.max_x.max(x1);
            self.min_y = y0;
            self.max_y = y1;
            self.has_ink = true;
        }
    }

    fn include_advance(&mut self, advance: i64) {
        self.min_x = self.min_x.min(0);
        self.max_x = self.max_x.max(advance);
    }

    fn text_box(&self) -> TextBox {
        TextBox {
            width: (self.max_x - self.min_x).max(0) as u32,
            height: (self.max_y - self.min_y).max(0) as u32,
        }
    }
}
