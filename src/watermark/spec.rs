use std::path::PathBuf;

use crate::foundation::core::Rgb8;
use crate::foundation::error::{WebpmarkError, WebpmarkResult};

/// Accepted range for [`WatermarkSpec::opacity`].
pub const OPACITY_RANGE: std::ops::RangeInclusive<u8> = 10..=255;
/// Accepted range for [`WatermarkSpec::size_ratio`], in percent of the canvas width.
pub const SIZE_RATIO_RANGE: std::ops::RangeInclusive<u8> = 5..=80;

/// Where the watermark text is anchored on the frame.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
    Center,
}

impl Position {
    pub const ALL: [Position; 5] = [
        Position::TopLeft,
        Position::TopRight,
        Position::BottomLeft,
        Position::BottomRight,
        Position::Center,
    ];
}

/// Language of the presentation labels for [`Position`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LabelLocale {
    English,
    Chinese,
}

const POSITION_LABELS: [(Position, &str, &str); 5] = [
    (Position::TopLeft, "Top left", "左上"),
    (Position::TopRight, "Top right", "右上"),
    (Position::BottomLeft, "Bottom left", "左下"),
    (Position::BottomRight, "Bottom right", "右下"),
    (Position::Center, "Center", "居中"),
];

/// Display label for a position.
pub fn position_label(position: Position, locale: LabelLocale) -> &'static str {
    POSITION_LABELS
        .iter()
        .find(|(p, _, _)| *p == position)
        .map(|(_, en, zh)| match locale {
            LabelLocale::English => *en,
            LabelLocale::Chinese => *zh,
        })
        .unwrap_or("")
}

/// Reverse lookup of [`position_label`] in any locale (case-insensitive for English).
pub fn position_from_label(label: &str) -> Option<Position> {
    let label = label.trim();
    POSITION_LABELS
        .iter()
        .find(|(_, en, zh)| en.eq_ignore_ascii_case(label) || *zh == label)
        .map(|(p, _, _)| *p)
}

/// Snapshot of the watermark settings used for one layer generation.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct WatermarkSpec {
    pub text: String,
    /// Font file to render with. `None` (or an unloadable file) uses the default font.
    pub font_path: Option<PathBuf>,
    pub color: Rgb8,
    /// Alpha of the text fill, in `[10, 255]`.
    pub opacity: u8,
    /// Target text width as a percentage of the canvas width, in `[5, 80]`.
    pub size_ratio: u8,
    pub position: Position,
}

impl Default for WatermarkSpec {
    fn default() -> Self {
        Self {
            text: "Watermark".to_string(),
            font_path: None,
            color: Rgb8::WHITE,
            opacity: 200,
            size_ratio: 20,
            position: Position::BottomRight,
        }
    }
}

impl WatermarkSpec {
    pub fn validate(&self) -> WebpmarkResult<()> {
        if !OPACITY_RANGE.contains(&self.opacity) {
            return Err(WebpmarkError::validation(format!(
                "opacity must be in [{}, {}] (got {})",
                OPACITY_RANGE.start(),
                OPACITY_RANGE.end(),
                self.opacity
            )));
        }
        if !SIZE_RATIO_RANGE.contains(&self.size_ratio) {
            return Err(WebpmarkError::validation(format!(
                "size ratio must be in [{}, {}] percent (got {})",
                SIZE_RATIO_RANGE.start(),
                SIZE_RATIO_RANGE.end(),
                self.size_ratio
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip_in_both_locales() {
        for p in Position::ALL {
            let en = position_label(p, LabelLocale::English);
            let zh = position_label(p, LabelLocale::Chinese);
            assert_eq!(position_from_label(en), Some(p));
            assert_eq!(position_from_label(zh), Some(p));
        }
        assert_eq!(position_from_label("bottom RIGHT"), Some(Position::BottomRight));
        assert_eq!(position_from_label("middle"), None);
    }

    #[test]
    fn validate_enforces_ranges() {
        let ok = WatermarkSpec::default();
        assert!(ok.validate().is_ok());

        let low_opacity = WatermarkSpec {
            opacity: 9,
            ..WatermarkSpec::default()
        };
        assert!(low_opacity.validate().is_err());

        let big = WatermarkSpec {
            size_ratio: 81,
            ..WatermarkSpec::default()
        };
        assert!(big.validate().is_err());

        let small = WatermarkSpec {
            size_ratio: 4,
            ..WatermarkSpec::default()
        };
        assert!(small.validate().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let spec: WatermarkSpec =
            serde_json::from_str(r##"{ "text": "hi", "position": "top_left" }"##).unwrap();
        assert_eq!(spec.text, "hi");
        assert_eq!(spec.position, Position::TopLeft);
        assert_eq!(spec.opacity, 200);
        assert_eq!(spec.color, Rgb8::WHITE);
    }
}
