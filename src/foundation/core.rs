use std::fmt;
use std::str::FromStr;

use crate::foundation::error::{WebpmarkError, WebpmarkResult};

/// Pixel size of a video frame, and of the watermark layer generated for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct CanvasDimensions {
    pub width: u32,
    pub height: u32,
}

impl CanvasDimensions {
    /// Create dimensions, rejecting zero width or height.
    pub fn new(width: u32, height: u32) -> WebpmarkResult<Self> {
        if width == 0 || height == 0 {
            return Err(WebpmarkError::validation(format!(
                "canvas width/height must be non-zero (got {width}x{height})"
            )));
        }
        Ok(Self { width, height })
    }

    /// Dimensions after scaling to `target_width` while keeping the aspect ratio.
    ///
    /// Matches ffmpeg's `scale=<w>:-1`, which rounds the derived height to the nearest pixel.
    pub fn scaled_to_width(self, target_width: u32) -> WebpmarkResult<Self> {
        let h = (u64::from(target_width) * u64::from(self.height) + u64::from(self.width) / 2)
            / u64::from(self.width);
        let h = u32::try_from(h)
            .map_err(|_| WebpmarkError::validation("scaled height does not fit in u32"))?;
        Self::new(target_width, h)
    }
}

impl fmt::Display for CanvasDimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Straight RGB color, serialized as `#RRGGBB`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const WHITE: Self = Self::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// RGBA pixel with this color and the given alpha.
    pub fn with_alpha(self, a: u8) -> [u8; 4] {
        [self.r, self.g, self.b, a]
    }
}

impl FromStr for Rgb8 {
    type Err = WebpmarkError;

    /// Parse `#RGB` or `#RRGGBB` (the leading `#` is optional).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bad = || WebpmarkError::validation(format!("invalid color '{s}' (expected #RRGGBB)"));
        if !hex.is_ascii() {
            return Err(bad());
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| bad())
        };
        match hex.len() {
            3 => Ok(Self::new(
                channel(0..1)? * 17,
                channel(1..2)? * 17,
                channel(2..3)? * 17,
            )),
            6 => Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
            _ => Err(bad()),
        }
    }
}

impl TryFrom<String> for Rgb8 {
    type Error = WebpmarkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb8> for String {
    fn from(c: Rgb8) -> Self {
        c.to_string()
    }
}

impl fmt::Display for Rgb8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Integer size of a measured text bounding box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextBox {
    pub width: u32,
    pub height: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sized_canvas_is_rejected() {
        assert!(CanvasDimensions::new(0, 10).is_err());
        assert!(CanvasDimensions::new(10, 0).is_err());
        assert!(CanvasDimensions::new(1, 1).is_ok());
    }

    #[test]
    fn scaled_height_rounds_to_nearest() {
        let c = CanvasDimensions::new(1920, 1080).unwrap();
        assert_eq!(
            c.scaled_to_width(640).unwrap(),
            CanvasDimensions::new(640, 360).unwrap()
        );
        // 333 * 1000 / 1000 stays exact; 100 * 333 / 1000 = 33.3 -> 33
        let c = CanvasDimensions::new(1000, 333).unwrap();
        assert_eq!(c.scaled_to_width(100).unwrap().height, 33);
        // 100 * 335 / 1000 = 33.5 -> 34
        let c = CanvasDimensions::new(1000, 335).unwrap();
        assert_eq!(c.scaled_to_width(100).unwrap().height, 34);
    }

    #[test]
    fn color_parsing_accepts_short_and_long_forms() {
        assert_eq!("#FFF".parse::<Rgb8>().unwrap(), Rgb8::WHITE);
        assert_eq!("#ff0080".parse::<Rgb8>().unwrap(), Rgb8::new(255, 0, 128));
        assert_eq!("00ff00".parse::<Rgb8>().unwrap(), Rgb8::new(0, 255, 0));
        assert!("#12345".parse::<Rgb8>().is_err());
        assert!("#GGGGGG".parse::<Rgb8>().is_err());
        assert!("#ééé".parse::<Rgb8>().is_err());
    }

    #[test]
    fn color_serializes_as_hex_string() {
        let json = serde_json::to_string(&Rgb8::new(1, 2, 255)).unwrap();
        assert_eq!(json, "\"#0102FF\"");
        let back: Rgb8 = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Rgb8::new(1, 2, 255));
    }
}
