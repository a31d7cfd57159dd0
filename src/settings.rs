//! JSON presets for the CLI and session defaults.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::{WebpmarkError, WebpmarkResult};
use crate::output::naming::NAME_PLACEHOLDER;
use crate::output::time_ref::DEFAULT_TIME_REFERENCE;
use crate::watermark::spec::WatermarkSpec;

/// Frame rates offered by the original picker.
pub const FPS_CHOICES: [u32; 6] = [10, 15, 20, 24, 30, 60];
/// Default output frame rate.
pub const DEFAULT_FPS: u32 = 15;
/// Default directory for temporary watermark assets.
pub const DEFAULT_TEMP_DIR: &str = "temp_convert";

/// Complete preset: watermark appearance, output options and tool locations.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub watermark: WatermarkSpec,
    pub output: OutputSettings,
    pub tools: ToolSettings,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSettings {
    /// Output directory; blank or missing directories fall back to the input's directory.
    pub directory: Option<String>,
    pub name_pattern: String,
    pub time_reference: String,
    pub fps: u32,
    /// Target width; `<= 0` keeps the source resolution.
    pub scale_width: i32,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            directory: None,
            name_pattern: NAME_PLACEHOLDER.to_string(),
            time_reference: DEFAULT_TIME_REFERENCE.to_string(),
            fps: DEFAULT_FPS,
            scale_width: -1,
        }
    }
}

impl OutputSettings {
    pub fn validate(&self) -> WebpmarkResult<()> {
        if self.fps == 0 {
            return Err(WebpmarkError::validation("output fps must be non-zero"));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolSettings {
    pub ffmpeg: Option<PathBuf>,
    pub ffprobe: Option<PathBuf>,
    pub temp_dir: PathBuf,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            ffmpeg: None,
            ffprobe: None,
            temp_dir: PathBuf::from(DEFAULT_TEMP_DIR),
        }
    }
}

impl Settings {
    /// Read a preset file. Missing fields take their defaults.
    pub fn load(path: &Path) -> WebpmarkResult<Self> {
        let f = File::open(path).with_context(|| format!("open preset '{}'", path.display()))?;
        let settings: Self = serde_json::from_reader(BufReader::new(f))
            .with_context(|| format!("parse preset JSON '{}'", path.display()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> WebpmarkResult<()> {
        self.watermark.validate()?;
        self.output.validate()
    }
}
