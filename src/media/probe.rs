use std::path::{Path, PathBuf};
use std::process::Command;

use image::RgbaImage;

use crate::foundation::core::CanvasDimensions;
use crate::foundation::error::{WebpmarkError, WebpmarkResult};

/// What the probe reports about an input video.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoInfo {
    pub path: PathBuf,
    pub dimensions: CanvasDimensions,
    /// Container duration, when the probe reports one.
    pub duration_sec: Option<f64>,
}

/// Source of video metadata and preview frames.
pub trait MediaSource: Send + Sync {
    fn probe(&self, path: &Path) -> WebpmarkResult<VideoInfo>;

    /// First decoded frame as RGBA.
    fn first_frame(&self, path: &Path) -> WebpmarkResult<RgbaImage>;
}

/// [`MediaSource`] backed by the system `ffprobe` and `ffmpeg`.
#[derive(Clone, Debug)]
pub struct FfmpegMedia {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl FfmpegMedia {
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }
}

impl MediaSource for FfmpegMedia {
    fn probe(&self, path: &Path) -> WebpmarkResult<VideoInfo> {
        let out = Command::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=width,height:format=duration",
                "-of",
                "json",
            ])
            .arg(path)
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    WebpmarkError::missing_tool(format!(
                        "failed to run '{}': {e}",
                        self.ffprobe.display()
                    ))
                } else {
                    WebpmarkError::unreadable_input(format!("failed to run ffprobe: {e}"))
                }
            })?;
        if !out.status.success() {
            return Err(WebpmarkError::unreadable_input(format!(
                "ffprobe failed for '{}': {}",
                path.display(),
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }

        let (dimensions, duration_sec) = parse_probe_json(&out.stdout).map_err(|e| {
            WebpmarkError::unreadable_input(format!("'{}': {e}", path.display()))
        })?;
        tracing::debug!(path = %path.display(), %dimensions, ?duration_sec, "probed video");
        Ok(VideoInfo {
            path: path.to_path_buf(),
            dimensions,
            duration_sec,
        })
    }

    fn first_frame(&self, path: &Path) -> WebpmarkResult<RgbaImage> {
        let out = Command::new(&self.ffmpeg)
            .args(["-v", "error", "-i"])
            .arg(path)
            .args(["-vframes", "1", "-f", "image2pipe", "-vcodec", "png", "-"])
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    WebpmarkError::missing_tool(format!(
                        "failed to run '{}': {e}",
                        self.ffmpeg.display()
                    ))
                } else {
                    WebpmarkError::unreadable_input(format!(
                        "failed to run ffmpeg for frame extraction: {e}"
                    ))
                }
            })?;

        // Only the presence of image bytes matters; ffmpeg may warn and still exit non-zero.
        if out.stdout.is_empty() {
            return Err(WebpmarkError::unreadable_input(format!(
                "ffmpeg returned no frame for '{}': {}",
                path.display(),
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }
        decode_frame(&out.stdout)
    }
}

/// Decode still-image bytes (PNG from the frame extractor) into RGBA.
pub fn decode_frame(bytes: &[u8]) -> WebpmarkResult<RgbaImage> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| WebpmarkError::unreadable_input(format!("decode first frame: {e}")))?;
    Ok(img.to_rgba8())
}

fn parse_probe_json(bytes: &[u8]) -> Result<(CanvasDimensions, Option<f64>), String> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        width: Option<u32>,
        height: Option<u32>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        #[serde(default)]
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let parsed: ProbeOut =
        serde_json::from_slice(bytes).map_err(|e| format!("ffprobe json parse failed: {e}"))?;
    let stream = parsed
        .streams
        .first()
        .ok_or_else(|| "no video stream found".to_string())?;
    let width = stream.width.ok_or("missing video width from ffprobe")?;
    let height = stream.height.ok_or("missing video height from ffprobe")?;
    let dimensions = CanvasDimensions::new(width, height).map_err(|e| e.to_string())?;

    let duration_sec = parsed
        .format
        .and_then(|f| f.duration)
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0);
    Ok((dimensions, duration_sec))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dimensions_and_duration() {
        let json = br#"{
            "programs": [],
            "streams": [ { "width": 1280, "height": 720 } ],
            "format": { "duration": "4.250000" }
        }"#;
        let (dims, duration) = parse_probe_json(json).unwrap();
        assert_eq!(dims, CanvasDimensions::new(1280, 720).unwrap());
        assert_eq!(duration, Some(4.25));
    }

    #[test]
    fn duration_is_optional() {
        let json = br#"{ "streams": [ { "width": 2, "height": 2 } ] }"#;
        let (_, duration) = parse_probe_json(json).unwrap();
        assert_eq!(duration, None);

        let json = br#"{ "streams": [ { "width": 2, "height": 2 } ], "format": { "duration": "N/A" } }"#;
        assert_eq!(parse_probe_json(json).unwrap().1, None);
    }

    #[test]
    fn missing_stream_or_zero_size_fails() {
        assert!(parse_probe_json(br#"{ "streams": [] }"#).is_err());
        assert!(parse_probe_json(br#"{ "streams": [ { "width": 0, "height": 10 } ] }"#).is_err());
        assert!(parse_probe_json(br#"{ "streams": [ { "height": 10 } ] }"#).is_err());
        assert!(parse_probe_json(b"not json").is_err());
    }

    #[test]
    fn decode_frame_rejects_garbage() {
        assert!(matches!(
            decode_frame(b"\x00\x01garbage"),
            Err(WebpmarkError::UnreadableInput(_))
        ));
    }

    #[test]
    fn decode_frame_reads_png() {
        let img = RgbaImage::from_pixel(3, 2, image::Rgba([9, 8, 7, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        let back = decode_frame(&bytes).unwrap();
        assert_eq!(back, img);
    }
}
