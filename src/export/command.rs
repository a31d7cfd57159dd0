use std::ffi::OsString;
use std::path::PathBuf;

use crate::foundation::error::{WebpmarkError, WebpmarkResult};
use crate::watermark::spec::Position;

/// Margin used in the encoder's overlay expression.
///
/// This differs from the 20 px margin of the watermark layer itself
/// ([`crate::watermark::layer::LAYER_MARGIN_PX`]); both values are kept as they are.
pub const OVERLAY_MARGIN_PX: u32 = 10;

/// WebP quality passed as `-q:v`.
pub const WEBP_QUALITY: u32 = 75;

/// One conversion request, consumed by the export pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportJob {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub watermark_asset_path: PathBuf,
    pub position: Position,
    pub fps: u32,
    /// Target output width; `<= 0` keeps the original resolution.
    pub scale_width: i32,
}

impl ExportJob {
    pub fn validate(&self) -> WebpmarkResult<()> {
        if self.fps == 0 {
            return Err(WebpmarkError::validation("export fps must be non-zero"));
        }
        Ok(())
    }
}

/// Overlay expression in the encoder's coordinates (`W`/`H` background, `w`/`h` overlay).
pub fn overlay_expr(position: Position) -> String {
    let m = OVERLAY_MARGIN_PX;
    match position {
        Position::TopLeft => format!("overlay={m}:{m}"),
        Position::TopRight => format!("overlay=W-w-{m}:{m}"),
        Position::BottomLeft => format!("overlay={m}:H-h-{m}"),
        Position::BottomRight => format!("overlay=W-w-{m}:H-h-{m}"),
        Position::Center => "overlay=(W-w)/2:(H-h)/2".to_string(),
    }
}

/// `-filter_complex` graph: optional scale of stream 0, then the watermark overlay from stream 1.
pub fn filter_graph(position: Position, scale_width: i32) -> String {
    let overlay = overlay_expr(position);
    if scale_width > 0 {
        format!("[0:v]scale={scale_width}:-1[scaled];[scaled][1:v]{overlay}")
    } else {
        format!("[0:v][1:v]{overlay}")
    }
}

/// Encoder argument list for `job`, excluding the program name.
pub fn build_command(job: &ExportJob) -> WebpmarkResult<Vec<OsString>> {
    job.validate()?;

    let mut args: Vec<OsString> = Vec::with_capacity(24);
    args.push("-y".into());
    args.push("-i".into());
    args.push(job.input_path.clone().into_os_string());
    args.push("-i".into());
    args.push(job.watermark_asset_path.clone().into_os_string());
    args.extend(
        [
            "-filter_complex".to_string(),
            filter_graph(job.position, job.scale_width),
            "-r".to_string(),
            job.fps.to_string(),
            "-loop".to_string(),
            "0".to_string(),
            "-c:v".to_string(),
            "libwebp".to_string(),
            "-lossless".to_string(),
            "0".to_string(),
            "-q:v".to_string(),
            WEBP_QUALITY.to_string(),
            "-preset".to_string(),
            "default".to_string(),
        ]
        .map(OsString::from),
    );
    args.push(job.output_path.clone().into_os_string());
    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(position: Position, scale_width: i32) -> ExportJob {
        ExportJob {
            input_path: PathBuf::from("in/clip.mp4"),
            output_path: PathBuf::from("out/clip.webp"),
            watermark_asset_path: PathBuf::from("tmp/wm.png"),
            position,
            fps: 15,
            scale_width,
        }
    }

    fn as_strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn overlay_expressions_per_position() {
        assert_eq!(overlay_expr(Position::TopLeft), "overlay=10:10");
        assert_eq!(overlay_expr(Position::TopRight), "overlay=W-w-10:10");
        assert_eq!(overlay_expr(Position::BottomLeft), "overlay=10:H-h-10");
        assert_eq!(overlay_expr(Position::BottomRight), "overlay=W-w-10:H-h-10");
        assert_eq!(overlay_expr(Position::Center), "overlay=(W-w)/2:(H-h)/2");
    }

    #[test]
    fn scaling_happens_before_overlay() {
        assert_eq!(
            filter_graph(Position::BottomRight, 640),
            "[0:v]scale=640:-1[scaled];[scaled][1:v]overlay=W-w-10:H-h-10"
        );
    }

    #[test]
    fn non_positive_scale_keeps_original_stream() {
        assert_eq!(filter_graph(Position::TopLeft, -1), "[0:v][1:v]overlay=10:10");
        assert_eq!(filter_graph(Position::TopLeft, 0), "[0:v][1:v]overlay=10:10");
    }

    #[test]
    fn full_argument_list() {
        let args = as_strings(&build_command(&job(Position::Center, -1)).unwrap());
        assert_eq!(
            args,
            vec![
                "-y",
                "-i",
                "in/clip.mp4",
                "-i",
                "tmp/wm.png",
                "-filter_complex",
                "[0:v][1:v]overlay=(W-w)/2:(H-h)/2",
                "-r",
                "15",
                "-loop",
                "0",
                "-c:v",
                "libwebp",
                "-lossless",
                "0",
                "-q:v",
                "75",
                "-preset",
                "default",
                "out/clip.webp",
            ]
        );
    }

    #[test]
    fn zero_fps_is_rejected() {
        let mut j = job(Position::Center, -1);
        j.fps = 0;
        assert!(build_command(&j).is_err());
    }
}
