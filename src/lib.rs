#![forbid(unsafe_code)]
//! Convert videos to looping animated WebP with a text watermark burned in.
//!
//! The watermark is rendered into a transparent layer the size of the output frame
//! ([`build_watermark_layer`]), previewed by compositing it onto the first frame
//! ([`composite`]), and burned in by the system `ffmpeg` ([`Session::start_export`]).

pub mod export;
mod foundation;
pub mod media;
pub mod output;
pub mod render;
pub mod session;
pub mod settings;
pub mod watermark;

pub use export::command::{ExportJob, build_command, filter_graph, overlay_expr};
pub use export::encoder::{
    Encoder, EncoderExit, ExportEvent, ExportProgress, ExportResult, FAILURE_MESSAGE,
    FfmpegEncoder, execute,
};
pub use export::worker::ExportHandle;
pub use foundation::core::{CanvasDimensions, Rgb8, TextBox};
pub use foundation::error::{WebpmarkError, WebpmarkResult};
pub use media::probe::{FfmpegMedia, MediaSource, VideoInfo};
pub use media::tools::{ToolPaths, locate_tool};
pub use output::naming::resolve_output_path;
pub use output::time_ref::{TIME_REFERENCE_PRESETS, format_timestamp, resolve_time, resolve_time_at};
pub use render::composite::composite;
pub use session::{LoadedVideo, Session};
pub use settings::{OutputSettings, Settings, ToolSettings};
pub use watermark::font::WatermarkFont;
pub use watermark::layer::{build_watermark_layer, build_watermark_layer_with_font};
pub use watermark::spec::{LabelLocale, Position, WatermarkSpec, position_label};
