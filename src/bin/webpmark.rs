use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use webpmark::{
    CanvasDimensions, ExportEvent, ExportProgress, ExportResult, FfmpegEncoder, FfmpegMedia,
    Position, Rgb8, Session, Settings, ToolPaths,
};

#[derive(Parser, Debug)]
#[command(name = "webpmark", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the transparent watermark layer as a PNG (no ffmpeg needed).
    Layer(LayerArgs),
    /// Write the first frame of a video with the watermark composited on top.
    Preview(PreviewArgs),
    /// Convert a video to a looping animated WebP with the watermark burned in.
    Convert(ConvertArgs),
}

#[derive(Args, Debug)]
struct WatermarkArgs {
    /// JSON preset; the flags below override its values.
    #[arg(long)]
    preset: Option<PathBuf>,

    /// Watermark text (empty for no watermark).
    #[arg(long)]
    text: Option<String>,

    /// TrueType/OpenType font file.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Text color, `#RRGGBB`.
    #[arg(long)]
    color: Option<Rgb8>,

    /// Text alpha, 10..=255.
    #[arg(long)]
    opacity: Option<u8>,

    /// Text width as a percentage of the frame width, 5..=80.
    #[arg(long)]
    size: Option<u8>,

    #[arg(long, value_enum)]
    position: Option<Position>,
}

#[derive(Args, Debug)]
struct ToolArgs {
    /// Path to the ffmpeg binary.
    #[arg(long)]
    ffmpeg: Option<PathBuf>,

    /// Path to the ffprobe binary.
    #[arg(long)]
    ffprobe: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct LayerArgs {
    #[command(flatten)]
    watermark: WatermarkArgs,

    #[arg(long)]
    width: u32,

    #[arg(long)]
    height: u32,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct PreviewArgs {
    #[command(flatten)]
    watermark: WatermarkArgs,

    #[command(flatten)]
    tools: ToolArgs,

    /// Input video.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct ConvertArgs {
    #[command(flatten)]
    watermark: WatermarkArgs,

    #[command(flatten)]
    tools: ToolArgs,

    /// Input video.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output directory (defaults to the input's directory).
    #[arg(long)]
    out_dir: Option<String>,

    /// Output name pattern with `{name}` and `{time}` placeholders.
    #[arg(long)]
    pattern: Option<String>,

    /// Clock for `{time}`: "Local", "UTC" or "UTC+N".
    #[arg(long)]
    time_ref: Option<String>,

    #[arg(long)]
    fps: Option<u32>,

    /// Output width; `-1` keeps the source resolution.
    #[arg(long, allow_hyphen_values = true)]
    scale_width: Option<i32>,

    /// Directory for the temporary watermark image.
    #[arg(long)]
    temp_dir: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Layer(args) => cmd_layer(args),
        Command::Preview(args) => cmd_preview(args),
        Command::Convert(args) => cmd_convert(args),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Preset (or defaults) with the watermark flags applied.
fn resolve_settings(args: &WatermarkArgs) -> anyhow::Result<Settings> {
    let mut settings = match &args.preset {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let wm = &mut settings.watermark;
    if let Some(text) = &args.text {
        wm.text = text.clone();
    }
    if let Some(font) = &args.font {
        wm.font_path = Some(font.clone());
    }
    if let Some(color) = args.color {
        wm.color = color;
    }
    if let Some(opacity) = args.opacity {
        wm.opacity = opacity;
    }
    if let Some(size) = args.size {
        wm.size_ratio = size;
    }
    if let Some(position) = args.position {
        wm.position = position;
    }
    Ok(settings)
}

fn make_session(settings: &Settings, tools: &ToolArgs) -> anyhow::Result<Session> {
    let paths = ToolPaths::locate(
        tools.ffmpeg.as_deref().or(settings.tools.ffmpeg.as_deref()),
        tools.ffprobe.as_deref().or(settings.tools.ffprobe.as_deref()),
    )?;
    tracing::debug!(ffmpeg = %paths.ffmpeg.display(), ffprobe = %paths.ffprobe.display(), "located tools");
    Ok(Session::new(
        Arc::new(FfmpegMedia::new(&paths.ffmpeg, &paths.ffprobe)),
        Arc::new(FfmpegEncoder::new(&paths.ffmpeg)),
        &settings.tools.temp_dir,
    ))
}

fn write_png(img: &image::RgbaImage, out: &Path) -> anyhow::Result<()> {
    if let Some(parent) = out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    img.save_with_format(out, image::ImageFormat::Png)
        .with_context(|| format!("write png '{}'", out.display()))?;
    Ok(())
}

fn cmd_layer(args: LayerArgs) -> anyhow::Result<()> {
    let settings = resolve_settings(&args.watermark)?;
    let canvas = CanvasDimensions::new(args.width, args.height)?;
    let layer = webpmark::build_watermark_layer(&settings.watermark, canvas)?;
    write_png(&layer, &args.out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_preview(args: PreviewArgs) -> anyhow::Result<()> {
    let settings = resolve_settings(&args.watermark)?;
    let mut session = make_session(&settings, &args.tools)?;
    session.load_video(&args.in_path)?;
    let preview = session.preview(&settings.watermark)?;
    write_png(&preview, &args.out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_convert(args: ConvertArgs) -> anyhow::Result<()> {
    let mut settings = resolve_settings(&args.watermark)?;
    let output = &mut settings.output;
    if let Some(dir) = &args.out_dir {
        output.directory = Some(dir.clone());
    }
    if let Some(pattern) = &args.pattern {
        output.name_pattern = pattern.clone();
    }
    if let Some(time_ref) = &args.time_ref {
        output.time_reference = time_ref.clone();
    }
    if let Some(fps) = args.fps {
        output.fps = fps;
    }
    if let Some(scale_width) = args.scale_width {
        output.scale_width = scale_width;
    }
    if let Some(temp_dir) = &args.temp_dir {
        settings.tools.temp_dir = temp_dir.clone();
    }

    let mut session = make_session(&settings, &args.tools)?;
    session.load_video(&args.in_path)?;
    let handle = session.start_export(&settings.watermark, &settings.output)?;

    let result = handle.wait(|ev| match ev {
        ExportEvent::Progress(ExportProgress::Indeterminate) => tracing::info!("converting"),
        ExportEvent::Progress(ExportProgress::Percent(p)) => tracing::info!(percent = p, "progress"),
        ExportEvent::Log(line) => tracing::debug!(target: "ffmpeg", "{line}"),
        ExportEvent::Finished(_) => {}
    })?;

    match result {
        ExportResult::Success { output_path } => {
            println!("{}", output_path.display());
            Ok(())
        }
        ExportResult::Failure { message, .. } => anyhow::bail!(message),
    }
}
