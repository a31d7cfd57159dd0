//! Coordinator owning the loaded video and the single active export job.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use anyhow::Context as _;
use image::RgbaImage;

use crate::export::command::{ExportJob, build_command};
use crate::export::encoder::Encoder;
use crate::export::worker::{ExportHandle, WorkerJob, spawn_export};
use crate::foundation::core::CanvasDimensions;
use crate::foundation::error::{WebpmarkError, WebpmarkResult};
use crate::media::probe::{MediaSource, VideoInfo};
use crate::output::naming::resolve_output_path;
use crate::output::time_ref::{format_timestamp, resolve_time};
use crate::render::composite::composite;
use crate::settings::OutputSettings;
use crate::watermark::layer::build_watermark_layer;
use crate::watermark::spec::WatermarkSpec;

/// A probed video together with its first frame.
#[derive(Clone, Debug)]
pub struct LoadedVideo {
    pub info: VideoInfo,
    pub first_frame: RgbaImage,
}

pub struct Session {
    media: Arc<dyn MediaSource>,
    encoder: Arc<dyn Encoder>,
    temp_dir: PathBuf,
    video: Option<LoadedVideo>,
    active: Arc<AtomicBool>,
    next_asset: AtomicU64,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("temp_dir", &self.temp_dir)
            .field("video", &self.video.as_ref().map(|v| &v.info))
            .field("exporting", &self.is_exporting())
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(
        media: Arc<dyn MediaSource>,
        encoder: Arc<dyn Encoder>,
        temp_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            media,
            encoder,
            temp_dir: temp_dir.into(),
            video: None,
            active: Arc::new(AtomicBool::new(false)),
            next_asset: AtomicU64::new(0),
        }
    }

    /// Probe `path` and grab its first frame, replacing any previously loaded video.
    ///
    /// On failure the previous video stays loaded.
    #[tracing::instrument(skip(self, path), fields(path = %path.display()))]
    pub fn load_video(&mut self, path: &Path) -> WebpmarkResult<&LoadedVideo> {
        let info = self.media.probe(path)?;
        let first_frame = self.media.first_frame(path)?;
        tracing::info!(dimensions = %info.dimensions, "video loaded");
        Ok(self.video.insert(LoadedVideo { info, first_frame }))
    }

    pub fn video(&self) -> Option<&LoadedVideo> {
        self.video.as_ref()
    }

    /// `true` while an export job is running.
    pub fn is_exporting(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// First frame with the watermark layer composited on top.
    pub fn preview(&self, spec: &WatermarkSpec) -> WebpmarkResult<RgbaImage> {
        let video = self.loaded()?;
        let (w, h) = video.first_frame.dimensions();
        let layer = build_watermark_layer(spec, CanvasDimensions::new(w, h)?)?;
        composite(&video.first_frame, &layer)
    }

    /// Start exporting the loaded video on a background thread.
    ///
    /// Fails with [`WebpmarkError::Busy`] while another job runs and with
    /// [`WebpmarkError::Validation`] when no video is loaded or the options are invalid.
    pub fn start_export(
        &self,
        spec: &WatermarkSpec,
        output: &OutputSettings,
    ) -> WebpmarkResult<ExportHandle> {
        if self
            .active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(WebpmarkError::Busy);
        }

        let job = match self.prepare_job(spec, output) {
            Ok(job) => job,
            Err(e) => {
                self.active.store(false, Ordering::Release);
                return Err(e);
            }
        };
        tracing::info!(output = %job.output_path.display(), "starting export");
        spawn_export(Arc::clone(&self.encoder), job, Arc::clone(&self.active))
    }

    fn loaded(&self) -> WebpmarkResult<&LoadedVideo> {
        self.video
            .as_ref()
            .ok_or_else(|| WebpmarkError::validation("no video loaded"))
    }

    fn prepare_job(
        &self,
        spec: &WatermarkSpec,
        output: &OutputSettings,
    ) -> WebpmarkResult<WorkerJob> {
        let video = self.loaded()?;
        spec.validate()?;
        output.validate()?;

        let source = video.info.dimensions;
        let canvas = match u32::try_from(output.scale_width) {
            Ok(w) if w > 0 => source.scaled_to_width(w)?,
            _ => source,
        };
        let layer = build_watermark_layer(spec, canvas)?;
        let asset = self.write_asset(&layer)?;

        let input = &video.info.path;
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let original_dir = input.parent().unwrap_or_else(|| Path::new(""));
        let timestamp = format_timestamp(resolve_time(&output.time_reference));
        let output_path = resolve_output_path(
            &output.name_pattern,
            &stem,
            &timestamp,
            output.directory.as_deref(),
            original_dir,
        );

        let args = build_command(&ExportJob {
            input_path: input.clone(),
            output_path: output_path.clone(),
            watermark_asset_path: asset.clone(),
            position: spec.position,
            fps: output.fps,
            scale_width: output.scale_width,
        })?;
        tracing::debug!(?args, %canvas, "encoder command");

        Ok(WorkerJob {
            args,
            output_path,
            duration_sec: video.info.duration_sec,
            temp_asset: Some(asset),
        })
    }

    /// Write `layer` as a fresh PNG under the temp dir.
    fn write_asset(&self, layer: &RgbaImage) -> WebpmarkResult<PathBuf> {
        std::fs::create_dir_all(&self.temp_dir)
            .with_context(|| format!("create temp dir '{}'", self.temp_dir.display()))?;
        let n = self.next_asset.fetch_add(1, Ordering::Relaxed);
        let path = self
            .temp_dir
            .join(format!("watermark_{}_{n}.png", std::process::id()));
        layer
            .save_with_format(&path, image::ImageFormat::Png)
            .map_err(|e| {
                WebpmarkError::export(format!(
                    "write watermark asset '{}': {e}",
                    path.display()
                ))
            })?;
        Ok(path)
    }
}
