use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::export::encoder::{Encoder, ExportEvent, ExportResult, execute};
use crate::foundation::error::{WebpmarkError, WebpmarkResult};

/// Everything the background worker needs for one job.
pub(crate) struct WorkerJob {
    pub(crate) args: Vec<OsString>,
    pub(crate) output_path: PathBuf,
    pub(crate) duration_sec: Option<f64>,
    /// Temporary watermark asset, removed once the encoder has exited successfully.
    pub(crate) temp_asset: Option<PathBuf>,
}

/// Handle to a running export. Events arrive in order and end with [`ExportEvent::Finished`].
pub struct ExportHandle {
    events: Receiver<ExportEvent>,
    thread: Option<JoinHandle<()>>,
    output_path: PathBuf,
}

impl std::fmt::Debug for ExportHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportHandle")
            .field("output_path", &self.output_path)
            .finish_non_exhaustive()
    }
}

impl ExportHandle {
    /// Output path the job writes to.
    pub fn output_path(&self) -> &std::path::Path {
        &self.output_path
    }

    /// Next event, waiting at most `timeout`. `None` on timeout or once the worker is gone.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<ExportEvent> {
        match self.events.recv_timeout(timeout) {
            Ok(ev) => Some(ev),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Block until the job finishes, passing every event to `on_event`.
    pub fn wait(mut self, mut on_event: impl FnMut(&ExportEvent)) -> WebpmarkResult<ExportResult> {
        let mut result = None;
        for ev in self.events.iter() {
            on_event(&ev);
            if let ExportEvent::Finished(r) = ev {
                result = Some(r);
                break;
            }
        }
        if let Some(thread) = self.thread.take() {
            thread
                .join()
                .map_err(|_| WebpmarkError::export("export worker panicked"))?;
        }
        result.ok_or_else(|| WebpmarkError::export("export worker exited without a result"))
    }
}

/// Clears the "job active" flag when the worker is done, even if it unwinds.
struct ActiveGuard(Arc<AtomicBool>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Start `job` on a background thread. `active` must already be set by the caller.
pub(crate) fn spawn_export(
    encoder: Arc<dyn Encoder>,
    job: WorkerJob,
    active: Arc<AtomicBool>,
) -> WebpmarkResult<ExportHandle> {
    let (tx, rx) = mpsc::channel();
    let output_path = job.output_path.clone();
    let guard = ActiveGuard(active);

    let thread = std::thread::Builder::new()
        .name("webpmark-export".to_string())
        .spawn(move || {
            let span = tracing::info_span!("export", output = %job.output_path.display());
            let _enter = span.enter();
            tracing::info!("encoder started");

            let result = execute(
                encoder.as_ref(),
                &job.args,
                job.output_path.clone(),
                job.duration_sec,
                &mut |ev| {
                    if !matches!(ev, ExportEvent::Finished(_)) {
                        let _ = tx.send(ev);
                    }
                },
            );

            if result.is_success() {
                tracing::info!("encoder finished");
                if let Some(asset) = job.temp_asset.as_deref()
                    && let Err(e) = std::fs::remove_file(asset)
                {
                    tracing::warn!(path = %asset.display(), error = %e, "failed to remove temporary watermark");
                }
            } else {
                tracing::warn!(?result, "export failed");
            }

            drop(guard);
            let _ = tx.send(ExportEvent::Finished(result));
        })
        .map_err(|e| WebpmarkError::export(format!("failed to start export worker: {e}")))?;

    Ok(ExportHandle {
        events: rx,
        thread: Some(thread),
        output_path,
    })
}
