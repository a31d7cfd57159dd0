use std::collections::VecDeque;
use std::ffi::OsString;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Message reported for any non-zero encoder exit.
pub const FAILURE_MESSAGE: &str = "conversion failed, check whether source file is corrupted";

/// Diagnostic lines retained for the failure record.
const DIAGNOSTIC_TAIL_LINES: usize = 64;

/// Terminal outcome of one export job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExportResult {
    Success {
        output_path: PathBuf,
    },
    Failure {
        message: String,
        /// Raw encoder diagnostics, for logging only.
        diagnostics: String,
    },
}

impl ExportResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Progress of a running export.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportProgress {
    /// The encoder is running but its position is unknown.
    Indeterminate,
    /// Percent complete; 100 is only reported on success.
    Percent(u8),
}

/// Exit of one encoder process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncoderExit {
    pub success: bool,
    pub code: Option<i32>,
    pub diagnostics: String,
}

/// Runs the external encoder for an argument list produced by
/// [`build_command`](crate::export::command::build_command).
pub trait Encoder: Send + Sync {
    /// Run to completion, passing each diagnostic line to `on_line` as it arrives.
    fn run(&self, args: &[OsString], on_line: &mut dyn FnMut(&str))
    -> std::io::Result<EncoderExit>;
}

/// [`Encoder`] that spawns the system `ffmpeg`.
#[derive(Clone, Debug)]
pub struct FfmpegEncoder {
    program: PathBuf,
}

impl FfmpegEncoder {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Encoder for FfmpegEncoder {
    fn run(
        &self,
        args: &[OsString],
        on_line: &mut dyn FnMut(&str),
    ) -> std::io::Result<EncoderExit> {
        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        let mut tail = VecDeque::with_capacity(DIAGNOSTIC_TAIL_LINES);
        if let Some(stderr) = child.stderr.take() {
            for_each_line(stderr, |line| {
                on_line(line);
                if tail.len() == DIAGNOSTIC_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line.to_string());
            })?;
        }

        let status = child.wait()?;
        Ok(EncoderExit {
            success: status.success(),
            code: status.code(),
            diagnostics: tail.into_iter().collect::<Vec<_>>().join("\n"),
        })
    }
}

/// Split a byte stream on `\n` and `\r` (ffmpeg rewrites its stats line with carriage returns).
fn for_each_line(mut reader: impl Read, mut f: impl FnMut(&str)) -> std::io::Result<()> {
    let mut chunk = [0u8; 4096];
    let mut pending = Vec::new();
    loop {
        let n = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        for &b in &chunk[..n] {
            if b == b'\n' || b == b'\r' {
                flush_line(&mut pending, &mut f);
            } else {
                pending.push(b);
            }
        }
    }
    flush_line(&mut pending, &mut f);
    Ok(())
}

fn flush_line(pending: &mut Vec<u8>, f: &mut impl FnMut(&str)) {
    if pending.is_empty() {
        return;
    }
    let line = String::from_utf8_lossy(pending);
    let line = line.trim();
    if !line.is_empty() {
        f(line);
    }
    pending.clear();
}

/// Events the export pipeline reports while a job runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExportEvent {
    Progress(ExportProgress),
    Log(String),
    Finished(ExportResult),
}

/// Run `args` through `encoder` and map the exit to an [`ExportResult`].
///
/// Emits `Indeterminate` progress at start, then percentages when `duration_sec` is known and
/// the encoder prints `time=` markers, and `Percent(100)` on success. The result is also
/// delivered as the final [`ExportEvent::Finished`].
pub fn execute(
    encoder: &dyn Encoder,
    args: &[OsString],
    output_path: PathBuf,
    duration_sec: Option<f64>,
    on_event: &mut dyn FnMut(ExportEvent),
) -> ExportResult {
    on_event(ExportEvent::Progress(ExportProgress::Indeterminate));

    let mut last_percent = None;
    let run = encoder.run(args, &mut |line| {
        on_event(ExportEvent::Log(line.to_string()));
        let percent = duration_sec.zip(parse_progress_time(line)).map(|(d, t)| percent_of(t, d));
        if let Some(p) = percent
            && last_percent != Some(p)
        {
            last_percent = Some(p);
            on_event(ExportEvent::Progress(ExportProgress::Percent(p)));
        }
    });

    let result = match run {
        Ok(exit) if exit.success => {
            on_event(ExportEvent::Progress(ExportProgress::Percent(100)));
            ExportResult::Success { output_path }
        }
        Ok(exit) => {
            tracing::warn!(code = ?exit.code, diagnostics = %exit.diagnostics, "encoder exited with failure");
            ExportResult::Failure {
                message: FAILURE_MESSAGE.to_string(),
                diagnostics: exit.diagnostics,
            }
        }
        Err(e) => ExportResult::Failure {
            message: e.to_string(),
            diagnostics: String::new(),
        },
    };
    on_event(ExportEvent::Finished(result.clone()));
    result
}

/// Position in seconds from an ffmpeg stats line (`... time=00:00:01.50 ...`).
pub fn parse_progress_time(line: &str) -> Option<f64> {
    let rest = &line[line.find("time=")? + "time=".len()..];
    let token = rest.split_whitespace().next()?;
    let mut parts = token.split(':');
    let h: f64 = parts.next()?.parse().ok()?;
    let m: f64 = parts.next()?.parse().ok()?;
    let s: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    let t = h * 3600.0 + m * 60.0 + s;
    (t.is_finite() && t >= 0.0).then_some(t)
}

/// Running percentage, capped below 100 until the encoder reports success.
fn percent_of(time_sec: f64, duration_sec: f64) -> u8 {
    ((time_sec / duration_sec) * 100.0).floor().clamp(0.0, 99.0) as u8
}
