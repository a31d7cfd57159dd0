use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::foundation::error::{WebpmarkError, WebpmarkResult};

/// Resolved paths of the external binaries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolPaths {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl ToolPaths {
    /// Locate `ffmpeg` and `ffprobe`, honoring explicit overrides.
    pub fn locate(ffmpeg: Option<&Path>, ffprobe: Option<&Path>) -> WebpmarkResult<Self> {
        Ok(Self {
            ffmpeg: locate_tool("ffmpeg", ffmpeg)?,
            ffprobe: locate_tool("ffprobe", ffprobe)?,
        })
    }
}

/// Find an external tool.
///
/// Lookup order: `override_path` (must exist), a binary named `name` in the current working
/// directory, then `name` on `PATH` (verified by running `<name> -version`).
pub fn locate_tool(name: &str, override_path: Option<&Path>) -> WebpmarkResult<PathBuf> {
    if let Some(path) = override_path {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        return Err(WebpmarkError::missing_tool(format!(
            "{name} not found at '{}'",
            path.display()
        )));
    }

    if let Ok(cwd) = std::env::current_dir() {
        let local = cwd.join(exe_name(name));
        if local.is_file() {
            tracing::debug!(tool = name, path = %local.display(), "using tool from working directory");
            return Ok(local);
        }
    }

    if is_on_path(name) {
        return Ok(PathBuf::from(name));
    }

    Err(WebpmarkError::missing_tool(format!(
        "{name} was not found in the working directory or on PATH"
    )))
}

/// Return `true` when `name -version` runs successfully.
pub fn is_on_path(name: &str) -> bool {
    Command::new(name)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn exe_name(name: &str) -> String {
    if cfg!(windows) {
        format!("{name}.exe")
    } else {
        name.to_string()
    }
}
