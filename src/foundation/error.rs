/// Crate-wide result alias.
pub type WebpmarkResult<T> = Result<T, WebpmarkError>;

/// Errors surfaced by the watermark, preview and export operations.
///
/// Font load failures never appear here: they are recovered by falling back to a default font.
/// Encoder failures are reported through [`crate::ExportResult`] instead.
#[derive(thiserror::Error, Debug)]
pub enum WebpmarkError {
    /// A required external binary (`ffmpeg` / `ffprobe`) could not be found.
    #[error("missing tool: {0}")]
    MissingTool(String),

    /// The probe or frame extraction step could not read the input.
    #[error("unreadable input: {0}")]
    UnreadableInput(String),

    /// Invalid arguments or violated preconditions.
    #[error("validation error: {0}")]
    Validation(String),

    /// An export job is already running.
    #[error("an export job is already running")]
    Busy,

    /// Failure in the export plumbing around the encoder.
    #[error("export error: {0}")]
    Export(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WebpmarkError {
    pub fn missing_tool(msg: impl Into<String>) -> Self {
        Self::MissingTool(msg.into())
    }

    pub fn unreadable_input(msg: impl Into<String>) -> Self {
        Self::UnreadableInput(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            WebpmarkError::missing_tool("ffmpeg")
                .to_string()
                .contains("missing tool:")
        );
        assert!(
            WebpmarkError::unreadable_input("x")
                .to_string()
                .contains("unreadable input:")
        );
        assert!(
            WebpmarkError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(WebpmarkError::export("x").to_string().contains("export error:"));
        assert!(WebpmarkError::Busy.to_string().contains("already running"));
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = WebpmarkError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
