use std::path::{Path, PathBuf};

/// Placeholder replaced by the input file stem.
pub const NAME_PLACEHOLDER: &str = "{name}";
/// Placeholder replaced by the formatted timestamp.
pub const TIME_PLACEHOLDER: &str = "{time}";
/// Extension appended to every output name.
pub const OUTPUT_EXTENSION: &str = "webp";

/// File name for `pattern` with the placeholders substituted, without the extension.
///
/// An empty pattern behaves like `{name}`. `{name}` is substituted before `{time}`.
pub fn expand_pattern(pattern: &str, stem: &str, timestamp: &str) -> String {
    let pattern = if pattern.is_empty() {
        NAME_PLACEHOLDER
    } else {
        pattern
    };
    pattern
        .replace(NAME_PLACEHOLDER, stem)
        .replace(TIME_PLACEHOLDER, timestamp)
}

/// Full output path for one export.
///
/// `chosen_dir` is used when it is non-empty after trimming and names an existing directory;
/// otherwise the file lands next to the input in `original_dir`.
pub fn resolve_output_path(
    pattern: &str,
    stem: &str,
    timestamp: &str,
    chosen_dir: Option<&str>,
    original_dir: &Path,
) -> PathBuf {
    let dir = chosen_dir
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(Path::new)
        .filter(|d| d.is_dir())
        .unwrap_or(original_dir);
    let file_name = format!(
        "{}.{OUTPUT_EXTENSION}",
        expand_pattern(pattern, stem, timestamp)
    );
    dir.join(file_name)
}
