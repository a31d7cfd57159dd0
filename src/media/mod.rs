//! External media collaborators (`ffprobe` / `ffmpeg`).

pub mod probe;
pub mod tools;
