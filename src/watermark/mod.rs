//! Watermark description, font handling and layer generation.

pub(crate) mod builtin_font;
pub mod font;
pub mod layer;
pub mod spec;
