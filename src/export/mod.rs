//! Export pipeline: encoder arguments, process execution and the background worker.

pub mod command;
pub mod encoder;
pub(crate) mod worker;
