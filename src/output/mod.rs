//! Output file naming and the `{time}` reference clock.

pub mod naming;
pub mod time_ref;
