pub mod constants;
pub use constants::*;

pub mod bytes;

pub mod tracing_telemetry;
