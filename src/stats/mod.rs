//! Per-output telemetry

pub mod meter;

pub use meter::{FrameRateMeter, DEFAULT_MIN_WINDOW};
