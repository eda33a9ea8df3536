//! Application module
//!
//! Configuration and the window → rectangle → encoder pipeline.

pub mod config;
mod plan;

pub use config::{CaptureParameters, EncodingPreset, RecorderConfig};
pub use plan::{prepare_capture, record};
