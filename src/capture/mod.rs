//! Capture geometry
//!
//! Window and monitor queries over the xcap library, plus the pure
//! geometry that turns a window's bounds into a rectangle the encoder can
//! grab from the virtual desktop.

pub mod desktop;
pub mod geometry;
pub mod query;
pub mod screen;
pub mod window;
pub mod window_backends;

pub use geometry::{resolve_capture_rect, Rectangle};
pub use query::{DisplayQuery, SystemDisplayQuery};
pub use window::unique_titles;
