//! Terminal interaction
//!
//! The window chooser shown when no title is given on the command line.

pub mod prompt;

pub use prompt::{pick_window, print_windows};
