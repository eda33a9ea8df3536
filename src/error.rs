use std::io;
use std::path::PathBuf;

use crate::capture::Rectangle;

#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    #[error("FFmpeg not found (searched: {})", format_searched(.searched))]
    EncoderNotFound { searched: Vec<PathBuf> },

    #[error("No window found with title: {title:?}")]
    WindowNotFound { title: String },

    #[error("Window {title:?} has unusable bounds {width}x{height} (is it minimized?)")]
    InvalidWindowState {
        title: String,
        width: u32,
        height: u32,
    },

    #[error("Failed to enumerate windows: {0}")]
    Enumeration(String),

    #[error("No top-level windows found")]
    NoWindows,

    #[error("Virtual desktop bounds are degenerate: {0}")]
    DegenerateDesktop(Rectangle),

    #[error("Failed to launch encoder {}: {source}", .path.display())]
    LaunchFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Encoder exited before recording was stopped ({})", describe_exit(.code))]
    EncoderFailed { code: Option<i32> },

    #[error("Failed to kill encoder process {pid}: {source}")]
    TerminationFailed {
        pid: u32,
        #[source]
        source: io::Error,
    },

    #[error("Window prompt failed: {0}")]
    Prompt(#[source] io::Error),

    #[error("Failed to install interrupt handler: {0}")]
    SignalHandler(String),
}

pub type RecorderResult<T> = Result<T, RecorderError>;

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {}", code),
        None => "killed by a signal".to_string(),
    }
}

fn format_searched(searched: &[PathBuf]) -> String {
    if searched.is_empty() {
        return "nothing".to_string();
    }
    searched
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
