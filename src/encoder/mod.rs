//! FFmpeg Module
//!
//! # Architecture
//!
//! * `locate`: Finds the FFmpeg executable.
//! * `invocation`: Turns a capture rectangle and parameters into an ordered argument list.
//! * `process`: The child process handle and the trait the session drives it through.
//! * `session`: Recording lifecycle, from spawn to a bounded graceful-then-forced shutdown.

pub mod invocation;
pub mod locate;
pub mod process;
pub mod session;

pub use invocation::{build_invocation, EncoderInvocation};
pub use locate::EncoderLocator;
pub use session::{RecordingOutcome, RecordingSession, SessionMessage, ShutdownTimeouts};
