use std::path::Path;
use std::sync::mpsc::Receiver;

use log::info;

use super::config::RecorderConfig;
use crate::capture::{resolve_capture_rect, DisplayQuery, Rectangle};
use crate::encoder::{
    build_invocation, EncoderInvocation, RecordingOutcome, RecordingSession, SessionMessage,
};
use crate::error::{RecorderError, RecorderResult};

/// Everything decided before the encoder is spawned.
#[derive(Debug, Clone)]
pub struct CapturePlan {
    pub title: String,
    pub window: Rectangle,
    pub desktop: Rectangle,
    pub rect: Rectangle,
    pub invocation: EncoderInvocation,
}

/// Queries geometry for `title` and builds the encoder invocation.
///
/// The desktop is sampled once; later monitor changes are not tracked.
pub fn prepare_capture<Q: DisplayQuery>(
    query: &Q,
    title: &str,
    config: &RecorderConfig,
) -> RecorderResult<CapturePlan> {
    let window = query.window_bounds(title)?;
    let desktop = query.virtual_desktop_bounds();
    // Nothing even-sized fits in a desktop thinner than 2px.
    if desktop.width < 2 || desktop.height < 2 {
        return Err(RecorderError::DegenerateDesktop(desktop));
    }

    let rect = resolve_capture_rect(window, desktop);
    if rect != window {
        info!("Capture rect adjusted from ({}) to ({})", window, rect);
    }

    let output_path = config.resolved_output_path();
    let invocation = build_invocation(rect, &config.capture, &output_path);

    Ok(CapturePlan {
        title: title.to_string(),
        window,
        desktop,
        rect,
        invocation,
    })
}

/// Spawns the encoder for `plan` and blocks until the recording ends.
pub fn record(
    encoder: &Path,
    plan: &CapturePlan,
    config: &RecorderConfig,
    stop: &Receiver<SessionMessage>,
) -> RecorderResult<RecordingOutcome> {
    let session = RecordingSession::start(encoder, &plan.invocation)?;
    info!(
        "Recording {:?} with encoder pid {} into {}",
        plan.title,
        session.pid(),
        session.output_path().display()
    );
    session.wait_for_stop(stop, &config.timeouts)
}
