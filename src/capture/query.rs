use std::thread;
use std::time::Duration;

use log::{debug, info};

use super::desktop::DesktopSession;
use super::geometry::Rectangle;
use super::screen;
use super::window::{self, WindowInfo};
use super::window_backends;
use crate::error::{RecorderError, RecorderResult};

/// How long the window manager gets to settle after activation.
const ACTIVATION_SETTLE: Duration = Duration::from_millis(300);

/// Source of window and desktop geometry.
pub trait DisplayQuery {
    /// Bounds of the first window titled exactly `title`.
    fn window_bounds(&self, title: &str) -> RecorderResult<Rectangle>;

    /// Union of all monitors. Zero-area when the query failed.
    fn virtual_desktop_bounds(&self) -> Rectangle;
}

/// Geometry straight from the running desktop.
pub struct SystemDisplayQuery {
    session: DesktopSession,
    settle: Duration,
}

impl SystemDisplayQuery {
    pub fn new() -> Self {
        let session = DesktopSession::detect();
        info!(
            "Detected session: {} (activation via {})",
            session,
            session.activation_backend()
        );
        Self {
            session,
            settle: ACTIVATION_SETTLE,
        }
    }

    pub fn list_windows(&self) -> RecorderResult<Vec<WindowInfo>> {
        window::list_all_windows()
    }

    fn activate(&self, window: &WindowInfo) {
        match window_backends::activate_for_session(&self.session, window) {
            Ok(()) => thread::sleep(self.settle),
            Err(e) => debug!("Could not activate {:?}: {}", window.title, e),
        }
    }
}

impl Default for SystemDisplayQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayQuery for SystemDisplayQuery {
    fn window_bounds(&self, title: &str) -> RecorderResult<Rectangle> {
        let before = self.list_windows()?;
        let target = window::find_by_title(&before, title).ok_or_else(|| {
            RecorderError::WindowNotFound {
                title: title.to_string(),
            }
        })?;
        self.activate(target);

        // Re-read after activation; fall back to the first snapshot if the
        // window vanished in between.
        let after = self.list_windows().unwrap_or_default();
        let target = window::find_by_title(&after, title)
            .or_else(|| window::find_by_title(&before, title))
            .ok_or_else(|| RecorderError::WindowNotFound {
                title: title.to_string(),
            })?;
        debug!("Target window: {} at {}", target.display_label(), target.bounds());

        bounds_of(target)
    }

    fn virtual_desktop_bounds(&self) -> Rectangle {
        screen::virtual_desktop_bounds()
    }
}

fn bounds_of(window: &WindowInfo) -> RecorderResult<Rectangle> {
    if !window.has_usable_bounds() {
        return Err(RecorderError::InvalidWindowState {
            title: window.title.clone(),
            width: window.width,
            height: window.height,
        });
    }
    Ok(window.bounds())
}
