//! Monitor and virtual desktop queries
//!
//! The virtual desktop is the union of every monitor. It can start at a
//! negative origin when a monitor sits left of or above the primary one.

use log::{debug, warn};
use xcap::Monitor;

use super::geometry::Rectangle;

/// Information about a monitor
#[derive(Debug, Clone)]
pub struct MonitorInfo {
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub is_primary: bool,
    pub scale_factor: f32,
}

impl MonitorInfo {
    /// Create MonitorInfo from xcap Monitor
    fn from_xcap(monitor: &Monitor) -> Result<Self, String> {
        Ok(Self {
            name: monitor.name().map_err(|e| e.to_string())?,
            x: monitor.x().map_err(|e| e.to_string())?,
            y: monitor.y().map_err(|e| e.to_string())?,
            width: monitor.width().map_err(|e| e.to_string())?,
            height: monitor.height().map_err(|e| e.to_string())?,
            is_primary: monitor.is_primary().map_err(|e| e.to_string())?,
            scale_factor: monitor.scale_factor().map_err(|e| e.to_string())?,
        })
    }

    pub fn bounds(&self) -> Rectangle {
        Rectangle::new(self.x, self.y, self.width, self.height)
    }
}

/// Get all available monitors
pub fn get_all_monitors() -> Result<Vec<MonitorInfo>, String> {
    let monitors = Monitor::all().map_err(|e| format!("Failed to get monitors: {}", e))?;

    let mut infos = Vec::new();
    for monitor in &monitors {
        match MonitorInfo::from_xcap(monitor) {
            Ok(info) => infos.push(info),
            Err(e) => warn!("Failed to get info for a monitor: {}", e),
        }
    }

    if infos.is_empty() {
        Err("No monitors found".to_string())
    } else {
        Ok(infos)
    }
}

/// Bounding box of all monitors. Empty input yields a zero-area rectangle.
pub fn union_of_monitors(monitors: &[MonitorInfo]) -> Rectangle {
    monitors
        .iter()
        .fold(Rectangle::default(), |acc, m| acc.union(&m.bounds()))
}

/// Current virtual desktop bounds.
///
/// Never fails: a failed query is reported as a zero-area rectangle, which
/// the caller must treat as fatal.
pub fn virtual_desktop_bounds() -> Rectangle {
    let bounds = platform_virtual_desktop_bounds();
    debug!("Virtual desktop: {}", bounds);
    bounds
}

/// Opt out of DPI virtualization so window and desktop metrics are in
/// physical pixels, the same space the grabber uses.
#[cfg(target_os = "windows")]
pub fn make_dpi_aware() {
    use windows::Win32::UI::WindowsAndMessaging::SetProcessDPIAware;

    if !unsafe { SetProcessDPIAware() }.as_bool() {
        warn!("SetProcessDPIAware failed; capture offsets may be scaled");
    }
}

#[cfg(not(target_os = "windows"))]
pub fn make_dpi_aware() {}

#[cfg(target_os = "windows")]
fn platform_virtual_desktop_bounds() -> Rectangle {
    use windows::Win32::UI::WindowsAndMessaging::{
        GetSystemMetrics, SM_CXVIRTUALSCREEN, SM_CYVIRTUALSCREEN, SM_XVIRTUALSCREEN,
        SM_YVIRTUALSCREEN,
    };

    let (x, y, w, h) = unsafe {
        (
            GetSystemMetrics(SM_XVIRTUALSCREEN),
            GetSystemMetrics(SM_YVIRTUALSCREEN),
            GetSystemMetrics(SM_CXVIRTUALSCREEN),
            GetSystemMetrics(SM_CYVIRTUALSCREEN),
        )
    };
    Rectangle::new(x, y, w.max(0) as u32, h.max(0) as u32)
}

#[cfg(not(target_os = "windows"))]
fn platform_virtual_desktop_bounds() -> Rectangle {
    match get_all_monitors() {
        Ok(monitors) => {
            for m in &monitors {
                debug!(
                    "Monitor {} ({}x{}) at ({}, {}), primary: {}, scale: {}",
                    m.name, m.width, m.height, m.x, m.y, m.is_primary, m.scale_factor
                );
            }
            union_of_monitors(&monitors)
        }
        Err(e) => {
            warn!("Virtual desktop query failed: {}", e);
            Rectangle::default()
        }
    }
}
