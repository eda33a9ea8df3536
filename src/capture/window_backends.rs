//! Foreground activation backends for different desktop environments.
//!
//! Some window managers report stale geometry for occluded windows, so the
//! target is raised before its bounds are read:
//! - Windows (SetForegroundWindow)
//! - Hyprland (via hyprctl)
//! - Sway (via swaymsg)
//! - X11 (via wmctrl, falling back to xdotool)
//!
//! Every backend is best-effort. Callers log and ignore the error.

use std::process::Command;

use log::debug;

use super::desktop::{ActivationBackend, DesktopSession};
use super::window::WindowInfo;

pub type ActivationResult = Result<(), String>;

/// Raises the window using the backend for the current session.
pub fn activate_for_session(session: &DesktopSession, window: &WindowInfo) -> ActivationResult {
    let backend = session.activation_backend();
    debug!("Activating {:?} via {}", window.title, backend);
    activate_with_backend(backend, window)
}

pub fn activate_with_backend(backend: ActivationBackend, window: &WindowInfo) -> ActivationResult {
    match backend {
        ActivationBackend::Win32 => activate_win32(window),
        ActivationBackend::Hyprland => run_command(
            "hyprctl",
            &["dispatch", "focuswindow", &hyprland_selector(&window.title)],
        ),
        ActivationBackend::Sway => run_command("swaymsg", &[&sway_criteria(&window.title)]),
        ActivationBackend::X11 => activate_x11(window),
        ActivationBackend::Unsupported => Err("no activation backend for this session".to_string()),
    }
}

#[cfg(target_os = "windows")]
fn activate_win32(window: &WindowInfo) -> ActivationResult {
    use windows::Win32::Foundation::HWND;
    use windows::Win32::UI::WindowsAndMessaging::SetForegroundWindow;

    let hwnd = HWND(window.id as usize as *mut std::ffi::c_void);
    if unsafe { SetForegroundWindow(hwnd) }.as_bool() {
        Ok(())
    } else {
        Err(format!("SetForegroundWindow refused window {}", window.id))
    }
}

#[cfg(not(target_os = "windows"))]
fn activate_win32(_window: &WindowInfo) -> ActivationResult {
    Err("Win32 activation is only available on Windows".to_string())
}

fn activate_x11(window: &WindowInfo) -> ActivationResult {
    match run_command("wmctrl", &["-F", "-a", &window.title]) {
        Ok(()) => Ok(()),
        Err(wmctrl_err) => {
            debug!("wmctrl failed ({}), trying xdotool", wmctrl_err);
            let pattern = format!("^{}$", escape_regex(&window.title));
            run_command("xdotool", &["search", "--name", &pattern, "windowactivate"])
        }
    }
}

fn run_command(program: &str, args: &[&str]) -> ActivationResult {
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| format!("Failed to run {}: {}", program, e))?;

    if output.status.success() {
        Ok(())
    } else {
        Err(format!(
            "{} exited with {}: {}",
            program,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ))
    }
}

/// `focuswindow` selector matching the whole title.
fn hyprland_selector(title: &str) -> String {
    format!("title:^({})$", escape_regex(title))
}

/// Sway criteria string; the title value is a regex inside double quotes.
fn sway_criteria(title: &str) -> String {
    let pattern = escape_regex(title).replace('"', "\\\"");
    format!("[title=\"^{}$\"] focus", pattern)
}

fn escape_regex(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if "\\.+*?()|[]{}^$".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
