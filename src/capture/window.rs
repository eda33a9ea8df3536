use log::warn;
use xcap::Window;

use super::geometry::Rectangle;
use crate::error::{RecorderError, RecorderResult};

#[derive(Debug, Clone)]
pub struct WindowInfo {
    pub id: u32,

    pub title: String,

    pub app_name: String,

    pub x: i32,

    pub y: i32,

    pub width: u32,

    pub height: u32,

    pub is_minimized: bool,
}

impl WindowInfo {
    fn from_xcap_window(window: &Window) -> Result<Self, String> {
        Ok(Self {
            id: window.id().map_err(|e| e.to_string())?,
            title: window.title().map_err(|e| e.to_string())?,
            app_name: window.app_name().map_err(|e| e.to_string())?,
            x: window.x().map_err(|e| e.to_string())?,
            y: window.y().map_err(|e| e.to_string())?,
            width: window.width().map_err(|e| e.to_string())?,
            height: window.height().map_err(|e| e.to_string())?,
            is_minimized: window.is_minimized().map_err(|e| e.to_string())?,
        })
    }

    pub fn bounds(&self) -> Rectangle {
        Rectangle::new(self.x, self.y, self.width, self.height)
    }

    /// Minimized windows and zero-area windows have no capturable geometry.
    pub fn has_usable_bounds(&self) -> bool {
        !self.is_minimized && self.width > 0 && self.height > 0
    }

    pub fn display_label(&self) -> String {
        if self.app_name.is_empty() {
            self.title.clone()
        } else {
            format!("{} ({})", self.title, self.app_name)
        }
    }
}

/// All top-level windows the platform reports, in z-order.
pub fn list_all_windows() -> RecorderResult<Vec<WindowInfo>> {
    let windows = Window::all().map_err(|e| RecorderError::Enumeration(e.to_string()))?;

    let mut window_infos = Vec::new();

    for window in &windows {
        match WindowInfo::from_xcap_window(window) {
            Ok(info) => window_infos.push(info),
            Err(e) => warn!("Failed to get info for a window: {}", e),
        }
    }

    Ok(window_infos)
}

/// Titles worth offering to the user: non-blank, first occurrence only.
pub fn unique_titles(windows: &[WindowInfo]) -> Vec<String> {
    let mut titles: Vec<String> = Vec::new();
    for window in windows {
        if window.title.trim().is_empty() || titles.contains(&window.title) {
            continue;
        }
        titles.push(window.title.clone());
    }
    titles
}

/// First window whose title matches exactly.
pub fn find_by_title<'a>(windows: &'a [WindowInfo], title: &str) -> Option<&'a WindowInfo> {
    windows.iter().find(|w| w.title == title)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(id: u32, title: &str) -> WindowInfo {
        WindowInfo {
            id,
            title: title.to_string(),
            app_name: "firefox".to_string(),
            x: 0,
            y: 0,
            width: 800,
            height: 600,
            is_minimized: false,
        }
    }

    #[test]
    fn test_window_info_display_label() {
        assert_eq!(
            window(1, "Mozilla Firefox").display_label(),
            "Mozilla Firefox (firefox)"
        );
    }

    #[test]
    fn test_window_info_display_label_no_app() {
        let mut info = window(1, "Scratch");
        info.app_name = String::new();
        assert_eq!(info.display_label(), "Scratch");
    }

    #[test]
    fn test_unique_titles_skips_blank_and_duplicates() {
        let windows = vec![
            window(1, "Editor"),
            window(2, "  "),
            window(3, "Terminal"),
            window(4, "Editor"),
            window(5, ""),
        ];
        assert_eq!(unique_titles(&windows), vec!["Editor", "Terminal"]);
    }

    #[test]
    fn test_find_by_title_returns_first_match() {
        let windows = vec![window(1, "Editor"), window(2, "Editor")];
        assert_eq!(find_by_title(&windows, "Editor").map(|w| w.id), Some(1));
        assert!(find_by_title(&windows, "editor").is_none());
    }

    #[test]
    fn test_minimized_window_is_unusable() {
        let mut info = window(1, "Editor");
        assert!(info.has_usable_bounds());
        info.is_minimized = true;
        assert!(!info.has_usable_bounds());
        info.is_minimized = false;
        info.height = 0;
        assert!(!info.has_usable_bounds());
    }
}
