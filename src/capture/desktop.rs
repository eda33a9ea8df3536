use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayServer {
    Windows,
    Wayland,
    X11,
    Unknown,
}

impl std::fmt::Display for DisplayServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisplayServer::Windows => write!(f, "Windows"),
            DisplayServer::Wayland => write!(f, "Wayland"),
            DisplayServer::X11 => write!(f, "X11"),
            DisplayServer::Unknown => write!(f, "Unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DesktopEnvironment {
    Gnome,
    Kde,
    Hyprland,
    Sway,
    Other(Option<String>),
}

impl std::fmt::Display for DesktopEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DesktopEnvironment::Gnome => write!(f, "GNOME"),
            DesktopEnvironment::Kde => write!(f, "KDE Plasma"),
            DesktopEnvironment::Hyprland => write!(f, "Hyprland"),
            DesktopEnvironment::Sway => write!(f, "Sway"),
            DesktopEnvironment::Other(Some(name)) => write!(f, "{}", name),
            DesktopEnvironment::Other(None) => write!(f, "Unknown"),
        }
    }
}

/// The session the recorder runs in. Decides how a window is raised before
/// its geometry is read.
#[derive(Debug, Clone)]
pub struct DesktopSession {
    pub display_server: DisplayServer,
    pub desktop_environment: DesktopEnvironment,
}

impl DesktopSession {
    pub fn detect() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Detection over an arbitrary variable source.
    pub fn from_vars<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let display_server = detect_display_server(&var);
        let desktop_environment = detect_desktop_environment(&var);

        Self {
            display_server,
            desktop_environment,
        }
    }

    pub fn activation_backend(&self) -> ActivationBackend {
        match (&self.desktop_environment, &self.display_server) {
            (_, DisplayServer::Windows) => ActivationBackend::Win32,
            (DesktopEnvironment::Hyprland, DisplayServer::Wayland) => ActivationBackend::Hyprland,
            (DesktopEnvironment::Sway, DisplayServer::Wayland) => ActivationBackend::Sway,
            (_, DisplayServer::X11) => ActivationBackend::X11,
            _ => ActivationBackend::Unsupported,
        }
    }
}

impl std::fmt::Display for DesktopSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} on {}", self.desktop_environment, self.display_server)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationBackend {
    Win32,
    Hyprland,
    Sway,
    X11,
    Unsupported,
}

impl std::fmt::Display for ActivationBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivationBackend::Win32 => write!(f, "Win32 (SetForegroundWindow)"),
            ActivationBackend::Hyprland => write!(f, "Hyprland (hyprctl)"),
            ActivationBackend::Sway => write!(f, "Sway (swaymsg)"),
            ActivationBackend::X11 => write!(f, "X11 (wmctrl/xdotool)"),
            ActivationBackend::Unsupported => write!(f, "none"),
        }
    }
}

fn detect_display_server<F>(var: &F) -> DisplayServer
where
    F: Fn(&str) -> Option<String>,
{
    if cfg!(target_os = "windows") {
        return DisplayServer::Windows;
    }

    if let Some(session_type) = var("XDG_SESSION_TYPE") {
        match session_type.to_lowercase().as_str() {
            "wayland" => return DisplayServer::Wayland,
            "x11" => return DisplayServer::X11,
            _ => {}
        }
    }

    if var("WAYLAND_DISPLAY").is_some() {
        return DisplayServer::Wayland;
    }

    if var("DISPLAY").is_some() {
        return DisplayServer::X11;
    }

    DisplayServer::Unknown
}

fn detect_desktop_environment<F>(var: &F) -> DesktopEnvironment
where
    F: Fn(&str) -> Option<String>,
{
    if var("HYPRLAND_INSTANCE_SIGNATURE").is_some() {
        return DesktopEnvironment::Hyprland;
    }

    if var("SWAYSOCK").is_some() {
        return DesktopEnvironment::Sway;
    }

    if let Some(current_desktop) = var("XDG_CURRENT_DESKTOP") {
        for component in current_desktop.to_lowercase().split(':') {
            match component.trim() {
                "gnome" | "unity" | "ubuntu" | "pop" => return DesktopEnvironment::Gnome,
                "kde" | "plasma" | "kde-plasma" => return DesktopEnvironment::Kde,
                "hyprland" => return DesktopEnvironment::Hyprland,
                "sway" => return DesktopEnvironment::Sway,
                _ => continue,
            }
        }

        if !current_desktop.is_empty() {
            return DesktopEnvironment::Other(Some(current_desktop));
        }
    }

    if var("KDE_FULL_SESSION").is_some() {
        return DesktopEnvironment::Kde;
    }

    DesktopEnvironment::Other(None)
}
