use std::env;
use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;

use crate::encoder::session::ShutdownTimeouts;

pub const DEFAULT_FRAME_RATE: u32 = 30;
pub const DEFAULT_OUTPUT_FILE: &str = "window_capture.mkv";
pub const DEFAULT_X11_DISPLAY: &str = ":0.0";

/// x264 speed/quality trade-off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, ValueEnum)]
pub enum EncodingPreset {
    Ultrafast,
    Superfast,
    #[default]
    Veryfast,
    Faster,
    Fast,
    Medium,
    Slow,
    Slower,
    Veryslow,
}

impl EncodingPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            EncodingPreset::Ultrafast => "ultrafast",
            EncodingPreset::Superfast => "superfast",
            EncodingPreset::Veryfast => "veryfast",
            EncodingPreset::Faster => "faster",
            EncodingPreset::Fast => "fast",
            EncodingPreset::Medium => "medium",
            EncodingPreset::Slow => "slow",
            EncodingPreset::Slower => "slower",
            EncodingPreset::Veryslow => "veryslow",
        }
    }
}

impl std::fmt::Display for EncodingPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// FFmpeg input device that grabs the whole desktop.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DesktopSource {
    /// Windows GDI grabber, cropped with `-offset_x`/`-offset_y`.
    Gdigrab,
    /// X11 grabber, cropped through the `display+x,y` input name.
    X11Grab { display: String },
}

impl DesktopSource {
    /// The grabber for the platform this binary was built for.
    pub fn for_platform() -> Self {
        if cfg!(target_os = "windows") {
            DesktopSource::Gdigrab
        } else {
            let display = env::var("DISPLAY")
                .ok()
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| DEFAULT_X11_DISPLAY.to_string());
            DesktopSource::X11Grab { display }
        }
    }

    pub fn format_name(&self) -> &'static str {
        match self {
            DesktopSource::Gdigrab => "gdigrab",
            DesktopSource::X11Grab { .. } => "x11grab",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaptureParameters {
    pub frame_rate: u32,
    pub show_cursor: bool,
    pub preset: EncodingPreset,
    /// `None` records until stopped.
    pub duration_seconds: Option<f64>,
    pub source: DesktopSource,
}

impl Default for CaptureParameters {
    fn default() -> Self {
        Self {
            frame_rate: DEFAULT_FRAME_RATE,
            show_cursor: true,
            preset: EncodingPreset::default(),
            duration_seconds: None,
            source: DesktopSource::for_platform(),
        }
    }
}

/// Everything one recording session needs besides the window title.
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    pub capture: CaptureParameters,
    pub output_path: PathBuf,
    /// Explicit encoder binary; skips discovery when set.
    pub encoder_override: Option<PathBuf>,
    pub timeouts: ShutdownTimeouts,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            capture: CaptureParameters::default(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_FILE),
            encoder_override: None,
            timeouts: ShutdownTimeouts::default(),
        }
    }
}

impl RecorderConfig {
    /// Output path anchored to the working directory.
    pub fn resolved_output_path(&self) -> PathBuf {
        if self.output_path.is_absolute() {
            return self.output_path.clone();
        }
        match env::current_dir() {
            Ok(cwd) => cwd.join(&self.output_path),
            Err(_) => self.output_path.clone(),
        }
    }

    pub fn with_timeouts(mut self, graceful: Duration, forced: Duration) -> Self {
        self.timeouts.graceful = graceful;
        self.timeouts.forced = forced;
        self
    }
}
