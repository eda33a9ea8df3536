//! FFmpeg discovery
//!
//! Search order: explicit override, a copy bundled next to the running
//! executable, `PATH`, then a few well-known install locations.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::{RecorderError, RecorderResult};

pub const ENCODER_ENV_VAR: &str = "WINDOW_RECORDER_FFMPEG";

#[cfg(target_os = "windows")]
const ENCODER_FILE_NAME: &str = "ffmpeg.exe";
#[cfg(not(target_os = "windows"))]
const ENCODER_FILE_NAME: &str = "ffmpeg";

#[cfg(target_os = "windows")]
const WELL_KNOWN_PATHS: &[&str] = &[
    r"C:\ffmpeg\bin\ffmpeg.exe",
    r"C:\Program Files\ffmpeg\bin\ffmpeg.exe",
    r"C:\Program Files (x86)\ffmpeg\bin\ffmpeg.exe",
];
#[cfg(not(target_os = "windows"))]
const WELL_KNOWN_PATHS: &[&str] = &[
    "/usr/bin/ffmpeg",
    "/usr/local/bin/ffmpeg",
    "/opt/homebrew/bin/ffmpeg",
    "/snap/bin/ffmpeg",
];

#[derive(Debug, Clone, Default)]
pub struct EncoderLocator {
    override_path: Option<PathBuf>,
    bundle_dir: Option<PathBuf>,
    search_path: Option<OsString>,
    well_known: Vec<PathBuf>,
}

impl EncoderLocator {
    /// Locator for the current process environment.
    pub fn from_env(override_path: Option<PathBuf>) -> Self {
        let bundle_dir = env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));

        Self {
            override_path,
            bundle_dir,
            search_path: env::var_os("PATH"),
            well_known: WELL_KNOWN_PATHS.iter().map(PathBuf::from).collect(),
        }
    }

    #[cfg(test)]
    pub fn with_override(mut self, path: Option<PathBuf>) -> Self {
        self.override_path = path;
        self
    }

    #[cfg(test)]
    pub fn with_bundle_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.bundle_dir = dir;
        self
    }

    #[cfg(test)]
    pub fn with_search_path(mut self, path: Option<OsString>) -> Self {
        self.search_path = path;
        self
    }

    #[cfg(test)]
    pub fn with_well_known(mut self, paths: Vec<PathBuf>) -> Self {
        self.well_known = paths;
        self
    }

    /// Every candidate, in the order they are tried.
    pub fn candidates(&self) -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        if let Some(path) = &self.override_path {
            candidates.push(path.clone());
        }

        if let Some(dir) = &self.bundle_dir {
            candidates.push(dir.join(ENCODER_FILE_NAME));
            candidates.push(dir.join("ffmpeg").join("bin").join(ENCODER_FILE_NAME));
        }

        if let Some(path_var) = &self.search_path {
            for dir in env::split_paths(path_var) {
                if dir.as_os_str().is_empty() {
                    continue;
                }
                candidates.push(dir.join(ENCODER_FILE_NAME));
            }
        }

        candidates.extend(self.well_known.iter().cloned());
        candidates
    }

    pub fn locate(&self) -> RecorderResult<PathBuf> {
        // An override that does not exist is a mistake, not a hint.
        if let Some(path) = &self.override_path {
            if is_executable_file(path) {
                info!("Using FFmpeg override: {}", path.display());
                return Ok(path.clone());
            }
            return Err(RecorderError::EncoderNotFound {
                searched: vec![path.clone()],
            });
        }

        let candidates = self.candidates();
        for candidate in &candidates {
            debug!("Looking for FFmpeg at {}", candidate.display());
            if is_executable_file(candidate) {
                info!("Found FFmpeg: {}", candidate.display());
                return Ok(candidate.clone());
            }
        }

        Err(RecorderError::EncoderNotFound {
            searched: candidates,
        })
    }
}

#[cfg(unix)]
fn is_executable_file(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable_file(path: &Path) -> bool {
    path.is_file()
}
