use std::path::{Path, PathBuf};

use crate::app::config::{CaptureParameters, DesktopSource};
use crate::capture::Rectangle;

pub const VIDEO_CODEC: &str = "libx264";
pub const PIXEL_FORMAT: &str = "yuv420p";

/// A complete FFmpeg argument list. The program path is supplied at spawn
/// time so the same invocation can be logged and tested without one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderInvocation {
    args: Vec<String>,
    output_path: PathBuf,
}

impl EncoderInvocation {
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Shell-ish rendering for logs.
    pub fn command_line(&self, program: &Path) -> String {
        let mut line = program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            if arg.contains(' ') {
                line.push('"');
                line.push_str(arg);
                line.push('"');
            } else {
                line.push_str(arg);
            }
        }
        line
    }
}

/// Builds the argument list for recording `rect` of the desktop.
///
/// The grabber always captures the whole desktop and crops it, so `rect`
/// must already be in desktop coordinates. Token order matters to FFmpeg:
/// input options precede `-i`, output options follow it.
pub fn build_invocation(
    rect: Rectangle,
    params: &CaptureParameters,
    output_path: &Path,
) -> EncoderInvocation {
    let fps = params.frame_rate.to_string();
    let size = format!("{}x{}", rect.width, rect.height);

    let mut args: Vec<String> = vec![
        "-y".into(),
        "-f".into(),
        params.source.format_name().into(),
        "-framerate".into(),
        fps.clone(),
    ];

    // Both grabbers draw the cursor unless told otherwise.
    let draw_mouse = if params.show_cursor { "1" } else { "0" };

    match &params.source {
        DesktopSource::Gdigrab => {
            args.extend([
                "-offset_x".into(),
                rect.x.to_string(),
                "-offset_y".into(),
                rect.y.to_string(),
                "-video_size".into(),
                size,
                "-draw_mouse".into(),
                draw_mouse.into(),
                "-i".into(),
                "desktop".into(),
            ]);
        }
        DesktopSource::X11Grab { display } => {
            args.extend([
                "-video_size".into(),
                size,
                "-draw_mouse".into(),
                draw_mouse.into(),
                "-i".into(),
                format!("{}+{},{}", display, rect.x, rect.y),
            ]);
        }
    }

    args.extend([
        "-c:v".into(),
        VIDEO_CODEC.into(),
        "-preset".into(),
        params.preset.as_str().into(),
        "-pix_fmt".into(),
        PIXEL_FORMAT.into(),
        "-r".into(),
        fps,
    ]);

    if let Some(seconds) = params.duration_seconds {
        args.extend(["-t".into(), seconds.to_string()]);
    }

    args.push(output_path.to_string_lossy().into_owned());

    EncoderInvocation {
        args,
        output_path: output_path.to_path_buf(),
    }
}
