mod app;
mod capture;
mod encoder;
mod error;
mod ui;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc;
use std::time::Duration;

use clap::Parser;
use log::{error, info};

use app::config::{DEFAULT_FRAME_RATE, DEFAULT_OUTPUT_FILE};
use app::{CaptureParameters, EncodingPreset, RecorderConfig};
use capture::{screen, unique_titles, SystemDisplayQuery};
use encoder::locate::ENCODER_ENV_VAR;
use encoder::{EncoderLocator, SessionMessage, ShutdownTimeouts};
use error::{RecorderError, RecorderResult};

/// Record a single window to a video file with FFmpeg.
#[derive(Debug, Parser)]
#[command(name = "window-recorder", version)]
struct Cli {
    /// Exact title of the window to record; prompts when omitted
    #[arg(long, short)]
    title: Option<String>,

    /// Print recordable windows and exit
    #[arg(long)]
    list: bool,

    /// Output file (Matroska survives an interrupted encoder)
    #[arg(long, short, default_value = DEFAULT_OUTPUT_FILE)]
    output: PathBuf,

    #[arg(long, default_value_t = DEFAULT_FRAME_RATE, value_parser = clap::value_parser!(u32).range(1..))]
    fps: u32,

    /// Leave the mouse cursor out of the recording
    #[arg(long)]
    no_cursor: bool,

    #[arg(long, value_enum, default_value_t = EncodingPreset::Veryfast)]
    preset: EncodingPreset,

    /// Stop automatically after this many seconds
    #[arg(long, value_parser = parse_seconds)]
    duration: Option<f64>,

    /// FFmpeg binary to use instead of searching for one
    #[arg(long, env = ENCODER_ENV_VAR)]
    ffmpeg: Option<PathBuf>,

    /// Seconds FFmpeg gets to finish after the quit request
    #[arg(long, default_value = "10", value_parser = parse_seconds)]
    graceful_timeout: f64,

    /// Seconds FFmpeg gets to exit after being terminated
    #[arg(long, default_value = "5", value_parser = parse_seconds)]
    forced_timeout: f64,
}

impl Cli {
    fn to_config(&self) -> RecorderConfig {
        RecorderConfig {
            capture: CaptureParameters {
                frame_rate: self.fps,
                show_cursor: !self.no_cursor,
                preset: self.preset,
                duration_seconds: self.duration,
                ..CaptureParameters::default()
            },
            output_path: self.output.clone(),
            encoder_override: self.ffmpeg.clone(),
            timeouts: ShutdownTimeouts::default(),
        }
        .with_timeouts(
            Duration::from_secs_f64(self.graceful_timeout),
            Duration::from_secs_f64(self.forced_timeout),
        )
    }
}

fn parse_seconds(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("`{}` is not a number", s))?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(format!("`{}` must be a positive number of seconds", s))
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            match e {
                RecorderError::EncoderNotFound { .. } => eprintln!(
                    "Install FFmpeg and make sure `ffmpeg` is on PATH, \
                     or point --ffmpeg / {} at the binary.",
                    ENCODER_ENV_VAR
                ),
                RecorderError::EncoderFailed { .. } => {
                    eprintln!("No recording was saved; see the FFmpeg output above.")
                }
                _ => {}
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> RecorderResult<()> {
    screen::make_dpi_aware();
    let config = cli.to_config();
    let query = SystemDisplayQuery::new();

    if cli.list {
        let titles = unique_titles(&query.list_windows()?);
        ui::print_windows(&mut io::stdout(), &titles).map_err(RecorderError::Prompt)?;
        return Ok(());
    }

    let encoder = EncoderLocator::from_env(config.encoder_override.clone()).locate()?;

    let title = match &cli.title {
        Some(title) => title.clone(),
        None => {
            let titles = unique_titles(&query.list_windows()?);
            if titles.is_empty() {
                return Err(RecorderError::NoWindows);
            }
            ui::pick_window(io::stdin().lock(), &mut io::stdout(), &titles)
                .map_err(RecorderError::Prompt)?
        }
    };
    println!("\nSelected: {}", title);

    let plan = app::prepare_capture(&query, &title, &config)?;

    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(SessionMessage::Stop);
    })
    .map_err(|e| RecorderError::SignalHandler(e.to_string()))?;

    let desktop = plan.desktop;
    println!("\nStarting recording...");
    println!("FFmpeg:       {}", encoder.display());
    println!("Window:       {}", plan.window);
    println!(
        "Capture rect: {} (virtual desktop origin {},{}, size {}x{})",
        plan.rect, desktop.x, desktop.y, desktop.width, desktop.height
    );
    println!("Output file:  {}", plan.invocation.output_path().display());
    match config.capture.duration_seconds {
        Some(seconds) => println!("Recording stops after {}s, or press Ctrl+C.\n", seconds),
        None => println!("Press Ctrl+C to stop and finalize the file.\n"),
    }

    let outcome = app::record(&encoder, &plan, &config, &rx)?;
    info!(
        "Recorded {:.1}s, exit code {:?}",
        outcome.recorded_for.as_secs_f64(),
        outcome.exit.and_then(|exit| exit.code)
    );
    println!(
        "\nStopped ({}). File saved: {}",
        outcome.shutdown,
        outcome.output_path.display()
    );
    Ok(())
}
