use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use facemark_core::marshal::arguments::{Argument, SourceSpec};
use facemark_core::marshal::host_array::HostFrame;
use facemark_core::pipeline::find_landmarks_use_case::{find_face_landmarks, Environment};
use facemark_core::pipeline::pipeline_logger::{
    NullPipelineLogger, PipelineLogger, StdoutPipelineLogger,
};
use facemark_core::preview::domain::preview_sink::PreviewSink;
use facemark_core::tracking::domain::tracking_session::TrackingSession;
use facemark_core::tracking::infrastructure::session_factory::create_session;
use facemark_core::video::domain::video_source::VideoSource;
use facemark_core::video::infrastructure::source_factory::{create_source, SourceError};

/// Face landmark tracking for videos, image sequences and capture devices.
///
/// Positional arguments follow the host call:
///   MODEL SEQUENCE [SCALE] [PREVIEW]
///   MODEL DEVICE [WIDTH] [HEIGHT] [SCALE]
///
/// `[]` skips an optional argument; prefix a value with `'` to force it
/// to be read as text.
#[derive(Parser, Debug)]
#[command(name = "facemark", version)]
struct Cli {
    /// Write the JSON result here instead of stdout.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Pretty-print the JSON result.
    #[arg(long)]
    pretty: bool,

    /// Log per-stage timings when done.
    #[arg(long)]
    summary: bool,

    /// Host call arguments.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

/// Real collaborators: ONNX landmark model, ffmpeg sources and, when built
/// with `preview-window`, an OpenCV window.
struct CliEnvironment {
    summary: bool,
}

impl Environment for CliEnvironment {
    fn session(
        &self,
        model_path: &Path,
        frame_scale: f64,
    ) -> Result<TrackingSession, Box<dyn std::error::Error>> {
        create_session(model_path, frame_scale)
    }

    fn source(&self, spec: &SourceSpec) -> Result<Box<dyn VideoSource>, SourceError> {
        create_source(spec)
    }

    #[cfg(feature = "preview-window")]
    fn preview(&self) -> Result<Option<Box<dyn PreviewSink>>, Box<dyn std::error::Error>> {
        use facemark_core::preview::infrastructure::highgui_preview::HighguiPreview;
        Ok(Some(Box::new(HighguiPreview::new())))
    }

    #[cfg(not(feature = "preview-window"))]
    fn preview(&self) -> Result<Option<Box<dyn PreviewSink>>, Box<dyn std::error::Error>> {
        log::warn!("Built without the preview-window feature; running without preview");
        Ok(None)
    }

    fn logger(&self) -> Box<dyn PipelineLogger> {
        if self.summary {
            Box::new(StdoutPipelineLogger::default())
        } else {
            Box::new(NullPipelineLogger)
        }
    }
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let args: Vec<Argument> = cli.args.iter().map(|t| Argument::from_token(t)).collect();

    let env = CliEnvironment {
        summary: cli.summary,
    };
    let frames = find_face_landmarks(&args, &env)?;
    log::info!("Returning {} frames", frames.len());

    let json = to_json(&frames, cli.pretty)?;
    match cli.output {
        Some(path) => {
            fs::write(&path, json + "\n")?;
            log::info!("Wrote {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}")?;
        }
    }
    Ok(())
}

fn to_json(frames: &[HostFrame], pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(frames)
    } else {
        serde_json::to_string(frames)
    }
}
