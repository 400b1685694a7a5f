use std::path::Path;
use std::time::Instant;

use crate::marshal::arguments::{Argument, ArgumentError, InvocationParams, SourceSpec};
use crate::marshal::host_array::{to_host_frames, HostFrame};
use crate::pipeline::pipeline_logger::{NullPipelineLogger, PipelineLogger};
use crate::preview::domain::preview_sink::{PreviewControl, PreviewSink};
use crate::rendering::landmark_renderer::render_landmarks;
use crate::shared::face::FrameLandmarks;
use crate::tracking::domain::tracking_session::TrackingSession;
use crate::video::domain::video_source::{Pull, VideoSource};
use crate::video::infrastructure::source_factory::SourceError;

#[derive(Debug, thiserror::Error)]
pub enum FindLandmarksError {
    #[error(transparent)]
    Arguments(#[from] ArgumentError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("failed to open video source: {0}")]
    OpenSource(Box<dyn std::error::Error>),
    #[error("failed to create tracking session: {0}")]
    Session(Box<dyn std::error::Error>),
    #[error("failed to process frame: {0}")]
    Processing(Box<dyn std::error::Error>),
    #[error("preview failed: {0}")]
    Preview(Box<dyn std::error::Error>),
}

/// Builds the collaborators for one landmark call.
///
/// The CLI wires the ONNX session, ffmpeg sources and the OpenCV window;
/// tests wire stubs.
pub trait Environment {
    fn session(
        &self,
        model_path: &Path,
        frame_scale: f64,
    ) -> Result<TrackingSession, Box<dyn std::error::Error>>;

    fn source(&self, spec: &SourceSpec) -> Result<Box<dyn VideoSource>, SourceError>;

    /// `None` when no display is available.
    fn preview(&self) -> Result<Option<Box<dyn PreviewSink>>, Box<dyn std::error::Error>>;

    fn logger(&self) -> Box<dyn PipelineLogger> {
        Box::new(NullPipelineLogger)
    }
}

/// Runs a whole host call: parse arguments, build collaborators, track the
/// source to the end and convert the result to host frames.
pub fn find_face_landmarks(
    args: &[Argument],
    env: &dyn Environment,
) -> Result<Vec<HostFrame>, FindLandmarksError> {
    let params = InvocationParams::parse(args)?;
    log::debug!("Parsed invocation: {params:?}");

    let session = env
        .session(&params.model_path, params.frame_scale)
        .map_err(FindLandmarksError::Session)?;
    let source = env.source(&params.source)?;
    let preview = if params.preview {
        env.preview().map_err(FindLandmarksError::Preview)?
    } else {
        None
    };

    let sequence = FindLandmarksUseCase::new(source, session, preview, env.logger()).execute()?;
    Ok(to_host_frames(&sequence))
}

/// Pulls every frame from a source through a tracking session, optionally
/// showing each annotated frame.
pub struct FindLandmarksUseCase {
    source: Box<dyn VideoSource>,
    session: TrackingSession,
    preview: Option<Box<dyn PreviewSink>>,
    logger: Box<dyn PipelineLogger>,
}

impl FindLandmarksUseCase {
    pub fn new(
        source: Box<dyn VideoSource>,
        session: TrackingSession,
        preview: Option<Box<dyn PreviewSink>>,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            source,
            session,
            preview,
            logger,
        }
    }

    /// Returns one entry per updated frame, in pull order. The preview and
    /// the source are closed on every exit path.
    pub fn execute(mut self) -> Result<Vec<FrameLandmarks>, FindLandmarksError> {
        let metadata = match self.source.open() {
            Ok(metadata) => metadata,
            Err(e) => {
                self.close();
                return Err(FindLandmarksError::OpenSource(e));
            }
        };
        self.logger.info(&format!(
            "Tracking {} ({}x{})",
            metadata.source, metadata.width, metadata.height
        ));

        let result = self.run(metadata.total_frames);
        self.close();
        result?;

        self.logger.info(&format!(
            "Processed {} frames, {} faces found",
            self.session.len(),
            self.session.faces_found()
        ));
        self.logger.summary();
        Ok(self.session.into_sequence())
    }

    fn run(&mut self, total_frames: usize) -> Result<(), FindLandmarksError> {
        let mut pulls = self.source.pulls();
        loop {
            let decode_start = Instant::now();
            let Some(pull) = pulls.next() else {
                return Ok(());
            };
            let frame = match pull.map_err(FindLandmarksError::Processing)? {
                Pull::Updated(frame) => frame,
                Pull::Unchanged => {
                    if let Some(preview) = self.preview.as_mut() {
                        let control = preview.poll().map_err(FindLandmarksError::Preview)?;
                        if control == PreviewControl::Stop {
                            return Ok(());
                        }
                    }
                    continue;
                }
            };
            self.logger.timing("decode", elapsed_ms(decode_start));

            let track_start = Instant::now();
            let landmarks = self
                .session
                .add_frame(&frame)
                .map_err(FindLandmarksError::Processing)?;
            self.logger.timing("track", elapsed_ms(track_start));
            self.logger
                .metric("faces_per_frame", landmarks.faces.len() as f64);

            if let Some(preview) = self.preview.as_mut() {
                let preview_start = Instant::now();
                let mut annotated = frame;
                render_landmarks(&mut annotated, landmarks);
                let control = preview
                    .show(&annotated, self.session.faces_found())
                    .map_err(FindLandmarksError::Preview)?;
                self.logger.timing("preview", elapsed_ms(preview_start));
                if control == PreviewControl::Stop {
                    self.logger.progress(self.session.len(), total_frames);
                    return Ok(());
                }
            }

            self.logger.progress(self.session.len(), total_frames);
        }
    }

    fn close(&mut self) {
        if let Some(preview) = self.preview.as_mut() {
            preview.close();
        }
        self.source.close();
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
