use crate::marshal::arguments::SourceSpec;
use crate::video::domain::video_source::VideoSource;

use super::ffmpeg_device_source::FfmpegDeviceSource;
use super::ffmpeg_file_source::FfmpegFileSource;
use super::image_sequence_source::{is_image_path, ImageSequenceSource};

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("no video source specified")]
    NoSource,
    #[error("video source not found: {0}")]
    NotFound(String),
}

/// Picks the source implementation for `spec`.
///
/// Directories and still images become an [`ImageSequenceSource`]; any other
/// existing file is handed to ffmpeg as a video.
pub fn create_source(spec: &SourceSpec) -> Result<Box<dyn VideoSource>, SourceError> {
    match spec {
        SourceSpec::Sequence { path } => {
            if path.as_os_str().is_empty() {
                return Err(SourceError::NoSource);
            }
            if path.is_dir() || (path.is_file() && is_image_path(path)) {
                log::debug!("Reading image sequence from {}", path.display());
                Ok(Box::new(ImageSequenceSource::new(path)))
            } else if path.is_file() {
                log::debug!("Reading video file {}", path.display());
                Ok(Box::new(FfmpegFileSource::new(path)))
            } else {
                Err(SourceError::NotFound(path.display().to_string()))
            }
        }
        SourceSpec::Device { id, width, height } => {
            Ok(Box::new(FfmpegDeviceSource::new(*id, *width, *height)))
        }
    }
}
