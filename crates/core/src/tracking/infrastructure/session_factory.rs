use std::path::Path;

use crate::shared::constants::{DEFAULT_CONFIDENCE, TRACKER_MAX_LOST};
use crate::tracking::domain::bytetrack_tracker::ByteTracker;
use crate::tracking::domain::tracking_session::TrackingSession;

use super::onnx_yolo_landmarker::OnnxYoloLandmarker;

/// Builds a tracking session backed by the ONNX landmark model at
/// `model_path`, detecting on frames scaled by `frame_scale`.
pub fn create_session(
    model_path: &Path,
    frame_scale: f64,
) -> Result<TrackingSession, Box<dyn std::error::Error>> {
    log::info!(
        "Loading landmark model {} (frame scale {frame_scale})",
        model_path.display()
    );
    let detector = OnnxYoloLandmarker::new(model_path, DEFAULT_CONFIDENCE)?;
    Ok(TrackingSession::new(
        Box::new(detector),
        ByteTracker::new(TRACKER_MAX_LOST),
        frame_scale,
    ))
}
