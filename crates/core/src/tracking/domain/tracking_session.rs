use crate::shared::face::{BoundingBox, Face, FrameLandmarks};
use crate::shared::frame::Frame;

use super::bytetrack_tracker::ByteTracker;
use super::landmark_detector::{LandmarkDetection, LandmarkDetector};

/// Accumulates tracked landmarks over a sequence of frames.
///
/// Each frame is optionally downscaled by `frame_scale` before detection;
/// results are mapped back to the frame's own pixel grid before they are
/// stored.
pub struct TrackingSession {
    detector: Box<dyn LandmarkDetector>,
    tracker: ByteTracker,
    frame_scale: f64,
    sequence: Vec<FrameLandmarks>,
    faces_found: usize,
}

impl TrackingSession {
    pub fn new(detector: Box<dyn LandmarkDetector>, tracker: ByteTracker, frame_scale: f64) -> Self {
        debug_assert!(frame_scale > 0.0, "frame scale must be positive");
        Self {
            detector,
            tracker,
            frame_scale,
            sequence: Vec::new(),
            faces_found: 0,
        }
    }

    /// Detects and tracks faces in `frame`, appends the result to the
    /// sequence and returns it.
    pub fn add_frame(
        &mut self,
        frame: &Frame,
    ) -> Result<&FrameLandmarks, Box<dyn std::error::Error>> {
        let detections: Vec<LandmarkDetection> = if self.frame_scale == 1.0 {
            self.detector.detect(frame)?
        } else {
            let scaled = frame.scaled(self.frame_scale);
            self.detector
                .detect(&scaled)?
                .iter()
                .map(|d| d.unscaled(self.frame_scale))
                .collect()
        };

        let assignments = self.tracker.update(&detections);
        let faces: Vec<Face> = assignments
            .iter()
            .map(|a| to_face(a.id, &detections[a.det_index], frame))
            .collect();
        log::trace!(
            "Frame {}: {} detections, {} tracked faces",
            frame.index(),
            detections.len(),
            faces.len()
        );

        self.faces_found += faces.len();
        self.sequence.push(FrameLandmarks {
            index: frame.index(),
            width: frame.width(),
            height: frame.height(),
            faces,
        });
        Ok(&self.sequence[self.sequence.len() - 1])
    }

    pub fn sequence(&self) -> &[FrameLandmarks] {
        &self.sequence
    }

    pub fn into_sequence(self) -> Vec<FrameLandmarks> {
        self.sequence
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Total faces over all frames added so far.
    pub fn faces_found(&self) -> usize {
        self.faces_found
    }
}

fn to_face(id: u32, det: &LandmarkDetection, frame: &Frame) -> Face {
    let max_x = frame.width().saturating_sub(1) as i32;
    let max_y = frame.height().saturating_sub(1) as i32;
    Face {
        id,
        landmarks: det
            .landmarks
            .iter()
            .map(|&(x, y)| {
                (
                    (x.round() as i32).clamp(0, max_x),
                    (y.round() as i32).clamp(0, max_y),
                )
            })
            .collect(),
        bbox: BoundingBox::from_corners(det.bbox, frame.width(), frame.height()),
        score: det.score,
    }
}
