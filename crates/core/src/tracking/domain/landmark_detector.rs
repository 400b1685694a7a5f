use crate::shared::face::LANDMARK_COUNT;
use crate::shared::frame::Frame;

/// A face found in one frame, before tracking.
///
/// Coordinates are in the pixel space of the frame handed to the detector.
#[derive(Clone, Debug, PartialEq)]
pub struct LandmarkDetection {
    /// `[x1, y1, x2, y2]`.
    pub bbox: [f64; 4],
    pub score: f64,
    pub landmarks: [(f64, f64); LANDMARK_COUNT],
}

impl LandmarkDetection {
    /// Maps coordinates from a frame scaled by `scale` back to the
    /// unscaled frame.
    pub fn unscaled(&self, scale: f64) -> Self {
        if scale == 1.0 {
            return self.clone();
        }
        let mut landmarks = self.landmarks;
        for p in &mut landmarks {
            *p = (p.0 / scale, p.1 / scale);
        }
        Self {
            bbox: self.bbox.map(|v| v / scale),
            score: self.score,
            landmarks,
        }
    }
}

/// Per-frame face and landmark detection.
///
/// `&mut self` so implementations can keep inference buffers between frames.
pub trait LandmarkDetector: Send {
    fn detect(&mut self, frame: &Frame)
        -> Result<Vec<LandmarkDetection>, Box<dyn std::error::Error>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_unscaled_divides_all_coordinates() {
        let det = LandmarkDetection {
            bbox: [10.0, 20.0, 30.0, 40.0],
            score: 0.8,
            landmarks: [(1.0, 2.0); LANDMARK_COUNT],
        };
        let full = det.unscaled(0.5);
        assert_eq!(full.bbox, [20.0, 40.0, 60.0, 80.0]);
        assert_relative_eq!(full.score, 0.8);
        for p in &full.landmarks {
            assert_relative_eq!(p.0, 2.0);
            assert_relative_eq!(p.1, 4.0);
        }
    }

    #[test]
    fn test_unscaled_identity() {
        let det = LandmarkDetection {
            bbox: [1.0, 2.0, 3.0, 4.0],
            score: 0.5,
            landmarks: [(5.0, 6.0); LANDMARK_COUNT],
        };
        assert_eq!(det.unscaled(1.0), det);
    }
}
