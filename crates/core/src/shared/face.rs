/// Number of landmark points produced per face.
///
/// Order: left eye, right eye, nose tip, left mouth corner, right mouth corner.
pub const LANDMARK_COUNT: usize = 5;

/// Axis-aligned face box in 0-based pixel coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    /// Rounds an `[x1, y1, x2, y2]` box to integer pixels and clamps it to
    /// a `frame_w` x `frame_h` frame.
    pub fn from_corners(corners: [f64; 4], frame_w: u32, frame_h: u32) -> Self {
        let fw = frame_w as i32;
        let fh = frame_h as i32;
        let x1 = (corners[0].round() as i32).clamp(0, fw);
        let y1 = (corners[1].round() as i32).clamp(0, fh);
        let x2 = (corners[2].round() as i32).clamp(0, fw);
        let y2 = (corners[3].round() as i32).clamp(0, fh);
        Self {
            x: x1,
            y: y1,
            width: (x2 - x1).max(0),
            height: (y2 - y1).max(0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

/// One tracked face in one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Face {
    /// Track identity, stable across frames while the face stays tracked.
    pub id: u32,
    pub landmarks: Vec<(i32, i32)>,
    pub bbox: BoundingBox,
    pub score: f64,
}

/// Accumulated result for a single pulled frame.
///
/// `width`/`height` are the dimensions of the frame as it came from the
/// source, regardless of the scale used for detection.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameLandmarks {
    pub index: usize,
    pub width: u32,
    pub height: u32,
    pub faces: Vec<Face>,
}

impl FrameLandmarks {
    pub fn empty(index: usize, width: u32, height: u32) -> Self {
        Self {
            index,
            width,
            height,
            faces: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_from_corners_rounds_and_converts_to_size() {
        let b = BoundingBox::from_corners([10.4, 20.6, 50.5, 80.2], 640, 480);
        assert_eq!(
            b,
            BoundingBox {
                x: 10,
                y: 21,
                width: 41,
                height: 59,
            }
        );
    }

    #[rstest]
    #[case::left_edge([-20.0, 10.0, 30.0, 60.0], BoundingBox { x: 0, y: 10, width: 30, height: 50 })]
    #[case::bottom_right([90.0, 90.0, 150.0, 150.0], BoundingBox { x: 90, y: 90, width: 10, height: 10 })]
    #[case::fully_outside([200.0, 200.0, 300.0, 300.0], BoundingBox { x: 100, y: 100, width: 0, height: 0 })]
    fn test_from_corners_clamps_to_frame(#[case] corners: [f64; 4], #[case] expected: BoundingBox) {
        assert_eq!(BoundingBox::from_corners(corners, 100, 100), expected);
    }

    #[test]
    fn test_is_empty() {
        let b = BoundingBox {
            x: 0,
            y: 0,
            width: 4,
            height: 5,
        };
        assert!(!b.is_empty());
        assert!(BoundingBox::default().is_empty());
    }

    #[test]
    fn test_empty_frame_landmarks() {
        let f = FrameLandmarks::empty(3, 640, 480);
        assert_eq!(f.index, 3);
        assert_eq!(f.width, 640);
        assert_eq!(f.height, 480);
        assert!(f.faces.is_empty());
    }
}
