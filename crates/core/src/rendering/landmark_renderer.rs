use ndarray::{s, ArrayViewMut3};

use crate::shared::face::{BoundingBox, FrameLandmarks};
use crate::shared::frame::Frame;

const BOX_COLOR: [u8; 3] = [0, 255, 0];
const LANDMARK_COLOR: [u8; 3] = [255, 0, 0];
const BOX_THICKNESS: i32 = 2;
const LANDMARK_RADIUS: i32 = 2;

/// Draws every face's box outline and landmark dots onto `frame`.
///
/// Shapes are clipped to the frame; non-RGB frames are left untouched.
pub fn render_landmarks(frame: &mut Frame, landmarks: &FrameLandmarks) {
    if frame.channels() != 3 {
        return;
    }
    let mut pixels = frame.as_ndarray_mut();
    for face in &landmarks.faces {
        draw_box(&mut pixels, &face.bbox);
        for &(x, y) in &face.landmarks {
            fill_rect(
                &mut pixels,
                x - LANDMARK_RADIUS,
                y - LANDMARK_RADIUS,
                x + LANDMARK_RADIUS + 1,
                y + LANDMARK_RADIUS + 1,
                LANDMARK_COLOR,
            );
        }
    }
}

fn draw_box(pixels: &mut ArrayViewMut3<'_, u8>, bbox: &BoundingBox) {
    if bbox.is_empty() {
        return;
    }
    let (x1, y1) = (bbox.x, bbox.y);
    let (x2, y2) = (bbox.x + bbox.width, bbox.y + bbox.height);
    let t = BOX_THICKNESS.min(bbox.width).min(bbox.height);

    fill_rect(pixels, x1, y1, x2, y1 + t, BOX_COLOR);
    fill_rect(pixels, x1, y2 - t, x2, y2, BOX_COLOR);
    fill_rect(pixels, x1, y1, x1 + t, y2, BOX_COLOR);
    fill_rect(pixels, x2 - t, y1, x2, y2, BOX_COLOR);
}

/// Fills the half-open rectangle `[x1, x2) x [y1, y2)`, clipped to the image.
fn fill_rect(
    pixels: &mut ArrayViewMut3<'_, u8>,
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
    color: [u8; 3],
) {
    let (h, w, _) = pixels.dim();
    let x1 = x1.clamp(0, w as i32) as usize;
    let x2 = x2.clamp(0, w as i32) as usize;
    let y1 = y1.clamp(0, h as i32) as usize;
    let y2 = y2.clamp(0, h as i32) as usize;
    if x1 >= x2 || y1 >= y2 {
        return;
    }
    for (c, value) in color.iter().enumerate() {
        pixels.slice_mut(s![y1..y2, x1..x2, c]).fill(*value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::face::Face;

    fn black(width: u32, height: u32) -> Frame {
        Frame::new(vec![0; (width * height * 3) as usize], width, height, 3, 0)
    }

    fn pixel(frame: &Frame, x: usize, y: usize) -> [u8; 3] {
        let arr = frame.as_ndarray();
        [arr[[y, x, 0]], arr[[y, x, 1]], arr[[y, x, 2]]]
    }

    fn face(bbox: BoundingBox, landmarks: Vec<(i32, i32)>) -> Face {
        Face {
            id: 1,
            landmarks,
            bbox,
            score: 0.9,
        }
    }

    fn landmarks_of(faces: Vec<Face>) -> FrameLandmarks {
        FrameLandmarks {
            index: 0,
            width: 40,
            height: 40,
            faces,
        }
    }

    #[test]
    fn test_box_outline_drawn_interior_untouched() {
        let mut frame = black(40, 40);
        let bbox = BoundingBox {
            x: 10,
            y: 10,
            width: 20,
            height: 20,
        };
        render_landmarks(&mut frame, &landmarks_of(vec![face(bbox, vec![])]));

        assert_eq!(pixel(&frame, 10, 10), BOX_COLOR);
        assert_eq!(pixel(&frame, 29, 29), BOX_COLOR);
        assert_eq!(pixel(&frame, 20, 10), BOX_COLOR);
        assert_eq!(pixel(&frame, 20, 20), [0, 0, 0]);
        assert_eq!(pixel(&frame, 5, 5), [0, 0, 0]);
        assert_eq!(pixel(&frame, 30, 30), [0, 0, 0]);
    }

    #[test]
    fn test_landmark_dot_drawn() {
        let mut frame = black(40, 40);
        let bbox = BoundingBox {
            x: 5,
            y: 5,
            width: 30,
            height: 30,
        };
        render_landmarks(&mut frame, &landmarks_of(vec![face(bbox, vec![(20, 20)])]));

        assert_eq!(pixel(&frame, 20, 20), LANDMARK_COLOR);
        assert_eq!(pixel(&frame, 22, 18), LANDMARK_COLOR);
        assert_eq!(pixel(&frame, 24, 20), [0, 0, 0]);
    }

    #[test]
    fn test_shapes_clipped_at_frame_edges() {
        let mut frame = black(40, 40);
        let bbox = BoundingBox {
            x: 30,
            y: 30,
            width: 10,
            height: 10,
        };
        render_landmarks(
            &mut frame,
            &landmarks_of(vec![face(bbox, vec![(0, 0), (39, 39)])]),
        );

        assert_eq!(pixel(&frame, 0, 0), LANDMARK_COLOR);
        assert_eq!(pixel(&frame, 39, 39), LANDMARK_COLOR);
        assert_eq!(pixel(&frame, 30, 35), BOX_COLOR);
    }

    #[test]
    fn test_empty_box_and_no_faces_leave_frame_unchanged() {
        let mut frame = black(40, 40);
        let empty = BoundingBox {
            x: 10,
            y: 10,
            width: 0,
            height: 5,
        };
        render_landmarks(&mut frame, &landmarks_of(vec![face(empty, vec![])]));
        render_landmarks(&mut frame, &landmarks_of(vec![]));
        assert!(frame.data().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_non_rgb_frame_untouched() {
        let mut frame = Frame::new(vec![0; 40 * 40], 40, 40, 1, 0);
        let bbox = BoundingBox {
            x: 0,
            y: 0,
            width: 10,
            height: 10,
        };
        render_landmarks(&mut frame, &landmarks_of(vec![face(bbox, vec![(5, 5)])]));
        assert!(frame.data().iter().all(|&v| v == 0));
    }
}
