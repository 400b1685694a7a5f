//! Conversion of tracking results into the host's struct-array shape.
//!
//! The host indexes pixels from 1, so every coordinate crossing this
//! boundary is shifted by +1 on both axes. Sizes are not shifted.

use serde::Serialize;

use crate::shared::face::{Face, FrameLandmarks};

const HOST_INDEX_BASE: i32 = 1;

/// One entry of the 1-by-N frame array.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HostFrame {
    pub faces: Vec<HostFace>,
    pub width: u32,
    pub height: u32,
}

/// One entry of a frame's 1-by-M face array.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HostFace {
    /// N-by-2 list of `[x, y]` points.
    pub landmarks: Vec<[i32; 2]>,
    /// `[x, y, width, height]`.
    pub bbox: [i32; 4],
}

/// Converts the accumulated sequence, in order, into host frames.
pub fn to_host_frames(sequence: &[FrameLandmarks]) -> Vec<HostFrame> {
    sequence.iter().map(to_host_frame).collect()
}

fn to_host_frame(frame: &FrameLandmarks) -> HostFrame {
    HostFrame {
        faces: frame.faces.iter().map(to_host_face).collect(),
        width: frame.width,
        height: frame.height,
    }
}

fn to_host_face(face: &Face) -> HostFace {
    HostFace {
        landmarks: face
            .landmarks
            .iter()
            .map(|&(x, y)| [x + HOST_INDEX_BASE, y + HOST_INDEX_BASE])
            .collect(),
        bbox: [
            face.bbox.x + HOST_INDEX_BASE,
            face.bbox.y + HOST_INDEX_BASE,
            face.bbox.width,
            face.bbox.height,
        ],
    }
}
