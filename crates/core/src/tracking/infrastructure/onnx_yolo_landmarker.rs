//! YOLO-pose face landmark detector using ONNX Runtime via `ort`.
//!
//! Handles letterbox preprocessing, inference and NMS post-processing.
//! Each output row is `[cx, cy, w, h, conf, kp0_x, kp0_y, kp0_conf, ...]`
//! for five facial keypoints.

use std::path::Path;

use crate::shared::face::LANDMARK_COUNT;
use crate::shared::frame::Frame;
use crate::tracking::domain::landmark_detector::{LandmarkDetection, LandmarkDetector};
use crate::tracking::domain::math::{bbox_center, nms};

/// Fallback model input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.45;

/// Values per row before the keypoints: box (4) + confidence (1).
const BOX_VALUES: usize = 5;

/// Keypoint values per row (x, y, conf per landmark).
const NUM_KEYPOINT_VALUES: usize = LANDMARK_COUNT * 3;

/// Minimum keypoint confidence to trust a predicted landmark position.
const KEYPOINT_CONF_THRESH: f64 = 0.5;

/// Gray used to pad the letterbox border (YOLO convention).
const LETTERBOX_FILL: f32 = 114.0 / 255.0;

pub struct OnnxYoloLandmarker {
    session: ort::session::Session,
    confidence: f64,
    input_size: u32,
}

impl OnnxYoloLandmarker {
    /// Loads a YOLO-pose ONNX face model.
    ///
    /// The input resolution is read from the model's input shape (NCHW);
    /// dynamic or unreadable shapes fall back to 640.
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        if !model_path.is_file() {
            return Err(format!("Landmark model not found: {}", model_path.display()).into());
        }
        let session = ort::session::Session::builder()?
            .with_execution_providers(execution_providers())?
            .commit_from_file(model_path)?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| match input.dtype() {
                ort::value::ValueType::Tensor { ref shape, .. }
                    if shape.len() >= 4 && shape[2] > 0 =>
                {
                    Some(shape[2] as u32)
                }
                _ => None,
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);
        log::debug!(
            "Loaded landmark model {} (input {input_size}x{input_size})",
            model_path.display()
        );

        Ok(Self {
            session,
            confidence,
            input_size,
        })
    }
}

impl LandmarkDetector for OnnxYoloLandmarker {
    fn detect(
        &mut self,
        frame: &Frame,
    ) -> Result<Vec<LandmarkDetection>, Box<dyn std::error::Error>> {
        let (input_tensor, letterbox) = letterbox(frame, self.input_size);

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("Landmark model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape().to_vec();
        if shape.len() != 3 {
            return Err(format!("Unexpected landmark model output shape: {shape:?}").into());
        }
        // Exported models emit [1, features, detections]; some emit the transpose.
        let transposed = shape[1] < shape[2];
        let (num_dets, num_feats) = if transposed {
            (shape[2], shape[1])
        } else {
            (shape[1], shape[2])
        };
        if num_feats < BOX_VALUES + NUM_KEYPOINT_VALUES {
            return Err(format!(
                "Landmark model output has {num_feats} values per detection, expected at least {}",
                BOX_VALUES + NUM_KEYPOINT_VALUES
            )
            .into());
        }
        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;

        let mut candidates = Vec::new();
        for i in 0..num_dets {
            let row: Vec<f32> = if transposed {
                (0..num_feats).map(|f| data[f * num_dets + i]).collect()
            } else {
                data[i * num_feats..(i + 1) * num_feats].to_vec()
            };
            if let Some(det) = parse_row(&row, self.confidence, &letterbox) {
                candidates.push(det);
            }
        }

        let boxes: Vec<[f64; 4]> = candidates.iter().map(|d| d.bbox).collect();
        let scores: Vec<f64> = candidates.iter().map(|d| d.score).collect();
        let keep = nms(&boxes, &scores, NMS_IOU_THRESH);
        Ok(keep.into_iter().map(|i| candidates[i].clone()).collect())
    }
}

/// Platform accelerator for inference; ort falls back to CPU when the
/// provider is unavailable.
fn execution_providers() -> Vec<ort::execution_providers::ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        Vec::new()
    }
}

/// Placement of the frame inside the square model input.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Letterbox {
    scale: f64,
    pad_x: u32,
    pad_y: u32,
}

impl Letterbox {
    fn to_frame(self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.pad_x as f64) / self.scale,
            (y - self.pad_y as f64) / self.scale,
        )
    }
}

/// Decodes one output row; `None` if it is below `confidence`.
///
/// Keypoints below [`KEYPOINT_CONF_THRESH`] are placed at the box center so
/// every face carries a full landmark set.
fn parse_row(row: &[f32], confidence: f64, letterbox: &Letterbox) -> Option<LandmarkDetection> {
    let conf = row[4] as f64;
    if conf < confidence {
        return None;
    }
    let (cx, cy, w, h) = (row[0] as f64, row[1] as f64, row[2] as f64, row[3] as f64);
    let (x1, y1) = letterbox.to_frame(cx - w / 2.0, cy - h / 2.0);
    let (x2, y2) = letterbox.to_frame(cx + w / 2.0, cy + h / 2.0);
    let bbox = [x1, y1, x2, y2];
    let center = bbox_center(&bbox);

    let mut landmarks = [center; LANDMARK_COUNT];
    for (k, point) in landmarks.iter_mut().enumerate() {
        let base = BOX_VALUES + k * 3;
        if row[base + 2] as f64 >= KEYPOINT_CONF_THRESH {
            *point = letterbox.to_frame(row[base] as f64, row[base + 1] as f64);
        }
    }

    Some(LandmarkDetection {
        bbox,
        score: conf,
        landmarks,
    })
}

/// Letterbox-resize a frame to `target_size` x `target_size` as an NCHW
/// float32 tensor normalized to 0..1.
fn letterbox(frame: &Frame, target_size: u32) -> (ndarray::Array4<f32>, Letterbox) {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    let mut tensor = ndarray::Array4::<f32>::from_elem(
        (1, 3, target_size as usize, target_size as usize),
        LETTERBOX_FILL,
    );

    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    // Nearest-neighbor resize into the padded region
    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    (
        tensor,
        Letterbox {
            scale,
            pad_x,
            pad_y,
        },
    )
}
