pub mod onnx_yolo_landmarker;
pub mod session_factory;
