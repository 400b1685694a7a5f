pub mod bytetrack_tracker;
pub mod landmark_detector;
pub mod math;
pub mod tracking_session;
