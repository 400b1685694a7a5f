pub mod landmark_renderer;
