pub mod constants;
pub mod face;
pub mod frame;
pub mod video_metadata;
