pub mod marshal;
pub mod pipeline;
pub mod preview;
pub mod rendering;
pub mod shared;
pub mod tracking;
pub mod video;
