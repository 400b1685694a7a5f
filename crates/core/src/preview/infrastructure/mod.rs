#[cfg(feature = "preview-window")]
pub mod highgui_preview;
