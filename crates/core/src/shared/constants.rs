/// Frame scale used for detection when the caller passes none.
pub const DEFAULT_FRAME_SCALE: f64 = 1.0;

/// Preview is on unless the caller turns it off.
pub const DEFAULT_PREVIEW: bool = true;

/// Minimum detection score for the landmark model.
pub const DEFAULT_CONFIDENCE: f64 = 0.25;

/// Max frames a track can be lost before removal (~1 second at 30 fps).
pub const TRACKER_MAX_LOST: usize = 30;

pub const PREVIEW_WINDOW_NAME: &str = "facemark";

/// Key poll timeout for the preview window.
pub const PREVIEW_KEY_POLL_MS: i32 = 1;

/// How long a device pull waits for a fresh frame before reporting
/// the frame as unchanged.
pub const DEVICE_POLL_MS: u64 = 100;

/// Decoded frames buffered between the capture thread and the consumer.
pub const DEVICE_QUEUE_DEPTH: usize = 2;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
