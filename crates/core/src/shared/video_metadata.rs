/// Properties of an opened video source.
///
/// `total_frames` is 0 when the count is unknown up front (live devices,
/// containers without a frame count).
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: usize,
    pub codec: String,
    /// Human-readable origin: a path or a device name.
    pub source: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction() {
        let meta = VideoMetadata {
            width: 1920,
            height: 1080,
            fps: 30.0,
            total_frames: 900,
            codec: "h264".to_string(),
            source: "/tmp/test.mp4".to_string(),
        };
        assert_eq!(meta.width, 1920);
        assert_eq!(meta.height, 1080);
        assert_eq!(meta.total_frames, 900);
        assert_eq!(meta.source, "/tmp/test.mp4");
    }

    #[test]
    fn test_live_device_has_unknown_length() {
        let meta = VideoMetadata {
            width: 640,
            height: 480,
            fps: 30.0,
            total_frames: 0,
            codec: "rawvideo".to_string(),
            source: "/dev/video0".to_string(),
        };
        assert_eq!(meta.clone(), meta);
        assert_eq!(meta.total_frames, 0);
    }
}
