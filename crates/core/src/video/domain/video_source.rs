use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Outcome of asking a source for its next frame.
#[derive(Clone, Debug)]
pub enum Pull {
    /// A frame not seen before.
    Updated(Frame),
    /// The source is alive but has nothing new since the last pull.
    ///
    /// Live devices report this when the camera has not delivered a frame
    /// yet; consumers must not treat it as a repeat of the previous frame.
    Unchanged,
}

pub type PullResult = Result<Pull, Box<dyn std::error::Error>>;

/// A recorded sequence or live device that yields frames on demand.
///
/// The source is configured at construction; `open` acquires the
/// underlying resource.
pub trait VideoSource: Send {
    /// Acquires the source and returns its metadata.
    fn open(&mut self) -> Result<VideoMetadata, Box<dyn std::error::Error>>;

    /// Pulls frames in order until the source is exhausted.
    fn pulls(&mut self) -> Box<dyn Iterator<Item = PullResult> + '_>;

    /// Releases the underlying resource. Safe to call more than once.
    fn close(&mut self);
}
