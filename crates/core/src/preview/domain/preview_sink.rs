use crate::shared::frame::Frame;

/// What the loop should do after a preview frame was shown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreviewControl {
    Continue,
    /// The viewer asked to stop (e.g. pressed a key).
    Stop,
}

/// Debug display for annotated frames.
pub trait PreviewSink: Send {
    /// Shows `frame` together with the running face count.
    fn show(
        &mut self,
        frame: &Frame,
        faces_found: usize,
    ) -> Result<PreviewControl, Box<dyn std::error::Error>>;

    /// Services the display without a new frame, e.g. while a capture
    /// device stalls, so a stop request is still seen.
    fn poll(&mut self) -> Result<PreviewControl, Box<dyn std::error::Error>> {
        Ok(PreviewControl::Continue)
    }

    /// Tears the display down. Safe to call more than once.
    fn close(&mut self);
}
