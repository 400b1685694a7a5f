use opencv::core::{Mat, Point, Scalar};
use opencv::prelude::*;
use opencv::{highgui, imgproc};

use crate::preview::domain::preview_sink::{PreviewControl, PreviewSink};
use crate::shared::constants::{PREVIEW_KEY_POLL_MS, PREVIEW_WINDOW_NAME};
use crate::shared::frame::Frame;

/// OpenCV highgui window showing annotated frames; any key press stops.
pub struct HighguiPreview {
    window_open: bool,
}

impl HighguiPreview {
    pub fn new() -> Self {
        Self { window_open: false }
    }
}

impl Default for HighguiPreview {
    fn default() -> Self {
        Self::new()
    }
}

fn to_bgr_mat(frame: &Frame) -> Result<Mat, Box<dyn std::error::Error>> {
    if frame.channels() != 3 {
        return Err(format!("preview needs an RGB frame, got {} channels", frame.channels()).into());
    }
    let flat = Mat::from_slice(frame.data())?;
    let rgb = flat.reshape(3, frame.height() as i32)?;
    let mut bgr = Mat::default();
    imgproc::cvt_color_def(&*rgb, &mut bgr, imgproc::COLOR_RGB2BGR)?;
    Ok(bgr)
}

fn overlay_text(
    image: &mut Mat,
    text: &str,
    origin: Point,
    font: i32,
) -> Result<(), Box<dyn std::error::Error>> {
    imgproc::put_text(
        image,
        text,
        origin,
        font,
        0.5,
        Scalar::new(255.0, 255.0, 255.0, 0.0),
        1,
        imgproc::LINE_AA,
        false,
    )?;
    Ok(())
}

fn poll_key() -> Result<PreviewControl, Box<dyn std::error::Error>> {
    let key = highgui::wait_key(PREVIEW_KEY_POLL_MS)?;
    if key >= 0 {
        log::info!("Preview stopped by key press");
        Ok(PreviewControl::Stop)
    } else {
        Ok(PreviewControl::Continue)
    }
}

impl PreviewSink for HighguiPreview {
    fn show(
        &mut self,
        frame: &Frame,
        faces_found: usize,
    ) -> Result<PreviewControl, Box<dyn std::error::Error>> {
        let mut image = to_bgr_mat(frame)?;
        overlay_text(
            &mut image,
            &format!("Faces found so far: {faces_found}"),
            Point::new(15, 15),
            imgproc::FONT_HERSHEY_SIMPLEX,
        )?;
        overlay_text(
            &mut image,
            "press any key to stop",
            Point::new(10, image.rows() - 20),
            imgproc::FONT_HERSHEY_COMPLEX,
        )?;

        if !self.window_open {
            highgui::named_window(PREVIEW_WINDOW_NAME, highgui::WINDOW_AUTOSIZE)?;
            self.window_open = true;
        }
        highgui::imshow(PREVIEW_WINDOW_NAME, &image)?;
        poll_key()
    }

    fn poll(&mut self) -> Result<PreviewControl, Box<dyn std::error::Error>> {
        if !self.window_open {
            return Ok(PreviewControl::Continue);
        }
        poll_key()
    }

    fn close(&mut self) {
        if !self.window_open {
            return;
        }
        self.window_open = false;
        if let Err(e) = highgui::destroy_window(PREVIEW_WINDOW_NAME) {
            log::warn!("Failed to close preview window: {e}");
        }
    }
}
