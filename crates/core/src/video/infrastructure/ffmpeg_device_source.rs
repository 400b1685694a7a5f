use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};

use crate::shared::constants::{DEVICE_POLL_MS, DEVICE_QUEUE_DEPTH};
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_source::{Pull, PullResult, VideoSource};

use super::rgb_decoder::{stream_fps, RgbDecoder};

type SendError = Box<dyn std::error::Error + Send + Sync>;

#[cfg(target_os = "linux")]
const DEVICE_FORMAT: &str = "v4l2";
#[cfg(target_os = "macos")]
const DEVICE_FORMAT: &str = "avfoundation";
#[cfg(target_os = "windows")]
const DEVICE_FORMAT: &str = "vfwcap";
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
const DEVICE_FORMAT: &str = "v4l2";

/// Live capture device read through ffmpeg's device input formats.
///
/// A capture thread owns the ffmpeg context and pushes decoded frames into a
/// small bounded channel, dropping frames the consumer is too slow to take.
/// A pull that sees no fresh frame within [`DEVICE_POLL_MS`] reports
/// [`Pull::Unchanged`].
pub struct FfmpegDeviceSource {
    device_id: u32,
    width: u32,
    height: u32,
    poll: Duration,
    capture: Option<Capture>,
}

struct Capture {
    frames: Receiver<Result<Frame, SendError>>,
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl FfmpegDeviceSource {
    /// `width`/`height` of 0 keep the device's default size.
    pub fn new(device_id: u32, width: u32, height: u32) -> Self {
        Self {
            device_id,
            width,
            height,
            poll: Duration::from_millis(DEVICE_POLL_MS),
            capture: None,
        }
    }

    fn url(&self) -> String {
        if cfg!(target_os = "linux") {
            format!("/dev/video{}", self.device_id)
        } else {
            self.device_id.to_string()
        }
    }

    /// Requested capture size, when both dimensions were given.
    fn video_size(&self) -> Option<String> {
        (self.width > 0 && self.height > 0).then(|| format!("{}x{}", self.width, self.height))
    }
}

fn open_device(
    url: &str,
    video_size: Option<&str>,
) -> Result<ffmpeg_next::format::context::Input, SendError> {
    ffmpeg_next::init()?;
    ffmpeg_next::device::register_all();

    let mut options = ffmpeg_next::Dictionary::new();
    if let Some(size) = video_size {
        options.set("video_size", size);
    }

    let format = ffmpeg_next::device::input::video()
        .find(|f| f.name() == DEVICE_FORMAT)
        .ok_or_else(|| format!("ffmpeg was built without the {DEVICE_FORMAT} input device"))?;
    let context = ffmpeg_next::format::open_with(
        &url,
        &ffmpeg_next::format::Format::Input(format),
        options,
    )?;
    match context {
        ffmpeg_next::format::context::Context::Input(ictx) => Ok(ictx),
        _ => Err(format!("{url} did not open as an input device").into()),
    }
}

/// Body of the capture thread: reports metadata (or the open failure) on
/// `ready`, then decodes until the device ends, `stop` is raised, or the
/// consumer hangs up.
fn capture(
    url: String,
    video_size: Option<String>,
    ready: Sender<Result<VideoMetadata, SendError>>,
    frames: Sender<Result<Frame, SendError>>,
    stop: Arc<AtomicBool>,
) {
    let opened = open_device(&url, video_size.as_deref()).and_then(|ictx| {
        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("Capture device has no video stream")?;
        let decoder = RgbDecoder::from_stream(&stream).map_err(|e| e.to_string())?;
        let metadata = VideoMetadata {
            width: decoder.width(),
            height: decoder.height(),
            fps: stream_fps(&stream),
            total_frames: 0,
            codec: decoder.codec_name(),
            source: url.clone(),
        };
        let stream_index = stream.index();
        Ok((ictx, decoder, stream_index, metadata))
    });

    let (mut ictx, mut decoder, stream_index) = match opened {
        Ok((ictx, decoder, stream_index, metadata)) => {
            if ready.send(Ok(metadata)).is_err() {
                return;
            }
            (ictx, decoder, stream_index)
        }
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    let mut index = 0;
    for (stream, packet) in ictx.packets() {
        if stop.load(Ordering::Relaxed) {
            break;
        }
        if stream.index() != stream_index {
            continue;
        }
        if let Err(e) = decoder.send_packet(&packet) {
            log::debug!("Skipping undecodable capture packet: {e}");
            continue;
        }
        while let Some(result) = decoder.receive(index) {
            index += 1;
            match result {
                Ok(frame) => match frames.try_send(Ok(frame)) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => log::trace!("Capture queue full, dropping frame"),
                    Err(TrySendError::Disconnected(_)) => return,
                },
                Err(e) => {
                    let _ = frames.send(Err(e.to_string().into()));
                    return;
                }
            }
        }
    }
    log::debug!("Capture from {url} ended after {index} frames");
}

/// Waits up to `poll` for the next captured frame.
///
/// Returns `None` once the capture thread has finished and drained.
fn next_pull(frames: &Receiver<Result<Frame, SendError>>, poll: Duration) -> Option<PullResult> {
    match frames.recv_timeout(poll) {
        Ok(Ok(frame)) => Some(Ok(Pull::Updated(frame))),
        Ok(Err(e)) => Some(Err(e.to_string().into())),
        Err(RecvTimeoutError::Timeout) => Some(Ok(Pull::Unchanged)),
        Err(RecvTimeoutError::Disconnected) => None,
    }
}

/// Renumbers frames so indices stay consecutive across dropped captures.
struct DevicePulls<'a> {
    frames: &'a Receiver<Result<Frame, SendError>>,
    poll: Duration,
    next_index: usize,
}

impl Iterator for DevicePulls<'_> {
    type Item = PullResult;

    fn next(&mut self) -> Option<Self::Item> {
        match next_pull(self.frames, self.poll)? {
            Ok(Pull::Updated(frame)) => {
                let frame = frame.with_index(self.next_index);
                self.next_index += 1;
                Some(Ok(Pull::Updated(frame)))
            }
            other => Some(other),
        }
    }
}

impl VideoSource for FfmpegDeviceSource {
    fn open(&mut self) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        self.close();

        let url = self.url();
        let video_size = self.video_size();
        let (ready_tx, ready_rx) = crossbeam_channel::bounded(1);
        let (frame_tx, frame_rx) = crossbeam_channel::bounded(DEVICE_QUEUE_DEPTH);
        let stop = Arc::new(AtomicBool::new(false));

        log::info!("Opening capture device {url} via {DEVICE_FORMAT}");
        let thread_stop = stop.clone();
        let handle = std::thread::Builder::new()
            .name("facemark-capture".to_string())
            .spawn(move || capture(url, video_size, ready_tx, frame_tx, thread_stop))?;

        let ready = ready_rx.recv();
        let metadata = match ready {
            Ok(Ok(metadata)) => metadata,
            Ok(Err(e)) => {
                let _ = handle.join();
                return Err(e.to_string().into());
            }
            Err(_) => {
                let _ = handle.join();
                return Err("Capture thread exited before the device opened".into());
            }
        };
        log::debug!(
            "Capture device {}: {}x{} {} @ {:.2} fps",
            metadata.source,
            metadata.width,
            metadata.height,
            metadata.codec,
            metadata.fps
        );

        self.capture = Some(Capture {
            frames: frame_rx,
            stop,
            handle,
        });
        Ok(metadata)
    }

    fn pulls(&mut self) -> Box<dyn Iterator<Item = PullResult> + '_> {
        let Some(capture) = self.capture.as_ref() else {
            return Box::new(std::iter::once(Err(
                "FfmpegDeviceSource: not opened".into()
            )));
        };
        Box::new(DevicePulls {
            frames: &capture.frames,
            poll: self.poll,
            next_index: 0,
        })
    }

    fn close(&mut self) {
        let Some(capture) = self.capture.take() else {
            return;
        };
        capture.stop.store(true, Ordering::Relaxed);
        drop(capture.frames);
        if capture.handle.join().is_err() {
            log::warn!("Capture thread panicked");
        }
    }
}

impl Drop for FfmpegDeviceSource {
    fn drop(&mut self) {
        self.close();
    }
}
