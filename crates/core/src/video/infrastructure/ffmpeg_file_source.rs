use std::path::PathBuf;

use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_source::{Pull, PullResult, VideoSource};

use super::rgb_decoder::{stream_fps, RgbDecoder};

/// Recorded video file decoded via ffmpeg-next (libavformat + libavcodec).
///
/// Every decoded frame is new, so pulls are always [`Pull::Updated`].
pub struct FfmpegFileSource {
    path: PathBuf,
    input_ctx: Option<ffmpeg_next::format::context::Input>,
    video_stream_index: usize,
}

// Safety: FfmpegFileSource is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegFileSource {}

impl FfmpegFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            input_ctx: None,
            video_stream_index: 0,
        }
    }
}

impl VideoSource for FfmpegFileSource {
    fn open(&mut self) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let ictx = ffmpeg_next::format::input(&self.path)?;
        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("No video stream found")?;
        let decoder = RgbDecoder::from_stream(&stream)?;

        let metadata = VideoMetadata {
            width: decoder.width(),
            height: decoder.height(),
            fps: stream_fps(&stream),
            total_frames: stream.frames().max(0) as usize,
            codec: decoder.codec_name(),
            source: self.path.display().to_string(),
        };
        log::debug!(
            "Opened {}: {}x{} {} @ {:.2} fps",
            metadata.source,
            metadata.width,
            metadata.height,
            metadata.codec,
            metadata.fps
        );

        self.video_stream_index = stream.index();
        self.input_ctx = Some(ictx);
        Ok(metadata)
    }

    fn pulls(&mut self) -> Box<dyn Iterator<Item = PullResult> + '_> {
        let Some(ictx) = self.input_ctx.as_mut() else {
            return Box::new(std::iter::once(Err("FfmpegFileSource: not opened".into())));
        };

        let decoder = match ictx.stream(self.video_stream_index) {
            Some(stream) => RgbDecoder::from_stream(&stream),
            None => Err("Video stream disappeared".into()),
        };
        let decoder = match decoder {
            Ok(decoder) => decoder,
            Err(e) => return Box::new(std::iter::once(Err(e))),
        };

        Box::new(FilePulls {
            ictx,
            decoder,
            video_stream_index: self.video_stream_index,
            frame_index: 0,
            flushing: false,
            done: false,
        })
    }

    fn close(&mut self) {
        self.input_ctx = None;
    }
}

/// Lazy iterator that decodes one frame per pull.
struct FilePulls<'a> {
    ictx: &'a mut ffmpeg_next::format::context::Input,
    decoder: RgbDecoder,
    video_stream_index: usize,
    frame_index: usize,
    flushing: bool,
    done: bool,
}

impl FilePulls<'_> {
    fn try_receive(&mut self) -> Option<PullResult> {
        let result = self.decoder.receive(self.frame_index)?;
        self.frame_index += 1;
        Some(result.map(Pull::Updated))
    }
}

impl Iterator for FilePulls<'_> {
    type Item = PullResult;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if let Some(result) = self.try_receive() {
            return Some(result);
        }

        if self.flushing {
            self.done = true;
            return None;
        }

        loop {
            let Some((stream, packet)) = self.ictx.packets().next() else {
                let _ = self.decoder.send_eof();
                self.flushing = true;
                if let Some(result) = self.try_receive() {
                    return Some(result);
                }
                self.done = true;
                return None;
            };

            if stream.index() != self.video_stream_index {
                continue;
            }

            if let Err(e) = self.decoder.send_packet(&packet) {
                log::debug!("Skipping undecodable packet: {e}");
                continue;
            }

            if let Some(result) = self.try_receive() {
                return Some(result);
            }
        }
    }
}
