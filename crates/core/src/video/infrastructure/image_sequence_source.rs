use std::path::{Path, PathBuf};

use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_source::{Pull, PullResult, VideoSource};

use super::rgb_decoder::RgbDecoder;

/// A single still image, or a directory of stills read in file-name order.
///
/// Images are decoded with ffmpeg rather than the `image` crate, which is
/// much faster for large JPEGs. Each image is decoded when pulled.
pub struct ImageSequenceSource {
    path: PathBuf,
    images: Option<Vec<PathBuf>>,
}

impl ImageSequenceSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            images: None,
        }
    }
}

/// True when `path` has one of the recognised still-image extensions.
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn list_images(dir: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut images: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_image_path(p))
        .collect();
    images.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(images)
}

fn decode_image(path: &Path, index: usize) -> Result<Frame, Box<dyn std::error::Error>> {
    let mut ictx = ffmpeg_next::format::input(path)?;
    let stream = ictx
        .streams()
        .best(ffmpeg_next::media::Type::Video)
        .ok_or_else(|| format!("No image data found in {}", path.display()))?;
    let stream_index = stream.index();
    let mut decoder = RgbDecoder::from_stream(&stream)?;

    for (stream, packet) in ictx.packets() {
        if stream.index() != stream_index {
            continue;
        }
        decoder.send_packet(&packet)?;
        if let Some(frame) = decoder.receive(index) {
            return frame;
        }
    }

    // Some image demuxers hold the only frame until flushed.
    let _ = decoder.send_eof();
    decoder
        .receive(index)
        .unwrap_or_else(|| Err(format!("Failed to decode image {}", path.display()).into()))
}

impl VideoSource for ImageSequenceSource {
    fn open(&mut self) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let images = if self.path.is_dir() {
            list_images(&self.path)?
        } else if self.path.is_file() {
            vec![self.path.clone()]
        } else {
            return Err(format!("No such image or directory: {}", self.path.display()).into());
        };
        let Some(first) = images.first() else {
            return Err(format!("No images found in {}", self.path.display()).into());
        };

        let first_frame = decode_image(first, 0)?;
        let metadata = VideoMetadata {
            width: first_frame.width(),
            height: first_frame.height(),
            fps: 0.0,
            total_frames: images.len(),
            codec: "image".to_string(),
            source: self.path.display().to_string(),
        };
        log::debug!(
            "Opened {} image(s) from {} ({}x{})",
            metadata.total_frames,
            metadata.source,
            metadata.width,
            metadata.height
        );

        self.images = Some(images);
        Ok(metadata)
    }

    fn pulls(&mut self) -> Box<dyn Iterator<Item = PullResult> + '_> {
        let Some(images) = self.images.as_ref() else {
            return Box::new(std::iter::once(Err(
                "ImageSequenceSource: not opened".into()
            )));
        };
        Box::new(
            images
                .iter()
                .enumerate()
                .map(|(index, path)| decode_image(path, index).map(Pull::Updated)),
        )
    }

    fn close(&mut self) {
        self.images = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn write_test_image(path: &Path, width: u32, height: u32, rgb: [u8; 3]) {
        let mut img = image::RgbImage::new(width, height);
        for pixel in img.pixels_mut() {
            *pixel = image::Rgb(rgb);
        }
        img.save(path).unwrap();
    }

    #[rstest]
    #[case("face.png", true)]
    #[case("FACE.JPG", true)]
    #[case("scan.tif", true)]
    #[case("clip.mp4", false)]
    #[case("noext", false)]
    fn test_is_image_path(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_image_path(Path::new(name)), expected);
    }

    #[test]
    fn test_single_image_is_one_frame_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("still.png");
        write_test_image(&path, 100, 80, [50, 100, 200]);

        let mut source = ImageSequenceSource::new(&path);
        let meta = source.open().unwrap();
        assert_eq!(meta.width, 100);
        assert_eq!(meta.height, 80);
        assert_eq!(meta.fps, 0.0);
        assert_eq!(meta.total_frames, 1);
        assert_eq!(meta.codec, "image");

        let pulls: Vec<Pull> = source.pulls().map(|p| p.unwrap()).collect();
        assert_eq!(pulls.len(), 1);
        let Pull::Updated(frame) = &pulls[0] else {
            panic!("image pulls must be updated");
        };
        assert_eq!(frame.channels(), 3);
        assert_eq!(&frame.data()[..3], &[50, 100, 200]);
    }

    #[test]
    fn test_directory_is_read_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write_test_image(&dir.path().join("b.png"), 40, 30, [20, 20, 20]);
        write_test_image(&dir.path().join("a.png"), 40, 30, [10, 10, 10]);
        write_test_image(&dir.path().join("c.png"), 40, 30, [30, 30, 30]);
        std::fs::write(dir.path().join("notes.txt"), "not an image").unwrap();

        let mut source = ImageSequenceSource::new(dir.path());
        let meta = source.open().unwrap();
        assert_eq!(meta.total_frames, 3);

        let firsts: Vec<(usize, u8)> = source
            .pulls()
            .map(|p| match p.unwrap() {
                Pull::Updated(frame) => (frame.index(), frame.data()[0]),
                Pull::Unchanged => panic!("image pulls must be updated"),
            })
            .collect();
        assert_eq!(firsts, vec![(0, 10), (1, 20), (2, 30)]);
    }

    #[test]
    fn test_empty_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = ImageSequenceSource::new(dir.path());
        assert!(source.open().is_err());
    }

    #[test]
    fn test_missing_path_fails() {
        let mut source = ImageSequenceSource::new("/nonexistent/frames");
        assert!(source.open().is_err());
    }

    #[test]
    fn test_pulls_without_open_returns_error() {
        let mut source = ImageSequenceSource::new("still.png");
        assert!(source.pulls().next().unwrap().is_err());
    }

    #[test]
    fn test_close_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("still.png");
        write_test_image(&path, 20, 20, [0, 0, 0]);

        let mut source = ImageSequenceSource::new(&path);
        source.open().unwrap();
        source.close();
        source.close();
        assert!(source.pulls().next().unwrap().is_err());
    }
}
