pub mod ffmpeg_device_source;
pub mod ffmpeg_file_source;
pub mod image_sequence_source;
mod rgb_decoder;
pub mod source_factory;
