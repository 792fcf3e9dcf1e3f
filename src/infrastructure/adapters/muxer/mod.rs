//! Muxer Adapter

mod ffmpeg_muxer;

pub use ffmpeg_muxer::{FfmpegMuxer, FfmpegMuxerConfig};
