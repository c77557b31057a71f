//! Encoding sinks and the MP4 encoder.
//!
//! Sinks consume output frames in timeline order. The production sink pipes raw frames into the
//! system `ffmpeg` binary.

mod encoder;
pub mod ffmpeg;
pub mod sink;

pub use encoder::{Encoder, RenderedVideo};
pub use ffmpeg::{FfmpegSink, FfmpegSinkOpts, is_ffmpeg_on_path};
pub use sink::{AudioInputConfig, FrameSink, InMemorySink, SinkConfig};
