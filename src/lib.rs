//! Beatreel renders beat-synchronized slideshow videos from pairs of photographs.
//!
//! A render runs in fixed stages:
//!
//! - Pair primary and secondary images and composite each pair into one frame
//! - Track the beats of a soundtrack and turn them into per-frame display durations
//! - Assemble the frames (plus a closing end card) into a timeline
//! - Fit the soundtrack to the timeline and encode an MP4 through `ffmpeg`
//!
//! [`Pipeline`] drives all of it from a [`PipelineConfig`]; each stage is also usable on its own.
#![forbid(unsafe_code)]

mod foundation;

pub mod assets;
pub mod audio;
pub mod compose;
pub mod config;
pub mod encode;
pub mod endcard;
pub mod pipeline;
pub mod timeline;

pub use crate::foundation::core::{Canvas, Fps, FrameIndex};
pub use crate::foundation::error::{ReelError, ReelResult};

pub use crate::audio::{
    AudioReconciler, BeatTimeline, BeatTracker, BeatTrackerConfig, DurationSequence,
    ReconciledAudio, convert_to_durations,
};
pub use crate::compose::{
    CompositeReport, CompositedFrame, CompositorConfig, FrameCompositor, ImagePair, pair_images,
};
pub use crate::config::{AssetPaths, AudioConfig, EncoderConfig, PipelineConfig, RenderMode};
pub use crate::encode::{Encoder, FfmpegSink, FfmpegSinkOpts, FrameSink, RenderedVideo};
pub use crate::endcard::{EndCardConfig, EndCardGenerator};
pub use crate::pipeline::{Pipeline, RenderRequest, cleanup_work_dir};
pub use crate::timeline::{AssembledTimeline, Ease, TimelineAssembler, TimelineConfig};
