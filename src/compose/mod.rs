//! Turning primary/secondary photograph pairs into single composited frames.

mod frame;
mod pair;

pub use frame::{CompositeReport, CompositedFrame, CompositorConfig, FrameCompositor};
pub use pair::{ImagePair, pair_images, sequence_key};
