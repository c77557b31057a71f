use std::borrow::Borrow;

use image::RgbImage;

use super::TimelineClip;
use crate::assets::images::{fit_to_canvas, open_image};
use crate::foundation::core::Canvas;
use crate::foundation::error::ReelResult;

/// Source of decoded clip frames for [`super::TimelineAssembler::render`].
///
/// Returned frames are held until their batch is released, so `Drop` on `Frame` marks the end
/// of a decoded buffer's life.
pub trait FrameLoader {
    type Frame: Borrow<RgbImage>;

    fn load(&mut self, clip: &TimelineClip) -> ReelResult<Self::Frame>;
}

/// Decodes clip images from disk and letterboxes them onto the output canvas.
#[derive(Clone, Copy, Debug)]
pub struct DiskFrameLoader {
    canvas: Canvas,
}

impl DiskFrameLoader {
    pub fn new(canvas: Canvas) -> Self {
        Self { canvas }
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }
}

impl FrameLoader for DiskFrameLoader {
    type Frame = RgbImage;

    fn load(&mut self, clip: &TimelineClip) -> ReelResult<RgbImage> {
        let img = open_image(&clip.path)?.to_rgb8();
        Ok(fit_to_canvas(&img, self.canvas))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/loader.rs"]
mod tests;
