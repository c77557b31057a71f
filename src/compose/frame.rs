use std::path::{Path, PathBuf};

use anyhow::Context as _;
use image::{DynamicImage, RgbImage, RgbaImage, imageops::FilterType};

use super::pair::ImagePair;
use crate::assets::images::{open_image, write_jpeg};
use crate::assets::text::{Backdrop, TextBrushRgba8, TextLayoutEngine, TextPainter};
use crate::config::PipelineConfig;
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::mul_div255_u8;

/// Layout and output knobs for [`FrameCompositor`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CompositorConfig {
    pub jpeg_quality: u8,
    /// Distance of the inset secondary from the primary's top-left corner.
    pub inset_offset_px: u32,
    /// The inset is `primary / inset_divisor` in each dimension.
    pub inset_divisor: u32,
    pub caption_font_px: f32,
    /// Gap between the caption's bottom edge and the frame bottom.
    pub caption_bottom_offset_px: u32,
    pub caption_backdrop_alpha: u8,
    pub caption_backdrop_radius_px: f64,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 90,
            inset_offset_px: 10,
            inset_divisor: 3,
            caption_font_px: 50.0,
            caption_bottom_offset_px: 50,
            caption_backdrop_alpha: 150,
            caption_backdrop_radius_px: 12.0,
        }
    }
}

impl CompositorConfig {
    pub fn validate(&self) -> ReelResult<()> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ReelError::validation(
                "compositor jpeg_quality must be in 1..=100",
            ));
        }
        if self.inset_divisor == 0 {
            return Err(ReelError::validation("compositor inset_divisor must be >= 1"));
        }
        if !self.caption_font_px.is_finite() || self.caption_font_px <= 0.0 {
            return Err(ReelError::validation(
                "compositor caption_font_px must be finite and > 0",
            ));
        }
        if !self.caption_backdrop_radius_px.is_finite() || self.caption_backdrop_radius_px < 0.0 {
            return Err(ReelError::validation(
                "compositor caption_backdrop_radius_px must be finite and >= 0",
            ));
        }
        Ok(())
    }
}

/// One composited frame written to disk, ordered by `order_key`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompositedFrame {
    pub path: PathBuf,
    pub order_key: String,
}

#[derive(Debug, Default)]
pub struct CompositeReport {
    /// Frames in input order.
    pub frames: Vec<CompositedFrame>,
    /// Pairs dropped because of a missing secondary or an undecodable image.
    pub skipped: usize,
}

/// Merges a primary and a secondary photograph into one frame.
///
/// The secondary is multiplied by the border mask, shrunk to a third of the primary and inset in
/// its top-left corner. An optional caption is centered near the bottom on a translucent
/// rounded backdrop. Output never carries transparency.
pub struct FrameCompositor {
    config: CompositorConfig,
    mask: RgbaImage,
    caption_font: Option<Vec<u8>>,
}

impl FrameCompositor {
    pub fn new(
        config: &CompositorConfig,
        mask: RgbaImage,
        caption_font: Option<Vec<u8>>,
    ) -> ReelResult<Self> {
        config.validate()?;
        if mask.width() == 0 || mask.height() == 0 {
            return Err(ReelError::validation("compositor mask must be non-empty"));
        }
        Ok(Self {
            config: config.clone(),
            mask,
            caption_font,
        })
    }

    /// Load the mask, and the caption font when `captions` is set, from the configured assets.
    pub fn from_config(cfg: &PipelineConfig, captions: bool) -> ReelResult<Self> {
        let mask = open_image(&cfg.assets.mask)?.to_rgba8();
        let caption_font = if captions {
            let path = &cfg.assets.caption_font;
            Some(std::fs::read(path).map_err(|e| {
                ReelError::validation(format!("read caption font '{}': {e}", path.display()))
            })?)
        } else {
            None
        };
        Self::new(&cfg.compositor, mask, caption_font)
    }

    pub fn composite(
        &self,
        primary: &DynamicImage,
        secondary: &DynamicImage,
        caption: Option<&str>,
    ) -> ReelResult<RgbImage> {
        let mut base = primary.to_rgba8();
        for p in base.pixels_mut() {
            p.0[3] = 255;
        }
        let (width, height) = base.dimensions();

        let mut inset = secondary.to_rgba8();
        self.apply_mask(&mut inset);

        let inset_w = width / self.config.inset_divisor;
        let inset_h = height / self.config.inset_divisor;
        if inset_w > 0 && inset_h > 0 {
            let inset = image::imageops::resize(&inset, inset_w, inset_h, FilterType::Triangle);
            let off = i64::from(self.config.inset_offset_px);
            image::imageops::overlay(&mut base, &inset, off, off);
        }

        if let Some(text) = caption {
            self.draw_caption(&mut base, text)?;
        }

        Ok(DynamicImage::ImageRgba8(base).to_rgb8())
    }

    #[tracing::instrument(skip(self, pair, out_dir), fields(key = %pair.sequence_key))]
    pub fn composite_pair(
        &self,
        pair: &ImagePair,
        show_caption: bool,
        out_dir: &Path,
    ) -> ReelResult<CompositedFrame> {
        let primary = open_image(&pair.primary)?;
        let secondary = open_image(&pair.secondary)?;
        let caption = show_caption.then_some(pair.sequence_key.as_str());
        let frame = self.composite(&primary, &secondary, caption)?;

        let stem = pair
            .primary
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(pair.sequence_key.as_str());
        let ext = pair
            .primary
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("img")
            .to_ascii_lowercase();
        let path = out_dir.join(format!("combined_{stem}_{ext}.jpg"));
        write_jpeg(&frame, &path, self.config.jpeg_quality)?;
        tracing::debug!(path = %path.display(), "composited frame written");

        Ok(CompositedFrame {
            path,
            order_key: stem.to_owned(),
        })
    }

    /// Composite every pair, skipping pairs that cannot be composited.
    ///
    /// Configuration problems (for example a caption without a caption font) still abort.
    #[tracing::instrument(skip_all, fields(pairs = pairs.len()))]
    pub fn composite_all(
        &self,
        pairs: Vec<ReelResult<ImagePair>>,
        show_caption: bool,
        out_dir: &Path,
    ) -> ReelResult<CompositeReport> {
        std::fs::create_dir_all(out_dir)
            .with_context(|| format!("failed to create work directory '{}'", out_dir.display()))?;

        let mut report = CompositeReport::default();
        for pair in pairs {
            let result = pair.and_then(|p| self.composite_pair(&p, show_caption, out_dir));
            match result {
                Ok(frame) => report.frames.push(frame),
                Err(e @ ReelError::Validation(_)) => return Err(e),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping image pair");
                    report.skipped += 1;
                }
            }
        }

        tracing::info!(
            composited = report.frames.len(),
            skipped = report.skipped,
            "compositing finished"
        );
        Ok(report)
    }

    fn apply_mask(&self, inset: &mut RgbaImage) {
        let resized;
        let mask = if self.mask.dimensions() == inset.dimensions() {
            &self.mask
        } else {
            resized = image::imageops::resize(
                &self.mask,
                inset.width(),
                inset.height(),
                FilterType::Triangle,
            );
            &resized
        };

        for (px, m) in inset.pixels_mut().zip(mask.pixels()) {
            for c in 0..4 {
                px.0[c] = mul_div255_u8(u16::from(px.0[c]), u16::from(m.0[c]));
            }
        }
    }

    fn draw_caption(&self, base: &mut RgbaImage, text: &str) -> ReelResult<()> {
        let font = self
            .caption_font
            .as_deref()
            .ok_or_else(|| ReelError::validation("caption requested without a caption font"))?;

        let layout = TextLayoutEngine::new().layout_plain(
            text,
            font,
            self.config.caption_font_px,
            TextBrushRgba8::WHITE,
        )?;
        let tw = f64::from(layout.width()).ceil();
        let th = f64::from(layout.height()).ceil();
        let (width, height) = base.dimensions();

        let x = ((f64::from(width) - tw) / 2.0).floor();
        let y = f64::from(height) - th - f64::from(self.config.caption_bottom_offset_px);

        let backdrop = Backdrop {
            rect: kurbo::Rect::new(x - 30.0, y - 15.0, x + tw + 30.0, y + th + 30.0),
            radius: self.config.caption_backdrop_radius_px,
            color: TextBrushRgba8 {
                r: 0,
                g: 0,
                b: 0,
                a: self.config.caption_backdrop_alpha,
            },
        };
        TextPainter::new(font).paint(base, &layout, (x, y), Some(&backdrop))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/frame.rs"]
mod tests;
