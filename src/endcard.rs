//! The closing "N memories and counting..." frame.

use std::path::Path;

use image::{RgbImage, RgbaImage};

use crate::assets::images::{open_image, write_jpeg};
use crate::assets::text::{TextBrushRgba8, TextLayoutEngine, TextPainter};
use crate::compose::CompositedFrame;
use crate::config::PipelineConfig;
use crate::foundation::error::{ReelError, ReelResult};

/// Order key of the end card. Sorts after any date or digit key; the assembler appends the card
/// last regardless.
pub const END_CARD_ORDER_KEY: &str = "~endcard";

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EndCardConfig {
    pub font_px: f32,
    /// Downward shift of the text from the vertically centered position.
    pub offset_y_px: i32,
    pub duration_secs: f64,
    pub jpeg_quality: u8,
}

impl Default for EndCardConfig {
    fn default() -> Self {
        Self {
            font_px: 50.0,
            offset_y_px: 110,
            duration_secs: 3.0,
            jpeg_quality: 90,
        }
    }
}

impl EndCardConfig {
    pub fn validate(&self) -> ReelResult<()> {
        if !self.font_px.is_finite() || self.font_px <= 0.0 {
            return Err(ReelError::validation(
                "end card font_px must be finite and > 0",
            ));
        }
        if !self.duration_secs.is_finite() || self.duration_secs <= 0.0 {
            return Err(ReelError::validation(
                "end card duration_secs must be finite and > 0",
            ));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ReelError::validation(
                "end card jpeg_quality must be in 1..=100",
            ));
        }
        Ok(())
    }
}

pub fn end_card_text(count: usize) -> String {
    format!("{count} memories and counting...")
}

pub struct EndCardGenerator {
    config: EndCardConfig,
    template: RgbaImage,
    font: Vec<u8>,
}

impl EndCardGenerator {
    pub fn new(template: RgbaImage, font: Vec<u8>, config: EndCardConfig) -> ReelResult<Self> {
        config.validate()?;
        if template.width() == 0 || template.height() == 0 {
            return Err(ReelError::validation("end card template must be non-empty"));
        }
        Ok(Self {
            config,
            template,
            font,
        })
    }

    pub fn from_config(cfg: &PipelineConfig) -> ReelResult<Self> {
        let template = open_image(&cfg.assets.end_card_template)?.to_rgba8();
        let path = &cfg.assets.end_card_font;
        let font = std::fs::read(path).map_err(|e| {
            ReelError::validation(format!("read end card font '{}': {e}", path.display()))
        })?;
        Self::new(template, font, cfg.end_card.clone())
    }

    pub fn duration_secs(&self) -> f64 {
        self.config.duration_secs
    }

    /// Render the card for `count` source photographs.
    pub fn render(&self, count: usize) -> ReelResult<RgbImage> {
        let text = end_card_text(count);
        let layout = TextLayoutEngine::new().layout_plain(
            &text,
            &self.font,
            self.config.font_px,
            TextBrushRgba8::WHITE,
        )?;

        let mut card = self.template.clone();
        for p in card.pixels_mut() {
            p.0[3] = 255;
        }
        let (w, h) = card.dimensions();
        let tw = f64::from(layout.width()).ceil();
        let th = f64::from(layout.height()).ceil();
        let x = ((f64::from(w) - tw) / 2.0).floor();
        let y = ((f64::from(h) - th) / 2.0).floor() + f64::from(self.config.offset_y_px);

        TextPainter::new(&self.font).paint(&mut card, &layout, (x, y), None)?;
        Ok(image::DynamicImage::ImageRgba8(card).to_rgb8())
    }

    /// Render the card and write it as `endcard.jpg` in `out_dir`.
    #[tracing::instrument(skip(self, out_dir))]
    pub fn write(&self, count: usize, out_dir: &Path) -> ReelResult<CompositedFrame> {
        let card = self.render(count)?;
        let path = out_dir.join("endcard.jpg");
        write_jpeg(&card, &path, self.config.jpeg_quality)?;
        tracing::debug!(path = %path.display(), "end card written");
        Ok(CompositedFrame {
            path,
            order_key: END_CARD_ORDER_KEY.to_owned(),
        })
    }
}

#[cfg(test)]
#[path = "../tests/unit/endcard.rs"]
mod tests;
