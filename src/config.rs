//! Explicit configuration for one pipeline instance.
//!
//! Every tunable the stages need lives here and is handed to [`crate::Pipeline::new`]; no stage
//! reads paths or constants from the environment.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::audio::beats::BeatTrackerConfig;
use crate::compose::CompositorConfig;
use crate::endcard::EndCardConfig;
use crate::foundation::error::{ReelError, ReelResult};
use crate::timeline::TimelineConfig;

/// How the assembled timeline is paced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Whole timeline eased into a fixed target duration.
    #[default]
    #[serde(alias = "classic")]
    Compact,
    /// Every frame shown for its beat duration.
    #[serde(alias = "modern")]
    Natural,
}

impl RenderMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Natural => "natural",
        }
    }
}

impl std::fmt::Display for RenderMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RenderMode {
    type Err = ReelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" | "classic" => Ok(Self::Compact),
            "natural" | "modern" => Ok(Self::Natural),
            other => Err(ReelError::validation(format!(
                "unknown render mode '{other}' (expected compact|natural)"
            ))),
        }
    }
}

/// Fixed assets every render reads.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AssetPaths {
    /// Border mask multiplied into every secondary image.
    pub mask: PathBuf,
    pub end_card_template: PathBuf,
    pub caption_font: PathBuf,
    pub end_card_font: PathBuf,
    /// Track used when a request names no audio file.
    pub default_song: Option<PathBuf>,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            mask: PathBuf::from("static/images/secondary_image_outline.png"),
            end_card_template: PathBuf::from("static/images/endCard_template.jpg"),
            caption_font: PathBuf::from("static/fonts/Inter-Bold.ttf"),
            end_card_font: PathBuf::from("static/fonts/Inter-SemiBold.ttf"),
            default_song: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Decode rate for both beat tracking and the muxed track.
    pub sample_rate: u32,
    pub channels: u16,
    pub fade_out_secs: f64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            channels: 2,
            fade_out_secs: 3.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Upper bound on encoder worker threads.
    pub threads: u32,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self { threads: 4 }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub assets: AssetPaths,
    /// Scratch directory for composited frames and the end card.
    pub work_dir: PathBuf,
    pub compositor: CompositorConfig,
    pub end_card: EndCardConfig,
    pub beats: BeatTrackerConfig,
    pub timeline: TimelineConfig,
    pub audio: AudioConfig,
    pub encoder: EncoderConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            assets: AssetPaths::default(),
            work_dir: PathBuf::from("content/work"),
            compositor: CompositorConfig::default(),
            end_card: EndCardConfig::default(),
            beats: BeatTrackerConfig::default(),
            timeline: TimelineConfig::default(),
            audio: AudioConfig::default(),
            encoder: EncoderConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Read a JSON config; omitted fields take their defaults.
    pub fn from_json_path(path: impl AsRef<Path>) -> ReelResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            ReelError::validation(format!("open config JSON '{}': {e}", path.display()))
        })?;
        let cfg: Self = serde_json::from_reader(BufReader::new(f)).map_err(|e| {
            ReelError::validation(format!("parse config JSON '{}': {e}", path.display()))
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> ReelResult<()> {
        self.compositor.validate()?;
        self.end_card.validate()?;
        self.beats.validate()?;
        self.timeline.validate()?;

        if self.audio.sample_rate == 0 || self.audio.channels == 0 {
            return Err(ReelError::validation(
                "audio sample_rate and channels must be non-zero",
            ));
        }
        if !self.audio.fade_out_secs.is_finite() || self.audio.fade_out_secs < 0.0 {
            return Err(ReelError::validation(
                "audio fade_out_secs must be finite and >= 0",
            ));
        }
        if self.encoder.threads == 0 {
            return Err(ReelError::validation("encoder threads must be >= 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
