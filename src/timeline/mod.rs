//! Beat-paced timeline of composited frames, streamed to a sink in bounded-size batches.

mod assemble;
pub mod ease;
mod loader;

use std::ops::Range;
use std::path::PathBuf;

pub use assemble::{AssemblyStats, TimelineAssembler};
pub use ease::Ease;
pub use loader::{DiskFrameLoader, FrameLoader};

use crate::config::RenderMode;
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{ReelError, ReelResult};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Maximum number of decoded frames held at once while rendering.
    pub batch_size: usize,
    pub fps: u32,
    /// Output length of a compact-mode render.
    pub compact_target_secs: f64,
    pub compact_ease: Ease,
    /// Output size. When unset, the first composited frame's size rounded down to even.
    pub canvas: Option<Canvas>,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            fps: 24,
            compact_target_secs: 30.0,
            compact_ease: Ease::InOutQuad,
            canvas: None,
        }
    }
}

impl TimelineConfig {
    pub fn validate(&self) -> ReelResult<()> {
        if self.batch_size == 0 {
            return Err(ReelError::validation("timeline batch_size must be >= 1"));
        }
        if self.fps == 0 {
            return Err(ReelError::validation("timeline fps must be >= 1"));
        }
        if !self.compact_target_secs.is_finite() || self.compact_target_secs <= 0.0 {
            return Err(ReelError::validation(
                "timeline compact_target_secs must be finite and > 0",
            ));
        }
        if let Some(c) = self.canvas
            && (c.width == 0 || c.height == 0 || !c.is_even())
        {
            return Err(ReelError::validation(
                "timeline canvas must be non-zero with even dimensions",
            ));
        }
        Ok(())
    }

    pub fn fps(&self) -> ReelResult<Fps> {
        Fps::integer(self.fps)
    }
}

/// One frame's slot on the natural (unretimed) timeline.
#[derive(Clone, Debug, PartialEq)]
pub struct TimelineClip {
    pub path: PathBuf,
    pub order_key: String,
    pub start_secs: f64,
    pub duration_secs: f64,
    pub is_end_card: bool,
}

impl TimelineClip {
    pub fn end_secs(&self) -> f64 {
        self.start_secs + self.duration_secs
    }
}

/// A run of consecutive clips decoded together and released together.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimelineBatch {
    pub clips: Range<usize>,
}

impl TimelineBatch {
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

/// Maps output time onto natural timeline time through an easing curve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Retime {
    pub source_duration: f64,
    pub target_duration: f64,
    pub ease: Ease,
}

impl Retime {
    pub fn source_time(&self, output_secs: f64) -> f64 {
        self.source_duration * self.ease.apply(output_secs / self.target_duration)
    }
}

/// Ordered clips (end card last), their batches and the output duration.
#[derive(Clone, Debug, PartialEq)]
pub struct AssembledTimeline {
    clips: Vec<TimelineClip>,
    batches: Vec<TimelineBatch>,
    natural_duration: f64,
    duration: f64,
    retime: Option<Retime>,
    mode: RenderMode,
}

impl AssembledTimeline {
    pub fn clips(&self) -> &[TimelineClip] {
        &self.clips
    }

    pub fn batches(&self) -> &[TimelineBatch] {
        &self.batches
    }

    /// Sum of every clip duration, end card included.
    pub fn natural_duration(&self) -> f64 {
        self.natural_duration
    }

    /// Output duration: natural, or the compact target.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn retime(&self) -> Option<&Retime> {
        self.retime.as_ref()
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Number of photograph frames, end card excluded.
    pub fn photo_count(&self) -> usize {
        self.clips.iter().filter(|c| !c.is_end_card).count()
    }

    pub fn frame_count(&self, fps: Fps) -> u64 {
        fps.secs_to_frames_round(self.duration)
    }

    pub fn source_time_at(&self, output_secs: f64) -> f64 {
        match &self.retime {
            Some(r) => r.source_time(output_secs),
            None => output_secs,
        }
    }

    /// Index of the clip showing at natural time `t`. Times past the end map to the last clip.
    pub fn clip_at_source_time(&self, t: f64) -> usize {
        let idx = self.clips.partition_point(|c| c.end_secs() <= t);
        idx.min(self.clips.len().saturating_sub(1))
    }

    pub fn batch_of_clip(&self, clip: usize) -> usize {
        let idx = self.batches.partition_point(|b| b.clips.end <= clip);
        idx.min(self.batches.len().saturating_sub(1))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/mod.rs"]
mod tests;
