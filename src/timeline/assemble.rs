use std::borrow::Borrow;

use image::RgbImage;

use super::{AssembledTimeline, FrameLoader, Retime, TimelineBatch, TimelineClip, TimelineConfig};
use crate::audio::DurationSequence;
use crate::compose::CompositedFrame;
use crate::config::RenderMode;
use crate::encode::FrameSink;
use crate::foundation::core::{Canvas, FrameIndex};
use crate::foundation::error::{ReelError, ReelResult};

/// Counters from one [`TimelineAssembler::render`] pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AssemblyStats {
    pub frames_pushed: u64,
    pub batches_loaded: usize,
    /// Largest number of decoded clip frames held at once.
    pub peak_live_frames: usize,
}

pub struct TimelineAssembler {
    config: TimelineConfig,
}

impl TimelineAssembler {
    pub fn new(config: TimelineConfig) -> ReelResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    /// Order frames by key, pair them with durations and append the end card.
    ///
    /// Durations beyond the frame count are ignored. In compact mode the whole timeline, end
    /// card included, is eased into `compact_target_secs`.
    #[tracing::instrument(skip_all, fields(frames = frames.len(), mode = %mode))]
    pub fn assemble(
        &self,
        mut frames: Vec<CompositedFrame>,
        durations: &DurationSequence,
        end_card: CompositedFrame,
        end_card_secs: f64,
        mode: RenderMode,
    ) -> ReelResult<AssembledTimeline> {
        if frames.is_empty() {
            return Err(ReelError::NoFrames);
        }
        if durations.len() < frames.len() {
            return Err(ReelError::insufficient_beats(format!(
                "{} durations for {} frames",
                durations.len(),
                frames.len()
            )));
        }
        if !end_card_secs.is_finite() || end_card_secs <= 0.0 {
            return Err(ReelError::invalid_duration(format!(
                "end card duration must be finite and > 0, got {end_card_secs}"
            )));
        }

        frames.sort_by(|a, b| a.order_key.cmp(&b.order_key));

        let mut clips = Vec::with_capacity(frames.len() + 1);
        let mut start = 0.0;
        for (frame, &duration) in frames.into_iter().zip(durations.as_slice()) {
            clips.push(TimelineClip {
                path: frame.path,
                order_key: frame.order_key,
                start_secs: start,
                duration_secs: duration,
                is_end_card: false,
            });
            start += duration;
        }
        clips.push(TimelineClip {
            path: end_card.path,
            order_key: end_card.order_key,
            start_secs: start,
            duration_secs: end_card_secs,
            is_end_card: true,
        });
        let natural_duration = start + end_card_secs;

        let batch_size = self.config.batch_size;
        let batches: Vec<TimelineBatch> = (0..clips.len())
            .step_by(batch_size)
            .map(|s| TimelineBatch {
                clips: s..(s + batch_size).min(clips.len()),
            })
            .collect();

        let (duration, retime) = match mode {
            RenderMode::Natural => (natural_duration, None),
            RenderMode::Compact => {
                let target = self.config.compact_target_secs;
                let retime = Retime {
                    source_duration: natural_duration,
                    target_duration: target,
                    ease: self.config.compact_ease,
                };
                (target, Some(retime))
            }
        };

        tracing::info!(
            clips = clips.len(),
            batches = batches.len(),
            natural_duration,
            duration,
            "timeline assembled"
        );
        Ok(AssembledTimeline {
            clips,
            batches,
            natural_duration,
            duration,
            retime,
            mode,
        })
    }

    /// Output canvas: the configured one, or the first clip's size rounded down to even.
    pub fn resolve_canvas(&self, timeline: &AssembledTimeline) -> ReelResult<Canvas> {
        if let Some(canvas) = self.config.canvas {
            return Ok(canvas);
        }
        let first = timeline.clips().first().ok_or(ReelError::NoFrames)?;
        let (w, h) = image::image_dimensions(&first.path).map_err(|e| {
            ReelError::validation(format!(
                "read dimensions of '{}': {e}",
                first.path.display()
            ))
        })?;
        Canvas::new(w, h)?.even_floor()
    }

    /// Stream every output frame of `timeline` into `sink`, one batch of decoded clips at a time.
    ///
    /// The previous batch is released before the next is loaded, so at most `batch_size`
    /// decoded frames are alive. The sink must already be started.
    #[tracing::instrument(skip_all, fields(clips = timeline.clips().len()))]
    pub fn render<L: FrameLoader>(
        &self,
        timeline: &AssembledTimeline,
        loader: &mut L,
        sink: &mut dyn FrameSink,
    ) -> ReelResult<AssemblyStats> {
        let fps = self.config.fps()?;
        let total = timeline.frame_count(fps);
        let mut stats = AssemblyStats::default();
        let mut current: Option<(usize, Vec<L::Frame>)> = None;

        for k in 0..total {
            let source_t = timeline.source_time_at(fps.frames_to_secs(k));
            let clip = timeline.clip_at_source_time(source_t);
            let batch_idx = timeline.batch_of_clip(clip);

            if current.as_ref().map(|(b, _)| *b) != Some(batch_idx) {
                drop(current.take());
                let batch = &timeline.batches()[batch_idx];
                let mut frames = Vec::with_capacity(batch.len());
                for c in &timeline.clips()[batch.clips.clone()] {
                    frames.push(loader.load(c)?);
                }
                tracing::debug!(batch = batch_idx, frames = frames.len(), "batch loaded");
                stats.batches_loaded += 1;
                stats.peak_live_frames = stats.peak_live_frames.max(frames.len());
                current = Some((batch_idx, frames));
            }

            let Some((_, frames)) = current.as_ref() else {
                return Err(ReelError::Other(anyhow::anyhow!(
                    "batch {batch_idx} missing after load"
                )));
            };
            let offset = clip - timeline.batches()[batch_idx].clips.start;
            let image: &RgbImage = frames[offset].borrow();
            sink.push_frame(FrameIndex(k), image)?;
            stats.frames_pushed += 1;
        }

        tracing::info!(
            frames = stats.frames_pushed,
            batches = stats.batches_loaded,
            "timeline rendered"
        );
        Ok(stats)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/assemble.rs"]
mod tests;
