use std::path::Path;

use crate::assets::media::{AudioPcm, write_f32le_file};
use crate::foundation::error::{ReelError, ReelResult};

/// Audio cut or looped to exactly the timeline length, with the tail faded out.
#[derive(Clone, Debug, PartialEq)]
pub struct ReconciledAudio {
    pub sample_rate: u32,
    pub channels: u16,
    pub interleaved_f32: Vec<f32>,
}

impl ReconciledAudio {
    pub fn frames(&self) -> usize {
        self.interleaved_f32.len() / usize::from(self.channels.max(1))
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / f64::from(self.sample_rate.max(1))
    }

    /// Write raw interleaved little-endian `f32` PCM, the format the encoder consumes.
    pub fn write_f32le(&self, path: &Path) -> ReelResult<()> {
        write_f32le_file(&self.interleaved_f32, path)
    }
}

#[derive(Clone, Debug)]
pub struct AudioReconciler {
    fade_out_secs: f64,
}

impl Default for AudioReconciler {
    fn default() -> Self {
        Self { fade_out_secs: 3.0 }
    }
}

impl AudioReconciler {
    pub fn new(fade_out_secs: f64) -> ReelResult<Self> {
        if !fade_out_secs.is_finite() || fade_out_secs < 0.0 {
            return Err(ReelError::validation(
                "fade_out_secs must be finite and >= 0",
            ));
        }
        Ok(Self { fade_out_secs })
    }

    /// Fit `audio` to `target_secs`: loop from the start when it is shorter, cut when it is
    /// longer, then fade the last `min(fade_out_secs, target_secs)` seconds to silence.
    #[tracing::instrument(skip(self, audio), fields(source_secs = audio.duration_secs()))]
    pub fn reconcile(&self, audio: &AudioPcm, target_secs: f64) -> ReelResult<ReconciledAudio> {
        if !target_secs.is_finite() || target_secs <= 0.0 {
            return Err(ReelError::invalid_duration(format!(
                "target duration must be finite and > 0, got {target_secs}"
            )));
        }
        let src_frames = audio.frames();
        if src_frames == 0 || audio.sample_rate == 0 {
            return Err(ReelError::invalid_duration(
                "audio track is empty; nothing to fit to the timeline",
            ));
        }

        let ch = usize::from(audio.channels);
        let sr = f64::from(audio.sample_rate);
        let out_frames = (target_secs * sr).round() as usize;
        if out_frames == 0 {
            return Err(ReelError::invalid_duration(format!(
                "target duration {target_secs}s is shorter than one sample"
            )));
        }

        if src_frames < out_frames {
            tracing::warn!(
                source_secs = audio.duration_secs(),
                target_secs,
                "audio is shorter than the timeline; looping"
            );
        } else {
            tracing::info!(target_secs, "trimming audio to the timeline");
        }

        let mut out = Vec::with_capacity(out_frames * ch);
        for i in 0..out_frames {
            let s = (i % src_frames) * ch;
            out.extend_from_slice(&audio.interleaved_f32[s..s + ch]);
        }

        let fade_frames = (self.fade_out_secs.min(target_secs) * sr).round() as usize;
        if fade_frames > 0 {
            let start = out_frames.saturating_sub(fade_frames);
            for i in start..out_frames {
                let gain = ((out_frames - 1 - i) as f64 / fade_frames as f64).clamp(0.0, 1.0) as f32;
                for s in &mut out[i * ch..(i + 1) * ch] {
                    *s *= gain;
                }
            }
        }

        Ok(ReconciledAudio {
            sample_rate: audio.sample_rate,
            channels: audio.channels,
            interleaved_f32: out,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/reconcile.rs"]
mod tests;
