use super::beats::BeatTimeline;
use crate::foundation::error::{ReelError, ReelResult};

/// Consecutive differences of `beats`: `N` timestamps give `N - 1` durations.
pub fn convert_to_durations(beats: &BeatTimeline) -> Vec<f64> {
    beats.times().windows(2).map(|w| w[1] - w[0]).collect()
}

/// Per-frame display durations in seconds, at least one per frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DurationSequence(Vec<f64>);

impl DurationSequence {
    /// Durations between beats, cyclically padded to cover `frame_count` frames.
    pub fn from_beats(beats: &BeatTimeline, frame_count: usize) -> ReelResult<Self> {
        let diffs = convert_to_durations(beats);
        if diffs.is_empty() {
            return Err(ReelError::insufficient_beats(format!(
                "{} beat(s) give no durations",
                beats.len()
            )));
        }
        Self::pad_cyclic(diffs, frame_count)
    }

    /// Append copies of the whole sequence, the last one truncated, until it covers
    /// `frame_count` entries. Sequences that are already long enough are kept as is.
    pub fn pad_cyclic(durations: Vec<f64>, frame_count: usize) -> ReelResult<Self> {
        if durations.is_empty() {
            return Err(ReelError::insufficient_beats("no durations to repeat"));
        }
        if durations.iter().any(|d| !d.is_finite() || *d < 0.0) {
            return Err(ReelError::invalid_duration(
                "durations must be finite and non-negative",
            ));
        }

        let pattern_len = durations.len();
        let mut out = durations;
        if out.len() < frame_count {
            tracing::debug!(
                pattern_len,
                frame_count,
                "padding durations by cyclic repetition"
            );
            out.reserve(frame_count - out.len());
            while out.len() < frame_count {
                let i = out.len() % pattern_len;
                out.push(out[i]);
            }
        }
        Ok(Self(out))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/durations.rs"]
mod tests;
