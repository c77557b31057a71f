use std::f32::consts::PI;

use anyhow::Context as _;
use realfft::RealFftPlanner;

use crate::foundation::error::{ReelError, ReelResult};

/// Ordered beat timestamps in seconds.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BeatTimeline(Vec<f64>);

impl BeatTimeline {
    /// Wrap timestamps after checking they are finite and non-decreasing.
    pub fn new(times: Vec<f64>) -> ReelResult<Self> {
        if times.iter().any(|t| !t.is_finite()) {
            return Err(ReelError::validation("beat timestamps must be finite"));
        }
        if times.windows(2).any(|w| w[1] < w[0]) {
            return Err(ReelError::validation(
                "beat timestamps must be non-decreasing",
            ));
        }
        Ok(Self(times))
    }

    pub fn times(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BeatTrackerConfig {
    /// STFT window length in samples.
    pub frame_size: usize,
    pub hop_size: usize,
    /// Center of the tempo prior.
    pub start_bpm: f64,
    /// How strictly beat spacing must follow the estimated period.
    pub tightness: f64,
    pub min_bpm: f64,
    pub max_bpm: f64,
}

impl Default for BeatTrackerConfig {
    fn default() -> Self {
        Self {
            frame_size: 2048,
            hop_size: 512,
            start_bpm: 120.0,
            tightness: 100.0,
            min_bpm: 30.0,
            max_bpm: 300.0,
        }
    }
}

impl BeatTrackerConfig {
    pub fn validate(&self) -> ReelResult<()> {
        if self.frame_size < 2 || self.hop_size == 0 {
            return Err(ReelError::validation(
                "beat tracker frame_size must be >= 2 and hop_size >= 1",
            ));
        }
        let bpm_ok = |v: f64| v.is_finite() && v > 0.0;
        if !bpm_ok(self.start_bpm) || !bpm_ok(self.min_bpm) || !bpm_ok(self.max_bpm) {
            return Err(ReelError::validation(
                "beat tracker bpm values must be finite and > 0",
            ));
        }
        if self.min_bpm >= self.max_bpm {
            return Err(ReelError::validation(
                "beat tracker min_bpm must be below max_bpm",
            ));
        }
        if !self.tightness.is_finite() || self.tightness < 0.0 {
            return Err(ReelError::validation(
                "beat tracker tightness must be finite and >= 0",
            ));
        }
        Ok(())
    }
}

/// Onset-envelope beat tracker: spectral flux, autocorrelation tempo estimate, then dynamic
/// programming over the envelope to place beats one period apart.
#[derive(Clone, Debug)]
pub struct BeatTracker {
    config: BeatTrackerConfig,
}

impl BeatTracker {
    pub fn new(config: BeatTrackerConfig) -> ReelResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &BeatTrackerConfig {
        &self.config
    }

    #[tracing::instrument(skip(self, mono), fields(samples = mono.len()))]
    pub fn track(&self, mono: &[f32], sample_rate: u32) -> ReelResult<BeatTimeline> {
        if sample_rate == 0 {
            return Err(ReelError::validation("sample_rate must be non-zero"));
        }
        if mono.len() < self.config.frame_size {
            return Err(ReelError::insufficient_beats(format!(
                "audio too short for analysis ({} samples)",
                mono.len()
            )));
        }

        let onset = onset_envelope(mono, self.config.frame_size, self.config.hop_size)?;
        let frame_rate = f64::from(sample_rate) / self.config.hop_size as f64;

        let bpm = estimate_tempo_bpm(&onset, frame_rate, &self.config)?;
        let period = (60.0 * frame_rate / bpm).round().max(1.0);
        tracing::debug!(bpm, period_frames = period, "tempo estimated");

        let local = local_score(&onset, period);
        let frames = track_dp(&local, period, self.config.tightness);
        let frames = trim_weak_beats(&local, frames);

        if frames.len() < 2 {
            return Err(ReelError::insufficient_beats(format!(
                "detected {} beat(s), need at least 2",
                frames.len()
            )));
        }

        let hop_secs = self.config.hop_size as f64 / f64::from(sample_rate);
        let times = frames.iter().map(|&f| f as f64 * hop_secs).collect();
        tracing::info!(bpm, beats = frames.len(), "beats tracked");
        BeatTimeline::new(times)
    }
}

/// Half-wave rectified log-magnitude spectral flux, one value per hop, scaled to unit
/// standard deviation.
///
/// Frames are centered on `frame * hop` (the signal is zero-padded by half a window on each
/// side), so frame indices convert directly to timestamps.
pub(crate) fn onset_envelope(
    mono: &[f32],
    frame_size: usize,
    hop_size: usize,
) -> ReelResult<Vec<f64>> {
    let pad = frame_size / 2;
    let n_frames = 1 + mono.len() / hop_size;
    let sample_at = |i: usize| -> f32 {
        i.checked_sub(pad)
            .and_then(|j| mono.get(j))
            .copied()
            .unwrap_or(0.0)
    };

    let mut planner = RealFftPlanner::<f32>::new();
    let plan = planner.plan_fft_forward(frame_size);
    let mut input = plan.make_input_vec();
    let mut spectrum = plan.make_output_vec();
    let mut scratch = plan.make_scratch_vec();
    let window: Vec<f32> = (0..frame_size).map(|i| hann_value(i, frame_size)).collect();

    let mut prev: Vec<f32> = vec![0.0; spectrum.len()];
    let mut cur: Vec<f32> = vec![0.0; spectrum.len()];
    let mut onset = Vec::with_capacity(n_frames);

    for frame in 0..n_frames {
        let start = frame * hop_size;
        for (i, slot) in input.iter_mut().enumerate() {
            *slot = sample_at(start + i) * window[i];
        }
        plan.process_with_scratch(&mut input, &mut spectrum, &mut scratch)
            .context("stft frame failed")?;

        for (c, bin) in cur.iter_mut().zip(&spectrum) {
            *c = (1.0 + 100.0 * bin.norm()).ln();
        }
        let flux = if frame == 0 {
            0.0
        } else {
            cur.iter()
                .zip(&prev)
                .map(|(c, p)| f64::from((c - p).max(0.0)))
                .sum::<f64>()
                / cur.len() as f64
        };
        onset.push(flux);
        std::mem::swap(&mut prev, &mut cur);
    }

    let std = std_dev(&onset);
    if std <= 1e-12 {
        return Err(ReelError::insufficient_beats(
            "onset envelope is flat (no rhythmic content)",
        ));
    }
    for v in &mut onset {
        *v /= std;
    }
    Ok(onset)
}

/// Tempo estimate in BPM from the onset envelope autocorrelation.
///
/// Each candidate lag in `[min_bpm, max_bpm]` is scored by `ln(1 + 1e6 * ac)` plus a
/// log-normal prior (one octave wide) centered on `start_bpm`.
pub fn estimate_tempo_bpm(
    onset: &[f64],
    frame_rate: f64,
    config: &BeatTrackerConfig,
) -> ReelResult<f64> {
    let n = onset.len();
    let min_lag = ((60.0 * frame_rate / config.max_bpm).ceil() as usize).max(1);
    let max_lag = ((60.0 * frame_rate / config.min_bpm).floor() as usize).min(n.saturating_sub(1));
    if min_lag > max_lag {
        return Err(ReelError::insufficient_beats(
            "audio too short to estimate tempo",
        ));
    }

    let ac0: f64 = onset.iter().map(|v| v * v).sum();
    if ac0 <= 0.0 {
        return Err(ReelError::insufficient_beats("onset envelope is silent"));
    }

    let mut best: Option<(f64, f64)> = None;
    for lag in min_lag..=max_lag {
        let ac: f64 = onset[..n - lag]
            .iter()
            .zip(&onset[lag..])
            .map(|(a, b)| a * b)
            .sum::<f64>()
            / ac0;
        let bpm = 60.0 * frame_rate / lag as f64;
        let prior = -0.5 * (bpm.log2() - config.start_bpm.log2()).powi(2);
        let score = (1.0 + 1e6 * ac.max(0.0)).ln() + prior;
        if best.is_none_or(|(s, _)| score > s) {
            best = Some((score, bpm));
        }
    }

    best.map(|(_, bpm)| bpm)
        .ok_or_else(|| ReelError::insufficient_beats("no tempo candidate"))
}

fn local_score(onset: &[f64], period: f64) -> Vec<f64> {
    let half = period as isize;
    let kernel: Vec<f64> = (-half..=half)
        .map(|d| (-0.5 * (d as f64 * 32.0 / period).powi(2)).exp())
        .collect();

    let n = onset.len() as isize;
    (0..n)
        .map(|i| {
            kernel
                .iter()
                .zip(-half..=half)
                .filter_map(|(w, d)| {
                    let j = i + d;
                    (0..n).contains(&j).then(|| w * onset[j as usize])
                })
                .sum()
        })
        .collect()
}

fn track_dp(local: &[f64], period: f64, tightness: f64) -> Vec<usize> {
    let n = local.len();
    if n == 0 {
        return Vec::new();
    }
    let far = (2.0 * period).round() as usize;
    let near = (period / 2.0).round().max(1.0) as usize;
    let threshold = 0.01 * local.iter().copied().fold(f64::MIN, f64::max);

    let mut cumscore = vec![0.0; n];
    let mut backlink: Vec<Option<usize>> = vec![None; n];
    let mut first_beat = true;

    for i in 0..n {
        let mut best: Option<(f64, usize)> = None;
        if i >= near {
            for loc in i.saturating_sub(far)..=i - near {
                let gap = (i - loc) as f64;
                let score = cumscore[loc] - tightness * (gap / period).ln().powi(2);
                if best.is_none_or(|(s, _)| score > s) {
                    best = Some((score, loc));
                }
            }
        }

        cumscore[i] = local[i] + best.map_or(0.0, |(s, _)| s);
        if first_beat && local[i] < threshold {
            backlink[i] = None;
        } else {
            backlink[i] = best.map(|(_, loc)| loc);
            first_beat = false;
        }
    }

    let Some(mut beat) = last_beat(&cumscore) else {
        return Vec::new();
    };
    let mut beats = vec![beat];
    while let Some(prev) = backlink[beat] {
        beats.push(prev);
        beat = prev;
    }
    beats.reverse();
    beats
}

/// Last local maximum of the cumulative score that reaches half the median local maximum.
fn last_beat(cumscore: &[f64]) -> Option<usize> {
    let n = cumscore.len();
    let is_max = |i: usize| {
        let left = if i == 0 { cumscore[0] } else { cumscore[i - 1] };
        let right = if i + 1 == n { cumscore[i] } else { cumscore[i + 1] };
        cumscore[i] > left && cumscore[i] >= right
    };
    let maxima: Vec<usize> = (0..n).filter(|&i| is_max(i)).collect();
    if maxima.is_empty() {
        return None;
    }

    let mut values: Vec<f64> = maxima.iter().map(|&i| cumscore[i]).collect();
    values.sort_by(f64::total_cmp);
    let median = values[values.len() / 2];
    maxima
        .into_iter()
        .rev()
        .find(|&i| cumscore[i] >= 0.5 * median)
}

fn trim_weak_beats(local: &[f64], beats: Vec<usize>) -> Vec<usize> {
    if beats.is_empty() {
        return beats;
    }
    let rms = (beats.iter().map(|&b| local[b].powi(2)).sum::<f64>() / beats.len() as f64).sqrt();
    let threshold = 0.5 * rms;

    let start = beats.iter().position(|&b| local[b] >= threshold);
    let end = beats.iter().rposition(|&b| local[b] >= threshold);
    match (start, end) {
        (Some(s), Some(e)) => beats[s..=e].to_vec(),
        _ => Vec::new(),
    }
}

fn hann_value(index: usize, len: usize) -> f32 {
    if len <= 1 {
        return 1.0;
    }

    0.5 - 0.5 * ((2.0 * PI * index as f32) / (len as f32 - 1.0)).cos()
}

fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}

#[cfg(test)]
#[path = "../../tests/unit/audio/beats.rs"]
mod tests;
