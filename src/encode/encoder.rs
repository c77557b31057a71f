use std::path::{Path, PathBuf};

use super::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
use super::sink::{AudioInputConfig, FrameSink, SinkConfig};
use crate::audio::ReconciledAudio;
use crate::config::PipelineConfig;
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{ReelError, ReelResult};
use crate::timeline::{AssembledTimeline, AssemblyStats, FrameLoader, TimelineAssembler};

/// A finished render on disk.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedVideo {
    pub path: PathBuf,
    pub duration_secs: f64,
    pub frames_encoded: u64,
    /// Photograph frames in the video, end card excluded.
    pub composited_frames: usize,
    pub stats: AssemblyStats,
    /// Intermediate frames directory, when the render kept it.
    pub work_dir: Option<PathBuf>,
}

/// Muxes an assembled timeline with its reconciled audio into an MP4 via `ffmpeg`.
#[derive(Clone, Debug)]
pub struct Encoder {
    fps: Fps,
    threads: u32,
}

impl Encoder {
    pub fn new(fps: Fps, threads: u32) -> ReelResult<Self> {
        if threads == 0 {
            return Err(ReelError::validation("encoder threads must be >= 1"));
        }
        Ok(Self { fps, threads })
    }

    pub fn from_config(cfg: &PipelineConfig) -> ReelResult<Self> {
        Self::new(cfg.timeline.fps()?, cfg.encoder.threads)
    }

    /// Encode `timeline` to `out_path`, overwriting it.
    ///
    /// A failed encode leaves no file at `out_path`.
    #[tracing::instrument(skip_all, fields(out = %out_path.display()))]
    pub fn encode<L: FrameLoader>(
        &self,
        assembler: &TimelineAssembler,
        timeline: &AssembledTimeline,
        audio: &ReconciledAudio,
        canvas: Canvas,
        out_path: &Path,
        loader: &mut L,
    ) -> ReelResult<RenderedVideo> {
        let audio_path = std::env::temp_dir().join(format!(
            "beatreel_audio_{}_{}.f32le",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or(0)
        ));
        let _audio_tmp = TempFileGuard(Some(audio_path.clone()));
        audio.write_f32le(&audio_path)?;

        let cfg = SinkConfig {
            width: canvas.width,
            height: canvas.height,
            fps: self.fps,
            audio: Some(AudioInputConfig {
                path: audio_path,
                sample_rate: audio.sample_rate,
                channels: audio.channels,
            }),
        };
        let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(out_path).with_threads(self.threads));

        let result = stream(assembler, timeline, cfg, loader, &mut sink);
        drop(sink);
        let stats = match result {
            Ok(stats) => stats,
            Err(e) => {
                let _ = std::fs::remove_file(out_path);
                return Err(e);
            }
        };

        tracing::info!(frames = stats.frames_pushed, "video encoded");
        Ok(RenderedVideo {
            path: out_path.to_path_buf(),
            duration_secs: timeline.duration(),
            frames_encoded: stats.frames_pushed,
            composited_frames: timeline.photo_count(),
            stats,
            work_dir: None,
        })
    }
}

/// Begin `sink`, stream the timeline into it and finalize it.
pub(crate) fn stream<L: FrameLoader>(
    assembler: &TimelineAssembler,
    timeline: &AssembledTimeline,
    cfg: SinkConfig,
    loader: &mut L,
    sink: &mut dyn FrameSink,
) -> ReelResult<AssemblyStats> {
    sink.begin(cfg)?;
    let stats = assembler.render(timeline, loader, sink)?;
    sink.end()?;
    Ok(stats)
}

struct TempFileGuard(Option<PathBuf>);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/encoder.rs"]
mod tests;
