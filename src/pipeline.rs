//! One render, start to finish: pair, composite, track beats, assemble, fit audio, encode.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::assets::media::decode_audio_f32;
use crate::audio::{AudioReconciler, BeatTracker, DurationSequence};
use crate::compose::{FrameCompositor, pair_images};
use crate::config::{PipelineConfig, RenderMode};
use crate::encode::{Encoder, RenderedVideo};
use crate::endcard::EndCardGenerator;
use crate::foundation::error::{ReelError, ReelResult};
use crate::timeline::{DiskFrameLoader, TimelineAssembler};

/// What to render and where to put it.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderRequest {
    pub primary_dir: PathBuf,
    pub secondary_dir: PathBuf,
    /// Soundtrack. `None` uses the configured default song.
    pub audio: Option<PathBuf>,
    pub mode: RenderMode,
    pub show_caption: bool,
    pub output: PathBuf,
    /// Keep this render's intermediate frames instead of removing them afterwards.
    pub keep_work: bool,
}

static RENDER_SEQ: AtomicU64 = AtomicU64::new(0);

pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> ReelResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage in order. Nothing is written to `req.output` unless the whole render
    /// succeeds.
    ///
    /// Intermediates go to a fresh subdirectory of the configured work directory, so renders
    /// sharing a config never see each other's frames. That subdirectory is removed afterwards
    /// unless `req.keep_work` is set.
    #[tracing::instrument(skip_all, fields(out = %req.output.display(), mode = %req.mode))]
    pub fn render(&self, req: &RenderRequest) -> ReelResult<RenderedVideo> {
        let audio_path = self.validate_request(req)?;
        let work_dir = self.render_work_dir(req);

        let result = self.render_in(req, &audio_path, &work_dir);
        if req.keep_work {
            tracing::info!(path = %work_dir.display(), "keeping intermediate frames");
        } else if let Err(e) = cleanup_work_dir(&work_dir) {
            tracing::warn!(error = %e, "failed to remove intermediate frames");
        }

        let mut video = result?;
        video.work_dir = req.keep_work.then_some(work_dir);
        Ok(video)
    }

    /// Unique directory for one render's intermediates under the configured work directory.
    pub fn render_work_dir(&self, req: &RenderRequest) -> PathBuf {
        let stem = req
            .output
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("render");
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let seq = RENDER_SEQ.fetch_add(1, Ordering::Relaxed);
        self.config.work_dir.join(format!(
            "{stem}-{}-{nanos}-{seq}",
            std::process::id()
        ))
    }

    fn render_in(
        &self,
        req: &RenderRequest,
        audio_path: &Path,
        work_dir: &Path,
    ) -> ReelResult<RenderedVideo> {
        let cfg = &self.config;

        let compositor = FrameCompositor::from_config(cfg, req.show_caption)?;
        let end_cards = EndCardGenerator::from_config(cfg)?;
        let assembler = TimelineAssembler::new(cfg.timeline.clone())?;
        let tracker = BeatTracker::new(cfg.beats.clone())?;
        let reconciler = AudioReconciler::new(cfg.audio.fade_out_secs)?;
        let encoder = Encoder::from_config(cfg)?;

        let pairs = pair_images(&req.primary_dir, &req.secondary_dir)?;
        let report = compositor.composite_all(pairs, req.show_caption, work_dir)?;
        if report.frames.is_empty() {
            return Err(ReelError::NoFrames);
        }
        let count = report.frames.len();

        let audio = decode_audio_f32(audio_path, cfg.audio.sample_rate, cfg.audio.channels)?;
        let beats = tracker.track(&audio.to_mono(), audio.sample_rate)?;
        let durations = DurationSequence::from_beats(&beats, count)?;

        let end_card = end_cards.write(count, work_dir)?;
        let timeline = assembler.assemble(
            report.frames,
            &durations,
            end_card,
            end_cards.duration_secs(),
            req.mode,
        )?;

        let reconciled = reconciler.reconcile(&audio, timeline.duration())?;
        drop(audio);

        let canvas = assembler.resolve_canvas(&timeline)?;
        let mut loader = DiskFrameLoader::new(canvas);
        let video = encoder.encode(
            &assembler,
            &timeline,
            &reconciled,
            canvas,
            &req.output,
            &mut loader,
        )?;

        tracing::info!(
            frames = video.frames_encoded,
            photos = video.composited_frames,
            duration = video.duration_secs,
            "render finished"
        );
        Ok(video)
    }

    fn validate_request(&self, req: &RenderRequest) -> ReelResult<PathBuf> {
        for dir in [&req.primary_dir, &req.secondary_dir] {
            if !dir.is_dir() {
                return Err(ReelError::validation(format!(
                    "image directory '{}' does not exist",
                    dir.display()
                )));
            }
        }

        let audio = req
            .audio
            .clone()
            .or_else(|| self.config.assets.default_song.clone())
            .ok_or_else(|| {
                ReelError::validation("no audio file given and no default song configured")
            })?;
        if !audio.is_file() {
            return Err(ReelError::validation(format!(
                "audio file '{}' does not exist",
                audio.display()
            )));
        }
        Ok(audio)
    }
}

/// Remove a render's intermediate files. A directory that is already gone is not an error.
pub fn cleanup_work_dir(path: &Path) -> ReelResult<()> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => {
            tracing::info!(path = %path.display(), "removed work directory");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "work directory already absent");
            Ok(())
        }
        Err(e) => Err(ReelError::Other(anyhow::Error::new(e).context(format!(
            "failed to remove work directory '{}'",
            path.display()
        )))),
    }
}

#[cfg(test)]
#[path = "../tests/unit/pipeline.rs"]
mod tests;
