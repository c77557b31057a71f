use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use beatreel::assets::images::{open_image, write_jpeg};
use beatreel::assets::media::decode_audio_f32;
use beatreel::compose::sequence_key;
use beatreel::{
    BeatTracker, DurationSequence, FrameCompositor, Pipeline, PipelineConfig, RenderMode,
    RenderRequest,
};

#[derive(Parser, Debug)]
#[command(name = "beatreel", version, about = "Beat-synchronized photo slideshow renderer")]
struct Cli {
    /// Pipeline config JSON. Omitted fields use their defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render an MP4 slideshow (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Print the beat times of an audio file as JSON.
    Beats(BeatsArgs),
    /// Composite a single image pair into a JPEG.
    Frame(FrameArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Directory of primary (full-frame) images.
    #[arg(long)]
    primary: PathBuf,

    /// Directory of secondary (inset) images.
    #[arg(long)]
    secondary: PathBuf,

    /// Soundtrack. Defaults to the configured default song.
    #[arg(long)]
    audio: Option<PathBuf>,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// `compact` eases the whole slideshow into a fixed length; `natural` keeps beat timing.
    #[arg(long, default_value_t = RenderMode::Compact)]
    mode: RenderMode,

    /// Draw each pair's sequence key as a caption.
    #[arg(long, default_value_t = false)]
    caption: bool,

    /// Override the scratch directory. Each render uses its own subdirectory inside it.
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Keep this render's intermediate frames after the render.
    #[arg(long, default_value_t = false)]
    keep_work: bool,

    /// Override encoder worker threads.
    #[arg(long)]
    threads: Option<u32>,
}

#[derive(Parser, Debug)]
struct BeatsArgs {
    /// Audio file to analyze.
    #[arg(long)]
    audio: PathBuf,

    /// Also print display durations for this many frames.
    #[arg(long)]
    frames: Option<usize>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Primary image file.
    #[arg(long)]
    primary: PathBuf,

    /// Secondary image file.
    #[arg(long)]
    secondary: PathBuf,

    /// Output JPEG path.
    #[arg(long)]
    out: PathBuf,

    /// Caption with the primary file's sequence key.
    #[arg(long, default_value_t = false)]
    caption: bool,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    match cli.cmd {
        Command::Render(args) => cmd_render(config, args),
        Command::Beats(args) => cmd_beats(&config, args),
        Command::Frame(args) => cmd_frame(&config, args),
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<PipelineConfig> {
    match path {
        Some(p) => PipelineConfig::from_json_path(p)
            .with_context(|| format!("load config '{}'", p.display())),
        None => Ok(PipelineConfig::default()),
    }
}

fn cmd_render(mut config: PipelineConfig, args: RenderArgs) -> anyhow::Result<()> {
    if let Some(dir) = args.work_dir {
        config.work_dir = dir;
    }
    if let Some(threads) = args.threads {
        config.encoder.threads = threads;
    }
    let pipeline = Pipeline::new(config)?;

    let req = RenderRequest {
        primary_dir: args.primary,
        secondary_dir: args.secondary,
        audio: args.audio,
        mode: args.mode,
        show_caption: args.caption,
        output: args.out,
        keep_work: args.keep_work,
    };
    let video = pipeline.render(&req)?;

    if let Some(dir) = &video.work_dir {
        eprintln!("kept intermediate frames in {}", dir.display());
    }
    eprintln!(
        "wrote {} ({} photos, {:.2}s)",
        video.path.display(),
        video.composited_frames,
        video.duration_secs
    );
    Ok(())
}

fn cmd_beats(config: &PipelineConfig, args: BeatsArgs) -> anyhow::Result<()> {
    let audio = decode_audio_f32(&args.audio, config.audio.sample_rate, 1)?;
    let beats = BeatTracker::new(config.beats.clone())?.track(&audio.to_mono(), audio.sample_rate)?;

    let mut out = serde_json::json!({
        "audio": args.audio.display().to_string(),
        "beats": beats.times(),
    });
    if let Some(frames) = args.frames {
        let durations = DurationSequence::from_beats(&beats, frames)?;
        out["durations"] = serde_json::json!(durations.as_slice());
    }
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn cmd_frame(config: &PipelineConfig, args: FrameArgs) -> anyhow::Result<()> {
    let compositor = FrameCompositor::from_config(config, args.caption)?;
    let primary = open_image(&args.primary)?;
    let secondary = open_image(&args.secondary)?;

    let name = args
        .primary
        .file_name()
        .and_then(|s| s.to_str())
        .context("primary path has no UTF-8 file name")?;
    let caption = args.caption.then(|| sequence_key(name));
    let frame = compositor.composite(&primary, &secondary, caption)?;
    write_jpeg(&frame, &args.out, config.compositor.jpeg_quality)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
