use image::RgbImage;

use super::*;
use crate::audio::DurationSequence;
use crate::compose::CompositedFrame;
use crate::config::RenderMode;
use crate::encode::InMemorySink;
use crate::timeline::{TimelineClip, TimelineConfig};

struct SolidLoader {
    canvas: Canvas,
}

impl FrameLoader for SolidLoader {
    type Frame = RgbImage;

    fn load(&mut self, clip: &TimelineClip) -> ReelResult<RgbImage> {
        let shade = if clip.is_end_card { 255 } else { 64 };
        Ok(RgbImage::from_pixel(
            self.canvas.width,
            self.canvas.height,
            image::Rgb([shade, shade, shade]),
        ))
    }
}

fn fixture() -> (TimelineAssembler, AssembledTimeline) {
    let asm = TimelineAssembler::new(TimelineConfig::default()).unwrap();
    let frames = (0..3)
        .map(|i| CompositedFrame {
            path: format!("/nonexistent/{i}.jpg").into(),
            order_key: format!("{i}"),
        })
        .collect();
    let durations = DurationSequence::pad_cyclic(vec![0.5], 3).unwrap();
    let end_card = CompositedFrame {
        path: "/nonexistent/endcard.jpg".into(),
        order_key: "~endcard".into(),
    };
    let tl = asm
        .assemble(frames, &durations, end_card, 1.0, RenderMode::Natural)
        .unwrap();
    (asm, tl)
}

fn silence(secs: f64) -> ReconciledAudio {
    let frames = (secs * 48_000.0).round() as usize;
    ReconciledAudio {
        sample_rate: 48_000,
        channels: 2,
        interleaved_f32: vec![0.0; frames * 2],
    }
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "beatreel_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

#[test]
fn stream_begins_pushes_and_ends() {
    let (asm, tl) = fixture();
    let canvas = Canvas::new(8, 6).unwrap();
    let mut sink = InMemorySink::new();
    let cfg = SinkConfig {
        width: canvas.width,
        height: canvas.height,
        fps: Fps::integer(24).unwrap(),
        audio: None,
    };
    let stats = stream(&asm, &tl, cfg, &mut SolidLoader { canvas }, &mut sink).unwrap();
    assert_eq!(stats.frames_pushed, 60);
    assert!(sink.is_ended());
    assert_eq!(sink.config().unwrap().width, 8);
    assert_eq!(sink.frames().last().unwrap().1.get_pixel(0, 0).0, [255, 255, 255]);
}

#[test]
fn zero_threads_is_rejected() {
    assert!(Encoder::new(Fps::integer(24).unwrap(), 0).is_err());
}

#[test]
fn odd_canvas_fails_without_leaving_output() {
    let (asm, tl) = fixture();
    let out = temp_path("odd_canvas.mp4");
    let canvas = Canvas::new(9, 6).unwrap();
    let enc = Encoder::new(Fps::integer(24).unwrap(), 1).unwrap();
    let err = enc
        .encode(&asm, &tl, &silence(2.5), canvas, &out, &mut SolidLoader { canvas })
        .unwrap_err();
    assert!(matches!(err, ReelError::Validation(_)));
    assert!(!out.exists());
}

#[test]
fn encodes_mp4_with_audio() {
    if !crate::encode::is_ffmpeg_on_path() {
        return;
    }
    let (asm, tl) = fixture();
    let dir = temp_path("encoder");
    let out = dir.join("reel.mp4");
    let canvas = Canvas::new(32, 24).unwrap();
    let enc = Encoder::new(Fps::integer(24).unwrap(), 2).unwrap();

    let video = enc
        .encode(&asm, &tl, &silence(tl.duration()), canvas, &out, &mut SolidLoader { canvas })
        .unwrap();
    assert_eq!(video.path, out);
    assert_eq!(video.frames_encoded, 60);
    assert_eq!(video.composited_frames, 3);
    assert!((video.duration_secs - 2.5).abs() < 1e-9);
    assert!(std::fs::metadata(&out).unwrap().len() > 0);

    let _ = std::fs::remove_dir_all(&dir);
}
