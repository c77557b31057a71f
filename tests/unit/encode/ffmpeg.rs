use super::*;
use crate::encode::sink::AudioInputConfig;

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

fn cfg(width: u32, height: u32) -> SinkConfig {
    SinkConfig {
        width,
        height,
        fps: Fps::integer(24).unwrap(),
        audio: None,
    }
}

#[test]
fn odd_canvas_is_rejected_before_spawning() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(temp_path("odd.mp4")));
    let err = sink.begin(cfg(31, 20)).unwrap_err();
    assert!(matches!(err, ReelError::Validation(_)));
}

#[test]
fn push_before_begin_is_encoding_error() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(temp_path("unstarted.mp4")));
    let err = sink
        .push_frame(FrameIndex(0), &RgbImage::new(2, 2))
        .unwrap_err();
    assert!(matches!(err, ReelError::Encoding(_)));
    assert!(matches!(sink.end(), Err(ReelError::Encoding(_))));
}

#[test]
fn encodes_short_clip_with_audio() {
    if !is_ffmpeg_on_path() {
        return;
    }

    let dir = temp_path("ffmpeg_sink");
    std::fs::create_dir_all(&dir).unwrap();
    let audio_path = dir.join("tone.f32le");
    let samples: Vec<f32> = (0..48_000 * 2).map(|i| ((i / 2) as f32 * 0.05).sin() * 0.2).collect();
    crate::assets::media::write_f32le_file(&samples, &audio_path).unwrap();

    let out = dir.join("clip.mp4");
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(&out).with_threads(1));
    sink.begin(SinkConfig {
        audio: Some(AudioInputConfig {
            path: audio_path,
            sample_rate: 48_000,
            channels: 2,
        }),
        ..cfg(32, 16)
    })
    .unwrap();
    for i in 0..24u64 {
        let frame = RgbImage::from_pixel(32, 16, image::Rgb([(i * 10) as u8, 0, 0]));
        sink.push_frame(FrameIndex(i), &frame).unwrap();
    }
    sink.end().unwrap();

    assert!(std::fs::metadata(&out).unwrap().len() > 0);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn out_of_order_frames_are_rejected() {
    if !is_ffmpeg_on_path() {
        return;
    }
    let dir = temp_path("ffmpeg_order");
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(dir.join("o.mp4")));
    sink.begin(cfg(16, 16)).unwrap();
    let frame = RgbImage::new(16, 16);
    sink.push_frame(FrameIndex(1), &frame).unwrap();
    let err = sink.push_frame(FrameIndex(1), &frame).unwrap_err();
    assert!(matches!(err, ReelError::Encoding(_)));
    drop(sink);
    let _ = std::fs::remove_dir_all(&dir);
}
