use super::*;

#[test]
fn stereo_downmix_averages_channels() {
    let pcm = AudioPcm {
        sample_rate: 4,
        channels: 2,
        interleaved_f32: vec![1.0, 0.0, 0.5, 0.5, -1.0, 1.0],
    };
    assert_eq!(pcm.frames(), 3);
    assert!((pcm.duration_secs() - 0.75).abs() < 1e-9);
    assert_eq!(pcm.to_mono(), vec![0.5, 0.5, 0.0]);
}

#[test]
fn f32le_round_trips_through_file() {
    let path = std::env::temp_dir().join(format!(
        "beatreel_media_f32le_{}_{}.f32le",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    let samples = vec![0.25f32, -0.5, 1.0];
    write_f32le_file(&samples, &path).unwrap();
    let back = f32le_bytes_to_samples(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(back, samples);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn misaligned_pcm_is_rejected() {
    assert!(f32le_bytes_to_samples(&[0u8; 7]).is_err());
}
