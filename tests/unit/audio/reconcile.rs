use super::*;

const SR: u32 = 100;

/// Mono ramp where each sample encodes its own index, so looping is observable.
fn ramp(secs: f64) -> AudioPcm {
    let n = (secs * f64::from(SR)) as usize;
    AudioPcm {
        sample_rate: SR,
        channels: 1,
        interleaved_f32: (0..n).map(|i| i as f32).collect(),
    }
}

#[test]
fn short_audio_loops_to_exact_length() {
    let out = AudioReconciler::new(3.0)
        .unwrap()
        .reconcile(&ramp(10.0), 25.0)
        .unwrap();
    assert_eq!(out.frames(), 2500);
    assert!((out.duration_secs() - 25.0).abs() < 1.0 / f64::from(SR));
    assert_eq!(out.interleaved_f32[999], 999.0);
    assert_eq!(out.interleaved_f32[1000], 0.0);
    assert_eq!(out.interleaved_f32[1500], 500.0);
    // Before the fade window samples are untouched.
    assert_eq!(out.interleaved_f32[2199], 199.0);
}

#[test]
fn long_audio_is_trimmed() {
    let out = AudioReconciler::default()
        .reconcile(&ramp(60.0), 12.5)
        .unwrap();
    assert_eq!(out.frames(), 1250);
    assert_eq!(out.interleaved_f32[100], 100.0);
}

#[test]
fn fade_ends_in_silence_and_is_monotone_on_constant_input() {
    let audio = AudioPcm {
        sample_rate: SR,
        channels: 2,
        interleaved_f32: vec![1.0; 2 * 1000],
    };
    let out = AudioReconciler::new(3.0)
        .unwrap()
        .reconcile(&audio, 8.0)
        .unwrap();
    assert_eq!(out.frames(), 800);
    assert_eq!(out.interleaved_f32[2 * 499], 1.0);
    assert!(out.interleaved_f32[2 * 500] < 1.0);
    assert_eq!(out.interleaved_f32[2 * 799], 0.0);
    assert_eq!(out.interleaved_f32[2 * 799 + 1], 0.0);

    let left: Vec<f32> = out.interleaved_f32.chunks_exact(2).map(|f| f[0]).collect();
    assert!(left.windows(2).all(|w| w[1] <= w[0]));
}

#[test]
fn fade_longer_than_target_covers_whole_track() {
    let audio = AudioPcm {
        sample_rate: SR,
        channels: 1,
        interleaved_f32: vec![1.0; 1000],
    };
    let out = AudioReconciler::new(3.0)
        .unwrap()
        .reconcile(&audio, 1.0)
        .unwrap();
    assert_eq!(out.frames(), 100);
    assert!(out.interleaved_f32[0] < 1.0);
    assert_eq!(out.interleaved_f32[99], 0.0);
}

#[test]
fn non_positive_or_nan_target_is_invalid() {
    let r = AudioReconciler::default();
    for t in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        let err = r.reconcile(&ramp(1.0), t).unwrap_err();
        assert!(matches!(err, ReelError::InvalidDuration(_)), "target {t}");
    }
}

#[test]
fn empty_audio_is_invalid() {
    let err = AudioReconciler::default()
        .reconcile(&ramp(0.0), 5.0)
        .unwrap_err();
    assert!(matches!(err, ReelError::InvalidDuration(_)));
}

#[test]
fn target_below_one_sample_is_invalid() {
    let err = AudioReconciler::default()
        .reconcile(&ramp(1.0), 0.004)
        .unwrap_err();
    assert!(matches!(err, ReelError::InvalidDuration(_)));
}
