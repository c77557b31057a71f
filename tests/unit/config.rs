use super::*;

#[test]
fn defaults_validate() {
    let cfg = PipelineConfig::default();
    cfg.validate().unwrap();
    assert_eq!(cfg.audio.sample_rate, 48_000);
    assert_eq!(cfg.audio.fade_out_secs, 3.0);
    assert_eq!(cfg.encoder.threads, 4);
    assert_eq!(cfg.timeline.batch_size, 10);
}

#[test]
fn partial_json_keeps_defaults() {
    let cfg: PipelineConfig =
        serde_json::from_str(r#"{ "work_dir": "/tmp/x", "timeline": { "batch_size": 4 } }"#)
            .unwrap();
    assert_eq!(cfg.work_dir, PathBuf::from("/tmp/x"));
    assert_eq!(cfg.timeline.batch_size, 4);
    assert_eq!(cfg.timeline.fps, 24);
    assert_eq!(cfg.encoder.threads, 4);
}

#[test]
fn zero_threads_is_rejected() {
    let mut cfg = PipelineConfig::default();
    cfg.encoder.threads = 0;
    assert!(matches!(cfg.validate(), Err(ReelError::Validation(_))));
}

#[test]
fn mode_parses_current_and_legacy_names() {
    assert_eq!("compact".parse::<RenderMode>().unwrap(), RenderMode::Compact);
    assert_eq!("classic".parse::<RenderMode>().unwrap(), RenderMode::Compact);
    assert_eq!("Natural".parse::<RenderMode>().unwrap(), RenderMode::Natural);
    assert_eq!("modern".parse::<RenderMode>().unwrap(), RenderMode::Natural);
    assert!("fast".parse::<RenderMode>().is_err());

    let m: RenderMode = serde_json::from_str("\"modern\"").unwrap();
    assert_eq!(m, RenderMode::Natural);
    assert_eq!(RenderMode::Compact.to_string(), "compact");
}

#[test]
fn missing_config_file_is_validation_error() {
    let err = PipelineConfig::from_json_path("/no/such/beatreel.json").unwrap_err();
    assert!(matches!(err, ReelError::Validation(_)));
}
