use std::collections::HashMap;
use std::time::Duration;

use promptmesh::{Config, PipelineError, SurfaceMode};

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| vars.get(key).cloned()
}

#[test]
fn test_defaults_from_keys_only() {
    let config = Config::from_lookup(lookup(&[
        ("STABILITY_KEY", "sk-stability"),
        ("MESHY_API_KEY", "msy-key"),
    ]))
    .unwrap();

    assert_eq!(config.stability_api_key, "sk-stability");
    assert_eq!(config.meshy_api_key, "msy-key");
    assert_eq!(config.stability_url.as_str(), "https://api.stability.ai/");
    assert_eq!(config.meshy_url.as_str(), "https://api.meshy.ai/");
    assert_eq!(config.output_dir, std::path::PathBuf::from("output"));
    assert_eq!(config.primary_format, "fbx");
    assert!(config.conversion.enable_pbr);
    assert_eq!(config.conversion.ai_model, "meshy-4");
    assert_eq!(config.conversion.surface_mode, SurfaceMode::Hard);
    assert_eq!(config.poll.interval, Duration::from_secs(15));
    assert_eq!(config.poll.max_attempts, None);
    assert_eq!(config.poll.timeout, None);
}

#[test]
fn test_missing_keys() {
    let err = Config::from_lookup(lookup(&[("MESHY_API_KEY", "msy-key")])).unwrap_err();
    assert!(matches!(err, PipelineError::MissingApiKey("STABILITY_KEY")));

    let err = Config::from_lookup(lookup(&[("STABILITY_KEY", "sk"), ("MESHY_API_KEY", "  ")]))
        .unwrap_err();
    assert!(matches!(err, PipelineError::MissingApiKey("MESHY_API_KEY")));
}

#[test]
fn test_overrides() {
    let config = Config::from_lookup(lookup(&[
        ("STABILITY_KEY", "sk"),
        ("MESHY_API_KEY", "msy"),
        ("MESHY_API_URL", "http://localhost:8080/proxy"),
        ("PROMPTMESH_OUTPUT_DIR", "/tmp/models"),
        ("PROMPTMESH_PRIMARY_FORMAT", "GLB"),
        ("MESHY_ENABLE_PBR", "false"),
        ("MESHY_SURFACE_MODE", "organic"),
        ("MESHY_POLL_INTERVAL_SECS", "5"),
        ("MESHY_POLL_MAX_ATTEMPTS", "40"),
        ("MESHY_POLL_TIMEOUT_SECS", "600"),
    ]))
    .unwrap();

    assert_eq!(config.meshy_url.as_str(), "http://localhost:8080/proxy/");
    assert_eq!(config.output_dir, std::path::PathBuf::from("/tmp/models"));
    assert_eq!(config.primary_format, "glb");
    assert!(!config.conversion.enable_pbr);
    assert_eq!(config.conversion.surface_mode, SurfaceMode::Organic);
    assert_eq!(config.poll.interval, Duration::from_secs(5));
    assert_eq!(config.poll.max_attempts, Some(40));
    assert_eq!(config.poll.timeout, Some(Duration::from_secs(600)));
}

#[test]
fn test_invalid_values() {
    let err = Config::from_lookup(lookup(&[
        ("STABILITY_KEY", "sk"),
        ("MESHY_API_KEY", "msy"),
        ("MESHY_POLL_INTERVAL_SECS", "soon"),
    ]))
    .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::InvalidConfig {
            key: "MESHY_POLL_INTERVAL_SECS",
            ..
        }
    ));

    let err = Config::from_lookup(lookup(&[
        ("STABILITY_KEY", "sk"),
        ("MESHY_API_KEY", "msy"),
        ("MESHY_SURFACE_MODE", "smooth"),
    ]))
    .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::InvalidConfig {
            key: "MESHY_SURFACE_MODE",
            ..
        }
    ));
}

#[test]
fn test_zero_max_attempts_rejected() {
    let err = Config::from_lookup(lookup(&[
        ("STABILITY_KEY", "sk"),
        ("MESHY_API_KEY", "msy"),
        ("MESHY_POLL_MAX_ATTEMPTS", "0"),
    ]))
    .unwrap_err();

    match err {
        PipelineError::InvalidConfig { key, value } => {
            assert_eq!(key, "MESHY_POLL_MAX_ATTEMPTS");
            assert_eq!(value, "0");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
