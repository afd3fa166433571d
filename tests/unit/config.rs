use super::*;

#[test]
fn defaults_match_documented_values() {
    let cfg = EditorConfig::default();
    assert_eq!(cfg.api_base_url, "http://localhost:8000");
    assert_eq!(cfg.default_brush_width, 20.0);
    assert_eq!(cfg.highlight_color, Rgba8::new(255, 0, 0, 128));
    assert_eq!(cfg.mask_resolution, MaskResolution::Display);
    assert_eq!(cfg.download_file_name, "processed_image.png");
    cfg.validate().unwrap();
}

#[test]
fn partial_json_keeps_defaults() {
    let json = r#"{ "api_base_url": "http://inpaint:9000", "mask_resolution": "natural" }"#;
    let cfg = EditorConfig::from_reader(json.as_bytes()).unwrap();
    assert_eq!(cfg.api_base_url, "http://inpaint:9000");
    assert_eq!(cfg.mask_resolution, MaskResolution::Natural);
    assert_eq!(cfg.request_timeout_secs, 120);
    assert_eq!(cfg.viewport_usage, ViewportUsage::default());
}

#[test]
fn env_overrides_apply_and_ignore_empty_values() {
    let cfg = EditorConfig::default()
        .with_overrides_from(|k| match k {
            ENV_API_URL => Some("http://remote:1234/".to_string()),
            ENV_REQUEST_TIMEOUT => Some("  ".to_string()),
            _ => None,
        })
        .unwrap();
    assert_eq!(cfg.api_base_url, "http://remote:1234/");
    assert_eq!(cfg.request_timeout_secs, 120);
    assert_eq!(cfg.endpoint("/process-image"), "http://remote:1234/process-image");
}

#[test]
fn unset_env_keeps_default_url() {
    let cfg = EditorConfig::default().with_overrides_from(|_| None).unwrap();
    assert_eq!(cfg.endpoint("process-image"), "http://localhost:8000/process-image");
}

#[test]
fn bad_timeout_override_is_a_validation_error() {
    let err = EditorConfig::default()
        .with_overrides_from(|k| (k == ENV_REQUEST_TIMEOUT).then(|| "soon".to_string()))
        .unwrap_err();
    assert!(matches!(err, UnmarkError::Validation(_)));
}

#[test]
fn validate_rejects_out_of_range_values() {
    let cfg = EditorConfig {
        default_brush_width: 200.0,
        ..EditorConfig::default()
    };
    assert!(cfg.validate().is_err());

    let cfg = EditorConfig {
        viewport_usage: ViewportUsage {
            width: 0.0,
            height: 0.5,
        },
        ..EditorConfig::default()
    };
    assert!(cfg.validate().is_err());

    let cfg = EditorConfig {
        api_base_url: " ".to_string(),
        ..EditorConfig::default()
    };
    assert!(cfg.validate().is_err());
}
