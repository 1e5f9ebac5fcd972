use ontime::config::{Overrides, Settings, ENV_ARTIFACTS_DIR};
use ontime::present::{render, OutputMode};
use ontime_insight::{ExplanationOutcome, PredictionContext, ShipmentRecord};
use ontime_model::{ArtifactError, ArtifactPaths};
use pretty_assertions::assert_eq;
use std::fs;
use tests::{bundled_artifacts_dir, bundled_context, scratch_artifacts};

#[test]
fn missing_pipeline_halts_before_anything_else() {
    let dir = tempfile::tempdir().unwrap();
    let paths = ArtifactPaths::in_dir(dir.path());
    match PredictionContext::load(&paths, "On Time") {
        Err(ArtifactError::Missing { path }) => assert_eq!(path, paths.pipeline),
        Err(other) => panic!("expected a missing artifact, got {other}"),
        Ok(_) => panic!("loading from an empty directory must fail"),
    }
}

#[test]
fn missing_label_encoder_is_also_fatal() {
    let (_dir, paths) = scratch_artifacts();
    fs::remove_file(&paths.label_encoder).unwrap();
    let err = PredictionContext::load(&paths, "On Time").err().unwrap();
    assert!(err.is_missing());
    assert!(err.to_string().contains("label_encoder.json"));
}

#[test]
fn truncated_pipeline_is_malformed_not_missing() {
    let (_dir, paths) = scratch_artifacts();
    let text = fs::read_to_string(&paths.pipeline).unwrap();
    fs::write(&paths.pipeline, &text[..text.len() / 2]).unwrap();
    let err = PredictionContext::load(&paths, "On Time").err().unwrap();
    assert!(matches!(err, ArtifactError::Malformed { .. }));
}

#[test]
fn settings_resolve_to_the_bundled_artifacts() {
    let dir = bundled_artifacts_dir();
    let dir_str = dir.to_string_lossy().into_owned();
    let settings = Settings::resolve(&Overrides::default(), |key| {
        (key == ENV_ARTIFACTS_DIR).then(|| dir_str.clone())
    });
    let ctx = PredictionContext::load(&settings.artifacts, settings.on_time_label).unwrap();
    assert_eq!(ctx.on_time_label(), "On Time");
    assert_eq!(ctx.classes().len(), 2);
}

#[test]
fn json_record_runs_through_the_whole_pipeline() {
    let record = ontime::parse_record(
        r#"{
            "Weather_conditions": "Sunny",
            "Road_traffic_density": "Jam",
            "Jarak": 20
        }"#,
    )
    .unwrap();
    let result = bundled_context().predict(&record).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&render(&result, OutputMode::Json)).unwrap();
    assert_eq!(json["status"], "warning");
    assert_eq!(json["label"], "Late");
    assert_eq!(json["explanation"]["dominant_category"], "Traffic Density");
    assert_eq!(json["explanation"]["rule"], "traffic_override");
    assert_eq!(
        json["explanation"]["ranking"].as_array().map(Vec::len),
        Some(23)
    );

    let text = render(&result, OutputMode::Text);
    assert!(text.contains("⚠ Delivery performance: Late"));
    assert!(text.contains("Recommended action"));
}

#[test]
fn record_file_is_read_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shipment.json");
    fs::write(&path, serde_json::to_string(&ShipmentRecord::default()).unwrap()).unwrap();
    assert_eq!(ontime::read_record(&path).unwrap(), ShipmentRecord::default());

    fs::write(&path, r#"{"Jarak": 45}"#).unwrap();
    let err = ontime::read_record(&path).unwrap_err();
    assert!(err.starts_with("invalid shipment record"));
    assert!(ontime::read_record(&dir.path().join("absent.json")).is_err());
}

#[test]
fn unknown_on_time_label_explains_every_prediction() {
    let ctx = PredictionContext::load(
        &ArtifactPaths::in_dir(bundled_artifacts_dir()),
        "Tepat Waktu",
    )
    .unwrap();
    let result = ctx.predict(&ShipmentRecord::default()).unwrap();
    assert!(!result.on_time);
    assert!(matches!(result.explanation, ExplanationOutcome::Explained(_)));
}
