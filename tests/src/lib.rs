//! Shared fixtures for the integration tests

use ontime_insight::{PredictionContext, DEFAULT_ON_TIME_LABEL};
use ontime_model::ArtifactPaths;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// The artifacts shipped in the repository's `artifacts/` directory
pub fn bundled_artifacts_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("artifacts")
}

pub fn bundled_context() -> PredictionContext {
    PredictionContext::load(
        &ArtifactPaths::in_dir(bundled_artifacts_dir()),
        DEFAULT_ON_TIME_LABEL,
    )
    .expect("bundled artifacts should load")
}

/// A scratch directory holding a copy of the bundled artifacts
pub fn scratch_artifacts() -> (TempDir, ArtifactPaths) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let from = ArtifactPaths::in_dir(bundled_artifacts_dir());
    let to = ArtifactPaths::in_dir(dir.path());
    fs::copy(&from.pipeline, &to.pipeline).expect("copy pipeline");
    fs::copy(&from.label_encoder, &to.label_encoder).expect("copy label encoder");
    (dir, to)
}
