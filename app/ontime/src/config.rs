//! Runtime settings: CLI flag, then environment variable, then default

use ontime_insight::DEFAULT_ON_TIME_LABEL;
use ontime_model::pipeline::{LABEL_ENCODER_FILE, PIPELINE_FILE};
use ontime_model::ArtifactPaths;
use std::path::PathBuf;

pub const ENV_ARTIFACTS_DIR: &str = "ONTIME_ARTIFACTS_DIR";
pub const ENV_MODEL_PATH: &str = "ONTIME_MODEL_PATH";
pub const ENV_ENCODER_PATH: &str = "ONTIME_ENCODER_PATH";
pub const ENV_ON_TIME_LABEL: &str = "ONTIME_ON_TIME_LABEL";

/// Values given on the command line; `None` means not given
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub artifacts_dir: Option<PathBuf>,
    pub model: Option<PathBuf>,
    pub encoder: Option<PathBuf>,
    pub on_time_label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub artifacts: ArtifactPaths,
    pub on_time_label: String,
}

impl Settings {
    pub fn from_env(overrides: &Overrides) -> Self {
        Self::resolve(overrides, |key| std::env::var(key).ok())
    }

    /// Resolves every setting against `lookup`, which stands in for the
    /// process environment. Empty variables count as unset.
    pub fn resolve(overrides: &Overrides, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let env = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let dir = overrides
            .artifacts_dir
            .clone()
            .or_else(|| env(ENV_ARTIFACTS_DIR).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("."));
        let pipeline = overrides
            .model
            .clone()
            .or_else(|| env(ENV_MODEL_PATH).map(PathBuf::from))
            .unwrap_or_else(|| dir.join(PIPELINE_FILE));
        let label_encoder = overrides
            .encoder
            .clone()
            .or_else(|| env(ENV_ENCODER_PATH).map(PathBuf::from))
            .unwrap_or_else(|| dir.join(LABEL_ENCODER_FILE));
        let on_time_label = overrides
            .on_time_label
            .clone()
            .or_else(|| env(ENV_ON_TIME_LABEL))
            .unwrap_or_else(|| DEFAULT_ON_TIME_LABEL.to_string());

        let settings = Self {
            artifacts: ArtifactPaths {
                pipeline,
                label_encoder,
            },
            on_time_label,
        };
        log::debug!("resolved settings: {:?}", settings);
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_point_at_the_working_directory() {
        let s = Settings::resolve(&Overrides::default(), env(&[]));
        assert_eq!(s.artifacts, ArtifactPaths::in_dir("."));
        assert_eq!(s.on_time_label, "On Time");
    }

    #[test]
    fn environment_fills_unset_flags() {
        let s = Settings::resolve(
            &Overrides::default(),
            env(&[
                (ENV_ARTIFACTS_DIR, "/srv/models"),
                (ENV_ON_TIME_LABEL, "Tepat Waktu"),
            ]),
        );
        assert_eq!(s.artifacts, ArtifactPaths::in_dir("/srv/models"));
        assert_eq!(s.on_time_label, "Tepat Waktu");
    }

    #[test]
    fn flags_win_over_environment() {
        let overrides = Overrides {
            artifacts_dir: Some("cli".into()),
            encoder: Some("custom/encoder.json".into()),
            ..Overrides::default()
        };
        let s = Settings::resolve(
            &overrides,
            env(&[
                (ENV_ARTIFACTS_DIR, "from-env"),
                (ENV_ENCODER_PATH, "env/encoder.json"),
                (ENV_MODEL_PATH, "env/model.json"),
            ]),
        );
        assert_eq!(s.artifacts.label_encoder, PathBuf::from("custom/encoder.json"));
        assert_eq!(s.artifacts.pipeline, PathBuf::from("env/model.json"));
    }

    #[test]
    fn blank_variables_are_ignored() {
        let s = Settings::resolve(&Overrides::default(), env(&[(ENV_ON_TIME_LABEL, "  ")]));
        assert_eq!(s.on_time_label, "On Time");
    }
}
