//! Prediction context: inference and explanation for one submission

use crate::error::{ExplanationError, InferenceError};
use crate::ranking::{rank_attributions, RankedFeature};
use crate::recommend::{recommend, Recommendation};
use crate::record::ShipmentRecord;
use crate::rules::{select_dominant, DominantFactor};
use ontime_model::{
    ArtifactError, ArtifactPaths, Artifacts, Classifier, Explainer, LabelDecoder, Preprocessor,
};
use serde::Serialize;
use std::sync::Arc;

pub const DEFAULT_ON_TIME_LABEL: &str = "On Time";

/// Label and transformed features of one submission
#[derive(Debug, Clone, PartialEq)]
pub struct Inference {
    pub label: String,
    pub class_index: usize,
    pub features: Vec<f64>,
}

/// Why a late prediction came out late, and what to do about it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    pub ranking: Vec<RankedFeature>,
    pub dominant: DominantFactor,
    pub recommendation: Recommendation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExplanationOutcome {
    /// The label is on time; nothing to explain
    NotRequired,
    Explained(Explanation),
    Failed(ExplanationError),
}

impl ExplanationOutcome {
    pub fn explanation(&self) -> Option<&Explanation> {
        match self {
            ExplanationOutcome::Explained(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub label: String,
    pub class_index: usize,
    pub on_time: bool,
    pub explanation: ExplanationOutcome,
}

/// Loaded artifacts, immutable for the life of the process
pub struct PredictionContext {
    preprocessor: Box<dyn Preprocessor>,
    classifier: Arc<dyn Classifier>,
    explainer: Box<dyn Explainer>,
    decoder: LabelDecoder,
    feature_names: Vec<String>,
    on_time_label: String,
}

impl PredictionContext {
    pub fn from_parts(
        preprocessor: Box<dyn Preprocessor>,
        classifier: Arc<dyn Classifier>,
        explainer: Box<dyn Explainer>,
        decoder: LabelDecoder,
        on_time_label: impl Into<String>,
    ) -> Self {
        let feature_names = preprocessor.feature_names_out();
        Self {
            preprocessor,
            classifier,
            explainer,
            decoder,
            feature_names,
            on_time_label: on_time_label.into(),
        }
    }

    pub fn from_artifacts(artifacts: Artifacts, on_time_label: impl Into<String>) -> Self {
        let Artifacts {
            pipeline,
            label_decoder,
        } = artifacts;
        let explainer = pipeline.explainer();
        let classifier: Arc<dyn Classifier> = pipeline.classifier();
        Self::from_parts(
            Box::new(pipeline.preprocessor().clone()),
            classifier,
            Box::new(explainer),
            label_decoder,
            on_time_label,
        )
    }

    /// Loads both artifact files; any failure is fatal for the caller
    pub fn load(paths: &ArtifactPaths, on_time_label: impl Into<String>) -> Result<Self, ArtifactError> {
        let artifacts = Artifacts::load(paths)?;
        let on_time_label = on_time_label.into();
        if artifacts.label_decoder.transform(&on_time_label).is_none() {
            log::warn!(
                "on-time label '{}' is not one of the decoder classes {:?}; every prediction will be explained",
                on_time_label,
                artifacts.label_decoder.classes()
            );
        }
        Ok(Self::from_artifacts(artifacts, on_time_label))
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn classes(&self) -> &[String] {
        self.decoder.classes()
    }

    pub fn on_time_label(&self) -> &str {
        &self.on_time_label
    }

    pub fn is_on_time(&self, label: &str) -> bool {
        label == self.on_time_label
    }

    /// Transform, classify and decode one record
    pub fn infer(&self, record: &ShipmentRecord) -> Result<Inference, InferenceError> {
        let features = self
            .preprocessor
            .transform(&record.to_row())
            .map_err(InferenceError::Transform)?;
        log::debug!("feature vector: {:?}", features);

        let class_index = self
            .classifier
            .predict(&features)
            .map_err(InferenceError::Classify)?;
        let label = self
            .decoder
            .inverse_transform(class_index)
            .map_err(InferenceError::Decode)?
            .to_string();
        log::info!("predicted '{}' (class {})", label, class_index);

        Ok(Inference {
            label,
            class_index,
            features,
        })
    }

    /// Attributions for the predicted class, ranked and reduced to one factor
    pub fn explain(
        &self,
        record: &ShipmentRecord,
        inference: &Inference,
    ) -> Result<Explanation, ExplanationError> {
        let attribution = self
            .explainer
            .shap_values(&inference.features, inference.class_index)
            .map_err(ExplanationError::Attribution)?;
        let ranking = rank_attributions(&self.feature_names, &attribution.values)?;
        log::debug!("attribution ranking: {:?}", ranking);

        let dominant =
            select_dominant(record, &ranking).ok_or(ExplanationError::NoAttributions)?;
        log::info!(
            "dominant factor '{}' via {}",
            dominant.category,
            dominant.rule
        );
        let recommendation = recommend(&dominant.category, dominant.feature.as_deref());

        Ok(Explanation {
            ranking,
            dominant,
            recommendation,
        })
    }

    /// One full submission. Explanation failures are kept in the result;
    /// only inference failures are returned as errors.
    pub fn predict(&self, record: &ShipmentRecord) -> Result<PredictionResult, InferenceError> {
        let inference = self.infer(record)?;
        let on_time = self.is_on_time(&inference.label);
        let explanation = if on_time {
            ExplanationOutcome::NotRequired
        } else {
            match self.explain(record, &inference) {
                Ok(e) => ExplanationOutcome::Explained(e),
                Err(e) => {
                    log::warn!("explanation failed: {}", e);
                    ExplanationOutcome::Failed(e)
                }
            }
        };
        Ok(PredictionResult {
            label: inference.label,
            class_index: inference.class_index,
            on_time,
            explanation,
        })
    }
}
