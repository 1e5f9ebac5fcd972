//! Rendering of prediction results

use ontime_insight::{ExplanationOutcome, InferenceError, PredictionResult};
use serde_json::{json, Value as JsonValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Text,
    Json,
}

pub fn render(result: &PredictionResult, mode: OutputMode) -> String {
    match mode {
        OutputMode::Text => render_text(result).join("\n"),
        OutputMode::Json => render_json(result).to_string(),
    }
}

pub fn render_error(err: &InferenceError, mode: OutputMode) -> String {
    match mode {
        OutputMode::Text => format!("error: {err}"),
        OutputMode::Json => json!({ "error": err.to_string() }).to_string(),
    }
}

pub fn render_text(result: &PredictionResult) -> Vec<String> {
    let mut lines = vec!["Prediction result".to_string()];
    if result.on_time {
        lines.push(format!("✓ Delivery performance: {}", result.label));
    } else {
        lines.push(format!("⚠ Delivery performance: {}", result.label));
    }

    match &result.explanation {
        ExplanationOutcome::NotRequired => {}
        ExplanationOutcome::Explained(explanation) => {
            lines.push(String::new());
            lines.push("Main trigger".to_string());
            lines.push(format!(
                "This prediction was most influenced by: {}",
                explanation.dominant.category
            ));
            lines.push(String::new());
            lines.push("Recommended action".to_string());
            lines.push(format!("- {}", explanation.recommendation.action));
        }
        ExplanationOutcome::Failed(e) => {
            lines.push(format!("error: failed to explain the prediction: {e}"));
        }
    }
    lines
}

pub fn render_json(result: &PredictionResult) -> JsonValue {
    let status = if result.on_time { "success" } else { "warning" };
    let mut out = json!({
        "status": status,
        "label": result.label,
    });
    match &result.explanation {
        ExplanationOutcome::NotRequired => {}
        ExplanationOutcome::Explained(explanation) => {
            out["explanation"] = json!({
                "dominant_category": explanation.dominant.category,
                "rule": explanation.dominant.rule,
                "recommendation": explanation.recommendation.action,
                "ranking": explanation.ranking,
            });
        }
        ExplanationOutcome::Failed(e) => {
            out["explanation_error"] = JsonValue::String(e.to_string());
        }
    }
    out
}
