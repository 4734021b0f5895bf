//! Live oracle client for the Gemini `generateContent` API.
//!
//! The request constrains the response to a JSON schema so the reply
//! parses straight into a [`Prediction`]. Note the API's mixed casing:
//! `generationConfig`, `responseMimeType`, and the schema field names
//! are camelCase.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use serde_json::{json, Value};
use shared::{Prediction, RiskLevel};

use super::RiskOracle;
use crate::domain::risk::AssessmentRequest;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub struct GeminiOracle {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiOracle {
    pub fn new(api_key: String, model: String) -> Self {
        GeminiOracle {
            client: reqwest::Client::new(),
            api_key,
            model,
            base_url: API_BASE.to_string(),
        }
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl RiskOracle for GeminiOracle {
    async fn assess(&self, request: &AssessmentRequest) -> Result<Prediction> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url, self.model
        );
        debug!(
            "Requesting assessment for {} ({} entries in window)",
            request.child_name, request.entry_count
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .timeout(REQUEST_TIMEOUT)
            .json(&build_request_body(&request.log_window))
            .send()
            .await
            .context("sending prediction request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("prediction request failed: {} - {}", status, body);
        }

        let body: Value = response
            .json()
            .await
            .context("reading prediction response")?;
        parse_prediction(&body)
    }
}

fn build_prompt(log_window: &str) -> String {
    format!(
        "You are an expert behavioral analyst supporting children with autism.\n\
         Analyze the following chronological activity log recorded by the child's \
         parents and educators.\n\nLogs:\n{}\n\n\
         Based on the patterns, sensory load, transitions, and mood, predict the \
         current risk of a meltdown. Provide a risk score (0-100), a short \
         explanation, and 3 specific, actionable recommendations for the caregiver.",
        log_window
    )
}

fn build_request_body(log_window: &str) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": build_prompt(log_window) }]
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "riskScore": {
                        "type": "NUMBER",
                        "description": "0 to 100 probability of a meltdown"
                    },
                    "riskLevel": {
                        "type": "STRING",
                        "enum": ["Low", "Moderate", "High", "Critical"]
                    },
                    "explanation": {
                        "type": "STRING",
                        "description": "Brief analysis of why the risk is at this level"
                    },
                    "recommendations": {
                        "type": "ARRAY",
                        "items": { "type": "STRING" },
                        "description": "3 short, actionable tips"
                    }
                },
                "required": ["riskScore", "riskLevel", "explanation", "recommendations"]
            }
        }
    })
}

/// Wire shape of the model's JSON answer. Scores arrive as floats and
/// are clamped into the 0–100 band.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPrediction {
    risk_score: f64,
    risk_level: RiskLevel,
    explanation: String,
    #[serde(default)]
    recommendations: Vec<String>,
}

fn parse_prediction(body: &Value) -> Result<Prediction> {
    let text = body["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .context("prediction response carries no text candidate")?;

    let raw: RawPrediction =
        serde_json::from_str(text).context("prediction text is not the expected JSON")?;

    Ok(Prediction {
        risk_score: raw.risk_score.clamp(0.0, 100.0).round() as u8,
        risk_level: raw.risk_level,
        explanation: raw.explanation,
        recommendations: raw.recommendations,
    })
}
