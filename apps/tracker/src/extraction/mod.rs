//! Extraction: turns one email into an `Observation` via the model.
//!
//! Extraction never fails from the caller's point of view: any error is
//! logged and becomes an all-absent observation that still carries the
//! receive timestamp.

pub mod prompts;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::extraction::prompts::{extraction_response_format, extraction_system_prompt};
use crate::llm_client::{LlmClient, LlmError};
use crate::models::observation::{Observation, Outcome};

#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(
        &self,
        email_text: &str,
        label: &str,
        received_at: Option<NaiveDateTime>,
    ) -> Observation;
}

/// Model answer as the schema names it.
#[derive(Debug, Default, Deserialize)]
struct ExtractionAnswer {
    #[serde(default)]
    arbeitgeber_name: Option<String>,
    #[serde(default)]
    gespraechspartner: Option<String>,
    #[serde(default)]
    beworben_als: Option<String>,
    #[serde(default)]
    anschrift: Option<String>,
    #[serde(default)]
    ergebnis: Option<String>,
}

#[derive(Debug, thiserror::Error)]
enum AnswerError {
    #[error("Model returned empty output")]
    Empty,
    #[error("Parsed JSON is not an object")]
    NotAnObject,
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

fn parse_answer(raw: &str) -> Result<ExtractionAnswer, AnswerError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AnswerError::Empty);
    }
    let value: Value = serde_json::from_str(raw)?;
    if !value.is_object() {
        return Err(AnswerError::NotAnObject);
    }
    Ok(serde_json::from_value(value)?)
}

fn observation_from_answer(
    answer: ExtractionAnswer,
    label: &str,
    received_at: Option<NaiveDateTime>,
) -> Observation {
    let result = answer.ergebnis.as_deref().and_then(|raw| match raw.parse::<Outcome>() {
        Ok(outcome) => Some(outcome),
        Err(e) => {
            warn!("Dropping outcome for '{label}': {e}");
            None
        }
    });

    Observation {
        employer_name: answer.arbeitgeber_name,
        contact_person: answer.gespraechspartner,
        applied_position: answer.beworben_als,
        postal_address: answer.anschrift,
        result,
        observed_at: received_at,
    }
}

/// Maps a raw model answer (or the error that replaced it) to an observation.
/// Failures are absorbed here.
pub fn observation_from_response(
    response: Result<String, LlmError>,
    label: &str,
    received_at: Option<NaiveDateTime>,
) -> Observation {
    let raw = match response {
        Ok(raw) => raw,
        Err(e) => {
            warn!("LLM failed: {label} - {e}");
            return Observation::empty(received_at);
        }
    };

    match parse_answer(&raw) {
        Ok(answer) => observation_from_answer(answer, label, received_at),
        Err(e) => {
            warn!("LLM failed: {label} - {e}");
            Observation::empty(received_at)
        }
    }
}

/// Extractor backed by the chat-completions client.
pub struct LlmExtractor {
    llm: LlmClient,
    system: String,
    response_format: Value,
}

impl LlmExtractor {
    pub fn new(llm: LlmClient) -> Self {
        Self {
            llm,
            system: extraction_system_prompt(),
            response_format: extraction_response_format(),
        }
    }
}

#[async_trait]
impl Extractor for LlmExtractor {
    async fn extract(
        &self,
        email_text: &str,
        label: &str,
        received_at: Option<NaiveDateTime>,
    ) -> Observation {
        debug!("Extracting fields from '{label}'");
        let response = self
            .llm
            .call_json_text(email_text, &self.system, Some(&self.response_format))
            .await;
        observation_from_response(response, label, received_at)
    }
}

/// Builds the exact text sent to the model for one email.
pub fn format_email(sender: &str, subject: &str, msg_date: &str, body: &str) -> String {
    format!("From: {sender}\nSubject: {subject}\nDate: {msg_date}\n\n{body}")
}
