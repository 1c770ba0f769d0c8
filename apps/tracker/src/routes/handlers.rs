use axum::{extract::State, Json};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::extraction::format_email;
use crate::models::mail::MailItem;
use crate::models::observation::Observation;
use crate::models::record::CanonicalRecord;
use crate::pipeline::reconcile_blocking;
use crate::reconcile::ReconcileOptions;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ReconcileRequest {
    pub observations: Vec<Observation>,
    /// Falls back to the server configuration when omitted.
    #[serde(default)]
    pub include_role_in_key: Option<bool>,
}

#[derive(Serialize)]
pub struct ReconcileResponse {
    pub records: Vec<CanonicalRecord>,
}

#[derive(Deserialize)]
pub struct ExtractRequest {
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub received_at: Option<DateTime<FixedOffset>>,
}

/// POST /api/v1/reconcile
/// Never prompts: a missing job title stays absent.
pub async fn handle_reconcile(
    State(state): State<AppState>,
    Json(req): Json<ReconcileRequest>,
) -> Result<Json<ReconcileResponse>, AppError> {
    let options = ReconcileOptions {
        include_role_in_key: req
            .include_role_in_key
            .unwrap_or(state.config.include_role_in_key),
    };
    let records = reconcile_blocking(req.observations, options, None).await?;
    Ok(Json(ReconcileResponse { records }))
}

/// POST /api/v1/extract
pub async fn handle_extract(
    State(state): State<AppState>,
    Json(req): Json<ExtractRequest>,
) -> Result<Json<Observation>, AppError> {
    if req.body.trim().is_empty() {
        return Err(AppError::Validation("body must not be empty".to_string()));
    }

    let mail = MailItem {
        msg_id: 0,
        sender: req.sender,
        subject: req.subject,
        msg_date: req.date,
        body: req.body.trim().to_string(),
        received_at: req.received_at,
    };
    let email_text = format_email(&mail.sender, &mail.subject, &mail.msg_date, &mail.body);
    let observation = state
        .extractor
        .extract(&email_text, &mail.subject, mail.received_local())
        .await;
    Ok(Json(observation))
}
