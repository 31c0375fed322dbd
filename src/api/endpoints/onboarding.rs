//! Patient onboarding: validate the form and compute a baseline metabolic profile.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::{timestamp_id, ApiContext};
use crate::models::OnboardingForm;
use crate::pipeline::metabolic::{compute_profile, MetabolicProfile};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingResponse {
    pub success: bool,
    pub patient_id: String,
    pub metabolic_profile: MetabolicProfile,
    pub message: &'static str,
}

/// `POST /api/onboarding`: JSON onboarding form.
///
/// Parsed from raw bytes; malformed JSON yields the standard error body.
pub async fn submit(
    State(ctx): State<ApiContext>,
    body: Bytes,
) -> Result<Json<OnboardingResponse>, ApiError> {
    let form: OnboardingForm = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid onboarding form: {e}")))?;

    let today = ctx.core.today();
    form.validate(today)?;

    let metabolic_profile = compute_profile(&form, today)
        .ok_or_else(|| ApiError::Internal("birth date unreadable after validation".into()))?;

    tracing::info!(
        bmi_category = %metabolic_profile.bmi_category,
        risk_factors = metabolic_profile.risk_factors.len(),
        "Onboarding completed"
    );

    Ok(Json(OnboardingResponse {
        success: true,
        patient_id: timestamp_id("patient"),
        metabolic_profile,
        message: "Onboarding concluído com sucesso!",
    }))
}
