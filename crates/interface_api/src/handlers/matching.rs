//! Matching handlers

use axum::{extract::State, Json};
use validator::Validate;

use core_kernel::{ClaimId, DeductionId, TenantId};

use crate::dto::deductions::DeductionResponse;
use crate::dto::matching::*;
use crate::{error::ApiError, AppState};

/// Runs exact-amount auto-matching for a tenant
pub async fn auto_match(
    State(state): State<AppState>,
    Json(request): Json<AutoMatchRequest>,
) -> Result<Json<AutoMatchResponse>, ApiError> {
    request.validate()?;
    let actor = request.actor.as_deref().unwrap_or(SYSTEM_ACTOR);

    let matches = state
        .engine
        .matching()
        .auto_match(TenantId::from_uuid(request.tenant), actor)
        .await?;
    Ok(Json(matches.into()))
}

/// Allocates part of a deduction to a claim
pub async fn manual_match(
    State(state): State<AppState>,
    Json(request): Json<ManualMatchRequest>,
) -> Result<Json<DeductionResponse>, ApiError> {
    request.validate()?;

    let deduction = state
        .engine
        .matching()
        .match_manual(
            TenantId::from_uuid(request.tenant),
            DeductionId::from_uuid(request.deduction_id),
            ClaimId::from_uuid(request.claim_id),
            request.amount.into(),
            &request.actor,
        )
        .await?;
    Ok(Json(deduction.into()))
}
