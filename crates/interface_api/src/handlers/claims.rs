//! Claims handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{ClaimId, TenantId};
use domain_reconciliation::ClaimTransition;

use crate::dto::claims::*;
use crate::dto::common::TenantQuery;
use crate::{error::ApiError, AppState};

/// Creates a pending claim
pub async fn create_claim(
    State(state): State<AppState>,
    Json(request): Json<CreateClaimRequest>,
) -> Result<(StatusCode, Json<ClaimResponse>), ApiError> {
    request.validate()?;
    let claim = state.engine.lifecycle().create_claim(request.into()).await?;
    Ok((StatusCode::CREATED, Json(claim.into())))
}

/// Gets a claim by ID
pub async fn get_claim(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<TenantQuery>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let claim = state
        .engine
        .claim(query.tenant_id(), ClaimId::from_uuid(id))
        .await?;
    Ok(Json(claim.into()))
}

pub async fn submit_claim(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ClaimActionRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    transition(&state, id, request, |_| Ok(ClaimTransition::Submit)).await
}

/// Approves a claim; the body must carry the approved `amount`
pub async fn approve_claim(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ClaimActionRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    transition(&state, id, request, |r| {
        let amount = r.amount.ok_or_else(|| ApiError::missing("amount"))?;
        Ok(ClaimTransition::Approve { amount: amount.into() })
    })
    .await
}

pub async fn reject_claim(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ClaimActionRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    transition(&state, id, request, |r| {
        let reason = r.reason.clone().ok_or_else(|| ApiError::missing("reason"))?;
        Ok(ClaimTransition::Reject { reason })
    })
    .await
}

/// Settles a claim at `amount`, or at the approved amount when absent
pub async fn settle_claim(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ClaimActionRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    transition(&state, id, request, |r| {
        Ok(ClaimTransition::Settle {
            amount: r.amount.map(Into::into),
        })
    })
    .await
}

pub async fn write_off_claim(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ClaimActionRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    transition(&state, id, request, |r| {
        Ok(ClaimTransition::WriteOff {
            reason: r.reason.clone(),
        })
    })
    .await
}

async fn transition(
    state: &AppState,
    id: Uuid,
    request: ClaimActionRequest,
    build: impl FnOnce(&ClaimActionRequest) -> Result<ClaimTransition, ApiError>,
) -> Result<Json<ClaimResponse>, ApiError> {
    request.validate()?;
    let transition = build(&request)?;

    let claim = state
        .engine
        .lifecycle()
        .transition_claim(
            TenantId::from_uuid(request.tenant),
            ClaimId::from_uuid(id),
            transition,
            &request.actor,
        )
        .await?;
    Ok(Json(claim.into()))
}
