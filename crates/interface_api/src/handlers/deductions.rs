//! Deductions handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{DeductionId, TenantId};
use domain_reconciliation::DeductionTransition;

use crate::dto::common::TenantQuery;
use crate::dto::deductions::*;
use crate::{error::ApiError, AppState};

/// Records an open deduction
pub async fn create_deduction(
    State(state): State<AppState>,
    Json(request): Json<CreateDeductionRequest>,
) -> Result<(StatusCode, Json<DeductionResponse>), ApiError> {
    request.validate()?;
    let (input, actor) = request.into_parts();
    let deduction = state.engine.lifecycle().create_deduction(input, &actor).await?;
    Ok((StatusCode::CREATED, Json(deduction.into())))
}

pub async fn get_deduction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<TenantQuery>,
) -> Result<Json<DeductionResponse>, ApiError> {
    let deduction = state
        .engine
        .deduction(query.tenant_id(), DeductionId::from_uuid(id))
        .await?;
    Ok(Json(deduction.into()))
}

pub async fn review_deduction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<DeductionActionRequest>,
) -> Result<Json<DeductionResponse>, ApiError> {
    transition(&state, id, request, |_| Ok(DeductionTransition::Review)).await
}

pub async fn approve_deduction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<DeductionActionRequest>,
) -> Result<Json<DeductionResponse>, ApiError> {
    transition(&state, id, request, |_| Ok(DeductionTransition::Approve)).await
}

/// Disputes a deduction; the body must carry a `reason`
pub async fn dispute_deduction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<DeductionActionRequest>,
) -> Result<Json<DeductionResponse>, ApiError> {
    transition(&state, id, request, |r| {
        let reason = r.reason.clone().ok_or_else(|| ApiError::missing("reason"))?;
        Ok(DeductionTransition::Dispute { reason })
    })
    .await
}

pub async fn write_off_deduction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<DeductionActionRequest>,
) -> Result<Json<DeductionResponse>, ApiError> {
    transition(&state, id, request, |r| {
        Ok(DeductionTransition::WriteOff {
            reason: r.reason.clone(),
        })
    })
    .await
}

async fn transition(
    state: &AppState,
    id: Uuid,
    request: DeductionActionRequest,
    build: impl FnOnce(&DeductionActionRequest) -> Result<DeductionTransition, ApiError>,
) -> Result<Json<DeductionResponse>, ApiError> {
    request.validate()?;
    let transition = build(&request)?;

    let deduction = state
        .engine
        .lifecycle()
        .transition_deduction(
            TenantId::from_uuid(request.tenant),
            DeductionId::from_uuid(id),
            transition,
            &request.actor,
        )
        .await?;
    Ok(Json(deduction.into()))
}
