//! Approval handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use core_kernel::{ApprovalId, TenantId};
use domain_reconciliation::ApprovalTransition;

use crate::dto::approvals::*;
use crate::dto::common::TenantQuery;
use crate::{error::ApiError, AppState};

/// Raises an approval request; the response carries the computed due date
pub async fn create_approval(
    State(state): State<AppState>,
    Json(request): Json<CreateApprovalRequest>,
) -> Result<(StatusCode, Json<ApprovalResponse>), ApiError> {
    request.validate()?;
    let approval = state.engine.lifecycle().create_approval(request.into()).await?;
    Ok((StatusCode::CREATED, Json(approval.into())))
}

pub async fn get_approval(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<TenantQuery>,
) -> Result<Json<ApprovalResponse>, ApiError> {
    let approval = state
        .engine
        .approval(query.tenant_id(), ApprovalId::from_uuid(id))
        .await?;
    Ok(Json(approval.into()))
}

pub async fn approve(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ApprovalActionRequest>,
) -> Result<Json<ApprovalResponse>, ApiError> {
    decide(&state, id, request, |r| {
        Ok(ApprovalTransition::Approve {
            comments: r.comments.clone(),
        })
    })
    .await
}

/// Rejects an approval; the body must carry a `reason`
pub async fn reject(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ApprovalActionRequest>,
) -> Result<Json<ApprovalResponse>, ApiError> {
    decide(&state, id, request, |r| {
        let reason = r.reason.clone().ok_or_else(|| ApiError::missing("reason"))?;
        Ok(ApprovalTransition::Reject {
            reason,
            comments: r.comments.clone(),
        })
    })
    .await
}

pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ApprovalActionRequest>,
) -> Result<Json<ApprovalResponse>, ApiError> {
    decide(&state, id, request, |r| {
        Ok(ApprovalTransition::Cancel {
            reason: r.reason.clone(),
        })
    })
    .await
}

/// SLA position of one approval, at `asOf` or now
pub async fn get_sla(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<SlaQuery>,
) -> Result<Json<SlaResponse>, ApiError> {
    let as_of = query.as_of.unwrap_or_else(Utc::now);
    let approval_id = ApprovalId::from_uuid(id);

    let sla = state
        .engine
        .sla()
        .approval_sla(TenantId::from_uuid(query.tenant), approval_id, as_of)
        .await?;

    Ok(Json(SlaResponse {
        approval_id,
        as_of,
        state: sla.state(state.engine.config().sla_warning_percent),
        sla,
    }))
}

/// Pending approvals in work order
pub async fn work_queue(
    State(state): State<AppState>,
    Query(query): Query<TenantQuery>,
) -> Result<Json<Vec<QueueEntryResponse>>, ApiError> {
    let queue = state.engine.sla().work_queue(query.tenant_id(), Utc::now()).await?;
    Ok(Json(queue.into_iter().map(Into::into).collect()))
}

async fn decide(
    state: &AppState,
    id: Uuid,
    request: ApprovalActionRequest,
    build: impl FnOnce(&ApprovalActionRequest) -> Result<ApprovalTransition, ApiError>,
) -> Result<Json<ApprovalResponse>, ApiError> {
    request.validate()?;
    let transition = build(&request)?;

    let approval = state
        .engine
        .lifecycle()
        .decide_approval(
            TenantId::from_uuid(request.tenant),
            ApprovalId::from_uuid(id),
            transition,
            &request.actor,
        )
        .await?;
    Ok(Json(approval.into()))
}
