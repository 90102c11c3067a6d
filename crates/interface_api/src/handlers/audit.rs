//! Audit trail handler

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::dto::audit::AuditEntryResponse;
use crate::dto::common::TenantQuery;
use crate::{error::ApiError, AppState};

/// Audit entries for one claim, deduction or approval, oldest first
pub async fn audit_trail(
    State(state): State<AppState>,
    Path(entity_id): Path<Uuid>,
    Query(query): Query<TenantQuery>,
) -> Result<Json<Vec<AuditEntryResponse>>, ApiError> {
    let entries = state.engine.audit_trail(query.tenant_id(), entity_id).await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}
