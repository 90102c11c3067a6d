//! Reconciliation report handler

use axum::{
    extract::{Query, State},
    Json,
};

use domain_reconciliation::ReconciliationReport;

use crate::dto::reports::ReconcileParams;
use crate::{error::ApiError, AppState};

/// Builds the reconciliation report for a window
pub async fn reconcile(
    State(state): State<AppState>,
    Query(params): Query<ReconcileParams>,
) -> Result<Json<ReconciliationReport>, ApiError> {
    let query = params.to_query()?;
    let report = state.engine.reporter().reconcile(params.tenant_id(), &query).await?;
    Ok(Json(report))
}
