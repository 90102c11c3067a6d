//! HTTP API Layer
//!
//! This crate provides the REST API for the reconciliation engine using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Request handlers for each resource
//! - **Middleware**: Request ids, tracing, audit logging
//! - **DTOs**: camelCase request/response bodies
//! - **Error Handling**: Engine errors mapped onto consistent error responses
//!
//! The acting user is passed in request bodies and echoed in the
//! `x-actor` header for the audit log; authentication happens upstream.
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::create_router;
//!
//! let app = create_router(engine, config);
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use domain_reconciliation::ReconciliationEngine;

use crate::config::ApiConfig;
use crate::handlers::{approvals, audit, claims, deductions, health, matching, reports};
use crate::middleware::audit_middleware;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: ReconciliationEngine,
    pub config: Arc<ApiConfig>,
}

/// Creates the main API router
///
/// # Arguments
///
/// * `engine` - Reconciliation engine bound to a ledger
/// * `config` - API configuration
///
/// # Returns
///
/// Configured Axum router with all routes and middleware
pub fn create_router(engine: ReconciliationEngine, config: ApiConfig) -> Router {
    let state = AppState {
        engine,
        config: Arc::new(config),
    };

    // Public routes
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let matching_routes = Router::new()
        .route("/auto", post(matching::auto_match))
        .route("/manual", post(matching::manual_match));

    let claims_routes = Router::new()
        .route("/", post(claims::create_claim))
        .route("/:id", get(claims::get_claim))
        .route("/:id/submit", post(claims::submit_claim))
        .route("/:id/approve", post(claims::approve_claim))
        .route("/:id/reject", post(claims::reject_claim))
        .route("/:id/settle", post(claims::settle_claim))
        .route("/:id/write-off", post(claims::write_off_claim));

    let deductions_routes = Router::new()
        .route("/", post(deductions::create_deduction))
        .route("/:id", get(deductions::get_deduction))
        .route("/:id/review", post(deductions::review_deduction))
        .route("/:id/approve", post(deductions::approve_deduction))
        .route("/:id/dispute", post(deductions::dispute_deduction))
        .route("/:id/write-off", post(deductions::write_off_deduction));

    let approvals_routes = Router::new()
        .route("/", post(approvals::create_approval))
        .route("/queue", get(approvals::work_queue))
        .route("/:id", get(approvals::get_approval))
        .route("/:id/approve", post(approvals::approve))
        .route("/:id/reject", post(approvals::reject))
        .route("/:id/cancel", post(approvals::cancel))
        .route("/:id/sla", get(approvals::get_sla));

    let api_routes = Router::new()
        .nest("/match", matching_routes)
        .nest("/claims", claims_routes)
        .nest("/deductions", deductions_routes)
        .nest("/approvals", approvals_routes)
        .route("/reconcile", get(reports::reconcile))
        .route("/audit/:entity_id", get(audit::audit_trail))
        .layer(axum_middleware::from_fn(audit_middleware));

    // Combine all routes
    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
