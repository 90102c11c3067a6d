//! HTTP tests for the reconciliation API over the in-memory ledger

use axum::http::StatusCode;
use axum_test::TestServer;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::sync::Arc;

use domain_reconciliation::ports::mock::MockLedger;
use domain_reconciliation::{EngineConfig, ReconciliationEngine};
use interface_api::{config::ApiConfig, create_router};
use test_utils::{
    ApprovalBuilder, ClaimBuilder, DeductionBuilder, IdFixtures, MoneyFixtures, StringFixtures,
};

fn setup() -> (MockLedger, TestServer) {
    let ledger = MockLedger::new();
    let config = EngineConfig {
        retry_backoff_ms: 0,
        ..EngineConfig::default()
    };
    let engine = ReconciliationEngine::new(Arc::new(ledger.clone()), config);
    let server = TestServer::new(create_router(engine, ApiConfig::default()))
        .expect("Failed to create test server");
    (ledger, server)
}

fn tenant() -> String {
    IdFixtures::tenant_id().as_uuid().to_string()
}

fn usd(amount: &str) -> Value {
    json!({ "amount": amount, "currency": "USD" })
}

fn decimal(value: &Value) -> Decimal {
    serde_json::from_value(value.clone()).expect("not a decimal")
}

fn claim_body(amount: &str) -> Value {
    json!({
        "tenant": tenant(),
        "claimType": "promotion",
        "customerId": IdFixtures::customer_id().as_uuid(),
        "claimedAmount": usd(amount),
        "claimDate": "2024-02-15",
        "createdBy": StringFixtures::actor(),
        "supporting": { "promotionId": "PROMO-2024-17" }
    })
}

fn deduction_body(amount: &str) -> Value {
    json!({
        "tenant": tenant(),
        "deductionType": "promotional",
        "customerId": IdFixtures::customer_id().as_uuid(),
        "invoiceReference": StringFixtures::invoice_reference(),
        "deductionAmount": usd(amount),
        "deductionDate": "2024-02-20",
        "reasonCode": "PROMO",
        "actor": StringFixtures::actor()
    })
}

fn action(extra: Value) -> Value {
    let mut body = json!({ "tenant": tenant(), "actor": StringFixtures::approver() });
    if let (Some(body), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
        body.extend(extra.clone());
    }
    body
}

async fn create(server: &TestServer, path: &str, body: &Value) -> Value {
    let response = server.post(path).json(body).await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()
}

fn id_of(value: &Value) -> String {
    value["id"].as_str().expect("missing id").to_string()
}

// ============================================================================
// Health Tests
// ============================================================================

mod health_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_is_public() {
        let (_ledger, server) = setup();
        let response = server.get("/health").await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["status"], "healthy");
    }

    #[tokio::test]
    async fn test_readiness_reports_ledger_health() {
        let (_ledger, server) = setup();
        let response = server.get("/health/ready").await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["status"], "ready");
    }

    #[tokio::test]
    async fn test_responses_carry_a_request_id() {
        let (_ledger, server) = setup();
        let response = server.get("/health").await;
        assert!(response.headers().contains_key("x-request-id"));
    }
}

// ============================================================================
// Claim Tests
// ============================================================================

mod claim_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_fetch_claim() {
        let (_ledger, server) = setup();
        let created = create(&server, "/api/v1/claims", &claim_body("500.00")).await;

        assert_eq!(created["status"], "pending");
        assert_eq!(decimal(&created["claimedAmount"]["amount"]), dec!(500));
        assert_eq!(created["supporting"]["promotionId"], "PROMO-2024-17");
        assert!(created["claimNumber"].as_str().is_some());

        let fetched = server
            .get(&format!("/api/v1/claims/{}", id_of(&created)))
            .add_query_param("tenant", tenant())
            .await;
        fetched.assert_status_ok();
        assert_eq!(fetched.json::<Value>()["id"], created["id"]);
    }

    #[tokio::test]
    async fn test_amount_beyond_ledger_limit_is_unprocessable() {
        let (_ledger, server) = setup();
        let response = server
            .post("/api/v1/claims")
            .json(&claim_body("1000000000000000.00"))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_claim_is_not_visible_to_other_tenants() {
        let (_ledger, server) = setup();
        let created = create(&server, "/api/v1/claims", &claim_body("500.00")).await;

        let response = server
            .get(&format!("/api/v1/claims/{}", id_of(&created)))
            .add_query_param("tenant", IdFixtures::other_tenant_id().as_uuid())
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(response.json::<Value>()["error"], "not_found");
    }

    #[tokio::test]
    async fn test_non_positive_claim_amount_is_unprocessable() {
        let (_ledger, server) = setup();
        let response = server.post("/api/v1/claims").json(&claim_body("0")).await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_blank_creator_lists_field_errors() {
        let (_ledger, server) = setup();
        let mut body = claim_body("500.00");
        body["createdBy"] = json!("");

        let response = server.post("/api/v1/claims").json(&body).await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let error = response.json::<Value>();
        assert_eq!(error["error"], "validation_error");
        assert!(error["details"][0].as_str().unwrap().starts_with("created_by"));
    }

    #[tokio::test]
    async fn test_settling_a_pending_claim_is_a_conflict() {
        let (_ledger, server) = setup();
        let created = create(&server, "/api/v1/claims", &claim_body("500.00")).await;

        let response = server
            .post(&format!("/api/v1/claims/{}/settle", id_of(&created)))
            .json(&action(json!({})))
            .await;
        response.assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_approve_requires_amount() {
        let (_ledger, server) = setup();
        let created = create(&server, "/api/v1/claims", &claim_body("500.00")).await;

        let response = server
            .post(&format!("/api/v1/claims/{}/approve", id_of(&created)))
            .json(&action(json!({})))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_partial_approval_then_settlement() {
        let (_ledger, server) = setup();
        let created = create(&server, "/api/v1/claims", &claim_body("500.00")).await;
        let id = id_of(&created);

        server
            .post(&format!("/api/v1/claims/{id}/submit"))
            .json(&action(json!({})))
            .await
            .assert_status_ok();

        let approved = server
            .post(&format!("/api/v1/claims/{id}/approve"))
            .json(&action(json!({ "amount": usd("350.00") })))
            .await;
        approved.assert_status_ok();
        let approved = approved.json::<Value>();
        assert_eq!(approved["status"], "partially_approved");
        assert_eq!(decimal(&approved["approvedAmount"]["amount"]), dec!(350));

        let settled = server
            .post(&format!("/api/v1/claims/{id}/settle"))
            .json(&action(json!({})))
            .await;
        settled.assert_status_ok();
        let settled = settled.json::<Value>();
        assert_eq!(settled["status"], "settled");
        assert_eq!(decimal(&settled["settledAmount"]["amount"]), dec!(350));
        assert_eq!(settled["decision"]["kind"], "settled");
    }

    #[tokio::test]
    async fn test_reject_requires_reason() {
        let (_ledger, server) = setup();
        let created = create(&server, "/api/v1/claims", &claim_body("500.00")).await;
        let id = id_of(&created);
        server
            .post(&format!("/api/v1/claims/{id}/submit"))
            .json(&action(json!({})))
            .await
            .assert_status_ok();
        let path = format!("/api/v1/claims/{id}/reject");

        server
            .post(&path)
            .json(&action(json!({})))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let rejected = server
            .post(&path)
            .json(&action(json!({ "reason": "No proof of performance" })))
            .await;
        rejected.assert_status_ok();
        assert_eq!(rejected.json::<Value>()["status"], "rejected");
    }
}

// ============================================================================
// Deduction Tests
// ============================================================================

mod deduction_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_deduction_is_open_and_balanced() {
        let (_ledger, server) = setup();
        let created = create(&server, "/api/v1/deductions", &deduction_body("9200.00")).await;

        assert_eq!(created["status"], "open");
        assert_eq!(decimal(&created["remainingAmount"]["amount"]), dec!(9200));
        assert_eq!(decimal(&created["matchedAmount"]["amount"]), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_dispute_requires_reason() {
        let (_ledger, server) = setup();
        let created = create(&server, "/api/v1/deductions", &deduction_body("120.00")).await;
        let id = id_of(&created);
        server
            .post(&format!("/api/v1/deductions/{id}/review"))
            .json(&action(json!({})))
            .await
            .assert_status_ok();
        let path = format!("/api/v1/deductions/{id}/dispute");

        server
            .post(&path)
            .json(&action(json!({})))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let disputed = server
            .post(&path)
            .json(&action(json!({ "reason": StringFixtures::dispute_reason() })))
            .await;
        disputed.assert_status_ok();
        assert_eq!(disputed.json::<Value>()["status"], "disputed");
    }

    #[tokio::test]
    async fn test_review_then_write_off() {
        let (_ledger, server) = setup();
        let created = create(&server, "/api/v1/deductions", &deduction_body("75.00")).await;
        let id = id_of(&created);

        let reviewed = server
            .post(&format!("/api/v1/deductions/{id}/review"))
            .json(&action(json!({})))
            .await;
        reviewed.assert_status_ok();
        assert_eq!(reviewed.json::<Value>()["status"], "under_review");

        let written_off = server
            .post(&format!("/api/v1/deductions/{id}/write-off"))
            .json(&action(json!({ "reason": "Below collection threshold" })))
            .await;
        written_off.assert_status_ok();
        assert_eq!(written_off.json::<Value>()["status"], "written_off");
    }

    #[tokio::test]
    async fn test_unknown_deduction_is_not_found() {
        let (_ledger, server) = setup();
        let response = server
            .get(&format!("/api/v1/deductions/{}", IdFixtures::deduction_id().as_uuid()))
            .add_query_param("tenant", tenant())
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }
}

// ============================================================================
// Matching Tests
// ============================================================================

mod matching_tests {
    use super::*;

    #[tokio::test]
    async fn test_auto_match_pairs_exact_amounts() {
        let (ledger, server) = setup();
        let deduction = DeductionBuilder::new().build();
        let claim = ClaimBuilder::new().build();
        ledger.seed_deduction(deduction.clone()).await;
        ledger.seed_claim(claim.clone()).await;

        let response = server
            .post("/api/v1/match/auto")
            .json(&json!({ "tenant": tenant() }))
            .await;
        response.assert_status_ok();

        let body = response.json::<Value>();
        assert_eq!(body["count"], 1);
        assert_eq!(body["matches"][0]["deductionId"], json!(deduction.id));
        assert_eq!(body["matches"][0]["claimId"], json!(claim.id));
        assert_eq!(decimal(&body["matches"][0]["amount"]["amount"]), dec!(500));

        // Nothing left to pair
        let again = server
            .post("/api/v1/match/auto")
            .json(&json!({ "tenant": tenant(), "actor": "nightly-batch" }))
            .await;
        assert_eq!(again.json::<Value>()["count"], 0);
        assert_eq!(ledger.match_count().await, 1);
    }

    #[tokio::test]
    async fn test_manual_matches_until_exhausted() {
        let (ledger, server) = setup();
        let deduction = DeductionBuilder::new().build();
        let claim = ClaimBuilder::new().build();
        ledger.seed_deduction(deduction.clone()).await;
        ledger.seed_claim(claim.clone()).await;

        let request = |amount: &str| {
            json!({
                "tenant": tenant(),
                "deductionId": deduction.id,
                "claimId": claim.id,
                "amount": usd(amount),
                "actor": StringFixtures::actor()
            })
        };

        let first = server.post("/api/v1/match/manual").json(&request("200.00")).await;
        first.assert_status_ok();
        assert_eq!(first.json::<Value>()["status"], "open");

        let second = server.post("/api/v1/match/manual").json(&request("300.00")).await;
        second.assert_status_ok();
        let second = second.json::<Value>();
        assert_eq!(second["status"], "matched");
        assert_eq!(decimal(&second["remainingAmount"]["amount"]), Decimal::ZERO);

        let third = server.post("/api/v1/match/manual").json(&request("0.01")).await;
        third.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(ledger.match_count().await, 2);
    }

    #[tokio::test]
    async fn test_manual_match_of_unknown_claim_is_not_found() {
        let (ledger, server) = setup();
        let deduction = DeductionBuilder::new().build();
        ledger.seed_deduction(deduction.clone()).await;

        let response = server
            .post("/api/v1/match/manual")
            .json(&json!({
                "tenant": tenant(),
                "deductionId": deduction.id,
                "claimId": IdFixtures::claim_id(),
                "amount": usd("100.00"),
                "actor": StringFixtures::actor()
            }))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }
}

// ============================================================================
// Approval Tests
// ============================================================================

mod approval_tests {
    use super::*;

    fn approval_body() -> Value {
        json!({
            "tenant": tenant(),
            "entityType": "promotion",
            "entityId": "550e8400-e29b-41d4-a716-446655440077",
            "entityName": "Spring end cap",
            "amount": usd("12500.00"),
            "priority": "high",
            "slaHours": 24,
            "requestedBy": StringFixtures::actor()
        })
    }

    #[tokio::test]
    async fn test_create_computes_due_date() {
        let (_ledger, server) = setup();
        let created = create(&server, "/api/v1/approvals", &approval_body()).await;

        assert_eq!(created["status"], "pending");
        assert_eq!(created["slaHours"], 24);
        let requested: chrono::DateTime<chrono::Utc> =
            serde_json::from_value(created["requestedAt"].clone()).unwrap();
        let due: chrono::DateTime<chrono::Utc> =
            serde_json::from_value(created["dueDate"].clone()).unwrap();
        assert_eq!(due - requested, chrono::Duration::hours(24));
    }

    #[tokio::test]
    async fn test_second_decision_is_a_conflict() {
        let (_ledger, server) = setup();
        let created = create(&server, "/api/v1/approvals", &approval_body()).await;
        let path = format!("/api/v1/approvals/{}/approve", id_of(&created));

        let approved = server
            .post(&path)
            .json(&action(json!({ "comments": "Within budget" })))
            .await;
        approved.assert_status_ok();
        let approved = approved.json::<Value>();
        assert_eq!(approved["status"], "approved");
        assert_eq!(approved["decision"]["by"], StringFixtures::approver());

        server
            .post(&path)
            .json(&action(json!({})))
            .await
            .assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_reject_requires_reason_and_cancel_does_not() {
        let (_ledger, server) = setup();
        let first = create(&server, "/api/v1/approvals", &approval_body()).await;
        let second = create(&server, "/api/v1/approvals", &approval_body()).await;

        server
            .post(&format!("/api/v1/approvals/{}/reject", id_of(&first)))
            .json(&action(json!({})))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let cancelled = server
            .post(&format!("/api/v1/approvals/{}/cancel", id_of(&second)))
            .json(&action(json!({})))
            .await;
        cancelled.assert_status_ok();
        assert_eq!(cancelled.json::<Value>()["status"], "cancelled");
    }

    #[tokio::test]
    async fn test_sla_past_due() {
        let (ledger, server) = setup();
        let approval = ApprovalBuilder::new().with_sla_hours(48).build();
        ledger.seed_approval(approval.clone()).await;

        let response = server
            .get(&format!("/api/v1/approvals/{}/sla", approval.id.as_uuid()))
            .add_query_param("tenant", tenant())
            .add_query_param("asOf", "2024-05-08T21:00:00Z")
            .await;
        response.assert_status_ok();

        let sla = response.json::<Value>();
        assert_eq!(sla["isOverdue"], true);
        assert_eq!(decimal(&sla["elapsedHours"]), dec!(60));
        assert_eq!(decimal(&sla["remainingHours"]), Decimal::ZERO);
        assert_eq!(decimal(&sla["percentComplete"]), dec!(100));
        assert_eq!(sla["state"], "overdue");
    }

    #[tokio::test]
    async fn test_queue_lists_pending_approvals_only() {
        let (_ledger, server) = setup();
        let decided = create(&server, "/api/v1/approvals", &approval_body()).await;
        let waiting = create(&server, "/api/v1/approvals", &approval_body()).await;
        server
            .post(&format!("/api/v1/approvals/{}/approve", id_of(&decided)))
            .json(&action(json!({})))
            .await
            .assert_status_ok();

        let response = server
            .get("/api/v1/approvals/queue")
            .add_query_param("tenant", tenant())
            .await;
        response.assert_status_ok();

        let queue = response.json::<Value>();
        let entries = queue.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["approval"]["id"], waiting["id"]);
        assert_eq!(entries[0]["state"], "on_track");
    }
}

// ============================================================================
// Report and Audit Tests
// ============================================================================

mod report_tests {
    use super::*;

    #[tokio::test]
    async fn test_reconcile_reports_variance() {
        let (ledger, server) = setup();
        ledger
            .seed_claim(ClaimBuilder::new().with_amount(MoneyFixtures::usd_10_000()).build())
            .await;
        ledger
            .seed_deduction(DeductionBuilder::new().with_amount(MoneyFixtures::usd_9_200()).build())
            .await;

        let response = server
            .get("/api/v1/reconcile")
            .add_query_param("tenant", tenant())
            .add_query_param("customer", IdFixtures::customer_id().as_uuid())
            .add_query_param("startDate", "2024-01-01")
            .add_query_param("endDate", "2024-03-31")
            .add_query_param("asOf", "2024-03-31T12:00:00Z")
            .await;
        response.assert_status_ok();

        let report = response.json::<Value>();
        assert_eq!(decimal(&report["variance"]["amount"]), dec!(800));
        assert_eq!(decimal(&report["variancePercent"]), dec!(8.70));
        assert_eq!(report["currency"], "USD");
        assert_eq!(report["aging"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_inverted_window_is_unprocessable() {
        let (_ledger, server) = setup();
        let response = server
            .get("/api/v1/reconcile")
            .add_query_param("tenant", tenant())
            .add_query_param("startDate", "2024-04-01")
            .add_query_param("endDate", "2024-03-31")
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_audit_trail_follows_transitions() {
        let (_ledger, server) = setup();
        let created = create(&server, "/api/v1/claims", &claim_body("500.00")).await;
        let id = id_of(&created);
        server
            .post(&format!("/api/v1/claims/{id}/submit"))
            .json(&action(json!({})))
            .await
            .assert_status_ok();

        let response = server
            .get(&format!("/api/v1/audit/{id}"))
            .add_query_param("tenant", tenant())
            .await;
        response.assert_status_ok();

        let trail = response.json::<Value>();
        let actions: Vec<&str> = trail
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["action"].as_str().unwrap())
            .collect();
        assert_eq!(actions, vec!["create", "submit"]);
        assert_eq!(trail[1]["toStatus"], "under_review");
        assert_eq!(trail[1]["actor"], StringFixtures::approver());
    }
}
