//! Bill API integration tests
//!
//! Run against a migrated Postgres database:
//! `DATABASE_URL=... cargo test -- --ignored`

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::util::ServiceExt;
use uuid::Uuid;

mod common;

async fn send(app: &Router, method: &str, uri: &str, user_id: Uuid, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("X-User-Id", user_id.to_string())
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn bill_body(barcode: &str, amount_cents: i64) -> Value {
    json!({
        "barcode": barcode,
        "amount_cents": amount_cents,
        "due_date": "2026-09-15",
        "recipient_name": "Energia SA"
    })
}

const BARCODE: &str = "34191790010104351004791020150008291070026000";

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_register_and_pay_bill() {
    let pool = common::setup_test_db().await;
    let app = common::test_app(pool.clone());
    let account = common::seed_account(&pool, 30_000, 100_000, 500_000).await;

    let (status, body) = send(&app, "POST", "/bills", account, bill_body(BARCODE, 26_000)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["status"], "pending");
    assert_eq!(body["fee_cents"], 200);
    assert_eq!(body["final_amount_cents"], 26_200);
    let bill_id = body["id"].as_str().unwrap().to_string();

    // Registration alone moves no money
    assert_eq!(common::balance_of(&pool, account).await, 30_000);

    let (status, body) = send(&app, "POST", &format!("/bills/{bill_id}/pay"), account, json!({})).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], "paid");
    assert!(body["payment_date"].is_string());
    assert_eq!(common::balance_of(&pool, account).await, 30_000 - 26_200);

    // Paying twice is rejected and debits nothing further
    let (status, body) = send(&app, "POST", &format!("/bills/{bill_id}/pay"), account, json!({})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error_code"], "bill_already_paid");
    assert_eq!(common::balance_of(&pool, account).await, 30_000 - 26_200);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_duplicate_barcode_conflict() {
    let pool = common::setup_test_db().await;
    let app = common::test_app(pool.clone());
    let account = common::seed_account(&pool, 100_000, 100_000, 500_000).await;

    let (status, _) = send(&app, "POST", "/bills", account, bill_body(BARCODE, 26_000)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, "POST", "/bills", account, bill_body(BARCODE, 26_000)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error_code"], "duplicate_barcode");
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_underfunded_payment_leaves_bill_pending() {
    let pool = common::setup_test_db().await;
    let app = common::test_app(pool.clone());
    let account = common::seed_account(&pool, 10_000, 100_000, 500_000).await;

    let (status, body) = send(&app, "POST", "/bills", account, bill_body(BARCODE, 26_000)).await;
    assert_eq!(status, StatusCode::CREATED);
    let bill_id = body["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "POST", &format!("/bills/{bill_id}/pay"), account, json!({})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error_code"], "insufficient_balance");

    let (status, body) = send(&app, "GET", &format!("/bills/{bill_id}"), account, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "pending");
    assert_eq!(common::balance_of(&pool, account).await, 10_000);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_overdue_bill_remains_payable() {
    let pool = common::setup_test_db().await;
    let app = common::test_app(pool.clone());
    let account = common::seed_account(&pool, 50_000, 100_000, 500_000).await;

    let (status, body) = send(
        &app,
        "POST",
        "/bills",
        account,
        json!({
            "barcode": BARCODE,
            "amount_cents": 26_000,
            "due_date": "2026-01-10",
            "recipient_name": "Energia SA"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let bill_id = body["id"].as_str().unwrap().to_string();

    let flipped = finbank::jobs::mark_overdue_bills(&pool).await.unwrap();
    assert_eq!(flipped, 1);

    let (status, body) = send(&app, "GET", &format!("/bills/{bill_id}"), account, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "overdue");

    let (status, body) = send(&app, "POST", &format!("/bills/{bill_id}/pay"), account, json!({})).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], "paid");
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_bills_are_scoped_to_their_owner() {
    let pool = common::setup_test_db().await;
    let app = common::test_app(pool.clone());
    let alice = common::seed_account(&pool, 50_000, 100_000, 500_000).await;
    let bob = common::seed_account(&pool, 50_000, 100_000, 500_000).await;

    let (status, body) = send(&app, "POST", "/bills", alice, bill_body(BARCODE, 26_000)).await;
    assert_eq!(status, StatusCode::CREATED);
    let bill_id = body["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "POST", &format!("/bills/{bill_id}/pay"), bob, json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error_code"], "not_owner");

    // Cancellation also requires ownership
    let (status, _) = send(&app, "POST", &format!("/bills/{bill_id}/cancel"), bob, json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "POST", &format!("/bills/{bill_id}/cancel"), alice, json!({})).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], "cancelled");

    // A cancelled bill is no longer payable
    let (status, body) = send(&app, "POST", &format!("/bills/{bill_id}/pay"), alice, json!({})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error_code"], "bill_cancelled");
}
