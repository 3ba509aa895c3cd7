//! API Routes
//!
//! HTTP endpoint definitions. Handlers are thin adapters: deserialize the
//! request, hand it to a service with the caller's [`OperationContext`],
//! serialize the domain object back.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{Account, BarcodeInfo, Bill, BillStatus, OperationContext, Transfer};
use crate::error::AppResult;
use crate::services::{
    AccountService, BillPage, BillService, P2pTransfer, PixTransfer, TedTransfer, TransferPage,
    TransferRequest, TransferService,
};

// =========================================================================
// Request types
// =========================================================================

#[derive(Debug, Deserialize)]
pub struct AmountRequest {
    pub amount_cents: i64,
}

#[derive(Debug, Deserialize)]
pub struct RegisterBillRequest {
    pub barcode: String,
    pub amount_cents: i64,
    pub due_date: NaiveDate,
    pub recipient_name: String,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct BillListQuery {
    #[serde(default)]
    pub status: Option<BillStatus>,
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

// =========================================================================
// Router
// =========================================================================

/// Create the API router with all routes
pub fn create_router() -> Router<PgPool> {
    Router::new()
        // Accounts
        .route("/accounts", post(open_account))
        .route("/accounts/me", get(get_account))
        // Transfers
        .route("/transfers/pix", post(transfer_pix))
        .route("/transfers/ted", post(transfer_ted))
        .route("/transfers/p2p", post(transfer_p2p))
        .route("/transfers/deposit", post(deposit))
        .route("/transfers/withdrawal", post(withdraw))
        .route("/transfers", get(list_transfers))
        .route("/transfers/:transfer_id", get(get_transfer))
        .route("/transfers/:transfer_id/cancel", post(cancel_transfer))
        // Bills
        .route("/bills", post(register_bill))
        .route("/bills", get(list_bills))
        .route("/bills/:bill_id", get(get_bill))
        .route("/bills/:bill_id/pay", post(pay_bill))
        .route("/bills/:bill_id/cancel", post(cancel_bill))
}

// =========================================================================
// Account handlers
// =========================================================================

async fn open_account(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
) -> AppResult<(StatusCode, Json<Account>)> {
    let account = AccountService::new(pool).open(context.account_id).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

async fn get_account(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
) -> AppResult<Json<Account>> {
    let account = AccountService::new(pool).get(context.account_id).await?;
    Ok(Json(account))
}

// =========================================================================
// Transfer handlers
// =========================================================================

async fn transfer_pix(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    Json(request): Json<PixTransfer>,
) -> AppResult<(StatusCode, Json<Transfer>)> {
    execute_transfer(pool, context, TransferRequest::Pix(request)).await
}

async fn transfer_ted(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    Json(request): Json<TedTransfer>,
) -> AppResult<(StatusCode, Json<Transfer>)> {
    execute_transfer(pool, context, TransferRequest::Ted(request)).await
}

async fn transfer_p2p(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    Json(request): Json<P2pTransfer>,
) -> AppResult<(StatusCode, Json<Transfer>)> {
    execute_transfer(pool, context, TransferRequest::P2p(request)).await
}

async fn execute_transfer(
    pool: PgPool,
    context: OperationContext,
    request: TransferRequest,
) -> AppResult<(StatusCode, Json<Transfer>)> {
    let transfer = TransferService::new(pool).execute(&context, request).await?;
    Ok((StatusCode::CREATED, Json(transfer)))
}

async fn deposit(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    Json(request): Json<AmountRequest>,
) -> AppResult<(StatusCode, Json<Transfer>)> {
    let transfer = TransferService::new(pool)
        .deposit(&context, request.amount_cents)
        .await?;
    Ok((StatusCode::CREATED, Json(transfer)))
}

async fn withdraw(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    Json(request): Json<AmountRequest>,
) -> AppResult<(StatusCode, Json<Transfer>)> {
    let transfer = TransferService::new(pool)
        .withdraw(&context, request.amount_cents)
        .await?;
    Ok((StatusCode::CREATED, Json(transfer)))
}

async fn list_transfers(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<TransferPage>> {
    let page = TransferService::new(pool)
        .list(&context, query.page, query.limit)
        .await?;
    Ok(Json(page))
}

async fn get_transfer(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    Path(transfer_id): Path<Uuid>,
) -> AppResult<Json<Transfer>> {
    let transfer = TransferService::new(pool).get(&context, transfer_id).await?;
    Ok(Json(transfer))
}

async fn cancel_transfer(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    Path(transfer_id): Path<Uuid>,
) -> AppResult<Json<Transfer>> {
    let transfer = TransferService::new(pool)
        .cancel(&context, transfer_id)
        .await?;
    Ok(Json(transfer))
}

// =========================================================================
// Bill handlers
// =========================================================================

async fn register_bill(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    Json(request): Json<RegisterBillRequest>,
) -> AppResult<(StatusCode, Json<Bill>)> {
    let info = BarcodeInfo {
        barcode: request.barcode,
        amount_cents: request.amount_cents,
        due_date: request.due_date,
        recipient_name: request.recipient_name,
    };
    let bill = BillService::new(pool).register(&context, info).await?;
    Ok((StatusCode::CREATED, Json(bill)))
}

async fn list_bills(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    Query(query): Query<BillListQuery>,
) -> AppResult<Json<BillPage>> {
    let page = BillService::new(pool)
        .list(&context, query.status, query.page, query.limit)
        .await?;
    Ok(Json(page))
}

async fn get_bill(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    Path(bill_id): Path<Uuid>,
) -> AppResult<Json<Bill>> {
    let bill = BillService::new(pool).get(&context, bill_id).await?;
    Ok(Json(bill))
}

async fn pay_bill(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    Path(bill_id): Path<Uuid>,
) -> AppResult<Json<Bill>> {
    let bill = BillService::new(pool).pay(&context, bill_id).await?;
    Ok(Json(bill))
}

async fn cancel_bill(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    Path(bill_id): Path<Uuid>,
) -> AppResult<Json<Bill>> {
    let bill = BillService::new(pool).cancel(&context, bill_id).await?;
    Ok(Json(bill))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_bill_request_deserialize() {
        let json = r#"{
            "barcode": "34191790010104351004791020150008291070026000",
            "amount_cents": 26000,
            "due_date": "2026-09-15",
            "recipient_name": "Energia SA"
        }"#;

        let request: RegisterBillRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.amount_cents, 26_000);
        assert_eq!(
            request.due_date,
            NaiveDate::from_ymd_opt(2026, 9, 15).unwrap()
        );
    }

    #[test]
    fn test_bill_list_query_status_filter() {
        let query: BillListQuery = serde_json::from_str(r#"{"status": "overdue"}"#).unwrap();
        assert_eq!(query.status, Some(BillStatus::Overdue));
        assert!(query.page.is_none());
    }

    #[test]
    fn test_page_query_defaults() {
        let query: PageQuery = serde_json::from_str("{}").unwrap();
        assert!(query.page.is_none());
        assert!(query.limit.is_none());
    }
}
