//! Bill registration and payment.
//!
//! Registration stores the structured barcode data with the fee already
//! folded into a final amount. Payment is a ledger unit: lock the bill row,
//! then the payer's account row, debit the final amount and mark the bill
//! paid in the same transaction.

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{BarcodeInfo, Bill, BillRow, BillStatus, DomainError, OperationContext};
use crate::fees::BILL_PAYMENT_FEE_CENTS;
use crate::ledger;
use crate::validation::validate_amount;

const BILL_COLUMNS: &str = "id, account_id, status, barcode, amount_cents, fee_cents, \
     final_amount_cents, recipient_name, due_date, payment_date, created_at, updated_at";

const DEFAULT_PAGE_LIMIT: i64 = 20;
const MAX_PAGE_LIMIT: i64 = 100;

/// One page of an account's bills, newest first.
#[derive(Debug, serde::Serialize)]
pub struct BillPage {
    pub bills: Vec<Bill>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

pub struct BillService {
    pool: PgPool,
}

impl BillService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Register a bill from parsed barcode data. The same barcode can be
    /// registered at most once per account.
    pub async fn register(
        &self,
        ctx: &OperationContext,
        info: BarcodeInfo,
    ) -> Result<Bill, DomainError> {
        validate_amount(info.amount_cents)?;

        let fee_cents = BILL_PAYMENT_FEE_CENTS;
        let final_amount_cents = info.amount_cents + fee_cents;

        let row: Result<BillRow, sqlx::Error> = sqlx::query_as(&format!(
            r#"
            INSERT INTO bills (id, account_id, status, barcode, amount_cents, fee_cents,
                               final_amount_cents, recipient_name, due_date)
            VALUES ($1, $2, 'pending', $3, $4, $5, $6, $7, $8)
            RETURNING {BILL_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(ctx.account_id)
        .bind(&info.barcode)
        .bind(info.amount_cents)
        .bind(fee_cents)
        .bind(final_amount_cents)
        .bind(&info.recipient_name)
        .bind(info.due_date)
        .fetch_one(&self.pool)
        .await;

        let row = row.map_err(|err| {
            if crate::db::is_unique_violation(&err) {
                DomainError::DuplicateBarcode
            } else {
                DomainError::Storage(err)
            }
        })?;

        tracing::info!(bill_id = %row.id, account_id = %ctx.account_id, "bill registered");
        row.try_into()
    }

    /// Pay a registered bill from the caller's balance. Pending and overdue
    /// bills are payable; paying twice is rejected.
    pub async fn pay(&self, ctx: &OperationContext, bill_id: Uuid) -> Result<Bill, DomainError> {
        let mut tx = self.pool.begin().await?;

        let row: Option<BillRow> = sqlx::query_as(&format!(
            "SELECT {BILL_COLUMNS} FROM bills WHERE id = $1 FOR UPDATE"
        ))
        .bind(bill_id)
        .fetch_optional(&mut *tx)
        .await?;
        let row = row.ok_or(DomainError::BillNotFound(bill_id))?;

        if row.account_id != ctx.account_id {
            return Err(DomainError::NotOwner);
        }

        let bill: Bill = row.try_into()?;
        match bill.status {
            BillStatus::Paid => return Err(DomainError::BillAlreadyPaid),
            BillStatus::Cancelled => return Err(DomainError::BillCancelled),
            BillStatus::Pending | BillStatus::Overdue => {}
        }

        let account = ledger::lock_account(&mut *tx, ctx.account_id).await?;
        account.ensure_can_debit(bill.final_amount_cents)?;
        ledger::apply_delta(&mut *tx, account.id, -bill.final_amount_cents).await?;

        let row: BillRow = sqlx::query_as(&format!(
            "UPDATE bills SET status = 'paid', payment_date = NOW(), updated_at = NOW() \
             WHERE id = $1 RETURNING {BILL_COLUMNS}"
        ))
        .bind(bill_id)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::info!(
            bill_id = %bill_id,
            account_id = %ctx.account_id,
            final_amount_cents = bill.final_amount_cents,
            "bill paid"
        );
        row.try_into()
    }

    /// Cancel an unpaid bill. Nothing was debited for it, so nothing is
    /// refunded.
    pub async fn cancel(&self, ctx: &OperationContext, bill_id: Uuid) -> Result<Bill, DomainError> {
        let mut tx = self.pool.begin().await?;

        let row: Option<BillRow> = sqlx::query_as(&format!(
            "SELECT {BILL_COLUMNS} FROM bills WHERE id = $1 FOR UPDATE"
        ))
        .bind(bill_id)
        .fetch_optional(&mut *tx)
        .await?;
        let row = row.ok_or(DomainError::BillNotFound(bill_id))?;

        if row.account_id != ctx.account_id {
            return Err(DomainError::NotOwner);
        }

        let bill: Bill = row.try_into()?;
        match bill.status {
            BillStatus::Paid => return Err(DomainError::BillAlreadyPaid),
            BillStatus::Cancelled => return Err(DomainError::BillCancelled),
            BillStatus::Pending | BillStatus::Overdue => {}
        }

        let row: BillRow = sqlx::query_as(&format!(
            "UPDATE bills SET status = 'cancelled', updated_at = NOW() \
             WHERE id = $1 RETURNING {BILL_COLUMNS}"
        ))
        .bind(bill_id)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::info!(bill_id = %bill_id, account_id = %ctx.account_id, "bill cancelled");
        row.try_into()
    }

    /// Fetch one of the caller's bills.
    pub async fn get(&self, ctx: &OperationContext, bill_id: Uuid) -> Result<Bill, DomainError> {
        let row: Option<BillRow> =
            sqlx::query_as(&format!("SELECT {BILL_COLUMNS} FROM bills WHERE id = $1"))
                .bind(bill_id)
                .fetch_optional(&self.pool)
                .await?;

        let row = row.ok_or(DomainError::BillNotFound(bill_id))?;
        if row.account_id != ctx.account_id {
            return Err(DomainError::NotOwner);
        }
        row.try_into()
    }

    /// List the caller's bills, newest first, optionally filtered by status.
    pub async fn list(
        &self,
        ctx: &OperationContext,
        status: Option<BillStatus>,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> Result<BillPage, DomainError> {
        let page = page.unwrap_or(1).max(1);
        let limit = limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT);
        let offset = (page - 1) * limit;
        let status = status.map(|s| s.as_str());

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bills WHERE account_id = $1 AND ($2::TEXT IS NULL OR status = $2)",
        )
        .bind(ctx.account_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        let rows: Vec<BillRow> = sqlx::query_as(&format!(
            "SELECT {BILL_COLUMNS} FROM bills \
             WHERE account_id = $1 AND ($2::TEXT IS NULL OR status = $2) \
             ORDER BY created_at DESC LIMIT $3 OFFSET $4"
        ))
        .bind(ctx.account_id)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let bills = rows
            .into_iter()
            .map(Bill::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(BillPage {
            bills,
            total,
            page,
            limit,
        })
    }

    /// Flip unpaid bills whose due date has passed to `overdue`. Overdue
    /// bills stay payable; the status only drives presentation and
    /// follow-up. Returns the number of bills flipped.
    pub async fn mark_overdue(&self, today: NaiveDate) -> Result<u64, DomainError> {
        let result = sqlx::query(
            "UPDATE bills SET status = 'overdue', updated_at = NOW() \
             WHERE status = 'pending' AND due_date < $1",
        )
        .bind(today)
        .execute(&self.pool)
        .await?;

        let flipped = result.rows_affected();
        if flipped > 0 {
            tracing::info!(count = flipped, "bills marked overdue");
        }
        Ok(flipped)
    }
}
