//! Transfer execution and lifecycle.
//!
//! The synchronous path runs the whole unit inside one transaction: lock
//! the account rows, re-read the rolling limit sums under the lock, apply
//! the balance deltas, and insert the transfer row already `completed`.
//! Transfers scheduled for the future are recorded as `pending` without
//! touching any balance; the settlement job debits them when due.

use chrono::{DateTime, Utc};
use rand::Rng;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::money::CURRENCY;
use crate::domain::{
    DomainError, OperationContext, Transfer, TransferKind, TransferRow, TransferStatus,
};
use crate::fees::transfer_fee_cents;
use crate::ledger::{self, LockedAccount};
use crate::limits::{check_limits, movable_sum, window_bounds};
use crate::validation::{validate_amount, validate_pix_key, validate_ted};

use super::requests::TransferRequest;

pub(crate) const TRANSFER_COLUMNS: &str = "id, account_id, kind, status, amount_cents, fee_cents, \
     currency, pix_key, pix_key_type, recipient_name, recipient_document, recipient_bank, \
     recipient_branch, recipient_account, recipient_account_type, recipient_account_id, \
     scheduled_for, completed_at, failure_reason, authentication_code, created_at, updated_at";

const DEFAULT_PAGE_LIMIT: i64 = 20;
const MAX_PAGE_LIMIT: i64 = 100;

/// One page of an account's transfer history, newest first.
#[derive(Debug, serde::Serialize)]
pub struct TransferPage {
    pub transfers: Vec<Transfer>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

pub struct TransferService {
    pool: PgPool,
}

impl TransferService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Execute a transfer for the calling account.
    ///
    /// Validation happens before any lock is taken; a request rejected here
    /// has no side effects. A request with a future `scheduled_for` only
    /// records a `pending` row (which still reserves limit capacity), so
    /// the balance check is deferred to settlement.
    pub async fn execute(
        &self,
        ctx: &OperationContext,
        request: TransferRequest,
    ) -> Result<Transfer, DomainError> {
        validate_request(&request)?;

        if request.recipient_account_id() == Some(ctx.account_id) {
            return Err(DomainError::SelfTransfer);
        }

        let kind = request.kind();
        let amount_cents = request.amount_cents();
        let fee_cents = transfer_fee_cents(kind);
        let total_cents = amount_cents + fee_cents;
        let now = Utc::now();
        let scheduled_for = request.scheduled_for().filter(|at| *at > now);

        let mut tx = self.pool.begin().await?;

        // Lock order is ascending account id, independent of direction.
        let recipient_id = request.recipient_account_id();
        let (sender, recipient) = match recipient_id {
            Some(recipient_id) => {
                let (sender, recipient) =
                    ledger::lock_account_pair(&mut *tx, ctx.account_id, recipient_id)
                        .await
                        .map_err(|err| match err {
                            DomainError::AccountNotFound(id) if id == recipient_id => {
                                DomainError::RecipientNotFound(id)
                            }
                            other => other,
                        })?;
                (sender, Some(recipient))
            }
            None => (ledger::lock_account(&mut *tx, ctx.account_id).await?, None),
        };

        sender.ensure_active()?;
        if let Some(recipient) = &recipient {
            recipient.ensure_active()?;
        }

        check_limits_in_tx(&mut tx, &sender, total_cents, now).await?;

        let transfer = if let Some(at) = scheduled_for {
            // No money moves yet; the pending row reserves limit capacity.
            insert_transfer(
                &mut tx,
                ctx.account_id,
                &request,
                fee_cents,
                TransferStatus::Pending,
                Some(at),
                None,
            )
            .await?
        } else {
            sender.ensure_can_debit(total_cents)?;
            ledger::apply_delta(&mut *tx, sender.id, -total_cents).await?;
            if let Some(recipient) = &recipient {
                ledger::apply_delta(&mut *tx, recipient.id, amount_cents).await?;
            }
            insert_transfer(
                &mut tx,
                ctx.account_id,
                &request,
                fee_cents,
                TransferStatus::Completed,
                None,
                Some(generate_authentication_code()),
            )
            .await?
        };

        tx.commit().await?;

        tracing::info!(
            transfer_id = %transfer.id,
            account_id = %ctx.account_id,
            kind = %kind,
            status = %transfer.status,
            amount_cents,
            fee_cents,
            "transfer executed"
        );
        Ok(transfer)
    }

    /// Credit the calling account. Deposits bypass limits and carry no fee.
    pub async fn deposit(
        &self,
        ctx: &OperationContext,
        amount_cents: i64,
    ) -> Result<Transfer, DomainError> {
        validate_amount(amount_cents)?;

        let mut tx = self.pool.begin().await?;
        let account = ledger::lock_account(&mut *tx, ctx.account_id).await?;
        account.ensure_active()?;
        ledger::apply_delta(&mut *tx, account.id, amount_cents).await?;

        let transfer = insert_plain_movement(
            &mut tx,
            ctx.account_id,
            TransferKind::Deposit,
            amount_cents,
        )
        .await?;
        tx.commit().await?;

        tracing::info!(transfer_id = %transfer.id, account_id = %ctx.account_id, amount_cents, "deposit");
        Ok(transfer)
    }

    /// Debit the calling account without a counterpart. Withdrawals carry no
    /// fee and consume no transfer limit capacity.
    pub async fn withdraw(
        &self,
        ctx: &OperationContext,
        amount_cents: i64,
    ) -> Result<Transfer, DomainError> {
        validate_amount(amount_cents)?;

        let mut tx = self.pool.begin().await?;
        let account = ledger::lock_account(&mut *tx, ctx.account_id).await?;
        account.ensure_can_debit(amount_cents)?;
        ledger::apply_delta(&mut *tx, account.id, -amount_cents).await?;

        let transfer = insert_plain_movement(
            &mut tx,
            ctx.account_id,
            TransferKind::Withdrawal,
            amount_cents,
        )
        .await?;
        tx.commit().await?;

        tracing::info!(transfer_id = %transfer.id, account_id = %ctx.account_id, amount_cents, "withdrawal");
        Ok(transfer)
    }

    /// Cancel a scheduled transfer that has not started settling. Only
    /// `pending` transfers can be cancelled; no balance was debited for
    /// them, so nothing is refunded.
    pub async fn cancel(&self, ctx: &OperationContext, id: Uuid) -> Result<Transfer, DomainError> {
        let mut tx = self.pool.begin().await?;

        let row: Option<TransferRow> = sqlx::query_as(&format!(
            "SELECT {TRANSFER_COLUMNS} FROM transfers WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let row = row.ok_or(DomainError::TransferNotFound(id))?;

        // Ownership failures are indistinguishable from absence.
        if row.account_id != ctx.account_id {
            return Err(DomainError::TransferNotFound(id));
        }

        let transfer: Transfer = row.try_into()?;
        if !transfer.status.can_transition_to(TransferStatus::Cancelled) {
            return Err(DomainError::InvalidTransferStatus {
                status: transfer.status,
            });
        }

        let row: TransferRow = sqlx::query_as(&format!(
            "UPDATE transfers SET status = 'cancelled', updated_at = NOW() \
             WHERE id = $1 RETURNING {TRANSFER_COLUMNS}"
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::info!(transfer_id = %id, account_id = %ctx.account_id, "transfer cancelled");
        row.try_into()
    }

    /// Fetch one of the caller's transfers.
    pub async fn get(&self, ctx: &OperationContext, id: Uuid) -> Result<Transfer, DomainError> {
        let row: Option<TransferRow> = sqlx::query_as(&format!(
            "SELECT {TRANSFER_COLUMNS} FROM transfers WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let row = row.ok_or(DomainError::TransferNotFound(id))?;
        if row.account_id != ctx.account_id {
            return Err(DomainError::TransferNotFound(id));
        }
        row.try_into()
    }

    /// List the caller's transfers, newest first.
    pub async fn list(
        &self,
        ctx: &OperationContext,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> Result<TransferPage, DomainError> {
        let page = page.unwrap_or(1).max(1);
        let limit = limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT);
        let offset = (page - 1) * limit;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transfers WHERE account_id = $1")
            .bind(ctx.account_id)
            .fetch_one(&self.pool)
            .await?;

        let rows: Vec<TransferRow> = sqlx::query_as(&format!(
            "SELECT {TRANSFER_COLUMNS} FROM transfers WHERE account_id = $1 \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(ctx.account_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let transfers = rows
            .into_iter()
            .map(Transfer::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(TransferPage {
            transfers,
            total,
            page,
            limit,
        })
    }

    /// Settle every scheduled transfer whose due time has passed. Each
    /// transfer settles in its own transaction so one failure does not hold
    /// back the batch. Returns how many reached a terminal status.
    pub async fn settle_due(&self, now: DateTime<Utc>) -> Result<u64, DomainError> {
        let due: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT id FROM transfers
            WHERE status = 'pending' AND scheduled_for IS NOT NULL AND scheduled_for <= $1
            ORDER BY scheduled_for
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        let mut settled = 0u64;
        for (id,) in due {
            match self.settle_one(id).await {
                Ok(true) => settled += 1,
                Ok(false) => {}
                Err(err) => {
                    tracing::error!(transfer_id = %id, error = %err, "settlement failed");
                }
            }
        }
        Ok(settled)
    }

    /// Settle one scheduled transfer. Re-checks the balance under the row
    /// locks; a transfer that can no longer be funded is marked `failed`
    /// with the reason recorded. Limits are not re-checked, the pending row
    /// already reserved its capacity. Returns false when the transfer was
    /// picked up by another worker in the meantime.
    pub async fn settle_one(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut tx = self.pool.begin().await?;

        let row: Option<TransferRow> = sqlx::query_as(&format!(
            "SELECT {TRANSFER_COLUMNS} FROM transfers WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let row = row.ok_or(DomainError::TransferNotFound(id))?;
        let transfer: Transfer = row.try_into()?;

        if transfer.status != TransferStatus::Pending {
            return Ok(false);
        }

        let total_cents = transfer.total_cents();
        let outcome = settle_funding(&mut tx, &transfer, total_cents).await;

        match outcome {
            Ok(()) => {
                sqlx::query(
                    "UPDATE transfers SET status = 'completed', completed_at = NOW(), \
                     authentication_code = $2, updated_at = NOW() WHERE id = $1",
                )
                .bind(id)
                .bind(generate_authentication_code())
                .execute(&mut *tx)
                .await?;
                tx.commit().await?;
                tracing::info!(transfer_id = %id, "scheduled transfer settled");
                Ok(true)
            }
            Err(err) if err.is_business_rule() => {
                sqlx::query(
                    "UPDATE transfers SET status = 'failed', failure_reason = $2, \
                     updated_at = NOW() WHERE id = $1",
                )
                .bind(id)
                .bind(err.to_string())
                .execute(&mut *tx)
                .await?;
                tx.commit().await?;
                tracing::warn!(transfer_id = %id, reason = %err, "scheduled transfer failed");
                Ok(true)
            }
            Err(err) => Err(err),
        }
    }
}

/// Lock the involved accounts and move the money for a due transfer. Every
/// check runs before the first delta, so a business-rule error here leaves
/// the balances untouched and the caller can mark the transfer failed in
/// the same transaction.
async fn settle_funding(
    tx: &mut Transaction<'_, Postgres>,
    transfer: &Transfer,
    total_cents: i64,
) -> Result<(), DomainError> {
    match transfer.recipient_account_id {
        Some(recipient_id) => {
            let (sender, recipient) =
                ledger::lock_account_pair(&mut **tx, transfer.account_id, recipient_id)
                    .await
                    .map_err(|err| match err {
                        DomainError::AccountNotFound(id) if id == recipient_id => {
                            DomainError::RecipientNotFound(id)
                        }
                        other => other,
                    })?;
            recipient.ensure_active()?;
            sender.ensure_can_debit(total_cents)?;
            ledger::apply_delta(&mut **tx, sender.id, -total_cents).await?;
            ledger::apply_delta(&mut **tx, recipient.id, transfer.amount_cents).await?;
        }
        None => {
            let sender = ledger::lock_account(&mut **tx, transfer.account_id).await?;
            sender.ensure_can_debit(total_cents)?;
            ledger::apply_delta(&mut **tx, sender.id, -total_cents).await?;
        }
    }
    Ok(())
}

/// Shape validation for a transfer request; never touches the database.
fn validate_request(request: &TransferRequest) -> Result<(), DomainError> {
    validate_amount(request.amount_cents())?;
    match request {
        TransferRequest::Pix(r) => validate_pix_key(&r.pix_key, r.pix_key_type)?,
        TransferRequest::Ted(r) => validate_ted(
            &r.recipient_name,
            &r.recipient_document,
            &r.recipient_bank,
            &r.recipient_branch,
            &r.recipient_account,
            &r.recipient_account_type,
        )?,
        TransferRequest::P2p(_) => {}
    }
    Ok(())
}

/// Read the rolling day/month sums under the sender's row lock and reject
/// a total that would exceed either limit.
async fn check_limits_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    sender: &LockedAccount,
    total_cents: i64,
    now: DateTime<Utc>,
) -> Result<(), DomainError> {
    let windows = window_bounds(now);
    let daily_spent = movable_sum(&mut **tx, sender.id, windows.day_start, windows.day_end).await?;
    let monthly_spent =
        movable_sum(&mut **tx, sender.id, windows.month_start, windows.month_end).await?;
    check_limits(daily_spent, monthly_spent, total_cents, sender.limits())
}

async fn insert_transfer(
    tx: &mut Transaction<'_, Postgres>,
    account_id: Uuid,
    request: &TransferRequest,
    fee_cents: i64,
    status: TransferStatus,
    scheduled_for: Option<DateTime<Utc>>,
    authentication_code: Option<String>,
) -> Result<Transfer, DomainError> {
    let (pix_key, pix_key_type) = match request {
        TransferRequest::Pix(r) => (Some(r.pix_key.as_str()), Some(r.pix_key_type.as_str())),
        _ => (None, None),
    };
    let ted = match request {
        TransferRequest::Ted(r) => Some(r),
        _ => None,
    };
    let completed_at = matches!(status, TransferStatus::Completed).then(Utc::now);

    let row: TransferRow = sqlx::query_as(&format!(
        r#"
        INSERT INTO transfers (
            id, account_id, kind, status, amount_cents, fee_cents, currency,
            pix_key, pix_key_type,
            recipient_name, recipient_document, recipient_bank, recipient_branch,
            recipient_account, recipient_account_type, recipient_account_id,
            scheduled_for, completed_at, authentication_code
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
        RETURNING {TRANSFER_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(account_id)
    .bind(request.kind().as_str())
    .bind(status.as_str())
    .bind(request.amount_cents())
    .bind(fee_cents)
    .bind(CURRENCY)
    .bind(pix_key)
    .bind(pix_key_type)
    .bind(ted.map(|r| r.recipient_name.as_str()))
    .bind(ted.map(|r| r.recipient_document.as_str()))
    .bind(ted.map(|r| r.recipient_bank.as_str()))
    .bind(ted.map(|r| r.recipient_branch.as_str()))
    .bind(ted.map(|r| r.recipient_account.as_str()))
    .bind(ted.map(|r| r.recipient_account_type.as_str()))
    .bind(request.recipient_account_id())
    .bind(scheduled_for)
    .bind(completed_at)
    .bind(authentication_code)
    .fetch_one(&mut **tx)
    .await?;

    row.try_into()
}

/// Insert a completed deposit or withdrawal row.
async fn insert_plain_movement(
    tx: &mut Transaction<'_, Postgres>,
    account_id: Uuid,
    kind: TransferKind,
    amount_cents: i64,
) -> Result<Transfer, DomainError> {
    let row: TransferRow = sqlx::query_as(&format!(
        r#"
        INSERT INTO transfers (id, account_id, kind, status, amount_cents, fee_cents, currency,
                               completed_at, authentication_code)
        VALUES ($1, $2, $3, 'completed', $4, 0, $5, NOW(), $6)
        RETURNING {TRANSFER_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(account_id)
    .bind(kind.as_str())
    .bind(amount_cents)
    .bind(CURRENCY)
    .bind(generate_authentication_code())
    .fetch_one(&mut **tx)
    .await?;

    row.try_into()
}

/// Receipt code returned to the caller on completion, 16 hex chars.
fn generate_authentication_code() -> String {
    let mut bytes = [0u8; 8];
    rand::thread_rng().fill(&mut bytes);
    hex::encode_upper(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PixKeyType;
    use crate::services::requests::{P2pTransfer, PixTransfer, TedTransfer};

    fn pix_request(amount_cents: i64) -> TransferRequest {
        TransferRequest::Pix(PixTransfer {
            pix_key: "52998224725".to_string(),
            pix_key_type: PixKeyType::Cpf,
            amount_cents,
            scheduled_for: None,
        })
    }

    #[test]
    fn test_validate_request_accepts_valid_pix() {
        assert!(validate_request(&pix_request(10_000)).is_ok());
    }

    #[test]
    fn test_validate_request_rejects_non_positive_amount() {
        assert!(matches!(
            validate_request(&pix_request(0)).unwrap_err(),
            DomainError::Validation(_)
        ));
    }

    #[test]
    fn test_validate_request_rejects_bad_pix_key() {
        let request = TransferRequest::Pix(PixTransfer {
            pix_key: "12345678901".to_string(),
            pix_key_type: PixKeyType::Cpf,
            amount_cents: 1_000,
            scheduled_for: None,
        });
        assert!(matches!(
            validate_request(&request).unwrap_err(),
            DomainError::Validation(_)
        ));
    }

    #[test]
    fn test_validate_request_rejects_bad_ted_routing() {
        let request = TransferRequest::Ted(TedTransfer {
            recipient_name: "Maria Silva".to_string(),
            recipient_document: "52998224725".to_string(),
            recipient_bank: "banco".to_string(),
            recipient_branch: "0001".to_string(),
            recipient_account: "1234567".to_string(),
            recipient_account_type: "checking".to_string(),
            amount_cents: 10_000,
            scheduled_for: None,
        });
        assert!(matches!(
            validate_request(&request).unwrap_err(),
            DomainError::Validation(_)
        ));
    }

    #[test]
    fn test_p2p_request_has_no_counterpart_fields_to_validate() {
        let request = TransferRequest::P2p(P2pTransfer {
            recipient_account_id: Uuid::new_v4(),
            amount_cents: 5_000,
            scheduled_for: None,
        });
        assert!(validate_request(&request).is_ok());
    }

    #[test]
    fn test_authentication_code_shape() {
        let code = generate_authentication_code();
        assert_eq!(code.len(), 16);
        assert!(code.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(code, code.to_uppercase());
    }
}
