//! Account store operations.
//!
//! Accounts are created at signup and never hard-deleted. Balances read
//! here are advisory; the authoritative read happens under the row lock
//! inside a ledger unit.

use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::money::{DEFAULT_DAILY_LIMIT_CENTS, DEFAULT_MONTHLY_LIMIT_CENTS};
use crate::domain::{Account, AccountRow, DomainError};

const ACCOUNT_COLUMNS: &str =
    "id, balance_cents, daily_limit_cents, monthly_limit_cents, status, created_at, updated_at";

pub struct AccountService {
    pool: PgPool,
}

impl AccountService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open an account for a gateway identity. Re-opening an existing
    /// account returns the stored record unchanged, so signup retries are
    /// safe.
    pub async fn open(&self, account_id: Uuid) -> Result<Account, DomainError> {
        let row: Option<AccountRow> = sqlx::query_as(&format!(
            r#"
            INSERT INTO accounts (id, balance_cents, daily_limit_cents, monthly_limit_cents, status)
            VALUES ($1, 0, $2, $3, 'active')
            ON CONFLICT (id) DO NOTHING
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(account_id)
        .bind(DEFAULT_DAILY_LIMIT_CENTS)
        .bind(DEFAULT_MONTHLY_LIMIT_CENTS)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                tracing::info!(account_id = %account_id, "account opened");
                row.try_into()
            }
            None => self.get(account_id).await,
        }
    }

    /// Fetch an account by id.
    pub async fn get(&self, account_id: Uuid) -> Result<Account, DomainError> {
        let row: Option<AccountRow> =
            sqlx::query_as(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"))
                .bind(account_id)
                .fetch_optional(&self.pool)
                .await?;

        row.ok_or(DomainError::AccountNotFound(account_id))?.try_into()
    }
}
