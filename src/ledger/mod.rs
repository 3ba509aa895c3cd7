//! Balance mutation primitives.
//!
//! Every balance change happens inside an sqlx transaction through these
//! helpers: lock the touched account rows with `SELECT ... FOR UPDATE`,
//! re-check the invariants on the locked rows, then apply relative deltas.
//! Two-account units acquire both locks in ascending account-id order
//! regardless of transfer direction, which is the sole deadlock-avoidance
//! mechanism. Dropping the transaction on any error rolls the unit back in
//! full; a `CHECK (balance_cents >= 0)` constraint backstops the invariant
//! at commit.

use sqlx::PgConnection;
use uuid::Uuid;

use crate::domain::{AccountStatus, DomainError};
use crate::limits::SpendLimits;

/// Snapshot of an account row held under an exclusive row lock. The balance
/// seen here is authoritative for the rest of the unit; any balance read
/// outside the lock is advisory only.
#[derive(Debug, Clone)]
pub struct LockedAccount {
    pub id: Uuid,
    pub balance_cents: i64,
    pub daily_limit_cents: i64,
    pub monthly_limit_cents: i64,
    pub status: AccountStatus,
}

impl LockedAccount {
    pub fn limits(&self) -> SpendLimits {
        SpendLimits {
            daily_cents: self.daily_limit_cents,
            monthly_cents: self.monthly_limit_cents,
        }
    }

    pub fn ensure_active(&self) -> Result<(), DomainError> {
        if self.status != AccountStatus::Active {
            return Err(DomainError::AccountNotActive {
                status: self.status,
            });
        }
        Ok(())
    }

    /// Post-lock debit check: the account is active and holds at least
    /// `total_cents`.
    pub fn ensure_can_debit(&self, total_cents: i64) -> Result<(), DomainError> {
        self.ensure_active()?;
        if self.balance_cents < total_cents {
            return Err(DomainError::InsufficientBalance {
                required_cents: total_cents,
                available_cents: self.balance_cents,
            });
        }
        Ok(())
    }
}

const LOCK_ACCOUNT_SQL: &str = r#"
    SELECT id, balance_cents, daily_limit_cents, monthly_limit_cents, status
    FROM accounts
    WHERE id = $1
    FOR UPDATE
"#;

/// Acquire an exclusive row lock on one account, blocking until any other
/// in-flight unit touching it commits or rolls back.
pub async fn lock_account(
    conn: &mut PgConnection,
    account_id: Uuid,
) -> Result<LockedAccount, DomainError> {
    let row: Option<(Uuid, i64, i64, i64, String)> = sqlx::query_as(LOCK_ACCOUNT_SQL)
        .bind(account_id)
        .fetch_optional(&mut *conn)
        .await?;

    let (id, balance_cents, daily_limit_cents, monthly_limit_cents, status) =
        row.ok_or(DomainError::AccountNotFound(account_id))?;
    let status = status.parse().map_err(DomainError::corrupt_row)?;

    Ok(LockedAccount {
        id,
        balance_cents,
        daily_limit_cents,
        monthly_limit_cents,
        status,
    })
}

/// Deterministic acquisition order for a two-account unit.
pub fn lock_order(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Lock two accounts in ascending-id order; the result is returned in the
/// requested `(first, second)` order.
pub async fn lock_account_pair(
    conn: &mut PgConnection,
    first: Uuid,
    second: Uuid,
) -> Result<(LockedAccount, LockedAccount), DomainError> {
    debug_assert_ne!(first, second);

    let (lo, hi) = lock_order(first, second);
    let lo_account = lock_account(conn, lo).await?;
    let hi_account = lock_account(conn, hi).await?;

    if lo_account.id == first {
        Ok((lo_account, hi_account))
    } else {
        Ok((hi_account, lo_account))
    }
}

/// Apply a relative balance delta to a locked account row.
pub async fn apply_delta(
    conn: &mut PgConnection,
    account_id: Uuid,
    delta_cents: i64,
) -> Result<(), DomainError> {
    let result = sqlx::query(
        r#"
        UPDATE accounts
        SET balance_cents = balance_cents + $2, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(account_id)
    .bind(delta_cents)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() != 1 {
        return Err(DomainError::AccountNotFound(account_id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(balance_cents: i64, status: AccountStatus) -> LockedAccount {
        LockedAccount {
            id: Uuid::new_v4(),
            balance_cents,
            daily_limit_cents: 100_000,
            monthly_limit_cents: 500_000,
            status,
        }
    }

    #[test]
    fn test_lock_order_is_direction_independent() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(lock_order(a, b), lock_order(b, a));
    }

    #[test]
    fn test_lock_order_same_id() {
        let a = Uuid::new_v4();
        assert_eq!(lock_order(a, a), (a, a));
    }

    #[test]
    fn test_debit_allowed_with_exact_balance() {
        let acct = account(5_000, AccountStatus::Active);
        assert!(acct.ensure_can_debit(5_000).is_ok());
    }

    #[test]
    fn test_debit_rejected_when_insufficient() {
        let acct = account(4_999, AccountStatus::Active);
        let err = acct.ensure_can_debit(5_000).unwrap_err();
        assert!(matches!(
            err,
            DomainError::InsufficientBalance {
                required_cents: 5_000,
                available_cents: 4_999
            }
        ));
    }

    #[test]
    fn test_debit_rejected_on_suspended_account() {
        let acct = account(1_000_000, AccountStatus::Suspended);
        assert!(matches!(
            acct.ensure_can_debit(1).unwrap_err(),
            DomainError::AccountNotActive { .. }
        ));
    }

    #[test]
    fn test_limits_snapshot() {
        let acct = account(0, AccountStatus::Active);
        let limits = acct.limits();
        assert_eq!(limits.daily_cents, 100_000);
        assert_eq!(limits.monthly_cents, 500_000);
    }
}
