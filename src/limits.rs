//! Limit aggregation.
//!
//! Rolling daily/monthly spend sums per account. Every transfer that has
//! claimed capacity counts: `pending` and `processing` rows reserve limit
//! headroom alongside `completed` ones, so a burst of concurrent requests
//! cannot jointly exceed a limit. The sums are read inside the ledger unit,
//! after the account row lock, which serializes the decision.

use chrono::{DateTime, Datelike, Days, NaiveDate, TimeZone, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::domain::DomainError;

/// Per-account spending limits, in minor units.
#[derive(Debug, Clone, Copy)]
pub struct SpendLimits {
    pub daily_cents: i64,
    pub monthly_cents: i64,
}

/// Half-open calendar windows `[start, end)` for the current day and month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitWindows {
    pub day_start: DateTime<Utc>,
    pub day_end: DateTime<Utc>,
    pub month_start: DateTime<Utc>,
    pub month_end: DateTime<Utc>,
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).expect("midnight exists"))
}

/// Compute the day/month windows containing `now`. Day boundaries are UTC,
/// the account's reference boundary.
pub fn window_bounds(now: DateTime<Utc>) -> LimitWindows {
    let today = now.date_naive();
    let day_end = today
        .checked_add_days(Days::new(1))
        .expect("tomorrow exists");

    let month_start = NaiveDate::from_ymd_opt(today.year(), today.month(), 1)
        .expect("first of month exists");
    let month_end = if today.month() == 12 {
        NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(today.year(), today.month() + 1, 1)
    }
    .expect("first of next month exists");

    LimitWindows {
        day_start: midnight(today),
        day_end: midnight(day_end),
        month_start: midnight(month_start),
        month_end: midnight(month_end),
    }
}

/// Sum of `amount + fee` over movable transfers (`pix|ted|p2p`) that have
/// claimed or consumed capacity within `[from, to)`.
pub async fn movable_sum(
    conn: &mut PgConnection,
    account_id: Uuid,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<i64, DomainError> {
    let sum: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT SUM(amount_cents + fee_cents)::BIGINT
        FROM transfers
        WHERE account_id = $1
          AND kind IN ('pix', 'ted', 'p2p')
          AND status IN ('pending', 'processing', 'completed')
          AND created_at >= $2
          AND created_at < $3
        "#,
    )
    .bind(account_id)
    .bind(from)
    .bind(to)
    .fetch_one(&mut *conn)
    .await?;

    Ok(sum.unwrap_or(0))
}

/// Reject a candidate total that would push either rolling sum over its
/// limit. Pure so the decision is directly testable.
pub fn check_limits(
    daily_spent_cents: i64,
    monthly_spent_cents: i64,
    total_cents: i64,
    limits: SpendLimits,
) -> Result<(), DomainError> {
    if daily_spent_cents + total_cents > limits.daily_cents {
        return Err(DomainError::DailyLimitExceeded {
            attempted_cents: daily_spent_cents + total_cents,
            limit_cents: limits.daily_cents,
        });
    }
    if monthly_spent_cents + total_cents > limits.monthly_cents {
        return Err(DomainError::MonthlyLimitExceeded {
            attempted_cents: monthly_spent_cents + total_cents,
            limit_cents: limits.monthly_cents,
        });
    }
    Ok(())
}
