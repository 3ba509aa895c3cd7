//! Account record.
//!
//! Accounts hold the balance and the spending limits. The balance is mutated
//! only through the ledger primitives; everything else reads it advisorily.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::error::DomainError;

/// Account lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Suspended,
    Closed,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Suspended => "suspended",
            AccountStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AccountStatus::Active),
            "suspended" => Ok(AccountStatus::Suspended),
            "closed" => Ok(AccountStatus::Closed),
            other => Err(format!("unknown account status: {}", other)),
        }
    }
}

/// A bank account. The id equals the gateway identity id of its owner.
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub id: Uuid,
    pub balance_cents: i64,
    pub daily_limit_cents: i64,
    pub monthly_limit_cents: i64,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw account row as stored; status is TEXT in the schema.
#[derive(Debug, sqlx::FromRow)]
pub struct AccountRow {
    pub id: Uuid,
    pub balance_cents: i64,
    pub daily_limit_cents: i64,
    pub monthly_limit_cents: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = DomainError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let status = row.status.parse().map_err(DomainError::corrupt_row)?;
        Ok(Account {
            id: row.id,
            balance_cents: row.balance_cents,
            daily_limit_cents: row.daily_limit_cents,
            monthly_limit_cents: row.monthly_limit_cents,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
