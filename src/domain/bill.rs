//! Bill record and status machine.
//!
//! Bills are registered from the structured output of the external barcode
//! parser and mutated only by the bill payment executor.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::error::DomainError;

/// Bill lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillStatus {
    Pending,
    Paid,
    Overdue,
    Cancelled,
}

impl BillStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillStatus::Pending => "pending",
            BillStatus::Paid => "paid",
            BillStatus::Overdue => "overdue",
            BillStatus::Cancelled => "cancelled",
        }
    }

    /// Overdue bills remain payable; paid and cancelled do not.
    pub fn is_payable(&self) -> bool {
        matches!(self, BillStatus::Pending | BillStatus::Overdue)
    }
}

impl fmt::Display for BillStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BillStatus::Pending),
            "paid" => Ok(BillStatus::Paid),
            "overdue" => Ok(BillStatus::Overdue),
            "cancelled" => Ok(BillStatus::Cancelled),
            other => Err(format!("unknown bill status: {}", other)),
        }
    }
}

/// Structured barcode data supplied by the external parsing collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarcodeInfo {
    /// Normalized digit-only barcode.
    pub barcode: String,
    pub amount_cents: i64,
    pub due_date: NaiveDate,
    pub recipient_name: String,
}

/// A registered bill.
#[derive(Debug, Clone, Serialize)]
pub struct Bill {
    pub id: Uuid,
    pub account_id: Uuid,
    pub status: BillStatus,
    pub barcode: String,
    pub amount_cents: i64,
    pub fee_cents: i64,
    pub final_amount_cents: i64,
    pub recipient_name: String,
    pub due_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw bill row as stored; status is TEXT in the schema.
#[derive(Debug, sqlx::FromRow)]
pub struct BillRow {
    pub id: Uuid,
    pub account_id: Uuid,
    pub status: String,
    pub barcode: String,
    pub amount_cents: i64,
    pub fee_cents: i64,
    pub final_amount_cents: i64,
    pub recipient_name: String,
    pub due_date: NaiveDate,
    pub payment_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<BillRow> for Bill {
    type Error = DomainError;

    fn try_from(row: BillRow) -> Result<Self, Self::Error> {
        let status = row.status.parse().map_err(DomainError::corrupt_row)?;
        Ok(Bill {
            id: row.id,
            account_id: row.account_id,
            status,
            barcode: row.barcode,
            amount_cents: row.amount_cents,
            fee_cents: row.fee_cents,
            final_amount_cents: row.final_amount_cents,
            recipient_name: row.recipient_name,
            due_date: row.due_date,
            payment_date: row.payment_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            BillStatus::Pending,
            BillStatus::Paid,
            BillStatus::Overdue,
            BillStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<BillStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_payable_statuses() {
        assert!(BillStatus::Pending.is_payable());
        assert!(BillStatus::Overdue.is_payable());
        assert!(!BillStatus::Paid.is_payable());
        assert!(!BillStatus::Cancelled.is_payable());
    }
}
