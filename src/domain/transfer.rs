//! Transfer record and status machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::error::DomainError;

/// Kind of funds movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferKind {
    Pix,
    Ted,
    P2p,
    Deposit,
    Withdrawal,
}

impl TransferKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferKind::Pix => "pix",
            TransferKind::Ted => "ted",
            TransferKind::P2p => "p2p",
            TransferKind::Deposit => "deposit",
            TransferKind::Withdrawal => "withdrawal",
        }
    }

    /// Movable kinds consume daily/monthly transfer capacity.
    pub fn is_movable(&self) -> bool {
        matches!(self, TransferKind::Pix | TransferKind::Ted | TransferKind::P2p)
    }
}

impl fmt::Display for TransferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransferKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pix" => Ok(TransferKind::Pix),
            "ted" => Ok(TransferKind::Ted),
            "p2p" => Ok(TransferKind::P2p),
            "deposit" => Ok(TransferKind::Deposit),
            "withdrawal" => Ok(TransferKind::Withdrawal),
            other => Err(format!("unknown transfer kind: {}", other)),
        }
    }
}

/// Registered PIX key formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixKeyType {
    Cpf,
    Cnpj,
    Email,
    Phone,
    Random,
}

impl PixKeyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PixKeyType::Cpf => "cpf",
            PixKeyType::Cnpj => "cnpj",
            PixKeyType::Email => "email",
            PixKeyType::Phone => "phone",
            PixKeyType::Random => "random",
        }
    }
}

impl fmt::Display for PixKeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PixKeyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cpf" => Ok(PixKeyType::Cpf),
            "cnpj" => Ok(PixKeyType::Cnpj),
            "email" => Ok(PixKeyType::Email),
            "phone" => Ok(PixKeyType::Phone),
            "random" => Ok(PixKeyType::Random),
            other => Err(format!("unknown pix key type: {}", other)),
        }
    }
}

/// Transfer lifecycle status.
///
/// `pending -> processing -> {completed, failed}` and `pending -> cancelled`.
/// The synchronous path writes `completed` directly; `processing` is reserved
/// for asynchronous settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Pending => "pending",
            TransferStatus::Processing => "processing",
            TransferStatus::Completed => "completed",
            TransferStatus::Failed => "failed",
            TransferStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal statuses admit no further transition.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransferStatus::Completed | TransferStatus::Failed | TransferStatus::Cancelled
        )
    }

    pub fn can_transition_to(&self, next: TransferStatus) -> bool {
        match (self, next) {
            (TransferStatus::Pending, TransferStatus::Processing)
            | (TransferStatus::Pending, TransferStatus::Completed)
            | (TransferStatus::Pending, TransferStatus::Failed)
            | (TransferStatus::Pending, TransferStatus::Cancelled)
            | (TransferStatus::Processing, TransferStatus::Completed)
            | (TransferStatus::Processing, TransferStatus::Failed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransferStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TransferStatus::Pending),
            "processing" => Ok(TransferStatus::Processing),
            "completed" => Ok(TransferStatus::Completed),
            "failed" => Ok(TransferStatus::Failed),
            "cancelled" => Ok(TransferStatus::Cancelled),
            other => Err(format!("unknown transfer status: {}", other)),
        }
    }
}

/// A funds movement owned by the debited (or, for deposits, credited) account.
#[derive(Debug, Clone, Serialize)]
pub struct Transfer {
    pub id: Uuid,
    pub account_id: Uuid,
    pub kind: TransferKind,
    pub status: TransferStatus,
    pub amount_cents: i64,
    pub fee_cents: i64,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pix_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pix_key_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_document: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_bank: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_account_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_account_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transfer {
    /// Total capacity the transfer claims against balance and limits.
    pub fn total_cents(&self) -> i64 {
        self.amount_cents + self.fee_cents
    }
}

/// Raw transfer row as stored; kind and status are TEXT in the schema.
#[derive(Debug, sqlx::FromRow)]
pub struct TransferRow {
    pub id: Uuid,
    pub account_id: Uuid,
    pub kind: String,
    pub status: String,
    pub amount_cents: i64,
    pub fee_cents: i64,
    pub currency: String,
    pub pix_key: Option<String>,
    pub pix_key_type: Option<String>,
    pub recipient_name: Option<String>,
    pub recipient_document: Option<String>,
    pub recipient_bank: Option<String>,
    pub recipient_branch: Option<String>,
    pub recipient_account: Option<String>,
    pub recipient_account_type: Option<String>,
    pub recipient_account_id: Option<Uuid>,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
    pub authentication_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<TransferRow> for Transfer {
    type Error = DomainError;

    fn try_from(row: TransferRow) -> Result<Self, Self::Error> {
        let kind = row.kind.parse().map_err(DomainError::corrupt_row)?;
        let status = row.status.parse().map_err(DomainError::corrupt_row)?;
        Ok(Transfer {
            id: row.id,
            account_id: row.account_id,
            kind,
            status,
            amount_cents: row.amount_cents,
            fee_cents: row.fee_cents,
            currency: row.currency,
            pix_key: row.pix_key,
            pix_key_type: row.pix_key_type,
            recipient_name: row.recipient_name,
            recipient_document: row.recipient_document,
            recipient_bank: row.recipient_bank,
            recipient_branch: row.recipient_branch,
            recipient_account: row.recipient_account,
            recipient_account_type: row.recipient_account_type,
            recipient_account_id: row.recipient_account_id,
            scheduled_for: row.scheduled_for,
            completed_at: row.completed_at,
            failure_reason: row.failure_reason,
            authentication_code: row.authentication_code,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip() {
        for kind in [
            TransferKind::Pix,
            TransferKind::Ted,
            TransferKind::P2p,
            TransferKind::Deposit,
            TransferKind::Withdrawal,
        ] {
            assert_eq!(kind.as_str().parse::<TransferKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_movable_kinds() {
        assert!(TransferKind::Pix.is_movable());
        assert!(TransferKind::Ted.is_movable());
        assert!(TransferKind::P2p.is_movable());
        assert!(!TransferKind::Deposit.is_movable());
        assert!(!TransferKind::Withdrawal.is_movable());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(TransferStatus::Completed.is_terminal());
        assert!(TransferStatus::Failed.is_terminal());
        assert!(TransferStatus::Cancelled.is_terminal());
        assert!(!TransferStatus::Pending.is_terminal());
        assert!(!TransferStatus::Processing.is_terminal());
    }

    #[test]
    fn test_no_transition_out_of_terminal() {
        for terminal in [
            TransferStatus::Completed,
            TransferStatus::Failed,
            TransferStatus::Cancelled,
        ] {
            for next in [
                TransferStatus::Pending,
                TransferStatus::Processing,
                TransferStatus::Completed,
                TransferStatus::Failed,
                TransferStatus::Cancelled,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_pending_transitions() {
        assert!(TransferStatus::Pending.can_transition_to(TransferStatus::Processing));
        assert!(TransferStatus::Pending.can_transition_to(TransferStatus::Completed));
        assert!(TransferStatus::Pending.can_transition_to(TransferStatus::Failed));
        assert!(TransferStatus::Pending.can_transition_to(TransferStatus::Cancelled));
        assert!(!TransferStatus::Processing.can_transition_to(TransferStatus::Cancelled));
    }
}
