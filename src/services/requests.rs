//! Typed transfer requests.
//!
//! One variant per movable transfer kind; each carries exactly the
//! counterpart fields that kind requires. A request with a future
//! `scheduled_for` is recorded as `pending` and settled later.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{PixKeyType, TransferKind};

/// PIX transfer to a registered key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PixTransfer {
    pub pix_key: String,
    pub pix_key_type: PixKeyType,
    pub amount_cents: i64,
    #[serde(default)]
    pub scheduled_for: Option<DateTime<Utc>>,
}

/// TED wire transfer with explicit routing data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TedTransfer {
    pub recipient_name: String,
    pub recipient_document: String,
    pub recipient_bank: String,
    pub recipient_branch: String,
    pub recipient_account: String,
    pub recipient_account_type: String,
    pub amount_cents: i64,
    #[serde(default)]
    pub scheduled_for: Option<DateTime<Utc>>,
}

/// Transfer to another account inside this system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct P2pTransfer {
    pub recipient_account_id: Uuid,
    pub amount_cents: i64,
    #[serde(default)]
    pub scheduled_for: Option<DateTime<Utc>>,
}

/// A validated-shape transfer request, one case per movable kind.
#[derive(Debug, Clone)]
pub enum TransferRequest {
    Pix(PixTransfer),
    Ted(TedTransfer),
    P2p(P2pTransfer),
}

impl TransferRequest {
    pub fn kind(&self) -> TransferKind {
        match self {
            TransferRequest::Pix(_) => TransferKind::Pix,
            TransferRequest::Ted(_) => TransferKind::Ted,
            TransferRequest::P2p(_) => TransferKind::P2p,
        }
    }

    pub fn amount_cents(&self) -> i64 {
        match self {
            TransferRequest::Pix(r) => r.amount_cents,
            TransferRequest::Ted(r) => r.amount_cents,
            TransferRequest::P2p(r) => r.amount_cents,
        }
    }

    pub fn scheduled_for(&self) -> Option<DateTime<Utc>> {
        match self {
            TransferRequest::Pix(r) => r.scheduled_for,
            TransferRequest::Ted(r) => r.scheduled_for,
            TransferRequest::P2p(r) => r.scheduled_for,
        }
    }

    pub fn recipient_account_id(&self) -> Option<Uuid> {
        match self {
            TransferRequest::P2p(r) => Some(r.recipient_account_id),
            _ => None,
        }
    }
}
