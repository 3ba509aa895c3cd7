//! Fee schedule.
//!
//! Fees are a pure function of the operation type so the lifecycle manager's
//! limit check and balance mutation stay deterministic and replayable.

use crate::domain::TransferKind;

/// Fixed TED fee: R$ 10.00.
pub const TED_FEE_CENTS: i64 = 1_000;

/// Fixed bill payment fee: R$ 2.00.
pub const BILL_PAYMENT_FEE_CENTS: i64 = 200;

/// Fee charged for a transfer of the given kind.
pub fn transfer_fee_cents(kind: TransferKind) -> i64 {
    match kind {
        TransferKind::Ted => TED_FEE_CENTS,
        TransferKind::Pix
        | TransferKind::P2p
        | TransferKind::Deposit
        | TransferKind::Withdrawal => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_schedule() {
        assert_eq!(transfer_fee_cents(TransferKind::Pix), 0);
        assert_eq!(transfer_fee_cents(TransferKind::P2p), 0);
        assert_eq!(transfer_fee_cents(TransferKind::Ted), 1_000);
        assert_eq!(transfer_fee_cents(TransferKind::Deposit), 0);
        assert_eq!(transfer_fee_cents(TransferKind::Withdrawal), 0);
        assert_eq!(BILL_PAYMENT_FEE_CENTS, 200);
    }
}
