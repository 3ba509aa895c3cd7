//! Core service operations.
//!
//! These orchestrate validation, fees, limits and the ledger primitives.
//! They are the public contract of the funds-movement core; the HTTP layer
//! is a thin adapter over them. Every operation takes the caller identity
//! explicitly through [`OperationContext`](crate::domain::OperationContext).

mod accounts;
mod bills;
mod requests;
mod transfers;

pub use accounts::AccountService;
pub use bills::{BillPage, BillService};
pub use requests::{P2pTransfer, PixTransfer, TedTransfer, TransferRequest};
pub use transfers::{TransferPage, TransferService};
