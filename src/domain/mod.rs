//! Core domain types: records, status machines, monetary constants, and the
//! closed error taxonomy.

pub mod account;
pub mod bill;
pub mod context;
pub mod error;
pub mod money;
pub mod transfer;

pub use account::{Account, AccountRow, AccountStatus};
pub use bill::{BarcodeInfo, Bill, BillRow, BillStatus};
pub use context::OperationContext;
pub use error::DomainError;
pub use transfer::{PixKeyType, Transfer, TransferKind, TransferRow, TransferStatus};
