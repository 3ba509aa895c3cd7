//! finbank - funds-movement core
//!
//! Digital-banking backend for PIX, TED and P2P transfers, bill payments,
//! rolling transfer limits and atomic balance mutation. Re-exports modules
//! for integration testing and external use.

pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod fees;
pub mod jobs;
pub mod ledger;
pub mod limits;
pub mod services;
pub mod validation;

mod error;

pub use config::Config;
pub use domain::{DomainError, OperationContext};
pub use error::{AppError, AppResult};
