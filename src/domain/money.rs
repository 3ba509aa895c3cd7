//! Monetary constants and helpers.
//!
//! Every monetary value in the system is an `i64` amount of minor currency
//! units (centavos). Decimal display formatting belongs to boundary layers;
//! the core never handles floats.

/// Absolute ceiling for a single operation: R$ 1,000,000.00.
pub const MAX_TRANSFER_CENTS: i64 = 100_000_000;

/// The only currency the ledger moves.
pub const CURRENCY: &str = "BRL";

/// Default per-account daily transfer limit (R$ 1,000.00).
pub const DEFAULT_DAILY_LIMIT_CENTS: i64 = 100_000;

/// Default per-account monthly transfer limit (R$ 5,000.00).
pub const DEFAULT_MONTHLY_LIMIT_CENTS: i64 = 500_000;

/// Render a minor-unit amount as `R$ 1234.56` style text for logs.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}R$ {}.{:02}", sign, abs / 100, abs % 100)
}
