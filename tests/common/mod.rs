//! Common test utilities

use axum::{middleware, Router};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use finbank::api;

/// Setup test database - truncate tables for a fresh state
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    sqlx::query("TRUNCATE TABLE bills, transfers, accounts CASCADE")
        .execute(&pool)
        .await
        .expect("Failed to clean up DB");

    pool
}

/// Build the API router with the identity middleware, as served behind
/// the gateway
pub fn test_app(pool: PgPool) -> Router {
    api::create_router()
        .layer(middleware::from_fn(api::middleware::identity_middleware))
        .with_state(pool)
}

/// Seed an active account with the given balance and limits
pub async fn seed_account(
    pool: &PgPool,
    balance_cents: i64,
    daily_limit_cents: i64,
    monthly_limit_cents: i64,
) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO accounts (id, balance_cents, daily_limit_cents, monthly_limit_cents, status)
        VALUES ($1, $2, $3, $4, 'active')
        "#,
    )
    .bind(id)
    .bind(balance_cents)
    .bind(daily_limit_cents)
    .bind(monthly_limit_cents)
    .execute(pool)
    .await
    .expect("Failed to seed account");
    id
}

/// Current balance straight from the accounts table
pub async fn balance_of(pool: &PgPool, account_id: Uuid) -> i64 {
    sqlx::query_scalar("SELECT balance_cents FROM accounts WHERE id = $1")
        .bind(account_id)
        .fetch_one(pool)
        .await
        .expect("Failed to read balance")
}
