//! Scheduled Jobs
//!
//! Background jobs for periodic maintenance: settling scheduled transfers
//! whose due time has passed and flipping unpaid bills to overdue.

use chrono::Utc;
use sqlx::PgPool;
use std::time::Duration;
use tokio::time::interval;

use crate::domain::DomainError;
use crate::services::{BillService, TransferService};

/// Settle every scheduled transfer that is due. Returns how many reached a
/// terminal status this sweep.
pub async fn settle_due_transfers(pool: &PgPool) -> Result<u64, DomainError> {
    let settled = TransferService::new(pool.clone())
        .settle_due(Utc::now())
        .await?;

    if settled > 0 {
        tracing::info!(settled = settled, "Settled due scheduled transfers");
    }
    Ok(settled)
}

/// Flip unpaid bills past their due date to overdue.
pub async fn mark_overdue_bills(pool: &PgPool) -> Result<u64, DomainError> {
    BillService::new(pool.clone())
        .mark_overdue(Utc::now().date_naive())
        .await
}

/// Configuration for job scheduler
#[derive(Debug, Clone)]
pub struct JobSchedulerConfig {
    /// Interval for the settlement sweep (default: 1 minute)
    pub settlement_interval: Duration,
    /// Interval for the overdue-bill sweep (default: 1 hour)
    pub overdue_interval: Duration,
}

impl Default for JobSchedulerConfig {
    fn default() -> Self {
        Self {
            settlement_interval: Duration::from_secs(60),
            overdue_interval: Duration::from_secs(3600),
        }
    }
}

/// Job Scheduler - runs periodic maintenance tasks
pub struct JobScheduler {
    pool: PgPool,
    config: JobSchedulerConfig,
}

impl JobScheduler {
    /// Create a new job scheduler
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            config: JobSchedulerConfig::default(),
        }
    }

    /// Create with custom configuration
    pub fn with_config(pool: PgPool, config: JobSchedulerConfig) -> Self {
        Self { pool, config }
    }

    /// Start the job scheduler in the background
    /// Returns a handle that can be used to abort the scheduler
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    /// Run the scheduler loop
    async fn run(&self) {
        tracing::info!("Job scheduler started");

        let mut settlement_interval = interval(self.config.settlement_interval);
        let mut overdue_interval = interval(self.config.overdue_interval);

        loop {
            tokio::select! {
                _ = settlement_interval.tick() => {
                    if let Err(e) = settle_due_transfers(&self.pool).await {
                        tracing::error!(error = %e, "Settlement sweep failed");
                    }
                }
                _ = overdue_interval.tick() => {
                    if let Err(e) = mark_overdue_bills(&self.pool).await {
                        tracing::error!(error = %e, "Overdue sweep failed");
                    }
                }
            }
        }
    }
}
