//! Host repositories

use anyhow::Result;
use async_trait::async_trait;
use tarmac_core::domain::host_summary::HostSummary;
use tarmac_core::domain::resource::{FactUpdate, Host};
use uuid::Uuid;

/// Repository trait for per-host job results
#[async_trait]
pub trait HostSummaryRepository: Send + Sync {
    /// Inserts or replaces the summary for (job, host)
    async fn upsert_summary(&self, summary: HostSummary) -> Result<()>;

    /// Summaries of a job, ordered by host name
    async fn list_summaries(&self, job_id: Uuid) -> Result<Vec<HostSummary>>;
}

/// Repository trait for inventory hosts and their cached facts
#[async_trait]
pub trait InventoryRepository: Send + Sync {
    /// Hosts of an inventory, in inventory order
    async fn hosts(&self, inventory_id: Uuid) -> Result<Vec<Host>>;

    /// Applies one batch of fact updates
    ///
    /// Returns the number of hosts that were found and updated.
    async fn update_facts(&self, inventory_id: Uuid, updates: Vec<FactUpdate>) -> Result<usize>;
}
