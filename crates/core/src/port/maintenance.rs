// DB Maintenance port
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Database maintenance statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceStats {
    pub db_size_mb: f64,
    pub db_size_bytes: i64,
    pub queue_count: i64,
    /// Waiting or called entries
    pub live_entry_count: i64,
    /// Served or cancelled entries
    pub finished_entry_count: i64,
    pub fragmentation_percent: f64,
}

/// Outcome of one maintenance run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceReport {
    pub purged_entries: i64,
    pub reclaimed_mb: f64,
    pub stats: MaintenanceStats,
}

/// Maintenance configuration
#[derive(Debug, Clone)]
pub struct MaintenanceConfig {
    /// Retention period for served/cancelled entries (days)
    pub finished_entry_retention_days: i64,

    /// Maximum DB size before forcing VACUUM (MB)
    pub max_db_size_mb: f64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            finished_entry_retention_days: 30,
            max_db_size_mb: 500.0,
        }
    }
}

/// Database maintenance operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Maintenance: Send + Sync {
    /// Run VACUUM to reclaim space and optimize DB
    ///
    /// # Returns
    /// Space reclaimed in MB
    async fn vacuum(&self) -> Result<f64>;

    /// Delete served/cancelled entries that finished before the retention window
    ///
    /// # Returns
    /// Number of entries deleted
    async fn purge_finished_entries(&self, retention_days: i64) -> Result<i64>;

    /// Get maintenance statistics
    async fn get_stats(&self) -> Result<MaintenanceStats>;

    /// Run full maintenance (purge, then VACUUM when the file is large or forced)
    async fn run_full_maintenance(
        &self,
        config: &MaintenanceConfig,
        force_vacuum: bool,
    ) -> Result<MaintenanceReport> {
        let stats_before = self.get_stats().await?;

        let purged_entries = self
            .purge_finished_entries(config.finished_entry_retention_days)
            .await?;

        let reclaimed_mb = if force_vacuum || stats_before.db_size_mb > config.max_db_size_mb {
            self.vacuum().await?
        } else {
            0.0
        };

        let stats = self.get_stats().await?;

        tracing::info!(
            purged_entries = purged_entries,
            reclaimed_mb = reclaimed_mb,
            db_size_mb = stats.db_size_mb,
            "Maintenance completed"
        );

        Ok(MaintenanceReport {
            purged_entries,
            reclaimed_mb,
            stats,
        })
    }
}
