// SQLite Maintenance Implementation
use crate::store::{map_sqlx_error, SqliteStore};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;
use waitline_core::error::{AppError, Result};
use waitline_core::port::{Maintenance, MaintenanceStats, TimeProvider};

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// SQLite maintenance implementation
pub struct SqliteMaintenance {
    store: SqliteStore,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteMaintenance {
    pub fn new(store: SqliteStore, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            store,
            time_provider,
        }
    }

    /// Get DB size in bytes (page_count * page_size)
    async fn get_db_size_bytes(&self) -> Result<i64> {
        let page_count: i64 = sqlx::query_scalar("PRAGMA page_count")
            .fetch_one(self.store.pool())
            .await
            .map_err(|e| AppError::Internal(format!("Failed to get page count: {}", e)))?;

        let page_size: i64 = sqlx::query_scalar("PRAGMA page_size")
            .fetch_one(self.store.pool())
            .await
            .map_err(|e| AppError::Internal(format!("Failed to get page size: {}", e)))?;

        Ok(page_count * page_size)
    }

    async fn freelist_count(&self) -> Result<i64> {
        sqlx::query_scalar("PRAGMA freelist_count")
            .fetch_one(self.store.pool())
            .await
            .map_err(map_sqlx_error)
    }
}

fn to_mb(bytes: i64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

#[async_trait]
impl Maintenance for SqliteMaintenance {
    async fn vacuum(&self) -> Result<f64> {
        info!("Running VACUUM to optimize database...");
        let _gate = self.store.write_lock().await?;

        let size_before = to_mb(self.get_db_size_bytes().await?);

        // Run VACUUM (reclaims space and defragments)
        sqlx::query("VACUUM")
            .execute(self.store.pool())
            .await
            .map_err(|e| AppError::Internal(format!("VACUUM failed: {}", e)))?;

        let size_after = to_mb(self.get_db_size_bytes().await?);
        let reclaimed = (size_before - size_after).max(0.0);

        info!(
            size_before_mb = size_before,
            size_after_mb = size_after,
            reclaimed_mb = reclaimed,
            "VACUUM completed"
        );

        Ok(reclaimed)
    }

    async fn purge_finished_entries(&self, retention_days: i64) -> Result<i64> {
        let cutoff_time = self.time_provider.now_millis() - retention_days * MS_PER_DAY;

        info!(
            retention_days = retention_days,
            cutoff_time = cutoff_time,
            "Purging finished entries"
        );

        let _gate = self.store.write_lock().await?;
        let result = sqlx::query(
            r#"
            DELETE FROM entries
            WHERE (status = 'served' AND served_at IS NOT NULL AND served_at < ?)
               OR (status = 'cancelled' AND cancelled_at IS NOT NULL AND cancelled_at < ?)
            "#,
        )
        .bind(cutoff_time)
        .bind(cutoff_time)
        .execute(self.store.pool())
        .await
        .map_err(map_sqlx_error)?;

        let deleted = result.rows_affected() as i64;
        info!(purged_entries = deleted, "Finished entry purge completed");

        Ok(deleted)
    }

    async fn get_stats(&self) -> Result<MaintenanceStats> {
        let db_size_bytes = self.get_db_size_bytes().await?;

        let queue_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM queues")
            .fetch_one(self.store.pool())
            .await
            .map_err(map_sqlx_error)?;

        let (live_entry_count, finished_entry_count): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN status IN ('waiting', 'called') THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN status IN ('served', 'cancelled') THEN 1 ELSE 0 END), 0)
            FROM entries
            "#,
        )
        .fetch_one(self.store.pool())
        .await
        .map_err(map_sqlx_error)?;

        let page_size: i64 = sqlx::query_scalar("PRAGMA page_size")
            .fetch_one(self.store.pool())
            .await
            .map_err(map_sqlx_error)?;
        let free_bytes = self.freelist_count().await? * page_size;
        let fragmentation_percent = if db_size_bytes > 0 {
            free_bytes as f64 / db_size_bytes as f64 * 100.0
        } else {
            0.0
        };

        Ok(MaintenanceStats {
            db_size_mb: to_mb(db_size_bytes),
            db_size_bytes,
            queue_count,
            live_entry_count,
            finished_entry_count,
            fragmentation_percent,
        })
    }
}
