// Maintenance Service
// Scheduled purge of finished entries and DB compaction

use crate::application::shutdown::ShutdownToken;
use crate::error::Result;
use crate::port::{Maintenance, MaintenanceConfig, MaintenanceReport, MaintenanceStats};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{error, info};

/// Maintenance scheduler
///
/// Runs periodic maintenance operations (purge, VACUUM) in the background
pub struct MaintenanceScheduler {
    maintenance: Arc<dyn Maintenance>,
    config: MaintenanceConfig,
    period: Duration,
}

impl MaintenanceScheduler {
    /// Create a new maintenance scheduler
    ///
    /// # Arguments
    /// * `maintenance` - Maintenance implementation
    /// * `config` - Maintenance configuration
    /// * `interval_hours` - How often to run maintenance (hours)
    pub fn new(
        maintenance: Arc<dyn Maintenance>,
        config: MaintenanceConfig,
        interval_hours: u64,
    ) -> Self {
        Self::with_period(
            maintenance,
            config,
            Duration::from_secs(interval_hours.max(1) * 3600),
        )
    }

    pub fn with_period(
        maintenance: Arc<dyn Maintenance>,
        config: MaintenanceConfig,
        period: Duration,
    ) -> Self {
        Self {
            maintenance,
            config,
            period,
        }
    }

    /// Run maintenance loop until shutdown (spawn with tokio::spawn)
    ///
    /// The first run happens one full period after start.
    pub async fn run(self: Arc<Self>, mut shutdown: ShutdownToken) {
        info!(
            period_secs = self.period.as_secs(),
            retention_days = self.config.finished_entry_retention_days,
            "Maintenance scheduler started"
        );

        let mut tick = interval(self.period);
        tick.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.wait() => {
                    info!("Maintenance scheduler stopping");
                    return;
                }
                _ = tick.tick() => {
                    match self.maintenance.run_full_maintenance(&self.config, false).await {
                        Ok(report) => {
                            info!(
                                purged_entries = report.purged_entries,
                                db_size_mb = report.stats.db_size_mb,
                                live_entries = report.stats.live_entry_count,
                                "Scheduled maintenance completed successfully"
                            );
                        }
                        Err(e) => {
                            error!(error = ?e, "Scheduled maintenance failed");
                        }
                    }
                }
            }
        }
    }

    /// Run maintenance immediately (for manual trigger)
    pub async fn run_now(&self, force_vacuum: bool) -> Result<MaintenanceReport> {
        info!(force_vacuum = force_vacuum, "Running manual maintenance...");
        self.maintenance
            .run_full_maintenance(&self.config, force_vacuum)
            .await
    }

    /// Current database statistics
    pub async fn stats(&self) -> Result<MaintenanceStats> {
        self.maintenance.get_stats().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::shutdown::shutdown_channel;
    use crate::port::maintenance::MockMaintenance;

    fn report(purged: i64) -> MaintenanceReport {
        MaintenanceReport {
            purged_entries: purged,
            reclaimed_mb: 0.0,
            stats: MaintenanceStats {
                db_size_mb: 1.0,
                db_size_bytes: 1_048_576,
                queue_count: 1,
                live_entry_count: 0,
                finished_entry_count: 0,
                fragmentation_percent: 0.0,
            },
        }
    }

    #[tokio::test]
    async fn test_run_now_passes_force_flag() {
        let mut maintenance = MockMaintenance::new();
        maintenance
            .expect_run_full_maintenance()
            .withf(|config, force| config.finished_entry_retention_days == 30 && *force)
            .times(1)
            .returning(|_, _| Ok(report(3)));

        let scheduler =
            MaintenanceScheduler::new(Arc::new(maintenance), MaintenanceConfig::default(), 24);
        let report = scheduler.run_now(true).await.unwrap();
        assert_eq!(report.purged_entries, 3);
    }

    #[tokio::test]
    async fn test_loop_runs_periodically_and_stops_on_shutdown() {
        let mut maintenance = MockMaintenance::new();
        maintenance
            .expect_run_full_maintenance()
            .withf(|_, force| !*force)
            .returning(|_, _| Ok(report(0)));

        let scheduler = MaintenanceScheduler::with_period(
            Arc::new(maintenance),
            MaintenanceConfig::default(),
            Duration::from_millis(10),
        );
        let (tx, token) = shutdown_channel();
        let handle = tokio::spawn(Arc::new(scheduler).run(token));

        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.shutdown();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
