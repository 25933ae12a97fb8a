//! Waitline daemon - JSON-RPC server over the queue ledger

mod config;
mod telemetry;

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

use config::DaemonConfig;
use waitline_api_rpc::{RateLimitConfig, RpcHandler, RpcServer, RpcServerConfig};
use waitline_core::application::{
    shutdown_channel, EntryLedger, MaintenanceScheduler, PositionRepair, QueueLocks, QueueRegistry,
};
use waitline_core::port::id_provider::UuidProvider;
use waitline_core::port::time_provider::SystemTimeProvider;
use waitline_core::port::{LogNotifier, MaintenanceConfig};
use waitline_infra_sqlite::{create_pool, run_migrations, SqliteMaintenance, SqliteStore};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Configuration and logging
    let config = DaemonConfig::load().context("Failed to load configuration")?;
    let _telemetry = telemetry::init(&config)?;

    info!("Waitline v{} starting...", VERSION);

    // 2. Database
    if let Some(parent) = Path::new(&config.db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    info!(db_path = %config.db_path, "Initializing database...");

    let pool = create_pool(&config.db_path)
        .await
        .map_err(|e| anyhow::anyhow!("DB pool creation failed: {}", e))?;
    run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;

    // 3. Dependencies
    let ledger_config = config.ledger_config();
    let store = Arc::new(SqliteStore::new(pool).with_write_timeout(ledger_config.lock_timeout));
    let time_provider = Arc::new(SystemTimeProvider);
    let locks = Arc::new(QueueLocks::from_config(&ledger_config));

    let registry = Arc::new(QueueRegistry::new(
        store.clone(),
        locks.clone(),
        Arc::new(UuidProvider),
        time_provider.clone(),
    ));
    let ledger = Arc::new(EntryLedger::new(
        store.clone(),
        store.clone(),
        store.clone(),
        locks.clone(),
        Arc::new(LogNotifier),
        time_provider.clone(),
    ));

    // 4. Close any position gaps left by an earlier crash
    let repair = PositionRepair::new(store.clone(), store.clone(), locks);
    match repair.repair_all().await {
        Ok(0) => info!("Waiting lines are dense"),
        Ok(count) => info!(repaired_queues = count, "Repaired waiting lines"),
        Err(e) => error!(error = ?e, "Position repair failed"),
    }

    // 5. Maintenance
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let maintenance = Arc::new(MaintenanceScheduler::new(
        Arc::new(SqliteMaintenance::new((*store).clone(), time_provider)),
        MaintenanceConfig {
            finished_entry_retention_days: config.retention_days,
            ..MaintenanceConfig::default()
        },
        config.maintenance_interval_hours,
    ));
    let maintenance_handle = tokio::spawn(maintenance.clone().run(shutdown_rx));

    // 6. JSON-RPC server
    let handler = RpcHandler::new(
        registry,
        ledger,
        maintenance,
        RateLimitConfig {
            burst: config.rate_limit_burst,
            rate_per_sec: config.rate_limit_rate,
        },
    );
    let rpc_server = RpcServer::new(
        RpcServerConfig {
            host: config.rpc_host.clone(),
            port: config.rpc_port,
        },
        handler,
    );
    let (addr, rpc_handle) = rpc_server
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("RPC server start failed: {}", e))?;

    info!(addr = %addr, "System ready");
    info!("Press Ctrl+C to shutdown");

    // 7. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    shutdown_tx.shutdown();
    rpc_handle
        .stop()
        .map_err(|e| anyhow::anyhow!("RPC server stop failed: {}", e))?;
    rpc_handle.stopped().await;
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), maintenance_handle).await;

    info!("Shutdown complete.");

    Ok(())
}
