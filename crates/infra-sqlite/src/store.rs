// SQLite store: pool plus the single-writer gate

use crate::transaction::SqliteLedgerTransaction;
use async_trait::async_trait;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};
use waitline_core::application::constants::DEFAULT_LOCK_TIMEOUT;
use waitline_core::error::{AppError, Result};
use waitline_core::port::{LedgerTransaction, TransactionalLedgerRepository};

// Helper to convert sqlx::Error to AppError with structured information
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => {
            // Extract database-specific error code and message
            if let Some(code) = db_err.code() {
                let code_str = code.as_ref();

                // SQLite error codes: https://www.sqlite.org/rescode.html
                match code_str {
                    "2067" | "1555" => {
                        // UNIQUE / PRIMARY KEY constraint failed
                        AppError::Conflict(format!(
                            "Unique constraint violation: {} ({})",
                            db_err.message(),
                            code_str
                        ))
                    }
                    "787" | "3850" => {
                        // FOREIGN KEY constraint failed
                        AppError::Database(format!(
                            "Foreign key constraint violation: {} ({})",
                            db_err.message(),
                            code_str
                        ))
                    }
                    "275" => {
                        // CHECK constraint failed
                        AppError::Validation(format!(
                            "Check constraint violation: {}",
                            db_err.message()
                        ))
                    }
                    "5" | "517" => {
                        // SQLITE_BUSY / SQLITE_BUSY_SNAPSHOT
                        AppError::Database(format!(
                            "Database locked (SQLITE_BUSY): {}",
                            db_err.message()
                        ))
                    }
                    "13" => {
                        // SQLITE_FULL - database or disk is full
                        AppError::Database(format!("Database full: {}", db_err.message()))
                    }
                    _ => AppError::Database(format!(
                        "Database error [{}]: {}",
                        code_str,
                        db_err.message()
                    )),
                }
            } else {
                AppError::Database(format!("Database error: {}", db_err.message()))
            }
        }
        sqlx::Error::RowNotFound => AppError::Database("Row not found".to_string()),
        sqlx::Error::ColumnNotFound(col) => AppError::Database(format!("Column not found: {}", col)),
        sqlx::Error::PoolTimedOut => {
            AppError::Database("Timed out waiting for a database connection".to_string())
        }
        // Connection, pool, protocol errors
        _ => AppError::Database(err.to_string()),
    }
}

/// SQLite-backed storage for queues and entries
///
/// SQLite admits one writer at a time. Every write (transactions and
/// single-statement updates) first takes `write_gate`, so a deferred
/// transaction never has to upgrade its read lock while another
/// connection writes. Waiting on the gate is bounded like the queue locks.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    write_gate: Arc<Mutex<()>>,
    write_timeout: Duration,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            write_gate: Arc::new(Mutex::new(())),
            write_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// Bound on waiting for the write gate
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Take the write gate
    ///
    /// # Errors
    /// `AppError::Busy` when another write holds the gate past the timeout.
    pub(crate) async fn write_lock(&self) -> Result<OwnedMutexGuard<()>> {
        let gate = Arc::clone(&self.write_gate).lock_owned();
        tokio::time::timeout(self.write_timeout, gate)
            .await
            .map_err(|_| {
                warn!(
                    timeout_ms = self.write_timeout.as_millis() as u64,
                    "Write gate timed out"
                );
                AppError::Busy("database is busy with another write, retry later".to_string())
            })
    }
}

#[async_trait]
impl TransactionalLedgerRepository for SqliteStore {
    async fn begin_transaction(&self) -> Result<Box<dyn LedgerTransaction>> {
        let gate = self.write_lock().await?;
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        debug!("Ledger transaction started");
        Ok(Box::new(SqliteLedgerTransaction::new(tx, gate)))
    }
}
