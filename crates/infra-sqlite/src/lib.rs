// Waitline Infrastructure - SQLite Adapter
// Implements: QueueRepository, EntryRepository, TransactionalLedgerRepository, Maintenance

mod connection;
mod entry_repository;
mod maintenance_impl;
mod migration;
mod queue_repository;
mod rows;
mod store;
mod transaction;

pub use connection::create_pool;
pub use maintenance_impl::SqliteMaintenance;
pub use migration::{current_version, run_migrations};
pub use store::SqliteStore;
pub use transaction::SqliteLedgerTransaction;

// Note: sqlx::Error conversion is handled by wrapping in helper functions
// due to Rust's orphan rules (cannot implement From<sqlx::Error> for AppError here)
