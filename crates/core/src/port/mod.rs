// Port Layer - Interfaces for external dependencies

pub mod entry_repository;
pub mod id_provider; // For deterministic testing
pub mod maintenance;
pub mod notifier;
pub mod page;
pub mod queue_repository;
pub mod time_provider;
pub mod transaction;

// Re-exports
pub use entry_repository::EntryRepository;
pub use id_provider::{IdProvider, UuidProvider};
pub use maintenance::{Maintenance, MaintenanceConfig, MaintenanceReport, MaintenanceStats};
pub use notifier::{LogNotifier, Notifier, NotifyError};
pub use page::Page;
pub use queue_repository::{DeleteOutcome, QueueFilter, QueueRepository};
pub use time_provider::{SystemTimeProvider, TimeProvider};
pub use transaction::{LedgerTransaction, Transaction, TransactionalLedgerRepository};
