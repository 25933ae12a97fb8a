// Application Layer - Use Cases and Business Logic

pub mod constants;
pub mod ledger;
pub mod locks;
pub mod maintenance;
pub mod registry;
pub mod repair;
pub mod shutdown;

// Re-exports
pub use ledger::{EntryLedger, JoinRequest, LedgerConfig};
pub use locks::{QueueGuard, QueueLocks};
pub use maintenance::MaintenanceScheduler;
pub use registry::QueueRegistry;
pub use repair::PositionRepair;
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
