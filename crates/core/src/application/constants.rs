// Application constants (no magic values)
use std::time::Duration;

/// How long a ledger operation waits for its queue's exclusive section (5s)
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Default interval between scheduled maintenance runs
pub const DEFAULT_MAINTENANCE_INTERVAL_HOURS: u64 = 24;
