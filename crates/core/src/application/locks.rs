// Per-queue exclusive sections

use crate::application::ledger::LedgerConfig;
use crate::domain::QueueId;
use crate::error::{AppError, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, warn};

type Slot = Arc<tokio::sync::Mutex<()>>;
type Table = Arc<Mutex<HashMap<QueueId, Slot>>>;

/// Lock table keyed by queue id
///
/// Every mutating ledger operation on a queue holds that queue's guard for
/// its whole read-modify-write. Queues never share a lock. A slot lives only
/// while someone holds or waits on it, so ids of unknown or deleted queues
/// do not accumulate.
pub struct QueueLocks {
    table: Table,
    timeout: Duration,
}

/// Held exclusive section for one queue (released on drop)
#[derive(Debug)]
pub struct QueueGuard {
    queue_id: QueueId,
    table: Table,
    guard: Option<OwnedMutexGuard<()>>,
}

impl QueueGuard {
    pub fn queue_id(&self) -> &str {
        &self.queue_id
    }
}

impl Drop for QueueGuard {
    fn drop(&mut self) {
        // The owned guard is itself a handle to the slot
        drop(self.guard.take());
        prune(&self.table, &self.queue_id);
    }
}

impl QueueLocks {
    pub fn new(timeout: Duration) -> Self {
        Self {
            table: Arc::new(Mutex::new(HashMap::new())),
            timeout,
        }
    }

    pub fn from_config(config: &LedgerConfig) -> Self {
        Self::new(config.lock_timeout)
    }

    /// Enter the queue's exclusive section, waiting at most the configured timeout
    ///
    /// # Errors
    /// `AppError::Busy` when the section stays occupied past the timeout.
    pub async fn acquire(&self, queue_id: &str) -> Result<QueueGuard> {
        let lock = self.slot(queue_id);

        match tokio::time::timeout(self.timeout, lock.lock_owned()).await {
            Ok(guard) => {
                debug!(queue_id = %queue_id, "Queue lock acquired");
                Ok(QueueGuard {
                    queue_id: queue_id.to_string(),
                    table: Arc::clone(&self.table),
                    guard: Some(guard),
                })
            }
            Err(_) => {
                prune(&self.table, queue_id);
                warn!(
                    queue_id = %queue_id,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Queue lock timed out"
                );
                Err(AppError::Busy(format!(
                    "queue {} is busy, retry later",
                    queue_id
                )))
            }
        }
    }

    /// Number of queues with a lock slot
    pub fn len(&self) -> usize {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, queue_id: &str) -> Slot {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        table
            .entry(queue_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}

/// Drop the slot when the table holds the only handle to it
///
/// Handles are cloned under the table lock, so a count of one here means
/// nobody holds or waits on the queue.
fn prune(table: &Table, queue_id: &str) {
    let mut table = table.lock().unwrap_or_else(PoisonError::into_inner);
    if table
        .get(queue_id)
        .is_some_and(|slot| Arc::strong_count(slot) == 1)
    {
        table.remove(queue_id);
        debug!(queue_id = %queue_id, "Queue lock slot released");
    }
}
