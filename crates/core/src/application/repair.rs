// Startup position repair
use crate::application::locks::QueueLocks;
use crate::domain::ordering::{densify, is_dense};
use crate::error::Result;
use crate::port::{QueueRepository, TransactionalLedgerRepository};
use std::sync::Arc;
use tracing::{info, warn};

/// Position repair service
///
/// On daemon startup, rewrites any waiting line whose positions are not
/// exactly `1..N` (for example after a crash or a manual edit of the
/// database). Order is preserved: `(position, id)` ascending.
pub struct PositionRepair {
    queue_repo: Arc<dyn QueueRepository>,
    tx_repo: Arc<dyn TransactionalLedgerRepository>,
    locks: Arc<QueueLocks>,
}

impl PositionRepair {
    pub fn new(
        queue_repo: Arc<dyn QueueRepository>,
        tx_repo: Arc<dyn TransactionalLedgerRepository>,
        locks: Arc<QueueLocks>,
    ) -> Self {
        Self {
            queue_repo,
            tx_repo,
            locks,
        }
    }

    /// Audit every queue
    ///
    /// # Returns
    /// Number of queues whose positions were rewritten
    pub async fn repair_all(&self) -> Result<usize> {
        let queue_ids = self.queue_repo.list_ids().await?;
        info!(queues = queue_ids.len(), "Starting position audit");

        let mut repaired = 0;
        for queue_id in &queue_ids {
            if self.repair_queue(queue_id).await? {
                repaired += 1;
            }
        }

        info!(repaired_queues = repaired, "Position audit complete");
        Ok(repaired)
    }

    /// Densify one queue's waiting line
    ///
    /// # Returns
    /// true if any position changed
    pub async fn repair_queue(&self, queue_id: &str) -> Result<bool> {
        let _guard = self.locks.acquire(queue_id).await?;
        let mut tx = self.tx_repo.begin_transaction().await?;

        let line = tx.waiting_line(queue_id).await?;
        let positions: Vec<i64> = line.iter().map(|&(_, position)| position).collect();
        if is_dense(&positions) {
            tx.rollback().await?;
            return Ok(false);
        }

        let moves = densify(&line);
        warn!(
            queue_id = %queue_id,
            waiting = line.len(),
            moved = moves.len(),
            "Waiting positions not contiguous, rewriting"
        );
        for (entry_id, position) in moves {
            tx.set_position(entry_id, position).await?;
        }
        tx.commit().await?;
        Ok(true)
    }
}
