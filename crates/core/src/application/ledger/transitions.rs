// Staff and customer transitions: call, serve, cancel

use super::{entry_not_found, EntryLedger};
use crate::application::locks::QueueGuard;
use crate::application::registry::queue_not_found;
use crate::domain::{Entry, EntryId, QueueId};
use crate::error::Result;
use crate::port::LedgerTransaction;
use tracing::{debug, info, warn};

impl EntryLedger {
    /// Call the head of the line
    ///
    /// Returns `None` when nobody is waiting. Survivors move up by one.
    pub async fn call_next(&self, queue_id: &str) -> Result<Option<Entry>> {
        let _guard = self.locks.acquire(queue_id).await?;
        let mut tx = self.tx_repo.begin_transaction().await?;

        let queue = tx
            .find_queue(queue_id)
            .await?
            .ok_or_else(|| queue_not_found(queue_id))?;

        let Some(mut entry) = tx.head_of_line(queue_id).await? else {
            debug!(queue_id = %queue_id, "Call next on empty line");
            return Ok(None);
        };

        let vacated = entry.call(self.time_provider.now_millis())?;
        tx.save_status(&entry).await?;
        let shifted = tx.close_gap(queue_id, vacated).await?;
        tx.commit().await?;

        info!(
            queue_id = %queue_id,
            entry_id = entry.id,
            renumbered = shifted,
            "Entry called"
        );
        self.notify_called(&queue, &entry).await;
        Ok(Some(entry))
    }

    /// Call a specific waiting entry out of order
    pub async fn call_entry(&self, entry_id: EntryId) -> Result<Entry> {
        let (_guard, mut tx, mut entry) = self.open_entry(entry_id).await?;

        let vacated = entry.call(self.time_provider.now_millis()).map_err(|e| {
            warn!(entry_id = entry_id, error = %e, "Rejected call");
            e
        })?;
        tx.save_status(&entry).await?;
        let shifted = tx.close_gap(&entry.queue_id, vacated).await?;
        let queue = tx
            .find_queue(&entry.queue_id)
            .await?
            .ok_or_else(|| queue_not_found(&entry.queue_id))?;
        tx.commit().await?;

        info!(
            queue_id = %entry.queue_id,
            entry_id = entry_id,
            position = vacated,
            renumbered = shifted,
            "Entry called out of order"
        );
        self.notify_called(&queue, &entry).await;
        Ok(entry)
    }

    /// Finish service of a called entry (no renumbering)
    pub async fn mark_served(&self, entry_id: EntryId) -> Result<Entry> {
        let (_guard, mut tx, mut entry) = self.open_entry(entry_id).await?;

        entry.serve(self.time_provider.now_millis()).map_err(|e| {
            warn!(entry_id = entry_id, error = %e, "Rejected serve");
            e
        })?;
        tx.save_status(&entry).await?;
        tx.commit().await?;

        info!(queue_id = %entry.queue_id, entry_id = entry_id, "Entry served");
        Ok(entry)
    }

    /// Cancel a waiting or called entry
    ///
    /// A waiting cancellation closes the gap behind it in the same transaction.
    pub async fn cancel_entry(&self, entry_id: EntryId) -> Result<Entry> {
        let (_guard, mut tx, mut entry) = self.open_entry(entry_id).await?;

        let vacated = entry.cancel(self.time_provider.now_millis()).map_err(|e| {
            warn!(entry_id = entry_id, error = %e, "Rejected cancel");
            e
        })?;
        tx.save_status(&entry).await?;
        let shifted = match vacated {
            Some(position) => tx.close_gap(&entry.queue_id, position).await?,
            None => 0,
        };
        tx.commit().await?;

        info!(
            queue_id = %entry.queue_id,
            entry_id = entry_id,
            vacated = ?vacated,
            renumbered = shifted,
            "Entry cancelled"
        );
        Ok(entry)
    }

    /// Lock the entry's queue and re-read the entry inside a fresh transaction
    async fn open_entry(
        &self,
        entry_id: EntryId,
    ) -> Result<(QueueGuard, Box<dyn LedgerTransaction>, Entry)> {
        // queue_id is immutable, so an unlocked lookup is enough to pick the lock
        let queue_id: QueueId = self.get_entry(entry_id).await?.queue_id;

        let guard = self.locks.acquire(&queue_id).await?;
        let mut tx = self.tx_repo.begin_transaction().await?;
        let entry = tx
            .find_entry(entry_id)
            .await?
            .ok_or_else(|| entry_not_found(entry_id))?;

        Ok((guard, tx, entry))
    }
}
