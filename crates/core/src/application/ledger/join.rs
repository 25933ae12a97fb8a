// JoinQueue: append a customer to the back of a waiting line

use super::EntryLedger;
use crate::application::registry::queue_not_found;
use crate::domain::entry::{validate_customer_name, validate_party_size, validate_phone_number};
use crate::domain::{Entry, NewEntry};
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

fn default_party_size() -> i32 {
    1
}

/// Join request (customer facing)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRequest {
    pub queue_id: String,
    pub customer_name: String,
    pub phone_number: String,
    #[serde(default = "default_party_size")]
    pub party_size: i32,
}

impl JoinRequest {
    pub fn new(
        queue_id: impl Into<String>,
        customer_name: impl Into<String>,
        phone_number: impl Into<String>,
    ) -> Self {
        Self {
            queue_id: queue_id.into(),
            customer_name: customer_name.into(),
            phone_number: phone_number.into(),
            party_size: default_party_size(),
        }
    }

    pub fn with_party_size(mut self, party_size: i32) -> Self {
        self.party_size = party_size;
        self
    }
}

/// Validate a join request before any storage access
pub(crate) fn validate_request(req: &JoinRequest) -> Result<()> {
    validate_customer_name(&req.customer_name)?;
    validate_phone_number(req.phone_number.trim())?;
    validate_party_size(req.party_size)?;
    Ok(())
}

impl EntryLedger {
    /// Append a waiting entry at `waiting_count + 1`
    ///
    /// # Errors
    /// - `Validation` for a malformed name, phone or party size
    /// - `NotFound` for an unknown queue
    /// - `Conflict` when the queue is not active at commit time
    /// - `Busy` when the queue lock times out
    pub async fn join_queue(&self, req: JoinRequest) -> Result<Entry> {
        validate_request(&req)?;

        let _guard = self.locks.acquire(&req.queue_id).await?;
        let mut tx = self.tx_repo.begin_transaction().await?;

        // Status is read inside the transaction, after any concurrent pause committed
        let queue = tx
            .find_queue(&req.queue_id)
            .await?
            .ok_or_else(|| queue_not_found(&req.queue_id))?;
        if !queue.status.accepts_entries() {
            return Err(AppError::Conflict(format!(
                "queue {} is {} and not accepting entries",
                queue.id, queue.status
            )));
        }

        let waiting = tx.count_waiting(&queue.id).await?;
        let new_entry = NewEntry {
            queue_id: queue.id.clone(),
            customer_name: req.customer_name.trim().to_string(),
            phone_number: req.phone_number.trim().to_string(),
            party_size: req.party_size,
            position: waiting + 1,
            joined_at: self.time_provider.now_millis(),
        };
        let entry_id = tx.insert_entry(&new_entry).await?;
        tx.commit().await?;

        let entry = new_entry.into_entry(entry_id, queue.estimated_wait_minutes);
        info!(
            queue_id = %queue.id,
            entry_id = entry.id,
            position = entry.position,
            estimated_wait_minutes = entry.estimated_wait_minutes,
            "Entry joined"
        );

        self.notify_joined(&queue, &entry).await;
        Ok(entry)
    }
}
