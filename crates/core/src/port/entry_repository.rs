// Entry Repository Port (read side)

use crate::domain::{Entry, EntryId, EntryStatus};
use crate::error::Result;
use crate::port::page::Page;
use async_trait::async_trait;

/// Committed-state reads of entries
///
/// Returned entries carry `estimated_wait_minutes` computed from their
/// current position and the owning queue's service time.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EntryRepository: Send + Sync {
    /// Find entry by ID
    async fn find_by_id(&self, id: EntryId) -> Result<Option<Entry>>;

    /// List entries of a queue
    ///
    /// `None` status returns live entries: waiting by position, then called
    /// by `called_at`. A given status returns only that status (waiting by
    /// position, others by id).
    async fn list_for_queue(
        &self,
        queue_id: &str,
        status: Option<EntryStatus>,
        page: Page,
    ) -> Result<Vec<Entry>>;
}
