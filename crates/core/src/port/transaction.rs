// Transaction port for atomic ledger operations

use crate::domain::{Entry, EntryId, NewEntry, Queue};
use crate::error::Result;
use async_trait::async_trait;

/// Transaction trait for atomic multi-step operations
///
/// Dropping an uncommitted transaction rolls it back.
#[async_trait]
pub trait Transaction: Send {
    /// Commit the transaction
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Rollback the transaction
    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Entry point for read-modify-write work on a queue's waiting line
#[async_trait]
pub trait TransactionalLedgerRepository: Send + Sync {
    /// Begin a new write transaction
    async fn begin_transaction(&self) -> Result<Box<dyn LedgerTransaction>>;
}

/// Ledger operations within a transaction
#[async_trait]
pub trait LedgerTransaction: Transaction {
    /// Re-read a queue (status and service time) inside the transaction
    async fn find_queue(&mut self, queue_id: &str) -> Result<Option<Queue>>;

    /// Read an entry inside the transaction
    async fn find_entry(&mut self, entry_id: EntryId) -> Result<Option<Entry>>;

    /// Count waiting entries of a queue
    async fn count_waiting(&mut self, queue_id: &str) -> Result<i64>;

    /// Insert a waiting entry, returning its storage-assigned id
    async fn insert_entry(&mut self, entry: &NewEntry) -> Result<EntryId>;

    /// Waiting entry with the lowest position
    async fn head_of_line(&mut self, queue_id: &str) -> Result<Option<Entry>>;

    /// Persist an entry's status and lifecycle timestamps
    async fn save_status(&mut self, entry: &Entry) -> Result<()>;

    /// Shift every waiting entry behind `vacated` forward by one
    ///
    /// Returns the number of entries renumbered.
    async fn close_gap(&mut self, queue_id: &str, vacated: i64) -> Result<u64>;

    /// Waiting entries as `(id, position)`, ordered by `(position, id)`
    async fn waiting_line(&mut self, queue_id: &str) -> Result<Vec<(EntryId, i64)>>;

    /// Overwrite one waiting entry's position
    async fn set_position(&mut self, entry_id: EntryId, position: i64) -> Result<()>;
}
