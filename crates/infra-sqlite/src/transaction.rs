// SQLite Transaction Implementation

use crate::rows::{EntryRow, QueueRow, ENTRY_SELECT, QUEUE_SELECT};
use crate::store::map_sqlx_error;
use async_trait::async_trait;
use sqlx::{Sqlite, Transaction as SqlxTransaction};
use tokio::sync::OwnedMutexGuard;
use waitline_core::domain::{Entry, EntryId, NewEntry, Queue};
use waitline_core::error::Result;
use waitline_core::port::{LedgerTransaction, Transaction};

/// Write transaction holding the store's write gate
///
/// Field order matters: the transaction is dropped (rolled back) before
/// the gate is released.
pub struct SqliteLedgerTransaction {
    tx: SqlxTransaction<'static, Sqlite>,
    _gate: OwnedMutexGuard<()>,
}

impl SqliteLedgerTransaction {
    pub(crate) fn new(tx: SqlxTransaction<'static, Sqlite>, gate: OwnedMutexGuard<()>) -> Self {
        Self { tx, _gate: gate }
    }
}

#[async_trait]
impl Transaction for SqliteLedgerTransaction {
    async fn commit(self: Box<Self>) -> Result<()> {
        let this = *self;
        this.tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        let this = *self;
        this.tx.rollback().await.map_err(map_sqlx_error)?;
        Ok(())
    }
}

#[async_trait]
impl LedgerTransaction for SqliteLedgerTransaction {
    async fn find_queue(&mut self, queue_id: &str) -> Result<Option<Queue>> {
        let sql = format!("{} WHERE q.id = ?", QUEUE_SELECT);
        let row: Option<QueueRow> = sqlx::query_as(&sql)
            .bind(queue_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;

        row.map(QueueRow::into_queue).transpose()
    }

    async fn find_entry(&mut self, entry_id: EntryId) -> Result<Option<Entry>> {
        let sql = format!("{} WHERE e.id = ?", ENTRY_SELECT);
        let row: Option<EntryRow> = sqlx::query_as(&sql)
            .bind(entry_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;

        row.map(EntryRow::into_entry).transpose()
    }

    async fn count_waiting(&mut self, queue_id: &str) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM entries WHERE queue_id = ? AND status = 'waiting'")
            .bind(queue_id)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)
    }

    async fn insert_entry(&mut self, entry: &NewEntry) -> Result<EntryId> {
        let result = sqlx::query(
            r#"
            INSERT INTO entries (
                queue_id, customer_name, phone_number, party_size,
                position, status, joined_at
            ) VALUES (?, ?, ?, ?, ?, 'waiting', ?)
            "#,
        )
        .bind(&entry.queue_id)
        .bind(&entry.customer_name)
        .bind(&entry.phone_number)
        .bind(entry.party_size)
        .bind(entry.position)
        .bind(entry.joined_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.last_insert_rowid())
    }

    async fn head_of_line(&mut self, queue_id: &str) -> Result<Option<Entry>> {
        let sql = format!(
            "{} WHERE e.queue_id = ? AND e.status = 'waiting' ORDER BY e.position ASC, e.id ASC LIMIT 1",
            ENTRY_SELECT
        );
        let row: Option<EntryRow> = sqlx::query_as(&sql)
            .bind(queue_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;

        row.map(EntryRow::into_entry).transpose()
    }

    async fn save_status(&mut self, entry: &Entry) -> Result<()> {
        // Position is frozen once an entry leaves the line, so it is not written here
        sqlx::query(
            r#"
            UPDATE entries
            SET status = ?, called_at = ?, served_at = ?, cancelled_at = ?
            WHERE id = ?
            "#,
        )
        .bind(entry.status.as_str())
        .bind(entry.called_at)
        .bind(entry.served_at)
        .bind(entry.cancelled_at)
        .bind(entry.id)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn close_gap(&mut self, queue_id: &str, vacated: i64) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE entries
            SET position = position - 1
            WHERE queue_id = ? AND status = 'waiting' AND position > ?
            "#,
        )
        .bind(queue_id)
        .bind(vacated)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn waiting_line(&mut self, queue_id: &str) -> Result<Vec<(EntryId, i64)>> {
        sqlx::query_as(
            r#"
            SELECT id, position FROM entries
            WHERE queue_id = ? AND status = 'waiting'
            ORDER BY position ASC, id ASC
            "#,
        )
        .bind(queue_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)
    }

    async fn set_position(&mut self, entry_id: EntryId, position: i64) -> Result<()> {
        sqlx::query("UPDATE entries SET position = ? WHERE id = ? AND status = 'waiting'")
            .bind(position)
            .bind(entry_id)
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }
}
