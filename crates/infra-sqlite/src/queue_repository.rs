// SQLite QueueRepository Implementation

use crate::rows::{into_queues, QueueRow, QUEUE_SELECT};
use crate::store::{map_sqlx_error, SqliteStore};
use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite};
use tracing::debug;
use waitline_core::domain::{Queue, QueueId};
use waitline_core::error::Result;
use waitline_core::port::{DeleteOutcome, Page, QueueFilter, QueueRepository};

#[async_trait]
impl QueueRepository for SqliteStore {
    async fn insert(&self, queue: &Queue) -> Result<()> {
        let _gate = self.write_lock().await?;

        sqlx::query(
            r#"
            INSERT INTO queues (
                id, name, business_name, description, address, status,
                estimated_wait_minutes, owner_id, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&queue.id)
        .bind(&queue.name)
        .bind(&queue.business_name)
        .bind(&queue.description)
        .bind(&queue.address)
        .bind(queue.status.as_str())
        .bind(queue.estimated_wait_minutes)
        .bind(&queue.owner_id)
        .bind(queue.created_at)
        .bind(queue.updated_at)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Queue>> {
        let sql = format!("{} WHERE q.id = ?", QUEUE_SELECT);
        let row: Option<QueueRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.map(QueueRow::into_queue).transpose()
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Queue>> {
        let sql = format!("{} WHERE q.name = ?", QUEUE_SELECT);
        let row: Option<QueueRow> = sqlx::query_as(&sql)
            .bind(name)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.map(QueueRow::into_queue).transpose()
    }

    async fn list(&self, filter: &QueueFilter, page: Page) -> Result<Vec<Queue>> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(QUEUE_SELECT);
        query.push(" WHERE 1 = 1");
        if let Some(status) = filter.effective_status() {
            query.push(" AND q.status = ").push_bind(status.as_str());
        }
        if let Some(owner_id) = &filter.owner_id {
            query.push(" AND q.owner_id = ").push_bind(owner_id.clone());
        }
        // rowid follows insertion order
        query
            .push(" ORDER BY q.rowid ASC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset);

        let rows: Vec<QueueRow> = query
            .build_query_as::<QueueRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        debug!(count = rows.len(), "Listed queues");
        into_queues(rows)
    }

    async fn list_ids(&self) -> Result<Vec<QueueId>> {
        sqlx::query_scalar("SELECT id FROM queues ORDER BY rowid ASC")
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn update(&self, queue: &Queue) -> Result<()> {
        let _gate = self.write_lock().await?;

        sqlx::query(
            r#"
            UPDATE queues
            SET name = ?, business_name = ?, description = ?, address = ?,
                status = ?, estimated_wait_minutes = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&queue.name)
        .bind(&queue.business_name)
        .bind(&queue.description)
        .bind(&queue.address)
        .bind(queue.status.as_str())
        .bind(queue.estimated_wait_minutes)
        .bind(queue.updated_at)
        .bind(&queue.id)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn delete_if_idle(&self, id: &str) -> Result<DeleteOutcome> {
        let _gate = self.write_lock().await?;
        let mut tx = self.pool().begin().await.map_err(map_sqlx_error)?;

        let exists: Option<String> = sqlx::query_scalar("SELECT id FROM queues WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        if exists.is_none() {
            return Ok(DeleteOutcome::NotFound);
        }

        let live: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM entries WHERE queue_id = ? AND status IN ('waiting', 'called')",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;
        if live > 0 {
            return Ok(DeleteOutcome::HasLiveEntries(live));
        }

        // Finished entries go with the queue
        let purged = sqlx::query("DELETE FROM entries WHERE queue_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .rows_affected();
        sqlx::query("DELETE FROM queues WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        debug!(queue_id = %id, purged_entries = purged, "Queue row deleted");
        Ok(DeleteOutcome::Deleted)
    }
}
