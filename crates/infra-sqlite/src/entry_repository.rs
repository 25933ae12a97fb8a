// SQLite EntryRepository Implementation

use crate::rows::{into_entries, EntryRow, ENTRY_SELECT};
use crate::store::{map_sqlx_error, SqliteStore};
use async_trait::async_trait;
use waitline_core::domain::{Entry, EntryId, EntryStatus};
use waitline_core::error::Result;
use waitline_core::port::{EntryRepository, Page};

/// WHERE/ORDER BY for a queue listing
fn listing_clause(status: Option<EntryStatus>) -> &'static str {
    match status {
        // Live view: the waiting line first, then whoever is at the counter
        None => {
            "WHERE e.queue_id = ? AND e.status IN ('waiting', 'called')
             ORDER BY CASE e.status WHEN 'waiting' THEN 0 ELSE 1 END,
                      CASE e.status WHEN 'waiting' THEN e.position ELSE e.called_at END,
                      e.id"
        }
        Some(EntryStatus::Waiting) => {
            "WHERE e.queue_id = ? AND e.status = ? ORDER BY e.position ASC, e.id ASC"
        }
        Some(_) => "WHERE e.queue_id = ? AND e.status = ? ORDER BY e.id ASC",
    }
}

#[async_trait]
impl EntryRepository for SqliteStore {
    async fn find_by_id(&self, id: EntryId) -> Result<Option<Entry>> {
        let sql = format!("{} WHERE e.id = ?", ENTRY_SELECT);
        let row: Option<EntryRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.map(EntryRow::into_entry).transpose()
    }

    async fn list_for_queue(
        &self,
        queue_id: &str,
        status: Option<EntryStatus>,
        page: Page,
    ) -> Result<Vec<Entry>> {
        let sql = format!(
            "{} {} LIMIT ? OFFSET ?",
            ENTRY_SELECT,
            listing_clause(status)
        );

        let mut query = sqlx::query_as::<_, EntryRow>(&sql).bind(queue_id);
        if let Some(status) = status {
            query = query.bind(status.as_str());
        }
        let rows = query
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        into_entries(rows)
    }
}
