// Row types and shared SELECT clauses

use waitline_core::domain::{Entry, EntryStatus, Queue, QueueStatus};
use waitline_core::error::{AppError, Result};

/// Queue columns plus the derived waiting count
pub(crate) const QUEUE_SELECT: &str = r#"
    SELECT q.id, q.name, q.business_name, q.description, q.address, q.status,
           q.estimated_wait_minutes, q.owner_id, q.created_at, q.updated_at,
           (SELECT COUNT(*) FROM entries e
             WHERE e.queue_id = q.id AND e.status = 'waiting') AS current_size
    FROM queues q
"#;

/// Entry columns plus the owning queue's per-customer minutes
pub(crate) const ENTRY_SELECT: &str = r#"
    SELECT e.id, e.queue_id, e.customer_name, e.phone_number, e.party_size,
           e.position, e.status, e.joined_at, e.called_at, e.served_at,
           e.cancelled_at, q.estimated_wait_minutes AS service_minutes
    FROM entries e
    JOIN queues q ON q.id = e.queue_id
"#;

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct QueueRow {
    id: String,
    name: String,
    business_name: String,
    description: Option<String>,
    address: Option<String>,
    status: String,
    estimated_wait_minutes: i64,
    owner_id: String,
    created_at: i64,
    updated_at: Option<i64>,
    current_size: i64,
}

impl QueueRow {
    pub(crate) fn into_queue(self) -> Result<Queue> {
        let status: QueueStatus = self
            .status
            .parse()
            .map_err(|_| corrupt("queue", &self.id, &self.status))?;
        Ok(Queue {
            id: self.id,
            name: self.name,
            business_name: self.business_name,
            description: self.description,
            address: self.address,
            status,
            estimated_wait_minutes: self.estimated_wait_minutes,
            current_size: self.current_size,
            owner_id: self.owner_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct EntryRow {
    id: i64,
    queue_id: String,
    customer_name: String,
    phone_number: String,
    party_size: i32,
    position: i64,
    status: String,
    joined_at: i64,
    called_at: Option<i64>,
    served_at: Option<i64>,
    cancelled_at: Option<i64>,
    service_minutes: i64,
}

impl EntryRow {
    pub(crate) fn into_entry(self) -> Result<Entry> {
        let status: EntryStatus = self
            .status
            .parse()
            .map_err(|_| corrupt("entry", &self.id.to_string(), &self.status))?;
        let mut entry = Entry {
            id: self.id,
            queue_id: self.queue_id,
            customer_name: self.customer_name,
            phone_number: self.phone_number,
            party_size: self.party_size,
            position: self.position,
            status,
            joined_at: self.joined_at,
            called_at: self.called_at,
            served_at: self.served_at,
            cancelled_at: self.cancelled_at,
            estimated_wait_minutes: 0,
        };
        entry.refresh_estimate(self.service_minutes);
        Ok(entry)
    }
}

pub(crate) fn into_queues(rows: Vec<QueueRow>) -> Result<Vec<Queue>> {
    rows.into_iter().map(QueueRow::into_queue).collect()
}

pub(crate) fn into_entries(rows: Vec<EntryRow>) -> Result<Vec<Entry>> {
    rows.into_iter().map(EntryRow::into_entry).collect()
}

fn corrupt(kind: &str, id: &str, status: &str) -> AppError {
    AppError::Database(format!("{} {} has unknown status '{}'", kind, id, status))
}
