//! RPC Request/Response Types
//!
//! Every method takes one named-object parameter. Queues and entries are
//! returned as the core domain types.

use serde::{Deserialize, Serialize};
use waitline_core::domain::{Entry, EntryId, EntryStatus, QueueStatus};
use waitline_core::port::{MaintenanceStats, Page, QueueFilter};

/// queue.list.v1 - List queues (public)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQueuesRequest {
    #[serde(default)]
    pub status: Option<QueueStatus>,
    #[serde(default)]
    pub active_only: bool,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub offset: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

impl ListQueuesRequest {
    pub fn filter(&self) -> QueueFilter {
        QueueFilter {
            status: self.status,
            active_only: self.active_only,
            owner_id: self.owner_id.clone(),
        }
    }

    pub fn page(&self) -> Page {
        Page::new(self.offset, self.limit)
    }
}

/// queue.get.v1
#[derive(Debug, Deserialize)]
pub struct GetQueueRequest {
    pub queue_id: String,
}

/// queue.create.v1 - Create a queue owned by the caller
#[derive(Debug, Deserialize)]
pub struct CreateQueueRequest {
    pub staff_id: String,
    pub name: String,
    pub business_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub estimated_wait_minutes: Option<i64>,
}

/// queue.update.v1 - Partial update (owner only)
#[derive(Debug, Deserialize)]
pub struct UpdateQueueRequest {
    pub staff_id: String,
    pub queue_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub status: Option<QueueStatus>,
    #[serde(default)]
    pub estimated_wait_minutes: Option<i64>,
}

/// queue.delete.v1 (owner only)
#[derive(Debug, Deserialize)]
pub struct DeleteQueueRequest {
    pub staff_id: String,
    pub queue_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteQueueResponse {
    pub queue_id: String,
    pub deleted: bool,
}

/// entry.join.v1 - Customer joins a queue
#[derive(Debug, Deserialize)]
pub struct JoinQueueRequest {
    pub queue_id: String,
    pub customer_name: String,
    pub phone_number: String,
    #[serde(default)]
    pub party_size: Option<i32>,
}

/// entry.list.v1 - Entries of a queue (owner only)
#[derive(Debug, Deserialize)]
pub struct ListEntriesRequest {
    pub staff_id: String,
    pub queue_id: String,
    #[serde(default)]
    pub status: Option<EntryStatus>,
    #[serde(default)]
    pub offset: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

/// entry.get.v1 - Status check (customer)
#[derive(Debug, Deserialize)]
pub struct GetEntryRequest {
    pub entry_id: EntryId,
}

/// entry.call_next.v1 (owner only)
#[derive(Debug, Deserialize)]
pub struct CallNextRequest {
    pub staff_id: String,
    pub queue_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CallNextResponse {
    /// `None` when nobody was waiting
    pub entry: Option<Entry>,
}

/// entry.call.v1 / entry.serve.v1 (owner only)
#[derive(Debug, Deserialize)]
pub struct StaffEntryRequest {
    pub staff_id: String,
    pub entry_id: EntryId,
}

/// entry.cancel.v1 - Customer self-cancel, or staff cancel when `staff_id` is given
#[derive(Debug, Deserialize)]
pub struct CancelEntryRequest {
    pub entry_id: EntryId,
    #[serde(default)]
    pub staff_id: Option<String>,
}

/// admin.stats.v1
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: MaintenanceStats,
    pub uptime_seconds: u64,
}

/// admin.maintenance.v1 - Run manual maintenance
#[derive(Debug, Default, Deserialize)]
pub struct MaintenanceRequest {
    #[serde(default)]
    pub force_vacuum: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MaintenanceResponse {
    pub vacuum_run: bool,
    pub purged_entries: i64,
    pub reclaimed_mb: f64,
    pub db_size_bytes: i64,
}

/// system.health.v1
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_queues_defaults() {
        let req: ListQueuesRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(req.filter(), QueueFilter::default());
        assert_eq!(req.page(), Page::default());
    }

    #[test]
    fn test_cancel_without_staff_is_customer_path() {
        let req: CancelEntryRequest = serde_json::from_value(json!({"entry_id": 7})).unwrap();
        assert_eq!(req.entry_id, 7);
        assert!(req.staff_id.is_none());
    }

    #[test]
    fn test_update_status_parses_lowercase() {
        let req: UpdateQueueRequest = serde_json::from_value(json!({
            "staff_id": "s", "queue_id": "q", "status": "paused"
        }))
        .unwrap();
        assert_eq!(req.status, Some(QueueStatus::Paused));
        assert!(req.name.is_none());
    }
}
