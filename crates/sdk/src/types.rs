//! SDK Request/Response Types
//!
//! Serializing mirrors of the daemon's JSON-RPC parameter objects. Queues
//! and entries come back as the core domain types.

use serde::{Deserialize, Serialize};
use waitline_core::domain::{Entry, EntryId, EntryStatus, QueueStatus};
use waitline_core::port::MaintenanceStats;

/// Filter and page for `list_queues`
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListQueuesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<QueueStatus>,
    pub active_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

impl ListQueuesRequest {
    /// Queues owned by one staff member
    pub fn owned_by(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: Some(owner_id.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateQueueRequest {
    pub staff_id: String,
    pub name: String,
    pub business_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Minutes of service per customer (daemon default 5)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_wait_minutes: Option<i64>,
}

/// Partial update; unset fields are left untouched
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateQueueRequest {
    pub staff_id: String,
    pub queue_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<QueueStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_wait_minutes: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteQueueResponse {
    pub queue_id: String,
    pub deleted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct JoinQueueRequest {
    pub queue_id: String,
    pub customer_name: String,
    pub phone_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub party_size: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListEntriesRequest {
    pub staff_id: String,
    pub queue_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EntryStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CallNextResponse {
    pub entry: Option<Entry>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct EntryParams<'a> {
    pub entry_id: EntryId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staff_id: Option<&'a str>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct QueueParams<'a> {
    pub queue_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staff_id: Option<&'a str>,
}

/// Daemon statistics
#[derive(Debug, Clone, Deserialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: MaintenanceStats,
    pub uptime_seconds: u64,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct MaintenanceRequest {
    pub force_vacuum: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MaintenanceResponse {
    pub vacuum_run: bool,
    pub purged_entries: i64,
    pub reclaimed_mb: f64,
    pub db_size_bytes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
