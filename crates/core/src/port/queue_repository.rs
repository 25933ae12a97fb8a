// Queue Repository Port (Interface)

use crate::domain::{Queue, QueueId, QueueStatus, StaffId};
use crate::error::Result;
use crate::port::page::Page;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Queue listing filter (all fields optional)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueFilter {
    #[serde(default)]
    pub status: Option<QueueStatus>,
    /// Customer listing: only queues currently accepting entries
    #[serde(default)]
    pub active_only: bool,
    #[serde(default)]
    pub owner_id: Option<StaffId>,
}

impl QueueFilter {
    pub fn owned_by(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: Some(owner_id.into()),
            ..Self::default()
        }
    }

    /// Effective status constraint (`active_only` wins over `status`)
    pub fn effective_status(&self) -> Option<QueueStatus> {
        if self.active_only {
            Some(QueueStatus::Active)
        } else {
            self.status
        }
    }
}

/// Result of an atomic "delete unless in use"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    /// Queue still holds this many waiting/called entries
    HasLiveEntries(i64),
}

/// Repository interface for Queue persistence
///
/// Every read returns `current_size` computed from the waiting entries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueueRepository: Send + Sync {
    /// Insert a new queue (`Conflict` if the name is taken)
    async fn insert(&self, queue: &Queue) -> Result<()>;

    /// Find queue by ID
    async fn find_by_id(&self, id: &str) -> Result<Option<Queue>>;

    /// Find queue by its unique name
    async fn find_by_name(&self, name: &str) -> Result<Option<Queue>>;

    /// List queues in insertion order
    async fn list(&self, filter: &QueueFilter, page: Page) -> Result<Vec<Queue>>;

    /// All queue ids in insertion order
    async fn list_ids(&self) -> Result<Vec<QueueId>>;

    /// Overwrite mutable queue fields (`Conflict` if a rename collides)
    async fn update(&self, queue: &Queue) -> Result<()>;

    /// Delete the queue and its finished entries unless live entries remain
    async fn delete_if_idle(&self, id: &str) -> Result<DeleteOutcome>;
}
