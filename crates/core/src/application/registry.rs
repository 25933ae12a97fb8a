// Queue Registry - queue lifecycle and configuration

use crate::application::locks::QueueLocks;
use crate::domain::{Queue, QueueDraft, QueuePatch};
use crate::error::{AppError, Result};
use crate::port::{DeleteOutcome, IdProvider, Page, QueueFilter, QueueRepository, TimeProvider};
use std::sync::Arc;
use tracing::{info, warn};

/// Queue Registry
///
/// Updates run inside the queue's exclusive section so a concurrent rename
/// or status change is never lost between read and write.
pub struct QueueRegistry {
    queue_repo: Arc<dyn QueueRepository>,
    locks: Arc<QueueLocks>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
}

impl QueueRegistry {
    pub fn new(
        queue_repo: Arc<dyn QueueRepository>,
        locks: Arc<QueueLocks>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            queue_repo,
            locks,
            id_provider,
            time_provider,
        }
    }

    /// Create a new active queue owned by `owner_id`
    pub async fn create_queue(&self, owner_id: &str, draft: QueueDraft) -> Result<Queue> {
        if owner_id.trim().is_empty() {
            return Err(AppError::Validation("owner_id cannot be empty".to_string()));
        }
        draft.validate()?;

        let queue = Queue::new(
            self.id_provider.generate_id(),
            owner_id.trim(),
            draft,
            self.time_provider.now_millis(),
        );

        if self.queue_repo.find_by_name(&queue.name).await?.is_some() {
            return Err(name_taken(&queue.name));
        }
        // The UNIQUE constraint still guards the race between check and insert
        self.queue_repo.insert(&queue).await?;

        info!(
            queue_id = %queue.id,
            name = %queue.name,
            owner_id = %queue.owner_id,
            estimated_wait_minutes = queue.estimated_wait_minutes,
            "Queue created"
        );
        Ok(queue)
    }

    pub async fn get_queue(&self, queue_id: &str) -> Result<Queue> {
        self.queue_repo
            .find_by_id(queue_id)
            .await?
            .ok_or_else(|| queue_not_found(queue_id))
    }

    /// List queues in insertion order
    pub async fn list_queues(&self, filter: &QueueFilter, page: Page) -> Result<Vec<Queue>> {
        self.queue_repo.list(filter, page).await
    }

    /// Apply a partial update
    pub async fn update_queue(&self, queue_id: &str, patch: QueuePatch) -> Result<Queue> {
        let _guard = self.locks.acquire(queue_id).await?;

        let mut queue = self.get_queue(queue_id).await?;
        let previous_status = queue.status;
        queue.apply(patch, self.time_provider.now_millis())?;

        if let Some(other) = self.queue_repo.find_by_name(&queue.name).await? {
            if other.id != queue.id {
                return Err(name_taken(&queue.name));
            }
        }
        self.queue_repo.update(&queue).await?;

        if previous_status != queue.status {
            info!(
                queue_id = %queue.id,
                from = %previous_status,
                to = %queue.status,
                "Queue status changed"
            );
        } else {
            info!(queue_id = %queue.id, "Queue updated");
        }
        Ok(queue)
    }

    /// Delete a queue that has no waiting or called entries
    pub async fn delete_queue(&self, queue_id: &str) -> Result<()> {
        let _guard = self.locks.acquire(queue_id).await?;

        match self.queue_repo.delete_if_idle(queue_id).await? {
            DeleteOutcome::Deleted => {
                info!(queue_id = %queue_id, "Queue deleted");
                Ok(())
            }
            DeleteOutcome::NotFound => Err(queue_not_found(queue_id)),
            DeleteOutcome::HasLiveEntries(live) => {
                warn!(queue_id = %queue_id, live_entries = live, "Refusing to delete busy queue");
                Err(AppError::Conflict(format!(
                    "queue {} still has {} waiting or called entries",
                    queue_id, live
                )))
            }
        }
    }
}

pub(crate) fn queue_not_found(queue_id: &str) -> AppError {
    AppError::NotFound(format!("queue {}", queue_id))
}

fn name_taken(name: &str) -> AppError {
    AppError::Conflict(format!("a queue named '{}' already exists", name))
}
