// Notifier Port (boundary to SMS / push delivery)

use crate::domain::{Entry, Queue};
use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Notification failed: {0}")]
pub struct NotifyError(pub String);

/// Customer notifications emitted after a ledger change commits
///
/// Failures are reported to the caller, which logs them; they never undo
/// the committed change.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// A customer joined `queue` and holds `entry.position`
    async fn entry_joined(&self, queue: &Queue, entry: &Entry) -> Result<(), NotifyError>;

    /// A customer was called to the counter
    async fn entry_called(&self, queue: &Queue, entry: &Entry) -> Result<(), NotifyError>;
}

/// Writes notifications to the log instead of delivering them
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn entry_joined(&self, queue: &Queue, entry: &Entry) -> Result<(), NotifyError> {
        info!(
            queue_id = %queue.id,
            entry_id = entry.id,
            position = entry.position,
            estimated_wait_minutes = entry.estimated_wait_minutes,
            "Notify: joined {}",
            queue.business_name
        );
        Ok(())
    }

    async fn entry_called(&self, queue: &Queue, entry: &Entry) -> Result<(), NotifyError> {
        info!(
            queue_id = %queue.id,
            entry_id = entry.id,
            "Notify: {} is being called at {}",
            entry.customer_name,
            queue.business_name
        );
        Ok(())
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::domain::EntryId;
    use std::sync::{Arc, Mutex, PoisonError};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Notification {
        Joined(EntryId),
        Called(EntryId),
    }

    /// Records every notification; optionally fails them all
    #[derive(Clone, Default)]
    pub struct RecordingNotifier {
        sent: Arc<Mutex<Vec<Notification>>>,
        fail: bool,
    }

    impl RecordingNotifier {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub fn sent(&self) -> Vec<Notification> {
            self.sent
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }

        fn record(&self, notification: Notification) -> Result<(), NotifyError> {
            self.sent
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(notification);
            if self.fail {
                Err(NotifyError("gateway unavailable".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn entry_joined(&self, _queue: &Queue, entry: &Entry) -> Result<(), NotifyError> {
            self.record(Notification::Joined(entry.id))
        }

        async fn entry_called(&self, _queue: &Queue, entry: &Entry) -> Result<(), NotifyError> {
            self.record(Notification::Called(entry.id))
        }
    }
}
