// Entry Ledger - ordered waiting lines and the entry state machine

mod join;
mod transitions;

pub use join::JoinRequest;

use crate::application::constants::DEFAULT_LOCK_TIMEOUT;
use crate::application::locks::QueueLocks;
use crate::application::registry::queue_not_found;
use crate::domain::{Entry, EntryId, EntryStatus, Queue};
use crate::error::{AppError, Result};
use crate::port::{
    EntryRepository, Notifier, Page, QueueRepository, TimeProvider, TransactionalLedgerRepository,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Engine tunables
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Bound on waiting for a queue's exclusive section
    pub lock_timeout: Duration,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }
}

/// Entry Ledger
///
/// Mutations take the queue lock first, then open one storage transaction,
/// and commit before any notification goes out.
pub struct EntryLedger {
    tx_repo: Arc<dyn TransactionalLedgerRepository>,
    entry_repo: Arc<dyn EntryRepository>,
    queue_repo: Arc<dyn QueueRepository>,
    locks: Arc<QueueLocks>,
    notifier: Arc<dyn Notifier>,
    time_provider: Arc<dyn TimeProvider>,
}

impl EntryLedger {
    pub fn new(
        tx_repo: Arc<dyn TransactionalLedgerRepository>,
        entry_repo: Arc<dyn EntryRepository>,
        queue_repo: Arc<dyn QueueRepository>,
        locks: Arc<QueueLocks>,
        notifier: Arc<dyn Notifier>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            tx_repo,
            entry_repo,
            queue_repo,
            locks,
            notifier,
            time_provider,
        }
    }

    /// Latest committed state of an entry
    pub async fn get_entry(&self, entry_id: EntryId) -> Result<Entry> {
        self.entry_repo
            .find_by_id(entry_id)
            .await?
            .ok_or_else(|| entry_not_found(entry_id))
    }

    /// Entries of a queue (see `EntryRepository::list_for_queue` for ordering)
    pub async fn list_entries(
        &self,
        queue_id: &str,
        status: Option<EntryStatus>,
        page: Page,
    ) -> Result<Vec<Entry>> {
        if self.queue_repo.find_by_id(queue_id).await?.is_none() {
            return Err(queue_not_found(queue_id));
        }
        self.entry_repo.list_for_queue(queue_id, status, page).await
    }

    async fn notify_joined(&self, queue: &Queue, entry: &Entry) {
        if let Err(e) = self.notifier.entry_joined(queue, entry).await {
            warn!(entry_id = entry.id, error = %e, "Join notification failed");
        }
    }

    async fn notify_called(&self, queue: &Queue, entry: &Entry) {
        if let Err(e) = self.notifier.entry_called(queue, entry).await {
            warn!(entry_id = entry.id, error = %e, "Call notification failed");
        }
    }
}

pub(crate) fn entry_not_found(entry_id: EntryId) -> AppError {
    AppError::NotFound(format!("entry {}", entry_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewEntry, QueueDraft, QueueStatus};
    use crate::error::ErrorKind;
    use crate::port::entry_repository::MockEntryRepository;
    use crate::port::notifier::{MockNotifier, NotifyError};
    use crate::port::queue_repository::MockQueueRepository;
    use crate::port::time_provider::mocks::FixedTimeProvider;
    use crate::port::{LedgerTransaction, Transaction};
    use async_trait::async_trait;
    use std::sync::{Mutex, PoisonError};

    #[derive(Clone, Default)]
    struct Line {
        queue: Option<Queue>,
        entries: Vec<Entry>,
        next_id: EntryId,
    }

    type Shared = Arc<Mutex<Line>>;

    fn snapshot(shared: &Shared) -> Line {
        shared.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// In-memory store; a transaction works on a copy and publishes it on commit
    struct MemoryLedger(Shared);

    struct MemoryTx {
        shared: Shared,
        work: Line,
    }

    #[async_trait]
    impl TransactionalLedgerRepository for MemoryLedger {
        async fn begin_transaction(&self) -> Result<Box<dyn LedgerTransaction>> {
            Ok(Box::new(MemoryTx {
                shared: Arc::clone(&self.0),
                work: snapshot(&self.0),
            }))
        }
    }

    #[async_trait]
    impl Transaction for MemoryTx {
        async fn commit(self: Box<Self>) -> Result<()> {
            *self.shared.lock().unwrap_or_else(PoisonError::into_inner) = self.work;
            Ok(())
        }

        async fn rollback(self: Box<Self>) -> Result<()> {
            Ok(())
        }
    }

    impl MemoryTx {
        fn waiting(&self, queue_id: &str) -> impl Iterator<Item = &Entry> {
            let queue_id = queue_id.to_string();
            self.work
                .entries
                .iter()
                .filter(move |e| e.queue_id == queue_id && e.is_waiting())
        }

        fn minutes(&self) -> i64 {
            self.work
                .queue
                .as_ref()
                .map_or(0, |q| q.estimated_wait_minutes)
        }
    }

    #[async_trait]
    impl LedgerTransaction for MemoryTx {
        async fn find_queue(&mut self, queue_id: &str) -> Result<Option<Queue>> {
            let size = self.waiting(queue_id).count() as i64;
            Ok(self
                .work
                .queue
                .clone()
                .filter(|q| q.id == queue_id)
                .map(|mut q| {
                    q.current_size = size;
                    q
                }))
        }

        async fn find_entry(&mut self, entry_id: EntryId) -> Result<Option<Entry>> {
            let minutes = self.minutes();
            Ok(self
                .work
                .entries
                .iter()
                .find(|e| e.id == entry_id)
                .cloned()
                .map(|mut e| {
                    e.refresh_estimate(minutes);
                    e
                }))
        }

        async fn count_waiting(&mut self, queue_id: &str) -> Result<i64> {
            Ok(self.waiting(queue_id).count() as i64)
        }

        async fn insert_entry(&mut self, entry: &NewEntry) -> Result<EntryId> {
            self.work.next_id += 1;
            let id = self.work.next_id;
            let minutes = self.minutes();
            self.work.entries.push(entry.clone().into_entry(id, minutes));
            Ok(id)
        }

        async fn head_of_line(&mut self, queue_id: &str) -> Result<Option<Entry>> {
            Ok(self
                .waiting(queue_id)
                .min_by_key(|e| (e.position, e.id))
                .cloned())
        }

        async fn save_status(&mut self, entry: &Entry) -> Result<()> {
            if let Some(slot) = self.work.entries.iter_mut().find(|e| e.id == entry.id) {
                *slot = entry.clone();
            }
            Ok(())
        }

        async fn close_gap(&mut self, queue_id: &str, vacated: i64) -> Result<u64> {
            let mut shifted = 0;
            for entry in self.work.entries.iter_mut() {
                if entry.queue_id == queue_id && entry.is_waiting() && entry.position > vacated {
                    entry.position -= 1;
                    shifted += 1;
                }
            }
            Ok(shifted)
        }

        async fn waiting_line(&mut self, queue_id: &str) -> Result<Vec<(EntryId, i64)>> {
            let mut line: Vec<_> = self.waiting(queue_id).map(|e| (e.id, e.position)).collect();
            line.sort_by_key(|&(id, position)| (position, id));
            Ok(line)
        }

        async fn set_position(&mut self, entry_id: EntryId, position: i64) -> Result<()> {
            if let Some(slot) = self.work.entries.iter_mut().find(|e| e.id == entry_id) {
                slot.position = position;
            }
            Ok(())
        }
    }

    fn open_line(status: QueueStatus) -> Shared {
        let mut queue = Queue::new(
            "q-1",
            "staff-1",
            QueueDraft::new("Counter", "Bakery").with_wait_minutes(5),
            0,
        );
        queue.status = status;
        Arc::new(Mutex::new(Line {
            queue: Some(queue),
            ..Line::default()
        }))
    }

    /// Committed-read mock answering from the shared line
    fn entry_reads(shared: &Shared) -> MockEntryRepository {
        let shared = Arc::clone(shared);
        let mut repo = MockEntryRepository::new();
        repo.expect_find_by_id().returning(move |id| {
            Ok(snapshot(&shared).entries.into_iter().find(|e| e.id == id))
        });
        repo
    }

    fn ledger(
        shared: &Shared,
        entry_repo: MockEntryRepository,
        queue_repo: MockQueueRepository,
        notifier: MockNotifier,
    ) -> EntryLedger {
        EntryLedger::new(
            Arc::new(MemoryLedger(Arc::clone(shared))),
            Arc::new(entry_repo),
            Arc::new(queue_repo),
            Arc::new(QueueLocks::from_config(&LedgerConfig::default())),
            Arc::new(notifier),
            Arc::new(FixedTimeProvider::new(10_000)),
        )
    }

    fn join(name: &str) -> JoinRequest {
        JoinRequest::new("q-1", name, "+15551234567")
    }

    fn waiting_positions(shared: &Shared) -> Vec<(String, i64)> {
        let mut line: Vec<_> = snapshot(shared)
            .entries
            .into_iter()
            .filter(|e| e.is_waiting())
            .map(|e| (e.customer_name, e.position))
            .collect();
        line.sort_by_key(|(_, position)| *position);
        line
    }

    #[tokio::test]
    async fn test_join_notifies_once_per_entry_with_position() {
        let shared = open_line(QueueStatus::Active);
        let mut notifier = MockNotifier::new();
        notifier
            .expect_entry_joined()
            .withf(|queue: &Queue, entry: &Entry| {
                queue.id == "q-1" && entry.status == EntryStatus::Waiting
            })
            .times(2)
            .returning(|_, _| Ok(()));
        notifier.expect_entry_called().never();

        let ledger = ledger(
            &shared,
            MockEntryRepository::new(),
            MockQueueRepository::new(),
            notifier,
        );
        let first = ledger.join_queue(join("Ada")).await.unwrap();
        let second = ledger.join_queue(join("Bo")).await.unwrap();

        assert_eq!((first.position, first.estimated_wait_minutes), (1, 0));
        assert_eq!((second.position, second.estimated_wait_minutes), (2, 5));
        assert_eq!(second.joined_at, 10_000);
    }

    #[tokio::test]
    async fn test_failed_notification_keeps_the_join() {
        let shared = open_line(QueueStatus::Active);
        let mut notifier = MockNotifier::new();
        notifier
            .expect_entry_joined()
            .times(1)
            .returning(|_, _| Err(NotifyError("sms gateway down".to_string())));

        let ledger = ledger(
            &shared,
            MockEntryRepository::new(),
            MockQueueRepository::new(),
            notifier,
        );
        let entry = ledger.join_queue(join("Ada")).await.unwrap();

        assert_eq!(entry.position, 1);
        assert_eq!(snapshot(&shared).entries.len(), 1);
    }

    #[tokio::test]
    async fn test_join_rejected_when_queue_paused() {
        let shared = open_line(QueueStatus::Paused);
        let mut notifier = MockNotifier::new();
        notifier.expect_entry_joined().never();

        let ledger = ledger(
            &shared,
            MockEntryRepository::new(),
            MockQueueRepository::new(),
            notifier,
        );
        let err = ledger.join_queue(join("Ada")).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(snapshot(&shared).entries.is_empty());
    }

    #[tokio::test]
    async fn test_join_unknown_queue_is_not_found() {
        let shared = open_line(QueueStatus::Active);
        let ledger = ledger(
            &shared,
            MockEntryRepository::new(),
            MockQueueRepository::new(),
            MockNotifier::new(),
        );

        let err = ledger
            .join_queue(JoinRequest::new("q-missing", "Ada", "+15551234567"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_call_next_on_empty_line_sends_nothing() {
        let shared = open_line(QueueStatus::Active);
        let mut notifier = MockNotifier::new();
        notifier.expect_entry_called().never();

        let ledger = ledger(
            &shared,
            MockEntryRepository::new(),
            MockQueueRepository::new(),
            notifier,
        );
        assert!(ledger.call_next("q-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_call_next_takes_head_and_renumbers() {
        let shared = open_line(QueueStatus::Active);
        let mut notifier = MockNotifier::new();
        notifier.expect_entry_joined().returning(|_, _| Ok(()));
        notifier
            .expect_entry_called()
            .withf(|_: &Queue, entry: &Entry| {
                entry.customer_name == "Ada" && entry.called_at == Some(10_000)
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let ledger = ledger(
            &shared,
            MockEntryRepository::new(),
            MockQueueRepository::new(),
            notifier,
        );
        for name in ["Ada", "Bo", "Cy"] {
            ledger.join_queue(join(name)).await.unwrap();
        }

        let called = ledger.call_next("q-1").await.unwrap().unwrap();
        assert_eq!(called.status, EntryStatus::Called);
        assert_eq!(
            waiting_positions(&shared),
            vec![("Bo".to_string(), 1), ("Cy".to_string(), 2)]
        );
    }

    #[tokio::test]
    async fn test_cancel_middle_closes_gap_without_notification() {
        let shared = open_line(QueueStatus::Active);
        let mut notifier = MockNotifier::new();
        notifier.expect_entry_joined().times(3).returning(|_, _| Ok(()));
        notifier.expect_entry_called().never();

        let ledger = ledger(
            &shared,
            entry_reads(&shared),
            MockQueueRepository::new(),
            notifier,
        );
        let mut ids = Vec::new();
        for name in ["Ada", "Bo", "Cy"] {
            ids.push(ledger.join_queue(join(name)).await.unwrap().id);
        }

        let cancelled = ledger.cancel_entry(ids[1]).await.unwrap();
        assert_eq!(cancelled.status, EntryStatus::Cancelled);
        assert_eq!(cancelled.cancelled_at, Some(10_000));
        assert_eq!(
            waiting_positions(&shared),
            vec![("Ada".to_string(), 1), ("Cy".to_string(), 2)]
        );
    }

    #[tokio::test]
    async fn test_serve_requires_called_entry() {
        let shared = open_line(QueueStatus::Active);
        let mut notifier = MockNotifier::new();
        notifier.expect_entry_joined().returning(|_, _| Ok(()));
        notifier.expect_entry_called().times(1).returning(|_, _| Ok(()));

        let ledger = ledger(
            &shared,
            entry_reads(&shared),
            MockQueueRepository::new(),
            notifier,
        );
        let entry = ledger.join_queue(join("Ada")).await.unwrap();

        let err = ledger.mark_served(entry.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        ledger.call_entry(entry.id).await.unwrap();
        let served = ledger.mark_served(entry.id).await.unwrap();
        assert_eq!(served.status, EntryStatus::Served);
        assert_eq!(served.served_at, Some(10_000));
    }

    #[tokio::test]
    async fn test_unknown_entry_is_not_found() {
        let shared = open_line(QueueStatus::Active);
        let ledger = ledger(
            &shared,
            entry_reads(&shared),
            MockQueueRepository::new(),
            MockNotifier::new(),
        );

        let err = ledger.cancel_entry(42).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("entry 42"));
    }

    #[tokio::test]
    async fn test_list_entries_checks_queue_exists() {
        let shared = open_line(QueueStatus::Active);
        let mut queue_repo = MockQueueRepository::new();
        queue_repo.expect_find_by_id().returning(|_| Ok(None));
        let mut entry_repo = MockEntryRepository::new();
        entry_repo.expect_list_for_queue().never();

        let ledger = ledger(&shared, entry_repo, queue_repo, MockNotifier::new());
        let err = ledger
            .list_entries("q-missing", None, Page::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
