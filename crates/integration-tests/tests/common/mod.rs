//! Shared wiring for the integration tests: the real SQLite adapter on an
//! in-memory database, a fixed clock and a recording notifier.

#![allow(dead_code)]

use std::sync::Arc;
use waitline_core::application::{
    EntryLedger, JoinRequest, LedgerConfig, PositionRepair, QueueLocks, QueueRegistry,
};
use waitline_core::domain::{Entry, EntryStatus, Queue, QueueDraft};
use waitline_core::port::id_provider::mocks::SequentialIdProvider;
use waitline_core::port::notifier::mocks::RecordingNotifier;
use waitline_core::port::time_provider::mocks::FixedTimeProvider;
use waitline_core::port::Page;
use waitline_infra_sqlite::{create_pool, run_migrations, SqliteStore};

pub const STAFF: &str = "staff-1";
pub const START_MILLIS: i64 = 1_700_000_000_000;

pub struct Harness {
    pub store: Arc<SqliteStore>,
    pub locks: Arc<QueueLocks>,
    pub clock: Arc<FixedTimeProvider>,
    pub notifier: RecordingNotifier,
    pub registry: Arc<QueueRegistry>,
    pub ledger: Arc<EntryLedger>,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_notifier(RecordingNotifier::new()).await
    }

    pub async fn with_notifier(notifier: RecordingNotifier) -> Self {
        let pool = create_pool(":memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        Self::on_store(SqliteStore::new(pool), notifier)
    }

    pub fn on_store(store: SqliteStore, notifier: RecordingNotifier) -> Self {
        let store = Arc::new(store);
        let locks = Arc::new(QueueLocks::from_config(&LedgerConfig::default()));
        let clock = Arc::new(FixedTimeProvider::new(START_MILLIS));

        let registry = Arc::new(QueueRegistry::new(
            store.clone(),
            locks.clone(),
            Arc::new(SequentialIdProvider::new("q")),
            clock.clone(),
        ));
        let ledger = Arc::new(EntryLedger::new(
            store.clone(),
            store.clone(),
            store.clone(),
            locks.clone(),
            Arc::new(notifier.clone()),
            clock.clone(),
        ));

        Self {
            store,
            locks,
            clock,
            notifier,
            registry,
            ledger,
        }
    }

    pub fn repair(&self) -> PositionRepair {
        PositionRepair::new(self.store.clone(), self.store.clone(), self.locks.clone())
    }

    /// Create an active queue owned by `STAFF`
    pub async fn open_queue(&self, name: &str, minutes: i64) -> Queue {
        self.registry
            .create_queue(STAFF, QueueDraft::new(name, "Corner Bakery").with_wait_minutes(minutes))
            .await
            .unwrap()
    }

    pub async fn join(&self, queue_id: &str, customer_name: &str) -> Entry {
        self.ledger
            .join_queue(JoinRequest::new(queue_id, customer_name, phone_for(customer_name)))
            .await
            .unwrap()
    }

    /// Waiting entries in line order
    pub async fn waiting(&self, queue_id: &str) -> Vec<Entry> {
        self.ledger
            .list_entries(queue_id, Some(EntryStatus::Waiting), Page::default())
            .await
            .unwrap()
    }

    pub async fn entry(&self, entry_id: i64) -> Entry {
        self.ledger.get_entry(entry_id).await.unwrap()
    }
}

/// Deterministic valid phone number per customer name
pub fn phone_for(customer_name: &str) -> String {
    let digits: u64 = customer_name.bytes().map(u64::from).sum();
    format!("+1555{:07}", digits % 10_000_000)
}

pub fn positions(entries: &[Entry]) -> Vec<i64> {
    entries.iter().map(|e| e.position).collect()
}

pub fn names(entries: &[Entry]) -> Vec<String> {
    entries.iter().map(|e| e.customer_name.clone()).collect()
}

/// Waiting positions are exactly 1..=n and estimates follow them
pub fn assert_dense(entries: &[Entry], minutes: i64) {
    let expected: Vec<i64> = (1..=entries.len() as i64).collect();
    assert_eq!(positions(entries), expected, "waiting positions must be contiguous");
    for entry in entries {
        assert_eq!(
            entry.estimated_wait_minutes,
            (entry.position - 1) * minutes,
            "estimate for {} at {}",
            entry.customer_name,
            entry.position
        );
    }
}
