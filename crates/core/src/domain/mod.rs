// Domain Layer - Pure business logic and entities

pub mod entry;
pub mod error;
pub mod ordering;
pub mod queue;

// Re-exports
pub use entry::{Entry, EntryId, EntryStatus, NewEntry};
pub use error::DomainError;
pub use queue::{Queue, QueueDraft, QueueId, QueuePatch, QueueStatus, StaffId};
