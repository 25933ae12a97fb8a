// Entry Domain Model

use crate::domain::error::{DomainError, Result};
use crate::domain::ordering::estimate_wait;
use crate::domain::queue::{validate_required, QueueId};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::LazyLock;

/// Entry ID (assigned by storage, monotonically increasing)
pub type EntryId = i64;

pub const MIN_PARTY_SIZE: i32 = 1;
pub const MAX_PARTY_SIZE: i32 = 20;
pub const MAX_CUSTOMER_NAME_LEN: usize = 100;

// Optional '+', leading non-zero digit, 10-15 ASCII digits in total
static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[1-9][0-9]{9,14}$").expect("Invalid phone regex"));

/// Entry State
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Waiting,
    Called,
    Served,
    Cancelled,
}

impl EntryStatus {
    /// Served and cancelled never change again
    pub fn is_terminal(&self) -> bool {
        matches!(self, EntryStatus::Served | EntryStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Waiting => "waiting",
            EntryStatus::Called => "called",
            EntryStatus::Served => "served",
            EntryStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "waiting" => Ok(EntryStatus::Waiting),
            "called" => Ok(EntryStatus::Called),
            "served" => Ok(EntryStatus::Served),
            "cancelled" => Ok(EntryStatus::Cancelled),
            other => Err(DomainError::validation(format!(
                "unknown entry status '{}'",
                other
            ))),
        }
    }
}

/// Entry Entity
///
/// `position` is only meaningful while `status == Waiting`; afterwards it is
/// frozen at the value it had when the entry left the line.
/// `estimated_wait_minutes` is computed from the current position at read
/// time and is never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub queue_id: QueueId,
    pub customer_name: String,
    pub phone_number: String,
    pub party_size: i32,
    pub position: i64,
    pub status: EntryStatus,
    pub joined_at: i64, // epoch ms
    pub called_at: Option<i64>,
    pub served_at: Option<i64>,
    pub cancelled_at: Option<i64>,
    pub estimated_wait_minutes: i64,
}

/// A validated ticket that has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub queue_id: QueueId,
    pub customer_name: String,
    pub phone_number: String,
    pub party_size: i32,
    pub position: i64,
    pub joined_at: i64,
}

impl NewEntry {
    /// Materialize the stored entry once the repository has assigned its id
    pub fn into_entry(self, id: EntryId, service_minutes: i64) -> Entry {
        let mut entry = Entry {
            id,
            queue_id: self.queue_id,
            customer_name: self.customer_name,
            phone_number: self.phone_number,
            party_size: self.party_size,
            position: self.position,
            status: EntryStatus::Waiting,
            joined_at: self.joined_at,
            called_at: None,
            served_at: None,
            cancelled_at: None,
            estimated_wait_minutes: 0,
        };
        entry.refresh_estimate(service_minutes);
        entry
    }
}

impl Entry {
    pub fn is_waiting(&self) -> bool {
        self.status == EntryStatus::Waiting
    }

    /// Recompute the wait estimate from the current position
    pub fn refresh_estimate(&mut self, service_minutes: i64) {
        self.estimated_wait_minutes = if self.is_waiting() {
            estimate_wait(self.position, service_minutes)
        } else {
            0
        };
    }

    /// Transition Waiting -> Called with explicit timestamp
    ///
    /// Returns the position the entry vacated in the waiting line.
    pub fn call(&mut self, now_millis: i64) -> Result<i64> {
        self.ensure_status(&[EntryStatus::Waiting], EntryStatus::Called)?;
        self.status = EntryStatus::Called;
        self.called_at = Some(now_millis);
        self.estimated_wait_minutes = 0;
        Ok(self.position)
    }

    /// Transition Called -> Served with explicit timestamp
    pub fn serve(&mut self, now_millis: i64) -> Result<()> {
        self.ensure_status(&[EntryStatus::Called], EntryStatus::Served)?;
        self.status = EntryStatus::Served;
        self.served_at = Some(now_millis);
        Ok(())
    }

    /// Transition Waiting|Called -> Cancelled with explicit timestamp
    ///
    /// Returns the vacated position when the entry was still waiting.
    pub fn cancel(&mut self, now_millis: i64) -> Result<Option<i64>> {
        self.ensure_status(
            &[EntryStatus::Waiting, EntryStatus::Called],
            EntryStatus::Cancelled,
        )?;
        let vacated = self.is_waiting().then_some(self.position);
        self.status = EntryStatus::Cancelled;
        self.cancelled_at = Some(now_millis);
        self.estimated_wait_minutes = 0;
        Ok(vacated)
    }

    fn ensure_status(&self, allowed: &[EntryStatus], to: EntryStatus) -> Result<()> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            })
        }
    }
}

/// Validate a customer phone number against `^\+?[1-9]\d{9,14}$`
pub fn validate_phone_number(phone_number: &str) -> Result<()> {
    if PHONE_PATTERN.is_match(phone_number) {
        Ok(())
    } else {
        Err(DomainError::validation(format!(
            "invalid phone number '{}': expected 10-15 digits, optional leading '+', no leading zero",
            phone_number
        )))
    }
}

pub fn validate_party_size(party_size: i32) -> Result<()> {
    if !(MIN_PARTY_SIZE..=MAX_PARTY_SIZE).contains(&party_size) {
        return Err(DomainError::validation(format!(
            "party_size out of range [{}, {}]: {}",
            MIN_PARTY_SIZE, MAX_PARTY_SIZE, party_size
        )));
    }
    Ok(())
}

pub fn validate_customer_name(customer_name: &str) -> Result<()> {
    validate_required("customer_name", customer_name, MAX_CUSTOMER_NAME_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn waiting_entry(position: i64) -> Entry {
        NewEntry {
            queue_id: "q-1".to_string(),
            customer_name: "Ada".to_string(),
            phone_number: "+15551234567".to_string(),
            party_size: 2,
            position,
            joined_at: 1_000,
        }
        .into_entry(position, 10)
    }

    #[test]
    fn test_new_entry_gets_estimate_from_position() {
        assert_eq!(waiting_entry(1).estimated_wait_minutes, 0);
        assert_eq!(waiting_entry(3).estimated_wait_minutes, 20);
    }

    #[test]
    fn test_call_then_serve() {
        let mut entry = waiting_entry(1);

        assert_eq!(entry.call(2_000).unwrap(), 1);
        assert_eq!(entry.status, EntryStatus::Called);
        assert_eq!(entry.called_at, Some(2_000));
        assert_eq!(entry.estimated_wait_minutes, 0);

        entry.serve(3_000).unwrap();
        assert_eq!(entry.status, EntryStatus::Served);
        assert_eq!(entry.served_at, Some(3_000));
    }

    #[test]
    fn test_serve_requires_called() {
        let mut entry = waiting_entry(1);
        let err = entry.serve(2_000).unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidStateTransition {
                from: "waiting".to_string(),
                to: "served".to_string(),
            }
        );
        assert_eq!(entry.status, EntryStatus::Waiting);
    }

    #[test]
    fn test_cancel_waiting_vacates_position() {
        let mut entry = waiting_entry(4);
        assert_eq!(entry.cancel(2_000).unwrap(), Some(4));
        assert_eq!(entry.status, EntryStatus::Cancelled);
        assert_eq!(entry.position, 4, "position is frozen, not cleared");
    }

    #[test]
    fn test_cancel_called_does_not_vacate() {
        let mut entry = waiting_entry(1);
        entry.call(2_000).unwrap();
        assert_eq!(entry.cancel(3_000).unwrap(), None);
        assert_eq!(entry.cancelled_at, Some(3_000));
    }

    #[test]
    fn test_terminal_states_never_revert() {
        let mut served = waiting_entry(1);
        served.call(2_000).unwrap();
        served.serve(3_000).unwrap();
        assert!(served.cancel(4_000).is_err());
        assert!(served.call(4_000).is_err());

        let mut cancelled = waiting_entry(1);
        cancelled.cancel(2_000).unwrap();
        assert!(cancelled.cancel(3_000).is_err());
        assert!(cancelled.serve(3_000).is_err());
        assert!(cancelled.call(3_000).is_err());
    }

    #[test]
    fn test_phone_number_pattern() {
        for ok in ["+1234567890", "1234567890", "+123456789012345", "4915112345678"] {
            assert!(validate_phone_number(ok).is_ok(), "{} should be valid", ok);
        }
        for bad in [
            "+0234567890",
            "123456789",
            "+1234567890123456",
            "+1 234 567 890",
            "phone",
            "",
            "++1234567890",
        ] {
            assert!(validate_phone_number(bad).is_err(), "{} should be invalid", bad);
        }
    }

    #[test]
    fn test_party_size_bounds() {
        assert!(validate_party_size(1).is_ok());
        assert!(validate_party_size(20).is_ok());
        assert!(validate_party_size(0).is_err());
        assert!(validate_party_size(21).is_err());
    }

    #[test]
    fn test_status_terminality() {
        assert!(!EntryStatus::Waiting.is_terminal());
        assert!(!EntryStatus::Called.is_terminal());
        assert!(EntryStatus::Served.is_terminal());
        assert!(EntryStatus::Cancelled.is_terminal());
    }
}
