// Queue Domain Model

use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Queue identifier (UUID v4, issued by an IdProvider)
pub type QueueId = String;

/// Staff principal identifier (issued by the external identity provider)
pub type StaffId = String;

/// Per-customer service time used when a create request omits it
pub const DEFAULT_SERVICE_MINUTES: i64 = 5;

pub const MAX_QUEUE_NAME_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 500;
pub const MAX_ADDRESS_LEN: usize = 200;
/// One service slot may not exceed a day
pub const MAX_SERVICE_MINUTES: i64 = 1440;

/// Queue lifecycle status (staff controlled, unrestricted transitions)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    Active,
    Paused,
    Closed,
}

impl QueueStatus {
    /// Only active queues admit new entries
    pub fn accepts_entries(&self) -> bool {
        matches!(self, QueueStatus::Active)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueueStatus::Active => "active",
            QueueStatus::Paused => "paused",
            QueueStatus::Closed => "closed",
        }
    }
}

impl std::fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueueStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "active" => Ok(QueueStatus::Active),
            "paused" => Ok(QueueStatus::Paused),
            "closed" => Ok(QueueStatus::Closed),
            other => Err(DomainError::validation(format!(
                "unknown queue status '{}'",
                other
            ))),
        }
    }
}

/// Queue Entity
///
/// `current_size` is derived by the repository on every read (count of
/// waiting entries); it is never written back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Queue {
    pub id: QueueId,
    pub name: String,
    pub business_name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub status: QueueStatus,
    pub estimated_wait_minutes: i64,
    pub current_size: i64,
    pub owner_id: StaffId,
    pub created_at: i64, // epoch ms
    pub updated_at: Option<i64>,
}

/// Create-queue configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueDraft {
    pub name: String,
    pub business_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default = "default_service_minutes")]
    pub estimated_wait_minutes: i64,
}

fn default_service_minutes() -> i64 {
    DEFAULT_SERVICE_MINUTES
}

impl QueueDraft {
    pub fn new(name: impl Into<String>, business_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            business_name: business_name.into(),
            description: None,
            address: None,
            estimated_wait_minutes: DEFAULT_SERVICE_MINUTES,
        }
    }

    pub fn with_wait_minutes(mut self, minutes: i64) -> Self {
        self.estimated_wait_minutes = minutes;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_required("name", &self.name, MAX_QUEUE_NAME_LEN)?;
        validate_required("business_name", &self.business_name, MAX_QUEUE_NAME_LEN)?;
        validate_optional("description", self.description.as_deref(), MAX_DESCRIPTION_LEN)?;
        validate_optional("address", self.address.as_deref(), MAX_ADDRESS_LEN)?;
        validate_service_minutes(self.estimated_wait_minutes)
    }
}

/// Partial queue update; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuePatch {
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

impl QueuePatch {
    pub fn status(status: QueueStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl Queue {
    /// Create a new active queue owned by `owner_id`
    ///
    /// The draft is expected to be validated by the caller.
    pub fn new(
        id: impl Into<String>,
        owner_id: impl Into<String>,
        draft: QueueDraft,
        created_at: i64,
    ) -> Self {
        Self {
            id: id.into(),
            name: draft.name.trim().to_string(),
            business_name: draft.business_name.trim().to_string(),
            description: normalize_optional(draft.description),
            address: normalize_optional(draft.address),
            status: QueueStatus::Active,
            estimated_wait_minutes: draft.estimated_wait_minutes,
            current_size: 0,
            owner_id: owner_id.into(),
            created_at,
            updated_at: None,
        }
    }

    /// Apply a partial update with explicit timestamp
    ///
    /// Validation happens before any field changes, so a rejected patch
    /// leaves the queue untouched.
    pub fn apply(&mut self, patch: QueuePatch, now_millis: i64) -> Result<()> {
        if let Some(name) = &patch.name {
            validate_required("name", name, MAX_QUEUE_NAME_LEN)?;
        }
        if let Some(business_name) = &patch.business_name {
            validate_required("business_name", business_name, MAX_QUEUE_NAME_LEN)?;
        }
        validate_optional("description", patch.description.as_deref(), MAX_DESCRIPTION_LEN)?;
        validate_optional("address", patch.address.as_deref(), MAX_ADDRESS_LEN)?;
        if let Some(minutes) = patch.estimated_wait_minutes {
            validate_service_minutes(minutes)?;
        }

        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(business_name) = patch.business_name {
            self.business_name = business_name.trim().to_string();
        }
        if patch.description.is_some() {
            self.description = normalize_optional(patch.description);
        }
        if patch.address.is_some() {
            self.address = normalize_optional(patch.address);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(minutes) = patch.estimated_wait_minutes {
            self.estimated_wait_minutes = minutes;
        }
        self.updated_at = Some(now_millis);
        Ok(())
    }
}

/// Validate the per-customer service time (1..=1440 minutes)
pub fn validate_service_minutes(minutes: i64) -> Result<()> {
    if minutes < 1 {
        return Err(DomainError::validation(format!(
            "estimated_wait_minutes must be at least 1, got {}",
            minutes
        )));
    }
    if minutes > MAX_SERVICE_MINUTES {
        return Err(DomainError::validation(format!(
            "estimated_wait_minutes must be at most {}, got {}",
            MAX_SERVICE_MINUTES, minutes
        )));
    }
    Ok(())
}

pub(crate) fn validate_required(field: &str, value: &str, max_len: usize) -> Result<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{} cannot be empty", field)));
    }
    if trimmed.chars().count() > max_len {
        return Err(DomainError::validation(format!(
            "{} too long (max {} characters)",
            field, max_len
        )));
    }
    Ok(())
}

fn validate_optional(field: &str, value: Option<&str>, max_len: usize) -> Result<()> {
    match value {
        Some(v) if v.trim().chars().count() > max_len => Err(DomainError::validation(format!(
            "{} too long (max {} characters)",
            field, max_len
        ))),
        _ => Ok(()),
    }
}

// Blank optional text is stored as NULL
fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> QueueDraft {
        QueueDraft::new("Main Counter", "Corner Bakery").with_wait_minutes(10)
    }

    #[test]
    fn test_new_queue_is_active_and_empty() {
        let queue = Queue::new("q-1", "staff-1", draft(), 1_000);
        assert_eq!(queue.status, QueueStatus::Active);
        assert_eq!(queue.current_size, 0);
        assert_eq!(queue.estimated_wait_minutes, 10);
        assert!(queue.updated_at.is_none());
    }

    #[test]
    fn test_draft_rejects_blank_name() {
        let mut d = draft();
        d.name = "   ".to_string();
        let err = d.validate().unwrap_err();
        assert!(err.to_string().contains("name cannot be empty"));
    }

    #[test]
    fn test_draft_rejects_zero_service_minutes() {
        let d = draft().with_wait_minutes(0);
        let err = d.validate().unwrap_err();
        assert!(err.to_string().contains("at least 1"));
    }

    #[test]
    fn test_service_minutes_capped_at_one_day() {
        assert!(draft().with_wait_minutes(MAX_SERVICE_MINUTES).validate().is_ok());

        let err = draft().with_wait_minutes(i64::MAX).validate().unwrap_err();
        assert!(err.to_string().contains("at most 1440"));

        let mut queue = Queue::new("q-1", "staff-1", draft(), 1_000);
        let patch = QueuePatch {
            estimated_wait_minutes: Some(MAX_SERVICE_MINUTES + 1),
            ..QueuePatch::default()
        };
        assert!(queue.apply(patch, 2_000).is_err());
        assert_eq!(queue.estimated_wait_minutes, 10);
    }

    #[test]
    fn test_draft_defaults_service_minutes_when_omitted() {
        let d: QueueDraft =
            serde_json::from_value(serde_json::json!({"name": "A", "business_name": "B"}))
                .unwrap();
        assert_eq!(d.estimated_wait_minutes, DEFAULT_SERVICE_MINUTES);
        assert!(d.validate().is_ok());
    }

    #[test]
    fn test_apply_only_touches_supplied_fields() {
        let mut queue = Queue::new("q-1", "staff-1", draft(), 1_000);
        let patch = QueuePatch {
            status: Some(QueueStatus::Paused),
            description: Some("  fresh bread  ".to_string()),
            ..QueuePatch::default()
        };

        queue.apply(patch, 2_000).unwrap();

        assert_eq!(queue.status, QueueStatus::Paused);
        assert_eq!(queue.description.as_deref(), Some("fresh bread"));
        assert_eq!(queue.name, "Main Counter");
        assert_eq!(queue.updated_at, Some(2_000));
    }

    #[test]
    fn test_rejected_patch_leaves_queue_untouched() {
        let mut queue = Queue::new("q-1", "staff-1", draft(), 1_000);
        let before = queue.clone();
        let patch = QueuePatch {
            status: Some(QueueStatus::Closed),
            estimated_wait_minutes: Some(0),
            ..QueuePatch::default()
        };

        assert!(queue.apply(patch, 2_000).is_err());
        assert_eq!(queue, before);
    }

    #[test]
    fn test_status_round_trips_lowercase() {
        assert_eq!(
            serde_json::to_value(QueueStatus::Paused).unwrap(),
            serde_json::json!("paused")
        );
        assert_eq!("closed".parse::<QueueStatus>().unwrap(), QueueStatus::Closed);
        assert!("open".parse::<QueueStatus>().is_err());
    }
}
