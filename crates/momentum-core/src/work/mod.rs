//! Work items as seen by the momentum engine.
//!
//! Work items are owned elsewhere; this crate only reads them through
//! [`WorkItemSource`] to recommend what to do next.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkItemStatus {
    Pending,
    Done,
    Blocked,
}

impl WorkItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkItemStatus::Pending => "pending",
            WorkItemStatus::Done => "done",
            WorkItemStatus::Blocked => "blocked",
        }
    }
}

impl fmt::Display for WorkItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(WorkItemStatus::Pending),
            "done" => Ok(WorkItemStatus::Done),
            "blocked" => Ok(WorkItemStatus::Blocked),
            other => Err(format!("unknown work item status: {other}")),
        }
    }
}

/// A unit of work that awards momentum when completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub status: WorkItemStatus,
    /// Momentum awarded on completion
    pub momentum_weight: u32,
    /// Ids of items that must be done first
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Position in an ordered chain, if the item belongs to one
    #[serde(default)]
    pub sequence_order: Option<i64>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl WorkItem {
    /// New pending item with a random id.
    pub fn new(user_id: impl Into<String>, title: impl Into<String>, momentum_weight: u32) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            title: title.into(),
            status: WorkItemStatus::Pending,
            momentum_weight,
            depends_on: Vec::new(),
            sequence_order: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == WorkItemStatus::Pending
    }
}

/// Selection criteria for [`WorkItemSource::list`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkItemFilter {
    pub user_id: Option<String>,
    pub status: Option<WorkItemStatus>,
}

impl WorkItemFilter {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            status: None,
        }
    }

    pub fn with_status(mut self, status: WorkItemStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, item: &WorkItem) -> bool {
        self.user_id.as_deref().map_or(true, |u| item.user_id == u)
            && self.status.map_or(true, |s| item.status == s)
    }
}

/// Read-only access to work items.
pub trait WorkItemSource {
    /// List items matching `filter`, in the source's natural order.
    fn list(&self, filter: &WorkItemFilter) -> Result<Vec<WorkItem>, StoreError>;
}

impl WorkItemSource for [WorkItem] {
    fn list(&self, filter: &WorkItemFilter) -> Result<Vec<WorkItem>, StoreError> {
        Ok(self.iter().filter(|i| filter.matches(i)).cloned().collect())
    }
}

impl WorkItemSource for Vec<WorkItem> {
    fn list(&self, filter: &WorkItemFilter) -> Result<Vec<WorkItem>, StoreError> {
        self.as_slice().list(filter)
    }
}
