//! Task model definition and related functionality.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Owner, Priority, TaskStatus, Verdict};

/// One actionable recommendation belonging to an analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    /// Unique identifier, stable across status changes
    pub id: Uuid,

    /// Analysis this task was generated for
    pub analysis_id: Uuid,

    /// Inherited from the analysis
    pub owner: Option<Owner>,

    pub category: String,
    pub priority: Priority,
    pub effort: String,
    pub impact: String,

    pub title: String,
    pub description: String,
    pub estimated_time: Option<String>,

    pub status: TaskStatus,

    /// Free-text notes from the person working the task
    pub notes: Option<String>,

    /// Position in the generated plan (0-indexed)
    pub sequence: u32,

    /// Most recent evaluation against a fresh snapshot
    pub last_reanalysis: Option<Verdict>,
    pub last_reanalyzed_at: Option<Timestamp>,

    /// First time the task entered `in_progress`
    pub started_at: Option<Timestamp>,

    /// Latest entry into `completed`
    pub completed_at: Option<Timestamp>,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A task after a status update, with the status it moved from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusChange {
    pub previous: TaskStatus,
    pub task: Task,
}

/// Number of tasks of an analysis in each status.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: u32,
    pub in_progress: u32,
    pub completed: u32,
    pub skipped: u32,
}

impl StatusCounts {
    pub fn total(&self) -> u32 {
        self.pending + self.in_progress + self.completed + self.skipped
    }

    pub(crate) fn add(&mut self, status: TaskStatus, count: u32) {
        match status {
            TaskStatus::Pending => self.pending += count,
            TaskStatus::InProgress => self.in_progress += count,
            TaskStatus::Completed => self.completed += count,
            TaskStatus::Skipped => self.skipped += count,
        }
    }
}
