//! Filter types for querying tasks.

use uuid::Uuid;

use super::TaskStatus;

/// Ordering applied to task listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskOrder {
    /// Priority (high first), then newest first
    #[default]
    Priority,

    /// Original plan sequence
    Sequence,
}

/// Filter options for querying tasks.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Restrict to one analysis
    pub analysis_id: Option<Uuid>,

    /// Restrict to one status
    pub status: Option<TaskStatus>,

    pub order: TaskOrder,
}

impl From<&crate::params::ListTasks> for TaskFilter {
    fn from(params: &crate::params::ListTasks) -> Self {
        Self {
            analysis_id: params.analysis_id,
            status: params.status,
            order: if params.sequence_order {
                TaskOrder::Sequence
            } else {
                TaskOrder::Priority
            },
        }
    }
}
