//! Result wrapper types for displaying operation outcomes.

use std::fmt;

use super::status::OperationStatus;
use crate::{
    engine::{PlanOutcome, PlanPersistence, Reanalysis},
    models::{Analysis, AnalysisDetail, Task},
};

/// Wrapper type for displaying the result of create operations.
pub struct CreateResult<T> {
    pub resource: T,
}

impl<T> CreateResult<T> {
    pub fn new(resource: T) -> Self {
        Self { resource }
    }
}

impl fmt::Display for CreateResult<Analysis> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Created analysis with ID: {}", self.resource.id)?;
        writeln!(f)?;
        write!(f, "{}", self.resource)
    }
}

/// Wrapper type for displaying the result of update operations.
///
/// Can list the specific changes made so the user sees what was modified.
pub struct UpdateResult<T> {
    pub resource: T,
    pub changes: Vec<String>,
}

impl<T> UpdateResult<T> {
    pub fn new(resource: T) -> Self {
        Self {
            resource,
            changes: Vec::new(),
        }
    }

    pub fn with_changes(resource: T, changes: Vec<String>) -> Self {
        Self { resource, changes }
    }
}

impl fmt::Display for UpdateResult<Task> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Updated task with ID: {}", self.resource.id)?;

        if !self.changes.is_empty() {
            writeln!(f)?;
            writeln!(f, "Changes made:")?;
            for change in &self.changes {
                writeln!(f, "- {change}")?;
            }
        }

        writeln!(f)?;
        write!(f, "{}", self.resource)
    }
}

/// Wrapper type for displaying the result of delete operations.
pub struct DeleteResult<T> {
    pub resource: T,
}

impl<T> DeleteResult<T> {
    pub fn new(resource: T) -> Self {
        Self { resource }
    }
}

impl fmt::Display for DeleteResult<Analysis> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Deleted analysis of {} (ID: {}) and its tasks",
            self.resource.url, self.resource.id
        )
    }
}

impl fmt::Display for DeleteResult<Task> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Deleted task '{}' (ID: {})",
            self.resource.title, self.resource.id
        )
    }
}

impl fmt::Display for AnalysisDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.analysis)?;

        if self.tasks.is_empty() {
            return Ok(());
        }

        writeln!(
            f,
            "\n## Tasks ({}/{} completed, {} in progress, {} skipped)",
            self.counts.completed,
            self.counts.total(),
            self.counts.in_progress,
            self.counts.skipped
        )?;
        writeln!(f)?;
        for task in &self.tasks {
            write!(f, "{task}")?;
        }
        Ok(())
    }
}

impl fmt::Display for PlanOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.persistence {
            PlanPersistence::Saved(stored) => {
                let verb = if stored.created { "new" } else { "existing" };
                write!(
                    f,
                    "{}",
                    OperationStatus::success(format!(
                        "Plan attached to {verb} analysis {}",
                        stored.analysis.id
                    ))
                )?;
                writeln!(f)?;
                write!(f, "{}", stored.analysis)?;
                writeln!(f, "\n## Tasks")?;
                writeln!(f)?;
                for task in &stored.tasks {
                    write!(f, "{task}")?;
                }
                Ok(())
            }
            PlanPersistence::Unsaved { warning } => {
                write!(f, "{}", OperationStatus::failure(warning.clone()))?;
                writeln!(f)?;
                writeln!(f, "# {}", self.plan.payload.url)?;
                writeln!(f)?;
                writeln!(f, "{}", self.plan.plan.summary)?;
                if let Some(timeline) = &self.plan.plan.timeline {
                    writeln!(f)?;
                    writeln!(f, "- Timeline: {timeline}")?;
                }
                writeln!(f, "\n## Tasks")?;
                writeln!(f)?;
                for (position, draft) in self.plan.plan.tasks.iter().enumerate() {
                    writeln!(
                        f,
                        "{}. **{}** ({}): {}",
                        position + 1,
                        draft.title,
                        draft.priority,
                        draft.description
                    )?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Reanalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Reanalyzed task '{}' (ID: {})", self.task.title, self.task.id)?;
        writeln!(f)?;
        write!(f, "{}", self.verdict)?;
        writeln!(f)?;
        writeln!(
            f,
            "Status is still {}. Change it with `task status` if the verdict is right.",
            self.task.status.with_icon()
        )
    }
}
