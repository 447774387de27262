//! Store-backed operations that need no collaborators.
//!
//! Every operation takes the caller's identity and checks it against the
//! record before reading details or mutating anything: a missing record is
//! reported as not found, a record owned by someone else as unauthorized.

use log::{debug, info};
use uuid::Uuid;

use super::Stores;
use crate::{
    error::{EngineError, Result},
    models::{
        owner_matches, Analysis, AnalysisDetail, AnalysisSummary, Owner, StatusChange, Task,
        TaskFilter, TaskOrder, Verdict,
    },
    params::{DeleteAnalysis, Id, ListTasks, SetTaskNotes, SetTaskStatus},
};

impl Stores {
    /// Retrieves an analysis owned by the caller.
    pub async fn get_analysis(&self, params: &Id, owner: Option<&Owner>) -> Result<Analysis> {
        let id = params.id;
        let analysis = self
            .with_database(move |db| db.get_analysis(id))
            .await?
            .ok_or_else(|| EngineError::AnalysisNotFound { id: id.to_string() })?;

        if !owner_matches(analysis.owner.as_ref().map(Owner::as_str), owner) {
            return Err(EngineError::Unauthorized {
                resource: "analysis",
            });
        }
        Ok(analysis)
    }

    /// Retrieves an analysis with its tasks in plan order and their status
    /// counts.
    pub async fn show_analysis(&self, params: &Id, owner: Option<&Owner>) -> Result<AnalysisDetail> {
        let analysis = self.get_analysis(params, owner).await?;

        let filter = TaskFilter {
            analysis_id: Some(analysis.id),
            status: None,
            order: TaskOrder::Sequence,
        };
        let lister = owner.cloned();
        let analysis_id = analysis.id;
        let (tasks, counts) = self
            .with_database(move |db| {
                let tasks = db.list_tasks(lister.as_ref(), &filter)?;
                let counts = db.status_counts(analysis_id)?;
                Ok((tasks, counts))
            })
            .await?;

        Ok(AnalysisDetail {
            analysis,
            tasks,
            counts,
        })
    }

    /// Lists the caller's analyses, most recently analyzed first.
    pub async fn list_analyses(&self, owner: Option<&Owner>) -> Result<Vec<AnalysisSummary>> {
        let owner = owner.cloned();
        self.with_database(move |db| db.list_analyses(owner.as_ref()))
            .await
    }

    /// Deletes an analysis and all of its tasks.
    ///
    /// Requires `params.confirmed`; the deletion cannot be undone.
    pub async fn delete_analysis(
        &self,
        params: &DeleteAnalysis,
        owner: Option<&Owner>,
    ) -> Result<Analysis> {
        if !params.confirmed {
            return Err(EngineError::invalid_input("confirmed")
                .with_reason("Deleting an analysis and its tasks must be confirmed"));
        }

        let id = params.id;
        let owner = owner.cloned();
        let analysis = self
            .with_database(move |db| db.delete_analysis(id, owner.as_ref()))
            .await?;

        info!("Deleted analysis {} for {}", analysis.id, analysis.url);
        Ok(analysis)
    }

    /// Lists the caller's tasks.
    pub async fn list_tasks(&self, params: &ListTasks, owner: Option<&Owner>) -> Result<Vec<Task>> {
        let filter = TaskFilter::from(params);
        let owner = owner.cloned();
        self.with_database(move |db| db.list_tasks(owner.as_ref(), &filter))
            .await
    }

    /// Retrieves a task owned by the caller.
    pub async fn get_task(&self, params: &Id, owner: Option<&Owner>) -> Result<Task> {
        let id = params.id;
        let task = self
            .with_database(move |db| db.get_task(id))
            .await?
            .ok_or_else(|| EngineError::TaskNotFound { id: id.to_string() })?;

        if !owner_matches(task.owner.as_ref().map(Owner::as_str), owner) {
            return Err(EngineError::Unauthorized { resource: "task" });
        }
        Ok(task)
    }

    /// Moves a task to a new status, reporting the status it left.
    pub async fn set_task_status(
        &self,
        params: &SetTaskStatus,
        owner: Option<&Owner>,
    ) -> Result<StatusChange> {
        let id = params.id;
        let status = params.status;
        let owner = owner.cloned();

        let change = self
            .with_database(move |db| db.set_task_status(id, owner.as_ref(), status))
            .await?;

        debug!(
            "Task {} moved from {} to {}",
            change.task.id,
            change.previous.as_str(),
            change.task.status.as_str()
        );
        Ok(change)
    }

    /// Replaces the notes of a task.
    pub async fn set_task_notes(
        &self,
        params: &SetTaskNotes,
        owner: Option<&Owner>,
    ) -> Result<Task> {
        let id = params.id;
        let notes = params.notes.clone();
        let owner = owner.cloned();

        self.with_database(move |db| db.set_task_notes(id, owner.as_ref(), notes.as_deref()))
            .await
    }

    /// Records a verdict on a task without touching its status.
    pub async fn attach_reanalysis(
        &self,
        id: Uuid,
        owner: Option<&Owner>,
        verdict: &Verdict,
    ) -> Result<Task> {
        let owner = owner.cloned();
        let verdict = verdict.clone();

        self.with_database(move |db| db.attach_reanalysis(id, owner.as_ref(), &verdict))
            .await
    }

    /// Deletes a single task.
    pub async fn delete_task(&self, params: &Id, owner: Option<&Owner>) -> Result<Task> {
        let id = params.id;
        let owner = owner.cloned();

        let task = self
            .with_database(move |db| db.delete_task(id, owner.as_ref()))
            .await?;

        info!("Deleted task {} ({})", task.id, task.title);
        Ok(task)
    }
}
