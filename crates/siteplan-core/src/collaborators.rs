//! Contracts for the external collaborators the engine depends on.
//!
//! Fetching, HTML extraction and content generation happen outside this
//! crate. The engine only sees these traits, injected into
//! [`crate::EngineBuilder`] as `Arc<dyn Trait>`. Implementations own their
//! own retries and deadlines; a deadline that expires should surface as
//! [`CollaboratorError::Timeout`] so the engine can report it as
//! [`EngineError::ExternalTimeout`].

use async_trait::async_trait;
use thiserror::Error;

use crate::{
    error::{EngineError, Stage},
    models::{AnalysisReport, GeneratedPlan, Snapshot, Task, Verdict},
};

/// Failure reported by a collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    /// The call could not be completed
    #[error("{0}")]
    Failed(String),
    /// The call completed but returned something unusable
    #[error("malformed response: {0}")]
    Malformed(String),
    /// The caller's deadline expired or the call was cancelled
    #[error("timed out")]
    Timeout,
}

impl CollaboratorError {
    /// Maps a snapshot provider failure for `url`.
    pub(crate) fn into_fetch_error(self, url: &str) -> EngineError {
        match self {
            CollaboratorError::Timeout => EngineError::ExternalTimeout {
                stage: Stage::Snapshot,
            },
            other => EngineError::Fetch {
                url: url.to_string(),
                reason: other.to_string(),
            },
        }
    }

    /// Maps an insight, plan or evaluation failure.
    pub(crate) fn into_generation_error(self, stage: Stage) -> EngineError {
        match self {
            CollaboratorError::Timeout => EngineError::ExternalTimeout { stage },
            other => EngineError::Generation {
                stage,
                reason: other.to_string(),
            },
        }
    }
}

/// Fetches a normalized snapshot of a web page.
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    async fn fetch_snapshot(&self, url: &str) -> Result<Snapshot, CollaboratorError>;
}

/// Produces scores and findings from a snapshot.
#[async_trait]
pub trait InsightGenerator: Send + Sync {
    async fn generate_analysis(&self, snapshot: &Snapshot)
        -> Result<AnalysisReport, CollaboratorError>;
}

/// Produces an action plan from an analysis report and its snapshot.
#[async_trait]
pub trait PlanGenerator: Send + Sync {
    async fn generate_plan(
        &self,
        report: &AnalysisReport,
        snapshot: &Snapshot,
    ) -> Result<GeneratedPlan, CollaboratorError>;
}

/// Judges whether a task's recommendation holds on a fresh snapshot.
#[async_trait]
pub trait TaskEvaluator: Send + Sync {
    async fn evaluate_task(
        &self,
        task: &Task,
        snapshot: &Snapshot,
    ) -> Result<Verdict, CollaboratorError>;
}
