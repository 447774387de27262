//! The analysis and action-plan lifecycle engine.
//!
//! [`LifecycleEngine`] coordinates the external collaborators with the two
//! stores to implement the `analyze`, `plan` and `reanalyze` use cases.
//! Store-only operations (listing, status changes, notes, deletes) live on
//! [`Stores`], which needs no collaborators and is what the engine itself
//! uses for persistence.
//!
//! ```text
//! ┌──────────────────┐    ┌──────────────────┐    ┌──────────────────┐
//! │  Collaborators   │    │ LifecycleEngine  │    │      Stores      │
//! │ (fetch, insight, │───▶│ (analyze, plan,  │───▶│ (analysis_queries│
//! │  plan, evaluate) │    │  reanalyze)      │    │  task_queries)   │
//! └──────────────────┘    └──────────────────┘    └──────────────────┘
//! ```
//!
//! Every store call opens its own SQLite connection on a blocking thread and
//! drops it before the future resolves, so no connection is held across an
//! `.await` on a collaborator.
//!
//! ## Submodules
//!
//! - [`builder`]: [`EngineBuilder`] for configuring paths and collaborators
//! - [`analyze`]: the `analyze` use case
//! - [`plan`]: plan generation with the upsert-by-URL policy
//! - [`reanalyze`]: re-checking a task against a fresh snapshot
//! - [`tasks`]: store-backed operations on [`Stores`]

use std::{path::PathBuf, sync::Arc};

use serde::{Deserialize, Serialize};
use tokio::task;

use crate::{
    collaborators::{InsightGenerator, PlanGenerator, SnapshotProvider, TaskEvaluator},
    db::Database,
    error::{EngineError, Result, Stage},
    models::{AnalysisPayload, GeneratedPlan, StoredPlan, Task, Validate, Verdict},
};

pub mod analyze;
pub mod builder;
pub mod plan;
pub mod reanalyze;
pub mod tasks;

#[cfg(test)]
mod tests;

pub use builder::EngineBuilder;

/// Handle on the Analysis and Task stores.
#[derive(Debug, Clone)]
pub struct Stores {
    pub(crate) db_path: PathBuf,
}

impl Stores {
    pub(crate) fn new(db_path: PathBuf) -> Self {
        Self { db_path }
    }

    /// Runs `op` against a fresh connection on the blocking pool.
    pub(crate) async fn with_database<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Database) -> Result<T> + Send + 'static,
    {
        let db_path = self.db_path.clone();

        task::spawn_blocking(move || {
            let mut db = Database::new(&db_path)?;
            op(&mut db)
        })
        .await
        .map_err(EngineError::join)?
    }
}

/// Coordinates collaborators and stores for the three use cases.
pub struct LifecycleEngine {
    stores: Stores,
    snapshots: Arc<dyn SnapshotProvider>,
    insights: Arc<dyn InsightGenerator>,
    plans: Arc<dyn PlanGenerator>,
    evaluator: Arc<dyn TaskEvaluator>,
}

impl LifecycleEngine {
    /// Store-only operations backed by the same database.
    pub fn stores(&self) -> &Stores {
        &self.stores
    }
}

/// A generated plan together with the analysis it was generated from.
///
/// Holds everything needed to persist the plan later through
/// [`Stores::persist_plan`] without calling the plan generator again.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingPlan {
    pub payload: AnalysisPayload,
    pub plan: GeneratedPlan,
}

/// Whether a generated plan reached the stores.
#[derive(Debug, Clone)]
pub enum PlanPersistence {
    /// Plan and tasks were stored
    Saved(StoredPlan),
    /// Generation succeeded but storing failed; the plan is only in memory
    Unsaved { warning: String },
}

/// Result of plan generation. Generation succeeded whenever this is
/// returned; [`PlanOutcome::persistence`] says whether it was stored.
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub plan: PendingPlan,
    pub persistence: PlanPersistence,
}

impl PlanOutcome {
    /// The analysis the plan was attached to, when it was saved.
    pub fn analysis_id(&self) -> Option<uuid::Uuid> {
        match &self.persistence {
            PlanPersistence::Saved(stored) => Some(stored.analysis.id),
            PlanPersistence::Unsaved { .. } => None,
        }
    }

    pub fn is_saved(&self) -> bool {
        matches!(self.persistence, PlanPersistence::Saved(_))
    }

    pub fn warning(&self) -> Option<&str> {
        match &self.persistence {
            PlanPersistence::Saved(_) => None,
            PlanPersistence::Unsaved { warning } => Some(warning),
        }
    }
}

/// A task after its verdict was attached.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reanalysis {
    pub task: Task,
    pub verdict: Verdict,
}

/// Rejects collaborator output that fails validation as a generation
/// failure of `stage`.
fn checked<T: Validate>(value: T, stage: Stage) -> Result<T> {
    match value.problems() {
        None => Ok(value),
        Some(problem) => Err(EngineError::Generation {
            stage,
            reason: format!("malformed {}: {problem}", T::KIND),
        }),
    }
}
