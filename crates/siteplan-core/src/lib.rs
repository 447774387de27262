//! Core library for the siteplan website improvement tool.
//!
//! A URL is analyzed into a stored [`Analysis`], an action plan of
//! prioritized [`Task`]s is generated from it, and each task is tracked
//! through its status lifecycle and can be re-checked against a fresh fetch
//! of the site.
//!
//! Fetching and content generation are external collaborators (see
//! [`collaborators`]) injected into the [`LifecycleEngine`] through
//! [`EngineBuilder`]. Store-only operations are available on [`Stores`]
//! without any collaborator.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use siteplan_core::{params::ListTasks, EngineBuilder};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let stores = EngineBuilder::new()
//!     .with_database_path("siteplan.db")
//!     .build_stores()
//!     .await?;
//!
//! let tasks = stores.list_tasks(&ListTasks::default(), None).await?;
//! println!("{}", siteplan_core::display::Tasks(tasks));
//! # Ok(())
//! # }
//! ```

pub mod collaborators;
pub mod db;
pub mod display;
pub mod engine;
pub mod error;
pub mod models;
pub mod params;

// Re-export commonly used types
pub use collaborators::{
    CollaboratorError, InsightGenerator, PlanGenerator, SnapshotProvider, TaskEvaluator,
};
pub use db::Database;
pub use display::{
    AnalysisSummaries, CreateResult, DeleteResult, OperationStatus, Tasks, UpdateResult,
};
pub use engine::{
    EngineBuilder, LifecycleEngine, PendingPlan, PlanOutcome, PlanPersistence, Reanalysis, Stores,
};
pub use error::{EngineError, ErrorKind, Result, Stage};
pub use models::{
    Analysis, AnalysisDetail, AnalysisPayload, AnalysisReport, AnalysisSummary, GeneratedPlan,
    Owner, Priority, Snapshot, StatusChange, StatusCounts, StoredPlan, Task, TaskDraft, TaskStatus, Verdict,
    VerdictOutcome,
};
pub use params::{
    Analyze, DeleteAnalysis, GeneratePlan, Id, ListTasks, PlanSource, SetTaskNotes, SetTaskStatus,
};
