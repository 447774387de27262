//! Data models for analyses, tasks and collaborator payloads.
//!
//! Display implementations for these models live in
//! [`crate::display::models`] so presentation stays separate from the data
//! structures.
//!
//! - [`Analysis`] is one run of the pipeline for a URL, optionally carrying
//!   the authoritative [`ActionPlan`].
//! - [`Task`] is one tracked recommendation with a [`TaskStatus`] lifecycle.
//! - [`payload`] holds the versioned records exchanged with the external
//!   collaborators, checked through [`Validate`] at the engine boundary.

pub mod analysis;
pub mod filters;
pub mod owner;
pub mod payload;
pub mod status;
pub mod task;


pub use analysis::{ActionPlan, Analysis, AnalysisDetail, AnalysisSummary, StoredPlan};
pub use filters::{TaskFilter, TaskOrder};
pub use owner::Owner;
pub(crate) use owner::owner_matches;
pub use payload::{
    AnalysisPayload, AnalysisReport, Finding, GeneratedPlan, Heading, ImageStats, LinkStats,
    Severity, Snapshot, TaskDraft, Validate, Verdict, VerdictOutcome, PAYLOAD_VERSION,
};
pub use status::{Priority, TaskStatus};
pub use task::{StatusChange, StatusCounts, Task};
