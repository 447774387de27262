//! Analysis model definition and related functionality.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AnalysisPayload, AnalysisReport, GeneratedPlan, Owner, Snapshot, StatusCounts, Task};

/// The authoritative plan attached to an analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionPlan {
    pub summary: String,
    pub timeline: Option<String>,
    #[serde(default)]
    pub quick_wins: Vec<String>,
    /// When the plan fields were last written
    pub generated_at: Timestamp,
}

impl ActionPlan {
    /// Extracts the plan fields of a generator result.
    pub fn from_generated(plan: &GeneratedPlan, generated_at: Timestamp) -> Self {
        Self {
            summary: plan.summary.clone(),
            timeline: plan.timeline.clone(),
            quick_wins: plan.quick_wins.clone(),
            generated_at,
        }
    }
}

/// One completed run of the pipeline for a URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Analysis {
    /// Unique identifier, never reused
    pub id: Uuid,

    /// Owner of the record; `None` for anonymous runs
    pub owner: Option<Owner>,

    /// The analyzed URL
    pub url: String,

    pub snapshot: Snapshot,

    pub report: AnalysisReport,

    /// Present once a plan has been generated for this record
    pub plan: Option<ActionPlan>,

    /// When the snapshot and report were produced. Attaching a plan does not
    /// change it.
    pub analyzed_at: Timestamp,

    /// When the record was first persisted
    pub created_at: Timestamp,

    /// When the record was last modified
    pub updated_at: Timestamp,
}

impl Analysis {
    /// The inputs this analysis was built from, suitable for plan generation.
    pub fn payload(&self) -> AnalysisPayload {
        AnalysisPayload {
            url: self.url.clone(),
            snapshot: self.snapshot.clone(),
            report: self.report.clone(),
            analyzed_at: self.analyzed_at,
        }
    }
}

/// Listing row for an analysis with task progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub id: Uuid,
    pub url: String,
    pub overall_score: u8,
    pub plan_summary: Option<String>,
    pub analyzed_at: Timestamp,
    pub total_tasks: u32,
    pub completed_tasks: u32,
}

/// A plan as persisted by the upsert-by-URL path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredPlan {
    /// The record the plan was attached to
    pub analysis: Analysis,
    /// Whether the record was created by this call rather than resolved
    pub created: bool,
    /// The task set that replaced any previous one, in sequence order
    pub tasks: Vec<Task>,
}

/// An analysis together with its current task set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisDetail {
    pub analysis: Analysis,
    /// Tasks in plan sequence order
    pub tasks: Vec<Task>,
    pub counts: StatusCounts,
}
