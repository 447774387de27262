//! Versioned payloads exchanged with the external collaborators.
//!
//! The internal shape of snapshots, analysis reports, plans and verdicts is
//! owned by the fetcher and the AI collaborators. The engine still treats
//! them as typed records and checks them with [`Validate`] before using or
//! persisting anything.

use std::collections::BTreeMap;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::Priority;
use crate::error::{EngineError, Result};

/// Payload schema version produced and accepted by this crate.
pub const PAYLOAD_VERSION: u32 = 1;

fn current_version() -> u32 {
    PAYLOAD_VERSION
}

/// Boundary validation for collaborator payloads.
pub trait Validate {
    /// Human-readable payload name used in error messages.
    const KIND: &'static str;

    /// Returns a description of the first problem found, if any.
    fn problems(&self) -> Option<String>;

    /// Checks the payload, returning [`EngineError::InvalidPayload`] on failure.
    fn validate(&self) -> Result<()> {
        match self.problems() {
            Some(reason) => Err(EngineError::InvalidPayload {
                kind: Self::KIND,
                reason,
            }),
            None => Ok(()),
        }
    }
}

fn check_version(version: u32) -> Option<String> {
    (version != PAYLOAD_VERSION)
        .then(|| format!("unsupported version {version}, expected {PAYLOAD_VERSION}"))
}

/// A heading found on the page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Heading {
    pub level: u8,
    pub text: String,
}

/// Link counts for a page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LinkStats {
    pub internal: u32,
    pub external: u32,
}

/// Image counts for a page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ImageStats {
    pub total: u32,
    pub missing_alt: u32,
}

/// Normalized signals extracted from one fetch of a web page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    #[serde(default = "current_version")]
    pub version: u32,
    /// URL that was requested
    pub url: String,
    /// URL after redirects, when it differs from `url`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_url: Option<String>,
    pub fetched_at: Timestamp,
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default)]
    pub canonical_url: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub meta_tags: BTreeMap<String, String>,
    #[serde(default)]
    pub headings: Vec<Heading>,
    #[serde(default)]
    pub word_count: u64,
    #[serde(default)]
    pub links: LinkStats,
    #[serde(default)]
    pub images: ImageStats,
    #[serde(default)]
    pub load_time_ms: Option<u64>,
    /// Leading visible text, truncated by the provider
    #[serde(default)]
    pub content_excerpt: Option<String>,
}

impl Validate for Snapshot {
    const KIND: &'static str = "snapshot";

    fn problems(&self) -> Option<String> {
        if let Some(problem) = check_version(self.version) {
            return Some(problem);
        }
        if self.url.trim().is_empty() {
            return Some("url is empty".into());
        }
        if let Some(heading) = self.headings.iter().find(|h| !(1..=6).contains(&h.level)) {
            return Some(format!("heading level {} out of range", heading.level));
        }
        if self.images.missing_alt > self.images.total {
            return Some("more images missing alt text than images".into());
        }
        None
    }
}

/// Severity of an analysis finding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// One observation produced by the insight generator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Finding {
    pub category: String,
    pub severity: Severity,
    pub title: String,
    #[serde(default)]
    pub detail: String,
}

/// Scores and findings generated from a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisReport {
    #[serde(default = "current_version")]
    pub version: u32,
    pub overall_score: u8,
    #[serde(default)]
    pub category_scores: BTreeMap<String, u8>,
    #[serde(default)]
    pub findings: Vec<Finding>,
    #[serde(default)]
    pub summary: Option<String>,
}

impl Validate for AnalysisReport {
    const KIND: &'static str = "analysis";

    fn problems(&self) -> Option<String> {
        if let Some(problem) = check_version(self.version) {
            return Some(problem);
        }
        if self.overall_score > 100 {
            return Some(format!("overall score {} exceeds 100", self.overall_score));
        }
        if let Some((name, score)) = self.category_scores.iter().find(|(_, s)| **s > 100) {
            return Some(format!("score {score} for '{name}' exceeds 100"));
        }
        if self.findings.iter().any(|f| f.title.trim().is_empty()) {
            return Some("finding without a title".into());
        }
        None
    }
}

/// One task as proposed by the plan generator, before it is persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskDraft {
    pub category: String,
    pub priority: Priority,
    pub effort: String,
    pub impact: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub estimated_time: Option<String>,
}

/// Plan generator output: plan fields plus the ordered task list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneratedPlan {
    #[serde(default = "current_version")]
    pub version: u32,
    pub summary: String,
    #[serde(default)]
    pub timeline: Option<String>,
    #[serde(default)]
    pub quick_wins: Vec<String>,
    #[serde(default)]
    pub tasks: Vec<TaskDraft>,
}

impl Validate for GeneratedPlan {
    const KIND: &'static str = "plan";

    fn problems(&self) -> Option<String> {
        if let Some(problem) = check_version(self.version) {
            return Some(problem);
        }
        if self.summary.trim().is_empty() {
            return Some("summary is empty".into());
        }
        if let Some(position) = self.tasks.iter().position(|t| t.title.trim().is_empty()) {
            return Some(format!("task {position} has no title"));
        }
        None
    }
}

/// Outcome reported by the task evaluator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VerdictOutcome {
    Resolved,
    StillOpen,
    Inconclusive,
}

impl VerdictOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictOutcome::Resolved => "resolved",
            VerdictOutcome::StillOpen => "still_open",
            VerdictOutcome::Inconclusive => "inconclusive",
        }
    }
}

/// Result of re-checking a task against a fresh snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Verdict {
    #[serde(default = "current_version")]
    pub version: u32,
    pub outcome: VerdictOutcome,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub evidence: Vec<String>,
}

impl Validate for Verdict {
    const KIND: &'static str = "verdict";

    fn problems(&self) -> Option<String> {
        check_version(self.version)
    }
}

/// Everything a plan can be generated from: a snapshot, its report, and the
/// URL they describe. Callers may submit this inline instead of referencing a
/// stored analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisPayload {
    pub url: String,
    pub snapshot: Snapshot,
    pub report: AnalysisReport,
    pub analyzed_at: Timestamp,
}

impl Validate for AnalysisPayload {
    const KIND: &'static str = "analysis payload";

    fn problems(&self) -> Option<String> {
        if self.url.trim().is_empty() {
            return Some("url is empty".into());
        }
        self.snapshot
            .problems()
            .map(|p| format!("snapshot: {p}"))
            .or_else(|| self.report.problems().map(|p| format!("report: {p}")))
    }
}
