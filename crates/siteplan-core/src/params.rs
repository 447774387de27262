//! Parameter structures for engine operations.
//!
//! These structures are shared by every interface layer (the CLI today)
//! without framework-specific derives. Interface crates wrap them with their
//! own argument types and convert via `From`.
//!
//! The caller identity is not part of these structures: it comes from the
//! authentication layer and is passed to each operation separately as an
//! `Option<&Owner>`.

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::{
    error::{EngineError, Result},
    models::{AnalysisPayload, TaskStatus},
};

/// Generic parameters for operations requiring just an ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Id {
    /// The ID of the resource to operate on
    pub id: Uuid,
}

/// Parameters for analyzing a website.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analyze {
    /// Absolute http(s) URL of the site to analyze
    pub url: String,
}

impl Analyze {
    /// Accepts the URL once, at the entry of the pipeline. Stored URLs are
    /// not re-validated afterwards.
    pub fn validated_url(&self) -> Result<String> {
        normalize_url(&self.url)
    }
}

/// Trims `raw` and accepts it only as an absolute http(s) URL with a host.
///
/// Every URL that can reach the store goes through here, so equal sites
/// compare equal in the upsert-by-URL lookup.
pub(crate) fn normalize_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let parsed = Url::parse(trimmed).map_err(|e| {
        EngineError::invalid_input("url").with_reason(format!("Not a valid URL: {e}"))
    })?;
    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(trimmed.to_string()),
        _ => Err(EngineError::invalid_input("url")
            .with_reason("Only http and https URLs with a host can be analyzed")),
    }
}

/// Where the analysis for plan generation comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "source")]
pub enum PlanSource {
    /// A persisted analysis record
    Stored { analysis_id: Uuid },
    /// Analysis data held by the caller, possibly never persisted
    Inline { payload: Box<AnalysisPayload> },
}

/// Parameters for generating an action plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratePlan {
    #[serde(flatten)]
    pub source: PlanSource,
}

impl GeneratePlan {
    pub fn stored(analysis_id: Uuid) -> Self {
        Self {
            source: PlanSource::Stored { analysis_id },
        }
    }

    pub fn inline(payload: AnalysisPayload) -> Self {
        Self {
            source: PlanSource::Inline {
                payload: Box::new(payload),
            },
        }
    }
}

/// Parameters for listing tasks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListTasks {
    /// Only tasks of this analysis
    pub analysis_id: Option<Uuid>,
    /// Only tasks with this status
    pub status: Option<TaskStatus>,
    /// List in original plan order instead of priority order
    #[serde(default)]
    pub sequence_order: bool,
}

/// Parameters for moving a task to a new status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetTaskStatus {
    pub id: Uuid,
    pub status: TaskStatus,
}

/// Parameters for replacing a task's notes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetTaskNotes {
    pub id: Uuid,
    /// New notes; `None` clears them
    pub notes: Option<String>,
}

/// Parameters for deleting an analysis together with its tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteAnalysis {
    pub id: Uuid,
    /// Whether the deletion was confirmed by the caller
    #[serde(default)]
    pub confirmed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_accepts_http_urls() {
        let params = Analyze {
            url: " https://example.com/pricing ".to_string(),
        };
        assert_eq!(
            params.validated_url().unwrap(),
            "https://example.com/pricing"
        );
    }

    #[test]
    fn analyze_rejects_other_schemes() {
        for url in ["ftp://example.com", "mailto:me@example.com", "example.com"] {
            let params = Analyze {
                url: url.to_string(),
            };
            assert!(
                matches!(params.validated_url(), Err(EngineError::InvalidInput { .. })),
                "{url} should be rejected"
            );
        }
    }

    #[test]
    fn plan_source_is_tagged() {
        let id = Uuid::new_v4();
        let json = serde_json::to_value(GeneratePlan::stored(id)).unwrap();
        assert_eq!(json["source"], "stored");
        assert_eq!(json["analysis_id"], id.to_string());
    }
}
