#![allow(dead_code)]

use std::{
    collections::BTreeMap,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use jiff::Timestamp;
use siteplan_core::{
    models::{Finding, Heading, ImageStats, LinkStats, Severity},
    AnalysisPayload, AnalysisReport, CollaboratorError, EngineBuilder, GeneratedPlan,
    InsightGenerator, LifecycleEngine, PlanGenerator, Priority, Snapshot, SnapshotProvider, Task,
    TaskDraft, TaskEvaluator, Verdict, VerdictOutcome,
};
use tempfile::TempDir;

pub const SITE: &str = "https://example.com";

pub fn snapshot(url: &str) -> Snapshot {
    Snapshot {
        version: 1,
        url: url.to_string(),
        final_url: None,
        fetched_at: Timestamp::now(),
        status_code: Some(200),
        title: Some("Example Domain".to_string()),
        meta_description: None,
        canonical_url: None,
        language: Some("en".to_string()),
        meta_tags: BTreeMap::new(),
        headings: vec![Heading {
            level: 1,
            text: "Example Domain".to_string(),
        }],
        word_count: 230,
        links: LinkStats {
            internal: 4,
            external: 1,
        },
        images: ImageStats {
            total: 2,
            missing_alt: 1,
        },
        load_time_ms: Some(420),
        content_excerpt: Some("This domain is for use in examples.".to_string()),
    }
}

pub fn report(score: u8) -> AnalysisReport {
    AnalysisReport {
        version: 1,
        overall_score: score,
        category_scores: BTreeMap::from([("seo".to_string(), score), ("performance".to_string(), 80)]),
        findings: vec![Finding {
            category: "seo".to_string(),
            severity: Severity::High,
            title: "Missing meta description".to_string(),
            detail: String::new(),
        }],
        summary: Some("Fast page with thin metadata.".to_string()),
    }
}

pub fn payload(url: &str) -> AnalysisPayload {
    AnalysisPayload {
        url: url.to_string(),
        snapshot: snapshot(url),
        report: report(62),
        analyzed_at: Timestamp::now(),
    }
}

pub fn draft(title: &str, priority: Priority) -> TaskDraft {
    TaskDraft {
        category: "seo".to_string(),
        priority,
        effort: "low".to_string(),
        impact: "high".to_string(),
        title: title.to_string(),
        description: format!("{title} on every page."),
        estimated_time: Some("1 hour".to_string()),
    }
}

pub fn generated_plan(titles: &[&str]) -> GeneratedPlan {
    GeneratedPlan {
        version: 1,
        summary: "Fix metadata, then images.".to_string(),
        timeline: Some("2 weeks".to_string()),
        quick_wins: vec!["Add alt text".to_string()],
        tasks: titles
            .iter()
            .enumerate()
            .map(|(i, title)| {
                let priority = match i % 3 {
                    0 => Priority::Low,
                    1 => Priority::High,
                    _ => Priority::Medium,
                };
                draft(title, priority)
            })
            .collect(),
    }
}

/// Scripted stand-in for every external collaborator.
///
/// Each behavior can be switched at any time, also between calls of one
/// test.
pub struct FakeSite {
    pub fail_fetch: AtomicBool,
    pub timeout_fetch: AtomicBool,
    pub fail_insight: AtomicBool,
    pub fail_plan: AtomicBool,
    pub timeout_plan: AtomicBool,
    pub malformed_plan: AtomicBool,
    pub fail_evaluate: AtomicBool,
    pub plan_titles: Mutex<Vec<String>>,
    pub verdict: Mutex<VerdictOutcome>,
    pub fetches: AtomicUsize,
    pub plan_calls: AtomicUsize,
}

impl Default for FakeSite {
    fn default() -> Self {
        Self {
            fail_fetch: AtomicBool::new(false),
            timeout_fetch: AtomicBool::new(false),
            fail_insight: AtomicBool::new(false),
            fail_plan: AtomicBool::new(false),
            timeout_plan: AtomicBool::new(false),
            malformed_plan: AtomicBool::new(false),
            fail_evaluate: AtomicBool::new(false),
            plan_titles: Mutex::new(vec![
                "Add meta description".to_string(),
                "Compress images".to_string(),
                "Add alt text".to_string(),
            ]),
            verdict: Mutex::new(VerdictOutcome::Resolved),
            fetches: AtomicUsize::new(0),
            plan_calls: AtomicUsize::new(0),
        }
    }
}

impl FakeSite {
    pub fn set(&self, flag: &AtomicBool, value: bool) {
        flag.store(value, Ordering::SeqCst);
    }

    pub fn set_plan_titles(&self, titles: &[&str]) {
        *self.plan_titles.lock().unwrap() = titles.iter().map(|t| t.to_string()).collect();
    }

    pub fn set_verdict(&self, outcome: VerdictOutcome) {
        *self.verdict.lock().unwrap() = outcome;
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn plan_count(&self) -> usize {
        self.plan_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotProvider for FakeSite {
    async fn fetch_snapshot(&self, url: &str) -> Result<Snapshot, CollaboratorError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.timeout_fetch.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Timeout);
        }
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Failed("connection refused".to_string()));
        }
        Ok(snapshot(url))
    }
}

#[async_trait]
impl InsightGenerator for FakeSite {
    async fn generate_analysis(
        &self,
        _snapshot: &Snapshot,
    ) -> Result<AnalysisReport, CollaboratorError> {
        if self.fail_insight.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Malformed("expected JSON".to_string()));
        }
        Ok(report(71))
    }
}

#[async_trait]
impl PlanGenerator for FakeSite {
    async fn generate_plan(
        &self,
        _report: &AnalysisReport,
        _snapshot: &Snapshot,
    ) -> Result<GeneratedPlan, CollaboratorError> {
        self.plan_calls.fetch_add(1, Ordering::SeqCst);
        if self.timeout_plan.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Timeout);
        }
        if self.fail_plan.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Failed("model overloaded".to_string()));
        }

        let titles = self.plan_titles.lock().unwrap().clone();
        let titles: Vec<&str> = titles.iter().map(String::as_str).collect();
        let mut plan = generated_plan(&titles);
        if self.malformed_plan.load(Ordering::SeqCst) {
            plan.summary.clear();
        }
        Ok(plan)
    }
}

#[async_trait]
impl TaskEvaluator for FakeSite {
    async fn evaluate_task(
        &self,
        task: &Task,
        _snapshot: &Snapshot,
    ) -> Result<Verdict, CollaboratorError> {
        if self.fail_evaluate.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Failed("model overloaded".to_string()));
        }
        Ok(Verdict {
            version: 1,
            outcome: *self.verdict.lock().unwrap(),
            detail: format!("Checked '{}'", task.title),
            evidence: vec!["<title>Example Domain</title>".to_string()],
        })
    }
}

/// Test engine on a temp database, wired to one shared [`FakeSite`].
pub struct TestEngine {
    pub temp_dir: TempDir,
    pub engine: LifecycleEngine,
    pub site: Arc<FakeSite>,
}

impl TestEngine {
    pub fn db_path(&self) -> PathBuf {
        self.temp_dir.path().join("test.db")
    }
}

/// Helper function to create a test engine
pub async fn create_test_engine() -> TestEngine {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let site = Arc::new(FakeSite::default());
    let engine = EngineBuilder::new()
        .with_database_path(temp_dir.path().join("test.db"))
        .with_snapshot_provider(site.clone())
        .with_insight_generator(site.clone())
        .with_plan_generator(site.clone())
        .with_task_evaluator(site.clone())
        .build()
        .await
        .expect("Failed to create engine");

    TestEngine {
        temp_dir,
        engine,
        site,
    }
}
