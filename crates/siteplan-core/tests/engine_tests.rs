mod common;

use std::time::Duration;

use common::{create_test_engine, generated_plan, payload, SITE};
use siteplan_core::{
    Analyze, DeleteAnalysis, EngineError, ErrorKind, GeneratePlan, Id, ListTasks, Owner,
    PendingPlan, PlanPersistence, SetTaskNotes, SetTaskStatus, Stage, TaskStatus, VerdictOutcome,
};

fn analyze(url: &str) -> Analyze {
    Analyze {
        url: url.to_string(),
    }
}

fn owner(name: &str) -> Owner {
    Owner::new(name).expect("valid owner")
}

fn saved(outcome: &siteplan_core::PlanOutcome) -> &siteplan_core::StoredPlan {
    match &outcome.persistence {
        PlanPersistence::Saved(stored) => stored,
        PlanPersistence::Unsaved { warning } => panic!("plan not saved: {warning}"),
    }
}

#[tokio::test]
async fn test_analyze_creates_analysis_without_plan() {
    let t = create_test_engine().await;

    let analysis = t.engine.analyze(&analyze(SITE), None).await.unwrap();

    assert_eq!(analysis.url, SITE);
    assert_eq!(analysis.report.overall_score, 71);
    assert!(analysis.plan.is_none());
    assert!(analysis.owner.is_none());
    assert_eq!(t.site.fetch_count(), 1);
}

#[tokio::test]
async fn test_analyze_rejects_invalid_url_before_fetching() {
    let t = create_test_engine().await;

    let err = t
        .engine
        .analyze(&analyze("not a url"), None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(t.site.fetch_count(), 0);
}

#[tokio::test]
async fn test_analyze_failures_persist_nothing() {
    let t = create_test_engine().await;
    let stores = t.engine.stores();

    t.site.set(&t.site.fail_fetch, true);
    let fetch = t.engine.analyze(&analyze(SITE), None).await.unwrap_err();
    assert!(matches!(fetch, EngineError::Fetch { .. }));

    t.site.set(&t.site.fail_fetch, false);
    t.site.set(&t.site.fail_insight, true);
    let insight = t.engine.analyze(&analyze(SITE), None).await.unwrap_err();
    assert!(matches!(
        insight,
        EngineError::Generation {
            stage: Stage::Insight,
            ..
        }
    ));

    assert!(stores.list_analyses(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_analyze_timeout_is_distinct() {
    let t = create_test_engine().await;
    t.site.set(&t.site.timeout_fetch, true);

    let err = t.engine.analyze(&analyze(SITE), None).await.unwrap_err();

    assert!(matches!(
        err,
        EngineError::ExternalTimeout {
            stage: Stage::Snapshot
        }
    ));
}

#[tokio::test]
async fn test_plan_twice_keeps_one_analysis_and_replaces_tasks() {
    let t = create_test_engine().await;
    let stores = t.engine.stores();

    let a1 = t.engine.analyze(&analyze(SITE), None).await.unwrap();

    // First plan from A1's payload resolves to A1
    let first = t
        .engine
        .generate_plan_for(&GeneratePlan::inline(a1.payload()), None)
        .await
        .unwrap();
    let first_stored = saved(&first);
    assert_eq!(first_stored.analysis.id, a1.id);
    assert!(!first_stored.created);
    let sequences: Vec<u32> = first_stored.tasks.iter().map(|t| t.sequence).collect();
    assert_eq!(sequences, vec![0, 1, 2]);

    // Second plan from a fresh payload for the same URL still lands on A1
    t.site.set_plan_titles(&["Enable compression", "Fix canonical tag"]);
    let second = t
        .engine
        .generate_plan_for(&GeneratePlan::inline(payload(SITE)), None)
        .await
        .unwrap();
    let second_stored = saved(&second);
    assert_eq!(second_stored.analysis.id, a1.id);
    assert_eq!(second.analysis_id(), Some(a1.id));

    let analyses = stores.list_analyses(None).await.unwrap();
    assert_eq!(analyses.len(), 1);

    for old in &first_stored.tasks {
        let err = stores.get_task(&Id { id: old.id }, None).await.unwrap_err();
        assert!(matches!(err, EngineError::TaskNotFound { .. }));
    }

    let current = stores
        .list_tasks(
            &ListTasks {
                analysis_id: Some(a1.id),
                sequence_order: true,
                ..ListTasks::default()
            },
            None,
        )
        .await
        .unwrap();
    let titles: Vec<&str> = current.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["Enable compression", "Fix canonical tag"]);
    let sequences: Vec<u32> = current.iter().map(|t| t.sequence).collect();
    assert_eq!(sequences, vec![0, 1]);
}

#[tokio::test]
async fn test_plan_without_existing_analysis_creates_one() {
    let t = create_test_engine().await;

    let outcome = t
        .engine
        .generate_plan_for(&GeneratePlan::inline(payload(SITE)), None)
        .await
        .unwrap();

    let stored = saved(&outcome);
    assert!(stored.created);
    assert_eq!(stored.tasks.len(), 3);
    let plan = stored.analysis.plan.as_ref().expect("plan attached");
    assert_eq!(plan.quick_wins, vec!["Add alt text".to_string()]);
}

#[tokio::test]
async fn test_plan_never_merges_anonymous_and_owned_analyses() {
    let t = create_test_engine().await;
    let stores = t.engine.stores();
    let alice = owner("alice");

    let anonymous = t.engine.analyze(&analyze(SITE), None).await.unwrap();
    let outcome = t
        .engine
        .generate_plan_for(&GeneratePlan::inline(anonymous.payload()), Some(&alice))
        .await
        .unwrap();

    let stored = saved(&outcome);
    assert!(stored.created);
    assert_ne!(stored.analysis.id, anonymous.id);
    assert_eq!(stored.analysis.owner, Some(alice.clone()));

    let untouched = stores
        .get_analysis(&Id { id: anonymous.id }, None)
        .await
        .unwrap();
    assert!(untouched.plan.is_none());
}

#[tokio::test]
async fn test_plan_for_stored_analysis_checks_owner_before_generating() {
    let t = create_test_engine().await;
    let analysis = t
        .engine
        .analyze(&analyze(SITE), Some(&owner("alice")))
        .await
        .unwrap();

    let unauthorized = t
        .engine
        .generate_plan_for(&GeneratePlan::stored(analysis.id), Some(&owner("bob")))
        .await
        .unwrap_err();
    let missing = t
        .engine
        .generate_plan_for(&GeneratePlan::stored(uuid::Uuid::new_v4()), None)
        .await
        .unwrap_err();

    assert!(matches!(unauthorized, EngineError::Unauthorized { .. }));
    assert!(matches!(missing, EngineError::AnalysisNotFound { .. }));
    assert_eq!(t.site.plan_count(), 0);
}

#[tokio::test]
async fn test_plan_generator_failure_mutates_nothing() {
    let t = create_test_engine().await;
    let stores = t.engine.stores();
    let analysis = t.engine.analyze(&analyze(SITE), None).await.unwrap();

    t.site.set(&t.site.fail_plan, true);
    let failed = t
        .engine
        .generate_plan_for(&GeneratePlan::stored(analysis.id), None)
        .await
        .unwrap_err();
    assert_eq!(failed.kind(), ErrorKind::Generation);

    t.site.set(&t.site.fail_plan, false);
    t.site.set(&t.site.malformed_plan, true);
    let malformed = t
        .engine
        .generate_plan_for(&GeneratePlan::stored(analysis.id), None)
        .await
        .unwrap_err();
    assert!(matches!(
        malformed,
        EngineError::Generation {
            stage: Stage::Plan,
            ..
        }
    ));

    t.site.set(&t.site.malformed_plan, false);
    t.site.set(&t.site.timeout_plan, true);
    let timeout = t
        .engine
        .generate_plan_for(&GeneratePlan::stored(analysis.id), None)
        .await
        .unwrap_err();
    assert_eq!(timeout.kind(), ErrorKind::ExternalTimeout);

    let reloaded = stores
        .get_analysis(&Id { id: analysis.id }, None)
        .await
        .unwrap();
    assert!(reloaded.plan.is_none());
    assert!(stores
        .list_tasks(&ListTasks::default(), None)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_invalid_inline_payload_is_invalid_input() {
    let t = create_test_engine().await;
    let mut bad = payload(SITE);
    bad.report.overall_score = 140;

    let err = t
        .engine
        .generate_plan_for(&GeneratePlan::inline(bad), None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EngineError::InvalidPayload {
            kind: "analysis payload",
            ..
        }
    ));
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(t.site.plan_count(), 0);
}

#[tokio::test]
async fn test_inline_plan_url_is_normalized_before_upsert() {
    let t = create_test_engine().await;
    let stores = t.engine.stores();

    let analysis = t
        .engine
        .analyze(&analyze(" https://example.com "), None)
        .await
        .unwrap();
    assert_eq!(analysis.url, SITE);

    let outcome = t
        .engine
        .generate_plan_for(&GeneratePlan::inline(payload("https://example.com ")), None)
        .await
        .unwrap();

    assert_eq!(saved(&outcome).analysis.id, analysis.id);
    assert_eq!(outcome.plan.payload.url, SITE);
    assert_eq!(stores.list_analyses(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_inline_plan_rejects_unusable_url_before_generating() {
    let t = create_test_engine().await;
    let stores = t.engine.stores();

    for url in ["not a url", "ftp://example.com"] {
        let err = t
            .engine
            .generate_plan_for(&GeneratePlan::inline(payload(url)), None)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput { .. }), "{url}: {err}");
    }

    assert_eq!(t.site.plan_count(), 0);
    assert!(stores.list_analyses(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_persist_plan_rejects_malformed_pending_plan() {
    let t = create_test_engine().await;
    let stores = t.engine.stores();
    let valid = || PendingPlan {
        payload: payload(SITE),
        plan: generated_plan(&["Add meta description"]),
    };

    let mut future_version = valid();
    future_version.plan.version = 99;
    let mut no_summary = valid();
    no_summary.plan.summary = String::new();
    let mut blank_titles = valid();
    blank_titles.plan = generated_plan(&["", "   "]);

    for pending in [future_version, no_summary, blank_titles] {
        let err = stores.persist_plan(&pending, None).await.unwrap_err();
        assert!(
            matches!(err, EngineError::InvalidPayload { kind: "plan", .. }),
            "{err}"
        );
    }

    let mut blank_url = valid();
    blank_url.payload.url = "   ".to_string();
    let mut bad_url = valid();
    bad_url.payload.url = "not a url".to_string();
    for pending in [blank_url, bad_url] {
        let err = stores.persist_plan(&pending, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    assert!(stores.list_analyses(None).await.unwrap().is_empty());
    assert!(stores
        .list_tasks(&ListTasks::default(), None)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_persist_plan_stores_normalized_url() {
    let t = create_test_engine().await;
    let pending = PendingPlan {
        payload: payload(" https://example.com "),
        plan: generated_plan(&["Add meta description"]),
    };

    let stored = t.engine.stores().persist_plan(&pending, None).await.unwrap();

    assert_eq!(stored.analysis.url, SITE);
    assert_eq!(stored.tasks.len(), 1);
}

#[tokio::test]
async fn test_persistence_failure_returns_plan_with_warning() {
    let t = create_test_engine().await;
    let stores = t.engine.stores();

    let conn = rusqlite::Connection::open(t.db_path()).unwrap();
    conn.execute_batch(
        "CREATE TRIGGER reject_tasks BEFORE INSERT ON tasks BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
    )
    .unwrap();

    let outcome = t
        .engine
        .generate_plan_for(&GeneratePlan::inline(payload(SITE)), None)
        .await
        .expect("generation succeeded, persistence is only a warning");

    assert!(!outcome.is_saved());
    let warning = outcome.warning().expect("warning present");
    assert!(warning.contains("not saved"), "{warning}");
    assert!(!warning.contains("disk full"), "{warning}");
    assert_eq!(outcome.plan.plan.tasks.len(), 3);

    // The failed attempt rolled back entirely
    assert!(stores.list_analyses(None).await.unwrap().is_empty());

    // Retrying persistence needs no new generation
    conn.execute_batch("DROP TRIGGER reject_tasks;").unwrap();
    let stored = stores.persist_plan(&outcome.plan, None).await.unwrap();
    assert!(stored.created);
    assert_eq!(stored.tasks.len(), 3);
    assert_eq!(t.site.plan_count(), 1);
}

#[tokio::test]
async fn test_concurrent_plans_for_same_url_share_one_analysis() {
    let t = create_test_engine().await;
    let stores = t.engine.stores();

    let first_cmd = GeneratePlan::inline(payload(SITE));
    let second_cmd = GeneratePlan::inline(payload(SITE));
    let first = t.engine.generate_plan_for(&first_cmd, None);
    let second = t.engine.generate_plan_for(&second_cmd, None);
    let (first, second) = tokio::join!(first, second);
    let (first, second) = (first.unwrap(), second.unwrap());

    assert_eq!(first.analysis_id(), second.analysis_id());
    assert_eq!(stores.list_analyses(None).await.unwrap().len(), 1);

    // Exactly one complete task set survives
    let tasks = stores.list_tasks(&ListTasks::default(), None).await.unwrap();
    assert_eq!(tasks.len(), 3);
    let mut sequences: Vec<u32> = tasks.iter().map(|t| t.sequence).collect();
    sequences.sort_unstable();
    assert_eq!(sequences, vec![0, 1, 2]);
}

#[tokio::test]
async fn test_status_lifecycle_through_stores() {
    let t = create_test_engine().await;
    let stores = t.engine.stores();
    let outcome = t
        .engine
        .generate_plan_for(&GeneratePlan::inline(payload(SITE)), None)
        .await
        .unwrap();
    let task_id = saved(&outcome).tasks[0].id;
    let set = |status| SetTaskStatus {
        id: task_id,
        status,
    };

    let started = stores
        .set_task_status(&set(TaskStatus::InProgress), None)
        .await
        .unwrap()
        .task;
    let again = stores
        .set_task_status(&set(TaskStatus::InProgress), None)
        .await
        .unwrap()
        .task;
    assert_eq!(again.started_at, started.started_at);

    let completed = stores
        .set_task_status(&set(TaskStatus::Completed), None)
        .await
        .unwrap()
        .task;
    stores
        .set_task_status(&set(TaskStatus::Pending), None)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let recompleted = stores
        .set_task_status(&set(TaskStatus::Completed), None)
        .await
        .unwrap()
        .task;
    assert!(recompleted.completed_at > completed.completed_at);

    let noted = stores
        .set_task_notes(
            &SetTaskNotes {
                id: task_id,
                notes: Some("Shipped in release 4".to_string()),
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(noted.notes.as_deref(), Some("Shipped in release 4"));
    assert_eq!(noted.status, TaskStatus::Completed);
}

#[tokio::test]
async fn test_reanalyze_attaches_verdict_without_changing_status() {
    let t = create_test_engine().await;
    let stores = t.engine.stores();
    let outcome = t
        .engine
        .generate_plan_for(&GeneratePlan::inline(payload(SITE)), None)
        .await
        .unwrap();
    let task_id = saved(&outcome).tasks[0].id;

    // Fetch fails: nothing attached
    t.site.set(&t.site.fail_fetch, true);
    let err = t
        .engine
        .reanalyze_task(&Id { id: task_id }, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Fetch { .. }));
    let task = stores.get_task(&Id { id: task_id }, None).await.unwrap();
    assert!(task.last_reanalysis.is_none());

    // Site is back: verdict attached, status untouched
    t.site.set(&t.site.fail_fetch, false);
    let fetches_before = t.site.fetch_count();
    let result = t
        .engine
        .reanalyze_task(&Id { id: task_id }, None)
        .await
        .unwrap();
    assert_eq!(t.site.fetch_count(), fetches_before + 1);
    assert_eq!(result.verdict.outcome, VerdictOutcome::Resolved);
    assert_eq!(result.task.status, TaskStatus::Pending);
    assert_eq!(result.task.last_reanalysis, Some(result.verdict.clone()));

    // Only an explicit status change completes it
    let completed = stores
        .set_task_status(
            &SetTaskStatus {
                id: task_id,
                status: TaskStatus::Completed,
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(completed.previous, TaskStatus::Pending);
    assert_eq!(completed.task.status, TaskStatus::Completed);
}

#[tokio::test]
async fn test_reanalyze_evaluator_failure_attaches_nothing() {
    let t = create_test_engine().await;
    let stores = t.engine.stores();
    let outcome = t
        .engine
        .generate_plan_for(&GeneratePlan::inline(payload(SITE)), None)
        .await
        .unwrap();
    let task_id = saved(&outcome).tasks[0].id;

    t.site.set(&t.site.fail_evaluate, true);
    let err = t
        .engine
        .reanalyze_task(&Id { id: task_id }, None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EngineError::Generation {
            stage: Stage::Evaluation,
            ..
        }
    ));
    let task = stores.get_task(&Id { id: task_id }, None).await.unwrap();
    assert!(task.last_reanalysis.is_none());
    assert!(task.last_reanalyzed_at.is_none());
    assert_eq!(task.status, TaskStatus::Pending);
}

#[tokio::test]
async fn test_reanalyze_orphaned_task_reports_missing_analysis() {
    let t = create_test_engine().await;
    let outcome = t
        .engine
        .generate_plan_for(&GeneratePlan::inline(payload(SITE)), None)
        .await
        .unwrap();
    let stored = saved(&outcome);
    let task_id = stored.tasks[0].id;

    let conn = rusqlite::Connection::open(t.db_path()).unwrap();
    conn.execute_batch("PRAGMA foreign_keys = OFF;").unwrap();
    conn.execute(
        "DELETE FROM analyses WHERE id = ?1",
        [stored.analysis.id.to_string()],
    )
    .unwrap();
    let fetches_before = t.site.fetch_count();

    let err = t
        .engine
        .reanalyze_task(&Id { id: task_id }, None)
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::AnalysisNotFound { .. }));
    assert_eq!(t.site.fetch_count(), fetches_before);
}

#[tokio::test]
async fn test_reanalyze_checks_owner() {
    let t = create_test_engine().await;
    let alice = owner("alice");
    let outcome = t
        .engine
        .generate_plan_for(&GeneratePlan::inline(payload(SITE)), Some(&alice))
        .await
        .unwrap();
    let task_id = saved(&outcome).tasks[0].id;
    let fetches_before = t.site.fetch_count();

    let err = t
        .engine
        .reanalyze_task(&Id { id: task_id }, Some(&owner("bob")))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Unauthorized { .. }));
    assert_eq!(t.site.fetch_count(), fetches_before);
}

#[tokio::test]
async fn test_delete_analysis_removes_its_tasks() {
    let t = create_test_engine().await;
    let stores = t.engine.stores();
    let outcome = t
        .engine
        .generate_plan_for(&GeneratePlan::inline(payload(SITE)), None)
        .await
        .unwrap();
    let stored = saved(&outcome);

    let unauthorized = stores
        .delete_analysis(
            &DeleteAnalysis {
                id: stored.analysis.id,
                confirmed: true,
            },
            Some(&owner("mallory")),
        )
        .await
        .unwrap_err();
    assert!(matches!(unauthorized, EngineError::Unauthorized { .. }));

    stores
        .delete_analysis(
            &DeleteAnalysis {
                id: stored.analysis.id,
                confirmed: true,
            },
            None,
        )
        .await
        .unwrap();

    for task in &stored.tasks {
        let err = stores.get_task(&Id { id: task.id }, None).await.unwrap_err();
        assert!(matches!(err, EngineError::TaskNotFound { .. }));
    }
}

#[tokio::test]
async fn test_show_analysis_includes_tasks_and_counts() {
    let t = create_test_engine().await;
    let stores = t.engine.stores();
    let outcome = t
        .engine
        .generate_plan_for(&GeneratePlan::inline(payload(SITE)), None)
        .await
        .unwrap();
    let stored = saved(&outcome);
    stores
        .set_task_status(
            &SetTaskStatus {
                id: stored.tasks[2].id,
                status: TaskStatus::Skipped,
            },
            None,
        )
        .await
        .unwrap();

    let detail = stores
        .show_analysis(
            &Id {
                id: stored.analysis.id,
            },
            None,
        )
        .await
        .unwrap();

    assert_eq!(detail.tasks.len(), 3);
    assert_eq!(detail.counts.skipped, 1);
    assert_eq!(detail.counts.pending, 2);
    assert!(detail.to_string().contains("## Tasks (0/3 completed"));
}
