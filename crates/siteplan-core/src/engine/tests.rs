//! Tests for the engine module.

use super::*;
use crate::{
    error::ErrorKind,
    models::{GeneratedPlan, Verdict, VerdictOutcome},
    params::{DeleteAnalysis, Id, ListTasks},
};
use tempfile::TempDir;

/// Helper function to create store-only handle on a temp database
async fn create_test_stores() -> (TempDir, Stores) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("nested").join("test.db");
    let stores = EngineBuilder::new()
        .with_database_path(&db_path)
        .build_stores()
        .await
        .expect("Failed to create stores");
    (temp_dir, stores)
}

#[tokio::test]
async fn test_build_stores_creates_parent_directory() {
    let (temp_dir, stores) = create_test_stores().await;

    assert!(temp_dir.path().join("nested").join("test.db").exists());
    assert!(stores.list_analyses(None).await.unwrap().is_empty());
    assert!(stores
        .list_tasks(&ListTasks::default(), None)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_build_requires_collaborators() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let result = EngineBuilder::new()
        .with_database_path(temp_dir.path().join("test.db"))
        .build()
        .await;

    match result {
        Err(EngineError::Configuration { message }) => {
            assert!(message.contains("snapshot provider"), "{message}")
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("engine built without collaborators"),
    }
}

#[tokio::test]
async fn test_unknown_ids_are_not_found() {
    let (_temp_dir, stores) = create_test_stores().await;
    let id = Id {
        id: uuid::Uuid::new_v4(),
    };

    let task = stores.get_task(&id, None).await.unwrap_err();
    let analysis = stores.get_analysis(&id, None).await.unwrap_err();

    assert!(matches!(task, EngineError::TaskNotFound { .. }));
    assert!(matches!(analysis, EngineError::AnalysisNotFound { .. }));
}

#[tokio::test]
async fn test_delete_analysis_requires_confirmation() {
    let (_temp_dir, stores) = create_test_stores().await;
    let params = DeleteAnalysis {
        id: uuid::Uuid::new_v4(),
        confirmed: false,
    };

    let err = stores.delete_analysis(&params, None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[test]
fn test_checked_rejects_malformed_output_as_generation_failure() {
    let plan = GeneratedPlan {
        version: 1,
        summary: "  ".to_string(),
        timeline: None,
        quick_wins: vec![],
        tasks: vec![],
    };

    let err = checked(plan, Stage::Plan).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Generation);
    assert!(err.to_string().starts_with("Plan generation failed: malformed plan"));
}

#[test]
fn test_checked_passes_valid_output_through() {
    let verdict = Verdict {
        version: 1,
        outcome: VerdictOutcome::Resolved,
        detail: "Title present".to_string(),
        evidence: vec![],
    };

    let checked = checked(verdict.clone(), Stage::Evaluation).unwrap();
    assert_eq!(checked, verdict);
}
