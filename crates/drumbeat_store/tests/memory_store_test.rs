//! Tests for the in-memory store implementations.

use drumbeat_core::{Keyword, KeywordKind, PipelineName, Run, RunStatus};
use drumbeat_interface::{KeywordStore, RunStore};
use drumbeat_store::{MemoryKeywordStore, MemoryRunStore};
use serde_json::json;
use uuid::Uuid;

fn keyword(account_id: Uuid, text: &str, position: Option<u32>) -> Keyword {
    Keyword {
        id: Uuid::new_v4(),
        account_id,
        text: text.to_string(),
        position,
        previous_position: None,
        best_position: position,
        search_volume: Some(500),
        difficulty: Some(30),
        kind: KeywordKind::Target,
        source: "research".to_string(),
        last_checked_at: None,
    }
}

#[tokio::test]
async fn run_reaches_terminal_status_exactly_once() {
    let store = MemoryRunStore::new();
    let run = Run::start(Uuid::new_v4(), PipelineName::Scholar, "manual");
    let id = run.id;
    store.create(run).await.unwrap();

    store.append_result(id, json!({"keywords": 12})).await.unwrap();
    store.complete(id, json!({"topics": 3})).await.unwrap();

    let stored = store.get(id).await.unwrap();
    assert_eq!(stored.status, RunStatus::Completed);
    assert!(stored.completed_at.is_some());
    // Partial results merge into the final payload.
    let result = stored.result.unwrap();
    assert_eq!(result["keywords"], 12);
    assert_eq!(result["topics"], 3);

    // Terminal runs are never mutated again.
    assert!(store.complete(id, json!({})).await.is_err());
    assert!(store.fail(id, "late failure").await.is_err());
    assert!(store.append_result(id, json!({})).await.is_err());
    assert_eq!(store.get(id).await.unwrap().status, RunStatus::Completed);
}

#[tokio::test]
async fn failed_run_records_error_verbatim() {
    let store = MemoryRunStore::new();
    let run = Run::start(Uuid::new_v4(), PipelineName::Ghostwriter, "manual");
    let id = run.id;
    store.create(run).await.unwrap();

    store.fail(id, "completion service: 503").await.unwrap();

    let stored = store.get(id).await.unwrap();
    assert_eq!(stored.status, RunStatus::Failed);
    assert_eq!(stored.error.as_deref(), Some("completion service: 503"));
}

#[tokio::test]
async fn keyword_upsert_converges_on_account_and_text() {
    let store = MemoryKeywordStore::new();
    let account_id = Uuid::new_v4();

    store
        .upsert(keyword(account_id, "Dentist Near Me", Some(14)))
        .await
        .unwrap();
    // Same term, different case: converges instead of duplicating.
    store
        .upsert(keyword(account_id, "dentist near me", Some(9)))
        .await
        .unwrap();

    let keywords = store.list_for_account(account_id).await.unwrap();
    assert_eq!(keywords.len(), 1);
    assert_eq!(keywords[0].position, Some(9));
    assert_eq!(keywords[0].previous_position, Some(14));
    assert_eq!(keywords[0].best_position, Some(9));
}

#[tokio::test]
async fn keyword_upsert_tracks_best_position() {
    let store = MemoryKeywordStore::new();
    let account_id = Uuid::new_v4();

    store
        .upsert(keyword(account_id, "invisalign cost", Some(5)))
        .await
        .unwrap();
    store
        .upsert(keyword(account_id, "invisalign cost", Some(11)))
        .await
        .unwrap();

    let keywords = store.list_for_account(account_id).await.unwrap();
    assert_eq!(keywords[0].position, Some(11));
    assert_eq!(keywords[0].best_position, Some(5));
}
