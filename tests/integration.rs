// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! End-to-end scenarios over the in-memory backend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metasync::document::DocumentPage;
use metasync::field::{known, Field, TypeKind};
use metasync::schema::{IndexFieldType, IndexType, SchemaSnapshot};
use metasync::source::{DocumentSource, SourceError};
use metasync::{
    BackendError, CursorPersistence, Cursor, Document, DocumentConsumer, EngineConfig, Event,
    InMemoryBackend, MemoryCursorStore, SyncEngine,
};

fn config_without_commits() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.commit_policy.enabled = false;
    config
}

async fn open_engine(config: EngineConfig) -> (Arc<InMemoryBackend>, SyncEngine) {
    let backend = Arc::new(InMemoryBackend::new());
    let engine = SyncEngine::new(backend.clone(), config);
    engine.open().await.expect("engine open");
    (backend, engine)
}

fn doc(id: &str, fields: &[(&str, &str)]) -> Document {
    let mut builder = Document::builder().id(id).unwrap();
    for (name, value) in fields {
        builder = builder.field(&Field::string(*name), *value).unwrap();
    }
    builder.build()
}

#[tokio::test]
async fn replace_then_merge_in_one_batch_stages_a_single_document() {
    let (backend, engine) = open_engine(config_without_commits()).await;

    let events = vec![
        Event::replace(doc("a", &[("x", "1")])),
        Event::merge(doc("a", &[("y", "2")])),
    ];
    engine.push(&events).await.unwrap();

    // One upsert batch with one document carrying both fields; the merge
    // consumed the pending replace as its base and resolved through
    // fetch-then-merge.
    let batches = backend.upsert_batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 1);
    let stored = backend.get("a").unwrap();
    assert_eq!(stored.get("x_s"), Some(&serde_json::json!("1")));
    assert_eq!(stored.get("y_s"), Some(&serde_json::json!("2")));
}

#[tokio::test]
async fn replace_then_merge_batch_keeps_untouched_indexed_fields() {
    let (backend, engine) = open_engine(config_without_commits()).await;

    engine
        .push(&[Event::replace(doc("x", &[("extra", "kept")]))])
        .await
        .unwrap();

    // A replace followed by a merge in the same batch resolves through
    // fetch-then-merge, so indexed fields absent from both events survive.
    engine
        .push(&[
            Event::replace(doc("x", &[("a", "1")])),
            Event::merge(doc("x", &[("b", "2")])),
        ])
        .await
        .unwrap();

    let stored = backend.get("x").unwrap();
    assert_eq!(stored.get("a_s"), Some(&serde_json::json!("1")));
    assert_eq!(stored.get("b_s"), Some(&serde_json::json!("2")));
    assert_eq!(stored.get("extra_s"), Some(&serde_json::json!("kept")));
}

#[tokio::test]
async fn merge_layers_over_the_indexed_state() {
    let (backend, engine) = open_engine(config_without_commits()).await;

    engine
        .push(&[Event::replace(doc(
            "r1",
            &[("title", "old"), ("author", "arthur")],
        ))])
        .await
        .unwrap();
    engine
        .push(&[Event::merge(doc("r1", &[("title", "new"), ("tag", "q3")]))])
        .await
        .unwrap();

    let stored = backend.get("r1").unwrap();
    // Updated fields win, untouched fields survive.
    assert_eq!(stored.get("title_s"), Some(&serde_json::json!("new")));
    assert_eq!(stored.get("author_s"), Some(&serde_json::json!("arthur")));
    assert_eq!(stored.get("tag_s"), Some(&serde_json::json!("q3")));
}

#[tokio::test]
async fn merge_of_a_missing_document_inserts_the_update() {
    let (backend, engine) = open_engine(config_without_commits()).await;
    engine
        .push(&[Event::merge(doc("ghost", &[("title", "t")]))])
        .await
        .unwrap();
    assert!(backend.get("ghost").is_some());
}

#[tokio::test]
async fn deletes_run_before_upserts() {
    let (backend, engine) = open_engine(config_without_commits()).await;
    engine.push(&[Event::replace(doc("d", &[]))]).await.unwrap();

    // Delete and re-create in the same batch: the document survives.
    engine
        .push(&[
            Event::delete(doc("d", &[])),
            Event::replace(doc("d", &[("fresh", "yes")])),
        ])
        .await
        .unwrap();

    assert_eq!(backend.delete_batches().len(), 1);
    let stored = backend.get("d").unwrap();
    assert_eq!(stored.get("fresh_s"), Some(&serde_json::json!("yes")));
}

#[tokio::test]
async fn upserts_are_chunked() {
    let mut config = config_without_commits();
    config.chunk_size = 100;
    let (backend, engine) = open_engine(config).await;

    let events: Vec<Event> = (0..250)
        .map(|i| Event::replace(doc(&format!("c{i}"), &[])))
        .collect();
    engine.push(&events).await.unwrap();

    let sizes: Vec<_> = backend.upsert_batches().iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![100, 100, 50]);
    assert_eq!(backend.doc_count(), 250);
}

#[tokio::test]
async fn commit_policy_counts_and_interval_are_a_conjunction() {
    let mut config = EngineConfig::default();
    config.commit_policy.commit_doc_count = 2;
    config.commit_policy.commit_interval_ms = 1000;
    let (backend, engine) = open_engine(config).await;

    let events: Vec<Event> = (0..3)
        .map(|i| Event::replace(doc(&format!("t{i}"), &[])))
        .collect();
    engine.push(&events).await.unwrap();
    // Count exceeded but the interval has not elapsed yet.
    assert_eq!(backend.commit_count(), 0);
    assert!(!engine.commit(false).await.unwrap());

    tokio::time::sleep(Duration::from_millis(1100)).await;

    // Both thresholds exceeded: exactly one commit fires.
    assert!(engine.commit(false).await.unwrap());
    assert_eq!(backend.commit_count(), 1);
    // The counters reset, so an immediate re-check declines.
    assert!(!engine.commit(false).await.unwrap());
    assert_eq!(backend.commit_count(), 1);
}

#[tokio::test]
async fn scheduled_committer_fires_on_its_own() {
    let mut config = EngineConfig::default();
    config.commit_policy.commit_doc_count = 0;
    config.commit_policy.commit_interval_ms = 0;
    let (backend, engine) = open_engine(config).await;

    engine.push(&[Event::replace(doc("s", &[]))]).await.unwrap();
    // Zeroed thresholds commit on every scheduled check; the cadence
    // floor is two seconds.
    tokio::time::sleep(Duration::from_millis(2300)).await;
    assert!(backend.commit_count() >= 1);
    engine.close().await;
}

#[tokio::test]
async fn unknown_index_field_aborts_the_push() {
    // A schema with only the system fields: any payload field misses.
    let snapshot = SchemaSnapshot {
        fields: vec![(
            "id".to_string(),
            IndexFieldType::new("id", IndexType::String, false),
        )],
        dynamic_fields: vec![],
    };
    let backend = Arc::new(InMemoryBackend::with_schema(snapshot));
    let engine = SyncEngine::new(backend.clone(), config_without_commits());
    engine.open().await.unwrap();

    let err = engine
        .push(&[Event::replace(doc("x", &[("title", "t")]))])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BackendError::Schema(metasync::SchemaError::UnknownIndexField { .. })
    ));
    assert!(backend.upsert_batches().is_empty());
}

/// A scripted source: two pages of events with cursors, then drained.
struct ScriptedSource {
    id: String,
    pages: Vec<DocumentPage>,
    position: Option<Cursor>,
    store: Arc<MemoryCursorStore>,
}

#[async_trait]
impl DocumentSource for ScriptedSource {
    fn id(&self) -> &str {
        &self.id
    }

    async fn next_page(&mut self) -> Result<DocumentPage, SourceError> {
        if self.pages.is_empty() {
            return Ok(DocumentPage::default());
        }
        let page = self.pages.remove(0);
        self.position = page.cursor.clone();
        Ok(page)
    }

    async fn save(&mut self) -> Result<(), SourceError> {
        if let Some(cursor) = &self.position {
            self.store.save(cursor).await?;
        }
        Ok(())
    }
}

#[tokio::test]
async fn source_to_engine_pipeline_with_cursor_persistence() {
    let (backend, engine) = open_engine(config_without_commits()).await;
    let store = Arc::new(MemoryCursorStore::new());

    let cursor_fields = Document::builder()
        .field(&Field::new("offset", TypeKind::Long), 2i64)
        .unwrap()
        .build();
    let mut source = ScriptedSource {
        id: "scripted".into(),
        pages: vec![
            DocumentPage {
                cursor: Some(Cursor::new("scripted")),
                events: vec![Event::replace(doc("p1", &[("title", "one")]))],
                has_next: true,
            },
            DocumentPage {
                cursor: Some(Cursor::with_fields("scripted", cursor_fields)),
                events: vec![
                    Event::replace(doc("p2", &[("title", "two")])),
                    Event::merge(doc("p1", &[("tag", "seen")])),
                ],
                has_next: false,
            },
        ],
        position: None,
        store: store.clone(),
    };

    loop {
        let page = source.next_page().await.unwrap();
        if page.is_empty() && !page.has_next {
            break;
        }
        DocumentConsumer::push(&engine, &page.events).await.unwrap();
        source.save().await.unwrap();
        if !page.has_next {
            break;
        }
    }
    DocumentConsumer::commit(&engine, true).await.unwrap();

    assert_eq!(backend.doc_count(), 2);
    let p1 = backend.get("p1").unwrap();
    assert_eq!(p1.get("title_s"), Some(&serde_json::json!("one")));
    assert_eq!(p1.get("tag_s"), Some(&serde_json::json!("seen")));
    assert_eq!(backend.commit_count(), 1);

    // The persisted cursor kept its typed payload.
    let resumed = store.load("scripted").await.unwrap().unwrap();
    assert_eq!(
        resumed
            .fields
            .get(&Field::new("offset", TypeKind::Long))
            .and_then(|v| v.as_long()),
        Some(2)
    );
}

#[tokio::test]
async fn children_reach_the_backend_nested() {
    let (backend, engine) = open_engine(config_without_commits()).await;

    let mut parent = Document::builder()
        .id("folder-1")
        .unwrap()
        .field(&known::IS_FOLDER, true)
        .unwrap()
        .build();
    parent.add_child(doc("page-1", &[("title", "first")]));

    engine.push(&[Event::replace(parent)]).await.unwrap();

    let stored = backend.get("folder-1").unwrap();
    assert_eq!(stored.get("is_folder_b"), Some(&serde_json::json!(true)));
    assert_eq!(stored.children().len(), 1);
    assert_eq!(stored.children()[0].id(), Some("page-1"));
}
