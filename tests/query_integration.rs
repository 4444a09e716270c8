//! Integration tests for query accumulation and execution.
//!
//! These tests drive a builder over a recording store and check:
//! - The requests each terminal operation sends
//! - State reset after terminal operations
//! - Durable write settings
//! - Error propagation

mod common;

use common::{Call, RecordingStore, session};
use docket::mongodb::request::{UpdateDocument, WriteScope};
use docket::mongodb::{Bson, DEFAULT_LIMIT, UpdateOptions, doc};
use futures::StreamExt;
use pretty_assertions::assert_eq;

fn recipes() -> RecordingStore {
    RecordingStore::new().with_documents(
        "recipes",
        vec![
            doc! { "_id": "a", "name": "Soup" },
            doc! { "_id": "b", "name": "Stew" },
            doc! { "_id": "c", "name": "Salad" },
        ],
    )
}

#[tokio::test]
async fn test_find_request_carries_accumulated_state() {
    let (mut qb, store) = session(recipes());

    qb.select(["name"], ["_id"])
        .where_(doc! { "kind": "main" })
        .where_gt("rating", 1)
        .where_lt("rating", 5)
        .or_where(doc! { "vegan": true })
        .or_where(doc! { "vegetarian": true })
        .order_by(doc! { "score": -1, "name": "asc" })
        .limit(2)
        .offset(1);

    let docs = qb.get("recipes").await.unwrap();
    assert_eq!(docs, vec![doc! { "_id": "b", "name": "Stew" }, doc! { "_id": "c", "name": "Salad" }]);

    match store.last_call() {
        Call::Find(collection, request) => {
            assert_eq!(collection, "recipes");
            assert_eq!(
                request.filter,
                doc! {
                    "kind": "main",
                    "rating": { "$gt": 1, "$lt": 5 },
                    "$or": [ { "vegan": true }, { "vegetarian": true } ],
                }
            );
            assert_eq!(request.projection, Some(doc! { "name": 1 }));
            assert_eq!(request.sort, Some(doc! { "score": -1, "name": 1 }));
            assert_eq!(request.limit, 2);
            assert_eq!(request.skip, 1);
        }
        other => panic!("expected a find, got {:?}", other),
    }
}

#[tokio::test]
async fn test_cursor_is_single_pass() {
    let (mut qb, _store) = session(recipes());

    let mut cursor = qb.get_cursor("recipes").await.unwrap();
    let mut names = Vec::new();
    while let Some(doc) = cursor.next().await {
        names.push(doc.unwrap().get_str("name").unwrap().to_string());
    }

    assert_eq!(names, vec!["Soup", "Stew", "Salad"]);
    assert!(cursor.next().await.is_none());
}

#[tokio::test]
async fn test_get_where_composes() {
    let (mut qb, store) = session(recipes());

    let docs = qb
        .get_where("recipes", doc! { "name": "Soup" }, 1)
        .await
        .unwrap();
    assert_eq!(docs.len(), 1);

    match store.last_call() {
        Call::Find(_, request) => {
            assert_eq!(request.filter, doc! { "name": "Soup" });
            assert_eq!(request.limit, 1);
        }
        other => panic!("expected a find, got {:?}", other),
    }
    assert!(qb.state().is_empty());
}

#[tokio::test]
async fn test_get_one_sends_filter_and_projection_only() {
    let (mut qb, store) = session(recipes());

    let doc = qb
        .select("name", ())
        .where_(doc! { "_id": "a" })
        .order_by(doc! { "name": 1 })
        .limit(5)
        .get_one("recipes")
        .await
        .unwrap();
    assert!(doc.is_some());

    match store.last_call() {
        Call::FindOne(_, request) => {
            assert_eq!(request.filter, doc! { "_id": "a" });
            assert_eq!(request.projection, Some(doc! { "name": 1 }));
        }
        other => panic!("expected a find_one, got {:?}", other),
    }
    assert!(qb.state().is_empty());
}

#[tokio::test]
async fn test_get_one_not_found() {
    let (mut qb, _store) = session(RecordingStore::new());
    assert_eq!(qb.get_one("empty").await.unwrap(), None);
}

#[tokio::test]
async fn test_count_window() {
    let (mut qb, store) = session(recipes());

    assert_eq!(qb.limit(2).count("recipes", false).await.unwrap(), 3);
    match store.last_call() {
        Call::Count(_, request) => assert_eq!(request.window, None),
        other => panic!("expected a count, got {:?}", other),
    }

    assert_eq!(qb.limit(2).count("recipes", true).await.unwrap(), 2);
    match store.last_call() {
        Call::Count(_, request) => {
            let window = request.window.expect("windowed count");
            assert_eq!(window.limit, 2);
            assert_eq!(window.skip, 0);
        }
        other => panic!("expected a count, got {:?}", other),
    }
}

#[tokio::test]
async fn test_insert_returns_own_identifier_only() {
    let (mut qb, store) = session(RecordingStore::new());

    let id = qb.insert("recipes", doc! { "name": "Soup" }).await.unwrap();
    assert_eq!(id, None);

    let id = qb
        .insert("recipes", doc! { "_id": "abc", "name": "Soup" })
        .await
        .unwrap();
    assert_eq!(id, Some(Bson::String("abc".into())));

    match store.last_call() {
        Call::Insert(collection, request) => {
            assert_eq!(collection, "recipes");
            assert_eq!(request.write_concern.journal, Some(true));
        }
        other => panic!("expected an insert, got {:?}", other),
    }
    assert_eq!(store.documents("recipes").len(), 2);
}

#[tokio::test]
async fn test_insert_does_not_consume_state() {
    let (mut qb, _store) = session(RecordingStore::new());

    qb.where_(doc! { "name": "Soup" });
    qb.insert("recipes", doc! { "name": "Soup" }).await.unwrap();

    assert_eq!(qb.state().filter(), &doc! { "name": "Soup" });
}

#[tokio::test]
async fn test_update_then_unfiltered_get() {
    let (mut qb, store) = session(recipes());

    let summary = qb
        .where_(doc! { "_id": "abc" })
        .update("recipes", doc! { "name": "New" }, UpdateOptions::default(), false)
        .await
        .unwrap();
    assert_eq!(summary.matched, 1);

    match store.last_call() {
        Call::Update(collection, request) => {
            assert_eq!(collection, "recipes");
            assert_eq!(request.filter, doc! { "_id": "abc" });
            assert_eq!(
                request.update,
                UpdateDocument::Set(doc! { "$set": { "name": "New" } })
            );
            assert_eq!(request.scope, WriteScope::One);
            assert_eq!(
                request.options.write_concern.and_then(|wc| wc.journal),
                Some(true)
            );
        }
        other => panic!("expected an update, got {:?}", other),
    }

    let docs = qb.get("recipes").await.unwrap();
    assert_eq!(docs.len(), 3);
    match store.last_call() {
        Call::Find(_, request) => {
            assert!(request.filter.is_empty());
            assert_eq!(request.limit, DEFAULT_LIMIT);
            assert_eq!(request.skip, 0);
            assert_eq!(request.projection, None);
            assert_eq!(request.sort, None);
        }
        other => panic!("expected a find, got {:?}", other),
    }
}

#[tokio::test]
async fn test_update_overrides_caller_options() {
    let (mut qb, store) = session(RecordingStore::new());

    let mut options = UpdateOptions::default();
    options.upsert = Some(true);

    qb.update("recipes", doc! { "$inc": { "views": 1 } }, options, true)
        .await
        .unwrap();

    match store.last_call() {
        Call::Update(_, request) => {
            assert_eq!(request.options.upsert, Some(true));
            assert_eq!(request.scope, WriteScope::One);
            assert_eq!(
                request.update,
                UpdateDocument::Operators(doc! { "$inc": { "views": 1 } })
            );
            assert_eq!(
                request.options.write_concern.and_then(|wc| wc.journal),
                Some(true)
            );
        }
        other => panic!("expected an update, got {:?}", other),
    }
}

#[tokio::test]
async fn test_literal_update_replaces_single_document() {
    let (mut qb, store) = session(RecordingStore::new());

    qb.where_(doc! { "_id": "a" })
        .update("recipes", doc! { "name": "Broth" }, UpdateOptions::default(), true)
        .await
        .unwrap();

    match store.last_call() {
        Call::Update(_, request) => {
            assert_eq!(request.update, UpdateDocument::Replacement(doc! { "name": "Broth" }));
        }
        other => panic!("expected an update, got {:?}", other),
    }
}

#[tokio::test]
async fn test_update_all_targets_every_match() {
    let (mut qb, store) = session(RecordingStore::new());

    qb.where_in("_id", ["a", "b"])
        .update_all("recipes", doc! { "archived": true }, false)
        .await
        .unwrap();

    match store.last_call() {
        Call::Update(_, request) => {
            assert_eq!(request.scope, WriteScope::Many);
            assert_eq!(request.filter, doc! { "_id": { "$in": ["a", "b"] } });
        }
        other => panic!("expected an update, got {:?}", other),
    }
    assert!(qb.state().is_empty());
}

#[tokio::test]
async fn test_update_all_rejects_replacement() {
    let (mut qb, store) = session(RecordingStore::new());

    qb.where_(doc! { "kind": "soup" });
    let err = qb
        .update_all("recipes", doc! { "name": "Broth" }, true)
        .await
        .unwrap_err();

    assert!(err.is_validation());
    assert!(store.calls().is_empty());
    assert_eq!(qb.state().filter(), &doc! { "kind": "soup" });
}

#[tokio::test]
async fn test_delete_scopes() {
    let (mut qb, store) = session(RecordingStore::new());

    qb.where_(doc! { "_id": "a" }).delete("recipes").await.unwrap();
    match store.last_call() {
        Call::Remove(_, request) => {
            assert_eq!(request.scope, WriteScope::One);
            assert_eq!(request.filter, doc! { "_id": "a" });
            assert_eq!(request.write_concern.journal, Some(true));
        }
        other => panic!("expected a remove, got {:?}", other),
    }

    qb.delete_all("recipes").await.unwrap();
    match store.last_call() {
        Call::Remove(_, request) => {
            assert_eq!(request.scope, WriteScope::Many);
            assert!(request.filter.is_empty());
        }
        other => panic!("expected a remove, got {:?}", other),
    }
}

#[tokio::test]
async fn test_persistence_failure_keeps_state() {
    let (mut qb, store) = session(RecordingStore::new());
    store.fail_writes(docket::DocketError::persistence("not primary", Some(10107)));

    qb.where_(doc! { "_id": "a" });

    let err = qb.delete("recipes").await.unwrap_err();
    assert!(err.is_persistence());
    assert_eq!(err.code(), Some(10107));
    assert_eq!(qb.state().filter(), &doc! { "_id": "a" });

    let err = qb
        .update("recipes", doc! { "name": "x" }, UpdateOptions::default(), false)
        .await
        .unwrap_err();
    assert!(err.is_persistence());
    assert_eq!(qb.state().filter(), &doc! { "_id": "a" });
}

#[tokio::test]
async fn test_validation_happens_before_io() {
    let (mut qb, store) = session(RecordingStore::new());

    assert!(qb.get("").await.unwrap_err().is_validation());
    assert!(qb.insert("recipes", doc! {}).await.unwrap_err().is_validation());
    assert!(
        qb.update("recipes", doc! {}, UpdateOptions::default(), false)
            .await
            .unwrap_err()
            .is_validation()
    );
    assert!(qb.delete_all("").await.unwrap_err().is_validation());

    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn test_every_terminal_operation_resets() {
    let (mut qb, _store) = session(recipes());

    qb.where_(doc! { "a": 1 }).select("a", ()).order_by(doc! { "a": -1 }).limit(1).offset(1);
    let _cursor = qb.get_cursor("recipes").await.unwrap();
    assert!(qb.state().is_empty());

    qb.where_(doc! { "a": 1 }).limit(1);
    qb.count("recipes", true).await.unwrap();
    assert!(qb.state().is_empty());

    qb.where_(doc! { "a": 1 });
    qb.update_all("recipes", doc! { "b": 2 }, false).await.unwrap();
    assert!(qb.state().is_empty());

    qb.where_(doc! { "a": 1 });
    qb.delete("recipes").await.unwrap();
    assert!(qb.state().is_empty());
}
