//! Shared test support: an in-memory store that records every request.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use docket::mongodb::request::{
    CountRequest, DeleteRequest, FindOneRequest, FindRequest, InsertRequest, UpdateRequest,
    UpdateSummary,
};
use docket::mongodb::{Bson, Document, ObjectId};
use docket::{DocResult, DocketError, DocumentCursor, DocumentStore, QueryBuilder};
use parking_lot::Mutex;

/// One request received by the store.
#[derive(Debug, Clone)]
pub enum Call {
    Find(String, FindRequest),
    FindOne(String, FindOneRequest),
    Count(String, CountRequest),
    Insert(String, InsertRequest),
    Update(String, UpdateRequest),
    Remove(String, DeleteRequest),
}

#[derive(Default)]
struct Inner {
    calls: Vec<Call>,
    collections: HashMap<String, Vec<Document>>,
    write_failure: Option<DocketError>,
}

/// Store that records requests and serves documents from memory.
///
/// Finds return the collection's documents in insertion order, windowed by
/// skip and limit. Filters are recorded, not evaluated.
#[derive(Clone, Default)]
pub struct RecordingStore {
    inner: Arc<Mutex<Inner>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a collection.
    pub fn with_documents(self, collection: &str, documents: Vec<Document>) -> Self {
        self.inner
            .lock()
            .collections
            .insert(collection.to_string(), documents);
        self
    }

    /// Make every subsequent write fail with `err`.
    pub fn fail_writes(&self, err: DocketError) {
        self.inner.lock().write_failure = Some(err);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().calls.clone()
    }

    pub fn last_call(&self) -> Call {
        self.inner
            .lock()
            .calls
            .last()
            .cloned()
            .expect("no calls recorded")
    }

    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.inner
            .lock()
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    fn record(&self, call: Call) {
        self.inner.lock().calls.push(call);
    }

    fn check_write(&self) -> DocResult<()> {
        match self.inner.lock().write_failure.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DocumentStore for RecordingStore {
    async fn find(&self, collection: &str, request: FindRequest) -> DocResult<DocumentCursor> {
        let documents: Vec<Document> = self
            .documents(collection)
            .into_iter()
            .skip(request.skip as usize)
            .take(request.limit as usize)
            .collect();
        self.record(Call::Find(collection.to_string(), request));
        Ok(DocumentCursor::from_documents(documents))
    }

    async fn find_one(
        &self,
        collection: &str,
        request: FindOneRequest,
    ) -> DocResult<Option<Document>> {
        let first = self.documents(collection).into_iter().next();
        self.record(Call::FindOne(collection.to_string(), request));
        Ok(first)
    }

    async fn count(&self, collection: &str, request: CountRequest) -> DocResult<u64> {
        let total = self.documents(collection).len() as u64;
        let count = match request.window {
            Some(window) => total.saturating_sub(window.skip).min(window.limit as u64),
            None => total,
        };
        self.record(Call::Count(collection.to_string(), request));
        Ok(count)
    }

    async fn insert(&self, collection: &str, request: InsertRequest) -> DocResult<Bson> {
        self.record(Call::Insert(collection.to_string(), request.clone()));
        self.check_write()?;

        let mut document = request.document;
        let id = match document.get("_id") {
            Some(id) => id.clone(),
            None => {
                let id = Bson::ObjectId(ObjectId::new());
                document.insert("_id", id.clone());
                id
            }
        };
        self.inner
            .lock()
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(document);
        Ok(id)
    }

    async fn update(&self, collection: &str, request: UpdateRequest) -> DocResult<UpdateSummary> {
        self.record(Call::Update(collection.to_string(), request));
        self.check_write()?;
        Ok(UpdateSummary {
            matched: 1,
            modified: 1,
        })
    }

    async fn remove(&self, collection: &str, request: DeleteRequest) -> DocResult<u64> {
        self.record(Call::Remove(collection.to_string(), request));
        self.check_write()?;
        Ok(1)
    }
}

/// A builder over a fresh recording store, plus a handle to inspect it.
pub fn session(store: RecordingStore) -> (QueryBuilder<RecordingStore>, RecordingStore) {
    (QueryBuilder::with_store(store.clone()), store)
}
