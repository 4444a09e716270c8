//! Execution seam between the query builder and the database.
//!
//! [`DocumentStore`] is the set of collection operations the builder needs.
//! [`MongoStore`] implements it with the official MongoDB driver; tests and
//! embedders can plug in their own implementation.

use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use bson::{Bson, Document};
use futures::stream::{BoxStream, Stream, StreamExt, TryStreamExt};
use mongodb::options::{
    CountOptions, DeleteOptions, FindOneOptions, FindOptions, InsertOneOptions, ReplaceOptions,
    UpdateOptions,
};
use mongodb::{Collection, Database};
use tracing::trace;

use crate::error::{DocResult, DocketError};
use crate::request::{
    CountRequest, DeleteRequest, FindOneRequest, FindRequest, InsertRequest, UpdateDocument,
    UpdateRequest, UpdateSummary, WriteScope,
};

/// A lazy, forward-only sequence of documents.
///
/// Documents are fetched as the cursor is polled. Once exhausted it cannot
/// be restarted.
pub struct DocumentCursor {
    inner: BoxStream<'static, DocResult<Document>>,
}

impl DocumentCursor {
    /// Wrap a document stream.
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = DocResult<Document>> + Send + 'static,
    {
        Self {
            inner: stream.boxed(),
        }
    }

    /// A cursor over documents already in memory.
    pub fn from_documents(documents: Vec<Document>) -> Self {
        Self::new(futures::stream::iter(documents.into_iter().map(Ok)))
    }

    /// Drain the cursor into a list, preserving order.
    pub async fn collect_all(self) -> DocResult<Vec<Document>> {
        self.inner.try_collect().await
    }
}

impl Stream for DocumentCursor {
    type Item = DocResult<Document>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

impl std::fmt::Debug for DocumentCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentCursor").finish_non_exhaustive()
    }
}

/// Collection operations the query builder delegates to.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Find documents, applying projection, sort, skip and limit.
    async fn find(&self, collection: &str, request: FindRequest) -> DocResult<DocumentCursor>;

    /// Find at most one document.
    async fn find_one(
        &self,
        collection: &str,
        request: FindOneRequest,
    ) -> DocResult<Option<Document>>;

    /// Count matching documents.
    async fn count(&self, collection: &str, request: CountRequest) -> DocResult<u64>;

    /// Insert one document, returning the identifier the server stored.
    async fn insert(&self, collection: &str, request: InsertRequest) -> DocResult<Bson>;

    /// Update or replace matching documents.
    async fn update(&self, collection: &str, request: UpdateRequest) -> DocResult<UpdateSummary>;

    /// Remove matching documents, returning how many were deleted.
    async fn remove(&self, collection: &str, request: DeleteRequest) -> DocResult<u64>;
}

/// [`DocumentStore`] backed by a MongoDB database handle.
#[derive(Clone, Debug)]
pub struct MongoStore {
    database: Database,
}

impl MongoStore {
    /// Create a store over a database handle.
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Get the underlying database.
    pub fn database(&self) -> &Database {
        &self.database
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.database.collection(name)
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn find(&self, collection: &str, request: FindRequest) -> DocResult<DocumentCursor> {
        trace!(collection = %collection, "find");

        let mut options = FindOptions::default();
        options.projection = request.projection;
        options.sort = request.sort;
        options.limit = Some(request.limit);
        options.skip = Some(request.skip);

        let cursor = self
            .collection(collection)
            .find(request.filter, options)
            .await
            .map_err(DocketError::from_driver_read)?;

        Ok(DocumentCursor::new(
            cursor.map_err(DocketError::from_driver_read),
        ))
    }

    async fn find_one(
        &self,
        collection: &str,
        request: FindOneRequest,
    ) -> DocResult<Option<Document>> {
        trace!(collection = %collection, "find_one");

        let mut options = FindOneOptions::default();
        options.projection = request.projection;

        self.collection(collection)
            .find_one(request.filter, options)
            .await
            .map_err(DocketError::from_driver_read)
    }

    async fn count(&self, collection: &str, request: CountRequest) -> DocResult<u64> {
        trace!(collection = %collection, "count");

        let mut options = CountOptions::default();
        if let Some(window) = request.window {
            options.skip = Some(window.skip);
            options.limit = u64::try_from(window.limit).ok();
        }

        self.collection(collection)
            .count_documents(request.filter, options)
            .await
            .map_err(DocketError::from_driver_read)
    }

    async fn insert(&self, collection: &str, request: InsertRequest) -> DocResult<Bson> {
        trace!(collection = %collection, "insert");

        let mut options = InsertOneOptions::default();
        options.write_concern = Some(request.write_concern);

        let result = self
            .collection(collection)
            .insert_one(request.document, options)
            .await
            .map_err(DocketError::from_driver_write)?;

        Ok(result.inserted_id)
    }

    async fn update(&self, collection: &str, request: UpdateRequest) -> DocResult<UpdateSummary> {
        trace!(collection = %collection, scope = ?request.scope, "update");

        let collection = self.collection(collection);
        let result = match (request.update, request.scope) {
            (UpdateDocument::Replacement(replacement), _) => {
                collection
                    .replace_one(
                        request.filter,
                        replacement,
                        replace_options(request.options),
                    )
                    .await
            }
            (UpdateDocument::Set(update) | UpdateDocument::Operators(update), WriteScope::One) => {
                collection
                    .update_one(request.filter, update, request.options)
                    .await
            }
            (UpdateDocument::Set(update) | UpdateDocument::Operators(update), WriteScope::Many) => {
                collection
                    .update_many(request.filter, update, request.options)
                    .await
            }
        }
        .map_err(DocketError::from_driver_write)?;

        Ok(UpdateSummary {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn remove(&self, collection: &str, request: DeleteRequest) -> DocResult<u64> {
        trace!(collection = %collection, scope = ?request.scope, "remove");

        let mut options = DeleteOptions::default();
        options.write_concern = Some(request.write_concern);

        let collection = self.collection(collection);
        let result = match request.scope {
            WriteScope::One => collection.delete_one(request.filter, options).await,
            WriteScope::Many => collection.delete_many(request.filter, options).await,
        }
        .map_err(DocketError::from_driver_write)?;

        Ok(result.deleted_count)
    }
}

/// Carry the options a replacement shares with an update.
fn replace_options(options: UpdateOptions) -> ReplaceOptions {
    let mut replace = ReplaceOptions::default();
    replace.upsert = options.upsert;
    replace.bypass_document_validation = options.bypass_document_validation;
    replace.collation = options.collation;
    replace.hint = options.hint;
    replace.write_concern = options.write_concern;
    replace
}
