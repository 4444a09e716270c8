//! Fluent query builder.
//!
//! A [`QueryBuilder`] accumulates a projection, filter, sort, limit and
//! offset through chained calls, then executes them as one terminal
//! operation. A successful terminal operation clears the accumulated state
//! so the next chain starts empty; the builder and its store stay alive.
//!
//! ```rust,ignore
//! use docket_mongodb::{connect, ConnectionConfig, doc};
//!
//! let mut db = connect(
//!     ConnectionConfig::builder()
//!         .hostname("localhost")
//!         .database("cooking")
//!         .build()?,
//! )
//! .await?;
//!
//! let recipes = db
//!     .select(["name", "time"], ())
//!     .where_gte("rating", 4)
//!     .order_by(doc! { "rating": "desc", "name": "asc" })
//!     .limit(10)
//!     .get("recipes")
//!     .await?;
//! ```
//!
//! A builder holds mutable state: give each concurrent logical query its own
//! builder rather than sharing one.

use bson::{Bson, Document};
use mongodb::options::UpdateOptions;
use tracing::debug;

use crate::error::{DocResult, DocketError};
use crate::filter::like_pattern;
use crate::operators;
use crate::request::{
    DeleteRequest, InsertRequest, UpdateDocument, UpdateRequest, UpdateSummary, WriteScope,
    document_id, durable_write_concern,
};
use crate::state::QueryState;
use crate::store::{DocumentCursor, DocumentStore, MongoStore};
use crate::value::{IntoFieldList, SortDirection, count_from};

/// Chained query construction over a [`DocumentStore`].
#[derive(Debug)]
pub struct QueryBuilder<S: DocumentStore = MongoStore> {
    store: S,
    state: QueryState,
}

impl<S: DocumentStore> QueryBuilder<S> {
    /// Start a session over a custom store.
    ///
    /// Applications should get sessions from
    /// [`MongoClient::query`](crate::client::MongoClient::query) or
    /// [`connect`](crate::connect), which bind the builder to a connected
    /// database. This constructor exists for plugging in another
    /// [`DocumentStore`], such as an in-memory store in tests, and is
    /// hidden from the documentation.
    #[doc(hidden)]
    pub fn with_store(store: S) -> Self {
        Self {
            store,
            state: QueryState::default(),
        }
    }

    /// Get the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The state accumulated since the last reset.
    pub fn state(&self) -> &QueryState {
        &self.state
    }

    /// Discard all accumulated state.
    pub fn reset(&mut self) -> &mut Self {
        self.state = QueryState::default();
        self
    }

    // ==================== Projection ====================

    /// Choose which fields to include, or which to exclude.
    ///
    /// Includes and excludes cannot be mixed: when `includes` is non-empty
    /// every include is set to `1` and `excludes` is ignored. Only when
    /// `includes` is empty are the excludes set to `0`. Either argument may be
    /// one field name, a list of names, or `()`.
    pub fn select(&mut self, includes: impl IntoFieldList, excludes: impl IntoFieldList) -> &mut Self {
        let includes = includes.into_fields();
        let (fields, flag) = if includes.is_empty() {
            (excludes.into_fields(), 0)
        } else {
            (includes, 1)
        };

        for field in fields {
            self.state.projection.insert(field, flag);
        }
        self
    }

    // ==================== Filters ====================

    /// Match fields by equality, replacing earlier conditions on them.
    pub fn where_(&mut self, conditions: Document) -> &mut Self {
        for (field, value) in conditions {
            self.state.filter.set_equality(field, value);
        }
        self
    }

    /// Add alternatives: each pair becomes one `$or` term, in order.
    ///
    /// Repeated calls extend the same `$or` list.
    pub fn or_where(&mut self, conditions: Document) -> &mut Self {
        for (field, value) in conditions {
            self.state.filter.push_or(field, value);
        }
        self
    }

    /// Field value is one of `values`.
    pub fn where_in<I, V>(&mut self, field: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Bson>,
    {
        self.set_operator(field, operators::IN, to_array(values))
    }

    /// Array field contains all of `values`.
    pub fn where_in_all<I, V>(&mut self, field: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Bson>,
    {
        self.set_operator(field, operators::ALL, to_array(values))
    }

    /// Field value is none of `values`.
    pub fn where_not_in<I, V>(&mut self, field: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Bson>,
    {
        self.set_operator(field, operators::NOT_IN, to_array(values))
    }

    /// Field value is greater than `x`.
    pub fn where_gt(&mut self, field: &str, x: impl Into<Bson>) -> &mut Self {
        self.set_operator(field, operators::GT, x)
    }

    /// Field value is greater than or equal to `x`.
    pub fn where_gte(&mut self, field: &str, x: impl Into<Bson>) -> &mut Self {
        self.set_operator(field, operators::GTE, x)
    }

    /// Field value is less than `x`.
    pub fn where_lt(&mut self, field: &str, x: impl Into<Bson>) -> &mut Self {
        self.set_operator(field, operators::LT, x)
    }

    /// Field value is less than or equal to `x`.
    pub fn where_lte(&mut self, field: &str, x: impl Into<Bson>) -> &mut Self {
        self.set_operator(field, operators::LTE, x)
    }

    /// Field value is between `x` and `y`, both inclusive.
    pub fn where_between(&mut self, field: &str, x: impl Into<Bson>, y: impl Into<Bson>) -> &mut Self {
        self.set_operator(field, operators::GTE, x)
            .set_operator(field, operators::LTE, y)
    }

    /// Field value is strictly between `x` and `y`.
    pub fn where_between_ne(
        &mut self,
        field: &str,
        x: impl Into<Bson>,
        y: impl Into<Bson>,
    ) -> &mut Self {
        self.set_operator(field, operators::GT, x)
            .set_operator(field, operators::LT, y)
    }

    /// Field value is not equal to `x`.
    pub fn where_ne(&mut self, field: &str, x: impl Into<Bson>) -> &mut Self {
        self.set_operator(field, operators::NE, x)
    }

    /// Documents nearest to `coordinates`.
    ///
    /// The collection needs a geospatial index on `field`.
    pub fn where_near(&mut self, field: &str, coordinates: impl Into<Bson>) -> &mut Self {
        self.set_operator(field, operators::NEAR, coordinates)
    }

    /// Match a string field against `value` as literal text.
    ///
    /// `value` is trimmed and escaped. `flags` are regex options (`i`
    /// case-insensitive, `m` multiline, `x` extended, `s` dotall, `u`
    /// unicode). Passing `false` for `start_wildcard` anchors the match to the
    /// start of the value, and `false` for `end_wildcard` anchors it to the
    /// end. Replaces any earlier condition on the field.
    pub fn like(
        &mut self,
        field: &str,
        value: &str,
        flags: &str,
        start_wildcard: bool,
        end_wildcard: bool,
    ) -> &mut Self {
        let pattern = like_pattern(value, flags, start_wildcard, end_wildcard);
        self.state.filter.set_pattern(field.trim(), pattern);
        self
    }

    /// Case-insensitive substring match; `like` with its default arguments.
    pub fn contains(&mut self, field: &str, value: &str) -> &mut Self {
        self.like(field, value, "i", true, true)
    }

    fn set_operator(&mut self, field: &str, operator: &str, operand: impl Into<Bson>) -> &mut Self {
        self.state.filter.set_operator(field, operator, operand);
        self
    }

    // ==================== Ordering & pagination ====================

    /// Sort by the given fields, first entry first.
    ///
    /// `-1`, `false` and `"desc"` (any case) sort descending; any other value
    /// sorts ascending.
    pub fn order_by(&mut self, fields: Document) -> &mut Self {
        for (field, value) in fields {
            let direction = SortDirection::from(&value);
            self.state.sort.insert(field, direction);
        }
        self
    }

    /// Return at most `x` documents.
    ///
    /// Values that are null, non-numeric or below one are silently ignored
    /// and leave the current limit unchanged. Fractions are truncated.
    pub fn limit(&mut self, x: impl Into<Bson>) -> &mut Self {
        if let Some(limit) = count_from(&x.into()) {
            self.state.limit = limit;
        }
        self
    }

    /// Skip the first `x` matching documents.
    ///
    /// Values that are null, non-numeric or below one are silently ignored,
    /// so `offset(0)` does not clear an earlier offset; use
    /// [`reset`](Self::reset) for that.
    pub fn offset(&mut self, x: impl Into<Bson>) -> &mut Self {
        if let Some(offset) = count_from(&x.into()) {
            // count_from only yields positive values
            self.state.offset = offset.unsigned_abs();
        }
        self
    }

    // ==================== Reads ====================

    /// Find matching documents as a lazy cursor.
    pub async fn get_cursor(&mut self, collection: &str) -> DocResult<DocumentCursor> {
        require_collection(collection, "retrieve documents")?;

        let request = self.state.find_request();
        debug!(
            collection = %collection,
            filter = %request.filter,
            limit = request.limit,
            skip = request.skip,
            "Executing find"
        );

        let cursor = self.store.find(collection, request).await?;
        self.reset();
        Ok(cursor)
    }

    /// Find matching documents and collect them in order.
    pub async fn get(&mut self, collection: &str) -> DocResult<Vec<Document>> {
        self.get_cursor(collection).await?.collect_all().await
    }

    /// Shorthand for `where_(conditions).limit(limit).get(collection)`.
    ///
    /// Pass [`DEFAULT_LIMIT`](crate::state::DEFAULT_LIMIT) for no practical
    /// limit.
    pub async fn get_where(
        &mut self,
        collection: &str,
        conditions: Document,
        limit: impl Into<Bson>,
    ) -> DocResult<Vec<Document>> {
        self.where_(conditions).limit(limit).get(collection).await
    }

    /// Find the first matching document.
    ///
    /// Only the filter and projection apply.
    pub async fn get_one(&mut self, collection: &str) -> DocResult<Option<Document>> {
        require_collection(collection, "retrieve documents")?;

        let request = self.state.find_one_request();
        debug!(collection = %collection, filter = %request.filter, "Executing find_one");

        let document = self.store.find_one(collection, request).await?;
        self.reset();
        Ok(document)
    }

    /// Count matching documents.
    ///
    /// With `found_only` the count is limited to the offset/limit window;
    /// otherwise every match is counted.
    pub async fn count(&mut self, collection: &str, found_only: bool) -> DocResult<u64> {
        require_collection(collection, "count documents")?;

        let request = self.state.count_request(found_only);
        debug!(
            collection = %collection,
            filter = %request.filter,
            found_only,
            "Executing count"
        );

        let count = self.store.count(collection, request).await?;
        self.reset();
        Ok(count)
    }

    // ==================== Writes ====================

    /// Insert a document with a durable write.
    ///
    /// Returns the document's own `_id` when it carries one, `None`
    /// otherwise. The accumulated query state is left as it is.
    pub async fn insert(&mut self, collection: &str, document: Document) -> DocResult<Option<Bson>> {
        require_collection(collection, "insert documents")?;
        if document.is_empty() {
            return Err(DocketError::validation("nothing to insert: document is empty"));
        }

        debug!(collection = %collection, "Executing insert");

        let id = document_id(&document);
        let request = InsertRequest {
            document,
            write_concern: durable_write_concern(),
        };
        self.store.insert(collection, request).await?;
        Ok(id)
    }

    /// Update the first matching document with a durable write.
    ///
    /// Without `literal`, `data` is applied as `{ "$set": data }`. With
    /// `literal`, operator documents are applied as given and plain documents
    /// replace the match. The write concern in `options` is always replaced.
    pub async fn update(
        &mut self,
        collection: &str,
        data: Document,
        options: UpdateOptions,
        literal: bool,
    ) -> DocResult<UpdateSummary> {
        self.execute_update(collection, data, options, literal, WriteScope::One)
            .await
    }

    /// Update every matching document with a durable write.
    pub async fn update_all(
        &mut self,
        collection: &str,
        data: Document,
        literal: bool,
    ) -> DocResult<UpdateSummary> {
        self.execute_update(
            collection,
            data,
            UpdateOptions::default(),
            literal,
            WriteScope::Many,
        )
        .await
    }

    async fn execute_update(
        &mut self,
        collection: &str,
        data: Document,
        options: UpdateOptions,
        literal: bool,
        scope: WriteScope,
    ) -> DocResult<UpdateSummary> {
        require_collection(collection, "update documents")?;
        if data.is_empty() {
            return Err(DocketError::validation("nothing to update: data is empty"));
        }

        let request = UpdateRequest::new(
            self.state.filter().clone(),
            UpdateDocument::from_data(data, literal),
            scope,
            options,
        )?;
        debug!(
            collection = %collection,
            filter = %request.filter,
            scope = ?scope,
            "Executing update"
        );

        let summary = self.store.update(collection, request).await?;
        self.reset();
        Ok(summary)
    }

    /// Delete the first matching document with a durable write.
    pub async fn delete(&mut self, collection: &str) -> DocResult<u64> {
        self.execute_delete(collection, WriteScope::One).await
    }

    /// Delete every matching document with a durable write.
    pub async fn delete_all(&mut self, collection: &str) -> DocResult<u64> {
        self.execute_delete(collection, WriteScope::Many).await
    }

    async fn execute_delete(&mut self, collection: &str, scope: WriteScope) -> DocResult<u64> {
        require_collection(collection, "delete documents")?;

        let request = DeleteRequest {
            filter: self.state.filter().clone(),
            scope,
            write_concern: durable_write_concern(),
        };
        debug!(
            collection = %collection,
            filter = %request.filter,
            scope = ?scope,
            "Executing delete"
        );

        let deleted = self.store.remove(collection, request).await?;
        self.reset();
        Ok(deleted)
    }
}

fn require_collection(collection: &str, action: &str) -> DocResult<()> {
    if collection.trim().is_empty() {
        return Err(DocketError::validation(format!(
            "a collection name is required to {}",
            action
        )));
    }
    Ok(())
}

fn to_array<I, V>(values: I) -> Bson
where
    I: IntoIterator<Item = V>,
    V: Into<Bson>,
{
    Bson::Array(values.into_iter().map(Into::into).collect())
}
