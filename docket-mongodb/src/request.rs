//! Operation parameters produced from an accumulated query.
//!
//! Each terminal operation translates the builder state into one of these
//! plain structs and hands it to a [`DocumentStore`](crate::store::DocumentStore).

use bson::{Bson, Document};
use mongodb::options::{UpdateOptions, WriteConcern};

use crate::error::{DocResult, DocketError};
use crate::operators;

/// Write concern used by every write: acknowledged once the journal is on disk.
pub fn durable_write_concern() -> WriteConcern {
    WriteConcern::builder().journal(true).build()
}

/// How many documents a write may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteScope {
    /// Only the first matching document.
    One,
    /// Every matching document.
    Many,
}

/// Parameters of a find.
#[derive(Debug, Clone, PartialEq)]
pub struct FindRequest {
    /// Match predicates.
    pub filter: Document,
    /// Field inclusion/exclusion, `None` for whole documents.
    pub projection: Option<Document>,
    /// Sort specification in precedence order, `None` for natural order.
    pub sort: Option<Document>,
    /// Maximum number of documents.
    pub limit: i64,
    /// Number of matching documents to skip.
    pub skip: u64,
}

/// Parameters of a single-document find.
#[derive(Debug, Clone, PartialEq)]
pub struct FindOneRequest {
    /// Match predicates.
    pub filter: Document,
    /// Field inclusion/exclusion, `None` for whole documents.
    pub projection: Option<Document>,
}

/// Window applied to a count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountWindow {
    /// Number of matching documents to skip.
    pub skip: u64,
    /// Maximum number of documents counted.
    pub limit: i64,
}

/// Parameters of a count.
#[derive(Debug, Clone, PartialEq)]
pub struct CountRequest {
    /// Match predicates.
    pub filter: Document,
    /// Skip/limit window, `None` to count the full match set.
    pub window: Option<CountWindow>,
}

/// Parameters of an insert.
#[derive(Debug, Clone)]
pub struct InsertRequest {
    /// Document to store.
    pub document: Document,
    /// Always [`durable_write_concern`].
    pub write_concern: WriteConcern,
}

/// The modification an update applies.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateDocument {
    /// `{ "$set": data }`: only the named fields change.
    Set(Document),
    /// Caller-supplied update operators, applied verbatim.
    Operators(Document),
    /// A plain document that replaces the matched document.
    Replacement(Document),
}

impl UpdateDocument {
    /// Classify caller data.
    ///
    /// Non-literal data is wrapped in `$set`. Literal data is passed through
    /// as operators when its keys are operators and as a replacement
    /// otherwise.
    pub fn from_data(data: Document, literal: bool) -> Self {
        if !literal {
            let mut set = Document::new();
            set.insert(operators::SET, data);
            return Self::Set(set);
        }

        if data.keys().all(|key| operators::is_operator(key)) {
            Self::Operators(data)
        } else {
            Self::Replacement(data)
        }
    }

    /// The document sent to the server.
    pub fn as_document(&self) -> &Document {
        match self {
            Self::Set(doc) | Self::Operators(doc) | Self::Replacement(doc) => doc,
        }
    }
}

/// Parameters of an update.
#[derive(Debug, Clone)]
pub struct UpdateRequest {
    /// Match predicates.
    pub filter: Document,
    /// The modification.
    pub update: UpdateDocument,
    /// Single or multi-document update.
    pub scope: WriteScope,
    /// Caller options with the write concern forced durable.
    pub options: UpdateOptions,
}

impl UpdateRequest {
    /// Build an update, forcing a durable write concern onto `options`.
    pub fn new(
        filter: Document,
        update: UpdateDocument,
        scope: WriteScope,
        mut options: UpdateOptions,
    ) -> DocResult<Self> {
        if scope == WriteScope::Many && matches!(update, UpdateDocument::Replacement(_)) {
            return Err(DocketError::validation(
                "a replacement document can only update a single document",
            ));
        }

        options.write_concern = Some(durable_write_concern());
        Ok(Self {
            filter,
            update,
            scope,
            options,
        })
    }
}

/// Summary of an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateSummary {
    /// Documents matched by the filter.
    pub matched: u64,
    /// Documents actually changed.
    pub modified: u64,
}

/// Parameters of a delete.
#[derive(Debug, Clone)]
pub struct DeleteRequest {
    /// Match predicates.
    pub filter: Document,
    /// Single or multi-document delete.
    pub scope: WriteScope,
    /// Always [`durable_write_concern`].
    pub write_concern: WriteConcern,
}

/// The identifier a document carries, if any.
///
/// A null `_id` counts as no identifier.
pub fn document_id(document: &Document) -> Option<Bson> {
    document
        .get(operators::ID_FIELD)
        .filter(|id| !matches!(id, Bson::Null))
        .cloned()
}
