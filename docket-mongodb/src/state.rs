//! Accumulated query state.

use bson::Document;

use crate::filter::FilterDocument;
use crate::request::{CountRequest, CountWindow, FindOneRequest, FindRequest};

/// Default limit: large enough to mean "unbounded".
pub const DEFAULT_LIMIT: i64 = 999_999;

/// State accumulated by builder calls and consumed by one terminal operation.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState {
    pub(crate) projection: Document,
    pub(crate) filter: FilterDocument,
    pub(crate) sort: Document,
    pub(crate) limit: i64,
    pub(crate) offset: u64,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            projection: Document::new(),
            filter: FilterDocument::new(),
            sort: Document::new(),
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl QueryState {
    /// Field name to inclusion flag (`1` include, `0` exclude).
    pub fn projection(&self) -> &Document {
        &self.projection
    }

    /// The filter document.
    pub fn filter(&self) -> &Document {
        self.filter.as_document()
    }

    /// Field name to direction (`1` or `-1`) in precedence order.
    pub fn sort(&self) -> &Document {
        &self.sort
    }

    /// Maximum number of documents returned.
    pub fn limit(&self) -> i64 {
        self.limit
    }

    /// Number of matching documents skipped.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Check if nothing has been accumulated since the last reset.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Translate into find parameters.
    pub fn find_request(&self) -> FindRequest {
        FindRequest {
            filter: self.filter().clone(),
            projection: non_empty(&self.projection),
            sort: non_empty(&self.sort),
            limit: self.limit,
            skip: self.offset,
        }
    }

    /// Translate into single-document find parameters.
    ///
    /// Only the filter and projection apply; sort, limit and offset do not.
    pub fn find_one_request(&self) -> FindOneRequest {
        FindOneRequest {
            filter: self.filter().clone(),
            projection: non_empty(&self.projection),
        }
    }

    /// Translate into count parameters.
    ///
    /// With `found_only` the count covers the skip/limit window; otherwise it
    /// covers every matching document.
    pub fn count_request(&self, found_only: bool) -> CountRequest {
        CountRequest {
            filter: self.filter().clone(),
            window: found_only.then_some(CountWindow {
                skip: self.offset,
                limit: self.limit,
            }),
        }
    }
}

fn non_empty(doc: &Document) -> Option<Document> {
    (!doc.is_empty()).then(|| doc.clone())
}
