//! Filter accumulation.
//!
//! [`FilterDocument`] wraps the filter document built up by a query session
//! and applies the merge rules of the builder methods:
//!
//! - equality sets overwrite whatever the field held before
//! - operator sets merge into the field's operator document, creating it
//!   when the field is absent or holds a non-document value
//! - `$or` terms are appended, never cleared
//! - pattern matches overwrite the field
//!
//! ```rust,ignore
//! use docket_mongodb::filter::FilterDocument;
//!
//! let mut filter = FilterDocument::new();
//! filter.set_operator("age", "$gt", 18);
//! filter.set_operator("age", "$lt", 65);
//!
//! // Produces: { "age": { "$gt": 18, "$lt": 65 } }
//! ```

use bson::{Bson, Document, Regex};

use crate::operators;

/// Accumulated filter document for one query session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterDocument {
    doc: Document,
}

impl FilterDocument {
    /// Create a new empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a plain equality condition, replacing any previous entry.
    pub fn set_equality(&mut self, field: impl Into<String>, value: impl Into<Bson>) {
        self.doc.insert(field.into(), value.into());
    }

    /// Append one `{field: value}` term to the `$or` list.
    pub fn push_or(&mut self, field: impl Into<String>, value: impl Into<Bson>) {
        let mut term = Document::new();
        term.insert(field.into(), value.into());

        match self.doc.get_mut(operators::OR) {
            Some(Bson::Array(terms)) => terms.push(Bson::Document(term)),
            _ => {
                self.doc
                    .insert(operators::OR, vec![Bson::Document(term)]);
            }
        }
    }

    /// Set one operator on a field, merging with its other operators.
    ///
    /// A field that is absent or holds a non-document value starts from an
    /// empty operator document.
    pub fn set_operator(&mut self, field: &str, operator: &str, operand: impl Into<Bson>) {
        let mut ops = match self.doc.get_mut(field) {
            Some(Bson::Document(ops)) => std::mem::take(ops),
            _ => Document::new(),
        };
        ops.insert(operator, operand.into());
        self.doc.insert(field, ops);
    }

    /// Set a pattern match on a field, replacing any previous entry.
    pub fn set_pattern(&mut self, field: impl Into<String>, pattern: Regex) {
        self.doc
            .insert(field.into(), Bson::RegularExpression(pattern));
    }

    /// The filter as a BSON document.
    pub fn as_document(&self) -> &Document {
        &self.doc
    }

    /// Consume into a BSON document.
    pub fn into_document(self) -> Document {
        self.doc
    }

    /// Check if the filter is empty (matches all documents).
    pub fn is_empty(&self) -> bool {
        self.doc.is_empty()
    }
}

impl From<FilterDocument> for Document {
    fn from(filter: FilterDocument) -> Self {
        filter.doc
    }
}

/// Build the pattern used by `like`.
///
/// The value is trimmed and escaped so it matches literally. Disabling a
/// wildcard anchors that end of the match. Flags are sorted because BSON
/// requires regex options in alphabetical order.
pub fn like_pattern(value: &str, flags: &str, start_wildcard: bool, end_wildcard: bool) -> Regex {
    let mut pattern = regex_lite::escape(value.trim());
    if !start_wildcard {
        pattern.insert(0, '^');
    }
    if !end_wildcard {
        pattern.push('$');
    }

    let mut options: Vec<char> = flags.chars().collect();
    options.sort_unstable();
    options.dedup();

    Regex {
        pattern,
        options: options.into_iter().collect(),
    }
}
