//! Reserved MongoDB keys used when translating builder calls.

/// Logical OR of sub-filters.
pub const OR: &str = "$or";
/// Value is one of the listed values.
pub const IN: &str = "$in";
/// Array contains every listed value.
pub const ALL: &str = "$all";
/// Value is none of the listed values.
pub const NOT_IN: &str = "$nin";
/// Greater than.
pub const GT: &str = "$gt";
/// Greater than or equal.
pub const GTE: &str = "$gte";
/// Less than.
pub const LT: &str = "$lt";
/// Less than or equal.
pub const LTE: &str = "$lte";
/// Not equal.
pub const NE: &str = "$ne";
/// Geospatial proximity (needs a geospatial index).
pub const NEAR: &str = "$near";
/// Field-level set update.
pub const SET: &str = "$set";

/// Primary key field of every document.
pub const ID_FIELD: &str = "_id";

/// Check whether a top-level key is an operator rather than a field name.
#[inline]
pub fn is_operator(key: &str) -> bool {
    key.starts_with('$')
}
