//! Loose value coercion for builder arguments.
//!
//! Builder methods accept anything convertible into [`Bson`] so callers can
//! pass integers, floats, numeric strings or `None` interchangeably. The
//! helpers here decide what those values mean.

use bson::Bson;

/// Sort or index direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Ascending (`1`).
    #[default]
    Ascending,
    /// Descending (`-1`).
    Descending,
}

impl SortDirection {
    /// The value MongoDB expects in sort and index specifications.
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Ascending => 1,
            Self::Descending => -1,
        }
    }
}

impl From<&Bson> for SortDirection {
    fn from(value: &Bson) -> Self {
        if is_descending(value) {
            Self::Descending
        } else {
            Self::Ascending
        }
    }
}

impl From<SortDirection> for Bson {
    fn from(direction: SortDirection) -> Self {
        Bson::Int32(direction.as_i32())
    }
}

/// Check whether a value marks descending order.
///
/// Descending markers are `-1` in any numeric form (including the string
/// `"-1"`), boolean `false`, and `"desc"` in any case. Everything else,
/// including unrecognized values, means ascending.
pub fn is_descending(value: &Bson) -> bool {
    match value {
        Bson::Int32(v) => *v == -1,
        Bson::Int64(v) => *v == -1,
        Bson::Double(v) => *v == -1.0,
        Bson::Boolean(v) => !*v,
        Bson::String(s) => {
            s.eq_ignore_ascii_case("desc") || s.trim().parse::<f64>().is_ok_and(|n| n == -1.0)
        }
        _ => false,
    }
}

/// Coerce a value to a positive count for `limit` and `offset`.
///
/// Returns `None` for null, non-numeric and non-finite values, and for any
/// value that is below one after truncation toward zero.
pub fn count_from(value: &Bson) -> Option<i64> {
    let n = match value {
        Bson::Int32(v) => i64::from(*v),
        Bson::Int64(v) => *v,
        Bson::Double(v) => truncate(*v)?,
        Bson::String(s) => truncate(s.trim().parse::<f64>().ok()?)?,
        _ => return None,
    };
    (n >= 1).then_some(n)
}

fn truncate(v: f64) -> Option<i64> {
    if !v.is_finite() || v < 1.0 || v > i64::MAX as f64 {
        return None;
    }
    Some(v.trunc() as i64)
}

/// Conversion into a list of field names.
///
/// Implemented for a single name, collections of names, and `()` for "no
/// fields", so `select` can take either form.
pub trait IntoFieldList {
    /// Normalize into a list of field names.
    fn into_fields(self) -> Vec<String>;
}

impl IntoFieldList for () {
    fn into_fields(self) -> Vec<String> {
        Vec::new()
    }
}

impl IntoFieldList for &str {
    fn into_fields(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoFieldList for String {
    fn into_fields(self) -> Vec<String> {
        vec![self]
    }
}

impl<T: Into<String>> IntoFieldList for Vec<T> {
    fn into_fields(self) -> Vec<String> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<T: Into<String>, const N: usize> IntoFieldList for [T; N] {
    fn into_fields(self) -> Vec<String> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<T: AsRef<str>> IntoFieldList for &[T] {
    fn into_fields(self) -> Vec<String> {
        self.iter().map(|s| s.as_ref().to_string()).collect()
    }
}
