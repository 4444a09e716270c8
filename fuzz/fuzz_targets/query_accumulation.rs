//! Fuzz target for query accumulation.
//!
//! Drives arbitrary chains of builder calls and translates the result into
//! store requests. None of it may panic.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_query_accumulation
//! ```

#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use async_trait::async_trait;
use docket::mongodb::request::{
    CountRequest, DeleteRequest, FindOneRequest, FindRequest, InsertRequest, UpdateRequest,
    UpdateSummary,
};
use docket::mongodb::{Bson, Document};
use docket::{DocResult, DocumentCursor, DocumentStore, QueryBuilder};
use libfuzzer_sys::fuzz_target;

struct NoopStore;

#[async_trait]
impl DocumentStore for NoopStore {
    async fn find(&self, _: &str, _: FindRequest) -> DocResult<DocumentCursor> {
        Ok(DocumentCursor::from_documents(Vec::new()))
    }

    async fn find_one(&self, _: &str, _: FindOneRequest) -> DocResult<Option<Document>> {
        Ok(None)
    }

    async fn count(&self, _: &str, _: CountRequest) -> DocResult<u64> {
        Ok(0)
    }

    async fn insert(&self, _: &str, _: InsertRequest) -> DocResult<Bson> {
        Ok(Bson::Null)
    }

    async fn update(&self, _: &str, _: UpdateRequest) -> DocResult<UpdateSummary> {
        Ok(UpdateSummary::default())
    }

    async fn remove(&self, _: &str, _: DeleteRequest) -> DocResult<u64> {
        Ok(0)
    }
}

/// A fuzzable scalar.
#[derive(Debug, Arbitrary, Clone)]
enum FuzzValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl From<FuzzValue> for Bson {
    fn from(val: FuzzValue) -> Self {
        match val {
            FuzzValue::Null => Bson::Null,
            FuzzValue::Bool(b) => Bson::Boolean(b),
            FuzzValue::Int(i) => Bson::Int64(i),
            FuzzValue::Float(f) => Bson::Double(f),
            FuzzValue::String(s) => Bson::String(s),
        }
    }
}

fn pairs(items: Vec<(String, FuzzValue)>) -> Document {
    items
        .into_iter()
        .take(10)
        .map(|(k, v)| (k, Bson::from(v)))
        .collect()
}

/// One chained builder call.
#[derive(Debug, Arbitrary)]
enum FuzzCall {
    Select(Vec<String>, Vec<String>),
    Where(Vec<(String, FuzzValue)>),
    OrWhere(Vec<(String, FuzzValue)>),
    In(String, Vec<FuzzValue>),
    All(String, Vec<FuzzValue>),
    NotIn(String, Vec<FuzzValue>),
    Gt(String, FuzzValue),
    Lt(String, FuzzValue),
    Between(String, FuzzValue, FuzzValue),
    Ne(String, FuzzValue),
    Like(String, String, String, bool, bool),
    OrderBy(Vec<(String, FuzzValue)>),
    Limit(FuzzValue),
    Offset(FuzzValue),
    Reset,
}

impl FuzzCall {
    fn apply(self, qb: &mut QueryBuilder<NoopStore>) {
        match self {
            FuzzCall::Select(includes, excludes) => {
                qb.select(includes, excludes);
            }
            FuzzCall::Where(items) => {
                qb.where_(pairs(items));
            }
            FuzzCall::OrWhere(items) => {
                qb.or_where(pairs(items));
            }
            FuzzCall::In(field, vals) => {
                qb.where_in(&field, vals.into_iter().take(20));
            }
            FuzzCall::All(field, vals) => {
                qb.where_in_all(&field, vals.into_iter().take(20));
            }
            FuzzCall::NotIn(field, vals) => {
                qb.where_not_in(&field, vals.into_iter().take(20));
            }
            FuzzCall::Gt(field, val) => {
                qb.where_gt(&field, val);
            }
            FuzzCall::Lt(field, val) => {
                qb.where_lt(&field, val);
            }
            FuzzCall::Between(field, x, y) => {
                qb.where_between(&field, x, y);
            }
            FuzzCall::Ne(field, val) => {
                qb.where_ne(&field, val);
            }
            FuzzCall::Like(field, value, flags, start, end) => {
                qb.like(&field, &value, &flags, start, end);
            }
            FuzzCall::OrderBy(items) => {
                qb.order_by(pairs(items));
            }
            FuzzCall::Limit(val) => {
                qb.limit(val);
            }
            FuzzCall::Offset(val) => {
                qb.offset(val);
            }
            FuzzCall::Reset => {
                qb.reset();
            }
        }
    }
}

fuzz_target!(|data: &[u8]| {
    let mut unstructured = Unstructured::new(data);
    let mut qb = QueryBuilder::with_store(NoopStore);

    if let Ok(calls) = Vec::<FuzzCall>::arbitrary(&mut unstructured) {
        for call in calls.into_iter().take(50) {
            call.apply(&mut qb);
        }
    }

    let state = qb.state();
    assert!(state.limit() >= 1);

    let _ = state.find_request();
    let _ = state.find_one_request();
    let _ = state.count_request(true);
    let _ = format!("{:?}", state);
});
