//! # docket-mongodb
//!
//! Fluent query building and execution over MongoDB.
//!
//! This crate provides:
//! - A chainable [`QueryBuilder`] that accumulates projection, filters, sort,
//!   limit and offset
//! - Find, count, insert, update and delete as terminal operations that
//!   consume the accumulated state
//! - Durable (journaled) writes for every insert, update and delete
//! - A [`DocumentStore`] seam so execution can be swapped out
//! - Connection bootstrap from a host/database configuration
//!
//! ## Example
//!
//! ```rust,ignore
//! use docket_mongodb::{ConnectionConfig, connect, doc};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut db = connect(ConnectionConfig::new("localhost", "cooking")).await?;
//!
//!     db.insert("recipes", doc! { "name": "Soup", "rating": 4 }).await?;
//!
//!     let good = db
//!         .where_gte("rating", 4)
//!         .order_by(doc! { "name": "asc" })
//!         .get("recipes")
//!         .await?;
//!
//!     db.where_(doc! { "name": "Soup" })
//!         .update("recipes", doc! { "rating": 5 }, Default::default(), false)
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod client;
pub mod config;
pub mod error;
pub mod filter;
pub mod logging;
pub mod operators;
pub mod request;
pub mod state;
pub mod store;
pub mod value;

pub use bson::oid::ObjectId;
pub use bson::{Bson, Document, Regex, doc};
pub use builder::QueryBuilder;
pub use client::{MongoClient, connect};
pub use config::{ConnectionConfig, ConnectionConfigBuilder};
pub use error::{DocResult, DocketError};
pub use mongodb::options::UpdateOptions;
pub use request::{UpdateSummary, WriteScope};
pub use state::{DEFAULT_LIMIT, QueryState};
pub use store::{DocumentCursor, DocumentStore, MongoStore};
pub use value::{IntoFieldList, SortDirection};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::builder::QueryBuilder;
    pub use crate::client::{MongoClient, connect};
    pub use crate::config::{ConnectionConfig, ConnectionConfigBuilder};
    pub use crate::error::{DocResult, DocketError};
    pub use crate::request::UpdateSummary;
    pub use crate::state::DEFAULT_LIMIT;
    pub use crate::store::{DocumentCursor, DocumentStore, MongoStore};
    pub use bson::oid::ObjectId;
    pub use bson::{Bson, Document, doc};
    pub use mongodb::options::UpdateOptions;
}
