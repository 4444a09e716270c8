//! # Docket
//!
//! A fluent query builder and executor for document databases.
//!
//! Docket provides:
//! - Chained filter, projection, sort, limit and offset construction
//! - Find, count, insert, update and delete as terminal operations
//! - Automatic reset of the accumulated query after each terminal operation
//! - Durable writes by default
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use docket::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), docket::DocketError> {
//!     let mut db = docket::connect(ConnectionConfig::new("localhost", "cooking")).await?;
//!
//!     let soups = db
//!         .like("name", "soup", "i", true, true)
//!         .order_by(doc! { "rating": -1 })
//!         .limit(20)
//!         .get("recipes")
//!         .await?;
//!
//!     db.where_(doc! { "name": "Old Soup" }).delete("recipes").await?;
//!
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// MongoDB driver: builder, store, client and configuration.
pub mod mongodb {
    pub use docket_mongodb::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use docket_mongodb::prelude::*;
}

// Re-export key types at the crate root
pub use docket_mongodb::{
    ConnectionConfig, DocResult, DocketError, DocumentCursor, DocumentStore, MongoClient,
    QueryBuilder, connect, logging,
};
