//! MongoDB client wrapper: connection bootstrap and administrative passthroughs.

use std::sync::Arc;

use bson::{Bson, Document, doc};
use futures::TryStreamExt;
use mongodb::{Client, Collection, Database, IndexModel};
use mongodb::options::IndexOptions;
use tracing::{debug, info};

use crate::builder::QueryBuilder;
use crate::config::ConnectionConfig;
use crate::error::{DocResult, DocketError};
use crate::store::MongoStore;
use crate::value::SortDirection;

/// A connected MongoDB client bound to one database.
///
/// The driver pools connections internally, so the client is cheap to clone
/// and every [`QueryBuilder`] it hands out shares the same pool.
#[derive(Clone, Debug)]
pub struct MongoClient {
    client: Client,
    database: Database,
    config: Arc<ConnectionConfig>,
}

impl MongoClient {
    /// Connect using the given configuration.
    ///
    /// A missing host or database is a validation error. The server is pinged
    /// before returning, so an unreachable or rejecting server is a
    /// connection error here rather than on the first query.
    pub async fn connect(config: ConnectionConfig) -> DocResult<Self> {
        let options = config.to_client_options().await?;

        let client = Client::with_options(options)
            .map_err(|e| DocketError::connection(format!("unable to connect to MongoDB: {}", e)))?;

        let database = client.database(&config.database);

        database
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| DocketError::connection(format!("unable to reach MongoDB: {}", e)))?;

        info!(
            hostname = %config.hostname,
            database = %config.database,
            "MongoDB client created"
        );

        Ok(Self {
            client,
            database,
            config: Arc::new(config),
        })
    }

    /// Start a query session on this client's database.
    pub fn query(&self) -> QueryBuilder<MongoStore> {
        QueryBuilder::with_store(MongoStore::new(self.database.clone()))
    }

    /// Get a collection handle for operations the builder does not cover.
    pub fn collection(&self, name: &str) -> Collection<Document> {
        self.database.collection(name)
    }

    /// Get the underlying database.
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Get the underlying MongoDB client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Get the configuration.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Check if the client is healthy by pinging the server.
    pub async fn is_healthy(&self) -> bool {
        self.database
            .run_command(doc! { "ping": 1 }, None)
            .await
            .is_ok()
    }

    /// Drop a whole database.
    pub async fn drop_database(&self, name: &str) -> DocResult<()> {
        require_name(name, "a database name is required to drop a database")?;
        debug!(database = %name, "Dropping database");

        self.client
            .database(name)
            .drop(None)
            .await
            .map_err(DocketError::from_driver_write)
    }

    /// Drop a collection.
    pub async fn drop_collection(&self, name: &str) -> DocResult<()> {
        require_name(name, "a collection name is required to drop a collection")?;
        debug!(collection = %name, "Dropping collection");

        self.collection(name)
            .drop(None)
            .await
            .map_err(DocketError::from_driver_write)
    }

    /// Run a database command.
    pub async fn run_command(&self, command: Document) -> DocResult<Document> {
        if command.is_empty() {
            return Err(DocketError::validation("the command document is empty"));
        }

        self.database
            .run_command(command, None)
            .await
            .map_err(DocketError::from_driver_write)
    }

    /// Create an index, returning its name.
    ///
    /// Key directions follow the sort rules: `-1`, `false` and `"desc"`
    /// mean descending, anything else ascending.
    pub async fn add_index(
        &self,
        collection: &str,
        keys: Document,
        options: Option<IndexOptions>,
    ) -> DocResult<String> {
        require_name(collection, "a collection name is required to add an index")?;
        let keys = index_keys(keys)?;
        debug!(collection = %collection, keys = %keys, "Creating index");

        let model = IndexModel::builder().keys(keys).options(options).build();
        let result = self
            .collection(collection)
            .create_index(model, None)
            .await
            .map_err(DocketError::from_driver_write)?;

        Ok(result.index_name)
    }

    /// Drop the index built on `keys`.
    pub async fn remove_index(&self, collection: &str, keys: Document) -> DocResult<()> {
        require_name(collection, "a collection name is required to remove an index")?;
        let name = index_name(&index_keys(keys)?);
        debug!(collection = %collection, index = %name, "Dropping index");

        self.collection(collection)
            .drop_index(name, None)
            .await
            .map_err(DocketError::from_driver_write)
    }

    /// Drop every index except the one on `_id`.
    pub async fn remove_all_indexes(&self, collection: &str) -> DocResult<()> {
        require_name(collection, "a collection name is required to remove indexes")?;
        debug!(collection = %collection, "Dropping all indexes");

        self.collection(collection)
            .drop_indexes(None)
            .await
            .map_err(DocketError::from_driver_write)
    }

    /// List the indexes of a collection.
    pub async fn list_indexes(&self, collection: &str) -> DocResult<Vec<IndexModel>> {
        require_name(collection, "a collection name is required to list indexes")?;

        let cursor = self
            .collection(collection)
            .list_indexes(None)
            .await
            .map_err(DocketError::from_driver_read)?;

        cursor
            .try_collect()
            .await
            .map_err(DocketError::from_driver_read)
    }

    /// Close the client's connections.
    pub async fn close(self) {
        debug!(database = %self.config.database, "Closing MongoDB client");
        self.client.shutdown().await;
    }
}

/// Connect and start a query session in one step.
pub async fn connect(config: ConnectionConfig) -> DocResult<QueryBuilder<MongoStore>> {
    Ok(MongoClient::connect(config).await?.query())
}

fn require_name(name: &str, message: &str) -> DocResult<()> {
    if name.trim().is_empty() {
        return Err(DocketError::validation(message));
    }
    Ok(())
}

/// Normalize index key directions to `1`/`-1`.
pub fn index_keys(keys: Document) -> DocResult<Document> {
    if keys.is_empty() {
        return Err(DocketError::validation("no index keys were specified"));
    }

    Ok(keys
        .into_iter()
        .map(|(field, value)| {
            let direction = SortDirection::from(&value);
            (field, Bson::from(direction))
        })
        .collect())
}

/// The server's default name for an index on `keys`: `field_dir` pairs
/// joined by underscores.
pub fn index_name(keys: &Document) -> String {
    keys.iter()
        .map(|(field, value)| format!("{}_{}", field, value))
        .collect::<Vec<_>>()
        .join("_")
}
