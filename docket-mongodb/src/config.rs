//! Connection configuration.

use std::collections::HashMap;
use std::time::Duration;

use mongodb::options::ClientOptions;
use serde::Deserialize;

use crate::error::{DocResult, DocketError};

/// Default application name reported to the server.
pub const DEFAULT_APP_NAME: &str = "docket";

/// Connection settings for a query session.
///
/// Loadable from TOML or JSON through serde:
///
/// ```toml
/// hostname = "localhost"
/// database = "cooking"
/// port = 27017
/// replicaset = "rs0"
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Server host name (required).
    pub hostname: String,
    /// Database name (required).
    pub database: String,
    /// User name; used only together with a password.
    pub username: Option<String>,
    /// Password; used only together with a user name.
    pub password: Option<String>,
    /// Server port; the driver default when unset.
    pub port: Option<u16>,
    /// Replica set name.
    #[serde(alias = "replicaset")]
    pub replica_set: Option<String>,
    /// Application name (shown in server logs).
    pub app_name: Option<String>,
    /// Maximum connection pool size.
    pub max_pool_size: Option<u32>,
    /// Connection timeout.
    #[serde(with = "duration_secs")]
    pub connect_timeout: Option<Duration>,
    /// Server selection timeout.
    #[serde(with = "duration_secs")]
    pub server_selection_timeout: Option<Duration>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            hostname: String::new(),
            database: String::new(),
            username: None,
            password: None,
            port: None,
            replica_set: None,
            app_name: Some(DEFAULT_APP_NAME.to_string()),
            max_pool_size: Some(10),
            connect_timeout: Some(Duration::from_secs(10)),
            server_selection_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl ConnectionConfig {
    /// Create a configuration for a host and database.
    pub fn new(hostname: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            database: database.into(),
            ..Self::default()
        }
    }

    /// Create a builder for configuration.
    pub fn builder() -> ConnectionConfigBuilder {
        ConnectionConfigBuilder::new()
    }

    /// Read a loosely-typed key/value configuration.
    ///
    /// Recognized keys: `hostname`, `database`, `username`, `password`,
    /// `port`, `replicaset`. Empty values count as unset.
    pub fn from_map(map: &HashMap<String, String>) -> DocResult<Self> {
        let get = |key: &str| {
            map.get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let port = match get("port") {
            Some(port) => Some(port.parse::<u16>().map_err(|_| {
                DocketError::validation(format!("invalid port '{}'", port))
            })?),
            None => None,
        };

        let config = Self {
            hostname: get("hostname").unwrap_or_default(),
            database: get("database").unwrap_or_default(),
            username: get("username"),
            password: get("password"),
            port,
            replica_set: get("replicaset"),
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document.
    pub fn from_toml(source: &str) -> DocResult<Self> {
        let config: Self = toml::from_str(source)
            .map_err(|e| DocketError::validation(format!("invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the host and database are set.
    pub fn validate(&self) -> DocResult<()> {
        if self.hostname.trim().is_empty() {
            return Err(DocketError::validation(
                "a hostname is required to connect to MongoDB",
            ));
        }
        if self.database.trim().is_empty() {
            return Err(DocketError::validation(
                "a database is required to connect to MongoDB",
            ));
        }
        Ok(())
    }

    /// Assemble the connection string.
    ///
    /// `mongodb://[user:pass@]host[:port]/database`, with credentials only
    /// when both are present and the port only when set.
    pub fn connection_uri(&self) -> String {
        let mut uri = String::from("mongodb://");

        if let (Some(user), Some(pass)) = (non_blank(&self.username), non_blank(&self.password)) {
            uri.push_str(&encode_userinfo(user));
            uri.push(':');
            uri.push_str(&encode_userinfo(pass));
            uri.push('@');
        }

        uri.push_str(self.hostname.trim());
        if let Some(port) = self.port.filter(|p| *p != 0) {
            uri.push(':');
            uri.push_str(&port.to_string());
        }

        uri.push('/');
        uri.push_str(self.database.trim());
        uri
    }

    /// Convert to MongoDB ClientOptions.
    pub async fn to_client_options(&self) -> DocResult<ClientOptions> {
        self.validate()?;

        let mut options = ClientOptions::parse(self.connection_uri())
            .await
            .map_err(|e| DocketError::connection(format!("failed to parse URI: {}", e)))?;

        if let Some(set) = non_blank(&self.replica_set) {
            options.repl_set_name = Some(set.to_string());
        }

        if let Some(ref app_name) = self.app_name {
            options.app_name = Some(app_name.clone());
        }

        if let Some(max_pool) = self.max_pool_size {
            options.max_pool_size = Some(max_pool);
        }

        if let Some(connect_timeout) = self.connect_timeout {
            options.connect_timeout = Some(connect_timeout);
        }

        if let Some(selection_timeout) = self.server_selection_timeout {
            options.server_selection_timeout = Some(selection_timeout);
        }

        Ok(options)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Percent-encode a user name or password for the URI userinfo part.
fn encode_userinfo(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_secs))
    }
}

/// Builder for connection configuration.
#[derive(Debug, Default)]
pub struct ConnectionConfigBuilder {
    hostname: Option<String>,
    database: Option<String>,
    username: Option<String>,
    password: Option<String>,
    port: Option<u16>,
    replica_set: Option<String>,
    app_name: Option<String>,
    max_pool_size: Option<u32>,
    connect_timeout: Option<Duration>,
    server_selection_timeout: Option<Duration>,
}

impl ConnectionConfigBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the host name.
    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Set the database name.
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Set the user name and password.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set the port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the replica set name.
    pub fn replica_set(mut self, name: impl Into<String>) -> Self {
        self.replica_set = Some(name.into());
        self
    }

    /// Set the application name.
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    /// Set the maximum pool size.
    pub fn max_pool_size(mut self, size: u32) -> Self {
        self.max_pool_size = Some(size);
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, duration: Duration) -> Self {
        self.connect_timeout = Some(duration);
        self
    }

    /// Set the server selection timeout.
    pub fn server_selection_timeout(mut self, duration: Duration) -> Self {
        self.server_selection_timeout = Some(duration);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> DocResult<ConnectionConfig> {
        let defaults = ConnectionConfig::default();
        let config = ConnectionConfig {
            hostname: self.hostname.unwrap_or_default(),
            database: self.database.unwrap_or_default(),
            username: self.username,
            password: self.password,
            port: self.port,
            replica_set: self.replica_set,
            app_name: self.app_name.or(defaults.app_name),
            max_pool_size: self.max_pool_size.or(defaults.max_pool_size),
            connect_timeout: self.connect_timeout.or(defaults.connect_timeout),
            server_selection_timeout: self
                .server_selection_timeout
                .or(defaults.server_selection_timeout),
        };
        config.validate()?;
        Ok(config)
    }
}
