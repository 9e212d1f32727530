//! Configuration types for the SQLite storage backend.

use serde::{Deserialize, Serialize};

/// Connection settings for the SQLite document store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqliteConfig {
    /// Connection URL: `sqlite://path/to/file.db` or `sqlite::memory:`.
    pub url: String,

    /// Connection pool size (maximum number of connections).
    /// In-memory databases always use a single connection.
    pub pool_size: u32,

    /// Timeout for acquiring a connection, in milliseconds.
    pub connect_timeout_ms: u64,

    /// How long a connection waits on a locked database, in milliseconds.
    pub busy_timeout_ms: u64,

    /// Whether to create the database file if it does not exist.
    pub create_if_missing: bool,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://iddict.db".into(),
            pool_size: 4,
            connect_timeout_ms: 5000,
            busy_timeout_ms: 5000,
            create_if_missing: true,
        }
    }
}

impl SqliteConfig {
    /// Creates a new configuration with the given URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Configuration for a private in-memory database.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new("sqlite::memory:").with_pool_size(1)
    }

    /// Sets the pool size.
    #[must_use]
    pub fn with_pool_size(mut self, size: u32) -> Self {
        self.pool_size = size;
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub fn with_connect_timeout_ms(mut self, timeout: u64) -> Self {
        self.connect_timeout_ms = timeout;
        self
    }

    /// Sets the busy timeout.
    #[must_use]
    pub fn with_busy_timeout_ms(mut self, timeout: u64) -> Self {
        self.busy_timeout_ms = timeout;
        self
    }

    /// Sets whether a missing database file is created.
    #[must_use]
    pub fn with_create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    /// Returns `true` if the URL points at an in-memory database.
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}
