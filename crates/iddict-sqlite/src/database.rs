//! Database handle and collection bootstrap.

use std::str::FromStr;
use std::time::Duration;

use sqlx_core::pool::{PoolConnection, PoolOptions};
use sqlx_core::query::query;
use sqlx_core::transaction::Transaction;
use sqlx_sqlite::{Sqlite, SqliteConnectOptions, SqlitePool};
use tracing::{debug, info, instrument};

use crate::config::SqliteConfig;
use crate::error::{Result, SqliteError};
use crate::options::CollectionNames;

/// Type alias for SQLite pool options.
pub type SqlitePoolOptions = PoolOptions<Sqlite>;

/// Shared handle to the embedded database.
///
/// Cloning is cheap; all clones share one connection pool.
#[derive(Debug, Clone)]
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Opens the database described by `config`.
    ///
    /// In-memory databases are private to a connection, so they get a pool
    /// with exactly one connection that is never recycled.
    #[instrument(skip(config), fields(url = %config.url))]
    pub async fn connect(config: &SqliteConfig) -> Result<Self> {
        info!(
            pool_size = config.pool_size,
            busy_timeout_ms = config.busy_timeout_ms,
            in_memory = config.is_in_memory(),
            "Opening SQLite database"
        );

        if config.url.trim().is_empty() {
            return Err(SqliteError::config("The database URL cannot be empty."));
        }

        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(config.create_if_missing)
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms));

        let pool_options = if config.is_in_memory() {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(config.pool_size.max(1))
        };

        let pool = pool_options
            .acquire_timeout(Duration::from_millis(config.connect_timeout_ms))
            .connect_with(options)
            .await?;

        debug!("SQLite database opened");

        Ok(Self { pool })
    }

    /// Opens a private in-memory database.
    pub async fn in_memory() -> Result<Self> {
        Self::connect(&SqliteConfig::in_memory()).await
    }

    /// Wraps an existing pool.
    #[must_use]
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Returns the underlying pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Checks a connection out of the pool.
    pub async fn acquire(&self) -> Result<PoolConnection<Sqlite>> {
        Ok(self.pool.acquire().await?)
    }

    /// Starts a write transaction. It rolls back when dropped without a commit.
    ///
    /// The write lock is taken by `BEGIN IMMEDIATE`, so contention with other
    /// writers waits out the busy timeout instead of failing on the first
    /// write of the transaction.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    /// Creates the four collections and their indexes if they do not exist.
    #[instrument(skip(self))]
    pub async fn ensure_collections(&self, names: &CollectionNames) -> Result<()> {
        let mut conn = self.acquire().await?;

        for (table, indexes) in collection_layout(names) {
            query::<Sqlite>(&format!(
                r#"CREATE TABLE IF NOT EXISTS "{table}" (id TEXT PRIMARY KEY NOT NULL, data TEXT NOT NULL)"#
            ))
            .execute(&mut *conn)
            .await?;

            for &(field, unique) in indexes {
                let unique = if unique { "UNIQUE " } else { "" };
                query::<Sqlite>(&format!(
                    r#"CREATE {unique}INDEX IF NOT EXISTS "{table}_{field}" ON "{table}" (json_extract(data, '$.{field}'))"#
                ))
                .execute(&mut *conn)
                .await?;
            }
        }

        debug!("Collections ready");
        Ok(())
    }

    /// Closes every connection of the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

const APPLICATION_INDEXES: &[(&str, bool)] = &[("client_id", true)];
const AUTHORIZATION_INDEXES: &[(&str, bool)] = &[("application_id", false), ("subject", false)];
const SCOPE_INDEXES: &[(&str, bool)] = &[("name", true)];
const TOKEN_INDEXES: &[(&str, bool)] = &[
    ("application_id", false),
    ("authorization_id", false),
    ("reference_id", true),
    ("subject", false),
];

/// Tables and their `(field, unique)` expression indexes.
fn collection_layout(names: &CollectionNames) -> [(&str, &'static [(&'static str, bool)]); 4] {
    [
        (names.applications.as_str(), APPLICATION_INDEXES),
        (names.authorizations.as_str(), AUTHORIZATION_INDEXES),
        (names.scopes.as_str(), SCOPE_INDEXES),
        (names.tokens.as_str(), TOKEN_INDEXES),
    ]
}
