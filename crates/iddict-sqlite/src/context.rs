//! Database accessor.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use iddict_core::{StoreError, StoreResult};

use crate::database::SqliteDatabase;
use crate::options::SqliteOptions;

/// Resolves the database the stores operate on.
#[async_trait]
pub trait DatabaseContext: Send + Sync {
    /// Returns a live database handle.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Cancelled`] if `cancel` has already fired, and
    /// [`StoreError::InvalidOperation`] if no database can be resolved.
    async fn database(&self, cancel: &CancellationToken) -> StoreResult<SqliteDatabase>;

    /// Returns the handle resolved so far without opening one.
    fn opened(&self) -> Option<SqliteDatabase> {
        None
    }
}

/// Default accessor backed by [`SqliteOptions`].
///
/// The pre-bound handle wins over the connection settings. The first
/// successful resolution creates the collections and is cached; later calls
/// return the same handle.
#[derive(Debug)]
pub struct SqliteContext {
    options: SqliteOptions,
    database: OnceCell<SqliteDatabase>,
}

impl SqliteContext {
    #[must_use]
    pub fn new(options: SqliteOptions) -> Self {
        Self {
            options,
            database: OnceCell::new(),
        }
    }

    /// Returns the options this context resolves from.
    #[must_use]
    pub fn options(&self) -> &SqliteOptions {
        &self.options
    }

    #[instrument(skip(self))]
    async fn open(&self) -> StoreResult<SqliteDatabase> {
        let database = if let Some(database) = &self.options.database {
            debug!("Using pre-bound database handle");
            database.clone()
        } else if let Some(config) = &self.options.connection {
            SqliteDatabase::connect(config).await.map_err(|e| {
                StoreError::invalid_operation_with(
                    format!("The SQLite database '{}' could not be opened.", config.url),
                    Box::new(e),
                )
            })?
        } else {
            return Err(StoreError::invalid_operation(
                "No suitable SQLite database could be found. To configure the stores to use \
                 a specific database, call 'SqliteStoreBuilder::use_database()' or \
                 'SqliteStoreBuilder::use_connection()'.",
            ));
        };

        database
            .ensure_collections(&self.options.collections)
            .await?;
        Ok(database)
    }
}

#[async_trait]
impl DatabaseContext for SqliteContext {
    async fn database(&self, cancel: &CancellationToken) -> StoreResult<SqliteDatabase> {
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        self.database
            .get_or_try_init(|| self.open())
            .await
            .cloned()
    }

    fn opened(&self) -> Option<SqliteDatabase> {
        self.database.get().cloned()
    }
}
