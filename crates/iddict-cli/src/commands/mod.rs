pub mod list;
pub mod prune;
pub mod stats;

use anyhow::{Context, Result};

use iddict_sqlite::{SqliteStoreBuilder, SqliteStores};

use crate::config::CliConfig;

/// Wires the stores for the configured database and collections.
pub fn open_stores(config: &CliConfig) -> Result<SqliteStores> {
    let collections = config.collections.clone();
    let stores = SqliteStoreBuilder::new()
        .configure(|options| options.collections = collections)
        .use_connection(config.database.clone())
        .build()
        .context("failed to configure stores")?;
    Ok(stores)
}
