//! Embedded SQLite storage backend for iddict.
//!
//! Applications, authorizations, scopes and tokens are stored as JSON
//! documents, one table per collection. Equality and date filters run in
//! the database through `json_extract`; membership and scope subset checks
//! run in process over the fetched rows.
//!
//! Update and delete compare-and-swap on `(id, concurrency_token)`. Deleting
//! an application or authorization removes its dependents in the same
//! transaction, and pruning selects and deletes inside one transaction.
//!
//! # Example
//!
//! ```ignore
//! use iddict_core::{ApplicationStore, CancellationToken};
//! use iddict_sqlite::{SqliteConfig, SqliteStoreBuilder};
//!
//! let stores = SqliteStoreBuilder::new()
//!     .use_connection(SqliteConfig::new("sqlite://iddict.db"))
//!     .build()?;
//!
//! let applications = stores.applications();
//! let cancel = CancellationToken::new();
//! let app = applications.find_by_client_id("my-app", &cancel).await?;
//! ```

pub mod builder;
mod collection;
pub mod config;
pub mod context;
pub mod database;
pub mod error;
pub mod options;
pub mod resolver;
pub mod stores;

pub use builder::{SqliteStoreBuilder, SqliteStores};
pub use config::SqliteConfig;
pub use context::{DatabaseContext, SqliteContext};
pub use database::SqliteDatabase;
pub use error::SqliteError;
pub use options::{CollectionNames, SqliteOptions};
pub use resolver::{
    ApplicationStoreResolver, AuthorizationStoreResolver, ScopeStoreResolver, StoreResolver,
    TokenStoreResolver,
};
pub use stores::{
    SqliteApplicationStore, SqliteAuthorizationStore, SqliteScopeStore, SqliteTokenStore,
};
