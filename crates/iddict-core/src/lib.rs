//! # iddict-core
//!
//! Entity records and storage contracts for an OAuth 2.0 / OpenID Connect
//! server: applications (clients), authorizations (user consents), scopes
//! and tokens.
//!
//! This crate defines the records, the store traits and the error type. It
//! does not contain any storage engine; see `iddict-sqlite`.
//!
//! ## Custom entities
//!
//! A store is generic over the configured entity type. Any type that embeds
//! the base record and implements [`Entity`] can be used:
//!
//! ```ignore
//! use iddict_core::{Application, Entity};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Clone, Default, Serialize, Deserialize)]
//! struct TenantApplication {
//!     #[serde(flatten)]
//!     inner: Application,
//!     tenant: Option<String>,
//! }
//!
//! impl Entity for TenantApplication {
//!     type Base = Application;
//!     fn base(&self) -> &Application { &self.inner }
//!     fn base_mut(&mut self) -> &mut Application { &mut self.inner }
//! }
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use iddict_core::{ApplicationStore, CancellationToken, StoreResult};
//!
//! async fn rename<S: ApplicationStore<Application>>(
//!     store: &S,
//!     client_id: &str,
//! ) -> StoreResult<()> {
//!     let cancel = CancellationToken::new();
//!     if let Some(mut app) = store.find_by_client_id(client_id, &cancel).await? {
//!         store.set_display_name(&mut app, Some("Renamed".into()));
//!         store.update(&mut app, &cancel).await?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod constants;
mod entity;
mod error;
pub mod models;
pub mod normalize;
pub mod storage;

pub use entity::{
    Entity, EntityFactory, LocalizedStrings, Properties, Record, new_concurrency_token,
    new_identifier,
};
pub use error::{BoxError, ErrorCategory, StoreError, StoreResult};
pub use models::{Application, Authorization, Scope, Token};
pub use storage::{
    ApplicationStore, AuthorizationQuery, AuthorizationStore, CancellationToken, EntityStream,
    Rows, ScopeStore, TokenQuery, TokenStore,
};
