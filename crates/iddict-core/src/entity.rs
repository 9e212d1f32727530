//! Entity traits and factories.
//!
//! The four base records ([`Application`](crate::models::Application),
//! [`Authorization`](crate::models::Authorization), [`Scope`](crate::models::Scope),
//! [`Token`](crate::models::Token)) implement [`Record`]. Stores are generic over an
//! [`Entity`] whose `Base` is one of those records, which lets a host
//! application persist its own subtype:
//!
//! ```ignore
//! #[derive(Clone, Default, Serialize, Deserialize)]
//! struct TenantApplication {
//!     #[serde(flatten)]
//!     application: Application,
//!     tenant: String,
//! }
//!
//! impl Entity for TenantApplication {
//!     type Base = Application;
//!     fn base(&self) -> &Application { &self.application }
//!     fn base_mut(&mut self) -> &mut Application { &mut self.application }
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::{BoxError, StoreError, StoreResult};

/// Culture name (e.g. `fr-FR`) to localized text.
pub type LocalizedStrings = BTreeMap<String, String>;

/// Free-form additional properties attached to an entity.
pub type Properties = BTreeMap<String, serde_json::Value>;

/// A persisted base record with an immutable identifier and an optimistic
/// concurrency token.
pub trait Record: Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static {
    /// Lower-case entity kind used in messages ("application", "token").
    const KIND: &'static str;

    /// Returns the unique identifier.
    fn id(&self) -> &str;

    /// Returns the current concurrency token.
    fn concurrency_token(&self) -> &str;

    /// Replaces the concurrency token.
    fn set_concurrency_token(&mut self, token: String);
}

/// A storable entity: either a base record or a type embedding one.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The base record this entity extends.
    type Base: Record;

    /// Returns the embedded base record.
    fn base(&self) -> &Self::Base;

    /// Returns the embedded base record mutably.
    fn base_mut(&mut self) -> &mut Self::Base;
}

/// Generates a new entity identifier.
#[must_use]
pub fn new_identifier() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a new opaque concurrency token.
#[must_use]
pub fn new_concurrency_token() -> String {
    Uuid::new_v4().to_string()
}

type CreateFn<T> = dyn Fn() -> Result<T, BoxError> + Send + Sync;

/// Registered constructor for a configured entity type.
pub struct EntityFactory<T> {
    create: Arc<CreateFn<T>>,
}

impl<T> EntityFactory<T> {
    /// Wraps a constructor closure.
    pub fn new<F>(create: F) -> Self
    where
        F: Fn() -> Result<T, BoxError> + Send + Sync + 'static,
    {
        Self {
            create: Arc::new(create),
        }
    }

    /// Creates a new, empty entity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidOperation`] wrapping the constructor's
    /// error if the entity cannot be created.
    pub fn instantiate(&self, kind: &str) -> StoreResult<T> {
        (self.create)().map_err(|source| {
            StoreError::invalid_operation_with(
                format!(
                    "An error occurred while trying to create a new {kind} instance. \
                     Make sure that the {kind} entity can be default-constructed or register \
                     a custom factory with 'replace_{kind}_entity_with()'."
                ),
                source,
            )
        })
    }
}

impl<T: Default + 'static> Default for EntityFactory<T> {
    fn default() -> Self {
        Self::new(|| Ok(T::default()))
    }
}

impl<T> Clone for EntityFactory<T> {
    fn clone(&self) -> Self {
        Self {
            create: Arc::clone(&self.create),
        }
    }
}

impl<T> fmt::Debug for EntityFactory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityFactory")
            .field("entity", &std::any::type_name::<T>())
            .finish()
    }
}
