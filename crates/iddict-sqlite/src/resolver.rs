//! Store resolvers.
//!
//! A resolver hands out the store for one configured entity type. A store
//! registered up front wins; otherwise the store is built on first use and
//! the same instance is returned afterwards.

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::stores::{
    SqliteApplicationStore, SqliteAuthorizationStore, SqliteScopeStore, SqliteTokenStore,
};

type BuildFn<S> = dyn Fn() -> S + Send + Sync;

/// Resolves a store of type `S`.
pub struct StoreResolver<S> {
    registered: Option<Arc<S>>,
    build: Box<BuildFn<S>>,
    cached: OnceLock<Arc<S>>,
}

impl<S> StoreResolver<S> {
    /// Creates a resolver that builds its store with `build` on first use.
    pub fn new<F>(build: F) -> Self
    where
        F: Fn() -> S + Send + Sync + 'static,
    {
        Self {
            registered: None,
            build: Box::new(build),
            cached: OnceLock::new(),
        }
    }

    /// Registers a pre-built store that takes precedence over the built one.
    #[must_use]
    pub fn register(mut self, store: S) -> Self {
        self.registered = Some(Arc::new(store));
        self
    }

    /// Returns `true` if a pre-built store was registered.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.registered.is_some()
    }

    /// Returns the store.
    pub fn get(&self) -> Arc<S> {
        if let Some(store) = &self.registered {
            return Arc::clone(store);
        }
        Arc::clone(self.cached.get_or_init(|| Arc::new((self.build)())))
    }
}

impl<S> fmt::Debug for StoreResolver<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreResolver")
            .field("store", &std::any::type_name::<S>())
            .field("registered", &self.registered.is_some())
            .field("built", &self.cached.get().is_some())
            .finish()
    }
}

pub type ApplicationStoreResolver<T> = StoreResolver<SqliteApplicationStore<T>>;
pub type AuthorizationStoreResolver<T> = StoreResolver<SqliteAuthorizationStore<T>>;
pub type ScopeStoreResolver<T> = StoreResolver<SqliteScopeStore<T>>;
pub type TokenStoreResolver<T> = StoreResolver<SqliteTokenStore<T>>;
