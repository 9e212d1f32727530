//! Scope store trait.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::entity::{Entity, LocalizedStrings, Properties};
use crate::error::StoreResult;
use crate::models::Scope;
use crate::normalize::{non_empty_list, non_empty_map, non_empty_string};

use super::{EntityStream, Rows};

/// Storage trait for scopes.
#[async_trait]
pub trait ScopeStore<T>: Send + Sync
where
    T: Entity<Base = Scope>,
{
    /// Returns the number of scopes.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be resolved or queried.
    async fn count(&self, cancel: &CancellationToken) -> StoreResult<u64>;

    /// Runs `query` over all scopes and counts the resulting items.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be resolved or queried.
    async fn count_by<F, I>(&self, query: F, cancel: &CancellationToken) -> StoreResult<u64>
    where
        F: FnOnce(Rows<T>) -> I + Send,
        I: Iterator;

    /// Inserts a new scope.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`](crate::StoreError::Conflict) if a
    /// scope with the same name exists.
    async fn create(&self, scope: &T, cancel: &CancellationToken) -> StoreResult<()>;

    /// Deletes a scope.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Concurrency`](crate::StoreError::Concurrency) if
    /// no row matches the scope's identifier and concurrency token.
    async fn delete(&self, scope: &T, cancel: &CancellationToken) -> StoreResult<()>;

    /// Finds a scope by its identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if `identifier` is empty or the query fails.
    async fn find_by_id(&self, identifier: &str, cancel: &CancellationToken)
    -> StoreResult<Option<T>>;

    /// Finds a scope by its unique name.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is empty or the query fails.
    async fn find_by_name(&self, name: &str, cancel: &CancellationToken) -> StoreResult<Option<T>>;

    /// Streams the scopes whose name is one of `names`.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the names is empty.
    fn find_by_names(
        &self,
        names: &[String],
        cancel: &CancellationToken,
    ) -> StoreResult<EntityStream<T>>;

    /// Streams the scopes associated with `resource`.
    ///
    /// # Errors
    ///
    /// Returns an error if `resource` is empty.
    fn find_by_resource(
        &self,
        resource: &str,
        cancel: &CancellationToken,
    ) -> StoreResult<EntityStream<T>>;

    /// Runs `query` over all scopes and returns its first item.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be resolved or queried.
    async fn get<S, R, F, I>(
        &self,
        query: F,
        state: S,
        cancel: &CancellationToken,
    ) -> StoreResult<Option<R>>
    where
        F: FnOnce(Rows<T>, S) -> I + Send,
        I: Iterator<Item = R>,
        S: Send,
        R: Send;

    /// Creates a new, empty scope using the registered factory.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidOperation`](crate::StoreError::InvalidOperation)
    /// if the factory fails.
    fn instantiate(&self) -> StoreResult<T>;

    /// Streams scopes in insertion order.
    fn list(
        &self,
        count: Option<usize>,
        offset: Option<usize>,
        cancel: &CancellationToken,
    ) -> EntityStream<T>;

    /// Runs `query` over all scopes and streams its items.
    fn list_by<S, R, F, I>(&self, query: F, state: S, cancel: &CancellationToken) -> EntityStream<R>
    where
        F: FnOnce(Rows<T>, S) -> I + Send + 'static,
        I: Iterator<Item = R>,
        S: Send + 'static,
        R: Send + 'static;

    /// Persists changes to a scope, rotating its concurrency token.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Concurrency`](crate::StoreError::Concurrency) if
    /// the stored row no longer carries the previous concurrency token.
    async fn update(&self, scope: &mut T, cancel: &CancellationToken) -> StoreResult<()>;

    // ==================== Accessors ====================

    fn id<'a>(&self, scope: &'a T) -> &'a str {
        &scope.base().id
    }

    fn name<'a>(&self, scope: &'a T) -> Option<&'a str> {
        scope.base().name.as_deref()
    }

    fn description<'a>(&self, scope: &'a T) -> Option<&'a str> {
        scope.base().description.as_deref()
    }

    fn descriptions(&self, scope: &T) -> LocalizedStrings {
        scope.base().descriptions.clone().unwrap_or_default()
    }

    fn display_name<'a>(&self, scope: &'a T) -> Option<&'a str> {
        scope.base().display_name.as_deref()
    }

    fn display_names(&self, scope: &T) -> LocalizedStrings {
        scope.base().display_names.clone().unwrap_or_default()
    }

    fn properties(&self, scope: &T) -> Properties {
        scope.base().properties.clone().unwrap_or_default()
    }

    fn resources<'a>(&self, scope: &'a T) -> &'a [String] {
        scope.base().resources.as_deref().unwrap_or_default()
    }

    // ==================== Mutators ====================

    fn set_name(&self, scope: &mut T, name: Option<String>) {
        scope.base_mut().name = non_empty_string(name);
    }

    fn set_description(&self, scope: &mut T, description: Option<String>) {
        scope.base_mut().description = non_empty_string(description);
    }

    fn set_descriptions(&self, scope: &mut T, descriptions: LocalizedStrings) {
        scope.base_mut().descriptions = non_empty_map(descriptions);
    }

    fn set_display_name(&self, scope: &mut T, name: Option<String>) {
        scope.base_mut().display_name = non_empty_string(name);
    }

    fn set_display_names(&self, scope: &mut T, names: LocalizedStrings) {
        scope.base_mut().display_names = non_empty_map(names);
    }

    fn set_properties(&self, scope: &mut T, properties: Properties) {
        scope.base_mut().properties = non_empty_map(properties);
    }

    fn set_resources(&self, scope: &mut T, resources: Vec<String>) {
        scope.base_mut().resources = non_empty_list(resources);
    }
}
