//! Application store trait.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::entity::{Entity, LocalizedStrings, Properties};
use crate::error::StoreResult;
use crate::models::Application;
use crate::normalize::{non_empty_list, non_empty_map, non_empty_string};

use super::{EntityStream, Rows};

/// Storage trait for applications.
///
/// `T` is the configured application entity: [`Application`] itself or a
/// type embedding it.
#[async_trait]
pub trait ApplicationStore<T>: Send + Sync
where
    T: Entity<Base = Application>,
{
    /// Returns the number of applications.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be resolved or queried.
    async fn count(&self, cancel: &CancellationToken) -> StoreResult<u64>;

    /// Runs `query` over all applications and counts the resulting items.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be resolved or queried.
    async fn count_by<F, I>(&self, query: F, cancel: &CancellationToken) -> StoreResult<u64>
    where
        F: FnOnce(Rows<T>) -> I + Send,
        I: Iterator;

    /// Inserts a new application.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`](crate::StoreError::Conflict) if the
    /// storage engine rejects a duplicate client identifier.
    async fn create(&self, application: &T, cancel: &CancellationToken) -> StoreResult<()>;

    /// Deletes an application together with its authorizations and tokens.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Concurrency`](crate::StoreError::Concurrency) if
    /// no row matches the application's identifier and concurrency token.
    async fn delete(&self, application: &T, cancel: &CancellationToken) -> StoreResult<()>;

    /// Finds an application by its identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if `identifier` is empty or the query fails.
    async fn find_by_id(&self, identifier: &str, cancel: &CancellationToken)
    -> StoreResult<Option<T>>;

    /// Finds an application by its client identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if `client_id` is empty or the query fails.
    async fn find_by_client_id(
        &self,
        client_id: &str,
        cancel: &CancellationToken,
    ) -> StoreResult<Option<T>>;

    /// Streams the applications registering `address` as a redirect URI.
    ///
    /// # Errors
    ///
    /// Returns an error if `address` is empty.
    fn find_by_redirect_uri(
        &self,
        address: &str,
        cancel: &CancellationToken,
    ) -> StoreResult<EntityStream<T>>;

    /// Streams the applications registering `address` as a logout redirect URI.
    ///
    /// # Errors
    ///
    /// Returns an error if `address` is empty.
    fn find_by_post_logout_redirect_uri(
        &self,
        address: &str,
        cancel: &CancellationToken,
    ) -> StoreResult<EntityStream<T>>;

    /// Runs `query` over all applications and returns its first item.
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

    /// Creates a new, empty application using the registered factory.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidOperation`](crate::StoreError::InvalidOperation)
    /// if the factory fails.
    fn instantiate(&self) -> StoreResult<T>;

    /// Streams applications in insertion order.
    ///
    /// `offset` defaults to 0 and `count` to unbounded.
    fn list(
        &self,
        count: Option<usize>,
        offset: Option<usize>,
        cancel: &CancellationToken,
    ) -> EntityStream<T>;

    /// Runs `query` over all applications and streams its items.
    fn list_by<S, R, F, I>(&self, query: F, state: S, cancel: &CancellationToken) -> EntityStream<R>
    where
        F: FnOnce(Rows<T>, S) -> I + Send + 'static,
        I: Iterator<Item = R>,
        S: Send + 'static,
        R: Send + 'static;

    /// Persists changes to an application.
    ///
    /// A new concurrency token is assigned to `application` before the write.
    /// On conflict the entity keeps the new token and must be reloaded.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Concurrency`](crate::StoreError::Concurrency) if
    /// the stored row no longer carries the previous concurrency token.
    async fn update(&self, application: &mut T, cancel: &CancellationToken) -> StoreResult<()>;

    // ==================== Accessors ====================

    fn id<'a>(&self, application: &'a T) -> &'a str {
        &application.base().id
    }

    fn client_id<'a>(&self, application: &'a T) -> Option<&'a str> {
        application.base().client_id.as_deref()
    }

    fn client_secret<'a>(&self, application: &'a T) -> Option<&'a str> {
        application.base().client_secret.as_deref()
    }

    fn client_type<'a>(&self, application: &'a T) -> Option<&'a str> {
        application.base().client_type.as_deref()
    }

    fn consent_type<'a>(&self, application: &'a T) -> Option<&'a str> {
        application.base().consent_type.as_deref()
    }

    fn display_name<'a>(&self, application: &'a T) -> Option<&'a str> {
        application.base().display_name.as_deref()
    }

    /// Returns the localized display names, empty if unset.
    fn display_names(&self, application: &T) -> LocalizedStrings {
        application.base().display_names.clone().unwrap_or_default()
    }

    fn permissions<'a>(&self, application: &'a T) -> &'a [String] {
        application.base().permissions.as_deref().unwrap_or_default()
    }

    fn post_logout_redirect_uris<'a>(&self, application: &'a T) -> &'a [String] {
        application
            .base()
            .post_logout_redirect_uris
            .as_deref()
            .unwrap_or_default()
    }

    fn redirect_uris<'a>(&self, application: &'a T) -> &'a [String] {
        application.base().redirect_uris.as_deref().unwrap_or_default()
    }

    fn requirements<'a>(&self, application: &'a T) -> &'a [String] {
        application.base().requirements.as_deref().unwrap_or_default()
    }

    /// Returns the additional properties, empty if unset.
    fn properties(&self, application: &T) -> Properties {
        application.base().properties.clone().unwrap_or_default()
    }

    // ==================== Mutators ====================

    fn set_client_id(&self, application: &mut T, client_id: Option<String>) {
        application.base_mut().client_id = non_empty_string(client_id);
    }

    fn set_client_secret(&self, application: &mut T, secret: Option<String>) {
        application.base_mut().client_secret = non_empty_string(secret);
    }

    fn set_client_type(&self, application: &mut T, client_type: Option<String>) {
        application.base_mut().client_type = non_empty_string(client_type);
    }

    fn set_consent_type(&self, application: &mut T, consent_type: Option<String>) {
        application.base_mut().consent_type = non_empty_string(consent_type);
    }

    fn set_display_name(&self, application: &mut T, name: Option<String>) {
        application.base_mut().display_name = non_empty_string(name);
    }

    fn set_display_names(&self, application: &mut T, names: LocalizedStrings) {
        application.base_mut().display_names = non_empty_map(names);
    }

    fn set_permissions(&self, application: &mut T, permissions: Vec<String>) {
        application.base_mut().permissions = non_empty_list(permissions);
    }

    fn set_post_logout_redirect_uris(&self, application: &mut T, addresses: Vec<String>) {
        application.base_mut().post_logout_redirect_uris = non_empty_list(addresses);
    }

    fn set_redirect_uris(&self, application: &mut T, addresses: Vec<String>) {
        application.base_mut().redirect_uris = non_empty_list(addresses);
    }

    fn set_requirements(&self, application: &mut T, requirements: Vec<String>) {
        application.base_mut().requirements = non_empty_list(requirements);
    }

    fn set_properties(&self, application: &mut T, properties: Properties) {
        application.base_mut().properties = non_empty_map(properties);
    }
}
