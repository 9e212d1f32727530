//! Authorization store trait and composite lookup criteria.

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;

use crate::entity::{Entity, Properties};
use crate::error::StoreResult;
use crate::models::Authorization;
use crate::normalize::{ensure_not_empty, non_empty_list, non_empty_map, non_empty_string, to_utc};

use super::{EntityStream, Rows};

/// Criteria for [`AuthorizationStore::find`].
///
/// Subject and client are always required; status, type and scopes narrow
/// the match progressively. Requested scopes must all be present in the
/// authorization's own scopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationQuery {
    pub subject: String,
    pub client: String,
    pub status: Option<String>,
    pub kind: Option<String>,
    pub scopes: Option<Vec<String>>,
}

impl AuthorizationQuery {
    /// Matches authorizations granted by `subject` to the application `client`.
    #[must_use]
    pub fn new(subject: impl Into<String>, client: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            client: client.into(),
            status: None,
            kind: None,
            scopes: None,
        }
    }

    /// Restricts the match to the given status.
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Restricts the match to the given authorization type.
    #[must_use]
    pub fn with_type(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Requires every scope in `scopes` to be granted.
    #[must_use]
    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = Some(scopes.into_iter().map(Into::into).collect());
        self
    }

    /// Checks that every supplied string criterion is non-empty.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArgument` error naming the first empty criterion.
    pub fn validate(&self) -> StoreResult<()> {
        ensure_not_empty(&self.subject, "subject", "subject")?;
        ensure_not_empty(&self.client, "client", "client identifier")?;
        if let Some(status) = &self.status {
            ensure_not_empty(status, "status", "status")?;
        }
        if let Some(kind) = &self.kind {
            ensure_not_empty(kind, "type", "type")?;
        }
        Ok(())
    }

    /// Applies the scope containment check, the part of the criteria that
    /// cannot be pushed to the storage engine.
    #[must_use]
    pub fn matches_scopes(&self, authorization: &Authorization) -> bool {
        self.scopes
            .as_deref()
            .is_none_or(|scopes| authorization.has_scopes(scopes))
    }
}

/// Storage trait for authorizations.
#[async_trait]
pub trait AuthorizationStore<T>: Send + Sync
where
    T: Entity<Base = Authorization>,
{
    /// Returns the number of authorizations.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be resolved or queried.
    async fn count(&self, cancel: &CancellationToken) -> StoreResult<u64>;

    /// Runs `query` over all authorizations and counts the resulting items.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be resolved or queried.
    async fn count_by<F, I>(&self, query: F, cancel: &CancellationToken) -> StoreResult<u64>
    where
        F: FnOnce(Rows<T>) -> I + Send,
        I: Iterator;

    /// Inserts a new authorization.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    async fn create(&self, authorization: &T, cancel: &CancellationToken) -> StoreResult<()>;

    /// Deletes an authorization together with its tokens.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Concurrency`](crate::StoreError::Concurrency) if
    /// no row matches the authorization's identifier and concurrency token.
    async fn delete(&self, authorization: &T, cancel: &CancellationToken) -> StoreResult<()>;

    /// Streams the authorizations matching `query`.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first empty criterion.
    fn find(
        &self,
        query: &AuthorizationQuery,
        cancel: &CancellationToken,
    ) -> StoreResult<EntityStream<T>>;

    /// Streams the authorizations of an application.
    ///
    /// # Errors
    ///
    /// Returns an error if `identifier` is empty.
    fn find_by_application_id(
        &self,
        identifier: &str,
        cancel: &CancellationToken,
    ) -> StoreResult<EntityStream<T>>;

    /// Finds an authorization by its identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if `identifier` is empty or the query fails.
    async fn find_by_id(&self, identifier: &str, cancel: &CancellationToken)
    -> StoreResult<Option<T>>;

    /// Streams the authorizations of a subject.
    ///
    /// # Errors
    ///
    /// Returns an error if `subject` is empty.
    fn find_by_subject(
        &self,
        subject: &str,
        cancel: &CancellationToken,
    ) -> StoreResult<EntityStream<T>>;

    /// Runs `query` over all authorizations and returns its first item.
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

    /// Creates a new, empty authorization using the registered factory.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidOperation`](crate::StoreError::InvalidOperation)
    /// if the factory fails.
    fn instantiate(&self) -> StoreResult<T>;

    /// Streams authorizations in insertion order.
    fn list(
        &self,
        count: Option<usize>,
        offset: Option<usize>,
        cancel: &CancellationToken,
    ) -> EntityStream<T>;

    /// Runs `query` over all authorizations and streams its items.
    fn list_by<S, R, F, I>(&self, query: F, state: S, cancel: &CancellationToken) -> EntityStream<R>
    where
        F: FnOnce(Rows<T>, S) -> I + Send + 'static,
        I: Iterator<Item = R>,
        S: Send + 'static,
        R: Send + 'static;

    /// Removes authorizations created before `threshold` that are either not
    /// valid, or valid ad-hoc authorizations without any token. Returns the
    /// number of removed authorizations.
    ///
    /// # Errors
    ///
    /// Returns an error if the pruning transaction fails; nothing is removed
    /// in that case.
    async fn prune(&self, threshold: OffsetDateTime, cancel: &CancellationToken)
    -> StoreResult<u64>;

    /// Persists changes to an authorization, rotating its concurrency token.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Concurrency`](crate::StoreError::Concurrency) if
    /// the stored row no longer carries the previous concurrency token.
    async fn update(&self, authorization: &mut T, cancel: &CancellationToken) -> StoreResult<()>;

    // ==================== Accessors ====================

    fn id<'a>(&self, authorization: &'a T) -> &'a str {
        &authorization.base().id
    }

    fn application_id<'a>(&self, authorization: &'a T) -> Option<&'a str> {
        authorization.base().application_id.as_deref()
    }

    fn creation_date(&self, authorization: &T) -> Option<OffsetDateTime> {
        authorization.base().creation_date
    }

    /// Returns the additional properties, empty if unset.
    fn properties(&self, authorization: &T) -> Properties {
        authorization.base().properties.clone().unwrap_or_default()
    }

    fn scopes<'a>(&self, authorization: &'a T) -> &'a [String] {
        authorization.base().scopes.as_deref().unwrap_or_default()
    }

    fn status<'a>(&self, authorization: &'a T) -> Option<&'a str> {
        authorization.base().status.as_deref()
    }

    fn subject<'a>(&self, authorization: &'a T) -> Option<&'a str> {
        authorization.base().subject.as_deref()
    }

    fn kind<'a>(&self, authorization: &'a T) -> Option<&'a str> {
        authorization.base().kind.as_deref()
    }

    // ==================== Mutators ====================

    fn set_application_id(&self, authorization: &mut T, identifier: Option<String>) {
        authorization.base_mut().application_id = non_empty_string(identifier);
    }

    fn set_creation_date(&self, authorization: &mut T, date: Option<OffsetDateTime>) {
        authorization.base_mut().creation_date = to_utc(date);
    }

    fn set_properties(&self, authorization: &mut T, properties: Properties) {
        authorization.base_mut().properties = non_empty_map(properties);
    }

    fn set_scopes(&self, authorization: &mut T, scopes: Vec<String>) {
        authorization.base_mut().scopes = non_empty_list(scopes);
    }

    fn set_status(&self, authorization: &mut T, status: Option<String>) {
        authorization.base_mut().status = non_empty_string(status);
    }

    fn set_subject(&self, authorization: &mut T, subject: Option<String>) {
        authorization.base_mut().subject = non_empty_string(subject);
    }

    fn set_kind(&self, authorization: &mut T, kind: Option<String>) {
        authorization.base_mut().kind = non_empty_string(kind);
    }
}
