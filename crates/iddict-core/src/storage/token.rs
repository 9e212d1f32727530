//! Token store trait and composite lookup criteria.

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;

use crate::entity::{Entity, Properties};
use crate::error::StoreResult;
use crate::models::Token;
use crate::normalize::{ensure_not_empty, non_empty_map, non_empty_string, to_utc};

use super::{EntityStream, Rows};

/// Criteria for [`TokenStore::find`]. Every supplied field must match exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenQuery {
    pub subject: String,
    pub client: String,
    pub status: Option<String>,
    pub kind: Option<String>,
}

impl TokenQuery {
    /// Matches tokens issued for `subject` to the application `client`.
    #[must_use]
    pub fn new(subject: impl Into<String>, client: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            client: client.into(),
            status: None,
            kind: None,
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    #[must_use]
    pub fn with_type(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Checks that every supplied criterion is non-empty.
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
}

/// Storage trait for tokens.
#[async_trait]
pub trait TokenStore<T>: Send + Sync
where
    T: Entity<Base = Token>,
{
    /// Returns the number of tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be resolved or queried.
    async fn count(&self, cancel: &CancellationToken) -> StoreResult<u64>;

    /// Runs `query` over all tokens and counts the resulting items.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be resolved or queried.
    async fn count_by<F, I>(&self, query: F, cancel: &CancellationToken) -> StoreResult<u64>
    where
        F: FnOnce(Rows<T>) -> I + Send,
        I: Iterator;

    /// Inserts a new token.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`](crate::StoreError::Conflict) if the
    /// reference identifier is already in use.
    async fn create(&self, token: &T, cancel: &CancellationToken) -> StoreResult<()>;

    /// Deletes a token.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Concurrency`](crate::StoreError::Concurrency) if
    /// no row matches the token's identifier and concurrency token.
    async fn delete(&self, token: &T, cancel: &CancellationToken) -> StoreResult<()>;

    /// Streams the tokens matching `query`.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first empty criterion.
    fn find(&self, query: &TokenQuery, cancel: &CancellationToken)
    -> StoreResult<EntityStream<T>>;

    /// Streams the tokens of an application.
    ///
    /// # Errors
    ///
    /// Returns an error if `identifier` is empty.
    fn find_by_application_id(
        &self,
        identifier: &str,
        cancel: &CancellationToken,
    ) -> StoreResult<EntityStream<T>>;

    /// Streams the tokens of an authorization.
    ///
    /// # Errors
    ///
    /// Returns an error if `identifier` is empty.
    fn find_by_authorization_id(
        &self,
        identifier: &str,
        cancel: &CancellationToken,
    ) -> StoreResult<EntityStream<T>>;

    /// Finds a token by its identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if `identifier` is empty or the query fails.
    async fn find_by_id(&self, identifier: &str, cancel: &CancellationToken)
    -> StoreResult<Option<T>>;

    /// Finds a token by its reference identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if `identifier` is empty or the query fails.
    async fn find_by_reference_id(
        &self,
        identifier: &str,
        cancel: &CancellationToken,
    ) -> StoreResult<Option<T>>;

    /// Streams the tokens of a subject.
    ///
    /// # Errors
    ///
    /// Returns an error if `subject` is empty.
    fn find_by_subject(
        &self,
        subject: &str,
        cancel: &CancellationToken,
    ) -> StoreResult<EntityStream<T>>;

    /// Runs `query` over all tokens and returns its first item.
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

    /// Creates a new, empty token using the registered factory.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidOperation`](crate::StoreError::InvalidOperation)
    /// if the factory fails.
    fn instantiate(&self) -> StoreResult<T>;

    /// Streams tokens in insertion order.
    fn list(
        &self,
        count: Option<usize>,
        offset: Option<usize>,
        cancel: &CancellationToken,
    ) -> EntityStream<T>;

    /// Runs `query` over all tokens and streams its items.
    fn list_by<S, R, F, I>(&self, query: F, state: S, cancel: &CancellationToken) -> EntityStream<R>
    where
        F: FnOnce(Rows<T>, S) -> I + Send + 'static,
        I: Iterator<Item = R>,
        S: Send + 'static,
        R: Send + 'static;

    /// Removes tokens created before `threshold` that are no longer usable:
    /// neither `inactive` nor `valid`, expired, or attached to an
    /// authorization that is not valid. Returns the number of removed tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the pruning transaction fails; nothing is removed
    /// in that case.
    async fn prune(&self, threshold: OffsetDateTime, cancel: &CancellationToken)
    -> StoreResult<u64>;

    /// Persists changes to a token, rotating its concurrency token.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Concurrency`](crate::StoreError::Concurrency) if
    /// the stored row no longer carries the previous concurrency token.
    async fn update(&self, token: &mut T, cancel: &CancellationToken) -> StoreResult<()>;

    // ==================== Accessors ====================

    fn id<'a>(&self, token: &'a T) -> &'a str {
        &token.base().id
    }

    fn application_id<'a>(&self, token: &'a T) -> Option<&'a str> {
        token.base().application_id.as_deref()
    }

    fn authorization_id<'a>(&self, token: &'a T) -> Option<&'a str> {
        token.base().authorization_id.as_deref()
    }

    fn creation_date(&self, token: &T) -> Option<OffsetDateTime> {
        token.base().creation_date
    }

    fn expiration_date(&self, token: &T) -> Option<OffsetDateTime> {
        token.base().expiration_date
    }

    fn payload<'a>(&self, token: &'a T) -> Option<&'a str> {
        token.base().payload.as_deref()
    }

    fn properties(&self, token: &T) -> Properties {
        token.base().properties.clone().unwrap_or_default()
    }

    fn redemption_date(&self, token: &T) -> Option<OffsetDateTime> {
        token.base().redemption_date
    }

    fn reference_id<'a>(&self, token: &'a T) -> Option<&'a str> {
        token.base().reference_id.as_deref()
    }

    fn status<'a>(&self, token: &'a T) -> Option<&'a str> {
        token.base().status.as_deref()
    }

    fn subject<'a>(&self, token: &'a T) -> Option<&'a str> {
        token.base().subject.as_deref()
    }

    fn kind<'a>(&self, token: &'a T) -> Option<&'a str> {
        token.base().kind.as_deref()
    }

    // ==================== Mutators ====================

    fn set_application_id(&self, token: &mut T, identifier: Option<String>) {
        token.base_mut().application_id = non_empty_string(identifier);
    }

    fn set_authorization_id(&self, token: &mut T, identifier: Option<String>) {
        token.base_mut().authorization_id = non_empty_string(identifier);
    }

    fn set_creation_date(&self, token: &mut T, date: Option<OffsetDateTime>) {
        token.base_mut().creation_date = to_utc(date);
    }

    fn set_expiration_date(&self, token: &mut T, date: Option<OffsetDateTime>) {
        token.base_mut().expiration_date = to_utc(date);
    }

    fn set_payload(&self, token: &mut T, payload: Option<String>) {
        token.base_mut().payload = non_empty_string(payload);
    }

    fn set_properties(&self, token: &mut T, properties: Properties) {
        token.base_mut().properties = non_empty_map(properties);
    }

    fn set_redemption_date(&self, token: &mut T, date: Option<OffsetDateTime>) {
        token.base_mut().redemption_date = to_utc(date);
    }

    fn set_reference_id(&self, token: &mut T, identifier: Option<String>) {
        token.base_mut().reference_id = non_empty_string(identifier);
    }

    fn set_status(&self, token: &mut T, status: Option<String>) {
        token.base_mut().status = non_empty_string(status);
    }

    fn set_subject(&self, token: &mut T, subject: Option<String>) {
        token.base_mut().subject = non_empty_string(subject);
    }

    fn set_kind(&self, token: &mut T, kind: Option<String>) {
        token.base_mut().kind = non_empty_string(kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StoreError;

    #[test]
    fn test_query_validation() {
        assert!(TokenQuery::new("alice", "client").validate().is_ok());

        let err = TokenQuery::new("alice", "client")
            .with_status("")
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidArgument {
                parameter: "status",
                ..
            }
        ));
    }
}
