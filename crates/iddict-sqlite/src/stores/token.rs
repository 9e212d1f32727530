//! Token store.

use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use iddict_core::constants::statuses;
use iddict_core::normalize::ensure_not_empty;
use iddict_core::{
    Entity, EntityFactory, EntityStream, Record, Rows, StoreResult, Token, TokenQuery, TokenStore,
};

use crate::collection::{Collection, Filter, Page};
use crate::context::DatabaseContext;
use crate::error::SqliteError;
use crate::options::CollectionNames;

use super::{Documents, PRUNE_LIMIT};

/// Token store backed by the tokens collection.
pub struct SqliteTokenStore<T> {
    tokens: Documents<T>,
    authorizations: Collection,
    factory: EntityFactory<T>,
}

impl<T> Clone for SqliteTokenStore<T> {
    fn clone(&self) -> Self {
        Self {
            tokens: self.tokens.clone(),
            authorizations: self.authorizations.clone(),
            factory: self.factory.clone(),
        }
    }
}

impl<T> SqliteTokenStore<T>
where
    T: Entity<Base = Token>,
{
    #[must_use]
    pub fn new(
        context: Arc<dyn DatabaseContext>,
        collections: &CollectionNames,
        factory: EntityFactory<T>,
    ) -> Self {
        Self {
            tokens: Documents::new(context, Collection::new(&collections.tokens)),
            authorizations: Collection::new(&collections.authorizations),
            factory,
        }
    }
}

#[async_trait]
impl<T> TokenStore<T> for SqliteTokenStore<T>
where
    T: Entity<Base = Token>,
{
    async fn count(&self, cancel: &CancellationToken) -> StoreResult<u64> {
        self.tokens.count(cancel).await
    }

    async fn count_by<F, I>(&self, query: F, cancel: &CancellationToken) -> StoreResult<u64>
    where
        F: FnOnce(Rows<T>) -> I + Send,
        I: Iterator,
    {
        self.tokens.count_by(query, cancel).await
    }

    async fn create(&self, token: &T, cancel: &CancellationToken) -> StoreResult<()> {
        self.tokens.create(token, cancel).await
    }

    async fn delete(&self, token: &T, cancel: &CancellationToken) -> StoreResult<()> {
        let db = self.tokens.database(cancel).await?;
        let mut conn = db.acquire().await?;
        self.tokens.delete_in(&mut conn, token).await
    }

    fn find(&self, query: &TokenQuery, cancel: &CancellationToken) -> StoreResult<EntityStream<T>> {
        query.validate()?;

        let filter = Filter::all()
            .eq("subject", &query.subject)
            .eq("application_id", &query.client)
            .eq_opt("status", query.status.as_deref())
            .eq_opt("type", query.kind.as_deref());

        Ok(self
            .tokens
            .stream(filter, Page::default(), |_| true, cancel))
    }

    fn find_by_application_id(
        &self,
        identifier: &str,
        cancel: &CancellationToken,
    ) -> StoreResult<EntityStream<T>> {
        ensure_not_empty(identifier, "identifier", "identifier")?;
        Ok(self.tokens.stream(
            Filter::all().eq("application_id", identifier),
            Page::default(),
            |_| true,
            cancel,
        ))
    }

    fn find_by_authorization_id(
        &self,
        identifier: &str,
        cancel: &CancellationToken,
    ) -> StoreResult<EntityStream<T>> {
        ensure_not_empty(identifier, "identifier", "identifier")?;
        Ok(self.tokens.stream(
            Filter::all().eq("authorization_id", identifier),
            Page::default(),
            |_| true,
            cancel,
        ))
    }

    async fn find_by_id(
        &self,
        identifier: &str,
        cancel: &CancellationToken,
    ) -> StoreResult<Option<T>> {
        ensure_not_empty(identifier, "identifier", "identifier")?;
        self.tokens
            .find_one(Filter::all().id(identifier), cancel)
            .await
    }

    async fn find_by_reference_id(
        &self,
        identifier: &str,
        cancel: &CancellationToken,
    ) -> StoreResult<Option<T>> {
        ensure_not_empty(identifier, "identifier", "identifier")?;
        self.tokens
            .find_one(Filter::all().eq("reference_id", identifier), cancel)
            .await
    }

    fn find_by_subject(
        &self,
        subject: &str,
        cancel: &CancellationToken,
    ) -> StoreResult<EntityStream<T>> {
        ensure_not_empty(subject, "subject", "subject")?;
        Ok(self.tokens.stream(
            Filter::all().eq("subject", subject),
            Page::default(),
            |_| true,
            cancel,
        ))
    }

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
        R: Send,
    {
        self.tokens.get(query, state, cancel).await
    }

    fn instantiate(&self) -> StoreResult<T> {
        self.factory.instantiate(Token::KIND)
    }

    fn list(
        &self,
        count: Option<usize>,
        offset: Option<usize>,
        cancel: &CancellationToken,
    ) -> EntityStream<T> {
        self.tokens
            .stream(Filter::all(), Page::new(count, offset), |_| true, cancel)
    }

    fn list_by<S, R, F, I>(&self, query: F, state: S, cancel: &CancellationToken) -> EntityStream<R>
    where
        F: FnOnce(Rows<T>, S) -> I + Send + 'static,
        I: Iterator<Item = R>,
        S: Send + 'static,
        R: Send + 'static,
    {
        self.tokens.list_by(query, state, cancel)
    }

    #[instrument(skip_all, fields(threshold = %threshold))]
    async fn prune(
        &self,
        threshold: OffsetDateTime,
        cancel: &CancellationToken,
    ) -> StoreResult<u64> {
        let db = self.tokens.database(cancel).await?;
        let collection = self.tokens.collection();
        let now = OffsetDateTime::now_utc().unix_timestamp();

        let mut tx = db.begin().await?;

        let settled = Filter::all()
            .ne("status", statuses::INACTIVE)
            .ne("status", statuses::VALID);
        let expired = Filter::all().before("expiration_date", now);
        let orphaned = Filter::all().in_select(
            "authorization_id",
            &self.authorizations,
            "id",
            Filter::all().ne("status", statuses::VALID),
        );
        let prunable = collection
            .find_ids(
                &mut tx,
                &Filter::all()
                    .before("creation_date", threshold.unix_timestamp())
                    .any([settled, expired, orphaned]),
                Page::new(Some(PRUNE_LIMIT), None),
            )
            .await?;
        let pruned = collection.delete_ids(&mut tx, &prunable).await?;

        tx.commit().await.map_err(SqliteError::from)?;

        info!(pruned, "Pruned tokens");
        Ok(pruned)
    }

    async fn update(&self, token: &mut T, cancel: &CancellationToken) -> StoreResult<()> {
        self.tokens.update(token, cancel).await
    }
}
