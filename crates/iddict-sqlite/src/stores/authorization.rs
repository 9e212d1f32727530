//! Authorization store.

use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use iddict_core::constants::{authorization_types, statuses};
use iddict_core::normalize::ensure_not_empty;
use iddict_core::{
    Authorization, AuthorizationQuery, AuthorizationStore, Entity, EntityFactory, EntityStream,
    Record, Rows, StoreResult,
};

use crate::collection::{Collection, Filter, Page};
use crate::context::DatabaseContext;
use crate::error::SqliteError;
use crate::options::CollectionNames;

use super::{Documents, PRUNE_LIMIT};

/// Authorization store backed by the authorizations collection.
pub struct SqliteAuthorizationStore<T> {
    authorizations: Documents<T>,
    tokens: Collection,
    factory: EntityFactory<T>,
}

impl<T> Clone for SqliteAuthorizationStore<T> {
    fn clone(&self) -> Self {
        Self {
            authorizations: self.authorizations.clone(),
            tokens: self.tokens.clone(),
            factory: self.factory.clone(),
        }
    }
}

impl<T> SqliteAuthorizationStore<T>
where
    T: Entity<Base = Authorization>,
{
    #[must_use]
    pub fn new(
        context: Arc<dyn DatabaseContext>,
        collections: &CollectionNames,
        factory: EntityFactory<T>,
    ) -> Self {
        Self {
            authorizations: Documents::new(context, Collection::new(&collections.authorizations)),
            tokens: Collection::new(&collections.tokens),
            factory,
        }
    }
}

#[async_trait]
impl<T> AuthorizationStore<T> for SqliteAuthorizationStore<T>
where
    T: Entity<Base = Authorization>,
{
    async fn count(&self, cancel: &CancellationToken) -> StoreResult<u64> {
        self.authorizations.count(cancel).await
    }

    async fn count_by<F, I>(&self, query: F, cancel: &CancellationToken) -> StoreResult<u64>
    where
        F: FnOnce(Rows<T>) -> I + Send,
        I: Iterator,
    {
        self.authorizations.count_by(query, cancel).await
    }

    async fn create(&self, authorization: &T, cancel: &CancellationToken) -> StoreResult<()> {
        self.authorizations.create(authorization, cancel).await
    }

    #[instrument(skip_all, fields(id = %authorization.base().id))]
    async fn delete(&self, authorization: &T, cancel: &CancellationToken) -> StoreResult<()> {
        let db = self.authorizations.database(cancel).await?;
        let mut tx = db.begin().await?;

        self.authorizations.delete_in(&mut tx, authorization).await?;

        let owned = Filter::all().eq("authorization_id", authorization.base().id());
        let tokens = self.tokens.delete_many(&mut tx, &owned).await?;

        tx.commit().await.map_err(SqliteError::from)?;

        debug!(tokens, "Deleted authorization and its tokens");
        Ok(())
    }

    fn find(
        &self,
        query: &AuthorizationQuery,
        cancel: &CancellationToken,
    ) -> StoreResult<EntityStream<T>> {
        query.validate()?;

        let filter = Filter::all()
            .eq("subject", &query.subject)
            .eq("application_id", &query.client)
            .eq_opt("status", query.status.as_deref())
            .eq_opt("type", query.kind.as_deref());

        // Scope containment cannot be expressed as an engine filter.
        let query = query.clone();
        Ok(self.authorizations.stream(
            filter,
            Page::default(),
            move |authorization: &T| query.matches_scopes(authorization.base()),
            cancel,
        ))
    }

    fn find_by_application_id(
        &self,
        identifier: &str,
        cancel: &CancellationToken,
    ) -> StoreResult<EntityStream<T>> {
        ensure_not_empty(identifier, "identifier", "identifier")?;
        Ok(self.authorizations.stream(
            Filter::all().eq("application_id", identifier),
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
        self.authorizations
            .find_one(Filter::all().id(identifier), cancel)
            .await
    }

    fn find_by_subject(
        &self,
        subject: &str,
        cancel: &CancellationToken,
    ) -> StoreResult<EntityStream<T>> {
        ensure_not_empty(subject, "subject", "subject")?;
        Ok(self.authorizations.stream(
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
        self.authorizations.get(query, state, cancel).await
    }

    fn instantiate(&self) -> StoreResult<T> {
        self.factory.instantiate(Authorization::KIND)
    }

    fn list(
        &self,
        count: Option<usize>,
        offset: Option<usize>,
        cancel: &CancellationToken,
    ) -> EntityStream<T> {
        self.authorizations
            .stream(Filter::all(), Page::new(count, offset), |_| true, cancel)
    }

    fn list_by<S, R, F, I>(&self, query: F, state: S, cancel: &CancellationToken) -> EntityStream<R>
    where
        F: FnOnce(Rows<T>, S) -> I + Send + 'static,
        I: Iterator<Item = R>,
        S: Send + 'static,
        R: Send + 'static,
    {
        self.authorizations.list_by(query, state, cancel)
    }

    #[instrument(skip_all, fields(threshold = %threshold))]
    async fn prune(
        &self,
        threshold: OffsetDateTime,
        cancel: &CancellationToken,
    ) -> StoreResult<u64> {
        let db = self.authorizations.database(cancel).await?;
        let collection = self.authorizations.collection();
        let threshold = threshold.unix_timestamp();

        let mut tx = db.begin().await?;

        let settled = Filter::all().ne("status", statuses::VALID);
        let orphaned_ad_hoc = Filter::all()
            .eq("status", statuses::VALID)
            .eq("type", authorization_types::AD_HOC)
            .not_in_select("id", &self.tokens, "authorization_id", Filter::all());
        let prunable = collection
            .find_ids(
                &mut tx,
                &Filter::all()
                    .before("creation_date", threshold)
                    .any([settled, orphaned_ad_hoc]),
                Page::new(Some(PRUNE_LIMIT), None),
            )
            .await?;
        let pruned = collection.delete_ids(&mut tx, &prunable).await?;

        tx.commit().await.map_err(SqliteError::from)?;

        info!(pruned, "Pruned authorizations");
        Ok(pruned)
    }

    async fn update(&self, authorization: &mut T, cancel: &CancellationToken) -> StoreResult<()> {
        self.authorizations.update(authorization, cancel).await
    }
}
