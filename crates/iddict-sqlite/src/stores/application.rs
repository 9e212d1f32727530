//! Application store.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use iddict_core::normalize::ensure_not_empty;
use iddict_core::{
    Application, ApplicationStore, Entity, EntityFactory, EntityStream, Record, Rows, StoreResult,
};

use crate::collection::{Collection, Filter, Page};
use crate::context::DatabaseContext;
use crate::error::SqliteError;
use crate::options::CollectionNames;

use super::Documents;

/// Application store backed by the applications collection.
///
/// Deleting an application also removes its authorizations and tokens in
/// the same transaction.
pub struct SqliteApplicationStore<T> {
    applications: Documents<T>,
    authorizations: Collection,
    tokens: Collection,
    factory: EntityFactory<T>,
}

impl<T> Clone for SqliteApplicationStore<T> {
    fn clone(&self) -> Self {
        Self {
            applications: self.applications.clone(),
            authorizations: self.authorizations.clone(),
            tokens: self.tokens.clone(),
            factory: self.factory.clone(),
        }
    }
}

impl<T> SqliteApplicationStore<T>
where
    T: Entity<Base = Application>,
{
    #[must_use]
    pub fn new(
        context: Arc<dyn DatabaseContext>,
        collections: &CollectionNames,
        factory: EntityFactory<T>,
    ) -> Self {
        Self {
            applications: Documents::new(context, Collection::new(&collections.applications)),
            authorizations: Collection::new(&collections.authorizations),
            tokens: Collection::new(&collections.tokens),
            factory,
        }
    }
}

#[async_trait]
impl<T> ApplicationStore<T> for SqliteApplicationStore<T>
where
    T: Entity<Base = Application>,
{
    async fn count(&self, cancel: &CancellationToken) -> StoreResult<u64> {
        self.applications.count(cancel).await
    }

    async fn count_by<F, I>(&self, query: F, cancel: &CancellationToken) -> StoreResult<u64>
    where
        F: FnOnce(Rows<T>) -> I + Send,
        I: Iterator,
    {
        self.applications.count_by(query, cancel).await
    }

    async fn create(&self, application: &T, cancel: &CancellationToken) -> StoreResult<()> {
        self.applications.create(application, cancel).await
    }

    #[instrument(skip_all, fields(id = %application.base().id))]
    async fn delete(&self, application: &T, cancel: &CancellationToken) -> StoreResult<()> {
        let db = self.applications.database(cancel).await?;
        let mut tx = db.begin().await?;

        self.applications.delete_in(&mut tx, application).await?;

        let owned = Filter::all().eq("application_id", application.base().id());
        let authorizations = self.authorizations.delete_many(&mut tx, &owned).await?;
        let tokens = self.tokens.delete_many(&mut tx, &owned).await?;

        tx.commit().await.map_err(SqliteError::from)?;

        debug!(authorizations, tokens, "Deleted application and dependent entities");
        Ok(())
    }

    async fn find_by_id(
        &self,
        identifier: &str,
        cancel: &CancellationToken,
    ) -> StoreResult<Option<T>> {
        ensure_not_empty(identifier, "identifier", "identifier")?;
        self.applications
            .find_one(Filter::all().id(identifier), cancel)
            .await
    }

    async fn find_by_client_id(
        &self,
        client_id: &str,
        cancel: &CancellationToken,
    ) -> StoreResult<Option<T>> {
        ensure_not_empty(client_id, "client_id", "client identifier")?;
        self.applications
            .find_one(Filter::all().eq("client_id", client_id), cancel)
            .await
    }

    fn find_by_redirect_uri(
        &self,
        address: &str,
        cancel: &CancellationToken,
    ) -> StoreResult<EntityStream<T>> {
        ensure_not_empty(address, "address", "address")?;
        let address = address.to_owned();
        Ok(self.applications.stream(
            Filter::all(),
            Page::default(),
            move |application: &T| application.base().has_redirect_uri(&address),
            cancel,
        ))
    }

    fn find_by_post_logout_redirect_uri(
        &self,
        address: &str,
        cancel: &CancellationToken,
    ) -> StoreResult<EntityStream<T>> {
        ensure_not_empty(address, "address", "address")?;
        let address = address.to_owned();
        Ok(self.applications.stream(
            Filter::all(),
            Page::default(),
            move |application: &T| application.base().has_post_logout_redirect_uri(&address),
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
        self.applications.get(query, state, cancel).await
    }

    fn instantiate(&self) -> StoreResult<T> {
        self.factory.instantiate(Application::KIND)
    }

    fn list(
        &self,
        count: Option<usize>,
        offset: Option<usize>,
        cancel: &CancellationToken,
    ) -> EntityStream<T> {
        self.applications
            .stream(Filter::all(), Page::new(count, offset), |_| true, cancel)
    }

    fn list_by<S, R, F, I>(&self, query: F, state: S, cancel: &CancellationToken) -> EntityStream<R>
    where
        F: FnOnce(Rows<T>, S) -> I + Send + 'static,
        I: Iterator<Item = R>,
        S: Send + 'static,
        R: Send + 'static,
    {
        self.applications.list_by(query, state, cancel)
    }

    async fn update(&self, application: &mut T, cancel: &CancellationToken) -> StoreResult<()> {
        self.applications.update(application, cancel).await
    }
}
