//! Scope store.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use iddict_core::normalize::ensure_not_empty;
use iddict_core::{
    Entity, EntityFactory, EntityStream, Record, Rows, Scope, ScopeStore, StoreError, StoreResult,
};

use crate::collection::{Collection, Filter, Page};
use crate::context::DatabaseContext;
use crate::options::CollectionNames;

use super::Documents;

/// Scope store backed by the scopes collection. Scopes have no dependents.
pub struct SqliteScopeStore<T> {
    scopes: Documents<T>,
    factory: EntityFactory<T>,
}

impl<T> Clone for SqliteScopeStore<T> {
    fn clone(&self) -> Self {
        Self {
            scopes: self.scopes.clone(),
            factory: self.factory.clone(),
        }
    }
}

impl<T> SqliteScopeStore<T>
where
    T: Entity<Base = Scope>,
{
    #[must_use]
    pub fn new(
        context: Arc<dyn DatabaseContext>,
        collections: &CollectionNames,
        factory: EntityFactory<T>,
    ) -> Self {
        Self {
            scopes: Documents::new(context, Collection::new(&collections.scopes)),
            factory,
        }
    }
}

#[async_trait]
impl<T> ScopeStore<T> for SqliteScopeStore<T>
where
    T: Entity<Base = Scope>,
{
    async fn count(&self, cancel: &CancellationToken) -> StoreResult<u64> {
        self.scopes.count(cancel).await
    }

    async fn count_by<F, I>(&self, query: F, cancel: &CancellationToken) -> StoreResult<u64>
    where
        F: FnOnce(Rows<T>) -> I + Send,
        I: Iterator,
    {
        self.scopes.count_by(query, cancel).await
    }

    async fn create(&self, scope: &T, cancel: &CancellationToken) -> StoreResult<()> {
        self.scopes.create(scope, cancel).await
    }

    async fn delete(&self, scope: &T, cancel: &CancellationToken) -> StoreResult<()> {
        let db = self.scopes.database(cancel).await?;
        let mut conn = db.acquire().await?;
        self.scopes.delete_in(&mut conn, scope).await
    }

    async fn find_by_id(
        &self,
        identifier: &str,
        cancel: &CancellationToken,
    ) -> StoreResult<Option<T>> {
        ensure_not_empty(identifier, "identifier", "identifier")?;
        self.scopes
            .find_one(Filter::all().id(identifier), cancel)
            .await
    }

    async fn find_by_name(&self, name: &str, cancel: &CancellationToken) -> StoreResult<Option<T>> {
        ensure_not_empty(name, "name", "scope name")?;
        self.scopes
            .find_one(Filter::all().eq("name", name), cancel)
            .await
    }

    fn find_by_names(
        &self,
        names: &[String],
        cancel: &CancellationToken,
    ) -> StoreResult<EntityStream<T>> {
        if names.iter().any(String::is_empty) {
            return Err(StoreError::invalid_argument(
                "names",
                "Scope names cannot be null or empty.",
            ));
        }
        Ok(self.scopes.stream(
            Filter::all().one_of("name", names),
            Page::default(),
            |_| true,
            cancel,
        ))
    }

    fn find_by_resource(
        &self,
        resource: &str,
        cancel: &CancellationToken,
    ) -> StoreResult<EntityStream<T>> {
        ensure_not_empty(resource, "resource", "resource")?;
        let resource = resource.to_owned();
        Ok(self.scopes.stream(
            Filter::all(),
            Page::default(),
            move |scope: &T| scope.base().has_resource(&resource),
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
        self.scopes.get(query, state, cancel).await
    }

    fn instantiate(&self) -> StoreResult<T> {
        self.factory.instantiate(Scope::KIND)
    }

    fn list(
        &self,
        count: Option<usize>,
        offset: Option<usize>,
        cancel: &CancellationToken,
    ) -> EntityStream<T> {
        self.scopes
            .stream(Filter::all(), Page::new(count, offset), |_| true, cancel)
    }

    fn list_by<S, R, F, I>(&self, query: F, state: S, cancel: &CancellationToken) -> EntityStream<R>
    where
        F: FnOnce(Rows<T>, S) -> I + Send + 'static,
        I: Iterator<Item = R>,
        S: Send + 'static,
        R: Send + 'static,
    {
        self.scopes.list_by(query, state, cancel)
    }

    async fn update(&self, scope: &mut T, cancel: &CancellationToken) -> StoreResult<()> {
        self.scopes.update(scope, cancel).await
    }
}
