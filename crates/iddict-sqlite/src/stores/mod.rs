//! SQLite implementations of the store traits.
//!
//! Each store owns a [`Documents`] view over its collection for the shared
//! operations and adds the lookups, cascades and pruning specific to its
//! entity kind.

mod application;
mod authorization;
mod scope;
mod token;

pub use application::SqliteApplicationStore;
pub use authorization::SqliteAuthorizationStore;
pub use scope::SqliteScopeStore;
pub use token::SqliteTokenStore;

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use futures_util::{StreamExt, TryStreamExt, future, stream};
use sqlx_sqlite::SqliteConnection;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use iddict_core::{
    Entity, EntityStream, Record, Rows, StoreError, StoreResult, new_concurrency_token,
};

use crate::collection::{Collection, Filter, Page};
use crate::context::DatabaseContext;
use crate::database::SqliteDatabase;

/// Turns a deferred fetch into a cancellable stream.
///
/// The fetch runs on first poll. Rows are yielded until `cancel` fires;
/// rows already yielded are not affected.
pub(crate) fn stream_rows<T, Fut>(fetch: Fut, cancel: &CancellationToken) -> EntityStream<T>
where
    T: Send + 'static,
    Fut: Future<Output = StoreResult<Vec<T>>> + Send + 'static,
{
    let cancel = cancel.clone();
    stream::once(fetch)
        .map_ok(move |rows| {
            let cancel = cancel.clone();
            stream::iter(rows.into_iter().map(Ok::<T, StoreError>))
                .take_while(move |_| future::ready(!cancel.is_cancelled()))
        })
        .try_flatten()
        .boxed()
}

/// Upper bound on the documents removed by a single prune call.
pub(crate) const PRUNE_LIMIT: usize = 1_000_000;

fn row_count(count: usize) -> u64 {
    u64::try_from(count).unwrap_or(u64::MAX)
}

/// Typed access to one collection.
pub(crate) struct Documents<T> {
    context: Arc<dyn DatabaseContext>,
    collection: Collection,
    entity: PhantomData<fn() -> T>,
}

impl<T> Clone for Documents<T> {
    fn clone(&self) -> Self {
        Self {
            context: Arc::clone(&self.context),
            collection: self.collection.clone(),
            entity: PhantomData,
        }
    }
}

impl<T: Entity> Documents<T> {
    pub(crate) fn new(context: Arc<dyn DatabaseContext>, collection: Collection) -> Self {
        Self {
            context,
            collection,
            entity: PhantomData,
        }
    }

    pub(crate) fn collection(&self) -> &Collection {
        &self.collection
    }

    pub(crate) async fn database(&self, cancel: &CancellationToken) -> StoreResult<SqliteDatabase> {
        self.context.database(cancel).await
    }

    pub(crate) async fn load(
        &self,
        filter: &Filter,
        page: Page,
        cancel: &CancellationToken,
    ) -> StoreResult<Vec<T>> {
        let db = self.database(cancel).await?;
        let mut conn = db.acquire().await?;
        Ok(self.collection.find(&mut conn, filter, page).await?)
    }

    pub(crate) async fn count(&self, cancel: &CancellationToken) -> StoreResult<u64> {
        let db = self.database(cancel).await?;
        let mut conn = db.acquire().await?;
        Ok(self.collection.count(&mut conn, &Filter::all()).await?)
    }

    pub(crate) async fn count_by<F, I>(
        &self,
        query: F,
        cancel: &CancellationToken,
    ) -> StoreResult<u64>
    where
        F: FnOnce(Rows<T>) -> I,
        I: Iterator,
    {
        let rows = self.load(&Filter::all(), Page::default(), cancel).await?;
        Ok(row_count(query(rows.into_iter()).count()))
    }

    pub(crate) async fn create(&self, entity: &T, cancel: &CancellationToken) -> StoreResult<()> {
        let db = self.database(cancel).await?;
        let mut conn = db.acquire().await?;
        self.collection
            .insert(&mut conn, entity.base().id(), entity)
            .await?;
        Ok(())
    }

    pub(crate) async fn find_one(
        &self,
        filter: Filter,
        cancel: &CancellationToken,
    ) -> StoreResult<Option<T>> {
        let db = self.database(cancel).await?;
        let mut conn = db.acquire().await?;
        Ok(self.collection.find_one(&mut conn, &filter).await?)
    }

    pub(crate) async fn get<S, R, F, I>(
        &self,
        query: F,
        state: S,
        cancel: &CancellationToken,
    ) -> StoreResult<Option<R>>
    where
        F: FnOnce(Rows<T>, S) -> I,
        I: Iterator<Item = R>,
    {
        let rows = self.load(&Filter::all(), Page::default(), cancel).await?;
        Ok(query(rows.into_iter(), state).next())
    }

    /// Streams the documents matching `filter` that also satisfy `predicate`.
    pub(crate) fn stream<P>(
        &self,
        filter: Filter,
        page: Page,
        predicate: P,
        cancel: &CancellationToken,
    ) -> EntityStream<T>
    where
        P: Fn(&T) -> bool + Send + 'static,
    {
        let documents = self.clone();
        let token = cancel.clone();
        stream_rows(
            async move {
                let rows = documents.load(&filter, page, &token).await?;
                Ok(rows.into_iter().filter(|row| predicate(row)).collect())
            },
            cancel,
        )
    }

    pub(crate) fn list_by<S, R, F, I>(
        &self,
        query: F,
        state: S,
        cancel: &CancellationToken,
    ) -> EntityStream<R>
    where
        F: FnOnce(Rows<T>, S) -> I + Send + 'static,
        I: Iterator<Item = R>,
        S: Send + 'static,
        R: Send + 'static,
    {
        let documents = self.clone();
        let token = cancel.clone();
        stream_rows(
            async move {
                let rows = documents
                    .load(&Filter::all(), Page::default(), &token)
                    .await?;
                Ok(query(rows.into_iter(), state).collect())
            },
            cancel,
        )
    }

    /// Rotates the concurrency token and overwrites the stored document if
    /// it still carries the previous one.
    pub(crate) async fn update(
        &self,
        entity: &mut T,
        cancel: &CancellationToken,
    ) -> StoreResult<()> {
        let db = self.database(cancel).await?;
        let mut conn = db.acquire().await?;

        let previous = entity.base().concurrency_token().to_owned();
        entity
            .base_mut()
            .set_concurrency_token(new_concurrency_token());

        let id = entity.base().id().to_owned();
        let replaced = self
            .collection
            .replace(&mut conn, &id, &previous, &*entity)
            .await?;

        if replaced == 0 {
            warn!(
                kind = <T::Base as Record>::KIND,
                id = %id,
                "Update matched no document with the expected concurrency token"
            );
            return Err(StoreError::concurrency(<T::Base as Record>::KIND));
        }
        Ok(())
    }

    /// Deletes the document if its concurrency token still matches, on the
    /// caller's connection or transaction.
    pub(crate) async fn delete_in(
        &self,
        conn: &mut SqliteConnection,
        entity: &T,
    ) -> StoreResult<()> {
        let base = entity.base();
        let deleted = self
            .collection
            .delete_one(conn, base.id(), base.concurrency_token())
            .await?;

        if deleted == 0 {
            warn!(
                kind = <T::Base as Record>::KIND,
                id = %base.id(),
                "Delete matched no document with the expected concurrency token"
            );
            return Err(StoreError::concurrency(<T::Base as Record>::KIND));
        }
        Ok(())
    }
}
