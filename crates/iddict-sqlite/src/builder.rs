//! Store configuration and wiring.

use std::sync::Arc;

use iddict_core::{
    Application, Authorization, Entity, EntityFactory, Scope, StoreResult, Token,
};

use crate::config::SqliteConfig;
use crate::context::{DatabaseContext, SqliteContext};
use crate::database::SqliteDatabase;
use crate::options::{SqliteOptions, validate_collection_name};
use crate::resolver::{
    ApplicationStoreResolver, AuthorizationStoreResolver, ScopeStoreResolver, StoreResolver,
    TokenStoreResolver,
};
use crate::stores::{
    SqliteApplicationStore, SqliteAuthorizationStore, SqliteScopeStore, SqliteTokenStore,
};

/// Factory and optional pre-built store for one entity kind.
struct Registration<T, S> {
    factory: EntityFactory<T>,
    store: Option<S>,
}

impl<T, S> Registration<T, S> {
    fn new(factory: EntityFactory<T>) -> Self {
        Self {
            factory,
            store: None,
        }
    }
}

/// Configures the SQLite stores.
///
/// The type parameters are the configured entity types; they default to the
/// base records and change through the `replace_*_entity` methods.
///
/// # Example
///
/// ```ignore
/// let stores = SqliteStoreBuilder::new()
///     .use_connection(SqliteConfig::new("sqlite://iddict.db"))
///     .set_tokens_collection_name("tenant_tokens")?
///     .replace_application_entity::<TenantApplication>()
///     .build()?;
///
/// let applications = stores.applications();
/// ```
pub struct SqliteStoreBuilder<A = Application, Az = Authorization, Sc = Scope, Tk = Token> {
    options: SqliteOptions,
    context: Option<Arc<dyn DatabaseContext>>,
    applications: Registration<A, SqliteApplicationStore<A>>,
    authorizations: Registration<Az, SqliteAuthorizationStore<Az>>,
    scopes: Registration<Sc, SqliteScopeStore<Sc>>,
    tokens: Registration<Tk, SqliteTokenStore<Tk>>,
}

impl SqliteStoreBuilder {
    /// Creates a builder for the base entity types with default options.
    #[must_use]
    pub fn new() -> Self {
        Self {
            options: SqliteOptions::default(),
            context: None,
            applications: Registration::new(EntityFactory::default()),
            authorizations: Registration::new(EntityFactory::default()),
            scopes: Registration::new(EntityFactory::default()),
            tokens: Registration::new(EntityFactory::default()),
        }
    }
}

impl Default for SqliteStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, Az, Sc, Tk> SqliteStoreBuilder<A, Az, Sc, Tk>
where
    A: Entity<Base = Application>,
    Az: Entity<Base = Authorization>,
    Sc: Entity<Base = Scope>,
    Tk: Entity<Base = Token>,
{
    /// Amends the options in place.
    #[must_use]
    pub fn configure(mut self, configure: impl FnOnce(&mut SqliteOptions)) -> Self {
        configure(&mut self.options);
        self
    }

    /// Sets the applications collection name.
    ///
    /// # Errors
    ///
    /// Returns an argument error if the name is empty or not a plain identifier.
    pub fn set_applications_collection_name(
        mut self,
        name: impl Into<String>,
    ) -> StoreResult<Self> {
        let name = name.into();
        validate_collection_name(&name, "name")?;
        self.options.collections.applications = name;
        Ok(self)
    }

    /// Sets the authorizations collection name.
    ///
    /// # Errors
    ///
    /// Returns an argument error if the name is empty or not a plain identifier.
    pub fn set_authorizations_collection_name(
        mut self,
        name: impl Into<String>,
    ) -> StoreResult<Self> {
        let name = name.into();
        validate_collection_name(&name, "name")?;
        self.options.collections.authorizations = name;
        Ok(self)
    }

    /// Sets the scopes collection name.
    ///
    /// # Errors
    ///
    /// Returns an argument error if the name is empty or not a plain identifier.
    pub fn set_scopes_collection_name(mut self, name: impl Into<String>) -> StoreResult<Self> {
        let name = name.into();
        validate_collection_name(&name, "name")?;
        self.options.collections.scopes = name;
        Ok(self)
    }

    /// Sets the tokens collection name.
    ///
    /// # Errors
    ///
    /// Returns an argument error if the name is empty or not a plain identifier.
    pub fn set_tokens_collection_name(mut self, name: impl Into<String>) -> StoreResult<Self> {
        let name = name.into();
        validate_collection_name(&name, "name")?;
        self.options.collections.tokens = name;
        Ok(self)
    }

    /// Binds a database handle. It takes precedence over connection settings.
    #[must_use]
    pub fn use_database(mut self, database: SqliteDatabase) -> Self {
        self.options.database = Some(database);
        self
    }

    /// Opens the database from `config` on first use.
    #[must_use]
    pub fn use_connection(mut self, config: SqliteConfig) -> Self {
        self.options.connection = Some(config);
        self
    }

    /// Replaces the database accessor entirely.
    ///
    /// The accessor is then responsible for creating the collections.
    #[must_use]
    pub fn use_context(mut self, context: Arc<dyn DatabaseContext>) -> Self {
        self.context = Some(context);
        self
    }

    /// Registers a pre-built application store.
    #[must_use]
    pub fn use_application_store(mut self, store: SqliteApplicationStore<A>) -> Self {
        self.applications.store = Some(store);
        self
    }

    /// Registers a pre-built authorization store.
    #[must_use]
    pub fn use_authorization_store(mut self, store: SqliteAuthorizationStore<Az>) -> Self {
        self.authorizations.store = Some(store);
        self
    }

    /// Registers a pre-built scope store.
    #[must_use]
    pub fn use_scope_store(mut self, store: SqliteScopeStore<Sc>) -> Self {
        self.scopes.store = Some(store);
        self
    }

    /// Registers a pre-built token store.
    #[must_use]
    pub fn use_token_store(mut self, store: SqliteTokenStore<Tk>) -> Self {
        self.tokens.store = Some(store);
        self
    }

    /// Configures a custom application entity, constructed with `T::default()`.
    #[must_use]
    pub fn replace_application_entity<T>(self) -> SqliteStoreBuilder<T, Az, Sc, Tk>
    where
        T: Entity<Base = Application> + Default,
    {
        self.replace_application_entity_with(EntityFactory::default())
    }

    /// Configures a custom application entity built by `factory`.
    ///
    /// A previously registered application store is discarded.
    #[must_use]
    pub fn replace_application_entity_with<T>(
        self,
        factory: EntityFactory<T>,
    ) -> SqliteStoreBuilder<T, Az, Sc, Tk>
    where
        T: Entity<Base = Application>,
    {
        SqliteStoreBuilder {
            options: self.options,
            context: self.context,
            applications: Registration::new(factory),
            authorizations: self.authorizations,
            scopes: self.scopes,
            tokens: self.tokens,
        }
    }

    /// Configures a custom authorization entity, constructed with `T::default()`.
    #[must_use]
    pub fn replace_authorization_entity<T>(self) -> SqliteStoreBuilder<A, T, Sc, Tk>
    where
        T: Entity<Base = Authorization> + Default,
    {
        self.replace_authorization_entity_with(EntityFactory::default())
    }

    /// Configures a custom authorization entity built by `factory`.
    #[must_use]
    pub fn replace_authorization_entity_with<T>(
        self,
        factory: EntityFactory<T>,
    ) -> SqliteStoreBuilder<A, T, Sc, Tk>
    where
        T: Entity<Base = Authorization>,
    {
        SqliteStoreBuilder {
            options: self.options,
            context: self.context,
            applications: self.applications,
            authorizations: Registration::new(factory),
            scopes: self.scopes,
            tokens: self.tokens,
        }
    }

    /// Configures a custom scope entity, constructed with `T::default()`.
    #[must_use]
    pub fn replace_scope_entity<T>(self) -> SqliteStoreBuilder<A, Az, T, Tk>
    where
        T: Entity<Base = Scope> + Default,
    {
        self.replace_scope_entity_with(EntityFactory::default())
    }

    /// Configures a custom scope entity built by `factory`.
    #[must_use]
    pub fn replace_scope_entity_with<T>(
        self,
        factory: EntityFactory<T>,
    ) -> SqliteStoreBuilder<A, Az, T, Tk>
    where
        T: Entity<Base = Scope>,
    {
        SqliteStoreBuilder {
            options: self.options,
            context: self.context,
            applications: self.applications,
            authorizations: self.authorizations,
            scopes: Registration::new(factory),
            tokens: self.tokens,
        }
    }

    /// Configures a custom token entity, constructed with `T::default()`.
    #[must_use]
    pub fn replace_token_entity<T>(self) -> SqliteStoreBuilder<A, Az, Sc, T>
    where
        T: Entity<Base = Token> + Default,
    {
        self.replace_token_entity_with(EntityFactory::default())
    }

    /// Configures a custom token entity built by `factory`.
    #[must_use]
    pub fn replace_token_entity_with<T>(
        self,
        factory: EntityFactory<T>,
    ) -> SqliteStoreBuilder<A, Az, Sc, T>
    where
        T: Entity<Base = Token>,
    {
        SqliteStoreBuilder {
            options: self.options,
            context: self.context,
            applications: self.applications,
            authorizations: self.authorizations,
            scopes: self.scopes,
            tokens: Registration::new(factory),
        }
    }

    /// Wires the stores.
    ///
    /// The database is not touched here; it is resolved by the first store
    /// operation.
    ///
    /// # Errors
    ///
    /// Returns an argument error if a collection name set through
    /// [`configure`](Self::configure) is invalid.
    pub fn build(self) -> StoreResult<SqliteStores<A, Az, Sc, Tk>> {
        self.options.collections.validate()?;

        let collections = self.options.collections.clone();
        let context: Arc<dyn DatabaseContext> = match self.context {
            Some(context) => context,
            None => Arc::new(SqliteContext::new(self.options)),
        };

        let applications = resolver(self.applications, {
            let (context, collections) = (Arc::clone(&context), collections.clone());
            move |factory| SqliteApplicationStore::new(Arc::clone(&context), &collections, factory)
        });
        let authorizations = resolver(self.authorizations, {
            let (context, collections) = (Arc::clone(&context), collections.clone());
            move |factory| {
                SqliteAuthorizationStore::new(Arc::clone(&context), &collections, factory)
            }
        });
        let scopes = resolver(self.scopes, {
            let (context, collections) = (Arc::clone(&context), collections.clone());
            move |factory| SqliteScopeStore::new(Arc::clone(&context), &collections, factory)
        });
        let tokens = resolver(self.tokens, {
            let (context, collections) = (Arc::clone(&context), collections);
            move |factory| SqliteTokenStore::new(Arc::clone(&context), &collections, factory)
        });

        Ok(SqliteStores {
            context,
            applications,
            authorizations,
            scopes,
            tokens,
        })
    }
}

fn resolver<T, S, F>(registration: Registration<T, S>, build: F) -> StoreResolver<S>
where
    T: 'static,
    F: Fn(EntityFactory<T>) -> S + Send + Sync + 'static,
{
    let factory = registration.factory;
    let resolver = StoreResolver::new(move || build(factory.clone()));
    match registration.store {
        Some(store) => resolver.register(store),
        None => resolver,
    }
}

/// The configured stores.
pub struct SqliteStores<A = Application, Az = Authorization, Sc = Scope, Tk = Token> {
    context: Arc<dyn DatabaseContext>,
    applications: ApplicationStoreResolver<A>,
    authorizations: AuthorizationStoreResolver<Az>,
    scopes: ScopeStoreResolver<Sc>,
    tokens: TokenStoreResolver<Tk>,
}

impl<A, Az, Sc, Tk> SqliteStores<A, Az, Sc, Tk> {
    /// Returns the database accessor shared by the built stores.
    #[must_use]
    pub fn context(&self) -> &Arc<dyn DatabaseContext> {
        &self.context
    }

    #[must_use]
    pub fn applications(&self) -> Arc<SqliteApplicationStore<A>> {
        self.applications.get()
    }

    #[must_use]
    pub fn authorizations(&self) -> Arc<SqliteAuthorizationStore<Az>> {
        self.authorizations.get()
    }

    #[must_use]
    pub fn scopes(&self) -> Arc<SqliteScopeStore<Sc>> {
        self.scopes.get()
    }

    #[must_use]
    pub fn tokens(&self) -> Arc<SqliteTokenStore<Tk>> {
        self.tokens.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iddict_core::StoreError;

    #[test]
    fn test_invalid_collection_names_are_rejected() {
        let result = SqliteStoreBuilder::new().set_tokens_collection_name("");
        assert!(matches!(
            result,
            Err(StoreError::InvalidArgument {
                parameter: "name",
                ..
            })
        ));

        let result = SqliteStoreBuilder::new().set_scopes_collection_name("bad name");
        assert!(result.is_err());
    }

    #[test]
    fn test_build_rejects_names_set_through_configure() {
        let result = SqliteStoreBuilder::new()
            .configure(|options| options.collections.applications = "apps;".into())
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_resolved_stores_are_cached() {
        let stores = SqliteStoreBuilder::new().build().unwrap();
        assert!(Arc::ptr_eq(&stores.applications(), &stores.applications()));
        assert!(Arc::ptr_eq(&stores.tokens(), &stores.tokens()));
    }
}
