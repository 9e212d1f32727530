//! Store wiring: custom entity types, registered stores and collection names.

mod common;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sqlx_core::query_scalar::query_scalar;
use sqlx_sqlite::Sqlite;

use iddict_core::{Application, ApplicationStore, Entity, EntityFactory, StoreError};
use iddict_sqlite::{
    CollectionNames, SqliteApplicationStore, SqliteDatabase, SqliteStoreBuilder,
};

use common::{application, cancel, collect};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct TenantApplication {
    #[serde(flatten)]
    application: Application,
    tenant: String,
}

impl Entity for TenantApplication {
    type Base = Application;

    fn base(&self) -> &Application {
        &self.application
    }

    fn base_mut(&mut self) -> &mut Application {
        &mut self.application
    }
}

async fn database() -> SqliteDatabase {
    SqliteDatabase::in_memory().await.unwrap()
}

#[tokio::test]
async fn test_custom_entity_round_trips_extra_fields() {
    let stores = SqliteStoreBuilder::new()
        .use_database(database().await)
        .replace_application_entity::<TenantApplication>()
        .build()
        .unwrap();
    let applications = stores.applications();
    let cancel = cancel();

    let mut app = applications.instantiate().unwrap();
    applications.set_client_id(&mut app, Some("tenant-app".into()));
    app.tenant = "contoso".into();
    applications.create(&app, &cancel).await.unwrap();

    let stored = applications
        .find_by_client_id("tenant-app", &cancel)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.tenant, "contoso");
    assert_eq!(stored, app);

    app.tenant = "fabrikam".into();
    applications.update(&mut app, &cancel).await.unwrap();
    let stored = applications.find_by_id(&app.application.id, &cancel).await.unwrap().unwrap();
    assert_eq!(stored.tenant, "fabrikam");

    applications.delete(&stored, &cancel).await.unwrap();
    assert_eq!(applications.count(&cancel).await.unwrap(), 0);
}

#[tokio::test]
async fn test_instantiate_uses_registered_factory() {
    let stores = SqliteStoreBuilder::new()
        .use_database(database().await)
        .replace_application_entity_with(EntityFactory::new(|| {
            Ok(TenantApplication {
                application: Application::new(),
                tenant: "default".into(),
            })
        }))
        .build()
        .unwrap();
    let applications = stores.applications();

    let first = applications.instantiate().unwrap();
    let second = applications.instantiate().unwrap();
    assert_eq!(first.tenant, "default");
    assert_ne!(first.application.id, second.application.id);
}

#[tokio::test]
async fn test_failing_factory_is_an_invalid_operation() {
    let stores = SqliteStoreBuilder::new()
        .use_database(database().await)
        .replace_application_entity_with(EntityFactory::<TenantApplication>::new(|| {
            Err("tenant is required".into())
        }))
        .build()
        .unwrap();

    let err = stores.applications().instantiate().unwrap_err();
    assert!(err.is_invalid_operation());
    assert!(err.to_string().contains("application"));
    let source = std::error::Error::source(&err).map(ToString::to_string);
    assert_eq!(source.as_deref(), Some("tenant is required"));
}

#[tokio::test]
async fn test_registered_store_wins_until_entity_is_replaced() {
    let database = database().await;
    let public_clients = || {
        EntityFactory::new(|| {
            let mut application = Application::new();
            application.client_type = Some("public".into());
            Ok(application)
        })
    };

    let wiring = SqliteStoreBuilder::new()
        .use_database(database.clone())
        .build()
        .unwrap();
    let registered = SqliteApplicationStore::new(
        Arc::clone(wiring.context()),
        &CollectionNames::default(),
        public_clients(),
    );

    let stores = SqliteStoreBuilder::new()
        .use_database(database.clone())
        .use_application_store(registered.clone())
        .build()
        .unwrap();
    let app = stores.applications().instantiate().unwrap();
    assert_eq!(app.client_type.as_deref(), Some("public"));
    assert!(Arc::ptr_eq(&stores.applications(), &stores.applications()));

    let stores = SqliteStoreBuilder::new()
        .use_database(database)
        .use_application_store(registered)
        .replace_application_entity::<Application>()
        .build()
        .unwrap();
    let app = stores.applications().instantiate().unwrap();
    assert_eq!(app.client_type, None);
}

#[tokio::test]
async fn test_custom_collection_names() {
    let database = database().await;
    let stores = SqliteStoreBuilder::new()
        .use_database(database.clone())
        .set_applications_collection_name("clients")
        .unwrap()
        .set_tokens_collection_name("issued_tokens")
        .unwrap()
        .build()
        .unwrap();
    let cancel = cancel();

    stores.applications().create(&application("c1"), &cancel).await.unwrap();

    let tables: Vec<String> = query_scalar::<Sqlite, String>(
        "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
    )
    .fetch_all(database.pool())
    .await
    .unwrap();
    assert_eq!(
        tables,
        vec![
            "clients",
            "issued_tokens",
            "openiddict_authorizations",
            "openiddict_scopes",
        ]
    );

    let found = collect(Ok(stores.applications().list(None, None, &cancel))).await;
    assert_eq!(found.len(), 1);
}

#[test]
fn test_invalid_collection_name_names_the_parameter() {
    let Err(StoreError::InvalidArgument { parameter, .. }) =
        SqliteStoreBuilder::new().set_authorizations_collection_name("drop table")
    else {
        panic!("expected an invalid argument error");
    };
    assert_eq!(parameter, "name");
}
