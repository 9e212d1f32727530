//! Database resolution through the store context.

mod common;

use tokio_test::{assert_err, assert_ok};

use iddict_core::{ApplicationStore, ScopeStore};
use iddict_sqlite::{DatabaseContext, SqliteConfig, SqliteStoreBuilder};

use common::{application, cancel, scope};

#[tokio::test]
async fn test_missing_database_fails_on_first_operation() {
    let stores = assert_ok!(SqliteStoreBuilder::new().build());

    let err = assert_err!(stores.applications().count(&cancel()).await);
    assert!(err.is_invalid_operation());
    assert!(err.to_string().contains("use_connection"));
}

#[tokio::test]
async fn test_unreachable_database_is_an_invalid_operation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("iddict.db");
    let config = SqliteConfig::new(format!("sqlite://{}", path.display()))
        .with_create_if_missing(false)
        .with_connect_timeout_ms(500);

    let stores = assert_ok!(SqliteStoreBuilder::new().use_connection(config).build());
    let err = assert_err!(stores.scopes().count(&cancel()).await);
    assert!(err.is_invalid_operation());
    assert!(std::error::Error::source(&err).is_some());
}

#[tokio::test]
async fn test_file_database_persists_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("iddict.db").display());
    let cancel = cancel();

    let first = assert_ok!(
        SqliteStoreBuilder::new()
            .use_connection(SqliteConfig::new(url.clone()).with_pool_size(2))
            .build()
    );
    assert_ok!(first.applications().create(&application("c1"), &cancel).await);
    assert_ok!(first.scopes().create(&scope("openid", &[]), &cancel).await);
    assert_ok!(first.context().database(&cancel).await).close().await;

    let second = assert_ok!(
        SqliteStoreBuilder::new()
            .use_connection(SqliteConfig::new(url))
            .build()
    );
    let app = assert_ok!(second.applications().find_by_client_id("c1", &cancel).await);
    assert!(app.is_some());
    assert_eq!(assert_ok!(second.scopes().count(&cancel).await), 1);
}

#[tokio::test]
async fn test_database_opens_on_first_use_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("iddict.db");
    let stores = assert_ok!(
        SqliteStoreBuilder::new()
            .use_connection(SqliteConfig::new(format!("sqlite://{}", path.display())))
            .build()
    );

    assert!(stores.context().opened().is_none());
    assert!(!path.exists());

    assert_eq!(assert_ok!(stores.scopes().count(&cancel()).await), 0);
    let database = stores.context().opened().expect("database resolved");
    assert!(path.exists());
    database.close().await;
}

#[tokio::test]
async fn test_bound_database_wins_over_connection_settings() {
    let database = assert_ok!(iddict_sqlite::SqliteDatabase::in_memory().await);
    let stores = assert_ok!(
        SqliteStoreBuilder::new()
            .use_connection(SqliteConfig::new("sqlite:///nonexistent/dir/iddict.db"))
            .use_database(database)
            .build()
    );

    assert_eq!(assert_ok!(stores.applications().count(&cancel()).await), 0);
}

#[tokio::test]
async fn test_cancelled_token_short_circuits_resolution() {
    let stores = assert_ok!(SqliteStoreBuilder::new().build());
    let cancelled = cancel();
    cancelled.cancel();

    let err = assert_err!(stores.context().database(&cancelled).await);
    assert!(err.is_cancelled());
}
