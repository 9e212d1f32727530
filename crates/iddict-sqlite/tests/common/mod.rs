//! Shared fixtures for the SQLite store tests.

#![allow(dead_code)]

use futures_util::TryStreamExt;
use time::{Duration, OffsetDateTime};

use iddict_core::{
    Application, Authorization, CancellationToken, EntityStream, Scope, StoreResult, Token,
};
use iddict_sqlite::{SqliteDatabase, SqliteStoreBuilder, SqliteStores};

/// Stores over a fresh private in-memory database.
pub async fn stores() -> SqliteStores {
    let database = SqliteDatabase::in_memory()
        .await
        .expect("open in-memory database");
    SqliteStoreBuilder::new()
        .use_database(database)
        .build()
        .expect("build stores")
}

pub fn cancel() -> CancellationToken {
    CancellationToken::new()
}

/// Drains a stream into a vector, failing on the first error.
pub async fn collect<T>(stream: StoreResult<EntityStream<T>>) -> Vec<T> {
    stream
        .expect("stream created")
        .try_collect()
        .await
        .expect("stream completed")
}

pub fn days_ago(days: i64) -> OffsetDateTime {
    OffsetDateTime::now_utc() - Duration::days(days)
}

pub fn application(client_id: &str) -> Application {
    let mut application = Application::new();
    application.client_id = Some(client_id.to_owned());
    application
}

pub fn authorization(
    application_id: Option<&str>,
    subject: &str,
    status: &str,
    kind: &str,
    created: OffsetDateTime,
) -> Authorization {
    let mut authorization = Authorization::new();
    authorization.application_id = application_id.map(str::to_owned);
    authorization.subject = Some(subject.to_owned());
    authorization.status = Some(status.to_owned());
    authorization.kind = Some(kind.to_owned());
    authorization.creation_date = Some(created);
    authorization
}

pub fn token(
    application_id: Option<&str>,
    authorization_id: Option<&str>,
    status: &str,
    created: OffsetDateTime,
) -> Token {
    let mut token = Token::new();
    token.application_id = application_id.map(str::to_owned);
    token.authorization_id = authorization_id.map(str::to_owned);
    token.subject = Some("alice".to_owned());
    token.status = Some(status.to_owned());
    token.kind = Some("access_token".to_owned());
    token.creation_date = Some(created);
    token
}

pub fn scope(name: &str, resources: &[&str]) -> Scope {
    let mut scope = Scope::new();
    scope.name = Some(name.to_owned());
    if !resources.is_empty() {
        scope.resources = Some(resources.iter().map(|r| (*r).to_owned()).collect());
    }
    scope
}
