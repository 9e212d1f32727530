//! Scope store against an in-memory database.

mod common;

use futures_util::StreamExt;

use iddict_core::{Scope, ScopeStore, StoreError};

use common::{cancel, collect, scope, stores};

fn names(scopes: Vec<Scope>) -> Vec<String> {
    scopes.into_iter().filter_map(|scope| scope.name).collect()
}

#[tokio::test]
async fn test_find_by_name_and_names() {
    let stores = stores().await;
    let scopes = stores.scopes();
    let cancel = cancel();

    for name in ["openid", "profile", "email", "api"] {
        scopes.create(&scope(name, &[]), &cancel).await.unwrap();
    }

    let profile = scopes.find_by_name("profile", &cancel).await.unwrap().unwrap();
    assert_eq!(scopes.name(&profile), Some("profile"));
    assert!(scopes.find_by_name("offline_access", &cancel).await.unwrap().is_none());

    let requested = vec!["api".to_owned(), "openid".to_owned(), "unknown".to_owned()];
    let found = names(collect(scopes.find_by_names(&requested, &cancel)).await);
    assert_eq!(found, vec!["openid", "api"]);

    assert!(collect(scopes.find_by_names(&[], &cancel)).await.is_empty());
}

#[tokio::test]
async fn test_find_by_names_rejects_empty_names() {
    let stores = stores().await;
    let scopes = stores.scopes();
    let cancel = cancel();

    let requested = vec!["openid".to_owned(), String::new()];
    let Err(StoreError::InvalidArgument { parameter, .. }) =
        scopes.find_by_names(&requested, &cancel)
    else {
        panic!("expected an invalid argument error");
    };
    assert_eq!(parameter, "names");

    assert!(scopes.find_by_name("", &cancel).await.unwrap_err().is_invalid_argument());
    assert!(scopes.find_by_resource("", &cancel).is_err());
}

#[tokio::test]
async fn test_find_by_resource() {
    let stores = stores().await;
    let scopes = stores.scopes();
    let cancel = cancel();

    scopes.create(&scope("orders.read", &["orders-api", "reports"]), &cancel).await.unwrap();
    scopes.create(&scope("orders.write", &["orders-api"]), &cancel).await.unwrap();
    scopes.create(&scope("profile", &[]), &cancel).await.unwrap();

    let found = names(collect(scopes.find_by_resource("orders-api", &cancel)).await);
    assert_eq!(found, vec!["orders.read", "orders.write"]);

    let found = names(collect(scopes.find_by_resource("reports", &cancel)).await);
    assert_eq!(found, vec!["orders.read"]);

    assert!(collect(scopes.find_by_resource("billing", &cancel)).await.is_empty());
}

#[tokio::test]
async fn test_duplicate_name_is_a_conflict() {
    let stores = stores().await;
    let scopes = stores.scopes();
    let cancel = cancel();

    scopes.create(&scope("openid", &[]), &cancel).await.unwrap();
    let err = scopes.create(&scope("openid", &[]), &cancel).await.unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(scopes.count(&cancel).await.unwrap(), 1);
}

#[tokio::test]
async fn test_update_and_delete() {
    let stores = stores().await;
    let scopes = stores.scopes();
    let cancel = cancel();

    let mut api = scope("api", &[]);
    scopes.create(&api, &cancel).await.unwrap();

    scopes.set_display_name(&mut api, Some("API access".into()));
    scopes.set_descriptions(
        &mut api,
        [("fr-FR".to_owned(), "Accès à l'API".to_owned())].into_iter().collect(),
    );
    scopes.set_resources(&mut api, vec!["resource-server".into()]);
    scopes.update(&mut api, &cancel).await.unwrap();

    let stored = scopes.find_by_id(&api.id, &cancel).await.unwrap().unwrap();
    assert_eq!(stored, api);
    assert_eq!(scopes.display_name(&stored), Some("API access"));
    assert_eq!(scopes.descriptions(&stored)["fr-FR"], "Accès à l'API");
    assert_eq!(scopes.resources(&stored), ["resource-server".to_owned()]);

    let stale = stored.clone();
    scopes.update(&mut api, &cancel).await.unwrap();
    assert!(scopes.delete(&stale, &cancel).await.unwrap_err().is_concurrency());

    scopes.delete(&api, &cancel).await.unwrap();
    assert_eq!(scopes.count(&cancel).await.unwrap(), 0);
}

#[tokio::test]
async fn test_list_pages_in_insertion_order() {
    let stores = stores().await;
    let scopes = stores.scopes();
    let cancel = cancel();

    for name in ["a", "b", "c", "d", "e"] {
        scopes.create(&scope(name, &[]), &cancel).await.unwrap();
    }

    let page: Vec<Scope> = scopes
        .list(Some(2), Some(1), &cancel)
        .map(Result::unwrap)
        .collect()
        .await;
    assert_eq!(names(page), vec!["b", "c"]);

    let long_names = scopes
        .count_by(|rows| rows.filter(|scope| scope.name.as_deref() > Some("c")), &cancel)
        .await
        .unwrap();
    assert_eq!(long_names, 2);
}
