//! Application store against an in-memory database.

mod common;

use futures_util::StreamExt;

use iddict_core::{Application, ApplicationStore, AuthorizationStore, StoreError, TokenStore};

use common::{application, authorization, cancel, collect, days_ago, stores, token};

#[tokio::test]
async fn test_count_delete_and_lookup_by_client_id() {
    let stores = stores().await;
    let applications = stores.applications();
    let cancel = cancel();

    applications.create(&application("c1"), &cancel).await.unwrap();
    let c2 = application("c2");
    applications.create(&c2, &cancel).await.unwrap();

    assert_eq!(applications.count(&cancel).await.unwrap(), 2);
    assert_eq!(
        applications
            .count_by(
                |rows| rows.filter(|app| app.client_id.as_deref() == Some("c2")),
                &cancel
            )
            .await
            .unwrap(),
        1
    );

    applications.delete(&c2, &cancel).await.unwrap();
    assert!(
        applications
            .find_by_client_id("c2", &cancel)
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        applications
            .find_by_client_id("c1", &cancel)
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn test_update_with_stale_token_fails() {
    let stores = stores().await;
    let applications = stores.applications();
    let cancel = cancel();

    let mut app = application("c1");
    applications.create(&app, &cancel).await.unwrap();
    let mut stale = app.clone();

    let before = app.concurrency_token.clone();
    applications.update(&mut app, &cancel).await.unwrap();
    assert_ne!(app.concurrency_token, before);

    let err = applications.update(&mut stale, &cancel).await.unwrap_err();
    assert!(err.is_concurrency());
    assert!(err.to_string().contains("Reload the application"));

    applications.update(&mut app, &cancel).await.unwrap();

    let err = applications.delete(&stale, &cancel).await.unwrap_err();
    assert!(err.is_concurrency());
    applications.delete(&app, &cancel).await.unwrap();
}

#[tokio::test]
async fn test_update_persists_changes() {
    let stores = stores().await;
    let applications = stores.applications();
    let cancel = cancel();

    let mut app = application("c1");
    applications.create(&app, &cancel).await.unwrap();

    applications.set_display_name(&mut app, Some("Dashboard".into()));
    applications.set_redirect_uris(&mut app, vec!["https://app.example/cb".into()]);
    applications.set_permissions(&mut app, Vec::new());
    applications.update(&mut app, &cancel).await.unwrap();

    let stored = applications
        .find_by_id(&app.id, &cancel)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored, app);
    assert_eq!(applications.display_name(&stored), Some("Dashboard"));
    assert!(stored.permissions.is_none());
}

#[tokio::test]
async fn test_delete_cascades_to_authorizations_and_tokens() {
    let stores = stores().await;
    let applications = stores.applications();
    let authorizations = stores.authorizations();
    let tokens = stores.tokens();
    let cancel = cancel();

    let app = application("c1");
    let other = application("c2");
    applications.create(&app, &cancel).await.unwrap();
    applications.create(&other, &cancel).await.unwrap();

    for _ in 0..3 {
        let auth = authorization(Some(&app.id), "alice", "valid", "permanent", days_ago(0));
        authorizations.create(&auth, &cancel).await.unwrap();
        tokens
            .create(&token(Some(&app.id), Some(&auth.id), "valid", days_ago(0)), &cancel)
            .await
            .unwrap();
    }
    tokens
        .create(&token(Some(&app.id), None, "valid", days_ago(0)), &cancel)
        .await
        .unwrap();
    let kept = authorization(Some(&other.id), "bob", "valid", "permanent", days_ago(0));
    authorizations.create(&kept, &cancel).await.unwrap();

    applications.delete(&app, &cancel).await.unwrap();

    assert!(collect(authorizations.find_by_application_id(&app.id, &cancel)).await.is_empty());
    assert!(collect(tokens.find_by_application_id(&app.id, &cancel)).await.is_empty());
    assert_eq!(authorizations.count(&cancel).await.unwrap(), 1);
    assert_eq!(tokens.count(&cancel).await.unwrap(), 0);
}

#[tokio::test]
async fn test_stale_delete_leaves_dependents_untouched() {
    let stores = stores().await;
    let applications = stores.applications();
    let authorizations = stores.authorizations();
    let cancel = cancel();

    let mut app = application("c1");
    applications.create(&app, &cancel).await.unwrap();
    let stale = app.clone();
    applications.update(&mut app, &cancel).await.unwrap();

    let auth = authorization(Some(&app.id), "alice", "valid", "permanent", days_ago(0));
    authorizations.create(&auth, &cancel).await.unwrap();

    assert!(applications.delete(&stale, &cancel).await.unwrap_err().is_concurrency());
    assert_eq!(authorizations.count(&cancel).await.unwrap(), 1);
}

#[tokio::test]
async fn test_instantiate_returns_fresh_entities() {
    let stores = stores().await;
    let applications = stores.applications();

    let first = applications.instantiate().unwrap();
    let second = applications.instantiate().unwrap();

    assert_ne!(first.id, second.id);
    assert_ne!(first.concurrency_token, second.concurrency_token);
    assert_eq!(first.client_id, None);
    assert!(first.redirect_uris.is_none());
}

#[tokio::test]
async fn test_pagination_is_stable_and_complete() {
    let stores = stores().await;
    let applications = stores.applications();
    let cancel = cancel();

    let mut created = Vec::new();
    for i in 0..7 {
        let app = application(&format!("client-{i}"));
        applications.create(&app, &cancel).await.unwrap();
        created.push(app.id);
    }

    // Updates keep the insertion position.
    let mut first = applications
        .find_by_id(&created[0], &cancel)
        .await
        .unwrap()
        .unwrap();
    applications.update(&mut first, &cancel).await.unwrap();

    let mut seen = Vec::new();
    for (offset, expected) in [(0, 3), (3, 3), (6, 1), (9, 0)] {
        let page: Vec<Application> = applications
            .list(Some(3), Some(offset), &cancel)
            .map(Result::unwrap)
            .collect()
            .await;
        assert_eq!(page.len(), expected, "offset {offset}");
        seen.extend(page.into_iter().map(|app| app.id));
    }
    assert_eq!(seen, created);

    let all: Vec<Application> = applications
        .list(None, None, &cancel)
        .map(Result::unwrap)
        .collect()
        .await;
    assert_eq!(all.len(), 7);

    let tail: Vec<Application> = applications
        .list(None, Some(5), &cancel)
        .map(Result::unwrap)
        .collect()
        .await;
    assert_eq!(tail.len(), 2);
}

#[tokio::test]
async fn test_find_by_redirect_uris() {
    let stores = stores().await;
    let applications = stores.applications();
    let cancel = cancel();

    let mut web = application("web");
    web.redirect_uris = Some(vec!["https://web.example/cb".into()]);
    web.post_logout_redirect_uris = Some(vec!["https://web.example/bye".into()]);
    let mut spa = application("spa");
    spa.redirect_uris = Some(vec![
        "https://spa.example/cb".into(),
        "https://web.example/cb".into(),
    ]);
    applications.create(&web, &cancel).await.unwrap();
    applications.create(&spa, &cancel).await.unwrap();
    applications.create(&application("cli"), &cancel).await.unwrap();

    let found = collect(applications.find_by_redirect_uri("https://web.example/cb", &cancel)).await;
    let ids: Vec<_> = found.iter().map(|app| app.client_id.as_deref()).collect();
    assert_eq!(ids, vec![Some("web"), Some("spa")]);

    let found = collect(
        applications.find_by_post_logout_redirect_uri("https://web.example/bye", &cancel),
    )
    .await;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, web.id);

    assert!(
        collect(applications.find_by_redirect_uri("https://unknown.example", &cancel))
            .await
            .is_empty()
    );
}

#[tokio::test]
async fn test_duplicate_client_id_is_a_conflict() {
    let stores = stores().await;
    let applications = stores.applications();
    let cancel = cancel();

    applications.create(&application("dup"), &cancel).await.unwrap();
    let err = applications
        .create(&application("dup"), &cancel)
        .await
        .unwrap_err();
    assert!(err.is_conflict());
}

#[tokio::test]
async fn test_empty_arguments_are_rejected() {
    let stores = stores().await;
    let applications = stores.applications();
    let cancel = cancel();

    let err = applications.find_by_client_id("", &cancel).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::InvalidArgument {
            parameter: "client_id",
            ..
        }
    ));
    assert!(applications.find_by_id("", &cancel).await.unwrap_err().is_invalid_argument());
    assert!(applications.find_by_redirect_uri("", &cancel).is_err());
    assert!(applications.find_by_post_logout_redirect_uri("", &cancel).is_err());
}

#[tokio::test]
async fn test_get_and_list_by_run_caller_queries() {
    let stores = stores().await;
    let applications = stores.applications();
    let cancel = cancel();

    for client_id in ["alpha", "beta", "gamma"] {
        applications.create(&application(client_id), &cancel).await.unwrap();
    }

    let found = applications
        .get(
            |rows, prefix: String| {
                rows.filter_map(move |app| app.client_id.filter(|id| id.starts_with(&prefix)))
            },
            "g".to_owned(),
            &cancel,
        )
        .await
        .unwrap();
    assert_eq!(found.as_deref(), Some("gamma"));

    let none = applications
        .get(|rows, _: ()| rows.filter(|_| false), (), &cancel)
        .await
        .unwrap();
    assert!(none.is_none());

    let ids: Vec<String> = applications
        .list_by(
            |rows, skip: usize| rows.skip(skip).filter_map(|app| app.client_id),
            1,
            &cancel,
        )
        .map(Result::unwrap)
        .collect()
        .await;
    assert_eq!(ids, vec!["beta", "gamma"]);
}

#[tokio::test]
async fn test_cancellation() {
    let stores = stores().await;
    let applications = stores.applications();
    let live = cancel();

    for i in 0..3 {
        applications
            .create(&application(&format!("client-{i}")), &live)
            .await
            .unwrap();
    }

    let cancelled = cancel();
    cancelled.cancel();
    assert!(applications.count(&cancelled).await.unwrap_err().is_cancelled());
    assert!(
        applications
            .create(&application("late"), &cancelled)
            .await
            .unwrap_err()
            .is_cancelled()
    );
    let mut rows = applications.list(None, None, &cancelled);
    assert!(rows.next().await.unwrap().unwrap_err().is_cancelled());

    let stopping = cancel();
    let mut rows = applications.list(None, None, &stopping);
    assert!(rows.next().await.unwrap().is_ok());
    stopping.cancel();
    assert!(rows.next().await.is_none());

    assert_eq!(applications.count(&live).await.unwrap(), 3);
}
