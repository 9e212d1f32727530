use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use iddict_core::{ApplicationStore, AuthorizationStore, ScopeStore, TokenStore};
use iddict_sqlite::SqliteStores;

use crate::output::print_count;

pub async fn stats(stores: &SqliteStores, cancel: &CancellationToken) -> Result<()> {
    let applications = stores
        .applications()
        .count(cancel)
        .await
        .context("failed to count applications")?;
    let authorizations = stores
        .authorizations()
        .count(cancel)
        .await
        .context("failed to count authorizations")?;
    let scopes = stores
        .scopes()
        .count(cancel)
        .await
        .context("failed to count scopes")?;
    let tokens = stores
        .tokens()
        .count(cancel)
        .await
        .context("failed to count tokens")?;

    print_count("Applications", applications);
    print_count("Authorizations", authorizations);
    print_count("Scopes", scopes);
    print_count("Tokens", tokens);
    Ok(())
}
