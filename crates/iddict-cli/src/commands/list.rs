use anyhow::{Context, Result};
use futures_util::TryStreamExt;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use iddict_core::{ApplicationStore, AuthorizationStore, EntityStream, ScopeStore, TokenStore};
use iddict_sqlite::SqliteStores;

use crate::cli::{EntityKind, ListArgs};
use crate::output::print_json;

pub async fn list(
    stores: &SqliteStores,
    args: &ListArgs,
    cancel: &CancellationToken,
) -> Result<()> {
    let value = fetch(stores, args, cancel).await?;
    print_json(&value)
}

/// Reads one page of `args.kind` as a JSON array.
pub async fn fetch(
    stores: &SqliteStores,
    args: &ListArgs,
    cancel: &CancellationToken,
) -> Result<Value> {
    let (count, offset) = (args.count, args.offset);
    let value = match args.kind {
        EntityKind::Applications => {
            to_json(stores.applications().list(count, offset, cancel)).await
        }
        EntityKind::Authorizations => {
            to_json(stores.authorizations().list(count, offset, cancel)).await
        }
        EntityKind::Scopes => to_json(stores.scopes().list(count, offset, cancel)).await,
        EntityKind::Tokens => to_json(stores.tokens().list(count, offset, cancel)).await,
    };
    value.with_context(|| format!("failed to list {:?}", args.kind).to_lowercase())
}

async fn to_json<T: Serialize>(rows: EntityStream<T>) -> Result<Value> {
    let rows: Vec<T> = rows.try_collect().await?;
    Ok(serde_json::to_value(rows)?)
}
