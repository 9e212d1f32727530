use anyhow::{Context, Result};
use time::{Duration, OffsetDateTime};
use tokio_util::sync::CancellationToken;
use tracing::info;

use iddict_core::{AuthorizationStore, TokenStore};
use iddict_sqlite::SqliteStores;

use crate::cli::PruneArgs;
use crate::output::print_success;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PruneReport {
    pub tokens: u64,
    pub authorizations: u64,
}

pub async fn prune(
    stores: &SqliteStores,
    args: &PruneArgs,
    cancel: &CancellationToken,
) -> Result<()> {
    let threshold = OffsetDateTime::now_utc() - Duration::days(i64::from(args.older_than_days));
    let report = run(stores, threshold, cancel).await?;
    print_success(&format!(
        "Pruned {} token(s) and {} authorization(s) created before {}",
        report.tokens,
        report.authorizations,
        threshold.date()
    ));
    Ok(())
}

/// Prunes tokens first so that ad-hoc authorizations they referenced become
/// eligible in the same run.
pub async fn run(
    stores: &SqliteStores,
    threshold: OffsetDateTime,
    cancel: &CancellationToken,
) -> Result<PruneReport> {
    let tokens = stores
        .tokens()
        .prune(threshold, cancel)
        .await
        .context("failed to prune tokens")?;
    let authorizations = stores
        .authorizations()
        .prune(threshold, cancel)
        .await
        .context("failed to prune authorizations")?;

    info!(tokens, authorizations, "Prune finished");
    Ok(PruneReport {
        tokens,
        authorizations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use iddict_core::constants::{authorization_types, statuses};
    use iddict_core::{Authorization, Token};
    use iddict_sqlite::SqliteConfig;

    use crate::commands::open_stores;
    use crate::config::CliConfig;

    fn in_memory() -> SqliteStores {
        let config = CliConfig {
            database: SqliteConfig::in_memory(),
            ..CliConfig::default()
        };
        open_stores(&config).unwrap()
    }

    #[tokio::test]
    async fn test_prune_reports_both_counts() {
        let stores = in_memory();
        let cancel = CancellationToken::new();
        let old = OffsetDateTime::now_utc() - Duration::days(30);

        let mut authorization = Authorization::new();
        authorization.status = Some(statuses::VALID.into());
        authorization.kind = Some(authorization_types::AD_HOC.into());
        authorization.creation_date = Some(old);
        stores
            .authorizations()
            .create(&authorization, &cancel)
            .await
            .unwrap();

        // The ad-hoc authorization only becomes orphaned once its token is gone.
        let mut token = Token::new();
        token.authorization_id = Some(authorization.id.clone());
        token.status = Some(statuses::REDEEMED.into());
        token.creation_date = Some(old);
        stores.tokens().create(&token, &cancel).await.unwrap();

        let threshold = OffsetDateTime::now_utc() - Duration::days(14);
        let report = run(&stores, threshold, &cancel).await.unwrap();
        assert_eq!(
            report,
            PruneReport {
                tokens: 1,
                authorizations: 1
            }
        );
    }

    #[tokio::test]
    async fn test_cancelled_prune_fails() {
        let stores = in_memory();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = run(&stores, OffsetDateTime::now_utc(), &cancel)
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("failed to prune tokens"));
    }
}
