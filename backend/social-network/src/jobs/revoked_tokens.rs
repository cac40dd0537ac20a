use std::time::Duration;

use chrono::Utc;
use tokio::time::sleep;

use crate::repository::Repositories;

/// Revoked entries are only needed until the token would have expired
const PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

pub async fn start_revoked_token_purger(repos: Repositories) {
    tracing::info!(
        interval_mins = PURGE_INTERVAL.as_secs() / 60,
        "Starting revoked token purger"
    );

    loop {
        sleep(PURGE_INTERVAL).await;

        match repos.revoked_tokens.purge_expired(Utc::now()).await {
            Ok(0) => tracing::debug!("No expired revoked tokens"),
            Ok(purged) => tracing::info!(purged, "Purged expired revoked tokens"),
            Err(e) => tracing::error!(error = %e, "Revoked token purge failed"),
        }
    }
}
