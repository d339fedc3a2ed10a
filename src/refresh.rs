//! Token refresh sweep.
//!
//! Scans for stores whose access token expires within a day and exchanges
//! their refresh tokens. Each store is handled independently: one merchant's
//! revoked grant must never block the rest of the sweep.

use crate::config::Config;
use crate::db::{DbPool, queries};
use crate::error::{AppError, Result};
use crate::models::{Platform, Store};
use crate::platforms;

#[derive(Debug, Clone, Copy, Default)]
pub struct RefreshOptions {
    /// Restrict the sweep to one platform.
    pub platform: Option<Platform>,
    /// Refresh every store holding a refresh token, not just expiring ones.
    pub force: bool,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Run one refresh sweep and return per-store counts.
///
/// Returns `Err` only for infrastructure failures (pool, query); per-store
/// refresh failures are counted and logged, never propagated.
pub async fn run(pool: &DbPool, config: &Config, options: RefreshOptions) -> Result<RefreshSummary> {
    let stores = {
        let conn = pool.get()?;
        queries::stores_needing_refresh(&conn, options.platform, options.force)?
    };

    let mut summary = RefreshSummary {
        attempted: stores.len(),
        ..Default::default()
    };
    tracing::info!(
        "Refreshing tokens for {} store(s){}",
        stores.len(),
        if options.force { " (forced)" } else { "" }
    );

    for store in stores {
        match refresh_store(pool, config, &store).await {
            Ok(()) => {
                summary.succeeded += 1;
                tracing::info!("Refreshed token for store {} ({})", store.id, store.platform);
            }
            Err(e) => {
                summary.failed += 1;
                tracing::error!("Failed to refresh store {}: {}", store.id, e);
            }
        }
    }

    tracing::info!(
        "Refresh sweep done: {} attempted, {} succeeded, {} failed",
        summary.attempted,
        summary.succeeded,
        summary.failed
    );
    Ok(summary)
}

/// Refresh one store's token set.
///
/// Fails with `MissingRefreshToken` when the store holds no refresh token;
/// retrying cannot succeed and the merchant must re-authorize. The sweep's
/// selection query never picks such stores, but callers refreshing a single
/// store on demand can hit it.
pub async fn refresh_store(pool: &DbPool, config: &Config, store: &Store) -> Result<()> {
    let refresh_token = store
        .refresh_token
        .as_deref()
        .ok_or_else(|| AppError::MissingRefreshToken(store.id.clone()))?;

    let token = platforms::refresh_token(store.platform, config, refresh_token).await?;

    let conn = pool.get()?;
    // Platforms that rotate refresh tokens send a new one; keep the old one
    // when they don't.
    let next_refresh = token.refresh_token.as_deref().or(Some(refresh_token));
    queries::update_store_tokens(
        &conn,
        &store.id,
        &token.access_token,
        next_refresh,
        token.expires_at(),
    )?;
    Ok(())
}
