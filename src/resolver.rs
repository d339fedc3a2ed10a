//! Merchant resolver: maps a platform-reported merchant to an internal
//! account and store connection.
//!
//! Resolution order is load-bearing: the merchant-id match must win over the
//! email match, otherwise a stale email-matched account could resurrect when
//! merchant identity is the true dedup key.

use rusqlite::Connection;

use crate::db::queries;
use crate::error::Result;
use crate::models::{CreateStore, CreateUser, ReauthorizeStore, Platform, Store, User};
use crate::platforms::{PlatformUserInfo, TokenSet};
use crate::util::{generate_secret, hash_secret, now};

/// Role assigned to accounts created through store authorization.
const DEFAULT_ROLE: &str = "client";

/// Resolve a platform user-info payload plus token set to an owning account
/// and store connection, creating either as needed.
///
/// Runs in one transaction: a failure partway rolls back the whole
/// resolution, so a store connection can never exist without its account.
pub fn resolve(
    conn: &mut Connection,
    platform: Platform,
    info: &PlatformUserInfo,
    token: &TokenSet,
) -> Result<(User, Store)> {
    let tx = conn.transaction()?;

    // 1. Merchant already connected on this platform: re-authorization.
    if let Some(store) = queries::get_store_by_merchant(&tx, &info.merchant_id, platform)? {
        queries::reauthorize_store(
            &tx,
            &store.id,
            &ReauthorizeStore {
                store_id: info.store_id.clone(),
                domain: info.domain.clone(),
                store_name: info.store_name.clone(),
                store_email: Some(info.email.clone()),
                store_phone: info.mobile.clone(),
                avatar: info.avatar.clone(),
                access_token: token.access_token.clone(),
                refresh_token: token.refresh_token.clone(),
                token_expires_at: token.expires_at(),
            },
        )?;
        queries::update_user_profile(&tx, &store.user_id, &info.name, &info.email)?;

        let user = queries::get_user_by_id(&tx, &store.user_id)?.ok_or_else(|| {
            crate::error::AppError::Internal(format!(
                "store {} has no owning user",
                store.id
            ))
        })?;
        let store = queries::get_store_by_id(&tx, &store.id)?.ok_or_else(|| {
            crate::error::AppError::Internal("store vanished during resolve".to_string())
        })?;

        tx.commit()?;
        tracing::info!(
            "Re-authorized store {} for merchant {} on {}",
            store.id,
            info.merchant_id,
            platform
        );
        return Ok((user, store));
    }

    // 2. A human can own stores on several platforms: attach by email.
    let user = match queries::get_user_by_email(&tx, &info.email)? {
        Some(user) => user,
        // 3. First contact: create the account with a random pre-verified
        //    password and the default client role.
        None => {
            let password = generate_secret(12);
            queries::create_user(
                &tx,
                &CreateUser {
                    name: info.name.clone(),
                    email: info.email.clone(),
                    password_hash: hash_secret(&password),
                    role: DEFAULT_ROLE.to_string(),
                    email_verified_at: Some(now()),
                },
            )?
        }
    };

    let store = queries::create_store(
        &tx,
        &CreateStore {
            user_id: user.id.clone(),
            platform,
            merchant_id: info.merchant_id.clone(),
            store_id: info.store_id.clone(),
            domain: info.domain.clone(),
            store_name: info.store_name.clone(),
            store_email: Some(info.email.clone()),
            store_phone: info.mobile.clone(),
            avatar: info.avatar.clone(),
            access_token: Some(token.access_token.clone()),
            refresh_token: token.refresh_token.clone(),
            token_expires_at: token.expires_at(),
        },
    )?;

    tx.commit()?;
    tracing::info!(
        "Connected store {} for merchant {} on {} (user {})",
        store.id,
        info.merchant_id,
        platform,
        user.id
    );
    Ok((user, store))
}
