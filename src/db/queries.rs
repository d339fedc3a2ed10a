use rusqlite::{Connection, params, types::Value};
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;
use crate::util::{SECONDS_PER_DAY, now};

use super::from_row::{
    FromRow, HISTORY_COLS, PACKAGE_COLS, STORE_COLS, SUBSCRIPTION_COLS, USER_COLS,
    WEBHOOK_LOG_COLS, query_all, query_one,
};

fn gen_id() -> String {
    Uuid::new_v4().to_string()
}

/// Builder for dynamic UPDATE statements with optional fields.
/// Combines multiple field updates into a single query.
struct UpdateBuilder {
    table: &'static str,
    id: String,
    fields: Vec<(&'static str, Value)>,
    track_updated_at: bool,
}

impl UpdateBuilder {
    fn new(table: &'static str, id: &str) -> Self {
        Self {
            table,
            id: id.to_string(),
            fields: Vec::new(),
            track_updated_at: false,
        }
    }

    fn with_updated_at(mut self) -> Self {
        self.track_updated_at = true;
        self
    }

    fn set(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.fields.push((column, value.into()));
        self
    }

    fn set_opt<V: Into<Value>>(self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    /// Set a column to an explicit value (including NULL).
    fn set_nullable<V: Into<Value>>(mut self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.fields.push((column, v.into())),
            None => self.fields.push((column, Value::Null)),
        }
        self
    }

    fn execute(mut self, conn: &Connection) -> Result<bool> {
        if self.fields.is_empty() {
            return Ok(false);
        }
        if self.track_updated_at {
            self.fields.push(("updated_at", now().into()));
        }
        let sets: Vec<String> = self
            .fields
            .iter()
            .map(|(col, _)| format!("{} = ?", col))
            .collect();
        let mut values: Vec<Value> = self.fields.into_iter().map(|(_, v)| v).collect();
        values.push(self.id.into());
        let sql = format!("UPDATE {} SET {} WHERE id = ?", self.table, sets.join(", "));
        let affected = conn.execute(&sql, rusqlite::params_from_iter(values))?;
        Ok(affected > 0)
    }
}

// ============ Users ============

pub fn create_user(conn: &Connection, input: &CreateUser) -> Result<User> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO users (id, name, email, password_hash, role, email_verified_at, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            &id,
            &input.name,
            &input.email,
            &input.password_hash,
            &input.role,
            input.email_verified_at,
            now,
            now
        ],
    )?;

    Ok(User {
        id,
        name: input.name.clone(),
        email: input.email.clone(),
        password_hash: input.password_hash.clone(),
        role: input.role.clone(),
        email_verified_at: input.email_verified_at,
        api_token_hash: None,
        reset_token_hash: None,
        created_at: now,
        updated_at: now,
    })
}

pub fn get_user_by_id(conn: &Connection, id: &str) -> Result<Option<User>> {
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLS),
        &[&id],
    )
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE email = ?1", USER_COLS),
        &[&email],
    )
}

/// Sync name/email from a fresh platform user-info payload.
pub fn update_user_profile(conn: &Connection, id: &str, name: &str, email: &str) -> Result<bool> {
    UpdateBuilder::new("users", id)
        .with_updated_at()
        .set("name", name.to_string())
        .set("email", email.to_string())
        .execute(conn)
}

/// Store hashes for the API token and password-reset token minted during an
/// OAuth callback. Plaintext tokens go to the merchant, never to the DB.
pub fn set_user_auth_tokens(
    conn: &Connection,
    id: &str,
    api_token_hash: &str,
    reset_token_hash: &str,
) -> Result<bool> {
    UpdateBuilder::new("users", id)
        .with_updated_at()
        .set("api_token_hash", api_token_hash.to_string())
        .set("reset_token_hash", reset_token_hash.to_string())
        .execute(conn)
}

// ============ Stores ============

pub fn create_store(conn: &Connection, input: &CreateStore) -> Result<Store> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO stores (id, user_id, platform, merchant_id, store_id, domain, store_name,
                             store_email, store_phone, avatar, access_token, refresh_token,
                             token_expires_at, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            &id,
            &input.user_id,
            input.platform.to_string(),
            &input.merchant_id,
            &input.store_id,
            &input.domain,
            &input.store_name,
            &input.store_email,
            &input.store_phone,
            &input.avatar,
            &input.access_token,
            &input.refresh_token,
            input.token_expires_at,
            StoreStatus::Active.to_string(),
            now,
            now
        ],
    )?;

    Ok(Store {
        id,
        user_id: input.user_id.clone(),
        platform: input.platform,
        merchant_id: input.merchant_id.clone(),
        store_id: input.store_id.clone(),
        domain: input.domain.clone(),
        store_name: input.store_name.clone(),
        store_email: input.store_email.clone(),
        store_phone: input.store_phone.clone(),
        avatar: input.avatar.clone(),
        access_token: input.access_token.clone(),
        refresh_token: input.refresh_token.clone(),
        token_expires_at: input.token_expires_at,
        status: StoreStatus::Active,
        created_at: now,
        updated_at: now,
    })
}

pub fn get_store_by_id(conn: &Connection, id: &str) -> Result<Option<Store>> {
    query_one(
        conn,
        &format!("SELECT {} FROM stores WHERE id = ?1", STORE_COLS),
        &[&id],
    )
}

/// The webhook dedup key: one store per (merchant_id, platform).
pub fn get_store_by_merchant(
    conn: &Connection,
    merchant_id: &str,
    platform: Platform,
) -> Result<Option<Store>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM stores WHERE merchant_id = ?1 AND platform = ?2",
            STORE_COLS
        ),
        &[&merchant_id, &platform.to_string()],
    )
}

/// Re-authorization: refresh tokens and profile fields, flip status active.
pub fn reauthorize_store(conn: &Connection, id: &str, input: &ReauthorizeStore) -> Result<bool> {
    UpdateBuilder::new("stores", id)
        .with_updated_at()
        .set_opt("store_id", input.store_id.clone())
        .set_opt("domain", input.domain.clone())
        .set_opt("store_name", input.store_name.clone())
        .set_opt("store_email", input.store_email.clone())
        .set_opt("store_phone", input.store_phone.clone())
        .set_opt("avatar", input.avatar.clone())
        .set("access_token", input.access_token.clone())
        .set_nullable("refresh_token", input.refresh_token.clone())
        .set_nullable("token_expires_at", input.token_expires_at)
        .set("status", StoreStatus::Active.to_string())
        .execute(conn)
}

/// Persist a refreshed token set.
pub fn update_store_tokens(
    conn: &Connection,
    id: &str,
    access_token: &str,
    refresh_token: Option<&str>,
    token_expires_at: Option<i64>,
) -> Result<bool> {
    UpdateBuilder::new("stores", id)
        .with_updated_at()
        .set("access_token", access_token.to_string())
        .set_nullable("refresh_token", refresh_token.map(String::from))
        .set_nullable("token_expires_at", token_expires_at)
        .execute(conn)
}

pub fn set_store_status(conn: &Connection, id: &str, status: StoreStatus) -> Result<bool> {
    UpdateBuilder::new("stores", id)
        .with_updated_at()
        .set("status", status.to_string())
        .execute(conn)
}

/// Stores whose access token expires within one day (or already has) and
/// which hold a refresh token. With `force`, every refreshable store.
pub fn stores_needing_refresh(
    conn: &Connection,
    platform: Option<Platform>,
    force: bool,
) -> Result<Vec<Store>> {
    let cutoff = now() + SECONDS_PER_DAY;
    let mut sql = format!(
        "SELECT {} FROM stores WHERE refresh_token IS NOT NULL",
        STORE_COLS
    );
    let mut values: Vec<Value> = Vec::new();

    if !force {
        sql.push_str(" AND token_expires_at IS NOT NULL AND token_expires_at <= ?");
        values.push(cutoff.into());
    }
    if let Some(p) = platform {
        sql.push_str(" AND platform = ?");
        values.push(p.to_string().into());
    }
    sql.push_str(" ORDER BY token_expires_at ASC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(values), Store::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ Packages ============

pub fn create_package(conn: &Connection, input: &CreatePackage) -> Result<Package> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO packages (id, name, display_name, description, platform, price, currency,
                               billing_cycle, photos_limit, is_active, is_featured, sort_order,
                               created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            &id,
            &input.name,
            &input.display_name,
            &input.description,
            input.platform.to_string(),
            input.price,
            &input.currency,
            input.billing_cycle.to_string(),
            input.photos_limit,
            input.is_active,
            input.is_featured,
            input.sort_order,
            now,
            now
        ],
    )?;

    Ok(Package {
        id,
        name: input.name.clone(),
        display_name: input.display_name.clone(),
        description: input.description.clone(),
        platform: input.platform,
        price: input.price,
        currency: input.currency.clone(),
        billing_cycle: input.billing_cycle,
        photos_limit: input.photos_limit,
        is_active: input.is_active,
        is_featured: input.is_featured,
        sort_order: input.sort_order,
        created_at: now,
        updated_at: now,
    })
}

pub fn get_package_by_id(conn: &Connection, id: &str) -> Result<Option<Package>> {
    query_one(
        conn,
        &format!("SELECT {} FROM packages WHERE id = ?1", PACKAGE_COLS),
        &[&id],
    )
}

/// Resolve a billing platform's plan identifier to a package.
///
/// Exact name match, scoped to the platform or 'all'. The match algorithm is
/// load-bearing: production plan names couple directly to package names.
pub fn find_package_by_plan_name(
    conn: &Connection,
    plan_name: &str,
    platform: Platform,
) -> Result<Option<Package>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM packages WHERE name = ?1 AND platform IN (?2, 'all') LIMIT 1",
            PACKAGE_COLS
        ),
        &[&plan_name, &platform.to_string()],
    )
}

// ============ Subscriptions ============

pub fn get_subscription_by_id(conn: &Connection, id: &str) -> Result<Option<Subscription>> {
    query_one(
        conn,
        &format!("SELECT {} FROM subscriptions WHERE id = ?1", SUBSCRIPTION_COLS),
        &[&id],
    )
}

/// The uniqueness invariant lives here: at most one subscription per
/// (user, platform).
pub fn get_subscription_by_user_platform(
    conn: &Connection,
    user_id: &str,
    platform: Platform,
) -> Result<Option<Subscription>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM subscriptions WHERE user_id = ?1 AND platform = ?2",
            SUBSCRIPTION_COLS
        ),
        &[&user_id, &platform.to_string()],
    )
}

pub fn create_subscription(conn: &Connection, input: &CreateSubscription) -> Result<Subscription> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO subscriptions (id, user_id, package_id, platform, merchant_id, subscription_id,
                                    status, package_data, photos_limit, photos_used, start_date,
                                    end_date, trial_ends_at, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 0, ?10, ?11, ?12, ?13, ?14)",
        params![
            &id,
            &input.user_id,
            &input.package_id,
            input.platform.to_string(),
            &input.merchant_id,
            &input.subscription_id,
            input.status.to_string(),
            input.package_data.to_string(),
            input.photos_limit,
            input.start_date,
            input.end_date,
            input.trial_ends_at,
            now,
            now
        ],
    )?;

    Ok(Subscription {
        id,
        user_id: input.user_id.clone(),
        package_id: input.package_id.clone(),
        platform: input.platform,
        merchant_id: input.merchant_id.clone(),
        subscription_id: input.subscription_id.clone(),
        status: input.status,
        package_data: input.package_data.clone(),
        photos_limit: input.photos_limit,
        photos_used: 0,
        start_date: input.start_date,
        end_date: input.end_date,
        trial_ends_at: input.trial_ends_at,
        cancelled_at: None,
        created_at: now,
        updated_at: now,
    })
}

pub fn update_subscription(
    conn: &Connection,
    id: &str,
    input: &UpdateSubscription,
) -> Result<bool> {
    let mut builder = UpdateBuilder::new("subscriptions", id).with_updated_at();

    if let Some(package_id) = &input.package_id {
        builder = builder.set_nullable("package_id", package_id.clone());
    }
    builder = builder.set_opt("merchant_id", input.merchant_id.clone());
    if let Some(subscription_id) = &input.subscription_id {
        builder = builder.set_nullable("subscription_id", subscription_id.clone());
    }
    if let Some(status) = input.status {
        builder = builder.set("status", status.to_string());
    }
    if let Some(package_data) = &input.package_data {
        builder = builder.set("package_data", package_data.to_string());
    }
    builder = builder.set_opt("photos_limit", input.photos_limit);
    if let Some(start_date) = input.start_date {
        builder = builder.set_nullable("start_date", start_date);
    }
    if let Some(end_date) = input.end_date {
        builder = builder.set_nullable("end_date", end_date);
    }
    if let Some(trial_ends_at) = input.trial_ends_at {
        builder = builder.set_nullable("trial_ends_at", trial_ends_at);
    }
    if let Some(cancelled_at) = input.cancelled_at {
        builder = builder.set_nullable("cancelled_at", cancelled_at);
    }

    builder.execute(conn)
}

/// Atomically consume photo credits.
///
/// The guard and the increment happen in one UPDATE so concurrent job
/// workers can never push photos_used past photos_limit. Returns false when
/// the subscription is unusable or the quota would be exceeded.
pub fn consume_photos(conn: &Connection, subscription_id: &str, count: i64) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE subscriptions
         SET photos_used = photos_used + ?1, updated_at = ?2
         WHERE id = ?3
           AND status IN ('active', 'trial')
           AND (photos_limit = 0 OR photos_used + ?1 <= photos_limit)",
        params![count, now(), subscription_id],
    )?;
    Ok(affected > 0)
}

// ============ Subscription histories ============

pub fn create_history(conn: &Connection, input: &CreateHistory) -> Result<SubscriptionHistory> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO subscription_histories (id, subscription_id, user_id, package_id, platform,
                                             event_type, status, package_data, changes, price,
                                             start_date, end_date, webhook_payload, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            &id,
            &input.subscription_id,
            &input.user_id,
            &input.package_id,
            input.platform.to_string(),
            input.event_type.to_string(),
            input.status.to_string(),
            input.package_data.to_string(),
            input.changes.as_ref().map(|c| c.to_string()),
            input.price,
            input.start_date,
            input.end_date,
            input.webhook_payload.to_string(),
            now
        ],
    )?;

    Ok(SubscriptionHistory {
        id,
        subscription_id: input.subscription_id.clone(),
        user_id: input.user_id.clone(),
        package_id: input.package_id.clone(),
        platform: input.platform,
        event_type: input.event_type,
        status: input.status,
        package_data: input.package_data.clone(),
        changes: input.changes.clone(),
        price: input.price,
        start_date: input.start_date,
        end_date: input.end_date,
        webhook_payload: input.webhook_payload.clone(),
        created_at: now,
    })
}

pub fn list_histories_for_subscription(
    conn: &Connection,
    subscription_id: &str,
) -> Result<Vec<SubscriptionHistory>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM subscription_histories WHERE subscription_id = ?1 ORDER BY rowid ASC",
            HISTORY_COLS
        ),
        &[&subscription_id],
    )
}

// ============ Webhook logs ============

pub fn create_webhook_log(conn: &Connection, input: &CreateWebhookLog) -> Result<WebhookLog> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO webhook_logs (id, event, platform, merchant_id, user_id, store_id, payload,
                                   status, webhook_created_at, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            &id,
            &input.event,
            input.platform.to_string(),
            &input.merchant_id,
            &input.user_id,
            &input.store_id,
            input.payload.to_string(),
            WebhookStatus::Pending.to_string(),
            input.webhook_created_at,
            now
        ],
    )?;

    Ok(WebhookLog {
        id,
        event: input.event.clone(),
        platform: input.platform,
        merchant_id: input.merchant_id.clone(),
        user_id: input.user_id.clone(),
        store_id: input.store_id.clone(),
        payload: input.payload.clone(),
        status: WebhookStatus::Pending,
        error_message: None,
        processed_at: None,
        webhook_created_at: input.webhook_created_at,
        created_at: now,
    })
}

pub fn get_webhook_log(conn: &Connection, id: &str) -> Result<Option<WebhookLog>> {
    query_one(
        conn,
        &format!("SELECT {} FROM webhook_logs WHERE id = ?1", WEBHOOK_LOG_COLS),
        &[&id],
    )
}

pub fn mark_webhook_processed(conn: &Connection, id: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE webhook_logs SET status = 'processed', processed_at = ?1 WHERE id = ?2",
        params![now(), id],
    )?;
    Ok(affected > 0)
}

pub fn mark_webhook_failed(conn: &Connection, id: &str, error: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE webhook_logs SET status = 'failed', error_message = ?1, processed_at = ?2 WHERE id = ?3",
        params![error, now(), id],
    )?;
    Ok(affected > 0)
}

pub fn list_webhook_logs_for_merchant(
    conn: &Connection,
    merchant_id: &str,
    platform: Platform,
) -> Result<Vec<WebhookLog>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM webhook_logs WHERE merchant_id = ?1 AND platform = ?2 ORDER BY rowid ASC",
            WEBHOOK_LOG_COLS
        ),
        &[&merchant_id, &platform.to_string()],
    )
}
