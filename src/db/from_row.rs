//! Row mapping trait and helpers for reducing boilerplate in queries.
//!
//! Models implement `FromRow` to define how they are constructed from
//! database rows; `query_one` / `query_all` cover the common query shapes.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::*;

/// Parse a string column into an enum type, converting parse errors to
/// rusqlite errors instead of panicking on corrupted values.
fn parse_enum<T: std::str::FromStr>(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<T> {
    row.get::<_, String>(col)?.parse::<T>().map_err(|_| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

/// Parse a TEXT column holding JSON, treating NULL as JSON null.
fn parse_json(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<serde_json::Value> {
    match row.get::<_, Option<String>>(col)? {
        Some(text) => serde_json::from_str(&text).map_err(|_| {
            rusqlite::Error::InvalidColumnType(
                col,
                col_name.to_string(),
                rusqlite::types::Type::Text,
            )
        }),
        None => Ok(serde_json::Value::Null),
    }
}

fn parse_json_opt(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<Option<serde_json::Value>> {
    match row.get::<_, Option<String>>(col)? {
        Some(text) => serde_json::from_str(&text).map(Some).map_err(|_| {
            rusqlite::Error::InvalidColumnType(
                col,
                col_name.to_string(),
                rusqlite::types::Type::Text,
            )
        }),
        None => Ok(None),
    }
}

/// Trait for constructing a type from a database row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ SQL SELECT Constants ============

pub const USER_COLS: &str = "id, name, email, password_hash, role, email_verified_at, api_token_hash, reset_token_hash, created_at, updated_at";

pub const STORE_COLS: &str = "id, user_id, platform, merchant_id, store_id, domain, store_name, store_email, store_phone, avatar, access_token, refresh_token, token_expires_at, status, created_at, updated_at";

pub const PACKAGE_COLS: &str = "id, name, display_name, description, platform, price, currency, billing_cycle, photos_limit, is_active, is_featured, sort_order, created_at, updated_at";

pub const SUBSCRIPTION_COLS: &str = "id, user_id, package_id, platform, merchant_id, subscription_id, status, package_data, photos_limit, photos_used, start_date, end_date, trial_ends_at, cancelled_at, created_at, updated_at";

pub const HISTORY_COLS: &str = "id, subscription_id, user_id, package_id, platform, event_type, status, package_data, changes, price, start_date, end_date, webhook_payload, created_at";

pub const WEBHOOK_LOG_COLS: &str = "id, event, platform, merchant_id, user_id, store_id, payload, status, error_message, processed_at, webhook_created_at, created_at";

// ============ FromRow Implementations ============

impl FromRow for User {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            role: row.get(4)?,
            email_verified_at: row.get(5)?,
            api_token_hash: row.get(6)?,
            reset_token_hash: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }
}

impl FromRow for Store {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Store {
            id: row.get(0)?,
            user_id: row.get(1)?,
            platform: parse_enum(row, 2, "platform")?,
            merchant_id: row.get(3)?,
            store_id: row.get(4)?,
            domain: row.get(5)?,
            store_name: row.get(6)?,
            store_email: row.get(7)?,
            store_phone: row.get(8)?,
            avatar: row.get(9)?,
            access_token: row.get(10)?,
            refresh_token: row.get(11)?,
            token_expires_at: row.get(12)?,
            status: parse_enum(row, 13, "status")?,
            created_at: row.get(14)?,
            updated_at: row.get(15)?,
        })
    }
}

impl FromRow for Package {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Package {
            id: row.get(0)?,
            name: row.get(1)?,
            display_name: row.get(2)?,
            description: row.get(3)?,
            platform: parse_enum(row, 4, "platform")?,
            price: row.get(5)?,
            currency: row.get(6)?,
            billing_cycle: parse_enum(row, 7, "billing_cycle")?,
            photos_limit: row.get(8)?,
            is_active: row.get(9)?,
            is_featured: row.get(10)?,
            sort_order: row.get(11)?,
            created_at: row.get(12)?,
            updated_at: row.get(13)?,
        })
    }
}

impl FromRow for Subscription {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Subscription {
            id: row.get(0)?,
            user_id: row.get(1)?,
            package_id: row.get(2)?,
            platform: parse_enum(row, 3, "platform")?,
            merchant_id: row.get(4)?,
            subscription_id: row.get(5)?,
            status: parse_enum(row, 6, "status")?,
            package_data: parse_json(row, 7, "package_data")?,
            photos_limit: row.get(8)?,
            photos_used: row.get(9)?,
            start_date: row.get(10)?,
            end_date: row.get(11)?,
            trial_ends_at: row.get(12)?,
            cancelled_at: row.get(13)?,
            created_at: row.get(14)?,
            updated_at: row.get(15)?,
        })
    }
}

impl FromRow for SubscriptionHistory {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(SubscriptionHistory {
            id: row.get(0)?,
            subscription_id: row.get(1)?,
            user_id: row.get(2)?,
            package_id: row.get(3)?,
            platform: parse_enum(row, 4, "platform")?,
            event_type: parse_enum(row, 5, "event_type")?,
            status: parse_enum(row, 6, "status")?,
            package_data: parse_json(row, 7, "package_data")?,
            changes: parse_json_opt(row, 8, "changes")?,
            price: row.get(9)?,
            start_date: row.get(10)?,
            end_date: row.get(11)?,
            webhook_payload: parse_json(row, 12, "webhook_payload")?,
            created_at: row.get(13)?,
        })
    }
}

impl FromRow for WebhookLog {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(WebhookLog {
            id: row.get(0)?,
            event: row.get(1)?,
            platform: parse_enum(row, 2, "platform")?,
            merchant_id: row.get(3)?,
            user_id: row.get(4)?,
            store_id: row.get(5)?,
            payload: parse_json(row, 6, "payload")?,
            status: parse_enum(row, 7, "status")?,
            error_message: row.get(8)?,
            processed_at: row.get(9)?,
            webhook_created_at: row.get(10)?,
            created_at: row.get(11)?,
        })
    }
}
