//! Webhook ingestion gateway.
//!
//! Every authenticated request gets a `webhook_logs` row before any
//! processing, so a crash mid-event still leaves an auditable record.
//! Unknown event names are logged and acknowledged rather than rejected,
//! since platforms add event types without notice.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use rusqlite::Connection;
use serde_json::{Value, json};

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::lifecycle;
use crate::models::{CreateWebhookLog, Platform, StoreStatus, WebhookEvent};
use crate::platforms::{self, TokenSet};
use crate::resolver;
use crate::util::{now, parse_event_date};

/// POST /webhooks/{platform}
pub async fn receive(
    State(state): State<AppState>,
    Path(platform): Path<Platform>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Result<Json<Value>> {
    // Authenticate before touching the database: rejected requests must
    // leave no trace an attacker could use to probe merchant ids.
    if !platforms::validate_webhook(platform, &state.config, &headers)? {
        return Err(AppError::Unauthorized);
    }

    let event_name = payload["event"]
        .as_str()
        .map(String::from)
        .ok_or_else(|| AppError::BadRequest("Missing event field".to_string()))?;
    let merchant_id = id_string(&payload["merchant"]);

    let mut conn = state.db.get()?;

    let (user_id, store_id) = match &merchant_id {
        Some(merchant) => match queries::get_store_by_merchant(&conn, merchant, platform)? {
            Some(store) => (Some(store.user_id), Some(store.id)),
            None => (None, None),
        },
        None => (None, None),
    };

    let log = queries::create_webhook_log(
        &conn,
        &CreateWebhookLog {
            event: event_name.clone(),
            platform,
            merchant_id: merchant_id.clone(),
            user_id,
            store_id,
            payload: payload.clone(),
            webhook_created_at: payload["created_at"].as_str().and_then(parse_event_date),
        },
    )?;

    let Ok(event) = event_name.parse::<WebhookEvent>() else {
        tracing::warn!("Ignoring unhandled {} webhook event '{}'", platform, event_name);
        queries::mark_webhook_processed(&conn, &log.id)?;
        return Ok(Json(json!({ "status": "ignored", "log_id": log.id })));
    };

    match process_event(
        &state,
        &mut conn,
        platform,
        event,
        merchant_id.as_deref(),
        &payload,
    )
    .await
    {
        Ok(()) => {
            queries::mark_webhook_processed(&conn, &log.id)?;
            Ok(Json(json!({ "status": "processed", "log_id": log.id })))
        }
        Err(e) => {
            queries::mark_webhook_failed(&conn, &log.id, &e.to_string())?;
            Err(e)
        }
    }
}

async fn process_event(
    state: &AppState,
    conn: &mut Connection,
    platform: Platform,
    event: WebhookEvent,
    merchant_id: Option<&str>,
    payload: &Value,
) -> Result<()> {
    let data = &payload["data"];

    match event {
        WebhookEvent::StoreAuthorize => {
            // Easy-mode authorization: the token set arrives in the payload
            // instead of through the redirect flow.
            let access_token = data["access_token"].as_str().ok_or_else(|| {
                AppError::BadRequest("app.store.authorize payload missing access_token".to_string())
            })?;
            let token = TokenSet {
                access_token: access_token.to_string(),
                refresh_token: data["refresh_token"].as_str().map(String::from),
                // the payload carries an absolute expiry timestamp
                expires_in: data["expires"].as_i64().map(|at| at - now()),
            };
            let info =
                platforms::fetch_user_info(platform, &state.config, &token.access_token).await?;
            resolver::resolve(conn, platform, &info, &token)?;
            Ok(())
        }
        WebhookEvent::AppInstalled => set_store_status(conn, platform, merchant_id, StoreStatus::Active),
        WebhookEvent::AppUninstalled => {
            set_store_status(conn, platform, merchant_id, StoreStatus::Inactive)
        }
        WebhookEvent::SubscriptionStarted => {
            let Some(merchant) = merchant_id else {
                return missing_merchant(platform, event);
            };
            lifecycle::handle_subscription_started(conn, platform, merchant, data, payload)?;
            Ok(())
        }
        WebhookEvent::SubscriptionRenewed => {
            let Some(merchant) = merchant_id else {
                return missing_merchant(platform, event);
            };
            lifecycle::handle_subscription_renewed(conn, platform, merchant, data, payload)?;
            Ok(())
        }
        WebhookEvent::SubscriptionExpired => {
            let Some(merchant) = merchant_id else {
                return missing_merchant(platform, event);
            };
            lifecycle::handle_subscription_expired(conn, platform, merchant, data, payload)?;
            Ok(())
        }
        WebhookEvent::TrialStarted => {
            let Some(merchant) = merchant_id else {
                return missing_merchant(platform, event);
            };
            lifecycle::handle_trial_started(conn, platform, merchant, data, payload)?;
            Ok(())
        }
        WebhookEvent::TrialExpired => {
            let Some(merchant) = merchant_id else {
                return missing_merchant(platform, event);
            };
            lifecycle::handle_trial_expired(conn, platform, merchant, data, payload)?;
            Ok(())
        }
    }
}

/// Install/uninstall status flips are idempotent: no store yet is a no-op,
/// and repeating an event leaves the same status.
fn set_store_status(
    conn: &Connection,
    platform: Platform,
    merchant_id: Option<&str>,
    status: StoreStatus,
) -> Result<()> {
    let Some(merchant) = merchant_id else {
        tracing::warn!("{} install event without merchant id", platform);
        return Ok(());
    };
    match queries::get_store_by_merchant(conn, merchant, platform)? {
        Some(store) => {
            queries::set_store_status(conn, &store.id, status)?;
            tracing::info!("Store {} marked {} on {}", store.id, status, platform);
        }
        None => {
            tracing::warn!(
                "No store for merchant {} on {}; status change dropped",
                merchant,
                platform
            );
        }
    }
    Ok(())
}

fn missing_merchant(platform: Platform, event: WebhookEvent) -> Result<()> {
    tracing::warn!("{} event '{}' without merchant id", platform, event);
    Ok(())
}

/// Platforms send merchant ids as numbers or strings depending on the event.
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
