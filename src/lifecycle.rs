//! Subscription lifecycle engine.
//!
//! Applies subscription/trial webhook events to the subscription row for a
//! merchant and writes the append-only history record in the same
//! transaction, so a subscription mutation and its audit row are always
//! consistent.
//!
//! A merchant that cannot be resolved (no store connection matches the
//! webhook's merchant id) is a non-fatal condition: the engine returns
//! `Ok(None)` and the gateway records the event as processed with no
//! downstream record.

use rusqlite::Connection;
use serde_json::Value;

use crate::db::queries;
use crate::error::Result;
use crate::models::{
    CreateHistory, CreateSubscription, HistoryEvent, Package, Platform, Subscription,
    SubscriptionStatus, UpdateSubscription, User,
};
use crate::util::{now, parse_event_date};

/// Reserved plan name used for trial subscriptions.
const TRIAL_PLAN_NAME: &str = "free_trial";

/// `subscription.started`: create the subscription if none exists
/// (event `started`), otherwise update it in place (event `upgraded`).
/// The usage counter is only reset for brand-new subscriptions.
pub fn handle_subscription_started(
    conn: &mut Connection,
    platform: Platform,
    merchant_id: &str,
    data: &Value,
    payload: &Value,
) -> Result<Option<Subscription>> {
    let tx = conn.transaction()?;

    let Some(user) = find_user_by_merchant(&tx, merchant_id, platform)? else {
        tracing::warn!(
            "No user found for subscription start (merchant {}, {})",
            merchant_id,
            platform
        );
        return Ok(None);
    };

    let package = resolve_package(&tx, data["plan_name"].as_str(), platform)?;
    let existing = queries::get_subscription_by_user_platform(&tx, &user.id, platform)?;

    let package_data = package
        .as_ref()
        .map(Package::snapshot)
        .unwrap_or_else(|| data.clone());
    let photos_limit = package.as_ref().map(|p| p.photos_limit).unwrap_or(0);
    let start_date = date_field(data, "start_date").or_else(|| Some(now()));
    let end_date = date_field(data, "end_date");
    let subscription_id = data["subscription_id"].as_str().map(String::from);

    let (subscription, event_type, changes) = match existing {
        None => {
            let subscription = queries::create_subscription(
                &tx,
                &CreateSubscription {
                    user_id: user.id.clone(),
                    package_id: package.as_ref().map(|p| p.id.clone()),
                    platform,
                    merchant_id: Some(merchant_id.to_string()),
                    subscription_id,
                    status: SubscriptionStatus::Active,
                    package_data,
                    photos_limit,
                    start_date,
                    end_date,
                    trial_ends_at: None,
                },
            )?;
            (subscription, HistoryEvent::Started, None)
        }
        Some(existing) => {
            // Plan change on an existing subscription: record old vs new
            // package terms, keep photos_used untouched.
            let changes = diff_packages(&existing.package_data, &package_data);
            queries::update_subscription(
                &tx,
                &existing.id,
                &UpdateSubscription {
                    package_id: Some(package.as_ref().map(|p| p.id.clone())),
                    merchant_id: Some(merchant_id.to_string()),
                    subscription_id: Some(subscription_id),
                    status: Some(SubscriptionStatus::Active),
                    package_data: Some(package_data),
                    photos_limit: Some(photos_limit),
                    start_date: Some(start_date),
                    end_date: Some(end_date),
                    ..Default::default()
                },
            )?;
            let subscription = refetch(&tx, &existing.id)?;
            (subscription, HistoryEvent::Upgraded, changes)
        }
    };

    record_history(&tx, &subscription, event_type, changes, data, payload)?;
    tx.commit()?;

    tracing::info!(
        "Subscription {} for user {} ({:?})",
        subscription.id,
        user.id,
        event_type
    );
    Ok(Some(subscription))
}

/// `subscription.renewed`: reactivate and refresh dates; the package is
/// re-resolved and the limit updated only when a matching package exists.
/// Usage is never reset on renewal.
pub fn handle_subscription_renewed(
    conn: &mut Connection,
    platform: Platform,
    merchant_id: &str,
    data: &Value,
    payload: &Value,
) -> Result<Option<Subscription>> {
    let tx = conn.transaction()?;

    let Some(user) = find_user_by_merchant(&tx, merchant_id, platform)? else {
        tracing::warn!(
            "No user found for subscription renewal (merchant {}, {})",
            merchant_id,
            platform
        );
        return Ok(None);
    };
    let Some(existing) = queries::get_subscription_by_user_platform(&tx, &user.id, platform)?
    else {
        tracing::warn!("No subscription to renew for user {}", user.id);
        return Ok(None);
    };

    let package = resolve_package(&tx, data["plan_name"].as_str(), platform)?;

    let mut update = UpdateSubscription {
        status: Some(SubscriptionStatus::Active),
        start_date: date_field(data, "start_date").map(Some),
        end_date: Some(date_field(data, "end_date")),
        ..Default::default()
    };
    if let Some(package) = &package {
        update.package_id = Some(Some(package.id.clone()));
        update.package_data = Some(package.snapshot());
        update.photos_limit = Some(package.photos_limit);
    }
    queries::update_subscription(&tx, &existing.id, &update)?;
    let subscription = refetch(&tx, &existing.id)?;

    record_history(&tx, &subscription, HistoryEvent::Renewed, None, data, payload)?;
    tx.commit()?;

    tracing::info!("Subscription {} renewed for user {}", subscription.id, user.id);
    Ok(Some(subscription))
}

/// `subscription.expired`: flip status only; dates and package are kept.
pub fn handle_subscription_expired(
    conn: &mut Connection,
    platform: Platform,
    merchant_id: &str,
    data: &Value,
    payload: &Value,
) -> Result<Option<Subscription>> {
    expire(conn, platform, merchant_id, data, payload, HistoryEvent::Expired)
}

/// `trial.started`: like a start, but with the reserved trial plan and
/// `trial_ends_at` taken from the payload end date.
pub fn handle_trial_started(
    conn: &mut Connection,
    platform: Platform,
    merchant_id: &str,
    data: &Value,
    payload: &Value,
) -> Result<Option<Subscription>> {
    let tx = conn.transaction()?;

    let Some(user) = find_user_by_merchant(&tx, merchant_id, platform)? else {
        tracing::warn!(
            "No user found for trial start (merchant {}, {})",
            merchant_id,
            platform
        );
        return Ok(None);
    };

    let package = queries::find_package_by_plan_name(&tx, TRIAL_PLAN_NAME, platform)?;
    let existing = queries::get_subscription_by_user_platform(&tx, &user.id, platform)?;

    let package_data = package
        .as_ref()
        .map(Package::snapshot)
        .unwrap_or_else(|| data.clone());
    let photos_limit = package.as_ref().map(|p| p.photos_limit).unwrap_or(0);
    let start_date = date_field(data, "start_date").or_else(|| Some(now()));
    let end_date = date_field(data, "end_date");

    let subscription = match existing {
        None => queries::create_subscription(
            &tx,
            &CreateSubscription {
                user_id: user.id.clone(),
                package_id: package.as_ref().map(|p| p.id.clone()),
                platform,
                merchant_id: Some(merchant_id.to_string()),
                subscription_id: None,
                status: SubscriptionStatus::Trial,
                package_data,
                photos_limit,
                start_date,
                end_date,
                trial_ends_at: end_date,
            },
        )?,
        Some(existing) => {
            queries::update_subscription(
                &tx,
                &existing.id,
                &UpdateSubscription {
                    package_id: Some(package.as_ref().map(|p| p.id.clone())),
                    merchant_id: Some(merchant_id.to_string()),
                    status: Some(SubscriptionStatus::Trial),
                    package_data: Some(package_data),
                    photos_limit: Some(photos_limit),
                    start_date: Some(start_date),
                    end_date: Some(end_date),
                    trial_ends_at: Some(end_date),
                    ..Default::default()
                },
            )?;
            refetch(&tx, &existing.id)?
        }
    };

    record_history(&tx, &subscription, HistoryEvent::TrialStarted, None, data, payload)?;
    tx.commit()?;

    tracing::info!("Trial started: subscription {} for user {}", subscription.id, user.id);
    Ok(Some(subscription))
}

/// `trial.expired`: same status flip as a subscription expiry, distinct
/// history event.
pub fn handle_trial_expired(
    conn: &mut Connection,
    platform: Platform,
    merchant_id: &str,
    data: &Value,
    payload: &Value,
) -> Result<Option<Subscription>> {
    expire(conn, platform, merchant_id, data, payload, HistoryEvent::TrialExpired)
}

fn expire(
    conn: &mut Connection,
    platform: Platform,
    merchant_id: &str,
    data: &Value,
    payload: &Value,
    event_type: HistoryEvent,
) -> Result<Option<Subscription>> {
    let tx = conn.transaction()?;

    let Some(user) = find_user_by_merchant(&tx, merchant_id, platform)? else {
        return Ok(None);
    };
    let Some(existing) = queries::get_subscription_by_user_platform(&tx, &user.id, platform)?
    else {
        return Ok(None);
    };

    queries::update_subscription(
        &tx,
        &existing.id,
        &UpdateSubscription {
            status: Some(SubscriptionStatus::Expired),
            ..Default::default()
        },
    )?;
    let subscription = refetch(&tx, &existing.id)?;

    record_history(&tx, &subscription, event_type, None, data, payload)?;
    tx.commit()?;

    tracing::info!(
        "Subscription {} expired for user {} ({:?})",
        subscription.id,
        user.id,
        event_type
    );
    Ok(Some(subscription))
}

/// Merchant resolution for webhook events: merchant id -> store -> user.
pub fn find_user_by_merchant(
    conn: &Connection,
    merchant_id: &str,
    platform: Platform,
) -> Result<Option<User>> {
    let Some(store) = queries::get_store_by_merchant(conn, merchant_id, platform)? else {
        return Ok(None);
    };
    queries::get_user_by_id(conn, &store.user_id)
}

fn resolve_package(
    conn: &Connection,
    plan_name: Option<&str>,
    platform: Platform,
) -> Result<Option<Package>> {
    let Some(plan_name) = plan_name else {
        return Ok(None);
    };
    let package = queries::find_package_by_plan_name(conn, plan_name, platform)?;
    if package.is_none() {
        tracing::warn!("No package matches plan name '{}' on {}", plan_name, platform);
    }
    Ok(package)
}

fn date_field(data: &Value, key: &str) -> Option<i64> {
    data[key].as_str().and_then(parse_event_date)
}

fn diff_packages(old: &Value, new: &Value) -> Option<Value> {
    if old.is_null() {
        return None;
    }
    Some(serde_json::json!({
        "old_package": old,
        "new_package": new,
    }))
}

fn refetch(conn: &Connection, id: &str) -> Result<Subscription> {
    queries::get_subscription_by_id(conn, id)?.ok_or_else(|| {
        crate::error::AppError::Internal(format!("subscription {} vanished mid-transaction", id))
    })
}

fn record_history(
    conn: &Connection,
    subscription: &Subscription,
    event_type: HistoryEvent,
    changes: Option<Value>,
    data: &Value,
    payload: &Value,
) -> Result<()> {
    queries::create_history(
        conn,
        &CreateHistory {
            subscription_id: subscription.id.clone(),
            user_id: subscription.user_id.clone(),
            package_id: subscription.package_id.clone(),
            platform: subscription.platform,
            event_type,
            status: subscription.status,
            package_data: subscription.package_data.clone(),
            changes,
            price: data["price"].as_f64(),
            start_date: subscription.start_date,
            end_date: subscription.end_date,
            webhook_payload: payload.clone(),
        },
    )?;
    Ok(())
}
