use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::{Platform, SubscriptionStatus};

/// Subscription lifecycle event types recorded in the audit history.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HistoryEvent {
    Started,
    Renewed,
    Upgraded,
    Downgraded,
    Cancelled,
    Expired,
    TrialStarted,
    TrialExpired,
}

/// Append-only audit record: one row per lifecycle event, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionHistory {
    pub id: String,
    pub subscription_id: String,
    pub user_id: String,
    pub package_id: Option<String>,
    pub platform: Platform,
    pub event_type: HistoryEvent,
    /// Subscription status immediately after the event.
    pub status: SubscriptionStatus,
    /// Snapshot of package terms after the change.
    pub package_data: serde_json::Value,
    /// Old vs new package data; only populated for upgrades.
    pub changes: Option<serde_json::Value>,
    pub price: Option<f64>,
    pub start_date: Option<i64>,
    pub end_date: Option<i64>,
    /// Full inbound webhook payload, kept for replay and debugging.
    pub webhook_payload: serde_json::Value,
    pub created_at: i64,
}

#[derive(Debug, Clone)]
pub struct CreateHistory {
    pub subscription_id: String,
    pub user_id: String,
    pub package_id: Option<String>,
    pub platform: Platform,
    pub event_type: HistoryEvent,
    pub status: SubscriptionStatus,
    pub package_data: serde_json::Value,
    pub changes: Option<serde_json::Value>,
    pub price: Option<f64>,
    pub start_date: Option<i64>,
    pub end_date: Option<i64>,
    pub webhook_payload: serde_json::Value,
}
