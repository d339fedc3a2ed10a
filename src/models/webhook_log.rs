use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::Platform;

/// Known webhook event names across the supported platforms.
/// Events that fail to parse are logged and dropped without error, so new
/// platform event types never break ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum WebhookEvent {
    #[strum(serialize = "app.store.authorize")]
    StoreAuthorize,
    #[strum(serialize = "app.installed")]
    AppInstalled,
    #[strum(serialize = "app.uninstalled")]
    AppUninstalled,
    #[strum(serialize = "subscription.started")]
    SubscriptionStarted,
    #[strum(serialize = "subscription.renewed")]
    SubscriptionRenewed,
    #[strum(serialize = "subscription.expired")]
    SubscriptionExpired,
    #[strum(serialize = "trial.started")]
    TrialStarted,
    #[strum(serialize = "trial.expired")]
    TrialExpired,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WebhookStatus {
    Pending,
    Processed,
    Failed,
}

/// One row per inbound webhook attempt. Used for idempotency inspection and
/// operational replay; never deleted by the core, and logs outlive the
/// user/store they reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookLog {
    pub id: String,
    pub event: String,
    pub platform: Platform,
    pub merchant_id: Option<String>,
    pub user_id: Option<String>,
    pub store_id: Option<String>,
    pub payload: serde_json::Value,
    pub status: WebhookStatus,
    pub error_message: Option<String>,
    pub processed_at: Option<i64>,
    /// Platform-reported event time, distinct from our ingestion time.
    pub webhook_created_at: Option<i64>,
    pub created_at: i64,
}

#[derive(Debug, Clone)]
pub struct CreateWebhookLog {
    pub event: String,
    pub platform: Platform,
    pub merchant_id: Option<String>,
    pub user_id: Option<String>,
    pub store_id: Option<String>,
    pub payload: serde_json::Value,
    pub webhook_created_at: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_event_names_parse() {
        assert_eq!(
            "subscription.started".parse::<WebhookEvent>().unwrap(),
            WebhookEvent::SubscriptionStarted
        );
        assert_eq!(
            "app.store.authorize".parse::<WebhookEvent>().unwrap(),
            WebhookEvent::StoreAuthorize
        );
    }

    #[test]
    fn test_unknown_event_names_do_not_parse() {
        assert!("order.created".parse::<WebhookEvent>().is_err());
    }
}
