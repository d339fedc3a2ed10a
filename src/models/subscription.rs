use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::Platform;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Trial,
    Cancelled,
    Expired,
    Suspended,
}

impl SubscriptionStatus {
    /// Active and trial subscriptions both count as usable for quota purposes.
    pub fn is_usable(&self) -> bool {
        matches!(self, SubscriptionStatus::Active | SubscriptionStatus::Trial)
    }
}

/// The live binding of a user to a package on one platform.
///
/// At most one row per `(user_id, platform)` - lifecycle events update the
/// row in place so the usage counter survives plan changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub user_id: String,
    /// Nullable: the referenced package may be deleted later; `package_data`
    /// keeps the historical snapshot either way.
    pub package_id: Option<String>,
    pub platform: Platform,
    pub merchant_id: Option<String>,
    /// Platform-side subscription identifier.
    pub subscription_id: Option<String>,
    pub status: SubscriptionStatus,
    /// Point-in-time snapshot of package terms, never re-read from the live
    /// package.
    pub package_data: serde_json::Value,
    /// 0 means unlimited.
    pub photos_limit: i64,
    pub photos_used: i64,
    pub start_date: Option<i64>,
    pub end_date: Option<i64>,
    pub trial_ends_at: Option<i64>,
    pub cancelled_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Subscription {
    /// Photos remaining before the limit is hit (i64::MAX when unlimited).
    pub fn remaining_photos(&self) -> i64 {
        if self.photos_limit == 0 {
            return i64::MAX;
        }
        (self.photos_limit - self.photos_used).max(0)
    }
}

#[derive(Debug, Clone)]
pub struct CreateSubscription {
    pub user_id: String,
    pub package_id: Option<String>,
    pub platform: Platform,
    pub merchant_id: Option<String>,
    pub subscription_id: Option<String>,
    pub status: SubscriptionStatus,
    pub package_data: serde_json::Value,
    pub photos_limit: i64,
    pub start_date: Option<i64>,
    pub end_date: Option<i64>,
    pub trial_ends_at: Option<i64>,
}

/// Partial update for a subscription row. Outer `None` = leave unchanged;
/// inner `None` (for doubly-optional fields) = set the column to NULL.
#[derive(Debug, Clone, Default)]
pub struct UpdateSubscription {
    pub package_id: Option<Option<String>>,
    pub merchant_id: Option<String>,
    pub subscription_id: Option<Option<String>>,
    pub status: Option<SubscriptionStatus>,
    pub package_data: Option<serde_json::Value>,
    pub photos_limit: Option<i64>,
    pub start_date: Option<Option<i64>>,
    pub end_date: Option<Option<i64>>,
    pub trial_ends_at: Option<Option<i64>>,
    pub cancelled_at: Option<Option<i64>>,
}
