use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::Platform;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StoreStatus {
    Active,
    Inactive,
    Suspended,
}

/// A merchant's store connection on one platform.
///
/// `(merchant_id, platform)` is unique - a merchant cannot be connected
/// twice on the same platform. Tokens are write-only: they never appear in
/// serialized output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
    pub id: String,
    pub user_id: String,
    pub platform: Platform,
    /// Platform-side merchant identifier (the dedup key for webhooks).
    pub merchant_id: String,
    /// Platform-side store identifier, when the platform reports one.
    pub store_id: Option<String>,
    pub domain: Option<String>,
    pub store_name: Option<String>,
    pub store_email: Option<String>,
    pub store_phone: Option<String>,
    pub avatar: Option<String>,
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub token_expires_at: Option<i64>,
    pub status: StoreStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Fields refreshed on a merchant re-authorization: new tokens plus the
/// profile data the platform reported this time around.
#[derive(Debug, Clone)]
pub struct ReauthorizeStore {
    pub store_id: Option<String>,
    pub domain: Option<String>,
    pub store_name: Option<String>,
    pub store_email: Option<String>,
    pub store_phone: Option<String>,
    pub avatar: Option<String>,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_expires_at: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct CreateStore {
    pub user_id: String,
    pub platform: Platform,
    pub merchant_id: String,
    pub store_id: Option<String>,
    pub domain: Option<String>,
    pub store_name: Option<String>,
    pub store_email: Option<String>,
    pub store_phone: Option<String>,
    pub avatar: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub token_expires_at: Option<i64>,
}
