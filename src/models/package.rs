use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BillingCycle {
    Monthly,
    Yearly,
    Lifetime,
}

/// Platform scope of a package: a single platform or all of them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PackageScope {
    Salla,
    Zid,
    Wordpress,
    All,
}

/// A sellable plan definition. Subscriptions reference packages by id plus a
/// frozen data snapshot, so deleting a package never rewrites history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    pub id: String,
    /// Plan identifier used by the billing platform (exact-match lookup).
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub platform: PackageScope,
    pub price: f64,
    pub currency: String,
    pub billing_cycle: BillingCycle,
    /// Photo credits per cycle; 0 means unlimited.
    pub photos_limit: i64,
    pub is_active: bool,
    pub is_featured: bool,
    pub sort_order: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Package {
    /// Snapshot of the plan terms stored on subscriptions and history rows.
    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "name": self.name,
            "display_name": self.display_name,
            "platform": self.platform,
            "price": self.price,
            "currency": self.currency,
            "billing_cycle": self.billing_cycle,
            "photos_limit": self.photos_limit,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePackage {
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub platform: PackageScope,
    #[serde(default)]
    pub price: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub billing_cycle: BillingCycle,
    #[serde(default)]
    pub photos_limit: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub sort_order: i64,
}

fn default_currency() -> String {
    "SAR".to_string()
}

fn default_true() -> bool {
    true
}
