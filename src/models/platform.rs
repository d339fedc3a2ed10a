use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Supported e-commerce platforms.
///
/// Adding a platform is a compile-time-checked change: every consumption
/// site matches exhaustively on this enum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Platform {
    Salla,
    Zid,
    Wordpress,
}
