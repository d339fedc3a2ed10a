//! Per-platform OAuth and webhook-validation clients.
//!
//! Each supported platform gets one concrete client; platforms whose
//! integration is not built yet fail with `UnsupportedPlatform` rather than
//! being omitted, so "not implemented" stays distinguishable from
//! "temporarily broken". Dispatch is an exhaustive match on `Platform`.

mod salla;
mod wordpress;
mod zid;

pub use salla::*;

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Result;
use crate::models::Platform;
use crate::util::now;

/// Token triple returned by a platform's OAuth endpoint.
/// Persistence is the caller's job; the clients stay stateless.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Lifetime in seconds, when the platform reports one.
    pub expires_in: Option<i64>,
}

impl TokenSet {
    /// Absolute expiry timestamp computed against the local clock.
    pub fn expires_at(&self) -> Option<i64> {
        self.expires_in.map(|secs| now() + secs)
    }
}

/// Normalized user/store info fetched from a platform after authorization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformUserInfo {
    pub merchant_id: String,
    pub store_id: Option<String>,
    pub name: String,
    pub email: String,
    pub mobile: Option<String>,
    pub domain: Option<String>,
    pub store_name: Option<String>,
    pub avatar: Option<String>,
}

/// Build the URL merchants are redirected to for authorization.
pub fn authorize_url(platform: Platform, config: &Config) -> Result<String> {
    match platform {
        Platform::Salla => Ok(SallaClient::new(config.platform(platform)).authorize_url()),
        Platform::Zid => Err(zid::unsupported()),
        Platform::Wordpress => Err(wordpress::unsupported()),
    }
}

/// Exchange an authorization code for a token set.
pub async fn exchange_code(platform: Platform, config: &Config, code: &str) -> Result<TokenSet> {
    match platform {
        Platform::Salla => {
            SallaClient::new(config.platform(platform))
                .exchange_code(code)
                .await
        }
        Platform::Zid => Err(zid::unsupported()),
        Platform::Wordpress => Err(wordpress::unsupported()),
    }
}

/// Exchange a stored refresh token for a fresh token set.
pub async fn refresh_token(
    platform: Platform,
    config: &Config,
    refresh_token: &str,
) -> Result<TokenSet> {
    match platform {
        Platform::Salla => {
            SallaClient::new(config.platform(platform))
                .refresh(refresh_token)
                .await
        }
        Platform::Zid => Err(zid::unsupported()),
        Platform::Wordpress => Err(wordpress::unsupported()),
    }
}

/// Fetch the platform's user/store profile for an access token.
pub async fn fetch_user_info(
    platform: Platform,
    config: &Config,
    access_token: &str,
) -> Result<PlatformUserInfo> {
    match platform {
        Platform::Salla => {
            SallaClient::new(config.platform(platform))
                .fetch_user_info(access_token)
                .await
        }
        Platform::Zid => Err(zid::unsupported()),
        Platform::Wordpress => Err(wordpress::unsupported()),
    }
}

/// Check the authenticity of an inbound webhook request.
pub fn validate_webhook(platform: Platform, config: &Config, headers: &HeaderMap) -> Result<bool> {
    match platform {
        Platform::Salla => Ok(SallaClient::new(config.platform(platform)).validate_webhook(headers)),
        Platform::Zid => Err(zid::unsupported()),
        Platform::Wordpress => Err(wordpress::unsupported()),
    }
}
