//! Salla OAuth and webhook client.
//!
//! Salla's "easy mode" also delivers the token set in an
//! `app.store.authorize` webhook; both paths end up in the same
//! `TokenSet` / `PlatformUserInfo` types.

use std::time::Duration;

use axum::http::HeaderMap;
use reqwest::Client;
use serde::Deserialize;
use subtle::ConstantTimeEq;

use crate::config::PlatformOAuthConfig;
use crate::error::{AppError, Result};
use crate::platforms::{PlatformUserInfo, TokenSet};

const SALLA_AUTHORIZE_URL: &str = "https://accounts.salla.sa/oauth2/authorize";
const SALLA_TOKEN_URL: &str = "https://accounts.salla.sa/oauth2/token";
const SALLA_USER_INFO_URL: &str = "https://accounts.salla.sa/oauth2/user/info";

/// Upstream calls are bounded so a stuck OAuth endpoint cannot hang the
/// caller or stall a refresh sweep.
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    // Salla sends `expires_in` on the token endpoint but `expires` in the
    // easy-mode webhook payload.
    expires_in: Option<i64>,
    expires: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct SallaClient {
    client: Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    webhook_secret: Option<String>,
}

impl SallaClient {
    pub fn new(config: &PlatformOAuthConfig) -> Self {
        Self {
            client: Client::new(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            webhook_secret: config.webhook_secret.clone(),
        }
    }

    pub fn authorize_url(&self) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope=offline_access",
            SALLA_AUTHORIZE_URL,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
        )
    }

    /// Exchange an authorization code for a token set.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenSet> {
        self.token_request(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("redirect_uri", &self.redirect_uri),
        ])
        .await
    }

    /// Exchange a refresh token for a fresh token set.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenSet> {
        self.token_request(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
        ])
        .await
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenSet> {
        let response = self
            .client
            .post(SALLA_TOKEN_URL)
            .form(form)
            .timeout(UPSTREAM_TIMEOUT)
            .send()
            .await
            .map_err(|e| AppError::UpstreamAuth(format!("Salla token endpoint: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::UpstreamAuth(format!(
                "Salla token endpoint returned {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::UpstreamAuth(format!("Invalid Salla token response: {}", e)))?;

        Ok(TokenSet {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_in: token.expires_in.or(token.expires),
        })
    }

    /// Fetch the merchant profile for an access token.
    pub async fn fetch_user_info(&self, access_token: &str) -> Result<PlatformUserInfo> {
        let response = self
            .client
            .get(SALLA_USER_INFO_URL)
            .bearer_auth(access_token)
            .timeout(UPSTREAM_TIMEOUT)
            .send()
            .await
            .map_err(|e| AppError::UpstreamAuth(format!("Salla user info endpoint: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::UpstreamAuth(format!(
                "Salla user info endpoint returned {}: {}",
                status, body
            )));
        }

        let body: serde_json::Value = response.json().await.map_err(|e| {
            AppError::UpstreamAuth(format!("Invalid Salla user info response: {}", e))
        })?;

        parse_user_info(&body)
    }

    /// Validate an inbound webhook request.
    ///
    /// Salla sends its webhook token in the Authorization header. When a
    /// webhook secret is configured we require a constant-time match; with
    /// no secret configured this degrades to a presence-only check, the
    /// legacy (known-weak) posture documented in DESIGN.md.
    pub fn validate_webhook(&self, headers: &HeaderMap) -> bool {
        let Some(authorization) = headers.get("authorization").and_then(|v| v.to_str().ok())
        else {
            return false;
        };

        match &self.webhook_secret {
            Some(secret) => {
                let supplied = authorization
                    .strip_prefix("Bearer ")
                    .unwrap_or(authorization);
                supplied.as_bytes().ct_eq(secret.as_bytes()).into()
            }
            None => true,
        }
    }
}

/// Normalize Salla's user-info payload.
///
/// Shape: `{data: {id, name, email, mobile, merchant: {id, name, domain, avatar}}}`.
/// Ids arrive as numbers; merchant id is required, everything else degrades
/// to `None`.
pub fn parse_user_info(body: &serde_json::Value) -> Result<PlatformUserInfo> {
    let data = &body["data"];
    let merchant = &data["merchant"];

    let merchant_id = value_to_string(&merchant["id"]).ok_or_else(|| {
        AppError::UpstreamAuth("Salla user info response missing merchant id".to_string())
    })?;
    let email = data["email"].as_str().ok_or_else(|| {
        AppError::UpstreamAuth("Salla user info response missing email".to_string())
    })?;

    Ok(PlatformUserInfo {
        merchant_id,
        store_id: value_to_string(&data["id"]),
        name: data["name"].as_str().unwrap_or_default().to_string(),
        email: email.to_string(),
        mobile: data["mobile"].as_str().map(String::from),
        domain: merchant["domain"].as_str().map(String::from),
        store_name: merchant["name"].as_str().map(String::from),
        avatar: merchant["avatar"].as_str().map(String::from),
    })
}

fn value_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlatformOAuthConfig;
    use serde_json::json;

    fn test_config(webhook_secret: Option<&str>) -> PlatformOAuthConfig {
        PlatformOAuthConfig {
            client_id: "client-123".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: "https://app.example.com/integration/salla/callback".to_string(),
            webhook_secret: webhook_secret.map(String::from),
        }
    }

    #[test]
    fn test_authorize_url_contains_oauth_params() {
        let url = SallaClient::new(&test_config(None)).authorize_url();
        assert!(url.starts_with("https://accounts.salla.sa/oauth2/authorize?"));
        assert!(url.contains("client_id=client-123"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("scope=offline_access"));
        assert!(url.contains(
            "redirect_uri=https%3A%2F%2Fapp.example.com%2Fintegration%2Fsalla%2Fcallback"
        ));
    }

    #[test]
    fn test_validate_webhook_requires_authorization_header() {
        let client = SallaClient::new(&test_config(None));
        assert!(!client.validate_webhook(&HeaderMap::new()));

        let mut headers = HeaderMap::new();
        headers.insert("authorization", "anything".parse().unwrap());
        assert!(client.validate_webhook(&headers));
    }

    #[test]
    fn test_validate_webhook_checks_configured_secret() {
        let client = SallaClient::new(&test_config(Some("hook-secret")));

        let mut headers = HeaderMap::new();
        headers.insert("authorization", "wrong".parse().unwrap());
        assert!(!client.validate_webhook(&headers));

        headers.insert("authorization", "hook-secret".parse().unwrap());
        assert!(client.validate_webhook(&headers));

        // Bearer prefix is tolerated
        headers.insert("authorization", "Bearer hook-secret".parse().unwrap());
        assert!(client.validate_webhook(&headers));
    }

    #[test]
    fn test_parse_user_info_handles_numeric_ids() {
        let body = json!({
            "status": 200,
            "success": true,
            "data": {
                "id": 181690847,
                "name": "Test Merchant",
                "email": "owner@store.example",
                "mobile": "+966500000000",
                "merchant": {
                    "id": 1305146709,
                    "name": "Demo Store",
                    "avatar": "https://cdn.salla.sa/avatar.png",
                    "domain": "https://demo.salla.sa"
                }
            }
        });

        let info = parse_user_info(&body).unwrap();
        assert_eq!(info.merchant_id, "1305146709");
        assert_eq!(info.store_id.as_deref(), Some("181690847"));
        assert_eq!(info.email, "owner@store.example");
        assert_eq!(info.store_name.as_deref(), Some("Demo Store"));
    }

    #[test]
    fn test_parse_user_info_requires_merchant_id() {
        let body = json!({"data": {"email": "owner@store.example"}});
        assert!(parse_user_info(&body).is_err());
    }
}
