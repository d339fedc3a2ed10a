use std::env;

use crate::models::Platform;

/// OAuth credentials for one e-commerce platform.
#[derive(Debug, Clone, Default)]
pub struct PlatformOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    /// Shared secret the platform sends in the webhook Authorization header.
    /// When unset, webhook validation only checks that the header is present
    /// (the legacy weak posture - see DESIGN.md).
    pub webhook_secret: Option<String>,
}

impl PlatformOAuthConfig {
    fn from_env(prefix: &str) -> Self {
        Self {
            client_id: env::var(format!("{}_CLIENT_ID", prefix)).unwrap_or_default(),
            client_secret: env::var(format!("{}_CLIENT_SECRET", prefix)).unwrap_or_default(),
            redirect_uri: env::var(format!("{}_REDIRECT_URI", prefix)).unwrap_or_default(),
            webhook_secret: env::var(format!("{}_WEBHOOK_SECRET", prefix)).ok(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub base_url: String,
    pub salla: PlatformOAuthConfig,
    pub zid: PlatformOAuthConfig,
    pub wordpress: PlatformOAuthConfig,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let base_url =
            env::var("BASE_URL").unwrap_or_else(|_| format!("http://{}:{}", host, port));

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "storelink.db".to_string()),
            base_url,
            salla: PlatformOAuthConfig::from_env("SALLA"),
            zid: PlatformOAuthConfig::from_env("ZID"),
            wordpress: PlatformOAuthConfig::from_env("WORDPRESS"),
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn platform(&self, platform: Platform) -> &PlatformOAuthConfig {
        match platform {
            Platform::Salla => &self.salla,
            Platform::Zid => &self.zid,
            Platform::Wordpress => &self.wordpress,
        }
    }
}
