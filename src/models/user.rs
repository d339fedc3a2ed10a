use serde::{Deserialize, Serialize};

/// Internal merchant account. Created lazily on first successful OAuth
/// authorization when no account matches the platform-reported email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Role name assigned at creation ("client" for merchant accounts).
    pub role: String,
    pub email_verified_at: Option<i64>,
    #[serde(skip_serializing)]
    pub api_token_hash: Option<String>,
    #[serde(skip_serializing)]
    pub reset_token_hash: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    /// Accounts created through OAuth are pre-verified.
    pub email_verified_at: Option<i64>,
}
