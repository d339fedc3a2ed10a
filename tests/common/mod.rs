//! Shared test harness: in-memory database, app state and row fixtures.

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use serde_json::Value;

use storelink::config::{Config, PlatformOAuthConfig};
use storelink::db::{AppState, DbPool, init_db, queries};
use storelink::handlers;
use storelink::models::{
    BillingCycle, CreatePackage, CreateStore, CreateUser, Package, PackageScope, Platform, Store,
    User,
};
use storelink::util::now;

/// Single-connection in-memory pool: every checkout sees the same database.
pub fn create_test_pool() -> DbPool {
    let manager = SqliteConnectionManager::memory()
        .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
    let pool = Pool::builder().max_size(1).build(manager).unwrap();
    init_db(&pool.get().unwrap()).unwrap();
    pool
}

pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_path: ":memory:".to_string(),
        base_url: "http://app.test".to_string(),
        salla: PlatformOAuthConfig {
            client_id: "test-client".to_string(),
            client_secret: "test-secret".to_string(),
            redirect_uri: "http://app.test/integration/salla/callback".to_string(),
            webhook_secret: None,
        },
        zid: PlatformOAuthConfig::default(),
        wordpress: PlatformOAuthConfig::default(),
    }
}

pub fn create_test_app_state() -> AppState {
    AppState {
        db: create_test_pool(),
        config: test_config(),
    }
}

pub fn test_app(state: AppState) -> Router {
    handlers::router(state)
}

pub fn create_test_user(conn: &Connection, email: &str) -> User {
    queries::create_user(
        conn,
        &CreateUser {
            name: "Test Merchant".to_string(),
            email: email.to_string(),
            password_hash: "irrelevant".to_string(),
            role: "client".to_string(),
            email_verified_at: Some(now()),
        },
    )
    .unwrap()
}

pub fn create_test_store(
    conn: &Connection,
    user_id: &str,
    platform: Platform,
    merchant_id: &str,
) -> Store {
    queries::create_store(
        conn,
        &CreateStore {
            user_id: user_id.to_string(),
            platform,
            merchant_id: merchant_id.to_string(),
            store_id: Some("store-ext-1".to_string()),
            domain: Some("https://demo.example".to_string()),
            store_name: Some("Demo Store".to_string()),
            store_email: Some("owner@demo.example".to_string()),
            store_phone: None,
            avatar: None,
            access_token: Some("access-token".to_string()),
            refresh_token: Some("refresh-token".to_string()),
            token_expires_at: Some(now() + 3600),
        },
    )
    .unwrap()
}

pub fn create_test_package(
    conn: &Connection,
    name: &str,
    scope: PackageScope,
    photos_limit: i64,
) -> Package {
    queries::create_package(
        conn,
        &CreatePackage {
            name: name.to_string(),
            display_name: name.to_string(),
            description: None,
            platform: scope,
            price: 99.0,
            currency: "SAR".to_string(),
            billing_cycle: BillingCycle::Monthly,
            photos_limit,
            is_active: true,
            is_featured: false,
            sort_order: 0,
        },
    )
    .unwrap()
}

/// POST a webhook payload with an Authorization header.
pub fn webhook_request(platform: &str, payload: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/webhooks/{}", platform))
        .header("content-type", "application/json")
        .header("authorization", "test-webhook-token")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

pub async fn response_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
