//! Schema constraint and query tests.

use storelink::db::queries;
use storelink::models::{CreateStore, CreateUser, PackageScope, Platform};
use storelink::util::now;

mod common;
use common::*;

fn store_input(user_id: &str, platform: Platform, merchant_id: &str) -> CreateStore {
    CreateStore {
        user_id: user_id.to_string(),
        platform,
        merchant_id: merchant_id.to_string(),
        store_id: None,
        domain: None,
        store_name: None,
        store_email: None,
        store_phone: None,
        avatar: None,
        access_token: None,
        refresh_token: None,
        token_expires_at: None,
    }
}

#[test]
fn test_merchant_is_unique_per_platform() {
    let pool = create_test_pool();
    let conn = pool.get().unwrap();
    let user = create_test_user(&conn, "owner@demo.example");

    queries::create_store(&conn, &store_input(&user.id, Platform::Salla, "1001")).unwrap();

    // Same merchant id on the same platform is rejected.
    let dup = queries::create_store(&conn, &store_input(&user.id, Platform::Salla, "1001"));
    assert!(dup.is_err());

    // Same merchant id on a different platform is fine.
    queries::create_store(&conn, &store_input(&user.id, Platform::Zid, "1001")).unwrap();
}

#[test]
fn test_user_email_is_unique() {
    let pool = create_test_pool();
    let conn = pool.get().unwrap();

    create_test_user(&conn, "owner@demo.example");
    let dup = queries::create_user(
        &conn,
        &CreateUser {
            name: "Someone Else".to_string(),
            email: "owner@demo.example".to_string(),
            password_hash: "irrelevant".to_string(),
            role: "client".to_string(),
            email_verified_at: Some(now()),
        },
    );
    assert!(dup.is_err());
}

#[test]
fn test_plan_name_lookup_is_scoped_to_platform_or_all() {
    let pool = create_test_pool();
    let conn = pool.get().unwrap();

    create_test_package(&conn, "pro", PackageScope::Salla, 500);
    create_test_package(&conn, "starter", PackageScope::All, 100);
    create_test_package(&conn, "zid-only", PackageScope::Zid, 50);

    let found = queries::find_package_by_plan_name(&conn, "pro", Platform::Salla).unwrap();
    assert_eq!(found.unwrap().photos_limit, 500);

    // 'all' packages match any platform.
    assert!(queries::find_package_by_plan_name(&conn, "starter", Platform::Wordpress)
        .unwrap()
        .is_some());

    // Another platform's package never matches.
    assert!(queries::find_package_by_plan_name(&conn, "zid-only", Platform::Salla)
        .unwrap()
        .is_none());

    assert!(queries::find_package_by_plan_name(&conn, "unknown", Platform::Salla)
        .unwrap()
        .is_none());
}

#[test]
fn test_deleting_a_user_cascades_to_stores() {
    let pool = create_test_pool();
    let conn = pool.get().unwrap();
    let user = create_test_user(&conn, "owner@demo.example");
    create_test_store(&conn, &user.id, Platform::Salla, "1001");

    conn.execute("DELETE FROM users WHERE id = ?1", [&user.id]).unwrap();

    let store = queries::get_store_by_merchant(&conn, "1001", Platform::Salla).unwrap();
    assert!(store.is_none());
}

#[test]
fn test_webhook_log_status_transitions() {
    use storelink::models::{CreateWebhookLog, WebhookStatus};

    let pool = create_test_pool();
    let conn = pool.get().unwrap();

    let log = queries::create_webhook_log(
        &conn,
        &CreateWebhookLog {
            event: "subscription.started".to_string(),
            platform: Platform::Salla,
            merchant_id: Some("1001".to_string()),
            user_id: None,
            store_id: None,
            payload: serde_json::json!({ "event": "subscription.started" }),
            webhook_created_at: None,
        },
    )
    .unwrap();
    assert_eq!(log.status, WebhookStatus::Pending);

    assert!(queries::mark_webhook_failed(&conn, &log.id, "boom").unwrap());
    let log = queries::get_webhook_log(&conn, &log.id).unwrap().unwrap();
    assert_eq!(log.status, WebhookStatus::Failed);
    assert_eq!(log.error_message.as_deref(), Some("boom"));
    assert!(log.processed_at.is_some());

    assert!(queries::mark_webhook_processed(&conn, &log.id).unwrap());
    let log = queries::get_webhook_log(&conn, &log.id).unwrap().unwrap();
    assert_eq!(log.status, WebhookStatus::Processed);
}

#[test]
fn test_create_pool_applies_pragmas_per_connection() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storelink.db");
    let pool = storelink::db::create_pool(path.to_str().unwrap()).unwrap();

    {
        let conn = pool.get().unwrap();
        storelink::db::init_db(&conn).unwrap();
        let fk: i64 = conn.query_row("PRAGMA foreign_keys", [], |r| r.get(0)).unwrap();
        assert_eq!(fk, 1);
        create_test_user(&conn, "owner@demo.example");
    }

    // A different pooled connection sees the same on-disk data.
    let conn = pool.get().unwrap();
    let user = queries::get_user_by_email(&conn, "owner@demo.example").unwrap();
    assert!(user.is_some());
}

#[test]
fn test_package_deletion_keeps_subscription_snapshot() {
    use storelink::models::{CreateSubscription, SubscriptionStatus};

    let pool = create_test_pool();
    let conn = pool.get().unwrap();
    let user = create_test_user(&conn, "owner@demo.example");
    let package = create_test_package(&conn, "pro", PackageScope::Salla, 500);

    let sub = queries::create_subscription(
        &conn,
        &CreateSubscription {
            user_id: user.id,
            package_id: Some(package.id.clone()),
            platform: Platform::Salla,
            merchant_id: Some("1001".to_string()),
            subscription_id: None,
            status: SubscriptionStatus::Active,
            package_data: package.snapshot(),
            photos_limit: package.photos_limit,
            start_date: None,
            end_date: None,
            trial_ends_at: None,
        },
    )
    .unwrap();

    conn.execute("DELETE FROM packages WHERE id = ?1", [&package.id]).unwrap();
    assert!(queries::get_package_by_id(&conn, &package.id).unwrap().is_none());

    // package_id goes NULL, the frozen snapshot stays.
    let sub = queries::get_subscription_by_id(&conn, &sub.id).unwrap().unwrap();
    assert!(sub.package_id.is_none());
    assert_eq!(sub.package_data["name"], "pro");
    assert_eq!(sub.photos_limit, 500);
}
