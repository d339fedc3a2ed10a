//! Usage quota ledger.
//!
//! The consumption path must be safe under concurrent webhook and API
//! traffic, so the check-and-increment happens in a single guarded UPDATE
//! instead of a read-modify-write. `photos_limit = 0` means unlimited.

use rusqlite::Connection;

use crate::db::queries;
use crate::error::Result;
use crate::models::Subscription;

/// Whether a subscription could absorb `count` more photos right now.
///
/// Advisory only: the authoritative check is the guarded UPDATE in
/// [`consume`]. Useful for UI gating where a stale answer is acceptable.
pub fn can_consume(subscription: &Subscription, count: i64) -> bool {
    if count <= 0 {
        return false;
    }
    if !subscription.status.is_usable() {
        return false;
    }
    subscription.photos_limit == 0
        || subscription.photos_used + count <= subscription.photos_limit
}

/// Atomically consume `count` photos from a subscription's quota.
///
/// Returns `Ok(true)` when the quota was taken, `Ok(false)` when the
/// subscription is missing, not usable, or would exceed its limit. Never
/// over-commits: two racing callers against one remaining unit see exactly
/// one `true`.
pub fn consume(conn: &Connection, subscription_id: &str, count: i64) -> Result<bool> {
    if count <= 0 {
        return Ok(false);
    }
    queries::consume_photos(conn, subscription_id, count)
}

/// Photos left on the subscription. Unlimited plans report `i64::MAX`.
pub fn remaining(subscription: &Subscription) -> i64 {
    subscription.remaining_photos()
}
