use rusqlite::Connection;

/// Initialize the database schema.
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Merchant accounts (identity - source of truth for name/email)
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'client',
            email_verified_at INTEGER,
            api_token_hash TEXT,
            reset_token_hash TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);

        -- Store connections (one per merchant per platform)
        CREATE TABLE IF NOT EXISTS stores (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            platform TEXT NOT NULL CHECK (platform IN ('salla', 'zid', 'wordpress')),
            merchant_id TEXT NOT NULL,
            store_id TEXT,
            domain TEXT,
            store_name TEXT,
            store_email TEXT,
            store_phone TEXT,
            avatar TEXT,
            access_token TEXT,
            refresh_token TEXT,
            token_expires_at INTEGER,
            status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'inactive', 'suspended')),
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,

            UNIQUE(merchant_id, platform)
        );
        CREATE INDEX IF NOT EXISTS idx_stores_user_platform ON stores(user_id, platform);
        CREATE INDEX IF NOT EXISTS idx_stores_status ON stores(status);
        CREATE INDEX IF NOT EXISTS idx_stores_token_expiry ON stores(token_expires_at) WHERE refresh_token IS NOT NULL;

        -- Sellable plan definitions
        CREATE TABLE IF NOT EXISTS packages (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            display_name TEXT NOT NULL,
            description TEXT,
            platform TEXT NOT NULL CHECK (platform IN ('salla', 'zid', 'wordpress', 'all')),
            price REAL NOT NULL DEFAULT 0,
            currency TEXT NOT NULL DEFAULT 'SAR',
            billing_cycle TEXT NOT NULL DEFAULT 'monthly' CHECK (billing_cycle IN ('monthly', 'yearly', 'lifetime')),
            photos_limit INTEGER NOT NULL DEFAULT 0,
            is_active INTEGER NOT NULL DEFAULT 1,
            is_featured INTEGER NOT NULL DEFAULT 0,
            sort_order INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_packages_platform_active ON packages(platform, is_active);

        -- Subscriptions (at most one per user per platform)
        CREATE TABLE IF NOT EXISTS subscriptions (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            package_id TEXT REFERENCES packages(id) ON DELETE SET NULL,
            platform TEXT NOT NULL CHECK (platform IN ('salla', 'zid', 'wordpress')),
            merchant_id TEXT,
            subscription_id TEXT,
            status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'trial', 'cancelled', 'expired', 'suspended')),
            package_data TEXT NOT NULL,
            photos_limit INTEGER NOT NULL DEFAULT 0,
            photos_used INTEGER NOT NULL DEFAULT 0,
            start_date INTEGER,
            end_date INTEGER,
            trial_ends_at INTEGER,
            cancelled_at INTEGER,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,

            UNIQUE(user_id, platform)
        );
        CREATE INDEX IF NOT EXISTS idx_subscriptions_status_end ON subscriptions(status, end_date);
        CREATE INDEX IF NOT EXISTS idx_subscriptions_merchant ON subscriptions(merchant_id);

        -- Subscription history (append-only audit log)
        CREATE TABLE IF NOT EXISTS subscription_histories (
            id TEXT PRIMARY KEY,
            subscription_id TEXT NOT NULL REFERENCES subscriptions(id) ON DELETE CASCADE,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            package_id TEXT REFERENCES packages(id) ON DELETE SET NULL,
            platform TEXT NOT NULL,
            event_type TEXT NOT NULL,
            status TEXT NOT NULL,
            package_data TEXT NOT NULL,
            changes TEXT,
            price REAL,
            start_date INTEGER,
            end_date INTEGER,
            webhook_payload TEXT,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_histories_subscription ON subscription_histories(subscription_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_histories_user_platform ON subscription_histories(user_id, platform);
        CREATE INDEX IF NOT EXISTS idx_histories_event ON subscription_histories(event_type);

        -- Webhook logs (one row per inbound attempt; outlive users/stores)
        CREATE TABLE IF NOT EXISTS webhook_logs (
            id TEXT PRIMARY KEY,
            event TEXT NOT NULL,
            platform TEXT NOT NULL,
            merchant_id TEXT,
            user_id TEXT REFERENCES users(id) ON DELETE SET NULL,
            store_id TEXT REFERENCES stores(id) ON DELETE SET NULL,
            payload TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'processed', 'failed')),
            error_message TEXT,
            processed_at INTEGER,
            webhook_created_at INTEGER,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_webhook_logs_event_platform ON webhook_logs(event, platform);
        CREATE INDEX IF NOT EXISTS idx_webhook_logs_merchant ON webhook_logs(merchant_id);
        CREATE INDEX IF NOT EXISTS idx_webhook_logs_status ON webhook_logs(status);
        "#,
    )
}
