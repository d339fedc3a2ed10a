//! Storelink - store-integration lifecycle engine for e-commerce platforms
//!
//! This library provides the core functionality for connecting merchant stores
//! (Salla, Zid, WordPress) via OAuth, ingesting platform webhooks, tracking
//! subscription lifecycle state, and gating photo-credit usage on an active
//! subscription.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod lifecycle;
pub mod models;
pub mod platforms;
pub mod quota;
pub mod refresh;
pub mod resolver;
pub mod util;
