//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! publishing pipeline.

// Bearer assertion lifecycle
pub const TOKEN_TTL_SECS: i64 = 1200; // 20 minutes, App Store Connect maximum
pub const TOKEN_CACHE_MARGIN_SECS: i64 = 60; // cached expiry is one minute early
pub const TOKEN_REFRESH_SKEW_SECS: i64 = 60;
pub const APP_STORE_CONNECT_AUDIENCE: &str = "appstoreconnect-v1";

// Google service-account grant
pub const ANDROID_PUBLISHER_SCOPE: &str = "https://www.googleapis.com/auth/androidpublisher";
pub const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
pub const SERVICE_ACCOUNT_ASSERTION_TTL_SECS: i64 = 3600;

// Retrying API client
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const BACKOFF_BASE_SECS: u64 = 1; // rate-limit wait is base * 2^attempt

// Vendor API base URLs
pub const APP_STORE_CONNECT_BASE_URL: &str = "https://api.appstoreconnect.apple.com/v1";
pub const ANDROID_PUBLISHER_BASE_URL: &str =
    "https://androidpublisher.googleapis.com/androidpublisher/v3";

// Configuration discovery
pub const CONFIG_ENV_VAR: &str = "STORESHIP_CONFIG";
