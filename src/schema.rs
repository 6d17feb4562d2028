//! Database schema definitions
//!
//! This module provides constants for table and column names used with rusqlite,
//! mirroring the tables created by the SQL migrations.

/// Phone intelligence table schema
pub mod phone_numbers {
    /// Table name
    pub const TABLE: &str = "phone_numbers";
    /// Primary key column
    pub const ID: &str = "id";
    /// Raw number as first seen column
    pub const NUMBER: &str = "number";
    /// Canonical local-format key column
    pub const NORMALIZED_NUMBER: &str = "normalized_number";
    /// Verified business or contact name column
    pub const NAME: &str = "name";
    /// Caller category column
    pub const CATEGORY: &str = "category";
    /// Spam score column (0-100)
    pub const SPAM_SCORE: &str = "spam_score";
    /// Caller-ID classification column
    pub const CLASSIFICATION: &str = "classification";
    /// Spam report count column
    pub const REPORT_COUNT: &str = "report_count";
    /// Verified business flag column
    pub const VERIFIED_BUSINESS: &str = "verified_business";
    /// Last report timestamp column
    pub const LAST_REPORTED: &str = "last_reported";
    /// Last update timestamp column
    pub const LAST_UPDATED: &str = "last_updated";
    /// Provenance column (database, community, user)
    pub const SOURCE: &str = "source";
}

/// Call history table schema
pub mod call_history {
    /// Table name
    pub const TABLE: &str = "call_history";
    /// Primary key column
    pub const ID: &str = "id";
    /// Raw number column
    pub const PHONE_NUMBER: &str = "phone_number";
    /// Canonical local-format key column
    pub const NORMALIZED_NUMBER: &str = "normalized_number";
    /// Caller name snapshot column
    pub const CALLER_NAME: &str = "caller_name";
    /// Call direction column (incoming, outgoing, missed)
    pub const DIRECTION: &str = "direction";
    /// Event timestamp column
    pub const TIMESTAMP: &str = "timestamp";
    /// Call duration column (seconds)
    pub const DURATION: &str = "duration";
    /// Classification snapshot column
    pub const CLASSIFICATION: &str = "classification";
    /// Spam score snapshot column
    pub const SPAM_SCORE: &str = "spam_score";
    /// Post-call user feedback column (safe, spam)
    pub const USER_FEEDBACK: &str = "user_feedback";
    /// Suppressed-call flag column
    pub const BLOCKED: &str = "blocked";
    /// Free-text notes column
    pub const NOTES: &str = "notes";
}

/// Block list table schema
pub mod blocked_numbers {
    /// Table name
    pub const TABLE: &str = "blocked_numbers";
    /// Primary key column
    pub const ID: &str = "id";
    /// Raw number column
    pub const PHONE_NUMBER: &str = "phone_number";
    /// Canonical local-format key column (unique)
    pub const NORMALIZED_NUMBER: &str = "normalized_number";
    /// Name snapshot column
    pub const NAME: &str = "name";
    /// Block timestamp column
    pub const BLOCKED_AT: &str = "blocked_at";
    /// Block reason column
    pub const REASON: &str = "reason";
    /// Auto-block provenance flag column
    pub const AUTO_BLOCKED: &str = "auto_blocked";
}

/// Settings singleton table schema
pub mod settings {
    /// Table name
    pub const TABLE: &str = "settings";
    /// Primary key column
    pub const ID: &str = "id";
    /// Auto-block master switch column
    pub const AUTO_BLOCK_SPAM: &str = "auto_block_spam";
    /// Auto-block spam score threshold column
    pub const AUTO_BLOCK_THRESHOLD: &str = "auto_block_threshold";
    /// Incoming call overlay toggle column
    pub const SHOW_CALL_OVERLAY: &str = "show_call_overlay";
    /// Post-call feedback prompt toggle column
    pub const POST_CALL_PROMPT: &str = "post_call_prompt";
    /// Wi-Fi-only sync toggle column
    pub const WIFI_ONLY_SYNC: &str = "wifi_only_sync";
    /// Notifications toggle column
    pub const ENABLE_NOTIFICATIONS: &str = "enable_notifications";
    /// Dark mode preference column (system, light, dark)
    pub const DARK_MODE: &str = "dark_mode";
    /// Locale code column
    pub const LANGUAGE: &str = "language";
    /// Last sync timestamp column
    pub const LAST_SYNC_AT: &str = "last_sync_at";
}
