//! Data models for phone intelligence, call history and blocking
//!
//! This module contains all data structures used throughout the library,
//! including the persisted records, their insert (`New*`) counterparts,
//! the settings singleton and the lookup result handed to callers.

use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::error::CallShieldError;

/// Defines a copyable enum stored as TEXT in SQLite and serialized with
/// the same snake_case strings.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
        }

        impl $name {
            /// Canonical storage form of this value.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = CallShieldError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(CallShieldError::InvalidInput(format!(
                        concat!("unrecognized ", stringify!($name), " value: {}"),
                        other
                    ))),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(self.as_str().into())
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: CallShieldError| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

text_enum! {
    /// Direction of a call event.
    CallDirection {
        /// Call received by the device
        Incoming => "incoming",
        /// Call placed from the device
        Outgoing => "outgoing",
        /// Incoming call that was not answered
        Missed => "missed",
    }
}

text_enum! {
    /// The authoritative caller-ID label attached to a number or a call.
    Classification {
        /// Known legitimate business
        Verified => "verified",
        /// One of the user's contacts
        Contact => "contact",
        /// Community-verified safe
        Safe => "safe",
        /// No data available
        Unknown => "unknown",
        /// Low confidence spam
        LowSpam => "low_spam",
        /// High confidence spam
        HighSpam => "high_spam",
        /// Blocked by the user
        Blocked => "blocked",
    }
}

text_enum! {
    /// Severity bucket a classification renders with.
    Severity {
        /// Positive/green treatment
        Success => "success",
        /// Brand/primary treatment
        Primary => "primary",
        /// Muted treatment
        Neutral => "neutral",
        /// Caution treatment
        Warning => "warning",
        /// Alarm treatment
        Danger => "danger",
    }
}

impl Classification {
    /// Severity bucket for rendering this classification.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::Verified | Self::Safe => Severity::Success,
            Self::Contact => Severity::Primary,
            Self::Unknown | Self::Blocked => Severity::Neutral,
            Self::LowSpam => Severity::Warning,
            Self::HighSpam => Severity::Danger,
        }
    }

    /// Human-readable label for this classification.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Verified => "Verified",
            Self::Contact => "Contact",
            Self::Safe => "Safe",
            Self::Unknown => "Unknown",
            Self::LowSpam => "Suspected Spam",
            Self::HighSpam => "Spam",
            Self::Blocked => "Blocked",
        }
    }
}

text_enum! {
    /// Category of the calling party.
    CallerCategory {
        /// Generic business
        Business => "business",
        /// Bank or financial institution
        Bank => "bank",
        /// Government office
        Government => "government",
        /// Courier or delivery service
        Delivery => "delivery",
        /// Medical practice or hospital
        Healthcare => "healthcare",
        /// Mobile or fixed-line operator
        Telecoms => "telecoms",
        /// Outbound sales caller
        Telemarketer => "telemarketer",
        /// Collections agency
        DebtCollector => "debt_collector",
        /// Known fraud operation
        Scam => "scam",
        /// Private individual
        Personal => "personal",
        /// No category information
        Unknown => "unknown",
    }
}

text_enum! {
    /// Provenance of a phone intelligence record.
    NumberSource {
        /// Shipped with the offline database
        Database => "database",
        /// Crowd-reported
        Community => "community",
        /// Entered by the user
        User => "user",
    }
}

text_enum! {
    /// Where a lookup result was resolved.
    LookupSource {
        /// Local offline database
        Offline => "offline",
        /// Online lookup service
        Online => "online",
        /// Device contact list
        Contact => "contact",
    }
}

text_enum! {
    /// Post-call verdict submitted by the user.
    UserFeedback {
        /// Caller marked legitimate
        Safe => "safe",
        /// Caller marked unwanted
        Spam => "spam",
    }
}

text_enum! {
    /// Theme preference, passed through to the UI shell.
    DarkMode {
        /// Follow the platform setting
        System => "system",
        /// Always light
        Light => "light",
        /// Always dark
        Dark => "dark",
    }
}

/// Known intelligence about a phone number in the offline database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhoneNumberRecord {
    /// Database primary key
    pub id: i64,
    /// Raw number as first seen (display/input form)
    pub number: String,
    /// Canonical local-format key, unique per subscriber line
    pub normalized_number: String,
    /// Verified business or contact name
    pub name: Option<String>,
    /// Caller category
    pub category: CallerCategory,
    /// Spam likelihood, 0-100
    pub spam_score: u8,
    /// Authoritative caller-ID label
    pub classification: Classification,
    /// Number of spam reports associated with the number
    pub report_count: u32,
    /// True only for verified businesses
    pub verified_business: bool,
    /// Timestamp of the most recent spam report
    pub last_reported: Option<DateTime<Utc>>,
    /// Timestamp of the most recent record update
    pub last_updated: Option<DateTime<Utc>>,
    /// Where the record came from
    pub source: NumberSource,
}

/// Data for inserting a phone intelligence record.
#[derive(Debug, Clone)]
pub struct NewPhoneNumber {
    /// Raw number as provided
    pub number: String,
    /// Verified business or contact name
    pub name: Option<String>,
    /// Caller category
    pub category: CallerCategory,
    /// Spam likelihood, 0-100
    pub spam_score: u8,
    /// Authoritative caller-ID label
    pub classification: Classification,
    /// Number of spam reports associated with the number
    pub report_count: u32,
    /// True only for verified businesses
    pub verified_business: bool,
    /// Timestamp of the most recent spam report
    pub last_reported: Option<DateTime<Utc>>,
    /// Where the record came from
    pub source: NumberSource,
}

/// One immutable call event in the local history log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRecord {
    /// Database primary key
    pub id: i64,
    /// Raw number as reported by the platform
    pub phone_number: String,
    /// Canonical local-format key
    pub normalized_number: String,
    /// Caller name snapshot at call time
    pub caller_name: Option<String>,
    /// Call direction
    pub direction: CallDirection,
    /// Event time, set at creation
    pub timestamp: DateTime<Utc>,
    /// Connected duration in seconds, absent when not connected
    pub duration: Option<u32>,
    /// Classification snapshot at call time, never refreshed
    pub classification: Classification,
    /// Spam score snapshot at call time
    pub spam_score: Option<u8>,
    /// Post-call verdict, the only mutation permitted after creation
    pub user_feedback: Option<UserFeedback>,
    /// Whether the call was suppressed
    pub blocked: bool,
    /// Free-text notes
    pub notes: Option<String>,
}

/// Data for appending a call event.
#[derive(Debug, Clone)]
pub struct NewCallRecord {
    /// Raw number as reported by the platform
    pub phone_number: String,
    /// Canonical local-format key
    pub normalized_number: String,
    /// Caller name snapshot at call time
    pub caller_name: Option<String>,
    /// Call direction
    pub direction: CallDirection,
    /// Event time
    pub timestamp: DateTime<Utc>,
    /// Connected duration in seconds
    pub duration: Option<u32>,
    /// Classification snapshot at call time
    pub classification: Classification,
    /// Spam score snapshot at call time
    pub spam_score: Option<u8>,
    /// Whether the call was suppressed
    pub blocked: bool,
    /// Free-text notes
    pub notes: Option<String>,
}

/// A standing decision to suppress a number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockedNumberRecord {
    /// Database primary key
    pub id: i64,
    /// Raw number as provided when blocking
    pub phone_number: String,
    /// Canonical local-format key, the uniqueness boundary
    pub normalized_number: String,
    /// Name snapshot at block time
    pub name: Option<String>,
    /// When the block was applied
    pub blocked_at: DateTime<Utc>,
    /// Free-text reason for the block
    pub reason: Option<String>,
    /// True when applied by threshold policy rather than the user
    pub auto_blocked: bool,
}

/// Data for inserting a block record.
#[derive(Debug, Clone)]
pub struct NewBlockedNumber {
    /// Raw number as provided
    pub phone_number: String,
    /// Canonical local-format key
    pub normalized_number: String,
    /// Name snapshot
    pub name: Option<String>,
    /// When the block was applied
    pub blocked_at: DateTime<Utc>,
    /// Free-text reason
    pub reason: Option<String>,
    /// True when applied by threshold policy
    pub auto_blocked: bool,
}

/// The singleton configuration record controlling auto-block behavior and
/// sync preferences. Exactly one row exists; it is created with these
/// defaults on first initialization and only ever updated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    /// Master switch for automatic blocking
    pub auto_block_spam: bool,
    /// Spam score at or above which a number becomes an auto-block candidate
    pub auto_block_threshold: u8,
    /// Show the incoming call overlay (consumed by the UI shell)
    pub show_call_overlay: bool,
    /// Prompt for feedback after unknown calls (consumed by the UI shell)
    pub post_call_prompt: bool,
    /// Restrict database sync to Wi-Fi (consumed by the sync collaborator)
    pub wifi_only_sync: bool,
    /// Allow notifications (consumed by the UI shell)
    pub enable_notifications: bool,
    /// Theme preference, passed through
    pub dark_mode: DarkMode,
    /// Locale code, e.g. "en", "zu", "af"
    pub language: String,
    /// Last successful sync, owned by the sync collaborator
    pub last_sync_at: Option<DateTime<Utc>>,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            auto_block_spam: false,
            auto_block_threshold: 80,
            show_call_overlay: true,
            post_call_prompt: true,
            wifi_only_sync: true,
            enable_notifications: true,
            dark_mode: DarkMode::System,
            language: "en".to_string(),
            last_sync_at: None,
        }
    }
}

/// Partial update for [`UserSettings`].
///
/// The shape is fixed: deserializing a patch with a key that is not a
/// settings field is an error rather than a silent accept.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsPatch {
    /// New value for the auto-block master switch
    pub auto_block_spam: Option<bool>,
    /// New auto-block threshold
    pub auto_block_threshold: Option<u8>,
    /// New call overlay toggle
    pub show_call_overlay: Option<bool>,
    /// New post-call prompt toggle
    pub post_call_prompt: Option<bool>,
    /// New Wi-Fi-only sync toggle
    pub wifi_only_sync: Option<bool>,
    /// New notifications toggle
    pub enable_notifications: Option<bool>,
    /// New theme preference
    pub dark_mode: Option<DarkMode>,
    /// New locale code
    pub language: Option<String>,
    /// New last-sync timestamp
    pub last_sync_at: Option<DateTime<Utc>>,
}

impl UserSettings {
    /// Overlay a partial update onto the full settings record.
    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(v) = patch.auto_block_spam {
            self.auto_block_spam = v;
        }
        if let Some(v) = patch.auto_block_threshold {
            self.auto_block_threshold = v;
        }
        if let Some(v) = patch.show_call_overlay {
            self.show_call_overlay = v;
        }
        if let Some(v) = patch.post_call_prompt {
            self.post_call_prompt = v;
        }
        if let Some(v) = patch.wifi_only_sync {
            self.wifi_only_sync = v;
        }
        if let Some(v) = patch.enable_notifications {
            self.enable_notifications = v;
        }
        if let Some(v) = patch.dark_mode {
            self.dark_mode = v;
        }
        if let Some(v) = &patch.language {
            self.language = v.clone();
        }
        if let Some(v) = patch.last_sync_at {
            self.last_sync_at = Some(v);
        }
    }
}

/// Outcome of resolving a raw number against the offline database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupResult {
    /// Display-formatted form of the queried number
    pub phone_number: String,
    /// Whether a record was found
    pub found: bool,
    /// Display name, when known
    pub name: Option<String>,
    /// Caller category
    pub category: CallerCategory,
    /// Authoritative caller-ID label
    pub classification: Classification,
    /// Spam likelihood, 0-100
    pub spam_score: u8,
    /// Number of spam reports
    pub report_count: u32,
    /// True only for verified businesses
    pub verified_business: bool,
    /// Where the result was resolved
    pub source: LookupSource,
}

impl LookupResult {
    /// Build a hit result from a stored record.
    #[must_use]
    pub fn hit(display_number: String, record: &PhoneNumberRecord) -> Self {
        Self {
            phone_number: display_number,
            found: true,
            name: record.name.clone(),
            category: record.category,
            classification: record.classification,
            spam_score: record.spam_score,
            report_count: record.report_count,
            verified_business: record.verified_business,
            source: LookupSource::Offline,
        }
    }

    /// Build the miss result: unknown caller, score zero.
    #[must_use]
    pub fn miss(display_number: String) -> Self {
        Self {
            phone_number: display_number,
            found: false,
            name: None,
            category: CallerCategory::Unknown,
            classification: Classification::Unknown,
            spam_score: 0,
            report_count: 0,
            verified_business: false,
            source: LookupSource::Offline,
        }
    }
}

/// Context handed to the incoming-call overlay collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct IncomingCallContext {
    /// Display-formatted number
    pub phone_number: String,
    /// Resolution result, when the lookup succeeded
    pub lookup: Option<LookupResult>,
    /// Whether the caller is one of the user's contacts
    pub is_contact: bool,
    /// Whether the number is on the block list
    pub is_blocked: bool,
}

/// Database sync state, owned by the out-of-scope sync collaborator and
/// merely carried here for the shell to display.
#[derive(Debug, Clone, Serialize)]
pub struct SyncStatus {
    /// Last successful sync
    pub last_sync: Option<DateTime<Utc>>,
    /// Version of the shipped intelligence database
    pub database_version: u32,
    /// Number of intelligence records available offline
    pub total_numbers: u64,
    /// Spam reports queued for upload
    pub pending_reports: u32,
    /// Current connectivity, as reported by the platform
    pub is_online: bool,
}

impl Default for SyncStatus {
    fn default() -> Self {
        Self {
            last_sync: None,
            database_version: 0,
            total_numbers: 0,
            pending_reports: 0,
            is_online: true,
        }
    }
}

/// Row counts for the three data tables.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DatabaseStats {
    /// Phone intelligence records
    pub phone_numbers: u64,
    /// Call history entries
    pub call_history: u64,
    /// Block list entries
    pub blocked_numbers: u64,
}

/// A selectable interface language.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Language {
    /// Locale code stored in settings
    pub code: &'static str,
    /// Native display name
    pub name: &'static str,
}

/// Languages offered by the settings screen (the eleven SA official ones).
pub const AVAILABLE_LANGUAGES: &[Language] = &[
    Language { code: "en", name: "English" },
    Language { code: "af", name: "Afrikaans" },
    Language { code: "zu", name: "isiZulu" },
    Language { code: "xh", name: "isiXhosa" },
    Language { code: "st", name: "Sesotho" },
    Language { code: "tn", name: "Setswana" },
    Language { code: "ss", name: "siSwati" },
    Language { code: "ve", name: "Tshivenda" },
    Language { code: "ts", name: "Xitsonga" },
    Language { code: "nr", name: "isiNdebele" },
    Language { code: "nso", name: "Sepedi" },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_round_trips_through_storage_form() {
        for c in [
            Classification::Verified,
            Classification::Contact,
            Classification::Safe,
            Classification::Unknown,
            Classification::LowSpam,
            Classification::HighSpam,
            Classification::Blocked,
        ] {
            assert_eq!(c.as_str().parse::<Classification>().unwrap(), c);
        }
    }

    #[test]
    fn unrecognized_classification_is_rejected() {
        assert!("mystery".parse::<Classification>().is_err());
    }

    #[test]
    fn classification_presentation_table() {
        assert_eq!(Classification::Verified.severity(), Severity::Success);
        assert_eq!(Classification::Contact.severity(), Severity::Primary);
        assert_eq!(Classification::LowSpam.label(), "Suspected Spam");
        assert_eq!(Classification::HighSpam.label(), "Spam");
        assert_eq!(Classification::Blocked.severity(), Severity::Neutral);
    }

    #[test]
    fn settings_patch_overlays_only_provided_fields() {
        let mut settings = UserSettings::default();
        let patch = SettingsPatch {
            auto_block_spam: Some(true),
            auto_block_threshold: Some(65),
            ..SettingsPatch::default()
        };
        settings.apply(&patch);

        assert!(settings.auto_block_spam);
        assert_eq!(settings.auto_block_threshold, 65);
        assert!(settings.show_call_overlay);
        assert_eq!(settings.language, "en");
    }

    #[test]
    fn settings_patch_rejects_unknown_keys() {
        let err = serde_json::from_str::<SettingsPatch>(r#"{"block_everything": true}"#);
        assert!(err.is_err());
    }
}
