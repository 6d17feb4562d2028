//! Storage seam between the resolution service and the database.
//!
//! The service talks to a [`OfflineStore`] trait object rather than the
//! concrete [`Database`], so tests and alternative backends can slot in
//! without touching the orchestration logic.

use async_trait::async_trait;

use crate::db::Database;
use crate::error::Result;
use crate::models::{
    BlockedNumberRecord, CallRecord, DatabaseStats, NewCallRecord, PhoneNumberRecord,
    SettingsPatch, UserSettings,
};

/// Async facade over the four offline stores.
///
/// Operations may suspend while durable storage completes, but a miss is
/// always a value (`None`, `false`, empty), never an error; only storage
/// failures propagate.
#[async_trait]
pub trait OfflineStore: Send + Sync {
    /// Look up intelligence for a raw number (normalized key first, then
    /// the raw column).
    async fn lookup_number(&self, raw: &str) -> Result<Option<PhoneNumberRecord>>;

    /// Total number of intelligence records.
    async fn phone_number_count(&self) -> Result<u64>;

    /// Append one immutable call event, returning its id.
    async fn add_call_record(&self, record: NewCallRecord) -> Result<i64>;

    /// The most recent call events, newest first.
    async fn recent_calls(&self, limit: usize) -> Result<Vec<CallRecord>>;

    /// Idempotently put a number on the block list, returning the id of
    /// the new or pre-existing record.
    async fn block_number(
        &self,
        phone_number: &str,
        name: Option<&str>,
        reason: Option<&str>,
        auto_blocked: bool,
    ) -> Result<i64>;

    /// Remove a number from the block list (no-op when absent).
    async fn unblock_number(&self, phone_number: &str) -> Result<()>;

    /// Whether the number is currently blocked.
    async fn is_blocked(&self, phone_number: &str) -> Result<bool>;

    /// All block records, most recently blocked first.
    async fn blocked_numbers(&self) -> Result<Vec<BlockedNumberRecord>>;

    /// Remove every block record.
    async fn clear_all_blocked(&self) -> Result<()>;

    /// Remove auto-blocked records only, preserving manual blocks.
    async fn clear_auto_blocked(&self) -> Result<()>;

    /// Read the settings singleton, creating defaults on first access.
    async fn settings(&self) -> Result<UserSettings>;

    /// Merge a partial update into the settings singleton.
    async fn update_settings(&self, patch: SettingsPatch) -> Result<UserSettings>;

    /// Row counts for the data tables.
    async fn stats(&self) -> Result<DatabaseStats>;
}

#[async_trait]
impl OfflineStore for Database {
    async fn lookup_number(&self, raw: &str) -> Result<Option<PhoneNumberRecord>> {
        Database::lookup_number(self, raw)
    }

    async fn phone_number_count(&self) -> Result<u64> {
        Database::phone_number_count(self)
    }

    async fn add_call_record(&self, record: NewCallRecord) -> Result<i64> {
        Database::add_call_record(self, record)
    }

    async fn recent_calls(&self, limit: usize) -> Result<Vec<CallRecord>> {
        Database::recent_calls(self, limit)
    }

    async fn block_number(
        &self,
        phone_number: &str,
        name: Option<&str>,
        reason: Option<&str>,
        auto_blocked: bool,
    ) -> Result<i64> {
        Database::block_number(self, phone_number, name, reason, auto_blocked)
    }

    async fn unblock_number(&self, phone_number: &str) -> Result<()> {
        Database::unblock_number(self, phone_number)
    }

    async fn is_blocked(&self, phone_number: &str) -> Result<bool> {
        Database::is_blocked(self, phone_number)
    }

    async fn blocked_numbers(&self) -> Result<Vec<BlockedNumberRecord>> {
        Database::blocked_numbers(self)
    }

    async fn clear_all_blocked(&self) -> Result<()> {
        Database::clear_all_blocked(self)
    }

    async fn clear_auto_blocked(&self) -> Result<()> {
        Database::clear_auto_blocked(self)
    }

    async fn settings(&self) -> Result<UserSettings> {
        Database::get_settings(self)
    }

    async fn update_settings(&self, patch: SettingsPatch) -> Result<UserSettings> {
        Database::update_settings(self, &patch)
    }

    async fn stats(&self) -> Result<DatabaseStats> {
        Database::stats(self)
    }
}
