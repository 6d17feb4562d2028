//! Resolution service: the orchestration core.
//!
//! Given a raw number it produces a classification result from the offline
//! store; given a call event it records it and exposes the blocking
//! decision. State lives in pull-based snapshots that the service refreshes
//! after each write, publishing a [`ChangeEvent`] so the shell knows when to
//! re-render. Nothing updates implicitly.

use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::{
    BlockedNumberRecord, CallDirection, CallRecord, Classification, IncomingCallContext,
    LookupResult, NewCallRecord, SettingsPatch, SyncStatus, UserFeedback, UserSettings,
};
use crate::phone::{format_phone_number, normalize_phone_number};
use crate::repository::OfflineStore;

/// How many call events the service keeps loaded for its derived views.
const DEFAULT_HISTORY_LOAD_LIMIT: usize = 100;

/// How many of those the `recent_calls` view exposes.
const DEFAULT_RECENT_VIEW_LIMIT: usize = 20;

/// Published on the subscription channel whenever a snapshot is refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
    /// The loaded call history changed
    CallHistory,
    /// The block list changed
    BlockList,
    /// The settings singleton changed
    Settings,
}

/// Orchestrates the offline stores behind a snapshot-and-notify surface.
pub struct ResolutionService {
    store: Arc<dyn OfflineStore>,
    history_load_limit: usize,
    recent_view_limit: usize,
    call_history: Vec<CallRecord>,
    blocked: Vec<BlockedNumberRecord>,
    settings: UserSettings,
    last_lookup: Option<LookupResult>,
    sync_status: SyncStatus,
    events: broadcast::Sender<ChangeEvent>,
}

impl ResolutionService {
    /// Create a service over the given store with default view limits.
    #[must_use]
    pub fn new(store: Arc<dyn OfflineStore>) -> Self {
        Self::with_history_limits(store, DEFAULT_HISTORY_LOAD_LIMIT, DEFAULT_RECENT_VIEW_LIMIT)
    }

    /// Create a service with explicit history load/view limits.
    #[must_use]
    pub fn with_history_limits(
        store: Arc<dyn OfflineStore>,
        history_load_limit: usize,
        recent_view_limit: usize,
    ) -> Self {
        let (events, _) = broadcast::channel(32);
        Self {
            store,
            history_load_limit,
            recent_view_limit,
            call_history: Vec::new(),
            blocked: Vec::new(),
            settings: UserSettings::default(),
            last_lookup: None,
            sync_status: SyncStatus::default(),
            events,
        }
    }

    /// Load settings and the initial snapshots.
    ///
    /// Must complete before the service is handed to the shell; a failure
    /// here is fatal per the startup policy.
    pub async fn init(&mut self) -> Result<()> {
        self.settings = self.store.settings().await?;
        self.sync_status.total_numbers = self.store.phone_number_count().await?;
        self.reload_call_history().await?;
        self.reload_blocked_numbers().await?;
        info!(
            numbers = self.sync_status.total_numbers,
            "resolution service ready"
        );
        Ok(())
    }

    /// Subscribe to snapshot change notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.events.subscribe()
    }

    fn publish(&self, event: ChangeEvent) {
        // No receivers is fine; the shell may not have subscribed yet.
        let _ = self.events.send(event);
    }

    // ---- Lookup ----

    /// Resolve a raw number against the offline store.
    ///
    /// The result always carries the display-formatted number; a miss
    /// yields `found = false` with an `unknown` classification and score
    /// zero. Each resolution overwrites the single-slot last-lookup cache.
    pub async fn lookup_phone_number(&mut self, raw: &str) -> Result<LookupResult> {
        let display = format_phone_number(raw);

        let result = match self.store.lookup_number(raw).await? {
            Some(record) => LookupResult::hit(display, &record),
            None => LookupResult::miss(display),
        };

        crate::metrics::record_lookup(result.found);
        debug!(
            number = %result.phone_number,
            classification = %result.classification,
            found = result.found,
            "lookup resolved"
        );

        self.last_lookup = Some(result.clone());
        Ok(result)
    }

    /// The most recent resolution, for redisplay without re-querying.
    #[must_use]
    pub fn last_lookup(&self) -> Option<&LookupResult> {
        self.last_lookup.as_ref()
    }

    /// Drop the cached resolution.
    pub fn clear_last_lookup(&mut self) {
        self.last_lookup = None;
    }

    /// Whether a resolution qualifies for automatic blocking under the
    /// given settings. Pure predicate; applying the block is a separate
    /// explicit call.
    #[must_use]
    pub fn should_auto_block(result: &LookupResult, settings: &UserSettings) -> bool {
        settings.auto_block_spam && result.spam_score >= settings.auto_block_threshold
    }

    /// [`Self::should_auto_block`] against the currently loaded settings.
    #[must_use]
    pub fn is_auto_block_candidate(&self, result: &LookupResult) -> bool {
        Self::should_auto_block(result, &self.settings)
    }

    /// Build the context for the incoming-call overlay.
    pub async fn incoming_call_context(&mut self, raw: &str) -> Result<IncomingCallContext> {
        let lookup = self.lookup_phone_number(raw).await?;
        let is_blocked = self.store.is_blocked(raw).await?;
        let is_contact = lookup.classification == Classification::Contact;

        Ok(IncomingCallContext {
            phone_number: lookup.phone_number.clone(),
            lookup: Some(lookup),
            is_contact,
            is_blocked,
        })
    }

    // ---- Call history ----

    /// Record one call event and refresh the history snapshot.
    ///
    /// The classification and score are snapshots at call time; `blocked`
    /// starts false because suppression is the caller's separate decision.
    pub async fn record_call(
        &mut self,
        phone_number: &str,
        direction: CallDirection,
        classification: Classification,
        duration: Option<u32>,
    ) -> Result<i64> {
        let record = NewCallRecord {
            phone_number: phone_number.to_string(),
            normalized_number: normalize_phone_number(phone_number),
            caller_name: None,
            direction,
            timestamp: Utc::now(),
            duration,
            classification,
            spam_score: None,
            blocked: false,
            notes: None,
        };

        let id = self.store.add_call_record(record).await?;
        crate::metrics::record_call(direction);
        self.reload_call_history().await?;
        Ok(id)
    }

    /// Attach a post-call verdict to the most recent loaded call matching
    /// the number. Updates the in-memory snapshot only; the durable
    /// write-back belongs to the sync collaborator.
    pub fn submit_feedback(&mut self, phone_number: &str, is_safe: bool) {
        let normalized = normalize_phone_number(phone_number);
        let feedback = if is_safe {
            UserFeedback::Safe
        } else {
            UserFeedback::Spam
        };

        // Snapshot is newest-first, so the first match is the latest call.
        if let Some(call) = self
            .call_history
            .iter_mut()
            .find(|c| c.normalized_number == normalized)
        {
            call.user_feedback = Some(feedback);
            info!(number = %normalized, feedback = %feedback, "feedback recorded");
            self.publish(ChangeEvent::CallHistory);
        } else {
            warn!(number = %normalized, "feedback for a call not in the loaded history, ignored");
        }
    }

    async fn reload_call_history(&mut self) -> Result<()> {
        self.call_history = self.store.recent_calls(self.history_load_limit).await?;
        self.publish(ChangeEvent::CallHistory);
        Ok(())
    }

    /// The full loaded history snapshot, newest first.
    #[must_use]
    pub fn call_history(&self) -> &[CallRecord] {
        &self.call_history
    }

    /// The newest slice of the history snapshot.
    #[must_use]
    pub fn recent_calls(&self) -> &[CallRecord] {
        let end = self.call_history.len().min(self.recent_view_limit);
        &self.call_history[..end]
    }

    /// Missed calls within the loaded snapshot.
    #[must_use]
    pub fn missed_calls(&self) -> Vec<&CallRecord> {
        self.call_history
            .iter()
            .filter(|c| c.direction == CallDirection::Missed)
            .collect()
    }

    /// Suspected or confirmed spam calls within the loaded snapshot.
    #[must_use]
    pub fn spam_calls(&self) -> Vec<&CallRecord> {
        self.call_history
            .iter()
            .filter(|c| {
                matches!(
                    c.classification,
                    Classification::LowSpam | Classification::HighSpam
                )
            })
            .collect()
    }

    fn is_today(timestamp: DateTime<Utc>) -> bool {
        timestamp.with_timezone(&Local).date_naive() == Local::now().date_naive()
    }

    /// Calls since local midnight.
    #[must_use]
    pub fn today_call_count(&self) -> usize {
        self.call_history
            .iter()
            .filter(|c| Self::is_today(c.timestamp))
            .count()
    }

    /// Suppressed calls since local midnight.
    #[must_use]
    pub fn blocked_today_count(&self) -> usize {
        self.call_history
            .iter()
            .filter(|c| c.blocked && Self::is_today(c.timestamp))
            .count()
    }

    // ---- Block list ----

    async fn reload_blocked_numbers(&mut self) -> Result<()> {
        self.blocked = self.store.blocked_numbers().await?;
        self.publish(ChangeEvent::BlockList);
        Ok(())
    }

    /// The loaded block list snapshot, most recently blocked first.
    #[must_use]
    pub fn blocked_numbers(&self) -> &[BlockedNumberRecord] {
        &self.blocked
    }

    /// Total blocked numbers in the snapshot.
    #[must_use]
    pub fn blocked_count(&self) -> usize {
        self.blocked.len()
    }

    /// Blocks applied by threshold policy.
    #[must_use]
    pub fn auto_blocked_count(&self) -> usize {
        self.blocked.iter().filter(|b| b.auto_blocked).count()
    }

    /// Blocks applied directly by the user.
    #[must_use]
    pub fn manually_blocked_count(&self) -> usize {
        self.blocked.iter().filter(|b| !b.auto_blocked).count()
    }

    /// Block a number and refresh the snapshot. Idempotent like the store.
    pub async fn add_blocked_number(
        &mut self,
        phone_number: &str,
        name: Option<&str>,
        reason: Option<&str>,
        auto_blocked: bool,
    ) -> Result<i64> {
        let id = self
            .store
            .block_number(phone_number, name, reason, auto_blocked)
            .await?;
        crate::metrics::record_block(auto_blocked);
        self.reload_blocked_numbers().await?;
        Ok(id)
    }

    /// Unblock a number and refresh the snapshot. No-op when absent.
    pub async fn remove_blocked_number(&mut self, phone_number: &str) -> Result<()> {
        self.store.unblock_number(phone_number).await?;
        crate::metrics::record_unblock();
        self.reload_blocked_numbers().await?;
        Ok(())
    }

    /// Check the block list directly (not the snapshot).
    pub async fn is_blocked(&self, phone_number: &str) -> Result<bool> {
        self.store.is_blocked(phone_number).await
    }

    /// Filter the block list snapshot.
    ///
    /// A record matches when the normalized query is a substring of its
    /// normalized number, the raw query a substring of its raw number, or
    /// the query a case-insensitive substring of its name. An empty query
    /// returns everything. A query with no digits cannot match by number.
    #[must_use]
    pub fn search_blocked_numbers(&self, query: &str) -> Vec<&BlockedNumberRecord> {
        if query.trim().is_empty() {
            return self.blocked.iter().collect();
        }

        let normalized = normalize_phone_number(query);
        let lowercase = query.to_lowercase();

        self.blocked
            .iter()
            .filter(|b| {
                let matches_number = (!normalized.is_empty()
                    && b.normalized_number.contains(&normalized))
                    || b.phone_number.contains(query);
                let matches_name = b
                    .name
                    .as_deref()
                    .is_some_and(|n| n.to_lowercase().contains(&lowercase));
                matches_number || matches_name
            })
            .collect()
    }

    /// Clear the entire block list and refresh the snapshot.
    pub async fn clear_all_blocked(&mut self) -> Result<()> {
        self.store.clear_all_blocked().await?;
        self.reload_blocked_numbers().await?;
        Ok(())
    }

    /// Clear auto-blocked numbers only, preserving manual blocks.
    pub async fn clear_auto_blocked(&mut self) -> Result<()> {
        self.store.clear_auto_blocked().await?;
        self.reload_blocked_numbers().await?;
        Ok(())
    }

    // ---- Settings ----

    /// The loaded settings snapshot.
    #[must_use]
    pub fn settings(&self) -> &UserSettings {
        &self.settings
    }

    /// Merge a partial update into the settings singleton and refresh the
    /// snapshot.
    pub async fn apply_settings(&mut self, patch: SettingsPatch) -> Result<()> {
        self.settings = self.store.update_settings(patch).await?;
        self.publish(ChangeEvent::Settings);
        Ok(())
    }

    /// Reset every setting to its default value.
    pub async fn reset_settings(&mut self) -> Result<()> {
        let defaults = UserSettings::default();
        self.apply_settings(SettingsPatch {
            auto_block_spam: Some(defaults.auto_block_spam),
            auto_block_threshold: Some(defaults.auto_block_threshold),
            show_call_overlay: Some(defaults.show_call_overlay),
            post_call_prompt: Some(defaults.post_call_prompt),
            wifi_only_sync: Some(defaults.wifi_only_sync),
            enable_notifications: Some(defaults.enable_notifications),
            dark_mode: Some(defaults.dark_mode),
            language: Some(defaults.language),
            last_sync_at: None,
        })
        .await
    }

    // ---- Sync status passthrough ----

    /// Current sync state as last reported by the sync collaborator.
    #[must_use]
    pub fn sync_status(&self) -> &SyncStatus {
        &self.sync_status
    }

    /// Record the connectivity state reported by the platform.
    pub fn set_online(&mut self, online: bool) {
        self.sync_status.is_online = online;
    }

    /// Whether enough intelligence is present to work fully offline.
    #[must_use]
    pub fn is_offline_capable(&self) -> bool {
        self.sync_status.total_numbers > 0
    }

    /// Re-count the intelligence records (after seeding or a sync).
    pub async fn refresh_sync_totals(&mut self) -> Result<()> {
        self.sync_status.total_numbers = self.store.phone_number_count().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_with_score(spam_score: u8) -> LookupResult {
        LookupResult {
            spam_score,
            ..LookupResult::miss("082 123 4567".to_string())
        }
    }

    #[test]
    fn auto_block_requires_master_switch() {
        let mut settings = UserSettings {
            auto_block_threshold: 80,
            ..UserSettings::default()
        };

        let result = lookup_with_score(92);
        assert!(!ResolutionService::should_auto_block(&result, &settings));

        settings.auto_block_spam = true;
        assert!(ResolutionService::should_auto_block(&result, &settings));
    }

    #[test]
    fn auto_block_threshold_is_inclusive() {
        let settings = UserSettings {
            auto_block_spam: true,
            auto_block_threshold: 80,
            ..UserSettings::default()
        };

        assert!(ResolutionService::should_auto_block(
            &lookup_with_score(80),
            &settings
        ));
        assert!(!ResolutionService::should_auto_block(
            &lookup_with_score(79),
            &settings
        ));
    }
}
