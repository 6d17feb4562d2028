use std::sync::Arc;

use callshield::db::Database;
use callshield::models::{
    CallDirection, CallerCategory, Classification, NewPhoneNumber, NumberSource,
};
use callshield::service::{ChangeEvent, ResolutionService};
use tempfile::TempDir;

fn open_db(dir: &TempDir) -> Arc<Database> {
    let path = dir.path().join("test.db");
    let db = Database::new(path.to_str().expect("temp path is utf-8"))
        .expect("Failed to create database");
    db.initialize().expect("Failed to initialize database");
    Arc::new(db)
}

async fn ready_service(db: Arc<Database>) -> ResolutionService {
    let mut service = ResolutionService::new(db);
    service.init().await.expect("Failed to init service");
    service
}

fn spam_number(number: &str, spam_score: u8) -> NewPhoneNumber {
    NewPhoneNumber {
        number: number.to_string(),
        name: None,
        category: CallerCategory::Telemarketer,
        spam_score,
        classification: Classification::HighSpam,
        report_count: 847,
        verified_business: false,
        last_reported: None,
        source: NumberSource::Database,
    }
}

#[tokio::test]
async fn test_unknown_number_resolves_to_unknown() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let mut service = ready_service(open_db(&dir)).await;

    let result = service
        .lookup_phone_number("0829998888")
        .await
        .expect("Lookup failed");

    assert!(!result.found);
    assert_eq!(result.classification, Classification::Unknown);
    assert_eq!(result.category, CallerCategory::Unknown);
    assert_eq!(result.spam_score, 0);
    assert_eq!(result.report_count, 0);
    assert!(!result.verified_business);
    // The display form is always the formatted number
    assert_eq!(result.phone_number, "082 999 8888");
}

#[tokio::test]
async fn test_hit_populates_result_and_last_lookup_cache() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let db = open_db(&dir);
    db.add_phone_number(spam_number("0112345678", 92))
        .expect("Failed to seed number");

    let mut service = ready_service(db).await;
    assert!(service.last_lookup().is_none());

    let result = service
        .lookup_phone_number("+27 11 234 5678")
        .await
        .expect("Lookup failed");

    assert!(result.found);
    assert_eq!(result.spam_score, 92);
    assert_eq!(result.phone_number, "011 234 5678");

    let cached = service.last_lookup().expect("Cache should hold the result");
    assert_eq!(cached.phone_number, result.phone_number);
    assert_eq!(cached.spam_score, 92);

    service.clear_last_lookup();
    assert!(service.last_lookup().is_none());
}

#[tokio::test]
async fn test_auto_block_threshold_scenario() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let db = open_db(&dir);
    db.add_phone_number(spam_number("0112345678", 92))
        .expect("Failed to seed number");

    let mut service = ready_service(db).await;
    service
        .apply_settings(callshield::SettingsPatch {
            auto_block_spam: Some(true),
            auto_block_threshold: Some(80),
            ..Default::default()
        })
        .await
        .expect("Failed to apply settings");

    let result = service
        .lookup_phone_number("0112345678")
        .await
        .expect("Lookup failed");
    assert!(service.is_auto_block_candidate(&result));

    // The predicate never blocks by itself; applying is an explicit call
    assert!(!service.is_blocked("0112345678").await.expect("Check failed"));

    service
        .add_blocked_number("0112345678", None, Some("High spam score"), true)
        .await
        .expect("Failed to block");

    assert!(service.is_blocked("+27112345678").await.expect("Check failed"));
    let blocked = service.blocked_numbers();
    assert_eq!(blocked.len(), 1);
    assert!(blocked[0].auto_blocked);
}

#[tokio::test]
async fn test_record_call_appends_and_reloads() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let mut service = ready_service(open_db(&dir)).await;

    service
        .record_call(
            "0821234567",
            CallDirection::Incoming,
            Classification::Unknown,
            Some(42),
        )
        .await
        .expect("Failed to record call");
    service
        .record_call("0821234567", CallDirection::Missed, Classification::Unknown, None)
        .await
        .expect("Failed to record call");

    let history = service.call_history();
    assert_eq!(history.len(), 2);
    // Newest first
    assert_eq!(history[0].direction, CallDirection::Missed);
    assert!(history[0].timestamp >= history[1].timestamp);
    assert!(!history[0].blocked);

    assert_eq!(service.today_call_count(), 2);
    assert_eq!(service.blocked_today_count(), 0);
    assert_eq!(service.missed_calls().len(), 1);
}

#[tokio::test]
async fn test_recent_view_is_truncated() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let db = open_db(&dir);
    let mut service = ResolutionService::with_history_limits(db, 100, 2);
    service.init().await.expect("Failed to init service");

    for _ in 0..3 {
        service
            .record_call("0821234567", CallDirection::Incoming, Classification::Safe, None)
            .await
            .expect("Failed to record call");
    }

    assert_eq!(service.call_history().len(), 3);
    assert_eq!(service.recent_calls().len(), 2);
}

#[tokio::test]
async fn test_spam_calls_view_filters_both_spam_levels() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let mut service = ready_service(open_db(&dir)).await;

    for classification in [
        Classification::HighSpam,
        Classification::Safe,
        Classification::LowSpam,
        Classification::Verified,
    ] {
        service
            .record_call("0821234567", CallDirection::Incoming, classification, None)
            .await
            .expect("Failed to record call");
    }

    assert_eq!(service.spam_calls().len(), 2);
}

#[tokio::test]
async fn test_feedback_attaches_to_the_most_recent_matching_call() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let mut service = ready_service(open_db(&dir)).await;

    service
        .record_call("0821234567", CallDirection::Incoming, Classification::Unknown, None)
        .await
        .expect("Failed to record call");
    service
        .record_call("+27 82 123 4567", CallDirection::Missed, Classification::Unknown, None)
        .await
        .expect("Failed to record call");

    service.submit_feedback("0821234567", false);

    let history = service.call_history();
    assert_eq!(
        history[0].user_feedback,
        Some(callshield::models::UserFeedback::Spam)
    );
    assert_eq!(history[1].user_feedback, None);

    // Feedback for a number with no loaded call is ignored
    service.submit_feedback("0839990000", true);
}

#[tokio::test]
async fn test_search_blocked_numbers_branches() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let mut service = ready_service(open_db(&dir)).await;

    service
        .add_blocked_number("0111112222", Some("Scammer"), None, false)
        .await
        .expect("Failed to block");
    service
        .add_blocked_number("0215556789", None, Some("Telemarketer"), false)
        .await
        .expect("Failed to block");
    service
        .add_blocked_number("0825550000", Some("Old gym"), None, false)
        .await
        .expect("Failed to block");

    // Name branch, case-insensitive; digits never contain "scam"
    let by_name = service.search_blocked_numbers("scam");
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].name.as_deref(), Some("Scammer"));

    // Number branch via the normalized query
    let by_number = service.search_blocked_numbers("+27 21 555");
    assert_eq!(by_number.len(), 1);
    assert_eq!(by_number[0].normalized_number, "0215556789");

    // Empty query returns the whole list
    assert_eq!(service.search_blocked_numbers("").len(), 3);
    assert_eq!(service.search_blocked_numbers("  ").len(), 3);

    // No match
    assert!(service.search_blocked_numbers("nothing").is_empty());
}

#[tokio::test]
async fn test_clear_auto_blocked_through_service() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let mut service = ready_service(open_db(&dir)).await;

    service
        .add_blocked_number("0111112222", None, None, true)
        .await
        .expect("Failed to block");
    service
        .add_blocked_number("0215556789", None, None, true)
        .await
        .expect("Failed to block");
    service
        .add_blocked_number("0825550000", None, None, false)
        .await
        .expect("Failed to block");

    service.clear_auto_blocked().await.expect("Failed to clear");

    assert_eq!(service.blocked_count(), 1);
    assert_eq!(service.auto_blocked_count(), 0);
    assert_eq!(service.manually_blocked_count(), 1);
    assert_eq!(service.blocked_numbers()[0].normalized_number, "0825550000");
}

#[tokio::test]
async fn test_change_events_are_published_on_refresh() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let mut service = ready_service(open_db(&dir)).await;
    let mut events = service.subscribe();

    service
        .add_blocked_number("0111112222", None, None, false)
        .await
        .expect("Failed to block");
    assert_eq!(events.try_recv().expect("Expected event"), ChangeEvent::BlockList);

    service
        .record_call("0821234567", CallDirection::Incoming, Classification::Unknown, None)
        .await
        .expect("Failed to record call");
    assert_eq!(events.try_recv().expect("Expected event"), ChangeEvent::CallHistory);
}

#[tokio::test]
async fn test_incoming_call_context_for_blocked_contactless_number() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let db = open_db(&dir);
    db.add_phone_number(spam_number("0112345678", 92))
        .expect("Failed to seed number");

    let mut service = ready_service(db).await;
    service
        .add_blocked_number("0112345678", None, None, false)
        .await
        .expect("Failed to block");

    let context = service
        .incoming_call_context("+27112345678")
        .await
        .expect("Failed to build context");

    assert_eq!(context.phone_number, "011 234 5678");
    assert!(context.is_blocked);
    assert!(!context.is_contact);
    assert!(context.lookup.expect("Lookup should be present").found);
}
