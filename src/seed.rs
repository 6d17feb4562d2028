//! Bundled offline dataset.
//!
//! A small set of South African numbers with realistic spam intelligence,
//! call history and block records so the app is useful before any sync
//! has run. Seeding is idempotent: it is skipped whenever the call
//! history already has entries.

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::db::Database;
use crate::error::Result;
use crate::logging::OperationTimer;
use crate::models::{
    CallDirection, CallerCategory, Classification, NewBlockedNumber, NewCallRecord,
    NewPhoneNumber, NumberSource,
};
use crate::phone::normalize_phone_number;

/// Load the bundled dataset into an empty database.
///
/// Returns `false` without touching anything when call history already
/// exists.
pub fn seed_database(db: &Database) -> Result<bool> {
    if db.stats()?.call_history > 0 {
        info!("database already seeded");
        return Ok(false);
    }

    let timer = OperationTimer::new("seed_database");
    db.initialize()?;

    for number in seed_phone_numbers() {
        db.add_phone_number(number)?;
    }

    let now = Utc::now();
    for call in seed_call_history(now) {
        db.add_call_record(call)?;
    }
    for blocked in seed_blocked_numbers(now) {
        db.add_blocked_record(blocked)?;
    }

    timer.finish();
    info!("database seeded with offline dataset");
    Ok(true)
}

/// Wipe the seeded data (and anything recorded since). Settings survive.
pub fn clear_seed_data(db: &Database) -> Result<()> {
    db.clear_all_data()
}

fn intel(
    number: &str,
    name: Option<&str>,
    classification: Classification,
    category: CallerCategory,
    spam_score: u8,
    report_count: u32,
    last_reported: Option<DateTime<Utc>>,
) -> NewPhoneNumber {
    NewPhoneNumber {
        number: number.to_string(),
        name: name.map(ToString::to_string),
        category,
        spam_score,
        classification,
        report_count,
        verified_business: classification == Classification::Verified,
        last_reported,
        source: NumberSource::Database,
    }
}

fn seed_phone_numbers() -> Vec<NewPhoneNumber> {
    let now = Utc::now();

    vec![
        intel(
            "+27 11 234 5678",
            None,
            Classification::HighSpam,
            CallerCategory::Telemarketer,
            92,
            847,
            Some(now - Duration::days(2)),
        ),
        intel(
            "+27 87 575 9404",
            Some("FNB Customer Service"),
            Classification::Verified,
            CallerCategory::Bank,
            0,
            0,
            None,
        ),
        intel(
            "+27 21 555 6789",
            None,
            Classification::LowSpam,
            CallerCategory::Unknown,
            45,
            12,
            Some(now - Duration::days(7)),
        ),
        intel(
            "+27 11 111 2222",
            None,
            Classification::HighSpam,
            CallerCategory::DebtCollector,
            85,
            234,
            Some(now - Duration::days(14)),
        ),
        intel(
            "+27 82 333 4444",
            Some("Mom"),
            Classification::Contact,
            CallerCategory::Personal,
            0,
            0,
            None,
        ),
        intel(
            "+27 82 999 8888",
            None,
            Classification::Unknown,
            CallerCategory::Unknown,
            0,
            0,
            None,
        ),
        intel(
            "+27 10 500 1234",
            Some("Vodacom"),
            Classification::Verified,
            CallerCategory::Telecoms,
            0,
            0,
            None,
        ),
        intel(
            "+27 11 999 0000",
            None,
            Classification::HighSpam,
            CallerCategory::Scam,
            98,
            1523,
            Some(now - Duration::days(1)),
        ),
    ]
}

fn call(
    number: &str,
    caller_name: Option<&str>,
    direction: CallDirection,
    timestamp: DateTime<Utc>,
    duration: Option<u32>,
    classification: Classification,
    blocked: bool,
) -> NewCallRecord {
    NewCallRecord {
        phone_number: number.to_string(),
        normalized_number: normalize_phone_number(number),
        caller_name: caller_name.map(ToString::to_string),
        direction,
        timestamp,
        duration,
        classification,
        spam_score: None,
        blocked,
        notes: None,
    }
}

fn seed_call_history(now: DateTime<Utc>) -> Vec<NewCallRecord> {
    vec![
        call(
            "+27 82 333 4444",
            Some("Mom"),
            CallDirection::Incoming,
            now - Duration::hours(2),
            Some(300),
            Classification::Contact,
            false,
        ),
        call(
            "+27 11 234 5678",
            None,
            CallDirection::Missed,
            now - Duration::hours(4),
            None,
            Classification::HighSpam,
            true,
        ),
        call(
            "+27 87 575 9404",
            Some("FNB Customer Service"),
            CallDirection::Incoming,
            now - Duration::hours(24),
            Some(180),
            Classification::Verified,
            false,
        ),
        call(
            "+27 82 999 8888",
            None,
            CallDirection::Missed,
            now - Duration::hours(26),
            None,
            Classification::Unknown,
            false,
        ),
        call(
            "+27 21 555 6789",
            None,
            CallDirection::Missed,
            now - Duration::days(3),
            None,
            Classification::LowSpam,
            false,
        ),
        call(
            "+27 11 111 2222",
            None,
            CallDirection::Incoming,
            now - Duration::days(3),
            None,
            Classification::HighSpam,
            true,
        ),
        call(
            "+27 10 500 1234",
            Some("Vodacom"),
            CallDirection::Incoming,
            now - Duration::days(5),
            Some(120),
            Classification::Verified,
            false,
        ),
        call(
            "+27 11 999 0000",
            None,
            CallDirection::Missed,
            now - Duration::days(6),
            None,
            Classification::HighSpam,
            true,
        ),
        call(
            "+27 82 333 4444",
            Some("Mom"),
            CallDirection::Outgoing,
            now - Duration::days(7),
            Some(420),
            Classification::Contact,
            false,
        ),
    ]
}

fn blocked(
    number: &str,
    blocked_at: DateTime<Utc>,
    reason: &str,
    auto_blocked: bool,
) -> NewBlockedNumber {
    NewBlockedNumber {
        phone_number: number.to_string(),
        normalized_number: normalize_phone_number(number),
        name: None,
        blocked_at,
        reason: Some(reason.to_string()),
        auto_blocked,
    }
}

fn seed_blocked_numbers(now: DateTime<Utc>) -> Vec<NewBlockedNumber> {
    vec![
        blocked("+27 11 234 5678", now - Duration::days(2), "Telemarketer", true),
        blocked("+27 21 555 6789", now - Duration::days(7), "Scam attempt", false),
        blocked("+27 11 111 2222", now - Duration::days(14), "Debt collector", true),
        blocked(
            "+27 11 999 0000",
            now - Duration::days(1),
            "SARS impersonation scam",
            true,
        ),
    ]
}
