use callshield::db::Database;
use callshield::seed::{clear_seed_data, seed_database};
use tempfile::TempDir;

fn open_db(dir: &TempDir) -> Database {
    let path = dir.path().join("test.db");
    Database::new(path.to_str().expect("temp path is utf-8")).expect("Failed to create database")
}

#[test]
fn test_seed_populates_empty_database_once() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let db = open_db(&dir);

    assert!(seed_database(&db).expect("Seeding failed"));

    let stats = db.stats().expect("Stats failed");
    assert_eq!(stats.phone_numbers, 8);
    assert_eq!(stats.call_history, 9);
    assert_eq!(stats.blocked_numbers, 4);

    // Second run is a no-op
    assert!(!seed_database(&db).expect("Repeat seeding failed"));
    assert_eq!(db.stats().expect("Stats failed").call_history, 9);
}

#[test]
fn test_seeded_intelligence_is_resolvable() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let db = open_db(&dir);
    seed_database(&db).expect("Seeding failed");

    let record = db
        .lookup_number("0112345678")
        .expect("Lookup failed")
        .expect("Seeded spam number should resolve");
    assert_eq!(record.spam_score, 92);

    let verified = db
        .lookup_number("+27 87 575 9404")
        .expect("Lookup failed")
        .expect("Seeded bank number should resolve");
    assert!(verified.verified_business);
    assert_eq!(verified.name.as_deref(), Some("FNB Customer Service"));
}

#[test]
fn test_seeded_blocks_preserve_provenance() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let db = open_db(&dir);
    seed_database(&db).expect("Seeding failed");

    assert!(db.is_blocked("0112345678").expect("Check failed"));

    let blocked = db.blocked_numbers().expect("Failed to list");
    assert_eq!(blocked.iter().filter(|b| b.auto_blocked).count(), 3);
    assert_eq!(blocked.iter().filter(|b| !b.auto_blocked).count(), 1);
}

#[test]
fn test_clear_seed_data_keeps_settings() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let db = open_db(&dir);
    seed_database(&db).expect("Seeding failed");

    db.update_settings(&callshield::SettingsPatch {
        language: Some("af".to_string()),
        ..Default::default()
    })
    .expect("Failed to update settings");

    clear_seed_data(&db).expect("Failed to clear");

    let stats = db.stats().expect("Stats failed");
    assert_eq!(stats.phone_numbers, 0);
    assert_eq!(stats.call_history, 0);
    assert_eq!(stats.blocked_numbers, 0);
    assert_eq!(db.get_settings().expect("Failed to read").language, "af");
}
