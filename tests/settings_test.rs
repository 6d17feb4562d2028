use callshield::db::Database;
use callshield::models::{DarkMode, SettingsPatch, UserSettings};
use tempfile::TempDir;

fn open_db(dir: &TempDir) -> Database {
    let path = dir.path().join("test.db");
    Database::new(path.to_str().expect("temp path is utf-8")).expect("Failed to create database")
}

#[test]
fn test_first_read_creates_defaults() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let db = open_db(&dir);

    let settings = db.get_settings().expect("Failed to read settings");
    assert_eq!(settings, UserSettings::default());
    assert!(!settings.auto_block_spam);
    assert_eq!(settings.auto_block_threshold, 80);
    assert_eq!(settings.dark_mode, DarkMode::System);
    assert_eq!(settings.language, "en");
}

#[test]
fn test_partial_update_merges_and_persists() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let db = open_db(&dir);

    let updated = db
        .update_settings(&SettingsPatch {
            auto_block_spam: Some(true),
            auto_block_threshold: Some(65),
            ..SettingsPatch::default()
        })
        .expect("Failed to update settings");

    assert!(updated.auto_block_spam);
    assert_eq!(updated.auto_block_threshold, 65);
    // Untouched fields keep their previous values
    assert!(updated.show_call_overlay);
    assert_eq!(updated.language, "en");

    // The merge was written back durably
    let reread = db.get_settings().expect("Failed to re-read settings");
    assert_eq!(reread, updated);
}

#[test]
fn test_settings_stay_a_single_row() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let db = open_db(&dir);

    db.get_settings().expect("Failed to read settings");
    db.update_settings(&SettingsPatch {
        language: Some("zu".to_string()),
        ..SettingsPatch::default()
    })
    .expect("Failed to update settings");
    db.update_settings(&SettingsPatch {
        dark_mode: Some(DarkMode::Dark),
        ..SettingsPatch::default()
    })
    .expect("Failed to update settings");

    let conn = db.get_connection().expect("Failed to get connection");
    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM settings", [], |row| row.get(0))
        .expect("Failed to count settings rows");
    assert_eq!(rows, 1);

    let settings = db.get_settings().expect("Failed to read settings");
    assert_eq!(settings.language, "zu");
    assert_eq!(settings.dark_mode, DarkMode::Dark);
}

#[test]
fn test_update_before_first_read_creates_the_row() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let db = open_db(&dir);

    let updated = db
        .update_settings(&SettingsPatch {
            wifi_only_sync: Some(false),
            ..SettingsPatch::default()
        })
        .expect("Failed to update settings");

    assert!(!updated.wifi_only_sync);
    assert!(!db.get_settings().expect("Failed to read").wifi_only_sync);
}
