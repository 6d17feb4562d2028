use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::error::{CallShieldError, Result};
use crate::models::{
    BlockedNumberRecord, CallRecord, DatabaseStats, NewBlockedNumber, NewCallRecord,
    NewPhoneNumber, PhoneNumberRecord, SettingsPatch, UserSettings,
};
use crate::phone::normalize_phone_number;
use crate::schema::{blocked_numbers, call_history, phone_numbers, settings};

// Type aliases for the database connection pool
pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Handle to the offline phone-intelligence database.
///
/// Owns the connection pool and exposes the four logical stores: phone
/// intelligence, call history, block list and the settings singleton.
/// Construct one per process (or per test) and inject it where needed;
/// there is no ambient global instance.
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Open (creating if necessary) the database at `database_url` and run
    /// pending migrations, with default pool settings.
    ///
    /// Accepts a plain filesystem path or a `sqlite:`/`sqlite://` URL.
    pub fn new(database_url: &str) -> Result<Self> {
        Self::open_with(&DatabaseConfig {
            url: database_url.to_string(),
            ..DatabaseConfig::default()
        })
    }

    /// Open the database described by `config`.
    pub fn open_with(config: &DatabaseConfig) -> Result<Self> {
        let path = Self::database_path(&config.url);

        // Create parent directory if it doesn't exist
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder()
            .max_size(config.max_connections)
            .connection_timeout(Duration::from_secs(config.connection_timeout_secs))
            .build(manager)?;

        let conn = pool.get()?;
        Self::run_migrations(&conn)?;
        debug!(path, "database opened");

        Ok(Self { pool })
    }

    fn database_path(database_url: &str) -> &str {
        database_url
            .strip_prefix("sqlite://")
            .or_else(|| database_url.strip_prefix("sqlite:"))
            .unwrap_or(database_url)
    }

    /// Run database migrations
    fn run_migrations(conn: &Connection) -> Result<()> {
        conn.execute_batch(include_str!(
            "../migrations/2025-06-10-000000_create_tables/up.sql"
        ))?;
        conn.execute_batch(include_str!(
            "../migrations/2025-06-18-000000_harden_blocked_numbers/up.sql"
        ))?;
        Ok(())
    }

    /// Get a connection from the pool
    pub fn get_connection(&self) -> Result<DbConnection> {
        Ok(self.pool.get()?)
    }

    /// Ensure the settings singleton exists.
    ///
    /// Must succeed before the service is used; a failure here aborts app
    /// start rather than running with undefined settings state.
    pub fn initialize(&self) -> Result<()> {
        self.get_settings()
            .map_err(|e| CallShieldError::Init(format!("cannot create default settings: {e}")))?;
        info!("database initialized");
        Ok(())
    }

    // ---- Phone intelligence store ----

    /// Insert or update intelligence for a number, keyed by its normalized
    /// form. `last_updated` is stamped on every write.
    pub fn add_phone_number(&self, new: NewPhoneNumber) -> Result<PhoneNumberRecord> {
        let conn = self.get_connection()?;
        let normalized = normalize_phone_number(&new.number);
        let now = Utc::now();

        let existing: Option<i64> = conn
            .query_row(
                &format!(
                    "SELECT {} FROM {} WHERE {} = ?",
                    phone_numbers::ID,
                    phone_numbers::TABLE,
                    phone_numbers::NORMALIZED_NUMBER
                ),
                params![normalized],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            conn.execute(
                &format!(
                    "UPDATE {} SET {} = ?, {} = ?, {} = ?, {} = ?, {} = ?, {} = ?, {} = ?, {} = ?, {} = ? WHERE {} = ?",
                    phone_numbers::TABLE,
                    phone_numbers::NAME,
                    phone_numbers::CATEGORY,
                    phone_numbers::SPAM_SCORE,
                    phone_numbers::CLASSIFICATION,
                    phone_numbers::REPORT_COUNT,
                    phone_numbers::VERIFIED_BUSINESS,
                    phone_numbers::LAST_REPORTED,
                    phone_numbers::LAST_UPDATED,
                    phone_numbers::SOURCE,
                    phone_numbers::ID
                ),
                params![
                    new.name,
                    new.category,
                    new.spam_score,
                    new.classification,
                    new.report_count,
                    new.verified_business,
                    new.last_reported,
                    now,
                    new.source,
                    id
                ],
            )?;
        } else {
            conn.execute(
                &format!(
                    "INSERT INTO {} ({}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                    phone_numbers::TABLE,
                    phone_numbers::NUMBER,
                    phone_numbers::NORMALIZED_NUMBER,
                    phone_numbers::NAME,
                    phone_numbers::CATEGORY,
                    phone_numbers::SPAM_SCORE,
                    phone_numbers::CLASSIFICATION,
                    phone_numbers::REPORT_COUNT,
                    phone_numbers::VERIFIED_BUSINESS,
                    phone_numbers::LAST_REPORTED,
                    phone_numbers::LAST_UPDATED,
                    phone_numbers::SOURCE
                ),
                params![
                    new.number,
                    normalized,
                    new.name,
                    new.category,
                    new.spam_score,
                    new.classification,
                    new.report_count,
                    new.verified_business,
                    new.last_reported,
                    now,
                    new.source
                ],
            )?;
        }

        self.phone_number_by_key(&normalized)?
            .ok_or_else(|| CallShieldError::Other("failed to re-read phone number record".into()))
    }

    fn phone_number_by_key(&self, normalized: &str) -> Result<Option<PhoneNumberRecord>> {
        let conn = self.get_connection()?;
        let record = conn
            .query_row(
                &format!(
                    "SELECT * FROM {} WHERE {} = ?",
                    phone_numbers::TABLE,
                    phone_numbers::NORMALIZED_NUMBER
                ),
                params![normalized],
                Self::map_phone_number,
            )
            .optional()?;
        Ok(record)
    }

    /// Look up intelligence for a raw number.
    ///
    /// Resolution order: exact match on the normalized key, then exact
    /// match on the raw `number` column as originally stored (legacy rows
    /// recorded before normalization). A miss is `Ok(None)`, not an error.
    pub fn lookup_number(&self, raw: &str) -> Result<Option<PhoneNumberRecord>> {
        let normalized = normalize_phone_number(raw);

        if let Some(record) = self.phone_number_by_key(&normalized)? {
            return Ok(Some(record));
        }

        let conn = self.get_connection()?;
        let record = conn
            .query_row(
                &format!(
                    "SELECT * FROM {} WHERE {} = ?",
                    phone_numbers::TABLE,
                    phone_numbers::NUMBER
                ),
                params![raw],
                Self::map_phone_number,
            )
            .optional()?;
        Ok(record)
    }

    /// Total number of intelligence records.
    pub fn phone_number_count(&self) -> Result<u64> {
        let conn = self.get_connection()?;
        let count = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", phone_numbers::TABLE),
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Map a database row to a PhoneNumberRecord
    fn map_phone_number(row: &Row) -> rusqlite::Result<PhoneNumberRecord> {
        Ok(PhoneNumberRecord {
            id: row.get(phone_numbers::ID)?,
            number: row.get(phone_numbers::NUMBER)?,
            normalized_number: row.get(phone_numbers::NORMALIZED_NUMBER)?,
            name: row.get(phone_numbers::NAME)?,
            category: row.get(phone_numbers::CATEGORY)?,
            spam_score: row.get(phone_numbers::SPAM_SCORE)?,
            classification: row.get(phone_numbers::CLASSIFICATION)?,
            report_count: row.get(phone_numbers::REPORT_COUNT)?,
            verified_business: row.get(phone_numbers::VERIFIED_BUSINESS)?,
            last_reported: row.get(phone_numbers::LAST_REPORTED)?,
            last_updated: row.get(phone_numbers::LAST_UPDATED)?,
            source: row.get(phone_numbers::SOURCE)?,
        })
    }

    // ---- Call history store ----

    /// Append one call event. Entries are immutable once written.
    pub fn add_call_record(&self, new: NewCallRecord) -> Result<i64> {
        let conn = self.get_connection()?;

        conn.execute(
            &format!(
                "INSERT INTO {} ({}, {}, {}, {}, {}, {}, {}, {}, {}, {}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                call_history::TABLE,
                call_history::PHONE_NUMBER,
                call_history::NORMALIZED_NUMBER,
                call_history::CALLER_NAME,
                call_history::DIRECTION,
                call_history::TIMESTAMP,
                call_history::DURATION,
                call_history::CLASSIFICATION,
                call_history::SPAM_SCORE,
                call_history::BLOCKED,
                call_history::NOTES
            ),
            params![
                new.phone_number,
                new.normalized_number,
                new.caller_name,
                new.direction,
                new.timestamp,
                new.duration,
                new.classification,
                new.spam_score,
                new.blocked,
                new.notes
            ],
        )?;

        let id = conn.last_insert_rowid();
        debug!(id, direction = %new.direction, "call record appended");
        Ok(id)
    }

    /// The most recent call events, newest first, at most `limit` entries.
    pub fn recent_calls(&self, limit: usize) -> Result<Vec<CallRecord>> {
        let conn = self.get_connection()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT * FROM {} ORDER BY {} DESC, {} DESC LIMIT ?",
            call_history::TABLE,
            call_history::TIMESTAMP,
            call_history::ID
        ))?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let call_iter = stmt.query_map(params![limit], Self::map_call_record)?;

        let mut results = Vec::new();
        for call in call_iter {
            results.push(call?);
        }
        Ok(results)
    }

    /// Map a database row to a CallRecord
    fn map_call_record(row: &Row) -> rusqlite::Result<CallRecord> {
        Ok(CallRecord {
            id: row.get(call_history::ID)?,
            phone_number: row.get(call_history::PHONE_NUMBER)?,
            normalized_number: row.get(call_history::NORMALIZED_NUMBER)?,
            caller_name: row.get(call_history::CALLER_NAME)?,
            direction: row.get(call_history::DIRECTION)?,
            timestamp: row.get(call_history::TIMESTAMP)?,
            duration: row.get(call_history::DURATION)?,
            classification: row.get(call_history::CLASSIFICATION)?,
            spam_score: row.get(call_history::SPAM_SCORE)?,
            user_feedback: row.get(call_history::USER_FEEDBACK)?,
            blocked: row.get(call_history::BLOCKED)?,
            notes: row.get(call_history::NOTES)?,
        })
    }

    // ---- Block list store ----

    /// Put a number on the block list.
    ///
    /// Idempotent: if the normalized number is already blocked the existing
    /// record's id is returned and the stored name/reason/provenance are
    /// left untouched. The existence check and insert run in one
    /// transaction, with the unique index on the normalized key as the
    /// storage-level backstop.
    pub fn block_number(
        &self,
        phone_number: &str,
        name: Option<&str>,
        reason: Option<&str>,
        auto_blocked: bool,
    ) -> Result<i64> {
        let mut conn = self.get_connection()?;
        let normalized = normalize_phone_number(phone_number);
        let tx = conn.transaction()?;

        let existing: Option<i64> = tx
            .query_row(
                &format!(
                    "SELECT {} FROM {} WHERE {} = ?",
                    blocked_numbers::ID,
                    blocked_numbers::TABLE,
                    blocked_numbers::NORMALIZED_NUMBER
                ),
                params![normalized],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            debug!(number = %normalized, id, "number already blocked");
            return Ok(id);
        }

        tx.execute(
            &format!(
                "INSERT INTO {} ({}, {}, {}, {}, {}, {}) VALUES (?, ?, ?, ?, ?, ?)",
                blocked_numbers::TABLE,
                blocked_numbers::PHONE_NUMBER,
                blocked_numbers::NORMALIZED_NUMBER,
                blocked_numbers::NAME,
                blocked_numbers::BLOCKED_AT,
                blocked_numbers::REASON,
                blocked_numbers::AUTO_BLOCKED
            ),
            params![phone_number, normalized, name, Utc::now(), reason, auto_blocked],
        )?;

        let id = tx.last_insert_rowid();
        tx.commit()?;
        info!(number = %normalized, auto_blocked, "number blocked");
        Ok(id)
    }

    /// Insert a block record as-is, preserving its `blocked_at` timestamp.
    /// Used by seeding; `block_number` is the normal entry point.
    pub fn add_blocked_record(&self, new: NewBlockedNumber) -> Result<i64> {
        let conn = self.get_connection()?;

        conn.execute(
            &format!(
                "INSERT INTO {} ({}, {}, {}, {}, {}, {}) VALUES (?, ?, ?, ?, ?, ?)",
                blocked_numbers::TABLE,
                blocked_numbers::PHONE_NUMBER,
                blocked_numbers::NORMALIZED_NUMBER,
                blocked_numbers::NAME,
                blocked_numbers::BLOCKED_AT,
                blocked_numbers::REASON,
                blocked_numbers::AUTO_BLOCKED
            ),
            params![
                new.phone_number,
                new.normalized_number,
                new.name,
                new.blocked_at,
                new.reason,
                new.auto_blocked
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Remove a number from the block list. Removing a number that was
    /// never blocked is a no-op, not an error.
    pub fn unblock_number(&self, phone_number: &str) -> Result<()> {
        let conn = self.get_connection()?;
        let normalized = normalize_phone_number(phone_number);

        let removed = conn.execute(
            &format!(
                "DELETE FROM {} WHERE {} = ?",
                blocked_numbers::TABLE,
                blocked_numbers::NORMALIZED_NUMBER
            ),
            params![normalized],
        )?;

        if removed > 0 {
            info!(number = %normalized, "number unblocked");
        }
        Ok(())
    }

    /// Whether the number is currently on the block list.
    pub fn is_blocked(&self, phone_number: &str) -> Result<bool> {
        let conn = self.get_connection()?;
        let normalized = normalize_phone_number(phone_number);

        let blocked = conn.query_row(
            &format!(
                "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = ?)",
                blocked_numbers::TABLE,
                blocked_numbers::NORMALIZED_NUMBER
            ),
            params![normalized],
            |row| row.get(0),
        )?;
        Ok(blocked)
    }

    /// All block records, most recently blocked first.
    pub fn blocked_numbers(&self) -> Result<Vec<BlockedNumberRecord>> {
        let conn = self.get_connection()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT * FROM {} ORDER BY {} DESC, {} DESC",
            blocked_numbers::TABLE,
            blocked_numbers::BLOCKED_AT,
            blocked_numbers::ID
        ))?;

        let blocked_iter = stmt.query_map([], Self::map_blocked_number)?;

        let mut results = Vec::new();
        for blocked in blocked_iter {
            results.push(blocked?);
        }
        Ok(results)
    }

    /// Remove every block record.
    pub fn clear_all_blocked(&self) -> Result<()> {
        let conn = self.get_connection()?;
        let removed = conn.execute(&format!("DELETE FROM {}", blocked_numbers::TABLE), [])?;
        info!(removed, "block list cleared");
        Ok(())
    }

    /// Remove only the records applied by threshold policy, preserving
    /// manual blocks.
    pub fn clear_auto_blocked(&self) -> Result<()> {
        let conn = self.get_connection()?;
        let removed = conn.execute(
            &format!(
                "DELETE FROM {} WHERE {} = 1",
                blocked_numbers::TABLE,
                blocked_numbers::AUTO_BLOCKED
            ),
            [],
        )?;
        info!(removed, "auto-blocked numbers cleared");
        Ok(())
    }

    /// Map a database row to a BlockedNumberRecord
    fn map_blocked_number(row: &Row) -> rusqlite::Result<BlockedNumberRecord> {
        Ok(BlockedNumberRecord {
            id: row.get(blocked_numbers::ID)?,
            phone_number: row.get(blocked_numbers::PHONE_NUMBER)?,
            normalized_number: row.get(blocked_numbers::NORMALIZED_NUMBER)?,
            name: row.get(blocked_numbers::NAME)?,
            blocked_at: row.get(blocked_numbers::BLOCKED_AT)?,
            reason: row.get(blocked_numbers::REASON)?,
            auto_blocked: row.get(blocked_numbers::AUTO_BLOCKED)?,
        })
    }

    // ---- Settings store ----

    /// Read the settings singleton, creating it with defaults on first
    /// access. The same row is reused for the life of the database.
    pub fn get_settings(&self) -> Result<UserSettings> {
        let mut conn = self.get_connection()?;
        let tx = conn.transaction()?;

        if let Some((_, current)) = Self::first_settings_row(&tx)? {
            return Ok(current);
        }

        let defaults = UserSettings::default();
        Self::insert_settings_row(&tx, &defaults)?;
        tx.commit()?;
        info!("settings row created with defaults");
        Ok(defaults)
    }

    /// Overlay a partial update onto the settings singleton and write the
    /// merged record back to the same row.
    pub fn update_settings(&self, patch: &SettingsPatch) -> Result<UserSettings> {
        let mut conn = self.get_connection()?;
        let tx = conn.transaction()?;

        let (id, mut current) = match Self::first_settings_row(&tx)? {
            Some(pair) => pair,
            None => {
                Self::insert_settings_row(&tx, &UserSettings::default())?;
                (tx.last_insert_rowid(), UserSettings::default())
            }
        };

        current.apply(patch);

        tx.execute(
            &format!(
                "UPDATE {} SET {} = ?, {} = ?, {} = ?, {} = ?, {} = ?, {} = ?, {} = ?, {} = ?, {} = ? WHERE {} = ?",
                settings::TABLE,
                settings::AUTO_BLOCK_SPAM,
                settings::AUTO_BLOCK_THRESHOLD,
                settings::SHOW_CALL_OVERLAY,
                settings::POST_CALL_PROMPT,
                settings::WIFI_ONLY_SYNC,
                settings::ENABLE_NOTIFICATIONS,
                settings::DARK_MODE,
                settings::LANGUAGE,
                settings::LAST_SYNC_AT,
                settings::ID
            ),
            params![
                current.auto_block_spam,
                current.auto_block_threshold,
                current.show_call_overlay,
                current.post_call_prompt,
                current.wifi_only_sync,
                current.enable_notifications,
                current.dark_mode,
                current.language,
                current.last_sync_at,
                id
            ],
        )?;
        tx.commit()?;

        debug!("settings updated");
        Ok(current)
    }

    fn first_settings_row(conn: &Connection) -> Result<Option<(i64, UserSettings)>> {
        let row = conn
            .query_row(
                &format!(
                    "SELECT * FROM {} ORDER BY {} ASC LIMIT 1",
                    settings::TABLE,
                    settings::ID
                ),
                [],
                Self::map_settings,
            )
            .optional()?;
        Ok(row)
    }

    fn insert_settings_row(conn: &Connection, record: &UserSettings) -> Result<()> {
        conn.execute(
            &format!(
                "INSERT INTO {} ({}, {}, {}, {}, {}, {}, {}, {}, {}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                settings::TABLE,
                settings::AUTO_BLOCK_SPAM,
                settings::AUTO_BLOCK_THRESHOLD,
                settings::SHOW_CALL_OVERLAY,
                settings::POST_CALL_PROMPT,
                settings::WIFI_ONLY_SYNC,
                settings::ENABLE_NOTIFICATIONS,
                settings::DARK_MODE,
                settings::LANGUAGE,
                settings::LAST_SYNC_AT
            ),
            params![
                record.auto_block_spam,
                record.auto_block_threshold,
                record.show_call_overlay,
                record.post_call_prompt,
                record.wifi_only_sync,
                record.enable_notifications,
                record.dark_mode,
                record.language,
                record.last_sync_at
            ],
        )?;
        Ok(())
    }

    /// Map a database row to the settings record plus its row id
    fn map_settings(row: &Row) -> rusqlite::Result<(i64, UserSettings)> {
        Ok((
            row.get(settings::ID)?,
            UserSettings {
                auto_block_spam: row.get(settings::AUTO_BLOCK_SPAM)?,
                auto_block_threshold: row.get(settings::AUTO_BLOCK_THRESHOLD)?,
                show_call_overlay: row.get(settings::SHOW_CALL_OVERLAY)?,
                post_call_prompt: row.get(settings::POST_CALL_PROMPT)?,
                wifi_only_sync: row.get(settings::WIFI_ONLY_SYNC)?,
                enable_notifications: row.get(settings::ENABLE_NOTIFICATIONS)?,
                dark_mode: row.get(settings::DARK_MODE)?,
                language: row.get(settings::LANGUAGE)?,
                last_sync_at: row.get(settings::LAST_SYNC_AT)?,
            },
        ))
    }

    // ---- Statistics and data wipe ----

    /// Row counts for the three data tables.
    pub fn stats(&self) -> Result<DatabaseStats> {
        let conn = self.get_connection()?;

        let count = |table: &str| -> Result<u64> {
            Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })?)
        };

        Ok(DatabaseStats {
            phone_numbers: count(phone_numbers::TABLE)?,
            call_history: count(call_history::TABLE)?,
            blocked_numbers: count(blocked_numbers::TABLE)?,
        })
    }

    /// Full data wipe: intelligence, history and block list. The settings
    /// singleton survives.
    pub fn clear_all_data(&self) -> Result<()> {
        let conn = self.get_connection()?;
        conn.execute(&format!("DELETE FROM {}", phone_numbers::TABLE), [])?;
        conn.execute(&format!("DELETE FROM {}", call_history::TABLE), [])?;
        conn.execute(&format!("DELETE FROM {}", blocked_numbers::TABLE), [])?;
        info!("all data cleared");
        Ok(())
    }
}
