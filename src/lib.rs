//! CallShield - Offline Caller ID and Spam Protection
//!
//! A Rust library answering, for any phone number, "who is this and
//! should the call be allowed" using only data stored on-device, and
//! recording call and blocking history locally.
//!
//! # Features
//!
//! - Canonical phone number normalization and display formatting
//! - Offline phone intelligence lookups with spam classification
//! - Append-only call history with derived daily/spam/missed views
//! - Idempotent block list with auto-block threshold policy
//! - Settings singleton with partial-merge updates

/// Configuration management
pub mod config;
/// Database operations and connection pooling
pub mod db;
/// Error types
pub mod error;
/// Logging setup and utilities
pub mod logging;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// Phone number normalization and formatting
pub mod phone;
/// Storage trait between service and database
pub mod repository;
/// Database schema definitions
pub mod schema;
/// Bundled offline dataset
pub mod seed;
/// Resolution service orchestration
pub mod service;
/// Input validation and sanitization
pub mod validation;

// Re-export key components for easier access
pub use db::Database;
pub use error::{CallShieldError, Result};
pub use models::{
    BlockedNumberRecord, CallDirection, CallRecord, Classification, LookupResult,
    PhoneNumberRecord, SettingsPatch, UserSettings,
};
pub use phone::{format_phone_number, normalize_phone_number};
pub use repository::OfflineStore;
pub use service::{ChangeEvent, ResolutionService};
