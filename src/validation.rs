use crate::error::{CallShieldError, Result};
use crate::models::AVAILABLE_LANGUAGES;

fn invalid(message: impl Into<String>) -> CallShieldError {
    CallShieldError::InvalidInput(message.into())
}

/// Validation utilities for user-entered input at the API boundary.
///
/// These guard names, reasons and settings values. Phone numbers
/// themselves are deliberately lenient: the normalizer degrades
/// gracefully on malformed numbers, so only the obviously unusable are
/// rejected here.
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

impl InputValidator {
    /// Validate a phone number typed by the user.
    pub fn validate_phone_input(phone: &str) -> Result<()> {
        if phone.trim().is_empty() {
            return Err(invalid("Phone number cannot be empty"));
        }

        if phone.len() > 32 {
            return Err(invalid("Phone number too long (max 32 characters)"));
        }

        if !phone.chars().any(|c| c.is_ascii_digit()) {
            return Err(invalid("Phone number must contain at least one digit"));
        }

        Ok(())
    }

    /// Validate a display name attached to a block or intelligence record.
    pub fn validate_display_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(invalid("Name cannot be empty"));
        }

        if name.len() > 100 {
            return Err(invalid("Name too long (max 100 characters)"));
        }

        if name.contains('\0') || name.contains('\r') || name.contains('\n') {
            return Err(invalid("Name contains invalid characters"));
        }

        Ok(())
    }

    /// Validate a free-text block reason.
    pub fn validate_reason(reason: &str) -> Result<()> {
        if reason.len() > 200 {
            return Err(invalid("Reason too long (max 200 characters)"));
        }

        if reason.chars().any(char::is_control) {
            return Err(invalid("Reason contains invalid characters"));
        }

        Ok(())
    }

    /// Validate an auto-block threshold (a spam score, so 0-100).
    pub fn validate_threshold(threshold: u8) -> Result<()> {
        if threshold > 100 {
            return Err(invalid("Threshold must be between 0 and 100"));
        }

        Ok(())
    }

    /// Validate an interface language code against the supported set.
    pub fn validate_language(code: &str) -> Result<()> {
        if AVAILABLE_LANGUAGES.iter().any(|l| l.code == code) {
            Ok(())
        } else {
            Err(invalid(format!("Unsupported language code: {code}")))
        }
    }

    /// Validate a database path or URL.
    pub fn validate_database_url(url: &str) -> Result<()> {
        if url.trim().is_empty() {
            return Err(invalid("Database URL cannot be empty"));
        }

        if url.len() > 1000 {
            return Err(invalid("Database URL too long"));
        }

        Ok(())
    }

    /// Sanitize free text before storing it.
    #[must_use]
    pub fn sanitize_text(text: &str) -> String {
        text.chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
            .collect::<String>()
            .trim()
            .to_string()
    }
}
