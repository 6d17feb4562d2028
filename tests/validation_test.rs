//! Unit tests for the validation module

use callshield::validation::InputValidator;

#[test]
fn test_phone_input_accepts_common_formats() {
    assert!(InputValidator::validate_phone_input("0821234567").is_ok());
    assert!(InputValidator::validate_phone_input("+27 82 123 4567").is_ok());
    assert!(InputValidator::validate_phone_input("(021) 555-6789").is_ok());
}

#[test]
fn test_phone_input_rejects_unusable_values() {
    assert!(InputValidator::validate_phone_input("").is_err());
    assert!(InputValidator::validate_phone_input("   ").is_err());
    assert!(InputValidator::validate_phone_input("call me maybe").is_err());
    assert!(InputValidator::validate_phone_input(&"1".repeat(33)).is_err());
}

#[test]
fn test_display_name_rules() {
    assert!(InputValidator::validate_display_name("FNB Customer Service").is_ok());
    assert!(InputValidator::validate_display_name("").is_err());
    assert!(InputValidator::validate_display_name(&"x".repeat(101)).is_err());
    assert!(InputValidator::validate_display_name("bad\nname").is_err());
    assert!(InputValidator::validate_display_name("bad\0name").is_err());
}

#[test]
fn test_reason_rules() {
    assert!(InputValidator::validate_reason("").is_ok());
    assert!(InputValidator::validate_reason("SARS impersonation scam").is_ok());
    assert!(InputValidator::validate_reason(&"x".repeat(201)).is_err());
    assert!(InputValidator::validate_reason("tab\tin reason").is_err());
}

#[test]
fn test_threshold_bounds() {
    assert!(InputValidator::validate_threshold(0).is_ok());
    assert!(InputValidator::validate_threshold(80).is_ok());
    assert!(InputValidator::validate_threshold(100).is_ok());
    assert!(InputValidator::validate_threshold(101).is_err());
}

#[test]
fn test_language_codes() {
    for code in ["en", "af", "zu", "xh", "nso"] {
        assert!(InputValidator::validate_language(code).is_ok(), "{code} should be valid");
    }
    assert!(InputValidator::validate_language("fr").is_err());
    assert!(InputValidator::validate_language("").is_err());
}

#[test]
fn test_database_url_rules() {
    assert!(InputValidator::validate_database_url("data/callshield.db").is_ok());
    assert!(InputValidator::validate_database_url("sqlite://tmp/x.db").is_ok());
    assert!(InputValidator::validate_database_url("").is_err());
    assert!(InputValidator::validate_database_url(&"x".repeat(1001)).is_err());
}

#[test]
fn test_sanitize_text_strips_control_characters() {
    assert_eq!(
        InputValidator::sanitize_text("  hello\u{0} world\u{7} "),
        "hello world"
    );
    assert_eq!(InputValidator::sanitize_text("line\nbreaks\tkept"), "line\nbreaks\tkept");
}
