//! Phone number normalization and display formatting.
//!
//! Every lookup, block and history entry is keyed by the canonical local
//! form produced here, so the same subscriber line maps to one record no
//! matter how the number was typed or reported by the platform call log
//! (`+27 82 123 4567`, `27821234567`, `0821234567`, `821234567`).

/// Country calling code whose prefix collapses to a leading `0`.
const COUNTRY_CODE: &str = "27";

/// Length of a canonical local subscriber number.
const LOCAL_NUMBER_LEN: usize = 10;

/// Normalize a phone number to its canonical local form.
///
/// Strips every non-digit character, rewrites a leading `27` country code
/// to `0`, and restores a missing leading `0` on bare 9-digit subscriber
/// numbers. Anything that still does not look like a local number passes
/// through unchanged; malformed input is never an error.
#[must_use]
pub fn normalize_phone_number(phone: &str) -> String {
    let mut digits: String = phone.chars().filter(char::is_ascii_digit).collect();

    if let Some(rest) = digits.strip_prefix(COUNTRY_CODE) {
        digits = format!("0{rest}");
    }

    if digits.len() == LOCAL_NUMBER_LEN - 1 && !digits.starts_with('0') {
        digits.insert(0, '0');
    }

    digits
}

/// Format a phone number for display as `0XX XXX XXXX`.
///
/// Falls back to the input string unmodified when the normalized form is
/// not exactly ten digits. Formatting failure is silent, never an error.
#[must_use]
pub fn format_phone_number(phone: &str) -> String {
    let normalized = normalize_phone_number(phone);

    if normalized.len() == LOCAL_NUMBER_LEN {
        format!("{} {} {}", &normalized[..3], &normalized[3..6], &normalized[6..])
    } else {
        phone.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn strips_plus_country_code() {
        assert_eq!(normalize_phone_number("+27821234567"), "0821234567");
    }

    #[test]
    fn strips_bare_country_code() {
        assert_eq!(normalize_phone_number("27821234567"), "0821234567");
    }

    #[test]
    fn strips_punctuation_and_spaces() {
        assert_eq!(normalize_phone_number("+27 (82) 123-4567"), "0821234567");
        assert_eq!(normalize_phone_number("27 82 123 4567"), "0821234567");
    }

    #[test]
    fn restores_missing_leading_zero() {
        assert_eq!(normalize_phone_number("821234567"), "0821234567");
    }

    #[test]
    fn canonical_input_unchanged() {
        assert_eq!(normalize_phone_number("0821234567"), "0821234567");
    }

    #[test]
    fn short_numbers_pass_through() {
        assert_eq!(normalize_phone_number("10111"), "10111");
        assert_eq!(normalize_phone_number(""), "");
    }

    #[test]
    fn formats_ten_digit_numbers() {
        assert_eq!(format_phone_number("0821234567"), "082 123 4567");
        assert_eq!(format_phone_number("+27 82 123 4567"), "082 123 4567");
        assert_eq!(format_phone_number("0112345678"), "011 234 5678");
    }

    #[test]
    fn format_leaves_malformed_input_alone() {
        assert_eq!(format_phone_number("10111"), "10111");
        assert_eq!(format_phone_number("not a number"), "not a number");
    }

    proptest! {
        // Any 27-prefixed number with nine subscriber digits collapses to
        // the same nine digits behind a leading zero.
        #[test]
        fn country_code_collapses(subscriber in "[1-9][0-9]{8}") {
            let expected = format!("0{subscriber}");
            prop_assert_eq!(normalize_phone_number(&format!("27{subscriber}")), expected.clone());
            prop_assert_eq!(normalize_phone_number(&format!("+27{subscriber}")), expected);
        }

        #[test]
        fn normalize_is_idempotent_on_canonical_input(subscriber in "0[0-9]{9}") {
            let once = normalize_phone_number(&subscriber);
            prop_assert_eq!(normalize_phone_number(&once), once.clone());
        }

        #[test]
        fn format_groups_or_passes_through(input in "\\+?[0-9 ()-]{0,14}") {
            let normalized = normalize_phone_number(&input);
            let formatted = format_phone_number(&input);
            if normalized.len() == 10 {
                prop_assert_eq!(formatted.replace(' ', ""), normalized);
            } else {
                prop_assert_eq!(formatted, input);
            }
        }
    }
}
