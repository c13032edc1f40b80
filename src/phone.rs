//! Phone number normalization.
//!
//! Phones are stored as bare digits without country code. The country code
//! is only prefixed when a link is built.

use crate::error::ValidationError;

pub const MIN_DIGITS: usize = 10;

/// Drop every character that is not an ASCII digit.
pub fn normalize(input: &str) -> String {
    input.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Like [`normalize`], but rejects results shorter than [`MIN_DIGITS`].
pub fn normalize_strict(input: &str) -> Result<String, ValidationError> {
    let digits = normalize(input);
    if digits.len() < MIN_DIGITS {
        return Err(ValidationError::PhoneTooShort {
            digits: digits.len(),
            min: MIN_DIGITS,
        });
    }
    Ok(digits)
}

/// Brazilian display format: `(11) 99999-9999`.
///
/// Partial numbers are formatted as far as they go; anything longer than
/// eleven digits is returned as-is.
pub fn format_display(phone: &str) -> String {
    let digits = normalize(phone);
    match digits.len() {
        0..=2 => digits,
        3..=7 => format!("({}) {}", &digits[..2], &digits[2..]),
        8..=11 => format!("({}) {}-{}", &digits[..2], &digits[2..7], &digits[7..]),
        _ => digits,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_everything_but_digits() {
        assert_eq!(normalize("(11) 99999-8888"), "11999998888");
        assert_eq!(normalize("+55 11 9.9999 8888 ext"), "5511999998888");
        assert_eq!(normalize("abc"), "");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn output_is_digits_only() {
        for input in ["１２３ 456", "٣٤٥ 12", "tel: 0800-123", "\t9\n8\r7"] {
            let out = normalize(input);
            assert!(out.chars().all(|c| c.is_ascii_digit()), "{input:?} -> {out:?}");
            let expected: String = input.chars().filter(char::is_ascii_digit).collect();
            assert_eq!(out, expected);
        }
    }

    #[test]
    fn strict_accepts_ten_digits() {
        assert_eq!(normalize_strict("11 9999-8888").unwrap(), "1199998888");
    }

    #[test]
    fn strict_rejects_short_numbers() {
        let err = normalize_strict("(11) 9999-888").unwrap_err();
        assert_eq!(err, ValidationError::PhoneTooShort { digits: 9, min: 10 });
        assert!(normalize_strict("").is_err());
    }

    #[test]
    fn display_formatting() {
        assert_eq!(format_display("11"), "11");
        assert_eq!(format_display("11999"), "(11) 999");
        assert_eq!(format_display("1199998888"), "(11) 99998-888");
        assert_eq!(format_display("11999998888"), "(11) 99999-8888");
        assert_eq!(format_display("5511999998888"), "5511999998888");
    }
}
