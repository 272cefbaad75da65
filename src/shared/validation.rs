use chrono::{DateTime, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for the `email` string format.
    /// - Valid: "a@b.com", "user.name+tag@example.co.id"
    /// - Invalid: "user@", "@example.com", "no-at-sign"
    pub static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();

    /// Regex for the `url` string format (http/https only).
    pub static ref URL_REGEX: Regex =
        Regex::new(r"^https?://[^\s/$.?#][^\s]*$").unwrap();

    /// Regex for the `phone` string format.
    /// Optional leading +, then 7-20 digits with common separators.
    /// - Valid: "+62 812-3456-7890", "(031) 555 0199", "08123456789"
    /// - Invalid: "abc", "+", "12"
    pub static ref PHONE_REGEX: Regex =
        Regex::new(r"^\+?[0-9(][0-9 \-()]{5,18}[0-9)]$").unwrap();

    /// Shape check for the `date` format; calendar validity is checked with chrono.
    pub static ref DATE_REGEX: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_REGEX.is_match(value)
}

pub fn is_valid_url(value: &str) -> bool {
    URL_REGEX.is_match(value)
}

pub fn is_valid_phone(value: &str) -> bool {
    PHONE_REGEX.is_match(value)
}

/// ISO calendar date, e.g. "2025-06-01". Rejects well-shaped impossible
/// dates like "2025-02-30".
pub fn is_valid_date(value: &str) -> bool {
    DATE_REGEX.is_match(value) && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

/// RFC 3339 timestamp, e.g. "2025-06-01T08:30:00Z".
pub fn is_valid_datetime(value: &str) -> bool {
    DateTime::parse_from_rfc3339(value).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::faker::internet::en::SafeEmail;
    use fake::Fake;

    #[test]
    fn test_email_valid() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("user.name+tag@example.co.id"));
        assert!(is_valid_email("UPPER@CASE.ORG"));
    }

    #[test]
    fn test_email_invalid() {
        assert!(!is_valid_email("user@")); // missing domain
        assert!(!is_valid_email("@example.com")); // missing local part
        assert!(!is_valid_email("no-at-sign")); // not an address
        assert!(!is_valid_email("user@host")); // no TLD
        assert!(!is_valid_email("")); // empty
    }

    #[test]
    fn test_email_accepts_generated_addresses() {
        for _ in 0..20 {
            let email: String = SafeEmail().fake();
            assert!(is_valid_email(&email), "rejected generated email {email}");
        }
    }

    #[test]
    fn test_url_valid() {
        assert!(is_valid_url("http://example.com"));
        assert!(is_valid_url("https://example.com/path?q=1"));
    }

    #[test]
    fn test_url_invalid() {
        assert!(!is_valid_url("ftp://example.com")); // wrong scheme
        assert!(!is_valid_url("example.com")); // no scheme
        assert!(!is_valid_url("https://exa mple.com")); // whitespace
        assert!(!is_valid_url(""));
    }

    #[test]
    fn test_phone_valid() {
        assert!(is_valid_phone("+62 812-3456-7890"));
        assert!(is_valid_phone("(031) 555 0199"));
        assert!(is_valid_phone("08123456789"));
    }

    #[test]
    fn test_phone_invalid() {
        assert!(!is_valid_phone("abc"));
        assert!(!is_valid_phone("+"));
        assert!(!is_valid_phone("12")); // too short
        assert!(!is_valid_phone(""));
    }

    #[test]
    fn test_date() {
        assert!(is_valid_date("2025-06-01"));
        assert!(!is_valid_date("2025-02-30")); // impossible day
        assert!(!is_valid_date("01-06-2025")); // wrong order
        assert!(!is_valid_date("2025/06/01"));
    }

    #[test]
    fn test_datetime() {
        assert!(is_valid_datetime("2025-06-01T08:30:00Z"));
        assert!(is_valid_datetime("2025-06-01T08:30:00+07:00"));
        assert!(!is_valid_datetime("2025-06-01 08:30:00"));
        assert!(!is_valid_datetime("2025-06-01"));
    }
}
