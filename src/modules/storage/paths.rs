use chrono::{DateTime, Datelike, Utc};
use uuid::Uuid;

use crate::shared::constants::{
    FALLBACK_FIELD_NAME, FALLBACK_FILENAME, FALLBACK_FORM_TYPE, FALLBACK_SUBMISSION_ID,
    PATH_TOKEN_LEN,
};

/// Derive the storage path for one uploaded file:
/// `forms/{form_type}/{year}/{month}/{submission_id}/{field}_{token}_{filename}`.
///
/// Every caller-influenced segment is sanitized, so no input can produce a
/// traversal segment, an absolute path or a cross-field collision. The short
/// random token keeps two uploads with the same filename apart. This is the
/// layout contract shared by both storage backends; the actual write happens
/// elsewhere.
pub fn derive_path(
    form_type: &str,
    submission_id: &str,
    field_name: &str,
    original_filename: &str,
    now: DateTime<Utc>,
) -> String {
    let form_type = sanitize_segment(form_type, FALLBACK_FORM_TYPE);
    let submission = sanitize_segment(submission_id, FALLBACK_SUBMISSION_ID);
    let field = sanitize_segment(field_name, FALLBACK_FIELD_NAME);
    let filename = sanitize_segment(original_filename, FALLBACK_FILENAME);
    let token = short_token();

    format!(
        "forms/{form_type}/{year:04}/{month:02}/{submission}/{field}_{token}_{filename}",
        year = now.year(),
        month = now.month(),
    )
}

/// Keep alphanumerics (any script) plus `-` and `_`; collapse runs of `.` and
/// trim them from the ends so segments can never contain `..` or hide behind
/// a leading dot. Empty results become `fallback`.
fn sanitize_segment(raw: &str, fallback: &str) -> String {
    let mut kept = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_alphanumeric() || matches!(c, '-' | '_') {
            kept.push(c);
        } else if c == '.' && !kept.ends_with('.') {
            kept.push(c);
        }
    }

    let trimmed = kept.trim_matches('.');
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

fn short_token() -> String {
    let id = Uuid::new_v4().to_string();
    id[..PATH_TOKEN_LEN].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use regex::Regex;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 25, 12, 0, 0).unwrap()
    }

    #[test]
    fn derives_the_documented_layout() {
        let path = derive_path(
            "b2b-feedback",
            "7a1d2c3e",
            "attachments",
            "manual.pdf",
            fixed_now(),
        );
        let shape =
            Regex::new(r"^forms/b2b-feedback/2025/08/7a1d2c3e/attachments_[0-9a-f]{8}_manual\.pdf$")
                .unwrap();
        assert!(shape.is_match(&path), "unexpected path: {path}");
    }

    #[test]
    fn hostile_segments_are_stripped() {
        let path = derive_path(
            "b2b support!",
            "sub/123",
            "attachments",
            "../secret.pdf",
            fixed_now(),
        );
        let shape =
            Regex::new(r"^forms/b2bsupport/2025/08/sub123/attachments_[0-9a-f]{8}_secret\.pdf$")
                .unwrap();
        assert!(shape.is_match(&path), "unexpected path: {path}");
        assert!(!path.contains(".."));
    }

    #[test]
    fn no_input_produces_traversal_or_absolute_paths() {
        let hostile = [
            "../../etc/passwd",
            "..",
            "a/../../b",
            "....//....//",
            "/absolute/start",
            "\0\0",
            "   ",
            "",
        ];
        for s in hostile {
            let path = derive_path(s, s, s, s, fixed_now());
            assert!(!path.starts_with('/'), "absolute path from {s:?}: {path}");
            assert!(!path.contains(".."), "traversal from {s:?}: {path}");
            assert!(
                path.split('/').all(|segment| !segment.is_empty()),
                "empty segment from {s:?}: {path}"
            );
        }
    }

    #[test]
    fn empty_segments_fall_back_to_fixed_tokens() {
        let path = derive_path("", "", "", "", fixed_now());
        let shape =
            Regex::new(r"^forms/general/2025/08/unknown/file_[0-9a-f]{8}_unknown_file$").unwrap();
        assert!(shape.is_match(&path), "unexpected path: {path}");
    }

    #[test]
    fn same_filename_never_collides() {
        let a = derive_path("survey", "sub1", "doc", "report.pdf", fixed_now());
        let b = derive_path("survey", "sub1", "doc", "report.pdf", fixed_now());
        assert_ne!(a, b);
    }

    #[test]
    fn unicode_filenames_survive_sanitization() {
        let path = derive_path("survey", "sub1", "doc", "résumé.pdf", fixed_now());
        assert!(path.ends_with("_résumé.pdf"), "unexpected path: {path}");
    }

    #[test]
    fn month_is_zero_padded() {
        let january = Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap();
        let path = derive_path("survey", "sub1", "doc", "a.txt", january);
        assert!(path.contains("/2026/01/"), "unexpected path: {path}");
    }
}
