use chrono::NaiveDate;
use derive_more::Display;

use crate::model::leave::DurationUnit;

pub const MIN_REASON_LEN: usize = 10;
pub const MIN_REJECTION_REASON_LEN: usize = 5;
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Display, PartialEq, Eq)]
pub enum DateRangeError {
    #[display(fmt = "End date must be after start date")]
    EndNotAfterStart,
    #[display(fmt = "Cannot apply for leave in the past")]
    StartInPast,
}

#[derive(Debug, Display, PartialEq, Eq)]
pub enum ReasonError {
    #[display(fmt = "Reason must be at least 10 characters")]
    ReasonTooShort,
    #[display(fmt = "Rejection reason must be at least 5 characters")]
    RejectionReasonTooShort,
}

/// Day-granularity range check. `today` is injected so callers (and tests)
/// control the clock.
pub fn validate_date_range(
    start: NaiveDate,
    end: NaiveDate,
    today: NaiveDate,
) -> Result<(), DateRangeError> {
    if start >= end {
        return Err(DateRangeError::EndNotAfterStart);
    }
    if start < today {
        return Err(DateRangeError::StartInPast);
    }
    Ok(())
}

/// Duration is always derived server-side, never client-supplied.
///
/// The two units intentionally disagree in rounding philosophy: days are
/// counted inclusive of both endpoints, hours are the strict elapsed span
/// (whole days times 24 plus the hour remainder, which is zero at date
/// granularity).
pub fn compute_duration(start: NaiveDate, end: NaiveDate, unit: DurationUnit) -> f64 {
    let span = end.signed_duration_since(start);
    match unit {
        DurationUnit::Days => (span.num_days() + 1) as f64,
        DurationUnit::Hours => (span.num_days() * 24 + span.num_hours() % 24) as f64,
    }
}

pub fn validate_reason(text: &str) -> Result<(), ReasonError> {
    if text.trim().chars().count() < MIN_REASON_LEN {
        return Err(ReasonError::ReasonTooShort);
    }
    Ok(())
}

pub fn validate_rejection_reason(text: &str) -> Result<(), ReasonError> {
    if text.trim().chars().count() < MIN_REJECTION_REASON_LEN {
        return Err(ReasonError::RejectionReasonTooShort);
    }
    Ok(())
}

/// Trim + HTML-entity escape for every free-text input. Applied before
/// persistence and therefore before any output path.
pub fn sanitize_text(input: &str) -> String {
    let trimmed = input.trim();
    let mut out = String::with_capacity(trimmed.len());
    for c in trimmed.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// Structural email check, deliberately permissive beyond the basics.
pub fn validate_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() {
        return false;
    }
    if email.chars().any(char::is_whitespace) || domain.contains('@') {
        return false;
    }
    if domain.starts_with('.') || domain.ends_with('.') || domain.contains("..") {
        return false;
    }
    domain.contains('.')
}

/// Collects "<Field> is required" for every absent or blank field into one
/// message. This is the only place field errors are aggregated; everything
/// else fails fast on the first error.
pub fn require_fields(fields: &[(&str, Option<&str>)]) -> Result<(), String> {
    let mut errors = Vec::new();
    for (name, value) in fields {
        let missing = value.map_or(true, |v| v.trim().is_empty());
        if missing {
            errors.push(format!("{} is required", ucfirst(name)));
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.join(", "))
    }
}

fn ucfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[rstest]
    #[case("2024-06-10", "2024-06-10")]
    #[case("2024-06-11", "2024-06-10")]
    fn end_must_be_after_start(#[case] start: &str, #[case] end: &str) {
        assert_eq!(
            validate_date_range(d(start), d(end), d("2024-06-01")),
            Err(DateRangeError::EndNotAfterStart)
        );
    }

    #[test]
    fn start_in_past_rejected_regardless_of_end() {
        assert_eq!(
            validate_date_range(d("2024-05-31"), d("2024-12-31"), d("2024-06-01")),
            Err(DateRangeError::StartInPast)
        );
    }

    #[test]
    fn start_today_is_allowed() {
        assert_eq!(
            validate_date_range(d("2024-06-01"), d("2024-06-02"), d("2024-06-01")),
            Ok(())
        );
    }

    #[test]
    fn day_duration_is_endpoint_inclusive() {
        assert_eq!(
            compute_duration(d("2024-01-01"), d("2024-01-03"), DurationUnit::Days),
            3.0
        );
        assert_eq!(
            compute_duration(d("2024-01-01"), d("2024-01-02"), DurationUnit::Days),
            2.0
        );
    }

    #[test]
    fn hour_duration_is_strict_elapsed_time() {
        assert_eq!(
            compute_duration(d("2024-01-01"), d("2024-01-02"), DurationUnit::Hours),
            24.0
        );
        assert_eq!(
            compute_duration(d("2024-01-01"), d("2024-01-04"), DurationUnit::Hours),
            72.0
        );
    }

    #[rstest]
    #[case("too short", Err(ReasonError::ReasonTooShort))] // 9 chars
    #[case("long enough reason", Ok(()))]
    #[case("  padded!  ", Err(ReasonError::ReasonTooShort))] // trims to 7
    #[case("exactly 10", Ok(()))]
    fn reason_threshold(#[case] text: &str, #[case] expected: Result<(), ReasonError>) {
        assert_eq!(validate_reason(text), expected);
    }

    #[rstest]
    #[case("nope", Err(ReasonError::RejectionReasonTooShort))] // 4 chars
    #[case("valid", Ok(()))]
    #[case("  no  ", Err(ReasonError::RejectionReasonTooShort))]
    fn rejection_reason_threshold(#[case] text: &str, #[case] expected: Result<(), ReasonError>) {
        assert_eq!(validate_rejection_reason(text), expected);
    }

    #[test]
    fn sanitize_escapes_html_metacharacters() {
        assert_eq!(
            sanitize_text("  <script>alert('x & \"y\"')</script>  "),
            "&lt;script&gt;alert(&#039;x &amp; &quot;y&quot;&#039;)&lt;/script&gt;"
        );
    }

    #[test]
    fn sanitize_leaves_plain_text_alone() {
        assert_eq!(sanitize_text(" family emergency "), "family emergency");
    }

    #[rstest]
    #[case("jane@company.com", true)]
    #[case("j.doe+leave@sub.company.co", true)]
    #[case("not-an-email", false)]
    #[case("@company.com", false)]
    #[case("jane@", false)]
    #[case("jane@company", false)]
    #[case("jane doe@company.com", false)]
    #[case("jane@comp..any.com", false)]
    fn email_shapes(#[case] email: &str, #[case] ok: bool) {
        assert_eq!(validate_email(email), ok);
    }

    #[test]
    fn required_fields_aggregate_into_one_message() {
        let result = require_fields(&[
            ("leave_type", None),
            ("start_date", Some("2024-01-01")),
            ("reason", Some("   ")),
        ]);
        assert_eq!(
            result,
            Err("Leave_type is required, Reason is required".to_string())
        );
    }

    #[test]
    fn required_fields_pass_when_all_present() {
        assert_eq!(
            require_fields(&[("email", Some("a@b.co")), ("password", Some("secret"))]),
            Ok(())
        );
    }

    #[test]
    fn parse_date_accepts_iso_and_rejects_noise() {
        assert_eq!(parse_date(" 2024-02-29 "), Some(d("2024-02-29")));
        assert_eq!(parse_date("2024-02-30"), None);
        assert_eq!(parse_date("02/29/2024"), None);
    }
}
