use std::cmp::Ordering;

use chrono::{Local, NaiveDate, NaiveDateTime};

use crate::error::LedgerError;

/// Storage format for extra-expense timestamps: minute precision, no seconds.
pub const STORED_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Human-readable month label, e.g. "March 2025". History keys use this form.
pub fn current_month_label() -> String {
    Local::now().format("%B %Y").to_string()
}

/// Current local time in the stored timestamp format.
pub fn now_datetime() -> String {
    Local::now().naive_local().format(STORED_FORMAT).to_string()
}

/// Normalizes a user-supplied date into "YYYY-MM-DD HH:MM".
/// Accepts the stored format itself, the HTML datetime-local "T" variant,
/// second-precision versions of both, and a bare date (midnight).
pub fn normalize_datetime(s: &str) -> Result<String, LedgerError> {
    let s = s.trim();
    for fmt in [
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.format(STORED_FORMAT).to_string());
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        // Midnight; from_hms_opt(0, 0, 0) cannot fail
        if let Some(dt) = d.and_hms_opt(0, 0, 0) {
            return Ok(dt.format(STORED_FORMAT).to_string());
        }
    }
    Err(LedgerError::Validation(format!(
        "unrecognized date '{}', expected YYYY-MM-DD HH:MM",
        s
    )))
}

/// Re-parses a "Month YYYY" label back into a date, pinned to the 1st.
/// Labels are otherwise opaque strings; this exists only for recency
/// ordering in month listings and is known to be fragile.
pub fn label_date(label: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("1 {}", label), "%d %B %Y").ok()
}

/// Sorts month labels most recent first. Labels that fail to re-parse keep
/// their relative order and sink to the end.
pub fn sort_labels_by_recency(labels: &mut [String]) {
    labels.sort_by(|a, b| match (label_date(a), label_date(b)) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_datetime_stored_format() {
        assert_eq!(
            normalize_datetime("2025-03-14 09:30").unwrap(),
            "2025-03-14 09:30"
        );
    }

    #[test]
    fn test_normalize_datetime_t_separator() {
        assert_eq!(
            normalize_datetime("2025-03-14T09:30").unwrap(),
            "2025-03-14 09:30"
        );
    }

    #[test]
    fn test_normalize_datetime_drops_seconds() {
        assert_eq!(
            normalize_datetime("2025-03-14 09:30:59").unwrap(),
            "2025-03-14 09:30"
        );
    }

    #[test]
    fn test_normalize_datetime_bare_date_is_midnight() {
        assert_eq!(
            normalize_datetime("2025-03-14").unwrap(),
            "2025-03-14 00:00"
        );
    }

    #[test]
    fn test_normalize_datetime_rejects_garbage() {
        assert!(matches!(
            normalize_datetime("yesterday"),
            Err(LedgerError::Validation(_))
        ));
    }

    #[test]
    fn test_label_date() {
        assert_eq!(
            label_date("March 2025"),
            NaiveDate::from_ymd_opt(2025, 3, 1)
        );
        assert_eq!(label_date("not a month"), None);
    }

    #[test]
    fn test_sort_labels_by_recency() {
        let mut labels = vec![
            "January 2025".to_string(),
            "bogus".to_string(),
            "March 2025".to_string(),
            "December 2024".to_string(),
        ];
        sort_labels_by_recency(&mut labels);
        assert_eq!(
            labels,
            ["March 2025", "January 2025", "December 2024", "bogus"]
        );
    }

    #[test]
    fn test_now_datetime_matches_stored_format() {
        let now = now_datetime();
        assert!(NaiveDateTime::parse_from_str(&now, STORED_FORMAT).is_ok());
    }
}
