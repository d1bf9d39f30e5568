use chrono::{Datelike, NaiveDate};

// ── Date key helpers ─────────────────────────────────────────────
//
// "YYYY-MM-DD" is the primary key of the availability collection. Every
// component that reads or writes it goes through these two functions so the
// format can never drift.

/// Render a date as its availability-collection key.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Build a date key from calendar-grid parts. `month_index` is 0-based (grid
/// convention), rendered 1-based; returns `None` for out-of-range parts.
pub fn date_key_from_parts(year: i32, month_index: u32, day: u32) -> Option<String> {
    NaiveDate::from_ymd_opt(year, month_index + 1, day).map(date_key)
}

pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, "%Y-%m-%d").ok()
}

// ── Span enumeration ─────────────────────────────────────────────

/// All night-dates of a stay: every `d` with `check_in <= d < check_out`.
///
/// The checkout date is the guest's departure day and is deliberately never
/// included — it stays bookable for a same-day turnover. Returns an empty
/// vec for an inverted or zero-length range.
pub fn enumerate_nights(check_in: NaiveDate, check_out: NaiveDate) -> Vec<NaiveDate> {
    let mut nights = Vec::new();
    let mut d = check_in;
    while d < check_out {
        nights.push(d);
        d = d.succ_opt().expect("date range within chrono bounds");
    }
    nights
}

/// Number of nights between check-in and check-out, or `None` when the range
/// is inverted or empty (a booking must span at least one night).
pub fn duration_nights(check_in: NaiveDate, check_out: NaiveDate) -> Option<i64> {
    let nights = (check_out - check_in).num_days();
    if nights > 0 { Some(nights) } else { None }
}

/// Every date of a calendar month, for the month-grid views. `month` is
/// 1-based here (chrono convention); empty for an invalid month.
pub fn month_days(year: i32, month: u32) -> Vec<NaiveDate> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };
    let mut days = Vec::with_capacity(31);
    let mut d = first;
    while d.month() == month {
        days.push(d);
        d = d.succ_opt().expect("date range within chrono bounds");
    }
    days
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn date_key_is_zero_padded() {
        assert_eq!(date_key(d("2025-01-05")), "2025-01-05");
        assert_eq!(date_key(d("2025-12-31")), "2025-12-31");
    }

    #[test]
    fn key_from_parts_uses_zero_based_month() {
        // month_index 9 = October
        assert_eq!(
            date_key_from_parts(2025, 9, 30),
            Some("2025-10-30".to_string())
        );
        assert_eq!(date_key_from_parts(2025, 0, 1), Some("2025-01-01".to_string()));
        assert_eq!(date_key_from_parts(2025, 12, 1), None);
        assert_eq!(date_key_from_parts(2025, 1, 30), None); // Feb 30
    }

    #[test]
    fn parse_roundtrips_key() {
        let date = d("2025-10-30");
        assert_eq!(parse_date_key(&date_key(date)), Some(date));
        assert_eq!(parse_date_key("30/10/2025"), None);
    }

    #[test]
    fn nights_exclude_checkout() {
        let nights = enumerate_nights(d("2025-11-01"), d("2025-11-03"));
        assert_eq!(nights, vec![d("2025-11-01"), d("2025-11-02")]);
        assert!(!nights.contains(&d("2025-11-03")));
    }

    #[test]
    fn nights_length_matches_duration() {
        let pairs = [
            ("2025-11-01", "2025-11-02"),
            ("2025-11-01", "2025-11-08"),
            ("2025-12-28", "2026-01-03"), // crosses a year boundary
        ];
        for (ci, co) in pairs {
            let nights = enumerate_nights(d(ci), d(co));
            assert_eq!(nights.len() as i64, duration_nights(d(ci), d(co)).unwrap());
        }
    }

    #[test]
    fn zero_or_inverted_range_is_invalid() {
        assert_eq!(duration_nights(d("2025-11-01"), d("2025-11-01")), None);
        assert_eq!(duration_nights(d("2025-11-02"), d("2025-11-01")), None);
        assert!(enumerate_nights(d("2025-11-02"), d("2025-11-01")).is_empty());
    }

    #[test]
    fn month_days_handles_leap_years() {
        assert_eq!(month_days(2024, 2).len(), 29);
        assert_eq!(month_days(2025, 2).len(), 28);
        assert_eq!(month_days(2025, 12).len(), 31);
        assert!(month_days(2025, 13).is_empty());
    }
}
