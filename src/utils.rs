use crate::error::{EngineError, Result};
use chrono::{Datelike, Days, NaiveDate};

/// Number of days treated as one month by the windowed calculations.
pub const DAYS_PER_MONTH: u64 = 30;

/// Parses a `YYYY-MM-DD` transaction date. Anything else is rejected.
pub fn parse_transaction_date(raw: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| format!("invalid date '{}': {} (expected YYYY-MM-DD)", raw, e))
}

/// Parses a month string in the format "YYYY-MM".
/// Returns (year, month)
pub fn parse_month(period: &str) -> Result<(i32, u32)> {
    let start_str = format!("{}-01", period.trim());
    let start = NaiveDate::parse_from_str(&start_str, "%Y-%m-%d").map_err(|_| {
        EngineError::DateError(format!(
            "Invalid month format: {}. Expected YYYY-MM",
            period
        ))
    })?;
    Ok((start.year(), start.month()))
}

/// First and last day of a calendar month.
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate)> {
    let invalid = || EngineError::DateError(format!("Invalid month {:04}-{:02}", year, month));

    let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let end = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.checked_sub_days(Days::new(1)))
        .ok_or_else(invalid)?;

    Ok((start, end))
}

/// `today - days`, saturating at the earliest representable date.
pub fn cutoff_date(today: NaiveDate, days: u64) -> NaiveDate {
    today.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN)
}

/// Start of a trailing window of `months` fixed 30-day months.
pub fn window_start(today: NaiveDate, months: u32) -> NaiveDate {
    cutoff_date(today, u64::from(months) * DAYS_PER_MONTH)
}

/// Calendar month (1..=12) reached `months_ahead` months after `current_month`.
/// A `current_month` of 0 is read as December of the previous year.
pub fn target_month(current_month: u32, months_ahead: u32) -> u32 {
    (current_month % 12 + 11 + months_ahead % 12) % 12 + 1
}

/// Sortable `(year, month)` key for a date.
pub fn month_key(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_transaction_date() {
        assert_eq!(
            parse_transaction_date("2024-01-03").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 3).unwrap()
        );
        assert!(parse_transaction_date("2024-13-01").is_err());
        assert!(parse_transaction_date("03/01/2024").is_err());
        assert!(parse_transaction_date("").is_err());
    }

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month("2023-02").unwrap(), (2023, 2));
        assert!(parse_month("2023-2x").is_err());
        assert!(parse_month("2023").is_err());
    }

    #[test]
    fn test_month_bounds() {
        let (start, end) = month_bounds(2024, 2).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        let (_, end) = month_bounds(2023, 12).unwrap();
        assert_eq!(end, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());

        assert!(month_bounds(2023, 13).is_err());
    }

    #[test]
    fn test_window_start_uses_thirty_day_months() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        assert_eq!(
            window_start(today, 3),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
    }

    #[test]
    fn test_target_month_wraps() {
        assert_eq!(target_month(1, 1), 2);
        assert_eq!(target_month(11, 1), 12);
        assert_eq!(target_month(12, 1), 1);
        assert_eq!(target_month(10, 6), 4);
        assert_eq!(target_month(5, 12), 5);
    }

    #[test]
    fn test_target_month_zero_does_not_underflow() {
        assert_eq!(target_month(0, 1), 1);
        assert_eq!(target_month(0, 12), 12);
        assert_eq!(target_month(12, u32::MAX), target_month(12, u32::MAX % 12));
    }
}
