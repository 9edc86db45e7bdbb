//! Business-day calendar arithmetic
//!
//! Day counts feed the 252-business-day convention used to accrue floating
//! rates, so the counting rule must match the spreadsheet reference:
//! `NETWORKDAYS(start, end) - 1`. That is the number of business days in the
//! half-open interval `(start, end]` whenever `start` itself is a business day.

use chrono::{Datelike, Months, NaiveDate, Weekday};
use std::collections::HashSet;

use crate::error::{FidcError, Result};

/// Business days in a year under the 252 convention
pub const BUSINESS_DAYS_PER_YEAR: f64 = 252.0;

/// Business days in a month under the 252 convention (252 / 12)
pub const BUSINESS_DAYS_PER_MONTH: f64 = 21.0;

/// Set of non-working dates. Weekends are always non-working.
#[derive(Debug, Clone, Default)]
pub struct HolidayCalendar {
    holidays: HashSet<NaiveDate>,
}

impl HolidayCalendar {
    /// Calendar with weekends only
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_dates<I: IntoIterator<Item = NaiveDate>>(dates: I) -> Self {
        Self {
            holidays: dates.into_iter().collect(),
        }
    }

    pub fn add_holiday(&mut self, date: NaiveDate) {
        self.holidays.insert(date);
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }

    pub fn is_business_day(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.is_holiday(date)
    }

    pub fn len(&self) -> usize {
        self.holidays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holidays.is_empty()
    }
}

impl FromIterator<NaiveDate> for HolidayCalendar {
    fn from_iter<I: IntoIterator<Item = NaiveDate>>(iter: I) -> Self {
        Self::from_dates(iter)
    }
}

fn ordered(start: NaiveDate, end: NaiveDate) -> (NaiveDate, NaiveDate) {
    if start > end {
        (end, start)
    } else {
        (start, end)
    }
}

/// Excel `NETWORKDAYS`: business days between two dates, both endpoints included.
pub fn networkdays(start: NaiveDate, end: NaiveDate, calendar: &HolidayCalendar) -> u32 {
    let (start, end) = ordered(start, end);
    start
        .iter_days()
        .take_while(|day| *day <= end)
        .filter(|day| calendar.is_business_day(*day))
        .count() as u32
}

/// Business days in `(start, end]`, direction independent.
///
/// Equal to `networkdays(start, end) - 1` when `start` is a business day, and
/// never negative when it is not.
pub fn business_days(start: NaiveDate, end: NaiveDate, calendar: &HolidayCalendar) -> u32 {
    let (start, end) = ordered(start, end);
    start
        .iter_days()
        .skip(1)
        .take_while(|day| *day <= end)
        .filter(|day| calendar.is_business_day(*day))
        .count() as u32
}

/// Actual calendar days from `start` to `end` (negative when `end` is earlier)
pub fn calendar_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

/// Add calendar months, clamping to the last day of the target month.
/// No business-day adjustment is applied.
pub fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| FidcError::DateOutOfRange(format!("{} + {} months", date, months)))
}

/// Funding date followed by `periods` payment dates spaced `frequency_months` apart.
///
/// Every date is offset from `start` directly (not chained), so month-end
/// clamping in one period never drifts into the next.
pub fn payment_schedule(start: NaiveDate, periods: u32, frequency_months: u32) -> Result<Vec<NaiveDate>> {
    if periods == 0 {
        return Ok(Vec::new());
    }
    (0..=periods)
        .map(|idx| add_months(start, frequency_months.saturating_mul(idx)))
        .collect()
}

/// Reject a payment schedule whose dates do not strictly increase
pub fn validate_schedule(dates: &[NaiveDate]) -> Result<()> {
    match dates.windows(2).find(|w| w[1] <= w[0]) {
        Some(w) => Err(FidcError::invalid_assumption(
            "schedule",
            format!("dates must strictly increase, found {} then {}", w[0], w[1]),
        )),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_same_day_is_zero() {
        let cal = HolidayCalendar::new();
        let monday = ymd(2024, 1, 8);
        assert_eq!(business_days(monday, monday, &cal), 0);

        let saturday = ymd(2024, 1, 6);
        assert_eq!(business_days(saturday, saturday, &cal), 0);
    }

    #[test]
    fn test_friday_to_monday() {
        let cal = HolidayCalendar::new();
        let friday = ymd(2024, 1, 5);
        let monday = ymd(2024, 1, 8);
        assert_eq!(business_days(friday, monday, &cal), 1);
        assert_eq!(networkdays(friday, monday, &cal), 2);
    }

    #[test]
    fn test_direction_independent() {
        let cal = HolidayCalendar::new();
        let a = ymd(2024, 1, 2);
        let b = ymd(2024, 3, 15);
        assert_eq!(business_days(a, b, &cal), business_days(b, a, &cal));
        assert_eq!(networkdays(a, b, &cal), networkdays(b, a, &cal));
    }

    #[test]
    fn test_matches_networkdays_minus_one_from_business_day() {
        let cal = HolidayCalendar::from_dates([ymd(2024, 2, 12), ymd(2024, 2, 13)]);
        let start = ymd(2024, 1, 2);
        for end in [ymd(2024, 1, 31), ymd(2024, 2, 14), ymd(2024, 6, 28)] {
            assert_eq!(business_days(start, end, &cal), networkdays(start, end, &cal) - 1);
        }
    }

    #[test]
    fn test_holidays_excluded() {
        let carnival = [ymd(2024, 2, 12), ymd(2024, 2, 13)];
        let cal = HolidayCalendar::from_dates(carnival);
        let plain = HolidayCalendar::new();

        let start = ymd(2024, 2, 9);
        let end = ymd(2024, 2, 16);
        assert_eq!(business_days(start, end, &plain), 5);
        assert_eq!(business_days(start, end, &cal), 3);

        // Weekend holidays do not double count
        let weekend = HolidayCalendar::from_dates([ymd(2024, 2, 10)]);
        assert_eq!(business_days(start, end, &weekend), 5);
    }

    #[test]
    fn test_add_months_clamps_month_end() {
        assert_eq!(add_months(ymd(2024, 1, 31), 1).unwrap(), ymd(2024, 2, 29));
        assert_eq!(add_months(ymd(2023, 1, 31), 1).unwrap(), ymd(2023, 2, 28));
        assert_eq!(add_months(ymd(2024, 1, 15), 12).unwrap(), ymd(2025, 1, 15));
    }

    #[test]
    fn test_payment_schedule() {
        let schedule = payment_schedule(ymd(2024, 1, 31), 3, 1).unwrap();
        assert_eq!(
            schedule,
            vec![ymd(2024, 1, 31), ymd(2024, 2, 29), ymd(2024, 3, 31), ymd(2024, 4, 30)]
        );

        assert!(payment_schedule(ymd(2024, 1, 31), 0, 1).unwrap().is_empty());
    }

    #[test]
    fn test_calendar_days() {
        assert_eq!(calendar_days(ymd(2024, 1, 1), ymd(2024, 12, 31)), 365);
        assert_eq!(calendar_days(ymd(2024, 2, 1), ymd(2024, 1, 1)), -31);
    }
}
