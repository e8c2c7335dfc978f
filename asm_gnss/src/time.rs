//! UTC date and time carried by a fix, with the calendar checks used by the
//! sentence validators.

use std::fmt;

/// Days per month in a common year, January first.
const DAYS_IN: [u8; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Gregorian leap year.
pub const fn is_leap_year(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Days in `month` (1..=12) of `year`; 0 for an invalid month.
pub const fn days_in_month(year: u16, month: u8) -> u8 {
    if month < 1 || month > 12 {
        return 0;
    }
    if month == 2 && is_leap_year(year) {
        29
    } else {
        DAYS_IN[(month - 1) as usize]
    }
}

/// Calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Date {
    /// Full year, e.g. 2024.
    pub year: u16,
    /// 1..=12.
    pub month: u8,
    /// 1..=days in month.
    pub day: u8,
}

impl Date {
    /// Build a date without checking it.
    pub const fn new(year: u16, month: u8, day: u8) -> Self {
        Self { year, month, day }
    }

    /// Month in range and day within that month.
    pub const fn is_valid(&self) -> bool {
        let days = days_in_month(self.year, self.month);
        days > 0 && self.day >= 1 && self.day <= days
    }

    /// Year as sent in `ddmmyy` fields.
    pub const fn short_year(&self) -> u8 {
        (self.year % 100) as u8
    }

    /// Expand a two-digit year.
    pub const fn century_year(yy: u8) -> u16 {
        2000 + yy as u16
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Time {
    /// 0..=23.
    pub hours: u8,
    /// 0..=59.
    pub minutes: u8,
    /// 0..=59.
    pub seconds: u8,
    /// 0..=999; NMEA carries hundredths, so values are multiples of 10.
    pub millis: u16,
}

impl Time {
    /// Build a time without checking it.
    pub const fn new(hours: u8, minutes: u8, seconds: u8, millis: u16) -> Self {
        Self {
            hours,
            minutes,
            seconds,
            millis,
        }
    }

    /// Every component in range.
    pub const fn is_valid(&self) -> bool {
        self.hours <= 23 && self.minutes <= 59 && self.seconds <= 59 && self.millis <= 999
    }

    /// Hundredths of a second.
    pub const fn centis(&self) -> u8 {
        (self.millis / 10) as u8
    }

    /// Seconds since midnight.
    pub const fn seconds_of_day(&self) -> u32 {
        self.hours as u32 * 3600 + self.minutes as u32 * 60 + self.seconds as u32
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}.{:03}",
            self.hours, self.minutes, self.seconds, self.millis
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leap_years() {
        assert!(is_leap_year(2024));
        assert!(is_leap_year(2000));
        assert!(!is_leap_year(2100));
        assert!(!is_leap_year(2023));
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2023, 4), 30);
        assert_eq!(days_in_month(2023, 12), 31);
        assert_eq!(days_in_month(2023, 0), 0);
        assert_eq!(days_in_month(2023, 13), 0);
    }

    #[test]
    fn test_date_validation() {
        assert!(Date::new(2024, 2, 29).is_valid());
        assert!(!Date::new(2023, 2, 29).is_valid());
        assert!(!Date::new(2023, 4, 31).is_valid());
        assert!(!Date::new(2023, 1, 0).is_valid());
        assert_eq!(Date::new(2024, 3, 9).to_string(), "2024-03-09");
        assert_eq!(Date::century_year(24), 2024);
    }

    #[test]
    fn test_time_validation() {
        assert!(Time::new(23, 59, 59, 990).is_valid());
        assert!(!Time::new(24, 0, 0, 0).is_valid());
        assert!(!Time::new(0, 60, 0, 0).is_valid());
        assert_eq!(Time::new(12, 35, 19, 250).centis(), 25);
        assert_eq!(Time::new(1, 0, 1, 0).seconds_of_day(), 3601);
    }
}
