// ⏰ Periods - calendar windows over expense dates
//
// Dates are calendar dates only (no time of day, no timezone). "Today" is
// always passed in by the caller; nothing here reads the system clock.

use crate::error::ExpenseError;
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// TIME PERIOD (list filter)
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimePeriod {
    #[default]
    All,
    /// The last seven days, today included
    Week,
    /// Today's calendar month
    Month,
    /// Today's calendar year
    Year,
}

impl TimePeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimePeriod::All => "all",
            TimePeriod::Week => "week",
            TimePeriod::Month => "month",
            TimePeriod::Year => "year",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            TimePeriod::All => "All Time",
            TimePeriod::Week => "This Week",
            TimePeriod::Month => "This Month",
            TimePeriod::Year => "This Year",
        }
    }

    /// Does `date` fall in this period, relative to `today`?
    pub fn contains(&self, date: NaiveDate, today: NaiveDate) -> bool {
        match self {
            TimePeriod::All => true,
            TimePeriod::Week => today
                .checked_sub_signed(Duration::days(7))
                .map_or(true, |start| date >= start),
            TimePeriod::Month => date.year() == today.year() && date.month() == today.month(),
            TimePeriod::Year => date.year() == today.year(),
        }
    }

    pub fn next(&self) -> TimePeriod {
        match self {
            TimePeriod::All => TimePeriod::Week,
            TimePeriod::Week => TimePeriod::Month,
            TimePeriod::Month => TimePeriod::Year,
            TimePeriod::Year => TimePeriod::All,
        }
    }
}

impl fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimePeriod {
    type Err = ExpenseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(TimePeriod::All),
            "week" => Ok(TimePeriod::Week),
            "month" => Ok(TimePeriod::Month),
            "year" => Ok(TimePeriod::Year),
            _ => Err(ExpenseError::parse("time period", s)),
        }
    }
}

// ============================================================================
// REPORT PERIOD (summaries)
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportPeriod {
    #[default]
    Month,
    Year,
}

impl ReportPeriod {
    /// The list-filter window this report covers
    pub fn time_period(&self) -> TimePeriod {
        match self {
            ReportPeriod::Month => TimePeriod::Month,
            ReportPeriod::Year => TimePeriod::Year,
        }
    }

    pub fn contains(&self, date: NaiveDate, today: NaiveDate) -> bool {
        self.time_period().contains(date, today)
    }

    pub fn as_str(&self) -> &'static str {
        self.time_period().as_str()
    }

    pub fn title(&self) -> &'static str {
        self.time_period().title()
    }
}

impl fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportPeriod {
    type Err = ExpenseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<TimePeriod>() {
            Ok(TimePeriod::Month) => Ok(ReportPeriod::Month),
            Ok(TimePeriod::Year) => Ok(ReportPeriod::Year),
            _ => Err(ExpenseError::parse("report period", s)),
        }
    }
}

// ============================================================================
// CALENDAR MONTH
// ============================================================================

/// A calendar month of a given year, e.g. 2024-01
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    /// 1..=12
    pub month: u32,
}

impl YearMonth {
    /// The month containing `date`
    pub fn containing(date: NaiveDate) -> Self {
        YearMonth {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// The immediately preceding month; January rolls back to December
    pub fn previous(&self) -> Self {
        if self.month == 1 {
            YearMonth {
                year: self.year - 1,
                month: 12,
            }
        } else {
            YearMonth {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// First day of the month
    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = ExpenseError;

    /// Parses `YYYY-MM`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| ExpenseError::parse("month", s))?;

        let year: i32 = year.parse().map_err(|_| ExpenseError::parse("month", s))?;
        let month: u32 = month.parse().map_err(|_| ExpenseError::parse("month", s))?;

        let parsed = YearMonth { year, month };
        if parsed.first_day().is_none() {
            return Err(ExpenseError::parse("month", s));
        }
        Ok(parsed)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_all_matches_everything() {
        let today = date(2024, 6, 15);
        assert!(TimePeriod::All.contains(date(1999, 1, 1), today));
        assert!(TimePeriod::All.contains(date(2030, 1, 1), today));
    }

    #[test]
    fn test_week_includes_seven_days_back() {
        let today = date(2024, 3, 3);
        assert!(TimePeriod::Week.contains(date(2024, 3, 3), today));
        assert!(TimePeriod::Week.contains(date(2024, 2, 25), today));
        assert!(!TimePeriod::Week.contains(date(2024, 2, 24), today));
    }

    #[test]
    fn test_month_requires_same_year() {
        let today = date(2024, 1, 15);
        assert!(TimePeriod::Month.contains(date(2024, 1, 1), today));
        assert!(TimePeriod::Month.contains(date(2024, 1, 31), today));
        assert!(!TimePeriod::Month.contains(date(2023, 1, 15), today));
        assert!(!TimePeriod::Month.contains(date(2023, 12, 31), today));
    }

    #[test]
    fn test_year_window() {
        let today = date(2024, 1, 15);
        assert!(TimePeriod::Year.contains(date(2024, 12, 31), today));
        assert!(!TimePeriod::Year.contains(date(2023, 12, 31), today));
    }

    #[test]
    fn test_parse_periods() {
        assert_eq!("Week".parse::<TimePeriod>().unwrap(), TimePeriod::Week);
        assert_eq!("year".parse::<ReportPeriod>().unwrap(), ReportPeriod::Year);
        assert!("week".parse::<ReportPeriod>().is_err());
        assert!("fortnight".parse::<TimePeriod>().is_err());
    }

    #[test]
    fn test_previous_month_rolls_over_year() {
        let jan = YearMonth { year: 2024, month: 1 };
        assert_eq!(jan.previous(), YearMonth { year: 2023, month: 12 });

        let mar = YearMonth { year: 2024, month: 3 };
        assert_eq!(mar.previous(), YearMonth { year: 2024, month: 2 });
    }

    #[test]
    fn test_year_month_parse_and_display() {
        let ym: YearMonth = "2024-02".parse().unwrap();
        assert_eq!(ym, YearMonth { year: 2024, month: 2 });
        assert_eq!(ym.to_string(), "2024-02");

        assert!("2024-13".parse::<YearMonth>().is_err());
        assert!("2024".parse::<YearMonth>().is_err());
        assert!("abcd-01".parse::<YearMonth>().is_err());
    }

    #[test]
    fn test_year_month_contains() {
        let ym = YearMonth::containing(date(2024, 2, 29));
        assert!(ym.contains(date(2024, 2, 1)));
        assert!(!ym.contains(date(2024, 3, 1)));
        assert_eq!(ym.first_day(), Some(date(2024, 2, 1)));
    }
}
