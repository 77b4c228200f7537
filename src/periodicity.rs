//! Payment frequency codes such as `1m`, `2w` or `30d`.
//!
//! A code is a positive integer multiplier followed by a unit suffix. The
//! unit decides both the fraction of a year a period represents and how far
//! apart due dates are. Months are modelled as fixed 30-day blocks, not as
//! calendar months.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, TimeDelta};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};

/// The unit suffix of a periodicity code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeriodUnit {
    Month,
    Week,
    Day,
}

impl PeriodUnit {
    /// Number of calendar days one unit advances a due date by.
    pub fn days(self) -> i64 {
        match self {
            PeriodUnit::Month => 30,
            PeriodUnit::Week => 7,
            PeriodUnit::Day => 1,
        }
    }

    /// How many units make up a year when converting to a year fraction.
    pub fn periods_per_year(self) -> u32 {
        match self {
            PeriodUnit::Month => 12,
            PeriodUnit::Week => 52,
            PeriodUnit::Day => 365,
        }
    }

    fn suffix(self) -> char {
        match self {
            PeriodUnit::Month => 'm',
            PeriodUnit::Week => 'w',
            PeriodUnit::Day => 'd',
        }
    }

    fn from_suffix(c: char) -> Option<Self> {
        match c {
            'm' => Some(PeriodUnit::Month),
            'w' => Some(PeriodUnit::Week),
            'd' => Some(PeriodUnit::Day),
            _ => None,
        }
    }
}

/// A parsed payment frequency: `count` units of `unit` between payments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Periodicity {
    pub count: u32,
    pub unit: PeriodUnit,
}

impl Periodicity {
    pub fn new(count: u32, unit: PeriodUnit) -> Result<Self> {
        if count == 0 {
            return Err(ScheduleError::InvalidPeriodicity(format!("0{}", unit.suffix())));
        }
        Ok(Self { count, unit })
    }

    /// Fraction of a year one period represents: `N/12`, `N/52` or `N/365`.
    pub fn year_fraction(&self) -> Decimal {
        Decimal::from(self.count) / Decimal::from(self.unit.periods_per_year())
    }

    /// Due date of the `period_number`-th payment.
    ///
    /// The date is computed directly from `start` rather than by stepping
    /// from the previous due date, so the n-th payment falls exactly
    /// `unit days * count * n` days after the start.
    ///
    /// # Errors
    ///
    /// Returns `InvalidScheduleParameters` if the date falls outside the
    /// representable calendar range.
    pub fn due_date(&self, start: NaiveDate, period_number: u32) -> Result<NaiveDate> {
        let out_of_range = || {
            ScheduleError::InvalidScheduleParameters(format!(
                "due date of payment {period_number} ({self} from {start}) is out of range"
            ))
        };

        let days = self
            .unit
            .days()
            .checked_mul(i64::from(self.count))
            .and_then(|d| d.checked_mul(i64::from(period_number)))
            .ok_or_else(out_of_range)?;
        let offset = TimeDelta::try_days(days).ok_or_else(out_of_range)?;

        start.checked_add_signed(offset).ok_or_else(out_of_range)
    }
}

impl FromStr for Periodicity {
    type Err = ScheduleError;

    fn from_str(code: &str) -> Result<Self> {
        let invalid = || ScheduleError::InvalidPeriodicity(code.to_string());

        let suffix = code.chars().last().ok_or_else(invalid)?;
        let unit = PeriodUnit::from_suffix(suffix).ok_or_else(invalid)?;
        let digits = &code[..code.len() - suffix.len_utf8()];

        // u32::from_str would also take a leading '+'
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let count: u32 = digits.parse().map_err(|_| invalid())?;
        if count == 0 {
            return Err(invalid());
        }

        Ok(Self { count, unit })
    }
}

impl fmt::Display for Periodicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.count, self.unit.suffix())
    }
}

impl TryFrom<String> for Periodicity {
    type Error = ScheduleError;

    fn try_from(code: String) -> Result<Self> {
        code.parse()
    }
}

impl From<Periodicity> for String {
    fn from(p: Periodicity) -> Self {
        p.to_string()
    }
}

/// Converts a periodicity code straight into its year fraction.
///
/// # Errors
///
/// Returns `InvalidPeriodicity` when the suffix is not `m`, `w` or `d`, or
/// the multiplier is not a positive integer.
pub fn period_fraction(code: &str) -> Result<Decimal> {
    Ok(code.parse::<Periodicity>()?.year_fraction())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case("1m", 1, PeriodUnit::Month)]
    #[case("6m", 6, PeriodUnit::Month)]
    #[case("2w", 2, PeriodUnit::Week)]
    #[case("30d", 30, PeriodUnit::Day)]
    fn test_parse_valid_codes(#[case] code: &str, #[case] count: u32, #[case] unit: PeriodUnit) {
        let p: Periodicity = code.parse().unwrap();
        assert_eq!(p, Periodicity { count, unit });
        assert_eq!(p.to_string(), code);
    }

    #[rstest]
    #[case("1y")]
    #[case("")]
    #[case("m")]
    #[case("0m")]
    #[case("-1m")]
    #[case("+1m")]
    #[case("1.5w")]
    #[case(" 1d")]
    #[case("99999999999d")]
    fn test_parse_invalid_codes(#[case] code: &str) {
        let err = code.parse::<Periodicity>().unwrap_err();
        assert_eq!(err, ScheduleError::InvalidPeriodicity(code.to_string()));
    }

    #[test]
    fn test_period_fraction() {
        assert_eq!(period_fraction("1m").unwrap(), dec!(1) / dec!(12));
        assert_eq!(period_fraction("6m").unwrap(), dec!(0.5));
        assert_eq!(period_fraction("13w").unwrap(), dec!(0.25));
        assert_eq!(period_fraction("73d").unwrap(), dec!(0.2));
        assert!(matches!(
            period_fraction("1y"),
            Err(ScheduleError::InvalidPeriodicity(_))
        ));
    }

    #[rstest]
    #[case("1m", 1, "2024-10-01")]
    #[case("1m", 12, "2025-08-27")]
    #[case("2m", 3, "2025-02-28")]
    #[case("1w", 1, "2024-09-08")]
    #[case("2w", 2, "2024-09-29")]
    #[case("10d", 3, "2024-10-01")]
    fn test_due_date_counts_from_start(#[case] code: &str, #[case] n: u32, #[case] expected: &str) {
        let start = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();
        let p: Periodicity = code.parse().unwrap();
        let expected = NaiveDate::parse_from_str(expected, "%Y-%m-%d").unwrap();
        assert_eq!(p.due_date(start, n).unwrap(), expected);
    }

    #[test]
    fn test_due_date_out_of_range() {
        let p = Periodicity::new(1, PeriodUnit::Month).unwrap();
        let err = p.due_date(NaiveDate::MAX, 1).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidScheduleParameters(_)));
    }

    #[test]
    fn test_serde_as_code_string() {
        let p: Periodicity = serde_json::from_str("\"2w\"").unwrap();
        assert_eq!(p, Periodicity { count: 2, unit: PeriodUnit::Week });
        assert_eq!(serde_json::to_string(&p).unwrap(), "\"2w\"");
        assert!(serde_json::from_str::<Periodicity>("\"1y\"").is_err());
    }
}
