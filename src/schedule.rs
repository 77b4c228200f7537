//! Fixed-payment amortization schedules.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::emi::{annual_rate_fraction, calculate_emi, periodic_rate};
use crate::error::{Result, ScheduleError};
use crate::periodicity::Periodicity;

/// Terms of a fixed-rate installment loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    /// The amount borrowed.
    pub principal: Decimal,
    /// The annual interest rate as a percentage (e.g., 5.0 for 5%).
    pub annual_interest_rate: Decimal,
    /// How many payments repay the loan.
    pub number_of_periods: i64,
    /// The origination date. Due dates are counted from here.
    pub start_date: NaiveDate,
    /// Payment frequency, serialized as its code (`1m`, `2w`, `30d`).
    pub periodicity: Periodicity,
}

impl LoanTerms {
    pub fn generate_schedule(&self) -> Result<Vec<PaymentEntry>> {
        build_schedule(
            self.principal,
            self.annual_interest_rate,
            self.number_of_periods,
            self.start_date,
            self.periodicity,
        )
    }
}

/// One scheduled payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentEntry {
    /// 1-based sequence number of the payment.
    pub id: u32,
    pub date: NaiveDate,
    /// Principal repaid by this payment.
    pub principal: Decimal,
    /// Interest charged by this payment.
    pub interest: Decimal,
    /// Outstanding principal once this payment is made.
    pub remaining_balance: Decimal,
}

impl PaymentEntry {
    /// Total amount due for this payment, `None` if it overflows.
    pub fn installment(&self) -> Option<Decimal> {
        self.principal.checked_add(self.interest)
    }
}

/// Rounds a money amount to cents, reporting a negative zero as `0.00`.
pub(crate) fn round_money(amount: Decimal) -> Decimal {
    let rounded = amount.round_dp(2);
    if rounded.is_zero() {
        Decimal::new(0, 2)
    } else {
        rounded
    }
}

/// Generates the amortization schedule of a fixed-rate loan.
///
/// A single EMI is computed up front and held constant; each period splits it
/// into the interest accrued on the running balance and the principal it
/// repays. The running balance is carried unrounded, and only the reported
/// fields are rounded to 2 decimal places.
///
/// # Arguments
///
/// * `principal` - The loan amount.
/// * `annual_rate_percent` - The annual interest rate as a percentage (e.g., 5.0 for 5%).
/// * `number_of_periods` - The number of payments.
/// * `start_date` - The loan origination date.
/// * `periodicity` - Payment frequency code (`<N>m`, `<N>w` or `<N>d`).
///
/// # Errors
///
/// Returns `InvalidPeriodicity` for an unrecognized code, `DegenerateRate`
/// when the installment cannot be priced, and `InvalidScheduleParameters`
/// for a non-positive period count or principal, a negative rate, amounts
/// that overflow, or due dates beyond the calendar range.
pub fn generate_schedule(
    principal: Decimal,
    annual_rate_percent: Decimal,
    number_of_periods: i64,
    start_date: NaiveDate,
    periodicity: &str,
) -> Result<Vec<PaymentEntry>> {
    let periodicity: Periodicity = periodicity.parse()?;
    build_schedule(principal, annual_rate_percent, number_of_periods, start_date, periodicity)
}

fn build_schedule(
    principal: Decimal,
    annual_rate_percent: Decimal,
    number_of_periods: i64,
    start_date: NaiveDate,
    periodicity: Periodicity,
) -> Result<Vec<PaymentEntry>> {
    let periods = u32::try_from(number_of_periods)
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| {
            ScheduleError::InvalidScheduleParameters(format!(
                "number of periods must be a positive integer, got {number_of_periods}"
            ))
        })?;
    if principal <= Decimal::ZERO {
        return Err(ScheduleError::InvalidScheduleParameters(format!(
            "principal must be positive, got {principal}"
        )));
    }
    if annual_rate_percent < Decimal::ZERO {
        return Err(ScheduleError::InvalidScheduleParameters(format!(
            "annual interest rate cannot be negative, got {annual_rate_percent}"
        )));
    }

    let annual_rate = annual_rate_fraction(annual_rate_percent);
    let fraction = periodicity.year_fraction();
    let rate = periodic_rate(annual_rate, fraction)?;
    let emi = calculate_emi(principal, annual_rate, periods, fraction)?;

    let mut remaining_principal = principal;
    let mut schedule = Vec::with_capacity(periods as usize);

    for period in 1..=periods {
        let overflow = || {
            ScheduleError::InvalidScheduleParameters(format!(
                "payment {period} of {principal} at {annual_rate_percent}% overflows"
            ))
        };
        let interest = remaining_principal.checked_mul(rate).ok_or_else(overflow)?;
        let principal_payment = emi.checked_sub(interest).ok_or_else(overflow)?;
        remaining_principal = remaining_principal
            .checked_sub(principal_payment)
            .ok_or_else(overflow)?;

        schedule.push(PaymentEntry {
            id: period,
            date: periodicity.due_date(start_date, period)?,
            principal: round_money(principal_payment),
            interest: round_money(interest),
            remaining_balance: round_money(remaining_principal),
        });
    }

    log::debug!(
        "generated {} payments of {} every {} starting {}",
        periods,
        round_money(emi),
        periodicity,
        start_date
    );

    Ok(schedule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 1).unwrap()
    }

    #[test]
    fn test_monthly_schedule_happy_path() {
        let schedule = generate_schedule(dec!(10000), dec!(5.0), 12, start(), "1m").unwrap();

        assert_eq!(schedule.len(), 12);

        let first = schedule[0];
        assert_eq!(first.id, 1);
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 10, 1).unwrap());
        assert_eq!(first.principal, dec!(814.41));
        assert_eq!(first.interest, dec!(41.67));
        assert_eq!(first.remaining_balance, dec!(9185.59));

        assert_eq!(schedule[1].principal, dec!(817.80));
        assert_eq!(schedule[1].interest, dec!(38.27));
        assert_eq!(schedule[1].remaining_balance, dec!(8367.79));

        let last = schedule[11];
        assert_eq!(last.id, 12);
        assert_eq!(last.principal, dec!(852.52));
        assert_eq!(last.interest, dec!(3.55));
        assert_eq!(last.remaining_balance, dec!(0.00));
    }

    #[test]
    fn test_installment_is_constant() {
        let schedule = generate_schedule(dec!(10000), dec!(5.0), 12, start(), "1m").unwrap();
        for entry in &schedule {
            let installment = entry.installment().unwrap();
            assert!((installment - dec!(856.07)).abs() <= dec!(0.01));
        }
    }

    #[rstest]
    #[case(dec!(10000), dec!(5.0), 12, "1m")]
    #[case(dec!(360000), dec!(10.5), 420, "1m")]
    #[case(dec!(5000), dec!(7.25), 26, "2w")]
    #[case(dec!(1500), dec!(18), 90, "1d")]
    #[case(dec!(80000), dec!(3.9), 10, "6m")]
    #[case(dec!(2400), dec!(0), 24, "1m")]
    fn test_schedule_repays_principal(
        #[case] principal: Decimal,
        #[case] rate: Decimal,
        #[case] periods: i64,
        #[case] periodicity: &str,
    ) {
        let schedule = generate_schedule(principal, rate, periods, start(), periodicity).unwrap();
        assert_eq!(schedule.len() as i64, periods);

        let tolerance = dec!(0.01) * Decimal::from(periods);
        let repaid: Decimal = schedule.iter().map(|e| e.principal).sum();
        assert!((repaid - principal).abs() <= tolerance, "repaid {repaid} of {principal}");

        let last = schedule.last().unwrap();
        assert!(last.remaining_balance.abs() <= dec!(0.01));

        let mut previous = principal;
        for entry in &schedule {
            let expected = previous - entry.principal;
            assert!((entry.remaining_balance - expected).abs() <= dec!(0.01));
            previous = entry.remaining_balance;
        }
    }

    #[test]
    fn test_weekly_dates_are_exact() {
        let schedule = generate_schedule(dec!(1000), dec!(6), 3, start(), "2w").unwrap();
        let dates: Vec<String> = schedule.iter().map(|e| e.date.to_string()).collect();
        assert_eq!(dates, ["2024-09-15", "2024-09-29", "2024-10-13"]);
    }

    #[test]
    fn test_zero_rate_schedule() {
        let schedule = generate_schedule(dec!(1200), dec!(0), 12, start(), "1m").unwrap();
        assert!(schedule.iter().all(|e| e.principal == dec!(100) && e.interest.is_zero()));
        assert_eq!(schedule[11].remaining_balance, dec!(0.00));
    }

    #[test]
    fn test_invalid_periodicity() {
        let err = generate_schedule(dec!(10000), dec!(5.0), 12, start(), "1y").unwrap_err();
        assert_eq!(err, ScheduleError::InvalidPeriodicity("1y".to_string()));
    }

    #[rstest]
    #[case(dec!(10000), dec!(5.0), 0)]
    #[case(dec!(10000), dec!(5.0), -3)]
    #[case(dec!(10000), dec!(5.0), i64::from(u32::MAX) + 1)]
    #[case(dec!(0), dec!(5.0), 12)]
    #[case(dec!(-100), dec!(5.0), 12)]
    #[case(dec!(10000), dec!(-1), 12)]
    fn test_invalid_schedule_parameters(
        #[case] principal: Decimal,
        #[case] rate: Decimal,
        #[case] periods: i64,
    ) {
        let err = generate_schedule(principal, rate, periods, start(), "1m").unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidScheduleParameters(_)), "{err}");
    }

    #[rstest]
    #[case(Decimal::MAX, dec!(2400), 12, "1m")]
    #[case(Decimal::MAX, dec!(100), 1, "1m")]
    #[case(dec!(10000), dec!(79228162514264337593543950335), 1, "4000000000m")]
    fn test_overflowing_inputs_are_errors(
        #[case] principal: Decimal,
        #[case] rate: Decimal,
        #[case] periods: i64,
        #[case] periodicity: &str,
    ) {
        let err = generate_schedule(principal, rate, periods, start(), periodicity).unwrap_err();
        assert!(
            matches!(
                err,
                ScheduleError::DegenerateRate { .. } | ScheduleError::InvalidScheduleParameters(_)
            ),
            "{err}"
        );
    }

    #[test]
    fn test_terms_round_trip_periodicity_code() {
        let terms = LoanTerms {
            principal: dec!(1000),
            annual_interest_rate: dec!(6),
            number_of_periods: 3,
            start_date: start(),
            periodicity: "2w".parse().unwrap(),
        };
        let json = serde_json::to_value(&terms).unwrap();
        assert_eq!(json["periodicity"], "2w");
        assert_eq!(json["start_date"], "2024-09-01");
        assert_eq!(serde_json::from_value::<LoanTerms>(json).unwrap(), terms);
    }

    #[test]
    fn test_generation_is_deterministic() {
        let terms = LoanTerms {
            principal: dec!(25000),
            annual_interest_rate: dec!(8.75),
            number_of_periods: 48,
            start_date: start(),
            periodicity: "1m".parse().unwrap(),
        };
        assert_eq!(terms.generate_schedule().unwrap(), terms.generate_schedule().unwrap());
    }

    #[test]
    fn test_entry_serialization() {
        let schedule = generate_schedule(dec!(10000), dec!(5.0), 12, start(), "1m").unwrap();
        let json = serde_json::to_value(schedule[0]).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 1,
                "date": "2024-10-01",
                "principal": "814.41",
                "interest": "41.67",
                "remaining_balance": "9185.59",
            })
        );
    }
}
