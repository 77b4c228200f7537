//! Equated installment (EMI) pricing.

use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;

use crate::error::{Result, ScheduleError};

/// Converts an annual rate given as a percentage (e.g. `5.0`) into a
/// fraction (`0.05`).
pub fn annual_rate_fraction(percent: Decimal) -> Decimal {
    percent / dec!(100)
}

/// Interest rate charged per period: the annual fraction scaled by the
/// period's share of a year. No compounding is applied.
///
/// # Errors
///
/// Returns `InvalidScheduleParameters` if the product does not fit in a `Decimal`.
pub fn periodic_rate(annual_rate: Decimal, period_fraction: Decimal) -> Result<Decimal> {
    annual_rate.checked_mul(period_fraction).ok_or_else(|| {
        ScheduleError::InvalidScheduleParameters(format!(
            "periodic rate of {annual_rate} over {period_fraction} of a year overflows"
        ))
    })
}

/// Calculates the level payment that amortizes `principal` over `periods`.
///
/// The formula is: EMI = i * P / (1 - (1 + i)^-n), with i = annual_rate * period_fraction.
/// A zero rate degenerates to an even split of the principal.
///
/// # Arguments
///
/// * `principal` - The loan amount.
/// * `annual_rate` - The annual interest rate as a fraction (not percentage).
/// * `periods` - The number of payments.
/// * `period_fraction` - The fraction of a year each period covers.
///
/// # Errors
///
/// Returns `InvalidScheduleParameters` if `periods` is zero, and
/// `DegenerateRate` if `1 + i` is not positive, or `(1 + i)^n` or the
/// payment itself overflows.
pub fn calculate_emi(
    principal: Decimal,
    annual_rate: Decimal,
    periods: u32,
    period_fraction: Decimal,
) -> Result<Decimal> {
    if periods == 0 {
        return Err(ScheduleError::InvalidScheduleParameters(
            "number of periods cannot be zero".to_string(),
        ));
    }

    let rate = periodic_rate(annual_rate, period_fraction)?;
    if rate.is_zero() {
        return Ok(principal / Decimal::from(periods));
    }

    let degenerate = || ScheduleError::DegenerateRate { rate, periods };

    let base = Decimal::ONE.checked_add(rate).ok_or_else(degenerate)?;
    if base <= Decimal::ZERO {
        return Err(degenerate());
    }

    // (1 + i)^-n == 1 / (1 + i)^n
    let growth = base.checked_powu(u64::from(periods)).ok_or_else(degenerate)?;
    let discount = Decimal::ONE.checked_div(growth).ok_or_else(degenerate)?;
    let denominator = Decimal::ONE - discount;
    if denominator.is_zero() {
        return Err(degenerate());
    }

    rate.checked_mul(principal)
        .and_then(|interest| interest.checked_div(denominator))
        .ok_or_else(degenerate)
}
