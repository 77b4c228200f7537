//! Manual correction of a single payment and re-pricing of the interest
//! charged by later payments.
//!
//! A correction does not re-run the amortization. It moves the corrected
//! entry's balance by the change in its principal, then re-prices the
//! interest of every entry after the first off the preceding entry's stored
//! balance. Principal and balance of the other entries stay as they were.
//! Both steps use `annual rate / 12` whatever the loan's periodicity.

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::emi::annual_rate_fraction;
use crate::error::{Result, ScheduleError};
use crate::schedule::{PaymentEntry, round_money};

fn monthly_rate(annual_rate_percent: Decimal) -> Decimal {
    annual_rate_fraction(annual_rate_percent) / dec!(12)
}

/// Parses a user supplied principal amount.
///
/// Surrounding whitespace is ignored; plain (`500`, `-12.5`) and scientific
/// (`5e2`) notations are accepted.
pub fn parse_amount(text: &str) -> Result<Decimal> {
    let trimmed = text.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| ScheduleError::InvalidAmount(text.to_string()))
}

/// Applies an already-parsed principal override to `entry`.
///
/// The balance moves by the difference between the old and new principal,
/// and the entry's interest is recomputed from the new balance.
///
/// # Errors
///
/// Returns `InvalidAmount` if the new balance or interest overflows. The
/// entry is left untouched in that case.
pub fn apply_correction(
    entry: &mut PaymentEntry,
    new_principal: Decimal,
    annual_rate_percent: Decimal,
) -> Result<PaymentEntry> {
    let overflow = || ScheduleError::InvalidAmount(new_principal.to_string());

    let remaining_balance = entry
        .principal
        .checked_sub(new_principal)
        .and_then(|delta| entry.remaining_balance.checked_add(delta))
        .map(round_money)
        .ok_or_else(overflow)?;
    let interest = remaining_balance
        .checked_mul(monthly_rate(annual_rate_percent))
        .map(round_money)
        .ok_or_else(overflow)?;

    entry.principal = round_money(new_principal);
    entry.remaining_balance = remaining_balance;
    entry.interest = interest;

    Ok(*entry)
}

/// Overrides the principal portion of one payment.
///
/// # Arguments
///
/// * `entry` - The payment being corrected.
/// * `new_principal` - The new principal portion, as entered by the user.
/// * `annual_rate_percent` - The loan's annual interest rate as a percentage.
///
/// # Errors
///
/// Returns `InvalidAmount` if `new_principal` is not a decimal number or
/// moves the balance out of range. The entry is left untouched in that case.
pub fn correct_payment(
    entry: &mut PaymentEntry,
    new_principal: &str,
    annual_rate_percent: Decimal,
) -> Result<PaymentEntry> {
    let amount = parse_amount(new_principal)?;
    apply_correction(entry, amount, annual_rate_percent)
        .map_err(|_| ScheduleError::InvalidAmount(new_principal.to_string()))
}

/// Re-prices the interest of every payment after the first.
///
/// `entries` must be the loan's complete schedule ordered by due date. Each
/// entry from the second on gets `previous.remaining_balance * rate / 12`;
/// the first entry is never rewritten, and neither principal nor balance of
/// any entry changes.
///
/// # Errors
///
/// Returns `InvalidScheduleParameters` if any interest overflows, before any
/// entry is written.
pub fn propagate_interest(entries: &mut [PaymentEntry], annual_rate_percent: Decimal) -> Result<()> {
    let rate = monthly_rate(annual_rate_percent);

    let repriced = entries
        .windows(2)
        .map(|pair| {
            let previous = pair[0];
            previous.remaining_balance.checked_mul(rate).map(round_money).ok_or_else(|| {
                ScheduleError::InvalidScheduleParameters(format!(
                    "interest on the balance {} of payment {} overflows",
                    previous.remaining_balance, previous.id
                ))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    for (entry, interest) in entries.iter_mut().skip(1).zip(repriced) {
        entry.interest = interest;
    }
    Ok(())
}
