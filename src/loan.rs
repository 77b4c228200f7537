//! A loan together with its generated payments.
//!
//! This is the in-memory counterpart of a stored loan record: the caller
//! owns the `Loan`, and modifications go through it so that a correction and
//! the interest propagation it triggers are applied together.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::correction::{apply_correction, parse_amount, propagate_interest};
use crate::error::{Result, ScheduleError};
use crate::periodicity::Periodicity;
use crate::schedule::{LoanTerms, PaymentEntry};

/// Date format of `loan_start_date` in loan requests.
pub const REQUEST_DATE_FORMAT: &str = "%d-%m-%Y";

/// A loan as submitted by a client.
///
/// ```json
/// {
///     "amount": "10000",
///     "loan_start_date": "01-09-2024",
///     "number_of_payments": 12,
///     "periodicity": "1m",
///     "interest_rate": "5.0"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRequest {
    pub amount: Decimal,
    #[serde(with = "request_date")]
    pub loan_start_date: NaiveDate,
    pub number_of_payments: i64,
    pub periodicity: String,
    /// Annual interest rate as a percentage.
    pub interest_rate: Decimal,
}

impl LoanRequest {
    pub fn into_terms(self) -> Result<LoanTerms> {
        self.try_into()
    }
}

impl TryFrom<LoanRequest> for LoanTerms {
    type Error = ScheduleError;

    fn try_from(request: LoanRequest) -> Result<Self> {
        Ok(LoanTerms {
            principal: request.amount,
            annual_interest_rate: request.interest_rate,
            number_of_periods: request.number_of_payments,
            start_date: request.loan_start_date,
            periodicity: request.periodicity.parse::<Periodicity>()?,
        })
    }
}

/// A loan and its payments, ordered by due date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Loan {
    terms: LoanTerms,
    payments: Vec<PaymentEntry>,
}

impl Loan {
    /// Generates the payment schedule for `terms`.
    pub fn create(terms: LoanTerms) -> Result<Self> {
        let payments = terms.generate_schedule()?;
        log::info!(
            "created loan of {} at {}% with {} payments every {}",
            terms.principal,
            terms.annual_interest_rate,
            payments.len(),
            terms.periodicity
        );
        Ok(Self { terms, payments })
    }

    pub fn terms(&self) -> &LoanTerms {
        &self.terms
    }

    pub fn payments(&self) -> &[PaymentEntry] {
        &self.payments
    }

    pub fn payment(&self, id: u32) -> Option<&PaymentEntry> {
        self.payments.iter().find(|p| p.id == id)
    }

    /// Sum of the principal portions, `None` if it overflows.
    pub fn total_principal(&self) -> Option<Decimal> {
        checked_total(self.payments.iter().map(|p| p.principal))
    }

    /// Sum of the interest portions, `None` if it overflows.
    pub fn total_interest(&self) -> Option<Decimal> {
        checked_total(self.payments.iter().map(|p| p.interest))
    }

    /// Overrides the principal of payment `id` and re-prices the interest of
    /// the schedule.
    ///
    /// # Errors
    ///
    /// Returns `PaymentNotFound` for an unknown id, `InvalidAmount` when
    /// `new_principal` does not parse or overflows the balance, and
    /// `InvalidScheduleParameters` when re-priced interest overflows. No
    /// payment is modified on error.
    pub fn modify_payment(&mut self, id: u32, new_principal: &str) -> Result<PaymentEntry> {
        let index = self
            .payments
            .iter()
            .position(|p| p.id == id)
            .ok_or(ScheduleError::PaymentNotFound(id))?;
        let amount = parse_amount(new_principal)?;

        let rate = self.terms.annual_interest_rate;
        let old = self.payments[index];
        let mut payments = self.payments.clone();
        apply_correction(&mut payments[index], amount, rate)
            .map_err(|_| ScheduleError::InvalidAmount(new_principal.to_string()))?;
        propagate_interest(&mut payments, rate)?;
        self.payments = payments;

        let updated = self.payments[index];
        log::info!(
            "payment {} modified: principal {} -> {}, balance {} -> {}",
            id,
            old.principal,
            updated.principal,
            old.remaining_balance,
            updated.remaining_balance
        );
        Ok(updated)
    }
}

fn checked_total(mut amounts: impl Iterator<Item = Decimal>) -> Option<Decimal> {
    amounts.try_fold(Decimal::ZERO, |total, amount| total.checked_add(amount))
}

mod request_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::REQUEST_DATE_FORMAT;

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format(REQUEST_DATE_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(&s, REQUEST_DATE_FORMAT).map_err(serde::de::Error::custom)
    }
}
