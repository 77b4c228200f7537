//! `loan_schedule` computes amortization schedules for fixed-rate installment
//! loans and lets a single scheduled payment be corrected after the fact.
//!
//! The engine works on plain decimal and date inputs:
//! - **Schedule generation**: a constant equated installment (EMI) is split,
//!   period by period, into interest on the running balance and principal.
//! - **Payment correction**: one entry's principal is overridden, its balance
//!   and interest follow, and the interest of later payments is re-priced
//!   off the stored balance chain.
//!
//! Payment frequencies are given as codes: `<N>m` (N months of 30 days),
//! `<N>w` (N weeks) or `<N>d` (N days).
//!
//! ## Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use loan_schedule::{generate_schedule, correct_payment, propagate_interest};
//! use rust_decimal_macros::dec;
//!
//! let start = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();
//! let mut schedule = generate_schedule(dec!(10000), dec!(5.0), 12, start, "1m").unwrap();
//!
//! assert_eq!(schedule.len(), 12);
//! assert_eq!(schedule[0].principal, dec!(814.41));
//! assert_eq!(schedule[0].interest, dec!(41.67));
//!
//! correct_payment(&mut schedule[0], "500", dec!(5.0)).unwrap();
//! propagate_interest(&mut schedule, dec!(5.0)).unwrap();
//!
//! assert_eq!(schedule[0].remaining_balance, dec!(9500.00));
//! assert_eq!(schedule[1].interest, dec!(39.58));
//! ```

pub mod correction;
pub mod emi;
pub mod error;
pub mod loan;
pub mod periodicity;
pub mod schedule;

pub use correction::{apply_correction, correct_payment, parse_amount, propagate_interest};
pub use emi::{annual_rate_fraction, calculate_emi, periodic_rate};
pub use error::{Result, ScheduleError};
pub use loan::{Loan, LoanRequest};
pub use periodicity::{PeriodUnit, Periodicity, period_fraction};
pub use schedule::{LoanTerms, PaymentEntry, generate_schedule};
