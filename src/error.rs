use rust_decimal::Decimal;
use thiserror::Error;

/// Errors reported by the amortization engine.
///
/// Every variant is an input-validation failure: an operation either
/// completes fully or returns one of these without touching its inputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("Invalid periodicity {0:?}: expected <N>m, <N>w or <N>d with N a positive integer")]
    InvalidPeriodicity(String),

    #[error("Invalid schedule parameters: {0}")]
    InvalidScheduleParameters(String),

    #[error("Invalid principal amount {0:?}")]
    InvalidAmount(String),

    #[error("Degenerate periodic rate {rate} over {periods} periods: annuity factor is not representable")]
    DegenerateRate { rate: Decimal, periods: u32 },

    #[error("Payment {0} does not exist in this schedule")]
    PaymentNotFound(u32),
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
