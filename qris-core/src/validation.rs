//! Submit-time rules that the live preview does not enforce.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::parser::parse_positive;
use crate::types::{FeeMode, TransactionBreakdown, TransactionInput};

/// Largest accepted transaction amount (12 decimal digits).
pub const MAX_AMOUNT: u64 = 999_999_999_999;
/// Upper bound for a percentage fee value.
pub const MAX_PERCENTAGE: Decimal = Decimal::ONE_HUNDRED;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("transaction amount must be set and greater than 0")]
    AmountRequired,
    #[error("transaction amount is too large (maximum 12 digits)")]
    AmountTooLarge,
    #[error("fee value for the \"{}\" fee mode must be a positive number", .mode.label())]
    FeeValueInvalid { mode: FeeMode },
    #[error("percentage fee cannot exceed 100%")]
    PercentageTooHigh,
    #[error("total amount exceeds the supported range")]
    TotalOutOfRange,
    #[error("transaction amount is too small: the total payment rounds to Rp0")]
    TotalTooSmall,
}

impl ValidationError {
    /// Stable machine-readable code for agent output.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::AmountRequired => "E_AMOUNT_REQUIRED",
            ValidationError::AmountTooLarge => "E_AMOUNT_TOO_LARGE",
            ValidationError::FeeValueInvalid { .. } => "E_FEE_VALUE_INVALID",
            ValidationError::PercentageTooHigh => "E_FEE_PERCENT_TOO_HIGH",
            ValidationError::TotalOutOfRange => "E_TOTAL_OUT_OF_RANGE",
            ValidationError::TotalTooSmall => "E_TOTAL_TOO_SMALL",
        }
    }
}

/// Check the current entry against the submit rules, in order, and return
/// the integer nominal to send on the wire.
pub fn validate_submission(
    input: &TransactionInput,
    breakdown: &TransactionBreakdown,
) -> Result<u64, ValidationError> {
    if breakdown.original_amount <= Decimal::ZERO {
        return Err(ValidationError::AmountRequired);
    }
    if breakdown.original_amount > Decimal::from(MAX_AMOUNT) {
        return Err(ValidationError::AmountTooLarge);
    }

    if input.fee_mode.uses_fee_value() {
        let Some(fee_value) = parse_positive(&input.fee_value_text) else {
            return Err(ValidationError::FeeValueInvalid {
                mode: input.fee_mode,
            });
        };
        if input.fee_mode == FeeMode::Percentage && fee_value > MAX_PERCENTAGE {
            return Err(ValidationError::PercentageTooHigh);
        }
    }

    let total = breakdown
        .total
        .to_u64()
        .ok_or(ValidationError::TotalOutOfRange)?;
    if total == 0 {
        return Err(ValidationError::TotalTooSmall);
    }
    Ok(total)
}
