//! Fee and total computation for the live preview.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::parser::parse_positive;
use crate::types::{FeeMode, TransactionBreakdown};

/// Fractional digits kept on the fee.
pub const FEE_DECIMALS: u32 = 2;

const ONE_HUNDRED: Decimal = Decimal::ONE_HUNDRED;

fn round_to(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Turn raw entries into `{original, fee, total}`.
///
/// Never fails: unparseable or non-positive amounts produce an empty
/// breakdown, and an unusable fee value simply yields no fee.
pub fn compute(amount_text: &str, fee_mode: FeeMode, fee_value_text: &str) -> TransactionBreakdown {
    let Some(original_amount) = parse_positive(amount_text) else {
        return TransactionBreakdown::default();
    };

    let fee = match (fee_mode, parse_positive(fee_value_text)) {
        (FeeMode::Percentage, Some(percent)) => original_amount
            .checked_mul(percent / ONE_HUNDRED)
            .unwrap_or(Decimal::MAX),
        (FeeMode::Fixed, Some(fixed)) => fixed,
        _ => Decimal::ZERO,
    };
    let fee = fee.max(Decimal::ZERO);

    // The total is taken from the unrounded fee; only the displayed fee is rounded.
    let total = original_amount
        .checked_add(fee)
        .unwrap_or(Decimal::MAX);

    TransactionBreakdown {
        original_amount,
        fee: round_to(fee, FEE_DECIMALS),
        total: round_to(total, 0),
    }
}
