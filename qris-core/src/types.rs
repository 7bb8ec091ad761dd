//! Data types shared between the CLI and core.

use std::fmt::{self, Display};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculator;

/// How the service fee is derived from the fee value entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeMode {
    #[default]
    None,
    Percentage,
    Fixed,
}

impl FeeMode {
    /// Stable string identifier used in JSON output and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            FeeMode::None => "none",
            FeeMode::Percentage => "percentage",
            FeeMode::Fixed => "fixed",
        }
    }

    /// Human-readable name used in messages.
    pub fn label(&self) -> &'static str {
        match self {
            FeeMode::None => "no fee",
            FeeMode::Percentage => "percentage",
            FeeMode::Fixed => "fixed amount",
        }
    }

    /// Whether the fee value entry is consulted at all.
    pub fn uses_fee_value(&self) -> bool {
        matches!(self, FeeMode::Percentage | FeeMode::Fixed)
    }
}

impl Display for FeeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(FeeMode::None),
            "percentage" | "percent" | "%" => Ok(FeeMode::Percentage),
            "fixed" => Ok(FeeMode::Fixed),
            other => Err(format!(
                "unsupported fee mode '{other}', expected none, percentage or fixed"
            )),
        }
    }
}

/// Raw form state, exactly as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInput {
    pub amount_text: String,
    pub fee_mode: FeeMode,
    pub fee_value_text: String,
}

impl TransactionInput {
    pub fn new(
        amount_text: impl Into<String>,
        fee_mode: FeeMode,
        fee_value_text: impl Into<String>,
    ) -> Self {
        Self {
            amount_text: amount_text.into(),
            fee_mode,
            fee_value_text: fee_value_text.into(),
        }
    }

    /// Live preview of the current entry. Pure; call it after every edit.
    pub fn breakdown(&self) -> TransactionBreakdown {
        calculator::compute(&self.amount_text, self.fee_mode, &self.fee_value_text)
    }

    /// Back to an empty form with no fee.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Numeric breakdown derived from a [`TransactionInput`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionBreakdown {
    pub original_amount: Decimal,
    pub fee: Decimal,
    /// Always integral: the wire format has no fractional unit.
    pub total: Decimal,
}

impl TransactionBreakdown {
    /// True when the amount entry did not yield a positive number.
    pub fn is_empty(&self) -> bool {
        self.original_amount <= Decimal::ZERO
    }
}

/// Breakdown frozen at submit time, shown next to the generated code even if
/// the form changes afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub original_amount: Decimal,
    pub fee: Decimal,
    pub total: u64,
}
