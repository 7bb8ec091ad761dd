pub mod generate;
pub mod interactive;
pub mod preview;

use chrono::{SecondsFormat, Utc};
use clap::Args;
use qris_core::{
    format_rupiah, validate_submission, FeeMode, TransactionBreakdown, TransactionInput,
    TransactionRecord,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use crate::output::{BreakdownSummary, OutputHandler};
use crate::CliError;

/// The three form entries, as flags.
#[derive(Debug, Clone, Default, Args)]
pub struct EntryArgs {
    /// Transaction amount before fees
    #[arg(long, default_value = "")]
    pub amount: String,

    /// none, percentage or fixed
    #[arg(long = "fee-mode", default_value_t = FeeMode::None)]
    pub fee_mode: FeeMode,

    /// Percentage (0-100] or fixed rupiah amount, depending on --fee-mode
    #[arg(long = "fee-value", default_value = "")]
    pub fee_value: String,
}

impl EntryArgs {
    pub fn to_input(&self) -> TransactionInput {
        TransactionInput::new(self.amount.as_str(), self.fee_mode, self.fee_value.as_str())
    }
}

pub(crate) fn maybe_confirm(
    output: &mut dyn OutputHandler,
    force: bool,
    prompt: &str,
) -> Result<(), CliError> {
    if force {
        return Ok(());
    }

    match output.confirm_proceed(prompt) {
        Ok(true) => Ok(()),
        Ok(false) => Err(CliError::ConfirmationRequired),
        Err(err) => Err(err.into()),
    }
}

pub(crate) fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn plain_amount(value: Decimal) -> String {
    value.normalize().to_string()
}

pub(crate) fn breakdown_summary(
    fee_mode: FeeMode,
    breakdown: &TransactionBreakdown,
) -> BreakdownSummary {
    BreakdownSummary {
        fee_mode: fee_mode.label().to_string(),
        original_amount: format_rupiah(breakdown.original_amount),
        fee: format_rupiah(breakdown.fee),
        total: format_rupiah(breakdown.total),
    }
}

pub(crate) fn breakdown_to_agent_result(
    input: &TransactionInput,
    breakdown: &TransactionBreakdown,
) -> Value {
    let issue = validate_submission(input, breakdown).err().map(|err| {
        json!({
            "code": err.code(),
            "message": err.to_string(),
        })
    });

    json!({
        "feeMode": input.fee_mode.as_str(),
        "originalAmount": plain_amount(breakdown.original_amount),
        "fee": plain_amount(breakdown.fee),
        "total": plain_amount(breakdown.total),
        "submittable": issue.is_none(),
        "issue": issue,
    })
}

pub(crate) fn record_to_agent_result(fee_mode: FeeMode, record: &TransactionRecord) -> Value {
    json!({
        "feeMode": fee_mode.as_str(),
        "originalAmount": plain_amount(record.original_amount),
        "fee": plain_amount(record.fee),
        "total": record.total.to_string(),
    })
}
