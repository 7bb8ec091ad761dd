use std::str::FromStr;

use qris_core::{
    format_rupiah, truncate_payload, FeeMode, GenerationResult, QrisGateway, TransactionInput,
    Workflow,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use crate::commands::{breakdown_summary, now_timestamp};
use crate::output::{CommandOutput, OutputHandler, QrPanel};
use crate::CliError;

const PAYLOAD_PREVIEW_CHARS: usize = 16;

fn prompt_fee_mode(output: &mut dyn OutputHandler) -> Result<FeeMode, CliError> {
    loop {
        let answer = output.prompt_line("Fee mode [none/percentage/fixed]")?;
        if answer.is_empty() {
            return Ok(FeeMode::None);
        }
        match FeeMode::from_str(&answer) {
            Ok(mode) => return Ok(mode),
            Err(message) => output.display_error(&message),
        }
    }
}

/// Fill the form one entry at a time, previewing after each change.
fn read_entry(
    output: &mut dyn OutputHandler,
    input: &mut TransactionInput,
) -> Result<(), CliError> {
    input.amount_text = output.prompt_line("Transaction amount (Rp)")?;
    output.display_breakdown(&breakdown_summary(input.fee_mode, &input.breakdown()));

    input.fee_mode = prompt_fee_mode(output)?;
    if input.fee_mode.uses_fee_value() {
        let prompt = match input.fee_mode {
            FeeMode::Percentage => "Fee percentage (%)",
            _ => "Fixed fee (Rp)",
        };
        input.fee_value_text = output.prompt_line(prompt)?;
    }
    output.display_breakdown(&breakdown_summary(input.fee_mode, &input.breakdown()));
    Ok(())
}

fn show_outcome(
    output: &mut dyn OutputHandler,
    workflow: &Workflow,
    result: &GenerationResult,
    show_payload: bool,
) -> Value {
    match result {
        GenerationResult::Success {
            image_url,
            encoded_payload,
            message,
            ..
        } => {
            if let Some(record) = workflow.record() {
                output.display_qr_panel(&QrPanel {
                    image_url: image_url.clone(),
                    original_amount: format_rupiah(record.original_amount),
                    fee: format_rupiah(record.fee),
                    total: format_rupiah(Decimal::from(record.total)),
                    payload: show_payload
                        .then(|| truncate_payload(encoded_payload, PAYLOAD_PREVIEW_CHARS)),
                });
            }
            output.progress(message);
            json!({ "ok": true, "imageUrl": image_url, "message": message })
        }
        GenerationResult::Failure { kind, message } => {
            output.display_error(message);
            json!({ "ok": false, "kind": kind, "message": message })
        }
    }
}

/// Prompt loop over one reused [`Workflow`]; every submit starts from a clean result.
pub async fn run(
    gateway: &dyn QrisGateway,
    workflow: &mut Workflow,
    show_payload: bool,
    output: &mut dyn OutputHandler,
) -> Result<CommandOutput, CliError> {
    let mut input = TransactionInput::default();
    let mut outcomes = Vec::new();

    loop {
        read_entry(output, &mut input)?;

        if output.confirm_proceed("Generate QRIS?")? {
            output.start_operation("Generating QRIS");
            let result = workflow.submit(&input, gateway).await?.clone();
            tracing::debug!(state = workflow.state().as_str(), "interactive submission finished");
            outcomes.push(show_outcome(output, workflow, &result, show_payload));
        }

        if !output.confirm_proceed("Create another transaction?")? {
            break;
        }
        input.reset();
    }

    let generated = outcomes
        .iter()
        .filter(|outcome| outcome["ok"] == Value::Bool(true))
        .count();

    Ok(CommandOutput::success(
        "interactive",
        format!("session finished: {generated} of {} submissions generated", outcomes.len()),
        Vec::new(),
        Some(json!({
            "timestamp": now_timestamp(),
            "state": workflow.state(),
            "result": {
                "submissions": outcomes.len(),
                "generated": generated,
                "outcomes": outcomes,
            },
        })),
    ))
}
