use qris_core::{validate_submission, RequestState};
use serde_json::json;

use crate::commands::{breakdown_summary, breakdown_to_agent_result, now_timestamp, EntryArgs};
use crate::output::{CommandOutput, OutputHandler};

/// Live preview of the entry. Bad input shows zeros instead of failing.
pub fn run(entry: &EntryArgs, output: &mut dyn OutputHandler) -> CommandOutput {
    let input = entry.to_input();
    let breakdown = input.breakdown();
    tracing::debug!(
        fee_mode = input.fee_mode.as_str(),
        total = %breakdown.total,
        "preview computed"
    );

    output.display_breakdown(&breakdown_summary(input.fee_mode, &breakdown));

    let details = match validate_submission(&input, &breakdown) {
        Ok(_) => Vec::new(),
        Err(err) => vec![format!("Not ready to generate: {err}")],
    };

    CommandOutput::success(
        "preview",
        "preview computed",
        details,
        Some(json!({
            "timestamp": now_timestamp(),
            "state": RequestState::Idle,
            "result": breakdown_to_agent_result(&input, &breakdown),
        })),
    )
}
