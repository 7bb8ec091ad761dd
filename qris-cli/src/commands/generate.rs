use qris_core::{
    format_rupiah, truncate_payload, validate_submission, GenerationResult, QrisGateway, Workflow,
};
use rust_decimal::Decimal;
use serde_json::json;

use crate::commands::{
    breakdown_summary, maybe_confirm, now_timestamp, record_to_agent_result, EntryArgs,
};
use crate::output::{CommandOutput, OutputHandler, QrPanel};
use crate::CliError;

/// Characters kept at each end of the payload in the success panel.
const PAYLOAD_PREVIEW_CHARS: usize = 16;

#[derive(Debug, Clone, Copy, Default)]
pub struct GenerateOptions {
    pub force: bool,
    pub show_payload: bool,
}

/// Preview, confirm, then run one submission through `workflow`.
pub async fn run(
    entry: &EntryArgs,
    options: GenerateOptions,
    gateway: &dyn QrisGateway,
    workflow: &mut Workflow,
    output: &mut dyn OutputHandler,
) -> Result<CommandOutput, CliError> {
    let input = entry.to_input();
    let breakdown = input.breakdown();
    output.display_breakdown(&breakdown_summary(input.fee_mode, &breakdown));

    // Invalid entries go straight to the workflow, which records the rejection.
    if validate_submission(&input, &breakdown).is_ok() {
        maybe_confirm(
            output,
            options.force,
            &format!("Generate QRIS for {}?", format_rupiah(breakdown.total)),
        )?;
    }

    let pending = workflow.begin(&input)?;
    output.start_operation("Generating QRIS");
    output.progress(&format!(
        "requesting QRIS for {}",
        format_rupiah(Decimal::from(pending.nominal))
    ));

    let outcome = gateway.request_qris(pending.nominal).await;
    let failure = outcome.as_ref().err().cloned();

    let (image_url, encoded_payload, api_nominal, message) = match workflow.complete(outcome)? {
        GenerationResult::Success {
            image_url,
            encoded_payload,
            nominal,
            message,
        } => (
            image_url.clone(),
            encoded_payload.clone(),
            nominal.clone(),
            message.clone(),
        ),
        GenerationResult::Failure { message, .. } => {
            return Err(failure
                .map(CliError::from)
                .unwrap_or_else(|| CliError::Internal(message.clone())));
        }
    };

    let record = pending.record;
    output.display_qr_panel(&QrPanel {
        image_url: image_url.clone(),
        original_amount: format_rupiah(record.original_amount),
        fee: format_rupiah(record.fee),
        total: format_rupiah(Decimal::from(record.total)),
        payload: options
            .show_payload
            .then(|| truncate_payload(&encoded_payload, PAYLOAD_PREVIEW_CHARS)),
    });

    let mut result = json!({
        "imageUrl": image_url,
        "nominal": api_nominal,
        "message": message,
        "breakdown": record_to_agent_result(input.fee_mode, &record),
    });
    if options.show_payload {
        result["encodedPayload"] = json!(encoded_payload);
    }

    Ok(CommandOutput::success(
        "generate",
        message,
        Vec::new(),
        Some(json!({
            "timestamp": now_timestamp(),
            "state": workflow.state(),
            "result": result,
        })),
    ))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use qris_core::{FeeMode, GenerationError, QrisSuccess, RequestState, ValidationError};

    use super::*;
    use crate::output::{BreakdownSummary, OutputError};

    struct FixedGateway {
        calls: AtomicUsize,
        outcome: Result<QrisSuccess, GenerationError>,
    }

    impl FixedGateway {
        fn new(outcome: Result<QrisSuccess, GenerationError>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                outcome,
            }
        }

        fn ok() -> Self {
            Self::new(Ok(QrisSuccess {
                nominal: "10250".to_string(),
                link_qris: "https://x/qr.png".to_string(),
                converted_qris: "00020101021226570011ID.DANA.WWW6304ABCD".to_string(),
            }))
        }
    }

    #[async_trait]
    impl QrisGateway for FixedGateway {
        async fn request_qris(&self, _nominal: u64) -> Result<QrisSuccess, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }
    }

    struct ScriptedOutput {
        confirm: bool,
        confirm_calls: usize,
        panels: Vec<QrPanel>,
    }

    impl ScriptedOutput {
        fn answering(confirm: bool) -> Self {
            Self {
                confirm,
                confirm_calls: 0,
                panels: Vec::new(),
            }
        }
    }

    impl OutputHandler for ScriptedOutput {
        fn start_operation(&mut self, _operation: &str) {}
        fn progress(&mut self, _message: &str) {}
        fn display_breakdown(&mut self, _summary: &BreakdownSummary) {}
        fn display_error(&mut self, _message: &str) {}
        fn confirm_proceed(&mut self, _prompt: &str) -> Result<bool, OutputError> {
            self.confirm_calls += 1;
            Ok(self.confirm)
        }
        fn prompt_line(&mut self, _prompt: &str) -> Result<String, OutputError> {
            Err(OutputError::StdinBlocked)
        }
        fn display_qr_panel(&mut self, panel: &QrPanel) {
            self.panels.push(panel.clone());
        }
        fn complete(&mut self, _output: &CommandOutput) {}
    }

    fn entry(amount: &str, fee_mode: FeeMode, fee_value: &str) -> EntryArgs {
        EntryArgs {
            amount: amount.to_string(),
            fee_mode,
            fee_value: fee_value.to_string(),
        }
    }

    #[tokio::test]
    async fn success_renders_panel_with_snapshot() {
        let gateway = FixedGateway::ok();
        let mut workflow = Workflow::new();
        let mut output = ScriptedOutput::answering(true);
        let options = GenerateOptions {
            force: false,
            show_payload: true,
        };

        let result = run(
            &entry("10000", FeeMode::Percentage, "2.5"),
            options,
            &gateway,
            &mut workflow,
            &mut output,
        )
        .await
        .unwrap();

        assert!(result.ok);
        assert_eq!(result.message, "QRIS generated for a total payment of Rp10.250.");
        assert_eq!(output.confirm_calls, 1);
        assert_eq!(workflow.state(), RequestState::Succeeded);

        let panel = &output.panels[0];
        assert_eq!(panel.image_url, "https://x/qr.png");
        assert_eq!(panel.fee, "Rp250");
        assert_eq!(panel.total, "Rp10.250");
        assert!(panel.payload.as_deref().unwrap().contains("..."));

        let payload = result.payload.unwrap();
        assert_eq!(payload["state"], "succeeded");
        assert_eq!(payload["result"]["breakdown"]["total"], "10250");
        assert!(payload["result"]["encodedPayload"].is_string());
    }

    #[tokio::test]
    async fn force_skips_confirmation_and_hides_payload_by_default() {
        let gateway = FixedGateway::ok();
        let mut workflow = Workflow::new();
        let mut output = ScriptedOutput::answering(false);
        let options = GenerateOptions {
            force: true,
            show_payload: false,
        };

        let result = run(
            &entry("10000", FeeMode::None, ""),
            options,
            &gateway,
            &mut workflow,
            &mut output,
        )
        .await
        .unwrap();

        assert_eq!(output.confirm_calls, 0);
        assert!(output.panels[0].payload.is_none());
        assert!(result.payload.unwrap()["result"].get("encodedPayload").is_none());
    }

    #[tokio::test]
    async fn declined_confirmation_sends_nothing() {
        let gateway = FixedGateway::ok();
        let mut workflow = Workflow::new();
        let mut output = ScriptedOutput::answering(false);

        let err = run(
            &entry("10000", FeeMode::None, ""),
            GenerateOptions::default(),
            &gateway,
            &mut workflow,
            &mut output,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, CliError::ConfirmationRequired));
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
        assert_eq!(workflow.state(), RequestState::Idle);
    }

    #[tokio::test]
    async fn invalid_entry_is_rejected_without_prompt_or_request() {
        let gateway = FixedGateway::ok();
        let mut workflow = Workflow::new();
        let mut output = ScriptedOutput::answering(true);

        let err = run(
            &entry("10000", FeeMode::Percentage, "101"),
            GenerateOptions::default(),
            &gateway,
            &mut workflow,
            &mut output,
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            CliError::Validation(ValidationError::PercentageTooHigh)
        ));
        assert_eq!(output.confirm_calls, 0);
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
        assert_eq!(workflow.state(), RequestState::Failed);
    }

    #[tokio::test]
    async fn remote_failure_keeps_typed_error() {
        let gateway = FixedGateway::new(Err(GenerationError::Protocol(
            "invalid or unsuccessful API response".to_string(),
        )));
        let mut workflow = Workflow::new();
        let mut output = ScriptedOutput::answering(true);
        let options = GenerateOptions {
            force: true,
            show_payload: false,
        };

        let err = run(
            &entry("5000", FeeMode::Fixed, "500"),
            options,
            &gateway,
            &mut workflow,
            &mut output,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, CliError::Generation(GenerationError::Protocol(_))));
        assert_eq!(workflow.state(), RequestState::Failed);
        assert!(output.panels.is_empty());
    }
}
