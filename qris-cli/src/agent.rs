use qris_core::RequestState;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::output::{BreakdownSummary, CommandOutput, OutputError, OutputHandler, QrPanel};

const EPOCH_TIMESTAMP: &str = "1970-01-01T00:00:00Z";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentError {
    pub code: u16,
    pub name: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// JSON envelope printed once per invocation in agent mode.
///
/// `request_state` is where the generation workflow ended up; it is absent
/// for failures that happen before a workflow exists (usage, config).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub success: bool,
    pub qris_version: String,
    pub mode: String,
    pub operation: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_state: Option<RequestState>,
    pub result: Option<Value>,
    pub error: Option<AgentError>,
}

#[derive(Debug, Default)]
pub struct AgentOutputHandler;

impl AgentOutputHandler {
    pub fn new() -> Self {
        Self
    }
}

fn payload_field<'a>(output: &'a CommandOutput, key: &str) -> Option<&'a Value> {
    output
        .payload
        .as_ref()
        .and_then(|payload| payload.get(key))
        .filter(|value| !value.is_null())
}

fn internal_error(output: &CommandOutput) -> AgentError {
    AgentError {
        code: 9999,
        name: "INTERNAL_ERROR".to_string(),
        message: output.message.clone(),
        details: (!output.details.is_empty()).then(|| json!({ "messages": output.details })),
    }
}

pub(crate) fn build_agent_response(output: &CommandOutput) -> AgentResponse {
    let timestamp = payload_field(output, "timestamp")
        .and_then(Value::as_str)
        .unwrap_or(EPOCH_TIMESTAMP)
        .to_string();

    let request_state = payload_field(output, "state")
        .and_then(|value| serde_json::from_value::<RequestState>(value.clone()).ok());

    let error = payload_field(output, "error")
        .and_then(|value| serde_json::from_value::<AgentError>(value.clone()).ok())
        .or_else(|| (!output.ok).then(|| internal_error(output)));

    AgentResponse {
        success: output.ok,
        qris_version: env!("CARGO_PKG_VERSION").to_string(),
        mode: "agent".to_string(),
        operation: output.command.clone(),
        timestamp,
        request_state,
        result: payload_field(output, "result").cloned(),
        error,
    }
}

/// Rebuild every object with its keys in byte order, whatever map type
/// serde_json was compiled with.
fn with_sorted_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, with_sorted_keys(value)))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(values) => Value::Array(values.into_iter().map(with_sorted_keys).collect()),
        other => other,
    }
}

pub(crate) fn render_agent_json(output: &CommandOutput) -> Result<String, serde_json::Error> {
    let value = serde_json::to_value(build_agent_response(output))?;
    serde_json::to_string_pretty(&with_sorted_keys(value))
}

/// Minimal envelope for when the real one cannot be serialized.
fn serialization_failure(output: &CommandOutput, err: &serde_json::Error) -> Value {
    json!({
        "error": {
            "code": 9999,
            "message": format!("serialization failed: {err}"),
            "name": "INTERNAL_ERROR",
        },
        "mode": "agent",
        "operation": output.command,
        "qris_version": env!("CARGO_PKG_VERSION"),
        "result": null,
        "success": false,
        "timestamp": EPOCH_TIMESTAMP,
    })
}

impl OutputHandler for AgentOutputHandler {
    fn start_operation(&mut self, _operation: &str) {}

    fn progress(&mut self, _message: &str) {}

    fn display_breakdown(&mut self, _summary: &BreakdownSummary) {}

    fn display_error(&mut self, _message: &str) {}

    fn confirm_proceed(&mut self, _prompt: &str) -> Result<bool, OutputError> {
        Ok(true)
    }

    fn prompt_line(&mut self, _prompt: &str) -> Result<String, OutputError> {
        Err(OutputError::StdinBlocked)
    }

    fn display_qr_panel(&mut self, _panel: &QrPanel) {}

    fn complete(&mut self, output: &CommandOutput) {
        match render_agent_json(output) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("{}", serialization_failure(output, &err)),
        }
    }
}
