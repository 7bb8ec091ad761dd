use serde::Serialize;

#[derive(Debug)]
pub enum OutputError {
    StdinBlocked,
    Io(std::io::Error),
}

/// Amount breakdown as shown in the preview table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakdownSummary {
    pub fee_mode: String,
    pub original_amount: String,
    pub fee: String,
    pub total: String,
}

/// What the success panel shows next to the generated code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QrPanel {
    pub image_url: String,
    pub original_amount: String,
    pub fee: String,
    pub total: String,
    pub payload: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommandOutput {
    pub ok: bool,
    pub command: String,
    pub message: String,
    pub details: Vec<String>,
    pub payload: Option<serde_json::Value>,
}

impl CommandOutput {
    pub fn success(
        command: &str,
        message: impl Into<String>,
        details: Vec<String>,
        payload: Option<serde_json::Value>,
    ) -> Self {
        Self {
            ok: true,
            command: command.to_string(),
            message: message.into(),
            details,
            payload,
        }
    }
}

pub trait OutputHandler {
    fn start_operation(&mut self, operation: &str);
    fn progress(&mut self, message: &str);
    fn display_breakdown(&mut self, summary: &BreakdownSummary);
    fn display_error(&mut self, message: &str);
    fn confirm_proceed(&mut self, prompt: &str) -> Result<bool, OutputError>;
    fn prompt_line(&mut self, prompt: &str) -> Result<String, OutputError>;
    fn display_qr_panel(&mut self, panel: &QrPanel);
    fn complete(&mut self, output: &CommandOutput);
}
