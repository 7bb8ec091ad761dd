use std::io::{self, IsTerminal, Write};
use std::time::Duration;

use colored::Colorize;
use comfy_table::{presets::ASCII_BORDERS_ONLY, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};

use crate::output::{BreakdownSummary, CommandOutput, OutputError, OutputHandler, QrPanel};

const SPINNER_TICKS: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const SPINNER_TICK_MS: u64 = 80;

pub struct OperatorOutput {
    quiet: bool,
    no_color: bool,
    spinner: Option<ProgressBar>,
}

impl OperatorOutput {
    pub fn new(quiet: bool, no_color: bool) -> Self {
        Self {
            quiet,
            no_color,
            spinner: None,
        }
    }

    fn success_text(&self, text: &str) -> String {
        if self.no_color {
            text.to_string()
        } else {
            text.green().to_string()
        }
    }

    fn accent_text(&self, text: &str) -> String {
        if self.no_color {
            text.to_string()
        } else {
            text.bright_blue().bold().to_string()
        }
    }

    fn error_text(&self, text: &str) -> String {
        if self.no_color {
            text.to_string()
        } else {
            text.red().to_string()
        }
    }

    fn start_spinner(&mut self, operation: &str) {
        if self.quiet {
            return;
        }
        self.stop_spinner();

        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&SPINNER_TICKS);
        spinner.set_style(style);
        spinner.set_message(format!("{operation}..."));
        spinner.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
        self.spinner = Some(spinner);
    }

    fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    pub fn is_confirmation_accepted(input: &str) -> bool {
        matches!(input.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }

    pub fn render_breakdown_table(summary: &BreakdownSummary) -> String {
        let mut table = Table::new();
        table
            .load_preset(ASCII_BORDERS_ONLY)
            .set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["Original amount", "Service fee", "Fee mode", "Total payment"]);
        table.add_row(vec![
            summary.original_amount.as_str(),
            summary.fee.as_str(),
            summary.fee_mode.as_str(),
            summary.total.as_str(),
        ]);
        table.to_string()
    }

    pub fn render_qr_panel(panel: &QrPanel) -> String {
        let mut table = Table::new();
        table
            .load_preset(ASCII_BORDERS_ONLY)
            .set_content_arrangement(ContentArrangement::Dynamic);
        table.add_row(vec!["QR image", panel.image_url.as_str()]);
        table.add_row(vec!["Original amount", panel.original_amount.as_str()]);
        table.add_row(vec!["Service fee", panel.fee.as_str()]);
        table.add_row(vec!["Total paid", panel.total.as_str()]);
        if let Some(payload) = &panel.payload {
            table.add_row(vec!["QRIS payload", payload.as_str()]);
        }
        table.to_string()
    }

    fn suggestion_for_error(error: &str) -> &'static str {
        let lowered = error.to_ascii_lowercase();
        if lowered.contains("amount") {
            "Suggestion: enter a positive amount of at most 12 digits."
        } else if lowered.contains("fee") {
            "Suggestion: enter a positive fee value (percentages up to 100)."
        } else if lowered.contains("timed out") || lowered.contains("reach") {
            "Suggestion: check your connection or the --endpoint value and retry."
        } else {
            "Suggestion: review the entry and retry."
        }
    }

    pub fn format_error(error: &str) -> String {
        format!("{error}\n  {}", Self::suggestion_for_error(error))
    }
}

impl OutputHandler for OperatorOutput {
    fn start_operation(&mut self, operation: &str) {
        self.start_spinner(operation);
    }

    fn progress(&mut self, message: &str) {
        if self.quiet {
            return;
        }

        if let Some(spinner) = &self.spinner {
            spinner.set_message(message.to_string());
        } else {
            println!("{message}");
        }
    }

    fn display_breakdown(&mut self, summary: &BreakdownSummary) {
        if self.quiet {
            return;
        }

        self.stop_spinner();
        println!("{}", Self::render_breakdown_table(summary));
    }

    fn display_error(&mut self, message: &str) {
        self.stop_spinner();
        eprintln!("{}", self.error_text(&Self::format_error(message)));
    }

    fn confirm_proceed(&mut self, prompt: &str) -> Result<bool, OutputError> {
        let answer = self.prompt_line(&format!("{prompt} [y/N]"))?;
        Ok(Self::is_confirmation_accepted(&answer))
    }

    fn prompt_line(&mut self, prompt: &str) -> Result<String, OutputError> {
        if !io::stdin().is_terminal() {
            return Err(OutputError::StdinBlocked);
        }
        self.stop_spinner();

        print!("{prompt}: ");
        io::stdout().flush().map_err(OutputError::Io)?;

        let mut input = String::new();
        io::stdin().read_line(&mut input).map_err(OutputError::Io)?;
        Ok(input.trim().to_string())
    }

    fn display_qr_panel(&mut self, panel: &QrPanel) {
        self.stop_spinner();
        println!("{}", self.accent_text("QRIS ready to use!"));
        println!("{}", Self::render_qr_panel(panel));
        if !self.quiet {
            println!("Scan the QR code with your payment app.");
        }
    }

    fn complete(&mut self, output: &CommandOutput) {
        self.stop_spinner();

        if output.ok {
            println!("{}", self.success_text(&output.message));
        } else {
            eprintln!("{}", self.error_text(&Self::format_error(&output.message)));
        }

        if self.quiet {
            return;
        }
        for detail in &output.details {
            println!("{detail}");
        }
    }
}
