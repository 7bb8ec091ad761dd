mod agent;
mod commands;
mod mode;
mod operator;
mod output;

use std::time::Duration;

use clap::{error::ErrorKind, Parser, Subcommand, ValueEnum};
use qris_core::config::{DEFAULT_ENDPOINT, DEFAULT_QRIS_DATA, DEFAULT_TIMEOUT};
use qris_core::{
    GenerationError, QrisClient, QrisConfig, QrisError, RequestState, ValidationError, Workflow,
    WorkflowError,
};
use serde_json::json;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use commands::generate::GenerateOptions;
use commands::EntryArgs;
use mode::Mode;
use output::{CommandOutput, OutputError, OutputHandler};

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "qris", version, about = "Dynamic QRIS generator with fee preview")]
struct Cli {
    #[arg(long = "output", value_enum, global = true)]
    output_format: Option<OutputFormat>,

    #[arg(long, global = true)]
    interactive: bool,

    /// Skip the confirmation prompt before generating
    #[arg(long, global = true)]
    force: bool,

    #[arg(long, global = true)]
    quiet: bool,

    #[arg(long = "no-color", global = true)]
    no_color: bool,

    /// Logging level (overridden by RUST_LOG)
    #[arg(long = "log-level", global = true, default_value = "warn")]
    log_level: Level,

    /// QRIS generator API endpoint
    #[arg(long, global = true, env = "QRIS_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Static merchant QRIS payload sent with every request
    #[arg(
        long = "qris-data",
        global = true,
        env = "QRIS_STATIC_PAYLOAD",
        default_value = DEFAULT_QRIS_DATA,
        hide_default_value = true
    )]
    qris_data: String,

    /// Request timeout in seconds
    #[arg(
        long = "timeout-secs",
        global = true,
        env = "QRIS_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT.as_secs()
    )]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Subcommand)]
enum Commands {
    /// Show the fee and total for an entry without contacting the API
    Preview {
        #[command(flatten)]
        entry: EntryArgs,
    },
    /// Validate an entry and request a dynamic QRIS for its total
    Generate {
        #[command(flatten)]
        entry: EntryArgs,
        /// Include the encoded QRIS payload in the output
        #[arg(long = "show-payload")]
        show_payload: bool,
    },
    /// Fill in the form step by step and generate repeatedly
    Interactive {
        #[arg(long = "show-payload")]
        show_payload: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExitCode {
    Success = 0,
    ValidationError = 1,
    ConfigError = 2,
    RemoteError = 3,
    InternalError = 4,
    ConfirmationRequired = 10,
    StdinBlocked = 11,
}

impl ExitCode {
    const fn as_i32(self) -> i32 {
        self as i32
    }
}

#[derive(Debug)]
enum CliError {
    Validation(ValidationError),
    Generation(GenerationError),
    Config(String),
    Usage { code: u16, message: String },
    ConfirmationRequired,
    StdinBlocked,
    Internal(String),
}

impl From<ValidationError> for CliError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<GenerationError> for CliError {
    fn from(value: GenerationError) -> Self {
        match value {
            GenerationError::Validation(err) => Self::Validation(err),
            other => Self::Generation(other),
        }
    }
}

impl From<WorkflowError> for CliError {
    fn from(value: WorkflowError) -> Self {
        match value {
            WorkflowError::Rejected(err) => Self::Validation(err),
            WorkflowError::Busy | WorkflowError::NotInFlight => Self::Internal(value.to_string()),
        }
    }
}

impl From<QrisError> for CliError {
    fn from(value: QrisError) -> Self {
        match value {
            QrisError::Config(message) => Self::Config(message),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<OutputError> for CliError {
    fn from(value: OutputError) -> Self {
        match value {
            OutputError::StdinBlocked => Self::StdinBlocked,
            OutputError::Io(err) => Self::Internal(err.to_string()),
        }
    }
}

fn build_output_handler(mode: Mode, quiet: bool, no_color: bool) -> Box<dyn OutputHandler> {
    match mode {
        Mode::Operator => Box::new(operator::OperatorOutput::new(quiet, no_color)),
        Mode::Agent => Box::new(agent::AgentOutputHandler::new()),
    }
}

fn build_config(cli: &Cli) -> QrisConfig {
    QrisConfig::default()
        .with_endpoint(cli.endpoint.as_str())
        .with_qris_data(cli.qris_data.as_str())
        .with_timeout(Duration::from_secs(cli.timeout_secs))
}

fn init_tracing(level: Level) {
    let default_filter = level.as_str().to_ascii_lowercase();
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{default_filter},hyper=warn,reqwest=warn")));

    // stdout is reserved for command output.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn command_label(command: &Commands) -> &'static str {
    match command {
        Commands::Preview { .. } => "preview",
        Commands::Generate { .. } => "generate",
        Commands::Interactive { .. } => "interactive",
    }
}

fn detect_mode_from_raw_args(args: &[String]) -> Mode {
    let mut output_json = false;
    let mut interactive = false;

    let mut index = 1;
    while index < args.len() {
        let arg = &args[index];
        if arg == "--interactive" {
            interactive = true;
            index += 1;
            continue;
        }
        if arg == "--output" {
            if args
                .get(index + 1)
                .is_some_and(|value| value.eq_ignore_ascii_case("json"))
            {
                output_json = true;
            }
            index += 2;
            continue;
        }
        if arg.eq_ignore_ascii_case("--output=json") {
            output_json = true;
        }
        index += 1;
    }

    mode::detect_mode(output_json, interactive)
}

fn infer_operation_from_raw_args(args: &[String]) -> &'static str {
    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "preview" => return "preview",
            "generate" => return "generate",
            "interactive" => return "interactive",
            _ => {}
        }
    }
    "qris"
}

fn clap_error_to_cli_error(err: &clap::Error) -> CliError {
    let code = match err.kind() {
        ErrorKind::MissingRequiredArgument | ErrorKind::MissingSubcommand => 2001,
        ErrorKind::ArgumentConflict
        | ErrorKind::UnknownArgument
        | ErrorKind::InvalidValue
        | ErrorKind::ValueValidation
        | ErrorKind::TooManyValues => 2002,
        _ => 2001,
    };
    CliError::Usage {
        code,
        message: err.to_string().trim().to_string(),
    }
}

async fn dispatch(cli: &Cli, output: &mut dyn OutputHandler) -> Result<CommandOutput, CliError> {
    match &cli.command {
        Commands::Preview { entry } => Ok(commands::preview::run(entry, output)),
        Commands::Generate {
            entry,
            show_payload,
        } => {
            let client = QrisClient::new(&build_config(cli))?;
            let mut workflow = Workflow::new();
            let options = GenerateOptions {
                force: cli.force,
                show_payload: *show_payload,
            };
            commands::generate::run(entry, options, &client, &mut workflow, output).await
        }
        Commands::Interactive { show_payload } => {
            let client = QrisClient::new(&build_config(cli))?;
            let mut workflow = Workflow::new();
            commands::interactive::run(&client, &mut workflow, *show_payload, output).await
        }
    }
}

fn validation_code(err: &ValidationError) -> u16 {
    match err {
        ValidationError::AmountRequired => 1001,
        ValidationError::AmountTooLarge => 1002,
        ValidationError::FeeValueInvalid { .. } => 1003,
        ValidationError::PercentageTooHigh => 1004,
        ValidationError::TotalOutOfRange => 1005,
        ValidationError::TotalTooSmall => 1006,
    }
}

fn generation_code(err: &GenerationError) -> u16 {
    match err {
        GenerationError::Validation(inner) => validation_code(inner),
        GenerationError::Transport { .. } => 3001,
        GenerationError::Protocol(_) => 3002,
        GenerationError::Unknown(_) => 3003,
    }
}

fn exit_code_for_error(err: &CliError) -> ExitCode {
    match err {
        CliError::Validation(_) => ExitCode::ValidationError,
        CliError::Generation(GenerationError::Validation(_)) => ExitCode::ValidationError,
        CliError::Generation(_) => ExitCode::RemoteError,
        CliError::Config(_) | CliError::Usage { .. } => ExitCode::ConfigError,
        CliError::ConfirmationRequired => ExitCode::ConfirmationRequired,
        CliError::StdinBlocked => ExitCode::StdinBlocked,
        CliError::Internal(_) => ExitCode::InternalError,
    }
}

fn error_name_for_code(code: u16) -> &'static str {
    match code {
        1001 => "AMOUNT_REQUIRED",
        1002 => "AMOUNT_TOO_LARGE",
        1003 => "FEE_VALUE_INVALID",
        1004 => "FEE_PERCENT_TOO_HIGH",
        1005 => "TOTAL_OUT_OF_RANGE",
        1006 => "TOTAL_TOO_SMALL",
        2001 => "MISSING_REQUIRED_ARGUMENT",
        2002 => "INVALID_ARGUMENT",
        2003 => "CONFIRMATION_REQUIRED",
        2004 => "STDIN_BLOCKED",
        2005 => "INVALID_CONFIGURATION",
        3001 => "TRANSPORT_FAILED",
        3002 => "PROTOCOL_ERROR",
        3003 => "UNKNOWN_RESPONSE",
        _ => "INTERNAL_ERROR",
    }
}

fn agent_error(code: u16, message: String, details: serde_json::Value) -> agent::AgentError {
    agent::AgentError {
        code,
        name: error_name_for_code(code).to_string(),
        message,
        details: Some(details),
    }
}

fn cli_error_to_agent_error(err: &CliError) -> agent::AgentError {
    match err {
        CliError::Validation(validation) => agent_error(
            validation_code(validation),
            validation.to_string(),
            json!({ "rule": validation.code() }),
        ),
        CliError::Generation(generation) => {
            let status = match generation {
                GenerationError::Transport { status, .. } => *status,
                _ => None,
            };
            agent_error(
                generation_code(generation),
                generation.to_string(),
                json!({ "kind": generation.kind(), "status": status }),
            )
        }
        CliError::Config(message) => agent_error(
            2005,
            message.clone(),
            json!({ "hint": "Check --endpoint, --qris-data and --timeout-secs or their QRIS_* variables." }),
        ),
        CliError::Usage { code, message } => {
            agent_error(*code, message.clone(), json!({ "raw": message }))
        }
        CliError::ConfirmationRequired => agent_error(
            2003,
            "confirmation required".to_string(),
            json!({ "hint": "Re-run with --force for non-interactive execution." }),
        ),
        CliError::StdinBlocked => agent_error(
            2004,
            "stdin is not available for prompts".to_string(),
            json!({ "hint": "Use the preview or generate commands with flags, or run in a terminal." }),
        ),
        CliError::Internal(message) => {
            agent_error(9999, message.clone(), json!({ "raw": message }))
        }
    }
}

/// Where the workflow stopped, for errors raised after a submit began.
fn request_state_for_error(err: &CliError) -> Option<RequestState> {
    match err {
        CliError::Validation(_) | CliError::Generation(_) => Some(RequestState::Failed),
        _ => None,
    }
}

fn output_from_error(err: &CliError, command: &str) -> CommandOutput {
    let agent_error = cli_error_to_agent_error(err);
    let message = match err {
        CliError::Internal(message) => format!("internal error: {message}"),
        _ => agent_error.message.clone(),
    };
    CommandOutput {
        ok: false,
        command: command.to_string(),
        message,
        details: Vec::new(),
        payload: Some(json!({
            "error": agent_error,
            "state": request_state_for_error(err),
            "timestamp": commands::now_timestamp(),
        })),
    }
}

async fn run(cli: Cli) -> ExitCode {
    let output_json = matches!(cli.output_format, Some(OutputFormat::Json));
    let mode = mode::detect_mode(output_json, cli.interactive);
    let mut output = build_output_handler(mode, cli.quiet, cli.no_color);
    let command = command_label(&cli.command);
    tracing::debug!(command, ?mode, "dispatching command");

    match dispatch(&cli, output.as_mut()).await {
        Ok(result) => {
            output.complete(&result);
            ExitCode::Success
        }
        Err(err) => {
            tracing::debug!(?err, "command failed");
            let failed_output = output_from_error(&err, command);
            output.complete(&failed_output);
            exit_code_for_error(&err)
        }
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let raw_args: Vec<String> = std::env::args().collect();
    let detected_mode = detect_mode_from_raw_args(&raw_args);
    let cli = match Cli::try_parse_from(&raw_args) {
        Ok(parsed) => parsed,
        Err(err) => {
            if matches!(
                err.kind(),
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
            ) {
                let _ = err.print();
                std::process::exit(0);
            }

            if detected_mode == Mode::Agent {
                let cli_error = clap_error_to_cli_error(&err);
                let operation = infer_operation_from_raw_args(&raw_args);
                let failed_output = output_from_error(&cli_error, operation);
                let mut output = agent::AgentOutputHandler::new();
                output.complete(&failed_output);
                std::process::exit(exit_code_for_error(&cli_error).as_i32());
            }

            let _ = err.print();
            std::process::exit(ExitCode::ConfigError.as_i32());
        }
    };

    init_tracing(cli.log_level);
    let code = run(cli).await;
    std::process::exit(code.as_i32());
}
