use std::io::{self, IsTerminal};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Operator,
    Agent,
}

/// `--output json` always wins; otherwise a TTY (or `--interactive`) means operator.
pub fn detect_mode(output_json: bool, interactive: bool) -> Mode {
    if output_json {
        return Mode::Agent;
    }
    if interactive || io::stdout().is_terminal() {
        Mode::Operator
    } else {
        Mode::Agent
    }
}
