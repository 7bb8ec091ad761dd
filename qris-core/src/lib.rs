//! Core library for Qris Rusdi: fee calculation, submit validation, the
//! remote QRIS API contract, and the generation workflow.

pub mod calculator;
pub mod client;
pub mod config;
pub mod error;
pub mod output;
pub mod parser;
pub mod response;
pub mod types;
pub mod validation;
pub mod workflow;

pub use calculator::compute;
pub use client::{QrisClient, QrisGateway};
pub use config::QrisConfig;
pub use error::{GenerationError, QrisError, Result, WorkflowError};
pub use output::{format_rupiah, truncate_payload};
pub use parser::{parse_decimal, parse_positive, AmountParseError};
pub use response::{QrisApiResponse, QrisSuccess};
pub use types::{FeeMode, TransactionBreakdown, TransactionInput, TransactionRecord};
pub use validation::{validate_submission, ValidationError, MAX_AMOUNT, MAX_PERCENTAGE};
pub use workflow::{GenerationResult, PendingGeneration, RequestState, Workflow};
