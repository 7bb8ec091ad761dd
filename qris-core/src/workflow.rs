//! Request/response state machine around the single QRIS API call.
//!
//! `Idle -> Validating -> InFlight -> (Succeeded | Failed)`. A new submit
//! from `Succeeded` or `Failed` re-enters `Validating` and clears the prior
//! result; a submit while `InFlight` is refused.
//!
//! The machine is split into [`Workflow::begin`] and [`Workflow::complete`]
//! so callers can drive the network call themselves; [`Workflow::submit`]
//! does both around one [`QrisGateway`] call.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::client::QrisGateway;
use crate::error::{GenerationError, WorkflowError};
use crate::output::format_rupiah;
use crate::response::QrisSuccess;
use crate::types::{TransactionInput, TransactionRecord};
use crate::validation::validate_submission;

const ABANDONED_MESSAGE: &str = "request abandoned before a response arrived";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    #[default]
    Idle,
    Validating,
    InFlight,
    Succeeded,
    Failed,
}

impl RequestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestState::Idle => "idle",
            RequestState::Validating => "validating",
            RequestState::InFlight => "in_flight",
            RequestState::Succeeded => "succeeded",
            RequestState::Failed => "failed",
        }
    }
}

/// Outcome of the last completed submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GenerationResult {
    Success {
        image_url: String,
        encoded_payload: String,
        nominal: String,
        message: String,
    },
    Failure {
        kind: String,
        message: String,
    },
}

impl GenerationResult {
    fn success(success: QrisSuccess, total: u64) -> Self {
        GenerationResult::Success {
            image_url: success.link_qris,
            encoded_payload: success.converted_qris,
            nominal: success.nominal,
            message: format!(
                "QRIS generated for a total payment of {}.",
                format_rupiah(Decimal::from(total))
            ),
        }
    }

    fn failure(err: &GenerationError) -> Self {
        GenerationResult::Failure {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, GenerationResult::Success { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            GenerationResult::Success { message, .. } | GenerationResult::Failure { message, .. } => {
                message
            }
        }
    }
}

/// A validated submission waiting for its network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingGeneration {
    pub nominal: u64,
    pub record: TransactionRecord,
}

#[derive(Debug, Default)]
pub struct Workflow {
    state: RequestState,
    result: Option<GenerationResult>,
    record: Option<TransactionRecord>,
}

impl Workflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    pub fn result(&self) -> Option<&GenerationResult> {
        self.result.as_ref()
    }

    /// Breakdown snapshotted at the last accepted submit.
    pub fn record(&self) -> Option<&TransactionRecord> {
        self.record.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.state == RequestState::InFlight
    }

    fn transition(&mut self, next: RequestState) {
        tracing::debug!(from = self.state.as_str(), to = next.as_str(), "workflow transition");
        self.state = next;
    }

    /// Validate the current entry and, if it passes, move to `InFlight`.
    ///
    /// On a validation failure the workflow is left in `Failed` with a
    /// failure result already stored.
    pub fn begin(&mut self, input: &TransactionInput) -> Result<PendingGeneration, WorkflowError> {
        if self.is_busy() {
            tracing::warn!("submit ignored: a request is already in flight");
            return Err(WorkflowError::Busy);
        }

        self.transition(RequestState::Validating);
        self.result = None;
        self.record = None;

        let breakdown = input.breakdown();
        let nominal = match validate_submission(input, &breakdown) {
            Ok(nominal) => nominal,
            Err(err) => {
                tracing::info!(code = err.code(), "submission rejected by validation");
                self.result = Some(GenerationResult::failure(&GenerationError::Validation(
                    err.clone(),
                )));
                self.transition(RequestState::Failed);
                return Err(WorkflowError::Rejected(err));
            }
        };

        let record = TransactionRecord {
            original_amount: breakdown.original_amount,
            fee: breakdown.fee,
            total: nominal,
        };
        self.record = Some(record);
        self.transition(RequestState::InFlight);

        Ok(PendingGeneration { nominal, record })
    }

    /// Store the gateway outcome for the in-flight request.
    ///
    /// Refused with [`WorkflowError::NotInFlight`] unless a [`Workflow::begin`]
    /// is pending; the state and any stored result are left untouched.
    pub fn complete(
        &mut self,
        outcome: Result<QrisSuccess, GenerationError>,
    ) -> Result<&GenerationResult, WorkflowError> {
        if !self.is_busy() {
            tracing::warn!(state = self.state.as_str(), "outcome ignored: no request in flight");
            return Err(WorkflowError::NotInFlight);
        }
        let total = self.record.map(|record| record.total).unwrap_or_default();
        let (next, result) = match outcome {
            Ok(success) => (RequestState::Succeeded, GenerationResult::success(success, total)),
            Err(err) => (RequestState::Failed, GenerationResult::failure(&err)),
        };
        self.transition(next);
        Ok(self.result.insert(result))
    }

    /// Give up on the in-flight request without an outcome.
    ///
    /// The workflow moves to `Failed` so the next submit is accepted. Does
    /// nothing unless a request is in flight.
    pub fn abandon(&mut self) {
        if !self.is_busy() {
            return;
        }
        tracing::warn!("in-flight request abandoned");
        let err = GenerationError::Unknown(ABANDONED_MESSAGE.to_string());
        self.result = Some(GenerationResult::failure(&err));
        self.transition(RequestState::Failed);
    }

    /// Validate, call the gateway exactly once, and record the outcome.
    ///
    /// Only [`WorkflowError::Busy`] is returned as an error; validation and
    /// remote failures end up as a [`GenerationResult::Failure`].
    ///
    /// Dropping the returned future while the gateway call is pending (a
    /// caller-side timeout, for instance) leaves the workflow `InFlight`, and
    /// later submits get `Busy` until [`Workflow::abandon`] is called.
    pub async fn submit<G>(
        &mut self,
        input: &TransactionInput,
        gateway: &G,
    ) -> Result<&GenerationResult, WorkflowError>
    where
        G: QrisGateway + ?Sized,
    {
        let pending = match self.begin(input) {
            Ok(pending) => pending,
            Err(WorkflowError::Rejected(err)) => {
                let failure = GenerationResult::failure(&GenerationError::Validation(err));
                return Ok(self.result.insert(failure));
            }
            Err(err) => return Err(err),
        };

        let outcome = gateway.request_qris(pending.nominal).await;
        self.complete(outcome)
    }
}
