//! Response contract of the remote QRIS API.
//!
//! The API distinguishes success from error only by a `status` string and
//! by which fields are present. Bodies are decoded into an all-optional raw
//! shape first and then classified, so a malformed payload can only ever
//! become an error variant.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GenerationError;

/// Discriminator value for a successful response.
pub const STATUS_SUCCESS: &str = "success";
/// Used when a 2xx body is not a usable success and carries no message.
pub const INVALID_RESPONSE_MESSAGE: &str = "invalid or unsuccessful API response";

/// Fields of a successful generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrisSuccess {
    pub nominal: String,
    /// URL of a renderable QR image.
    pub link_qris: String,
    /// Merchant payload re-encoded with the amount embedded.
    pub converted_qris: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QrisApiResponse {
    Success(QrisSuccess),
    Error {
        status: Option<String>,
        message: Option<String>,
    },
}

#[derive(Debug, Default, Deserialize)]
struct RawResponse {
    #[serde(default)]
    status: Option<Value>,
    #[serde(default)]
    message: Option<Value>,
    #[serde(default)]
    nominal: Option<Value>,
    #[serde(default)]
    link_qris: Option<Value>,
    #[serde(default)]
    converted_qris: Option<Value>,
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(ToOwned::to_owned)
}

fn scalar_to_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl QrisApiResponse {
    /// Classify an already parsed JSON document.
    ///
    /// `requested_nominal` fills in a success response that omits `nominal`.
    pub fn from_value(value: Value, requested_nominal: u64) -> Self {
        let raw: RawResponse = serde_json::from_value(value).unwrap_or_default();
        let status = raw.status.as_ref().and_then(Value::as_str).map(ToOwned::to_owned);
        let message = non_empty_str(raw.message.as_ref());

        let link_qris = non_empty_str(raw.link_qris.as_ref());
        let converted_qris = raw
            .converted_qris
            .as_ref()
            .and_then(Value::as_str)
            .map(ToOwned::to_owned);

        match (status.as_deref(), link_qris, converted_qris) {
            (Some(STATUS_SUCCESS), Some(link_qris), Some(converted_qris)) => {
                QrisApiResponse::Success(QrisSuccess {
                    nominal: scalar_to_string(raw.nominal.as_ref())
                        .unwrap_or_else(|| requested_nominal.to_string()),
                    link_qris,
                    converted_qris,
                })
            }
            _ => QrisApiResponse::Error { status, message },
        }
    }

    pub fn from_slice(body: &[u8], requested_nominal: u64) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_slice(body)?;
        Ok(Self::from_value(value, requested_nominal))
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            QrisApiResponse::Success(_) => None,
            QrisApiResponse::Error { message, .. } => message.as_deref(),
        }
    }
}

fn status_line(status: u16, reason: Option<&str>) -> String {
    match reason {
        Some(reason) if !reason.is_empty() => format!("Error: {status} {reason}"),
        _ => format!("Error: {status}"),
    }
}

/// Map a completed HTTP exchange to the generation outcome.
pub fn interpret_response(
    status: u16,
    reason: Option<&str>,
    body: &[u8],
    requested_nominal: u64,
) -> Result<QrisSuccess, GenerationError> {
    if !(200..300).contains(&status) {
        let message = QrisApiResponse::from_slice(body, requested_nominal)
            .ok()
            .and_then(|parsed| parsed.message().map(ToOwned::to_owned))
            .unwrap_or_else(|| status_line(status, reason));
        return Err(GenerationError::Transport {
            status: Some(status),
            message,
        });
    }

    match QrisApiResponse::from_slice(body, requested_nominal) {
        Ok(QrisApiResponse::Success(success)) => Ok(success),
        Ok(QrisApiResponse::Error { message, .. }) => Err(GenerationError::Protocol(
            message.unwrap_or_else(|| INVALID_RESPONSE_MESSAGE.to_string()),
        )),
        Err(err) => Err(GenerationError::Unknown(format!(
            "failed to decode API response: {err}"
        ))),
    }
}
