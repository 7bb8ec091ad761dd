//! Outbound gateway to the remote QRIS generator.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;

use crate::config::QrisConfig;
use crate::error::{GenerationError, Result};
use crate::response::{interpret_response, QrisSuccess};

/// Anything able to turn a nominal into a dynamic QRIS.
#[async_trait]
pub trait QrisGateway: Send + Sync {
    async fn request_qris(&self, nominal: u64) -> std::result::Result<QrisSuccess, GenerationError>;
}

/// reqwest-backed gateway issuing a single `GET` per call.
#[derive(Debug, Clone)]
pub struct QrisClient {
    http: reqwest::Client,
    endpoint: Url,
    qris_data: String,
    timeout: Duration,
}

impl QrisClient {
    pub fn new(config: &QrisConfig) -> Result<Self> {
        let endpoint = config.validate()?;
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            endpoint,
            qris_data: config.qris_data.clone(),
            timeout: config.timeout,
        })
    }

    /// Full request URL for `nominal`: the endpoint plus `qris_data` and `nominal`.
    pub fn request_url(&self, nominal: u64) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("qris_data", &self.qris_data)
            .append_pair("nominal", &nominal.to_string());
        url
    }

    fn transport_error(&self, err: reqwest::Error) -> GenerationError {
        let message = if err.is_timeout() {
            format!("request timed out after {}s", self.timeout.as_secs())
        } else if err.is_connect() {
            format!("failed to reach the QRIS API: {err}")
        } else {
            err.to_string()
        };
        GenerationError::Transport {
            status: err.status().map(|status| status.as_u16()),
            message,
        }
    }
}

#[async_trait]
impl QrisGateway for QrisClient {
    async fn request_qris(&self, nominal: u64) -> std::result::Result<QrisSuccess, GenerationError> {
        let url = self.request_url(nominal);
        tracing::info!(nominal, endpoint = %self.endpoint, "requesting dynamic QRIS");

        let response = self.http.get(url).send().await.map_err(|err| {
            tracing::warn!(error = %err, "QRIS request failed before a response arrived");
            self.transport_error(err)
        })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|err| {
            tracing::warn!(error = %err, "failed to read QRIS response body");
            GenerationError::Unknown(format!("failed to read API response: {err}"))
        })?;
        tracing::debug!(status = status.as_u16(), bytes = body.len(), "QRIS response received");

        let outcome = interpret_response(status.as_u16(), status.canonical_reason(), &body, nominal);
        if let Err(err) = &outcome {
            tracing::warn!(kind = err.kind(), error = %err, "QRIS API returned a failure");
        }
        outcome
    }
}
