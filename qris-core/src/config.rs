use std::time::Duration;

use reqwest::Url;

use crate::error::{QrisError, Result};

/// Remote generator endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://cekid-ariepulsa.my.id/api/";

/// Pre-provisioned static merchant QR payload (EMV-QR), treated as opaque.
pub const DEFAULT_QRIS_DATA: &str = "00020101021126570011ID.DANA.WWW011893600915351330224002095133022400303UMI51440014ID.CO.QRIS.WWW0215ID10232925085540303UMI5204481453033605802ID5910FANDI SHOP6015Kab. Labuhanbat6105214116304048C";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrisConfig {
    pub endpoint: String,
    pub qris_data: String,
    pub timeout: Duration,
}

impl Default for QrisConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            qris_data: DEFAULT_QRIS_DATA.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl QrisConfig {
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_qris_data(mut self, qris_data: impl Into<String>) -> Self {
        self.qris_data = qris_data.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Parse and check the endpoint; the payload must be non-empty.
    pub fn validate(&self) -> Result<Url> {
        let url = Url::parse(self.endpoint.trim())
            .map_err(|err| QrisError::Config(format!("invalid endpoint '{}': {err}", self.endpoint)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(QrisError::Config(format!(
                "endpoint must use http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.qris_data.trim().is_empty() {
            return Err(QrisError::Config("static QRIS payload is empty".to_string()));
        }
        if self.timeout.is_zero() {
            return Err(QrisError::Config("timeout must be greater than zero".to_string()));
        }
        Ok(url)
    }
}
