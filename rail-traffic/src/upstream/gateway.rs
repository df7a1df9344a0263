//! HTTP transport behind a trait.
//!
//! The client only needs "GET this path, give me the body", so the transport
//! is injected. [`HttpGateway`] talks to the real service; tests use
//! [`MockGateway`](super::MockGateway).

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use tracing::trace;

use crate::config::TrafficConfig;

use super::error::UpstreamError;

/// Issues GET requests against the traffic service.
pub trait Gateway: Send + Sync {
    /// Fetch `path` (relative to the base URL, starting with `/`) and return
    /// the body text.
    ///
    /// Anything but HTTP 200 is an [`UpstreamError::Status`].
    fn get(&self, path: &str) -> impl Future<Output = Result<String, UpstreamError>> + Send;
}

/// Gateway backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    http: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    /// Create a gateway with the base URL and timeout from `config`.
    pub fn new(config: &TrafficConfig) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
        })
    }

    /// Full URL for an endpoint path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Gateway for HttpGateway {
    async fn get(&self, path: &str) -> Result<String, UpstreamError> {
        let url = self.url(path);
        trace!(%url, "GET");

        let response = self.http.get(&url).send().await?;
        let status = response.status();

        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::status(status.as_u16(), &body));
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_creation() {
        let gateway = HttpGateway::new(&TrafficConfig::default());
        assert!(gateway.is_ok());
    }

    #[test]
    fn url_joins_base_and_path() {
        let config = TrafficConfig::new().with_base_url("http://localhost:8080/");
        let gateway = HttpGateway::new(&config).unwrap();
        assert_eq!(
            gateway.url("/regione/S07113"),
            "http://localhost:8080/regione/S07113"
        );
    }

    // Requests against the live service are not exercised here; they would
    // need network access and an upstream that is up.
}
