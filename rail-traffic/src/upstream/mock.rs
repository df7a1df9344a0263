//! Mock gateway for testing without network access.
//!
//! Serves canned bodies keyed by request path, as if they were live
//! responses, and records every path it was asked for.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::error::UpstreamError;
use super::gateway::Gateway;

/// A canned response.
#[derive(Debug, Clone)]
enum MockResponse {
    Body(String),
    Status(u16),
}

/// Gateway that answers from an in-memory table.
///
/// Exact paths are matched first, then prefixes (longest first), which lets
/// tests ignore the timestamp suffix of cache-busted paths. Unknown paths
/// answer with status 404.
#[derive(Debug, Clone, Default)]
pub struct MockGateway {
    exact: HashMap<String, MockResponse>,
    prefixes: Vec<(String, MockResponse)>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for exactly `path`.
    pub fn with_body(mut self, path: impl Into<String>, body: impl Into<String>) -> Self {
        self.exact
            .insert(path.into(), MockResponse::Body(body.into()));
        self
    }

    /// Answer exactly `path` with a non-200 status.
    pub fn with_status(mut self, path: impl Into<String>, status: u16) -> Self {
        self.exact.insert(path.into(), MockResponse::Status(status));
        self
    }

    /// Serve `body` for any path starting with `prefix`.
    pub fn with_prefix_body(mut self, prefix: impl Into<String>, body: impl Into<String>) -> Self {
        self.prefixes
            .push((prefix.into(), MockResponse::Body(body.into())));
        self.prefixes.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        self
    }

    /// Answer any path starting with `prefix` with a non-200 status.
    pub fn with_prefix_status(mut self, prefix: impl Into<String>, status: u16) -> Self {
        self.prefixes.push((prefix.into(), MockResponse::Status(status)));
        self.prefixes.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        self
    }

    /// Paths requested so far, in request order.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Number of requests whose path starts with `prefix`.
    pub fn request_count(&self, prefix: &str) -> usize {
        self.requests()
            .iter()
            .filter(|p| p.starts_with(prefix))
            .count()
    }

    fn respond(&self, path: &str) -> Result<String, UpstreamError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(path.to_string());
        }

        let response = self.exact.get(path).or_else(|| {
            self.prefixes
                .iter()
                .find(|(prefix, _)| path.starts_with(prefix.as_str()))
                .map(|(_, response)| response)
        });

        match response {
            Some(MockResponse::Body(body)) => Ok(body.clone()),
            Some(MockResponse::Status(status)) => Err(UpstreamError::status(*status, "")),
            None => Err(UpstreamError::status(
                404,
                &format!("no mock response for {path}"),
            )),
        }
    }
}

impl Gateway for MockGateway {
    async fn get(&self, path: &str) -> Result<String, UpstreamError> {
        self.respond(path)
    }
}
