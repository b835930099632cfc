//! Transport-level configuration.
//!
//! `RequestConfig` carries per-call overrides that are merged onto the
//! request descriptor last. `TransportConfig` configures the default
//! reqwest transport once, at construction.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::http::{HttpMethod, HttpRequest};

/// Per-call overrides applied on top of the request descriptor.
///
/// Every `Some` field replaces the descriptor's value, including `method`,
/// `url`, `data` and `params`. Headers are appended.
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    pub method: Option<HttpMethod>,
    pub url: Option<String>,
    pub data: Option<Value>,
    pub params: Option<Value>,
    pub headers: Vec<(String, String)>,
    pub timeout: Option<Duration>,
    pub base_url: Option<String>,
    pub validate_status: Option<fn(u16) -> bool>,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn validate_status(mut self, accept: fn(u16) -> bool) -> Self {
        self.validate_status = Some(accept);
        self
    }

    /// Layer `over` on top of `self`. Fields set in `over` win; headers from
    /// both are kept, `over`'s last.
    pub fn merge(mut self, over: RequestConfig) -> RequestConfig {
        self.headers.extend(over.headers);
        RequestConfig {
            method: over.method.or(self.method),
            url: over.url.or(self.url),
            data: over.data.or(self.data),
            params: over.params.or(self.params),
            headers: self.headers,
            timeout: over.timeout.or(self.timeout),
            base_url: over.base_url.or(self.base_url),
            validate_status: over.validate_status.or(self.validate_status),
        }
    }

    /// Shallow-merge onto `request`, last write wins.
    pub fn apply(self, request: &mut HttpRequest) {
        if let Some(method) = self.method {
            request.method = method;
        }
        if let Some(url) = self.url {
            request.url = url;
        }
        if let Some(data) = self.data {
            request.data = Some(data);
        }
        if let Some(params) = self.params {
            request.params = Some(params);
        }
        request.headers.extend(self.headers);
        if let Some(timeout) = self.timeout {
            request.timeout = Some(timeout);
        }
        if let Some(base_url) = self.base_url {
            request.base_url = Some(base_url);
        }
        if let Some(accept) = self.validate_status {
            request.validate_status = Some(accept);
        }
    }
}

/// Construction-time settings for [`ReqwestTransport`](crate::ReqwestTransport).
///
/// Deserializable so callers can keep it in their own config files:
///
/// ```json
/// { "base_url": "https://api.example.com", "timeout_ms": 1000,
///   "headers": { "x-api-key": "secret" } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub base_url: Option<String>,
    pub timeout_ms: Option<u64>,
    pub headers: BTreeMap<String, String>,
}

impl TransportConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}
