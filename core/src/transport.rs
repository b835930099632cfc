//! The transport seam and its default reqwest implementation.
//!
//! # Design
//! `Transport` is the only way out of the client. It takes a plain
//! `HttpRequest` and returns a plain `HttpResponse`, so tests can swap in a
//! spy and callers can bring their own HTTP stack. `ReqwestTransport` is the
//! batteries-included default: base URL resolution, bracket-style query
//! encoding, JSON bodies and status validation.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::trace;

use crate::config::TransportConfig;
use crate::error::{TransportError, TransportFailure};
use crate::http::{HttpRequest, HttpResponse};

/// Executes `HttpRequest`s.
#[async_trait]
pub trait Transport: Send + Sync {
    type Error: TransportFailure;

    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, Self::Error>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    type Error = T::Error;

    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, Self::Error> {
        (**self).request(request).await
    }
}

#[async_trait]
impl<'a, T: Transport + ?Sized> Transport for &'a T {
    type Error = T::Error;

    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, Self::Error> {
        (**self).request(request).await
    }
}

/// Default transport backed by a `reqwest::Client`.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    config: TransportConfig,
}

impl ReqwestTransport {
    pub fn new(config: TransportConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(client: reqwest::Client, config: TransportConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    type Error = TransportError;

    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let base_url = request.base_url.as_deref().or(self.config.base_url.as_deref());
        let url = resolve_url(base_url, &request.url);
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|_| TransportError::Method(request.method.to_string()))?;

        let mut builder = self.client.request(method, &url);
        let headers = self.config.headers.iter().chain(
            request.headers.iter().map(|(name, value)| (name, value)),
        );
        for (name, value) in headers {
            let name = reqwest::header::HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| TransportError::Header(name.clone()))?;
            let value = reqwest::header::HeaderValue::from_str(value)
                .map_err(|_| TransportError::Header(name.as_str().to_string()))?;
            builder = builder.header(name, value);
        }
        if let Some(params) = &request.params {
            let pairs = query_pairs(params);
            if !pairs.is_empty() {
                builder = builder.query(&pairs);
            }
        }
        if let Some(data) = &request.data {
            builder = builder.json(data);
        }
        if let Some(timeout) = request.timeout.or(self.config.timeout()) {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.text().await?;
        trace!(%url, status, "transport response");

        let response = HttpResponse {
            status,
            headers,
            body,
        };
        let accept = request.validate_status.unwrap_or(is_success);
        if !accept(status) {
            return Err(TransportError::Status { response });
        }
        Ok(response)
    }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Join `url` onto `base_url` unless `url` is already absolute.
fn resolve_url(base_url: Option<&str>, url: &str) -> String {
    match base_url {
        Some(base) if !is_absolute(url) => {
            if url.is_empty() {
                base.to_string()
            } else {
                format!(
                    "{}/{}",
                    base.trim_end_matches('/'),
                    url.trim_start_matches('/')
                )
            }
        }
        _ => url.to_string(),
    }
}

/// `scheme://...` in any case, or protocol-relative `//host/...`.
fn is_absolute(url: &str) -> bool {
    url.starts_with("//") || reqwest::Url::parse(url).is_ok_and(|parsed| parsed.has_host())
}

/// Flatten a query object into `key=value` pairs.
///
/// Nested objects use `outer[inner]` keys and arrays use `key[]`. `null`
/// values are dropped. A non-object root yields no pairs.
fn query_pairs(params: &Value) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    if let Value::Object(map) = params {
        for (key, value) in map {
            flatten(key.clone(), value, &mut pairs);
        }
    }
    pairs
}

fn flatten(key: String, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::String(s) => pairs.push((key, s.clone())),
        Value::Bool(_) | Value::Number(_) => pairs.push((key, value.to_string())),
        Value::Array(items) => {
            for item in items {
                flatten(format!("{key}[]"), item, pairs);
            }
        }
        Value::Object(map) => {
            for (inner, item) in map {
                flatten(format!("{key}[{inner}]"), item, pairs);
            }
        }
    }
}
