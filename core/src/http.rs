//! HTTP descriptors exchanged with a [`Transport`](crate::Transport).
//!
//! # Design
//! The dispatcher never touches the network. It describes a call as a plain
//! `HttpRequest` and receives a plain `HttpResponse` back, so any transport
//! (reqwest, a test spy, a recorded fixture) can sit behind it. Field names
//! follow the transport's vocabulary: `data` is the outgoing body and
//! `params` is the outgoing query, as opposed to the `body`/`query` terms
//! used at call sites.

use std::fmt;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// HTTP method for a request. Tokens outside the standard verbs are kept as
/// `Custom` and are only meaningful to a transport that understands them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
    Custom(String),
}

impl HttpMethod {
    pub fn as_str(&self) -> &str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Custom(token) => token,
        }
    }
}

impl From<&str> for HttpMethod {
    fn from(token: &str) -> Self {
        match token {
            "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "DELETE" => HttpMethod::Delete,
            "PATCH" => HttpMethod::Patch,
            "HEAD" => HttpMethod::Head,
            "OPTIONS" => HttpMethod::Options,
            other => HttpMethod::Custom(other.to_string()),
        }
    }
}

impl From<String> for HttpMethod {
    fn from(token: String) -> Self {
        HttpMethod::from(token.as_str())
    }
}

impl From<HttpMethod> for String {
    fn from(method: HttpMethod) -> Self {
        method.as_str().to_string()
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
///
/// Built by `TypedClient` and handed to the transport, which is responsible
/// for resolving `url` against `base_url`, encoding `params` into a query
/// string and `data` into the body.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub data: Option<Value>,
    pub params: Option<Value>,
    pub headers: Vec<(String, String)>,
    pub timeout: Option<Duration>,
    pub base_url: Option<String>,
    /// Decides which statuses count as success. `None` leaves the choice to
    /// the transport (2xx for `ReqwestTransport`).
    pub validate_status: Option<fn(u16) -> bool>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            data: None,
            params: None,
            headers: Vec::new(),
            timeout: None,
            base_url: None,
            validate_status: None,
        }
    }
}

/// An HTTP response described as plain data, as returned by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// Decode the body as JSON into `T`. An empty body decodes as `null`;
    /// a body that is not JSON is offered to `T` as a plain string.
    pub fn decode<T: DeserializeOwned>(self) -> Result<Response<T>, serde_json::Error> {
        let data = if self.body.trim().is_empty() {
            serde_json::from_value(Value::Null)?
        } else {
            match serde_json::from_str(&self.body) {
                Ok(data) => data,
                Err(err) => serde_json::from_value(Value::String(self.body.clone()))
                    .map_err(|_| err)?,
            }
        };
        Ok(Response {
            status: self.status,
            headers: self.headers,
            data,
        })
    }

    /// Decode the body without a target type. Bodies that are not JSON come
    /// back as `Value::String`.
    pub fn decode_lenient(self) -> Response<Value> {
        let data = if self.body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&self.body).unwrap_or(Value::String(self.body))
        };
        Response {
            status: self.status,
            headers: self.headers,
            data,
        }
    }
}

/// The full response envelope wrapping a decoded body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response<T> {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub data: T,
}

impl<T> Response<T> {
    /// Case-insensitive header lookup. Returns the first match.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Response<U> {
        Response {
            status: self.status,
            headers: self.headers,
            data: f(self.data),
        }
    }
}
