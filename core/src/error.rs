//! Error types for the typed client.
//!
//! # Design
//! The client does not interpret transport failures. Whatever the transport
//! returns lands in `Error::Transport` untouched and can be taken back out
//! with `into_transport`. The remaining variants cover the few things the
//! client itself does: encoding call options and decoding the body.

use thiserror::Error;

use crate::http::HttpResponse;

/// Errors returned by `TypedClient` operations. `E` is the transport's
/// error type.
#[derive(Debug, Error)]
pub enum Error<E> {
    /// The transport failed. Passed through as-is.
    #[error(transparent)]
    Transport(E),

    /// A call option could not be serialized.
    #[error("failed to encode request {part}: {source}")]
    Encode {
        part: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Path parameters did not serialize to an object.
    #[error("path parameters must serialize to an object")]
    PathParams,

    /// A path parameter value was not a string, number or boolean.
    #[error("path parameter `{name}` must be a string, number or boolean")]
    PathParam { name: String },

    /// The response body did not match the endpoint's response type.
    #[error("failed to decode response body (HTTP {status}): {source}")]
    Decode {
        status: u16,
        #[source]
        source: serde_json::Error,
    },
}

impl<E> Error<E> {
    pub fn transport(&self) -> Option<&E> {
        match self {
            Error::Transport(err) => Some(err),
            _ => None,
        }
    }

    /// Unwrap the transport error, handing back `self` for any other variant.
    pub fn into_transport(self) -> Result<E, Self> {
        match self {
            Error::Transport(err) => Ok(err),
            other => Err(other),
        }
    }
}

impl<E: TransportFailure> Error<E> {
    /// The failure response carried by the transport error, if the server
    /// answered at all.
    pub fn response(&self) -> Option<&HttpResponse> {
        self.transport().and_then(TransportFailure::response)
    }
}

/// Bound on transport error types.
pub trait TransportFailure: std::error::Error + Send + Sync + 'static {
    /// The response that caused the failure, for status-code failures.
    fn response(&self) -> Option<&HttpResponse> {
        None
    }
}

/// Errors raised by [`ReqwestTransport`](crate::ReqwestTransport).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unsupported HTTP method `{0}`")]
    Method(String),

    #[error("invalid header `{0}`")]
    Header(String),

    /// The server answered with a status rejected by `validate_status`.
    #[error("request failed with status code {}", .response.status)]
    Status { response: HttpResponse },
}

impl TransportFailure for TransportError {
    fn response(&self) -> Option<&HttpResponse> {
        match self {
            TransportError::Status { response } => Some(response),
            _ => None,
        }
    }
}
