//! Schema-typed HTTP client.
//!
//! # Overview
//! A schema declares, per endpoint, the verb, the path template and the
//! shapes of body, path parameters, query and response. `TypedClient` only
//! accepts call options that fit the endpoint and resolves to its response
//! type, so a missing body or a misspelled query struct is a compile error
//! rather than a 400 at runtime.
//!
//! ```no_run
//! use serde::{Deserialize, Serialize};
//! use typed_http::{api_schema, RequestOptions, TypedClient};
//!
//! #[derive(Serialize)]
//! pub struct UserId { pub id: u32 }
//!
//! #[derive(Deserialize)]
//! pub struct User { pub id: u32, pub name: String }
//!
//! api_schema! {
//!     pub struct Api;
//!     GET "https://api.example.com/users/:id" => pub GetUser { params: UserId, response: User };
//! }
//!
//! # async fn run() -> Result<(), typed_http::Error<typed_http::TransportError>> {
//! let client = TypedClient::<Api>::new();
//! let user = client.get(RequestOptions::<GetUser>::with_params(UserId { id: 1 })).await?;
//! println!("{}", user.name);
//! # Ok(()) }
//! ```
//!
//! # Design
//! - `TypedClient` is stateless; it holds only a transport handle.
//! - The transport boundary is plain data (`HttpRequest` in, `HttpResponse`
//!   out), so the default reqwest transport can be swapped for anything.
//! - Transport errors are passed through untouched.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod options;
pub mod schema;
pub mod transport;
pub mod url;

pub use client::{RawRequest, TypedClient};
pub use config::{RequestConfig, TransportConfig};
pub use error::{Error, TransportError, TransportFailure};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Response};
pub use options::{BodyOnly, FullResponse, RequestOptions, ResponseMode};
pub use schema::{verb, Absent, Endpoint, FreeQuery, Omittable, Schema, Verb};
pub use transport::{ReqwestTransport, Transport};
pub use url::build_url;

#[doc(hidden)]
pub mod __private {
    pub use serde_json::Value;
}
