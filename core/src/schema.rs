//! The schema contract: endpoints as types.
//!
//! # Design
//! A schema is a marker type. Each endpoint is another marker type that
//! implements [`Endpoint`] and names its schema, verb, path template and the
//! shapes of its body, path parameters, query and response. The compiler
//! then enforces what a call site must pass:
//!
//! | declared as      | call site                         |
//! |------------------|-----------------------------------|
//! | `T`              | required, must be a `T`           |
//! | `Option<T>`      | optional                          |
//! | [`Absent`]       | forbidden, only `Absent` fits     |
//! | [`FreeQuery`]    | any key/value map (query default) |
//!
//! Body and params default to `Absent` when undeclared; query defaults to
//! `FreeQuery`, so an endpoint that says nothing about its query accepts any.
//!
//! [`api_schema!`](crate::api_schema) writes the marker types and impls.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::RequestConfig;
use crate::http::HttpMethod;

/// Marker for a schema: the set of endpoints one client may call.
pub trait Schema {
    /// Shape of failure response bodies, decoded by
    /// [`TypedClient::error_body`](crate::TypedClient::error_body).
    type ErrorBody: DeserializeOwned;
}

/// Type-level HTTP verb.
pub trait Verb {
    fn method() -> HttpMethod;
}

macro_rules! verbs {
    ($($name:ident => $method:ident),* $(,)?) => {
        $(
            #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
            pub struct $name;

            impl Verb for $name {
                fn method() -> HttpMethod {
                    HttpMethod::$method
                }
            }
        )*
    };
}

/// Marker types for the standard verbs.
pub mod verb {
    use super::Verb;
    use crate::http::HttpMethod;

    verbs! {
        Get => Get,
        Post => Post,
        Put => Put,
        Delete => Delete,
        Patch => Patch,
        Head => Head,
        Options => Options,
    }
}

/// One entry of a schema.
pub trait Endpoint {
    type Schema: Schema;
    type Verb: Verb;

    /// Path template, possibly with `:name` placeholders. May also be an
    /// arbitrary key resolved by the transport's base URL.
    const PATH: &'static str;

    type Body: Serialize;
    type Params: Serialize;
    type Query: Serialize;
    type Response: DeserializeOwned;

    /// Transport overrides applied to every call of this endpoint, beneath
    /// the call site's own config.
    fn config() -> RequestConfig {
        RequestConfig::default()
    }
}

/// The value of an option the endpoint does not take.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Absent;

/// Query for endpoints that do not declare one: any keys, any JSON values.
pub type FreeQuery = BTreeMap<String, Value>;

/// Option shapes a caller may leave out.
pub trait Omittable: Default {}

impl Omittable for Absent {}
impl<T> Omittable for Option<T> {}
impl Omittable for FreeQuery {}

/// Declare a schema and its endpoints.
///
/// ```
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize)]
/// pub struct UserId { pub id: u32 }
///
/// #[derive(Deserialize)]
/// pub struct User { pub id: u32, pub name: String }
///
/// typed_http::api_schema! {
///     pub struct Api;
///
///     GET "/users/:id" => pub GetUser { params: UserId, response: User };
///     GET "/health" => pub Health { response: () };
/// }
/// ```
///
/// Fields must appear in the order `body`, `params`, `query`, `config`,
/// `response`; only `response` is mandatory. `config` is an expression
/// evaluating to a [`RequestConfig`] applied beneath every call's own config.
/// The schema may name a failure body type with
/// `pub struct Api { error: ApiError };` (default `serde_json::Value`).
/// Verbs other than the standard seven name a user type implementing
/// [`Verb`].
#[macro_export]
macro_rules! api_schema {
    (@or [] $default:ty) => { $default };
    (@or [$declared:ty] $default:ty) => { $declared };

    (@verb GET) => { $crate::verb::Get };
    (@verb POST) => { $crate::verb::Post };
    (@verb PUT) => { $crate::verb::Put };
    (@verb DELETE) => { $crate::verb::Delete };
    (@verb PATCH) => { $crate::verb::Patch };
    (@verb HEAD) => { $crate::verb::Head };
    (@verb OPTIONS) => { $crate::verb::Options };
    (@verb $custom:ident) => { $custom };

    (
        $(#[$meta:meta])*
        $vis:vis struct $schema:ident $({ error: $error:ty $(,)? })?;

        $(
            $verb:ident $path:literal => $(#[$emeta:meta])* $evis:vis $name:ident {
                $(body: $body:ty,)?
                $(params: $params:ty,)?
                $(query: $query:ty,)?
                $(config: $config:expr,)?
                response: $response:ty $(,)?
            }
        );* $(;)?
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        $vis struct $schema;

        impl $crate::Schema for $schema {
            type ErrorBody = $crate::api_schema!(@or [$($error)?] $crate::__private::Value);
        }

        $(
            $(#[$emeta])*
            #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
            $evis struct $name;

            impl $crate::Endpoint for $name {
                type Schema = $schema;
                type Verb = $crate::api_schema!(@verb $verb);
                const PATH: &'static str = $path;
                type Body = $crate::api_schema!(@or [$($body)?] $crate::Absent);
                type Params = $crate::api_schema!(@or [$($params)?] $crate::Absent);
                type Query = $crate::api_schema!(@or [$($query)?] $crate::FreeQuery);
                type Response = $response;

                $(
                    fn config() -> $crate::RequestConfig {
                        $config
                    }
                )?
            }
        )*
    };
}
