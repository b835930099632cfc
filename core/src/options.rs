//! Call options and response shaping.

use std::marker::PhantomData;

use crate::config::RequestConfig;
use crate::http::Response;
use crate::schema::{Endpoint, Omittable};

/// What a call resolves to: the decoded body, or the full envelope.
pub trait ResponseMode {
    type Output<T>;

    fn shape<T>(response: Response<T>) -> Self::Output<T>;
}

/// Resolve to the decoded body only. The default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BodyOnly;

/// Resolve to the full [`Response`] envelope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FullResponse;

impl ResponseMode for BodyOnly {
    type Output<T> = T;

    fn shape<T>(response: Response<T>) -> T {
        response.data
    }
}

impl ResponseMode for FullResponse {
    type Output<T> = Response<T>;

    fn shape<T>(response: Response<T>) -> Response<T> {
        response
    }
}

/// Arguments for one call of endpoint `E`.
///
/// The field types come from `E`, so a required body has to be supplied, a
/// forbidden one can only be [`Absent`](crate::Absent) and an optional one is
/// an `Option`. `M` selects what the call resolves to; see
/// [`full_response`](Self::full_response).
pub struct RequestOptions<E: Endpoint, M = BodyOnly> {
    pub body: E::Body,
    pub params: E::Params,
    pub query: E::Query,
    pub config: RequestConfig,
    mode: PhantomData<M>,
}

impl<E: Endpoint> RequestOptions<E> {
    pub fn new(body: E::Body, params: E::Params, query: E::Query) -> Self {
        Self {
            body,
            params,
            query,
            config: RequestConfig::default(),
            mode: PhantomData,
        }
    }
}

impl<E: Endpoint> RequestOptions<E>
where
    E::Body: Omittable,
    E::Params: Omittable,
    E::Query: Omittable,
{
    /// Options for an endpoint that requires nothing.
    pub fn empty() -> Self {
        Self::new(Default::default(), Default::default(), Default::default())
    }
}

impl<E: Endpoint> RequestOptions<E>
where
    E::Params: Omittable,
    E::Query: Omittable,
{
    pub fn with_body(body: E::Body) -> Self {
        Self::new(body, Default::default(), Default::default())
    }
}

impl<E: Endpoint> RequestOptions<E>
where
    E::Body: Omittable,
    E::Query: Omittable,
{
    pub fn with_params(params: E::Params) -> Self {
        Self::new(Default::default(), params, Default::default())
    }
}

impl<E: Endpoint> RequestOptions<E>
where
    E::Body: Omittable,
    E::Params: Omittable,
{
    pub fn with_query(query: E::Query) -> Self {
        Self::new(Default::default(), Default::default(), query)
    }
}

impl<E: Endpoint, M> RequestOptions<E, M> {
    pub fn body(mut self, body: E::Body) -> Self {
        self.body = body;
        self
    }

    pub fn params(mut self, params: E::Params) -> Self {
        self.params = params;
        self
    }

    pub fn query(mut self, query: E::Query) -> Self {
        self.query = query;
        self
    }

    pub fn config(mut self, config: RequestConfig) -> Self {
        self.config = config;
        self
    }

    /// Resolve the call to the full response envelope instead of the body.
    pub fn full_response(self) -> RequestOptions<E, FullResponse> {
        self.with_mode()
    }

    pub fn body_only(self) -> RequestOptions<E, BodyOnly> {
        self.with_mode()
    }

    fn with_mode<N>(self) -> RequestOptions<E, N> {
        RequestOptions {
            body: self.body,
            params: self.params,
            query: self.query,
            config: self.config,
            mode: PhantomData,
        }
    }
}
