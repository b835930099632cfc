//! Schema-typed request dispatcher.
//!
//! # Design
//! `TypedClient` holds only a transport handle and carries no mutable state
//! between calls, so one instance can serve any number of concurrent callers.
//! Every call is the same three steps: resolve the path template, describe
//! the request as an `HttpRequest`, hand it to the transport. Transport
//! failures come back unchanged inside `Error::Transport`.

use std::fmt;
use std::marker::PhantomData;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::RequestConfig;
use crate::error::Error;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Response};
use crate::options::{RequestOptions, ResponseMode};
use crate::schema::{verb, Endpoint, Schema, Verb};
use crate::transport::{ReqwestTransport, Transport};
use crate::url::{build_url, path_params};

/// Client for the endpoints of schema `S`, dispatching through `T`.
pub struct TypedClient<S, T = ReqwestTransport> {
    transport: T,
    schema: PhantomData<fn() -> S>,
}

impl<S: Schema> TypedClient<S> {
    /// Client over a default-configured [`ReqwestTransport`].
    pub fn new() -> Self {
        Self::with_transport(ReqwestTransport::default())
    }
}

impl<S: Schema> Default for TypedClient<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, T: Clone> Clone for TypedClient<S, T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            schema: PhantomData,
        }
    }
}

impl<S, T: fmt::Debug> fmt::Debug for TypedClient<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedClient")
            .field("schema", &std::any::type_name::<S>())
            .field("transport", &self.transport)
            .finish()
    }
}

macro_rules! verb_methods {
    ($($(#[$meta:meta])* $name:ident => $verb:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            pub async fn $name<E, M>(
                &self,
                options: RequestOptions<E, M>,
            ) -> Result<M::Output<E::Response>, Error<T::Error>>
            where
                E: Endpoint<Schema = S, Verb = verb::$verb>,
                M: ResponseMode,
            {
                self.request(options).await
            }
        )*
    };
}

impl<S: Schema, T: Transport> TypedClient<S, T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            schema: PhantomData,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Call endpoint `E`.
    ///
    /// Resolves to the decoded `E::Response`, or to the full
    /// [`Response`] envelope when the options were switched with
    /// [`RequestOptions::full_response`].
    pub async fn request<E, M>(
        &self,
        options: RequestOptions<E, M>,
    ) -> Result<M::Output<E::Response>, Error<T::Error>>
    where
        E: Endpoint<Schema = S>,
        M: ResponseMode,
    {
        let request = describe::<E, M, T::Error>(options)?;
        let response = self.dispatch(request).await?;
        let status = response.status;
        let decoded = response
            .decode::<E::Response>()
            .map_err(|source| Error::Decode { status, source })?;
        Ok(M::shape(decoded))
    }

    verb_methods! {
        /// [`request`](Self::request) restricted to `GET` endpoints.
        get => Get,
        /// [`request`](Self::request) restricted to `POST` endpoints.
        post => Post,
        /// [`request`](Self::request) restricted to `PUT` endpoints.
        put => Put,
        /// [`request`](Self::request) restricted to `DELETE` endpoints.
        delete => Delete,
        /// [`request`](Self::request) restricted to `PATCH` endpoints.
        patch => Patch,
        /// [`request`](Self::request) restricted to `HEAD` endpoints.
        head => Head,
        /// [`request`](Self::request) restricted to `OPTIONS` endpoints.
        options => Options,
    }

    /// Untyped escape hatch. Always resolves to the full envelope; bodies
    /// that are not JSON come back as strings.
    pub async fn raw_request(&self, raw: RawRequest) -> Result<Response<Value>, Error<T::Error>> {
        let params = raw.params.unwrap_or(Value::Null);
        let url = build_url(&raw.url, path_params(&params)?);
        let mut request = HttpRequest::new(raw.method, url);
        request.data = raw.body;
        request.params = raw.query;
        raw.config.apply(&mut request);

        Ok(self.dispatch(request).await?.decode_lenient())
    }

    /// Decode the failure response carried by `error` as the schema's error
    /// body. `None` when the failure has no response, e.g. a refused
    /// connection.
    pub fn error_body(
        &self,
        error: &Error<T::Error>,
    ) -> Option<Result<Response<S::ErrorBody>, serde_json::Error>> {
        error.response().map(|response| response.clone().decode())
    }

    async fn dispatch(&self, request: HttpRequest) -> Result<HttpResponse, Error<T::Error>> {
        debug!(method = %request.method, url = %request.url, "dispatching request");
        match self.transport.request(request).await {
            Ok(response) => {
                debug!(status = response.status, "request completed");
                Ok(response)
            }
            Err(err) => {
                debug!(error = %err, "transport failed");
                Err(Error::Transport(err))
            }
        }
    }
}

/// Turn call options into a request descriptor: path params into the URL,
/// body into `data`, query into `params`, then the endpoint's config and the
/// caller's config on top.
fn describe<E: Endpoint, M, X>(options: RequestOptions<E, M>) -> Result<HttpRequest, Error<X>> {
    let RequestOptions {
        body,
        params,
        query,
        config,
        ..
    } = options;

    let params = encode("params", &params)?.unwrap_or(Value::Null);
    let url = build_url(E::PATH, path_params(&params)?);

    let mut request = HttpRequest::new(<E::Verb as Verb>::method(), url);
    request.data = encode("body", &body)?;
    request.params = encode("query", &query)?.filter(|query| !is_empty_object(query));
    E::config().merge(config).apply(&mut request);
    Ok(request)
}

/// Serialize one call option. `null` means "not sent".
fn encode<X>(part: &'static str, value: &impl Serialize) -> Result<Option<Value>, Error<X>> {
    match serde_json::to_value(value) {
        Ok(Value::Null) => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(source) => Err(Error::Encode { part, source }),
    }
}

fn is_empty_object(value: &Value) -> bool {
    matches!(value, Value::Object(map) if map.is_empty())
}

/// An untyped request for [`TypedClient::raw_request`].
#[derive(Debug, Clone)]
pub struct RawRequest {
    pub method: HttpMethod,
    pub url: String,
    pub params: Option<Value>,
    pub query: Option<Value>,
    pub body: Option<Value>,
    pub config: RequestConfig,
}

impl RawRequest {
    pub fn new(method: impl Into<HttpMethod>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            params: None,
            query: None,
            body: None,
            config: RequestConfig::default(),
        }
    }

    pub fn params(mut self, params: Value) -> Self {
        self.params = Some(params);
        self
    }

    pub fn query(mut self, query: Value) -> Self {
        self.query = Some(query);
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn config(mut self, config: RequestConfig) -> Self {
        self.config = config;
        self
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    use super::*;
    use crate::error::TransportFailure;
    use crate::schema::{Absent, FreeQuery};

    #[derive(Debug, thiserror::Error)]
    #[error("connection refused")]
    struct Refused;

    impl TransportFailure for Refused {}

    #[derive(Debug, thiserror::Error)]
    #[error("rejected with {}", .0.status)]
    struct Rejected(HttpResponse);

    impl TransportFailure for Rejected {
        fn response(&self) -> Option<&HttpResponse> {
            Some(&self.0)
        }
    }

    /// Records every request and answers with a fixed response.
    struct Spy {
        calls: Mutex<Vec<HttpRequest>>,
        status: u16,
        body: String,
        refuse: bool,
    }

    impl Spy {
        fn replying(body: &str) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                status: 200,
                body: body.to_string(),
                refuse: false,
            })
        }

        fn refusing() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                status: 0,
                body: String::new(),
                refuse: true,
            })
        }

        fn calls(&self) -> Vec<HttpRequest> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for Spy {
        type Error = Refused;

        async fn request(&self, request: HttpRequest) -> Result<HttpResponse, Refused> {
            self.calls.lock().unwrap().push(request);
            if self.refuse {
                return Err(Refused);
            }
            Ok(HttpResponse {
                status: self.status,
                headers: vec![("x-request".to_string(), "spy".to_string())],
                body: self.body.clone(),
            })
        }
    }

    /// Always fails with a 404 carrying a JSON problem body.
    struct NotFound;

    #[async_trait]
    impl Transport for NotFound {
        type Error = Rejected;

        async fn request(&self, _: HttpRequest) -> Result<HttpResponse, Rejected> {
            Err(Rejected(HttpResponse {
                status: 404,
                headers: Vec::new(),
                body: r#"{"message":"no such user"}"#.to_string(),
            }))
        }
    }

    #[derive(Debug, Serialize)]
    struct Filter {
        filter: String,
    }

    #[derive(Debug, Serialize)]
    struct Lookup {
        id: String,
    }

    #[derive(Debug, Serialize)]
    struct UserId {
        id: u32,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Success {
        success: bool,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Problem {
        message: String,
    }

    #[derive(Debug, Serialize)]
    struct Ids {
        idx: u32,
        id: u32,
    }

    #[derive(Debug, Serialize)]
    struct Page {
        page: u32,
    }

    pub struct Purge;

    impl Verb for Purge {
        fn method() -> HttpMethod {
            HttpMethod::Custom("PURGE".to_string())
        }
    }

    crate::api_schema! {
        struct Api { error: Problem };

        GET "/endpoint" => Search {
            body: Lookup,
            query: Filter,
            response: Success,
        };
        GET "/endpoint/:id" => Fetch { params: UserId, response: Success };
        GET "/optional-query" => Paged { query: Option<Page>, response: Value };
        GET "/no-query" => Open { response: Value };
        POST "/items" => CreateItem { body: Value, response: Value };
        PUT "/items/:id" => ReplaceItem { body: Value, params: UserId, response: Value };
        DELETE "/items/:id" => DeleteItem { params: UserId, response: () };
        Purge "/cache" => PurgeCache { response: Value };
        GET "/a/:idx/b/:id" => Indexed { params: Ids, response: Value };
        GET "/export" => Export {
            config: RequestConfig::new()
                .header("x-api-version", "2")
                .timeout(Duration::from_secs(30)),
            response: String,
        };
    }

    fn success_client() -> (Arc<Spy>, TypedClient<Api, Arc<Spy>>) {
        let spy = Spy::replying(r#"{"success":true}"#);
        (spy.clone(), TypedClient::with_transport(spy))
    }

    #[tokio::test]
    async fn request_resolves_to_body_by_default() {
        let (spy, client) = success_client();
        let options = RequestOptions::<Search>::new(
            Lookup { id: "123".into() },
            Absent,
            Filter { filter: "active".into() },
        );

        let body = client.request(options).await.unwrap();
        assert_eq!(body, Success { success: true });

        let calls = spy.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, HttpMethod::Get);
        assert_eq!(calls[0].url, "/endpoint");
        assert_eq!(calls[0].data, Some(json!({"id": "123"})));
        assert_eq!(calls[0].params, Some(json!({"filter": "active"})));
    }

    #[tokio::test]
    async fn full_response_resolves_to_envelope() {
        let (_, client) = success_client();
        let options = RequestOptions::<Fetch>::with_params(UserId { id: 7 }).full_response();

        let response = client.get(options).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.header("X-Request"), Some("spy"));
        assert_eq!(response.data, Success { success: true });
    }

    #[tokio::test]
    async fn path_params_fill_the_template() {
        let (spy, client) = success_client();
        client
            .get(RequestOptions::<Fetch>::with_params(UserId { id: 42 }))
            .await
            .unwrap();

        let call = &spy.calls()[0];
        assert_eq!(call.url, "/endpoint/42");
        assert!(call.data.is_none());
        assert!(call.params.is_none());
    }

    #[tokio::test]
    async fn path_params_follow_declared_field_order() {
        let spy = Spy::replying("null");
        let client = TypedClient::<Api, _>::with_transport(spy.clone());

        client
            .get(RequestOptions::<Indexed>::with_params(Ids { idx: 2, id: 1 }))
            .await
            .unwrap();
        assert_eq!(spy.calls()[0].url, "/a/2/b/1");
    }

    #[tokio::test]
    async fn endpoint_config_sits_beneath_call_config() {
        let spy = Spy::replying("id,name");
        let client = TypedClient::<Api, _>::with_transport(spy.clone());

        let csv = client.get(RequestOptions::<Export>::empty()).await.unwrap();
        assert_eq!(csv, "id,name");

        let config = RequestConfig::new()
            .timeout(Duration::from_secs(1))
            .header("x-trace", "1");
        client
            .get(RequestOptions::<Export>::empty().config(config))
            .await
            .unwrap();

        let calls = spy.calls();
        assert_eq!(calls[0].timeout, Some(Duration::from_secs(30)));
        assert_eq!(
            calls[0].headers,
            vec![("x-api-version".to_string(), "2".to_string())]
        );
        assert_eq!(calls[1].timeout, Some(Duration::from_secs(1)));
        assert_eq!(
            calls[1].headers,
            vec![
                ("x-api-version".to_string(), "2".to_string()),
                ("x-trace".to_string(), "1".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn query_and_body_are_forwarded() {
        let spy = Spy::replying("{}");
        let client = TypedClient::<Api, _>::with_transport(spy.clone());

        let mut query = FreeQuery::new();
        query.insert("a".to_string(), json!(1));
        client
            .request(RequestOptions::<Open>::with_query(query))
            .await
            .unwrap();
        client
            .post(RequestOptions::<CreateItem>::with_body(json!({"x": "y"})))
            .await
            .unwrap();

        let calls = spy.calls();
        assert_eq!(calls[0].params, Some(json!({"a": 1})));
        assert_eq!(calls[1].method, HttpMethod::Post);
        assert_eq!(calls[1].data, Some(json!({"x": "y"})));
    }

    #[tokio::test]
    async fn omitted_optional_query_is_not_sent() {
        let spy = Spy::replying("null");
        let client = TypedClient::<Api, _>::with_transport(spy.clone());

        client.get(RequestOptions::<Paged>::empty()).await.unwrap();
        client.get(RequestOptions::<Open>::empty()).await.unwrap();
        client
            .get(RequestOptions::<Paged>::with_query(Some(Page { page: 1 })))
            .await
            .unwrap();

        let calls = spy.calls();
        assert!(calls[0].params.is_none());
        assert!(calls[1].params.is_none());
        assert_eq!(calls[2].params, Some(json!({"page": 1})));
    }

    #[tokio::test]
    async fn call_config_overrides_descriptor() {
        let spy = Spy::replying("{}");
        let client = TypedClient::<Api, _>::with_transport(spy.clone());
        let config = RequestConfig {
            url: Some("/elsewhere".to_string()),
            data: Some(json!({"replaced": true})),
            ..RequestConfig::new().header("x-trace", "1")
        };

        let options =
            RequestOptions::<ReplaceItem>::new(json!({"v": 1}), UserId { id: 1 }, FreeQuery::new())
                .config(config);
        client.put(options).await.unwrap();

        let call = &spy.calls()[0];
        assert_eq!(call.method, HttpMethod::Put);
        assert_eq!(call.url, "/elsewhere");
        assert_eq!(call.data, Some(json!({"replaced": true})));
        assert_eq!(call.headers, vec![("x-trace".to_string(), "1".to_string())]);
    }

    #[tokio::test]
    async fn custom_verbs_are_dispatched_as_is() {
        let spy = Spy::replying(r#""ok""#);
        let client = TypedClient::<Api, _>::with_transport(spy.clone());

        let data = client.request(RequestOptions::<PurgeCache>::empty()).await.unwrap();
        assert_eq!(data, json!("ok"));
        assert_eq!(spy.calls()[0].method, HttpMethod::Custom("PURGE".to_string()));
    }

    #[tokio::test]
    async fn empty_body_decodes_unit_response() {
        let spy = Spy::replying("");
        let client = TypedClient::<Api, _>::with_transport(spy.clone());

        client
            .delete(RequestOptions::<DeleteItem>::with_params(UserId { id: 3 }))
            .await
            .unwrap();
        assert_eq!(spy.calls()[0].method, HttpMethod::Delete);
        assert_eq!(spy.calls()[0].url, "/items/3");
    }

    #[tokio::test]
    async fn transport_error_propagates_unchanged() {
        let spy = Spy::refusing();
        let client = TypedClient::<Api, _>::with_transport(spy.clone());

        let err = client.get(RequestOptions::<Open>::empty()).await.unwrap_err();
        assert!(matches!(err, Error::Transport(Refused)));
        assert_eq!(err.to_string(), "connection refused");
        assert!(client.error_body(&err).is_none());
        assert_eq!(spy.calls().len(), 1);
    }

    #[tokio::test]
    async fn mismatched_body_is_a_decode_error() {
        let spy = Spy::replying(r#"{"unexpected":1}"#);
        let client = TypedClient::<Api, _>::with_transport(spy);

        let err = client
            .get(RequestOptions::<Fetch>::with_params(UserId { id: 1 }))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Decode { status: 200, .. }));
    }

    #[tokio::test]
    async fn error_body_decodes_schema_error_type() {
        let client = TypedClient::<Api, _>::with_transport(NotFound);

        let err = client.get(RequestOptions::<Open>::empty()).await.unwrap_err();
        let problem = client.error_body(&err).unwrap().unwrap();
        assert_eq!(problem.status, 404);
        assert_eq!(problem.data.message, "no such user");
    }

    #[tokio::test]
    async fn raw_request_always_returns_envelope() {
        let spy = Spy::replying("plain text");
        let client = TypedClient::<Api, _>::with_transport(spy.clone());

        let response = client
            .raw_request(
                RawRequest::new("GET", "/endpoint/:id")
                    .params(json!({"id": "a b"}))
                    .query(json!({"filter": "active"}))
                    .body(json!({"id": "123"})),
            )
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.data, json!("plain text"));
        let call = &spy.calls()[0];
        assert_eq!(call.url, "/endpoint/a%20b");
        assert_eq!(call.params, Some(json!({"filter": "active"})));
        assert_eq!(call.data, Some(json!({"id": "123"})));
    }

    #[tokio::test]
    async fn injected_transport_sees_every_call() {
        let spy = Spy::replying("{}");
        let client = TypedClient::<Api, _>::with_transport(spy.clone());

        for _ in 0..3 {
            client.get(RequestOptions::<Open>::empty()).await.unwrap();
        }
        client.raw_request(RawRequest::new("GET", "/test")).await.unwrap();
        assert_eq!(spy.calls().len(), 4);
        assert!(Arc::ptr_eq(client.transport(), &spy));
    }

    #[tokio::test]
    async fn shared_client_serves_concurrent_callers() {
        let (spy, client) = success_client();
        let client = Arc::new(client);

        let handles: Vec<_> = (0..8)
            .map(|id| {
                let client = Arc::clone(&client);
                tokio::spawn(async move {
                    client
                        .get(RequestOptions::<Fetch>::with_params(UserId { id }).full_response())
                        .await
                })
            })
            .collect();
        for handle in handles {
            let response = handle.await.unwrap().unwrap();
            assert_eq!(response.data, Success { success: true });
        }

        let mut urls: Vec<_> = spy.calls().into_iter().map(|call| call.url).collect();
        urls.sort();
        assert_eq!(urls.len(), 8);
        assert_eq!(urls[0], "/endpoint/0");
    }

    #[test]
    fn default_client_uses_reqwest_transport() {
        let client = TypedClient::<Api>::new();
        assert!(client.transport().config().base_url.is_none());
        let cloned = client.clone();
        assert!(format!("{cloned:?}").contains("TypedClient"));
    }

    #[test]
    fn describe_rejects_bad_params() {
        crate::api_schema! {
            struct Loose;
            GET "/x/:id" => Nested { params: Value, response: Value };
        }

        let options = RequestOptions::<Nested>::with_params(json!({"id": {"a": 1}}));
        let err = describe::<Nested, _, Refused>(options).unwrap_err();
        assert!(matches!(err, Error::PathParam { ref name } if name == "id"));
    }
}
