use super::transport::{ReqwestTransport, Transport};
use crate::contract::path::{insert_params, MissingPathParam};
use crate::contract::{AppRoute, ContractRouter, HttpMethod, RequestBody};
use crate::request::{encode_json_query, encode_query};
use crate::response::{parse_response_body, ResponseValidationError};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Client-wide settings.
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// Prepended to every route path, e.g. `http://localhost:8080`
    pub base_url: String,
    /// Sent with every request; per-call headers win
    pub base_headers: BTreeMap<String, String>,
    /// Encode query values as JSON (must match the server's setting)
    pub json_query: bool,
    /// Check JSON responses against the route's declared schema
    pub validate_response: bool,
}

impl ClientOptions {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

/// Per-call inputs.
#[derive(Debug, Clone, Default)]
pub struct ClientArgs {
    pub params: BTreeMap<String, String>,
    pub query: Map<String, Value>,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
}

impl ClientArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: Value) -> Self {
        self.query.insert(name.into(), value);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Fully built request, ready for a [`Transport`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClientRequest {
    pub method: HttpMethod,
    pub url: String,
    /// Lower-cased header names
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
}

/// Response as decoded by a [`Transport`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClientResponse {
    pub status: u16,
    /// Lower-cased header names
    pub headers: BTreeMap<String, String>,
    /// JSON when the content type says so, a JSON string for text, null when empty
    pub body: Value,
}

impl ClientResponse {
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(String::as_str)
    }
}

#[derive(Debug)]
pub enum ClientError {
    /// No route at this dotted key
    UnknownRoute(String),
    MissingPathParam(MissingPathParam),
    /// The transport failed before a response was received
    Transport(Box<dyn std::error::Error + Send + Sync>),
    /// The response body does not match its declared schema
    ResponseValidation(ResponseValidationError),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::UnknownRoute(key) => write!(f, "no route named '{key}' in the contract"),
            ClientError::MissingPathParam(err) => err.fmt(f),
            ClientError::Transport(err) => write!(f, "transport error: {err}"),
            ClientError::ResponseValidation(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::UnknownRoute(_) => None,
            ClientError::MissingPathParam(err) => Some(err),
            ClientError::Transport(err) => Some(err.as_ref()),
            ClientError::ResponseValidation(err) => Some(err),
        }
    }
}

impl From<MissingPathParam> for ClientError {
    fn from(err: MissingPathParam) -> Self {
        ClientError::MissingPathParam(err)
    }
}

/// Build the method, URL, headers and body for one call of `route`.
///
/// ```rust
/// use contract_router::client::{build_request, ClientArgs, ClientOptions};
/// use contract_router::contract::AppRoute;
/// use serde_json::json;
///
/// let route = AppRoute::get("/posts/:id").build().unwrap();
/// let req = build_request(
///     &route,
///     &ClientArgs::new().param("id", "a b").query("expand", json!(["author"])),
///     &ClientOptions::new("http://api.test/"),
/// )
/// .unwrap();
/// assert_eq!(req.url, "http://api.test/posts/a%20b?expand%5B0%5D=author");
/// ```
pub fn build_request(
    route: &AppRoute,
    args: &ClientArgs,
    options: &ClientOptions,
) -> Result<ClientRequest, ClientError> {
    let path = insert_params(&route.path, |name| args.params.get(name).cloned())?;
    let mut url = format!("{}{}", options.base_url.trim_end_matches('/'), path);

    let query = if options.json_query {
        encode_json_query(&args.query)
    } else {
        encode_query(&args.query)
    };
    if !query.is_empty() {
        url.push('?');
        url.push_str(&query);
    }

    let mut headers: BTreeMap<String, String> = options
        .base_headers
        .iter()
        .map(|(k, v)| (k.to_ascii_lowercase(), v.clone()))
        .collect();
    headers.extend(
        args.headers
            .iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v.clone())),
    );

    let body = match &route.body {
        Some(RequestBody::Schema(_)) | Some(RequestBody::Unchecked) => args.body.clone(),
        Some(RequestBody::NoBody) | None => None,
    };
    if body.is_some() {
        headers
            .entry("content-type".to_string())
            .or_insert_with(|| "application/json".to_string());
    }

    Ok(ClientRequest {
        method: route.method,
        url,
        headers,
        body,
    })
}

/// Contract-driven client over a pluggable [`Transport`].
///
/// Routes are addressed by their dotted key (`posts.get`). No retries or
/// timeouts are applied here; configure them on the transport.
pub struct Client<T: Transport = ReqwestTransport> {
    contract: ContractRouter,
    options: ClientOptions,
    transport: T,
}

impl Client<ReqwestTransport> {
    /// Client using a default [`ReqwestTransport`].
    pub fn with_reqwest(contract: ContractRouter, options: ClientOptions) -> Self {
        Self::new(contract, options, ReqwestTransport::new())
    }
}

impl<T: Transport> Client<T> {
    pub fn new(contract: ContractRouter, options: ClientOptions, transport: T) -> Self {
        Self {
            contract,
            options,
            transport,
        }
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn route(&self, key: &str) -> Option<&Arc<AppRoute>> {
        let keys: Vec<&str> = key.split('.').collect();
        self.contract.find(&keys)
    }

    /// Call the route at `key`.
    pub async fn call(&self, key: &str, args: ClientArgs) -> Result<ClientResponse, ClientError> {
        let route = self
            .route(key)
            .ok_or_else(|| ClientError::UnknownRoute(key.to_string()))?;
        let request = build_request(route, &args, &self.options)?;
        debug!(operation = key, method = %request.method, url = %request.url, "Sending request");

        let mut response = self.transport.send(request).await?;
        debug!(operation = key, status = response.status, "Received response");

        if self.options.validate_response {
            match parse_response_body(route, response.status, &response.body) {
                Ok(body) => response.body = body,
                Err(err) => {
                    warn!(operation = key, status = response.status, error = %err, "Response failed validation");
                    return Err(ClientError::ResponseValidation(err));
                }
            }
        }
        Ok(response)
    }
}
