use super::core::{ClientError, ClientRequest, ClientResponse};
use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::BTreeMap;

/// Sends a built [`ClientRequest`] and decodes the reply.
pub trait Transport: Send + Sync {
    fn send(&self, request: ClientRequest) -> BoxFuture<'_, Result<ClientResponse, ClientError>>;
}

/// [`Transport`] backed by a `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured client (timeouts, proxies, TLS roots)
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: ClientRequest) -> BoxFuture<'_, Result<ClientResponse, ClientError>> {
        Box::pin(async move {
            let mut builder = self.client.request(request.method.to_http(), &request.url);
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(body) = &request.body {
                builder = builder.json(body);
            }

            let response = builder
                .send()
                .await
                .map_err(|e| ClientError::Transport(Box::new(e)))?;

            let status = response.status().as_u16();
            let headers: BTreeMap<String, String> = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect();
            let bytes = response
                .bytes()
                .await
                .map_err(|e| ClientError::Transport(Box::new(e)))?;

            let body = decode_body(headers.get("content-type").map(String::as_str), &bytes);
            Ok(ClientResponse {
                status,
                headers,
                body,
            })
        })
    }
}

/// JSON when the content type is JSON and the bytes parse, otherwise text.
pub(crate) fn decode_body(content_type: Option<&str>, bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    let is_json = content_type
        .map(|ct| ct.split(';').next().unwrap_or("").trim())
        .is_some_and(|ct| ct == "application/json" || ct.ends_with("+json"));
    if is_json {
        if let Ok(value) = serde_json::from_slice(bytes) {
            return value;
        }
    }
    Value::String(String::from_utf8_lossy(bytes).into_owned())
}
