//! # Configuration Module
//!
//! Server-side options consumed by the dispatcher.
//!
//! ## Overview
//!
//! [`ServerOptions`] controls query decoding, which request slots are
//! validated, whether responses are enforced, and how validation failures are
//! turned into responses. Options can be built in code, loaded from a
//! YAML/JSON/TOML file, or read from the environment.
//!
//! ## Environment Variables
//!
//! | Variable | Option | Default |
//! |----------|--------|---------|
//! | `CONTRACT_JSON_QUERY` | `json_query` | `false` |
//! | `CONTRACT_VALIDATE_PATH_PARAMS` | `validate_path_params` | `true` |
//! | `CONTRACT_VALIDATE_REQUEST_HEADERS` | `validate_request_headers` | `true` |
//! | `CONTRACT_VALIDATE_REQUEST_QUERY` | `validate_request_query` | `true` |
//! | `CONTRACT_VALIDATE_REQUEST_BODY` | `validate_request_body` | `true` |
//! | `CONTRACT_VALIDATE_RESPONSES` | `validate_responses` | `false` |
//!
//! Booleans accept `1/0`, `true/false`, `on/off` and `yes/no`. Unparseable
//! values are logged and ignored.
//!
//! ## File format
//!
//! ```yaml
//! jsonQuery: true
//! validateRequestBody: true
//! validateResponses: true
//! ```
//!
//! Error handlers cannot be expressed in a file; they default to the combined
//! 400 payload and the generic 500.

use crate::contract::AppRoute;
use crate::request::{RequestValidationError, ValidationOptions};
use crate::response::{HandlerResponse, ResponseValidationError};
use anyhow::Context;
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Formats a request validation failure into a response.
pub type RequestErrorFormatter =
    Arc<dyn Fn(&RequestValidationError, &AppRoute) -> HandlerResponse + Send + Sync>;

/// Formats a response validation failure into a response.
pub type ResponseErrorFormatter =
    Arc<dyn Fn(&ResponseValidationError, &AppRoute) -> HandlerResponse + Send + Sync>;

/// How request validation failures become responses.
#[derive(Clone, Default)]
pub enum RequestValidationErrorHandler {
    /// 400 with `{ pathParameterErrors, headerErrors, queryParameterErrors, bodyErrors }`
    #[default]
    Combined,
    Custom(RequestErrorFormatter),
}

impl RequestValidationErrorHandler {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&RequestValidationError, &AppRoute) -> HandlerResponse + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    pub fn respond(&self, error: &RequestValidationError, route: &AppRoute) -> HandlerResponse {
        match self {
            Self::Combined => HandlerResponse::json(400, error.to_json()),
            Self::Custom(f) => f(error, route),
        }
    }
}

impl fmt::Debug for RequestValidationErrorHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Combined => f.write_str("Combined"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// How response validation failures become responses.
#[derive(Clone, Default)]
pub enum ResponseValidationErrorHandler {
    /// 500 with `{ "message": "Server Error" }`; validation details stay internal
    #[default]
    Generic,
    Custom(ResponseErrorFormatter),
}

impl ResponseValidationErrorHandler {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&ResponseValidationError, &AppRoute) -> HandlerResponse + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    pub fn respond(&self, error: &ResponseValidationError, route: &AppRoute) -> HandlerResponse {
        match self {
            Self::Generic => HandlerResponse::json(500, json!({ "message": "Server Error" })),
            Self::Custom(f) => f(error, route),
        }
    }
}

impl fmt::Debug for ResponseValidationErrorHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generic => f.write_str("Generic"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Per-route validation toggles. `Some` overrides the server-wide setting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValidationOverrides {
    pub validate_path_params: Option<bool>,
    pub validate_request_headers: Option<bool>,
    pub validate_request_query: Option<bool>,
    pub validate_request_body: Option<bool>,
    pub validate_responses: Option<bool>,
}

impl ValidationOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Options consumed by the dispatcher.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerOptions {
    pub json_query: bool,
    pub validate_path_params: bool,
    pub validate_request_headers: bool,
    pub validate_request_query: bool,
    pub validate_request_body: bool,
    pub validate_responses: bool,
    #[serde(skip)]
    pub request_validation_error_handler: RequestValidationErrorHandler,
    #[serde(skip)]
    pub response_validation_error_handler: ResponseValidationErrorHandler,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            json_query: false,
            validate_path_params: true,
            validate_request_headers: true,
            validate_request_query: true,
            validate_request_body: true,
            validate_responses: false,
            request_validation_error_handler: RequestValidationErrorHandler::Combined,
            response_validation_error_handler: ResponseValidationErrorHandler::Generic,
        }
    }
}

impl ServerOptions {
    /// Defaults overlaid with `CONTRACT_*` environment variables.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Load options from a YAML, JSON or TOML file (by extension).
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read options file {}", path.display()))?;
        let options = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&contents)
                .with_context(|| format!("failed to parse YAML options in {}", path.display()))?,
            Some("toml") => toml::from_str(&contents)
                .with_context(|| format!("failed to parse TOML options in {}", path.display()))?,
            _ => serde_json::from_str(&contents)
                .with_context(|| format!("failed to parse JSON options in {}", path.display()))?,
        };
        Ok(options)
    }

    /// Apply any `CONTRACT_*` environment variables on top of `self`.
    pub fn with_env_overrides(mut self) -> Self {
        self.with_lookup(|key| std::env::var(key).ok());
        self
    }

    fn with_lookup<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let fields: [(&str, &mut bool); 6] = [
            ("CONTRACT_JSON_QUERY", &mut self.json_query),
            ("CONTRACT_VALIDATE_PATH_PARAMS", &mut self.validate_path_params),
            ("CONTRACT_VALIDATE_REQUEST_HEADERS", &mut self.validate_request_headers),
            ("CONTRACT_VALIDATE_REQUEST_QUERY", &mut self.validate_request_query),
            ("CONTRACT_VALIDATE_REQUEST_BODY", &mut self.validate_request_body),
            ("CONTRACT_VALIDATE_RESPONSES", &mut self.validate_responses),
        ];
        for (key, field) in fields {
            let Some(raw) = lookup(key) else { continue };
            match parse_bool(&raw) {
                Some(value) => *field = value,
                None => tracing::warn!(variable = key, value = %raw, "Ignoring non-boolean value"),
            }
        }
    }

    #[must_use]
    pub fn with_request_error_handler(mut self, handler: RequestValidationErrorHandler) -> Self {
        self.request_validation_error_handler = handler;
        self
    }

    #[must_use]
    pub fn with_response_error_handler(mut self, handler: ResponseValidationErrorHandler) -> Self {
        self.response_validation_error_handler = handler;
        self
    }

    /// Request validation settings for one route.
    pub fn validation_for(&self, overrides: &ValidationOverrides) -> ValidationOptions {
        ValidationOptions {
            json_query: self.json_query,
            path_params: overrides
                .validate_path_params
                .unwrap_or(self.validate_path_params),
            headers: overrides
                .validate_request_headers
                .unwrap_or(self.validate_request_headers),
            query: overrides
                .validate_request_query
                .unwrap_or(self.validate_request_query),
            body: overrides
                .validate_request_body
                .unwrap_or(self.validate_request_body),
        }
    }

    /// Whether responses of one route are checked against their schemas.
    pub fn validate_responses_for(&self, overrides: &ValidationOverrides) -> bool {
        overrides.validate_responses.unwrap_or(self.validate_responses)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}
