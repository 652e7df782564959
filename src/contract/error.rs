use crate::schema::SchemaCompileError;
use std::fmt;

/// Contract authoring error
///
/// Returned while building routes, applying router options or loading a
/// contract document. Every variant is a programming error in the contract
/// and is reported before any request is served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractError {
    /// A `responses` key is not a valid HTTP status code
    InvalidStatusCode {
        /// `METHOD path` of the offending route
        route: String,
        status: u16,
    },
    /// More than one response spec was declared for the same status
    DuplicateStatus { route: String, status: u16 },
    /// Mutation routes (POST, PUT, PATCH, DELETE) must declare a body
    MissingBody { route: String },
    /// GET routes cannot declare a body
    UnexpectedBody { route: String },
    /// Path templates must start with `/` and use non-empty `:name` segments
    InvalidPath { route: String, reason: String },
    /// An embedded schema document failed to compile
    InvalidSchema {
        location: String,
        source: SchemaCompileError,
    },
    /// A contract document node has an unexpected shape
    InvalidDocument { location: String, reason: String },
}

impl fmt::Display for ContractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractError::InvalidStatusCode { route, status } => {
                write!(f, "{route}: {status} is not a valid HTTP status code")
            }
            ContractError::DuplicateStatus { route, status } => {
                write!(f, "{route}: response for status {status} declared more than once")
            }
            ContractError::MissingBody { route } => {
                write!(
                    f,
                    "{route}: mutation routes must declare a body (schema, unchecked or no body)"
                )
            }
            ContractError::UnexpectedBody { route } => {
                write!(f, "{route}: GET routes cannot declare a body")
            }
            ContractError::InvalidPath { route, reason } => {
                write!(f, "{route}: invalid path template ({reason})")
            }
            ContractError::InvalidSchema { location, source } => {
                write!(f, "{location}: {source}")
            }
            ContractError::InvalidDocument { location, reason } => {
                write!(f, "{location}: {reason}")
            }
        }
    }
}

impl std::error::Error for ContractError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ContractError::InvalidSchema { source, .. } => Some(source),
            _ => None,
        }
    }
}
