//! Error types for schema resolution, link binding and validation.

use thiserror::Error;

/// Errors raised by sessions, schemas and resources.
///
/// Network and pointer failures propagate unchanged. Unparsable resource
/// bodies and failed validation never show up here; they are reported as
/// empty data and `false` respectively.
#[derive(Debug, Error)]
pub enum Error {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid JSON document at {url}: {source}")]
    InvalidJson {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot resolve pointer \"{pointer}\" in {href}")]
    PointerResolution { href: String, pointer: String },

    #[error("circular $ref chain starting at {href}")]
    CircularReference { href: String },

    #[error("resource at {url} has no relation named \"{rel}\"")]
    MissingRelation { rel: String, url: String },

    #[error(transparent)]
    Parameters(#[from] ParameterError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("invalid HTTP method \"{method}\"")]
    InvalidMethod { method: String },

    #[error("session for {href} was dropped before the schema could be loaded")]
    SessionClosed { href: String },

    #[error("resource at {url} is not attached to a session")]
    NoSession { url: String },

    #[error("invalid value for header \"{name}\"")]
    InvalidHeader { name: String },

    #[error("cannot build HTTP client: {source}")]
    Client {
        #[source]
        source: reqwest::Error,
    },

    #[error("cannot serialize request body: {source}")]
    Serialize {
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// True for failures that came from the HTTP layer.
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Network { .. })
    }
}

/// Caller parameters that do not fit a link's template in strict binding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParameterError {
    #[error("Wrong parameters: {}. Valid parameters: {}", quoted(wrong), quoted(valid))]
    Wrong {
        wrong: Vec<String>,
        valid: Vec<String>,
    },

    #[error("Wrong parameters: {}. This method takes no parameter.", quoted(wrong))]
    NoneAccepted { wrong: Vec<String> },

    #[error("You did not set any parameter. Valid parameters: {}", quoted(valid))]
    Missing { valid: Vec<String> },
}

fn quoted(names: &[String]) -> String {
    names
        .iter()
        .map(|name| format!("\"{}\"", name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Malformed or unexpandable RFC 6570 URI templates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("invalid URI template \"{template}\": {message}")]
    Invalid { template: String, message: String },

    #[error("cannot expand URI template \"{template}\": {message}")]
    Expand { template: String, message: String },
}

/// Errors during payload validation.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error(transparent)]
    Resolve(#[from] Error),

    #[error("invalid schema: {message}")]
    InvalidSchema { message: String },

    #[error("validation failed with {} error(s)", errors.len())]
    Invalid { errors: Vec<SchemaError> },
}

/// Single validation error with path context.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SchemaError {
    /// JSON Pointer (RFC 6901) to the invalid field.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}
