//! Core types shared by sessions and resources.

use reqwest::Method;
use serde_json::Value;

use crate::error::Error;
use crate::resource::Resource;

/// Content type sent with every request unless the caller overrides it.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Returns the JSON type name for log and error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Methods that carry a JSON body.
pub fn is_write_method(method: &Method) -> bool {
    *method == Method::POST || *method == Method::PUT || *method == Method::PATCH
}

/// Credentials rendered as `Authorization: <kind> <credentials>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Auth {
    /// Scheme, e.g. `Bearer` or `Basic`.
    pub kind: String,
    pub credentials: String,
}

impl Auth {
    pub fn new(kind: impl Into<String>, credentials: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            credentials: credentials.into(),
        }
    }

    /// Value of the `Authorization` header.
    pub fn header_value(&self) -> String {
        format!("{} {}", self.kind, self.credentials)
    }
}

/// Body of a write operation.
///
/// A [`Resource`] payload is sent with its own profile as content type.
#[derive(Debug, Clone)]
pub enum Payload {
    Json(Value),
    Resource(Resource),
}

impl Payload {
    /// Serialize to bytes and pick the content type.
    pub(crate) fn into_body(self) -> Result<(Vec<u8>, String), Error> {
        match self {
            Payload::Json(value) => {
                let body =
                    serde_json::to_vec(&value).map_err(|source| Error::Serialize { source })?;
                Ok((body, JSON_CONTENT_TYPE.to_string()))
            }
            Payload::Resource(resource) => {
                let body =
                    serde_json::to_vec(&resource).map_err(|source| Error::Serialize { source })?;
                Ok((body, resource.content_type()))
            }
        }
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Json(value)
    }
}

impl From<Resource> for Payload {
    fn from(resource: Resource) -> Self {
        Payload::Resource(resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn auth_header_value() {
        let auth = Auth::new("Bearer", "s3cr3t");
        assert_eq!(auth.header_value(), "Bearer s3cr3t");
    }

    #[test]
    fn write_methods() {
        assert!(is_write_method(&Method::POST));
        assert!(is_write_method(&Method::PUT));
        assert!(is_write_method(&Method::PATCH));
        assert!(!is_write_method(&Method::GET));
        assert!(!is_write_method(&Method::DELETE));
    }

    #[test]
    fn json_payload_body() {
        let (body, content_type) = Payload::from(json!({"name": "repos"}))
            .into_body()
            .unwrap();
        assert_eq!(body, br#"{"name":"repos"}"#.to_vec());
        assert_eq!(content_type, JSON_CONTENT_TYPE);
    }

    #[test]
    fn type_names() {
        assert_eq!(json_type_name(&json!(1)), "number");
        assert_eq!(json_type_name(&json!([])), "array");
        assert_eq!(json_type_name(&json!(null)), "null");
    }
}
