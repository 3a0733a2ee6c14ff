//! Payload validation against session-owned schemas.

use serde_json::{json, Value};
use tracing::trace;

use crate::error::{SchemaError, ValidateError};
use crate::href::{is_url, split_href};
use crate::schema::{is_addressable, Schema};
use crate::session::Session;

/// Fetches `http(s)` references through the owning session, so the session
/// headers, credentials and timeout apply and loaded documents are reused.
struct SessionRetriever {
    session: Session,
}

impl jsonschema::Retrieve for SessionRetriever {
    fn retrieve(
        &self,
        uri: &jsonschema::Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let (url, _) = split_href(uri.as_str());
        if !is_url(url) {
            return Err(format!("cannot retrieve {}: only http(s) references are fetched", url).into());
        }
        trace!(url, "retrieving referenced schema");
        Ok(self.session.lazy_schema(url).raw()?)
    }
}

/// Validate `payload` against `schema`.
///
/// Addressable schemas are validated through a `$ref` to their href so that
/// local and relative references resolve inside their own document.
///
/// # Errors
///
/// Returns `ValidateError::Resolve` if the schema cannot be loaded,
/// `ValidateError::InvalidSchema` if it is not a valid JSON Schema, or
/// `ValidateError::Invalid` if the payload doesn't match.
pub fn validate_against_schema(schema: &Schema, payload: &Value) -> Result<(), ValidateError> {
    let target = schema.dereference()?;
    let session = target.session()?;

    let document = if is_addressable(&target) {
        target.with_raw(|_| ())?;
        let reference = if target.pointer().is_empty() {
            target.url()
        } else {
            target.href()
        };
        json!({ "$ref": reference })
    } else {
        target.raw()?
    };

    let validator = jsonschema::options()
        .with_retriever(SessionRetriever { session })
        .build(&document)
        .map_err(|e| ValidateError::InvalidSchema {
            message: e.to_string(),
        })?;

    let errors: Vec<SchemaError> = validator
        .iter_errors(payload)
        .map(|e| SchemaError {
            path: e.instance_path.to_string(),
            message: e.to_string(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidateError::Invalid { errors })
    }
}
