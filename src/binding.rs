//! Link descriptors and their binding to concrete requests.
//!
//! A link `{rel, href, method}` becomes a [`BoundRequest`] by expanding the
//! href template. Two binding styles exist:
//!
//! - [`Link::bind`] (permissive, used by [`Resource::rel`](crate::Resource::rel)):
//!   variables are filled from caller params first and resource data second;
//!   params the template does not consume become query parameters.
//! - [`Link::bind_strict`]: every param must be a template variable, for
//!   fixed-path clients.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, ParameterError};
use crate::template::UriTemplate;

/// A schema-declared hypermedia link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub rel: String,
    /// URI template of the target.
    pub href: String,
    /// HTTP verb; GET when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Schema of the request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

/// A link with its template expanded, ready to send.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundRequest {
    pub method: Method,
    pub url: String,
    /// Caller params not consumed by the template.
    pub query: Vec<(String, String)>,
}

impl Link {
    pub fn new(rel: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            rel: rel.into(),
            href: href.into(),
            method: None,
            schema: None,
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// The link's HTTP method, case-insensitive, defaulting to GET.
    pub fn method(&self) -> Result<Method, Error> {
        match &self.method {
            None => Ok(Method::GET),
            Some(method) => Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                .map_err(|_| Error::InvalidMethod {
                    method: method.clone(),
                }),
        }
    }

    pub fn template(&self) -> Result<UriTemplate, Error> {
        Ok(UriTemplate::parse(&self.href)?)
    }

    /// Permissive binding.
    ///
    /// `state` is the resource's own data; `params` win over it for template
    /// variables. Params that name no variable are promoted to the query.
    pub fn bind(
        &self,
        state: &Map<String, Value>,
        params: &Map<String, Value>,
    ) -> Result<BoundRequest, Error> {
        let template = self.template()?;
        let variables = template.variables();

        let mut context = state.clone();
        for (key, value) in params {
            context.insert(key.clone(), value.clone());
        }

        let leftover: Map<String, Value> = params
            .iter()
            .filter(|(key, _)| !variables.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok(BoundRequest {
            method: self.method()?,
            url: template.expand(&context)?,
            query: query_pairs(&leftover),
        })
    }

    /// Strict binding: unknown params are an error.
    pub fn bind_strict(&self, params: &Map<String, Value>) -> Result<BoundRequest, Error> {
        let template = self.template()?;
        let valid: Vec<String> = template.variables().into_iter().map(String::from).collect();
        let wrong: Vec<String> = params
            .keys()
            .filter(|key| !valid.contains(key))
            .cloned()
            .collect();

        if !wrong.is_empty() {
            let mismatch = if valid.is_empty() {
                ParameterError::NoneAccepted { wrong }
            } else {
                ParameterError::Wrong { wrong, valid }
            };
            return Err(mismatch.into());
        }
        if params.is_empty() && !valid.is_empty() {
            return Err(ParameterError::Missing { valid }.into());
        }

        Ok(BoundRequest {
            method: self.method()?,
            url: template.expand(params)?,
            query: Vec::new(),
        })
    }
}

/// Flatten params into `key=value` query pairs.
///
/// Arrays repeat the key, nulls are dropped, objects are sent as JSON text.
pub fn query_pairs(params: &Map<String, Value>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in params {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items {
                    if let Some(text) = query_text(item) {
                        pairs.push((key.clone(), text));
                    }
                }
            }
            other => {
                if let Some(text) = query_text(other) {
                    pairs.push((key.clone(), text));
                }
            }
        }
    }
    pairs
}

fn query_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
