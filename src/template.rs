//! RFC 6570 URI Templates over JSON values.
//!
//! Parsing and expansion are done by `iri-string`; this module maps JSON
//! params onto template values.

use std::fmt;
use std::str::FromStr;

use iri_string::spec::UriSpec;
use iri_string::template::simple_context::{SimpleContext, Value as TemplateValue};
use iri_string::template::UriTemplateStr;
use serde_json::{Map, Value};

use crate::error::TemplateError;

/// A validated URI Template such as `/apps/{name}/log{?fields*}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
    source: String,
}

impl UriTemplate {
    /// Parse a template.
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::Invalid` if `template` is not RFC 6570 syntax.
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        UriTemplateStr::new(template).map_err(|e| TemplateError::Invalid {
            template: template.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            source: template.to_string(),
        })
    }

    /// The template text as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    fn template(&self) -> Result<&UriTemplateStr, TemplateError> {
        UriTemplateStr::new(&self.source).map_err(|e| TemplateError::Invalid {
            template: self.source.clone(),
            message: e.to_string(),
        })
    }

    /// Declared variable names, in order of first appearance.
    pub fn variables(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        if let Ok(template) = self.template() {
            for name in template.variables() {
                let name = name.as_str();
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Expand the template against `context`.
    ///
    /// Variables missing from the context, or null, are undefined and
    /// expand to nothing.
    pub fn expand(&self, context: &Map<String, Value>) -> Result<String, TemplateError> {
        let template = self.template()?;
        let mut values = SimpleContext::new();
        for name in self.variables() {
            if let Some(value) = context.get(name) {
                values.insert(name, template_value(value));
            }
        }
        let expanded = template
            .expand::<UriSpec, _>(&values)
            .map_err(|e| TemplateError::Expand {
                template: self.source.clone(),
                message: e.to_string(),
            })?;
        Ok(expanded.to_string())
    }
}

fn template_value(value: &Value) -> TemplateValue {
    match value {
        Value::Null => TemplateValue::Undefined,
        Value::Array(items) => TemplateValue::List(items.iter().filter_map(scalar_text).collect()),
        Value::Object(map) => TemplateValue::Assoc(
            map.iter()
                .filter_map(|(k, v)| scalar_text(v).map(|v| (k.clone(), v)))
                .collect(),
        ),
        scalar => scalar_text(scalar).map_or(TemplateValue::Undefined, TemplateValue::String),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

impl FromStr for UriTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for UriTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
