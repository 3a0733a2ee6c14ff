//! Schema-typed resources.
//!
//! A [`Resource`] wraps a JSON object ([`ObjectResource`]) or array
//! ([`ArrayResource`]) together with the schema that describes it. Nested
//! objects and arrays whose sub-schema can be located are wrapped into child
//! resources, so the tree mirrors the JSON structure and each node carries
//! its own schema and links.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use reqwest::blocking::Response;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::binding::Link;
use crate::error::{Error, ValidateError};
use crate::href::resolve_url;
use crate::schema::{profile_content_type, profile_from_headers, Schema};
use crate::session::{RequestOptions, Session};
use crate::types::{is_write_method, json_type_name, Payload, JSON_CONTENT_TYPE};
use crate::validator::validate_against_schema;

/// A value inside a resource: plain JSON or a wrapped child resource.
#[derive(Debug, Clone)]
pub enum Item {
    Value(Value),
    Resource(Resource),
}

impl Item {
    /// Wrap `data`: arrays and objects become resources, scalars pass
    /// through unwrapped.
    pub fn from_data(
        url: impl Into<String>,
        data: Value,
        schema: Option<Schema>,
        session: Option<Session>,
    ) -> Result<Item, Error> {
        let context = Context {
            url: url.into(),
            schema,
            session,
            response: None,
        };
        match data {
            Value::Object(map) => Ok(Item::Resource(Resource::Object(ObjectResource::wrap(
                context, map,
            )?))),
            Value::Array(items) => Ok(Item::Resource(Resource::Array(ArrayResource::wrap(
                context, items,
            )?))),
            scalar => Ok(Item::Value(scalar)),
        }
    }

    pub fn as_resource(&self) -> Option<&Resource> {
        match self {
            Item::Resource(resource) => Some(resource),
            Item::Value(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Item::Value(value) => Some(value),
            Item::Resource(_) => None,
        }
    }

    pub fn is_resource(&self) -> bool {
        matches!(self, Item::Resource(_))
    }

    /// The JSON this item stands for.
    pub fn to_value(&self) -> Value {
        match self {
            Item::Value(value) => value.clone(),
            Item::Resource(resource) => resource.to_value(),
        }
    }
}

impl Serialize for Item {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Item::Value(value) => value.serialize(serializer),
            Item::Resource(resource) => resource.serialize(serializer),
        }
    }
}

#[derive(Debug, Clone)]
struct Context {
    url: String,
    schema: Option<Schema>,
    session: Option<Session>,
    /// Set on resources built from a response; children have none.
    response: Option<Arc<ResponseMeta>>,
}

#[derive(Debug)]
struct ResponseMeta {
    status: StatusCode,
    headers: HeaderMap,
}

impl Context {
    fn child(&self, schema: Schema) -> Context {
        Context {
            url: self.url.clone(),
            schema: Some(schema),
            session: self.session.clone(),
            response: None,
        }
    }
}

/// Wrap `value` with `schema` if it is a collection and a schema was found.
fn wrap_child(context: &Context, value: Value, schema: Option<Schema>) -> Result<Item, Error> {
    match schema {
        Some(schema) if value.is_object() || value.is_array() => {
            let child = context.child(schema);
            Item::from_data(child.url, value, child.schema, child.session)
        }
        _ => Ok(Item::Value(value)),
    }
}

fn is_collection(value: &Value) -> bool {
    value.is_object() || value.is_array()
}

/// Resource backed by a JSON object.
#[derive(Debug, Clone)]
pub struct ObjectResource {
    context: Context,
    data: IndexMap<String, Item>,
}

impl ObjectResource {
    fn wrap(context: Context, map: Map<String, Value>) -> Result<Self, Error> {
        let mut data = IndexMap::with_capacity(map.len());
        for (key, value) in map {
            let schema = match &context.schema {
                Some(schema) if is_collection(&value) => schema.property(&key)?,
                _ => None,
            };
            let item = wrap_child(&context, value, schema)?;
            data.insert(key, item);
        }
        Ok(Self { context, data })
    }

    pub fn get(&self, key: &str) -> Option<&Item> {
        self.data.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Item)> {
        self.data.iter()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Top-level data as JSON, used to fill link templates.
    fn state(&self) -> Map<String, Value> {
        self.data
            .iter()
            .map(|(key, item)| (key.clone(), item.to_value()))
            .collect()
    }
}

/// Resource backed by a JSON array.
#[derive(Debug, Clone)]
pub struct ArrayResource {
    context: Context,
    data: Vec<Item>,
}

impl ArrayResource {
    fn wrap(context: Context, items: Vec<Value>) -> Result<Self, Error> {
        let mut data = Vec::with_capacity(items.len());
        for (index, value) in items.into_iter().enumerate() {
            let schema = match &context.schema {
                Some(schema) if is_collection(&value) => schema.items(index)?,
                _ => None,
            };
            data.push(wrap_child(&context, value, schema)?);
        }
        Ok(Self { context, data })
    }

    pub fn get(&self, index: usize) -> Option<&Item> {
        self.data.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.data.iter()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A JSON object or array paired with its schema and session.
#[derive(Debug, Clone)]
pub enum Resource {
    Object(ObjectResource),
    Array(ArrayResource),
}

/// Settings for [`Resource::rel`].
#[derive(Debug, Clone, Default)]
pub struct RelOptions {
    /// Template variables; those the template does not use become query
    /// parameters.
    pub params: Map<String, Value>,
    /// Body for POST, PUT and PATCH.
    pub data: Option<Payload>,
    pub headers: HeaderMap,
    pub timeout: Option<Duration>,
}

impl RelOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn params(mut self, params: Map<String, Value>) -> Self {
        self.params.extend(params);
        self
    }

    pub fn data(mut self, data: impl Into<Payload>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Resource {
    /// Wrap `data` as a resource; see [`Item::from_data`].
    pub fn from_data(
        url: impl Into<String>,
        data: Value,
        schema: Option<Schema>,
        session: Option<Session>,
    ) -> Result<Item, Error> {
        Item::from_data(url, data, schema, session)
    }

    /// Build a resource from an HTTP response.
    ///
    /// The schema is `schema` if given, otherwise a lazy schema named by the
    /// `profile` content-type parameter. A body that is not a JSON object
    /// or array yields an empty object resource.
    pub fn from_response(
        response: Response,
        session: &Session,
        schema: Option<Schema>,
    ) -> Result<Resource, Error> {
        let url = response.url().to_string();
        let meta = ResponseMeta {
            status: response.status(),
            headers: response.headers().clone(),
        };
        let schema = match schema {
            Some(schema) => Some(schema),
            None => profile_from_headers(response.headers())
                .map(|profile| session.lazy_schema(&resolve_url(&url, &profile))),
        };

        let text = response.text().map_err(|source| Error::Network {
            url: url.clone(),
            source,
        })?;
        let data = match serde_json::from_str::<Value>(&text) {
            Ok(data) if is_collection(&data) => data,
            Ok(other) => {
                debug!(url, kind = json_type_name(&other), "body is not a collection");
                Value::Null
            }
            Err(err) => {
                debug!(url, %err, "body is not JSON");
                Value::Null
            }
        };

        let context = Context {
            url,
            schema,
            session: Some(session.clone()),
            response: Some(Arc::new(meta)),
        };
        match data {
            Value::Array(items) => Ok(Resource::Array(ArrayResource::wrap(context, items)?)),
            Value::Object(map) => Ok(Resource::Object(ObjectResource::wrap(context, map)?)),
            _ => Ok(Resource::Object(ObjectResource::wrap(context, Map::new())?)),
        }
    }

    fn context(&self) -> &Context {
        match self {
            Resource::Object(resource) => &resource.context,
            Resource::Array(resource) => &resource.context,
        }
    }

    pub fn url(&self) -> &str {
        &self.context().url
    }

    pub fn schema(&self) -> Option<&Schema> {
        self.context().schema.as_ref()
    }

    /// Status of the response this resource was built from.
    pub fn status(&self) -> Option<StatusCode> {
        self.context().response.as_ref().map(|meta| meta.status)
    }

    /// Headers of the response this resource was built from.
    pub fn headers(&self) -> Option<&HeaderMap> {
        self.context().response.as_ref().map(|meta| &meta.headers)
    }

    /// The resource's session, falling back to its schema's session.
    pub fn session(&self) -> Option<Session> {
        let context = self.context();
        context
            .session
            .clone()
            .or_else(|| context.schema.as_ref().and_then(|s| s.session().ok()))
    }

    pub fn as_object(&self) -> Option<&ObjectResource> {
        match self {
            Resource::Object(resource) => Some(resource),
            Resource::Array(_) => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayResource> {
        match self {
            Resource::Array(resource) => Some(resource),
            Resource::Object(_) => None,
        }
    }

    /// Value under `key` of an object resource.
    pub fn get(&self, key: &str) -> Option<&Item> {
        self.as_object().and_then(|resource| resource.get(key))
    }

    /// Element `index` of an array resource.
    pub fn index(&self, index: usize) -> Option<&Item> {
        self.as_array().and_then(|resource| resource.get(index))
    }

    /// Keys of an object resource; empty for arrays.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.as_object().into_iter().flat_map(ObjectResource::keys)
    }

    /// Values in order: object values or array elements.
    pub fn iter(&self) -> Box<dyn Iterator<Item = &Item> + '_> {
        match self {
            Resource::Object(resource) => Box::new(resource.data.values()),
            Resource::Array(resource) => Box::new(resource.data.iter()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Resource::Object(resource) => resource.len(),
            Resource::Array(resource) => resource.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Unwrap the whole tree back into JSON.
    pub fn to_value(&self) -> Value {
        match self {
            Resource::Object(resource) => Value::Object(resource.state()),
            Resource::Array(resource) => {
                Value::Array(resource.data.iter().map(Item::to_value).collect())
            }
        }
    }

    /// Validate the data against the schema.
    ///
    /// A resource without schema is always valid.
    pub fn validate(&self) -> Result<(), ValidateError> {
        match self.schema() {
            Some(schema) => validate_against_schema(schema, &self.to_value()),
            None => Ok(()),
        }
    }

    /// Whether the data conforms to the schema. Never fails: schema,
    /// network and validation errors all read as `false`.
    pub fn is_valid(&self) -> bool {
        match self.validate() {
            Ok(()) => true,
            Err(err) => {
                debug!(url = self.url(), %err, "resource is not valid");
                false
            }
        }
    }

    /// Links declared by the schema, keyed by relation name. The first
    /// declaration of a name wins.
    pub fn relations(&self) -> Result<IndexMap<String, Link>, Error> {
        let mut relations = IndexMap::new();
        if let Some(schema) = self.schema() {
            for link in schema.links()? {
                relations.entry(link.rel.clone()).or_insert(link);
            }
        }
        Ok(relations)
    }

    pub fn has_rel(&self, name: &str) -> bool {
        self.schema()
            .and_then(|schema| schema.get_link(name).ok().flatten())
            .is_some()
    }

    /// Invoke the relation `name`.
    ///
    /// The link href is expanded from `options.params` and the resource's
    /// top-level data (params win); params the template does not use are
    /// sent as query parameters. Relative hrefs are joined to the resource
    /// URL.
    ///
    /// # Errors
    ///
    /// `Error::MissingRelation` if the schema declares no such link; any
    /// request failure is returned as is.
    pub fn rel(&self, name: &str, options: RelOptions) -> Result<Resource, Error> {
        let missing = || Error::MissingRelation {
            rel: name.to_string(),
            url: self.url().to_string(),
        };
        let schema = self.schema().ok_or_else(missing)?;
        let link = schema.get_link(name)?.ok_or_else(missing)?;
        let session = self.session().ok_or_else(|| Error::NoSession {
            url: self.url().to_string(),
        })?;

        let state = match self {
            Resource::Object(resource) => resource.state(),
            Resource::Array(_) => Map::new(),
        };
        let mut bound = link.bind(&state, &options.params)?;
        bound.url = resolve_url(self.url(), &bound.url);
        debug!(rel = name, method = %bound.method, url = %bound.url, "following link");

        let mut request = RequestOptions {
            headers: options.headers,
            timeout: options.timeout,
            ..RequestOptions::default()
        };
        if let Some(payload) = options.data {
            if is_write_method(&bound.method) {
                let (body, content_type) = payload.into_body()?;
                if !request.headers.contains_key(CONTENT_TYPE) {
                    let value = HeaderValue::from_str(&content_type).map_err(|_| {
                        Error::InvalidHeader {
                            name: CONTENT_TYPE.to_string(),
                        }
                    })?;
                    request.headers.insert(CONTENT_TYPE, value);
                }
                request.body = Some(body);
            } else {
                warn!(rel = name, method = %bound.method, "ignoring body for method without one");
            }
        }

        let response = session.send(bound, request)?;
        Resource::from_response(response, &session, None)
    }

    /// Content type for sending this resource as a body.
    pub(crate) fn content_type(&self) -> String {
        match self.schema() {
            Some(schema) => profile_content_type(schema),
            None => JSON_CONTENT_TYPE.to_string(),
        }
    }
}

impl Serialize for Resource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Resource::Object(resource) => {
                let mut map = serializer.serialize_map(Some(resource.data.len()))?;
                for (key, item) in &resource.data {
                    map.serialize_entry(key, item)?;
                }
                map.end()
            }
            Resource::Array(resource) => {
                let mut seq = serializer.serialize_seq(Some(resource.data.len()))?;
                for item in &resource.data {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}
