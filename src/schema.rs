//! Schema documents and `$ref` resolution.
//!
//! A [`Schema`] is identified by an `(url, pointer)` pair, written as the
//! href `url#pointer`. Every pointer into the same document shares one
//! [`Document`], and the session store hands out one `Schema` per href.
//! That identity is what makes self-referential schemas terminate: a
//! `{"$ref": "#"}` resolves to the root handle already in the store instead
//! of a fresh expansion.
//!
//! Documents created without content (a "lazy schema") are fetched through
//! the owning session the first time their content is needed.

use std::collections::HashSet;
use std::fmt;
use std::ops::Index;
use std::sync::{Arc, PoisonError, RwLock, Weak};

use indexmap::IndexMap;
use mime::Mime;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use serde_json::Value;
use tracing::{debug, trace};

use crate::binding::Link;
use crate::error::Error;
use crate::href::{child_pointer, is_url, join_href, navigate, navigate_mut, resolve_url, split_href};
use crate::session::{Session, SessionInner};

/// Content of one schema document, shared by every pointer into it.
#[derive(Debug)]
pub(crate) struct Document {
    url: String,
    lazy: bool,
    content: RwLock<Option<Value>>,
}

impl Document {
    pub(crate) fn new(url: &str, content: Option<Value>) -> Self {
        Self {
            url: url.to_string(),
            lazy: content.is_none(),
            content: RwLock::new(content),
        }
    }

    /// Fill the document if it has not been loaded yet.
    pub(crate) fn install(&self, raw: Value) {
        let mut content = self.content.write().unwrap_or_else(PoisonError::into_inner);
        if content.is_none() {
            debug!(url = %self.url, "schema document loaded");
            *content = Some(raw);
        }
    }

    fn is_loaded(&self) -> bool {
        self.content
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

/// A JSON Schema document or sub-document.
///
/// Equality is identity: two handles are equal when they are the same
/// store entry.
#[derive(Clone)]
pub struct Schema {
    inner: Arc<SchemaInner>,
}

struct SchemaInner {
    url: String,
    pointer: String,
    href: String,
    document: Arc<Document>,
    session: Weak<SessionInner>,
}

/// Resolved view of a schema: its raw content with every `$ref` mapping
/// replaced by the referenced [`Schema`].
#[derive(Debug, Clone)]
pub enum SchemaNode {
    Ref(Schema),
    Object(IndexMap<String, SchemaNode>),
    Array(Vec<SchemaNode>),
    Value(Value),
}

impl SchemaNode {
    pub fn get(&self, key: &str) -> Option<&SchemaNode> {
        match self {
            SchemaNode::Object(map) => map.get(key),
            _ => None,
        }
    }

    pub fn item(&self, index: usize) -> Option<&SchemaNode> {
        match self {
            SchemaNode::Array(items) => items.get(index),
            _ => None,
        }
    }

    pub fn as_schema(&self) -> Option<&Schema> {
        match self {
            SchemaNode::Ref(schema) => Some(schema),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            SchemaNode::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_str)
    }
}

static NULL: SchemaNode = SchemaNode::Value(Value::Null);

/// Missing keys and indices yield a null node, as with `serde_json::Value`.
impl Index<&str> for SchemaNode {
    type Output = SchemaNode;

    fn index(&self, key: &str) -> &SchemaNode {
        self.get(key).unwrap_or(&NULL)
    }
}

impl Index<usize> for SchemaNode {
    type Output = SchemaNode;

    fn index(&self, index: usize) -> &SchemaNode {
        self.item(index).unwrap_or(&NULL)
    }
}

/// What a sub-schema location holds.
enum Located {
    Missing,
    Ref(String),
    Inline,
}

impl Schema {
    /// Schema for `href` backed by an already loaded document.
    ///
    /// `raw` is the whole document; the pointer part of `href` selects the
    /// sub-document. Returns the existing instance if `href` is already
    /// registered in the session.
    pub fn new(session: &Session, href: &str, raw: Value) -> Schema {
        let (url, pointer) = split_href(href);
        session.schema_at(url, pointer, Some(raw))
    }

    /// Schema for `href` whose document is fetched on first access.
    pub fn lazy(session: &Session, href: &str) -> Schema {
        session.lazy_schema(href)
    }

    pub(crate) fn from_parts(
        url: &str,
        pointer: &str,
        document: Arc<Document>,
        session: Weak<SessionInner>,
    ) -> Schema {
        Schema {
            inner: Arc::new(SchemaInner {
                url: url.to_string(),
                pointer: pointer.to_string(),
                href: join_href(url, pointer),
                document,
                session,
            }),
        }
    }

    pub(crate) fn document(&self) -> &Arc<Document> {
        &self.inner.document
    }

    /// `url#pointer`.
    pub fn href(&self) -> &str {
        &self.inner.href
    }

    /// URL of the document.
    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// JSON Pointer into the document; empty for the root.
    pub fn pointer(&self) -> &str {
        &self.inner.pointer
    }

    /// True if the document was created without content.
    pub fn is_lazy(&self) -> bool {
        self.inner.document.lazy
    }

    pub fn is_loaded(&self) -> bool {
        self.inner.document.is_loaded()
    }

    /// The owning session, if it is still alive.
    pub fn session(&self) -> Result<Session, Error> {
        self.inner
            .session
            .upgrade()
            .map(Session::from_inner)
            .ok_or_else(|| Error::SessionClosed {
                href: self.href().to_string(),
            })
    }

    /// Fetch the document through the session unless already loaded.
    fn ensure_loaded(&self) -> Result<(), Error> {
        if self.is_loaded() {
            return Ok(());
        }
        let raw = self.session()?.fetch_json(self.url())?;
        self.inner.document.install(raw);
        Ok(())
    }

    fn pointer_error(&self) -> Error {
        Error::PointerResolution {
            href: self.href().to_string(),
            pointer: self.pointer().to_string(),
        }
    }

    /// Run `f` on the whole document, loading it first if needed.
    fn with_document<R>(&self, f: impl FnOnce(&Value) -> R) -> Result<R, Error> {
        self.ensure_loaded()?;
        let content = self
            .inner
            .document
            .content
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let root = content.as_ref().ok_or_else(|| self.pointer_error())?;
        Ok(f(root))
    }

    /// Run `f` on the raw sub-document, loading it first if needed.
    pub(crate) fn with_raw<R>(&self, f: impl FnOnce(&Value) -> R) -> Result<R, Error> {
        self.with_document(|root| navigate(root, self.pointer()).map(f))?
            .ok_or_else(|| self.pointer_error())
    }

    /// The raw sub-document this schema points at.
    ///
    /// # Errors
    ///
    /// `Error::PointerResolution` if the pointer does not exist, or the
    /// network error of a failed lazy fetch.
    pub fn raw(&self) -> Result<Value, Error> {
        self.with_raw(Value::clone)
    }

    /// Mutate the raw sub-document in place.
    ///
    /// Every schema sharing the document observes the change, and later
    /// validation runs against it.
    pub fn update<R>(&self, f: impl FnOnce(&mut Value) -> R) -> Result<R, Error> {
        self.ensure_loaded()?;
        let mut content = self
            .inner
            .document
            .content
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let root = content.as_mut().ok_or_else(|| self.pointer_error())?;
        let value = navigate_mut(root, self.pointer()).ok_or_else(|| self.pointer_error())?;
        Ok(f(value))
    }

    /// Resolve a `$ref` found in this schema's document.
    ///
    /// An empty URL part, or one equal to this document's URL, is a local
    /// reference and the pointer must exist. Any other URL yields a lazy
    /// schema; nothing is fetched until its content is read.
    pub fn resolve(&self, reference: &str) -> Result<Schema, Error> {
        let (url, pointer) = split_href(reference);
        let session = self.session()?;
        let url = if url.is_empty() {
            self.url().to_string()
        } else {
            resolve_url(self.url(), url)
        };

        if url == self.url() {
            let exists = self.with_document(|root| navigate(root, pointer).is_some())?;
            if !exists {
                return Err(Error::PointerResolution {
                    href: join_href(self.url(), pointer),
                    pointer: pointer.to_string(),
                });
            }
            return Ok(session.schema_at(self.url(), pointer, None));
        }
        trace!(from = self.href(), to = %url, "remote reference");
        Ok(session.schema_at(&url, pointer, None))
    }

    /// Follow a chain of `{"$ref": ...}` schemas to a concrete one.
    pub fn dereference(&self) -> Result<Schema, Error> {
        let mut current = self.clone();
        let mut seen = HashSet::new();
        loop {
            let reference = current.with_raw(|raw| ref_target(raw).map(str::to_owned))?;
            let Some(reference) = reference else {
                return Ok(current);
            };
            if !seen.insert(current.href().to_string()) {
                return Err(Error::CircularReference {
                    href: self.href().to_string(),
                });
            }
            current = current.resolve(&reference)?;
        }
    }

    /// Resolved view of this schema.
    ///
    /// Nested `$ref` mappings become [`SchemaNode::Ref`] handles; their own
    /// content is not expanded here, so cyclic references terminate.
    pub fn data(&self) -> Result<SchemaNode, Error> {
        let raw = self.raw()?;
        self.expand(&raw)
    }

    /// Resolved value of a top-level key.
    pub fn get(&self, key: &str) -> Result<Option<SchemaNode>, Error> {
        let raw = self.with_raw(|raw| raw.get(key).cloned())?;
        raw.map(|value| self.expand(&value)).transpose()
    }

    fn expand(&self, value: &Value) -> Result<SchemaNode, Error> {
        match value {
            Value::Object(map) => {
                if let Some(reference) = ref_target(value) {
                    return Ok(SchemaNode::Ref(self.resolve(reference)?));
                }
                let mut out = IndexMap::with_capacity(map.len());
                for (key, child) in map {
                    out.insert(key.clone(), self.expand(child)?);
                }
                Ok(SchemaNode::Object(out))
            }
            Value::Array(items) => Ok(SchemaNode::Array(
                items
                    .iter()
                    .map(|item| self.expand(item))
                    .collect::<Result<_, _>>()?,
            )),
            other => Ok(SchemaNode::Value(other.clone())),
        }
    }

    /// Declared links, in order. Malformed entries are skipped.
    pub fn links(&self) -> Result<Vec<Link>, Error> {
        let target = self.dereference()?;
        let raw = target.with_raw(|raw| raw.get("links").cloned())?;
        let Some(Value::Array(entries)) = raw else {
            return Ok(Vec::new());
        };
        Ok(entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<Link>(entry) {
                Ok(link) => Some(link),
                Err(err) => {
                    debug!(href = target.href(), %err, "skipping malformed link");
                    None
                }
            })
            .collect())
    }

    /// First link whose `rel` equals `name`.
    pub fn get_link(&self, name: &str) -> Result<Option<Link>, Error> {
        Ok(self.links()?.into_iter().find(|link| link.rel == name))
    }

    /// Sub-schema of property `key`, if declared.
    pub fn property(&self, key: &str) -> Result<Option<Schema>, Error> {
        let target = self.dereference()?;
        let pointer = child_pointer(target.pointer(), ["properties", key]);
        target.locate(&pointer)
    }

    /// Sub-schema for element `index` of an array.
    ///
    /// A single `items` schema applies to every element; a tuple-form
    /// `items` array is indexed.
    pub fn items(&self, index: usize) -> Result<Option<Schema>, Error> {
        let target = self.dereference()?;
        let tuple = target.with_raw(|raw| raw.get("items").map(Value::is_array))?;
        let pointer = match tuple {
            None => return Ok(None),
            Some(false) => child_pointer(target.pointer(), ["items"]),
            Some(true) => child_pointer(target.pointer(), ["items", &index.to_string()]),
        };
        target.locate(&pointer)
    }

    /// Schema at `pointer` in this document, without loading any document
    /// it refers to.
    fn locate(&self, pointer: &str) -> Result<Option<Schema>, Error> {
        let found = self.with_document(|root| match navigate(root, pointer) {
            Some(value) if value.is_object() => match ref_target(value) {
                Some(reference) => Located::Ref(reference.to_string()),
                None => Located::Inline,
            },
            _ => Located::Missing,
        })?;

        match found {
            Located::Missing => Ok(None),
            Located::Ref(reference) => self.resolve(&reference).map(Some),
            Located::Inline => Ok(Some(self.session()?.schema_at(self.url(), pointer, None))),
        }
    }
}

/// `$ref` string of a reference mapping.
fn ref_target(value: &Value) -> Option<&str> {
    value.get("$ref").and_then(Value::as_str)
}

/// Schema URL from the `profile` parameter of a `content-type` header.
///
/// Accepts quoted and unquoted values; `None` when either the header or the
/// parameter is absent.
pub fn profile_from_headers(headers: &HeaderMap) -> Option<String> {
    let content_type = headers.get(CONTENT_TYPE)?.to_str().ok()?;
    let profile = match content_type.parse::<Mime>() {
        Ok(mime) => mime.get_param("profile").map(|v| v.as_str().to_string()),
        // Unquoted URLs are not valid MIME tokens, but servers send them.
        Err(_) => media_type_params(content_type)
            .into_iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("profile"))
            .map(|(_, value)| value),
    };
    profile.filter(|value| !value.is_empty())
}

/// `name=value` parameters after the media type, honoring quoted values.
fn media_type_params(content_type: &str) -> Vec<(String, String)> {
    let mut params = Vec::new();
    let Some((_, mut rest)) = content_type.split_once(';') else {
        return params;
    };
    loop {
        let Some((name, after)) = rest.split_once('=') else {
            break;
        };
        let name = name.trim().trim_start_matches(';').trim().to_string();
        let after = after.trim_start();
        let (value, remaining) = match after.strip_prefix('"') {
            Some(quoted) => match quoted.find('"') {
                Some(end) => (quoted[..end].to_string(), &quoted[end + 1..]),
                None => (quoted.to_string(), ""),
            },
            None => match after.find(';') {
                Some(end) => (after[..end].trim().to_string(), &after[end..]),
                None => (after.trim().to_string(), ""),
            },
        };
        params.push((name, value));
        match remaining.find(';') {
            Some(next) => rest = &remaining[next + 1..],
            None => break,
        }
    }
    params
}

/// Content type announcing `schema` as profile.
pub(crate) fn profile_content_type(schema: &Schema) -> String {
    let profile = if schema.pointer().is_empty() {
        schema.url()
    } else {
        schema.href()
    };
    format!("application/json; profile={}", profile)
}

/// True if the schema can be addressed by an absolute URL.
pub(crate) fn is_addressable(schema: &Schema) -> bool {
    is_url(schema.url())
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Schema {}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("href", &self.inner.href)
            .field("lazy", &self.is_lazy())
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use serde_json::json;

    fn fixture() -> Value {
        json!({
            "title": "app schema",
            "properties": {
                "name": {"type": "string"},
                "pointer": {"$ref": "#/pointer"},
                "pointers": {
                    "items": {
                        "oneOf": [
                            {"$ref": "#/pointer"},
                            {"$ref": "#/pointer2"}
                        ]
                    }
                },
                "repointer": {"$ref": "#/repointer"},
                "external": {"$ref": "http://example.com/schema#/pointer"},
                "self": {"$ref": "#"}
            },
            "links": [
                {"rel": "create", "href": "/api/content", "method": "POST"},
                {"rel": "create", "href": "/api/other"},
                {"href": "/no-rel"}
            ],
            "required": ["platform", "name"],
            "pointer": {"type": "string", "description": "local-pointer-str"},
            "pointer2": {"type": "integer", "description": "local-pointer-int"},
            "repointer": {"$ref": "#/pointer"}
        })
    }

    fn schema(session: &Session) -> Schema {
        Schema::new(session, "http://example.org/schema", fixture())
    }

    #[test]
    fn splits_href() {
        let session = Session::new();
        let s = Schema::new(&session, "http://example.org/schema#/properties/name", fixture());
        assert_eq!(s.url(), "http://example.org/schema");
        assert_eq!(s.pointer(), "/properties/name");
        assert_eq!(s.href(), "http://example.org/schema#/properties/name");
        assert_eq!(s.raw().unwrap(), json!({"type": "string"}));
    }

    #[test]
    fn root_href_normalized() {
        let session = Session::new();
        let s = schema(&session);
        assert_eq!(s.pointer(), "");
        assert_eq!(s.href(), "http://example.org/schema#");
        assert!(!s.is_lazy());
    }

    #[test]
    fn top_level_values() {
        let session = Session::new();
        let s = schema(&session);
        assert_eq!(s.get("title").unwrap().unwrap().as_str(), Some("app schema"));
        assert!(s.get("missing").unwrap().is_none());
    }

    #[test]
    fn resolves_local_pointer_in_objects() {
        let session = Session::new();
        let data = schema(&session).data().unwrap();
        let pointer = data
            .get("properties")
            .and_then(|p| p.get("pointer"))
            .and_then(SchemaNode::as_schema)
            .unwrap();
        assert_eq!(pointer.href(), "http://example.org/schema#/pointer");
        assert_eq!(pointer.raw().unwrap(), fixture()["pointer"]);
    }

    #[test]
    fn resolves_local_pointer_in_arrays() {
        let session = Session::new();
        let data = schema(&session).data().unwrap();
        let one_of = data
            .get("properties")
            .and_then(|p| p.get("pointers"))
            .and_then(|p| p.get("items"))
            .and_then(|p| p.get("oneOf"))
            .unwrap();
        let first = one_of.item(0).and_then(SchemaNode::as_schema).unwrap();
        let second = one_of.item(1).and_then(SchemaNode::as_schema).unwrap();
        assert_eq!(first.raw().unwrap(), fixture()["pointer"]);
        assert_eq!(second.raw().unwrap(), fixture()["pointer2"]);
    }

    #[test]
    fn keeps_context_between_refs() {
        let session = Session::new();
        let data = schema(&session).data().unwrap();
        let repointer = data["properties"]["repointer"].as_schema().unwrap().clone();
        assert_eq!(repointer.pointer(), "/repointer");
        let target = repointer.dereference().unwrap();
        assert_eq!(target.raw().unwrap(), fixture()["pointer"]);
    }

    #[test]
    fn external_ref_is_lazy() {
        let session = Session::new();
        let data = schema(&session).data().unwrap();
        let external = data["properties"]["external"].as_schema().unwrap();
        assert!(external.is_lazy());
        assert!(!external.is_loaded());
        assert_eq!(external.href(), "http://example.com/schema#/pointer");
    }

    #[test]
    fn self_reference_is_the_root_instance() {
        let session = Session::new();
        let root = schema(&session);
        let self_ref = root
            .get("properties")
            .unwrap()
            .unwrap()
            .get("self")
            .and_then(SchemaNode::as_schema)
            .cloned()
            .unwrap();
        assert_eq!(self_ref, root);

        let again = self_ref.data().unwrap();
        assert_eq!(again["properties"]["self"].as_schema(), Some(&root));
    }

    #[test]
    fn resolving_twice_returns_same_instance() {
        let session = Session::new();
        let root = schema(&session);
        let a = root.resolve("#/pointer").unwrap();
        let b = root.resolve("http://example.org/schema#/pointer").unwrap();
        assert_eq!(a, b);
        assert_eq!(session.lazy_schema("http://example.org/schema"), root);
    }

    #[test]
    fn missing_pointer_is_an_error() {
        let session = Session::new();
        let s = Schema::new(
            &session,
            "http://b.com/s",
            json!({"properties": {"broken": {"$ref": "#/nowhere"}}}),
        );
        let err = s.data().unwrap_err();
        assert!(matches!(err, Error::PointerResolution { ref pointer, .. } if pointer == "/nowhere"));
        assert!(session.cached_schema("http://b.com/s#/nowhere").is_none());
        assert_eq!(session.cached_schemas(), 1);
    }

    #[test]
    fn absolute_self_reference_is_local() {
        let session = Session::new();
        let root = Schema::new(&session, "http://a.com", json!({"x": {"type": "string"}}));
        assert_eq!(root.url(), "http://a.com/");

        let relative = root.resolve("#/x").unwrap();
        let absolute = root.resolve("http://a.com#/x").unwrap();
        assert_eq!(relative, absolute);
        assert!(!absolute.is_lazy());
        assert!(absolute.is_loaded());
        assert_eq!(session.cached_schema("http://a.com/#/x"), Some(relative));
    }

    #[test]
    fn circular_chain_is_detected() {
        let session = Session::new();
        let s = Schema::new(
            &session,
            "http://c.com/s",
            json!({"a": {"$ref": "#/b"}, "b": {"$ref": "#/a"}}),
        );
        let a = s.resolve("#/a").unwrap();
        assert!(matches!(a.dereference(), Err(Error::CircularReference { .. })));
    }

    #[test]
    fn get_link_returns_first_match() {
        let session = Session::new();
        let link = schema(&session).get_link("create").unwrap().unwrap();
        assert_eq!(link.href, "/api/content");
        assert_eq!(link.method.as_deref(), Some("POST"));
    }

    #[test]
    fn get_link_missing_is_none() {
        let session = Session::new();
        assert!(schema(&session).get_link("missing").unwrap().is_none());
    }

    #[test]
    fn links_skip_malformed_entries() {
        let session = Session::new();
        assert_eq!(schema(&session).links().unwrap().len(), 2);
    }

    #[test]
    fn property_follows_refs() {
        let session = Session::new();
        let root = schema(&session);
        let name = root.property("name").unwrap().unwrap();
        assert_eq!(name.pointer(), "/properties/name");
        let pointer = root.property("pointer").unwrap().unwrap();
        assert_eq!(pointer.pointer(), "/pointer");
        assert_eq!(root.property("self").unwrap(), Some(root.clone()));
        assert!(root.property("undeclared").unwrap().is_none());
    }

    #[test]
    fn property_with_remote_ref_does_not_fetch() {
        let session = Session::new();
        let external = schema(&session).property("external").unwrap().unwrap();
        assert!(!external.is_loaded());
    }

    #[test]
    fn items_uniform_and_tuple() {
        let session = Session::new();
        let s = Schema::new(
            &session,
            "http://i.com/s",
            json!({
                "properties": {
                    "list": {"items": {"type": "object"}},
                    "pair": {"items": [{"type": "object"}, {"type": "array"}]},
                    "bare": {"type": "array"}
                }
            }),
        );
        let list = s.property("list").unwrap().unwrap();
        assert_eq!(list.items(7).unwrap().unwrap().pointer(), "/properties/list/items");
        let pair = s.property("pair").unwrap().unwrap();
        assert_eq!(pair.items(1).unwrap().unwrap().pointer(), "/properties/pair/items/1");
        assert!(pair.items(2).unwrap().is_none());
        let bare = s.property("bare").unwrap().unwrap();
        assert!(bare.items(0).unwrap().is_none());
    }

    #[test]
    fn update_is_visible_to_pointer_schemas() {
        let session = Session::new();
        let root = schema(&session);
        let name = root.property("name").unwrap().unwrap();
        root.update(|raw| raw["properties"]["name"]["type"] = json!("integer"))
            .unwrap();
        assert_eq!(name.raw().unwrap(), json!({"type": "integer"}));
    }

    #[test]
    fn dropped_session_cannot_load() {
        let schema = {
            let session = Session::new();
            session.lazy_schema("http://gone.com/s")
        };
        assert!(matches!(schema.raw(), Err(Error::SessionClosed { .. })));
    }

    #[test]
    fn profile_missing_content_type() {
        assert_eq!(profile_from_headers(&HeaderMap::new()), None);
    }

    #[test]
    fn profile_missing_parameter() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        assert_eq!(profile_from_headers(&headers), None);
    }

    #[test]
    fn profile_plain_and_quoted() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8; profile=http://a.com/schema"),
        );
        assert_eq!(profile_from_headers(&headers).as_deref(), Some("http://a.com/schema"));

        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8; profile=\"http://a.com/schema\""),
        );
        assert_eq!(profile_from_headers(&headers).as_deref(), Some("http://a.com/schema"));
    }

    #[test]
    fn profile_quoted_value_keeps_semicolons() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json; profile=\"http://a.com/s;v=1\"; charset=utf-8"),
        );
        assert_eq!(profile_from_headers(&headers).as_deref(), Some("http://a.com/s;v=1"));
    }

    #[test]
    fn profile_unquoted_after_quoted_param() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json; title=\"a;b\"; profile=http://a.com/s"),
        );
        assert_eq!(profile_from_headers(&headers).as_deref(), Some("http://a.com/s"));
    }

    #[test]
    fn profile_content_type_uses_href_for_pointers() {
        let session = Session::new();
        let root = schema(&session);
        assert_eq!(
            profile_content_type(&root),
            "application/json; profile=http://example.org/schema"
        );
        let name = root.property("name").unwrap().unwrap();
        assert_eq!(
            profile_content_type(&name),
            "application/json; profile=http://example.org/schema#/properties/name"
        );
    }
}
