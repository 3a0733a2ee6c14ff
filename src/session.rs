//! HTTP session.
//!
//! The session is the only component that performs network I/O. It applies
//! default headers (`content-type: application/json`, optional
//! `Authorization`) and the default timeout, and owns the schema store that
//! gives every href exactly one [`Schema`] instance.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, trace};

use crate::binding::BoundRequest;
use crate::error::Error;
use crate::href::{join_href, normalize_url, split_href};
use crate::resource::Resource;
use crate::schema::{Document, Schema};
use crate::types::{Auth, JSON_CONTENT_TYPE};

/// Handle to an HTTP client plus its schema store.
///
/// Cloning is cheap; clones share the client and the store.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

pub(crate) struct SessionInner {
    client: Client,
    timeout: Option<Duration>,
    auth: Option<Auth>,
    headers: HeaderMap,
    store: Mutex<HashMap<String, Schema>>,
}

/// Per-call request settings.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Headers that override the session defaults.
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    /// Overrides the session timeout for this call.
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the request body.
    pub fn json(self, value: &Value) -> Result<Self, Error> {
        let body = serde_json::to_vec(value).map_err(|source| Error::Serialize { source })?;
        Ok(self.body(body))
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Builder for [`Session`].
#[derive(Debug, Default)]
pub struct SessionBuilder {
    client: Option<Client>,
    timeout: Option<Duration>,
    auth: Option<Auth>,
    headers: Vec<(String, String)>,
}

impl SessionBuilder {
    /// Use an existing client instead of a fresh one.
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Default timeout for every request; calls can override it.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn auth(mut self, auth: Auth) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Extra default header sent with every request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// # Errors
    ///
    /// Returns `Error::InvalidHeader` for malformed header names or values
    /// and `Error::Client` if the HTTP client cannot be built.
    pub fn build(self) -> Result<Session, Error> {
        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let invalid = || Error::InvalidHeader { name: name.clone() };
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
            let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;
            headers.insert(header_name, header_value);
        }
        if let Some(auth) = &self.auth {
            let value = HeaderValue::from_str(&auth.header_value()).map_err(|_| {
                Error::InvalidHeader {
                    name: AUTHORIZATION.to_string(),
                }
            })?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = match self.client {
            Some(client) => client,
            None => Client::builder()
                .build()
                .map_err(|source| Error::Client { source })?,
        };

        Ok(Session::from_parts(client, self.timeout, self.auth, headers))
    }
}

impl Session {
    /// Session with a default client, no timeout and no credentials.
    pub fn new() -> Self {
        Self::from_parts(Client::new(), None, None, HeaderMap::new())
    }

    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    fn from_parts(
        client: Client,
        timeout: Option<Duration>,
        auth: Option<Auth>,
        headers: HeaderMap,
    ) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                client,
                timeout,
                auth,
                headers,
                store: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<SessionInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> std::sync::Weak<SessionInner> {
        Arc::downgrade(&self.inner)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.inner.timeout
    }

    pub fn auth(&self) -> Option<&Auth> {
        self.inner.auth.as_ref()
    }

    pub fn client(&self) -> &Client {
        &self.inner.client
    }

    /// True when both handles share the same client and store.
    pub fn ptr_eq(&self, other: &Session) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Perform a raw HTTP request.
    ///
    /// Non-2xx statuses are reported as `Error::Network`.
    pub fn request(
        &self,
        method: Method,
        url: &str,
        options: RequestOptions,
    ) -> Result<Response, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        headers.extend(self.inner.headers.clone());
        headers.extend(options.headers);

        let timeout = options.timeout.or(self.inner.timeout);
        debug!(%method, url, ?timeout, "sending request");

        let mut builder = self.inner.client.request(method, url).headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        if !options.query.is_empty() {
            builder = builder.query(&options.query);
        }
        if let Some(body) = options.body {
            builder = builder.body(body);
        }

        let response = builder.send().map_err(|source| Error::Network {
            url: url.to_string(),
            source,
        })?;
        response.error_for_status().map_err(|source| Error::Network {
            url: url.to_string(),
            source,
        })
    }

    /// Execute a bound link; its leftover params are appended to the query.
    pub fn send(&self, bound: BoundRequest, mut options: RequestOptions) -> Result<Response, Error> {
        options.query.extend(bound.query);
        self.request(bound.method, &bound.url, options)
    }

    /// GET `url` and wrap the body in a [`Resource`].
    ///
    /// The resource schema comes from the `profile` parameter of the
    /// response content type and is loaded lazily.
    pub fn resource(&self, url: &str) -> Result<Resource, Error> {
        let response = self.request(Method::GET, url, RequestOptions::default())?;
        Resource::from_response(response, self, None)
    }

    /// Fetch the schema document at `href` eagerly.
    ///
    /// An already loaded document is not fetched again.
    pub fn schema(&self, href: &str) -> Result<Schema, Error> {
        let (url, pointer) = split_href(href);
        let url = normalize_url(url);
        if let Some(existing) = self.cached_schema(&join_href(&url, pointer)) {
            if existing.is_loaded() {
                return Ok(existing);
            }
        }
        let raw = self.fetch_json(&url)?;
        Ok(self.schema_at(&url, pointer, Some(raw)))
    }

    /// Memoized schema for `href` whose document is fetched on first access.
    pub fn lazy_schema(&self, href: &str) -> Schema {
        let (url, pointer) = split_href(href);
        self.schema_at(url, pointer, None)
    }

    /// The schema already registered for `href`, if any.
    pub fn cached_schema(&self, href: &str) -> Option<Schema> {
        let (url, pointer) = split_href(href);
        self.store()
            .get(&join_href(&normalize_url(url), pointer))
            .cloned()
    }

    /// Number of hrefs in the schema store.
    pub fn cached_schemas(&self) -> usize {
        self.store().len()
    }

    pub(crate) fn fetch_json(&self, url: &str) -> Result<Value, Error> {
        debug!(url, "fetching schema document");
        let response = self.request(Method::GET, url, RequestOptions::default())?;
        let text = response.text().map_err(|source| Error::Network {
            url: url.to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| Error::InvalidJson {
            url: url.to_string(),
            source,
        })
    }

    /// Look up or register the schema at `(url, pointer)`.
    ///
    /// `url` is normalized first, so spellings of the same document URL
    /// share one entry.
    ///
    /// Every pointer into a document shares the document of the root
    /// `url#` entry. `raw` fills a document that has not been loaded yet.
    pub(crate) fn schema_at(&self, url: &str, pointer: &str, raw: Option<Value>) -> Schema {
        let url = normalize_url(url);
        let url = url.as_str();
        let href = join_href(url, pointer);
        let mut store = self.store();

        if let Some(existing) = store.get(&href) {
            trace!(href, "schema store hit");
            if let Some(raw) = raw {
                existing.document().install(raw);
            }
            return existing.clone();
        }

        let root_href = join_href(url, "");
        let root_document = store.get(&root_href).map(|root| root.document().clone());
        let document = match root_document {
            Some(document) => {
                if let Some(raw) = raw {
                    document.install(raw);
                }
                document
            }
            None => {
                let document = Arc::new(Document::new(url, raw));
                if !pointer.is_empty() {
                    let root = Schema::from_parts(url, "", document.clone(), self.downgrade());
                    store.insert(root_href, root);
                }
                document
            }
        };

        let schema = Schema::from_parts(url, pointer, document, self.downgrade());
        trace!(href, lazy = schema.is_lazy(), "schema registered");
        store.insert(href, schema.clone());
        schema
    }

    fn store(&self) -> MutexGuard<'_, HashMap<String, Schema>> {
        self.inner
            .store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("timeout", &self.inner.timeout)
            .field("auth", &self.inner.auth)
            .field("cached_schemas", &self.cached_schemas())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keeps_timeout() {
        let session = Session::builder()
            .timeout(Duration::from_secs(999))
            .build()
            .unwrap();
        assert_eq!(session.timeout(), Some(Duration::from_secs(999)));
    }

    #[test]
    fn default_session_has_no_timeout_or_auth() {
        let session = Session::new();
        assert_eq!(session.timeout(), None);
        assert!(session.auth().is_none());
    }

    #[test]
    fn rejects_invalid_header() {
        let result = Session::builder().header("bad header", "x").build();
        assert!(matches!(result, Err(Error::InvalidHeader { .. })));
    }

    #[test]
    fn rejects_invalid_auth() {
        let result = Session::builder()
            .auth(Auth::new("Bearer", "line\nbreak"))
            .build();
        assert!(matches!(result, Err(Error::InvalidHeader { .. })));
    }

    #[test]
    fn memoizes_by_href() {
        let session = Session::new();
        let a = session.lazy_schema("http://a.com/s#/properties/name");
        let b = session.lazy_schema("http://a.com/s#/properties/name");
        assert_eq!(a, b);
    }

    #[test]
    fn href_without_fragment_is_root() {
        let session = Session::new();
        let a = session.lazy_schema("http://a.com/s");
        let b = session.lazy_schema("http://a.com/s#");
        assert_eq!(a, b);
        assert_eq!(a.href(), "http://a.com/s#");
    }

    #[test]
    fn pointer_schemas_register_their_root() {
        let session = Session::new();
        session.lazy_schema("http://a.com/s#/a");
        assert!(session.cached_schema("http://a.com/s").is_some());
        assert_eq!(session.cached_schemas(), 2);
    }

    #[test]
    fn supplied_document_fills_lazy_root() {
        let session = Session::new();
        let lazy = session.lazy_schema("http://a.com/s");
        assert!(!lazy.is_loaded());
        session.schema_at("http://a.com/s", "/title", Some(json!({"title": "t"})));
        assert!(lazy.is_loaded());
    }

    #[test]
    fn separate_sessions_do_not_share_store() {
        let one = Session::new();
        let two = Session::new();
        assert_ne!(one.lazy_schema("http://a.com/s"), two.lazy_schema("http://a.com/s"));
        assert!(!one.ptr_eq(&two));
    }
}
