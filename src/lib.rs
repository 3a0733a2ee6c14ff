//! Pluct
//!
//! A JSON client driven by JSON Hyper-Schema.
//!
//! Resources are fetched over HTTP and paired with the schema named by the
//! `profile` parameter of their content type. The schema's `links` tell the
//! client where it can go next, so callers follow relations by name instead
//! of building URLs by hand.
//!
//! # Example
//!
//! ```no_run
//! use pluct::{RelOptions, Session};
//! use serde_json::json;
//!
//! let session = Session::new();
//! let app = session.resource("https://api.example.com/").unwrap();
//!
//! // GET /items/42?fields=slug, if the schema links "item" to /items/{id}
//! let item = app
//!     .rel("item", RelOptions::new().param("id", 42).param("fields", "slug"))
//!     .unwrap();
//! assert!(item.is_valid());
//!
//! // POST a new item
//! let created = app
//!     .rel("create", RelOptions::new().data(json!({"name": "new"})))
//!     .unwrap();
//! println!("{}", created);
//! ```
//!
//! # Schema identity
//!
//! Every schema is addressed by an href `url#pointer`. A [`Session`] hands
//! out exactly one [`Schema`] per href, and all pointers into one document
//! share that document. Changes made with [`Schema::update`] are therefore
//! visible through every handle and in later validations.
//!
//! | Concern | Where |
//! |---------|-------|
//! | HTTP, auth, schema store | [`Session`] |
//! | `$ref` resolution, links | [`Schema`] |
//! | Data, validation, relations | [`Resource`] |
//! | URI templates | [`UriTemplate`] |

mod binding;
mod error;
mod href;
mod resource;
mod schema;
mod session;
mod template;
mod types;
mod validator;

pub use binding::{query_pairs, BoundRequest, Link};
pub use error::{Error, ParameterError, SchemaError, TemplateError, ValidateError};
pub use href::{is_url, join_href, resolve_url, split_href};
pub use resource::{ArrayResource, Item, ObjectResource, RelOptions, Resource};
pub use schema::{profile_from_headers, Schema, SchemaNode};
pub use session::{RequestOptions, Session, SessionBuilder};
pub use template::UriTemplate;
pub use types::{json_type_name, Auth, Payload, JSON_CONTENT_TYPE};
pub use validator::validate_against_schema;
