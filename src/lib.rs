//! Build-pipeline middleware that prepares file metadata for logic-less
//! templates.
//!
//! Every object and array reachable from a selected file gets a parent link
//! (`_parent`) and, for each truthy property `key`, an existence marker
//! `key?` that resolves to the object itself. A Mustache section such as
//! `{{#author?}}...{{/author?}}` can then branch on presence.
//!
//! ```
//! use mustache_metadata::{mustache_metadata, FileCollection, Options, PipelineContext, Pipeline};
//! use serde_json::json;
//!
//! let mut files = FileCollection::from_json(json!({
//!     "a/index.html": {"contents": "", "title": "Hi"},
//!     "a/style.css": {"contents": ""}
//! }))?;
//! Pipeline::new()
//!     .with(mustache_metadata(Options::default())?)
//!     .run(&mut files, &PipelineContext::new())?;
//!
//! let page = files.get("a/index.html").unwrap();
//! assert!(files.graph().get(page, "title?").is_some());
//! # Ok::<(), mustache_metadata::errors::PluginError>(())
//! ```

pub mod annotate;
pub mod config;
pub mod context;
pub mod errors;
pub mod files;
pub mod graph;
pub mod matcher;
pub mod plugin;

pub use annotate::{annotate, AnnotateStats, Annotator};
pub use config::{Options, DEFAULT_MATCH};
pub use context::PipelineContext;
pub use errors::{PluginError, Result};
pub use files::FileCollection;
pub use graph::{ExportOptions, Graph, Node, NodeId, ParentRef, Value, MARKER_SUFFIX, PARENT_KEY};
pub use matcher::{MatchOptions, PathMatcher};
pub use plugin::{mustache_metadata, Done, Middleware, MustacheMetadata, Pipeline};
