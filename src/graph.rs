//! Arena-backed metadata graph.
//!
//! File metadata may share sub-objects between files and may even contain
//! itself (`page.self = page`), so nodes are stored in a [`Graph`] and linked
//! by [`NodeId`] instead of by ownership. A property holding an object or
//! array holds a [`Value::Node`].
//!
//! Two names are reserved for templates:
//!
//! * `_parent` resolves to the node's container (see [`Graph::get`]);
//! * any key ending in `?` is an existence marker: `title?` resolves to the
//!   node itself when `title` held a truthy value at annotation time.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use bytes::Bytes;
use itertools::Either;
use serde_json::{Map, Number, Value as Json};

/// Suffix appended to a key to form its existence marker.
pub const MARKER_SUFFIX: &str = "?";
/// Property name under which templates reach a node's parent.
pub const PARENT_KEY: &str = "_parent";

pub fn is_marker_key(key: &str) -> bool {
    key.ends_with(MARKER_SUFFIX)
}

pub fn marker_key(key: &str) -> String {
    format!("{key}{MARKER_SUFFIX}")
}

/// Identity of a node inside its [`Graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A property value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    /// Opaque byte buffer, e.g. file contents. Never traversed.
    Blob(Bytes),
    Node(NodeId),
}

impl Value {
    /// Truthiness as a template engine sees it: null, `false`, zero and the
    /// empty string are falsy. Empty objects, arrays and blobs are truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
            Value::String(s) => !s.is_empty(),
            Value::Blob(_) | Value::Node(_) => true,
        }
    }

    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Value::Node(id) => Some(*id),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n.into())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Number::from_f64(f).map_or(Value::Null, Value::Number)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Bytes> for Value {
    fn from(b: Bytes) -> Self {
        Value::Blob(b)
    }
}

impl From<NodeId> for Value {
    fn from(id: NodeId) -> Self {
        Value::Node(id)
    }
}

/// Back-link from a node to its container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentRef {
    /// The "no parent" sentinel given to file entries.
    Root,
    Node(NodeId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Object(BTreeMap<String, Value>),
    Array(Vec<Value>),
}

/// An object or array plus its annotations.
#[derive(Debug, Clone)]
pub struct Node {
    body: Body,
    parent: Option<ParentRef>,
    markers: BTreeSet<String>,
}

impl Node {
    pub fn object() -> Self {
        Self::with_body(Body::Object(BTreeMap::new()))
    }

    fn with_body(body: Body) -> Self {
        Self {
            body,
            parent: None,
            markers: BTreeSet::new(),
        }
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn len(&self) -> usize {
        match &self.body {
            Body::Object(map) => map.len(),
            Body::Array(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Own property lookup; array indices are given as decimal strings.
    pub fn get_own(&self, key: &str) -> Option<&Value> {
        match &self.body {
            Body::Object(map) => map.get(key),
            Body::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        }
    }

    /// Own properties in enumeration order: sorted keys for objects,
    /// ascending indices for arrays.
    pub fn entries(&self) -> impl Iterator<Item = (Cow<'_, str>, &Value)> + '_ {
        match &self.body {
            Body::Object(map) => {
                Either::Left(map.iter().map(|(k, v)| (Cow::Borrowed(k.as_str()), v)))
            }
            Body::Array(items) => Either::Right(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (Cow::Owned(i.to_string()), v)),
            ),
        }
    }

    pub fn parent(&self) -> Option<ParentRef> {
        self.parent
    }

    pub fn set_parent(&mut self, parent: ParentRef) {
        self.parent = Some(parent);
    }

    pub fn clear_parent(&mut self) {
        self.parent = None;
    }

    /// Keys (without suffix) that currently carry an existence marker.
    pub fn markers(&self) -> impl Iterator<Item = &str> + '_ {
        self.markers.iter().map(String::as_str)
    }

    pub fn has_marker(&self, key: &str) -> bool {
        self.markers.contains(key)
    }

    /// Records the marker for `key`. Returns false if it was already present.
    pub fn insert_marker(&mut self, key: &str) -> bool {
        self.markers.insert(key.to_string())
    }

    pub fn remove_marker(&mut self, key: &str) -> bool {
        self.markers.remove(key)
    }
}

// The parent link is a back-pointer, not content.
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.body == other.body && self.markers == other.markers
    }
}

/// Rendering knobs for [`Graph::to_json`].
#[derive(Debug, Clone, Copy)]
pub struct ExportOptions {
    /// Emit `"key?": true` for every recorded marker on objects.
    pub markers: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self { markers: true }
    }
}

/// Owns every node of a file collection.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn add(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn insert_object<I, K>(&mut self, entries: I) -> NodeId
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let map = entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self.add(Node::with_body(Body::Object(map)))
    }

    pub fn insert_array<I>(&mut self, items: I) -> NodeId
    where
        I: IntoIterator<Item = Value>,
    {
        self.add(Node::with_body(Body::Array(items.into_iter().collect())))
    }

    /// # Panics
    ///
    /// If `id` was issued by a different graph and is out of range.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn parent(&self, id: NodeId) -> Option<ParentRef> {
        self.node(id).parent
    }

    /// Sets a property. On arrays `key` must be an index; writing past the
    /// end pads with nulls. Returns the previous value.
    pub fn set(&mut self, id: NodeId, key: &str, value: impl Into<Value>) -> Option<Value> {
        let value = value.into();
        match &mut self.node_mut(id).body {
            Body::Object(map) => map.insert(key.to_string(), value),
            Body::Array(items) => {
                let index = key.parse::<usize>().ok()?;
                if index >= items.len() {
                    items.resize(index + 1, Value::Null);
                }
                Some(std::mem::replace(&mut items[index], value))
            }
        }
    }

    /// Template-style property lookup.
    ///
    /// Own properties win. Otherwise `_parent` yields the container (nothing
    /// for roots) and `key?` yields the node itself if `key` is marked.
    pub fn get(&self, id: NodeId, key: &str) -> Option<Value> {
        let node = self.node(id);
        if let Some(v) = node.get_own(key) {
            return Some(v.clone());
        }
        if key == PARENT_KEY {
            return match node.parent? {
                ParentRef::Node(p) => Some(Value::Node(p)),
                ParentRef::Root => None,
            };
        }
        let base = key.strip_suffix(MARKER_SUFFIX)?;
        node.has_marker(base).then_some(Value::Node(id))
    }

    /// Imports a JSON document. Every object and array becomes a fresh node.
    pub fn insert_json(&mut self, json: Json) -> Value {
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => Value::Number(n),
            Json::String(s) => Value::String(s),
            Json::Array(items) => {
                let items: Vec<Value> = items.into_iter().map(|v| self.insert_json(v)).collect();
                Value::Node(self.insert_array(items))
            }
            Json::Object(map) => {
                let entries: Vec<(String, Value)> = map
                    .into_iter()
                    .map(|(k, v)| (k, self.insert_json(v)))
                    .collect();
                Value::Node(self.insert_object(entries))
            }
        }
    }

    /// Exports a value as JSON. Parent links are never written; a node that
    /// is already being exported higher up the path becomes `null`.
    pub fn to_json(&self, value: &Value, opts: ExportOptions) -> Json {
        let mut path = HashSet::new();
        self.export(value, opts, &mut path)
    }

    fn export(&self, value: &Value, opts: ExportOptions, path: &mut HashSet<NodeId>) -> Json {
        match value {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Number(n) => Json::Number(n.clone()),
            Value::String(s) => Json::String(s.clone()),
            Value::Blob(b) => Json::String(String::from_utf8_lossy(b).into_owned()),
            Value::Node(id) => {
                if !path.insert(*id) {
                    return Json::Null;
                }
                let node = self.node(*id);
                let out = match &node.body {
                    Body::Array(items) => {
                        Json::Array(items.iter().map(|v| self.export(v, opts, path)).collect())
                    }
                    Body::Object(map) => {
                        let mut out = Map::new();
                        for (k, v) in map {
                            out.insert(k.clone(), self.export(v, opts, path));
                        }
                        if opts.markers {
                            for key in &node.markers {
                                out.entry(marker_key(key)).or_insert(Json::Bool(true));
                            }
                        }
                        Json::Object(out)
                    }
                };
                path.remove(id);
                out
            }
        }
    }
}
