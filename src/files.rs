use std::collections::BTreeMap;

use bytes::Bytes;
use serde_json::{Map, Value as Json};

use crate::errors::{PluginError, Result};
use crate::graph::{ExportOptions, Graph, NodeId, Value};

/// Field of a file entry holding the raw file contents.
pub const CONTENTS_KEY: &str = "contents";

/// The pipeline's files: path to file entry node, plus the graph owning
/// every node reachable from them. Paths iterate in sorted order.
#[derive(Debug, Clone, Default)]
pub struct FileCollection {
    graph: Graph,
    files: BTreeMap<String, NodeId>,
}

impl FileCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `{ "path": { ...entry... } }`. A string `contents` field on an
    /// entry becomes a blob; everything else is imported as is.
    pub fn from_json(json: Json) -> Result<Self> {
        let mut files = Self::new();
        match json {
            Json::Object(entries) => {
                for (path, entry) in entries {
                    files.insert_json(path, entry)?;
                }
            }
            other => {
                return Err(PluginError::InvalidCollection {
                    found: json_type(&other),
                })
            }
        }
        Ok(files)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_json(serde_json::from_str(json)?)
    }

    pub fn insert_json(&mut self, path: impl Into<String>, entry: Json) -> Result<NodeId> {
        let path = path.into();
        let map = match entry {
            Json::Object(map) => map,
            other => {
                return Err(PluginError::InvalidEntry {
                    found: json_type(&other),
                    path,
                })
            }
        };
        let entries: Vec<(String, Value)> = map
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    Json::String(s) if key == CONTENTS_KEY => Value::Blob(Bytes::from(s)),
                    other => self.graph.insert_json(other),
                };
                (key, value)
            })
            .collect();
        let id = self.graph.insert_object(entries);
        self.files.insert(path, id);
        Ok(id)
    }

    pub fn get(&self, path: &str) -> Option<NodeId> {
        self.files.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> + '_ {
        self.files.keys().map(String::as_str)
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    /// Entries in path order together with the graph, borrowed at once.
    pub fn split_mut(&mut self) -> (impl Iterator<Item = (&str, NodeId)> + '_, &mut Graph) {
        let entries = self.files.iter().map(|(path, id)| (path.as_str(), *id));
        (entries, &mut self.graph)
    }

    pub fn to_json(&self, opts: ExportOptions) -> Json {
        let mut out = Map::new();
        for (path, id) in &self.files {
            out.insert(path.clone(), self.graph.to_json(&Value::Node(*id), opts));
        }
        Json::Object(out)
    }
}

fn json_type(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}
