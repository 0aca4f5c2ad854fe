//! The parent/existence-marker annotator.
//!
//! Walking a node sets its parent link and records a `key?` marker for every
//! truthy property, then descends into child objects and arrays. An explicit
//! identity set keeps each node to a single visit per pass, which is what
//! makes cyclic and shared graphs terminate. Nodes parented by an earlier
//! pass are left alone as well unless the caller forces re-annotation.
//!
//! "Already annotated" and "currently being walked higher up the stack" are
//! the same condition here: a node is marked visited before its children are
//! walked, so a cycle back to it is simply a revisit.

use std::collections::HashSet;

use tracing::trace;

use crate::graph::{is_marker_key, Graph, NodeId, ParentRef, PARENT_KEY};

/// Counters for one annotation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnotateStats {
    /// Nodes whose parent link was set.
    pub nodes: usize,
    /// Markers recorded (including ones that were already present).
    pub markers: usize,
    /// Calls that returned early on an already annotated node.
    pub revisits: usize,
}

/// One annotation pass over a graph.
pub struct Annotator<'g> {
    graph: &'g mut Graph,
    visited: HashSet<NodeId>,
    stats: AnnotateStats,
}

impl<'g> Annotator<'g> {
    pub fn new(graph: &'g mut Graph) -> Self {
        Self {
            graph,
            visited: HashSet::new(),
            stats: AnnotateStats::default(),
        }
    }

    /// Annotates `id` as a child of `parent`, then everything reachable from it.
    ///
    /// Without `force`, a node already seen in this pass or already carrying a
    /// parent link is skipped entirely. With `force` the node is re-annotated;
    /// its children are still walked without `force`.
    pub fn annotate(&mut self, id: NodeId, parent: ParentRef, force: bool) {
        let node = self.graph.node_mut(id);
        if !force && (self.visited.contains(&id) || node.parent().is_some()) {
            self.stats.revisits += 1;
            trace!(node = id.index(), "already annotated");
            return;
        }

        if force {
            node.clear_parent();
            // a root must not claim to have a parent
            if parent == ParentRef::Root {
                node.remove_marker(PARENT_KEY);
            }
        }
        node.set_parent(parent);
        self.visited.insert(id);
        self.stats.nodes += 1;

        let snapshot: Vec<(String, bool, Option<NodeId>)> = node
            .entries()
            .filter(|(key, _)| !is_marker_key(key))
            .map(|(key, value)| (key.into_owned(), value.is_truthy(), value.as_node()))
            .collect();

        for (key, truthy, child) in snapshot {
            let node = self.graph.node_mut(id);
            if !truthy {
                node.remove_marker(&key);
                continue;
            }
            node.insert_marker(&key);
            self.stats.markers += 1;
            if let Some(child) = child {
                self.annotate(child, ParentRef::Node(id), false);
            }
        }
    }

    pub fn finish(self) -> AnnotateStats {
        self.stats
    }
}

/// Runs a single pass rooted at `id`.
pub fn annotate(graph: &mut Graph, id: NodeId, parent: ParentRef, force: bool) -> AnnotateStats {
    let mut annotator = Annotator::new(graph);
    annotator.annotate(id, parent, force);
    annotator.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Value;
    use bytes::Bytes;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn markers(graph: &Graph, id: NodeId) -> Vec<String> {
        graph.node(id).markers().map(str::to_string).collect()
    }

    #[test]
    fn marks_only_truthy_properties() {
        let mut graph = Graph::new();
        let root = graph
            .insert_json(json!({
                "array": [],
                "emptyString": "",
                "false": false,
                "null": null,
                "object": {},
                "one": 1,
                "string": "abc",
                "true": true,
                "zero": 0
            }))
            .as_node()
            .unwrap();

        annotate(&mut graph, root, ParentRef::Root, true);

        assert_eq!(
            markers(&graph, root),
            vec!["array", "object", "one", "string", "true"]
        );
        assert_eq!(graph.get(root, "one?"), Some(Value::Node(root)));
        assert_eq!(graph.get(root, "zero?"), None);
    }

    #[test]
    fn children_point_at_their_container() {
        let mut graph = Graph::new();
        let root = graph
            .insert_json(json!({"list": ["one", "two"], "object": {"one": "one"}}))
            .as_node()
            .unwrap();

        annotate(&mut graph, root, ParentRef::Root, true);

        let list = graph.get(root, "list").and_then(|v| v.as_node()).unwrap();
        let object = graph.get(root, "object").and_then(|v| v.as_node()).unwrap();
        assert_eq!(graph.parent(root), Some(ParentRef::Root));
        assert_eq!(graph.parent(list), Some(ParentRef::Node(root)));
        assert_eq!(graph.parent(object), Some(ParentRef::Node(root)));
        assert_eq!(markers(&graph, list), vec!["0", "1"]);
    }

    #[test]
    fn self_loop_terminates() {
        let mut graph = Graph::new();
        let looped = graph.insert_object(Vec::<(String, Value)>::new());
        graph.set(looped, "myself", looped);

        let stats = annotate(&mut graph, looped, ParentRef::Root, true);

        assert_eq!(stats.nodes, 1);
        assert_eq!(stats.revisits, 1);
        assert_eq!(graph.parent(looped), Some(ParentRef::Root));
        assert!(graph.node(looped).has_marker("myself"));
    }

    #[test]
    fn mutual_cycle_visits_each_node_once() {
        let mut graph = Graph::new();
        let a = graph.insert_object(Vec::<(String, Value)>::new());
        let b = graph.insert_object(vec![("a", Value::Node(a))]);
        graph.set(a, "b", b);

        let stats = annotate(&mut graph, a, ParentRef::Root, true);

        assert_eq!(stats.nodes, 2);
        assert_eq!(graph.parent(a), Some(ParentRef::Root));
        assert_eq!(graph.parent(b), Some(ParentRef::Node(a)));
    }

    #[test]
    fn shared_child_keeps_first_parent() {
        let mut graph = Graph::new();
        let shared = graph.insert_object(vec![("x", Value::from(1))]);
        let first = graph.insert_object(vec![("shared", Value::Node(shared))]);
        let second = graph.insert_object(vec![("shared", Value::Node(shared))]);
        let root = graph.insert_object(vec![("a", Value::Node(first)), ("b", Value::Node(second))]);

        let stats = annotate(&mut graph, root, ParentRef::Root, true);

        assert_eq!(graph.parent(shared), Some(ParentRef::Node(first)));
        assert_eq!(stats.nodes, 4);
        assert_eq!(stats.revisits, 1);
    }

    #[test]
    fn blobs_are_marked_but_not_walked() {
        let mut graph = Graph::new();
        let contents = Value::Blob(Bytes::from_static(b"test"));
        let root = graph.insert_object(vec![("contents", contents)]);

        let stats = annotate(&mut graph, root, ParentRef::Root, true);

        assert_eq!(stats.nodes, 1);
        assert!(graph.node(root).has_marker("contents"));
    }

    #[test]
    fn unforced_call_skips_parented_node() {
        let mut graph = Graph::new();
        let node = graph.insert_object(vec![("title", Value::from("Hi"))]);
        graph.node_mut(node).set_parent(ParentRef::Root);

        let stats = annotate(&mut graph, node, ParentRef::Root, false);

        assert_eq!(stats, AnnotateStats { nodes: 0, markers: 0, revisits: 1 });
        assert!(!graph.node(node).has_marker("title"));
    }

    #[test]
    fn forced_root_drops_stale_parent_marker() {
        let mut graph = Graph::new();
        let root = graph.insert_object(vec![("title", Value::from("Hi"))]);
        graph.node_mut(root).insert_marker(PARENT_KEY);

        annotate(&mut graph, root, ParentRef::Root, true);

        assert!(!graph.node(root).has_marker(PARENT_KEY));
        assert_eq!(graph.get(root, "_parent?"), None);
        assert!(graph.node(root).has_marker("title"));
    }

    #[test]
    fn forced_rerun_is_idempotent() {
        let mut graph = Graph::new();
        let root = graph
            .insert_json(json!({"a": {"b": [1, 0, "x"]}, "c": "", "d?": true}))
            .as_node()
            .unwrap();

        annotate(&mut graph, root, ParentRef::Root, true);
        let once = graph.clone();
        annotate(&mut graph, root, ParentRef::Root, true);

        for id in graph.ids() {
            assert_eq!(graph.node(id), once.node(id));
            assert_eq!(graph.parent(id), once.parent(id));
        }
        assert_eq!(markers(&graph, root), vec!["a"]);
    }

    #[test]
    fn marker_is_dropped_when_value_turns_falsy() {
        let mut graph = Graph::new();
        let root = graph.insert_object(vec![("title", Value::from("Hi"))]);
        annotate(&mut graph, root, ParentRef::Root, true);

        graph.set(root, "title", "");
        annotate(&mut graph, root, ParentRef::Root, true);

        assert!(!graph.node(root).has_marker("title"));
    }
}
