use mustache_metadata::{annotate, FileCollection, Graph, NodeId, ParentRef};
use proptest::prelude::*;
use serde_json::Value as Json;

fn arb_json() -> impl Strategy<Value = Json> {
    let leaf = prop_oneof![
        Just(Json::Null),
        any::<bool>().prop_map(Json::Bool),
        (-2i64..3).prop_map(Json::from),
        "[a-c]{0,2}".prop_map(Json::String),
    ];
    leaf.prop_recursive(4, 48, 5, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..5).prop_map(Json::Array),
            prop::collection::btree_map("[a-z]{1,4}", inner, 0..5)
                .prop_map(|m| Json::Object(m.into_iter().collect())),
        ]
    })
}

fn arb_entry() -> impl Strategy<Value = Json> {
    prop::collection::btree_map("[a-z]{1,4}", arb_json(), 0..5)
        .prop_map(|m| Json::Object(m.into_iter().collect()))
}

fn snapshot(graph: &Graph) -> Vec<(Option<ParentRef>, Vec<String>)> {
    graph
        .ids()
        .map(|id| {
            let node = graph.node(id);
            (node.parent(), node.markers().map(str::to_string).collect())
        })
        .collect()
}

fn check_annotations(graph: &Graph, root: NodeId) {
    assert_eq!(graph.parent(root), Some(ParentRef::Root));
    for id in graph.ids() {
        let node = graph.node(id);
        let mut truthy = Vec::new();
        for (key, value) in node.entries() {
            if value.is_truthy() {
                truthy.push(key.into_owned());
            }
            if let Some(child) = value.as_node() {
                assert_eq!(graph.parent(child), Some(ParentRef::Node(id)));
            }
        }
        truthy.sort();
        let marked: Vec<String> = node.markers().map(str::to_string).collect();
        assert_eq!(marked, truthy);
    }
}

proptest! {
    #[test]
    fn every_node_points_at_its_container(entry in arb_entry()) {
        let mut files = FileCollection::new();
        let root = files.insert_json("page.html", entry).unwrap();
        annotate(files.graph_mut(), root, ParentRef::Root, true);
        check_annotations(files.graph(), root);
    }

    #[test]
    fn forced_rerun_is_idempotent(entry in arb_entry()) {
        let mut files = FileCollection::new();
        let root = files.insert_json("page.html", entry).unwrap();
        annotate(files.graph_mut(), root, ParentRef::Root, true);
        let once = snapshot(files.graph());
        annotate(files.graph_mut(), root, ParentRef::Root, true);
        prop_assert_eq!(snapshot(files.graph()), once);
    }
}
