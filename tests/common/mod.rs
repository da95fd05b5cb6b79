#![allow(dead_code)]

use asmscope::layout::{BoundingBox, NodeGeometry, Point};
use asmscope::{
    detect_patterns, CollapsibleGraphModel, ComponentLayout, GraphIndex, Orientation,
    PatternHierarchyBuilder, PatternId, PatternType,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Build a graph from node names and name pairs
pub fn graph_from(names: &[&str], edges: &[(&str, &str)]) -> GraphIndex {
    let mut graph = GraphIndex::new();
    for name in names {
        graph.add_node(name, 100, Orientation::Forward);
    }
    for (s, t) in edges {
        let s = graph.node_by_name(s).unwrap().id;
        let t = graph.node_by_name(t).unwrap().id;
        graph.add_edge(s, t, None).unwrap();
    }
    graph
}

/// in -> S -> {P1, P2} -> T -> out
pub fn bubble_graph() -> GraphIndex {
    graph_from(
        &["in", "S", "P1", "P2", "T", "out"],
        &[("in", "S"), ("S", "P1"), ("S", "P2"), ("P1", "T"), ("P2", "T"), ("T", "out")],
    )
}

/// Random graph without parallel edges; self-loops may appear
pub fn random_graph(seed: u64, nodes: usize, edges: usize) -> GraphIndex {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut graph = GraphIndex::new();
    for i in 0..nodes {
        let orientation = if rng.gen_bool(0.5) {
            Orientation::Forward
        } else {
            Orientation::Reverse
        };
        graph.add_node(&format!("n{}", i), rng.gen_range(1..1000), orientation);
    }
    for _ in 0..edges {
        let s = rng.gen_range(0..nodes);
        let t = rng.gen_range(0..nodes);
        if !graph.has_edge(s, t) {
            let weight = rng.gen_bool(0.8).then(|| rng.gen_range(1.0..50.0));
            graph.add_edge(s, t, weight).unwrap();
        }
    }
    graph.scale_edge_weights();
    graph
}

/// Nodes on a row, patterns boxed around their nodes, and one bent
/// control point on every third edge
pub fn row_layout(graph: &GraphIndex) -> ComponentLayout {
    let mut layout = ComponentLayout::default();
    for node in graph.nodes() {
        layout.nodes.insert(
            node.id,
            NodeGeometry {
                position: Point::new(node.id as f64 * 40.0, 0.0),
                width: 20.0,
                height: 10.0,
            },
        );
    }
    for edge in graph.edges() {
        let s = node_x(edge.source);
        let t = node_x(edge.target);
        let bend = if edge.id % 3 == 0 { 25.0 } else { 1.0 };
        layout.edges.insert(edge.id, vec![Point::new((s + t) / 2.0, bend)]);
    }
    layout.bounding_box = BoundingBox {
        x: -10.0,
        y: -30.0,
        width: graph.node_count() as f64 * 40.0,
        height: 60.0,
    };
    layout
}

fn node_x(id: usize) -> f64 {
    id as f64 * 40.0
}

/// Detect, build the hierarchy and wrap the result in a model
pub fn model_for(graph: &GraphIndex) -> CollapsibleGraphModel {
    let detection = detect_patterns(graph).unwrap();
    let forest = PatternHierarchyBuilder::new(detection.graph.node_count(), &detection.patterns)
        .build()
        .unwrap();
    let layout = row_layout(&detection.graph);
    CollapsibleGraphModel::new(detection.graph, forest, layout).unwrap()
}

/// First pattern of the given kind
pub fn find_pattern(model: &CollapsibleGraphModel, kind: PatternType) -> PatternId {
    model
        .forest()
        .patterns()
        .iter()
        .find(|p| p.kind == kind)
        .map(|p| p.id)
        .unwrap()
}
