mod common;

use asmscope::edge_geometry::EdgeShape;
use asmscope::{Endpoint, PatternType, RecordingRenderer, ScopeError};
use common::{bubble_graph, find_pattern, graph_from, model_for};

#[test]
fn collapse_then_uncollapse_restores_drawables() {
    let mut model = model_for(&bubble_graph());
    let before = model.drawable_set();
    let bubble = find_pattern(&model, PatternType::Bubble);

    assert!(model.collapse(bubble).unwrap());
    assert_ne!(model.drawable_set(), before);
    assert!(model.uncollapse(bubble).unwrap());
    assert_eq!(model.drawable_set(), before);
}

#[test]
fn repeated_toggles_are_no_ops() {
    let mut model = model_for(&bubble_graph());
    let bubble = find_pattern(&model, PatternType::Bubble);

    assert!(!model.uncollapse(bubble).unwrap());
    assert!(model.collapse(bubble).unwrap());
    let collapsed = model.drawable_set();
    assert!(!model.collapse(bubble).unwrap());
    assert_eq!(model.drawable_set(), collapsed);
    assert!(model.is_collapsed(bubble).unwrap());
}

#[test]
fn collapsed_bubble_hides_branches_and_redirects_edges() {
    let mut model = model_for(&bubble_graph());
    let bubble = find_pattern(&model, PatternType::Bubble);
    model.collapse(bubble).unwrap();

    let set = model.drawable_set();
    assert_eq!(set.node_ids(), vec![0, 1, 4, 5]);
    let pattern = set.patterns.iter().find(|p| p.id == bubble).unwrap();
    assert!(pattern.collapsed);
    assert_eq!(pattern.depth, 1);
    assert!(pattern.classes.contains(&"bubble"));
    assert!(pattern.classes.contains(&"collapsed"));

    // S -> P1 now ends on the bubble and loses its curve
    let edge = set.edge(1).unwrap();
    assert_eq!(edge.source, Endpoint::Node(1));
    assert_eq!(edge.target, Endpoint::Pattern(bubble));
    assert_eq!(edge.shape, None);
    assert!(edge.classes.contains(&"simplified"));

    // in -> S is untouched and keeps its bend
    let edge = set.edge(0).unwrap();
    assert_eq!(edge.target, Endpoint::Node(1));
    assert!(matches!(edge.shape, Some(EdgeShape::Curved { .. })));
    assert!(edge.classes.contains(&"curved"));
}

#[test]
fn nested_collapse_resolves_to_outermost_pattern() {
    let mut model = model_for(&bubble_graph());
    let bubble = find_pattern(&model, PatternType::Bubble);
    let root = model.forest().top_level().next().unwrap();
    assert_ne!(root, bubble);

    model.collapse(bubble).unwrap();
    model.collapse(root).unwrap();
    assert_eq!(
        model.active_endpoints(1).unwrap(),
        (Endpoint::Pattern(root), Endpoint::Pattern(root))
    );
    assert!(!model.is_edge_visible(1).unwrap());
    assert!(!model.is_pattern_visible(bubble).unwrap());

    // The inner pattern stays collapsed when its parent opens
    model.uncollapse(root).unwrap();
    assert!(model.is_collapsed(bubble).unwrap());
    assert_eq!(
        model.active_endpoints(1).unwrap(),
        (Endpoint::Node(1), Endpoint::Pattern(bubble))
    );
    assert!(model.is_simplified(1).unwrap());
    assert!(!model.is_node_visible(2).unwrap());
    assert!(model.is_pattern_visible(bubble).unwrap());

    model.uncollapse(bubble).unwrap();
    assert_eq!(
        model.active_endpoints(1).unwrap(),
        (Endpoint::Node(1), Endpoint::Node(2))
    );
    assert!(!model.is_simplified(1).unwrap());
}

#[test]
fn collapse_all_and_expand_all_touch_top_level_only() {
    let mut model = model_for(&bubble_graph());
    let before = model.drawable_set();
    let bubble = find_pattern(&model, PatternType::Bubble);

    assert_eq!(model.collapse_all().unwrap(), 1);
    assert_eq!(model.collapse_all().unwrap(), 0);
    assert!(!model.is_collapsed(bubble).unwrap());

    let set = model.drawable_set();
    assert!(set.nodes.is_empty());
    assert!(set.edges.is_empty());
    assert_eq!(set.patterns.len(), 1);
    assert!(set.patterns[0].collapsed);

    assert_eq!(model.expand_all().unwrap(), 1);
    assert_eq!(model.expand_all().unwrap(), 0);
    assert_eq!(model.drawable_set(), before);
}

#[test]
fn boundary_maps_never_share_an_edge() {
    let model = model_for(&bubble_graph());
    for pattern in model.forest().patterns() {
        let map = model.canonical_edges(pattern.id).unwrap();
        assert!(map.incoming.keys().all(|e| !map.outgoing.contains_key(e)));
        let interior = model.interior(pattern.id).unwrap();
        assert!(interior.edges.iter().all(|e| !map.incoming.contains_key(e)));
    }
}

#[test]
fn render_to_draws_one_batch() {
    let mut model = model_for(&bubble_graph());
    let mut renderer = RecordingRenderer::default();
    model.render_to(&mut renderer);
    model.collapse_all().unwrap();
    model.render_to(&mut renderer);
    assert_eq!(renderer.batches, 2);
    assert_eq!(renderer.last, Some(model.drawable_set()));
}

#[test]
fn lookups_report_missing_elements() {
    let model = model_for(&bubble_graph());
    assert_eq!(model.node_by_name("T").unwrap().id, 4);
    assert!(matches!(model.pattern(42), Err(ScopeError::PatternNotFound(42))));
    assert!(matches!(model.is_node_visible(42), Err(ScopeError::NodeNotFound(42))));
    assert!(matches!(model.active_endpoints(42), Err(ScopeError::EdgeNotFound(42))));
}

#[test]
fn cyclic_chain_interior_includes_closing_edge() {
    let graph = graph_from(&["x", "y", "z"], &[("x", "y"), ("y", "z"), ("z", "x")]);
    let mut model = model_for(&graph);
    let cycle = find_pattern(&model, PatternType::CyclicChain);
    assert_eq!(cycle, 0);

    let closing = model.graph().out_edges(2)[0];
    assert_eq!(model.edge(closing).unwrap().target, 0);
    let interior = model.interior(cycle).unwrap();
    assert_eq!(interior.edges, vec![0, 1, 2]);
    assert!(interior.edges.contains(&closing));
    let map = model.canonical_edges(cycle).unwrap();
    assert!(map.incoming.is_empty() && map.outgoing.is_empty());

    let before = model.drawable_set();
    model.collapse(cycle).unwrap();
    let set = model.drawable_set();
    assert!(set.edges.is_empty());
    assert!(set.nodes.is_empty());
    assert_eq!(set.patterns.len(), 1);

    model.uncollapse(cycle).unwrap();
    assert_eq!(model.drawable_set(), before);
}

#[test]
fn collapsing_rope_redirects_duplicate_join() {
    // B ends the chain A -> B and also feeds the rope around M, so it is split
    let graph = graph_from(
        &["A", "B", "C", "M", "T1", "T2"],
        &[("A", "B"), ("B", "M"), ("C", "M"), ("M", "T1"), ("M", "T2")],
    );
    let mut model = model_for(&graph);
    let before = model.drawable_set();
    let rope = find_pattern(&model, PatternType::FrayedRope);

    let dup = model
        .graph()
        .nodes()
        .iter()
        .find(|n| n.is_duplicate())
        .map(|n| n.id)
        .unwrap();
    assert_eq!(model.node(dup).unwrap().duplicate_of, Some(1));
    let join = model
        .graph()
        .edges()
        .iter()
        .find(|e| e.is_duplicate)
        .map(|e| e.id)
        .unwrap();
    assert_eq!(model.canonical_edges(rope).unwrap().incoming[&join], (1, dup));

    model.collapse(rope).unwrap();
    assert!(!model.is_node_visible(dup).unwrap());
    assert!(model.is_node_visible(1).unwrap());
    assert_eq!(
        model.active_endpoints(join).unwrap(),
        (Endpoint::Node(1), Endpoint::Pattern(rope))
    );
    assert!(model.is_simplified(join).unwrap());
    let drawn = model.drawable_set();
    let edge = drawn.edge(join).unwrap();
    assert!(edge.classes.contains(&"dup"));
    assert!(edge.classes.contains(&"simplified"));

    model.uncollapse(rope).unwrap();
    assert_eq!(model.drawable_set(), before);
}
