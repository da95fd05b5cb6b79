//! Runtime view of one component where each pattern can be collapsed into
//! a single compound node and expanded again.
//!
//! Every edge keeps its true endpoints. What is drawn is derived from the
//! collapse bits: an endpoint shows as the outermost collapsed pattern that
//! contains it, or as itself when no enclosing pattern is collapsed. An
//! element is hidden while any pattern it is interior to is collapsed.
use crate::assembly_graph::{Edge, EdgeId, GraphIndex, Node, NodeId};
use crate::edge_geometry::{classify_edge, EdgeShape};
use crate::error::{Result, ScopeError};
use crate::hierarchy::{PatternForest, PatternNode};
use crate::layout::ComponentLayout;
use crate::pattern::{Member, PatternId};
use crate::render::{DrawableEdge, DrawableNode, DrawablePattern, DrawableSet, Endpoint, Renderer};
use bitvec::prelude::*;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// True endpoints of the edges crossing a pattern's boundary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalEdgeMap {
    /// Source outside, target inside
    pub incoming: BTreeMap<EdgeId, (NodeId, NodeId)>,
    /// Source inside, target outside
    pub outgoing: BTreeMap<EdgeId, (NodeId, NodeId)>,
}

/// Everything hidden while a pattern is collapsed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InteriorSet {
    pub nodes: Vec<NodeId>,
    pub patterns: Vec<PatternId>,
    pub edges: Vec<EdgeId>,
}

pub struct CollapsibleGraphModel {
    graph: GraphIndex,
    forest: PatternForest,
    layout: ComponentLayout,
    canonical: HashMap<PatternId, CanonicalEdgeMap>,
    interior: HashMap<PatternId, InteriorSet>,
    collapsed: BitVec,
    // Number of collapsed patterns each element is interior to
    node_hidden: Vec<u32>,
    pattern_hidden: Vec<u32>,
    edge_hidden: Vec<u32>,
    active: Vec<(Endpoint, Endpoint)>,
    simplified: BitVec,
    shapes: Vec<EdgeShape>,
}

/// Split the edges around one pattern into entries, exits and interior
fn edge_tables(graph: &GraphIndex, nodes: &[NodeId]) -> (CanonicalEdgeMap, Vec<EdgeId>) {
    let inside: HashSet<NodeId> = nodes.iter().copied().collect();
    let mut map = CanonicalEdgeMap::default();
    let mut interior = Vec::new();
    for &n in nodes {
        for &e in graph.in_edges(n) {
            let edge = &graph.edges()[e];
            if !inside.contains(&edge.source) {
                map.incoming.insert(e, (edge.source, edge.target));
            }
        }
        for &e in graph.out_edges(n) {
            let edge = &graph.edges()[e];
            if inside.contains(&edge.target) {
                interior.push(e);
            } else {
                map.outgoing.insert(e, (edge.source, edge.target));
            }
        }
    }

    // An edge that is both an entry and an exit is treated as interior
    let both: Vec<EdgeId> = map
        .incoming
        .keys()
        .filter(|e| map.outgoing.contains_key(e))
        .copied()
        .collect();
    for e in both {
        map.incoming.remove(&e);
        map.outgoing.remove(&e);
        interior.push(e);
    }

    interior.sort_unstable();
    interior.dedup();
    (map, interior)
}

impl CollapsibleGraphModel {
    /// Build the model with every pattern expanded
    pub fn new(graph: GraphIndex, forest: PatternForest, layout: ComponentLayout) -> Result<Self> {
        let mut canonical = HashMap::with_capacity(forest.len());
        let mut interior = HashMap::with_capacity(forest.len());
        for pattern in forest.patterns() {
            let nodes = forest.descendant_nodes(pattern.id);
            if let Some(&bad) = nodes.iter().find(|&&n| n >= graph.node_count()) {
                return Err(ScopeError::UnknownMember {
                    pattern: pattern.id,
                    member: Member::Node(bad).to_string(),
                });
            }
            let (map, edges) = edge_tables(&graph, &nodes);
            canonical.insert(pattern.id, map);
            interior.insert(
                pattern.id,
                InteriorSet {
                    nodes,
                    patterns: forest.descendant_patterns(pattern.id),
                    edges,
                },
            );
        }

        let shapes = graph
            .edges()
            .iter()
            .map(|edge| {
                match (layout.node_position(edge.source), layout.node_position(edge.target)) {
                    (Some(s), Some(t)) => classify_edge(s, t, layout.control_points(edge.id)),
                    _ => EdgeShape::Straight,
                }
            })
            .collect();

        let active = graph
            .edges()
            .iter()
            .map(|e| (Endpoint::Node(e.source), Endpoint::Node(e.target)))
            .collect();

        Ok(CollapsibleGraphModel {
            collapsed: bitvec![0; forest.len()],
            node_hidden: vec![0; graph.node_count()],
            pattern_hidden: vec![0; forest.len()],
            edge_hidden: vec![0; graph.edge_count()],
            simplified: bitvec![0; graph.edge_count()],
            active,
            shapes,
            canonical,
            interior,
            graph,
            forest,
            layout,
        })
    }

    fn check_pattern(&self, id: PatternId) -> Result<()> {
        if id < self.forest.len() {
            Ok(())
        } else {
            Err(ScopeError::PatternNotFound(id))
        }
    }

    /// Collapse a pattern into a single compound node.
    /// Returns `false` if it was already collapsed.
    pub fn collapse(&mut self, id: PatternId) -> Result<bool> {
        self.check_pattern(id)?;
        if self.collapsed[id] {
            return Ok(false);
        }
        self.collapsed.set(id, true);
        self.shift_interior(id, true);
        self.refresh_edges(id);
        debug!(pattern = id, "collapsed pattern");
        Ok(true)
    }

    /// Expand a collapsed pattern. Returns `false` if it was already expanded.
    pub fn uncollapse(&mut self, id: PatternId) -> Result<bool> {
        self.check_pattern(id)?;
        if !self.collapsed[id] {
            return Ok(false);
        }
        self.collapsed.set(id, false);
        self.shift_interior(id, false);
        self.refresh_edges(id);
        debug!(pattern = id, "expanded pattern");
        Ok(true)
    }

    /// Collapse every expanded top-level pattern; returns how many changed
    pub fn collapse_all(&mut self) -> Result<usize> {
        let targets: Vec<PatternId> = self
            .forest
            .top_level()
            .filter(|&p| !self.collapsed[p])
            .collect();
        for &p in &targets {
            self.collapse(p)?;
        }
        Ok(targets.len())
    }

    /// Expand every collapsed top-level pattern; returns how many changed
    pub fn expand_all(&mut self) -> Result<usize> {
        let targets: Vec<PatternId> = self
            .forest
            .top_level()
            .filter(|&p| self.collapsed[p])
            .collect();
        for &p in &targets {
            self.uncollapse(p)?;
        }
        Ok(targets.len())
    }

    fn shift_interior(&mut self, id: PatternId, hide: bool) {
        let Some(interior) = self.interior.get(&id) else { return };
        let shift = |count: &mut u32| {
            if hide {
                *count += 1;
            } else {
                *count = count.saturating_sub(1);
            }
        };
        for &n in &interior.nodes {
            shift(&mut self.node_hidden[n]);
        }
        for &p in &interior.patterns {
            shift(&mut self.pattern_hidden[p]);
        }
        for &e in &interior.edges {
            shift(&mut self.edge_hidden[e]);
        }
    }

    /// Outermost collapsed pattern around `node`, or the node itself
    fn resolve(&self, node: NodeId) -> Endpoint {
        let mut shown = Endpoint::Node(node);
        let mut current = self.forest.node_parent(node);
        while let Some(p) = current {
            if self.collapsed[p] {
                shown = Endpoint::Pattern(p);
            }
            current = self.forest.pattern(p).and_then(|p| p.parent);
        }
        shown
    }

    /// Recompute drawn endpoints for every edge touching the inside of `id`
    fn refresh_edges(&mut self, id: PatternId) {
        let (Some(map), Some(interior)) = (self.canonical.get(&id), self.interior.get(&id)) else {
            return;
        };
        let updates: Vec<(EdgeId, (Endpoint, Endpoint), bool)> = map
            .incoming
            .keys()
            .chain(map.outgoing.keys())
            .chain(interior.edges.iter())
            .map(|&e| {
                let edge = &self.graph.edges()[e];
                let shown = (self.resolve(edge.source), self.resolve(edge.target));
                let truth = (Endpoint::Node(edge.source), Endpoint::Node(edge.target));
                (e, shown, shown != truth)
            })
            .collect();
        for (e, shown, simplified) in updates {
            self.active[e] = shown;
            self.simplified.set(e, simplified);
        }
    }

    pub fn is_collapsed(&self, id: PatternId) -> Result<bool> {
        self.check_pattern(id)?;
        Ok(self.collapsed[id])
    }

    pub fn is_node_visible(&self, id: NodeId) -> Result<bool> {
        self.node_hidden
            .get(id)
            .map(|&c| c == 0)
            .ok_or(ScopeError::NodeNotFound(id))
    }

    pub fn is_pattern_visible(&self, id: PatternId) -> Result<bool> {
        self.pattern_hidden
            .get(id)
            .map(|&c| c == 0)
            .ok_or(ScopeError::PatternNotFound(id))
    }

    pub fn is_edge_visible(&self, id: EdgeId) -> Result<bool> {
        self.edge_hidden
            .get(id)
            .map(|&c| c == 0)
            .ok_or(ScopeError::EdgeNotFound(id))
    }

    /// Endpoints the edge is currently drawn between
    pub fn active_endpoints(&self, id: EdgeId) -> Result<(Endpoint, Endpoint)> {
        self.active.get(id).copied().ok_or(ScopeError::EdgeNotFound(id))
    }

    pub fn is_simplified(&self, id: EdgeId) -> Result<bool> {
        if id >= self.simplified.len() {
            return Err(ScopeError::EdgeNotFound(id));
        }
        Ok(self.simplified[id])
    }

    pub fn canonical_edges(&self, id: PatternId) -> Result<&CanonicalEdgeMap> {
        self.canonical.get(&id).ok_or(ScopeError::PatternNotFound(id))
    }

    pub fn interior(&self, id: PatternId) -> Result<&InteriorSet> {
        self.interior.get(&id).ok_or(ScopeError::PatternNotFound(id))
    }

    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.graph.node(id).ok_or(ScopeError::NodeNotFound(id))
    }

    pub fn node_by_name(&self, name: &str) -> Result<&Node> {
        self.graph
            .node_by_name(name)
            .ok_or_else(|| ScopeError::NodeNameNotFound(name.to_string()))
    }

    pub fn edge(&self, id: EdgeId) -> Result<&Edge> {
        self.graph.edge(id).ok_or(ScopeError::EdgeNotFound(id))
    }

    pub fn pattern(&self, id: PatternId) -> Result<&PatternNode> {
        self.forest.pattern(id).ok_or(ScopeError::PatternNotFound(id))
    }

    pub fn graph(&self) -> &GraphIndex {
        &self.graph
    }

    pub fn forest(&self) -> &PatternForest {
        &self.forest
    }

    pub fn layout(&self) -> &ComponentLayout {
        &self.layout
    }

    /// Visible nodes, patterns and edges with their style classes
    pub fn drawable_set(&self) -> DrawableSet {
        let nodes = self
            .graph
            .nodes()
            .iter()
            .filter(|n| self.node_hidden[n.id] == 0)
            .map(|n| {
                let mut classes = vec![n.orientation.class()];
                if n.is_duplicate() {
                    classes.push("dup");
                }
                DrawableNode {
                    id: n.id,
                    name: n.name.clone(),
                    parent: self.forest.node_parent(n.id),
                    geometry: self.layout.nodes.get(&n.id).copied(),
                    classes,
                }
            })
            .collect();

        let patterns = self
            .forest
            .patterns()
            .iter()
            .filter(|p| self.pattern_hidden[p.id] == 0)
            .map(|p| {
                let collapsed = self.collapsed[p.id];
                let mut classes = vec![p.kind.as_str()];
                if collapsed {
                    classes.push("collapsed");
                }
                DrawablePattern {
                    id: p.id,
                    kind: p.kind,
                    parent: p.parent,
                    depth: self.forest.depth(p.id),
                    collapsed,
                    bounding_box: self.layout.patterns.get(&p.id).copied(),
                    classes,
                }
            })
            .collect();

        let edges = self
            .graph
            .edges()
            .iter()
            .filter(|e| self.edge_hidden[e.id] == 0)
            .map(|e| {
                let simplified = self.simplified[e.id];
                let shape = (!simplified).then(|| self.shapes[e.id].clone());
                let mut classes = Vec::new();
                if let Some(class) = e.outlier.class() {
                    classes.push(class);
                }
                if e.is_duplicate {
                    classes.push("dup");
                }
                classes.push(match &shape {
                    None => "simplified",
                    Some(shape) if shape.is_curved() => "curved",
                    Some(_) => "straight",
                });
                let (source, target) = self.active[e.id];
                DrawableEdge {
                    id: e.id,
                    source,
                    target,
                    relative_weight: e.relative_weight,
                    shape,
                    classes,
                }
            })
            .collect();

        DrawableSet {
            nodes,
            patterns,
            edges,
        }
    }

    /// Hand the current drawable set to a renderer in one batch
    pub fn render_to(&self, renderer: &mut dyn Renderer) {
        let set = self.drawable_set();
        renderer.begin_batch();
        renderer.draw(&set);
        renderer.end_batch();
    }
}
