use crate::assembly_graph::{EdgeId, NodeId};
use crate::edge_geometry::EdgeShape;
use crate::layout::{BoundingBox, NodeGeometry};
use crate::pattern::{PatternId, PatternType};

/// Where an edge is currently drawn from or to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Endpoint {
    Node(NodeId),
    Pattern(PatternId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawableNode {
    pub id: NodeId,
    pub name: String,
    pub parent: Option<PatternId>,
    pub geometry: Option<NodeGeometry>,
    pub classes: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawablePattern {
    pub id: PatternId,
    pub kind: PatternType,
    pub parent: Option<PatternId>,
    /// Number of enclosing patterns; deeper boxes are drawn on top
    pub depth: usize,
    pub collapsed: bool,
    pub bounding_box: Option<BoundingBox>,
    pub classes: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawableEdge {
    pub id: EdgeId,
    pub source: Endpoint,
    pub target: Endpoint,
    pub relative_weight: f64,
    /// `None` when the edge is simplified to a direct line
    pub shape: Option<EdgeShape>,
    pub classes: Vec<&'static str>,
}

/// Everything currently visible in a component
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawableSet {
    pub nodes: Vec<DrawableNode>,
    pub patterns: Vec<DrawablePattern>,
    pub edges: Vec<DrawableEdge>,
}

impl DrawableSet {
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.iter().map(|n| n.id).collect()
    }

    pub fn edge(&self, id: EdgeId) -> Option<&DrawableEdge> {
        self.edges.iter().find(|e| e.id == id)
    }
}

/// Paints a drawable set. Updates arrive bracketed by a batch so a
/// surface can apply them in one go.
pub trait Renderer {
    fn begin_batch(&mut self) {}
    fn draw(&mut self, set: &DrawableSet);
    fn end_batch(&mut self) {}
}

/// Keeps the last drawn set; handy for headless use and tests
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub last: Option<DrawableSet>,
    pub batches: usize,
    open: bool,
}

impl Renderer for RecordingRenderer {
    fn begin_batch(&mut self) {
        self.open = true;
    }

    fn draw(&mut self, set: &DrawableSet) {
        self.last = Some(set.clone());
    }

    fn end_batch(&mut self) {
        if self.open {
            self.batches += 1;
            self.open = false;
        }
    }
}
