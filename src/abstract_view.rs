//! Overlay over a `GraphIndex` in which detected patterns stand in for
//! their members. The underlying graph is never touched: every node is
//! mapped to its outermost detected pattern (or itself) and edges are
//! projected through that mapping.
use crate::assembly_graph::{GraphIndex, NodeId};
use std::collections::{BTreeSet, HashMap};

/// A top-level vertex of the abstracted graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Vertex {
    Node(NodeId),
    /// Index of a raw pattern in detection order
    Pattern(usize),
}

impl Vertex {
    pub fn is_pattern(&self) -> bool {
        matches!(self, Vertex::Pattern(_))
    }
}

#[derive(Debug, Default)]
pub struct AbstractView {
    vertices: Vec<Vertex>,
    succ: HashMap<Vertex, BTreeSet<Vertex>>,
    pred: HashMap<Vertex, BTreeSet<Vertex>>,
}

impl AbstractView {
    /// Project `graph` through `owner`, where `owner[n]` is the outermost
    /// pattern currently containing node `n`.
    ///
    /// Edges between two members of the same pattern disappear, parallel
    /// projected edges collapse into one, and self-loops on plain nodes
    /// stay (they count towards both degrees).
    pub fn build(graph: &GraphIndex, owner: &[Option<usize>]) -> Self {
        let vertex_of = |n: NodeId| match owner.get(n).copied().flatten() {
            Some(p) => Vertex::Pattern(p),
            None => Vertex::Node(n),
        };

        let mut vertices = BTreeSet::new();
        for node in graph.nodes() {
            vertices.insert(vertex_of(node.id));
        }

        let mut succ: HashMap<Vertex, BTreeSet<Vertex>> = HashMap::new();
        let mut pred: HashMap<Vertex, BTreeSet<Vertex>> = HashMap::new();
        for edge in graph.edges() {
            let s = vertex_of(edge.source);
            let t = vertex_of(edge.target);
            if s == t && s.is_pattern() {
                continue;
            }
            succ.entry(s).or_default().insert(t);
            pred.entry(t).or_default().insert(s);
        }

        AbstractView {
            vertices: vertices.into_iter().collect(),
            succ,
            pred,
        }
    }

    /// Top-level vertices: plain nodes by id, then patterns by index
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn successors(&self, v: Vertex) -> impl Iterator<Item = Vertex> + '_ {
        self.succ.get(&v).into_iter().flatten().copied()
    }

    pub fn predecessors(&self, v: Vertex) -> impl Iterator<Item = Vertex> + '_ {
        self.pred.get(&v).into_iter().flatten().copied()
    }

    pub fn out_degree(&self, v: Vertex) -> usize {
        self.succ.get(&v).map_or(0, BTreeSet::len)
    }

    pub fn in_degree(&self, v: Vertex) -> usize {
        self.pred.get(&v).map_or(0, BTreeSet::len)
    }

    /// The only successor of `v`, if it has exactly one
    pub fn sole_successor(&self, v: Vertex) -> Option<Vertex> {
        match self.succ.get(&v) {
            Some(set) if set.len() == 1 => set.iter().next().copied(),
            _ => None,
        }
    }

    /// The only predecessor of `v`, if it has exactly one
    pub fn sole_predecessor(&self, v: Vertex) -> Option<Vertex> {
        match self.pred.get(&v) {
            Some(set) if set.len() == 1 => set.iter().next().copied(),
            _ => None,
        }
    }

    pub fn has_self_loop(&self, v: Vertex) -> bool {
        self.succ.get(&v).is_some_and(|s| s.contains(&v))
    }
}
