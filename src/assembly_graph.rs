use crate::error::{Result, ScopeError};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Dense index of a node inside one graph or component.
pub type NodeId = usize;
/// Dense index of an edge inside one graph or component.
pub type EdgeId = usize;

/// Minimum number of weighted edges before outliers are flagged
const MIN_EDGES_FOR_OUTLIERS: usize = 4;

/// Orientation of a contig, written `+` or `-` in assembly formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Forward,
    Reverse,
}

impl Orientation {
    /// Get the orientation marker ('+' or '-')
    pub fn marker(&self) -> &'static str {
        match self {
            Orientation::Forward => "+",
            Orientation::Reverse => "-",
        }
    }

    /// Style class used when drawing the node
    pub fn class(&self) -> &'static str {
        match self {
            Orientation::Forward => "fwd",
            Orientation::Reverse => "rev",
        }
    }
}

impl FromStr for Orientation {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "+" => Ok(Orientation::Forward),
            "-" => Ok(Orientation::Reverse),
            other => Err(ScopeError::InvalidOrientation(other.to_string())),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.marker())
    }
}

/// Whether an edge's weight lies outside the Tukey fences of its component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outlier {
    High,
    Low,
    #[default]
    None,
}

impl Outlier {
    pub fn class(&self) -> Option<&'static str> {
        match self {
            Outlier::High => Some("high_outlier"),
            Outlier::Low => Some("low_outlier"),
            Outlier::None => None,
        }
    }
}

/// A contig in the assembly graph
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub length: u64,
    pub orientation: Orientation,
    /// Set on nodes synthesized to keep sibling patterns disjoint
    pub duplicate_of: Option<NodeId>,
}

impl Node {
    pub fn is_duplicate(&self) -> bool {
        self.duplicate_of.is_some()
    }
}

/// A directed adjacency between two contigs
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub weight: Option<f64>,
    /// Weight scaled into [0, 1] relative to the rest of the component
    pub relative_weight: f64,
    pub outlier: Outlier,
    /// Set on the edge joining a node to its duplicate
    pub is_duplicate: bool,
}

/// Serde form of an input graph: nodes by name, edges between names
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputGraph {
    pub nodes: Vec<InputNode>,
    pub edges: Vec<InputEdge>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputNode {
    pub name: String,
    #[serde(default)]
    pub length: u64,
    #[serde(default = "default_orientation")]
    pub orientation: String,
}

fn default_orientation() -> String {
    "+".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputEdge {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub weight: Option<f64>,
}

/// Adjacency-indexed directed graph with in/out edge lists per node
#[derive(Debug, Clone, Default)]
pub struct GraphIndex {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    out_edges: Vec<Vec<EdgeId>>,
    in_edges: Vec<Vec<EdgeId>>,
    by_name: HashMap<String, NodeId>,
    pairs: HashSet<(NodeId, NodeId)>,
}

impl GraphIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from its serde input form, resolving edges by node name
    pub fn from_input(input: &InputGraph) -> Result<Self> {
        let mut graph = GraphIndex::new();
        for node in &input.nodes {
            let orientation = node.orientation.parse::<Orientation>()?;
            graph.add_node(&node.name, node.length, orientation);
        }
        for edge in &input.edges {
            let source = graph
                .node_by_name(&edge.source)
                .map(|n| n.id)
                .ok_or_else(|| ScopeError::UnknownNodeName(edge.source.clone()))?;
            let target = graph
                .node_by_name(&edge.target)
                .map(|n| n.id)
                .ok_or_else(|| ScopeError::UnknownNodeName(edge.target.clone()))?;
            graph.add_edge(source, target, edge.weight)?;
        }
        Ok(graph)
    }

    /// Add a node and return its id. The first node registered under a name
    /// is the one found by name lookups.
    pub fn add_node(&mut self, name: &str, length: u64, orientation: Orientation) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            id,
            name: name.to_string(),
            length,
            orientation,
            duplicate_of: None,
        });
        self.out_edges.push(Vec::new());
        self.in_edges.push(Vec::new());
        self.by_name.entry(name.to_string()).or_insert(id);
        id
    }

    /// Re-add a node read back from storage, keeping its duplicate link
    pub fn restore_node(
        &mut self,
        name: &str,
        length: u64,
        orientation: Orientation,
        duplicate_of: Option<NodeId>,
    ) -> NodeId {
        let id = self.add_node(name, length, orientation);
        self.nodes[id].duplicate_of = duplicate_of;
        id
    }

    /// Re-add an edge read back from storage together with its scaled
    /// weight and flags. Edges have to arrive in id order.
    pub fn restore_edge(&mut self, edge: &Edge) -> Result<EdgeId> {
        if edge.id != self.edges.len() {
            return Err(ScopeError::InvalidRecord(format!(
                "edge id {} out of order (expected {})",
                edge.id,
                self.edges.len()
            )));
        }
        let id = self.push_edge(edge.source, edge.target, edge.weight, edge.is_duplicate)?;
        self.edges[id].relative_weight = edge.relative_weight;
        self.edges[id].outlier = edge.outlier;
        Ok(id)
    }

    /// Add a directed edge. Parallel edges are rejected; self-loops are fine.
    pub fn add_edge(&mut self, source: NodeId, target: NodeId, weight: Option<f64>) -> Result<EdgeId> {
        self.push_edge(source, target, weight, false)
    }

    fn push_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        weight: Option<f64>,
        is_duplicate: bool,
    ) -> Result<EdgeId> {
        if source >= self.nodes.len() {
            return Err(ScopeError::NodeNotFound(source));
        }
        if target >= self.nodes.len() {
            return Err(ScopeError::NodeNotFound(target));
        }
        if !self.pairs.insert((source, target)) {
            return Err(ScopeError::ParallelEdge {
                source_name: self.nodes[source].name.clone(),
                target_name: self.nodes[target].name.clone(),
            });
        }
        let id = self.edges.len();
        self.edges.push(Edge {
            id,
            source,
            target,
            weight,
            relative_weight: 0.5,
            outlier: Outlier::None,
            is_duplicate,
        });
        self.out_edges[source].push(id);
        self.in_edges[target].push(id);
        Ok(id)
    }

    /// Split `id` into two halves joined by a duplicate edge.
    ///
    /// The original node keeps its incoming edges; the returned duplicate
    /// takes over all outgoing edges. Edge ids are preserved.
    pub fn duplicate_node(&mut self, id: NodeId) -> Result<NodeId> {
        let original = self.node(id).ok_or(ScopeError::NodeNotFound(id))?.clone();
        let dup = self.nodes.len();
        self.nodes.push(Node {
            id: dup,
            name: original.name.clone(),
            length: original.length,
            orientation: original.orientation,
            duplicate_of: Some(original.duplicate_of.unwrap_or(id)),
        });
        self.in_edges.push(Vec::new());

        let moved = std::mem::take(&mut self.out_edges[id]);
        for &e in &moved {
            let target = self.edges[e].target;
            self.pairs.remove(&(id, target));
            self.pairs.insert((dup, target));
            self.edges[e].source = dup;
        }
        self.out_edges.push(moved);

        self.push_edge(id, dup, None, true)?;
        Ok(dup)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id)
    }

    pub fn node_by_name(&self, name: &str) -> Option<&Node> {
        self.by_name.get(name).map(|&id| &self.nodes[id])
    }

    pub fn has_edge(&self, source: NodeId, target: NodeId) -> bool {
        self.pairs.contains(&(source, target))
    }

    pub fn out_edges(&self, id: NodeId) -> &[EdgeId] {
        self.out_edges.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn in_edges(&self, id: NodeId) -> &[EdgeId] {
        self.in_edges.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn out_degree(&self, id: NodeId) -> usize {
        self.out_edges(id).len()
    }

    pub fn in_degree(&self, id: NodeId) -> usize {
        self.in_edges(id).len()
    }

    pub fn successors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.out_edges(id).iter().map(move |&e| self.edges[e].target)
    }

    pub fn predecessors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.in_edges(id).iter().map(move |&e| self.edges[e].source)
    }

    /// Scale edge weights into [0, 1] and flag outliers with Tukey fences.
    /// Duplicate and unweighted edges keep the midpoint and are never outliers.
    pub fn scale_edge_weights(&mut self) {
        let mut weights: Vec<f64> = self
            .edges
            .iter()
            .filter(|e| !e.is_duplicate)
            .filter_map(|e| e.weight)
            .collect();
        if weights.is_empty() {
            return;
        }
        weights.sort_by(|a, b| a.total_cmp(b));

        let min = weights[0];
        let max = weights[weights.len() - 1];
        let fences = if weights.len() >= MIN_EDGES_FOR_OUTLIERS {
            let q1 = quantile(&weights, 0.25);
            let q3 = quantile(&weights, 0.75);
            let iqr = q3 - q1;
            Some((q1 - 1.5 * iqr, q3 + 1.5 * iqr))
        } else {
            None
        };

        for edge in self.edges.iter_mut().filter(|e| !e.is_duplicate) {
            let Some(w) = edge.weight else { continue };
            edge.relative_weight = if max > min { (w - min) / (max - min) } else { 0.5 };
            edge.outlier = match fences {
                Some((low, _)) if w < low => Outlier::Low,
                Some((_, high)) if w > high => Outlier::High,
                _ => Outlier::None,
            };
        }
    }
}

/// Linearly interpolated quantile of sorted values
fn quantile(sorted: &[f64], p: f64) -> f64 {
    let pos = (sorted.len() - 1) as f64 * p;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}
