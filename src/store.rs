//! JSON form of a processed assembly graph: every component with its nodes,
//! edges, ordered patterns and layout.
use crate::assembly_graph::{Edge, EdgeId, GraphIndex, NodeId, Orientation, Outlier};
use crate::error::{Result, ScopeError};
use crate::hierarchy::{PatternForest, PatternNode};
use crate::layout::ComponentLayout;
use crate::pattern::{Member, PatternId, PatternType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreMetadata {
    /// Name of the input file the store was built from
    pub filename: String,
    pub filetype: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreCounts {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub components: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub name: String,
    pub length: u64,
    /// `+` or `-`
    pub orientation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicate_of: Option<NodeId>,
    /// Innermost pattern containing the node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<PatternId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub id: EdgeId,
    #[serde(default)]
    pub weight: Option<f64>,
    pub relative_weight: f64,
    #[serde(default)]
    pub outlier: Outlier,
    #[serde(default)]
    pub is_duplicate: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRecord {
    Node(NodeId),
    Pattern(PatternId),
}

impl From<Member> for MemberRecord {
    fn from(member: Member) -> Self {
        match member {
            Member::Node(n) => MemberRecord::Node(n),
            Member::Pattern(p) => MemberRecord::Pattern(p),
        }
    }
}

impl From<MemberRecord> for Member {
    fn from(record: MemberRecord) -> Self {
        match record {
            MemberRecord::Node(n) => Member::Node(n),
            MemberRecord::Pattern(p) => Member::Pattern(p),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternRecord {
    pub id: PatternId,
    /// Pattern type name, e.g. `bubble`
    pub kind: String,
    pub members: Vec<MemberRecord>,
    #[serde(default)]
    pub parent: Option<PatternId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedComponent {
    pub size_rank: usize,
    pub nodes: BTreeMap<NodeId, NodeRecord>,
    /// source -> target -> edge
    pub edges: BTreeMap<NodeId, BTreeMap<NodeId, EdgeRecord>>,
    /// Parents always come before their children
    pub patterns: Vec<PatternRecord>,
    #[serde(default)]
    pub layout: Option<ComponentLayout>,
}

impl PersistedComponent {
    pub fn from_parts(
        size_rank: usize,
        graph: &GraphIndex,
        forest: &PatternForest,
        layout: Option<ComponentLayout>,
    ) -> Self {
        let nodes = graph
            .nodes()
            .iter()
            .map(|n| {
                let record = NodeRecord {
                    name: n.name.clone(),
                    length: n.length,
                    orientation: n.orientation.marker().to_string(),
                    duplicate_of: n.duplicate_of,
                    parent: forest.node_parent(n.id),
                };
                (n.id, record)
            })
            .collect();

        let mut edges: BTreeMap<NodeId, BTreeMap<NodeId, EdgeRecord>> = BTreeMap::new();
        for e in graph.edges() {
            edges.entry(e.source).or_default().insert(
                e.target,
                EdgeRecord {
                    id: e.id,
                    weight: e.weight,
                    relative_weight: e.relative_weight,
                    outlier: e.outlier,
                    is_duplicate: e.is_duplicate,
                },
            );
        }

        let patterns = forest
            .patterns()
            .iter()
            .map(|p| PatternRecord {
                id: p.id,
                kind: p.kind.as_str().to_string(),
                members: p.members.iter().map(|&m| m.into()).collect(),
                parent: p.parent,
            })
            .collect();

        PersistedComponent {
            size_rank,
            nodes,
            edges,
            patterns,
            layout,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeMap::len).sum()
    }

    pub fn is_laid_out(&self) -> bool {
        self.layout.is_some()
    }

    pub fn has_node_named(&self, name: &str) -> bool {
        self.nodes.values().any(|n| n.name == name)
    }

    /// Rebuild the graph and pattern forest, validating ids, orientations,
    /// pattern types and parent ordering on the way.
    pub fn to_parts(&self) -> Result<(GraphIndex, PatternForest)> {
        let mut graph = GraphIndex::new();
        let node_count = self.nodes.len();
        for (expected, (&id, node)) in self.nodes.iter().enumerate() {
            if id != expected {
                return Err(ScopeError::InvalidRecord(format!(
                    "node id {} out of order (expected {})",
                    id, expected
                )));
            }
            if let Some(original) = node.duplicate_of {
                if original >= node_count || original == id {
                    return Err(ScopeError::InvalidRecord(format!(
                        "node {} is a duplicate of unknown node {}",
                        id, original
                    )));
                }
            }
            let orientation = node.orientation.parse::<Orientation>()?;
            graph.restore_node(&node.name, node.length, orientation, node.duplicate_of);
        }

        let mut edges: Vec<Edge> = self
            .edges
            .iter()
            .flat_map(|(&source, targets)| {
                targets.iter().map(move |(&target, record)| Edge {
                    id: record.id,
                    source,
                    target,
                    weight: record.weight,
                    relative_weight: record.relative_weight,
                    outlier: record.outlier,
                    is_duplicate: record.is_duplicate,
                })
            })
            .collect();
        edges.sort_by_key(|e| e.id);
        for edge in &edges {
            graph.restore_edge(edge)?;
        }

        let patterns = self
            .patterns
            .iter()
            .map(|p| {
                Ok(PatternNode {
                    id: p.id,
                    kind: p.kind.parse::<PatternType>()?,
                    members: p.members.iter().map(|&m| m.into()).collect(),
                    parent: p.parent,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let forest = PatternForest::from_patterns(graph.node_count(), patterns)?;
        for (&id, node) in &self.nodes {
            if node.parent != forest.node_parent(id) {
                return Err(ScopeError::InvalidRecord(format!(
                    "node {} names parent {:?} but belongs to {:?}",
                    id,
                    node.parent,
                    forest.node_parent(id)
                )));
            }
        }
        Ok((graph, forest))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedStore {
    pub metadata: StoreMetadata,
    pub counts: StoreCounts,
    /// Ordered by size rank
    pub components: Vec<PersistedComponent>,
}

impl PersistedStore {
    pub fn new(metadata: StoreMetadata, mut components: Vec<PersistedComponent>) -> Self {
        components.sort_by_key(|c| c.size_rank);
        let counts = StoreCounts {
            total_nodes: components.iter().map(PersistedComponent::node_count).sum(),
            total_edges: components.iter().map(PersistedComponent::edge_count).sum(),
            components: components.len(),
        };
        PersistedStore {
            metadata,
            counts,
            components,
        }
    }

    pub fn component(&self, size_rank: usize) -> Option<&PersistedComponent> {
        self.components.iter().find(|c| c.size_rank == size_rank)
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::PatternHierarchyBuilder;
    use crate::pattern_detection::detect_patterns;

    fn bubble_component() -> PersistedComponent {
        let mut graph = GraphIndex::new();
        for name in ["S", "P1", "P2", "T"] {
            graph.add_node(name, 50, Orientation::Forward);
        }
        graph.add_edge(0, 1, Some(3.0)).unwrap();
        graph.add_edge(0, 2, Some(1.0)).unwrap();
        graph.add_edge(1, 3, None).unwrap();
        graph.add_edge(2, 3, None).unwrap();
        graph.scale_edge_weights();
        let detection = detect_patterns(&graph).unwrap();
        let forest = PatternHierarchyBuilder::new(detection.graph.node_count(), &detection.patterns)
            .build()
            .unwrap();
        PersistedComponent::from_parts(1, &detection.graph, &forest, None)
    }

    #[test]
    fn test_component_round_trip() {
        let component = bubble_component();
        assert_eq!(component.node_count(), 4);
        assert_eq!(component.edge_count(), 4);
        assert_eq!(component.edges[&0][&1].relative_weight, 1.0);
        assert_eq!(component.patterns[0].kind, "chain");
        assert_eq!(component.patterns[1].parent, Some(0));

        let (graph, forest) = component.to_parts().unwrap();
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge(1).unwrap().weight, Some(1.0));
        assert_eq!(graph.edge(1).unwrap().relative_weight, 0.0);
        assert_eq!(forest.len(), 2);
        assert_eq!(PersistedComponent::from_parts(1, &graph, &forest, None), component);
    }

    #[test]
    fn test_bad_records_are_rejected() {
        let mut component = bubble_component();
        component.nodes.get_mut(&0).unwrap().orientation = "x".into();
        assert!(matches!(component.to_parts(), Err(ScopeError::InvalidOrientation(_))));

        let mut component = bubble_component();
        component.patterns[0].kind = "hairpin".into();
        assert!(matches!(component.to_parts(), Err(ScopeError::UnknownPatternType(_))));

        let mut component = bubble_component();
        component.patterns.swap(0, 1);
        assert!(matches!(component.to_parts(), Err(ScopeError::MisorderedPattern { .. })));
    }

    #[test]
    fn test_inconsistent_node_records_are_rejected() {
        let mut component = bubble_component();
        component.nodes.get_mut(&1).unwrap().duplicate_of = Some(17);
        assert!(matches!(component.to_parts(), Err(ScopeError::InvalidRecord(_))));

        let mut component = bubble_component();
        component.nodes.get_mut(&2).unwrap().duplicate_of = Some(2);
        assert!(matches!(component.to_parts(), Err(ScopeError::InvalidRecord(_))));

        // P1 sits in the bubble, not in the outer chain
        let mut component = bubble_component();
        assert_eq!(component.nodes[&1].parent, Some(1));
        component.nodes.get_mut(&1).unwrap().parent = Some(0);
        assert!(matches!(component.to_parts(), Err(ScopeError::InvalidRecord(_))));

        let mut component = bubble_component();
        let record = component.nodes.remove(&3).unwrap();
        component.nodes.insert(9, record);
        assert!(matches!(component.to_parts(), Err(ScopeError::InvalidRecord(_))));
    }

    #[test]
    fn test_misnumbered_edge_is_rejected() {
        let mut component = bubble_component();
        component.edges.get_mut(&0).unwrap().get_mut(&1).unwrap().id = 7;
        assert!(matches!(component.to_parts(), Err(ScopeError::InvalidRecord(_))));
    }

    #[test]
    fn test_json_keys_survive() {
        let component = bubble_component();
        let text = serde_json::to_string(&component).unwrap();
        let back: PersistedComponent = serde_json::from_str(&text).unwrap();
        assert_eq!(back, component);
    }
}
