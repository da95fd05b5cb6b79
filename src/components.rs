use crate::assembly_graph::{EdgeId, GraphIndex, NodeId};
use crate::error::{Result, ScopeError};
use std::collections::HashMap;
use uf_rush::UFRush;

/// Union-find over node ids, used to group weakly connected nodes
pub struct ComponentUnionFind {
    uf: UFRush,
}

impl ComponentUnionFind {
    pub fn new(node_count: usize) -> Self {
        Self {
            uf: UFRush::new(node_count.max(1)),
        }
    }

    pub fn find(&self, node: NodeId) -> NodeId {
        self.uf.find(node)
    }

    pub fn unite(&self, a: NodeId, b: NodeId) {
        if a != b {
            self.uf.unite(a, b);
        }
    }
}

/// One weakly connected component, reindexed from 0
#[derive(Debug, Clone)]
pub struct Component {
    /// 1 for the largest component
    pub size_rank: usize,
    pub graph: GraphIndex,
    /// Node id in the full graph for each node id in `graph`
    pub original_ids: Vec<NodeId>,
}

/// Split a graph into weakly connected components ordered by size:
/// most nodes first, then most edges, then lowest original node id.
/// Edge weights are rescaled within each component.
pub fn split_components(graph: &GraphIndex) -> Result<Vec<Component>> {
    let uf = ComponentUnionFind::new(graph.node_count());
    for edge in graph.edges() {
        uf.unite(edge.source, edge.target);
    }

    // Nodes and edges of each component, both in ascending id order
    let mut groups: HashMap<NodeId, (Vec<NodeId>, Vec<EdgeId>)> = HashMap::new();
    for node in graph.nodes() {
        groups.entry(uf.find(node.id)).or_default().0.push(node.id);
    }
    for edge in graph.edges() {
        groups.entry(uf.find(edge.source)).or_default().1.push(edge.id);
    }

    let mut ordered: Vec<(Vec<NodeId>, Vec<EdgeId>)> = groups.into_values().collect();
    ordered.sort_by(|(nodes_a, edges_a), (nodes_b, edges_b)| {
        nodes_b
            .len()
            .cmp(&nodes_a.len())
            .then(edges_b.len().cmp(&edges_a.len()))
            .then(nodes_a.first().cmp(&nodes_b.first()))
    });

    ordered
        .into_iter()
        .enumerate()
        .map(|(i, (members, edges))| extract_component(graph, members, &edges, i + 1))
        .collect()
}

fn extract_component(
    graph: &GraphIndex,
    members: Vec<NodeId>,
    edges: &[EdgeId],
    size_rank: usize,
) -> Result<Component> {
    let mut local = GraphIndex::new();
    let mut remap: HashMap<NodeId, NodeId> = HashMap::with_capacity(members.len());
    for &id in &members {
        let node = graph.node(id).ok_or(ScopeError::NodeNotFound(id))?;
        remap.insert(id, local.add_node(&node.name, node.length, node.orientation));
    }
    for &e in edges {
        let edge = graph.edge(e).ok_or(ScopeError::EdgeNotFound(e))?;
        let source = *remap.get(&edge.source).ok_or(ScopeError::NodeNotFound(edge.source))?;
        let target = *remap.get(&edge.target).ok_or(ScopeError::NodeNotFound(edge.target))?;
        local.add_edge(source, target, edge.weight)?;
    }
    local.scale_edge_weights();
    Ok(Component {
        size_rank,
        graph: local,
        original_ids: members,
    })
}

/// Parse a user-supplied component size rank and check it against the
/// number of components.
pub fn parse_size_rank(raw: &str, component_count: usize) -> Result<usize> {
    let rank = raw
        .trim()
        .parse::<usize>()
        .map_err(|_| ScopeError::InvalidRank(raw.to_string()))?;
    validate_size_rank(rank, component_count)
}

pub fn validate_size_rank(rank: usize, component_count: usize) -> Result<usize> {
    if rank == 0 {
        return Err(ScopeError::InvalidRank(rank.to_string()));
    }
    if rank > component_count {
        return Err(ScopeError::RankTooLarge {
            rank,
            count: component_count,
        });
    }
    Ok(rank)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly_graph::Orientation;

    #[test]
    fn test_union_find_groups() {
        let uf = ComponentUnionFind::new(5);
        uf.unite(0, 1);
        uf.unite(3, 4);
        assert_eq!(uf.find(0), uf.find(1));
        assert_eq!(uf.find(3), uf.find(4));
        assert_ne!(uf.find(1), uf.find(3));
        assert_eq!(uf.find(2), 2);
    }

    #[test]
    fn test_split_orders_by_size() {
        let mut graph = GraphIndex::new();
        for name in ["a", "b", "x", "y", "z", "lonely"] {
            graph.add_node(name, 10, Orientation::Forward);
        }
        graph.add_edge(0, 1, Some(2.0)).unwrap();
        graph.add_edge(2, 3, Some(1.0)).unwrap();
        graph.add_edge(3, 4, Some(3.0)).unwrap();

        let components = split_components(&graph).unwrap();
        assert_eq!(components.len(), 3);
        assert_eq!(components[0].size_rank, 1);
        assert_eq!(components[0].graph.node_count(), 3);
        assert_eq!(components[0].original_ids, vec![2, 3, 4]);
        assert_eq!(components[1].graph.node_count(), 2);
        assert_eq!(components[2].graph.node_count(), 1);
        assert_eq!(components[2].graph.nodes()[0].name, "lonely");

        let big = &components[0].graph;
        assert!(big.has_edge(0, 1));
        assert!(big.has_edge(1, 2));
        assert_eq!(big.edges()[0].relative_weight, 0.0);
        assert_eq!(big.edges()[1].relative_weight, 1.0);
    }

    #[test]
    fn test_many_small_components_keep_their_own_edges() {
        let mut graph = GraphIndex::new();
        let pairs = 2000;
        for i in 0..pairs {
            let a = graph.add_node(&format!("a{}", i), 10, Orientation::Forward);
            let b = graph.add_node(&format!("b{}", i), 10, Orientation::Reverse);
            graph.add_edge(a, b, Some(i as f64)).unwrap();
        }

        let components = split_components(&graph).unwrap();
        assert_eq!(components.len(), pairs);
        for component in &components {
            assert_eq!(component.graph.node_count(), 2);
            assert_eq!(component.graph.edge_count(), 1);
            let edge = &component.graph.edges()[0];
            assert_eq!((edge.source, edge.target), (0, 1));
            let [a, b] = [component.original_ids[0], component.original_ids[1]];
            assert_eq!(b, a + 1);
            assert_eq!(edge.weight, Some((a / 2) as f64));
        }
        // Ties on size fall back to the lowest original id
        assert_eq!(components[0].original_ids, vec![0, 1]);
        assert_eq!(components[pairs - 1].original_ids, vec![2 * pairs - 2, 2 * pairs - 1]);
    }

    #[test]
    fn test_rank_validation() {
        assert_eq!(parse_size_rank("2", 3).unwrap(), 2);
        assert_eq!(parse_size_rank(" 3 ", 3).unwrap(), 3);
        assert!(matches!(parse_size_rank("0", 3), Err(ScopeError::InvalidRank(_))));
        assert!(matches!(parse_size_rank("1.5", 3), Err(ScopeError::InvalidRank(_))));
        assert!(matches!(parse_size_rank("-1", 3), Err(ScopeError::InvalidRank(_))));
        assert!(matches!(parse_size_rank("abc", 3), Err(ScopeError::InvalidRank(_))));
        assert!(matches!(
            parse_size_rank("4", 3),
            Err(ScopeError::RankTooLarge { rank: 4, count: 3 })
        ));
    }
}
