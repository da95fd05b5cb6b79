use crate::assembly_graph::NodeId;
use crate::error::{Result, ScopeError};
use crate::pattern::{Member, PatternId, PatternType, RawPattern};

/// A pattern placed in the forest. Its id is its position in parent-first
/// order, so `parent < id` always holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternNode {
    pub id: PatternId,
    pub kind: PatternType,
    pub members: Vec<Member>,
    pub parent: Option<PatternId>,
}

/// Patterns of one component, parents before children
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternForest {
    patterns: Vec<PatternNode>,
    node_parent: Vec<Option<PatternId>>,
}

/// Direct parent of every node and pattern, checking that each is claimed
/// at most once and that every member exists.
fn direct_parents(
    node_count: usize,
    members_of: &[&[Member]],
) -> Result<(Vec<Option<usize>>, Vec<Option<usize>>)> {
    let mut node_parent = vec![None; node_count];
    let mut pattern_parent = vec![None; members_of.len()];
    for (i, members) in members_of.iter().enumerate() {
        for &member in members.iter() {
            let slot = match member {
                Member::Node(n) if n < node_count => &mut node_parent[n],
                Member::Pattern(q) if q == i => {
                    return Err(ScopeError::CyclicContainment { pattern: i })
                }
                Member::Pattern(q) if q < members_of.len() => &mut pattern_parent[q],
                _ => {
                    return Err(ScopeError::UnknownMember {
                        pattern: i,
                        member: member.to_string(),
                    })
                }
            };
            if let Some(first) = *slot {
                return Err(ScopeError::AmbiguousParent {
                    member: member.to_string(),
                    first,
                    second: i,
                });
            }
            *slot = Some(i);
        }
    }
    Ok((node_parent, pattern_parent))
}

/// Orders raw detection output into a [`PatternForest`]
pub struct PatternHierarchyBuilder<'a> {
    node_count: usize,
    raw: &'a [RawPattern],
}

impl<'a> PatternHierarchyBuilder<'a> {
    pub fn new(node_count: usize, raw: &'a [RawPattern]) -> Self {
        PatternHierarchyBuilder { node_count, raw }
    }

    pub fn build(&self) -> Result<PatternForest> {
        let members: Vec<&[Member]> = self.raw.iter().map(|p| p.members.as_slice()).collect();
        let (node_parent, raw_parent) = direct_parents(self.node_count, &members)?;

        // Preorder walk from each root, roots in detection order
        let mut new_id: Vec<Option<PatternId>> = vec![None; self.raw.len()];
        let mut order = Vec::with_capacity(self.raw.len());
        for root in (0..self.raw.len()).filter(|&i| raw_parent[i].is_none()) {
            let mut stack = vec![root];
            while let Some(p) = stack.pop() {
                new_id[p] = Some(order.len());
                order.push(p);
                for member in self.raw[p].members.iter().rev() {
                    if let Member::Pattern(q) = member {
                        stack.push(*q);
                    }
                }
            }
        }

        // With a single parent each, anything unreached sits on a cycle
        let mut ids = Vec::with_capacity(new_id.len());
        for (raw_index, id) in new_id.iter().enumerate() {
            match id {
                Some(id) => ids.push(*id),
                None => return Err(ScopeError::CyclicContainment { pattern: raw_index }),
            }
        }

        let patterns = order
            .iter()
            .map(|&raw_index| {
                let raw = &self.raw[raw_index];
                PatternNode {
                    id: ids[raw_index],
                    kind: raw.kind,
                    members: raw
                        .members
                        .iter()
                        .map(|m| match *m {
                            Member::Node(n) => Member::Node(n),
                            Member::Pattern(q) => Member::Pattern(ids[q]),
                        })
                        .collect(),
                    parent: raw_parent[raw_index].map(|p| ids[p]),
                }
            })
            .collect();

        Ok(PatternForest {
            patterns,
            node_parent: node_parent.into_iter().map(|p| p.map(|p| ids[p])).collect(),
        })
    }
}

impl PatternForest {
    /// Rebuild a forest from stored patterns, checking that ids are dense,
    /// parents come first and declared parents agree with membership.
    pub fn from_patterns(node_count: usize, patterns: Vec<PatternNode>) -> Result<Self> {
        for (index, pattern) in patterns.iter().enumerate() {
            if pattern.id != index {
                return Err(ScopeError::MisorderedPattern {
                    pattern: pattern.id,
                    parent: pattern.parent.unwrap_or(index),
                });
            }
            if let Some(parent) = pattern.parent {
                if parent >= index {
                    return Err(ScopeError::MisorderedPattern {
                        pattern: index,
                        parent,
                    });
                }
            }
        }

        let members: Vec<&[Member]> = patterns.iter().map(|p| p.members.as_slice()).collect();
        let (node_parent, pattern_parent) = direct_parents(node_count, &members)?;
        for pattern in &patterns {
            if pattern.parent != pattern_parent[pattern.id] {
                return Err(ScopeError::AmbiguousParent {
                    member: Member::Pattern(pattern.id).to_string(),
                    first: pattern.parent.unwrap_or(pattern.id),
                    second: pattern_parent[pattern.id].unwrap_or(pattern.id),
                });
            }
        }

        Ok(PatternForest {
            patterns,
            node_parent,
        })
    }

    pub fn patterns(&self) -> &[PatternNode] {
        &self.patterns
    }

    pub fn pattern(&self, id: PatternId) -> Option<&PatternNode> {
        self.patterns.get(id)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.node_parent.len()
    }

    /// Patterns without a parent, in id order
    pub fn top_level(&self) -> impl Iterator<Item = PatternId> + '_ {
        self.patterns
            .iter()
            .filter(|p| p.parent.is_none())
            .map(|p| p.id)
    }

    pub fn node_parent(&self, node: NodeId) -> Option<PatternId> {
        self.node_parent.get(node).copied().flatten()
    }

    pub fn parent_of(&self, member: Member) -> Option<PatternId> {
        match member {
            Member::Node(n) => self.node_parent(n),
            Member::Pattern(p) => self.pattern(p).and_then(|p| p.parent),
        }
    }

    /// Enclosing patterns of `member`, innermost first
    pub fn ancestors(&self, member: Member) -> Vec<PatternId> {
        let mut out = Vec::new();
        let mut current = self.parent_of(member);
        while let Some(p) = current {
            out.push(p);
            current = self.patterns[p].parent;
        }
        out
    }

    pub fn depth(&self, id: PatternId) -> usize {
        self.ancestors(Member::Pattern(id)).len()
    }

    /// Every node inside `id`, at any depth
    pub fn descendant_nodes(&self, id: PatternId) -> Vec<NodeId> {
        let mut nodes = Vec::new();
        self.walk(id, &mut |m| {
            if let Member::Node(n) = m {
                nodes.push(n);
            }
        });
        nodes
    }

    /// Every pattern strictly inside `id`
    pub fn descendant_patterns(&self, id: PatternId) -> Vec<PatternId> {
        let mut found = Vec::new();
        self.walk(id, &mut |m| {
            if let Member::Pattern(p) = m {
                found.push(p);
            }
        });
        found
    }

    fn walk(&self, id: PatternId, visit: &mut dyn FnMut(Member)) {
        let Some(pattern) = self.patterns.get(id) else { return };
        for &member in &pattern.members {
            visit(member);
            if let Member::Pattern(child) = member {
                self.walk(child, visit);
            }
        }
    }
}
