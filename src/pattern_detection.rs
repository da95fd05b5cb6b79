//! Structural pattern detection over one connected component.
//!
//! Detection runs in passes. Each pass looks at an [`AbstractView`] in which
//! the patterns found so far are single opaque vertices, and tries, in this
//! order, chains (which also yields cyclic chains), frayed ropes and
//! bubbles. A vertex claimed during a pass is not looked at again in that
//! pass. The loop stops on the first pass that finds nothing new.
use crate::abstract_view::{AbstractView, Vertex};
use crate::assembly_graph::{GraphIndex, NodeId};
use crate::error::Result;
use crate::pattern::{Member, PatternType, RawPattern};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, warn};

/// Output of detection: the working graph (the input plus any duplicate
/// nodes that were synthesized) and the patterns in creation order.
/// A pattern only ever contains patterns created before it.
#[derive(Debug, Clone)]
pub struct Detection {
    pub graph: GraphIndex,
    pub patterns: Vec<RawPattern>,
}

/// Where a claimed vertex sits inside the candidate that claimed it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    /// Entered from outside the pattern (chain start, rope source)
    Entry,
    /// Left towards the outside (chain end, rope sink)
    Exit,
    Internal,
}

#[derive(Debug)]
struct Candidate {
    kind: PatternType,
    members: Vec<Vertex>,
}

/// A node needed as exit boundary by one candidate and as entry boundary
/// by another. The original keeps the exit half.
#[derive(Debug)]
struct Split {
    node: NodeId,
    entry_slot: usize,
}

/// Bookkeeping for a single detection pass
struct Pass<'a> {
    view: &'a AbstractView,
    claims: HashMap<Vertex, (usize, Role)>,
    candidates: Vec<Candidate>,
    splits: Vec<Split>,
}

impl<'a> Pass<'a> {
    fn new(view: &'a AbstractView) -> Self {
        Pass {
            view,
            claims: HashMap::new(),
            candidates: Vec::new(),
            splits: Vec::new(),
        }
    }

    fn is_claimed(&self, v: Vertex) -> bool {
        self.claims.contains_key(&v)
    }

    fn accept(&mut self, kind: PatternType, members: Vec<(Vertex, Role)>) -> usize {
        let slot = self.candidates.len();
        for &(v, role) in &members {
            self.claims.insert(v, (slot, role));
        }
        self.candidates.push(Candidate {
            kind,
            members: members.into_iter().map(|(v, _)| v).collect(),
        });
        slot
    }

    /// Grow a maximal chain through `v`, or a cyclic chain if the path
    /// closes on itself.
    fn try_chain(&mut self, v: Vertex) {
        let view = self.view;
        if self.is_claimed(v) {
            return;
        }
        let Some(w) = view.sole_successor(v) else { return };
        if w == v || self.is_claimed(w) || view.in_degree(w) != 1 {
            return;
        }

        let mut path = VecDeque::from([v, w]);
        let mut in_path: HashSet<Vertex> = HashSet::from([v, w]);
        let mut cyclic = false;

        // Walk forward while the end has a single successor that has a single predecessor
        while let Some(&end) = path.back() {
            let Some(next) = view.sole_successor(end) else { break };
            if Some(&next) == path.front() {
                cyclic = view.in_degree(next) == 1;
                break;
            }
            if view.in_degree(next) != 1 || self.is_claimed(next) || in_path.contains(&next) {
                break;
            }
            in_path.insert(next);
            path.push_back(next);
        }

        // Walk backward symmetrically. A closing edge would have been seen above.
        if !cyclic {
            while let Some(&start) = path.front() {
                let Some(prev) = view.sole_predecessor(start) else { break };
                if view.out_degree(prev) != 1 || self.is_claimed(prev) || in_path.contains(&prev) {
                    break;
                }
                in_path.insert(prev);
                path.push_front(prev);
            }
        }

        let last = path.len() - 1;
        let members: Vec<(Vertex, Role)> = path
            .into_iter()
            .enumerate()
            .map(|(i, v)| {
                let role = match i {
                    _ if cyclic => Role::Internal,
                    0 => Role::Entry,
                    i if i == last => Role::Exit,
                    _ => Role::Internal,
                };
                (v, role)
            })
            .collect();

        let kind = if cyclic {
            PatternType::CyclicChain
        } else {
            PatternType::Chain
        };
        self.accept(kind, members);
    }

    /// Sources converging on `m`, which fans out to sinks
    fn try_frayed_rope(&mut self, m: Vertex) {
        let view = self.view;
        if self.is_claimed(m) || view.in_degree(m) < 2 || view.out_degree(m) < 2 || view.has_self_loop(m) {
            return;
        }
        let sources: Vec<Vertex> = view.predecessors(m).collect();
        let sinks: Vec<Vertex> = view.successors(m).collect();
        if sources.iter().any(|s| sinks.contains(s)) {
            return;
        }

        // (node, slot of the other claimant, role the rope needs)
        let mut pending: Vec<(NodeId, usize, Role)> = Vec::new();
        for &s in &sources {
            if view.out_degree(s) != 1 {
                return;
            }
            match (self.claims.get(&s), s) {
                (None, _) => {}
                (Some(&(slot, Role::Exit)), Vertex::Node(n)) => pending.push((n, slot, Role::Entry)),
                _ => return,
            }
        }
        for &t in &sinks {
            if view.in_degree(t) != 1 {
                return;
            }
            match (self.claims.get(&t), t) {
                (None, _) => {}
                (Some(&(slot, Role::Entry)), Vertex::Node(n)) => pending.push((n, slot, Role::Exit)),
                _ => return,
            }
        }

        let members: Vec<(Vertex, Role)> = sources
            .iter()
            .map(|&s| (s, Role::Entry))
            .chain(std::iter::once((m, Role::Internal)))
            .chain(sinks.iter().map(|&t| (t, Role::Exit)))
            .collect();
        let slot = self.accept(PatternType::FrayedRope, members);

        for (node, other, rope_role) in pending {
            // Both halves are now taken
            self.claims.insert(Vertex::Node(node), (other, Role::Internal));
            let entry_slot = if rope_role == Role::Entry { slot } else { other };
            self.splits.push(Split { node, entry_slot });
        }
    }

    /// Parallel single-file branches from `s` that all meet at one sink
    fn try_bubble(&mut self, s: Vertex) {
        let view = self.view;
        if view.out_degree(s) < 2 {
            return;
        }

        let mut members = Vec::new();
        let mut seen = HashSet::new();
        let mut sink: Option<Vertex> = None;
        for start in view.successors(s) {
            let mut cur = start;
            let end = loop {
                if cur == s
                    || self.is_claimed(cur)
                    || view.in_degree(cur) != 1
                    || view.out_degree(cur) != 1
                    || !seen.insert(cur)
                {
                    return;
                }
                members.push((cur, Role::Internal));
                let Some(next) = view.sole_successor(cur) else { return };
                if view.in_degree(next) == 1 && view.out_degree(next) == 1 {
                    cur = next;
                } else {
                    break next;
                }
            };
            match sink {
                None => sink = Some(end),
                Some(t) if t == end => {}
                Some(_) => return,
            }
        }

        let Some(t) = sink else { return };
        if t == s || view.in_degree(t) != view.out_degree(s) {
            return;
        }
        self.accept(PatternType::Bubble, members);
    }
}

/// Finds nested structural patterns in a component
pub struct PatternDetector {
    graph: GraphIndex,
    patterns: Vec<RawPattern>,
    /// Outermost pattern containing each node
    owner: Vec<Option<usize>>,
    /// All nodes transitively inside each pattern
    descendants: Vec<Vec<NodeId>>,
}

impl PatternDetector {
    pub fn new(graph: &GraphIndex) -> Self {
        PatternDetector {
            graph: graph.clone(),
            patterns: Vec::new(),
            owner: vec![None; graph.node_count()],
            descendants: Vec::new(),
        }
    }

    /// Run passes until one finds no new pattern
    pub fn run(mut self) -> Result<Detection> {
        let max_passes = self.graph.node_count() + 1;
        let mut passes = 0;
        loop {
            if passes >= max_passes {
                warn!(passes, "pattern detection stopped at pass limit");
                break;
            }
            passes += 1;

            let view = AbstractView::build(&self.graph, &self.owner);
            let mut pass = Pass::new(&view);
            for &v in view.vertices() {
                pass.try_chain(v);
            }
            for &v in view.vertices() {
                pass.try_frayed_rope(v);
            }
            for &v in view.vertices() {
                pass.try_bubble(v);
            }

            if pass.candidates.is_empty() {
                break;
            }
            debug!(
                pass = passes,
                found = pass.candidates.len(),
                splits = pass.splits.len(),
                "detection pass"
            );
            let Pass {
                candidates, splits, ..
            } = pass;
            self.commit(candidates, splits)?;
        }

        debug!(
            patterns = self.patterns.len(),
            duplicates = self.graph.nodes().iter().filter(|n| n.is_duplicate()).count(),
            "detection finished"
        );
        Ok(Detection {
            graph: self.graph,
            patterns: self.patterns,
        })
    }

    fn commit(&mut self, mut candidates: Vec<Candidate>, splits: Vec<Split>) -> Result<()> {
        for split in splits {
            let dup = self.graph.duplicate_node(split.node)?;
            self.owner.push(None);
            for member in candidates[split.entry_slot].members.iter_mut() {
                if *member == Vertex::Node(split.node) {
                    *member = Vertex::Node(dup);
                }
            }
        }

        for candidate in candidates {
            let index = self.patterns.len();
            let mut nodes = Vec::new();
            let members = candidate
                .members
                .iter()
                .map(|&v| match v {
                    Vertex::Node(n) => {
                        nodes.push(n);
                        Member::Node(n)
                    }
                    Vertex::Pattern(p) => {
                        nodes.extend_from_slice(&self.descendants[p]);
                        Member::Pattern(p)
                    }
                })
                .collect();
            for &n in &nodes {
                self.owner[n] = Some(index);
            }
            self.descendants.push(nodes);
            self.patterns.push(RawPattern::new(candidate.kind, members));
        }
        Ok(())
    }
}

/// Detect patterns in one component
pub fn detect_patterns(graph: &GraphIndex) -> Result<Detection> {
    PatternDetector::new(graph).run()
}
