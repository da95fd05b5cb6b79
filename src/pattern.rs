use crate::assembly_graph::NodeId;
use crate::error::{Result, ScopeError};
use std::fmt;
use std::str::FromStr;

/// Identifier of a pattern within its component
pub type PatternId = usize;

/// Kind of structural motif a pattern represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PatternType {
    Chain,
    CyclicChain,
    Bubble,
    FrayedRope,
    /// Opaque grouping; accepted from persisted data, never detected
    Misc,
}

impl PatternType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternType::Chain => "chain",
            PatternType::CyclicChain => "cyclic_chain",
            PatternType::Bubble => "bubble",
            PatternType::FrayedRope => "frayed_rope",
            PatternType::Misc => "misc",
        }
    }
}

impl FromStr for PatternType {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "chain" => Ok(PatternType::Chain),
            "cyclic_chain" => Ok(PatternType::CyclicChain),
            "bubble" => Ok(PatternType::Bubble),
            "frayed_rope" => Ok(PatternType::FrayedRope),
            "misc" => Ok(PatternType::Misc),
            other => Err(ScopeError::UnknownPatternType(other.to_string())),
        }
    }
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A direct child of a pattern: a node or a nested pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Member {
    Node(NodeId),
    Pattern(PatternId),
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Member::Node(id) => write!(f, "node {}", id),
            Member::Pattern(id) => write!(f, "pattern {}", id),
        }
    }
}

/// A pattern as found by detection. `Member::Pattern` refers to the index
/// of another raw pattern in the same detection result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPattern {
    pub kind: PatternType,
    pub members: Vec<Member>,
}

impl RawPattern {
    pub fn new(kind: PatternType, members: Vec<Member>) -> Self {
        RawPattern { kind, members }
    }
}
