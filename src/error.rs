use thiserror::Error;

/// Errors raised while building, persisting or viewing an assembly graph.
///
/// None of these are transient: they point at malformed producer data or
/// at a lookup for something that was never loaded, so callers surface
/// them instead of retrying.
#[derive(Debug, Error)]
pub enum ScopeError {
    // Data integrity
    #[error("pattern containment is cyclic (pattern {pattern} is never reached from a root)")]
    CyclicContainment { pattern: usize },

    #[error("{member} is claimed by both pattern {first} and pattern {second}")]
    AmbiguousParent {
        member: String,
        first: usize,
        second: usize,
    },

    #[error("pattern {pattern} references unknown member {member}")]
    UnknownMember { pattern: usize, member: String },

    #[error("pattern {pattern} appears before its parent {parent}")]
    MisorderedPattern { pattern: usize, parent: usize },

    #[error("invalid stored record: {0}")]
    InvalidRecord(String),

    #[error("no component could be laid out")]
    NoLaidOutComponents,

    #[error("component {0} has no layout")]
    ComponentNotLaidOut(usize),

    #[error("component size rank must be a positive integer, got {0:?}")]
    InvalidRank(String),

    #[error("component size rank {rank} is too large (only {count} components)")]
    RankTooLarge { rank: usize, count: usize },

    #[error("parallel edge {source_name} -> {target_name}")]
    ParallelEdge {
        source_name: String,
        target_name: String,
    },

    #[error("edge references unknown node name {0:?}")]
    UnknownNodeName(String),

    #[error("unknown pattern type {0:?}")]
    UnknownPatternType(String),

    // Lookups
    #[error("node {0} not found")]
    NodeNotFound(usize),

    #[error("no node named {0:?}")]
    NodeNameNotFound(String),

    #[error("edge {0} not found")]
    EdgeNotFound(usize),

    #[error("pattern {0} not found")]
    PatternNotFound(usize),

    #[error("invalid node orientation {0:?} (expected '+' or '-')")]
    InvalidOrientation(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ScopeError>;
