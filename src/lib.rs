pub mod abstract_view;
pub mod assembly_graph;
pub mod collapsible;
pub mod components;
pub mod edge_geometry;
pub mod error;
pub mod hierarchy;
pub mod layout;
pub mod pattern;
pub mod pattern_detection;
pub mod pipeline;
pub mod render;
pub mod store;
pub mod viewer;

pub use assembly_graph::{Edge, EdgeId, GraphIndex, InputGraph, Node, NodeId, Orientation, Outlier};
pub use collapsible::{CanonicalEdgeMap, CollapsibleGraphModel, InteriorSet};
pub use error::{Result, ScopeError};
pub use hierarchy::{PatternForest, PatternHierarchyBuilder, PatternNode};
pub use layout::{ComponentLayout, LayoutProvider, NoLayout, PrecomputedLayout};
pub use pattern::{Member, PatternId, PatternType, RawPattern};
pub use pattern_detection::{detect_patterns, Detection, PatternDetector};
pub use pipeline::{build_store, run_asmscope, Args, PipelineOptions};
pub use render::{DrawableSet, Endpoint, RecordingRenderer, Renderer};
pub use store::PersistedStore;
pub use viewer::Viewer;
