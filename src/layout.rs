use crate::assembly_graph::{EdgeId, GraphIndex, NodeId};
use crate::error::Result;
use crate::hierarchy::PatternForest;
use crate::pattern::PatternId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

/// Axis-aligned box; `x`/`y` is the lower-left corner
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeGeometry {
    /// Center of the node
    pub position: Point,
    pub width: f64,
    pub height: f64,
}

/// Geometry of one laid-out component, keyed by element id
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ComponentLayout {
    pub bounding_box: BoundingBox,
    #[serde(default)]
    pub nodes: BTreeMap<NodeId, NodeGeometry>,
    #[serde(default)]
    pub patterns: BTreeMap<PatternId, BoundingBox>,
    /// Control points of each edge, source side first
    #[serde(default)]
    pub edges: BTreeMap<EdgeId, Vec<Point>>,
}

impl ComponentLayout {
    pub fn node_position(&self, id: NodeId) -> Option<Point> {
        self.nodes.get(&id).map(|g| g.position)
    }

    pub fn control_points(&self, id: EdgeId) -> &[Point] {
        self.edges.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Supplies geometry for a component once its patterns are known.
/// `Ok(None)` means the component was not laid out.
pub trait LayoutProvider: Sync {
    fn layout_component(
        &self,
        size_rank: usize,
        graph: &GraphIndex,
        forest: &PatternForest,
    ) -> Result<Option<ComponentLayout>>;
}

/// Lays nothing out
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLayout;

impl LayoutProvider for NoLayout {
    fn layout_component(&self, _: usize, _: &GraphIndex, _: &PatternForest) -> Result<Option<ComponentLayout>> {
        Ok(None)
    }
}

/// Geometry computed elsewhere, keyed by component size rank
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrecomputedLayout {
    components: BTreeMap<usize, ComponentLayout>,
}

impl PrecomputedLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn insert(&mut self, size_rank: usize, layout: ComponentLayout) {
        self.components.insert(size_rank, layout);
    }
}

impl LayoutProvider for PrecomputedLayout {
    fn layout_component(&self, size_rank: usize, _: &GraphIndex, _: &PatternForest) -> Result<Option<ComponentLayout>> {
        Ok(self.components.get(&size_rank).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precomputed_layout_from_json() {
        let json = r#"{
            "1": {
                "bounding_box": {"x": 0.0, "y": 0.0, "width": 100.0, "height": 50.0},
                "nodes": {"0": {"position": {"x": 10.0, "y": 20.0}, "width": 5.0, "height": 5.0}},
                "edges": {"0": [{"x": 12.0, "y": 21.0}]}
            }
        }"#;
        let layout: PrecomputedLayout = serde_json::from_str(json).unwrap();
        let graph = GraphIndex::new();
        let forest = PatternForest::default();

        let first = layout.layout_component(1, &graph, &forest).unwrap().unwrap();
        assert_eq!(first.node_position(0), Some(Point::new(10.0, 20.0)));
        assert_eq!(first.control_points(0), &[Point::new(12.0, 21.0)]);
        assert!(first.control_points(7).is_empty());
        assert_eq!(first.bounding_box.width, 100.0);

        assert!(layout.layout_component(2, &graph, &forest).unwrap().is_none());
        assert!(NoLayout.layout_component(1, &graph, &forest).unwrap().is_none());
    }
}
